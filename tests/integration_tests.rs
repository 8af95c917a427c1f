//! Integration tests against the live Groq API.
//! These tests require an API key in the environment to run.

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use retrochat::{CompletionRequest, Credential, Groq, Provider};

    fn credential() -> Option<Credential> {
        let credential = Credential::from_env();
        if credential.is_none() {
            eprintln!("Skipping test: GROQ_API_KEY not set");
        }
        credential
    }

    async fn first_model(client: &Groq, credential: &Credential) -> String {
        let models = client
            .list_models(credential)
            .await
            .expect("Listing models should succeed with a valid API key");
        assert!(!models.is_empty(), "Provider should list at least one model");
        models[0].clone()
    }

    #[tokio::test]
    async fn test_list_models() {
        let Some(credential) = credential() else {
            return;
        };
        let client = Groq::new().expect("Failed to create client");
        let models = client
            .list_models(&credential)
            .await
            .expect("Listing models should succeed");
        assert!(models.iter().all(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn test_streaming_response() {
        let Some(credential) = credential() else {
            return;
        };
        let client = Groq::new().expect("Failed to create client");
        let model = first_model(&client, &credential).await;

        let request = CompletionRequest::new(model, "Count to 3").with_max_tokens(Some(20));
        let mut stream = client
            .stream_completion(&credential, request)
            .await
            .expect("Stream request should succeed");
        let mut text = String::new();
        while let Some(delta) = stream.next().await {
            text.push_str(&delta.expect("Stream should not fail"));
        }
        assert!(!text.trim().is_empty());
    }

    #[tokio::test]
    async fn test_complete() {
        let Some(credential) = credential() else {
            return;
        };
        let client = Groq::new().expect("Failed to create client");
        let model = first_model(&client, &credential).await;

        let request =
            CompletionRequest::new(model, "Say 'test passed'").with_max_tokens(Some(10));
        let text = client
            .complete(&credential, request)
            .await
            .expect("Request should succeed with valid API key");
        assert!(!text.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_key_is_rejected() {
        if credential().is_none() {
            return;
        }
        let client = Groq::new().expect("Failed to create client");
        let bogus = Credential::new("gsk_not_a_real_key").unwrap();
        let err = client.list_models(&bogus).await.unwrap_err();
        assert!(err.is_authentication(), "unexpected error: {err}");
    }
}
