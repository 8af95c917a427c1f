//! Per-session state and its lifecycle.

use crate::chat::config::ChatConfig;
use crate::chat::message_log::{MAX_MESSAGES, MessageLog};
use crate::chat::model_registry::{DEFAULT_MODEL, ModelRegistry};
use crate::error::{Error, Result};
use crate::observability::{MODEL_REFRESHES, SESSIONS_INITIALIZED};
use crate::provider::{Credential, Provider};
use crate::types::Role;

/// Everything one interactive session owns.
#[derive(Debug, Clone)]
pub struct Session {
    log: MessageLog,
    models: ModelRegistry,
    credential: Option<Credential>,
    initialized: bool,
}

impl Session {
    fn new(seed: &SessionSeed) -> Self {
        Self {
            log: MessageLog::with_capacity(seed.max_messages),
            models: ModelRegistry::new(&seed.model),
            credential: seed.credential.clone(),
            initialized: true,
        }
    }

    /// The transcript.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// The transcript, for appending.
    pub fn log_mut(&mut self) -> &mut MessageLog {
        &mut self.log
    }

    /// The model registry.
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// The model registry, for updates and selection.
    pub fn models_mut(&mut self) -> &mut ModelRegistry {
        &mut self.models
    }

    /// The provider credential, if one has been supplied.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Replaces the provider credential. `None` clears it.
    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    /// Returns true once the session has been set up.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Replaces the available models with the provider's listing.
    ///
    /// Returns the number of models now available. On any failure the
    /// registry is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] when no credential is set, the
    /// provider's error when listing fails, and [`Error::InvalidModelList`]
    /// when the listing contains blank identifiers.
    pub async fn refresh_models(&mut self, provider: &dyn Provider) -> Result<usize> {
        let credential = self
            .credential
            .as_ref()
            .ok_or_else(|| Error::missing_credential("set one with /key before listing models"))?;
        let models = provider.list_models(credential).await.inspect_err(|err| {
            tracing::warn!(error = %err, "could not refresh models");
        })?;
        self.models.update_models(models)?;
        MODEL_REFRESHES.click();
        tracing::info!(
            count = self.models.available().len(),
            selected = %self.models.selected(),
            "refreshed models"
        );
        Ok(self.models.available().len())
    }
}

/// Values a new session starts from.
#[derive(Debug, Clone)]
struct SessionSeed {
    model: String,
    max_messages: usize,
    credential: Option<Credential>,
}

/// Owns the session and creates it on first use.
///
/// Every accessor goes through [`SessionManager::get_state`], so callers
/// never observe a missing or half-built session.
#[derive(Debug)]
pub struct SessionManager {
    seed: SessionSeed,
    session: Option<Session>,
}

impl SessionManager {
    /// Creates a manager seeded with the default model and the credential
    /// from the environment.
    pub fn new() -> Self {
        Self {
            seed: SessionSeed {
                model: DEFAULT_MODEL.to_string(),
                max_messages: MAX_MESSAGES,
                credential: Credential::from_env(),
            },
            session: None,
        }
    }

    /// Creates a manager seeded from `config`.
    pub fn from_config(config: &ChatConfig) -> Self {
        Self {
            seed: SessionSeed {
                model: config.model.clone(),
                max_messages: config.max_messages,
                credential: config.credential.clone(),
            },
            session: None,
        }
    }

    /// Creates the session if it does not exist yet. Calling this again is
    /// a no-op.
    pub fn initialize(&mut self) {
        if self.session.as_ref().is_some_and(Session::is_initialized) {
            return;
        }
        self.session = Some(Session::new(&self.seed));
        SESSIONS_INITIALIZED.click();
        tracing::debug!(
            model = %self.seed.model,
            max_messages = self.seed.max_messages,
            has_credential = self.seed.credential.is_some(),
            "initialized session"
        );
    }

    /// Returns the session, initializing it first when needed.
    pub fn get_state(&mut self) -> &mut Session {
        self.initialize();
        self.session.get_or_insert_with(|| Session::new(&self.seed))
    }

    /// Discards the session. The next access starts a fresh one.
    ///
    /// The credential in use is carried over to the next session.
    pub fn reset(&mut self) {
        if let Some(session) = self.session.take() {
            self.seed.credential = session.credential;
            tracing::info!(messages = session.log.len(), "reset session");
        }
    }

    /// Appends a message to the session's transcript.
    pub fn append_message(&mut self, role: Role, content: &str) -> Result<()> {
        self.get_state().log.append(role, content)
    }

    /// Replaces the session's available models.
    pub fn update_models(&mut self, models: Vec<String>) -> Result<()> {
        self.get_state().models.update_models(models)
    }

    /// Selects one of the session's available models.
    pub fn set_selected_model(&mut self, model: &str) -> Result<()> {
        self.get_state().models.set_selected_model(model)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
