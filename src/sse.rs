//! Server-Sent Events (SSE) processing for streaming completions.
//!
//! The OpenAI-compatible endpoint sends one `data:` line per event, events
//! separated by a blank line, and a final `data: [DONE]` sentinel.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::observability::{STREAM_BYTES, STREAM_ERRORS, STREAM_EVENTS};
use crate::types::CompletionChunk;
use crate::{Error, Result};

const DONE_SENTINEL: &str = "[DONE]";

/// A parsed SSE frame.
#[derive(Debug)]
enum Frame {
    Chunk(Result<CompletionChunk>),
    Done,
    Skip,
}

/// Process a stream of bytes into a stream of completion chunks.
///
/// Buffers partial frames across network reads and stops after the `[DONE]`
/// sentinel or when the underlying stream ends.
///
/// # Example
///
/// ```
/// # tokio_test::block_on(async {
/// use bytes::Bytes;
/// use futures::{StreamExt, stream};
/// use retrochat::sse::process_sse;
///
/// let body = stream::iter(vec![
///     Ok::<_, reqwest::Error>(Bytes::from_static(b"data: {\"choices\":[{\"delta\":")),
///     Ok(Bytes::from_static(b"{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n")),
/// ]);
/// let chunks: Vec<_> = process_sse(body).collect().await;
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].as_ref().unwrap().text(), Some("Hi"));
/// # });
/// ```
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<CompletionChunk>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin,
{
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });
    process_frames(stream)
}

fn process_frames<S>(stream: S) -> impl Stream<Item = Result<CompletionChunk>>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let buffer = String::new();
    let pending: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer, pending, false),
        |(mut stream, mut buffer, mut pending, done)| async move {
            if done {
                return None;
            }
            loop {
                if let Some((frame, remaining)) = extract_frame(&buffer) {
                    buffer = remaining;
                    match frame {
                        Frame::Chunk(chunk) => {
                            if chunk.is_err() {
                                STREAM_ERRORS.click();
                            } else {
                                STREAM_EVENTS.click();
                            }
                            return Some((chunk, (stream, buffer, pending, false)));
                        }
                        Frame::Done => return None,
                        Frame::Skip => continue,
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        pending.extend_from_slice(&bytes);
                        match take_utf8(&mut pending) {
                            Ok(text) => {
                                buffer.push_str(&text);
                                // A CRLF pair may straddle two reads.
                                if buffer.contains("\r\n") {
                                    buffer = buffer.replace("\r\n", "\n");
                                }
                            }
                            Err(e) => {
                                STREAM_ERRORS.click();
                                return Some((Err(e), (stream, buffer, pending, true)));
                            }
                        }
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer, pending, true)));
                    }
                    None => {
                        if !pending.is_empty() {
                            STREAM_ERRORS.click();
                            let e = Error::encoding(
                                "Invalid UTF-8 in stream: ended inside a multi-byte sequence",
                                None,
                            );
                            return Some((Err(e), (stream, buffer, Vec::new(), true)));
                        }
                        // A final frame may arrive without its trailing blank line.
                        if !buffer.trim().is_empty() {
                            buffer.push_str("\n\n");
                            if let Some((Frame::Chunk(chunk), _)) = extract_frame(&buffer) {
                                return Some((chunk, (stream, String::new(), pending, true)));
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

/// Drains the longest valid UTF-8 prefix of `pending`.
///
/// An incomplete multi-byte sequence at the end stays in `pending` until the
/// next read completes it. Bytes that can never form UTF-8 are an error.
fn take_utf8(pending: &mut Vec<u8>) -> Result<String> {
    let valid = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(e) => {
            return Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            ));
        }
    };
    let tail = pending.split_off(valid);
    let head = std::mem::replace(pending, tail);
    String::from_utf8(head).map_err(|e| {
        Error::encoding(format!("Invalid UTF-8 in stream: {e}"), Some(Box::new(e)))
    })
}

/// Extract one complete SSE frame from the buffer.
fn extract_frame(buffer: &str) -> Option<(Frame, String)> {
    let (frame_text, rest) = buffer.split_once("\n\n")?;
    let rest = rest.to_string();

    let data: Vec<&str> = frame_text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .collect();

    // Comment lines (": keep-alive") and frames without data carry nothing.
    if data.is_empty() {
        return Some((Frame::Skip, rest));
    }

    let data = data.join("\n");
    if data == DONE_SENTINEL {
        return Some((Frame::Done, rest));
    }
    Some((Frame::Chunk(parse_chunk(&data)), rest))
}

/// Parse a data payload, surfacing in-band error objects as API errors.
fn parse_chunk(data: &str) -> Result<CompletionChunk> {
    #[derive(Deserialize)]
    struct ErrorFrame {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
    }

    if let Ok(frame) = serde_json::from_str::<ErrorFrame>(data) {
        return Err(Error::api(
            500,
            frame.error.error_type.or_else(|| Some("stream_error".to_string())),
            frame
                .error
                .message
                .unwrap_or_else(|| data.to_string()),
            None,
        ));
    }

    serde_json::from_str::<CompletionChunk>(data).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn bytes_stream(chunks: Vec<&'static str>) -> impl Stream<Item = Result<Bytes>> + Unpin {
        stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect(chunks: Vec<&'static str>) -> Vec<Result<CompletionChunk>> {
        process_frames(bytes_stream(chunks)).collect().await
    }

    async fn collect_bytes(chunks: Vec<Vec<u8>>) -> Vec<Result<CompletionChunk>> {
        let stream = stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(Bytes::from(c)))
                .collect::<Vec<_>>(),
        );
        process_frames(stream).collect().await
    }

    fn content_frame(content: &str) -> Vec<u8> {
        format!("data: {{\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"{content}\"}}}}]}}\n\n")
            .into_bytes()
    }

    #[tokio::test]
    async fn parse_content_chunks_until_done() {
        let data = "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"2+2\"}}]}\n\n\
data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"=4\"}}]}\n\n\
data: [DONE]\n\n\
data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"ignored\"}}]}\n\n";
        let events = collect(vec![data]).await;
        assert_eq!(events.len(), 2);
        let text: String = events
            .iter()
            .map(|e| e.as_ref().unwrap().text().unwrap_or(""))
            .collect();
        assert_eq!(text, "2+2=4");
    }

    #[tokio::test]
    async fn handle_split_frame() {
        let events = collect(vec![
            "data: {\"choices\":[{\"index\":0,",
            "\"delta\":{\"content\":\"hi\"}}]}\n",
            "\ndata: [DONE]\n\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().text(), Some("hi"));
    }

    #[tokio::test]
    async fn handle_crlf_and_comments() {
        let events = collect(vec![
            ": keep-alive\r\n\r\ndata: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"ok\"}}]}\r\n\r\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().text(), Some("ok"));
    }

    #[tokio::test]
    async fn error_frame_becomes_api_error() {
        let events = collect(vec![
            "data: {\"error\":{\"type\":\"rate_limit\",\"message\":\"slow down\"}}\n\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        let err = events[0].as_ref().unwrap_err();
        assert!(err.to_string().contains("slow down"));
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let events = collect(vec![
            "data: {not json\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(Error::Serialization { .. })));
    }

    #[tokio::test]
    async fn trailing_frame_without_blank_line() {
        let events = collect(vec![
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"tail\"}}]}",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().text(), Some("tail"));
    }

    #[tokio::test]
    async fn transport_error_ends_stream() {
        let stream = stream::iter(vec![
            Ok(Bytes::from_static(
                b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"a\"}}]}\n\n",
            )),
            Err(Error::connection("reset", None)),
            Ok(Bytes::from_static(
                b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"b\"}}]}\n\n",
            )),
        ]);
        let events: Vec<_> = process_frames(stream).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(matches!(events[1], Err(Error::Connection { .. })));
    }

    #[tokio::test]
    async fn multibyte_character_split_across_reads() {
        let frame = content_frame("café");
        let split = frame.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let events = collect_bytes(vec![frame[..split].to_vec(), frame[split..].to_vec()]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().text(), Some("café"));
    }

    #[tokio::test]
    async fn one_byte_reads_reassemble_text() {
        let mut body = content_frame("日本 🚀");
        body.extend_from_slice(b"data: [DONE]\r\n\r\n");
        let events = collect_bytes(body.iter().map(|&b| vec![b]).collect()).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().text(), Some("日本 🚀"));
    }

    #[tokio::test]
    async fn invalid_utf8_is_an_error() {
        let events = collect_bytes(vec![b"data: \xFF\xFE\n\n".to_vec()]).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(Error::Encoding { .. })));
    }

    #[tokio::test]
    async fn stream_ending_mid_character_is_an_error() {
        let frame = content_frame("café");
        let split = frame.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let events = collect_bytes(vec![frame[..split].to_vec()]).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(Error::Encoding { .. })));
    }
}
