//! HTTP transport for OpenAI-style streaming chat completions.
//!
//! The response body is a Server-Sent Events stream: one `data: {json}` line
//! per chunk with the text in `choices[0].delta.content`, terminated by
//! `data: [DONE]`.

use std::io::{BufRead, BufReader, ErrorKind};
use std::path::PathBuf;
use std::time::Duration;

use control::{CompletionTransport, FragmentStream, OracleError};
use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::credentials::load_api_key;
use crate::error::Result;

/// Endpoint, model and sampling settings for the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub endpoint: String,
    pub model: String,
    /// File holding the bearer token; a leading `~` means `$HOME`
    pub key_path: PathBuf,
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub max_completion_tokens: Option<u32>,
    /// Deadline for one whole request, connection to last fragment
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::cerebras()
    }
}

impl TransportConfig {
    pub fn cerebras() -> Self {
        Self {
            endpoint: "https://api.cerebras.ai/v1/chat/completions".to_string(),
            model: "llama-4-scout-17b-16e-instruct".to_string(),
            key_path: PathBuf::from("~/.ssh/cerebras"),
            temperature: 0.0,
            top_p: Some(1.0),
            max_completion_tokens: Some(8192),
            timeout_secs: 60,
        }
    }

    pub fn openrouter() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "anthropic/claude-3-haiku".to_string(),
            key_path: PathBuf::from("~/.ssh/openrouter"),
            temperature: 0.1,
            top_p: None,
            max_completion_tokens: None,
            timeout_secs: 60,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// JSON request body for one streamed completion.
    pub fn request_body(&self, system: &str, prompt: &str) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
            "stream": true,
            "temperature": self.temperature,
        });
        if let Some(top_p) = self.top_p {
            body["top_p"] = json!(top_p);
        }
        if let Some(max_tokens) = self.max_completion_tokens {
            body["max_completion_tokens"] = json!(max_tokens);
        }
        body
    }
}

pub struct ChatCompletionsTransport {
    client: Client,
    config: TransportConfig,
    api_key: String,
}

impl ChatCompletionsTransport {
    pub fn new(config: TransportConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    /// Loads the API key named by the config. A missing key is fatal.
    pub fn from_config(config: TransportConfig) -> Result<Self> {
        let api_key = load_api_key(&config.key_path)?;
        Self::new(config, api_key)
    }
}

impl CompletionTransport for ChatCompletionsTransport {
    fn stream(
        &mut self,
        system: &str,
        prompt: &str,
    ) -> std::result::Result<FragmentStream<'_>, OracleError> {
        let timeout = self.config.timeout();
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.config.request_body(system, prompt))
            .send()
            .map_err(|err| request_error(err, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OracleError::transport(format!("{status}: {body}")));
        }

        debug!("streaming completion from {}", self.config.endpoint);
        Ok(Box::new(SseFragments::new(BufReader::new(response), timeout)))
    }
}

fn request_error(err: reqwest::Error, timeout: Duration) -> OracleError {
    if err.is_timeout() {
        OracleError::Timeout(timeout)
    } else {
        OracleError::transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Meaning of one line of an event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    Content(String),
    Error(String),
    Done,
    /// Comments, keep-alives, empty deltas and undecodable payloads
    Skip,
}

pub fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return SseLine::Done;
    }

    let chunk: ChatChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(_) => return SseLine::Skip,
    };
    if let Some(error) = chunk.error {
        return SseLine::Error(error.to_string());
    }
    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map_or(SseLine::Skip, SseLine::Content)
}

/// Iterator over the text fragments of an event stream.
pub struct SseFragments<R> {
    reader: R,
    timeout: Duration,
    done: bool,
}

impl<R: BufRead> SseFragments<R> {
    pub fn new(reader: R, timeout: Duration) -> Self {
        Self {
            reader,
            timeout,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for SseFragments<R> {
    type Item = std::result::Result<String, OracleError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        while !self.done {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => self.done = true,
                Ok(_) => match parse_sse_line(&line) {
                    SseLine::Content(text) => return Some(Ok(text)),
                    SseLine::Error(message) => {
                        self.done = true;
                        return Some(Err(OracleError::stream(message)));
                    }
                    SseLine::Done => self.done = true,
                    SseLine::Skip => {}
                },
                Err(err) => {
                    self.done = true;
                    let err = match err.kind() {
                        ErrorKind::TimedOut | ErrorKind::WouldBlock => {
                            OracleError::Timeout(self.timeout)
                        }
                        _ => OracleError::stream(err.to_string()),
                    };
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read};

    /// Reader whose every read times out.
    struct Stalled(ErrorKind);

    impl Read for Stalled {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(self.0, "read stalled"))
        }
    }

    fn fragments(body: &str) -> Vec<std::result::Result<String, OracleError>> {
        SseFragments::new(Cursor::new(body.to_string()), Duration::from_secs(1)).collect()
    }

    #[test]
    fn test_parse_content_line() {
        let line = r#"data: {"choices":[{"index":0,"delta":{"content":"4.55"}}]}"#;
        assert_eq!(parse_sse_line(line), SseLine::Content("4.55".to_string()));
    }

    #[test]
    fn test_parse_control_lines() {
        assert_eq!(parse_sse_line("data: [DONE]"), SseLine::Done);
        assert_eq!(parse_sse_line(": keep-alive"), SseLine::Skip);
        assert_eq!(parse_sse_line(""), SseLine::Skip);
        assert_eq!(parse_sse_line("data: {not json"), SseLine::Skip);
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            SseLine::Skip
        );
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"content":""}}]}"#),
            SseLine::Skip
        );
    }

    #[test]
    fn test_error_payload() {
        let line = r#"data: {"error":{"message":"rate limited"}}"#;
        assert!(matches!(parse_sse_line(line), SseLine::Error(m) if m.contains("rate limited")));
    }

    #[test]
    fn test_stream_stops_at_done() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"4.55\"}}]}\n\n\
                    : OPENROUTER PROCESSING\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\" 2.48\"}}]}\n\
                    data: [DONE]\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n";
        let texts: Vec<String> = fragments(body).into_iter().map(|f| f.unwrap()).collect();
        assert_eq!(texts, ["4.55", " 2.48"]);
    }

    #[test]
    fn test_stream_without_done_ends_at_eof() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"1\"}}]}";
        assert_eq!(fragments(body).len(), 1);
    }

    #[test]
    fn test_stream_error_ends_stream() {
        let body = "data: {\"error\":\"boom\"}\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"1\"}}]}\n";
        let items = fragments(body);
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(OracleError::Stream(_))));
    }

    #[test]
    fn test_read_timeout_ends_stream_with_timeout() {
        for kind in [ErrorKind::TimedOut, ErrorKind::WouldBlock] {
            let body = Cursor::new("data: {\"choices\":[{\"delta\":{\"content\":\"4.55\"}}]}\n");
            let reader = BufReader::new(body.chain(Stalled(kind)));
            let items: Vec<_> = SseFragments::new(reader, Duration::from_secs(7)).collect();

            assert_eq!(items.len(), 2);
            assert_eq!(items[0].as_ref().unwrap(), "4.55");
            assert!(matches!(
                items[1],
                Err(OracleError::Timeout(d)) if d == Duration::from_secs(7)
            ));
        }
    }

    #[test]
    fn test_other_read_errors_are_stream_errors() {
        let reader = BufReader::new(Stalled(ErrorKind::ConnectionReset));
        let items: Vec<_> = SseFragments::new(reader, Duration::from_secs(1)).collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(OracleError::Stream(_))));
    }

    #[test]
    fn test_request_body_presets() {
        let body = TransportConfig::cerebras().request_body("sys", "prompt");
        assert_eq!(body["stream"], json!(true));
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "prompt");
        assert_eq!(body["max_completion_tokens"], json!(8192));
        assert_eq!(body["top_p"], json!(1.0));

        let body = TransportConfig::openrouter().request_body("sys", "prompt");
        assert_eq!(body["model"], "anthropic/claude-3-haiku");
        assert_eq!(body["temperature"], json!(0.1));
        assert!(body.get("top_p").is_none());
        assert!(body.get("max_completion_tokens").is_none());
    }
}
