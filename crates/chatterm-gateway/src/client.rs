//! HTTP client for the chat completions service.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use chatterm_core::{CompletionResult, ConversationRequest, Message, Role};

use crate::channel::ResponseSender;
use crate::error::{GatewayError, Result};
use crate::protocol::*;

/// Connection settings for a [`CompletionGateway`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    /// `None` waits for the provider indefinitely.
    pub timeout: Option<Duration>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
///
/// Built once at startup and shared behind an `Arc`. It does not stop
/// concurrent calls; the session only hands out one request at a time.
pub struct CompletionGateway {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl CompletionGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            api_key: config.api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the conversation and return the first choice's message.
    #[instrument(skip(self, request), fields(messages = request.messages.len()))]
    pub async fn complete(&self, request: &ConversationRequest) -> Result<Message> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|env| env.error.message)
                .unwrap_or_else(|_| text.trim().to_string());
            return Err(GatewayError::Api { status, message });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(GatewayError::NoChoices)?;
        let role = Role::from_wire(&choice.message.role).unwrap_or(Role::Assistant);
        let content = choice.message.content.unwrap_or_default();
        debug!(%role, chars = content.len(), "Completion received");
        Ok(Message::new(role, content))
    }

    /// Run [`complete`](Self::complete) on a background task and deliver
    /// exactly one result to `responses`.
    pub fn submit(self: &Arc<Self>, request: ConversationRequest, responses: ResponseSender) {
        let gateway = Arc::clone(self);
        tokio::spawn(async move {
            let result = match gateway.complete(&request).await {
                Ok(message) => {
                    info!("Completion succeeded");
                    CompletionResult::Reply(message)
                }
                Err(e) => {
                    error!("Completion failed: {}", e);
                    CompletionResult::Failed(e.to_string())
                }
            };
            if !responses.deliver(result).await {
                debug!("Render loop closed before the completion arrived");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::response_channel;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(status: u16, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
        let addr = listener.local_addr().expect("addr");
        let (req_tx, req_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let request = read_request(&mut stream).await;
            let _ = req_tx.send(request);
            let reason = match status {
                200 => "OK",
                401 => "Unauthorized",
                _ => "Error",
            };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.flush().await;
        });

        (format!("http://{addr}/v1"), req_rx)
    }

    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.expect("read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn gateway(base_url: String) -> CompletionGateway {
        gateway_with_timeout(base_url, Some(Duration::from_secs(5)))
    }

    fn gateway_with_timeout(base_url: String, timeout: Option<Duration>) -> CompletionGateway {
        CompletionGateway::new(GatewayConfig {
            base_url,
            model: "gpt-3.5-turbo".to_string(),
            api_key: "sk-test".to_string(),
            timeout,
        })
        .expect("build gateway")
    }

    /// Accept one connection, read the request and never answer.
    async fn serve_silently() -> (String, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
        let addr = listener.local_addr().expect("addr");
        let (done_tx, done_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let _request = read_request(&mut stream).await;
            // Hold the socket open until the test is finished with it.
            let _ = done_rx.await;
        });

        (format!("http://{addr}/v1"), done_tx)
    }

    fn hello() -> ConversationRequest {
        ConversationRequest {
            messages: vec![Message::system("Be brief."), Message::user("Hello")],
        }
    }

    #[tokio::test]
    async fn complete_returns_first_choice() {
        let (url, request_rx) = serve_once(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"Hi there!"}},{"message":{"role":"assistant","content":"ignored"}}]}"#,
        )
        .await;

        let reply = gateway(url).complete(&hello()).await.unwrap();
        assert_eq!(reply, Message::assistant("Hi there!"));

        let raw = request_rx.await.unwrap();
        assert!(raw.starts_with("POST /v1/chat/completions"));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        let body = &raw[raw.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Hello"}
                ]
            })
        );
    }

    #[tokio::test]
    async fn api_error_uses_provider_message() {
        let (url, _request) = serve_once(
            401,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        )
        .await;

        let err = gateway(url).complete(&hello()).await.unwrap_err();
        match err {
            GatewayError::Api { status, message } => {
                assert_eq!(status.as_u16(), 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let (url, _request) = serve_once(200, r#"{"choices":[]}"#).await;
        let err = gateway(url).complete(&hello()).await.unwrap_err();
        assert!(matches!(err, GatewayError::NoChoices));
    }

    #[tokio::test]
    async fn unknown_role_is_shown_as_assistant() {
        let (url, _request) = serve_once(
            200,
            r#"{"choices":[{"message":{"role":"tool","content":"42"}}]}"#,
        )
        .await;
        let reply = gateway(url).complete(&hello()).await.unwrap();
        assert_eq!(reply.role, Role::Assistant);
    }

    #[tokio::test]
    async fn submit_delivers_exactly_one_result() {
        let (url, _request) = serve_once(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"pong"}}]}"#,
        )
        .await;
        let gateway = Arc::new(gateway(url));
        let (tx, mut rx) = response_channel();

        gateway.submit(hello(), tx);

        assert_eq!(
            rx.recv().await,
            Some(CompletionResult::Reply(Message::assistant("pong")))
        );
        // The task's sender is gone once it has delivered.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn unreachable_provider_becomes_failed_result() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gateway = Arc::new(gateway(format!("http://{addr}/v1")));
        let (tx, mut rx) = response_channel();
        gateway.submit(hello(), tx);

        match rx.recv().await {
            Some(CompletionResult::Failed(message)) => assert!(!message.is_empty()),
            other => panic!("expected a failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn silent_provider_times_out() {
        let (url, _hold) = serve_silently().await;
        let gateway = gateway_with_timeout(url, Some(Duration::from_millis(300)));

        let err = gateway.complete(&hello()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout), "got {err:?}");
    }

    #[tokio::test]
    async fn timed_out_submit_delivers_failed_result() {
        let (url, _hold) = serve_silently().await;
        let gateway = Arc::new(gateway_with_timeout(url, Some(Duration::from_millis(300))));
        let (tx, mut rx) = response_channel();

        gateway.submit(hello(), tx);

        let delivered = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timeout should fire before the test deadline");
        assert_eq!(
            delivered,
            Some(CompletionResult::Failed("request timed out".to_string()))
        );
    }
}
