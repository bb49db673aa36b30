use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::BackendConfig;
use crate::conversation::{ContactInfo, ThreadId};
use crate::progress::{self, Kind};

#[derive(Debug, Serialize)]
struct StartRequest<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    thread_id: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    thread_id: &'a str,
    message: MessageBody<'a>,
}

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: ReplyBody,
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    content: String,
}

/// HTTP client for the assistant backend.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    base_url: String,
    client: reqwest::Client,
}

impl AssistantClient {
    pub fn with_config(config: &BackendConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(AssistantClient {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn start_thread(&self, contact: &ContactInfo) -> Result<ThreadId> {
        let url = format!("{}/start", self.base_url);
        progress::log_with(Kind::Http, format!("POST {}", url));

        let request = StartRequest {
            name: &contact.name,
            email: &contact.email,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to reach assistant backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Start thread error ({}): {}", status, body));
        }

        let start: StartResponse = response
            .json()
            .await
            .context("Malformed start thread response")?;

        progress::log_with(Kind::Http, format!("thread {} opened", start.thread_id));
        Ok(ThreadId::new(start.thread_id))
    }

    pub async fn send_message(&self, thread_id: &ThreadId, text: &str) -> Result<String> {
        let url = format!("{}/chat", self.base_url);
        progress::log_with(
            Kind::Http,
            format!("POST {} (thread {}, {} chars)", url, thread_id, text.chars().count()),
        );

        let request = ChatRequest {
            thread_id: thread_id.as_str(),
            message: MessageBody { text },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to reach assistant backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Chat error ({}): {}", status, body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("Malformed chat response")?;

        Ok(chat.response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn client_for(url: &str) -> AssistantClient {
        AssistantClient::with_config(&BackendConfig {
            base_url: url.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn ada() -> ContactInfo {
        ContactInfo {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = client_for("http://localhost:9000/");
        assert_eq!(client.base_url(), "http://localhost:9000");
    }

    #[tokio::test]
    async fn test_start_thread() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/start")
            .match_body(Matcher::Json(json!({
                "name": "Ada",
                "email": "ada@example.com"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"thread_id":"t1"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let thread_id = client.start_thread(&ada()).await.unwrap();

        assert_eq!(thread_id, ThreadId::new("t1"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_start_thread_server_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/start")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client.start_thread(&ada()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_start_thread_missing_field() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/start")
            .with_status(200)
            .with_body(r#"{"id":"t1"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        assert!(client.start_thread(&ada()).await.is_err());
    }

    #[tokio::test]
    async fn test_send_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_body(Matcher::Json(json!({
                "thread_id": "t1",
                "message": { "text": "How do I reset my password?" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":{"content":"Click **Forgot password**.","role":"assistant"}}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let reply = client
            .send_message(&ThreadId::new("t1"), "How do I reset my password?")
            .await
            .unwrap();

        assert_eq!(reply, "Click **Forgot password**.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_message_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(404)
            .with_body("unknown thread")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .send_message(&ThreadId::new("gone"), "hello")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown thread"));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = client_for(&format!("http://127.0.0.1:{}", port));
        assert!(client.send_message(&ThreadId::new("t1"), "hello").await.is_err());
    }
}
