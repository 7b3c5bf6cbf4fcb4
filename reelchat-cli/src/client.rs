use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Talks to a running reelchat server
pub struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    user_message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    pub bot_reply: String,
    pub session_id: String,
}

impl ApiClient {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| "http://localhost:8000".to_string());
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn chat(&self, message: &str, session_id: Option<&str>) -> Result<ChatReply> {
        let url = format!("{}/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ChatRequest {
                user_message: message,
                session_id,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Server returned error: {}", response.status());
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_chat_posts_message_and_session() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_body(Matcher::Json(serde_json::json!({
                "user_message": "Anything like Alien?",
                "session_id": "s-1"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"bot_reply":"Try Event Horizon.","session_id":"s-1"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(Some(format!("{}/", server.url())));
        let reply = client.chat("Anything like Alien?", Some("s-1")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply.bot_reply, "Try Event Horizon.");
        assert_eq!(reply.session_id, "s-1");
    }

    #[tokio::test]
    async fn test_chat_omits_missing_session() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_body(Matcher::Json(serde_json::json!({ "user_message": "hi" })))
            .with_status(200)
            .with_body(r#"{"bot_reply":"Hello!","session_id":"generated"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(Some(server.url()));
        let reply = client.chat("hi", None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply.session_id, "generated");
    }

    #[tokio::test]
    async fn test_chat_reports_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(422)
            .create_async()
            .await;

        let client = ApiClient::new(Some(server.url()));
        let err = client.chat("hi", None).await.unwrap_err();
        assert!(err.to_string().contains("422"));
    }
}
