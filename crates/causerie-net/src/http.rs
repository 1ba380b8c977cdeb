//! `reqwest`-backed [`ChatGateway`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use causerie_shared::types::{Message, NewMessage, Participant, SessionInfo};

use crate::error::{GatewayError, Result};
use crate::gateway::ChatGateway;

/// HTTP client for the chat API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    /// Build a gateway rooted at `base_url` (e.g. `https://host/api`).
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| GatewayError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!(url = %url, "GET");
        let resp = self.client.get(url).send().await?;
        let body = check_status(resp).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Fail on any non-success status, surfacing the code and body text.
async fn check_status(resp: Response) -> Result<String> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

#[async_trait]
impl ChatGateway for HttpGateway {
    async fn session_info(&self) -> Result<SessionInfo> {
        self.get_json(&["info"]).await
    }

    async fn latest_messages(&self) -> Result<Vec<Message>> {
        self.get_json(&["messages", "latest"]).await
    }

    async fn older_messages(&self, ref_message_uuid: &str) -> Result<Vec<Message>> {
        self.get_json(&["messages", "older", ref_message_uuid]).await
    }

    async fn all_messages(&self) -> Result<Vec<Message>> {
        self.get_json(&["messages", "all"]).await
    }

    async fn message_updates(&self, since_millis: i64) -> Result<Vec<Message>> {
        let since = since_millis.to_string();
        self.get_json(&["messages", "updates", &since]).await
    }

    async fn participant_updates(&self, since_millis: i64) -> Result<Vec<Participant>> {
        let since = since_millis.to_string();
        self.get_json(&["participants", "updates", &since]).await
    }

    async fn all_participants(&self) -> Result<Vec<Participant>> {
        self.get_json(&["participants", "all"]).await
    }

    async fn create_message(&self, text: &str) -> Result<Option<Message>> {
        let url = self.endpoint(&["messages", "new"])?;
        debug!(url = %url, len = text.len(), "POST");
        let resp = self
            .client
            .post(url)
            .json(&NewMessage {
                text: text.to_string(),
            })
            .send()
            .await?;
        let body = check_status(resp).await?;

        match serde_json::from_str::<Message>(&body) {
            Ok(message) => Ok(Some(message)),
            Err(e) => {
                debug!(error = %e, "Create response is not a message, treating as ack");
                Ok(None)
            }
        }
    }
}
