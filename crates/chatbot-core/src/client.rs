use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::SendError;
use crate::state::Draft;

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    text: Option<Value>,
}

impl ChatReply {
    /// Strings come through as-is; other JSON values are shown in their
    /// JSON form, so `5` reads as "5".
    fn into_text(self) -> String {
        match self.text {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text,
            Some(other) => other.to_string(),
        }
    }
}

/// Multipart client for the inference endpoint. One POST per send, no
/// retries and no client-side timeout.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: Url,
}

impl ChatClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST the draft and return the reply's `text` field.
    ///
    /// `message` is always sent, even when empty. A non-2xx status is a
    /// [`SendError::Status`] whatever the body says; a 2xx whose body isn't
    /// JSON is treated like a failed connection. A missing or null `text`
    /// comes back as an empty reply; a non-string `text` is rendered as JSON.
    pub async fn send(&self, draft: &Draft) -> Result<String, SendError> {
        let mut form = Form::new().text("message", draft.text.clone());
        if let Some(attachment) = &draft.attachment {
            let part = Part::bytes(attachment.bytes().to_vec())
                .file_name(attachment.file_name().to_string());
            form = form.part("file", part);
        }

        debug!(
            endpoint = %self.endpoint,
            message_len = draft.text.len(),
            file = draft.attachment.as_ref().map(|a| a.file_name()),
            "Sending chat message"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Status(status));
        }

        let reply: ChatReply = response.json().await?;
        debug!(%status, "Received chat reply");
        Ok(reply.into_text())
    }
}
