use std::path::Path;

use reqwest::multipart;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, instrument};

use tia_core::render::Artifact;

const GRAPH_API_BASE: &str = "https://graph.facebook.com";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http transport failure: {0}")]
    Http(#[from] reqwest::Error),
    #[error("graph api rejected the request ({status}): {detail}")]
    Api { status: u16, detail: String },
    #[error("reading media file: {0}")]
    Media(#[from] std::io::Error),
    #[error("media upload response carried no id")]
    MissingMediaId,
}

/// Outbound half of the WhatsApp Cloud API: plain sends against the Graph
/// endpoint for one registered phone number.
#[derive(Clone)]
pub struct WhatsAppClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
    phone_number_id: String,
    access_token: SecretString,
}

impl WhatsAppClient {
    pub fn new(
        access_token: SecretString,
        phone_number_id: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: GRAPH_API_BASE.to_string(),
            api_version: api_version.into(),
            phone_number_id: phone_number_id.into(),
            access_token,
        }
    }

    /// Points the client at a different host. Test servers only.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{}/{}/{resource}", self.base_url, self.api_version, self.phone_number_id)
    }

    async fn post_json(&self, resource: &str, body: &Value) -> Result<Value, TransportError> {
        let response = self
            .http
            .post(self.endpoint(resource))
            .bearer_auth(self.access_token.expose_secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TransportError::Api { status: status.as_u16(), detail });
        }
        Ok(response.json().await?)
    }

    #[instrument(skip(self, body), fields(to = to))]
    pub async fn send_text(&self, to: &str, body: &str) -> Result<(), TransportError> {
        self.post_json("messages", &text_body(to, body)).await?;
        debug!("text message delivered");
        Ok(())
    }

    /// Uploads the file to the media endpoint, then sends an image message
    /// referencing the returned media id.
    #[instrument(skip(self, path, caption), fields(to = to))]
    pub async fn send_image(
        &self,
        to: &str,
        path: &Path,
        caption: &str,
    ) -> Result<(), TransportError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.png".to_string());
        let mime = mime_for(path);

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(TransportError::Http)?;
        let form = multipart::Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", mime.to_string())
            .part("file", part);

        let response = self
            .http
            .post(self.endpoint("media"))
            .bearer_auth(self.access_token.expose_secret())
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TransportError::Api { status: status.as_u16(), detail });
        }
        let uploaded: Value = response.json().await?;
        let media_id = uploaded["id"].as_str().ok_or(TransportError::MissingMediaId)?;

        self.post_json("messages", &image_body(to, media_id, caption)).await?;
        debug!("image message delivered");
        Ok(())
    }

    pub async fn mark_read(&self, message_id: &str) -> Result<(), TransportError> {
        self.post_json("messages", &read_receipt_body(message_id)).await?;
        Ok(())
    }

    /// Sends a rendered artifact: text tables go out as a single message,
    /// images via the media upload path.
    pub async fn send_artifact(&self, to: &str, artifact: &Artifact) -> Result<(), TransportError> {
        match artifact {
            Artifact::Text { caption, body } => {
                self.send_text(to, &format!("{caption}\n\n{body}")).await
            }
            Artifact::Image { caption, path } => self.send_image(to, path, caption).await,
        }
    }
}

fn text_body(to: &str, body: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "text",
        "text": {"preview_url": false, "body": body}
    })
}

fn image_body(to: &str, media_id: &str, caption: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "image",
        "image": {"id": media_id, "caption": caption}
    })
}

fn read_receipt_body(message_id: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "status": "read",
        "message_id": message_id
    })
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}
