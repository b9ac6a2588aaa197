use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use tia_agent::{AgentRuntime, UNSUPPORTED_MESSAGE_REPLY};

use crate::client::WhatsAppClient;

/// Query parameters Meta sends on the one-time webhook verification GET.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: String,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: String,
    #[serde(rename = "hub.challenge")]
    pub challenge: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("unsupported hub.mode `{0}`")]
    Mode(String),
    #[error("verify token mismatch")]
    Token,
}

/// Echoes the challenge back when mode and token check out. Anything else is
/// a 403 upstream.
pub fn verify_handshake(
    params: &VerifyParams,
    expected_token: &SecretString,
) -> Result<String, VerifyError> {
    if params.mode != "subscribe" {
        return Err(VerifyError::Mode(params.mode.clone()));
    }
    if params.verify_token != expected_token.expose_secret() {
        return Err(VerifyError::Token);
    }
    Ok(params.challenge.clone())
}

// Inbound notification envelope: entry -> changes -> value -> messages.
// Status-only notifications carry no messages and decode to an empty list.

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub from: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextPayload>,
}

#[derive(Debug, Deserialize)]
pub struct TextPayload {
    pub body: String,
}

/// One inbound message flattened out of the envelope. `text` is `None` for
/// kinds the advisor cannot read (audio, image, sticker, reaction).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundText {
    pub sender: String,
    pub message_id: String,
    pub text: Option<String>,
}

pub fn extract_messages(payload: WebhookPayload) -> Vec<InboundText> {
    payload
        .entry
        .into_iter()
        .flat_map(|entry| entry.changes)
        .flat_map(|change| change.value.messages)
        .map(|message| {
            let text = if message.kind == "text" {
                message.text.map(|payload| payload.body)
            } else {
                None
            };
            InboundText { sender: message.from, message_id: message.id, text }
        })
        .collect()
}

pub struct WebhookState {
    pub runtime: AgentRuntime,
    pub client: WhatsAppClient,
    pub verify_token: SecretString,
}

/// The two webhook routes the Cloud API talks to: GET for the verification
/// handshake, POST for message notifications.
pub fn router(state: Arc<WebhookState>) -> Router {
    Router::new().route("/webhook", get(handle_verify).post(handle_notification)).with_state(state)
}

async fn handle_verify(
    State(state): State<Arc<WebhookState>>,
    Query(params): Query<VerifyParams>,
) -> (StatusCode, String) {
    match verify_handshake(&params, &state.verify_token) {
        Ok(challenge) => {
            info!("webhook verification succeeded");
            (StatusCode::OK, challenge)
        }
        Err(error) => {
            warn!(%error, "webhook verification rejected");
            (StatusCode::FORBIDDEN, "forbidden".to_string())
        }
    }
}

/// Always answers 200; the platform retries on anything else and the failure
/// belongs in our logs, not in a redelivery storm.
async fn handle_notification(
    State(state): State<Arc<WebhookState>>,
    Json(raw): Json<Value>,
) -> StatusCode {
    let payload: WebhookPayload = match serde_json::from_value(raw) {
        Ok(payload) => payload,
        Err(error) => {
            warn!(%error, "undecodable webhook payload");
            return StatusCode::OK;
        }
    };

    for inbound in extract_messages(payload) {
        let span = info_span!(
            "inbound_message",
            correlation_id = %Uuid::new_v4(),
            message_id = %inbound.message_id
        );
        async {
            if let Err(error) = state.client.mark_read(&inbound.message_id).await {
                warn!(%error, "read receipt failed");
            }

            match &inbound.text {
                Some(text) => {
                    if let Err(error) = respond(&state, &inbound.sender, text).await {
                        error!(%error, sender = %inbound.sender, "turn failed");
                    }
                }
                None => {
                    if let Err(error) =
                        state.client.send_text(&inbound.sender, UNSUPPORTED_MESSAGE_REPLY).await
                    {
                        warn!(%error, sender = %inbound.sender, "fallback reply failed");
                    }
                }
            }
        }
        .instrument(span)
        .await;
    }

    StatusCode::OK
}

async fn respond(state: &WebhookState, sender: &str, text: &str) -> anyhow::Result<()> {
    let response = state.runtime.process_message(sender, text).await?;
    for reply in &response.replies {
        state.client.send_text(sender, reply).await?;
    }
    for artifact in &response.artifacts {
        state.client.send_artifact(sender, artifact).await?;
    }
    Ok(())
}
