//! LINE channel: webhook signature verification, payload parsing, and the reply API.

use crate::channels::event::{InboundEvent, WebhookPayload};
use crate::channels::reply::ReplySender;
use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

const LINE_API_BASE: &str = "https://api.line.me";

/// Header carrying base64(HMAC-SHA256(channel secret, body)).
pub const SIGNATURE_HEADER: &str = "x-line-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("line request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("line api error: {status} {body}")]
    Api { status: u16, body: String },
}

/// Why an inbound webhook call was rejected.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("malformed webhook payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Check `signature` (base64) against HMAC-SHA256 of `body` keyed by `channel_secret`. Constant-time compare.
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(channel_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Verify the signature, then decode the event batch. A missing signature counts as invalid.
pub fn parse_request(
    channel_secret: &str,
    signature: Option<&str>,
    body: &[u8],
) -> Result<Vec<InboundEvent>, WebhookError> {
    let signature = signature.ok_or(WebhookError::InvalidSignature)?;
    if !verify_signature(channel_secret, body, signature) {
        return Err(WebhookError::InvalidSignature);
    }
    let payload: WebhookPayload = serde_json::from_slice(body)?;
    Ok(payload.events)
}

#[derive(Debug, Serialize)]
struct ReplyTextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: Vec<ReplyTextMessage<'a>>,
}

/// Client for the LINE Messaging API reply endpoint.
#[derive(Clone)]
pub struct LineClient {
    base_url: String,
    access_token: String,
    client: reqwest::Client,
}

impl LineClient {
    pub fn new(access_token: impl Into<String>, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| LINE_API_BASE.to_string());
        Self {
            base_url,
            access_token: access_token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// POST /v2/bot/message/reply with a single text message.
    pub async fn reply_message(&self, reply_token: &str, text: &str) -> Result<(), LineError> {
        let url = format!("{}/v2/bot/message/reply", self.base_url);
        let body = ReplyRequest {
            reply_token,
            messages: vec![ReplyTextMessage { kind: "text", text }],
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(LineError::Api { status, body });
        }
        Ok(())
    }
}

#[async_trait]
impl ReplySender for LineClient {
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), LineError> {
        self.reply_message(reply_token, text).await
    }
}

impl std::fmt::Debug for LineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Compute the signature LINE would send for `body`. Used by tests and local tooling.
pub fn sign(channel_secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}
