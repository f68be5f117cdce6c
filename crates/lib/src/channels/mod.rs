//! Messaging channel (LINE).
//!
//! Webhook event model, signature verification, and the reply API. The router
//! talks to the reply API only through [`ReplySender`].

mod event;
mod line;
mod reply;

pub use event::{
    EventSource, EventType, InboundEvent, LocationMessage, MediaMessage, Message,
    StickerMessage, TextMessage, WebhookPayload,
};
pub use line::{
    parse_request, sign, verify_signature, LineClient, LineError, WebhookError,
    SIGNATURE_HEADER,
};
pub use reply::ReplySender;
