//! Reply seam: the router sends text replies through this trait so tests can supply a fake.

use crate::channels::line::LineError;
use async_trait::async_trait;

/// Sends a text reply addressed by a single-use reply token.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), LineError>;
}
