//! # BookRelay Gateway
//!
//! Push-delivery transport: one batched call per fan-out, one outcome per
//! token. The batch never fails because an individual token failed — only
//! transport-level errors surface as `Err`.

pub mod fcm;
pub mod outcome;

use async_trait::async_trait;
use bookrelay_core::error::Result;
use bookrelay_core::types::NotificationPayload;

pub use fcm::FcmGateway;
pub use outcome::{Delivery, SendOutcome, ERR_INVALID_TOKEN, ERR_TOKEN_NOT_REGISTERED};

/// Push gateway seam.
///
/// Contract: the returned outcomes correspond positionally (and by `token`
/// field) to the input token order, one outcome per token.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Send one payload to a batch of device tokens in a single gateway call.
    async fn send_batch(
        &self,
        tokens: &[String],
        payload: &NotificationPayload,
    ) -> Result<Vec<SendOutcome>>;
}
