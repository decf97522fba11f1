//! Per-token delivery outcomes and the gateway's permanent-invalidity codes.

use serde::{Deserialize, Serialize};

/// The token is malformed and will never be deliverable.
pub const ERR_INVALID_TOKEN: &str = "messaging/invalid-registration-token";
/// The device unregistered; the token is dead.
pub const ERR_TOKEN_NOT_REGISTERED: &str = "messaging/registration-token-not-registered";

/// What happened to a single token within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delivery {
    /// The gateway accepted the message for this device.
    Delivered { message_id: Option<String> },
    /// The gateway refused this device, with a machine-readable code.
    Failed { code: String },
}

impl Delivery {
    /// True when the failure code marks the token permanently invalid.
    /// Transient codes (rate limits, server unavailable) return false —
    /// those tokens are kept.
    pub fn is_permanent_failure(&self) -> bool {
        match self {
            Self::Delivered { .. } => false,
            Self::Failed { code } => {
                code == ERR_INVALID_TOKEN || code == ERR_TOKEN_NOT_REGISTERED
            }
        }
    }
}

/// One token's result within a batched send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    pub token: String,
    pub delivery: Delivery,
}

impl SendOutcome {
    pub fn delivered(token: impl Into<String>, message_id: Option<String>) -> Self {
        Self {
            token: token.into(),
            delivery: Delivery::Delivered { message_id },
        }
    }

    pub fn failed(token: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            delivery: Delivery::Failed { code: code.into() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_codes() {
        assert!(SendOutcome::failed("t", ERR_INVALID_TOKEN)
            .delivery
            .is_permanent_failure());
        assert!(SendOutcome::failed("t", ERR_TOKEN_NOT_REGISTERED)
            .delivery
            .is_permanent_failure());
    }

    #[test]
    fn test_transient_codes_are_not_permanent() {
        assert!(!SendOutcome::failed("t", "messaging/device-message-rate-exceeded")
            .delivery
            .is_permanent_failure());
        assert!(!SendOutcome::failed("t", "messaging/server-unavailable")
            .delivery
            .is_permanent_failure());
    }

    #[test]
    fn test_delivered_is_not_failure() {
        assert!(!SendOutcome::delivered("t", Some("mid-1".into()))
            .delivery
            .is_permanent_failure());
    }
}
