//! Domain types: bookings, status codes, change events, transitions, and
//! notification payload shapes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Booking lifecycle status.
///
/// The wire format is a signed small integer owned by the booking writers;
/// the named variants record the observed business conventions. Codes this
/// relay has never seen are preserved as [`BookingStatus::Other`] rather
/// than rejected — policies simply never match them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum BookingStatus {
    /// `0` — newly created / requested by the user.
    Requested,
    /// `1` — accepted by the provider.
    Accepted,
    /// `-1` — rejected by the provider.
    Rejected,
    /// `-2` — cancelled by the user.
    CancelledByUser,
    /// `-3` — cancelled by the provider.
    CancelledByProvider,
    /// Any code without a known business meaning.
    Other(i32),
}

impl From<i32> for BookingStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Requested,
            1 => Self::Accepted,
            -1 => Self::Rejected,
            -2 => Self::CancelledByUser,
            -3 => Self::CancelledByProvider,
            other => Self::Other(other),
        }
    }
}

impl From<BookingStatus> for i32 {
    fn from(status: BookingStatus) -> i32 {
        match status {
            BookingStatus::Requested => 0,
            BookingStatus::Accepted => 1,
            BookingStatus::Rejected => -1,
            BookingStatus::CancelledByUser => -2,
            BookingStatus::CancelledByProvider => -3,
            BookingStatus::Other(code) => code,
        }
    }
}

impl BookingStatus {
    /// The raw wire code.
    pub fn code(self) -> i32 {
        self.into()
    }

    /// Statuses produced by a *user* action. The provider is notified of
    /// these and only these — never of its own actions.
    pub fn is_user_action(self) -> bool {
        matches!(self, Self::Requested | Self::CancelledByUser)
    }

    /// Statuses produced by a *provider* action. The user is notified of
    /// these and only these.
    pub fn is_provider_action(self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::Rejected | Self::CancelledByProvider
        )
    }
}

/// A booking record as it appears in the change feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    #[serde(default, rename = "bookingId")]
    pub booking_id: String,
    #[serde(default, rename = "providerId")]
    pub provider_id: String,
    #[serde(default, rename = "userId")]
    pub user_id: String,
    #[serde(default = "default_status")]
    pub status: BookingStatus,
    #[serde(default, rename = "serviceName")]
    pub service_name: Option<String>,
    #[serde(default, rename = "userName")]
    pub user_name: Option<String>,
}

fn default_status() -> BookingStatus {
    BookingStatus::Requested
}

impl Booking {
    /// A record that deserialized but carries no identity at all.
    /// The feed occasionally materializes empty objects for paths that were
    /// never fully written; they are treated as absent, not as bookings.
    pub fn is_blank(&self) -> bool {
        self.booking_id.is_empty() && self.provider_id.is_empty() && self.user_id.is_empty()
    }
}

/// One write to a booking path: the record before and after the mutation.
/// `previous` is absent on creation, `current` is absent on deletion.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub provider_id: String,
    pub booking_id: String,
    pub previous: Option<Booking>,
    pub current: Option<Booking>,
}

/// Semantic classification of a booking mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Record appeared with no previous value.
    Created { to: BookingStatus },
    /// Status moved from one value to another.
    StatusChanged {
        from: BookingStatus,
        to: BookingStatus,
    },
    /// Record was written but the status did not move.
    Unchanged { status: BookingStatus },
    /// Record was removed (or was never really there).
    Deleted,
}

/// Which side of a booking a set of delivery tokens belongs to.
/// Maps onto the registry path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Provider staff devices (the booking management panel).
    Panel,
    /// End-user devices (the client app).
    Client,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Panel => "panel",
            Self::Client => "client",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What gets pushed to a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationPayload {
    /// Human-readable notification rendered by the OS.
    Alert { title: String, body: String },
    /// Structured key/value bag; the client renders its own UI from it.
    Data(BTreeMap<String, String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for code in [-3, -2, -1, 0, 1, 7] {
            let status = BookingStatus::from(code);
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn test_status_actor_sides() {
        assert!(BookingStatus::Requested.is_user_action());
        assert!(BookingStatus::CancelledByUser.is_user_action());
        assert!(!BookingStatus::Accepted.is_user_action());

        assert!(BookingStatus::Accepted.is_provider_action());
        assert!(BookingStatus::Rejected.is_provider_action());
        assert!(BookingStatus::CancelledByProvider.is_provider_action());
        assert!(!BookingStatus::Requested.is_provider_action());
        assert!(!BookingStatus::Other(42).is_provider_action());
    }

    #[test]
    fn test_booking_deserialize_wire_shape() {
        let booking: Booking = serde_json::from_value(serde_json::json!({
            "bookingId": "b1",
            "providerId": "p1",
            "userId": "u1",
            "status": -2,
            "serviceName": "Haircut",
            "userName": "Alice"
        }))
        .unwrap();
        assert_eq!(booking.status, BookingStatus::CancelledByUser);
        assert_eq!(booking.service_name.as_deref(), Some("Haircut"));
        assert!(!booking.is_blank());
    }

    #[test]
    fn test_empty_object_is_blank() {
        let booking: Booking = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(booking.is_blank());
    }

    #[test]
    fn test_role_path_segment() {
        assert_eq!(Role::Panel.as_str(), "panel");
        assert_eq!(Role::Client.as_str(), "client");
    }
}
