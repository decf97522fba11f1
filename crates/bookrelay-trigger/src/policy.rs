//! Notification policy — pure decision functions, one per recipient role.
//!
//! Idempotence rests entirely on these being deterministic functions of the
//! two snapshots in the event: no "already notified" flag exists anywhere.
//! A recipient is only told about the *other* party's actions — a provider
//! never hears about its own acceptances, a user never about their own
//! cancellations.

use bookrelay_core::types::{Booking, BookingStatus, NotificationPayload, Transition};
use std::collections::BTreeMap;

/// Why a policy chose not to notify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Record deleted — terminal, never notifies.
    Deleted,
    /// Write did not move the status.
    Unchanged,
    /// The provider made this change itself.
    ChangedByProvider,
    /// The user made this change themselves.
    ChangedByUser,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Deleted => "deleted",
            Self::Unchanged => "unchanged",
            Self::ChangedByProvider => "changed by provider",
            Self::ChangedByUser => "changed by user",
        })
    }
}

/// The outcome of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Skip(SkipReason),
    Notify(NotificationPayload),
}

/// Provider-facing policy: fires only on statuses a *user* action produces.
///
/// `Created` always fires — there is no previous status to compare, and
/// only users create bookings. The payload is the human-readable alert
/// variant; the panel shows it as-is.
pub fn provider_decision(booking: &Booking, transition: Transition) -> Decision {
    match transition {
        Transition::Deleted => Decision::Skip(SkipReason::Deleted),
        Transition::Unchanged { .. } => Decision::Skip(SkipReason::Unchanged),
        Transition::Created { to } => Decision::Notify(alert_payload(booking, to)),
        Transition::StatusChanged { to, .. } if to.is_user_action() => {
            Decision::Notify(alert_payload(booking, to))
        }
        Transition::StatusChanged { .. } => Decision::Skip(SkipReason::ChangedByProvider),
    }
}

/// User-facing policy: fires only on statuses a *provider* action produces.
///
/// The payload is the structured data variant — the client app renders its
/// own UI from the identifiers.
pub fn user_decision(booking: &Booking, transition: Transition) -> Decision {
    match transition {
        Transition::Deleted => Decision::Skip(SkipReason::Deleted),
        Transition::Unchanged { .. } => Decision::Skip(SkipReason::Unchanged),
        Transition::Created { .. } => Decision::Skip(SkipReason::ChangedByUser),
        Transition::StatusChanged { to, .. } if to.is_provider_action() => {
            Decision::Notify(data_payload(booking, to))
        }
        Transition::StatusChanged { .. } => Decision::Skip(SkipReason::ChangedByUser),
    }
}

/// Human-readable alert for the provider panel.
fn alert_payload(booking: &Booking, to: BookingStatus) -> NotificationPayload {
    let title = match to {
        BookingStatus::Requested => "You have a new booking!".to_string(),
        BookingStatus::CancelledByUser => "A booking was cancelled".to_string(),
        other => {
            // The upstream title table had no default case and produced an
            // empty title here; degrade to a generic one instead.
            tracing::warn!("⚠️ No title mapped for status {}, using generic", other.code());
            "Booking updated".to_string()
        }
    };
    let body = format!(
        "{} from {}.",
        booking.service_name.as_deref().unwrap_or("A booking"),
        booking.user_name.as_deref().unwrap_or("a customer"),
    );
    NotificationPayload::Alert { title, body }
}

/// Identifier-only data bag for the client app.
fn data_payload(booking: &Booking, to: BookingStatus) -> NotificationPayload {
    let mut data = BTreeMap::new();
    data.insert("type".to_string(), "bookingStatus".to_string());
    data.insert("bookingId".to_string(), booking.booking_id.clone());
    data.insert("providerId".to_string(), booking.provider_id.clone());
    data.insert("status".to_string(), to.code().to_string());
    NotificationPayload::Data(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(status: i32) -> Booking {
        Booking {
            booking_id: "b1".into(),
            provider_id: "p1".into(),
            user_id: "u1".into(),
            status: BookingStatus::from(status),
            service_name: Some("Haircut".into()),
            user_name: Some("Alice".into()),
        }
    }

    fn changed(from: i32, to: i32) -> Transition {
        Transition::StatusChanged {
            from: BookingStatus::from(from),
            to: BookingStatus::from(to),
        }
    }

    #[test]
    fn test_provider_notified_on_creation() {
        let decision = provider_decision(
            &booking(0),
            Transition::Created { to: BookingStatus::Requested },
        );
        match decision {
            Decision::Notify(NotificationPayload::Alert { title, body }) => {
                assert_eq!(title, "You have a new booking!");
                assert_eq!(body, "Haircut from Alice.");
            }
            other => panic!("expected alert, got {other:?}"),
        }
    }

    #[test]
    fn test_provider_notified_on_user_cancel() {
        let decision = provider_decision(&booking(-2), changed(1, -2));
        assert!(matches!(decision, Decision::Notify(_)));
    }

    #[test]
    fn test_provider_skips_own_actions() {
        // 1 (accepted), -1 (rejected), -3 (provider cancel) are the
        // provider's own doing.
        for to in [1, -1, -3] {
            assert_eq!(
                provider_decision(&booking(to), changed(0, to)),
                Decision::Skip(SkipReason::ChangedByProvider),
            );
        }
    }

    #[test]
    fn test_user_notified_on_provider_actions() {
        for to in [1, -1, -3] {
            let decision = user_decision(&booking(to), changed(0, to));
            match decision {
                Decision::Notify(NotificationPayload::Data(data)) => {
                    assert_eq!(data["bookingId"], "b1");
                    assert_eq!(data["providerId"], "p1");
                    assert_eq!(data["status"], to.to_string());
                }
                other => panic!("expected data payload, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_user_skips_own_actions() {
        assert_eq!(
            user_decision(&booking(0), Transition::Created { to: BookingStatus::Requested }),
            Decision::Skip(SkipReason::ChangedByUser),
        );
        assert_eq!(
            user_decision(&booking(-2), changed(0, -2)),
            Decision::Skip(SkipReason::ChangedByUser),
        );
    }

    #[test]
    fn test_both_skip_deleted_and_unchanged() {
        let b = booking(1);
        let unchanged = Transition::Unchanged { status: BookingStatus::Accepted };
        assert_eq!(provider_decision(&b, Transition::Deleted), Decision::Skip(SkipReason::Deleted));
        assert_eq!(user_decision(&b, Transition::Deleted), Decision::Skip(SkipReason::Deleted));
        assert_eq!(provider_decision(&b, unchanged), Decision::Skip(SkipReason::Unchanged));
        assert_eq!(user_decision(&b, unchanged), Decision::Skip(SkipReason::Unchanged));
    }

    #[test]
    fn test_unmapped_status_gets_generic_title() {
        // Status 7 has no business meaning; the user-action set does not
        // include it, so only Created can reach the title table with it.
        let decision = provider_decision(
            &booking(7),
            Transition::Created { to: BookingStatus::Other(7) },
        );
        match decision {
            Decision::Notify(NotificationPayload::Alert { title, .. }) => {
                assert_eq!(title, "Booking updated");
            }
            other => panic!("expected alert, got {other:?}"),
        }
    }

    #[test]
    fn test_decisions_are_deterministic() {
        let b = booking(-2);
        let t = changed(1, -2);
        assert_eq!(provider_decision(&b, t), provider_decision(&b, t));
        assert_eq!(user_decision(&b, t), user_decision(&b, t));
    }
}
