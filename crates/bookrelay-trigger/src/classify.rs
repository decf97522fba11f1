//! Change classification — the before/after snapshots of one write become a
//! semantic [`Transition`]. Pure, no side effects.

use bookrelay_core::types::{Booking, Transition};

/// Classify one booking mutation.
///
/// A record that exists but carries no identity (an empty object the store
/// materialized for a half-written path) is treated as absent.
pub fn classify(previous: Option<&Booking>, current: Option<&Booking>) -> Transition {
    let previous = previous.filter(|b| !b.is_blank());
    let current = current.filter(|b| !b.is_blank());

    match (previous, current) {
        (_, None) => Transition::Deleted,
        (None, Some(current)) => Transition::Created { to: current.status },
        (Some(previous), Some(current)) if previous.status == current.status => {
            Transition::Unchanged { status: current.status }
        }
        (Some(previous), Some(current)) => Transition::StatusChanged {
            from: previous.status,
            to: current.status,
        },
    }
}
