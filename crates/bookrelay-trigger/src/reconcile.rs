//! Registry reconciliation — tokens the gateway proved permanently dead get
//! removed, everything else stays.

use bookrelay_core::types::Role;
use bookrelay_gateway::outcome::{Delivery, SendOutcome};
use bookrelay_registry::TokenRegistry;
use futures::future::join_all;

/// Select the tokens whose outcome carries one of the permanent-invalidity
/// codes. Transient failures are logged by the caller and kept.
pub fn invalid_tokens(outcomes: &[SendOutcome]) -> Vec<&str> {
    outcomes
        .iter()
        .filter(|o| o.delivery.is_permanent_failure())
        .map(|o| o.token.as_str())
        .collect()
}

/// Remove permanently-invalid tokens from a recipient's set.
///
/// Removals run concurrently and are awaited collectively; an individual
/// removal failure is logged and otherwise ignored (best-effort cleanup —
/// a lingering token re-triggers cleanup on the next failed delivery).
/// Returns the number of tokens scheduled for removal.
pub async fn prune_invalid(
    registry: &dyn TokenRegistry,
    role: Role,
    recipient: &str,
    outcomes: &[SendOutcome],
) -> usize {
    for outcome in outcomes {
        if let Delivery::Failed { code } = &outcome.delivery {
            if outcome.delivery.is_permanent_failure() {
                tracing::info!(
                    "🧹 Token {} for {role}/{recipient} is dead ({code}), removing",
                    outcome.token
                );
            } else {
                tracing::warn!(
                    "⚠️ Delivery to {} for {role}/{recipient} failed ({code}), keeping token",
                    outcome.token
                );
            }
        }
    }

    let dead = invalid_tokens(outcomes);
    let removals = dead
        .iter()
        .map(|token| registry.remove(role, recipient, token));

    for (token, result) in dead.iter().zip(join_all(removals).await) {
        if let Err(e) = result {
            tracing::warn!("⚠️ Failed to remove token {token}: {e}");
        }
    }

    dead.len()
}
