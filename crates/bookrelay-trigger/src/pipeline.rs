//! Trigger orchestration — one linear async pipeline per change event.
//!
//! classify → policy → resolve targets → dispatch → reconcile, with early
//! exits at each decision point. One event drives both recipient legs (the
//! provider's panel devices and the user's client devices); the legs run
//! concurrently and independently. Distinct events never share in-process
//! state — the registry is the only shared resource.

use std::sync::Arc;

use bookrelay_core::error::Result;
use bookrelay_core::types::{ChangeEvent, Role, Transition};
use bookrelay_gateway::outcome::Delivery;
use bookrelay_gateway::PushGateway;
use bookrelay_registry::TokenRegistry;

use crate::classify::classify;
use crate::policy::{provider_decision, user_decision, Decision, SkipReason};
use crate::reconcile::prune_invalid;

/// Terminal state of one recipient leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegOutcome {
    /// Policy decided not to notify.
    Skipped(SkipReason),
    /// Policy fired but the recipient has no registered devices.
    NoTargets,
    /// Batch dispatched; summary of what happened to it.
    Dispatched {
        delivered: usize,
        failed: usize,
        pruned: usize,
    },
}

/// Terminal state of a whole pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Deleted or unchanged record — nothing to evaluate, no leg ran.
    NoOp(SkipReason),
    /// Both legs ran to their own terminal state.
    Completed {
        provider: LegOutcome,
        user: LegOutcome,
    },
}

/// The dispatch core. Collaborators are injected at construction; the
/// pipeline itself holds no mutable state, so one instance serves any
/// number of concurrent events.
pub struct NotificationPipeline {
    registry: Arc<dyn TokenRegistry>,
    gateway: Arc<dyn PushGateway>,
}

impl NotificationPipeline {
    pub fn new(registry: Arc<dyn TokenRegistry>, gateway: Arc<dyn PushGateway>) -> Self {
        Self { registry, gateway }
    }

    /// Process one change event to its terminal state.
    pub async fn handle(&self, event: ChangeEvent) -> Result<PipelineOutcome> {
        let transition = classify(event.previous.as_ref(), event.current.as_ref());

        let booking = match (&transition, &event.current) {
            (Transition::Deleted, _) | (_, None) => {
                tracing::info!(
                    booking = %event.booking_id,
                    provider = %event.provider_id,
                    "🗑️ Booking deleted, nothing to send"
                );
                return Ok(PipelineOutcome::NoOp(SkipReason::Deleted));
            }
            (Transition::Unchanged { status }, Some(_)) => {
                tracing::info!(
                    booking = %event.booking_id,
                    status = status.code(),
                    "⏸️ Status unchanged, nothing to send"
                );
                return Ok(PipelineOutcome::NoOp(SkipReason::Unchanged));
            }
            (_, Some(booking)) => booking,
        };

        let provider_leg = self.run_leg(
            Role::Panel,
            &event.provider_id,
            &event.booking_id,
            provider_decision(booking, transition),
        );
        let user_leg = self.run_leg(
            Role::Client,
            &booking.user_id,
            &event.booking_id,
            user_decision(booking, transition),
        );

        let (provider, user) = tokio::join!(provider_leg, user_leg);
        Ok(PipelineOutcome::Completed {
            provider: provider?,
            user: user?,
        })
    }

    /// One recipient leg: skip / resolve / dispatch / reconcile.
    async fn run_leg(
        &self,
        role: Role,
        recipient: &str,
        booking_id: &str,
        decision: Decision,
    ) -> Result<LegOutcome> {
        let payload = match decision {
            Decision::Skip(reason) => {
                tracing::info!(booking = %booking_id, %role, "⏭️ Skipping notification: {reason}");
                return Ok(LegOutcome::Skipped(reason));
            }
            Decision::Notify(payload) => payload,
        };

        let tokens = self.registry.tokens(role, recipient).await?;
        if tokens.is_empty() {
            tracing::info!(
                booking = %booking_id,
                %role,
                recipient,
                "📭 No notification tokens to send to"
            );
            return Ok(LegOutcome::NoTargets);
        }
        tracing::info!(
            booking = %booking_id,
            %role,
            recipient,
            count = tokens.len(),
            "📤 Sending notifications"
        );

        let outcomes = self.gateway.send_batch(&tokens, &payload).await?;
        let delivered = outcomes
            .iter()
            .filter(|o| matches!(o.delivery, Delivery::Delivered { .. }))
            .count();
        let failed = outcomes.len() - delivered;

        let pruned = prune_invalid(self.registry.as_ref(), role, recipient, &outcomes).await;

        tracing::info!(
            booking = %booking_id,
            %role,
            delivered,
            failed,
            pruned,
            "📬 Dispatch complete"
        );
        Ok(LegOutcome::Dispatched { delivered, failed, pruned })
    }
}
