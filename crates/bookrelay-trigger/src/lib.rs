//! # BookRelay Trigger
//!
//! The change-driven dispatch core: turns raw booking writes into push
//! notifications and prunes dead device tokens along the way.
//!
//! ## Architecture
//! ```text
//! BookingFeed (streaming REST + local mirror)
//!   └── ChangeEvent { previous, current }
//!         └── NotificationPipeline (one async task per event)
//!               ├── classify → Created / StatusChanged / Unchanged / Deleted
//!               ├── policy   → provider leg (panel) + user leg (client)
//!               ├── registry → token set (empty ⇒ done)
//!               ├── gateway  → one batched send, per-token outcomes
//!               └── reconcile → remove permanently-invalid tokens
//! ```
//!
//! Expected non-events (deleted record, unchanged status, policy skip, no
//! targets) terminate a pipeline as `Ok` outcomes with a log line; only
//! transport failures surface as errors.

pub mod classify;
pub mod feed;
pub mod pipeline;
pub mod policy;
pub mod reconcile;

pub use classify::classify;
pub use feed::{BookingFeed, ChangeStream};
pub use pipeline::{LegOutcome, NotificationPipeline, PipelineOutcome};
pub use policy::{provider_decision, user_decision, Decision, SkipReason};
