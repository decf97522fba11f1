//! # BookRelay Core
//!
//! Shared foundation for the BookRelay workspace: the booking status model,
//! change-event and transition types, notification payload shapes,
//! configuration, and the error taxonomy.
//!
//! Magic status integers from the wire stop at this crate's boundary —
//! everything downstream works with [`types::BookingStatus`].

pub mod config;
pub mod error;
pub mod types;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use types::{
    Booking, BookingStatus, ChangeEvent, NotificationPayload, Role, Transition,
};
