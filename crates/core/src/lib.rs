//! `storefront-core`: shared building blocks for the storefront client.
//!
//! This crate contains **pure** primitives (no storage, no network): the clock
//! port, the domain error model, value objects, and user-facing notices.

pub mod clock;
pub mod error;
pub mod notice;
pub mod value_object;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use notice::{Notice, Severity};
pub use value_object::{Email, ValueObject};
