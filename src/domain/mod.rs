//! Domain layer types and invariants.

pub mod codec;
pub mod entities;
pub mod error;
pub mod types;
