//! Aggregate roots - domain objects that own their related data
//!
//! An aggregate:
//! - Has a unique identity
//! - Owns all its constituent parts (enforced by Rust ownership)
//! - Exposes behavior through methods, not public fields
//! - Returns a description of what changed from each mutation

pub mod combat;

pub use combat::Combat;
