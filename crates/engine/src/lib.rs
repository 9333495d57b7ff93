//! Turnwright Engine library.
//!
//! Runs combat encounters on top of the pure turn-order domain.
//!
//! ## Structure
//!
//! - `entities/` - Entity modules wrapping storage and context lookup
//! - `use_cases/` - Combat user stories orchestrated across entities
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `app` - Application composition

pub mod app;
pub mod entities;
pub mod infrastructure;
pub mod use_cases;

pub use app::{App, AppPorts};
