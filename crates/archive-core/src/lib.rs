//! # Archive Core
//!
//! The domain layer of the student archive.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, the ports infrastructure must implement, and the services that
//! orchestrate them.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
