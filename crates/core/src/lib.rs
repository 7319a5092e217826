//! `inventra-core`: shared building blocks (identifiers, domain errors).
//!
//! This crate contains **pure** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{AccountId, ServerId};
