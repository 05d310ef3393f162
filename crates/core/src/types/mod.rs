//! Core types for the Playmakers app.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod namespace;
pub mod resource;
pub mod shop;

pub use credential::AccessToken;
pub use namespace::Namespace;
pub use resource::{ResourcePath, ResourcePathError};
pub use shop::{ShopDomain, ShopDomainError};
