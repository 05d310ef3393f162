//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Shopify OAuth helpers (state generation, callback HMAC validation)

pub mod auth;
