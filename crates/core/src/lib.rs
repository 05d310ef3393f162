//! Playmakers Core - Shared domain types.
//!
//! This crate provides the types shared by the app server and its tests:
//! - [`ShopDomain`] - validated `*.myshopify.com` store host
//! - [`AccessToken`] - opaque Admin API credential with a redacted `Debug`
//! - [`ResourcePath`] - the `<resource>` part of a proxied `<resource>.json` path
//! - [`Namespace`] - metafield namespace label for a feature area
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
