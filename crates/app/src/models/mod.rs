//! Domain models for the app.

pub mod session;

pub use session::{ShopSession, keys as session_keys};
