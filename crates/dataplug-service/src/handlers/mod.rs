//! API handlers.

pub mod deposits;
pub mod health;
pub mod wallet;
pub mod webhooks;
