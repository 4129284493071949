//! Persistent shopping cart.

mod engine;
mod types;

pub use engine::CartEngine;
pub use types::{AddPolicy, CartEntry, CartSummary};
