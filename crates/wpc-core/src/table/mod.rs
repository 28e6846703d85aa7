//! Table controller and the state it publishes.

mod controller;
mod state;

pub use controller::TableController;
pub use state::{TableState, TableStatus};
