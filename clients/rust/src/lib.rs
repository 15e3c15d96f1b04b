pub mod attestation;
pub mod audit;
pub mod config;
pub mod controller;
pub mod errors;
pub mod events;
pub mod hasher;
pub mod ledger;
pub mod program;
pub mod retry;
pub mod sink;
pub mod state;
pub mod store;
pub mod utils;

pub use attestation::*;
pub use audit::*;
pub use config::*;
pub use controller::*;
pub use errors::*;
pub use events::*;
pub use hasher::*;
pub use ledger::*;
pub use retry::*;
pub use sink::*;
pub use state::*;
pub use store::*;
