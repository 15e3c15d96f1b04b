pub mod agent;
pub mod lease;

pub use agent::*;
pub use lease::*;
