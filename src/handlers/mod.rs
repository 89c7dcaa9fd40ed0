pub mod auth;
pub mod fleet;
pub mod report;

pub use auth::*;
