pub mod auth;
pub mod policy;
pub mod query;
pub mod report;
