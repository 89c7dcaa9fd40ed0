//! Role-based access decisions.
//!
//! `authorize` answers "may this role ever do X". Which rows X applies to is a
//! separate question answered by [`list_scope`] and enforced by the query engine.

use crate::error::{AppError, AppResult};
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateReport,
    ReadOwnReports,
    ReadAllReports,
    UpdateStatus,
    DeleteReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

pub fn decide(role: Role, operation: Operation) -> Decision {
    match (role, operation) {
        (_, Operation::CreateReport | Operation::ReadOwnReports) => Decision::Allow,
        (Role::Reviewer, _) => Decision::Allow,
        (Role::Driver, _) => Decision::Deny,
    }
}

/// Fails with `FORBIDDEN` when the role may not perform `operation`.
pub fn authorize(role: Role, operation: Operation) -> AppResult<()> {
    match decide(role, operation) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            tracing::warn!(role = %role, ?operation, "operation denied");
            Err(AppError::Forbidden)
        }
    }
}

/// Which reports a listing may ever contain for this principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    OwnedBy(i32),
}

pub fn list_scope(principal_id: i32, role: Role) -> ListScope {
    match decide(role, Operation::ReadAllReports) {
        Decision::Allow => ListScope::All,
        Decision::Deny => ListScope::OwnedBy(principal_id),
    }
}
