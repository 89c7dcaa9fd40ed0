//! Role-scoped, filtered listing of reports.

use futures_util::TryStreamExt;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, SelectTwo,
    StreamTrait,
};

use crate::error::AppResult;
use crate::models::{principal, report, Direction, Principal, Report, ReportModel, ReportStatus};
use crate::services::policy::ListScope;

/// Upper bound on rows returned by a single listing.
pub const MAX_RESULTS: u64 = 500;

/// Optional restrictions supplied by the caller. Unrecognised direction or status
/// values mean "no restriction", matching how the UI sends `ALL`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    /// Lowercased needle; `None` when absent or blank.
    pub text: Option<String>,
    pub direction: Option<Direction>,
    pub status: Option<ReportStatus>,
}

impl ReportFilter {
    pub fn from_params(q: Option<&str>, direction: Option<&str>, status: Option<&str>) -> Self {
        Self {
            text: q
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase),
            direction: direction.and_then(|d| d.parse().ok()),
            status: status.and_then(|s| s.parse().ok()),
        }
    }

    /// Case-insensitive substring match over the searchable fields. Runs in Rust
    /// because SQLite's `LOWER` only folds ASCII.
    pub fn matches_text(&self, report: &ReportModel, author_name: &str) -> bool {
        let Some(needle) = self.text.as_deref() else {
            return true;
        };
        [
            report.origin_city.as_str(),
            report.destination_city.as_str(),
            report.cargo_description.as_str(),
            report.vehicle.as_str(),
            report.comment.as_str(),
            author_name,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// A report together with its author's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub report: ReportModel,
    pub author_name: String,
}

#[derive(Debug, Clone)]
pub struct ReportQuery {
    scope: ListScope,
    filter: ReportFilter,
}

impl ReportQuery {
    pub fn new(scope: ListScope, filter: ReportFilter) -> Self {
        Self { scope, filter }
    }

    /// The SQL half of the query. Scope is applied here unconditionally so an owner
    /// restriction can never be dropped by a caller-supplied filter.
    pub fn select(&self) -> SelectTwo<report::Entity, principal::Entity> {
        let mut query = Report::find().find_also_related(Principal);

        if let ListScope::OwnedBy(author_id) = self.scope {
            query = query.filter(report::Column::AuthorId.eq(author_id));
        }
        if let Some(direction) = self.filter.direction {
            query = query.filter(report::Column::Direction.eq(direction));
        }
        if let Some(status) = self.filter.status {
            query = query.filter(report::Column::Status.eq(status));
        }

        query = query
            .order_by_desc(report::Column::CreatedAt)
            .order_by_desc(report::Column::Id);

        // Text matching happens while streaming, so the cap can only be pushed down
        // when there is no needle.
        if self.filter.text.is_none() {
            query = query.limit(MAX_RESULTS);
        }
        query
    }

    /// Rows arrive already ordered, so reading stops as soon as the cap is reached
    /// even when text matching has to look at them one by one.
    pub async fn fetch<C>(&self, db: &C) -> AppResult<Vec<ReportView>>
    where
        C: ConnectionTrait + StreamTrait + Send,
    {
        let rows = self.select().stream(db).await?;
        let mut rows = std::pin::pin!(rows);

        let mut views = Vec::new();
        while let Some((report, author)) = rows.try_next().await? {
            let author_name = author.map(|a| a.display_name).unwrap_or_default();
            if !self.filter.matches_text(&report, &author_name) {
                continue;
            }
            views.push(ReportView {
                report,
                author_name,
            });
            if views.len() >= MAX_RESULTS as usize {
                break;
            }
        }

        Ok(views)
    }
}
