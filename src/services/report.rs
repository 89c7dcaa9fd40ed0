use crate::{
    config::fleet::FleetCatalog,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{report, Direction, Principal, Report, ReportStatus, SubScores},
    services::{
        policy::{authorize, list_scope, Operation},
        query::{ReportFilter, ReportQuery, ReportView},
    },
};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, TransactionTrait};

/// Caller-supplied fields of a new report, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewReport {
    pub direction: Option<String>,
    pub origin_city: String,
    pub destination_city: String,
    pub cargo_description: Option<String>,
    pub vehicle: Option<String>,
    pub trailer: Option<String>,
    pub distance_km: Option<f64>,
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub sub_scores: Option<SubScores>,
    pub comment: Option<String>,
}

pub struct ReportService {
    db: DatabaseConnection,
}

impl ReportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_report(
        &self,
        actor: &AuthUser,
        input: NewReport,
        fleet: &FleetCatalog,
    ) -> AppResult<ReportView> {
        authorize(actor.role, Operation::CreateReport)?;

        let origin_city = input.origin_city.trim();
        let destination_city = input.destination_city.trim();
        if origin_city.is_empty() || destination_city.is_empty() {
            return Err(AppError::RouteRequired);
        }

        let direction = match input.direction.as_deref().map(str::trim) {
            None | Some("") => Direction::default(),
            Some(raw) => raw.parse()?,
        };

        let distance_km = input.distance_km.unwrap_or(0.0);
        if !distance_km.is_finite() || distance_km < 0.0 {
            return Err(AppError::BadDistance);
        }

        // A supplied rating is stored as-is; sub-scores are only a fallback.
        let rating = input
            .rating
            .or_else(|| input.sub_scores.map(|s| s.rating()))
            .unwrap_or(0.0);

        let vehicle = trimmed(input.vehicle);
        let mut trailer = trimmed(input.trailer);
        if trailer.is_empty() {
            if let Some(default_trailer) = fleet.trailer_for(&vehicle) {
                trailer = default_trailer.to_string();
            }
        }

        let now = chrono::Utc::now().naive_utc();
        let model = report::ActiveModel {
            author_id: sea_orm::ActiveValue::Set(actor.id),
            direction: sea_orm::ActiveValue::Set(direction),
            origin_city: sea_orm::ActiveValue::Set(origin_city.to_string()),
            destination_city: sea_orm::ActiveValue::Set(destination_city.to_string()),
            cargo_description: sea_orm::ActiveValue::Set(trimmed(input.cargo_description)),
            vehicle: sea_orm::ActiveValue::Set(vehicle),
            trailer: sea_orm::ActiveValue::Set(trailer),
            distance_km: sea_orm::ActiveValue::Set(distance_km),
            window_start: sea_orm::ActiveValue::Set(input.window_start),
            window_end: sea_orm::ActiveValue::Set(input.window_end),
            rating: sea_orm::ActiveValue::Set(rating),
            comment: sea_orm::ActiveValue::Set(trimmed(input.comment)),
            status: sea_orm::ActiveValue::Set(ReportStatus::Pending),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let saved = model.insert(&self.db).await?;
        tracing::info!(report_id = saved.id, author_id = actor.id, "report created");

        Ok(ReportView {
            report: saved,
            author_name: actor.display_name.clone(),
        })
    }

    pub async fn list_reports(
        &self,
        actor: &AuthUser,
        filter: ReportFilter,
    ) -> AppResult<Vec<ReportView>> {
        authorize(actor.role, Operation::ReadOwnReports)?;

        let scope = list_scope(actor.id, actor.role);
        ReportQuery::new(scope, filter).fetch(&self.db).await
    }

    /// Load, check and write inside one transaction so the change is durable when
    /// this returns. Concurrent reviewers are last-write-wins.
    pub async fn update_status(
        &self,
        actor: &AuthUser,
        raw_id: &str,
        raw_status: &str,
    ) -> AppResult<ReportView> {
        authorize(actor.role, Operation::UpdateStatus)?;
        let report_id = parse_report_id(raw_id)?;
        let status: ReportStatus = raw_status.parse()?;

        let txn = self.db.begin().await?;
        let existing = Report::find_by_id(report_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let previous = existing.status;
        let updated = existing
            .with_status(status, chrono::Utc::now().naive_utc())
            .update(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(
            report_id,
            reviewer_id = actor.id,
            from = %previous,
            to = %updated.status,
            "report status changed"
        );

        let author_name = Principal::find_by_id(updated.author_id)
            .one(&self.db)
            .await?
            .map(|p| p.display_name)
            .unwrap_or_default();

        Ok(ReportView {
            report: updated,
            author_name,
        })
    }

    /// Deleting an id that does not exist succeeds with zero changes.
    pub async fn delete_report(&self, actor: &AuthUser, raw_id: &str) -> AppResult<u64> {
        authorize(actor.role, Operation::DeleteReport)?;
        let report_id = parse_report_id(raw_id)?;

        let result = Report::delete_by_id(report_id).exec(&self.db).await?;
        tracing::info!(
            report_id,
            reviewer_id = actor.id,
            changes = result.rows_affected,
            "report deleted"
        );
        Ok(result.rows_affected)
    }
}

/// Report ids are positive integers written in plain decimal digits.
pub fn parse_report_id(raw: &str) -> AppResult<i32> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadId);
    }
    raw.parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(AppError::BadId)
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_id_must_be_positive_integer() {
        assert_eq!(parse_report_id("42").unwrap(), 42);
        assert_eq!(parse_report_id(" 7 ").unwrap(), 7);
        for bad in ["0", "-3", "abc", "", "1.5", "+4", "99999999999"] {
            assert_eq!(parse_report_id(bad).unwrap_err().code(), "BAD_ID", "{bad}");
        }
    }

    #[test]
    fn trimmed_defaults_to_empty() {
        assert_eq!(trimmed(None), "");
        assert_eq!(trimmed(Some("  MAN TGX  ".into())), "MAN TGX");
    }
}
