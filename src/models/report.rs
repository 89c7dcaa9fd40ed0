use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

use crate::error::AppError;

/// Review status. Every status may move to every other one; there is no terminal state.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize,
    Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    #[default]
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "PENDING",
            ReportStatus::Approved => "APPROVED",
            ReportStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ReportStatus::Pending),
            "APPROVED" => Ok(ReportStatus::Approved),
            "REJECTED" => Ok(ReportStatus::Rejected),
            _ => Err(AppError::BadStatus),
        }
    }
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize,
    Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    #[default]
    #[sea_orm(string_value = "LOADING")]
    Loading,
    #[sea_orm(string_value = "UNLOADING")]
    Unloading,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Loading => "LOADING",
            Direction::Unloading => "UNLOADING",
        }
    }
}

impl FromStr for Direction {
    type Err = AppError;

    /// Accepts the Russian labels used by older clients alongside the canonical names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOADING" | "ЗАГРУЗКА" => Ok(Direction::Loading),
            "UNLOADING" | "РАЗГРУЗКА" => Ok(Direction::Unloading),
            _ => Err(AppError::BadDirection),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub author_id: i32,
    pub direction: Direction,
    pub origin_city: String,
    pub destination_city: String,
    #[sea_orm(column_type = "Text")]
    pub cargo_description: String,
    pub vehicle: String,
    pub trailer: String,
    #[sea_orm(column_type = "Double")]
    pub distance_km: f64,
    pub window_start: Option<Date>,
    pub window_end: Option<Date>,
    #[sea_orm(column_type = "Double")]
    pub rating: f64,
    #[sea_orm(column_type = "Text")]
    pub comment: String,
    pub status: ReportStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::principal::Entity",
        from = "Column::AuthorId",
        to = "super::principal::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::principal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Move the report to `status`. Only `status` and `updated_at` are touched, and
    /// `updated_at` never moves backwards even if the wall clock does.
    pub fn with_status(self, status: ReportStatus, now: DateTime) -> ActiveModel {
        let updated_at = next_updated_at(self.updated_at, now);
        let mut active: ActiveModel = self.into();
        active.status = Set(status);
        active.updated_at = Set(updated_at);
        active
    }
}

pub fn next_updated_at(previous: DateTime, now: DateTime) -> DateTime {
    previous.max(now)
}

/// Driver self-assessment, each score on a 1..=5 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct SubScores {
    pub road: Option<f64>,
    pub client: Option<f64>,
    pub route: Option<f64>,
}

impl SubScores {
    pub fn rating(&self) -> f64 {
        derive_rating(&[self.road, self.client, self.route])
    }
}

/// Mean of the scores that fall inside 1..=5, rounded to one decimal. Zero when none do.
pub fn derive_rating(scores: &[Option<f64>]) -> f64 {
    let valid: Vec<f64> = scores
        .iter()
        .flatten()
        .copied()
        .filter(|s| (1.0..=5.0).contains(s))
        .collect();
    if valid.is_empty() {
        return 0.0;
    }
    let mean = valid.iter().sum::<f64>() / valid.len() as f64;
    (mean * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> DateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample() -> Model {
        Model {
            id: 7,
            author_id: 3,
            direction: Direction::Loading,
            origin_city: "Moscow".into(),
            destination_city: "Kazan".into(),
            cargo_description: "pipes".into(),
            vehicle: String::new(),
            trailer: String::new(),
            distance_km: 820.0,
            window_start: None,
            window_end: None,
            rating: 4.3,
            comment: String::new(),
            status: ReportStatus::Pending,
            created_at: at(10, 0),
            updated_at: at(10, 0),
        }
    }

    #[test]
    fn every_status_reaches_every_other() {
        use sea_orm::Iterable;
        for from in ReportStatus::iter() {
            for to in ReportStatus::iter() {
                let mut report = sample();
                report.status = from;
                let active = report.with_status(to, at(11, 0));
                assert_eq!(active.status, Set(to));
            }
        }
    }

    #[test]
    fn status_change_refreshes_updated_at_only() {
        let active = sample().with_status(ReportStatus::Approved, at(12, 30));
        assert_eq!(active.updated_at, Set(at(12, 30)));
        assert_eq!(active.author_id, sea_orm::ActiveValue::Unchanged(3));
        assert_eq!(active.created_at, sea_orm::ActiveValue::Unchanged(at(10, 0)));
    }

    #[test]
    fn updated_at_never_moves_backwards() {
        assert_eq!(next_updated_at(at(12, 0), at(11, 0)), at(12, 0));
        assert_eq!(next_updated_at(at(12, 0), at(13, 0)), at(13, 0));
    }

    #[test]
    fn status_parsing() {
        assert_eq!("approved".parse::<ReportStatus>().unwrap(), ReportStatus::Approved);
        assert_eq!("ALL".parse::<ReportStatus>().unwrap_err().code(), "BAD_STATUS");
    }

    #[test]
    fn direction_accepts_legacy_labels() {
        assert_eq!("разгрузка".parse::<Direction>().unwrap(), Direction::Unloading);
        assert_eq!("ЗАГРУЗКА".parse::<Direction>().unwrap(), Direction::Loading);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn rating_is_mean_of_supplied_scores() {
        let scores = SubScores {
            road: Some(4.0),
            client: Some(5.0),
            route: Some(4.0),
        };
        assert_eq!(scores.rating(), 4.3);
    }

    #[test]
    fn rating_skips_missing_and_out_of_range() {
        assert_eq!(derive_rating(&[Some(3.0), None, Some(9.0)]), 3.0);
        assert_eq!(derive_rating(&[Some(2.0), Some(5.0), None]), 3.5);
    }

    #[test]
    fn rating_without_scores_is_zero() {
        assert_eq!(SubScores::default().rating(), 0.0);
        assert_eq!(derive_rating(&[Some(0.0)]), 0.0);
    }
}
