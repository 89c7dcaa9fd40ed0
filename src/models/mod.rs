pub mod principal;
pub mod report;

pub use principal::{Entity as Principal, Model as PrincipalModel, Role};
pub use report::{Direction, Entity as Report, Model as ReportModel, ReportStatus, SubScores};
