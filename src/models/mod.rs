pub mod account;
pub mod assignment;
pub mod audit_record;
pub mod org_unit;
pub mod planning;
pub mod project;
pub mod team;
pub mod user;

pub use account::Account;
pub use assignment::{Assignment, AssignmentResponse};
pub use audit_record::AuditRecord;
pub use org_unit::OrgUnit;
pub use planning::{MobileAssignment, MobilePlanningResponse, Planning, PlanningResponse};
pub use project::Project;
pub use team::{NestedTeam, NestedUser, Team, TeamResponse, TeamType};
pub use user::User;
