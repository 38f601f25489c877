use serde::Deserialize;
use uuid::Uuid;

use crate::error::ValidationErrors;
use crate::models::Assignment;
use crate::validate::double_option;

/// Incoming write payload. `user` and `team` accept explicit null so a
/// partial update can move an assignment from one kind of assignee to the
/// other.
#[derive(Debug, Default, Deserialize)]
pub struct AssignmentPatch {
    pub planning: Option<Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    pub user: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub team: Option<Option<Uuid>>,
    pub org_unit: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct AssignmentCandidate {
    pub planning: Uuid,
    pub user: Option<Uuid>,
    pub team: Option<Uuid>,
    pub org_unit: Uuid,
}

pub fn resolve(
    patch: AssignmentPatch,
    base: Option<&Assignment>,
) -> Result<AssignmentCandidate, ValidationErrors> {
    match base {
        Some(assignment) => Ok(AssignmentCandidate {
            planning: patch.planning.unwrap_or(assignment.planning_id),
            user: patch.user.unwrap_or(assignment.user_id),
            team: patch.team.unwrap_or(assignment.team_id),
            org_unit: patch.org_unit.unwrap_or(assignment.org_unit_id),
        }),
        None => {
            let mut errors = ValidationErrors::new();
            if patch.planning.is_none() {
                errors.add("planning", "required");
            }
            if patch.org_unit.is_none() {
                errors.add("org_unit", "required");
            }
            errors.into_result()?;

            Ok(AssignmentCandidate {
                planning: patch.planning.unwrap(),
                user: patch.user.flatten(),
                team: patch.team.flatten(),
                org_unit: patch.org_unit.unwrap(),
            })
        }
    }
}

/// An assignment targets exactly one of a user or a team; both and neither
/// are distinct errors.
///
/// Deliberately not checked here: that the assignee sits under the
/// planning's root team, that nested assignments respect the org-unit/team
/// hierarchy, and that the org-unit type fits the planning's forms.
pub fn check_assignee(candidate: &AssignmentCandidate) -> Result<(), ValidationErrors> {
    if candidate.team.is_some() && candidate.user.is_some() {
        return Err(ValidationErrors::non_field(
            "Cannot assign on both team and users",
        ));
    }
    if candidate.team.is_none() && candidate.user.is_none() {
        return Err(ValidationErrors::non_field(
            "Should be at least an assigned team or user",
        ));
    }
    Ok(())
}

/// The org unit must sit inside the planning's org-unit subtree (root
/// included), evaluated over org units visible to the requesting account.
pub fn check_org_unit_scope(in_planning_scope: bool) -> Result<(), ValidationErrors> {
    if in_planning_scope {
        Ok(())
    } else {
        Err(ValidationErrors::field(
            "org_unit",
            "OrgUnit is not in planning scope",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(user: Option<Uuid>, team: Option<Uuid>) -> AssignmentCandidate {
        AssignmentCandidate {
            planning: Uuid::now_v7(),
            user,
            team,
            org_unit: Uuid::now_v7(),
        }
    }

    #[test]
    fn both_assignees_rejected() {
        let err = check_assignee(&candidate(Some(Uuid::now_v7()), Some(Uuid::now_v7())))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationErrors::non_field("Cannot assign on both team and users")
        );
    }

    #[test]
    fn neither_assignee_rejected_with_distinct_message() {
        let err = check_assignee(&candidate(None, None)).unwrap_err();
        assert_eq!(
            err,
            ValidationErrors::non_field("Should be at least an assigned team or user")
        );
    }

    #[test]
    fn single_assignee_accepted() {
        assert!(check_assignee(&candidate(Some(Uuid::now_v7()), None)).is_ok());
        assert!(check_assignee(&candidate(None, Some(Uuid::now_v7()))).is_ok());
    }

    #[test]
    fn null_user_clears_assignee_on_partial_update() {
        let base = Assignment {
            id: Uuid::now_v7(),
            planning_id: Uuid::now_v7(),
            user_id: Some(Uuid::now_v7()),
            team_id: None,
            org_unit_id: Uuid::now_v7(),
            created_by: Uuid::now_v7(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        };
        let team = Uuid::now_v7();
        let patch: AssignmentPatch =
            serde_json::from_str(&format!(r#"{{"user": null, "team": "{team}"}}"#)).unwrap();
        let c = resolve(patch, Some(&base)).unwrap();
        assert_eq!(c.user, None);
        assert_eq!(c.team, Some(team));
        assert!(check_assignee(&c).is_ok());
    }

    #[test]
    fn org_unit_outside_scope_is_a_field_error() {
        let err = check_org_unit_scope(false).unwrap_err();
        assert_eq!(
            err,
            ValidationErrors::field("org_unit", "OrgUnit is not in planning scope")
        );
    }
}
