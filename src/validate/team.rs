use serde::Deserialize;
use uuid::Uuid;

use crate::error::ValidationErrors;
use crate::models::{Team, TeamType};
use crate::validate::effective;

/// Incoming write payload; every field optional to support partial updates.
/// `parent` and `created_at` are server-assigned and not accepted here.
#[derive(Debug, Default, Deserialize)]
pub struct TeamPatch {
    pub project: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub team_type: Option<TeamType>,
    pub manager: Option<Uuid>,
    pub users: Option<Vec<Uuid>>,
    pub sub_teams: Option<Vec<Uuid>>,
}

/// Persisted snapshot a patch merges over: the row plus its relation sets.
#[derive(Debug, Clone)]
pub struct TeamBase {
    pub team: Team,
    pub users: Vec<Uuid>,
    pub sub_teams: Vec<Uuid>,
}

/// Fully resolved candidate, every check runs against this.
#[derive(Debug, Clone)]
pub struct TeamCandidate {
    pub project: Uuid,
    pub name: String,
    pub description: String,
    pub team_type: Option<TeamType>,
    pub manager: Uuid,
    pub users: Vec<Uuid>,
    pub sub_teams: Vec<Uuid>,
}

/// Merge a patch over the persisted base (absent on create). Missing
/// required fields on create are reported per-field.
pub fn resolve(patch: TeamPatch, base: Option<&TeamBase>) -> Result<TeamCandidate, ValidationErrors> {
    match base {
        Some(base) => Ok(TeamCandidate {
            project: patch.project.unwrap_or(base.team.project_id),
            name: effective(patch.name.as_ref(), &base.team.name),
            description: effective(patch.description.as_ref(), &base.team.description),
            team_type: patch.team_type.or_else(|| base.team.team_type()),
            manager: patch.manager.unwrap_or(base.team.manager_id),
            users: effective(patch.users.as_ref(), &base.users),
            sub_teams: effective(patch.sub_teams.as_ref(), &base.sub_teams),
        }),
        None => {
            let mut errors = ValidationErrors::new();
            if patch.project.is_none() {
                errors.add("project", "required");
            }
            if patch.name.is_none() {
                errors.add("name", "required");
            }
            if patch.manager.is_none() {
                errors.add("manager", "required");
            }
            errors.into_result()?;

            Ok(TeamCandidate {
                project: patch.project.unwrap(),
                name: patch.name.unwrap(),
                description: patch.description.unwrap_or_default(),
                team_type: patch.team_type,
                manager: patch.manager.unwrap(),
                users: patch.users.unwrap_or_default(),
                sub_teams: patch.sub_teams.unwrap_or_default(),
            })
        }
    }
}

/// Reject a sub-team set that would close a cycle: the updated team must
/// not appear anywhere in a candidate's subtree. Materialized paths make
/// that a prefix test, so the check terminates even on inconsistent data
/// (persisted acyclicity itself is enforced upstream, not recovered here).
pub fn check_sub_team_loop(
    instance_path: &str,
    candidate_paths: &[(Uuid, String)],
) -> Result<(), ValidationErrors> {
    for (_, path) in candidate_paths {
        if instance_path == path || instance_path.starts_with(&format!("{path}/")) {
            return Err(ValidationErrors::field("sub_teams", "noLoopInSubTree"));
        }
    }
    Ok(())
}

/// Cross-field checks on the resolved candidate, fail-fast:
/// sub-teams share the candidate's project; users and sub-teams are
/// mutually exclusive; the type matches (or is inferred from) whichever
/// side is non-empty. Returns the candidate with its type filled in.
pub fn check(
    mut candidate: TeamCandidate,
    sub_team_projects: &[(Uuid, Uuid)],
) -> Result<TeamCandidate, ValidationErrors> {
    for (_, project_id) in sub_team_projects {
        if *project_id != candidate.project {
            return Err(ValidationErrors::non_field(
                "Sub teams must be in the same project",
            ));
        }
    }

    if !candidate.users.is_empty() && !candidate.sub_teams.is_empty() {
        return Err(ValidationErrors::non_field(
            "Teams cannot have both users and sub teams",
        ));
    }

    let expected_type = if !candidate.users.is_empty() {
        Some(TeamType::TeamOfUsers)
    } else if !candidate.sub_teams.is_empty() {
        Some(TeamType::TeamOfTeams)
    } else {
        None
    };

    match (candidate.team_type, expected_type) {
        (Some(given), Some(expected)) if given != expected => {
            return Err(ValidationErrors::non_field("Incorrect type"));
        }
        (None, Some(expected)) => candidate.team_type = Some(expected),
        _ => {}
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(users: Vec<Uuid>, sub_teams: Vec<Uuid>, team_type: Option<TeamType>) -> TeamCandidate {
        TeamCandidate {
            project: Uuid::now_v7(),
            name: "North zone".to_string(),
            description: String::new(),
            team_type,
            manager: Uuid::now_v7(),
            users,
            sub_teams,
        }
    }

    #[test]
    fn loop_detected_when_instance_is_inside_candidate_subtree() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        // instance sits under the candidate: candidate path is a prefix
        let instance_path = format!("{a}/{b}");
        let err = check_sub_team_loop(&instance_path, &[(a, a.to_string())]).unwrap_err();
        assert_eq!(err, ValidationErrors::field("sub_teams", "noLoopInSubTree"));

        // self-reference
        let err = check_sub_team_loop(&a.to_string(), &[(a, a.to_string())]).unwrap_err();
        assert_eq!(err, ValidationErrors::field("sub_teams", "noLoopInSubTree"));
    }

    #[test]
    fn unrelated_subtree_passes_loop_check() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert!(check_sub_team_loop(&a.to_string(), &[(b, b.to_string())]).is_ok());
    }

    #[test]
    fn prefix_test_requires_a_full_segment() {
        // "abc" must not be treated as an ancestor of "abcd"
        let err = check_sub_team_loop("abc/x", &[(Uuid::now_v7(), "abc".to_string())]);
        assert!(err.is_err());
        assert!(check_sub_team_loop("abcd/x", &[(Uuid::now_v7(), "abc".to_string())]).is_ok());
    }

    #[test]
    fn users_and_sub_teams_are_mutually_exclusive() {
        let c = candidate(vec![Uuid::now_v7()], vec![Uuid::now_v7()], None);
        let err = check(c, &[]).unwrap_err();
        assert_eq!(
            err,
            ValidationErrors::non_field("Teams cannot have both users and sub teams")
        );
    }

    #[test]
    fn type_is_inferred_from_members() {
        let c = candidate(vec![Uuid::now_v7()], vec![], None);
        let resolved = check(c, &[]).unwrap();
        assert_eq!(resolved.team_type, Some(TeamType::TeamOfUsers));

        let c = candidate(vec![], vec![Uuid::now_v7()], None);
        let resolved = check(c, &[]).unwrap();
        assert_eq!(resolved.team_type, Some(TeamType::TeamOfTeams));
    }

    #[test]
    fn conflicting_explicit_type_is_rejected() {
        let c = candidate(vec![Uuid::now_v7()], vec![], Some(TeamType::TeamOfTeams));
        let err = check(c, &[]).unwrap_err();
        assert_eq!(err, ValidationErrors::non_field("Incorrect type"));
    }

    #[test]
    fn sub_team_in_another_project_is_rejected() {
        let sub = Uuid::now_v7();
        let c = candidate(vec![], vec![sub], None);
        let err = check(c, &[(sub, Uuid::now_v7())]).unwrap_err();
        assert_eq!(
            err,
            ValidationErrors::non_field("Sub teams must be in the same project")
        );
    }

    #[test]
    fn create_requires_project_name_and_manager() {
        let err = resolve(TeamPatch::default(), None).unwrap_err();
        assert!(err.has("project"));
        assert!(err.has("name"));
        assert!(err.has("manager"));
    }

    #[test]
    fn partial_update_inherits_persisted_relations() {
        let user = Uuid::now_v7();
        let base = TeamBase {
            team: Team {
                id: Uuid::now_v7(),
                project_id: Uuid::now_v7(),
                name: "East".to_string(),
                description: String::new(),
                team_type: Some("TEAM_OF_USERS".to_string()),
                manager_id: Uuid::now_v7(),
                parent_id: None,
                path: Uuid::now_v7().to_string(),
                created_by: Uuid::now_v7(),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
                deleted_at: None,
            },
            users: vec![user],
            sub_teams: vec![],
        };

        let patch = TeamPatch {
            name: Some("East renamed".to_string()),
            ..Default::default()
        };
        let candidate = resolve(patch, Some(&base)).unwrap();
        assert_eq!(candidate.name, "East renamed");
        assert_eq!(candidate.users, vec![user]);
        assert_eq!(candidate.team_type, Some(TeamType::TeamOfUsers));
    }
}
