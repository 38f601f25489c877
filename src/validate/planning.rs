use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ValidationErrors;
use crate::models::Planning;
use crate::validate::{double_option, effective};

/// Incoming write payload. Nullable fields use the double-option encoding
/// so an explicit null clears them while a missing field keeps the
/// persisted value.
#[derive(Debug, Default, Deserialize)]
pub struct PlanningPatch {
    pub name: Option<String>,
    pub project: Option<Uuid>,
    pub team: Option<Uuid>,
    pub org_unit: Option<Uuid>,
    pub forms: Option<Vec<Uuid>>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub published_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub started_at: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub ended_at: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone)]
pub struct PlanningCandidate {
    pub name: String,
    pub project: Uuid,
    pub team: Uuid,
    pub org_unit: Uuid,
    pub forms: Vec<Uuid>,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub started_at: Option<NaiveDate>,
    pub ended_at: Option<NaiveDate>,
}

/// Database-derived facts the cross-field checks need.
#[derive(Debug, Clone)]
pub struct PlanningFacts {
    /// Project of the candidate team.
    pub team_project: Uuid,
    /// Candidate forms that do not belong to the candidate project.
    pub foreign_forms: usize,
    /// False when the org unit has a type whose allowed-projects set
    /// excludes the candidate project. No type at all counts as allowed.
    pub org_unit_type_allows_project: bool,
}

pub fn resolve(
    patch: PlanningPatch,
    base: Option<&(Planning, Vec<Uuid>)>,
) -> Result<PlanningCandidate, ValidationErrors> {
    match base {
        Some((planning, forms)) => Ok(PlanningCandidate {
            name: effective(patch.name.as_ref(), &planning.name),
            project: patch.project.unwrap_or(planning.project_id),
            team: patch.team.unwrap_or(planning.team_id),
            org_unit: patch.org_unit.unwrap_or(planning.org_unit_id),
            forms: effective(patch.forms.as_ref(), forms),
            description: effective(patch.description.as_ref(), &planning.description),
            published_at: patch.published_at.unwrap_or(planning.published_at),
            started_at: patch.started_at.unwrap_or(planning.started_at),
            ended_at: patch.ended_at.unwrap_or(planning.ended_at),
        }),
        None => {
            let mut errors = ValidationErrors::new();
            if patch.name.is_none() {
                errors.add("name", "required");
            }
            if patch.project.is_none() {
                errors.add("project", "required");
            }
            if patch.team.is_none() {
                errors.add("team", "required");
            }
            if patch.org_unit.is_none() {
                errors.add("org_unit", "required");
            }
            errors.into_result()?;

            Ok(PlanningCandidate {
                name: patch.name.unwrap(),
                project: patch.project.unwrap(),
                team: patch.team.unwrap(),
                org_unit: patch.org_unit.unwrap(),
                forms: patch.forms.unwrap_or_default(),
                description: patch.description.unwrap_or_default(),
                published_at: patch.published_at.flatten(),
                started_at: patch.started_at.flatten(),
                ended_at: patch.ended_at.flatten(),
            })
        }
    }
}

/// Cross-field checks. Violations are collected per field and returned
/// together rather than failing on the first one.
pub fn check(candidate: &PlanningCandidate, facts: &PlanningFacts) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let (Some(started), Some(ended)) = (candidate.started_at, candidate.ended_at) {
        if started > ended {
            errors.add("started_at", "startDateAfterEndDate");
            errors.add("ended_at", "EndDateBeforeStartDate");
        }
    }

    if facts.team_project != candidate.project {
        errors.add("team", "planningAndTeams");
    }

    if facts.foreign_forms > 0 {
        errors.add("forms", "planningAndForms");
    }

    if !facts.org_unit_type_allows_project {
        errors.add("org_unit", "planningAndOrgUnit");
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> PlanningCandidate {
        PlanningCandidate {
            name: "Vaccination round 1".to_string(),
            project: Uuid::now_v7(),
            team: Uuid::now_v7(),
            org_unit: Uuid::now_v7(),
            forms: vec![],
            description: String::new(),
            published_at: None,
            started_at: None,
            ended_at: None,
        }
    }

    fn facts_for(c: &PlanningCandidate) -> PlanningFacts {
        PlanningFacts {
            team_project: c.project,
            foreign_forms: 0,
            org_unit_type_allows_project: true,
        }
    }

    #[test]
    fn valid_candidate_passes() {
        let c = candidate();
        let f = facts_for(&c);
        assert!(check(&c, &f).is_ok());
    }

    #[test]
    fn inverted_dates_error_on_both_fields() {
        let mut c = candidate();
        c.started_at = NaiveDate::from_ymd_opt(2024, 6, 1);
        c.ended_at = NaiveDate::from_ymd_opt(2024, 1, 1);
        let err = check(&c, &facts_for(&c)).unwrap_err();

        let mut expected = ValidationErrors::new();
        expected.add("started_at", "startDateAfterEndDate");
        expected.add("ended_at", "EndDateBeforeStartDate");
        assert_eq!(err, expected);
    }

    #[test]
    fn all_violations_are_collected_together() {
        let mut c = candidate();
        c.started_at = NaiveDate::from_ymd_opt(2024, 6, 1);
        c.ended_at = NaiveDate::from_ymd_opt(2024, 1, 1);
        let facts = PlanningFacts {
            team_project: Uuid::now_v7(),
            foreign_forms: 2,
            org_unit_type_allows_project: false,
        };

        let err = check(&c, &facts).unwrap_err();
        for field in ["started_at", "ended_at", "team", "forms", "org_unit"] {
            assert!(err.has(field), "missing error on {field}");
        }
    }

    #[test]
    fn create_requires_core_fields() {
        let err = resolve(PlanningPatch::default(), None).unwrap_err();
        for field in ["name", "project", "team", "org_unit"] {
            assert!(err.has(field), "missing required error on {field}");
        }
    }

    #[test]
    fn explicit_null_clears_published_at() {
        let base_planning = Planning {
            id: Uuid::now_v7(),
            project_id: Uuid::now_v7(),
            team_id: Uuid::now_v7(),
            org_unit_id: Uuid::now_v7(),
            name: "Round".to_string(),
            description: String::new(),
            published_at: Some(Utc::now()),
            started_at: None,
            ended_at: None,
            created_by: Uuid::now_v7(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        let base = (base_planning, vec![]);

        let patch: PlanningPatch = serde_json::from_str(r#"{"published_at": null}"#).unwrap();
        let c = resolve(patch, Some(&base)).unwrap();
        assert_eq!(c.published_at, None);

        let patch: PlanningPatch = serde_json::from_str(r#"{"name": "Round 2"}"#).unwrap();
        let c = resolve(patch, Some(&base)).unwrap();
        assert!(c.published_at.is_some());
    }
}
