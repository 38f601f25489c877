pub mod accounts;
pub mod assignments;
pub mod audit;
pub mod forms;
pub mod org_units;
pub mod plannings;
pub mod projects;
pub mod teams;
pub mod users;

use crate::error::ValidationErrors;

/// Soft-delete visibility for list endpoints. Rows are never removed,
/// only marked with `deleted_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStatus {
    Active,
    Deleted,
    All,
}

impl DeletionStatus {
    pub fn parse(param: Option<&str>) -> Result<Self, ValidationErrors> {
        match param {
            None | Some("active") => Ok(DeletionStatus::Active),
            Some("deleted") => Ok(DeletionStatus::Deleted),
            Some("all") => Ok(DeletionStatus::All),
            Some(_) => Err(ValidationErrors::field("deletion_status", "invalidChoice")),
        }
    }

    /// SQL predicate on the row's `deleted_at` column.
    pub fn predicate(&self) -> &'static str {
        match self {
            DeletionStatus::Active => "deleted_at IS NULL",
            DeletionStatus::Deleted => "deleted_at IS NOT NULL",
            DeletionStatus::All => "TRUE",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Ordering {
    pub column: &'static str,
    pub descending: bool,
}

impl Ordering {
    /// Parse an `ordering` query parameter (`-` prefix = descending)
    /// against a per-resource column whitelist. The returned column is a
    /// whitelist member, safe to interpolate into SQL.
    pub fn parse(
        param: Option<&str>,
        allowed: &[&'static str],
        default: &'static str,
    ) -> Result<Self, ValidationErrors> {
        let Some(raw) = param else {
            return Ok(Ordering {
                column: default,
                descending: false,
            });
        };

        let (name, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };

        match allowed.iter().find(|c| **c == name) {
            Some(column) => Ok(Ordering {
                column,
                descending,
            }),
            None => Err(ValidationErrors::field("ordering", "invalidChoice")),
        }
    }

    pub fn direction(&self) -> &'static str {
        if self.descending { "DESC" } else { "ASC" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_status_defaults_to_active() {
        assert_eq!(DeletionStatus::parse(None).unwrap(), DeletionStatus::Active);
        assert_eq!(
            DeletionStatus::parse(Some("all")).unwrap(),
            DeletionStatus::All
        );
        assert!(DeletionStatus::parse(Some("bogus")).is_err());
    }

    #[test]
    fn ordering_respects_whitelist_and_prefix() {
        let allowed = &["id", "name", "created_at"];
        let o = Ordering::parse(Some("-name"), allowed, "id").unwrap();
        assert_eq!(o.column, "name");
        assert!(o.descending);

        let o = Ordering::parse(None, allowed, "id").unwrap();
        assert_eq!(o.column, "id");
        assert!(!o.descending);

        assert!(Ordering::parse(Some("path"), allowed, "id").is_err());
    }
}
