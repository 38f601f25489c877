pub mod extractor;
pub mod jwt;
pub mod password;

/// Named permission grants carried on a user's account profile.
/// Read access never requires a grant; mutation does.
pub const PERM_TEAMS: &str = "teams";
pub const PERM_PLANNINGS: &str = "plannings";
pub const PERM_USERS: &str = "users";

pub fn all_permissions() -> Vec<String> {
    vec![
        PERM_TEAMS.to_string(),
        PERM_PLANNINGS.to_string(),
        PERM_USERS.to_string(),
    ]
}
