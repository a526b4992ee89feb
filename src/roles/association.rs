//! User/role association candidates and the record normalizer.

use crate::archive::types::MessageRecord;

/// Key sentinel for a role whose id is empty
pub const EMPTY_ROLE_ID: &str = "EMPTY_ROLE_ID";

/// Key sentinel for an author with no roles at all
pub const NO_ROLE_ASSIGNED: &str = "NO_ROLE_ASSIGNED";

/// Column names of the report, in row order
pub const CSV_HEADER: [&str; 5] = ["UserID", "Username", "DisplayName", "RoleID", "RoleName"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRef {
    pub id: String,
    pub name: String,
}

/// One (user, role) pairing observed in one message, before dedup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationCandidate {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    /// `None` when the author had no roles
    pub role: Option<RoleRef>,
}

impl AssociationCandidate {
    pub fn role_id(&self) -> &str {
        self.role.as_ref().map_or("", |r| r.id.as_str())
    }

    pub fn role_name(&self) -> &str {
        self.role.as_ref().map_or("", |r| r.name.as_str())
    }

    /// Dedup key: `<user>-<role id>`, with sentinels standing in for an
    /// empty role id and for an author without roles.
    ///
    /// ```
    /// use chat_role_audit::roles::association::{AssociationCandidate, RoleRef};
    ///
    /// let mut candidate = AssociationCandidate {
    ///     user_id: "1".into(),
    ///     username: "alice".into(),
    ///     display_name: "alice".into(),
    ///     role: None,
    /// };
    /// assert_eq!(candidate.unique_key(), "1-NO_ROLE_ASSIGNED");
    ///
    /// candidate.role = Some(RoleRef { id: String::new(), name: "ghost".into() });
    /// assert_eq!(candidate.unique_key(), "1-EMPTY_ROLE_ID");
    /// ```
    pub fn unique_key(&self) -> String {
        let role_part = match &self.role {
            None => NO_ROLE_ASSIGNED,
            Some(role) if role.id.is_empty() => EMPTY_ROLE_ID,
            Some(role) => role.id.as_str(),
        };
        format!("{}-{}", self.user_id, role_part)
    }

    /// Report fields in [`CSV_HEADER`] order.
    pub fn csv_row(&self) -> [&str; 5] {
        [
            self.user_id.as_str(),
            self.username.as_str(),
            self.display_name.as_str(),
            self.role_id(),
            self.role_name(),
        ]
    }
}

/// Turn one message into its association candidates.
///
/// - No author id: nothing (the message cannot be attributed).
/// - No roles: one candidate without a role.
/// - Otherwise one candidate per role, in the order the roles appear.
pub fn normalize(record: &MessageRecord) -> Vec<AssociationCandidate> {
    let author = &record.author;
    if author.id.is_empty() {
        return Vec::new();
    }

    let candidate = |role: Option<RoleRef>| AssociationCandidate {
        user_id: author.id.clone(),
        username: author.name.clone(),
        display_name: author.display_name().to_string(),
        role,
    };

    if author.roles.is_empty() {
        return vec![candidate(None)];
    }

    author
        .roles
        .iter()
        .map(|role| {
            candidate(Some(RoleRef {
                id: role.id.clone(),
                name: role.name.clone(),
            }))
        })
        .collect()
}
