// quill-service/src/models/document.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roles an access entry can carry, ordered by privilege. The derived `Ord`
/// is what the resolver uses: Admin > Editor > Viewer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AccessRole {
    Viewer,
    Editor,
    Admin,
}

impl AccessRole {
    /// Parse a caller-supplied role string. Grant/edit requests carry the
    /// role as free text so an invalid value surfaces as a Validation error
    /// instead of a deserialization failure.
    pub fn parse(value: &str) -> Option<AccessRole> {
        match value {
            "viewer" => Some(AccessRole::Viewer),
            "editor" => Some(AccessRole::Editor),
            "admin" => Some(AccessRole::Admin),
            _ => None,
        }
    }
}

/// Who an access entry is scoped to. A grant is always exactly one of the
/// two; a record with two optional id fields is not a valid encoding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Grantee {
    Member(String),
    Team(String),
}

/// One grant on a document's access list. Entries are addressed by their own
/// id when revoked or edited, not by the grantee's identity.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AccessEntry {
    #[serde(default = "new_entry_id")]
    pub id: String,
    #[serde(flatten)]
    pub grantee: Grantee,
    pub role: AccessRole,
}

fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

impl AccessEntry {
    pub fn member(user_id: impl Into<String>, role: AccessRole) -> AccessEntry {
        AccessEntry {
            id: new_entry_id(),
            grantee: Grantee::Member(user_id.into()),
            role,
        }
    }

    pub fn team(team_id: impl Into<String>, role: AccessRole) -> AccessEntry {
        AccessEntry {
            id: new_entry_id(),
            grantee: Grantee::Team(team_id.into()),
            role,
        }
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        matches!(&self.grantee, Grantee::Member(id) if id == user_id)
    }

    pub fn is_team(&self, team_id: &str) -> bool {
        matches!(&self.grantee, Grantee::Team(id) if id == team_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Personal,
    Team,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Document {
    pub id: String,
    pub title: String,
    /// Opaque text blob; the service never interprets its structure.
    pub content: String,
    /// Immutable once set at creation.
    pub owner: String,
    pub kind: DocumentKind,
    pub access: Vec<AccessEntry>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Restore the owner-admin entry if caller-supplied access dropped it,
    /// and raise it back to admin if it was seeded below. The owner's admin
    /// entry is an invariant, not a courtesy.
    pub fn ensure_owner_entry(&mut self) {
        let owner = self.owner.clone();
        match self.access.iter_mut().find(|e| e.is_member(&owner)) {
            Some(entry) => {
                if entry.role < AccessRole::Admin {
                    entry.role = AccessRole::Admin;
                }
            }
            None => self
                .access
                .push(AccessEntry::member(owner, AccessRole::Admin)),
        }
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            kind: self.kind,
            owner: self.owner.clone(),
            updated_at: self.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub kind: DocumentKind,
    pub owner: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

// Request payloads for the document routes
#[derive(Serialize, Deserialize, Debug)]
pub struct CreatePersonalFile {
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Optional caller-seeded entries; the owner-admin entry is forced in
    /// regardless.
    #[serde(default)]
    pub access: Option<Vec<AccessEntry>>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateTeamFile {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub team_id: String,
    /// Role for the team-scoped entry; "admin" when omitted.
    #[serde(default)]
    pub team_role: Option<String>,
    #[serde(default)]
    pub access: Option<Vec<AccessEntry>>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct UpdateFileRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub access: Option<Vec<AccessEntry>>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GrantAccessRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    pub role: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RevokeAccessRequest {
    pub access_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct EditAccessRequest {
    pub access_id: String,
    pub role: String,
}
