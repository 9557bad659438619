// quill-service/src/models/team.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DocumentSummary, UserSummary};

/// Role inside a team, ordered by privilege. The lowest rung is spelled
/// "member" on the wire; "viewer" is accepted as a legacy alias.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    #[serde(alias = "viewer")]
    Member,
    Editor,
    Admin,
}

impl TeamRole {
    pub fn parse(value: &str) -> Option<TeamRole> {
        match value {
            "member" | "viewer" => Some(TeamRole::Member),
            "editor" => Some(TeamRole::Editor),
            "admin" => Some(TeamRole::Admin),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TeamMember {
    pub user_id: String,
    pub role: TeamRole,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    pub members: Vec<TeamMember>,
    /// Documents linked to this team; mirrored by each document's
    /// team-scoped access entry.
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub fn role_of(&self, user_id: &str) -> Option<TeamRole> {
        self.members
            .iter()
            .find(|m| m.user_id == user_id)
            .map(|m| m.role)
    }

    pub fn has_role(&self, user_id: &str, min: TeamRole) -> bool {
        self.role_of(user_id).map_or(false, |role| role >= min)
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.role_of(user_id).is_some()
    }
}

// Request/response payloads for the team routes
#[derive(Serialize, Deserialize, Debug)]
pub struct TeamMemberSeed {
    pub member: String,
    #[serde(default)]
    pub role: Option<TeamRole>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub members: Option<Vec<TeamMemberSeed>>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub logo: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MemberIdsRequest {
    pub members: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateMemberRoleRequest {
    pub role: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UnlinkFilesRequest {
    pub files: Vec<String>,
}

/// Expanded read view: member and document references resolved to summaries.
#[derive(Serialize, Deserialize, Debug)]
pub struct TeamView {
    pub id: String,
    pub name: String,
    pub logo: Option<String>,
    pub members: Vec<TeamMemberView>,
    pub files: Vec<DocumentSummary>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TeamMemberView {
    pub user: UserSummary,
    pub role: TeamRole,
}
