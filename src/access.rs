// quill-service/src/access.rs
//
// Access Resolver: turns (actor, document) into an effective role, or
// nothing. Pure reads only; safe to call repeatedly and concurrently.
use crate::models::{AccessRole, Actor, Document, Grantee, ServiceError};

/// Compute the actor's effective role on a document.
///
/// Every entry that names the actor directly, or names a team in the
/// actor's current team-set, counts as a match. When several match the
/// highest privilege wins; a direct viewer grant plus a team admin grant
/// resolves to admin, never to whichever happened to come first.
pub fn resolve(actor: &Actor, document: &Document) -> Option<AccessRole> {
    let mut effective = None;

    for entry in &document.access {
        let matched = match &entry.grantee {
            Grantee::Member(user_id) => *user_id == actor.user_id,
            Grantee::Team(team_id) => actor.teams.iter().any(|t| t == team_id),
        };
        if matched && effective.map_or(true, |current| entry.role > current) {
            effective = Some(entry.role);
        }
    }

    effective
}

/// Resolve and require at least `min`, mapping anything less to Denied.
/// The error deliberately says nothing about who else holds access.
pub fn require(actor: &Actor, document: &Document, min: AccessRole) -> Result<AccessRole, ServiceError> {
    match resolve(actor, document) {
        Some(role) if role >= min => Ok(role),
        _ => Err(ServiceError::Denied),
    }
}

/// Whether the document shows up in the actor's visible set: owned,
/// granted directly, or granted via a current team.
pub fn is_visible(actor: &Actor, document: &Document) -> bool {
    document.owner == actor.user_id || resolve(actor, document).is_some()
}
