// quill-service/src/sharing.rs
//
// Sharing coordinator: every operation that touches more than one entity's
// view of a relationship lives here, so the back-references (user <-> team,
// team <-> document, document access <-> team membership) are changed in
// one place. Multi-entity operations are sequences of single-record saves;
// validation happens up front so a failure aborts before any save.
use crate::access;
use crate::models::{
    AccessEntry, AccessRole, Actor, CreateTeamFile, Document, DocumentKind, GrantAccessRequest,
    ServiceError, Team, TeamMember, TeamRole,
};
use crate::realtime::{RoomEvent, RoomHub};
use crate::store::Store;
use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

// Document access grants

/// Add a user or a team to a document's access list. Caller must resolve to
/// admin on the document.
///
/// A team grant is expanded eagerly into one member entry per *current*
/// team member. The snapshot is deliberate: people joining the team later
/// get nothing from this grant, and people leaving keep what was expanded.
/// Only the team-scoped entry created with a team document is a live link.
pub fn grant_access(
    store: &Store,
    hub: &RoomHub,
    actor: &Actor,
    file_id: &str,
    request: &GrantAccessRequest,
) -> Result<Document, ServiceError> {
    let role = AccessRole::parse(&request.role)
        .ok_or_else(|| ServiceError::Validation("Invalid role.".to_string()))?;

    let mut document = store
        .find_document_by_id(file_id)?
        .ok_or_else(|| ServiceError::NotFound("File".to_string()))?;

    access::require(actor, &document, AccessRole::Admin)?;

    match (&request.user_id, &request.team_id) {
        (Some(user_id), _) => {
            if document.access.iter().any(|e| e.is_member(user_id)) {
                return Err(ServiceError::Conflict(
                    "User is already in the access list.".to_string(),
                ));
            }
            document.access.push(AccessEntry::member(user_id.clone(), role));
        }
        (None, Some(team_id)) => {
            let team = store
                .find_team_by_id(team_id)?
                .ok_or_else(|| ServiceError::NotFound("Team".to_string()))?;

            // Point-in-time expansion; members already on the list keep
            // their existing entry untouched.
            for member in &team.members {
                if !document.access.iter().any(|e| e.is_member(&member.user_id)) {
                    document
                        .access
                        .push(AccessEntry::member(member.user_id.clone(), role));
                }
            }
        }
        (None, None) => {
            return Err(ServiceError::Validation(
                "Either user_id or team_id is required.".to_string(),
            ));
        }
    }

    document.updated_at = Utc::now();
    store.save_document(&document)?;

    hub.publish(
        &document.id,
        RoomEvent::AccessChanged {
            document_id: document.id.clone(),
        },
    );

    info!("✅ Access granted on file: {}", document.id);
    Ok(document)
}

/// Remove one access entry, addressed by the entry's own id. The owner's
/// entry is untouchable; anything else needs a resolved admin.
pub fn revoke_access(
    store: &Store,
    hub: &RoomHub,
    actor: &Actor,
    file_id: &str,
    access_id: &str,
) -> Result<Document, ServiceError> {
    let mut document = store
        .find_document_by_id(file_id)?
        .ok_or_else(|| ServiceError::NotFound("File".to_string()))?;

    let index = document
        .access
        .iter()
        .position(|e| e.id == access_id)
        .ok_or_else(|| ServiceError::NotFound("Access entry".to_string()))?;

    if document.access[index].is_member(&document.owner) {
        return Err(ServiceError::Conflict(
            "Cannot remove owner from access list.".to_string(),
        ));
    }

    access::require(actor, &document, AccessRole::Admin)?;

    let removed = document.access.remove(index);
    document.updated_at = Utc::now();
    store.save_document(&document)?;

    // Revoking a team document's team-scoped entry also severs the team's
    // side of the link, keeping the two views of the relationship agreed.
    if document.kind == DocumentKind::Team {
        if let crate::models::Grantee::Team(team_id) = &removed.grantee {
            unlink_from_team_record(store, team_id, &document.id)?;
        }
    }

    hub.publish(
        &document.id,
        RoomEvent::AccessChanged {
            document_id: document.id.clone(),
        },
    );

    info!("✅ Access entry {} removed from file: {}", access_id, document.id);
    Ok(document)
}

/// Change an entry's role in place. Same admin requirement as revoke, minus
/// the owner restriction.
pub fn edit_access(
    store: &Store,
    hub: &RoomHub,
    actor: &Actor,
    file_id: &str,
    access_id: &str,
    role: &str,
) -> Result<Document, ServiceError> {
    let role = AccessRole::parse(role)
        .ok_or_else(|| ServiceError::Validation("Invalid role.".to_string()))?;

    let mut document = store
        .find_document_by_id(file_id)?
        .ok_or_else(|| ServiceError::NotFound("File".to_string()))?;

    access::require(actor, &document, AccessRole::Admin)?;

    let entry = document
        .access
        .iter_mut()
        .find(|e| e.id == access_id)
        .ok_or_else(|| ServiceError::NotFound("Access entry".to_string()))?;

    entry.role = role;
    document.updated_at = Utc::now();
    store.save_document(&document)?;

    hub.publish(
        &document.id,
        RoomEvent::AccessChanged {
            document_id: document.id.clone(),
        },
    );

    Ok(document)
}

// Team documents

/// Create a document owned by a team. Requires editor or admin in the team.
/// The access list is seeded with the owner-admin entry and the single
/// team-scoped entry that links the document into the team's file list.
pub fn create_team_document(
    store: &Store,
    actor: &Actor,
    request: &CreateTeamFile,
) -> Result<Document, ServiceError> {
    if request.title.is_empty() {
        return Err(ServiceError::Validation("Title is required.".to_string()));
    }

    let team_role = match &request.team_role {
        Some(value) => AccessRole::parse(value)
            .ok_or_else(|| ServiceError::Validation("Invalid role.".to_string()))?,
        None => AccessRole::Admin,
    };

    let mut team = store
        .find_team_by_id(&request.team_id)?
        .ok_or_else(|| ServiceError::NotFound("Team".to_string()))?;

    if !team.has_role(&actor.user_id, TeamRole::Editor) {
        return Err(ServiceError::Denied);
    }

    let mut access = request.access.clone().unwrap_or_default();
    if !access.iter().any(|e| e.is_team(&team.id)) {
        access.push(AccessEntry::team(team.id.clone(), team_role));
    }

    let now = Utc::now();
    let mut document = Document {
        id: Uuid::new_v4().to_string(),
        title: request.title.clone(),
        content: request.content.clone(),
        owner: actor.user_id.clone(),
        kind: DocumentKind::Team,
        access,
        created_at: now,
        updated_at: now,
    };
    document.ensure_owner_entry();

    store.save_document(&document)?;

    team.files.push(document.id.clone());
    team.updated_at = now;
    store.save_team(&team)?;

    info!("✅ Team file created: {} in team: {}", document.id, team.id);
    Ok(document)
}

/// Delete a document. The owner may always delete; anyone else needs a
/// resolved admin. Team documents are pulled from their team's file list.
pub fn delete_document(store: &Store, actor: &Actor, file_id: &str) -> Result<(), ServiceError> {
    let document = store
        .find_document_by_id(file_id)?
        .ok_or_else(|| ServiceError::NotFound("File".to_string()))?;

    if document.owner != actor.user_id {
        access::require(actor, &document, AccessRole::Admin)?;
    }

    if document.kind == DocumentKind::Team {
        // The owning team is found by scanning; a missing back-reference is
        // tolerated (the link may already have been unlinked).
        let owning_team = store
            .list_teams()?
            .into_iter()
            .find(|t| t.files.iter().any(|f| f == file_id));
        if let Some(mut team) = owning_team {
            team.files.retain(|f| f != file_id);
            team.updated_at = Utc::now();
            store.save_team(&team)?;
        }
    }

    store.delete_document(file_id)?;
    info!("✅ File deleted: {}", file_id);
    Ok(())
}

// Team membership

/// Add members to a team. Team-admin only. New members enter at the lowest
/// rung and gain the team in their own team-set.
pub fn add_team_members(
    store: &Store,
    actor: &Actor,
    team_id: &str,
    member_ids: &[String],
) -> Result<Team, ServiceError> {
    if member_ids.is_empty() {
        return Err(ServiceError::Validation("Members are required.".to_string()));
    }

    let mut team = store
        .find_team_by_id(team_id)?
        .ok_or_else(|| ServiceError::NotFound("Team".to_string()))?;

    if !team.has_role(&actor.user_id, TeamRole::Admin) {
        return Err(ServiceError::Denied);
    }

    let mut users = Vec::with_capacity(member_ids.len());
    for member_id in member_ids {
        match store.find_user_by_id(member_id)? {
            Some(user) => users.push(user),
            None => {
                return Err(ServiceError::Validation(
                    "Some members are invalid.".to_string(),
                ))
            }
        }
    }

    if member_ids.iter().any(|id| team.is_member(id)) {
        return Err(ServiceError::Conflict(
            "Some members are already in the team.".to_string(),
        ));
    }

    for member_id in member_ids {
        team.members.push(TeamMember {
            user_id: member_id.clone(),
            role: TeamRole::Member,
        });
    }
    team.updated_at = Utc::now();
    store.save_team(&team)?;

    for mut user in users {
        if !user.teams.iter().any(|t| t == team_id) {
            user.teams.push(team_id.to_string());
            user.updated_at = Utc::now();
            store.save_user(&user)?;
        }
    }

    info!("✅ Added {} member(s) to team: {}", member_ids.len(), team_id);
    Ok(team)
}

/// Remove members from a team. Team-admin only. The members' own team-sets
/// lose the team; their per-document access entries are left as they are
/// (grants were expanded at grant time and are not walked back here).
pub fn remove_team_members(
    store: &Store,
    actor: &Actor,
    team_id: &str,
    member_ids: &[String],
) -> Result<Team, ServiceError> {
    if member_ids.is_empty() {
        return Err(ServiceError::Validation(
            "Members to remove are required.".to_string(),
        ));
    }

    let mut team = store
        .find_team_by_id(team_id)?
        .ok_or_else(|| ServiceError::NotFound("Team".to_string()))?;

    if !team.has_role(&actor.user_id, TeamRole::Admin) {
        return Err(ServiceError::Denied);
    }

    if member_ids.iter().any(|id| !team.is_member(id)) {
        return Err(ServiceError::Validation(
            "Some members are not part of the team.".to_string(),
        ));
    }

    team.members
        .retain(|m| !member_ids.iter().any(|id| *id == m.user_id));
    team.updated_at = Utc::now();
    store.save_team(&team)?;

    for member_id in member_ids {
        if let Some(mut user) = store.find_user_by_id(member_id)? {
            user.teams.retain(|t| t != team_id);
            user.updated_at = Utc::now();
            store.save_user(&user)?;
        } else {
            warn!("Removed member {} has no user record", member_id);
        }
    }

    info!("✅ Removed {} member(s) from team: {}", member_ids.len(), team_id);
    Ok(team)
}

/// Unlink documents from a team: validate everything, then drop the ids
/// from the team's file list and strip the team-scoped entry from each
/// document. Team admin or editor.
pub fn unlink_team_documents(
    store: &Store,
    hub: &RoomHub,
    actor: &Actor,
    team_id: &str,
    file_ids: &[String],
) -> Result<Team, ServiceError> {
    if file_ids.is_empty() {
        return Err(ServiceError::Validation(
            "Files to remove are required.".to_string(),
        ));
    }

    let mut team = store
        .find_team_by_id(team_id)?
        .ok_or_else(|| ServiceError::NotFound("Team".to_string()))?;

    if !team.has_role(&actor.user_id, TeamRole::Editor) {
        return Err(ServiceError::Denied);
    }

    // Validate the whole batch before mutating anything.
    let mut documents = Vec::with_capacity(file_ids.len());
    for file_id in file_ids {
        let document = store
            .find_document_by_id(file_id)?
            .ok_or_else(|| ServiceError::NotFound("File".to_string()))?;
        if !document.access.iter().any(|e| e.is_team(team_id)) {
            return Err(ServiceError::Denied);
        }
        documents.push(document);
    }

    team.files.retain(|f| !file_ids.iter().any(|id| id == f));
    team.updated_at = Utc::now();
    store.save_team(&team)?;

    for mut document in documents {
        document.access.retain(|e| !e.is_team(team_id));
        document.updated_at = Utc::now();
        store.save_document(&document)?;
        hub.publish(
            &document.id,
            RoomEvent::AccessChanged {
                document_id: document.id.clone(),
            },
        );
    }

    info!("✅ Unlinked {} file(s) from team: {}", file_ids.len(), team_id);
    Ok(team)
}

/// Delete a team record. Team-admin only. Documents still carrying the
/// team in their access lists, and members still carrying the team in
/// their team-sets, are left untouched; those stale references can keep
/// resolving until cleaned up by hand.
pub fn delete_team(store: &Store, actor: &Actor, team_id: &str) -> Result<(), ServiceError> {
    let team = store
        .find_team_by_id(team_id)?
        .ok_or_else(|| ServiceError::NotFound("Team".to_string()))?;

    if !team.has_role(&actor.user_id, TeamRole::Admin) {
        return Err(ServiceError::Denied);
    }

    store.delete_team(team_id)?;
    info!("✅ Team deleted: {}", team_id);
    Ok(())
}

fn unlink_from_team_record(store: &Store, team_id: &str, file_id: &str) -> Result<(), ServiceError> {
    if let Some(mut team) = store.find_team_by_id(team_id)? {
        if team.files.iter().any(|f| f == file_id) {
            team.files.retain(|f| f != file_id);
            team.updated_at = Utc::now();
            store.save_team(&team)?;
        }
    }
    Ok(())
}
