// quill-service/src/routes/team_routes.rs
use crate::models::{
    CreateTeamRequest, MemberIdsRequest, ServiceError, Team, TeamMember, TeamMemberView, TeamRole,
    TeamView, UnlinkFilesRequest, UpdateMemberRoleRequest, UpdateTeamRequest,
};
use crate::realtime::RoomHub;
use crate::sharing;
use crate::store::Store;
use crate::utils::load_actor;
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::{error, info};
use regex::RegexBuilder;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

// Create a new team. The creator is always an admin; any other seeded
// member starts at the lowest rung regardless of the requested role.
#[post("")]
async fn create_team(
    req: HttpRequest,
    store: web::Data<Store>,
    data: web::Json<CreateTeamRequest>,
) -> Result<HttpResponse, ServiceError> {
    let (creator, actor) = load_actor(&req, &store)?;

    if data.name.is_empty() {
        return Err(ServiceError::Validation(
            "Team name is required.".to_string(),
        ));
    }

    info!("📝 Creating team: {} for user: {}", data.name, actor.user_id);

    let seeds = data.members.as_deref().unwrap_or_default();

    // Every seeded member must exist before anything is written.
    let mut seed_users = Vec::new();
    for seed in seeds {
        if seed.member == actor.user_id {
            continue;
        }
        match store.find_user_by_id(&seed.member)? {
            Some(user) => seed_users.push(user),
            None => {
                error!("❌ Invalid member in team creation: {}", seed.member);
                return Err(ServiceError::Validation(
                    "Some members are invalid.".to_string(),
                ));
            }
        }
    }

    let mut members = vec![TeamMember {
        user_id: actor.user_id.clone(),
        role: TeamRole::Admin,
    }];
    for user in &seed_users {
        if !members.iter().any(|m| m.user_id == user.id) {
            members.push(TeamMember {
                user_id: user.id.clone(),
                role: TeamRole::Member,
            });
        }
    }

    let now = Utc::now();
    let team = Team {
        id: Uuid::new_v4().to_string(),
        name: data.name.clone(),
        logo: data.logo.clone(),
        members,
        files: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    store.save_team(&team)?;

    // Keep the member <-> team back-reference agreed from the start: the
    // creator and every seeded member gains the team in their team-set.
    for mut user in seed_users.into_iter().chain(std::iter::once(creator)) {
        if !user.teams.iter().any(|t| *t == team.id) {
            user.teams.push(team.id.clone());
            user.updated_at = now;
            store.save_user(&user)?;
        }
    }

    info!("✅ Team created successfully: {}", team.id);

    Ok(HttpResponse::Created().json(json!({
        "message": "Team created successfully.",
        "data": team
    })))
}

// Get the teams the current user belongs to
#[get("")]
async fn get_user_teams(
    req: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;

    let teams = store.teams_for_user(&actor.user_id)?;

    info!("✅ Found {} teams for user: {}", teams.len(), actor.user_id);

    Ok(HttpResponse::Ok().json(json!({
        "message": "Teams retrieved successfully.",
        "data": teams
    })))
}

#[derive(Deserialize)]
struct TeamNameQuery {
    #[serde(default)]
    name: String,
}

// Search teams by name, split into teams the user belongs to and the rest
#[get("/search")]
async fn search_teams(
    req: HttpRequest,
    store: web::Data<Store>,
    query: web::Query<TeamNameQuery>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;

    let pattern = RegexBuilder::new(&regex::escape(&query.name))
        .case_insensitive(true)
        .build()
        .map_err(|_| ServiceError::Validation("Invalid search pattern.".to_string()))?;

    let mut member_teams = Vec::new();
    let mut other_teams = Vec::new();

    for team in store.list_teams()? {
        if !pattern.is_match(&team.name) {
            continue;
        }
        if team.is_member(&actor.user_id) {
            member_teams.push(team);
        } else {
            other_teams.push(team);
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Team suggestions retrieved successfully.",
        "data": {
            "member_teams": member_teams,
            "other_teams": other_teams
        }
    })))
}

// Get a team by ID, with members and documents expanded. Members only.
#[get("/{team_id}")]
async fn get_team(
    req: HttpRequest,
    store: web::Data<Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let team_id = path.into_inner();

    let team = store
        .find_team_by_id(&team_id)?
        .ok_or_else(|| ServiceError::NotFound("Team".to_string()))?;

    if !team.is_member(&actor.user_id) {
        error!("❌ User: {} doesn't have access to team: {}", actor.user_id, team_id);
        return Err(ServiceError::Denied);
    }

    let mut members = Vec::with_capacity(team.members.len());
    for member in &team.members {
        if let Some(user) = store.find_user_by_id(&member.user_id)? {
            members.push(TeamMemberView {
                user: user.summary(),
                role: member.role,
            });
        }
    }

    let mut files = Vec::with_capacity(team.files.len());
    for file_id in &team.files {
        if let Some(document) = store.find_document_by_id(file_id)? {
            files.push(document.summary());
        }
    }

    let view = TeamView {
        id: team.id,
        name: team.name,
        logo: team.logo,
        members,
        files,
        created_at: team.created_at,
    };

    Ok(HttpResponse::Ok().json(json!({
        "message": "Team retrieved successfully.",
        "data": view
    })))
}

// Update team name/logo. Team-admin only.
#[put("/{team_id}")]
async fn update_team(
    req: HttpRequest,
    store: web::Data<Store>,
    path: web::Path<String>,
    data: web::Json<UpdateTeamRequest>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let team_id = path.into_inner();

    let mut team = store
        .find_team_by_id(&team_id)?
        .ok_or_else(|| ServiceError::NotFound("Team".to_string()))?;

    if !team.has_role(&actor.user_id, TeamRole::Admin) {
        return Err(ServiceError::Denied);
    }

    if let Some(name) = &data.name {
        team.name = name.clone();
    }
    if let Some(logo) = &data.logo {
        team.logo = Some(logo.clone());
    }

    team.updated_at = Utc::now();
    store.save_team(&team)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Team updated successfully.",
        "data": team
    })))
}

// Delete a team. Team-admin only.
#[delete("/{team_id}")]
async fn delete_team(
    req: HttpRequest,
    store: web::Data<Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let team_id = path.into_inner();

    sharing::delete_team(&store, &actor, &team_id)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Team deleted successfully.",
        "team_id": team_id
    })))
}

// Add members to a team
#[post("/{team_id}/members")]
async fn add_members(
    req: HttpRequest,
    store: web::Data<Store>,
    path: web::Path<String>,
    data: web::Json<MemberIdsRequest>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let team_id = path.into_inner();

    let team = sharing::add_team_members(&store, &actor, &team_id, &data.members)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Members added successfully.",
        "data": team
    })))
}

// Remove members from a team
#[delete("/{team_id}/members")]
async fn remove_members(
    req: HttpRequest,
    store: web::Data<Store>,
    path: web::Path<String>,
    data: web::Json<MemberIdsRequest>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let team_id = path.into_inner();

    let team = sharing::remove_team_members(&store, &actor, &team_id, &data.members)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Members removed successfully.",
        "data": team
    })))
}

// Update a member's role in a team. Team-admin only.
#[put("/{team_id}/members/{member_id}")]
async fn update_member_role(
    req: HttpRequest,
    store: web::Data<Store>,
    path: web::Path<(String, String)>,
    data: web::Json<UpdateMemberRoleRequest>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let (team_id, member_id) = path.into_inner();

    let role = TeamRole::parse(&data.role)
        .ok_or_else(|| ServiceError::Validation("Invalid role.".to_string()))?;

    let mut team = store
        .find_team_by_id(&team_id)?
        .ok_or_else(|| ServiceError::NotFound("Team".to_string()))?;

    if !team.has_role(&actor.user_id, TeamRole::Admin) {
        return Err(ServiceError::Denied);
    }

    let member = team
        .members
        .iter_mut()
        .find(|m| m.user_id == member_id)
        .ok_or_else(|| ServiceError::NotFound("Member".to_string()))?;

    member.role = role;
    team.updated_at = Utc::now();
    store.save_team(&team)?;

    info!("✅ Role updated for user: {} in team: {}", member_id, team_id);

    Ok(HttpResponse::Ok().json(json!({
        "message": "Member role updated successfully.",
        "data": team
    })))
}

// Unlink documents from a team and strip the team-scoped grants
#[delete("/{team_id}/files")]
async fn unlink_files(
    req: HttpRequest,
    store: web::Data<Store>,
    hub: web::Data<RoomHub>,
    path: web::Path<String>,
    data: web::Json<UnlinkFilesRequest>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let team_id = path.into_inner();

    let team = sharing::unlink_team_documents(&store, &hub, &actor, &team_id, &data.files)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Files removed and permissions updated successfully.",
        "data": { "files": team.files }
    })))
}

// Register all team routes
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_team)
        .service(get_user_teams)
        .service(search_teams)
        .service(add_members)
        .service(remove_members)
        .service(update_member_role)
        .service(unlink_files)
        .service(update_team)
        .service(delete_team)
        .service(get_team);
}
