// quill-service/src/routes/document_routes.rs
use crate::access;
use crate::models::{
    AccessRole, CreatePersonalFile, CreateTeamFile, Document, DocumentKind, EditAccessRequest,
    Grantee, GrantAccessRequest, RevokeAccessRequest, ServiceError, UpdateFileRequest,
};
use crate::realtime::RoomHub;
use crate::sharing;
use crate::store::Store;
use crate::utils::load_actor;
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::info;
use serde_json::json;
use uuid::Uuid;

// Create a personal document. The access list is seeded from the caller's
// entries (if any), with the owner-admin entry forced in.
#[post("/personal")]
async fn create_personal_file(
    req: HttpRequest,
    store: web::Data<Store>,
    data: web::Json<CreatePersonalFile>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;

    if data.title.is_empty() {
        return Err(ServiceError::Validation("Title is required.".to_string()));
    }

    info!("📝 Creating personal file: {} for user: {}", data.title, actor.user_id);

    let access = data.access.clone().unwrap_or_default();

    let now = Utc::now();
    let mut document = Document {
        id: Uuid::new_v4().to_string(),
        title: data.title.clone(),
        content: data.content.clone(),
        owner: actor.user_id.clone(),
        kind: DocumentKind::Personal,
        access,
        created_at: now,
        updated_at: now,
    };
    document.ensure_owner_entry();

    store.save_document(&document)?;

    info!("✅ File created: {}", document.id);

    Ok(HttpResponse::Created().json(json!({
        "message": "File created successfully.",
        "data": document
    })))
}

// Create a team document (editor or admin in the team)
#[post("/team")]
async fn create_team_file(
    req: HttpRequest,
    store: web::Data<Store>,
    data: web::Json<CreateTeamFile>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;

    let document = sharing::create_team_document(&store, &actor, &data)?;

    Ok(HttpResponse::Created().json(json!({
        "message": "File created successfully.",
        "data": document
    })))
}

// All documents visible to the actor: owned, granted directly, or granted
// via a current team membership.
#[get("")]
async fn get_all_files(
    req: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;

    let files: Vec<Document> = store
        .list_documents()?
        .into_iter()
        .filter(|d| access::is_visible(&actor, d))
        .collect();

    info!("✅ Found {} files visible to user: {}", files.len(), actor.user_id);

    Ok(HttpResponse::Ok().json(json!({
        "message": "Files retrieved successfully.",
        "data": files
    })))
}

// Actor-owned personal documents, most recently updated first
#[get("/personal")]
async fn get_personal_files(
    req: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;

    let mut files: Vec<Document> = store
        .list_documents()?
        .into_iter()
        .filter(|d| d.owner == actor.user_id && d.kind == DocumentKind::Personal)
        .collect();
    files.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    Ok(HttpResponse::Ok().json(json!({
        "message": "Files retrieved successfully.",
        "data": files
    })))
}

// Read one document, with grantee references expanded and the actor's
// effective role attached. Any access match is enough to read.
#[get("/{file_id}")]
async fn get_file(
    req: HttpRequest,
    store: web::Data<Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let file_id = path.into_inner();

    let document = store
        .find_document_by_id(&file_id)?
        .ok_or_else(|| ServiceError::NotFound("File".to_string()))?;

    let effective_role = access::require(&actor, &document, AccessRole::Viewer)?;

    // Expand owner and grantee ids into display summaries for the caller.
    let owner_summary = store.find_user_by_id(&document.owner)?.map(|u| u.summary());
    let mut access_view = Vec::with_capacity(document.access.len());
    for entry in &document.access {
        let grantee = match &entry.grantee {
            Grantee::Member(user_id) => json!({
                "member": store.find_user_by_id(user_id)?.map(|u| u.summary()),
                "member_id": user_id,
            }),
            Grantee::Team(team_id) => json!({
                "team": store.find_team_by_id(team_id)?.map(|t| json!({
                    "id": t.id,
                    "name": t.name,
                    "logo": t.logo,
                })),
                "team_id": team_id,
            }),
        };
        access_view.push(json!({
            "id": entry.id,
            "role": entry.role,
            "grantee": grantee,
        }));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "File retrieved successfully.",
        "data": {
            "id": document.id,
            "title": document.title,
            "content": document.content,
            "kind": document.kind,
            "owner": owner_summary,
            "access": access_view,
            "created_at": document.created_at.timestamp(),
            "updated_at": document.updated_at.timestamp(),
            "user_role": effective_role,
        }
    })))
}

// Update title/content/access wholesale (editor or admin)
#[put("/{file_id}")]
async fn update_file(
    req: HttpRequest,
    store: web::Data<Store>,
    path: web::Path<String>,
    data: web::Json<UpdateFileRequest>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let file_id = path.into_inner();

    if data.title.is_none() && data.content.is_none() && data.access.is_none() {
        return Err(ServiceError::Validation("No data to update.".to_string()));
    }

    let mut document = store
        .find_document_by_id(&file_id)?
        .ok_or_else(|| ServiceError::NotFound("File".to_string()))?;

    access::require(&actor, &document, AccessRole::Editor)?;

    if let Some(title) = &data.title {
        document.title = title.clone();
    }
    if let Some(content) = &data.content {
        document.content = content.clone();
    }
    if let Some(entries) = &data.access {
        document.access = entries.clone();
        document.ensure_owner_entry();
    }

    document.updated_at = Utc::now();
    store.save_document(&document)?;

    info!("✅ File updated: {}", document.id);

    Ok(HttpResponse::Ok().json(json!({
        "message": "File updated successfully.",
        "data": document
    })))
}

// Delete a document (owner unconditionally, otherwise resolved admin)
#[delete("/{file_id}")]
async fn delete_file(
    req: HttpRequest,
    store: web::Data<Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let file_id = path.into_inner();

    sharing::delete_document(&store, &actor, &file_id)?;

    Ok(HttpResponse::Ok().json(json!({ "message": "File deleted successfully." })))
}

// Grant access to a user or a team (document admin)
#[post("/{file_id}/access")]
async fn grant_access(
    req: HttpRequest,
    store: web::Data<Store>,
    hub: web::Data<RoomHub>,
    path: web::Path<String>,
    data: web::Json<GrantAccessRequest>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let file_id = path.into_inner();

    let document = sharing::grant_access(&store, &hub, &actor, &file_id, &data)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Access added successfully.",
        "data": document
    })))
}

// Revoke one access entry by its id (document admin; never the owner's)
#[delete("/{file_id}/access")]
async fn revoke_access(
    req: HttpRequest,
    store: web::Data<Store>,
    hub: web::Data<RoomHub>,
    path: web::Path<String>,
    data: web::Json<RevokeAccessRequest>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let file_id = path.into_inner();

    let document = sharing::revoke_access(&store, &hub, &actor, &file_id, &data.access_id)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Access removed successfully.",
        "data": document
    })))
}

// Change an access entry's role in place (document admin)
#[put("/{file_id}/access")]
async fn edit_access(
    req: HttpRequest,
    store: web::Data<Store>,
    hub: web::Data<RoomHub>,
    path: web::Path<String>,
    data: web::Json<EditAccessRequest>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let file_id = path.into_inner();

    let document =
        sharing::edit_access(&store, &hub, &actor, &file_id, &data.access_id, &data.role)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Access updated successfully.",
        "data": document
    })))
}

// Register all document routes
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_personal_file)
        .service(create_team_file)
        .service(get_personal_files)
        .service(get_all_files)
        .service(grant_access)
        .service(revoke_access)
        .service(edit_access)
        .service(get_file)
        .service(update_file)
        .service(delete_file);
}
