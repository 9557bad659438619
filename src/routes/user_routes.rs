// quill-service/src/routes/user_routes.rs
use crate::models::{
    LoginRequest, LoginResponse, ProfileUpdate, ServiceError, SignupRequest, User, UserName,
};
use crate::store::Store;
use crate::utils::{jwt, load_actor, password};
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::{error, info};
use regex::RegexBuilder;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

// Create a new user (signup)
#[post("/signup")]
async fn signup(
    store: web::Data<Store>,
    data: web::Json<SignupRequest>,
) -> Result<HttpResponse, ServiceError> {
    info!("📝 Signup request for username: {}", data.username);

    if data.username.is_empty() || data.email.is_empty() {
        return Err(ServiceError::Validation(
            "Username and email are required.".to_string(),
        ));
    }
    if data.password.is_empty() {
        return Err(ServiceError::Validation("Password is required.".to_string()));
    }
    if data.first_name.is_empty() {
        return Err(ServiceError::Validation(
            "First name is required.".to_string(),
        ));
    }

    if store.find_user_by_username(&data.username)?.is_some()
        || store.find_user_by_email(&data.email)?.is_some()
    {
        error!("❌ Username or email already exists: {}", data.username);
        return Err(ServiceError::Conflict(
            "Username or email already exists.".to_string(),
        ));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: data.username.clone(),
        email: data.email.clone(),
        password_hash: password::hash_password(&data.password)?,
        name: UserName {
            first_name: data.first_name.clone(),
            middle_name: data.middle_name.clone().unwrap_or_default(),
            last_name: data.last_name.clone().unwrap_or_default(),
        },
        avatar: data.avatar.clone(),
        bio: data.bio.clone(),
        teams: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    store.save_user(&user)?;

    info!("✅ User registered successfully: {}", user.id);

    Ok(HttpResponse::Created().json(json!({
        "message": "User created successfully.",
        "data": user.profile()
    })))
}

// Login and get JWT token
#[post("/login")]
async fn login(
    store: web::Data<Store>,
    data: web::Json<LoginRequest>,
) -> Result<HttpResponse, ServiceError> {
    info!("🔑 Login request for username: {}", data.username);

    let user = match store.find_user_by_username(&data.username)? {
        Some(user) => user,
        None => {
            error!("❌ User not found: {}", data.username);
            return Err(ServiceError::NotFound("User".to_string()));
        }
    };

    if !password::verify_password(&data.password, &user.password_hash)? {
        error!("❌ Invalid password for user: {}", data.username);
        return Err(ServiceError::Validation("Invalid credentials.".to_string()));
    }

    let token = jwt::generate_token(&user)?;

    info!("✅ User logged in successfully: {}", user.id);

    let response = LoginResponse {
        token: token.clone(),
        user_id: user.id,
        username: user.username,
    };

    Ok(HttpResponse::Ok()
        .append_header(("Authorization", format!("Bearer {}", token)))
        .json(response))
}

// Authenticated ping
#[get("/check")]
async fn check(req: HttpRequest, store: web::Data<Store>) -> Result<HttpResponse, ServiceError> {
    load_actor(&req, &store)?;
    Ok(HttpResponse::Ok().json(json!({ "message": "User is logged in." })))
}

// Get current user's profile
#[get("/data")]
async fn current_user(
    req: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, ServiceError> {
    let (user, _) = load_actor(&req, &store)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "User details retrieved.",
        "data": user.profile()
    })))
}

// Get all users (public projections only)
#[get("/all")]
async fn all_users(store: web::Data<Store>) -> Result<HttpResponse, ServiceError> {
    let users: Vec<_> = store.list_users()?.iter().map(User::summary).collect();

    Ok(HttpResponse::Ok().json(json!({
        "message": "Users retrieved successfully.",
        "data": users
    })))
}

#[derive(Deserialize)]
struct UsernameQuery {
    username: String,
}

// Search users by username, case-insensitive
#[get("/search")]
async fn search_users(
    store: web::Data<Store>,
    query: web::Query<UsernameQuery>,
) -> Result<HttpResponse, ServiceError> {
    info!("🔍 Username search: {}", query.username);

    let pattern = RegexBuilder::new(&regex::escape(&query.username))
        .case_insensitive(true)
        .build()
        .map_err(|_| ServiceError::Validation("Invalid search pattern.".to_string()))?;

    let matches: Vec<_> = store
        .list_users()?
        .iter()
        .filter(|u| pattern.is_match(&u.username))
        .map(|u| u.summary())
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "message": "Users retrieved successfully.",
        "data": matches
    })))
}

// Get a user by ID
#[get("/{id}")]
async fn get_user(
    store: web::Data<Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();

    let user = store
        .find_user_by_id(&id)?
        .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "User retrieved successfully.",
        "data": user.summary()
    })))
}

// Update a user's profile. Only the user themselves may do this.
#[put("/{id}")]
async fn update_user(
    req: HttpRequest,
    store: web::Data<Store>,
    path: web::Path<String>,
    data: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let id = path.into_inner();

    if actor.user_id != id {
        return Err(ServiceError::Denied);
    }

    let mut user = store
        .find_user_by_id(&id)?
        .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

    if let Some(email) = &data.email {
        if *email != user.email && store.find_user_by_email(email)?.is_some() {
            return Err(ServiceError::Conflict("Email already exists.".to_string()));
        }
        user.email = email.clone();
    }
    if let Some(username) = &data.username {
        if *username != user.username && store.find_user_by_username(username)?.is_some() {
            return Err(ServiceError::Conflict(
                "Username already exists.".to_string(),
            ));
        }
        user.username = username.clone();
    }
    if let Some(first_name) = &data.first_name {
        user.name.first_name = first_name.clone();
    }
    if let Some(middle_name) = &data.middle_name {
        user.name.middle_name = middle_name.clone();
    }
    if let Some(last_name) = &data.last_name {
        user.name.last_name = last_name.clone();
    }
    if let Some(avatar) = &data.avatar {
        user.avatar = Some(avatar.clone());
    }
    if let Some(bio) = &data.bio {
        user.bio = Some(bio.clone());
    }

    user.updated_at = Utc::now();
    store.save_user(&user)?;

    info!("✅ User updated: {}", user.id);

    Ok(HttpResponse::Ok().json(json!({
        "message": "User updated successfully.",
        "data": user.profile()
    })))
}

// Delete a user. Only the user themselves may do this.
#[delete("/{id}")]
async fn delete_user(
    req: HttpRequest,
    store: web::Data<Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let (_, actor) = load_actor(&req, &store)?;
    let id = path.into_inner();

    if actor.user_id != id {
        return Err(ServiceError::Denied);
    }

    if !store.delete_user(&id)? {
        return Err(ServiceError::NotFound("User".to_string()));
    }

    info!("✅ User deleted: {}", id);

    Ok(HttpResponse::Ok().json(json!({ "message": "User deleted successfully." })))
}

// Signup and login sit outside the auth middleware
pub fn public_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(signup).service(login);
}

// Everything else requires a valid token
pub fn protected_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(check)
        .service(current_user)
        .service(all_users)
        .service(search_users)
        .service(get_user)
        .service(update_user)
        .service(delete_user);
}
