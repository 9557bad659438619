// quill-service/src/routes/mod.rs
pub mod document_routes;
pub mod team_routes;
pub mod user_routes;
