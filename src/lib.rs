// quill-service/src/lib.rs
pub mod access;
pub mod models;
pub mod realtime;
pub mod routes;
pub mod sharing;
pub mod store;
pub mod utils;

#[cfg(test)]
mod tests;
