// quill-service/src/main.rs
use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use log::info;
use quill_service::realtime::RoomHub;
use quill_service::routes::{document_routes, team_routes, user_routes};
use quill_service::store::Store;
use quill_service::utils::Authentication;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let address = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let storage_dir = std::env::var("STORAGE_DIR").unwrap_or_else(|_| "./storage".to_string());

    let store = web::Data::new(Store::open(&storage_dir)?);
    let hub = web::Data::new(RoomHub::new());

    info!("🚀 Server starting at {}", address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:5173")
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .app_data(store.clone())
            .app_data(hub.clone())
            .wrap(cors)
            .service(
                web::scope("/api/user")
                    .configure(user_routes::public_routes)
                    .service(
                        web::scope("")
                            .wrap(Authentication)
                            .configure(user_routes::protected_routes),
                    ),
            )
            .service(
                web::scope("/api/team")
                    .wrap(Authentication)
                    .configure(team_routes::init_routes),
            )
            .service(
                web::scope("/api/files")
                    .wrap(Authentication)
                    .configure(document_routes::init_routes),
            )
    })
    .bind(address)?
    .run()
    .await
}
