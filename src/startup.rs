use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::configuration::Settings;
use crate::error::AppError;
use crate::middleware::{JwtMiddleware, LoggerMiddleware};
use crate::routes::{get_current_user, health_check, login, refresh, register};
use crate::store::{CredentialStore, InMemoryCredentialStore, PgCredentialStore};

/// Build the credential store and auth service described by `configuration`
pub async fn build_auth_service(configuration: Settings) -> Result<AuthService, AppError> {
    let store: Arc<dyn CredentialStore> = if configuration.database.in_memory {
        tracing::warn!("Using in-memory credential store; accounts are not persisted");
        Arc::new(InMemoryCredentialStore::new())
    } else {
        tracing::info!("Attempting to connect to database");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&configuration.database.connection_string())
            .await?;
        let store = PgCredentialStore::new(pool);
        store.migrate().await?;
        tracing::info!("Database connection pool created and migrated");
        Arc::new(store)
    };

    Ok(AuthService::new(store, Arc::new(configuration.jwt))
        .with_generic_login_errors(configuration.application.generic_login_errors))
}

pub fn run(listener: TcpListener, auth: AuthService) -> Result<Server, std::io::Error> {
    let jwt_config = auth.jwt_settings();
    let auth = web::Data::new(auth);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .app_data(auth.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh-token", web::post().to(refresh))
                    .service(
                        web::resource("/me")
                            .wrap(JwtMiddleware::new(jwt_config.clone()))
                            .route(web::get().to(get_current_user)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
