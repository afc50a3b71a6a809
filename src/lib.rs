pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod openapi;
pub mod schema;
pub mod seed;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use actix_files::Files;
use actix_multipart::form::MultipartFormConfig;
use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::auth_service::AuthService;
use application::catalog_service::CatalogService;
use application::chatbot_service::ChatbotService;
use application::order_service::OrderService;
use application::tokens::TokenKeys;
use config::AppConfig;
use errors::AppError;
use handlers::{admin, auth, chatbot, orders, products};
use infrastructure::gemini::GeminiClient;
use infrastructure::image_store::{ImageStore, PUBLIC_PREFIX};
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::product_repo::DieselProductRepository;
use infrastructure::user_repo::DieselUserRepository;
use openapi::ApiDoc;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const MULTIPART_TOTAL_LIMIT: usize = 6 * 1024 * 1024;

pub type Catalog = CatalogService<DieselProductRepository>;
pub type Orders = OrderService<DieselOrderRepository>;
pub type Auth = AuthService<DieselUserRepository>;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Everything the handlers share, built once per process.
#[derive(Clone)]
pub struct AppState {
    pub catalog: web::Data<Catalog>,
    pub orders: web::Data<Orders>,
    pub auth: web::Data<Auth>,
    pub chatbot: web::Data<ChatbotService>,
    pub tokens: web::Data<TokenKeys>,
    pub images: web::Data<ImageStore>,
}

impl AppState {
    pub fn new(pool: DbPool, config: &AppConfig) -> std::io::Result<Self> {
        let tokens = TokenKeys::new(&config.jwt_secret, chrono::Duration::hours(config.jwt_ttl_hours));

        let chatbot = match &config.gemini_api_key {
            Some(key) => {
                let client = GeminiClient::new(&config.chatbot_url, key)
                    .map_err(|e| std::io::Error::other(e.to_string()))?;
                ChatbotService::new(Arc::new(client))
            }
            None => {
                log::warn!("GEMINI_API_KEY not set, chatbot will only send fallback replies");
                ChatbotService::offline()
            }
        };

        Ok(Self::assemble(
            AuthService::new(DieselUserRepository::new(pool.clone()), tokens.clone()),
            pool,
            tokens,
            chatbot,
            ImageStore::new(&config.upload_dir)?,
        ))
    }

    /// Wires the Diesel-backed services around an already-built auth service.
    pub fn assemble(
        auth: Auth,
        pool: DbPool,
        tokens: TokenKeys,
        chatbot: ChatbotService,
        images: ImageStore,
    ) -> Self {
        Self {
            catalog: web::Data::new(CatalogService::new(DieselProductRepository::new(pool.clone()))),
            orders: web::Data::new(OrderService::new(DieselOrderRepository::new(pool))),
            auth: web::Data::new(auth),
            chatbot: web::Data::new(chatbot),
            tokens: web::Data::new(tokens),
            images: web::Data::new(images),
        }
    }
}

/// Registers shared state, routes, uploaded images and the API docs.
pub fn configure(state: &AppState, cfg: &mut web::ServiceConfig) {
    cfg.app_data(state.catalog.clone())
        .app_data(state.orders.clone())
        .app_data(state.auth.clone())
        .app_data(state.chatbot.clone())
        .app_data(state.tokens.clone())
        .app_data(state.images.clone())
        .app_data(web::JsonConfig::default().error_handler(|err, _| {
            AppError::BadRequest(format!("Invalid request body: {}", err)).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _| {
            AppError::BadRequest(format!("Invalid id: {}", err)).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _| {
            AppError::BadRequest(format!("Invalid query: {}", err)).into()
        }))
        .app_data(
            MultipartFormConfig::default()
                .total_limit(MULTIPART_TOTAL_LIMIT)
                .error_handler(|err, _| {
                    AppError::BadRequest(format!("Invalid form data: {}", err)).into()
                }),
        )
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(auth::register))
                        .route("/login", web::post().to(auth::login))
                        .route("/me", web::get().to(auth::me)),
                )
                .service(
                    web::scope("/products")
                        .service(
                            web::resource("")
                                .route(web::get().to(products::list_products))
                                .route(web::post().to(products::create_product)),
                        )
                        .service(
                            web::resource("/{id}")
                                .route(web::get().to(products::get_product))
                                .route(web::put().to(products::update_product))
                                .route(web::delete().to(products::delete_product)),
                        ),
                )
                .service(
                    web::scope("/orders")
                        .service(
                            web::resource("")
                                .route(web::get().to(orders::list_orders))
                                .route(web::post().to(orders::place_order)),
                        )
                        .route("/my-orders", web::get().to(orders::my_orders))
                        .route("/{id}/status", web::put().to(orders::update_status)),
                )
                .route("/admin/stats", web::get().to(admin::stats))
                .route("/chatbot/chat", web::post().to(chatbot::chat)),
        )
        .service(Files::new(PUBLIC_PREFIX, state.images.dir()))
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| configure(&state, cfg))
    })
    .bind((host.to_string(), port))?
    .run())
}
