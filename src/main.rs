use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use fundlink::config::{LoggingSettings, Settings};
use fundlink::core::{FundingRequestOrchestrator, OrchestratorSettings};
use fundlink::routes::{self, AppState};
use fundlink::services::{
    AppwriteClient, AppwriteCollections, CachedDirectory, FundingStore, HttpOutreachDispatcher,
    OutreachDispatcher, PostgresClient, ProfileDirectory,
};
use fundlink::JwtVerifier;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path parameter errors
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(&LoggingSettings::default());
            return Err(startup_error("Failed to load configuration", e));
        }
    };

    init_tracing(&settings.logging);

    info!("Starting FundLink funding request service...");

    if settings.auth.jwt_secret.trim().is_empty() {
        return Err(startup_error("Configuration error", "auth.jwt_secret is empty"));
    }

    // Profile directory, optionally behind the investor cache
    let appwrite = AppwriteClient::new(
        settings.appwrite.endpoint.clone(),
        settings.appwrite.api_key.clone(),
        settings.appwrite.project_id.clone(),
        settings.appwrite.database_id.clone(),
        AppwriteCollections {
            founder_profiles: settings.collection.founder_profiles.clone(),
            investor_profiles: settings.collection.investor_profiles.clone(),
        },
        Duration::from_secs(settings.appwrite.timeout_secs),
    )
    .map_err(|e| startup_error("Failed to build Appwrite client", e))?;

    let directory: Arc<dyn ProfileDirectory> = if settings.cache.enabled {
        info!(
            "Investor cache enabled ({} entries, TTL: {}s)",
            settings.cache.max_entries, settings.cache.ttl_secs
        );
        Arc::new(CachedDirectory::new(
            Arc::new(appwrite),
            settings.cache.max_entries,
            settings.cache.ttl_secs,
        ))
    } else {
        Arc::new(appwrite)
    };

    info!("Appwrite directory initialized");

    let db_max_conn = settings.database.max_connections.unwrap_or(10);

    let store: Arc<dyn FundingStore> = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            Some(db_max_conn),
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
    );

    info!("PostgreSQL client initialized (max: {} connections)", db_max_conn);

    let dispatcher: Arc<dyn OutreachDispatcher> = Arc::new(
        HttpOutreachDispatcher::new(
            settings.outreach.endpoint.clone(),
            settings.outreach.api_key.clone(),
            Duration::from_secs(settings.outreach.timeout_secs),
        )
        .map_err(|e| startup_error("Failed to build outreach dispatcher", e))?,
    );

    let orchestrator = Arc::new(FundingRequestOrchestrator::new(
        store.clone(),
        directory,
        dispatcher,
        OrchestratorSettings {
            elevated_roles: settings.auth.elevated_roles.clone(),
            prefer_verified_documents: settings.outreach.prefer_verified_documents,
        },
    ));

    info!("Orchestrator initialized (elevated roles: {:?})", settings.auth.elevated_roles);

    let app_state = AppState { orchestrator, store };
    let verifier = web::Data::new(JwtVerifier::new(&settings.auth.jwt_secret));

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(verifier.clone())
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
