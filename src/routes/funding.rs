use actix_web::{error, http::StatusCode, web, HttpResponse, Responder};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::Caller;
use crate::core::{FundingError, FundingRequestOrchestrator};
use crate::models::{CreateFundingRequest, CreateFundingResponse, ErrorResponse, HealthResponse};
use crate::services::FundingStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<FundingRequestOrchestrator>,
    pub store: Arc<dyn FundingStore>,
}

impl error::ResponseError for FundingError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(FundingError::status_code(self))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let status = error::ResponseError::status_code(self);
        let message = if status.is_server_error() {
            "The request could not be completed, please retry later".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}

/// Configure all funding request routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/funding-requests", web::post().to(create_funding_request))
        .route("/funding-requests/{id}", web::get().to(get_funding_request));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if db_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Create funding request endpoint
///
/// POST /api/v1/funding-requests
///
/// Request body:
/// ```json
/// {
///   "fundingStage": "seed",
///   "useOfFunds": "string",
///   "sendToInvestorsImmediately": true,
///   "investorIds": ["string"],
///   "customEmailMessage": "string",
///   "specifiedPitchDeckDocumentIds": ["string"]
/// }
/// ```
async fn create_funding_request(
    state: web::Data<AppState>,
    caller: Caller,
    req: web::Json<CreateFundingRequest>,
) -> Result<HttpResponse, FundingError> {
    let data = match state
        .orchestrator
        .create_funding_request(&caller, req.into_inner())
        .await
    {
        Ok(data) => data,
        Err(e) => {
            if e.status_code() >= 500 {
                tracing::error!("Funding request for caller {} failed: {}", caller.user_id, e);
            } else {
                tracing::info!("Funding request for caller {} rejected: {}", caller.user_id, e);
            }
            return Err(e);
        }
    };

    let message = match &data.email_results {
        Some(outcome) if outcome.success => "Funding request created and sent to investors",
        Some(_) => "Funding request created, but investor outreach failed",
        None => "Funding request created successfully",
    };

    Ok(HttpResponse::Created().json(CreateFundingResponse {
        message: message.to_string(),
        data,
    }))
}

/// Read a funding request with its outreach counts
///
/// GET /api/v1/funding-requests/{id}
async fn get_funding_request(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
) -> Result<HttpResponse, FundingError> {
    let raw = path.into_inner();
    let id = Uuid::parse_str(&raw)
        .map_err(|_| FundingError::InvalidInput(format!("'{}' is not a valid funding request id", raw)))?;

    let view = state.orchestrator.get_funding_request(&caller, id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "data": view })))
}
