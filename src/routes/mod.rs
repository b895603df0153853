// Route exports
pub mod funding;

use actix_web::web;

pub use funding::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(funding::configure),
    );
}
