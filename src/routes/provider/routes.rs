use super::handlers::{provider_eligibility, provider_meta};
use actix_web::web;

pub fn provider_route(cfg: &mut web::ServiceConfig) {
    cfg.route("/meta", web::get().to(provider_meta))
        .route("/eligibility", web::post().to(provider_eligibility));
}
