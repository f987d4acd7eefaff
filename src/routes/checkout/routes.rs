use super::handlers::{create_preference, execute_refund, payment_details, shred_payment_info};
use actix_web::web;

pub fn checkout_route(cfg: &mut web::ServiceConfig) {
    cfg.route("/preference", web::post().to(create_preference))
        .route("/refund", web::post().to(execute_refund))
        .route(
            "/payment/{payment_id}/details",
            web::get().to(payment_details),
        )
        .route(
            "/payment/{payment_id}/shred",
            web::post().to(shred_payment_info),
        );
}
