use actix_web::web;

use super::handlers::{return_abort, return_success, webhook, webhook_event};

// Gateway- and browser-facing endpoints; registered with full paths since
// neither caller can present the service token.
pub fn notification_route(cfg: &mut web::ServiceConfig) {
    cfg.route("/webhook/mercadopago", web::post().to(webhook));
    cfg.route("/webhook/{event}/mercadopago", web::post().to(webhook_event));
    cfg.route("/return/{event}/success", web::get().to(return_success));
    cfg.route("/return/{event}/abort", web::get().to(return_abort));
}
