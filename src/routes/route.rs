use crate::middleware::RequireAuth;
use crate::openapi::ApiDoc;
use crate::routes::{checkout_route, notification_route, provider_route, util_route};
use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn main_route(cfg: &mut web::ServiceConfig) {
    let openapi = ApiDoc::openapi();
    // Webhook and return endpoints are called by the gateway and the
    // buyer's browser, so they stay outside the authenticated scopes.
    cfg.configure(notification_route)
        .service(web::scope("/util").configure(util_route))
        .service(
            web::scope("/checkout")
                .configure(checkout_route)
                .wrap(RequireAuth),
        )
        .service(
            web::scope("/provider")
                .configure(provider_route)
                .wrap(RequireAuth),
        )
        .service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", openapi.clone()));
}
