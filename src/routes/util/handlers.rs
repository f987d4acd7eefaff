use actix_web::{HttpResponse, Responder};

#[utoipa::path(
    get,
    path = "/util/health_check",
    tag = "Health Check",
    responses(
        (status=200, description= "Service is running"),
    )
)]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("Running Server")
}
