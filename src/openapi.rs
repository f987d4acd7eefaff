use utoipa::OpenApi;
use utoipauto::utoipauto;

#[utoipauto]
#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "MercadoPago Ticketing Bridge REST API", description = "Payment provider endpoints for the ticketing platform")
    ),
)]
pub struct ApiDoc {}
