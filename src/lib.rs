pub mod configuration;
pub mod constants;
pub mod errors;
pub mod mercadopago_client;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod schemas;
pub mod startup;
pub mod telemetry;
pub mod ticketing_client;
pub mod utils;
