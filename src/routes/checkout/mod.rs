pub(crate) mod errors;
pub(crate) mod handlers;
mod routes;
pub(crate) mod schemas;
#[cfg(test)]
mod tests;
pub(crate) mod utils;
pub use routes::checkout_route;
