pub mod checkout;
pub mod notification;
pub mod provider;
mod route;
pub mod util;

pub use checkout::checkout_route;
pub use notification::notification_route;
pub use provider::provider_route;
pub use route::main_route;
pub use util::util_route;
