use mercadopago_ticketing_bridge::configuration::get_configuration;
use mercadopago_ticketing_bridge::startup::Application;
use mercadopago_ticketing_bridge::telemetry::{get_json_subscriber, init_subscriber};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_json_subscriber(
        "mercadopago-ticketing-bridge".into(),
        "info".into(),
        std::io::stdout,
    );
    init_subscriber(subscriber);

    let configuration = get_configuration().expect("Failed to read configuration.");
    let application = Application::build(configuration).await?;
    application.run_until_stopped().await?;
    Ok(())
}
