use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use crate::configuration::{ApplicationSettings, SecretSetting, Settings, TicketingSettings};
use crate::mercadopago_client::{GenericPaymentGateway, MercadoPagoClient};
use crate::routes::main_route;
use crate::ticketing_client::{GenericTicketingService, TicketingClient};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let payment_gateway: Arc<dyn GenericPaymentGateway> =
            Arc::new(MercadoPagoClient::new(&configuration.gateway));
        let ticketing_service: Arc<dyn GenericTicketingService> =
            Arc::new(TicketingClient::new(&configuration.ticketing));
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        tracing::info!("Listening on {}", address);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        let server = run(
            listener,
            payment_gateway,
            ticketing_service,
            configuration.secret,
            configuration.application,
            configuration.ticketing,
        )
        .await?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub async fn run(
    listener: TcpListener,
    payment_gateway: Arc<dyn GenericPaymentGateway>,
    ticketing_service: Arc<dyn GenericTicketingService>,
    secret: SecretSetting,
    application_setting: ApplicationSettings,
    ticketing_setting: TicketingSettings,
) -> Result<Server, anyhow::Error> {
    let payment_gateway = web::Data::new(payment_gateway);
    let ticketing_service = web::Data::new(ticketing_service);
    let secret_obj = web::Data::new(secret);
    let application_setting_obj = web::Data::new(application_setting);
    let ticketing_setting_obj = web::Data::new(ticketing_setting);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(payment_gateway.clone())
            .app_data(ticketing_service.clone())
            .app_data(secret_obj.clone())
            .app_data(application_setting_obj.clone())
            .app_data(ticketing_setting_obj.clone())
            .configure(main_route)
    })
    .workers(4)
    .listen(listener)?
    .run();

    Ok(server)
}
