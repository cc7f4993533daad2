use newsletter_admin::configuration::get_configuration;
use newsletter_admin::startup::Application;
use newsletter_admin::telemetry::get_subscriber;
use newsletter_admin::telemetry::init_subscriber;

/// Initialise telemetry, load config, and start the server and delivery worker
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("newsletter-admin", "info", std::io::stdout);
    init_subscriber(subscriber);

    let cfg = get_configuration()?;
    Application::build(cfg).await?.run_until_stopped().await
}
