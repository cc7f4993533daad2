use std::fmt::Debug;
use std::fmt::Display;
use std::net::TcpListener;
use std::time::Duration;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use actix_web_lab::middleware::from_fn;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::task::JoinError;
use tracing_actix_web::TracingLogger;

use crate::authentication::reject_unauthenticated;
use crate::authentication::seed_admin;
use crate::authentication::TokenIssuer;
use crate::configuration::DatabaseSettings;
use crate::configuration::Settings;
use crate::configuration::StoreBackend;
use crate::delivery;
use crate::delivery::DeliveryWorker;
use crate::lifecycle::Lifecycle;
use crate::routes::admin_stats;
use crate::routes::create_subscriber;
use crate::routes::delete_message;
use crate::routes::delete_subscriber;
use crate::routes::get_message;
use crate::routes::get_subscriber;
use crate::routes::health_check;
use crate::routes::home;
use crate::routes::json_error_handler;
use crate::routes::list_messages;
use crate::routes::list_newsletters;
use crate::routes::list_subscribers;
use crate::routes::login;
use crate::routes::path_error_handler;
use crate::routes::query_error_handler;
use crate::routes::send_newsletter;
use crate::routes::submit_message;
use crate::routes::subscribe;
use crate::routes::unsubscribe;
use crate::routes::update_message;
use crate::routes::update_subscriber;
use crate::store::InMemoryStore;
use crate::store::PgStore;
use crate::store::Store;

/// The HTTP server plus the background delivery worker it feeds. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
    worker: DeliveryWorker,
}

impl Application {
    /// Bind the listener, prepare the configured store (migrations and admin
    /// seeding included), and wire up the server. Nothing is served until
    /// `run_until_stopped`.
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;
        // port 0 means the OS picked one
        let port = listener.local_addr()?.port();

        let (dispatcher, receiver) = delivery::channel();
        let worker = DeliveryWorker::new(
            receiver,
            cfg.email_client.clone().client()?,
            cfg.delivery.policy(),
        );
        let tokens = cfg.application.token_issuer();
        let admin = cfg.admin.credentials();

        let server = match cfg.application.store {
            StoreBackend::Memory => {
                let store = InMemoryStore::new();
                seed_admin(admin, &store).await?;
                run(listener, Lifecycle::new(store, dispatcher), tokens)?
            }
            StoreBackend::Postgres => {
                let store = PgStore::new(get_connection_pool(&cfg.database));
                store.migrate().await?;
                seed_admin(admin, &store).await?;
                run(listener, Lifecycle::new(store, dispatcher), tokens)?
            }
        };
        tracing::info!(port, store = ?cfg.application.store, "Application built");

        Ok(Self {
            port,
            server,
            worker,
        })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Run the server and the delivery worker side by side, returning as soon
    /// as either one stops. Because this consumes `self`, this should be the
    /// final call (or passed to `tokio::spawn`).
    pub async fn run_until_stopped(self) -> Result<(), anyhow::Error> {
        let server = tokio::spawn(self.server);
        let worker = tokio::spawn(self.worker.run());

        tokio::select! {
            o = server => report_exit("API", o),
            o = worker => report_exit("Background delivery worker", o),
        }
        Ok(())
    }
}

fn report_exit(
    name: &str,
    outcome: Result<Result<(), impl Debug + Display>, JoinError>,
) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{name} exited gracefully")
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{name} failed"
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{name} task failed to complete"
            )
        }
    }
}

/// The pool only connects when first used, so a down database fails requests
/// rather than startup (migrations aside).
pub fn get_connection_pool(db_cfg: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(db_cfg.connection())
}

/// Declare every endpoint for a given store backend. The server listens on an
/// already bound `listener`.
pub fn run<S: Store>(
    listener: TcpListener,
    lifecycle: Lifecycle<S>,
    tokens: TokenIssuer,
) -> Result<Server, anyhow::Error> {
    // `Data` is an `Arc`, so every worker shares one lifecycle (and store)
    let lifecycle = web::Data::new(lifecycle);
    let tokens = web::Data::new(tokens);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .route("/", web::get().to(home))
            .route("/health_check", web::get().to(health_check))
            .route("/newsletter", web::post().to(subscribe::<S>))
            .route("/newsletter/{id}", web::delete().to(unsubscribe::<S>))
            .route("/messages", web::post().to(submit_message::<S>))
            // registered before the `/admin` scope, so it is reachable without a token
            .route("/admin/login", web::post().to(login::<S>))
            .service(
                web::scope("/admin")
                    .wrap(from_fn(reject_unauthenticated))
                    .route("/subscribers", web::get().to(list_subscribers::<S>))
                    .route("/subscribers", web::post().to(create_subscriber::<S>))
                    .route("/subscribers/{id}", web::get().to(get_subscriber::<S>))
                    .route("/subscribers/{id}", web::patch().to(update_subscriber::<S>))
                    .route("/subscribers/{id}", web::delete().to(delete_subscriber::<S>))
                    .route("/messages", web::get().to(list_messages::<S>))
                    .route("/messages/{id}", web::get().to(get_message::<S>))
                    .route("/messages/{id}", web::patch().to(update_message::<S>))
                    .route("/messages/{id}", web::delete().to(delete_message::<S>))
                    .route("/newsletter-send", web::post().to(send_newsletter::<S>))
                    .route("/newsletters", web::get().to(list_newsletters::<S>))
                    .route("/stats", web::get().to(admin_stats::<S>)),
            )
            .app_data(lifecycle.clone())
            .app_data(tokens.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
