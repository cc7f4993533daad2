use std::time::Duration;

use newsletter_admin::authentication::TokenIssuer;
use newsletter_admin::configuration::get_configuration;
use newsletter_admin::configuration::DatabaseSettings;
use newsletter_admin::configuration::StoreBackend;
use newsletter_admin::startup::Application;
use newsletter_admin::telemetry::get_subscriber;
use newsletter_admin::telemetry::init_subscriber;
use once_cell::sync::Lazy;
use reqwest::Method;
use reqwest::RequestBuilder;
use reqwest::Response;
use secrecy::Secret;
use serde_json::Value;
use sqlx::Connection;
use sqlx::Executor;
use sqlx::PgConnection;
use uuid::Uuid;
use wiremock::MockServer;
use wiremock::Request;

/// Init the tracing subscriber once for the whole test binary.
///
/// To opt in to verbose logging, use the env var `TEST_LOG`:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // the two sinks are different closure types, hence the duplicated arms
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber);
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber);
        }
    };
});

pub struct TestAdmin {
    pub email: String,
    pub password: String,
}

pub struct TestApp {
    pub addr: String,
    /// Stands in for the email API
    pub email_server: MockServer,
    pub api_client: reqwest::Client,
    pub admin: TestAdmin,
    /// Token for `admin`, obtained through `POST /admin/login`
    pub admin_token: String,
    /// Same key as the server, for forging tokens the server should accept
    pub hmac_secret: Secret<String>,
}

impl TestApp {
    pub async fn post_json(
        &self,
        path: &str,
        body: &Value,
    ) -> Response {
        self.api_client
            .post(format!("{}{path}", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    /// `POST /newsletter`
    pub async fn subscribe(
        &self,
        email: &str,
    ) -> Response {
        self.post_json("/newsletter", &serde_json::json!({ "email": email }))
            .await
    }

    /// `POST /messages`
    pub async fn post_message(
        &self,
        body: &Value,
    ) -> Response {
        self.post_json("/messages", body).await
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Response {
        self.post_json(
            "/admin/login",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Request against the API, authenticated as the test admin
    pub fn admin_request(
        &self,
        method: Method,
        path: &str,
    ) -> RequestBuilder {
        self.api_client
            .request(method, format!("{}{path}", self.addr))
            .bearer_auth(&self.admin_token)
    }

    pub async fn admin_get(
        &self,
        path: &str,
    ) -> Response {
        self.admin_request(Method::GET, path)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn admin_post(
        &self,
        path: &str,
        body: &Value,
    ) -> Response {
        self.admin_request(Method::POST, path)
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn admin_patch(
        &self,
        path: &str,
        body: &Value,
    ) -> Response {
        self.admin_request(Method::PATCH, path)
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn admin_delete(
        &self,
        path: &str,
    ) -> Response {
        self.admin_request(Method::DELETE, path)
            .send()
            .await
            .expect("execute request")
    }

    /// Subscribe through the admin API (no welcome email), returning the new
    /// subscriber's id
    pub async fn create_subscriber(
        &self,
        email: &str,
        status: &str,
    ) -> String {
        let body: Value = self
            .admin_post(
                "/admin/subscribers",
                &serde_json::json!({ "email": email, "status": status }),
            )
            .await
            .error_for_status()
            .unwrap()
            .json()
            .await
            .unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    /// A token signed with the server's key, expiring `ttl` from now (negative
    /// for an already expired one)
    pub fn forge_token(
        &self,
        ttl: chrono::Duration,
    ) -> String {
        TokenIssuer::new(self.hmac_secret.clone(), ttl).issue(Uuid::new_v4())
    }

    /// Delivery runs in the background, so poll the email server until at least
    /// `n` requests have arrived (or give up after a few seconds)
    pub async fn wait_for_emails(
        &self,
        n: usize,
    ) -> Vec<Request> {
        for _ in 0..100 {
            let received = self.email_server.received_requests().await.unwrap();
            if received.len() >= n {
                return received;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.email_server.received_requests().await.unwrap()
    }
}

/// `To` and `Subject` of a request sent to the email API
pub fn email_fields(request: &Request) -> (String, String) {
    let body: Value = serde_json::from_slice(&request.body).unwrap();
    (
        body["To"].as_str().unwrap().to_string(),
        body["Subject"].as_str().unwrap().to_string(),
    )
}

/// Error code of a JSON error response, e.g. `VALIDATION_ERROR`
pub async fn error_code(resp: Response) -> String {
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    body["error"].as_str().unwrap().to_string()
}

/// Create an empty database with a randomised name, so that every test gets
/// its own. Tables are created when the app migrates it on startup.
async fn configure_database(cfg: &DatabaseSettings) {
    let mut conn = PgConnection::connect_with(&cfg.connection_without_db())
        .await
        .expect("postgres must be running");
    conn.execute(format!(r#"CREATE DATABASE "{}";"#, cfg.database_name).as_str())
        .await
        .expect("Failed to create database");
}

/// Spawn the app on a random port, with an in-memory store and a mock email
/// API, and log in as the bootstrap admin.
pub async fn spawn_app() -> TestApp { spawn_app_with(StoreBackend::Memory).await }

/// Same as `spawn_app`, but backed by a fresh Postgres database
pub async fn spawn_pg_app() -> TestApp { spawn_app_with(StoreBackend::Postgres).await }

async fn spawn_app_with(store: StoreBackend) -> TestApp {
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;

    let cfg = {
        let mut cfg = get_configuration().expect("Failed to read configuration");
        // port 0 lets the OS pick a free port; see `Application::get_port`
        cfg.application.port = 0;
        cfg.application.store = store;
        cfg.database.database_name = Uuid::new_v4().to_string();
        cfg.email_client.base_url = email_server.uri();
        cfg.email_client.timeout_milliseconds = 500;
        cfg.delivery.max_attempts = 2;
        cfg.delivery.retry_backoff_milliseconds = 1;
        cfg.admin.email = "admin@example.com".to_string();
        cfg.admin.password = Secret::new("correct-horse-battery-staple".to_string());
        cfg
    };
    if cfg.application.store == StoreBackend::Postgres {
        configure_database(&cfg.database).await;
    }

    let app = Application::build(cfg.clone())
        .await
        .expect("Failed to build application");
    let port = app.get_port();
    tokio::spawn(app.run_until_stopped());

    let mut test_app = TestApp {
        addr: format!("http://127.0.0.1:{port}"),
        email_server,
        api_client: reqwest::Client::new(),
        admin: TestAdmin {
            email: "admin@example.com".to_string(),
            password: "correct-horse-battery-staple".to_string(),
        },
        admin_token: String::new(),
        hmac_secret: cfg.application.hmac_secret,
    };

    let login: Value = test_app
        .login(&test_app.admin.email, &test_app.admin.password)
        .await
        .error_for_status()
        .expect("Failed to log in as the bootstrap admin")
        .json()
        .await
        .unwrap();
    test_app.admin_token = login["token"].as_str().unwrap().to_string();

    test_app
}
