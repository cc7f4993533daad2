pub mod authentication;
pub mod configuration;
pub mod delivery;
pub mod domain;
pub mod email_client;
pub mod lifecycle;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod utils;
