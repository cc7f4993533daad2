// admins authenticate once with email/password against the `admins` table and
// get a short-lived signed bearer token back; every `/admin` request carries it

mod bearer;
mod middleware;
mod token;

use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::PasswordHash;
use argon2::PasswordHasher;
use argon2::PasswordVerifier;
use argon2::Version;
pub use bearer::BearerToken;
use chrono::DateTime;
use chrono::Utc;
pub use middleware::reject_unauthenticated;
pub use middleware::AdminId;
use secrecy::ExposeSecret;
use secrecy::Secret;
use tokio::task::JoinHandle;
pub use token::TokenError;
pub use token::TokenIssuer;
use uuid::Uuid;

use crate::domain::EmailAddress;
use crate::store::Store;
use crate::store::StoreError;

/// Stored admin account. `password_hash` is a PHC string, which carries the
/// algorithm, params and salt along with the hash.
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: Uuid,
    pub email: EmailAddress,
    pub password_hash: Secret<String>,
    pub joined_at: DateTime<Utc>,
}

pub struct Credentials {
    pub email: String,
    pub password: Secret<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

/// Wrapper for `spawn_blocking` that keeps the current `tracing` span
pub fn spawn_blocking_with_tracing<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(f))
}

/// Hash with the OWASP-recommended argon2id params; the params end up in the
/// PHC string, so they can change later without breaking stored hashes.
pub fn compute_password_hash(password: Secret<String>) -> Result<Secret<String>, anyhow::Error> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(15000, 2, 1, None).context("Invalid argon2 params")?,
    )
    .hash_password(password.expose_secret().as_bytes(), &salt)
    .context("Failed to hash password")?
    .to_string();
    Ok(Secret::new(hash))
}

/// Verification is CPU-bound and fairly slow (by design); call it via
/// `spawn_blocking_with_tracing`.
#[tracing::instrument(name = "Verifying password hash", skip_all)]
fn verify_password(
    supplied_password: Secret<String>,
    stored_password: Secret<String>,
) -> Result<(), AuthError> {
    let stored_password = PasswordHash::new(stored_password.expose_secret())
        .context("Failed to read stored PHC string")
        .map_err(AuthError::UnexpectedError)?;
    Argon2::default()
        .verify_password(
            supplied_password.expose_secret().as_bytes(),
            &stored_password,
        )
        .context("Invalid password")
        .map_err(AuthError::InvalidCredentials)
}

/// Validate supplied credentials against the stored admin accounts, returning
/// the admin's id on success.
#[tracing::instrument(name = "Validating credentials", skip(creds, store))]
pub async fn validate_credentials<S: Store>(
    creds: Credentials,
    store: &S,
) -> Result<Uuid, AuthError> {
    let stored = store
        .find_admin_by_email(creds.email.trim())
        .await
        .context("Failed to look up admin")?;

    // an unknown email must cost as much as a wrong password, otherwise response
    // times reveal which emails are registered. the fallback is a valid PHC
    // string with the same params as `compute_password_hash`
    let (admin_id, stored_password) = match stored {
        Some(admin) => (Some(admin.id), admin.password_hash),
        None => (
            None,
            Secret::new(
                "$argon2id$v=19$m=15000,t=2,p=1\
                $gZiV/M1gPc22ElAH/Jh1Hw\
                $CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno"
                    .to_string(),
            ),
        ),
    };

    spawn_blocking_with_tracing(move || verify_password(creds.password, stored_password))
        .await
        .context("Failed to spawn blocking task")??;

    admin_id
        .ok_or_else(|| anyhow::anyhow!("Unknown admin email"))
        .map_err(AuthError::InvalidCredentials)
}

/// Make sure the bootstrap admin from configuration exists. An existing account
/// is left untouched (its password is not reset).
#[tracing::instrument(name = "Seeding admin account", skip(creds, store))]
pub async fn seed_admin<S: Store>(
    creds: Credentials,
    store: &S,
) -> Result<(), anyhow::Error> {
    let email = EmailAddress::parse(creds.email).context("Invalid admin email in configuration")?;
    if store.find_admin_by_email(email.as_ref()).await?.is_some() {
        return Ok(());
    }

    let password_hash =
        spawn_blocking_with_tracing(move || compute_password_hash(creds.password))
            .await
            .context("Failed to spawn blocking task")??;

    let admin = Admin {
        id: Uuid::new_v4(),
        email,
        password_hash,
        joined_at: Utc::now(),
    };
    match store.insert_admin(&admin).await {
        // lost a race with another instance seeding the same account
        Ok(()) | Err(StoreError::UniqueViolation(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
