use chrono::Duration;
use chrono::Utc;
use hmac::Hmac;
use hmac::Mac;
use secrecy::ExposeSecret;
use secrecy::Secret;
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,
    #[error("Invalid token signature")]
    BadSignature,
    #[error("Token has expired")]
    Expired,
}

/// Issues and verifies stateless admin tokens of the form
/// `{admin_id}.{expires_at_unix}.{hex(hmac_sha256(admin_id.expires_at_unix))}`.
///
/// Message authentication (HMAC, RFC 2104) guarantees that neither the id nor
/// the expiry were modified after issue.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Secret<String>,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(
        secret: Secret<String>,
        ttl: Duration,
    ) -> Self {
        Self { secret, ttl }
    }

    /// Lifetime of freshly issued tokens, in seconds
    pub fn ttl_seconds(&self) -> i64 { self.ttl.num_seconds() }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC can take a key of any size")
    }

    pub fn issue(
        &self,
        admin_id: Uuid,
    ) -> String {
        let expires_at = (Utc::now() + self.ttl).timestamp();
        self.sign(admin_id, expires_at)
    }

    fn sign(
        &self,
        admin_id: Uuid,
        expires_at: i64,
    ) -> String {
        let payload = format!("{admin_id}.{expires_at}");
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let tag = hex::encode(mac.finalize().into_bytes());
        format!("{payload}.{tag}")
    }

    /// Returns the admin id the token was issued for
    pub fn verify(
        &self,
        token: &str,
    ) -> Result<Uuid, TokenError> {
        let (payload, tag) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let (admin_id, expires_at) = payload.split_once('.').ok_or(TokenError::Malformed)?;
        let tag = hex::decode(tag).map_err(|_| TokenError::Malformed)?;

        // constant-time comparison
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&tag)
            .map_err(|_| TokenError::BadSignature)?;

        let admin_id = Uuid::parse_str(admin_id).map_err(|_| TokenError::Malformed)?;
        let expires_at: i64 = expires_at.parse().map_err(|_| TokenError::Malformed)?;
        if expires_at <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(admin_id)
    }
}
