use anyhow::Context;
use chrono::DateTime;
use chrono::Utc;
use secrecy::ExposeSecret;
use secrecy::Secret;
use sqlx::PgPool;
use uuid::Uuid;

use super::Store;
use super::StoreError;
use crate::authentication::Admin;
use crate::domain::ContactMessage;
use crate::domain::EmailAddress;
use crate::domain::MessageStatus;
use crate::domain::Newsletter;
use crate::domain::PersonName;
use crate::domain::RecipientsFilter;
use crate::domain::Subscriber;
use crate::domain::SubscriberStatus;

/// Postgres-backed store. Schema lives in `migrations/`; run them with
/// `PgStore::migrate` before serving requests.
///
/// Queries are checked at runtime (`sqlx::query_as`, not `query_as!`), so the
/// crate builds without a live database or a `.sqlx` directory.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn migrate(&self) -> Result<(), anyhow::Error> {
        // `migrate!` path defaults to "./migrations", where . is project root
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")
    }
}

// rows are read as plain strings and re-parsed: although values were validated
// on the way in, we cannot assume they are (still) valid when retrieved

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: Uuid,
    email: String,
    status: String,
    subscribed_at: DateTime<Utc>,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = StoreError;
    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: EmailAddress::parse(row.email).context("Corrupt subscriber email")?,
            status: SubscriberStatus::parse(&row.status).context("Corrupt subscriber status")?,
            subscribed_at: row.subscribed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    subject: String,
    message: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for ContactMessage {
    type Error = StoreError;
    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            first_name: PersonName::parse("first_name", row.first_name)
                .context("Corrupt message first_name")?,
            last_name: PersonName::parse("last_name", row.last_name)
                .context("Corrupt message last_name")?,
            email: EmailAddress::parse(row.email).context("Corrupt message email")?,
            subject: row.subject,
            message: row.message,
            status: MessageStatus::parse(&row.status).context("Corrupt message status")?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct NewsletterRow {
    id: Uuid,
    topic: String,
    body: String,
    recipients: String,
    sent_at: DateTime<Utc>,
    sent_count: i64,
}

impl TryFrom<NewsletterRow> for Newsletter {
    type Error = StoreError;
    fn try_from(row: NewsletterRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            topic: row.topic,
            body: row.body,
            recipients: RecipientsFilter::parse(&row.recipients)
                .context("Corrupt newsletter recipients filter")?,
            sent_at: row.sent_at,
            sent_count: row.sent_count,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: Uuid,
    email: String,
    password_hash: String,
    joined_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for Admin {
    type Error = StoreError;
    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: EmailAddress::parse(row.email).context("Corrupt admin email")?,
            password_hash: Secret::new(row.password_hash),
            joined_at: row.joined_at,
        })
    }
}

/// Unique violations become `StoreError::UniqueViolation`, everything else is
/// unexpected
fn insert_error(
    e: sqlx::Error,
    what: String,
) -> StoreError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            StoreError::UniqueViolation(what)
        }
        e => StoreError::Unexpected(anyhow::Error::new(e).context("Failed to insert row")),
    }
}

fn query_error(e: sqlx::Error) -> StoreError {
    StoreError::Unexpected(anyhow::Error::new(e).context("Failed to execute query"))
}

impl Store for PgStore {
    #[tracing::instrument(name = "INSERTing subscriber into db", skip_all)]
    async fn insert_subscriber(
        &self,
        subscriber: &Subscriber,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO subscribers (id, email, status, subscribed_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(subscriber.id)
        .bind(subscriber.email.as_ref())
        .bind(subscriber.status.as_str())
        .bind(subscriber.subscribed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, format!("Subscriber {}", subscriber.email)))?;
        Ok(())
    }

    async fn get_subscriber(
        &self,
        id: Uuid,
    ) -> Result<Option<Subscriber>, StoreError> {
        sqlx::query_as::<_, SubscriberRow>(
            "SELECT id, email, status, subscribed_at FROM subscribers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .map(Subscriber::try_from)
        .transpose()
    }

    async fn find_subscriber_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Subscriber>, StoreError> {
        sqlx::query_as::<_, SubscriberRow>(
            "SELECT id, email, status, subscribed_at FROM subscribers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .map(Subscriber::try_from)
        .transpose()
    }

    async fn list_subscribers(
        &self,
        status: Option<SubscriberStatus>,
    ) -> Result<Vec<Subscriber>, StoreError> {
        sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, status, subscribed_at
            FROM subscribers
            WHERE $1::TEXT IS NULL OR status = $1
            ORDER BY subscribed_at
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?
        .into_iter()
        .map(Subscriber::try_from)
        .collect()
    }

    #[tracing::instrument(name = "UPDATEing subscriber status", skip(self))]
    async fn update_subscriber_status(
        &self,
        id: Uuid,
        status: SubscriberStatus,
    ) -> Result<Option<Subscriber>, StoreError> {
        sqlx::query_as::<_, SubscriberRow>(
            r#"
            UPDATE subscribers SET status = $1
            WHERE id = $2
            RETURNING id, email, status, subscribed_at
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .map(Subscriber::try_from)
        .transpose()
    }

    #[tracing::instrument(name = "DELETEing subscriber", skip(self))]
    async fn delete_subscriber(
        &self,
        id: Uuid,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM subscribers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(name = "INSERTing contact message into db", skip_all)]
    async fn insert_message(
        &self,
        message: &ContactMessage,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO contact_messages
                (id, first_name, last_name, email, subject, message, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(message.id)
        .bind(message.first_name.as_ref())
        .bind(message.last_name.as_ref())
        .bind(message.email.as_ref())
        .bind(&message.subject)
        .bind(&message.message)
        .bind(message.status.as_str())
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, format!("Message {}", message.id)))?;
        Ok(())
    }

    async fn get_message(
        &self,
        id: Uuid,
    ) -> Result<Option<ContactMessage>, StoreError> {
        sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, first_name, last_name, email, subject, message, status, created_at
            FROM contact_messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .map(ContactMessage::try_from)
        .transpose()
    }

    async fn list_messages(
        &self,
        status: Option<MessageStatus>,
    ) -> Result<Vec<ContactMessage>, StoreError> {
        sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, first_name, last_name, email, subject, message, status, created_at
            FROM contact_messages
            WHERE $1::TEXT IS NULL OR status = $1
            ORDER BY created_at
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?
        .into_iter()
        .map(ContactMessage::try_from)
        .collect()
    }

    #[tracing::instrument(name = "UPDATEing message status", skip(self))]
    async fn update_message_status(
        &self,
        id: Uuid,
        status: MessageStatus,
    ) -> Result<Option<ContactMessage>, StoreError> {
        sqlx::query_as::<_, MessageRow>(
            r#"
            UPDATE contact_messages SET status = $1
            WHERE id = $2
            RETURNING id, first_name, last_name, email, subject, message, status, created_at
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .map(ContactMessage::try_from)
        .transpose()
    }

    #[tracing::instrument(name = "DELETEing contact message", skip(self))]
    async fn delete_message(
        &self,
        id: Uuid,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(name = "INSERTing newsletter into db", skip_all)]
    async fn insert_newsletter(
        &self,
        newsletter: &Newsletter,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO newsletters (id, topic, body, recipients, sent_at, sent_count)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(newsletter.id)
        .bind(&newsletter.topic)
        .bind(&newsletter.body)
        .bind(newsletter.recipients.as_str())
        .bind(newsletter.sent_at)
        .bind(newsletter.sent_count)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, format!("Newsletter {}", newsletter.id)))?;
        Ok(())
    }

    async fn list_newsletters(&self) -> Result<Vec<Newsletter>, StoreError> {
        sqlx::query_as::<_, NewsletterRow>(
            r#"
            SELECT id, topic, body, recipients, sent_at, sent_count
            FROM newsletters
            ORDER BY sent_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?
        .into_iter()
        .map(Newsletter::try_from)
        .collect()
    }

    async fn insert_admin(
        &self,
        admin: &Admin,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO admins (id, email, password_hash, joined_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(admin.id)
        .bind(admin.email.as_ref())
        .bind(admin.password_hash.expose_secret())
        .bind(admin.joined_at)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, format!("Admin {}", admin.email)))?;
        Ok(())
    }

    async fn find_admin_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Admin>, StoreError> {
        sqlx::query_as::<_, AdminRow>(
            "SELECT id, email, password_hash, joined_at FROM admins WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .map(Admin::try_from)
        .transpose()
    }
}
