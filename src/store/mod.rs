//! Record storage. `Lifecycle` only ever talks to the `Store` trait, so the
//! backend can be swapped (or substituted in tests) without touching it.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;
use uuid::Uuid;

use crate::authentication::Admin;
use crate::domain::ContactMessage;
use crate::domain::MessageStatus;
use crate::domain::Newsletter;
use crate::domain::Subscriber;
use crate::domain::SubscriberStatus;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// A unique constraint (e.g. subscriber email) would be broken
    #[error("{0} already exists")]
    UniqueViolation(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

// futures returned by the store are only ever awaited inside request handlers,
// never spawned, so they don't need to be `Send`
#[allow(async_fn_in_trait)]
pub trait Store: Send + Sync + 'static {
    async fn insert_subscriber(
        &self,
        subscriber: &Subscriber,
    ) -> Result<(), StoreError>;

    async fn get_subscriber(
        &self,
        id: Uuid,
    ) -> Result<Option<Subscriber>, StoreError>;

    async fn find_subscriber_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Subscriber>, StoreError>;

    /// Oldest first. `None` returns every subscriber.
    async fn list_subscribers(
        &self,
        status: Option<SubscriberStatus>,
    ) -> Result<Vec<Subscriber>, StoreError>;

    /// Returns the updated record, or `None` if `id` is unknown
    async fn update_subscriber_status(
        &self,
        id: Uuid,
        status: SubscriberStatus,
    ) -> Result<Option<Subscriber>, StoreError>;

    /// Returns `false` if `id` is unknown
    async fn delete_subscriber(
        &self,
        id: Uuid,
    ) -> Result<bool, StoreError>;

    async fn insert_message(
        &self,
        message: &ContactMessage,
    ) -> Result<(), StoreError>;

    async fn get_message(
        &self,
        id: Uuid,
    ) -> Result<Option<ContactMessage>, StoreError>;

    async fn list_messages(
        &self,
        status: Option<MessageStatus>,
    ) -> Result<Vec<ContactMessage>, StoreError>;

    async fn update_message_status(
        &self,
        id: Uuid,
        status: MessageStatus,
    ) -> Result<Option<ContactMessage>, StoreError>;

    async fn delete_message(
        &self,
        id: Uuid,
    ) -> Result<bool, StoreError>;

    async fn insert_newsletter(
        &self,
        newsletter: &Newsletter,
    ) -> Result<(), StoreError>;

    async fn list_newsletters(&self) -> Result<Vec<Newsletter>, StoreError>;

    async fn insert_admin(
        &self,
        admin: &Admin,
    ) -> Result<(), StoreError>;

    async fn find_admin_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Admin>, StoreError>;
}
