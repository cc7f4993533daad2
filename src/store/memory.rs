use std::sync::Mutex;
use std::sync::MutexGuard;

use uuid::Uuid;

use super::Store;
use super::StoreError;
use crate::authentication::Admin;
use crate::domain::ContactMessage;
use crate::domain::MessageStatus;
use crate::domain::Newsletter;
use crate::domain::Subscriber;
use crate::domain::SubscriberStatus;

#[derive(Default)]
struct Records {
    subscribers: Vec<Subscriber>,
    messages: Vec<ContactMessage>,
    newsletters: Vec<Newsletter>,
    admins: Vec<Admin>,
}

/// Insertion-ordered collections behind a single lock. Nothing survives a
/// restart.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<Records>,
}

impl InMemoryStore {
    pub fn new() -> Self { Self::default() }

    // no await points are held across the guard, so a std mutex is enough
    fn records(&self) -> Result<MutexGuard<'_, Records>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unexpected(anyhow::anyhow!("in-memory store lock was poisoned")))
    }
}

impl Store for InMemoryStore {
    async fn insert_subscriber(
        &self,
        subscriber: &Subscriber,
    ) -> Result<(), StoreError> {
        let mut records = self.records()?;
        if records
            .subscribers
            .iter()
            .any(|s| s.email == subscriber.email)
        {
            return Err(StoreError::UniqueViolation(format!(
                "Subscriber {}",
                subscriber.email
            )));
        }
        records.subscribers.push(subscriber.clone());
        Ok(())
    }

    async fn get_subscriber(
        &self,
        id: Uuid,
    ) -> Result<Option<Subscriber>, StoreError> {
        Ok(self
            .records()?
            .subscribers
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_subscriber_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Subscriber>, StoreError> {
        Ok(self
            .records()?
            .subscribers
            .iter()
            .find(|s| s.email.as_ref() == email)
            .cloned())
    }

    async fn list_subscribers(
        &self,
        status: Option<SubscriberStatus>,
    ) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self
            .records()?
            .subscribers
            .iter()
            .filter(|s| status.map_or(true, |status| s.status == status))
            .cloned()
            .collect())
    }

    async fn update_subscriber_status(
        &self,
        id: Uuid,
        status: SubscriberStatus,
    ) -> Result<Option<Subscriber>, StoreError> {
        let mut records = self.records()?;
        Ok(records
            .subscribers
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| {
                s.status = status;
                s.clone()
            }))
    }

    async fn delete_subscriber(
        &self,
        id: Uuid,
    ) -> Result<bool, StoreError> {
        let mut records = self.records()?;
        let before = records.subscribers.len();
        records.subscribers.retain(|s| s.id != id);
        Ok(records.subscribers.len() < before)
    }

    async fn insert_message(
        &self,
        message: &ContactMessage,
    ) -> Result<(), StoreError> {
        self.records()?.messages.push(message.clone());
        Ok(())
    }

    async fn get_message(
        &self,
        id: Uuid,
    ) -> Result<Option<ContactMessage>, StoreError> {
        Ok(self
            .records()?
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn list_messages(
        &self,
        status: Option<MessageStatus>,
    ) -> Result<Vec<ContactMessage>, StoreError> {
        Ok(self
            .records()?
            .messages
            .iter()
            .filter(|m| status.map_or(true, |status| m.status == status))
            .cloned()
            .collect())
    }

    async fn update_message_status(
        &self,
        id: Uuid,
        status: MessageStatus,
    ) -> Result<Option<ContactMessage>, StoreError> {
        let mut records = self.records()?;
        Ok(records.messages.iter_mut().find(|m| m.id == id).map(|m| {
            m.status = status;
            m.clone()
        }))
    }

    async fn delete_message(
        &self,
        id: Uuid,
    ) -> Result<bool, StoreError> {
        let mut records = self.records()?;
        let before = records.messages.len();
        records.messages.retain(|m| m.id != id);
        Ok(records.messages.len() < before)
    }

    async fn insert_newsletter(
        &self,
        newsletter: &Newsletter,
    ) -> Result<(), StoreError> {
        self.records()?.newsletters.push(newsletter.clone());
        Ok(())
    }

    async fn list_newsletters(&self) -> Result<Vec<Newsletter>, StoreError> {
        Ok(self.records()?.newsletters.clone())
    }

    async fn insert_admin(
        &self,
        admin: &Admin,
    ) -> Result<(), StoreError> {
        let mut records = self.records()?;
        if records.admins.iter().any(|a| a.email == admin.email) {
            return Err(StoreError::UniqueViolation(format!("Admin {}", admin.email)));
        }
        records.admins.push(admin.clone());
        Ok(())
    }

    async fn find_admin_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Admin>, StoreError> {
        Ok(self
            .records()?
            .admins
            .iter()
            .find(|a| a.email.as_ref() == email)
            .cloned())
    }
}
