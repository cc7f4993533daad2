//! Everything the API can do to subscribers, contact messages and newsletters.
//! Validation happens here (via the `domain` parsers); persistence is delegated
//! to whichever `Store` the app was built with, and email goes through the
//! `Dispatcher` so that no operation waits on (or fails because of) mail
//! delivery.

use std::fmt::Debug;

use serde::Serialize;
use uuid::Uuid;

use crate::authentication::validate_credentials;
use crate::authentication::AuthError;
use crate::authentication::Credentials;
use crate::delivery::DeliveryJob;
use crate::delivery::Dispatcher;
use crate::domain::validate_length;
use crate::domain::validate_required;
use crate::domain::ContactMessage;
use crate::domain::EmailAddress;
use crate::domain::MessageStatus;
use crate::domain::NewContactMessage;
use crate::domain::NewNewsletter;
use crate::domain::Newsletter;
use crate::domain::RecipientsFilter;
use crate::domain::Subscriber;
use crate::domain::SubscriberStatus;
use crate::domain::ValidationError;
use crate::store::Store;
use crate::store::StoreError;
use crate::utils::error_chain_fmt;

const MAX_TOPIC_LENGTH: usize = 200;

#[derive(thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl Debug for LifecycleError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StoreError> for LifecycleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(what) => Self::Duplicate(format!("{what} already exists")),
            StoreError::Unexpected(e) => Self::Unexpected(e),
        }
    }
}

/// Dashboard numbers. `total_sent` counts newsletters, not individual emails.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_subscribers: usize,
    pub active_subscribers: usize,
    pub total_messages: usize,
    pub unread_messages: usize,
    pub total_sent: usize,
}

pub struct Lifecycle<S> {
    store: S,
    dispatcher: Dispatcher,
}

impl<S: Store> Lifecycle<S> {
    pub fn new(
        store: S,
        dispatcher: Dispatcher,
    ) -> Self {
        Self { store, dispatcher }
    }

    // admins

    /// Check admin credentials against the store, returning the admin's id
    pub async fn authenticate(
        &self,
        creds: Credentials,
    ) -> Result<Uuid, AuthError> {
        validate_credentials(creds, &self.store).await
    }

    // subscribers

    /// Public signup. New subscribers start out active and get a welcome
    /// email.
    #[tracing::instrument(name = "Subscribing", skip(self))]
    pub async fn subscribe(
        &self,
        email: String,
    ) -> Result<Subscriber, LifecycleError> {
        let subscriber = self
            .create_subscriber(email, SubscriberStatus::Active)
            .await?;
        self.dispatcher.dispatch(welcome_email(&subscriber.email));
        Ok(subscriber)
    }

    /// Admin-side creation; no welcome email
    #[tracing::instrument(name = "Adding subscriber", skip(self))]
    pub async fn add_subscriber(
        &self,
        email: String,
        status: Option<SubscriberStatus>,
    ) -> Result<Subscriber, LifecycleError> {
        self.create_subscriber(email, status.unwrap_or(SubscriberStatus::Active))
            .await
    }

    async fn create_subscriber(
        &self,
        email: String,
        status: SubscriberStatus,
    ) -> Result<Subscriber, LifecycleError> {
        let email = EmailAddress::parse(email)?;
        if self
            .store
            .find_subscriber_by_email(email.as_ref())
            .await?
            .is_some()
        {
            return Err(LifecycleError::Duplicate(
                "This email is already subscribed to our newsletter".to_string(),
            ));
        }
        let subscriber = Subscriber::new(email, status);
        // a concurrent signup can still win the race; the store's unique
        // constraint turns that into `Duplicate` as well
        self.store.insert_subscriber(&subscriber).await?;
        tracing::info!(subscriber_id = %subscriber.id, "Added subscriber");
        Ok(subscriber)
    }

    pub async fn get_subscriber(
        &self,
        id: Uuid,
    ) -> Result<Subscriber, LifecycleError> {
        self.store
            .get_subscriber(id)
            .await?
            .ok_or_else(subscriber_not_found)
    }

    pub async fn list_subscribers(
        &self,
        status: Option<SubscriberStatus>,
    ) -> Result<Vec<Subscriber>, LifecycleError> {
        Ok(self.store.list_subscribers(status).await?)
    }

    #[tracing::instrument(name = "Unsubscribing", skip(self))]
    pub async fn unsubscribe(
        &self,
        id: Uuid,
    ) -> Result<(), LifecycleError> {
        self.delete_subscriber(id).await
    }

    #[tracing::instrument(name = "Deleting subscriber", skip(self))]
    pub async fn delete_subscriber(
        &self,
        id: Uuid,
    ) -> Result<(), LifecycleError> {
        match self.store.delete_subscriber(id).await? {
            true => Ok(()),
            false => Err(subscriber_not_found()),
        }
    }

    #[tracing::instrument(name = "Updating subscriber status", skip(self))]
    pub async fn update_subscriber_status(
        &self,
        id: Uuid,
        status: SubscriberStatus,
    ) -> Result<Subscriber, LifecycleError> {
        self.store
            .update_subscriber_status(id, status)
            .await?
            .ok_or_else(subscriber_not_found)
    }

    // contact messages

    #[tracing::instrument(name = "Submitting contact message", skip_all)]
    pub async fn submit_message(
        &self,
        form: NewContactMessage,
    ) -> Result<ContactMessage, LifecycleError> {
        let message = ContactMessage::try_from(form)?;
        self.store.insert_message(&message).await?;
        tracing::info!(message_id = %message.id, "Stored contact message");
        Ok(message)
    }

    pub async fn get_message(
        &self,
        id: Uuid,
    ) -> Result<ContactMessage, LifecycleError> {
        self.store
            .get_message(id)
            .await?
            .ok_or_else(message_not_found)
    }

    /// Every message, or only those with `status`
    pub async fn get_messages(
        &self,
        status: Option<MessageStatus>,
    ) -> Result<Vec<ContactMessage>, LifecycleError> {
        Ok(self.store.list_messages(status).await?)
    }

    #[tracing::instrument(name = "Updating message status", skip(self))]
    pub async fn update_message_status(
        &self,
        id: Uuid,
        status: MessageStatus,
    ) -> Result<ContactMessage, LifecycleError> {
        self.store
            .update_message_status(id, status)
            .await?
            .ok_or_else(message_not_found)
    }

    #[tracing::instrument(name = "Deleting message", skip(self))]
    pub async fn delete_message(
        &self,
        id: Uuid,
    ) -> Result<(), LifecycleError> {
        match self.store.delete_message(id).await? {
            true => Ok(()),
            false => Err(message_not_found()),
        }
    }

    // newsletters

    /// Resolve the recipients, record the send, and queue delivery. The
    /// returned record counts as sent even if delivery later fails.
    #[tracing::instrument(
        name = "Sending newsletter",
        skip_all,
        fields(recipients = ?request.recipients, sent_count = tracing::field::Empty)
    )]
    pub async fn send_newsletter(
        &self,
        request: NewNewsletter,
    ) -> Result<Newsletter, LifecycleError> {
        validate_required(&[
            ("topic", request.topic.as_deref()),
            ("body", request.body.as_deref()),
        ])?;
        let topic = request.topic.unwrap_or_default().trim().to_string();
        let body = request.body.unwrap_or_default();
        validate_length("topic", &topic, MAX_TOPIC_LENGTH)?;

        let filter = match request.recipients.as_deref() {
            Some(filter) => RecipientsFilter::parse(filter)?,
            None => RecipientsFilter::All,
        };
        let recipients = self
            .resolve_recipients(filter, request.custom_recipients)
            .await?;

        let newsletter = Newsletter {
            id: Uuid::new_v4(),
            topic,
            body,
            recipients: filter,
            sent_at: chrono::Utc::now(),
            sent_count: recipients.len() as i64,
        };
        self.store.insert_newsletter(&newsletter).await?;
        tracing::Span::current().record("sent_count", newsletter.sent_count);

        if !recipients.is_empty() {
            self.dispatcher.dispatch(DeliveryJob {
                subject: newsletter.topic.clone(),
                html_body: newsletter.body.clone(),
                text_body: newsletter.body.clone(),
                recipients,
            });
        }
        Ok(newsletter)
    }

    async fn resolve_recipients(
        &self,
        filter: RecipientsFilter,
        custom: Option<Vec<String>>,
    ) -> Result<Vec<EmailAddress>, LifecycleError> {
        let status = match filter {
            RecipientsFilter::All => None,
            RecipientsFilter::Active => Some(SubscriberStatus::Active),
            RecipientsFilter::Custom => {
                let custom = custom.unwrap_or_default();
                if custom.is_empty() {
                    return Err(ValidationError::Invalid(
                        "custom_recipients must list at least one email address".to_string(),
                    )
                    .into());
                }
                return custom
                    .into_iter()
                    .map(|email| EmailAddress::parse(email).map_err(LifecycleError::from))
                    .collect();
            }
        };
        Ok(self
            .store
            .list_subscribers(status)
            .await?
            .into_iter()
            .map(|s| s.email)
            .collect())
    }

    /// Oldest first
    pub async fn list_newsletters(&self) -> Result<Vec<Newsletter>, LifecycleError> {
        Ok(self.store.list_newsletters().await?)
    }

    // stats

    #[tracing::instrument(name = "Computing stats", skip(self))]
    pub async fn compute_stats(&self) -> Result<Stats, LifecycleError> {
        let subscribers = self.store.list_subscribers(None).await?;
        let messages = self.store.list_messages(None).await?;
        let newsletters = self.store.list_newsletters().await?;
        Ok(Stats {
            total_subscribers: subscribers.len(),
            active_subscribers: subscribers.iter().filter(|s| s.is_active()).count(),
            total_messages: messages.len(),
            unread_messages: messages
                .iter()
                .filter(|m| m.status == MessageStatus::Unread)
                .count(),
            total_sent: newsletters.len(),
        })
    }
}

fn subscriber_not_found() -> LifecycleError {
    LifecycleError::NotFound("Subscriber not found".to_string())
}

fn message_not_found() -> LifecycleError { LifecycleError::NotFound("Message not found".to_string()) }

fn welcome_email(email: &EmailAddress) -> DeliveryJob {
    DeliveryJob {
        subject: "Welcome to our newsletter!".to_string(),
        html_body: format!(
            "<h1>Welcome!</h1><p>{email} is now subscribed to our newsletter.</p>"
        ),
        text_body: format!(
            "Welcome {email}! If you can't view HTML emails, please check our platform."
        ),
        recipients: vec![email.clone()],
    }
}
