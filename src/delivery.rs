//! Background email delivery. Request handlers hand a `DeliveryJob` to the
//! `Dispatcher` and return immediately; a single `DeliveryWorker` task drains
//! the queue and talks to the email API.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;

use crate::domain::EmailAddress;
use crate::email_client::EmailClient;

/// One email (same subject and body) addressed to any number of recipients.
/// Every recipient gets their own copy.
#[derive(Debug, Clone)]
pub struct DeliveryJob {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub recipients: Vec<EmailAddress>,
}

/// Sending half of the delivery queue. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    sender: UnboundedSender<DeliveryJob>,
}

impl Dispatcher {
    /// Never blocks and never fails; if the worker has stopped, the job is
    /// dropped and logged.
    pub fn dispatch(
        &self,
        job: DeliveryJob,
    ) {
        let recipients = job.recipients.len();
        if let Err(e) = self.sender.send(job) {
            tracing::error!(
                error.message = %e,
                subject = %e.0.subject,
                recipients,
                "Delivery worker is not running, dropping emails"
            );
        }
    }
}

/// Create a connected dispatcher/queue pair. The receiver goes to
/// `DeliveryWorker::new`.
pub fn channel() -> (Dispatcher, UnboundedReceiver<DeliveryJob>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Dispatcher { sender }, receiver)
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts the first try; anything below 1 is treated as 1.
    /// The n-th retry waits `n * backoff`.
    pub fn new(
        max_attempts: u32,
        backoff: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

#[derive(Debug, PartialEq)]
enum DeliveryOutcome {
    Delivered,
    DeadLettered,
}

pub struct DeliveryWorker {
    receiver: UnboundedReceiver<DeliveryJob>,
    email_client: EmailClient,
    policy: RetryPolicy,
}

impl DeliveryWorker {
    pub fn new(
        receiver: UnboundedReceiver<DeliveryJob>,
        email_client: EmailClient,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            receiver,
            email_client,
            policy,
        }
    }

    /// Runs until every `Dispatcher` has been dropped and the queue is empty.
    /// Delivery failures are logged, never returned.
    pub async fn run(mut self) -> Result<(), anyhow::Error> {
        while let Some(job) = self.receiver.recv().await {
            self.deliver(&job).await;
        }
        tracing::info!("Delivery queue closed");
        Ok(())
    }

    #[tracing::instrument(
        name = "Delivering emails",
        skip_all,
        fields(subject = %job.subject, recipients = job.recipients.len())
    )]
    async fn deliver(
        &self,
        job: &DeliveryJob,
    ) {
        let mut dead_lettered = 0;
        for recipient in &job.recipients {
            if self.deliver_one(job, recipient).await == DeliveryOutcome::DeadLettered {
                dead_lettered += 1;
            }
        }
        tracing::info!(dead_lettered, "Finished delivery job");
    }

    #[tracing::instrument(skip_all, fields(recipient = %recipient))]
    async fn deliver_one(
        &self,
        job: &DeliveryJob,
        recipient: &EmailAddress,
    ) -> DeliveryOutcome {
        let mut attempt = 1;
        loop {
            match self
                .email_client
                .send_email(recipient, &job.subject, &job.html_body, &job.text_body)
                .await
            {
                Ok(()) => return DeliveryOutcome::Delivered,
                Err(e) if attempt < self.policy.max_attempts => {
                    tracing::warn!(
                        error.cause_chain = ?e,
                        attempt,
                        "Failed to deliver email, retrying"
                    );
                    tokio::time::sleep(self.policy.backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    // dead letter
                    tracing::error!(
                        error.cause_chain = ?e,
                        error.message = %e,
                        attempts = attempt,
                        subject = %job.subject,
                        "Giving up on email delivery"
                    );
                    return DeliveryOutcome::DeadLettered;
                }
            }
        }
    }
}
