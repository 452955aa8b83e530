//! Contact submissions: persist first, then notify.
//!
//! The stored message is the operation's contract. Both notification emails
//! (acknowledgement to the visitor, alert to the administrator) run as
//! detached tasks whose failures are logged and never reach the caller.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::application::events::{AppEvent, EventBus};
use crate::application::notify::{MailError, Mailer, OutboundMail};
use crate::application::repos::{ContactRepo, RepoError};
use crate::domain::entities::ContactMessageRecord;
use crate::domain::error::{DomainError, require_nonempty};

#[derive(Debug, Error)]
pub enum ContactError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
}

pub struct ContactService {
    repo: Arc<dyn ContactRepo>,
    mailer: Arc<dyn Mailer>,
    admin_recipient: Option<String>,
    events: EventBus,
}

impl ContactService {
    pub fn new(
        repo: Arc<dyn ContactRepo>,
        mailer: Arc<dyn Mailer>,
        admin_recipient: Option<String>,
        events: EventBus,
    ) -> Self {
        Self {
            repo,
            mailer,
            admin_recipient,
            events,
        }
    }

    pub async fn submit(&self, input: ContactInput) -> Result<ContactMessageRecord, ContactError> {
        require_nonempty("name", &input.name)?;
        require_nonempty("email", &input.email)?;
        require_nonempty("subject", &input.subject)?;
        require_nonempty("message", &input.body)?;
        if !input.email.contains('@') {
            return Err(DomainError::invalid("email", "must be an email address").into());
        }

        let record = self
            .repo
            .insert_message(input.name, input.email, input.subject, input.body)
            .await?;

        // Durably persisted; everything below is best-effort side channel.
        self.events.publish(AppEvent::ContactReceived {
            id: record.id,
            name: record.name.clone(),
            subject: record.subject.clone(),
        });

        self.spawn_send(
            OutboundMail {
                to: record.email.clone(),
                subject: "Thanks for getting in touch".to_string(),
                body: format!(
                    "Hi {},\n\nYour message \"{}\" arrived safely. \
                     You'll hear back soon.\n",
                    record.name, record.subject
                ),
            },
            "acknowledgement",
        );

        if let Some(admin) = self.admin_recipient.clone() {
            self.spawn_send(
                OutboundMail {
                    to: admin,
                    subject: format!("New contact message: {}", record.subject),
                    body: format!(
                        "From: {} <{}>\n\n{}\n",
                        record.name, record.email, record.body
                    ),
                },
                "admin alert",
            );
        }

        Ok(record)
    }

    fn spawn_send(&self, mail: OutboundMail, label: &'static str) {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            let to = mail.to.clone();
            match mailer.send(mail).await {
                Ok(()) => info!(%to, label, "notification mail sent"),
                Err(err) => warn!(%to, label, error = %err, "notification mail failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::OffsetDateTime;
    use uuid::Uuid;

    struct MemoryContact {
        stored: Mutex<Vec<ContactMessageRecord>>,
    }

    #[async_trait]
    impl ContactRepo for MemoryContact {
        async fn insert_message(
            &self,
            name: String,
            email: String,
            subject: String,
            body: String,
        ) -> Result<ContactMessageRecord, RepoError> {
            let record = ContactMessageRecord {
                id: Uuid::new_v4(),
                name,
                email,
                subject,
                body,
                created_at: OffsetDateTime::now_utc(),
            };
            self.stored.lock().unwrap().push(record.clone());
            Ok(record)
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _mail: OutboundMail) -> Result<(), MailError> {
            Err(MailError::Transport("smtp relay down".into()))
        }
    }

    #[tokio::test]
    async fn message_persists_even_when_every_mail_fails() {
        let repo = Arc::new(MemoryContact {
            stored: Mutex::new(Vec::new()),
        });
        let service = ContactService::new(
            repo.clone(),
            Arc::new(FailingMailer),
            Some("admin@example.com".into()),
            EventBus::new(),
        );

        let record = service
            .submit(ContactInput {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                subject: "Hello".into(),
                body: "Interested in a collaboration.".into(),
            })
            .await
            .expect("submission must succeed");

        assert_eq!(repo.stored.lock().unwrap().len(), 1);
        assert_eq!(record.email, "ada@example.com");
    }

    #[tokio::test]
    async fn blank_fields_are_rejected_before_any_write() {
        let repo = Arc::new(MemoryContact {
            stored: Mutex::new(Vec::new()),
        });
        let service = ContactService::new(
            repo.clone(),
            Arc::new(FailingMailer),
            None,
            EventBus::new(),
        );

        let err = service
            .submit(ContactInput {
                name: "".into(),
                email: "ada@example.com".into(),
                subject: "Hello".into(),
                body: "hi".into(),
            })
            .await
            .expect_err("must fail validation");

        assert!(matches!(err, ContactError::Domain(_)));
        assert!(repo.stored.lock().unwrap().is_empty());
    }
}
