//! HTTP mail-provider transport.
//!
//! Talks to a Resend-style JSON API: one POST per message, bearer credential
//! from configuration. Constructed once at startup and handed to whatever
//! needs to send mail; there is no transport singleton.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::application::notify::{MailError, Mailer, OutboundMail};
use crate::config::MailSettings;

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

pub struct HttpMailer {
    http: Client,
    endpoint: String,
    token: String,
    from: String,
}

impl HttpMailer {
    pub fn new(settings: &MailSettings) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            token: settings.token.clone(),
            from: settings.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: OutboundMail) -> Result<(), MailError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&SendRequest {
                from: &self.from,
                to: &mail.to,
                subject: &mail.subject,
                text: &mail.body,
            })
            .send()
            .await
            .map_err(|err| MailError::Transport(err.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            Err(MailError::Rejected(format!("{status}: {detail}")))
        }
    }
}
