//! Sends notifications through the Graph `sendMail` endpoint.

use super::graph::GraphSession;
use crate::notify::{Notification, Notifier};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct GraphMailNotifier {
    session: GraphSession,
    from: String,
}

impl GraphMailNotifier {
    pub fn new(session: GraphSession, from: impl Into<String>) -> Self {
        Self {
            session,
            from: from.into(),
        }
    }
}

#[async_trait]
impl Notifier for GraphMailNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        if self.from.is_empty() {
            anyhow::bail!("No sender mailbox configured");
        }
        let path = format!("/users/{}/sendMail", urlencoding::encode(&self.from));
        self.session
            .post_json(&path, &message_body(notification))
            .await
            .with_context(|| format!("sending mail to {}", notification.to))?;
        tracing::info!("[MAIL] ✓ Email sent to {}", notification.to);
        Ok(())
    }
}

pub fn message_body(notification: &Notification) -> Value {
    json!({
        "message": {
            "subject": notification.subject,
            "body": {
                "contentType": "Text",
                "content": notification.body
            },
            "toRecipients": [
                { "emailAddress": { "address": notification.to } }
            ]
        },
        "saveToSentItems": "true"
    })
}
