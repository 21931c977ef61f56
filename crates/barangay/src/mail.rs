//! Outgoing mail.
//!
//! Delivery goes through the [`Mailer`] trait. The built-in [`LogMailer`]
//! writes messages to the log instead of sending them; a real provider
//! plugs in behind the same trait.

use std::sync::Mutex;

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};

/// An outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Something that can deliver an [`Email`].
pub trait Mailer: Send + Sync {
    /// Deliver a message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mail`] if the message could not be handed off.
    fn send(&self, email: &Email) -> Result<()>;
}

/// Writes each message to the log at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &Email) -> Result<()> {
        info!(
            to = %email.to,
            subject = %email.subject,
            "Mail not delivered (log mailer):\n{}",
            email.body
        );
        Ok(())
    }
}

/// Keeps messages in memory.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<Email>>,
}

impl MemoryMailer {
    /// Create an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Email> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// The most recent message to `to`, if any.
    #[must_use]
    pub fn last_to(&self, to: &str) -> Option<Email> {
        self.sent().into_iter().rev().find(|email| email.to == to)
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, email: &Email) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| Error::Mail {
                to: email.to.clone(),
                message: "mailbox lock poisoned".to_string(),
            })?
            .push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str, subject: &str) -> Email {
        Email {
            from: "no-reply@barangay.local".to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: "Hello".to_string(),
        }
    }

    #[test]
    fn test_log_mailer_accepts() {
        assert!(LogMailer.send(&email("a@b.ph", "Hi")).is_ok());
    }

    #[test]
    fn test_memory_mailer_records() {
        let mailer = MemoryMailer::new();
        mailer.send(&email("a@b.ph", "first")).unwrap();
        mailer.send(&email("c@d.ph", "other")).unwrap();
        mailer.send(&email("a@b.ph", "second")).unwrap();

        assert_eq!(mailer.sent().len(), 3);
        assert_eq!(mailer.last_to("a@b.ph").unwrap().subject, "second");
        assert!(mailer.last_to("x@y.ph").is_none());
    }

    #[test]
    fn test_mailer_is_object_safe() {
        let mailer: Box<dyn Mailer> = Box::new(MemoryMailer::new());
        assert!(mailer.send(&email("a@b.ph", "Hi")).is_ok());
    }
}
