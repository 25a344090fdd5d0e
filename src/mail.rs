//! Outgoing email. Only a logging sender exists; there is no SMTP delivery.

use async_trait::async_trait;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_reset_password(&self, email_to: &str, username: &str, token: &str);
    async fn send_welcome(&self, email_to: &str, username: &str);
    async fn send_alert_notification(&self, email_to: &str, username: &str, alert_title: &str, alert_description: &str);
}

/// Writes every message to the log instead of sending it.
#[derive(Clone, Debug)]
pub struct LogMailer {
    pub reset_base_url: String,
}

impl Default for LogMailer {
    fn default() -> Self {
        LogMailer {
            reset_base_url: "http://localhost:3000/reset-password".into(),
        }
    }
}

impl LogMailer {
    pub fn reset_link(&self, token: &str) -> String {
        format!("{}?token={}", self.reset_base_url, token)
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_reset_password(&self, email_to: &str, username: &str, token: &str) {
        tracing::info!(
            to = %email_to,
            user = %username,
            link = %self.reset_link(token),
            "password reset email"
        );
    }

    async fn send_welcome(&self, email_to: &str, username: &str) {
        tracing::info!(to = %email_to, user = %username, "welcome email");
    }

    async fn send_alert_notification(&self, email_to: &str, username: &str, alert_title: &str, alert_description: &str) {
        tracing::info!(
            to = %email_to,
            user = %username,
            title = %alert_title,
            description = %alert_description,
            "alert notification email"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_link_carries_token() {
        let mailer = LogMailer::default();
        assert_eq!(mailer.reset_link("abc"), "http://localhost:3000/reset-password?token=abc");
    }
}
