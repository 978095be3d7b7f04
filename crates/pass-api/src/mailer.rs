//! Pass email dispatch

use async_trait::async_trait;
use pass_common::{Error, Result};
use pass_renderer::text::escape;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// An outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl PassEmail {
    /// Email linking an attendee to their hosted pass. A caller-supplied
    /// `html` body replaces the generated one.
    pub fn for_pass(to: &str, name: &str, pass_id: &str, pass_url: &str, html: Option<String>) -> Self {
        let html = html
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| pass_body(name, pass_id, pass_url));

        Self {
            to: to.trim().to_string(),
            subject: format!("Your pass {} is ready", pass_id),
            html,
        }
    }
}

fn pass_body(name: &str, pass_id: &str, pass_url: &str) -> String {
    let url = escape(pass_url);
    format!(
        concat!(
            "<p>Hi {name},</p>",
            "<p>Your digital pass <strong>{id}</strong> is ready. ",
            "Open it on your phone and show it at the entrance.</p>",
            "<p><a href=\"{url}\">View your pass</a></p>",
            "<p style=\"color:#888\">{url}</p>"
        ),
        name = escape(name.trim()),
        id = escape(pass_id),
        url = url,
    )
}

/// Email delivery backend
#[async_trait]
pub trait Mailer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, email: &PassEmail) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Client for a hosted email API accepting `{from, to, subject, html}`
/// with bearer authentication.
pub struct HttpMailer {
    api_url: String,
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl HttpMailer {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build email client: {}", e))?;

        Ok(Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            from: from.into(),
            client,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, email: &PassEmail) -> Result<()> {
        debug!("Sending email to {} via {}", email.to, self.api_url);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&SendRequest {
                from: &self.from,
                to: [&email.to],
                subject: &email.subject,
                html: &email.html,
            })
            .send()
            .await
            .map_err(|e| Error::upstream("email", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(
                "email",
                format!("{}: {}", status, body.trim()),
            ));
        }

        info!("Email sent to {}", email.to);
        Ok(())
    }
}

/// Logs emails instead of sending them; used when no API key is configured.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, email: &PassEmail) -> Result<()> {
        info!(
            "Email delivery disabled; would send \"{}\" to {}",
            email.subject, email.to
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_body_links_pass_and_escapes_name() {
        let email = PassEmail::for_pass(
            " ada@example.com ",
            "Ada <Countess>",
            "KAIROS-1234",
            "https://pass.example.org/pass/KAIROS-1234",
            None,
        );

        assert_eq!(email.to, "ada@example.com");
        assert_eq!(email.subject, "Your pass KAIROS-1234 is ready");
        assert!(email.html.contains("Ada &lt;Countess&gt;"));
        assert!(email
            .html
            .contains("href=\"https://pass.example.org/pass/KAIROS-1234\""));
    }

    #[test]
    fn test_supplied_body_wins_unless_blank() {
        let custom = PassEmail::for_pass(
            "ada@example.com",
            "Ada",
            "KAIROS-1234",
            "https://x/pass/KAIROS-1234",
            Some("<p>custom</p>".to_string()),
        );
        assert_eq!(custom.html, "<p>custom</p>");

        let blank = PassEmail::for_pass(
            "ada@example.com",
            "Ada",
            "KAIROS-1234",
            "https://x/pass/KAIROS-1234",
            Some("  ".to_string()),
        );
        assert!(blank.html.contains("View your pass"));
    }

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(SendRequest {
            from: "Pass <pass@example.org>",
            to: ["ada@example.com"],
            subject: "s",
            html: "h",
        })
        .unwrap();
        assert_eq!(json["to"][0], "ada@example.com");
        assert_eq!(json["from"], "Pass <pass@example.org>");
    }

    #[tokio::test]
    async fn test_http_mailer_reports_connection_failure_as_upstream() {
        // Nothing listens on port 9 of localhost
        let mailer = HttpMailer::new(
            "http://127.0.0.1:9/emails",
            "key",
            "pass@example.org",
            Duration::from_secs(2),
        )
        .unwrap();
        let email = PassEmail::for_pass("ada@example.com", "Ada", "KAIROS-1234", "u", None);

        let err = mailer.send(&email).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { service: "email", .. }));
    }
}
