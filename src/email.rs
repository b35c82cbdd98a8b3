//! Outbound transactional email: one HTTP POST per send, no retries.
//! Every attempt, successful or not, is recorded in `email_logs`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AppConfig, db::DbPool, error::AppResult};

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Escape user-supplied text for inclusion in an email HTML body.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Clone)]
pub struct Mailer {
    client: Client,
    endpoint: Option<String>,
    api_key: Option<String>,
}

impl Mailer {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.email_endpoint.clone(),
            api_key: config.email_api_key.clone(),
        }
    }

    /// Mailer with no configured endpoint; sends are skipped with a debug log.
    pub fn disabled() -> Self {
        Self {
            client: Client::new(),
            endpoint: None,
            api_key: None,
        }
    }

    /// Single delivery attempt. Returns the provider's opaque id, or `None`
    /// when the mailer is disabled.
    pub async fn send(
        &self,
        pool: &DbPool,
        to: &str,
        subject: &str,
        html: &str,
    ) -> AppResult<Option<String>> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            tracing::debug!(to, subject, "email endpoint not configured, skipping send");
            return Ok(None);
        };

        let mut request = self
            .client
            .post(endpoint)
            .json(&SendEmailBody { to, subject, html });
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let outcome = async {
            let response = request.send().await?.error_for_status()?;
            let body: SendEmailResponse = response.json().await?;
            Ok::<_, reqwest::Error>(body.id)
        }
        .await;

        match outcome {
            Ok(id) => {
                self.log(pool, to, subject, Some(&id), None).await;
                tracing::info!(to, provider_id = %id, "email sent");
                Ok(Some(id))
            }
            Err(err) => {
                self.log(pool, to, subject, None, Some(&err.to_string())).await;
                tracing::warn!(to, error = %err, "email send failed");
                Err(err.into())
            }
        }
    }

    async fn log(
        &self,
        pool: &DbPool,
        to: &str,
        subject: &str,
        provider_id: Option<&str>,
        error: Option<&str>,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO email_logs (id, recipient, subject, provider_id, error)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(to)
        .bind(subject)
        .bind(provider_id)
        .bind(error)
        .execute(pool)
        .await;

        if let Err(err) = result {
            tracing::warn!(error = %err, "email log failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("hi") & 'bye'</script>"#),
            "&lt;script&gt;alert(&quot;hi&quot;) &amp; &#39;bye&#39;&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain text"), "plain text");
    }
}
