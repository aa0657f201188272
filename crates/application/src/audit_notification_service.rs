//! Text summaries and email reports for completed audits.

use std::sync::Arc;

use async_trait::async_trait;
use primed_core::AppResult;
use primed_domain::{AuditOverview, AuditTable};
use tracing::info;

/// Port for sending email.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends a plain-text email with an optional HTML alternative.
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()>;
}

/// Renders audit summaries and mails reports for audits with problems.
#[derive(Clone)]
pub struct AuditNotificationService {
    email_service: Arc<dyn EmailService>,
    site_domain: String,
}

impl AuditNotificationService {
    /// Creates the service. `site_domain` prefixes resolution links.
    #[must_use]
    pub fn new(email_service: Arc<dyn EmailService>, site_domain: impl Into<String>) -> Self {
        Self {
            email_service,
            site_domain: site_domain.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Returns the console summary of a completed audit.
    #[must_use]
    pub fn summary(display_name: &str, overview: &AuditOverview) -> String {
        let status = if overview.ok {
            "ok!"
        } else {
            "problems found."
        };

        format!(
            "Running {display_name} audit... {status}\n* Verified: {}\n* Needs action: {}\n* Errors: {}\n",
            overview.counts.verified, overview.counts.needs_action, overview.counts.errors
        )
    }

    /// Returns the email subject for an audit with problems.
    #[must_use]
    pub fn email_subject(overview: &AuditOverview) -> String {
        format!("{} - problems found", overview.audit)
    }

    /// Returns the absolute URL of a site-relative resolution path.
    #[must_use]
    pub fn resolve_url(&self, path: &str) -> String {
        format!("https://{}{}", self.site_domain, path)
    }

    /// Renders the HTML report listing actionable results.
    #[must_use]
    pub fn render_html(&self, display_name: &str, overview: &AuditOverview) -> String {
        let mut html = format!(
            "<h1>{} audit</h1>\n<p>Verified: {}. Needs action: {}. Errors: {}.</p>\n",
            escape_html(display_name),
            overview.counts.verified,
            overview.counts.needs_action,
            overview.counts.errors
        );

        html.push_str(&self.render_table("Needs action", &overview.needs_action));
        html.push_str(&self.render_table("Errors", &overview.errors));
        html
    }

    fn render_table(&self, heading: &str, table: &AuditTable) -> String {
        if table.is_empty() {
            return format!("<h2>{heading}</h2>\n<p>None.</p>\n");
        }

        let mut html = format!("<h2>{heading}</h2>\n<table>\n<tr>");
        for column in &table.columns {
            html.push_str(&format!("<th>{}</th>", escape_html(column)));
        }
        html.push_str("<th>has_access</th><th>note</th><th>action</th></tr>\n");

        for row in &table.rows {
            html.push_str("<tr>");
            for cell in &row.cells {
                html.push_str(&format!("<td>{}</td>", escape_html(&cell.value)));
            }

            let action = match (&row.action, &row.resolve_path) {
                (Some(action), Some(path)) => format!(
                    "<a href=\"{}\">{}</a>",
                    escape_html(&self.resolve_url(path)),
                    escape_html(action)
                ),
                (Some(action), None) => escape_html(action),
                (None, _) => String::new(),
            };
            html.push_str(&format!(
                "<td>{}</td><td>{}</td><td>{action}</td></tr>\n",
                row.has_access,
                escape_html(&row.note)
            ));
        }

        html.push_str("</table>\n");
        html
    }

    /// Emails the report when the audit found problems and a recipient is
    /// given. Returns whether an email was sent.
    pub async fn notify(
        &self,
        display_name: &str,
        overview: &AuditOverview,
        recipient: Option<&str>,
    ) -> AppResult<bool> {
        let Some(recipient) = recipient.filter(|_| !overview.ok) else {
            return Ok(false);
        };

        let subject = Self::email_subject(overview);
        let text_body = Self::summary(display_name, overview);
        let html_body = self.render_html(display_name, overview);
        self.email_service
            .send_email(recipient, &subject, &text_body, Some(&html_body))
            .await?;

        info!(audit = %overview.audit, to = recipient, "audit report emailed");
        Ok(true)
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}
