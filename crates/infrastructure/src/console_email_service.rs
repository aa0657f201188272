//! Console email service for development. Logs audit reports instead of sending them.

use async_trait::async_trait;
use primed_application::EmailService;
use primed_core::AppResult;
use tracing::info;

/// Email service that writes messages to the tracing output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    /// Creates a new console email service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()> {
        info!(
            to,
            subject,
            html_bytes = html_body.map_or(0, str::len),
            "--- EMAIL (console) ---\nTo: {to}\nSubject: {subject}\n\n{text_body}\n--- END EMAIL ---"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use primed_application::EmailService;

    use super::ConsoleEmailService;

    #[tokio::test]
    async fn console_delivery_always_succeeds() {
        let result = ConsoleEmailService::new()
            .send_email(
                "cc@example.org",
                "AccessorAudit - problems found",
                "Running Accessor audit... problems found.",
                Some("<h1>Accessor audit</h1>"),
            )
            .await;

        assert!(result.is_ok());
    }
}
