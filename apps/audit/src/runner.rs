use std::path::Path;
use std::sync::Arc;

use primed_application::{
    AccessAuditService, AuditContext, AuditKind, AuditNotificationService,
};
use primed_core::{AppError, AppResult};
use primed_infrastructure::InMemoryGovernanceStore;

use crate::audit_config::AuditConfig;

/// Runs audit kinds, prints their summaries and mails problem reports.
pub struct AuditRunner {
    audits: AccessAuditService,
    notifications: AuditNotificationService,
}

impl AuditRunner {
    pub fn new(audits: AccessAuditService, notifications: AuditNotificationService) -> Self {
        Self {
            audits,
            notifications,
        }
    }

    pub async fn from_config(config: &AuditConfig, data_path: Option<&Path>) -> AppResult<Self> {
        let data_path = data_path.ok_or_else(|| {
            AppError::Validation("PRIMED_DATA_PATH or --data is required".to_owned())
        })?;
        let store = Arc::new(InMemoryGovernanceStore::load(data_path).await?);

        Ok(Self::new(
            AccessAuditService::new(AuditContext::new(
                store.clone(),
                store,
                config.audit_settings.clone(),
            )),
            AuditNotificationService::new(config.email_service(), config.site_domain.clone()),
        ))
    }

    /// Runs one audit kind, returning its console summary and whether it was clean.
    pub async fn run(&self, kind: AuditKind, email: Option<&str>) -> AppResult<(String, bool)> {
        let overview = self.audits.run_overview(kind, None, None).await?;
        let summary = AuditNotificationService::summary(kind.display_name(), &overview);
        self.notifications
            .notify(kind.display_name(), &overview, email)
            .await?;

        Ok((summary, overview.ok))
    }
}
