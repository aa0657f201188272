use std::path::PathBuf;

use clap::{Parser, Subcommand};
use primed_application::AuditKind;

/// Runs PRIMED access audits and reports what needs attention.
#[derive(Debug, Parser)]
#[command(name = "primed-audit", version)]
pub struct Cli {
    /// Email the report to this address when problems are found.
    #[arg(long, global = true)]
    pub email: Option<String>,

    /// Governance export to audit instead of `PRIMED_DATA_PATH`.
    #[arg(long, global = true, env = "PRIMED_DATA_PATH")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: AuditCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum AuditCommand {
    /// Signed agreement accessors against their access groups.
    Accessors,
    /// Data affiliate uploaders against their upload groups.
    Uploaders,
    /// dbGaP PIs and collaborators against their access groups.
    Collaborators,
    /// dbGaP application access to dbGaP workspaces.
    DbgapAccess,
    /// Collaborative analysis workspace access.
    CollaborativeAnalysis,
    /// Signed agreement access groups against the CDSA group.
    SignedAgreements,
    /// Every audit, one after another.
    All,
}

impl AuditCommand {
    /// Audit kinds the command runs, in order.
    pub fn kinds(self) -> Vec<AuditKind> {
        match self {
            Self::Accessors => vec![AuditKind::Accessors],
            Self::Uploaders => vec![AuditKind::Uploaders],
            Self::Collaborators => vec![AuditKind::Collaborators],
            Self::DbgapAccess => vec![AuditKind::DbGapAccess],
            Self::CollaborativeAnalysis => vec![AuditKind::CollaborativeAnalysis],
            Self::SignedAgreements => vec![AuditKind::SignedAgreements],
            Self::All => AuditKind::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use primed_application::AuditKind;

    use super::{AuditCommand, Cli};

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn email_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "primed-audit",
            "dbgap-access",
            "--email",
            "cc@example.org",
            "--data",
            "/tmp/export.json",
        ]);

        assert!(cli.as_ref().is_ok_and(|cli| cli.command == AuditCommand::DbgapAccess));
        assert!(cli.is_ok_and(|cli| cli.email.as_deref() == Some("cc@example.org")));
    }

    #[test]
    fn all_runs_every_kind_in_order() {
        assert_eq!(AuditCommand::All.kinds(), AuditKind::ALL.to_vec());
        assert_eq!(
            AuditCommand::CollaborativeAnalysis.kinds(),
            [AuditKind::CollaborativeAnalysis]
        );
    }
}
