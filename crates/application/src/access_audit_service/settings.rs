use chrono::Duration;
use primed_core::{AppError, AppResult};

/// Default name of the coordinating center administrators group.
pub const DEFAULT_CC_ADMINS_GROUP: &str = "PRIMED_CC_ADMINS";
/// Default name of the platform administrators group.
pub const DEFAULT_PLATFORM_ADMINS_GROUP: &str = "anvil-admins";
/// Default name of the group collecting CDSA access groups.
pub const DEFAULT_CDSA_GROUP: &str = "PRIMED_CDSA";
/// Default number of days after which a data access snapshot is stale.
pub const DEFAULT_SNAPSHOT_MAX_AGE_DAYS: i64 = 30;

/// Settings shared by every audit policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSettings {
    cc_admins_group: String,
    platform_admins_group: String,
    cdsa_group: String,
    snapshot_max_age_days: i64,
}

impl AuditSettings {
    /// Creates validated settings.
    pub fn new(
        cc_admins_group: impl Into<String>,
        platform_admins_group: impl Into<String>,
        cdsa_group: impl Into<String>,
        snapshot_max_age_days: i64,
    ) -> AppResult<Self> {
        let cc_admins_group = non_empty("cc admins group", cc_admins_group.into())?;
        let platform_admins_group =
            non_empty("platform admins group", platform_admins_group.into())?;
        let cdsa_group = non_empty("cdsa group", cdsa_group.into())?;

        if snapshot_max_age_days <= 0 {
            return Err(AppError::Validation(format!(
                "snapshot max age must be greater than zero days, got {snapshot_max_age_days}"
            )));
        }

        Ok(Self {
            cc_admins_group,
            platform_admins_group,
            cdsa_group,
            snapshot_max_age_days,
        })
    }

    /// Loads settings from `AUDIT_*` environment variables, falling back to defaults.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads settings from a variable lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let snapshot_max_age_days = match lookup("AUDIT_SNAPSHOT_MAX_AGE_DAYS") {
            Some(value) => value.trim().parse::<i64>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid AUDIT_SNAPSHOT_MAX_AGE_DAYS value '{value}': {error}"
                ))
            })?,
            None => DEFAULT_SNAPSHOT_MAX_AGE_DAYS,
        };

        Self::new(
            lookup("AUDIT_CC_ADMINS_GROUP").unwrap_or_else(|| DEFAULT_CC_ADMINS_GROUP.to_owned()),
            lookup("AUDIT_PLATFORM_ADMINS_GROUP")
                .unwrap_or_else(|| DEFAULT_PLATFORM_ADMINS_GROUP.to_owned()),
            lookup("AUDIT_CDSA_GROUP").unwrap_or_else(|| DEFAULT_CDSA_GROUP.to_owned()),
            snapshot_max_age_days,
        )
    }

    /// Returns the coordinating center administrators group name.
    #[must_use]
    pub fn cc_admins_group(&self) -> &str {
        self.cc_admins_group.as_str()
    }

    /// Returns the platform administrators group name.
    #[must_use]
    pub fn platform_admins_group(&self) -> &str {
        self.platform_admins_group.as_str()
    }

    /// Returns the CDSA group name.
    #[must_use]
    pub fn cdsa_group(&self) -> &str {
        self.cdsa_group.as_str()
    }

    /// Returns the administrative group names, in a fixed order.
    #[must_use]
    pub fn administrative_groups(&self) -> [&str; 2] {
        [self.cc_admins_group(), self.platform_admins_group()]
    }

    /// Returns whether a group is administrative and may appear anywhere.
    #[must_use]
    pub fn is_administrative_group(&self, group_name: &str) -> bool {
        self.administrative_groups()
            .iter()
            .any(|name| name.eq_ignore_ascii_case(group_name))
    }

    /// Returns the age after which a data access snapshot is stale.
    #[must_use]
    pub fn snapshot_max_age(&self) -> Duration {
        Duration::days(self.snapshot_max_age_days)
    }
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            cc_admins_group: DEFAULT_CC_ADMINS_GROUP.to_owned(),
            platform_admins_group: DEFAULT_PLATFORM_ADMINS_GROUP.to_owned(),
            cdsa_group: DEFAULT_CDSA_GROUP.to_owned(),
            snapshot_max_age_days: DEFAULT_SNAPSHOT_MAX_AGE_DAYS,
        }
    }
}

fn non_empty(label: &str, value: String) -> AppResult<String> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{label} must not be empty")));
    }

    Ok(value.trim().to_owned())
}
