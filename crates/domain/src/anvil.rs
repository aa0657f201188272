//! Projections of the people, accounts, groups and workspaces managed on AnVIL.

use chrono::{DateTime, Utc};
use primed_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::ids::uuid_identifier;

uuid_identifier!(
    /// Unique identifier for a site user (a person who can sign in).
    UserId
);
uuid_identifier!(
    /// Unique identifier for an AnVIL account record.
    AccountId
);
uuid_identifier!(
    /// Unique identifier for an AnVIL managed group record.
    ManagedGroupId
);
uuid_identifier!(
    /// Unique identifier for an AnVIL workspace record.
    WorkspaceId
);

/// Validated, lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Comparison is case-insensitive, so the stored value is lower-cased.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(format!(
                "email address '{value}' must contain '@'"
            )));
        };

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(format!(
                "email address '{value}' is malformed"
            )));
        }

        Ok(Self(trimmed))
    }

    /// Returns the normalized email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether a raw identifier refers to this address.
    #[must_use]
    pub fn matches(&self, raw: &str) -> bool {
        self.0.eq_ignore_ascii_case(raw.trim())
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// A person known to the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: NonEmptyString,
    name: String,
}

impl User {
    /// Creates a user with a validated login identifier.
    pub fn new(id: UserId, username: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            id,
            username: NonEmptyString::new(username)?,
            name: name.into(),
        })
    }

    /// Returns the user identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the login identifier.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// An AnVIL account, optionally linked to the site user who verified it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    email: EmailAddress,
    user_id: Option<UserId>,
}

impl Account {
    /// Creates an account record.
    pub fn new(id: AccountId, email: impl Into<String>, user_id: Option<UserId>) -> AppResult<Self> {
        Ok(Self {
            id,
            email: EmailAddress::new(email)?,
            user_id,
        })
    }

    /// Returns the account identifier.
    #[must_use]
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Returns the account email.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the linked user, if the account has been linked to a person.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }
}

/// An AnVIL managed group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedGroup {
    id: ManagedGroupId,
    name: NonEmptyString,
    email: EmailAddress,
    is_managed_by_app: bool,
}

impl ManagedGroup {
    /// Creates a managed group; the email is derived from the group name.
    pub fn new(id: ManagedGroupId, name: impl Into<String>, is_managed_by_app: bool) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;
        let email = EmailAddress::new(format!("{}@firecloud.org", name.as_str()))?;

        Ok(Self {
            id,
            name,
            email,
            is_managed_by_app,
        })
    }

    /// Returns the group identifier.
    #[must_use]
    pub fn id(&self) -> ManagedGroupId {
        self.id
    }

    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the group email.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns whether this system manages the group's membership.
    ///
    /// Membership of groups managed elsewhere is not mirrored locally.
    #[must_use]
    pub fn is_managed_by_app(&self) -> bool {
        self.is_managed_by_app
    }
}

/// An AnVIL workspace and its authorization domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    id: WorkspaceId,
    billing_project: NonEmptyString,
    name: NonEmptyString,
    created_at: DateTime<Utc>,
    authorization_domains: Vec<ManagedGroupId>,
}

impl Workspace {
    /// Creates a workspace record.
    pub fn new(
        id: WorkspaceId,
        billing_project: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
        authorization_domains: Vec<ManagedGroupId>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            billing_project: NonEmptyString::new(billing_project)?,
            name: NonEmptyString::new(name)?,
            created_at,
            authorization_domains,
        })
    }

    /// Returns the workspace identifier.
    #[must_use]
    pub fn id(&self) -> WorkspaceId {
        self.id
    }

    /// Returns the billing project name.
    #[must_use]
    pub fn billing_project(&self) -> &str {
        self.billing_project.as_str()
    }

    /// Returns the workspace name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns `billing_project/name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.billing_project, self.name)
    }

    /// Returns the record creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the authorization domain groups gating the workspace.
    #[must_use]
    pub fn authorization_domains(&self) -> &[ManagedGroupId] {
        self.authorization_domains.as_slice()
    }
}
