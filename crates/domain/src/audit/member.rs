use primed_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::anvil::{Account, EmailAddress, ManagedGroup, User};

/// A group member as seen by the access-control system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AuditMember {
    /// An individual account.
    Account(Account),
    /// A nested managed group.
    Group(ManagedGroup),
}

impl AuditMember {
    /// Returns the member email used by the access-control system.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        match self {
            Self::Account(account) => account.email(),
            Self::Group(group) => group.email(),
        }
    }
}

/// The person and/or member a result refers to.
///
/// At least one side is always present. An account member and a user must be
/// the same person, and a group member never carries a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberReference {
    user: Option<User>,
    member: Option<AuditMember>,
}

impl MemberReference {
    /// Creates a validated reference.
    pub fn new(user: Option<User>, member: Option<AuditMember>) -> AppResult<Self> {
        validate_reference(user.as_ref(), member.as_ref())?;
        Ok(Self { user, member })
    }

    /// Creates a reference to a user without an account.
    #[must_use]
    pub fn for_user(user: User) -> Self {
        Self {
            user: Some(user),
            member: None,
        }
    }

    /// Creates a reference to a group member.
    #[must_use]
    pub fn for_group(group: ManagedGroup) -> Self {
        Self {
            user: None,
            member: Some(AuditMember::Group(group)),
        }
    }

    /// Returns the referenced user.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Returns the referenced member.
    #[must_use]
    pub fn member(&self) -> Option<&AuditMember> {
        self.member.as_ref()
    }

    /// Returns a key unique to the person or member within one audited entity.
    #[must_use]
    pub fn key(&self) -> String {
        match (&self.member, &self.user) {
            (Some(AuditMember::Account(account)), _) => format!("account:{}", account.id()),
            (Some(AuditMember::Group(group)), _) => format!("group:{}", group.id()),
            (None, Some(user)) => format!("user:{}", user.id()),
            (None, None) => String::new(),
        }
    }

    /// Returns the user's login identifier, or an empty string.
    #[must_use]
    pub fn username_cell(&self) -> String {
        self.user
            .as_ref()
            .map(|user| user.username().to_owned())
            .unwrap_or_default()
    }

    /// Returns the member email, or an empty string.
    #[must_use]
    pub fn member_cell(&self) -> String {
        self.member
            .as_ref()
            .map(|member| member.email().to_string())
            .unwrap_or_default()
    }
}

fn validate_reference(user: Option<&User>, member: Option<&AuditMember>) -> AppResult<()> {
    match (user, member) {
        (None, None) => Err(AppError::Validation(
            "audit result must reference a user or a member".to_owned(),
        )),
        (Some(user), Some(AuditMember::Account(account))) if account.user_id() != Some(user.id()) => {
            Err(AppError::Validation(format!(
                "account '{}' is not linked to user '{}'",
                account.email(),
                user.username()
            )))
        }
        (Some(user), Some(AuditMember::Group(group))) => Err(AppError::Validation(format!(
            "group '{}' cannot be reported together with user '{}'",
            group.name(),
            user.username()
        ))),
        _ => Ok(()),
    }
}
