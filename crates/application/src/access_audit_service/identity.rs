use primed_core::{AppError, AppResult};
use primed_domain::{Account, ManagedGroup, User};

use crate::GovernanceRepository;

/// What a raw member identifier refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedMember {
    /// A site user, matched by login identifier.
    Person(User),
    /// An account, matched by email.
    Account(Account),
    /// A managed group, matched by email.
    Group(ManagedGroup),
    /// Nothing matched.
    NotFound,
}

/// Resolves a raw identifier: login identifier, then account email, then
/// group email. Matching is case-insensitive.
pub async fn resolve_member(
    repository: &dyn GovernanceRepository,
    identifier: &str,
) -> AppResult<ResolvedMember> {
    let identifier = identifier.trim();

    if let Some(user) = repository.find_user_by_username(identifier).await? {
        return Ok(ResolvedMember::Person(user));
    }

    if let Some(account) = repository.find_account_by_email(identifier).await? {
        return Ok(ResolvedMember::Account(account));
    }

    if let Some(group) = repository.find_group_by_email(identifier).await? {
        return Ok(ResolvedMember::Group(group));
    }

    Ok(ResolvedMember::NotFound)
}

pub(super) fn unresolvable(identifier: &str) -> AppError {
    AppError::NotFound(format!(
        "no user, account or group matches '{}'",
        identifier.trim()
    ))
}
