use std::collections::{HashMap, HashSet, VecDeque};

use primed_core::{AppError, AppResult};
use primed_domain::{Account, AccountId, ManagedGroup, ManagedGroupId, User, UserId};

use crate::{AccessControlDirectory, GovernanceRepository};

/// Returns a group together with every group that contains it, directly or
/// through nesting.
pub(super) async fn group_and_ancestors(
    directory: &dyn AccessControlDirectory,
    group_id: ManagedGroupId,
) -> AppResult<HashSet<ManagedGroupId>> {
    let mut seen = HashSet::from([group_id]);
    let mut queue = VecDeque::from([group_id]);

    while let Some(current) = queue.pop_front() {
        for parent in directory.list_parent_groups(current).await? {
            if seen.insert(parent.id()) {
                queue.push_back(parent.id());
            }
        }
    }

    Ok(seen)
}

/// Returns every account in a group, directly or through nested groups.
pub(super) async fn transitive_member_accounts(
    directory: &dyn AccessControlDirectory,
    group_id: ManagedGroupId,
) -> AppResult<HashMap<AccountId, Account>> {
    let mut accounts = HashMap::new();
    let mut seen = HashSet::from([group_id]);
    let mut queue = VecDeque::from([group_id]);

    while let Some(current) = queue.pop_front() {
        for account in directory.list_member_accounts(current).await? {
            accounts.entry(account.id()).or_insert(account);
        }

        for child in directory.list_member_groups(current).await? {
            if seen.insert(child.id()) {
                queue.push_back(child.id());
            }
        }
    }

    Ok(accounts)
}

pub(super) async fn require_group(
    repository: &dyn GovernanceRepository,
    group_id: ManagedGroupId,
) -> AppResult<ManagedGroup> {
    repository
        .find_group(group_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("managed group '{group_id}' does not exist")))
}

pub(super) async fn require_user(
    repository: &dyn GovernanceRepository,
    user_id: UserId,
) -> AppResult<User> {
    repository
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))
}

/// Returns the user an account is linked to, if any.
pub(super) async fn linked_user(
    repository: &dyn GovernanceRepository,
    account: &Account,
) -> AppResult<Option<User>> {
    match account.user_id() {
        Some(user_id) => require_user(repository, user_id).await.map(Some),
        None => Ok(None),
    }
}
