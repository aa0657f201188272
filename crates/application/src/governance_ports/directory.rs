use async_trait::async_trait;
use primed_core::AppResult;
use primed_domain::{Account, AccountId, ManagedGroup, ManagedGroupId};

/// Live view of group memberships in the access-control system.
///
/// Every query reports direct memberships only.
#[async_trait]
pub trait AccessControlDirectory: Send + Sync {
    /// Lists accounts that are direct members of a group.
    async fn list_member_accounts(&self, group_id: ManagedGroupId) -> AppResult<Vec<Account>>;

    /// Lists groups that are direct members of a group.
    async fn list_member_groups(&self, group_id: ManagedGroupId) -> AppResult<Vec<ManagedGroup>>;

    /// Lists groups that directly contain a group.
    async fn list_parent_groups(&self, group_id: ManagedGroupId) -> AppResult<Vec<ManagedGroup>>;

    /// Returns whether an account is a direct member of a group.
    async fn is_account_member(
        &self,
        group_id: ManagedGroupId,
        account_id: AccountId,
    ) -> AppResult<bool>;

    /// Returns whether `child_id` is a direct member of `parent_id`.
    async fn is_group_member(
        &self,
        parent_id: ManagedGroupId,
        child_id: ManagedGroupId,
    ) -> AppResult<bool>;
}

/// A direct member of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupMember {
    /// An individual account.
    Account(AccountId),
    /// A nested group.
    Group(ManagedGroupId),
}

/// One membership edit applied while resolving an audit result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MembershipChange {
    /// Adds the member to the group.
    Add {
        /// Group gaining the member.
        group_id: ManagedGroupId,
        /// Member being added.
        member: GroupMember,
    },
    /// Removes the member from the group.
    Remove {
        /// Group losing the member.
        group_id: ManagedGroupId,
        /// Member being removed.
        member: GroupMember,
    },
}

/// Port applying membership changes to the access-control system.
///
/// Adding an existing member or removing an absent one is a no-op.
#[async_trait]
pub trait MembershipWriter: Send + Sync {
    /// Applies one membership change.
    async fn apply(&self, change: MembershipChange) -> AppResult<()>;
}
