//! Read and write ports onto the governance data store and the external
//! access-control system.

mod directory;
mod repository;

pub use directory::{AccessControlDirectory, GroupMember, MembershipChange, MembershipWriter};
pub use repository::GovernanceRepository;
