pub mod audits;
pub mod health;
