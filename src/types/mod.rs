//! Identifier newtypes and payload objects shared across event kinds.

pub mod ids;
pub mod models;

pub use ids::{DeliveryId, InstallationId};
pub use models::{
    Actor, CheckRun, CheckSuite, Comment, GitRef, Installation, Issue, Organization, PullRequest,
    PushCommit, Repository,
};
