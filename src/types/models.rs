//! Payload objects shared by many webhook event kinds.
//!
//! These mirror the subset of GitHub's JSON objects that hooks commonly need.
//! Fields GitHub documents as always present are still `Option` where real
//! deliveries have been seen without them; everything else a payload carries
//! stays in the owning event's `extra` map.

use serde::{Deserialize, Serialize};

use super::ids::InstallationId;

/// A user or bot account (the `sender`, `user`, `owner` objects).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
    /// `User`, `Bot` or `Organization`.
    #[serde(default, rename = "type")]
    pub account_type: Option<String>,
}

impl Actor {
    /// Returns true if the account is a GitHub App bot.
    pub fn is_bot(&self) -> bool {
        self.account_type.as_deref() == Some("Bot")
    }
}

/// The `organization` object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Organization {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
    /// Display name. Webhook payloads usually leave this out.
    #[serde(default)]
    pub name: Option<String>,
}

/// The `repository` object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub owner: Option<Actor>,
    #[serde(default)]
    pub private: Option<bool>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// The `installation` object attached to deliveries for GitHub Apps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
    pub id: InstallationId,
}

/// An issue (also used for pull requests in `issue_comment` deliveries).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub user: Option<Actor>,
    /// Present only when the issue is a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// An issue, commit, or review comment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<Actor>,
}

/// A branch reference on a pull request (`head` / `base`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
}

/// A pull request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub draft: Option<bool>,
    #[serde(default)]
    pub merged: Option<bool>,
    #[serde(default)]
    pub head: Option<GitRef>,
    #[serde(default)]
    pub base: Option<GitRef>,
    #[serde(default)]
    pub user: Option<Actor>,
}

/// One commit in a push delivery.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PushCommit {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub distinct: Option<bool>,
}

/// A check run (Checks API).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckRun {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub head_sha: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
}

/// A check suite (Checks API).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckSuite {
    pub id: u64,
    #[serde(default)]
    pub head_branch: Option<String>,
    #[serde(default)]
    pub head_sha: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_tolerates_missing_fields() {
        let repo: Repository = serde_json::from_str("{}").unwrap();
        assert_eq!(repo, Repository::default());
    }

    #[test]
    fn actor_detects_bots() {
        let actor: Actor =
            serde_json::from_str(r#"{"login": "ci[bot]", "id": 7, "type": "Bot"}"#).unwrap();
        assert!(actor.is_bot());
        assert_eq!(actor.login.as_deref(), Some("ci[bot]"));
    }

    #[test]
    fn issue_comment_on_pull_request_is_detected() {
        let issue: Issue =
            serde_json::from_str(r#"{"number": 3, "pull_request": {"url": "x"}}"#).unwrap();
        assert!(issue.is_pull_request());

        let plain: Issue = serde_json::from_str(r#"{"number": 4}"#).unwrap();
        assert!(!plain.is_pull_request());
    }

    #[test]
    fn git_ref_uses_wire_name_for_ref() {
        let r: GitRef = serde_json::from_str(r#"{"ref": "main", "sha": "abc"}"#).unwrap();
        assert_eq!(r.ref_name, "main");
    }
}
