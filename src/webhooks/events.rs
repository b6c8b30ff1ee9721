//! GitHub webhook event types.
//!
//! Every delivery kind the bot understands is listed once in the table at the
//! bottom of this module. The table generates:
//!
//! - [`EventKind`], the closed set of wire discriminators (`X-GitHub-Event`);
//! - one payload struct per kind (`PushEvent`, `IssuesEvent`, ...);
//! - [`Event`], the tagged union handed to the dispatcher;
//! - the [`TypedEvent`] impls that tie each struct to its kind at compile time.
//!
//! Payload structs decode the envelope objects common to most deliveries
//! (`action`, `sender`, `organization`, `repository`, `installation`) plus a
//! few well-known fields per kind. Everything else in the body is preserved
//! untouched in `extra`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{
    Actor, CheckRun, CheckSuite, Comment, Installation, Issue, Organization, PullRequest,
    PushCommit, Repository,
};

/// Returned when a discriminator is not one of the known event kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event kind: {0}")]
pub struct UnknownEventKind(pub String);

/// Which envelope fields a kind contributes to its trigger log line.
///
/// Some kinds (e.g. `star`, `ping`) are logged with their kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarriedFields {
    pub sender: bool,
    pub org: bool,
    pub repo: bool,
}

/// Borrowed view of the envelope objects shared by all payload structs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Envelope<'a> {
    pub action: Option<&'a str>,
    pub sender: Option<&'a Actor>,
    pub organization: Option<&'a Organization>,
    pub repository: Option<&'a Repository>,
    pub installation: Option<&'a Installation>,
}

impl<'a> Envelope<'a> {
    pub fn sender_login(&self) -> Option<&'a str> {
        self.sender.and_then(|s| s.login.as_deref())
    }

    pub fn org_login(&self) -> Option<&'a str> {
        self.organization.and_then(|o| o.login.as_deref())
    }

    pub fn repo_name(&self) -> Option<&'a str> {
        self.repository.and_then(|r| r.name.as_deref())
    }
}

/// A payload struct bound to exactly one [`EventKind`].
///
/// This is what lets `register::<PushEvent, _, _>(...)` resolve the registry
/// slot from the hook's argument type.
pub trait TypedEvent: DeserializeOwned + Send + Sync + 'static {
    const KIND: EventKind;

    /// Borrows the payload out of an [`Event`] if the variant matches.
    fn from_event(event: &Event) -> Option<&Arc<Self>>;

    /// Wraps the payload in its [`Event`] variant.
    fn into_event(self: Arc<Self>) -> Event;

    fn envelope(&self) -> Envelope<'_>;
}

/// A delivery whose discriminator is outside [`EventKind`].
///
/// Only produced by a lenient decoder; the dispatcher rejects it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnknownEvent {
    /// The `X-GitHub-Event` value as received.
    #[serde(skip)]
    pub discriminator: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub sender: Option<Actor>,
    #[serde(default)]
    pub organization: Option<Organization>,
    #[serde(default)]
    pub repository: Option<Repository>,
    #[serde(default)]
    pub installation: Option<Installation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UnknownEvent {
    pub fn envelope(&self) -> Envelope<'_> {
        Envelope {
            action: self.action.as_deref(),
            sender: self.sender.as_ref(),
            organization: self.organization.as_ref(),
            repository: self.repository.as_ref(),
            installation: self.installation.as_ref(),
        }
    }
}

macro_rules! event_kinds {
    (
        $(
            $(#[$doc:meta])*
            $variant:ident($event:ident) = $wire:literal,
                carries(sender: $sender:expr, org: $org:expr, repo: $repo:expr)
                $({ $( $(#[$fattr:meta])* $field:ident : $fty:ty ),* $(,)? })?;
        )*
    ) => {
        /// The closed set of webhook event kinds, keyed by wire discriminator.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum EventKind {
            $(
                #[serde(rename = $wire)]
                $variant,
            )*
        }

        impl EventKind {
            /// Every kind, in table order.
            pub const ALL: &'static [EventKind] = &[$(EventKind::$variant,)*];

            /// The `X-GitHub-Event` value for this kind.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(EventKind::$variant => $wire,)*
                }
            }

            pub fn carried_fields(self) -> CarriedFields {
                match self {
                    $(EventKind::$variant => CarriedFields { sender: $sender, org: $org, repo: $repo },)*
                }
            }
        }

        impl FromStr for EventKind {
            type Err = UnknownEventKind;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(EventKind::$variant),)*
                    other => Err(UnknownEventKind(other.to_string())),
                }
            }
        }

        $(
            $(#[$doc])*
            #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
            pub struct $event {
                #[serde(default)]
                pub action: Option<String>,
                #[serde(default)]
                pub sender: Option<Actor>,
                #[serde(default)]
                pub organization: Option<Organization>,
                #[serde(default)]
                pub repository: Option<Repository>,
                #[serde(default)]
                pub installation: Option<Installation>,
                $($(
                    $(#[$fattr])*
                    #[serde(default)]
                    pub $field: $fty,
                )*)?
                /// Every payload field not decoded above.
                #[serde(flatten)]
                pub extra: Map<String, Value>,
            }

            impl TypedEvent for $event {
                const KIND: EventKind = EventKind::$variant;

                fn from_event(event: &Event) -> Option<&Arc<Self>> {
                    match event {
                        Event::$variant(e) => Some(e),
                        _ => None,
                    }
                }

                fn into_event(self: Arc<Self>) -> Event {
                    Event::$variant(self)
                }

                fn envelope(&self) -> Envelope<'_> {
                    Envelope {
                        action: self.action.as_deref(),
                        sender: self.sender.as_ref(),
                        organization: self.organization.as_ref(),
                        repository: self.repository.as_ref(),
                        installation: self.installation.as_ref(),
                    }
                }
            }
        )*

        /// A decoded webhook delivery.
        ///
        /// Payloads sit behind `Arc` so the dispatcher can hand the same event
        /// to every hook without copying it.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Event {
            $($variant(Arc<$event>),)*
            Unknown(Arc<UnknownEvent>),
        }

        impl Event {
            /// The kind of this event, or `None` for [`Event::Unknown`].
            pub fn kind(&self) -> Option<EventKind> {
                match self {
                    $(Event::$variant(_) => Some(EventKind::$variant),)*
                    Event::Unknown(_) => None,
                }
            }

            pub fn envelope(&self) -> Envelope<'_> {
                match self {
                    $(Event::$variant(e) => e.envelope(),)*
                    Event::Unknown(e) => e.envelope(),
                }
            }

            /// Decodes `body` as the payload struct for `kind`.
            pub fn from_slice(kind: EventKind, body: &[u8]) -> Result<Event, serde_json::Error> {
                match kind {
                    $(EventKind::$variant => {
                        serde_json::from_slice::<$event>(body).map(|e| Event::$variant(Arc::new(e)))
                    })*
                }
            }
        }
    };
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    /// The discriminator this event was decoded from.
    pub fn discriminator(&self) -> &str {
        match self {
            Event::Unknown(e) => e.discriminator.as_str(),
            other => other.kind().map(EventKind::as_str).unwrap_or_default(),
        }
    }
}

event_kinds! {
    /// A check run was created, completed, rerequested, or had an action requested.
    CheckRun(CheckRunEvent) = "check_run",
        carries(sender: true, org: true, repo: true) { check_run: Option<CheckRun> };
    CheckSuite(CheckSuiteEvent) = "check_suite",
        carries(sender: true, org: true, repo: true) { check_suite: Option<CheckSuite> };
    CommitComment(CommitCommentEvent) = "commit_comment",
        carries(sender: true, org: false, repo: true) { comment: Option<Comment> };
    /// A branch or tag was created.
    Create(CreateEvent) = "create",
        carries(sender: true, org: false, repo: true) {
            #[serde(rename = "ref")]
            ref_name: Option<String>,
            ref_type: Option<String>,
        };
    /// A branch or tag was deleted.
    Delete(DeleteEvent) = "delete",
        carries(sender: true, org: false, repo: true) {
            #[serde(rename = "ref")]
            ref_name: Option<String>,
            ref_type: Option<String>,
        };
    DeployKey(DeployKeyEvent) = "deploy_key",
        carries(sender: false, org: false, repo: false);
    Deployment(DeploymentEvent) = "deployment",
        carries(sender: true, org: false, repo: true);
    DeploymentStatus(DeploymentStatusEvent) = "deployment_status",
        carries(sender: true, org: false, repo: true);
    Fork(ForkEvent) = "fork",
        carries(sender: true, org: false, repo: true);
    GitHubAppAuthorization(GitHubAppAuthorizationEvent) = "github_app_authorization",
        carries(sender: true, org: false, repo: false);
    /// A wiki page was created or updated.
    Gollum(GollumEvent) = "gollum",
        carries(sender: true, org: false, repo: true);
    Installation(InstallationEvent) = "installation",
        carries(sender: true, org: false, repo: false);
    InstallationRepositories(InstallationRepositoriesEvent) = "installation_repositories",
        carries(sender: true, org: false, repo: false);
    /// A comment on an issue or on a pull request's conversation tab.
    IssueComment(IssueCommentEvent) = "issue_comment",
        carries(sender: true, org: false, repo: true) {
            issue: Option<Issue>,
            comment: Option<Comment>,
        };
    Issues(IssuesEvent) = "issues",
        carries(sender: true, org: false, repo: true) { issue: Option<Issue> };
    Label(LabelEvent) = "label",
        carries(sender: false, org: true, repo: true);
    MarketplacePurchase(MarketplacePurchaseEvent) = "marketplace_purchase",
        carries(sender: true, org: false, repo: false);
    Member(MemberEvent) = "member",
        carries(sender: true, org: false, repo: true);
    Membership(MembershipEvent) = "membership",
        carries(sender: true, org: true, repo: false);
    /// The webhook itself was deleted.
    Meta(MetaEvent) = "meta",
        carries(sender: false, org: false, repo: false) { hook_id: Option<u64> };
    Milestone(MilestoneEvent) = "milestone",
        carries(sender: true, org: true, repo: true);
    OrgBlock(OrgBlockEvent) = "org_block",
        carries(sender: true, org: false, repo: false);
    Organization(OrganizationEvent) = "organization",
        carries(sender: true, org: false, repo: false);
    PageBuild(PageBuildEvent) = "page_build",
        carries(sender: true, org: false, repo: true);
    /// Sent once when a webhook is first configured.
    Ping(PingEvent) = "ping",
        carries(sender: false, org: false, repo: false) {
            zen: Option<String>,
            hook_id: Option<u64>,
        };
    Project(ProjectEvent) = "project",
        carries(sender: true, org: true, repo: true);
    ProjectCard(ProjectCardEvent) = "project_card",
        carries(sender: true, org: true, repo: true);
    ProjectColumn(ProjectColumnEvent) = "project_column",
        carries(sender: true, org: true, repo: true);
    /// A private repository was made public.
    Public(PublicEvent) = "public",
        carries(sender: true, org: false, repo: true);
    PullRequest(PullRequestEvent) = "pull_request",
        carries(sender: true, org: false, repo: true) {
            number: Option<u64>,
            pull_request: Option<PullRequest>,
        };
    PullRequestReview(PullRequestReviewEvent) = "pull_request_review",
        carries(sender: true, org: false, repo: true) { pull_request: Option<PullRequest> };
    PullRequestReviewComment(PullRequestReviewCommentEvent) = "pull_request_review_comment",
        carries(sender: true, org: false, repo: true) {
            pull_request: Option<PullRequest>,
            comment: Option<Comment>,
        };
    /// One or more commits were pushed to a branch or tag.
    Push(PushEvent) = "push",
        carries(sender: true, org: false, repo: true) {
            #[serde(rename = "ref")]
            ref_name: Option<String>,
            before: Option<String>,
            after: Option<String>,
            forced: Option<bool>,
            commits: Vec<PushCommit>,
        };
    Release(ReleaseEvent) = "release",
        carries(sender: true, org: false, repo: true);
    Repository(RepositoryEvent) = "repository",
        carries(sender: true, org: true, repo: true);
    RepositoryVulnerabilityAlert(RepositoryVulnerabilityAlertEvent) = "repository_vulnerability_alert",
        carries(sender: false, org: false, repo: false);
    Star(StarEvent) = "star",
        carries(sender: false, org: false, repo: false) { starred_at: Option<DateTime<Utc>> };
    /// A commit status changed (legacy Status API).
    Status(StatusEvent) = "status",
        carries(sender: true, org: false, repo: true) {
            sha: Option<String>,
            state: Option<String>,
            context: Option<String>,
            target_url: Option<String>,
        };
    Team(TeamEvent) = "team",
        carries(sender: true, org: true, repo: true);
    TeamAdd(TeamAddEvent) = "team_add",
        carries(sender: true, org: true, repo: true);
    /// Someone starred a repository (GitHub's historical name for stars).
    Watch(WatchEvent) = "watch",
        carries(sender: true, org: false, repo: true);
}
