/// Link intents and the facts the resolvers read from the page
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// What the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Open,
    Compare,
}

/// Target of a deep link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkIntent {
    OpenRepo,
    OpenBranch(String),
    OpenCommit(String),
    /// `base` is absent when the page only names one side of the comparison
    Compare { base: Option<String>, target: String },
}

/// Attached when the intent was derived from a pull/merge request page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestContext {
    pub number: String,
    pub source_url: String,
    /// Remote of the repository the pull request was opened against, set when the
    /// head branch lives in a different repository (fork)
    pub cross_repo_url: Option<String>,
}

/// Fully resolved link: intent, pull request linkage and the remote to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub intent: LinkIntent,
    pub pull_request: Option<PullRequestContext>,
    pub remote_url: String,
}

impl ResolvedLink {
    pub fn new(intent: LinkIntent, remote_url: String) -> ResolvedLink {
        ResolvedLink {
            intent,
            pull_request: None,
            remote_url,
        }
    }

    pub fn open_repo(remote_url: String) -> ResolvedLink {
        ResolvedLink::new(LinkIntent::OpenRepo, remote_url)
    }
}

/// A branch as displayed on a pull request page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    pub owner: String,
    /// Azure DevOps project; other hosts leave it empty
    pub project: Option<String>,
    pub repo: String,
    pub branch: String,
}

impl BranchRef {
    pub fn new(owner: &str, repo: &str, branch: &str) -> BranchRef {
        BranchRef {
            owner: owner.to_string(),
            project: None,
            repo: repo.to_string(),
            branch: branch.to_string(),
        }
    }

    /// `owner/repo:branch`, the cross-repository form the redirect URI understands
    pub fn qualified(&self) -> String {
        match &self.project {
            Some(project) => format!("{}/{}/{}:{}", self.owner, project, self.repo, self.branch),
            None => format!("{}/{}:{}", self.owner, self.repo, self.branch),
        }
    }

    pub fn same_repo(&self, owner: &str, repo: &str) -> bool {
        self.owner == owner && self.repo == repo
    }
}

/// Read-only view of the currently rendered pull request branches
pub trait DomFacts {
    fn head_ref(&self) -> Option<BranchRef>;
    fn base_ref(&self) -> Option<BranchRef>;
}

/// Facts for contexts without a page, such as the popup
pub struct NoDomFacts;

impl DomFacts for NoDomFacts {
    fn head_ref(&self) -> Option<BranchRef> {
        None
    }

    fn base_ref(&self) -> Option<BranchRef> {
        None
    }
}

/// Fixed facts, handy when the branches are already known
#[derive(Debug, Clone, Default)]
pub struct StaticDomFacts {
    pub head: Option<BranchRef>,
    pub base: Option<BranchRef>,
}

impl DomFacts for StaticDomFacts {
    fn head_ref(&self) -> Option<BranchRef> {
        self.head.clone()
    }

    fn base_ref(&self) -> Option<BranchRef> {
        self.base.clone()
    }
}

fn branch_label_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(?P<owner>[^:\s]+)/(?P<repo>[^/:\s]+):(?P<branch>.+)$").ok())
        .as_ref()
}

/// Parse a branch label as shown by Bitbucket and GitLab.
///
/// `owner/repo:branch` names a branch in another repository; anything else is a
/// branch of the page repository (including names with slashes like `feature/x`).
pub fn parse_branch_label(label: &str, owner: &str, repo: &str) -> Option<BranchRef> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }

    match branch_label_pattern().and_then(|pattern| pattern.captures(label)) {
        Some(caps) => Some(BranchRef::new(&caps["owner"], &caps["repo"], &caps["branch"])),
        None => Some(BranchRef::new(owner, repo, label)),
    }
}

/// Canonical `.git` remote of a repository on the page's host.
///
/// Keeps scheme, host and port; drops credentials, query and fragment.
pub fn remote_git_url(page: &Url, repo_path: &[&str]) -> String {
    let mut remote = page.clone();
    remote.set_query(None);
    remote.set_fragment(None);
    // Both only fail for URLs that cannot carry credentials, which then have none
    let _ = remote.set_username("");
    let _ = remote.set_password(None);
    remote.set_path(&format!("/{}.git", repo_path.join("/")));
    remote.to_string()
}
