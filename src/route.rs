/// Route descriptors parsed from a page path
///
/// Parsing never fails: missing segments stay empty and the resolver falls back
/// to opening the repository root.

/// Route on GitHub, GitLab or Bitbucket
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteDescriptor {
    pub owner: String,
    /// Nested group path between owner and repository (GitLab only)
    pub subgroups: Vec<String>,
    pub repo: String,
    pub route_type: Option<String>,
    pub tail: Vec<String>,
}

impl RouteDescriptor {
    /// Repository path segments: owner, subgroups, repo
    pub fn repo_path(&self) -> Vec<&str> {
        std::iter::once(self.owner.as_str())
            .chain(self.subgroups.iter().map(String::as_str))
            .chain(std::iter::once(self.repo.as_str()))
            .collect()
    }

    /// `owner[/subgroups]/repo`, the prefix of a qualified branch name
    pub fn full_name(&self) -> String {
        self.repo_path().join("/")
    }

    /// Owner plus subgroups: the part of the path a fork label puts before `/repo`
    pub fn namespace(&self) -> String {
        std::iter::once(self.owner.as_str())
            .chain(self.subgroups.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Whether `branch` lives in this repository
    pub fn owns(&self, branch: &crate::intent::BranchRef) -> bool {
        branch.project.is_none() && branch.same_repo(&self.namespace(), &self.repo)
    }

    /// Both owner and repository are known; owner and group pages have no repository
    pub fn has_repo(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty()
    }
}

/// Route on Azure DevOps
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AzureRoute {
    pub org: String,
    pub project: String,
    pub repo: String,
    pub route_type: Option<String>,
    pub target: Option<String>,
    /// `version` query parameter without its `GB`/`GC` prefix
    pub version: Option<String>,
    pub base_version: Option<String>,
    pub target_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Repo(RouteDescriptor),
    Azure(AzureRoute),
}

impl Route {
    /// Whether the page belongs to a repository a remote can be built for
    pub fn has_repo(&self) -> bool {
        match self {
            Route::Repo(route) => route.has_repo(),
            Route::Azure(route) => !route.org.is_empty() && !route.repo.is_empty(),
        }
    }
}

/// Split a pathname into its segments.
///
/// Strips a single trailing `/` and drops the empty segment produced by the
/// leading slash. Inner empty segments are kept so indices stay positional.
pub fn path_segments(pathname: &str) -> Vec<&str> {
    let path = pathname.strip_suffix('/').unwrap_or(pathname);
    let mut segments: Vec<&str> = path.split('/').collect();
    if segments.first() == Some(&"") {
        segments.remove(0);
    }
    segments
}

/// Owned segment at `index`, or an empty string
pub(crate) fn segment(segments: &[&str], index: usize) -> String {
    segments.get(index).map(|s| s.to_string()).unwrap_or_default()
}

/// Segment at `index` when present and non-empty
pub(crate) fn optional_segment(segments: &[&str], index: usize) -> Option<String> {
    segments
        .get(index)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Non-empty segments from `start` onward, order preserved
pub(crate) fn tail_from(segments: &[&str], start: usize) -> Vec<String> {
    segments
        .iter()
        .skip(start)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Drop the two-character ref-kind prefix Azure puts on versions (`GBmain` -> `main`)
pub(crate) fn strip_version_prefix(value: &str) -> Option<String> {
    let stripped: String = value.chars().skip(2).collect();
    if stripped.is_empty() { None } else { Some(stripped) }
}

/// Heuristic used for `tree`/`src` routes: a single 40-character segment is a commit SHA.
/// Branch names of exactly 40 characters and short SHAs are misclassified.
pub fn is_full_sha(tail: &[String]) -> bool {
    tail.len() == 1 && tail[0].chars().count() == 40
}
