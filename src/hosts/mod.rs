/// Supported Git hosts and the per-host dispatch table
///
/// Every host offers the same capabilities (parse a page URL, resolve a link
/// intent, build the insertions for the current route) with host-specific bodies.
use url::Url;

use crate::deep_link::DeepLinkEncoder;
use crate::dom::{DomPort, Insertions};
use crate::error::{Error, Result};
use crate::intent::{Action, BranchRef, DomFacts, LinkIntent, PullRequestContext, ResolvedLink};
use crate::route::{Route, is_full_sha};

pub mod azure;
pub mod bitbucket;
pub mod github;
pub mod gitlab;
pub mod markup;

/// Delay before re-rendering a GitHub page whose menu portal changed
pub const PORTAL_RENDER_DELAY_MS: u32 = 100;

/// Id of GitHub's lazily mounted menu portal
pub const PORTAL_ROOT_ID: &str = "__primerPortalRoot__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    GitHub,
    GitLab,
    Bitbucket,
    AzureDevOps,
}

impl Host {
    /// Pick the host serving `url`; other hosts are not injected
    pub fn from_url(url: &Url) -> Result<Host> {
        let hostname = url.host_str().unwrap_or_default();
        if hostname.ends_with("github.com") {
            Ok(Host::GitHub)
        } else if hostname.ends_with("gitlab.com") {
            Ok(Host::GitLab)
        } else if hostname.ends_with("bitbucket.org") {
            Ok(Host::Bitbucket)
        } else if hostname.ends_with("dev.azure.com") {
            Ok(Host::AzureDevOps)
        } else {
            Err(Error::UnsupportedHost(hostname.to_string()))
        }
    }

    /// Host for a provider id as used by the account service
    pub fn from_provider(provider: &str) -> Option<Host> {
        match provider {
            "github" => Some(Host::GitHub),
            "gitlab" => Some(Host::GitLab),
            "bitbucket" => Some(Host::Bitbucket),
            "azure" => Some(Host::AzureDevOps),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Host::GitHub => "github",
            Host::GitLab => "gitlab",
            Host::Bitbucket => "bitbucket",
            Host::AzureDevOps => "azure",
        }
    }

    pub fn parse(self, url: &Url) -> Route {
        match self {
            Host::GitHub => Route::Repo(github::parse(url.path())),
            Host::GitLab => Route::Repo(gitlab::parse(url.path())),
            Host::Bitbucket => Route::Repo(bitbucket::parse(url.path())),
            Host::AzureDevOps => Route::Azure(azure::parse(url)),
        }
    }

    /// Resolve the link for `route`. Never fails: unknown routes open the repository.
    pub fn resolve(
        self,
        route: &Route,
        action: Action,
        facts: &dyn DomFacts,
        page: &Url,
    ) -> ResolvedLink {
        match (self, route) {
            (Host::GitHub, Route::Repo(route)) => github::resolve(route, action, facts, page),
            (Host::GitLab, Route::Repo(route)) => gitlab::resolve(route, action, facts, page),
            (Host::Bitbucket, Route::Repo(route)) => bitbucket::resolve(route, action, facts, page),
            (Host::AzureDevOps, Route::Azure(route)) => azure::resolve(route, action, facts, page),
            (_, Route::Repo(route)) => {
                ResolvedLink::open_repo(crate::intent::remote_git_url(page, &route.repo_path()))
            }
            (_, Route::Azure(route)) => {
                ResolvedLink::open_repo(azure::remote_url(&route.org, &route.project, &route.repo))
            }
        }
    }

    /// Deep link for `action` on the page
    pub fn deep_link(
        self,
        route: &Route,
        action: Action,
        facts: &dyn DomFacts,
        page: &Url,
        encoder: &DeepLinkEncoder,
    ) -> Result<String> {
        encoder.encode(&self.resolve(route, action, facts, page))
    }

    /// Buttons to place on the current page
    ///
    /// Owner and group pages get none: there is no repository to open.
    pub fn insertions<P: DomPort>(
        self,
        page: &Url,
        port: &P,
        encoder: &DeepLinkEncoder,
    ) -> Result<Insertions> {
        let route = self.parse(page);
        if !route.has_repo() {
            log::debug!("no repository on {}", page);
            return Ok(Insertions::new());
        }
        let facts = PageFacts {
            host: self,
            port,
            page,
            route: &route,
        };
        let open = self.deep_link(&route, Action::Open, &facts, page, encoder)?;
        let compare = || self.deep_link(&route, Action::Compare, &facts, page, encoder);
        let links = Links {
            open: &open,
            compare: &compare,
        };

        match (self, &route) {
            (Host::GitHub, Route::Repo(route)) => github::insertions(route, &links),
            (Host::GitLab, Route::Repo(route)) => gitlab::insertions(route, &links),
            (Host::Bitbucket, Route::Repo(route)) => bitbucket::insertions(route, &links),
            (Host::AzureDevOps, Route::Azure(route)) => azure::insertions(route, &links),
            _ => Ok(Insertions::new()),
        }
    }

    /// Quiet period before retrying pending insertions
    pub fn debounce_ms(self) -> u32 {
        match self {
            Host::GitHub => 100,
            _ => 300,
        }
    }

    /// Client navigation is invisible to the page and arrives through the background relay
    pub fn uses_history_relay(self) -> bool {
        !matches!(self, Host::GitHub)
    }

    /// Delay before re-rendering after a relayed navigation to `url`
    pub fn relay_delay_ms(self, url: &str) -> u32 {
        match self {
            Host::Bitbucket if url.contains("pull-requests") => 1000,
            Host::AzureDevOps if url.contains("pullrequest") => 300,
            _ => 0,
        }
    }

    /// Whether menus mount lazily into a portal that needs its own watcher
    pub fn watches_portal(self) -> bool {
        matches!(self, Host::GitHub)
    }
}

/// Whether the background should forward a history update on `url` to the page
pub fn should_relay_history_update(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|url| Host::from_url(&url).ok())
        .is_some_and(Host::uses_history_relay)
}

/// Deep links of the current page; the compare link is only built when a route shows it
pub struct Links<'a> {
    pub open: &'a str,
    pub compare: &'a dyn Fn() -> Result<String>,
}

/// Which side of a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Head,
    Base,
}

impl Side {
    /// Position among the page's branch elements, head first
    pub fn index(self) -> usize {
        match self {
            Side::Head => 0,
            Side::Base => 1,
        }
    }
}

/// Branch facts read from the live page
pub struct PageFacts<'a, P: DomPort> {
    pub host: Host,
    pub port: &'a P,
    pub page: &'a Url,
    pub route: &'a Route,
}

impl<P: DomPort> PageFacts<'_, P> {
    fn branch(&self, side: Side) -> Option<BranchRef> {
        match (self.host, self.route) {
            (Host::GitHub, Route::Repo(_)) => github::branch_ref(self.port, self.page, side),
            (Host::GitLab, Route::Repo(route)) => gitlab::branch_ref(self.port, route, side),
            (Host::Bitbucket, Route::Repo(route)) => bitbucket::branch_ref(self.port, route, side),
            (Host::AzureDevOps, Route::Azure(_)) => azure::branch_ref(self.port, self.page, side),
            _ => None,
        }
    }
}

impl<P: DomPort> DomFacts for PageFacts<'_, P> {
    fn head_ref(&self) -> Option<BranchRef> {
        self.branch(Side::Head)
    }

    fn base_ref(&self) -> Option<BranchRef> {
        self.branch(Side::Base)
    }
}

/// Text of the `side` element among all matches of `selector`
pub(crate) fn nth_text<P: DomPort>(port: &P, selector: &str, side: Side) -> Option<String> {
    let element = port.query_selector_all(selector).into_iter().nth(side.index())?;
    port.text(&element).filter(|text| !text.trim().is_empty())
}

/// `href` of the `side` element among all matches of `selector`, resolved against the page
pub(crate) fn nth_href<P: DomPort>(
    port: &P,
    page: &Url,
    selector: &str,
    side: Side,
) -> Option<Url> {
    let element = port.query_selector_all(selector).into_iter().nth(side.index())?;
    let href = port.attribute(&element, "href")?;
    page.join(&href).ok()
}

/// Branch route shared by `tree`, `branch`, `src` and the repository root
pub(crate) fn tree_intent(tail: &[String]) -> LinkIntent {
    if tail.is_empty() {
        LinkIntent::OpenRepo
    } else if is_full_sha(tail) {
        LinkIntent::OpenCommit(tail.join("/"))
    } else {
        LinkIntent::OpenBranch(tail.join("/"))
    }
}

/// Commit route: the tail names the ref
pub(crate) fn commit_intent(tail: &[String]) -> LinkIntent {
    if tail.is_empty() {
        LinkIntent::OpenRepo
    } else {
        LinkIntent::OpenCommit(tail.join("/"))
    }
}

/// Compare route. `range` is the raw `base<separator>target` text from the URL.
///
/// Ranges without a `:` stay within the page repository, so both sides are
/// qualified as `<full_name>:<branch>`. Cross-repository ranges are kept as written.
pub(crate) fn compare_intent(range: &str, separator: &str, full_name: &str) -> LinkIntent {
    if range.is_empty() {
        return LinkIntent::OpenRepo;
    }

    let same_origin = !range.contains(':');
    let mut sides: Vec<String> = range
        .split(separator)
        .map(|side| {
            if same_origin {
                format!("{}:{}", full_name, side)
            } else {
                side.to_string()
            }
        })
        .collect();

    let target = sides.pop().unwrap_or_default();
    let base = if sides.is_empty() { None } else { Some(sides.join("...")) };
    LinkIntent::Compare { base, target }
}

/// Pull request route shared by every host.
///
/// Reads the displayed head/base branches; with both and `Compare` the link compares
/// them, with a head it opens the head branch, otherwise it opens the repository.
/// A head living in another repository moves `url` to that repository and records
/// the page repository as `prRepoUrl`.
pub(crate) fn pull_request_link(
    number: Option<&str>,
    action: Action,
    facts: &dyn DomFacts,
    page: &Url,
    page_remote: String,
    is_page_repo: impl Fn(&BranchRef) -> bool,
    remote_of: impl Fn(&BranchRef) -> String,
) -> ResolvedLink {
    let Some(number) = number.filter(|n| !n.is_empty()) else {
        return ResolvedLink::open_repo(page_remote);
    };

    let mut pull_request = PullRequestContext {
        number: number.to_string(),
        source_url: page.to_string(),
        cross_repo_url: None,
    };

    let Some(head) = facts.head_ref() else {
        let mut link = ResolvedLink::open_repo(page_remote);
        link.pull_request = Some(pull_request);
        return link;
    };

    let intent = match (action, facts.base_ref()) {
        (Action::Compare, Some(base)) => LinkIntent::Compare {
            base: Some(base.qualified()),
            target: head.qualified(),
        },
        _ => LinkIntent::OpenBranch(head.branch.clone()),
    };

    let remote_url = if is_page_repo(&head) {
        page_remote
    } else {
        pull_request.cross_repo_url = Some(page_remote);
        remote_of(&head)
    };

    ResolvedLink {
        intent,
        pull_request: Some(pull_request),
        remote_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{NoDomFacts, StaticDomFacts};

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_from_url() {
        assert_eq!(Host::from_url(&url("https://github.com/a/b")).unwrap(), Host::GitHub);
        assert_eq!(Host::from_url(&url("https://gist.github.com/a")).unwrap(), Host::GitHub);
        assert_eq!(Host::from_url(&url("https://gitlab.com/a/b")).unwrap(), Host::GitLab);
        assert_eq!(Host::from_url(&url("https://bitbucket.org/a/b")).unwrap(), Host::Bitbucket);
        assert_eq!(Host::from_url(&url("https://dev.azure.com/o/p")).unwrap(), Host::AzureDevOps);
        assert!(matches!(
            Host::from_url(&url("https://example.com/a/b")),
            Err(Error::UnsupportedHost(host)) if host == "example.com"
        ));
    }

    #[test]
    fn test_from_provider() {
        assert_eq!(Host::from_provider("azure"), Some(Host::AzureDevOps));
        assert_eq!(Host::from_provider("github"), Some(Host::GitHub));
        assert_eq!(Host::from_provider("jira"), None);
        assert_eq!(Host::from_provider("azure").map(Host::name), Some("azure"));
    }

    #[test]
    fn test_timing_configuration() {
        assert_eq!(Host::GitHub.debounce_ms(), 100);
        assert_eq!(Host::Bitbucket.debounce_ms(), 300);
        let bitbucket_pr = "https://bitbucket.org/a/b/pull-requests/3";
        assert_eq!(Host::Bitbucket.relay_delay_ms(bitbucket_pr), 1000);
        assert_eq!(Host::Bitbucket.relay_delay_ms("https://bitbucket.org/a/b/src/main"), 0);
        let azure_pr = "https://dev.azure.com/o/p/_git/r/pullrequest/1";
        assert_eq!(Host::AzureDevOps.relay_delay_ms(azure_pr), 300);
        assert_eq!(Host::GitHub.relay_delay_ms("https://github.com/a/b/pull/1"), 0);
    }

    #[test]
    fn test_owner_and_group_pages_get_no_insertions() {
        let dom = crate::dom::fake::FakeDom::new();
        let encoder = DeepLinkEncoder::new("https://gitkraken.dev");
        let pages = [
            "https://github.com/octocat",
            "https://gitlab.com/group/-/issues",
            "https://bitbucket.org/acme/",
            "https://dev.azure.com/org",
        ];
        for page in pages {
            let page = url(page);
            let host = Host::from_url(&page).unwrap();
            let insertions = host.insertions(&page, dom.as_ref(), &encoder).unwrap();
            assert!(insertions.is_empty(), "{}", page);
        }

        let repo = url("https://github.com/octocat/Hello-World");
        let insertions = Host::GitHub.insertions(&repo, dom.as_ref(), &encoder).unwrap();
        assert!(!insertions.is_empty());
    }

    #[test]
    fn test_navigation_sources() {
        assert!(!Host::GitHub.uses_history_relay());
        assert!(Host::GitLab.uses_history_relay());
        assert!(Host::Bitbucket.uses_history_relay());
        assert!(Host::AzureDevOps.uses_history_relay());
        assert!(Host::GitHub.watches_portal());
        assert!(!Host::AzureDevOps.watches_portal());
    }

    #[test]
    fn test_should_relay_history_update() {
        assert!(should_relay_history_update("https://bitbucket.org/acme/app/pull-requests/1"));
        assert!(should_relay_history_update("https://dev.azure.com/org/proj/_git/repo"));
        assert!(should_relay_history_update("https://gitlab.com/group/app/-/merge_requests/2"));
        assert!(!should_relay_history_update("https://github.com/acme/app"));
        assert!(!should_relay_history_update("https://example.com/"));
        assert!(!should_relay_history_update("not a url"));
    }

    #[test]
    fn test_tree_intent() {
        assert_eq!(tree_intent(&[]), LinkIntent::OpenRepo);
        assert_eq!(
            tree_intent(&["beb503ae81303d63abb821f2b0c66e41633b4705".to_string()]),
            LinkIntent::OpenCommit("beb503ae81303d63abb821f2b0c66e41633b4705".to_string())
        );
        assert_eq!(
            tree_intent(&["feature".to_string(), "x".to_string()]),
            LinkIntent::OpenBranch("feature/x".to_string())
        );
    }

    #[test]
    fn test_compare_intent_same_origin() {
        assert_eq!(
            compare_intent("main...dev", "...", "acme/app"),
            LinkIntent::Compare {
                base: Some("acme/app:main".to_string()),
                target: "acme/app:dev".to_string()
            }
        );
        assert_eq!(
            compare_intent("dev", "...", "acme/app"),
            LinkIntent::Compare {
                base: None,
                target: "acme/app:dev".to_string()
            }
        );
    }

    #[test]
    fn test_compare_intent_cross_repo_kept_verbatim() {
        assert_eq!(
            compare_intent("main...octo:app:dev", "...", "acme/app"),
            LinkIntent::Compare {
                base: Some("main".to_string()),
                target: "octo:app:dev".to_string()
            }
        );
        assert_eq!(compare_intent("", "...", "acme/app"), LinkIntent::OpenRepo);
    }

    #[test]
    fn test_pull_request_without_facts_keeps_context() {
        let page = url("https://github.com/acme/app/pull/7");
        let route = Host::GitHub.parse(&page);
        let link = Host::GitHub.resolve(&route, Action::Compare, &NoDomFacts, &page);
        assert_eq!(link.intent, LinkIntent::OpenRepo);
        assert_eq!(link.remote_url, "https://github.com/acme/app.git");
        let pr = link.pull_request.unwrap();
        assert_eq!(pr.number, "7");
        assert_eq!(pr.source_url, "https://github.com/acme/app/pull/7");
        assert_eq!(pr.cross_repo_url, None);
    }

    #[test]
    fn test_pull_request_same_repo_compare() {
        let page = url("https://github.com/acme/app/pull/7");
        let facts = StaticDomFacts {
            head: Some(BranchRef::new("acme", "app", "feature")),
            base: Some(BranchRef::new("acme", "app", "main")),
        };
        let route = Host::GitHub.parse(&page);

        let compare = Host::GitHub.resolve(&route, Action::Compare, &facts, &page);
        assert_eq!(
            compare.intent,
            LinkIntent::Compare {
                base: Some("acme/app:main".to_string()),
                target: "acme/app:feature".to_string()
            }
        );
        assert_eq!(compare.remote_url, "https://github.com/acme/app.git");

        let open = Host::GitHub.resolve(&route, Action::Open, &facts, &page);
        assert_eq!(open.intent, LinkIntent::OpenBranch("feature".to_string()));
        assert_eq!(open.pull_request.unwrap().cross_repo_url, None);
    }

    #[test]
    fn test_pull_request_from_fork_switches_remote() {
        let page = url("https://github.com/acme/app/pull/15");
        let facts = StaticDomFacts {
            head: Some(BranchRef::new("octo", "app-fork", "fix")),
            base: None,
        };
        let link = Host::GitHub.resolve(&Host::GitHub.parse(&page), Action::Compare, &facts, &page);

        assert_eq!(link.intent, LinkIntent::OpenBranch("fix".to_string()));
        assert_eq!(link.remote_url, "https://github.com/octo/app-fork.git");
        assert_eq!(
            link.pull_request.unwrap().cross_repo_url.as_deref(),
            Some("https://github.com/acme/app.git")
        );
    }

    #[test]
    fn test_unknown_route_type_opens_repo_on_every_host() {
        let pages = [
            (Host::GitHub, "https://github.com/acme/app/wiki/Home"),
            (Host::GitLab, "https://gitlab.com/acme/app/-/issues/3"),
            (Host::Bitbucket, "https://bitbucket.org/acme/app/wiki/Home"),
            (Host::AzureDevOps, "https://dev.azure.com/org/proj/_git/app/pushes"),
        ];
        for (host, page) in pages {
            let page = url(page);
            let link = host.resolve(&host.parse(&page), Action::Compare, &NoDomFacts, &page);
            assert_eq!(link.intent, LinkIntent::OpenRepo, "{}", page);
            assert_eq!(link.pull_request, None);
        }
    }
}
