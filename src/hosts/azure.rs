/// Azure DevOps routes
///
/// `/<org>/_git/<project>[/<type>/<target>]` for a project's default repository,
/// `/<org>/<project>/_git/<repo>[/<type>/<target>]` for any other. Branches travel
/// in the `version`, `baseVersion` and `targetVersion` query parameters.
use url::Url;

use super::markup::{COMPARE_LABEL, Icon, LinkButton, OPEN_LABEL};
use super::{Links, Side, nth_href, pull_request_link};
use crate::dom::{DomPort, InsertPosition, InsertionSpec, Insertions};
use crate::error::Result;
use crate::intent::{Action, BranchRef, DomFacts, LinkIntent, ResolvedLink};
use crate::route::{AzureRoute, optional_segment, path_segments, segment, strip_version_prefix};

const GIT_SEGMENT: &str = "_git";

/// Source then target branch links in the pull request header
const BRANCH_LINK_SELECTOR: &str = ".pr-header-branches > .bolt-link";

const BUTTON_CLASS: &str = "bolt-header-command-item-button bolt-button";
const BUTTON_STYLE: &str = "text-decoration:none !important";

pub fn parse(url: &Url) -> AzureRoute {
    let segments = path_segments(url.path());
    let org = segment(&segments, 0);

    let (project, repo, route_type, target) = if segments.get(1) == Some(&GIT_SEGMENT) {
        let project = segment(&segments, 2);
        (
            project.clone(),
            project,
            optional_segment(&segments, 3),
            optional_segment(&segments, 4),
        )
    } else {
        let project = segment(&segments, 1);
        let repo = optional_segment(&segments, 3).unwrap_or_else(|| project.clone());
        (
            project,
            repo,
            optional_segment(&segments, 4),
            optional_segment(&segments, 5),
        )
    };

    AzureRoute {
        org,
        project,
        repo,
        route_type,
        target,
        version: version_param(url, "version"),
        base_version: version_param(url, "baseVersion"),
        target_version: version_param(url, "targetVersion"),
    }
}

fn version_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .and_then(|(_, value)| strip_version_prefix(&value))
}

/// Clone URL of an Azure Repos repository
pub fn remote_url(org: &str, project: &str, repo: &str) -> String {
    format!("https://{org}@dev.azure.com/{org}/{project}/_git/{repo}")
}

fn qualified(route: &AzureRoute, branch: &str) -> String {
    format!("{}/{}/{}:{}", route.org, route.project, route.repo, branch)
}

pub fn resolve(
    route: &AzureRoute,
    action: Action,
    facts: &dyn DomFacts,
    page: &Url,
) -> ResolvedLink {
    let remote = remote_url(&route.org, &route.project, &route.repo);
    match route.route_type.as_deref() {
        Some("commit") => match &route.target {
            Some(commit) => ResolvedLink::new(LinkIntent::OpenCommit(commit.clone()), remote),
            None => ResolvedLink::open_repo(remote),
        },
        // Only branches of the page repository can be compared
        Some("branchCompare") => match (&route.base_version, &route.target_version) {
            (Some(base), Some(target)) => ResolvedLink::new(
                LinkIntent::Compare {
                    base: Some(qualified(route, base)),
                    target: qualified(route, target),
                },
                remote,
            ),
            _ => ResolvedLink::open_repo(remote),
        },
        Some("pullrequest") => pull_request_link(
            route.target.as_deref(),
            action,
            facts,
            page,
            remote,
            |branch| {
                branch.owner == route.org
                    && branch.project.as_deref() == Some(route.project.as_str())
                    && branch.repo == route.repo
            },
            |branch| {
                let project = branch.project.as_deref().unwrap_or_default();
                remote_url(&branch.owner, project, &branch.repo)
            },
        ),
        None => match &route.version {
            Some(branch) => ResolvedLink::new(LinkIntent::OpenBranch(branch.clone()), remote),
            None => ResolvedLink::open_repo(remote),
        },
        Some(_) => ResolvedLink::open_repo(remote),
    }
}

/// Branch from a pull request header link (`/<org>/<project>/_git/<repo>?version=GB<branch>`)
pub fn branch_ref<P: DomPort>(port: &P, page: &Url, side: Side) -> Option<BranchRef> {
    let href = nth_href(port, page, BRANCH_LINK_SELECTOR, side)?;
    let segments = path_segments(href.path());
    let branch = version_param(&href, "version")?;

    let org = segment(&segments, 0);
    let project = segment(&segments, 1);
    let repo = segment(&segments, 3);
    if org.is_empty() || project.is_empty() || repo.is_empty() {
        return None;
    }

    Some(BranchRef {
        owner: org,
        project: Some(project),
        repo,
        branch,
    })
}

fn button(href: &str, marker_class: &str, text: &str) -> String {
    let class = format!("{} {}", marker_class, BUTTON_CLASS);
    LinkButton::new(
        href,
        &class,
        Icon::new(20)
            .fill("var(--color-btn-text)")
            .style("position:relative; margin-right:4px;"),
    )
    .style(BUTTON_STYLE)
    .menu_item()
    .text(text)
    .html()
}

pub fn insertions(route: &AzureRoute, links: &Links<'_>) -> Result<Insertions> {
    let mut insertions = Insertions::new();
    let open = links.open;

    match route.route_type.as_deref() {
        Some("branchCompare") => {
            let compare = (links.compare)()?;
            insertions.set(
                InsertionSpec::new(
                    ".bolt-header-commandbar-button-group",
                    button(&compare, "gk-insert-compare", COMPARE_LABEL),
                    InsertPosition::AfterBegin,
                )
                .replacing(".gk-insert-compare", &compare),
            );
        }
        Some("pullrequest") => {
            let compare = (links.compare)()?;
            let html = format!(
                "{}\n{}",
                button(open, "gk-insert-pr", OPEN_LABEL),
                button(&compare, "gk-insert-compare", COMPARE_LABEL)
            );
            insertions.set(
                InsertionSpec::new(".repos-pr-title-row", html, InsertPosition::AfterEnd)
                    .replacing(".gk-insert-compare", &compare)
                    .replacing(".gk-insert-pr", open),
            );
        }
        Some("commit") => {
            insertions.set(
                InsertionSpec::new(
                    ".bolt-header-commandbar",
                    button(open, "gk-insert-commit", OPEN_LABEL),
                    InsertPosition::AfterBegin,
                )
                .replacing(".gk-insert-commit", open),
            );
        }
        None => {
            insertions.set(
                InsertionSpec::new(
                    ".repos-files-header-commandbar",
                    button(open, "gk-insert", OPEN_LABEL),
                    InsertPosition::AfterBegin,
                )
                .replacing(".gk-insert", open),
            );
        }
        Some(_) => {}
    }

    Ok(insertions)
}
