/// GitLab routes: `/<owner>[/<subgroups...>]/<repo>[/-/<type>/<tail...>]`
///
/// The literal `-` segment separates the project path from the page kind; without
/// it the page is the project root.
use url::Url;

use super::markup::{COMPARE_LABEL, Icon, LinkButton, OPEN_LABEL};
use super::{Links, Side, commit_intent, compare_intent, nth_text, pull_request_link, tree_intent};
use crate::dom::{DomPort, InsertPosition, InsertionSpec, Insertions};
use crate::error::Result;
use crate::intent::{Action, BranchRef, DomFacts, ResolvedLink, parse_branch_label, remote_git_url};
use crate::route::{RouteDescriptor, optional_segment, path_segments, segment, tail_from};

/// Source then target branch of a merge request
const BRANCH_LABEL_SELECTOR: &str = ".detail-page-description .ref-name";

const SEPARATOR: &str = "-";
const BUTTON_CLASS: &str = "gl-button btn btn-md btn-default";
const ICON_STYLE: &str = "position:relative; top:3px; margin-right:4px;";

pub fn parse(pathname: &str) -> RouteDescriptor {
    let segments = path_segments(pathname);
    let owner = segment(&segments, 0);
    let owned = |range: &[&str]| range.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    match segments.iter().position(|s| *s == SEPARATOR) {
        None => {
            let last = segments.len().saturating_sub(1);
            RouteDescriptor {
                owner,
                subgroups: segments.get(1..last).map(owned).unwrap_or_default(),
                repo: if last >= 1 { segment(&segments, last) } else { String::new() },
                route_type: None,
                tail: Vec::new(),
            }
        }
        Some(separator) => {
            let repo_index = separator.checked_sub(1).filter(|i| *i >= 1);
            RouteDescriptor {
                owner,
                subgroups: repo_index
                    .and_then(|i| segments.get(1..i))
                    .map(owned)
                    .unwrap_or_default(),
                repo: repo_index.map(|i| segment(&segments, i)).unwrap_or_default(),
                route_type: optional_segment(&segments, separator + 1),
                tail: tail_from(&segments, separator + 2),
            }
        }
    }
}

pub fn resolve(
    route: &RouteDescriptor,
    action: Action,
    facts: &dyn DomFacts,
    page: &Url,
) -> ResolvedLink {
    let remote = remote_git_url(page, &route.repo_path());
    match route.route_type.as_deref() {
        Some("commit") => ResolvedLink::new(commit_intent(&route.tail), remote),
        Some("compare") => ResolvedLink::new(
            compare_intent(&route.tail.join("/"), "...", &route.full_name()),
            remote,
        ),
        Some("merge_requests") => pull_request_link(
            route.tail.first().map(String::as_str),
            action,
            facts,
            page,
            remote,
            |branch| route.owns(branch),
            |branch| remote_git_url(page, &[branch.owner.as_str(), branch.repo.as_str()]),
        ),
        Some("tree") | None => ResolvedLink::new(tree_intent(&route.tail), remote),
        Some(_) => ResolvedLink::open_repo(remote),
    }
}

/// Branch label from the merge request description: `branch` or `namespace/repo:branch`
pub fn branch_ref<P: DomPort>(port: &P, route: &RouteDescriptor, side: Side) -> Option<BranchRef> {
    let label = nth_text(port, BRANCH_LABEL_SELECTOR, side)?;
    parse_branch_label(&label, &route.namespace(), &route.repo)
}

fn button<'a>(href: &'a str, marker_class: &str, text: &'a str) -> String {
    let class = format!("{} {}", marker_class, BUTTON_CLASS);
    LinkButton::new(href, &class, Icon::new(16).style(ICON_STYLE))
        .label(text)
        .text(text)
        .html()
}

pub fn insertions(route: &RouteDescriptor, links: &Links<'_>) -> Result<Insertions> {
    let mut insertions = Insertions::new();
    let open = links.open;

    match route.route_type.as_deref() {
        Some("merge_requests") => {
            let compare = (links.compare)()?;
            let html = format!(
                "{}\n{}",
                button(open, "gk-insert-mr", OPEN_LABEL),
                button(&compare, "gk-insert-comparison", COMPARE_LABEL)
            );
            insertions.set(
                InsertionSpec::new(".detail-page-header-actions", html, InsertPosition::AfterBegin)
                    .replacing(".gk-insert-mr", open)
                    .replacing(".gk-insert-comparison", &compare),
            );
        }
        Some("compare") => {
            insertions.set(
                InsertionSpec::new(
                    ".js-compare-form",
                    button(open, "gk-insert-compare", COMPARE_LABEL),
                    InsertPosition::AfterEnd,
                )
                .replacing(".gk-insert-compare", open),
            );
        }
        Some("commit") => {
            insertions.set(
                InsertionSpec::new(
                    ".page-content-header",
                    button(open, "gk-insert-commit", OPEN_LABEL),
                    InsertPosition::BeforeEnd,
                )
                .replacing(".gk-insert-commit", open),
            );
        }
        Some("tree") | None => {
            insertions.set(
                InsertionSpec::new(
                    ".tree-controls",
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
