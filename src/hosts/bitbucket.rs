/// Bitbucket routes: `/<owner>/<repo>[/<type>/<tail...>]`
use url::Url;

use super::markup::{COMPARE_LABEL, Icon, LinkButton, OPEN_LABEL};
use super::{Links, Side, commit_intent, compare_intent, nth_text, pull_request_link, tree_intent};
use crate::dom::{DomPort, InsertPosition, InsertionSpec, Insertions};
use crate::error::Result;
use crate::intent::{Action, BranchRef, DomFacts, ResolvedLink, parse_branch_label, remote_git_url};
use crate::route::{RouteDescriptor, optional_segment, path_segments, segment, tail_from};

/// Source then destination branch labels in the pull request header
const BRANCH_LABEL_SELECTOR: &str = ".css-1ul4m4g.evx2nil0";

/// Encoded carriage return separating the two sides of a compare URL
const COMPARE_SEPARATOR: &str = "%0D";

/// Action group of the pull request header, old and new layouts
const PR_HEADER_GROUP: &str =
    r#"[data-qa="page-header-wrapper"] [role="group"], .prCssVarContainer [role="group"]"#;

const BUTTON_CLASS: &str = "css-w97uih";
const ICON_FILL: &str = "var(--color-btn-text)";
const ICON_STYLE: &str = "position:relative; top:4px; left:-5px;";

pub fn parse(pathname: &str) -> RouteDescriptor {
    let segments = path_segments(pathname);
    RouteDescriptor {
        owner: segment(&segments, 0),
        subgroups: Vec::new(),
        repo: segment(&segments, 1),
        route_type: optional_segment(&segments, 2),
        tail: tail_from(&segments, 3),
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
        Some("commits") => ResolvedLink::new(commit_intent(&route.tail), remote),
        Some("compare") => ResolvedLink::new(
            compare_intent(&route.tail.join("/"), COMPARE_SEPARATOR, &route.full_name()),
            remote,
        ),
        Some("pull-requests") => pull_request_link(
            route.tail.first().map(String::as_str),
            action,
            facts,
            page,
            remote,
            |branch| route.owns(branch),
            |branch| remote_git_url(page, &[branch.owner.as_str(), branch.repo.as_str()]),
        ),
        Some("branches") | Some("branch") | Some("src") | None => {
            ResolvedLink::new(tree_intent(&route.tail), remote)
        }
        Some(_) => ResolvedLink::open_repo(remote),
    }
}

/// Branch label from the pull request header: `branch` or `owner/repo:branch`
pub fn branch_ref<P: DomPort>(port: &P, route: &RouteDescriptor, side: Side) -> Option<BranchRef> {
    let label = nth_text(port, BRANCH_LABEL_SELECTOR, side)?;
    parse_branch_label(&label, &route.namespace(), &route.repo)
}

fn menu_button<'a>(href: &'a str, class: &'a str, text: &'a str) -> LinkButton<'a> {
    LinkButton::new(href, class, Icon::new(20).fill(ICON_FILL).style(ICON_STYLE))
        .menu_item()
        .text(text)
}

pub fn insertions(route: &RouteDescriptor, links: &Links<'_>) -> Result<Insertions> {
    let mut insertions = Insertions::new();
    let open = links.open;

    match route.route_type.as_deref() {
        Some("compare") => {
            // The compare page only offers the comparison
            let compare = (links.compare)()?;
            let button = LinkButton::new(
                &compare,
                "aui-button gk-insert-compare",
                Icon::new(22).fill(ICON_FILL).style("position:relative; top:5px;"),
            )
            .style("padding-top:0px !important; padding-bottom:0px !important;")
            .text(COMPARE_LABEL)
            .html();
            insertions.set(
                InsertionSpec::new(
                    "#compare-toolbar .aui-buttons",
                    button,
                    InsertPosition::AfterBegin,
                )
                .replacing(".gk-insert-compare", &compare),
            );
        }
        Some("pull-requests") => {
            let compare = (links.compare)()?;
            let html = format!(
                "{}\n{}",
                menu_button(open, "gk-insert-pr css-w97uih", OPEN_LABEL).html(),
                menu_button(&compare, "gk-insert-comparison css-w97uih", COMPARE_LABEL).html()
            );
            insertions.set(
                InsertionSpec::new(
                    PR_HEADER_GROUP,
                    html,
                    InsertPosition::AfterBegin,
                )
                .replacing(".gk-insert-pr", open)
                .replacing(".gk-insert-comparison", &compare),
            );
        }
        Some("branches") => {
            let html = menu_button(open, BUTTON_CLASS, OPEN_LABEL)
                .style("margin-right:4px !important;")
                .html();
            insertions.set(InsertionSpec::new(".css-1bvc4cc", html, InsertPosition::AfterBegin));
        }
        Some("branch") | Some("commits") | Some("src") | None => {
            let html = menu_button(open, "gk-insert css-w97uih", OPEN_LABEL).html();
            insertions.set(
                InsertionSpec::new(".css-1oy5iav", html, InsertPosition::AfterBegin)
                    .replacing(".gk-insert", open),
            );
        }
        Some(_) => {}
    }

    Ok(insertions)
}
