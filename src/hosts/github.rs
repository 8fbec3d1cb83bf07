/// GitHub routes: `/<owner>/<repo>[/<type>/<tail...>]`
use url::Url;

use super::markup::{COMPARE_LABEL, Icon, LinkButton, OPEN_LABEL, menu_list_item};
use super::{Links, Side, commit_intent, compare_intent, pull_request_link, tree_intent};
use crate::dom::{DomPort, InsertPosition, InsertionSpec, Insertions};
use crate::error::Result;
use crate::intent::{Action, BranchRef, DomFacts, ResolvedLink, remote_git_url};
use crate::route::{RouteDescriptor, optional_segment, path_segments, segment, tail_from};

const HEAD_REF_SELECTOR: &str = ".commit-ref.head-ref a";
const BASE_REF_SELECTOR: &str = ".commit-ref.base-ref a";

const CLONE_PANEL_ITEM: &str = r#"[data-target="get-repo.modal"] #local-panel ul li:first-child"#;
const PORTAL_MENU_ITEM: &str =
    "#__primerPortalRoot__ > div > div > div > ul > div > ul > li:first-child";

/// "Code" menu of the React repository overview
const OVERVIEW_MENU_ITEM: &str =
    "#__primerPortalRoot__ .react-overview-code-button-action-list > div > ul > li:first-child";
const OVERVIEW_ITEM_ATTRIBUTES: &str = r#"style="margin-inline: var(--base-size-8, .5rem);""#;
const OVERVIEW_LINK_STYLE: &str = "padding-block: var(--control-medium-paddingBlock, .375rem); \
    padding-inline: var(--control-medium-paddingInline-condensed, .5rem);";
const BOX_ROW: &str = r#"class="Box-row Box-row--hover-gray p-3 mt-0 rounded-0""#;
const BUTTON_STYLE: &str = "padding-top:2px !important; padding-bottom:1px !important;";
const ICON_STYLE: &str = "position:relative; top:2px;";

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
        Some("commit") => ResolvedLink::new(commit_intent(&route.tail), remote),
        Some("compare") => ResolvedLink::new(
            compare_intent(&route.tail.join("/"), "...", &route.full_name()),
            remote,
        ),
        Some("pull") => pull_request_link(
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

/// Head/base branch from the pull request header links (`/<owner>/<repo>/tree/<branch...>`)
pub fn branch_ref<P: DomPort>(port: &P, page: &Url, side: Side) -> Option<BranchRef> {
    let selector = match side {
        Side::Head => HEAD_REF_SELECTOR,
        Side::Base => BASE_REF_SELECTOR,
    };
    let element = port.query_selector(selector)?;
    let href = page.join(&port.attribute(&element, "href")?).ok()?;

    let segments = path_segments(href.path());
    let branch = tail_from(&segments, 3).join("/");
    let owner = segment(&segments, 0);
    let repo = segment(&segments, 1);
    if owner.is_empty() || repo.is_empty() || branch.is_empty() {
        return None;
    }
    Some(BranchRef::new(&owner, &repo, &branch))
}

fn button(href: &str, class: &str) -> String {
    LinkButton::new(href, class, Icon::new(22).style(ICON_STYLE))
        .style(BUTTON_STYLE)
        .html()
}

pub fn insertions(route: &RouteDescriptor, links: &Links<'_>) -> Result<Insertions> {
    let mut insertions = Insertions::new();
    let open = links.open;

    match route.route_type.as_deref() {
        Some("commit") => {
            // ml-auto pushes the button to the right inside the header flexbox
            let header_button = button(open, "btn px-2 ml-auto flex-self-start");
            insertions.set(InsertionSpec::new(
                "#browse-at-time-link",
                header_button.clone(),
                InsertPosition::BeforeBegin,
            ));
            insertions.set(InsertionSpec::new(
                r#"[aria-label="Browse the repository at this point in the history"]"#,
                header_button,
                InsertPosition::BeforeBegin,
            ));

            // GitHub Enterprise 3.11
            insertions.set(InsertionSpec::new(
                ".commit > #browse-at-time-link",
                button(open, "btn mr-2 px-2 float-right"),
                InsertPosition::AfterEnd,
            ));
        }
        Some("compare") => {
            insertions.set(InsertionSpec::new(
                ".js-range-editor",
                button(open, "btn mr-2 px-2 float-right"),
                InsertPosition::AfterBegin,
            ));
        }
        Some("pull") => {
            let compare = (links.compare)()?;
            let items = format!(
                "{}\n{}",
                menu_list_item(BOX_ROW, None, open, OPEN_LABEL),
                menu_list_item(BOX_ROW, None, &compare, COMPARE_LABEL)
            );
            insertions.set(InsertionSpec::new(
                CLONE_PANEL_ITEM,
                items.clone(),
                InsertPosition::AfterEnd,
            ));
            insertions.set(InsertionSpec::new(
                PORTAL_MENU_ITEM,
                items,
                InsertPosition::AfterEnd,
            ));
        }
        Some("tree") | None => {
            let item = menu_list_item(BOX_ROW, None, open, OPEN_LABEL);
            // GitHub Enterprise 3.11
            insertions.set(InsertionSpec::new(
                r#"[data-target="get-repo.modal"] ul li:last-child"#,
                item.clone(),
                InsertPosition::AfterEnd,
            ));
            insertions.set(InsertionSpec::new(
                CLONE_PANEL_ITEM,
                item,
                InsertPosition::AfterEnd,
            ));

            // "Code" menu of the React overview
            let overview_item = menu_list_item(
                OVERVIEW_ITEM_ATTRIBUTES,
                Some(OVERVIEW_LINK_STYLE),
                open,
                OPEN_LABEL,
            );
            insertions.set(InsertionSpec::new(
                OVERVIEW_MENU_ITEM,
                overview_item,
                InsertPosition::BeforeBegin,
            ));
        }
        Some(_) => {
            let button = LinkButton::new(
                open,
                "btn mr-2 px-2 py-0",
                Icon::new(22).style(ICON_STYLE),
            )
            .html();
            insertions.set(InsertionSpec::new(
                ".file-navigation get-repo",
                button,
                InsertPosition::BeforeBegin,
            ));

            let item = menu_list_item(BOX_ROW, None, open, OPEN_LABEL);
            insertions.set(InsertionSpec::new(
                CLONE_PANEL_ITEM,
                item.clone(),
                InsertPosition::AfterEnd,
            ));
            insertions.set(InsertionSpec::new(
                PORTAL_MENU_ITEM,
                item,
                InsertPosition::AfterEnd,
            ));
        }
    }

    Ok(insertions)
}
