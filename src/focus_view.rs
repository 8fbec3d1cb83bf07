/// Deep links for pull request rows in the popup's Focus View
///
/// Same parser and resolver as the content script, without page facts: a pull
/// request opens its repository with the pull request attached.
use url::Url;

use crate::deep_link::DeepLinkEncoder;
use crate::error::Result;
use crate::hosts::Host;
use crate::intent::{Action, NoDomFacts, ResolvedLink};

/// Resolved link for a pull request of `provider`, if the provider is supported
pub fn focus_view_link(provider: &str, pull_request_url: &str) -> Result<Option<ResolvedLink>> {
    let Some(host) = Host::from_provider(provider) else {
        return Ok(None);
    };
    if pull_request_url.trim().is_empty() {
        return Ok(None);
    }

    let page = Url::parse(pull_request_url)?;
    let route = host.parse(&page);
    if !route.has_repo() {
        return Ok(None);
    }
    Ok(Some(host.resolve(&route, Action::Open, &NoDomFacts, &page)))
}

pub fn focus_view_deep_link(
    provider: &str,
    pull_request_url: &str,
    landing_base: &str,
) -> Result<Option<String>> {
    let encoder = DeepLinkEncoder::new(landing_base);
    focus_view_link(provider, pull_request_url)?
        .map(|link| encoder.encode(&link))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::LinkIntent;

    fn redirect(provider: &str, url: &str) -> String {
        let link = focus_view_link(provider, url).unwrap().unwrap();
        DeepLinkEncoder::new("https://gitkraken.dev")
            .redirect_uri(&link)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_github_pull_request() {
        assert_eq!(
            redirect("github", "https://github.com/acme/app/pull/7"),
            "vscode://eamodio.gitlens/link/r/-?pr=7&prUrl=https%3A%2F%2Fgithub.com%2Facme%2Fapp%2Fpull%2F7&url=https%3A%2F%2Fgithub.com%2Facme%2Fapp.git"
        );
    }

    #[test]
    fn test_azure_pull_request_uses_clone_url() {
        let page = "https://dev.azure.com/org/proj/_git/repo/pullrequest/42";
        let link = focus_view_link("azure", page).unwrap().unwrap();
        assert_eq!(link.intent, LinkIntent::OpenRepo);
        assert_eq!(link.remote_url, "https://org@dev.azure.com/org/proj/_git/repo");
        assert_eq!(link.pull_request.unwrap().number, "42");
    }

    #[test]
    fn test_gitlab_and_bitbucket_merge_requests() {
        let gitlab = focus_view_link("gitlab", "https://gitlab.com/group/app/-/merge_requests/3")
            .unwrap()
            .unwrap();
        assert_eq!(gitlab.remote_url, "https://gitlab.com/group/app.git");
        assert_eq!(gitlab.pull_request.unwrap().number, "3");

        let page = "https://bitbucket.org/acme/app/pull-requests/9";
        let bitbucket = focus_view_link("bitbucket", page).unwrap().unwrap();
        assert_eq!(bitbucket.remote_url, "https://bitbucket.org/acme/app.git");
    }

    #[test]
    fn test_deep_link_carries_pr_context() {
        let page = "https://github.com/acme/app/pull/7";
        let deep_link = focus_view_deep_link("github", page, "https://gitkraken.dev/")
            .unwrap()
            .unwrap();
        assert!(deep_link.starts_with("https://gitkraken.dev/link/"));
        assert!(deep_link.ends_with("?referrer=extension&context=pr"));
    }

    #[test]
    fn test_unsupported_or_missing_input() {
        let landing = "https://gitkraken.dev";
        assert_eq!(
            focus_view_deep_link("jira", "https://example.com/x", landing).unwrap(),
            None
        );
        assert_eq!(focus_view_deep_link("github", "", landing).unwrap(), None);
        assert!(focus_view_deep_link("github", "not a url", landing).is_err());
    }

    #[test]
    fn test_owner_page_has_no_link() {
        assert_eq!(focus_view_link("github", "https://github.com/octocat").unwrap(), None);
        let group_page = "https://gitlab.com/group/-/merge_requests";
        assert_eq!(focus_view_link("gitlab", group_page).unwrap(), None);
    }
}
