/// Redirect URI construction and landing-page deep link encoding
///
/// Redirect URI: `<scheme>://eamodio.gitlens/link/r/-[/b/<branch>|/c/<ref>|/compare/<range>]`
/// with query parameters `pr`, `prUrl`, `prRepoUrl` (pull requests only) and `url`.
///
/// Deep link: `<landing>/link/<encodeURIComponent(base64(redirect))>`, followed by
/// `?referrer=extension` and `&context=pr` for pull requests.
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use url::Url;
use url::form_urlencoded::byte_serialize;

use crate::config::{LinkTarget, REDIRECT_AUTHORITY, REPO_PLACEHOLDER};
use crate::error::Result;
use crate::intent::{LinkIntent, ResolvedLink};

#[derive(Debug, Clone)]
pub struct DeepLinkEncoder {
    landing_base: String,
    target: LinkTarget,
}

impl DeepLinkEncoder {
    pub fn new(landing_base: &str) -> DeepLinkEncoder {
        DeepLinkEncoder {
            landing_base: landing_base.trim_end_matches('/').to_string(),
            target: LinkTarget::default(),
        }
    }

    pub fn with_target(mut self, target: LinkTarget) -> DeepLinkEncoder {
        self.target = target;
        self
    }

    /// Build the custom-scheme redirect URI for a resolved link
    pub fn redirect_uri(&self, link: &ResolvedLink) -> Result<Url> {
        let mut uri = Url::parse(&format!(
            "{}://{}/link/r/{}{}",
            self.target.scheme(),
            REDIRECT_AUTHORITY,
            REPO_PLACEHOLDER,
            intent_path(&link.intent)
        ))?;

        {
            let mut query = uri.query_pairs_mut();
            if let Some(pr) = &link.pull_request {
                query.append_pair("pr", &pr.number);
                query.append_pair("prUrl", &pr.source_url);
                if let Some(cross_repo_url) = &pr.cross_repo_url {
                    query.append_pair("prRepoUrl", cross_repo_url);
                }
            }
            query.append_pair("url", &link.remote_url);
        }

        Ok(uri)
    }

    /// Encode a resolved link as an opaque landing-page URL
    pub fn encode(&self, link: &ResolvedLink) -> Result<String> {
        let redirect = self.redirect_uri(link)?;
        log::debug!("redirect uri {}", redirect);
        self.wrap(&redirect)
    }

    /// Wrap an already built redirect URI
    pub fn wrap(&self, redirect: &Url) -> Result<String> {
        let encoded = STANDARD.encode(redirect.as_str());
        // base64 only yields `+`, `/` and `=` besides alphanumerics, which form
        // encoding escapes exactly like encodeURIComponent
        let component: String = byte_serialize(encoded.as_bytes()).collect();

        let mut deep_link = Url::parse(&format!("{}/link/{}", self.landing_base, component))?;
        {
            let mut query = deep_link.query_pairs_mut();
            query.append_pair("referrer", "extension");
            if has_pull_request(redirect) {
                query.append_pair("context", "pr");
            }
        }

        Ok(deep_link.to_string())
    }
}

fn intent_path(intent: &LinkIntent) -> String {
    match intent {
        LinkIntent::OpenRepo => String::new(),
        LinkIntent::OpenBranch(branch) => format!("/b/{}", branch),
        LinkIntent::OpenCommit(reference) => format!("/c/{}", reference),
        LinkIntent::Compare {
            base: Some(base),
            target,
        } => format!("/compare/{}...{}", base, target),
        LinkIntent::Compare { base: None, target } => format!("/compare/{}", target),
    }
}

fn has_pull_request(redirect: &Url) -> bool {
    redirect
        .query_pairs()
        .any(|(key, value)| key == "pr" && !value.is_empty())
}
