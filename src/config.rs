/// Build-mode configuration and link constants

/// Build mode, picked at compile time from `GK_MODE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Production,
    Development,
}

impl Mode {
    pub fn current() -> Mode {
        Mode::from_env(option_env!("GK_MODE"))
    }

    fn from_env(value: Option<&str>) -> Mode {
        match value {
            Some("production") => Mode::Production,
            _ => Mode::Development,
        }
    }

    pub fn landing_site(self) -> &'static str {
        match self {
            Mode::Production => "https://gitkraken.dev",
            Mode::Development => "https://dev.gitkraken.dev",
        }
    }

    pub fn log_level(self) -> log::Level {
        match self {
            Mode::Production => log::Level::Warn,
            Mode::Development => log::Level::Debug,
        }
    }
}

/// Application that the landing site hands the redirect URI to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkTarget {
    GitKraken,
    GkDev,
    #[default]
    VsCode,
    VsCodeInsiders,
}

impl LinkTarget {
    pub fn scheme(self) -> &'static str {
        match self {
            LinkTarget::GitKraken => "gitkraken",
            LinkTarget::GkDev => "gkdev",
            LinkTarget::VsCode => "vscode",
            LinkTarget::VsCodeInsiders => "vscode-insiders",
        }
    }
}

/// Authority of every redirect URI
pub const REDIRECT_AUTHORITY: &str = "eamodio.gitlens";

/// Repository id segment; the real repository travels in the `url` parameter
pub const REPO_PLACEHOLDER: &str = "-";

/// Attribute tagging every injected element
pub const MARKER_ATTRIBUTE: &str = "data-gk";

/// Runtime message sent by the popup when it opens
pub const POPUP_INIT_MESSAGE: &str = "popupInit";

/// Runtime message sent by the popup after the user granted permissions
pub const PERMISSIONS_GRANTED_MESSAGE: &str = "permissionsGranted";

/// Resolve the landing site for a content-script invocation
pub fn landing_base_or_default(landing_base: &str) -> String {
    let trimmed = landing_base.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        Mode::current().landing_site().to_string()
    } else {
        trimmed.to_string()
    }
}
