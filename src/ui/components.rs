/// Reusable popup components

use patternfly_yew::prelude::*;
use yew::prelude::*;

use crate::permissions::PermissionsRequest;

#[derive(Properties, PartialEq)]
pub struct PermissionsBannerProps {
    pub request: PermissionsRequest,
    pub on_request: Callback<MouseEvent>,
    #[prop_or(false)]
    pub disabled: bool,
}

/// Banner shown while origins are missing
#[function_component(PermissionsBanner)]
pub fn permissions_banner(props: &PermissionsBannerProps) -> Html {
    html! {
        <Alert r#type={AlertType::Warning} title={props.request.banner_message()} inline={true}>
            <Button
                onclick={props.on_request.clone()}
                disabled={props.disabled}
                variant={ButtonVariant::Link}
            >
                {"Request Permissions"}
            </Button>
        </Alert>
    }
}

#[derive(Properties, PartialEq)]
pub struct ExternalLinkProps {
    pub href: AttrValue,
    #[prop_or_default]
    pub class: Classes,
    pub children: Children,
}

#[function_component(ExternalLink)]
pub fn external_link(props: &ExternalLinkProps) -> Html {
    html! {
        <a class={props.class.clone()} href={props.href.clone()} target="_blank" rel="noreferrer">
            {props.children.clone()}
        </a>
    }
}

#[derive(Properties, PartialEq)]
pub struct AccountLinksProps {
    /// Landing site without trailing slash
    pub landing: AttrValue,
}

/// Sign-in and sign-up links to the landing site
#[function_component(AccountLinks)]
pub fn account_links(props: &AccountLinksProps) -> Html {
    let login = format!("{}/login", props.landing);
    let register = format!("{}/register", props.landing);
    html! {
        <div class="sign-in-prompt">
            <p class="popup-title">{"Sign in to view your Pull Requests"}</p>
            <ExternalLink class="pf-v5-c-button pf-m-primary pf-m-block" href={login}>
                {"Sign in with GitKraken"}
            </ExternalLink>
            <ExternalLink class="pf-v5-c-button pf-m-link" href={register}>
                {"Create an account"}
            </ExternalLink>
        </div>
    }
}
