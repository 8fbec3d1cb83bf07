/// Popup UI for the GitKraken links extension

use patternfly_yew::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::components::{AccountLinks, PermissionsBanner};
use crate::config::{Mode, PERMISSIONS_GRANTED_MESSAGE, POPUP_INIT_MESSAGE};
use crate::error::{Error, Result};
use crate::permissions::PermissionsRequest;

// Import JS bridge functions
#[wasm_bindgen(module = "/popup.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn sendRuntimeMessage(message: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn requestPermissions(request: JsValue) -> std::result::Result<JsValue, JsValue>;
}

#[derive(Clone, PartialEq)]
enum AppState {
    Loading,
    Ready(Option<PermissionsRequest>),
    Requesting(PermissionsRequest),
    Error(String),
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| AppState::Loading);
    let landing = AttrValue::from(Mode::current().landing_site());

    // Sync with the background on open; it answers with the missing origins
    {
        let state = state.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match sync_with_background().await {
                    Ok(request) => state.set(AppState::Ready(request)),
                    Err(e) => {
                        log::error!("popup init failed: {}", e);
                        state.set(AppState::Error(e.to_string()));
                    }
                }
            });
            || ()
        });
    }

    let on_request_permissions = {
        let state = state.clone();

        Callback::from(move |_: MouseEvent| {
            let AppState::Ready(Some(request)) = (*state).clone() else {
                return;
            };
            let state = state.clone();
            state.set(AppState::Requesting(request.clone()));

            spawn_local(async move {
                match grant_permissions(&request).await {
                    Ok(true) => close_popup(),
                    Ok(false) => state.set(AppState::Ready(Some(request))),
                    Err(e) => {
                        state.set(AppState::Error(format!("Permission request failed: {}", e)))
                    }
                }
            });
        })
    };

    html! {
        <div class="padding-20">
            {match &*state {
                AppState::Loading => html! {
                    <div class="loading-text-center">
                        <Spinner />
                    </div>
                },
                AppState::Ready(request) => html! {
                    <>
                        if let Some(request) = request {
                            <PermissionsBanner
                                request={request.clone()}
                                on_request={on_request_permissions.clone()}
                            />
                        }
                        <AccountLinks landing={landing.clone()} />
                    </>
                },
                AppState::Requesting(request) => html! {
                    <PermissionsBanner
                        request={request.clone()}
                        on_request={on_request_permissions.clone()}
                        disabled={true}
                    />
                },
                AppState::Error(err) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {err.clone()}
                        </Alert>
                        <AccountLinks landing={landing.clone()} />
                    </div>
                },
            }}
        </div>
    }
}

// Helper functions

fn bridge_error(context: &str, value: JsValue) -> Error {
    Error::Bridge(format!("{}: {:?}", context, value))
}

async fn sync_with_background() -> Result<Option<PermissionsRequest>> {
    let response = sendRuntimeMessage(POPUP_INIT_MESSAGE)
        .await
        .map_err(|e| bridge_error(POPUP_INIT_MESSAGE, e))?;
    Ok(serde_wasm_bindgen::from_value(response)?)
}

/// Ask for the missing origins; notifies the background when the user agreed
async fn grant_permissions(request: &PermissionsRequest) -> Result<bool> {
    let origins = serde_wasm_bindgen::to_value(&request.request)?;
    let granted = requestPermissions(origins)
        .await
        .map_err(|e| bridge_error("permissions.request", e))?
        .as_bool()
        .unwrap_or(false);
    if !granted {
        log::info!("permissions were not granted");
        return Ok(false);
    }

    sendRuntimeMessage(PERMISSIONS_GRANTED_MESSAGE)
        .await
        .map_err(|e| bridge_error(PERMISSIONS_GRANTED_MESSAGE, e))?;
    Ok(true)
}

fn close_popup() {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.close() {
            log::warn!("cannot close popup: {:?}", e);
        }
    }
}
