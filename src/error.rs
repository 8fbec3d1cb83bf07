/// Crate-wide error type
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported host: {0}")]
    UnsupportedHost(String),

    #[error("dom operation failed: {0}")]
    Dom(String),

    #[error("extension bridge failed: {0}")]
    Bridge(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap a value thrown by a DOM call
    pub fn dom(context: &str, value: impl std::fmt::Debug) -> Error {
        Error::Dom(format!("{}: {:?}", context, value))
    }
}

impl From<serde_wasm_bindgen::Error> for Error {
    fn from(err: serde_wasm_bindgen::Error) -> Error {
        Error::Bridge(err.to_string())
    }
}

impl From<Error> for wasm_bindgen::JsValue {
    fn from(err: Error) -> wasm_bindgen::JsValue {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
