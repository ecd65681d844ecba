/// `chrome.*` implementations of the host traits over the JS bridge in
/// `extension.js`.

use crate::bookmarks::{BookmarkHost, BookmarkNode};
use crate::error::{LinkspaceError, Result};
use crate::host::{AuthFlow, Messenger, WindowHost};
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::project::TabInfo;
use crate::providers::SyncContext;
use crate::storage::{KeyValueStore, Store};
use crate::windows::{Ack, Message};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wasm_bindgen::JsValue;

// Import JS bridge functions
mod bridge {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen(module = "/extension.js")]
    extern "C" {
        #[wasm_bindgen(catch)]
        pub async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn httpFetch(method: &str, url: &str, headers: JsValue, body: JsValue) -> Result<JsValue, JsValue>;

        pub fn getRedirectUrl(path: &str) -> String;

        #[wasm_bindgen(catch)]
        pub async fn launchWebAuthFlow(url: &str, interactive: bool) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn createWindow(urls: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn focusWindow(window_id: i32) -> Result<(), JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn closeWindow(window_id: i32) -> Result<(), JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn getCurrentWindowTabs() -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn sendMessage(message: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn bookmarksGet(id: &str) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn bookmarksTree() -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn bookmarksSearchTitle(title: &str) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn bookmarksChildren(id: &str) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn bookmarksCreate(parent_id: &str, title: &str, url: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(catch)]
        pub async fn bookmarksRemove(id: &str) -> Result<(), JsValue>;
    }
}

pub type BrowserContext = SyncContext<ChromeStorage, FetchClient, ChromeIdentity>;

pub fn context() -> BrowserContext {
    SyncContext::new(ChromeStorage, FetchClient, ChromeIdentity)
}

pub fn store() -> Store<ChromeStorage> {
    Store::new(ChromeStorage)
}

impl From<LinkspaceError> for JsValue {
    fn from(e: LinkspaceError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}

fn host_error(e: JsValue) -> LinkspaceError {
    LinkspaceError::Host(format!("{:?}", e))
}

fn transport_error(e: JsValue) -> LinkspaceError {
    LinkspaceError::Transport(format!("{:?}", e))
}

pub(crate) fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T> {
    serde_wasm_bindgen::from_value(value).map_err(|e| LinkspaceError::Host(format!("Failed to parse: {:?}", e)))
}

/// Plain JS objects and arrays, never `Map`s.
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| LinkspaceError::Host(format!("Failed to serialize: {:?}", e)))
}

fn is_absent(value: &JsValue) -> bool {
    value.is_null() || value.is_undefined()
}

/// `chrome.storage.local`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStorage;

impl KeyValueStore for ChromeStorage {
    async fn get_raw(&self, key: &str) -> Result<Option<Value>> {
        let value = bridge::getStorage(key).await.map_err(host_error)?;
        if is_absent(&value) {
            return Ok(None);
        }
        from_js(value).map(Some)
    }

    async fn set_raw(&self, key: &str, value: Value) -> Result<()> {
        bridge::setStorage(key, to_js(&value)?).await.map_err(host_error)
    }
}

#[derive(Deserialize)]
struct FetchResponse {
    status: u16,
    #[serde(default)]
    body: String,
}

/// `fetch`
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchClient;

impl HttpClient for FetchClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        log::debug!("{} {}", request.method.as_str(), request.url);
        let headers = to_js(&request.headers)?;
        let body = request.body.as_deref().map(JsValue::from_str).unwrap_or(JsValue::NULL);

        let response = bridge::httpFetch(request.method.as_str(), &request.url, headers, body)
            .await
            .map_err(transport_error)?;
        let response: FetchResponse = from_js(response)?;
        Ok(HttpResponse::new(response.status, response.body))
    }
}

/// `chrome.identity`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeIdentity;

impl AuthFlow for ChromeIdentity {
    fn redirect_url(&self, path: &str) -> String {
        bridge::getRedirectUrl(path)
    }

    async fn launch(&self, url: &str, interactive: bool) -> Result<Option<String>> {
        let redirect = bridge::launchWebAuthFlow(url, interactive)
            .await
            .map_err(|e| LinkspaceError::Authorization(format!("{:?}", e)))?;
        Ok(redirect.as_string())
    }
}

/// `chrome.windows` and `chrome.tabs`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeWindows;

impl WindowHost for ChromeWindows {
    async fn create_window(&self, urls: &[String]) -> Result<Option<i32>> {
        let window_id = bridge::createWindow(to_js(urls)?).await.map_err(host_error)?;
        Ok(window_id.as_f64().map(|id| id as i32))
    }

    async fn focus_window(&self, window_id: i32) -> Result<()> {
        bridge::focusWindow(window_id).await.map_err(host_error)
    }

    async fn close_window(&self, window_id: i32) -> Result<()> {
        bridge::closeWindow(window_id).await.map_err(host_error)
    }

    async fn current_window_tabs(&self) -> Result<Vec<TabInfo>> {
        let tabs = bridge::getCurrentWindowTabs().await.map_err(host_error)?;
        from_js(tabs)
    }
}

/// `chrome.runtime.sendMessage`
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeMessenger;

impl Messenger for RuntimeMessenger {
    async fn send(&self, message: &Message) -> Result<Ack> {
        let response = bridge::sendMessage(to_js(message)?).await.map_err(transport_error)?;
        if is_absent(&response) {
            return Err(LinkspaceError::Transport("No response to message".to_string()));
        }
        from_js(response)
    }
}

/// `chrome.bookmarks`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeBookmarks;

impl BookmarkHost for ChromeBookmarks {
    async fn get(&self, id: &str) -> Result<Option<BookmarkNode>> {
        let node = bridge::bookmarksGet(id).await.map_err(host_error)?;
        if is_absent(&node) {
            return Ok(None);
        }
        from_js(node).map(Some)
    }

    async fn tree(&self) -> Result<Vec<BookmarkNode>> {
        from_js(bridge::bookmarksTree().await.map_err(host_error)?)
    }

    async fn search_title(&self, title: &str) -> Result<Vec<BookmarkNode>> {
        from_js(bridge::bookmarksSearchTitle(title).await.map_err(host_error)?)
    }

    async fn children(&self, id: &str) -> Result<Vec<BookmarkNode>> {
        from_js(bridge::bookmarksChildren(id).await.map_err(host_error)?)
    }

    async fn create(&self, parent_id: &str, title: &str, url: Option<&str>) -> Result<BookmarkNode> {
        let url = url.map(JsValue::from_str).unwrap_or(JsValue::NULL);
        from_js(bridge::bookmarksCreate(parent_id, title, url).await.map_err(host_error)?)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        bridge::bookmarksRemove(id).await.map_err(host_error)
    }
}
