/// Linkspace - Chrome Extension that saves windows as named projects
/// Built with Rust + WASM + Yew

pub mod bookmarks;
pub mod config;
pub mod error;
pub mod host;
pub mod http;
pub mod operations;
pub mod pkce;
pub mod project;
pub mod providers;
pub mod storage;
pub mod windows;

#[cfg(target_arch = "wasm32")]
pub mod browser;
#[cfg(target_arch = "wasm32")]
pub mod ui;

#[cfg(test)]
mod testing;

pub use error::{LinkspaceError, Result};

#[cfg(target_arch = "wasm32")]
mod exports {
    use crate::bookmarks;
    use crate::browser::{self, ChromeBookmarks, from_js, to_js};
    use crate::config::{ProviderConfig, ProviderKey};
    use crate::providers::{Provider, SyncProvider};
    use crate::windows::{Message, WindowTracker};
    use serde_json::Value;
    use uuid::Uuid;
    use wasm_bindgen::prelude::*;

    // Set up panic hook for better error messages in the browser console
    #[wasm_bindgen(start)]
    pub fn main() {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::default());
    }

    // Start the Yew app for the popup
    #[wasm_bindgen]
    pub fn start_popup() {
        yew::Renderer::<crate::ui::popup::App>::new().render();
    }

    /// Background message handler. Resolves to `undefined` for messages this
    /// extension does not handle.
    #[wasm_bindgen]
    pub async fn handle_message(message: JsValue) -> Result<JsValue, JsValue> {
        let Some(message) = from_js::<Value>(message).ok().and_then(Message::from_value) else {
            return Ok(JsValue::UNDEFINED);
        };
        let ack = WindowTracker::new(browser::store()).handle_message(&message).await?;
        Ok(to_js(&ack)?)
    }

    /// Message types `handle_message` answers.
    #[wasm_bindgen]
    pub fn handled_message_types() -> Vec<String> {
        Message::TYPES.iter().map(|t| t.to_string()).collect()
    }

    #[wasm_bindgen]
    pub async fn on_window_removed(window_id: i32) -> Result<(), JsValue> {
        WindowTracker::new(browser::store()).on_window_removed(window_id).await?;
        Ok(())
    }

    #[wasm_bindgen]
    pub async fn get_theme() -> Result<String, JsValue> {
        Ok(browser::store().theme().await?.as_str().to_string())
    }

    #[wasm_bindgen]
    pub async fn set_theme(theme: String) -> Result<String, JsValue> {
        Ok(browser::store().set_theme(&theme).await?.as_str().to_string())
    }

    #[wasm_bindgen]
    pub async fn get_provider_config() -> Result<JsValue, JsValue> {
        Ok(to_js(&browser::store().provider_config().await?)?)
    }

    #[wasm_bindgen]
    pub async fn set_provider_config(config: JsValue) -> Result<(), JsValue> {
        let config: ProviderConfig = from_js(config)?;
        browser::store().set_provider_config(&config).await?;
        log::info!("Selected provider {}", config.selected);
        Ok(())
    }

    #[wasm_bindgen]
    pub async fn provider_status(key: Option<String>) -> Result<JsValue, JsValue> {
        let ctx = browser::context();
        let provider = Provider::resolve_key(key.as_deref(), &ctx);
        Ok(to_js(&provider.status().await?)?)
    }

    #[wasm_bindgen]
    pub async fn provider_sign_in(key: String) -> Result<(), JsValue> {
        let ctx = browser::context();
        Provider::resolve(ProviderKey::from_key(&key), &ctx).sign_in().await?;
        Ok(())
    }

    #[wasm_bindgen]
    pub async fn provider_sign_out(key: String) -> Result<(), JsValue> {
        let ctx = browser::context();
        Provider::resolve(ProviderKey::from_key(&key), &ctx).sign_out().await?;
        Ok(())
    }

    #[wasm_bindgen]
    pub async fn export_bookmarks() -> Result<u32, JsValue> {
        let projects = browser::store().projects().await?;
        let count = bookmarks::export_all(&ChromeBookmarks, &projects).await?;
        Ok(count as u32)
    }

    /// Folder id of the exported project, or `undefined` if the id is unknown.
    #[wasm_bindgen]
    pub async fn export_bookmark_project(project_id: String) -> Result<Option<String>, JsValue> {
        let id = Uuid::parse_str(&project_id).map_err(|e| JsValue::from_str(&format!("Invalid project id: {}", e)))?;
        Ok(bookmarks::export_saved_project(&ChromeBookmarks, &browser::store(), &id).await?)
    }

    #[wasm_bindgen]
    pub async fn list_bookmark_folders() -> Result<JsValue, JsValue> {
        Ok(to_js(&bookmarks::list_folders(&ChromeBookmarks).await?)?)
    }

    #[wasm_bindgen]
    pub async fn import_bookmark_folder(folder_id: String) -> Result<u32, JsValue> {
        let now = chrono::Utc::now().timestamp_millis();
        let count = bookmarks::import_folder(&ChromeBookmarks, &browser::store(), &folder_id, now).await?;
        Ok(count as u32)
    }
}
