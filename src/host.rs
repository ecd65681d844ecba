/// Browser platform capabilities the core depends on.
///
/// The extension build implements these over `chrome.*` (see `browser`);
/// tests substitute in-memory fakes.
use crate::error::Result;
use crate::project::TabInfo;
use crate::windows::{Ack, Message};

/// Interactive web authorization (`chrome.identity`)
#[allow(async_fn_in_trait)]
pub trait AuthFlow {
    /// Redirect URI unique to this extension instance, for the given path.
    fn redirect_url(&self, path: &str) -> String;

    /// Opens the authorization page. Resolves with the final redirect URL,
    /// or `None` if the user dismissed the flow.
    async fn launch(&self, url: &str, interactive: bool) -> Result<Option<String>>;
}

/// Window and tab operations (`chrome.windows`, `chrome.tabs`)
#[allow(async_fn_in_trait)]
pub trait WindowHost {
    /// Creates a focused window with one tab per URL and returns its id.
    async fn create_window(&self, urls: &[String]) -> Result<Option<i32>>;

    /// Fails if the window no longer exists.
    async fn focus_window(&self, window_id: i32) -> Result<()>;

    async fn close_window(&self, window_id: i32) -> Result<()>;

    async fn current_window_tabs(&self) -> Result<Vec<TabInfo>>;
}

/// Cross-context messaging (`chrome.runtime.sendMessage`)
#[allow(async_fn_in_trait)]
pub trait Messenger {
    async fn send(&self, message: &Message) -> Result<Ack>;
}
