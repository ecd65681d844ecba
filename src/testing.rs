/// In-memory stand-ins for the browser host, shared by unit tests.

use crate::bookmarks::{BookmarkHost, BookmarkNode};
use crate::error::{LinkspaceError, Result};
use crate::host::{AuthFlow, Messenger, WindowHost};
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::project::TabInfo;
use crate::providers::SyncContext;
use crate::storage::{KeyValueStore, Store};
use crate::windows::{Ack, Message, WindowTracker};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

pub type TestContext = SyncContext<MemoryStore, MockHttp, FakeAuth>;

pub fn test_context(http: MockHttp) -> TestContext {
    SyncContext::new(MemoryStore::new(), http, FakeAuth::returning_code("test-code"))
}

/// `chrome.storage.local` backed by a map. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Rc<RefCell<HashMap<String, Value>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw value without counting it as a write.
    pub fn insert(&self, key: &str, value: Value) {
        self.values.borrow_mut().insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }

    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.get(key))
    }

    async fn set_raw(&self, key: &str, value: Value) -> Result<()> {
        self.writes.set(self.writes.get() + 1);
        self.insert(key, value);
        Ok(())
    }
}

type Responder = Rc<dyn Fn(&HttpRequest) -> HttpResponse>;

/// HTTP client answering from a closure and recording every request
#[derive(Clone)]
pub struct MockHttp {
    respond: Option<Responder>,
    requests: Rc<RefCell<Vec<HttpRequest>>>,
}

impl MockHttp {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&HttpRequest) -> HttpResponse + 'static,
    {
        MockHttp {
            respond: Some(Rc::new(respond)),
            requests: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Every request fails as if the network were down.
    pub fn unreachable() -> Self {
        MockHttp {
            respond: None,
            requests: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }
}

impl std::fmt::Debug for MockHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttp")
            .field("requests", &self.requests.borrow().len())
            .finish()
    }
}

impl HttpClient for MockHttp {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request.clone());
        match &self.respond {
            Some(respond) => Ok(respond(&request)),
            None => Err(LinkspaceError::Transport(format!("{} unreachable", request.url))),
        }
    }
}

/// Authorization flow that immediately redirects with a fixed code, or is
/// dismissed by the user.
#[derive(Debug, Clone)]
pub struct FakeAuth {
    code: Option<String>,
    launched: Rc<RefCell<Vec<String>>>,
}

impl FakeAuth {
    pub fn returning_code(code: &str) -> Self {
        FakeAuth {
            code: Some(code.to_string()),
            launched: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn dismissed() -> Self {
        FakeAuth {
            code: None,
            launched: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Authorization URLs opened so far
    pub fn launched(&self) -> Vec<String> {
        self.launched.borrow().clone()
    }
}

impl AuthFlow for FakeAuth {
    fn redirect_url(&self, path: &str) -> String {
        format!("https://linkspace-test.chromiumapp.org/{}", path)
    }

    async fn launch(&self, url: &str, _interactive: bool) -> Result<Option<String>> {
        self.launched.borrow_mut().push(url.to_string());
        Ok(self
            .code
            .as_ref()
            .map(|code| format!("{}?code={}", self.redirect_url("cb"), code)))
    }
}

#[derive(Debug, Default)]
struct WindowState {
    next_id: i32,
    open: HashSet<i32>,
    created: Vec<(i32, Vec<String>)>,
    focused: Vec<i32>,
    closed: Vec<i32>,
    tabs: Vec<TabInfo>,
}

/// Window manager that remembers what it was asked to do. Closing a window
/// does not emit a removal event; tests deliver that themselves.
#[derive(Debug, Clone)]
pub struct FakeWindows {
    state: Rc<RefCell<WindowState>>,
}

impl FakeWindows {
    pub fn new() -> Self {
        FakeWindows {
            state: Rc::new(RefCell::new(WindowState {
                next_id: 100,
                ..WindowState::default()
            })),
        }
    }

    /// Tabs reported for the current window
    pub fn with_tabs(tabs: Vec<TabInfo>) -> Self {
        let windows = Self::new();
        windows.state.borrow_mut().tabs = tabs;
        windows
    }

    pub fn created(&self) -> Vec<(i32, Vec<String>)> {
        self.state.borrow().created.clone()
    }

    pub fn focused(&self) -> Vec<i32> {
        self.state.borrow().focused.clone()
    }

    pub fn closed(&self) -> Vec<i32> {
        self.state.borrow().closed.clone()
    }
}

impl WindowHost for FakeWindows {
    async fn create_window(&self, urls: &[String]) -> Result<Option<i32>> {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.open.insert(id);
        state.created.push((id, urls.to_vec()));
        Ok(Some(id))
    }

    async fn focus_window(&self, window_id: i32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.open.contains(&window_id) {
            return Err(LinkspaceError::Host(format!("No window with id: {}", window_id)));
        }
        state.focused.push(window_id);
        Ok(())
    }

    async fn close_window(&self, window_id: i32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.open.remove(&window_id) {
            return Err(LinkspaceError::Host(format!("No window with id: {}", window_id)));
        }
        state.closed.push(window_id);
        Ok(())
    }

    async fn current_window_tabs(&self) -> Result<Vec<TabInfo>> {
        Ok(self.state.borrow().tabs.clone())
    }
}

/// Delivers messages straight to a background tracker on the same storage.
pub struct LoopbackMessenger {
    background: WindowTracker<MemoryStore>,
}

impl LoopbackMessenger {
    pub fn new(backend: MemoryStore) -> Self {
        LoopbackMessenger {
            background: WindowTracker::new(Store::new(backend)),
        }
    }
}

impl Messenger for LoopbackMessenger {
    async fn send(&self, message: &Message) -> Result<Ack> {
        self.background.handle_message(message).await
    }
}

#[derive(Debug)]
struct BookmarkState {
    nodes: Vec<BookmarkNode>,
    next_id: u32,
}

/// Bookmark tree with Chrome's stock roots: "0" holding "1" (Bookmarks Bar)
/// and "2" (Other Bookmarks).
#[derive(Debug, Clone)]
pub struct FakeBookmarks {
    state: Rc<RefCell<BookmarkState>>,
}

fn folder(id: &str, title: &str, parent_id: Option<&str>) -> BookmarkNode {
    BookmarkNode {
        id: id.to_string(),
        title: title.to_string(),
        url: None,
        parent_id: parent_id.map(str::to_string),
        children: None,
    }
}

impl FakeBookmarks {
    pub fn new() -> Self {
        FakeBookmarks {
            state: Rc::new(RefCell::new(BookmarkState {
                nodes: vec![
                    folder("0", "", None),
                    folder("1", "Bookmarks Bar", Some("0")),
                    folder("2", "Other Bookmarks", Some("0")),
                ],
                next_id: 3,
            })),
        }
    }

    pub fn node(&self, id: &str) -> Option<BookmarkNode> {
        self.state.borrow().nodes.iter().find(|n| n.id == id).cloned()
    }

    fn child_nodes(&self, id: &str) -> Vec<BookmarkNode> {
        self.state
            .borrow()
            .nodes
            .iter()
            .filter(|n| n.parent_id.as_deref() == Some(id))
            .cloned()
            .collect()
    }

    fn subtree(&self, mut node: BookmarkNode) -> BookmarkNode {
        if node.is_folder() {
            let children = self
                .child_nodes(&node.id)
                .into_iter()
                .map(|child| self.subtree(child))
                .collect();
            node.children = Some(children);
        }
        node
    }
}

impl BookmarkHost for FakeBookmarks {
    async fn get(&self, id: &str) -> Result<Option<BookmarkNode>> {
        Ok(self.node(id))
    }

    async fn tree(&self) -> Result<Vec<BookmarkNode>> {
        Ok(self.node("0").map(|root| self.subtree(root)).into_iter().collect())
    }

    async fn search_title(&self, title: &str) -> Result<Vec<BookmarkNode>> {
        Ok(self
            .state
            .borrow()
            .nodes
            .iter()
            .filter(|n| n.title == title)
            .cloned()
            .collect())
    }

    async fn children(&self, id: &str) -> Result<Vec<BookmarkNode>> {
        Ok(self.child_nodes(id))
    }

    async fn create(&self, parent_id: &str, title: &str, url: Option<&str>) -> Result<BookmarkNode> {
        if self.node(parent_id).is_none_or(|p| !p.is_folder()) {
            return Err(LinkspaceError::Host(format!("Can't find parent bookmark id: {}", parent_id)));
        }
        let mut state = self.state.borrow_mut();
        let node = BookmarkNode {
            id: state.next_id.to_string(),
            title: title.to_string(),
            url: url.map(str::to_string),
            parent_id: Some(parent_id.to_string()),
            children: None,
        };
        state.next_id += 1;
        state.nodes.push(node.clone());
        Ok(node)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        if !self.child_nodes(id).is_empty() {
            return Err(LinkspaceError::Host("Can't remove non-empty folder".to_string()));
        }
        let mut state = self.state.borrow_mut();
        let before = state.nodes.len();
        state.nodes.retain(|n| n.id != id);
        if state.nodes.len() == before {
            return Err(LinkspaceError::Host(format!("Can't find bookmark for id: {}", id)));
        }
        Ok(())
    }
}
