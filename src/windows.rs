/// Window tracking: which open browser window hosts which project.
///
/// A window is either untracked or tracked by exactly one project. Entries
/// are added by track-request messages and removed only by window-removed
/// events; every update rewrites the whole map.
use crate::error::Result;
use crate::host::{Messenger, WindowHost};
use crate::project::Project;
use crate::storage::{KeyValueStore, Store};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowEntry {
    pub window_id: i32,
    pub project_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpenWindowMap {
    entries: Vec<WindowEntry>,
}

impl OpenWindowMap {
    pub fn new() -> Self {
        OpenWindowMap {
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[WindowEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Window most recently tracked for the project.
    pub fn window_for(&self, project_id: &Uuid) -> Option<i32> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.project_id == *project_id)
            .map(|e| e.window_id)
    }

    pub fn project_for(&self, window_id: i32) -> Option<Uuid> {
        self.entries
            .iter()
            .find(|e| e.window_id == window_id)
            .map(|e| e.project_id)
    }

    /// Records `entry`, replacing whatever the same window was tracking.
    pub fn track(&mut self, entry: WindowEntry) {
        self.entries.retain(|e| e.window_id != entry.window_id);
        self.entries.push(entry);
    }

    /// Removes every entry for the window. Returns whether anything changed.
    pub fn remove_window(&mut self, window_id: i32) -> bool {
        let original_len = self.entries.len();
        self.entries.retain(|e| e.window_id != window_id);
        self.entries.len() < original_len
    }

    pub fn active_project_ids(&self) -> HashSet<Uuid> {
        self.entries.iter().map(|e| e.project_id).collect()
    }

    pub fn is_open(&self, project_id: &Uuid) -> bool {
        self.entries.iter().any(|e| e.project_id == *project_id)
    }
}

impl From<Vec<WindowEntry>> for OpenWindowMap {
    fn from(entries: Vec<WindowEntry>) -> Self {
        OpenWindowMap { entries }
    }
}

/// Messages exchanged between the popup and the background context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Ping,
    TrackProjectWindow {
        #[serde(rename = "windowId")]
        window_id: i32,
        #[serde(rename = "projectId")]
        project_id: Uuid,
    },
}

impl Message {
    /// `type` tags the background answers; anything else is left to other listeners.
    pub const TYPES: [&'static str; 2] = ["ping", "track_project_window"];

    /// `None` for anything this extension does not handle.
    pub fn from_value(value: Value) -> Option<Message> {
        serde_json::from_value(value).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Ack { ok: true }
    }
}

/// Result of an open request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The project's tracked window was still alive and got focus.
    Focused(i32),
    /// A new window was created (and tracked when the host reported its id).
    Created(Option<i32>),
    /// The project has no URLs.
    Skipped,
}

pub struct WindowTracker<K> {
    store: Store<K>,
}

impl<K: KeyValueStore> WindowTracker<K> {
    pub fn new(store: Store<K>) -> Self {
        WindowTracker { store }
    }

    /// Focus the project's window if it is still open, otherwise open a new
    /// one and ask the background context to track it.
    pub async fn open_project<W, M>(
        &self,
        project: &Project,
        windows: &W,
        messenger: &M,
    ) -> Result<OpenOutcome>
    where
        W: WindowHost,
        M: Messenger,
    {
        if project.urls.is_empty() {
            return Ok(OpenOutcome::Skipped);
        }

        let map = match self.store.open_map().await {
            Ok(map) => map,
            Err(e) => {
                log::warn!("Could not read open window map: {}", e);
                OpenWindowMap::new()
            }
        };

        if let Some(window_id) = map.window_for(&project.id) {
            match windows.focus_window(window_id).await {
                Ok(()) => {
                    log::info!("Focused window {} for project {}", window_id, project.id);
                    return Ok(OpenOutcome::Focused(window_id));
                }
                Err(e) => log::debug!("Tracked window {} is gone: {}", window_id, e),
            }
        }

        let window_id = windows.create_window(&project.urls).await?;
        if let Some(window_id) = window_id {
            let message = Message::TrackProjectWindow {
                window_id,
                project_id: project.id,
            };
            if let Err(e) = messenger.send(&message).await {
                log::warn!("Window {} opened but not tracked: {}", window_id, e);
            }
        }
        log::info!("Opened project {} in window {:?}", project.id, window_id);
        Ok(OpenOutcome::Created(window_id))
    }

    /// Close the project's window once `confirm` agrees. The window-removed
    /// event that follows is what untracks it.
    pub async fn close_project<W, F>(&self, project: &Project, windows: &W, confirm: F) -> Result<bool>
    where
        W: WindowHost,
        F: FnOnce(&Project) -> bool,
    {
        let map = self.store.open_map().await?;
        let Some(window_id) = map.window_for(&project.id) else {
            return Ok(false);
        };
        if !confirm(project) {
            return Ok(false);
        }
        windows.close_window(window_id).await?;
        Ok(true)
    }

    /// Host event: some window (tracked or not) closed.
    pub async fn on_window_removed(&self, window_id: i32) -> Result<bool> {
        let mut map = self.store.open_map().await?;
        if !map.remove_window(window_id) {
            return Ok(false);
        }
        self.store.set_open_map(&map).await?;
        log::info!("Untracked window {}", window_id);
        Ok(true)
    }

    pub async fn handle_message(&self, message: &Message) -> Result<Ack> {
        match message {
            Message::Ping => Ok(Ack::ok()),
            Message::TrackProjectWindow {
                window_id,
                project_id,
            } => {
                let mut map = self.store.open_map().await?;
                map.track(WindowEntry {
                    window_id: *window_id,
                    project_id: *project_id,
                });
                self.store.set_open_map(&map).await?;
                log::info!("Tracking window {} for project {}", window_id, project_id);
                Ok(Ack::ok())
            }
        }
    }
}
