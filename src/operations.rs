/// Project operations: saving windows, ordering, sync glue

use crate::error::Result;
use crate::host::WindowHost;
use crate::project::{Project, ProjectList, TabInfo};
use crate::providers::SyncProvider;
use crate::storage::{KeyValueStore, Store};
use crate::windows::OpenWindowMap;
use chrono::{DateTime, Local};
use uuid::Uuid;

/// URLs worth saving: unpinned tabs with a URL that is not a browser page
pub fn project_urls(tabs: &[TabInfo]) -> Vec<String> {
    tabs.iter()
        .filter(|tab| !tab.pinned)
        .filter_map(|tab| tab.url.as_deref())
        .filter(|url| !url.is_empty() && !url.starts_with("chrome"))
        .map(str::to_string)
        .collect()
}

pub fn default_project_name(now: &DateTime<Local>) -> String {
    format!("Project {}", now.format("%Y-%m-%d %H:%M:%S"))
}

/// Save the current window's tabs as a new project.
///
/// Returns `None` without touching storage when no tab is worth saving.
pub async fn save_current_window<K, W>(
    store: &Store<K>,
    windows: &W,
    name: &str,
    now: DateTime<Local>,
) -> Result<Option<Project>>
where
    K: KeyValueStore,
    W: WindowHost,
{
    let tabs = windows.current_window_tabs().await?;
    let urls = project_urls(&tabs);
    if urls.is_empty() {
        log::info!("Nothing to save in current window");
        return Ok(None);
    }

    let name = match name.trim() {
        "" => default_project_name(&now),
        trimmed => trimmed.to_string(),
    };
    let project = Project::new(name, now.timestamp_millis(), urls);

    let mut projects = store.projects().await?;
    projects.add_project(project.clone());
    store.save_projects(&projects).await?;
    log::info!("Saved project {} with {} tabs", project.name, project.urls.len());
    Ok(Some(project))
}

pub async fn delete_project<K: KeyValueStore>(store: &Store<K>, project_id: &Uuid) -> Result<bool> {
    let mut projects = store.projects().await?;
    if !projects.remove_project(project_id) {
        return Ok(false);
    }
    store.save_projects(&projects).await?;
    log::info!("Deleted project {}", project_id);
    Ok(true)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRow {
    pub project: Project,
    /// Some window is tracked for this project.
    pub active: bool,
}

/// Open projects first, each group newest first
pub fn display_order(projects: &ProjectList, open: &OpenWindowMap) -> Vec<ProjectRow> {
    let active = open.active_project_ids();
    let mut rows: Vec<ProjectRow> = projects
        .iter()
        .map(|project| ProjectRow {
            active: active.contains(&project.id),
            project: project.clone(),
        })
        .collect();

    sort_rows(&mut rows);
    rows
}

/// Rows after the project's window was closed, before the window-removed
/// event has cleared it from storage
pub fn mark_closed(rows: &[ProjectRow], project_id: &Uuid) -> Vec<ProjectRow> {
    let mut rows: Vec<ProjectRow> = rows
        .iter()
        .map(|row| ProjectRow {
            active: row.active && row.project.id != *project_id,
            project: row.project.clone(),
        })
        .collect();
    sort_rows(&mut rows);
    rows
}

fn sort_rows(rows: &mut [ProjectRow]) {
    rows.sort_by(|a, b| {
        b.active
            .cmp(&a.active)
            .then_with(|| b.project.created_at.cmp(&a.project.created_at))
    });
}

pub async fn sync_pull<P: SyncProvider>(provider: &P) -> Result<ProjectList> {
    let projects = provider.pull().await?;
    log::info!("{}: pull complete, {} projects", provider.label(), projects.len());
    Ok(projects)
}

/// Push the local list to the provider. Returns how many projects were sent.
pub async fn sync_push<K, P>(store: &Store<K>, provider: &P) -> Result<usize>
where
    K: KeyValueStore,
    P: SyncProvider,
{
    let projects = store.projects().await?;
    provider.push(&projects).await?;
    log::info!("{}: push complete, {} projects", provider.label(), projects.len());
    Ok(projects.len())
}
