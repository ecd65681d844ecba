/// Bookmark import/export shared by the popup and options pages
use crate::error::Result;
use crate::project::{Project, ProjectList};
use crate::storage::{KeyValueStore, Store};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Folder that holds exported projects
pub const FOLDER_TITLE: &str = "Link Space";

const IMPORTED_NAME: &str = "Imported";

/// "Other Bookmarks", then "Bookmarks Bar"
const PREFERRED_ROOTS: [&str; 2] = ["2", "1"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkNode {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BookmarkNode>>,
}

impl BookmarkNode {
    pub fn is_folder(&self) -> bool {
        self.url.is_none()
    }
}

/// A folder with its slash-separated path from the root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkFolder {
    pub id: String,
    pub path: String,
}

/// `chrome.bookmarks`
#[allow(async_fn_in_trait)]
pub trait BookmarkHost {
    /// `None` if the node does not exist.
    async fn get(&self, id: &str) -> Result<Option<BookmarkNode>>;

    async fn tree(&self) -> Result<Vec<BookmarkNode>>;

    async fn search_title(&self, title: &str) -> Result<Vec<BookmarkNode>>;

    async fn children(&self, id: &str) -> Result<Vec<BookmarkNode>>;

    async fn create(&self, parent_id: &str, title: &str, url: Option<&str>) -> Result<BookmarkNode>;

    async fn remove(&self, id: &str) -> Result<()>;
}

async fn root_folder_id<B: BookmarkHost>(host: &B) -> Result<String> {
    for id in PREFERRED_ROOTS {
        if let Ok(Some(_)) = host.get(id).await {
            return Ok(id.to_string());
        }
    }
    let tree = host.tree().await?;
    Ok(tree
        .first()
        .and_then(|root| root.children.as_ref())
        .and_then(|children| children.first())
        .map(|node| node.id.clone())
        .unwrap_or_else(|| "1".to_string()))
}

pub async fn find_or_create_folder<B: BookmarkHost>(host: &B) -> Result<String> {
    let candidates = host.search_title(FOLDER_TITLE).await?;
    if let Some(folder) = candidates
        .iter()
        .find(|n| n.is_folder() && n.title == FOLDER_TITLE)
    {
        return Ok(folder.id.clone());
    }
    let parent_id = root_folder_id(host).await?;
    let created = host.create(&parent_id, FOLDER_TITLE, None).await?;
    log::info!("Created bookmark folder {}", FOLDER_TITLE);
    Ok(created.id)
}

/// Bookmark title for a URL: its hostname, or the URL itself if it has none
pub fn bookmark_title(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

/// Write the project as a subfolder of the Link Space folder, replacing the
/// contents of a same-named subfolder. Returns the subfolder id.
pub async fn export_project<B: BookmarkHost>(host: &B, project: &Project) -> Result<String> {
    let parent_id = find_or_create_folder(host).await?;
    let children = host.children(&parent_id).await?;
    let existing = children
        .iter()
        .find(|c| c.is_folder() && c.title == project.name);

    let folder_id = match existing {
        Some(folder) => {
            for child in host.children(&folder.id).await? {
                host.remove(&child.id).await?;
            }
            folder.id.clone()
        }
        None => host.create(&parent_id, &project.name, None).await?.id,
    };

    for url in &project.urls {
        if let Err(e) = host.create(&folder_id, &bookmark_title(url), Some(url)).await {
            log::warn!("Skipped bookmark for {}: {}", url, e);
        }
    }
    Ok(folder_id)
}

/// Export one stored project. `None` if no project has that id.
pub async fn export_saved_project<B, K>(host: &B, store: &Store<K>, project_id: &Uuid) -> Result<Option<String>>
where
    B: BookmarkHost,
    K: KeyValueStore,
{
    let projects = store.projects().await?;
    match projects.get_project(project_id) {
        Some(project) => Ok(Some(export_project(host, project).await?)),
        None => {
            log::warn!("No project {} to export", project_id);
            Ok(None)
        }
    }
}

pub async fn export_all<B: BookmarkHost>(host: &B, projects: &ProjectList) -> Result<usize> {
    for project in projects {
        export_project(host, project).await?;
    }
    log::info!("Exported {} projects to bookmarks", projects.len());
    Ok(projects.len())
}

fn collect_folders(nodes: &[BookmarkNode], path: &str, out: &mut Vec<BookmarkFolder>) {
    for node in nodes.iter().filter(|n| n.is_folder()) {
        let next_path = if path.is_empty() {
            node.title.clone()
        } else {
            format!("{}/{}", path, node.title)
        };
        if !node.title.is_empty() {
            out.push(BookmarkFolder {
                id: node.id.clone(),
                path: next_path.clone(),
            });
        }
        if let Some(children) = &node.children {
            collect_folders(children, &next_path, out);
        }
    }
}

/// Every titled folder in the tree, deduplicated by id and sorted by path
pub async fn list_folders<B: BookmarkHost>(host: &B) -> Result<Vec<BookmarkFolder>> {
    let tree = host.tree().await?;
    let mut folders = Vec::new();
    collect_folders(&tree, "", &mut folders);

    let mut seen = HashSet::new();
    folders.retain(|f| seen.insert(f.id.clone()));
    folders.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(folders)
}

/// Untitled folders import as "Imported".
fn project_name(folder_title: &str) -> String {
    match folder_title.trim() {
        "" => IMPORTED_NAME.to_string(),
        title => title.to_string(),
    }
}

/// Import a bookmark folder as projects.
///
/// Bookmarks directly inside the folder become one project named after the
/// folder; each immediate subfolder holding bookmarks becomes another. Names
/// already in the list are skipped. Returns how many projects were added.
pub async fn import_folder<B, K>(host: &B, store: &Store<K>, folder_id: &str, now: i64) -> Result<usize>
where
    B: BookmarkHost,
    K: KeyValueStore,
{
    let children = host.children(folder_id).await?;
    let mut projects = store.projects().await?;
    let mut names: HashSet<String> = projects.iter().map(|p| p.name.clone()).collect();
    let mut imported = 0;

    let direct: Vec<String> = children.iter().filter_map(|n| n.url.clone()).collect();
    if !direct.is_empty() {
        let title = host.get(folder_id).await?.map(|f| f.title).unwrap_or_default();
        let name = project_name(&title);
        if names.insert(name.clone()) {
            projects.add_project(Project::new(name, now, direct));
            imported += 1;
        }
    }

    for folder in children.iter().filter(|n| n.is_folder()) {
        let urls: Vec<String> = host
            .children(&folder.id)
            .await?
            .into_iter()
            .filter_map(|k| k.url)
            .collect();
        let name = project_name(&folder.title);
        if urls.is_empty() || !names.insert(name.clone()) {
            continue;
        }
        projects.add_project(Project::new(name, now, urls));
        imported += 1;
    }

    if imported > 0 {
        store.save_projects(&projects).await?;
    }
    log::info!("Imported {} projects from bookmarks", imported);
    Ok(imported)
}
