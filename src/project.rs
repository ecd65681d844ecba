/// Data structures for Linkspace projects
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Information about a browser tab, as reported by the host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabInfo {
    pub id: i32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub pinned: bool,
}

impl TabInfo {
    pub fn new(id: i32, url: &str, pinned: bool) -> TabInfo {
        TabInfo {
            id,
            url: Some(url.to_string()),
            pinned,
        }
    }
}

/// A saved window: a named, timestamped list of URLs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub created_at: i64,
    pub urls: Vec<String>,
}

impl Project {
    pub fn new(name: String, created_at: i64, urls: Vec<String>) -> Project {
        Project {
            id: Uuid::new_v4(),
            name,
            created_at,
            urls,
        }
    }
}

/// The whole project list. Always read and written as one unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ProjectList {
    pub projects: Vec<Project>,
}

impl ProjectList {
    pub fn new() -> Self {
        ProjectList {
            projects: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Project> {
        self.projects.iter()
    }

    pub fn add_project(&mut self, project: Project) {
        self.projects.push(project);
    }

    pub fn remove_project(&mut self, project_id: &Uuid) -> bool {
        let original_len = self.projects.len();
        self.projects.retain(|p| p.id != *project_id);
        self.projects.len() < original_len
    }

    pub fn get_project(&self, project_id: &Uuid) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == *project_id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.projects.iter().any(|p| p.name == name)
    }

    /// No two entries may share an id.
    pub fn has_unique_ids(&self) -> bool {
        let mut seen = HashSet::new();
        self.projects.iter().all(|p| seen.insert(p.id))
    }
}

impl From<Vec<Project>> for ProjectList {
    fn from(projects: Vec<Project>) -> Self {
        ProjectList { projects }
    }
}

impl<'a> IntoIterator for &'a ProjectList {
    type Item = &'a Project;
    type IntoIter = std::slice::Iter<'a, Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.projects.iter()
    }
}
