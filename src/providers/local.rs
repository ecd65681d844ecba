/// Local-only provider: the project list never leaves extension storage.
use super::{ProviderStatus, SyncProvider};
use crate::config::ProviderKey;
use crate::error::Result;
use crate::project::ProjectList;
use crate::storage::{KeyValueStore, Store};

#[derive(Debug, Clone)]
pub struct LocalProvider<K> {
    store: Store<K>,
}

impl<K: KeyValueStore> LocalProvider<K> {
    pub fn new(store: Store<K>) -> Self {
        LocalProvider { store }
    }
}

impl<K: KeyValueStore> SyncProvider for LocalProvider<K> {
    fn key(&self) -> ProviderKey {
        ProviderKey::Local
    }

    async fn status(&self) -> Result<ProviderStatus> {
        Ok(ProviderStatus {
            signed_in: true,
            email: None,
            label: Some(self.label().to_string()),
        })
    }

    async fn sign_in(&self) -> Result<()> {
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }

    async fn pull(&self) -> Result<ProjectList> {
        self.store.projects().await
    }

    async fn push(&self, projects: &ProjectList) -> Result<()> {
        self.store.save_projects(projects).await
    }
}
