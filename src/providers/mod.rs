/// Sync providers: where the project list lives beyond local storage

use crate::config::ProviderKey;
use crate::error::Result;
use crate::host::AuthFlow;
use crate::http::HttpClient;
use crate::project::ProjectList;
use crate::storage::{KeyValueStore, Store};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod gdrive;
pub mod local;
pub mod oauth;
pub mod onedrive;

pub use gdrive::GoogleDriveProvider;
pub use local::LocalProvider;
pub use onedrive::OneDriveProvider;

/// Well-known remote file holding the whole project list
pub const REMOTE_FILE_NAME: &str = "linkspace-projects.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub signed_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ProviderStatus {
    pub fn signed_out() -> Self {
        ProviderStatus::default()
    }

    pub fn signed_in(email: Option<String>) -> Self {
        ProviderStatus {
            signed_in: true,
            email,
            label: None,
        }
    }
}

/// The capability every backend offers
#[allow(async_fn_in_trait)]
pub trait SyncProvider {
    fn key(&self) -> ProviderKey;

    fn label(&self) -> &'static str {
        self.key().label()
    }

    /// Never fails: any problem reaching the backend reads as signed out.
    async fn status(&self) -> Result<ProviderStatus>;

    async fn sign_in(&self) -> Result<()>;

    async fn sign_out(&self) -> Result<()>;

    /// Replace the local list with the remote one, if the remote holds a
    /// valid list. Returns the list now stored locally.
    async fn pull(&self) -> Result<ProjectList>;

    /// Overwrite the remote copy with `projects`. Last writer wins.
    async fn push(&self, projects: &ProjectList) -> Result<()>;
}

/// Host services shared by every provider
#[derive(Debug, Clone)]
pub struct SyncContext<K, H, A> {
    pub store: Store<K>,
    pub http: H,
    pub auth: A,
}

impl<K: KeyValueStore, H, A> SyncContext<K, H, A> {
    pub fn new(backend: K, http: H, auth: A) -> Self {
        SyncContext {
            store: Store::new(backend),
            http,
            auth,
        }
    }
}

/// The closed set of backends. [`Provider::resolve`] never falls back to
/// anything but [`LocalProvider`].
pub enum Provider<K, H, A> {
    Local(LocalProvider<K>),
    GoogleDrive(GoogleDriveProvider<K, H, A>),
    OneDrive(OneDriveProvider<K, H, A>),
}

impl<K, H, A> Provider<K, H, A>
where
    K: KeyValueStore + Clone,
    H: HttpClient + Clone,
    A: AuthFlow + Clone,
{
    pub fn resolve(key: ProviderKey, ctx: &SyncContext<K, H, A>) -> Self {
        match key {
            ProviderKey::Local => Provider::Local(LocalProvider::new(ctx.store.clone())),
            ProviderKey::GoogleDrive => Provider::GoogleDrive(GoogleDriveProvider::new(ctx.clone())),
            ProviderKey::OneDrive => Provider::OneDrive(OneDriveProvider::new(ctx.clone())),
        }
    }

    /// Unknown or absent keys resolve to the local provider.
    pub fn resolve_key(key: Option<&str>, ctx: &SyncContext<K, H, A>) -> Self {
        Self::resolve(key.map(ProviderKey::from_key).unwrap_or_default(), ctx)
    }

    /// The provider currently selected in the stored configuration
    pub async fn active(ctx: &SyncContext<K, H, A>) -> Result<Self> {
        let config = ctx.store.provider_config().await?;
        Ok(Self::resolve(config.selected, ctx))
    }
}

impl<K, H, A> SyncProvider for Provider<K, H, A>
where
    K: KeyValueStore,
    H: HttpClient,
    A: AuthFlow,
{
    fn key(&self) -> ProviderKey {
        match self {
            Provider::Local(p) => p.key(),
            Provider::GoogleDrive(p) => p.key(),
            Provider::OneDrive(p) => p.key(),
        }
    }

    async fn status(&self) -> Result<ProviderStatus> {
        match self {
            Provider::Local(p) => p.status().await,
            Provider::GoogleDrive(p) => p.status().await,
            Provider::OneDrive(p) => p.status().await,
        }
    }

    async fn sign_in(&self) -> Result<()> {
        match self {
            Provider::Local(p) => p.sign_in().await,
            Provider::GoogleDrive(p) => p.sign_in().await,
            Provider::OneDrive(p) => p.sign_in().await,
        }
    }

    async fn sign_out(&self) -> Result<()> {
        match self {
            Provider::Local(p) => p.sign_out().await,
            Provider::GoogleDrive(p) => p.sign_out().await,
            Provider::OneDrive(p) => p.sign_out().await,
        }
    }

    async fn pull(&self) -> Result<ProjectList> {
        match self {
            Provider::Local(p) => p.pull().await,
            Provider::GoogleDrive(p) => p.pull().await,
            Provider::OneDrive(p) => p.pull().await,
        }
    }

    async fn push(&self, projects: &ProjectList) -> Result<()> {
        match self {
            Provider::Local(p) => p.push(projects).await,
            Provider::GoogleDrive(p) => p.push(projects).await,
            Provider::OneDrive(p) => p.push(projects).await,
        }
    }
}

/// Decode remote file content. Anything but a JSON array of valid projects
/// with distinct ids is rejected.
pub fn parse_remote_list(body: &str) -> Option<ProjectList> {
    let value: Value = serde_json::from_str(body).ok()?;
    if !value.is_array() {
        return None;
    }
    let list: ProjectList = serde_json::from_value(value).ok()?;
    list.has_unique_ids().then_some(list)
}

/// Store the remote list locally if it is valid, otherwise keep the local
/// list untouched. Returns whichever list is now local.
pub(crate) async fn adopt_remote<K: KeyValueStore>(store: &Store<K>, body: &str) -> Result<ProjectList> {
    match parse_remote_list(body) {
        Some(list) => {
            store.save_projects(&list).await?;
            log::info!("Pulled {} projects", list.len());
            Ok(list)
        }
        None => {
            log::warn!("Ignoring malformed remote project list");
            store.projects().await
        }
    }
}
