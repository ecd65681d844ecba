/// Namespaced key-value storage over chrome.storage.local
///
/// Every entity lives under its own key and is replaced whole on write.
/// There is no locking across extension contexts: a read-modify-write in the
/// popup can race one in the background worker, and the last write wins.
///
/// Lists and maps are decoded entry by entry. An undecodable entry is dropped
/// on its own so the next write never discards the readable ones.
use crate::config::{ProviderConfig, ProviderKey, Theme};
use crate::error::Result;
use crate::project::ProjectList;
use crate::providers::oauth::{TokenRecord, TokenStore};
use crate::windows::OpenWindowMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const PROJECTS_KEY: &str = "linkspace:projects:v1";
pub const PROVIDER_CONFIG_KEY: &str = "linkspace:provider:config:v1";
pub const TOKENS_KEY: &str = "linkspace:tokens:v1";
pub const THEME_KEY: &str = "linkspace:ui:theme:v1";
pub const OPEN_MAP_KEY: &str = "linkspace:openMap:v1";

/// Raw access to the host's persistent store.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Returns `None` when the key is absent.
    async fn get_raw(&self, key: &str) -> Result<Option<Value>>;

    async fn set_raw(&self, key: &str, value: Value) -> Result<()>;
}

/// Typed accessors for each stored entity.
#[derive(Debug, Clone)]
pub struct Store<K> {
    backend: K,
}

impl<K: KeyValueStore> Store<K> {
    pub fn new(backend: K) -> Self {
        Store { backend }
    }

    pub fn backend(&self) -> &K {
        &self.backend
    }

    async fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let Some(raw) = self.backend.get_raw(key).await? else {
            return Ok(T::default());
        };
        if raw.is_null() {
            return Ok(T::default());
        }
        match serde_json::from_value(raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                log::warn!("Ignoring unreadable value under {}: {}", key, e);
                Ok(T::default())
            }
        }
    }

    /// Entries of a stored JSON array that decode as `T`.
    async fn get_entries<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let items = match self.backend.get_raw(key).await? {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => {
                log::warn!("Ignoring non-list value under {}", key);
                return Ok(Vec::new());
            }
        };
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value(item) {
                Ok(entry) => entries.push(entry),
                Err(e) => log::warn!("Dropping unreadable entry under {}: {}", key, e),
            }
        }
        Ok(entries)
    }

    async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_value(value)?;
        self.backend.set_raw(key, raw).await
    }

    pub async fn projects(&self) -> Result<ProjectList> {
        Ok(ProjectList::from(self.get_entries(PROJECTS_KEY).await?))
    }

    pub async fn save_projects(&self, projects: &ProjectList) -> Result<()> {
        self.set(PROJECTS_KEY, projects).await
    }

    pub async fn provider_config(&self) -> Result<ProviderConfig> {
        self.get_or_default(PROVIDER_CONFIG_KEY).await
    }

    pub async fn set_provider_config(&self, config: &ProviderConfig) -> Result<()> {
        self.set(PROVIDER_CONFIG_KEY, config).await
    }

    /// Records under unknown provider keys or with an unreadable shape are
    /// skipped.
    pub async fn tokens(&self) -> Result<TokenStore> {
        let records = match self.backend.get_raw(TOKENS_KEY).await? {
            Some(Value::Object(records)) => records,
            None | Some(Value::Null) => return Ok(TokenStore::new()),
            Some(_) => {
                log::warn!("Ignoring non-object value under {}", TOKENS_KEY);
                return Ok(TokenStore::new());
            }
        };
        let mut tokens = TokenStore::new();
        for (key, record) in records {
            let Some(provider) = ProviderKey::ALL.into_iter().find(|p| p.as_key() == key) else {
                log::warn!("Dropping token for unknown provider {}", key);
                continue;
            };
            match serde_json::from_value::<TokenRecord>(record) {
                Ok(record) => {
                    tokens.insert(provider, record);
                }
                Err(e) => log::warn!("Dropping unreadable token for {}: {}", key, e),
            }
        }
        Ok(tokens)
    }

    pub async fn set_tokens(&self, tokens: &TokenStore) -> Result<()> {
        self.set(TOKENS_KEY, tokens).await
    }

    pub async fn theme(&self) -> Result<Theme> {
        self.get_or_default(THEME_KEY).await
    }

    /// Values outside `light | dark | system` are stored as `system`.
    pub async fn set_theme(&self, theme: &str) -> Result<Theme> {
        let value = Theme::coerce(theme);
        self.set(THEME_KEY, &value).await?;
        Ok(value)
    }

    pub async fn open_map(&self) -> Result<OpenWindowMap> {
        Ok(OpenWindowMap::from(self.get_entries(OPEN_MAP_KEY).await?))
    }

    pub async fn set_open_map(&self, map: &OpenWindowMap) -> Result<()> {
        self.set(OPEN_MAP_KEY, map).await
    }
}
