/// User configuration kept in extension storage: sync provider selection
/// and UI theme preference.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a sync backend.
///
/// Parsing is lenient: any unknown key maps to [`ProviderKey::Local`] so an
/// unrecognized selection never routes data to a cloud backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderKey {
    #[default]
    Local,
    GoogleDrive,
    OneDrive,
}

impl ProviderKey {
    pub const ALL: [ProviderKey; 3] = [
        ProviderKey::Local,
        ProviderKey::GoogleDrive,
        ProviderKey::OneDrive,
    ];

    pub fn from_key(key: &str) -> ProviderKey {
        match key {
            "gdrive" => ProviderKey::GoogleDrive,
            "onedrive" => ProviderKey::OneDrive,
            _ => ProviderKey::Local,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            ProviderKey::Local => "local",
            ProviderKey::GoogleDrive => "gdrive",
            ProviderKey::OneDrive => "onedrive",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProviderKey::Local => "Local",
            ProviderKey::GoogleDrive => "Google Drive",
            ProviderKey::OneDrive => "OneDrive",
        }
    }
}

impl From<String> for ProviderKey {
    fn from(key: String) -> Self {
        ProviderKey::from_key(&key)
    }
}

impl From<ProviderKey> for String {
    fn from(key: ProviderKey) -> Self {
        key.as_key().to_string()
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Per-provider OAuth settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Directory tenant hint (OneDrive only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

impl ProviderSettings {
    /// Client ID, if configured and not blank
    pub fn client_id(&self) -> Option<&str> {
        self.client_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub selected: ProviderKey,
    #[serde(default)]
    pub gdrive: ProviderSettings,
    #[serde(default)]
    pub onedrive: ProviderSettings,
}

impl ProviderConfig {
    pub fn settings(&self, key: ProviderKey) -> Option<&ProviderSettings> {
        match key {
            ProviderKey::Local => None,
            ProviderKey::GoogleDrive => Some(&self.gdrive),
            ProviderKey::OneDrive => Some(&self.onedrive),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            selected: ProviderKey::Local,
            gdrive: ProviderSettings::default(),
            onedrive: ProviderSettings::default(),
        }
    }
}

/// UI color scheme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    /// Parse a stored or user-supplied value, coercing anything unknown to `System`.
    pub fn coerce(value: &str) -> Theme {
        match value {
            "light" => Theme::Light,
            "dark" => Theme::Dark,
            _ => Theme::System,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    /// Whether the scheme actually shown is dark.
    pub fn is_dark(&self, system_prefers_dark: bool) -> bool {
        match self {
            Theme::Light => false,
            Theme::Dark => true,
            Theme::System => system_prefers_dark,
        }
    }

    /// The explicit theme that flips the scheme currently shown.
    pub fn toggled(&self, system_prefers_dark: bool) -> Theme {
        if self.is_dark(system_prefers_dark) {
            Theme::Light
        } else {
            Theme::Dark
        }
    }
}
