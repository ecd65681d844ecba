/// Google Drive provider
///
/// The project list is a single JSON file in the Drive app-data folder,
/// located by name search on every call.

use super::oauth::{self, OAuthEndpoints, TokenRecord};
use super::{ProviderStatus, REMOTE_FILE_NAME, SyncContext, SyncProvider, adopt_remote};
use crate::config::ProviderKey;
use crate::error::{LinkspaceError, Result};
use crate::host::AuthFlow;
use crate::http::{HttpClient, HttpRequest};
use crate::project::ProjectList;
use crate::storage::KeyValueStore;
use serde::Deserialize;
use url::Url;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";

const SCOPE: &str =
    "https://www.googleapis.com/auth/drive.appdata https://www.googleapis.com/auth/userinfo.email openid";
const MULTIPART_BOUNDARY: &str = "-------314159265358979323846";

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
}

pub fn endpoints() -> OAuthEndpoints {
    OAuthEndpoints {
        provider: ProviderKey::GoogleDrive,
        authorize_url: AUTH_URL.to_string(),
        token_url: TOKEN_URL.to_string(),
        scope: SCOPE,
        redirect_path: "oauth2",
        extra_params: &[("access_type", "offline"), ("prompt", "consent")],
    }
}

fn search_url() -> Result<Url> {
    let query = format!("name = '{}' and trashed = false", REMOTE_FILE_NAME);
    Ok(Url::parse_with_params(
        FILES_URL,
        &[
            ("q", query.as_str()),
            ("spaces", "appDataFolder"),
            ("fields", "files(id,name)"),
        ],
    )?)
}

/// Metadata part placing the file in app data, followed by an empty list.
fn multipart_body() -> String {
    let metadata = serde_json::json!({
        "name": REMOTE_FILE_NAME,
        "parents": ["appDataFolder"],
    });
    format!(
        "\r\n--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\
         \r\n--{b}\r\nContent-Type: application/json\r\n\r\n[]\
         \r\n--{b}--",
        b = MULTIPART_BOUNDARY,
        metadata = metadata,
    )
}

pub struct GoogleDriveProvider<K, H, A> {
    ctx: SyncContext<K, H, A>,
}

impl<K, H, A> GoogleDriveProvider<K, H, A>
where
    K: KeyValueStore,
    H: HttpClient,
    A: AuthFlow,
{
    pub fn new(ctx: SyncContext<K, H, A>) -> Self {
        GoogleDriveProvider { ctx }
    }

    async fn interactive_sign_in(&self) -> Result<TokenRecord> {
        let config = self.ctx.store.provider_config().await?;
        let client_id = config.gdrive.client_id().ok_or_else(|| {
            LinkspaceError::Config("Google Drive client ID not configured".to_string())
        })?;
        oauth::sign_in(&self.ctx, &endpoints(), client_id).await
    }

    async fn access_token(&self) -> Result<String> {
        match oauth::stored_access_token(&self.ctx.store, ProviderKey::GoogleDrive).await? {
            Some(token) => Ok(token),
            None => Ok(self.interactive_sign_in().await?.access_token),
        }
    }

    async fn find_file(&self, access_token: &str) -> Result<Option<String>> {
        let request = HttpRequest::get(search_url()?.as_str()).bearer(access_token);
        let found: DriveFileList = self
            .ctx
            .http
            .send(request)
            .await?
            .error_for_status("Drive search")?
            .json()?;
        Ok(found.files.into_iter().next().map(|f| f.id))
    }

    async fn create_file(&self, access_token: &str) -> Result<String> {
        let url = format!("{}?uploadType=multipart&fields=id", UPLOAD_URL);
        let request = HttpRequest::post(url).bearer(access_token).body(
            &format!("multipart/related; boundary={}", MULTIPART_BOUNDARY),
            multipart_body(),
        );
        let created: DriveFile = self
            .ctx
            .http
            .send(request)
            .await?
            .error_for_status("Drive create")?
            .json()?;
        log::info!("Created {} in Drive app data", REMOTE_FILE_NAME);
        Ok(created.id)
    }

    async fn ensure_file(&self, access_token: &str) -> Result<String> {
        match self.find_file(access_token).await? {
            Some(id) => Ok(id),
            None => self.create_file(access_token).await,
        }
    }
}

impl<K, H, A> SyncProvider for GoogleDriveProvider<K, H, A>
where
    K: KeyValueStore,
    H: HttpClient,
    A: AuthFlow,
{
    fn key(&self) -> ProviderKey {
        ProviderKey::GoogleDrive
    }

    async fn status(&self) -> Result<ProviderStatus> {
        let Some(token) = oauth::stored_access_token(&self.ctx.store, ProviderKey::GoogleDrive).await? else {
            return Ok(ProviderStatus::signed_out());
        };
        let request = HttpRequest::get(USERINFO_URL).bearer(&token);
        let user = match self.ctx.http.send(request).await {
            Ok(response) => response
                .error_for_status("Userinfo")
                .and_then(|r| r.json::<UserInfo>()),
            Err(e) => Err(e),
        };
        match user {
            Ok(user) => Ok(ProviderStatus::signed_in(user.email)),
            Err(e) => {
                log::warn!("Google Drive status check failed: {}", e);
                Ok(ProviderStatus::signed_out())
            }
        }
    }

    async fn sign_in(&self) -> Result<()> {
        self.interactive_sign_in().await.map(|_| ())
    }

    async fn sign_out(&self) -> Result<()> {
        let removed = oauth::clear_token(&self.ctx.store, ProviderKey::GoogleDrive).await?;
        if let Some(token) = removed {
            let url = Url::parse_with_params(REVOKE_URL, &[("token", token.access_token.as_str())])?;
            match self.ctx.http.send(HttpRequest::post(url.as_str())).await {
                Ok(response) if response.is_success() => log::debug!("Revoked Google token"),
                Ok(response) => log::warn!("Token revoke answered HTTP {}", response.status),
                Err(e) => log::warn!("Token revoke failed: {}", e),
            }
        }
        log::info!("Signed out of Google Drive");
        Ok(())
    }

    async fn pull(&self) -> Result<ProjectList> {
        let token = self.access_token().await?;
        let Some(id) = self.find_file(&token).await? else {
            return self.ctx.store.projects().await;
        };
        let request = HttpRequest::get(format!("{}/{}?alt=media", FILES_URL, id)).bearer(&token);
        let response = self
            .ctx
            .http
            .send(request)
            .await?
            .error_for_status("Drive read")?;
        adopt_remote(&self.ctx.store, &response.body).await
    }

    async fn push(&self, projects: &ProjectList) -> Result<()> {
        let token = self.access_token().await?;
        let id = self.ensure_file(&token).await?;
        let request = HttpRequest::patch(format!("{}/{}?uploadType=media", UPLOAD_URL, id))
            .bearer(&token)
            .json_body(serde_json::to_string(projects)?);
        self.ctx
            .http
            .send(request)
            .await?
            .error_for_status("Drive upload")?;
        log::info!("Pushed {} projects to Google Drive", projects.len());
        Ok(())
    }
}
