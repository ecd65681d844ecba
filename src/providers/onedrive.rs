/// OneDrive provider (Microsoft Graph)
///
/// The project list lives in the app's special `approot` folder and is
/// addressed by path, so no search is needed.

use super::oauth::{self, OAuthEndpoints, TokenRecord};
use super::{ProviderStatus, REMOTE_FILE_NAME, SyncContext, SyncProvider, adopt_remote};
use crate::config::{ProviderKey, ProviderSettings};
use crate::error::{LinkspaceError, Result};
use crate::host::AuthFlow;
use crate::http::{HttpClient, HttpRequest};
use crate::project::ProjectList;
use crate::storage::KeyValueStore;
use serde::Deserialize;

const GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";
const LOGIN_URL: &str = "https://login.microsoftonline.com";
const DEFAULT_TENANT: &str = "common";
const SCOPE: &str = "offline_access Files.ReadWrite AppFolder User.Read openid profile email";

#[derive(Debug, Deserialize)]
struct DriveItem {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphUser {
    user_principal_name: Option<String>,
    mail: Option<String>,
}

fn tenant(settings: &ProviderSettings) -> &str {
    settings
        .tenant
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TENANT)
}

pub fn endpoints(tenant: &str) -> OAuthEndpoints {
    OAuthEndpoints {
        provider: ProviderKey::OneDrive,
        authorize_url: format!("{}/{}/oauth2/v2.0/authorize", LOGIN_URL, tenant),
        token_url: format!("{}/{}/oauth2/v2.0/token", LOGIN_URL, tenant),
        scope: SCOPE,
        redirect_path: "onedrive",
        extra_params: &[("response_mode", "query")],
    }
}

fn app_file_url() -> String {
    format!("{}/me/drive/special/approot:/{}", GRAPH_URL, REMOTE_FILE_NAME)
}

fn content_url() -> String {
    format!("{}:/content", app_file_url())
}

pub struct OneDriveProvider<K, H, A> {
    ctx: SyncContext<K, H, A>,
}

impl<K, H, A> OneDriveProvider<K, H, A>
where
    K: KeyValueStore,
    H: HttpClient,
    A: AuthFlow,
{
    pub fn new(ctx: SyncContext<K, H, A>) -> Self {
        OneDriveProvider { ctx }
    }

    async fn interactive_sign_in(&self) -> Result<TokenRecord> {
        let config = self.ctx.store.provider_config().await?;
        let client_id = config.onedrive.client_id().ok_or_else(|| {
            LinkspaceError::Config("OneDrive client ID not configured".to_string())
        })?;
        oauth::sign_in(&self.ctx, &endpoints(tenant(&config.onedrive)), client_id).await
    }

    async fn access_token(&self) -> Result<String> {
        match oauth::stored_access_token(&self.ctx.store, ProviderKey::OneDrive).await? {
            Some(token) => Ok(token),
            None => Ok(self.interactive_sign_in().await?.access_token),
        }
    }

    /// Probe the file by path; create it with an empty list if absent.
    async fn ensure_file(&self, access_token: &str) -> Result<String> {
        let probe = self
            .ctx
            .http
            .send(HttpRequest::get(app_file_url()).bearer(access_token))
            .await?;
        if probe.status == 200 {
            return Ok(probe.json::<DriveItem>()?.id);
        }

        let request = HttpRequest::put(content_url())
            .bearer(access_token)
            .json_body("[]");
        let created: DriveItem = self
            .ctx
            .http
            .send(request)
            .await?
            .error_for_status("OneDrive create")?
            .json()?;
        log::info!("Created {} in OneDrive app folder", REMOTE_FILE_NAME);
        Ok(created.id)
    }
}

impl<K, H, A> SyncProvider for OneDriveProvider<K, H, A>
where
    K: KeyValueStore,
    H: HttpClient,
    A: AuthFlow,
{
    fn key(&self) -> ProviderKey {
        ProviderKey::OneDrive
    }

    async fn status(&self) -> Result<ProviderStatus> {
        let Some(token) = oauth::stored_access_token(&self.ctx.store, ProviderKey::OneDrive).await? else {
            return Ok(ProviderStatus::signed_out());
        };
        let request = HttpRequest::get(format!("{}/me", GRAPH_URL)).bearer(&token);
        let user = match self.ctx.http.send(request).await {
            Ok(response) => response
                .error_for_status("Graph profile")
                .and_then(|r| r.json::<GraphUser>()),
            Err(e) => Err(e),
        };
        match user {
            Ok(user) => Ok(ProviderStatus::signed_in(user.user_principal_name.or(user.mail))),
            Err(e) => {
                log::warn!("OneDrive status check failed: {}", e);
                Ok(ProviderStatus::signed_out())
            }
        }
    }

    async fn sign_in(&self) -> Result<()> {
        self.interactive_sign_in().await.map(|_| ())
    }

    /// Local only; Graph has no simple revoke for these tokens.
    async fn sign_out(&self) -> Result<()> {
        oauth::clear_token(&self.ctx.store, ProviderKey::OneDrive).await?;
        log::info!("Signed out of OneDrive");
        Ok(())
    }

    async fn pull(&self) -> Result<ProjectList> {
        let token = self.access_token().await?;
        let response = self
            .ctx
            .http
            .send(HttpRequest::get(content_url()).bearer(&token))
            .await?;
        if response.status == 404 {
            return self.ctx.store.projects().await;
        }
        let response = response.error_for_status("OneDrive read")?;
        adopt_remote(&self.ctx.store, &response.body).await
    }

    async fn push(&self, projects: &ProjectList) -> Result<()> {
        let token = self.access_token().await?;
        self.ensure_file(&token).await?;
        let url = format!("{}?@microsoft.graph.conflictBehavior=replace", content_url());
        let request = HttpRequest::put(url)
            .bearer(&token)
            .json_body(serde_json::to_string(projects)?);
        self.ctx
            .http
            .send(request)
            .await?
            .error_for_status("OneDrive upload")?;
        log::info!("Pushed {} projects to OneDrive", projects.len());
        Ok(())
    }
}
