/// OAuth2 authorization-code flow with PKCE, shared by the cloud providers
///
/// Sign-in launches the provider's consent page through the browser's
/// identity API, exchanges the returned code for tokens and stores the full
/// token response under the provider's key. Tokens are reused as-is until a
/// provider call fails; there is no refresh.

use super::SyncContext;
use crate::config::ProviderKey;
use crate::error::{LinkspaceError, Result};
use crate::host::AuthFlow;
use crate::http::{HttpClient, HttpRequest};
use crate::pkce::PkceChallenge;
use crate::storage::{KeyValueStore, Store};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use url::Url;

/// Token response as returned by the provider.
///
/// Only `access_token` is interpreted; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenRecord {
    pub fn new(access_token: &str) -> Self {
        TokenRecord {
            access_token: access_token.to_string(),
            refresh_token: None,
            expires_in: None,
            extra: Map::new(),
        }
    }
}

/// At most one token record per provider
pub type TokenStore = BTreeMap<ProviderKey, TokenRecord>;

/// Where and how a provider runs its authorization flow
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthEndpoints {
    pub provider: ProviderKey,
    pub authorize_url: String,
    pub token_url: String,
    pub scope: &'static str,
    pub redirect_path: &'static str,
    pub extra_params: &'static [(&'static str, &'static str)],
}

/// Authorization request URL carrying the PKCE challenge
pub fn authorization_url(
    endpoints: &OAuthEndpoints,
    client_id: &str,
    redirect_uri: &str,
    challenge: &str,
) -> Result<Url> {
    let mut url = Url::parse(&endpoints.authorize_url)?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", endpoints.scope);
        for (name, value) in endpoints.extra_params {
            query.append_pair(name, value);
        }
        query
            .append_pair("code_challenge", challenge)
            .append_pair("code_challenge_method", PkceChallenge::METHOD);
    }
    Ok(url)
}

/// Pull the authorization code out of the final redirect URL.
pub fn extract_code(redirect: &str) -> Result<String> {
    let url = Url::parse(redirect)?;
    let mut code = None;
    let mut error = None;
    for (name, value) in url.query_pairs() {
        match name.as_ref() {
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }
    match (code, error) {
        (Some(code), _) => Ok(code),
        (None, Some(error)) => Err(LinkspaceError::Authorization(error)),
        (None, None) => Err(LinkspaceError::Authorization(
            "No authorization code".to_string(),
        )),
    }
}

/// Run the interactive flow and store the resulting tokens, replacing any
/// previous record for this provider. Nothing is retried.
pub async fn sign_in<K, H, A>(
    ctx: &SyncContext<K, H, A>,
    endpoints: &OAuthEndpoints,
    client_id: &str,
) -> Result<TokenRecord>
where
    K: KeyValueStore,
    H: HttpClient,
    A: AuthFlow,
{
    let redirect_uri = ctx.auth.redirect_url(endpoints.redirect_path);
    let pkce = PkceChallenge::generate()?;
    let url = authorization_url(endpoints, client_id, &redirect_uri, &pkce.challenge)?;

    log::info!("Starting {} sign-in", endpoints.provider.label());
    let Some(redirect) = ctx.auth.launch(url.as_str(), true).await? else {
        return Err(LinkspaceError::Authorization(
            "No authorization code".to_string(),
        ));
    };
    let code = extract_code(&redirect)?;

    let request = HttpRequest::post(endpoints.token_url.as_str()).form([
        ("client_id", client_id),
        ("code", code.as_str()),
        ("code_verifier", pkce.verifier.as_str()),
        ("grant_type", "authorization_code"),
        ("redirect_uri", redirect_uri.as_str()),
    ]);
    let token: TokenRecord = ctx
        .http
        .send(request)
        .await?
        .error_for_status("Token exchange")?
        .json()?;

    let mut tokens = ctx.store.tokens().await?;
    tokens.insert(endpoints.provider, token.clone());
    ctx.store.set_tokens(&tokens).await?;
    log::info!("Signed in to {}", endpoints.provider.label());
    Ok(token)
}

/// Stored access token, without any expiry check
pub async fn stored_access_token<K: KeyValueStore>(
    store: &Store<K>,
    provider: ProviderKey,
) -> Result<Option<String>> {
    let tokens = store.tokens().await?;
    Ok(tokens
        .get(&provider)
        .map(|t| t.access_token.clone())
        .filter(|t| !t.is_empty()))
}

/// Drop the provider's token record. Returns the removed record.
pub async fn clear_token<K: KeyValueStore>(
    store: &Store<K>,
    provider: ProviderKey,
) -> Result<Option<TokenRecord>> {
    let mut tokens = store.tokens().await?;
    let removed = tokens.remove(&provider);
    store.set_tokens(&tokens).await?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::pkce::challenge_for;
    use crate::testing::{FakeAuth, MockHttp, MemoryStore};
    use futures::executor::block_on;
    use std::collections::HashMap;

    fn endpoints() -> OAuthEndpoints {
        OAuthEndpoints {
            provider: ProviderKey::GoogleDrive,
            authorize_url: "https://auth.example/authorize".to_string(),
            token_url: "https://auth.example/token".to_string(),
            scope: "files openid",
            redirect_path: "oauth2",
            extra_params: &[("prompt", "consent")],
        }
    }

    fn query_map(url: &str) -> HashMap<String, String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn form_map(body: &str) -> HashMap<String, String> {
        url::form_urlencoded::parse(body.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_authorization_url_parameters() {
        let url = authorization_url(&endpoints(), "client-1", "https://ext.example/oauth2", "chal").unwrap();
        let query = query_map(url.as_str());

        assert_eq!(url.host_str(), Some("auth.example"));
        assert_eq!(query["client_id"], "client-1");
        assert_eq!(query["redirect_uri"], "https://ext.example/oauth2");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["scope"], "files openid");
        assert_eq!(query["prompt"], "consent");
        assert_eq!(query["code_challenge"], "chal");
        assert_eq!(query["code_challenge_method"], "S256");
    }

    #[test]
    fn test_extract_code() {
        assert_eq!(
            extract_code("https://ext.example/oauth2?code=abc%2F123&scope=x").unwrap(),
            "abc/123"
        );
        assert!(matches!(
            extract_code("https://ext.example/oauth2?error=access_denied"),
            Err(LinkspaceError::Authorization(e)) if e == "access_denied"
        ));
        assert!(matches!(
            extract_code("https://ext.example/oauth2"),
            Err(LinkspaceError::Authorization(_))
        ));
        assert!(matches!(
            extract_code("https://ext.example/oauth2?code="),
            Err(LinkspaceError::Authorization(_))
        ));
    }

    #[test]
    fn test_sign_in_exchanges_code_with_verifier() {
        block_on(async {
            let http = MockHttp::new(|req| {
                assert_eq!(req.url, "https://auth.example/token");
                HttpResponse::new(200, r#"{"access_token":"at-1","refresh_token":"rt-1","token_type":"Bearer"}"#)
            });
            let auth = FakeAuth::returning_code("the-code");
            let ctx = SyncContext::new(MemoryStore::new(), http.clone(), auth.clone());

            let token = sign_in(&ctx, &endpoints(), "client-1").await.unwrap();

            assert_eq!(token.access_token, "at-1");
            assert_eq!(token.refresh_token.as_deref(), Some("rt-1"));
            assert_eq!(token.extra["token_type"], "Bearer");

            let launched = auth.launched();
            let challenge = query_map(&launched[0])["code_challenge"].clone();
            let form = form_map(http.requests()[0].body.as_deref().unwrap());
            assert_eq!(form["code"], "the-code");
            assert_eq!(form["grant_type"], "authorization_code");
            assert_eq!(form["client_id"], "client-1");
            assert_eq!(form["redirect_uri"], auth.redirect_url("oauth2"));
            assert_eq!(challenge_for(&form["code_verifier"]), challenge);

            let stored = ctx.store.tokens().await.unwrap();
            assert_eq!(stored.get(&ProviderKey::GoogleDrive), Some(&token));
        });
    }

    #[test]
    fn test_sign_in_replaces_previous_record() {
        block_on(async {
            let http = MockHttp::new(|_| HttpResponse::new(200, r#"{"access_token":"fresh"}"#));
            let ctx = SyncContext::new(MemoryStore::new(), http, FakeAuth::returning_code("c"));
            let mut tokens = TokenStore::new();
            let mut old = TokenRecord::new("stale");
            old.refresh_token = Some("old-refresh".to_string());
            tokens.insert(ProviderKey::GoogleDrive, old);
            tokens.insert(ProviderKey::OneDrive, TokenRecord::new("other"));
            ctx.store.set_tokens(&tokens).await.unwrap();

            sign_in(&ctx, &endpoints(), "client-1").await.unwrap();

            let stored = ctx.store.tokens().await.unwrap();
            assert_eq!(stored[&ProviderKey::GoogleDrive], TokenRecord::new("fresh"));
            assert_eq!(stored[&ProviderKey::OneDrive], TokenRecord::new("other"));
        });
    }

    #[test]
    fn test_dismissed_flow_is_authorization_error() {
        block_on(async {
            let http = MockHttp::new(|_| panic!("no token exchange expected"));
            let ctx = SyncContext::new(MemoryStore::new(), http, FakeAuth::dismissed());

            let err = sign_in(&ctx, &endpoints(), "client-1").await.unwrap_err();

            assert!(matches!(err, LinkspaceError::Authorization(_)));
            assert!(ctx.store.tokens().await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_failed_token_exchange_is_http_error() {
        block_on(async {
            let http = MockHttp::new(|_| HttpResponse::new(400, r#"{"error":"invalid_grant"}"#));
            let ctx = SyncContext::new(MemoryStore::new(), http, FakeAuth::returning_code("c"));

            let err = sign_in(&ctx, &endpoints(), "client-1").await.unwrap_err();

            assert!(matches!(err, LinkspaceError::Http { status: 400, .. }));
            assert!(ctx.store.tokens().await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_clear_token_only_touches_one_provider() {
        block_on(async {
            let store = Store::new(MemoryStore::new());
            let mut tokens = TokenStore::new();
            tokens.insert(ProviderKey::GoogleDrive, TokenRecord::new("g"));
            tokens.insert(ProviderKey::OneDrive, TokenRecord::new("o"));
            store.set_tokens(&tokens).await.unwrap();

            let removed = clear_token(&store, ProviderKey::GoogleDrive).await.unwrap();

            assert_eq!(removed, Some(TokenRecord::new("g")));
            assert_eq!(stored_access_token(&store, ProviderKey::GoogleDrive).await.unwrap(), None);
            assert_eq!(
                stored_access_token(&store, ProviderKey::OneDrive).await.unwrap().as_deref(),
                Some("o")
            );
        });
    }
}
