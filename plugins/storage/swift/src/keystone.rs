use reqwest::Url;
use serde::{Deserialize, Serialize};

use archive_api::StorageError;

use crate::SwiftSession;

/// Тип сервиса Swift в каталоге Keystone.
const OBJECT_STORE: &str = "object-store";

/// Учётные данные Keystone v2 (`OS_*`).
#[derive(Debug, Clone)]
pub struct SwiftCredentials {
    pub auth_url: String,
    pub username: String,
    pub password: String,
    pub tenant_name: String,
    /// Регион endpoint'а. `None`: первый из каталога.
    pub region: Option<String>,
}

// ── wire ──

#[derive(Serialize)]
struct TokenRequest<'a> {
    auth: AuthBody<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthBody<'a> {
    tenant_name: &'a str,
    password_credentials: PasswordCredentials<'a>,
}

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access: Access,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Access {
    token: Token,
    #[serde(default)]
    service_catalog: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct Token {
    id: String,
}

#[derive(Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

#[derive(Deserialize)]
struct Endpoint {
    #[serde(default)]
    region: Option<String>,
    #[serde(rename = "publicURL")]
    public_url: String,
}

// ── auth ──

/// `POST {auth_url}/tokens` → токен + publicURL сервиса `object-store`.
pub(crate) async fn authenticate(
    http: &reqwest::Client,
    credentials: &SwiftCredentials,
) -> Result<SwiftSession, StorageError> {
    let url = format!("{}/tokens", credentials.auth_url.trim_end_matches('/'));
    let request = TokenRequest {
        auth: AuthBody {
            tenant_name: &credentials.tenant_name,
            password_credentials: PasswordCredentials {
                username: &credentials.username,
                password: &credentials.password,
            },
        },
    };
    let body = serde_json::to_vec(&request)
        .map_err(|e| StorageError::Auth(format!("keystone request: {e}")))?;

    let response = http
        .post(&url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| StorageError::Auth(format!("keystone {url}: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(StorageError::Auth(format!("keystone {url}: {status}")));
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| StorageError::Auth(format!("keystone {url}: {e}")))?;
    let response: TokenResponse = serde_json::from_slice(&body)
        .map_err(|e| StorageError::Auth(format!("keystone response: {e}")))?;

    let session = session_from(response.access, credentials.region.as_deref())?;
    tracing::info!(
        tenant = %credentials.tenant_name,
        storage_url = %session.storage_url,
        "swift: authenticated"
    );
    Ok(session)
}

fn session_from(access: Access, region: Option<&str>) -> Result<SwiftSession, StorageError> {
    let endpoint = access
        .service_catalog
        .into_iter()
        .filter(|entry| entry.kind == OBJECT_STORE)
        .flat_map(|entry| entry.endpoints)
        .find(|endpoint| match region {
            Some(region) => endpoint.region.as_deref() == Some(region),
            None => true,
        })
        .ok_or_else(|| {
            StorageError::Auth(match region {
                Some(region) => format!("no {OBJECT_STORE} endpoint in region '{region}'"),
                None => format!("no {OBJECT_STORE} endpoint in service catalog"),
            })
        })?;

    let storage_url = Url::parse(&endpoint.public_url)
        .map_err(|e| StorageError::Auth(format!("storage URL '{}': {e}", endpoint.public_url)))?;
    Ok(SwiftSession {
        storage_url,
        token: access.token.id,
    })
}
