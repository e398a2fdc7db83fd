//! Хранилище сегментов в OpenStack Swift.
//!
//! Аутентификация через Keystone v2 (пароль + tenant). Токен и storage URL
//! запрашиваются один раз, при первом обращении к контейнеру.

mod keystone;

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use reqwest::{StatusCode, Url};
use tokio::sync::OnceCell;

use archive_api::{
    SegmentId, SegmentStore, StorageError, normalize_prefix, partition_prefix, trailing_offset,
};

pub use keystone::SwiftCredentials;

// ═══════════════════════════════════════════════════════════════
//  SwiftSession
// ═══════════════════════════════════════════════════════════════

/// Результат аутентификации: куда ходить и с каким токеном.
#[derive(Debug, Clone)]
pub struct SwiftSession {
    pub storage_url: Url,
    pub token: String,
}

#[derive(serde::Deserialize)]
struct ObjectEntry {
    name: String,
}

// ═══════════════════════════════════════════════════════════════
//  SwiftStore
// ═══════════════════════════════════════════════════════════════

pub struct SwiftStore {
    http: reqwest::Client,
    credentials: Option<SwiftCredentials>,
    session: OnceCell<SwiftSession>,
    container: String,
    prefix: String,
}

impl SwiftStore {
    /// Store с ленивой аутентификацией в Keystone.
    pub fn new(
        credentials: SwiftCredentials,
        container: &str,
        prefix: &str,
        https_verify: bool,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            http: http_client(https_verify)?,
            credentials: Some(credentials),
            session: OnceCell::new(),
            container: container.to_string(),
            prefix: normalize_prefix(prefix),
        })
    }

    /// Store с готовым storage URL и токеном, без Keystone.
    pub fn with_session(
        storage_url: &str,
        token: &str,
        container: &str,
        prefix: &str,
        https_verify: bool,
    ) -> Result<Self, StorageError> {
        let storage_url = Url::parse(storage_url)
            .map_err(|e| StorageError::Config(format!("storage URL '{storage_url}': {e}")))?;
        Ok(Self {
            http: http_client(https_verify)?,
            credentials: None,
            session: OnceCell::from(SwiftSession {
                storage_url,
                token: token.to_string(),
            }),
            container: container.to_string(),
            prefix: normalize_prefix(prefix),
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    async fn session(&self) -> Result<&SwiftSession, StorageError> {
        self.session
            .get_or_try_init(|| async {
                let credentials = self.credentials.as_ref().ok_or_else(|| {
                    StorageError::Auth("no Keystone credentials configured".into())
                })?;
                keystone::authenticate(&self.http, credentials).await
            })
            .await
    }

    /// `{storage_url}/{container}/{key...}`, каждый компонент кодируется отдельно.
    fn object_url(session: &SwiftSession, container: &str, key: &str) -> Result<Url, StorageError> {
        let mut url = session.storage_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::Config(format!("bad storage URL {}", session.storage_url)))?
            .pop_if_empty()
            .push(container)
            .extend(key.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    async fn put_object(&self, key: &str, content: Bytes) -> Result<(), StorageError> {
        let session = self.session().await?;
        let url = Self::object_url(session, &self.container, key)?;
        let response = self
            .http
            .put(url)
            .header("X-Auth-Token", &session.token)
            .body(content)
            .send()
            .await
            .map_err(|e| StorageError::Io(format!("swift PUT {key}: {e}")))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StorageError::Auth(format!(
                "swift PUT {key}: {}",
                response.status()
            ))),
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(format!(
                "container '{}'",
                self.container
            ))),
            status => Err(StorageError::Io(format!("swift PUT {key}: {status}"))),
        }
    }

    /// Имена всех объектов с префиксом `prefix`, постранично по marker'у.
    pub async fn list_names(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let session = self.session().await?;
        let url = Self::object_url(session, &self.container, "")?;
        let mut names = Vec::new();
        let mut marker = String::new();

        loop {
            let response = self
                .http
                .get(url.clone())
                .header("X-Auth-Token", &session.token)
                .query(&[
                    ("format", "json"),
                    ("prefix", prefix),
                    ("marker", marker.as_str()),
                ])
                .send()
                .await
                .map_err(|e| StorageError::Io(format!("swift list: {e}")))?;

            let status = response.status();
            if status == StatusCode::NO_CONTENT {
                break;
            }
            if status == StatusCode::NOT_FOUND {
                return Err(StorageError::NotFound(format!("container '{}'", self.container)));
            }
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(StorageError::Auth(format!("swift list: {status}")));
            }
            if !status.is_success() {
                return Err(StorageError::Io(format!("swift list: {status}")));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| StorageError::Io(format!("swift list: {e}")))?;
            let page: Vec<ObjectEntry> = serde_json::from_slice(&body)
                .map_err(|e| StorageError::Io(format!("swift list: bad JSON: {e}")))?;
            let Some(last) = page.last() else {
                break;
            };
            marker = last.name.clone();
            tracing::debug!(objects = page.len(), marker = %marker, "swift: listing page");
            names.extend(page.into_iter().map(|e| e.name));
        }

        Ok(names)
    }
}

fn http_client(https_verify: bool) -> Result<reqwest::Client, StorageError> {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(!https_verify)
        .build()
        .map_err(|e| StorageError::Config(format!("HTTP client: {e}")))
}

impl SegmentStore for SwiftStore {
    fn save(
        &self,
        segment: &SegmentId,
        content: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let key = segment.key(&self.prefix);
        Box::pin(async move {
            let bytes = content.len();
            self.put_object(&key, content).await?;
            tracing::debug!(container = %self.container, key = %key, bytes, "swift: object stored");
            Ok(())
        })
    }

    fn latest(
        &self,
        topic: &str,
        partition: u32,
    ) -> Pin<Box<dyn Future<Output = Result<u64, StorageError>> + Send + '_>> {
        let dir = partition_prefix(&self.prefix, topic, partition);
        Box::pin(async move {
            let names = self.list_names(&dir).await?;
            Ok(names
                .iter()
                .filter_map(|name| trailing_offset(name))
                .max()
                .unwrap_or(0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_url_encodes_each_component() {
        let session = SwiftSession {
            storage_url: Url::parse("https://swift.example.org/v1/AUTH_abc").unwrap(),
            token: "t".into(),
        };
        let url = SwiftStore::object_url(
            &session,
            "backups",
            "p/my topic/0/000000000000-000000000009.json.xz",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://swift.example.org/v1/AUTH_abc/backups/p/my%20topic/0/000000000000-000000000009.json.xz"
        );
    }

    #[test]
    fn container_url_has_no_trailing_slash() {
        let session = SwiftSession {
            storage_url: Url::parse("https://swift.example.org/v1/AUTH_abc/").unwrap(),
            token: "t".into(),
        };
        let url = SwiftStore::object_url(&session, "backups", "").unwrap();
        assert_eq!(url.as_str(), "https://swift.example.org/v1/AUTH_abc/backups");
    }

    #[test]
    fn with_session_normalizes_prefix() {
        let store = SwiftStore::with_session("http://127.0.0.1:1/v1/AUTH_x", "t", "c", "archive", true)
            .unwrap();
        assert_eq!(store.prefix(), "archive/");
        assert_eq!(store.container(), "c");
        assert!(SwiftStore::with_session("not a url", "t", "c", "", true).is_err());
    }
}
