use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::{RequestBuilder, StatusCode, Url};
use uuid::Uuid;

use archive_api::{FetchError, FetchOffset, LogSource, Page, Record, now_secs};

use crate::retry::{Attempt, RetryPolicy, Sleeper, TokioSleeper, retry};
use crate::wire::{ENVELOPE_VERSION, Envelope, MessagesResponse};

// ═══════════════════════════════════════════════════════════════
//  ClientConfig
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Хост API. Без схемы подставляется `https://`.
    pub server: String,
    pub username: String,
    pub token: String,
    /// `false`: не проверять TLS-сертификат сервера.
    pub https_verify: bool,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(server: &str, username: &str, token: &str) -> Self {
        Self {
            server: server.to_string(),
            username: username.to_string(),
            token: token.to_string(),
            https_verify: true,
            retry: RetryPolicy::default(),
        }
    }

    fn base_url(&self) -> Result<Url, FetchError> {
        let raw = if self.server.starts_with("http://") || self.server.starts_with("https://") {
            self.server.clone()
        } else {
            format!("https://{}", self.server)
        };
        let url = Url::parse(&raw).map_err(|e| FetchError::Config(format!("server '{raw}': {e}")))?;
        if url.cannot_be_a_base() {
            return Err(FetchError::Config(format!("server '{raw}' cannot be a base URL")));
        }
        Ok(url)
    }
}

// ═══════════════════════════════════════════════════════════════
//  ReportingClient
// ═══════════════════════════════════════════════════════════════

/// HTTP-клиент kafka-reporting API.
///
/// Сессия (`session`) генерируется один раз на экземпляр и помечает
/// все отправленные через `put` сообщения.
pub struct ReportingClient {
    http: reqwest::Client,
    base: Url,
    username: String,
    token: String,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    session: Uuid,
    hostname: String,
}

impl ReportingClient {
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let base = config.base_url()?;
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.https_verify)
            .build()
            .map_err(|e| FetchError::Config(format!("HTTP client: {e}")))?;
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            http,
            base,
            username: config.username,
            token: config.token,
            retry: config.retry,
            sleeper: Arc::new(TokioSleeper),
            session: Uuid::new_v4(),
            hostname,
        })
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_session(mut self, session: Uuid) -> Self {
        self.session = session;
        self
    }

    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = hostname.to_string();
        self
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    // ── get ──

    /// Одна выборка страницы сообщений с `offset`.
    pub async fn get(
        &self,
        topic: &str,
        partition: u32,
        offset: FetchOffset,
    ) -> Result<Option<Page>, FetchError> {
        let url = self.url(&[
            "v1",
            "topic",
            topic,
            &partition.to_string(),
            &offset.to_string(),
        ])?;
        let body = self
            .execute(|| self.get_request(&url), StatusCode::OK, &url)
            .await?;
        let response: MessagesResponse = serde_json::from_slice(&body)?;
        let page = page_from(response);
        tracing::debug!(
            topic,
            partition,
            %offset,
            records = page.as_ref().map_or(0, |p| p.records.len()),
            "fetched page"
        );
        Ok(page)
    }

    // ── put ──

    /// Отправить одно сообщение. Успех: только `204 No Content`.
    pub async fn put(
        &self,
        topic: &str,
        schema: &str,
        data: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), FetchError> {
        let url = self.url(&["v1", "topic", topic])?;
        let envelope = self.envelope(schema, data);
        let body = serde_json::to_vec(&[&envelope])?;
        self.execute(
            || {
                self.authorized(self.http.post(url.clone()))
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body.clone())
            },
            StatusCode::NO_CONTENT,
            &url,
        )
        .await?;
        tracing::info!(topic, schema, id = %envelope.id, "message accepted");
        Ok(())
    }

    /// Собрать конверт: копия `data` + `timestamp` (сек) и `hostname`.
    pub fn envelope(
        &self,
        schema: &str,
        data: &serde_json::Map<String, serde_json::Value>,
    ) -> Envelope {
        let mut data = data.clone();
        data.insert("timestamp".into(), now_secs().into());
        data.insert("hostname".into(), self.hostname.clone().into());
        Envelope {
            id: Uuid::new_v4(),
            session: self.session,
            schema: schema.to_string(),
            version: ENVELOPE_VERSION,
            data,
        }
    }

    // ── helpers ──

    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Config(format!("bad base URL {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.token))
    }

    pub(crate) fn get_request(&self, url: &Url) -> RequestBuilder {
        self.authorized(self.http.get(url.clone()))
    }

    /// Выполнить запрос с retry-политикой клиента.
    ///
    /// 4xx: фатально, без задержки. 5xx, прочие неожиданные статусы и
    /// ошибки транспорта: повтор с backoff.
    pub(crate) async fn execute<F>(
        &self,
        build: F,
        expected: StatusCode,
        url: &Url,
    ) -> Result<Bytes, FetchError>
    where
        F: Fn() -> RequestBuilder,
    {
        retry(&self.retry, self.sleeper.as_ref(), |_| {
            let request = build();
            async move {
                let response = match request.send().await {
                    Ok(r) => r,
                    Err(e) => return Attempt::Retry(FetchError::Transport(e.to_string())),
                };
                let status = response.status();
                if status == expected {
                    match response.bytes().await {
                        Ok(body) => Attempt::Done(body),
                        Err(e) => Attempt::Retry(FetchError::Transport(e.to_string())),
                    }
                } else if status.is_client_error() {
                    Attempt::Fail(FetchError::Client {
                        status: status.as_u16(),
                        url: url.to_string(),
                    })
                } else {
                    Attempt::Retry(FetchError::Server {
                        status: status.as_u16(),
                    })
                }
            }
        })
        .await
    }
}

fn page_from(response: MessagesResponse) -> Option<Page> {
    let next_offset = response.messages.last()?.next_offset;
    let records = response
        .messages
        .into_iter()
        .map(|entry| Record(entry.message))
        .collect();
    Some(Page {
        records,
        next_offset,
    })
}

impl LogSource for ReportingClient {
    fn get(
        &self,
        topic: &str,
        partition: u32,
        offset: FetchOffset,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Page>, FetchError>> + Send + '_>> {
        let topic = topic.to_string();
        Box::pin(async move { ReportingClient::get(self, &topic, partition, offset).await })
    }
}
