use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::StatusCode;

use archive_api::{FetchError, FetchOffset};

use crate::client::ReportingClient;
use crate::wire::{TopicResponse, TopicsResponse};

/// Сводка по topic'у для отчёта о состоянии.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicStatus {
    /// Σ (latest − earliest) по всем partition'ам.
    pub messages: u64,
    pub earliest_timestamp: Option<DateTime<Utc>>,
    pub latest_timestamp: Option<DateTime<Utc>>,
    /// Индекс: id partition'а. `None` для пустых partition'ов.
    pub earliest_offsets: Vec<Option<u64>>,
    pub latest_offsets: Vec<Option<u64>>,
}

impl ReportingClient {
    /// Метаданные всех topic'ов.
    ///
    /// Topic'и опрашиваются параллельно, не более `concurrency` одновременно.
    /// Ошибка одного topic'а не отменяет остальные.
    pub async fn list(
        &self,
        concurrency: usize,
    ) -> Result<BTreeMap<String, Result<TopicStatus, FetchError>>, FetchError> {
        let url = self.url(&["v1", "topic"])?;
        let body = self
            .execute(|| self.get_request(&url), StatusCode::OK, &url)
            .await?;
        let TopicsResponse { topics } = serde_json::from_slice(&body)?;
        tracing::debug!(topics = topics.len(), concurrency, "collecting topic metadata");

        let statuses: Vec<(String, Result<TopicStatus, FetchError>)> =
            futures::stream::iter(topics.into_iter().map(|topic| async move {
                let status = self.topic_status(&topic).await;
                if let Err(e) = &status {
                    tracing::warn!(topic = %topic, error = %e, "topic metadata failed");
                }
                (topic, status)
            }))
            .buffered(concurrency.max(1))
            .collect()
            .await;

        Ok(statuses.into_iter().collect())
    }

    /// Метаданные одного topic'а.
    pub async fn topic_status(&self, topic: &str) -> Result<TopicStatus, FetchError> {
        let url = self.url(&["v1", "topic", topic])?;
        let body = self
            .execute(|| self.get_request(&url), StatusCode::OK, &url)
            .await?;
        let response: TopicResponse = serde_json::from_slice(&body)?;

        // partition'ы нумеруются с 0 без пропусков: id < числа partition'ов
        let width = response.partition.len();
        let mut partitions = Vec::with_capacity(width);
        for (id, offsets) in response.partition {
            let parsed = id.parse::<u32>().ok().filter(|n| (*n as usize) < width);
            let Some(parsed) = parsed else {
                return Err(FetchError::Decode(format!(
                    "topic '{topic}': bad partition id '{id}' ({width} partitions)"
                )));
            };
            partitions.push((parsed, offsets));
        }

        let mut status = TopicStatus {
            earliest_offsets: vec![None; width],
            latest_offsets: vec![None; width],
            ..TopicStatus::default()
        };

        for (id, offsets) in partitions {
            let size = offsets.latest_offset.saturating_sub(offsets.earliest_offset);
            status.messages += size;
            if size == 0 {
                continue;
            }

            status.earliest_offsets[id as usize] = Some(offsets.earliest_offset);
            let first = self
                .first_timestamp(topic, id, FetchOffset::Absolute(offsets.earliest_offset))
                .await?;
            status.earliest_timestamp = earlier(status.earliest_timestamp, first);

            status.latest_offsets[id as usize] = Some(offsets.latest_offset);
            let last = self.first_timestamp(topic, id, FetchOffset::LATEST).await?;
            status.latest_timestamp = later(status.latest_timestamp, last);
        }

        Ok(status)
    }

    async fn first_timestamp(
        &self,
        topic: &str,
        partition: u32,
        offset: FetchOffset,
    ) -> Result<Option<DateTime<Utc>>, FetchError> {
        let page = self.get(topic, partition, offset).await?;
        Ok(page
            .and_then(|p| p.records.first().and_then(|r| r.timestamp_ms()))
            .and_then(DateTime::from_timestamp_millis))
    }
}

fn earlier(current: Option<DateTime<Utc>>, candidate: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn later(current: Option<DateTime<Utc>>, candidate: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(ms: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(ms)
    }

    #[test]
    fn earlier_and_later_ignore_missing() {
        assert_eq!(earlier(None, ts(5)), ts(5));
        assert_eq!(earlier(ts(5), None), ts(5));
        assert_eq!(earlier(ts(5), ts(3)), ts(3));
        assert_eq!(later(ts(5), ts(3)), ts(5));
        assert_eq!(later(None, None), None);
    }
}
