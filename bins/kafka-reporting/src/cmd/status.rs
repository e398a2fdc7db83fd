use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use archive_api::FetchError;
use reporting_client::TopicStatus;

use crate::config::Effective;
use crate::env::{self, Env};
use crate::error::CliError;

const HEADERS: [&str; 4] = ["Topic", "Messages", "Earliest", "Latest"];

pub async fn run(eff: &Effective) -> Result<(), CliError> {
    let env = Env::require(&[env::REPORTING])?;
    let client = super::reporting_client(&env, eff)?;

    let topics = client.list(eff.status_concurrency).await?;
    print!("{}", render(&topics));
    Ok(())
}

/// Таблица: topic, число сообщений, самые ранние и поздние timestamp'ы
/// с offset'ами по partition'ам. Topic с ошибкой получает строку `error: …`.
pub fn render(topics: &BTreeMap<String, Result<TopicStatus, FetchError>>) -> String {
    let rows: Vec<[String; 4]> = topics
        .iter()
        .map(|(topic, status)| match status {
            Ok(s) => [
                topic.clone(),
                s.messages.to_string(),
                edge(s.earliest_timestamp, &s.earliest_offsets),
                edge(s.latest_timestamp, &s.latest_offsets),
            ],
            Err(e) => [topic.clone(), "-".into(), format!("error: {e}"), String::new()],
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header = HEADERS.map(String::from);
    let rule = widths.map(|w| "-".repeat(w));
    for row in std::iter::once(&header).chain(std::iter::once(&rule)).chain(&rows) {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

fn edge(timestamp: Option<DateTime<Utc>>, offsets: &[Option<u64>]) -> String {
    let offsets: Vec<String> = offsets
        .iter()
        .map(|o| o.map_or_else(|| "-".to_string(), |o| o.to_string()))
        .collect();
    match timestamp {
        Some(ts) => format!("{} [{}]", ts.format("%Y-%m-%d %H:%M:%S"), offsets.join(",")),
        None => format!("- [{}]", offsets.join(",")),
    }
}
