use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use archive_engine::StreamOptions;
use reporting_client::RetryPolicy;

use crate::error::CliError;

/// Конфиг по умолчанию; только его отсутствие допустимо.
pub const DEFAULT_CONFIG_PATH: &str = "kafka-reporting.toml";

// ═══════════════════════════════════════════════════════════════
//  CLI
// ═══════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "kafka-reporting", about = "Клиент kafka-reporting API и архиватор topic'ов")]
pub struct Cli {
    /// Путь к TOML конфиг файлу (необязателен)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH, env = "KAFKA_REPORTING_CONFIG")]
    pub config: String,

    /// Не проверять TLS-сертификат API
    #[arg(long, global = true)]
    pub insecure: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Выгрузить partition в object storage
    Archive(ArchiveArgs),
    /// Прочитать одну страницу сообщений
    Get(GetArgs),
    /// Сводка по всем topic'ам
    Status(StatusArgs),
    /// Отправить тестовое сообщение
    HelloWorld(HelloWorldArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ArchiveArgs {
    #[arg(long)]
    pub topic: String,

    #[arg(long)]
    pub partition: u32,

    /// Префикс ключей в хранилище
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Начать с этого offset'а вместо последнего заархивированного
    #[arg(long)]
    pub offset: Option<u64>,

    #[command(subcommand)]
    pub backend: Backend,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Backend {
    /// OpenStack Swift (OS_* окружение)
    Swift {
        #[arg(long)]
        container: String,
    },
    /// Amazon S3 (AWS_* окружение)
    S3 {
        #[arg(long)]
        bucket: String,
    },
    /// Google Cloud Storage (GOOGLE_SERVICE_ACCOUNT)
    Gcs {
        #[arg(long)]
        bucket: String,
    },
}

#[derive(Args, Clone, Debug)]
pub struct GetArgs {
    #[arg(long)]
    pub topic: String,

    #[arg(long)]
    pub partition: u32,

    /// Offset; отрицательный: от самого свежего сообщения
    #[arg(long, allow_negative_numbers = true)]
    pub offset: i64,

    /// Форматированный JSON
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Clone, Debug)]
pub struct StatusArgs {
    /// Сколько topic'ов опрашивать одновременно
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Args, Clone, Debug)]
pub struct HelloWorldArgs {
    #[arg(long)]
    pub topic: String,
}

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub archive: ArchiveSection,
    #[serde(default)]
    pub status: StatusSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetrySection {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArchiveSection {
    pub rollover_bytes: Option<u64>,
    pub compression_level: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusSection {
    pub concurrency: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &str) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::Config {
            context: "read",
            detail: format!("'{path}': {e}"),
        })?;
        Self::parse(&content).map_err(|e| CliError::Config {
            context: "parse",
            detail: format!("'{path}': {e}"),
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Effective: merged config
// ═══════════════════════════════════════════════════════════════

/// Итоговые настройки: файл < CLI.
#[derive(Debug, Clone)]
pub struct Effective {
    pub https_verify: bool,
    pub retry: RetryPolicy,
    pub stream: StreamOptions,
    pub status_concurrency: usize,
}

impl Effective {
    /// Отсутствие файла по умолчанию допустимо. Явно указанный путь
    /// (`--config` или `KAFKA_REPORTING_CONFIG`) обязан читаться.
    pub fn new(cli: &Cli) -> Result<Self, CliError> {
        let file = match FileConfig::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                if cli.config != DEFAULT_CONFIG_PATH || std::path::Path::new(&cli.config).exists() {
                    return Err(e);
                }
                tracing::debug!(path = %cli.config, "no config file, using defaults");
                FileConfig::default()
            }
        };
        let concurrency = match &cli.command {
            Commands::Status(args) => args.concurrency,
            _ => None,
        };
        Self::merge(file, cli.insecure, concurrency)
    }

    pub fn merge(
        file: FileConfig,
        insecure: bool,
        concurrency: Option<usize>,
    ) -> Result<Self, CliError> {
        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: file.retry.max_attempts.unwrap_or(defaults.max_attempts),
            base_delay: file
                .retry
                .base_delay_ms
                .map_or(defaults.base_delay, Duration::from_millis),
        };
        if retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts must be at least 1"));
        }

        let stream_defaults = StreamOptions::default();
        let stream = StreamOptions {
            rollover_bytes: file
                .archive
                .rollover_bytes
                .unwrap_or(stream_defaults.rollover_bytes),
            compression_level: file
                .archive
                .compression_level
                .unwrap_or(stream_defaults.compression_level),
        };
        if stream.compression_level > 9 {
            return Err(invalid("archive.compression_level must be within 0..=9"));
        }
        if stream.rollover_bytes == 0 {
            return Err(invalid("archive.rollover_bytes must be positive"));
        }

        let status_concurrency = concurrency.or(file.status.concurrency).unwrap_or(1);
        if status_concurrency == 0 {
            return Err(invalid("status concurrency must be at least 1"));
        }

        Ok(Self {
            https_verify: !insecure,
            retry,
            stream,
            status_concurrency,
        })
    }
}

fn invalid(detail: &str) -> CliError {
    CliError::Config {
        context: "validate",
        detail: detail.to_string(),
    }
}
