pub mod archive;
pub mod get;
pub mod hello_world;
pub mod status;

use reporting_client::{ClientConfig, ReportingClient};

use crate::config::Effective;
use crate::env::Env;
use crate::error::CliError;

/// Клиент API из `REPORTING_*` и итоговых настроек.
pub fn reporting_client(env: &Env, eff: &Effective) -> Result<ReportingClient, CliError> {
    let mut config = ClientConfig::new(
        env.get("REPORTING_SERVER"),
        env.get("REPORTING_USERNAME"),
        env.get("REPORTING_TOKEN"),
    );
    config.https_verify = eff.https_verify;
    config.retry = eff.retry;
    Ok(ReportingClient::new(config)?)
}
