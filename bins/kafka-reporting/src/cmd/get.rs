use archive_api::{FetchOffset, Page};

use crate::config::{Effective, GetArgs};
use crate::env::{self, Env};
use crate::error::CliError;

pub async fn run(args: GetArgs, eff: &Effective) -> Result<(), CliError> {
    let env = Env::require(&[env::REPORTING])?;
    let client = super::reporting_client(&env, eff)?;

    let page = client
        .get(&args.topic, args.partition, FetchOffset::from(args.offset))
        .await?;
    println!("{}", render(page.as_ref(), args.pretty)?);
    Ok(())
}

/// Записи страницы JSON-массивом; пустой ответ: `[]`.
pub fn render(page: Option<&Page>, pretty: bool) -> Result<String, CliError> {
    let records = page.map_or(&[][..], |p| p.records.as_slice());
    Ok(if pretty {
        serde_json::to_string_pretty(records)?
    } else {
        serde_json::to_string(records)?
    })
}
