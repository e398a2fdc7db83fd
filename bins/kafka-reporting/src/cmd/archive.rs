use std::sync::Arc;

use archive_api::SegmentStore;
use archive_engine::StreamDriver;
use storage_gcs::GcsStore;
use storage_s3::S3Store;
use storage_swift::{SwiftCredentials, SwiftStore};

use crate::config::{ArchiveArgs, Backend, Effective};
use crate::env::{self, Env};
use crate::error::CliError;

pub async fn run(args: ArchiveArgs, eff: &Effective) -> Result<(), CliError> {
    let backend_env = match &args.backend {
        Backend::Swift { .. } => env::SWIFT,
        Backend::S3 { .. } => env::S3,
        Backend::Gcs { .. } => env::GCS,
    };
    let env = Env::require(&[env::REPORTING, backend_env])?;

    let client = Arc::new(super::reporting_client(&env, eff)?);
    let store = open_store(&args, &env)?;
    let driver = StreamDriver::new(client, store).with_options(eff.stream);

    let summary = driver.run(&args.topic, args.partition, args.offset).await?;
    tracing::info!(
        topic = %args.topic,
        partition = args.partition,
        segments = summary.segments.len(),
        records = summary.records,
        next_offset = summary.next_offset,
        "archive complete"
    );
    Ok(())
}

fn open_store(args: &ArchiveArgs, env: &Env) -> Result<Arc<dyn SegmentStore>, CliError> {
    let store: Arc<dyn SegmentStore> = match &args.backend {
        Backend::Swift { container } => {
            let credentials = SwiftCredentials {
                auth_url: env.get("OS_AUTH_URL").to_string(),
                username: env.get("OS_USERNAME").to_string(),
                password: env.get("OS_PASSWORD").to_string(),
                tenant_name: env.get("OS_TENANT_NAME").to_string(),
                region: env::optional("OS_REGION_NAME"),
            };
            tracing::info!(container = %container, prefix = %args.prefix, "using swift storage");
            Arc::new(SwiftStore::new(credentials, container, &args.prefix, true)?)
        }
        Backend::S3 { bucket } => {
            tracing::info!(bucket = %bucket, prefix = %args.prefix, "using s3 storage");
            Arc::new(S3Store::new(bucket, &args.prefix)?)
        }
        Backend::Gcs { bucket } => {
            tracing::info!(bucket = %bucket, prefix = %args.prefix, "using gcs storage");
            Arc::new(GcsStore::new(bucket, &args.prefix)?)
        }
    };
    Ok(store)
}
