//! Subcommand execution.

use artifetch_engine::config::MemoryConfigStore;
use artifetch_engine::{
    ArtifactService, Backends, ConfigStore, FileConfigStore, Node, RetrievalOptions,
    RetrievalResult, current_version,
};
use artifetch_nexus::NexusConnector;
use artifetch_s3::S3Connector;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::cli::Commands;
use crate::settings::Effective;

/// Exit status of `current` when nothing is deployed.
pub const EXIT_NOT_DEPLOYED: u8 = 2;

/// File store under `store_dir`; without one, every lookup comes back empty.
fn credential_store(settings: &Effective) -> Arc<dyn ConfigStore> {
    if let Some(store_dir) = &settings.store_dir {
        debug!(store_dir = %store_dir.display(), "Using file credential store");
        Arc::new(FileConfigStore::new(store_dir))
    } else {
        debug!("No credential store directory, using ambient credentials only");
        Arc::new(MemoryConfigStore::new())
    }
}

fn service(settings: &Effective) -> ArtifactService {
    ArtifactService::new(
        credential_store(settings),
        Backends::new(Arc::new(NexusConnector::new()), Arc::new(S3Connector::new())),
    )
}

fn node(settings: &Effective) -> Node {
    Node::new(settings.node_name.clone(), settings.environment.clone())
}

#[instrument(skip_all)]
pub async fn execute(command: Commands, settings: &Effective) -> miette::Result<ExitCode> {
    match command {
        Commands::Fetch {
            location,
            destination,
            options,
        } => {
            let options = RetrievalOptions {
                ssl_verify: settings.ssl_verify,
                extra: options.into_iter().collect::<BTreeMap<_, _>>(),
            };
            let result = service(settings)
                .retrieve_artifact(&node(settings), &location, destination, options)
                .await?;
            print!("{}", render_result(&result));
        }
        Commands::Resolve { coordinate } => {
            let version = service(settings)
                .resolve_actual_version(&node(settings), &coordinate, settings.ssl_verify)
                .await?;
            println!("{version}");
        }
        Commands::Current { deploy_dir } => return current(&deploy_dir).await,
        Commands::Url { coordinate } => {
            let url = service(settings)
                .build_download_url(&node(settings), &coordinate, settings.ssl_verify)
                .await?;
            println!("{url}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn current(deploy_dir: &Path) -> miette::Result<ExitCode> {
    match current_version(deploy_dir).await? {
        Some(version) => {
            println!("{version}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No current deployment in {}", deploy_dir.display());
            Ok(ExitCode::from(EXIT_NOT_DEPLOYED))
        }
    }
}

fn render_result(result: &RetrievalResult) -> String {
    let mut out = format!(
        "{}\t{} bytes\t{}\n",
        result.local_path.display(),
        result.bytes_written,
        result.source_kind
    );
    for (key, value) in &result.metadata {
        out.push_str(&format!("  {key}: {value}\n"));
    }
    out
}
