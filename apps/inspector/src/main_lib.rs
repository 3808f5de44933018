use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use financekit_core::store::{DirectoryContainerResolver, SharedStateStore};
use financekit_core::RelayConfig;

use crate::cli::Cli;

/// Logs go to stderr; stdout carries the JSON output.
pub fn init_tracing() {
    let log_format = std::env::var("FINANCEKIT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub fn open_store(cli: &Cli) -> anyhow::Result<Arc<SharedStateStore>> {
    let group = match &cli.group {
        Some(group) => group.clone(),
        None => RelayConfig::from_env()
            .context("no --group given and FINANCEKIT_BUNDLE_ID is not set")?
            .group_identifier(),
    };
    let store = SharedStateStore::new(
        Arc::new(DirectoryContainerResolver::new(&cli.root)),
        group.clone(),
    );
    if !store.is_available() {
        anyhow::bail!(
            "app group '{}' not found under {}",
            group,
            cli.root.display()
        );
    }
    tracing::info!("Opened app group '{}'", group);
    Ok(Arc::new(store))
}
