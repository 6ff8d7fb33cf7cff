//! `picker fetch`

use crate::config::load_config;
use anyhow::{bail, Context};
use picker_core::{HttpTransport, Outcome, RequestDescriptor, ResilientFetcher};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn run(
    url: String,
    headers: Vec<(String, String)>,
    cache_key: Option<String>,
    timeout_secs: Option<u64>,
) -> anyhow::Result<()> {
    let config = load_config()?;
    let transport = HttpTransport::new(config.http).context("Failed to build HTTP client")?;
    let fetcher = ResilientFetcher::named("cli", config.fetcher);

    let mut request = headers
        .into_iter()
        .fold(RequestDescriptor::get(url), |request, (name, value)| {
            request.with_header(name, value)
        });
    if let Some(key) = cache_key {
        request = request.with_cache_key(key);
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling request");
            ctrl_c.cancel();
        }
    });

    let outcome = match timeout_secs {
        Some(secs) => {
            fetcher
                .execute_with_timeout(&request, &transport, &cancel, Duration::from_secs(secs))
                .await?
        }
        None => fetcher.execute(&request, &transport, &cancel).await?,
    };

    match outcome {
        Outcome::Success(response) => {
            info!(status = response.status, bytes = response.body.len(), "Fetched");
            println!("{}", response.body);
            Ok(())
        }
        other => bail!("request to {} failed: {other}", request.url()),
    }
}
