use anyhow::{Context, Result};
use std::path::PathBuf;

use trellis_runner::{bootstrap_subscriber, init_logging, load_config, load_document, run, RunRequest, ENV_CONFIG};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var(ENV_CONFIG).ok().map(PathBuf::from);
    let config = tracing::subscriber::with_default(bootstrap_subscriber(std::io::stderr), || {
        load_config(config_path.as_deref())
    })
    .context("Failed to load configuration")?;
    init_logging(&config);

    let request = RunRequest::from_lookup(|name| std::env::var(name).ok()).context("Invalid run request")?;
    let document = load_document(&request.document_path)?;

    let output = run(document, &request, config).await?;
    let failed = output.report.has_failures();

    let rendered = serde_json::to_string_pretty(&output).context("Failed to render report")?;
    println!("{}", rendered);

    if failed {
        tracing::warn!("{} action(s) failed", output.report.failures().count());
        std::process::exit(1);
    }
    Ok(())
}
