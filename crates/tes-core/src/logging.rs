use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize logging for the exporter.
///
/// Logs go to stderr; stdout carries the progress lines. The default filter is
/// `warn` for dependencies and `info` for our crates, overridable with `RUST_LOG`.
pub fn init(service_name: &str) -> Result<()> {
    let crate_target = service_name.replace('-', "_");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,tes_core=info,tes_telegram=info,{crate_target}=info"
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to initialize logging: {e}")))
}
