//! Console and file log setup.

use crate::cli::{Cli, FILE_GUARD};
use hrc_config::{Logging, Rotation};
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Filter precedence: `--log-level`, then `RUST_LOG`, then `[logging].level`, then info.
fn env_filter(cli: &Cli, logging: &Logging) -> eyre::Result<EnvFilter> {
    if let Some(level) = &cli.log_level {
        return EnvFilter::try_new(level)
            .map_err(|e| eyre::eyre!("invalid --log-level {level:?}: {e}"));
    }
    if let Ok(f) = EnvFilter::try_from_default_env() {
        return Ok(f);
    }
    let level = logging.level.as_deref().unwrap_or("info");
    EnvFilter::try_new(level).map_err(|e| eyre::eyre!("invalid logging.level {level:?}: {e}"))
}

fn file_layer(path: &str, rotation: Rotation) -> BoxedLayer {
    let p = Path::new(path);
    let dir = p
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = p.file_name().map_or_else(|| "hrc.log".into(), |n| n.to_os_string());
    let appender = match rotation {
        Rotation::Never => tracing_appender::rolling::never(dir, name),
        Rotation::Daily => tracing_appender::rolling::daily(dir, name),
        Rotation::Hourly => tracing_appender::rolling::hourly(dir, name),
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);
    fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .boxed()
}

pub fn init_tracing(cli: &Cli, logging: &Logging) -> eyre::Result<()> {
    let filter = env_filter(cli, logging)?;
    let mut layers: Vec<BoxedLayer> = Vec::new();
    layers.push(if cli.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_target(false).with_writer(std::io::stderr).boxed()
    });
    if let Some(path) = &logging.file {
        layers.push(file_layer(path, logging.rotation));
    }
    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| eyre::eyre!("failed to initialize logging: {e}"))
}
