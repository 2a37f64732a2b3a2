//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the configured level. Output goes to stderr in the
//! configured format and, when `[logging] directory` is set, also to a
//! daily-rotated `planboard.log` in that directory.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, filter::LevelFilter, fmt, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSection};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the background file writer alive. Drop it only at process exit,
/// otherwise buffered lines are lost.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Build the filter: `RUST_LOG` if set and valid, else `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Check a configured level such as `info` or `planboard=debug,tower_http=warn`.
///
/// A bare word is a valid `EnvFilter` target, so `inof` would silently turn
/// into "trace everything under target inof". Bare directives must be levels;
/// target directives need an explicit `=level`.
pub fn check_level(spec: &str) -> Result<()> {
    for directive in spec.split(',').map(str::trim) {
        if directive.is_empty() {
            anyhow::bail!("empty directive");
        }
        if !directive.contains('=') && !directive.contains('[') {
            directive
                .parse::<LevelFilter>()
                .with_context(|| format!("'{}' is not a log level", directive))?;
        }
    }
    EnvFilter::try_new(spec).context("Invalid filter directive")?;
    Ok(())
}

fn stderr_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Pretty => fmt::layer().with_writer(std::io::stderr).with_target(true).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .boxed(),
    }
}

/// Install the global subscriber.
pub fn init(config: &LoggingSection) -> Result<LogGuard> {
    let mut layers: Vec<BoxedLayer> = vec![stderr_layer(config.format)];

    let file_guard = match config.directory {
        Some(ref dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "planboard.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(&config.level))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LogGuard { _file: file_guard })
}
