//! Tracing subscriber setup.
//!
//! The service writes two streams, like a classic pre-fork web server:
//! the general (error) log and the access log. Each goes to a file or, for
//! `-`, to standard error. With `capture_output` off the general log is also
//! echoed to the console.

use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{filter_fn, FilterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::api::handlers::ACCESS_TARGET;
use crate::error::{AppError, Result};
use crate::launch::{LaunchConfig, STDERR_SINK};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the non-blocking writers flushing. Hold it for the process lifetime.
#[derive(Debug)]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// Directives used when `--verbose` is given. They win over `RUST_LOG`.
pub const VERBOSE_DIRECTIVES: &str = "hit_counter=debug,inventory=debug,info";

/// Pick the filter directives: `--verbose` first, then a non-empty
/// `RUST_LOG`, then `default`.
fn filter_directives(verbose: bool, rust_log: Option<&str>, default: &str) -> String {
    if verbose {
        return VERBOSE_DIRECTIVES.to_string();
    }
    match rust_log.map(str::trim) {
        Some(directives) if !directives.is_empty() => directives.to_string(),
        _ => default.to_string(),
    }
}

fn env_filter(verbose: bool, default: &str) -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    EnvFilter::new(filter_directives(verbose, rust_log.as_deref(), default))
}

fn sink(target: &str) -> Result<(NonBlocking, WorkerGuard)> {
    if target == STDERR_SINK {
        return Ok(tracing_appender::non_blocking(std::io::stderr()));
    }

    let path = Path::new(target);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::Logging(format!("log path {:?} has no file name", target)))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| AppError::Logging(format!("cannot open {}: {}", target, e)))?;

    Ok(tracing_appender::non_blocking(appender))
}

/// Initialize logging for the web service.
pub fn init_service_logging(launch: &LaunchConfig, verbose: bool) -> Result<LogGuards> {
    let default_filter = launch.level_filter().map_err(AppError::Logging)?.to_string();

    let not_access = || filter_fn(|meta| meta.target() != ACCESS_TARGET);
    let only_access = filter_fn(|meta| meta.target() == ACCESS_TARGET);

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guards = Vec::new();

    let (error_writer, guard) = sink(&launch.errorlog)?;
    guards.push(guard);
    layers.push(
        fmt::layer()
            .with_writer(error_writer)
            .with_ansi(false)
            .with_filter(not_access().and(env_filter(verbose, &default_filter)))
            .boxed(),
    );

    let (access_writer, guard) = sink(&launch.accesslog)?;
    guards.push(guard);
    layers.push(
        fmt::layer()
            .with_writer(access_writer)
            .with_ansi(false)
            .with_target(false)
            .with_level(false)
            .with_filter(only_access)
            .boxed(),
    );

    if !launch.capture_output && launch.errorlog != STDERR_SINK {
        layers.push(
            fmt::layer()
                .compact()
                .with_filter(not_access().and(env_filter(verbose, &default_filter)))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(LogGuards { _guards: guards })
}

/// Initialize logging for one-shot CLI tools: standard error only, so
/// standard output stays machine-readable.
pub fn init_cli_logging(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter(verbose, "warn")),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_overrides_rust_log() {
        assert_eq!(
            filter_directives(true, Some("error"), "info"),
            VERBOSE_DIRECTIVES
        );
        assert_eq!(filter_directives(true, None, "warn"), VERBOSE_DIRECTIVES);
    }

    #[test]
    fn rust_log_overrides_the_default() {
        assert_eq!(filter_directives(false, Some("hit_counter=trace"), "info"), "hit_counter=trace");
        assert_eq!(filter_directives(false, Some("  "), "info"), "info");
        assert_eq!(filter_directives(false, None, "warn"), "warn");
    }

    #[test]
    fn sink_rejects_path_without_file_name() {
        assert!(matches!(sink("/"), Err(AppError::Logging(_))));
    }

    #[test]
    fn sink_creates_file_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service-error.log");
        let (_writer, _guard) = sink(path.to_str().unwrap()).unwrap();
        assert!(path.exists());
    }
}
