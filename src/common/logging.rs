use tracing::Level;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Initialize the dual-stream log setup used by the CI scripts.
///
/// Informational output goes to stdout, warnings and errors to stderr, so a
/// build log can separate progress from failures. Each stream carries a
/// severity range rather than a plain minimum level: stdout never shows
/// warnings, stderr never shows progress. Debug/trace events reach stdout
/// only when `verbose` is set.
pub fn init_logging(verbose: bool) {
    let stdout_layer = fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stdout)
        .with_filter(filter_fn(move |metadata| {
            let level = *metadata.level();
            level == Level::INFO || (verbose && level > Level::INFO)
        }));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .with_filter(filter_fn(|metadata| *metadata.level() <= Level::WARN));

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(stderr_layer)
        .init();
}
