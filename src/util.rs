use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;

/// Installs a compact `tracing` subscriber as the global default.
///
/// `verbosity` counts `-v` flags: 0 = info, 1 = debug, 2+ = trace.
pub fn init_logging(verbosity: u8) -> Result<(), SetGlobalDefaultError> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
