use std::sync::Once;

use tracing::Level;
use tracing_subscriber::filter::{filter_fn, EnvFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

use crate::config::Configuration;
use crate::kernel::constants;

static INSTALL: Once = Once::new();

/// Install the console and debug sinks for the whole process.
///
/// Both write to stderr, leaving stdout to the UI session. The debug sink
/// only carries `DEBUG` records.
///
/// The console filter comes from `RUST_LOG` when set, otherwise from
/// `Logging:LogLevel:Default` in `config`. Only the first call in a process
/// installs anything; the return value reports whether this call did.
pub fn init_sinks(config: &Configuration) -> bool {
    let mut installed = false;
    INSTALL.call_once(|| installed = install(config));
    installed
}

fn filter_directive(config: &Configuration) -> String {
    std::env::var("RUST_LOG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| {
            config
                .get_or(constants::LOG_LEVEL_KEY, constants::DEFAULT_LOG_LEVEL)
                .to_ascii_lowercase()
        })
}

fn install(config: &Configuration) -> bool {
    let directive = filter_directive(config);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        eprintln!(
            "Invalid log filter '{}' ({}), falling back to '{}'",
            directive,
            err,
            constants::DEFAULT_LOG_LEVEL
        );
        EnvFilter::new(constants::DEFAULT_LOG_LEVEL)
    });

    // stdout belongs to the UI session.
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    let debug = cfg!(debug_assertions).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_thread_names(true)
            .with_filter(filter_fn(|metadata| *metadata.level() == Level::DEBUG))
    });

    let subscriber = tracing_subscriber::registry().with(console).with(debug);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        // Someone else (usually a test harness) owns the global subscriber.
        return false;
    }
    if let Err(err) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records into tracing: {}", err);
        return false;
    }
    true
}
