#[cfg(feature = "telemetry")]
use std::sync::OnceLock;

#[cfg(feature = "telemetry")]
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize tracing subscriber once per process.
///
/// Safe to call from every test; only the first call installs a subscriber.
#[cfg(feature = "telemetry")]
pub fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();

    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("lint_verify=info"));
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

#[cfg(not(feature = "telemetry"))]
pub fn init_tracing() {}

/// Instrument an inline block with a span if telemetry is enabled.
#[macro_export]
macro_rules! instrument_block {
    ($name:expr, $block:block) => {{
        #[cfg(feature = "telemetry")]
        {
            let span = tracing::info_span!("lint_verify", phase = $name);
            let _guard = span.enter();
            (|| $block)()
        }
        #[cfg(not(feature = "telemetry"))]
        {
            (|| $block)()
        }
    }};
}

macro_rules! debug_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        {
            tracing::debug!($($arg)*);
        }
    }};
}

macro_rules! info_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        {
            tracing::info!($($arg)*);
        }
    }};
}

macro_rules! warn_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        {
            tracing::warn!($($arg)*);
        }
    }};
}

pub(crate) use {debug_event, info_event, warn_event};
