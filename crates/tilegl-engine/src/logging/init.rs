use std::sync::Once;

/// What `init_logging` installs.
///
/// With no `env_filter`, `RUST_LOG` is consulted before falling back to info.
/// Per-draw output lives at trace, so e.g. `"tilegl_engine=trace,wgpu=warn"`
/// shows controller activity without wgpu's own chatter.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Route output through the test harness capture instead of stderr.
    pub is_test: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            is_test: false,
        }
    }
}

static INIT: Once = Once::new();

/// Installs `env_logger` for the process on the first call; later calls,
/// and calls after a host installed another logger, leave things as they are.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let LoggingConfig { env_filter, write_style, is_test } = config;
        let mut builder = env_logger::Builder::new();

        match env_filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(log::LevelFilter::Info);
            }
        }
        builder.write_style(write_style).is_test(is_test);

        match builder.try_init() {
            Ok(()) => log::debug!("env_logger installed"),
            Err(_) => log::debug!("host logger already installed; keeping it"),
        }
    });
}
