use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "glint_engine=debug,wgpu=warn").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Silences the wgpu crates below `warn` unless the filter names them.
    pub quiet_wgpu: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            quiet_wgpu: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self { env_filter: Some(filter.into()), ..Self::default() }
    }
}

static INIT: Once = Once::new();

/// Resolves the filter string: explicit config, then `RUST_LOG`, then `info`.
fn resolve_filter(config: &LoggingConfig, rust_log: Option<String>) -> String {
    let base = config.env_filter.clone().or(rust_log).unwrap_or_else(|| "info".to_owned());
    if config.quiet_wgpu && !base.contains("wgpu") {
        format!("{base},wgpu_core=warn,wgpu_hal=warn,naga=warn")
    } else {
        base
    }
}

/// Initializes the global logger once; later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = resolve_filter(&config, std::env::var("RUST_LOG").ok());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);

        // Tests may install their own logger first.
        if builder.try_init().is_err() {
            return;
        }
        log::debug!("logging initialized ({filter})");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins_over_env() {
        let cfg = LoggingConfig { quiet_wgpu: false, ..LoggingConfig::with_filter("debug") };
        assert_eq!(resolve_filter(&cfg, Some("trace".into())), "debug");
    }

    #[test]
    fn falls_back_to_env_then_info() {
        let cfg = LoggingConfig { quiet_wgpu: false, ..Default::default() };
        assert_eq!(resolve_filter(&cfg, Some("warn".into())), "warn");
        assert_eq!(resolve_filter(&cfg, None), "info");
    }

    #[test]
    fn wgpu_is_quieted_unless_named() {
        let cfg = LoggingConfig::default();
        assert!(resolve_filter(&cfg, None).contains("wgpu_core=warn"));
        assert_eq!(resolve_filter(&cfg, Some("wgpu_hal=trace".into())), "wgpu_hal=trace");
    }
}
