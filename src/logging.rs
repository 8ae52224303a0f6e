use tracing_subscriber::{
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::settings::Settings;

/// Installs the global fmt subscriber. `RUST_LOG` wins over the settings
/// filter. Calling this twice is harmless; the second call is ignored.
pub fn init(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.as_str()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let settings = Settings { log_filter: "learnstrat=debug".to_string(), ..Settings::default() };
        init(&settings);
        init(&Settings::default());
        tracing::debug!(target: "learnstrat", "logging initialised");
    }
}
