use std::sync::OnceLock;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::channel::ChannelConfig;
use crate::simulation::SimulationSettings;

macro_rules! config_fields {
    ( $( $field:ident: $ty:ty = $default:expr ),* $(,)? ) => {
        #[derive(Debug, Deserialize)]
        pub struct AppConfig {
            /// dependent crates will not be able to name this field.
            _priv: (),
            $( pub $field: $ty, )*
            pub log_level: String,
            pub log_file: Option<String>,
        }

        impl AppConfig {
            fn from_settings(settings: &Config, args: CliArgs) -> Self {
                Self {
                    _priv: (),
                    $( $field: settings.get(stringify!($field)).unwrap_or($default), )*
                    log_level: args.log_level,
                    log_file: args.log_file,
                }
            }
        }
    };
}

// Configuration fields with their default values
config_fields! {
    queue_capacity: usize = crate::channel::DEFAULT_CAPACITY,
    pair_stall_timeout_ms: u64 = 10_000, // 0 disables the dangling pair detection
    max_wait_time_ms: u64 = 5_000,
    explorers: usize = 8,
    reports_per_explorer: usize = 100,
}

#[derive(Parser, Debug)]
#[command(name = "explorer-channel")]
pub struct CliArgs {
    /// Path to the config file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
    /// Log level (error, warn, info, debug, trace, off)
    #[arg(long, default_value = "info")]
    pub log_level: String,
    /// Log file path
    #[arg(long)]
    pub log_file: Option<String>,
}

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    pub fn init() {
        let args = CliArgs::parse();
        let settings = Config::builder()
            .add_source(File::with_name(&args.config).required(false))
            .add_source(Environment::with_prefix("EXPLORER_CHANNEL").separator("__"))
            .build()
            .expect("Failed to build configuration"); // we cannot use logging here since it's not initialized yet
        CONFIG.set(AppConfig::from_settings(&settings, args)).expect("AppConfig can only be initialized once");
    }

    pub fn get() -> &'static AppConfig { CONFIG.get().expect("AppConfig is not initialized") }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            capacity: self.queue_capacity,
            pair_stall_timeout: (self.pair_stall_timeout_ms > 0)
                .then(|| Duration::from_millis(self.pair_stall_timeout_ms)),
        }
    }

    pub fn simulation_settings(&self) -> SimulationSettings {
        SimulationSettings {
            explorers: self.explorers,
            reports_per_explorer: self.reports_per_explorer,
            max_wait_time: Duration::from_millis(self.max_wait_time_ms),
        }
    }
}
