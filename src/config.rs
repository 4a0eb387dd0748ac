use std::sync::LazyLock;

use derive_from_env::FromEnv;

#[derive(FromEnv)]
#[from_env(prefix = "FANLOG")]
#[allow(non_snake_case)]
pub struct FanlogConfig {
    /// Interval used by `start_periodic_sync_default`, in milliseconds.
    #[from_env(default = "1000")]
    pub SYNC_INTERVAL_MS: u64,
}

pub static FANLOG_CONFIG: LazyLock<FanlogConfig> =
    LazyLock::new(|| FanlogConfig::from_env().unwrap());
