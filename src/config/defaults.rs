//! Default value functions for configuration.

use std::path::PathBuf;

pub fn default_data_directory() -> PathBuf {
    PathBuf::from("data")
}

/// The pub follows redeemers directly, so one hop covers them.
pub fn default_hops() -> u32 {
    1
}

pub fn default_log_level() -> String {
    "info".to_string()
}
