use crate::config::model::Config;
use crate::error::{Result, SlistError};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub fn load_config() -> Result<Config> {
    let defaults = Config::default();

    let fetch_timeout = load_u64_config("SLIST_FETCH_TIMEOUT_SECS")?
        .map(Duration::from_secs)
        .unwrap_or(defaults.fetch_timeout);
    let recovery_dir = env::var("SLIST_RECOVERY_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or(defaults.recovery_dir);
    let debug = load_bool_config("SLIST_DEBUG", defaults.debug)?;

    Ok(Config {
        fetch_timeout,
        recovery_dir,
        debug,
    })
}

fn load_bool_config(name: &str, default: bool) -> Result<bool> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| SlistError::Config {
            name: name.to_string(),
            reason: "Expected either 'true' or 'false'".to_string(),
        })
}

fn load_u64_config(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SlistError::Config {
                name: name.to_string(),
                reason: "Expected a positive integer number.".to_string(),
            }),
        Err(_) => Ok(None),
    }
}
