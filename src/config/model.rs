use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub fetch_timeout: Duration,
    pub recovery_dir: PathBuf,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(20),
            recovery_dir: std::env::temp_dir(),
            debug: false,
        }
    }
}
