use crate::error::{Result, SlistError};
use lazy_static::lazy_static;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

lazy_static! {
    static ref REST_CLIENT: Client = Client::new();
}

/// Where the live list comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveSource {
    Cache(PathBuf),
    Url(String),
}

pub struct LiveListAPI;

impl LiveListAPI {
    /// Raw live list text. A single attempt; any failure is fatal to the run.
    #[instrument]
    pub async fn fetch(source: &LiveSource, timeout: Duration) -> Result<String> {
        match source {
            LiveSource::Cache(path) => {
                info!("Reading cached live list");

                fs::read_to_string(path)
                    .await
                    .map_err(|source| SlistError::LiveCacheUnreadable {
                        path: path.clone(),
                        source,
                    })
            }
            LiveSource::Url(url) => {
                info!("Fetching live list");

                let text = REST_CLIENT
                    .get(url)
                    .timeout(timeout)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;

                Ok(text)
            }
        }
    }
}
