//! Firmware updates from GitHub releases.
//!
//! [`Esp32Updater`] asks the GitHub API for the latest release of the
//! configured repository and streams a chosen image into the inactive OTA
//! slot. Scheduling (when to check, when to give up) is not its concern;
//! see [`UpdatePolicy`](crate::update::UpdatePolicy).

use std::time::Duration;

use esp_idf_svc::http::client::{Configuration, EspHttpConnection, FollowRedirectsPolicy};
use esp_idf_svc::http::Method;
use esp_idf_svc::ota::EspOta;
use thiserror::Error;

use crate::config::UpdateConfig;
use crate::traits::FirmwareUpdater;
use crate::update::{GithubRelease, ReleaseInfo, CURRENT_VERSION};

/// Chunk size for reads from the HTTP connection.
const CHUNK: usize = 1024;
/// Largest release metadata document accepted.
const MAX_RELEASE_JSON: usize = 16 * 1024;

/// Errors from a check or install.
#[derive(Debug, Error)]
pub enum OtaError {
    /// HTTP or flash failure reported by ESP-IDF.
    #[error("esp-idf: {0}")]
    Esp(#[from] esp_idf_svc::sys::EspError),
    /// Non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),
    /// Release metadata did not parse.
    #[error("release metadata: {0}")]
    Json(#[from] serde_json::Error),
    /// Release metadata exceeded the buffer.
    #[error("release metadata too large")]
    TooLarge,
}

/// GitHub release checker and OTA writer.
#[derive(Debug, Clone)]
pub struct Esp32Updater {
    releases_url: String,
    timeout: Duration,
}

impl Esp32Updater {
    /// Updater for the repository named in `config`.
    pub fn new(config: &UpdateConfig) -> Self {
        Self {
            releases_url: format!(
                "https://api.github.com/repos/{}/{}/releases/latest",
                config.owner, config.repo
            ),
            timeout: Duration::from_millis(u64::from(config.http_timeout_ms)),
        }
    }

    fn connect(&self, url: &str) -> Result<EspHttpConnection, OtaError> {
        let mut conn = EspHttpConnection::new(&Configuration {
            timeout: Some(self.timeout),
            buffer_size: Some(CHUNK),
            buffer_size_tx: Some(CHUNK),
            follow_redirects_policy: FollowRedirectsPolicy::FollowAll,
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })?;
        let user_agent = format!("rs-fridge/{CURRENT_VERSION}");
        conn.initiate_request(
            Method::Get,
            url,
            &[
                ("User-Agent", user_agent.as_str()),
                ("Accept", "application/vnd.github+json"),
            ],
        )?;
        conn.initiate_response()?;
        match conn.status() {
            200..=299 => Ok(conn),
            status => Err(OtaError::Status(status)),
        }
    }
}

impl FirmwareUpdater for Esp32Updater {
    type Error = OtaError;

    fn latest_release(&mut self) -> Result<ReleaseInfo, OtaError> {
        let mut conn = self.connect(&self.releases_url)?;
        let mut body = Vec::new();
        let mut buf = [0u8; CHUNK];
        loop {
            let n = conn.read(&mut buf)?;
            if n == 0 {
                break;
            }
            if body.len() + n > MAX_RELEASE_JSON {
                return Err(OtaError::TooLarge);
            }
            body.extend_from_slice(&buf[..n]);
        }
        let release: GithubRelease = serde_json::from_slice(&body)?;
        Ok(release.into())
    }

    fn install(&mut self, url: &str) -> Result<(), OtaError> {
        log::info!("[OTA] Downloading {}", url);
        let mut conn = self.connect(url)?;

        let mut ota = EspOta::new()?;
        let mut update = ota.initiate_update()?;
        let mut buf = [0u8; CHUNK];
        let mut written = 0usize;
        loop {
            let n = match conn.read(&mut buf) {
                Ok(n) => n,
                Err(e) => {
                    let _ = update.abort();
                    return Err(e.into());
                }
            };
            if n == 0 {
                break;
            }
            if let Err(e) = update.write(&buf[..n]) {
                let _ = update.abort();
                return Err(e.into());
            }
            written += n;
        }
        update.complete()?;
        log::info!("[OTA] Wrote {} bytes", written);
        Ok(())
    }
}
