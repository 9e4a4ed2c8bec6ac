//! Portal client.
//!
//! Thin blocking HTTP layer over the courier dispatch portal: login,
//! per-date job listing, and per-job detail pages. The mining pipeline
//! consumes it through the [`JobSource`] trait so it can run offline
//! in tests.

use chrono::NaiveDate;
use reqwest::blocking::Client;

use crate::error::{AppError, Result};
use crate::models::PortalConfig;
use crate::utils::http::create_client;

/// Date format the portal expects in query parameters.
const PORTAL_DATE_FORMAT: &str = "%d.%m.%Y";

/// Source of job listing and job detail documents.
pub trait JobSource {
    /// Raw HTML of the listing page for a date.
    fn list_jobs(&self, date: NaiveDate) -> Result<String>;

    /// Raw HTML of one job's detail page.
    fn fetch_job(&self, uuid: &str) -> Result<String>;
}

/// Blocking client for the courier dispatch portal.
pub struct PortalClient {
    client: Client,
    config: PortalConfig,
}

impl PortalClient {
    /// Create a client with the configured user agent and timeout.
    pub fn new(config: &PortalConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
            config: config.clone(),
        })
    }

    /// Log onto the portal.
    ///
    /// The portal answers logins with a plain HTML page; success is
    /// detected by the configured marker substring in the body.
    pub fn login(&self, username: &str, password: &str) -> Result<()> {
        let response = self
            .client
            .post(self.config.list_url())
            .form(&[("username", username), ("password", password)])
            .send()?;
        let body = response.text()?;

        if body.contains(&self.config.login_marker) {
            log::info!("Logged onto portal as {username}");
            Ok(())
        } else {
            Err(AppError::session(
                "login rejected: success marker not found in response",
            ))
        }
    }
}

impl JobSource for PortalClient {
    fn list_jobs(&self, date: NaiveDate) -> Result<String> {
        let datum = date.format(PORTAL_DATE_FORMAT).to_string();
        let text = self
            .client
            .get(self.config.list_url())
            .query(&[("status", self.config.job_status.as_str()), ("datum", &datum)])
            .send()?
            .error_for_status()?
            .text()?;
        Ok(text)
    }

    fn fetch_job(&self, uuid: &str) -> Result<String> {
        let text = self
            .client
            .get(self.config.detail_url())
            .query(&[("status", self.config.job_status.as_str()), ("uuid", uuid)])
            .send()?
            .error_for_status()?
            .text()?;
        Ok(text)
    }
}
