use std::path::Path;

use anyhow::{Context, Result};
use beambench_protocol::{ErrorBody, ImportedBeamline, SegmentCatalog, SimulateRequest, SimulateResponse};

/// Blocking HTTP client for the simulation service. Calls run on worker
/// threads, never on the UI thread, so blocking is fine here.
pub struct SimClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl SimClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        // Simulations can run for minutes; no request timeout.
        let client = reqwest::blocking::Client::builder()
            .user_agent("beambench")
            .timeout(None)
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Surface the service's `{"detail": ...}` error body verbatim when
    /// present, falling back to the plain HTTP status.
    fn ensure_ok(
        &self,
        resp: reqwest::blocking::Response,
        label: &str,
    ) -> Result<reqwest::blocking::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        if let Ok(body) = resp.json::<ErrorBody>() {
            anyhow::bail!("{label}: {}", body.detail_text());
        }
        anyhow::bail!("{label}: HTTP {status}");
    }

    /// Fetch the segment catalog (known segment types with their default
    /// parameter values and display colors).
    pub fn fetch_catalog(&self) -> Result<SegmentCatalog> {
        let resp = self
            .client
            .get(self.url("/beamsegmentinfo"))
            .send()
            .context("request segment catalog")?;
        self.ensure_ok(resp, "segment catalog")?
            .json()
            .context("decode segment catalog")
    }

    /// Upload a spreadsheet and get back an ordered segment list ready for
    /// an atomic beamline import.
    pub fn import_spreadsheet(&self, path: &Path) -> Result<ImportedBeamline> {
        let form = reqwest::blocking::multipart::Form::new()
            .file("file", path)
            .with_context(|| format!("read {}", path.display()))?;
        let resp = self
            .client
            .post(self.url("/excel-to-beamline"))
            .multipart(form)
            .send()
            .context("upload spreadsheet")?;
        self.ensure_ok(resp, "spreadsheet import")?
            .json()
            .context("decode imported beamline")
    }

    /// Run a simulation over the outbound beamline payload.
    pub fn simulate(&self, request: &SimulateRequest) -> Result<SimulateResponse> {
        let resp = self
            .client
            .post(self.url("/axes"))
            .json(request)
            .send()
            .context("request simulation")?;
        self.ensure_ok(resp, "simulation")?
            .json()
            .context("decode simulation response")
    }
}
