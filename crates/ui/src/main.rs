mod app;
mod charts;
mod client;

use std::sync::Arc;

use anyhow::Context;

use crate::app::BeamBenchApp;
use crate::client::SimClient;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

fn main() -> anyhow::Result<()> {
    // One optional argument: the simulation service's base URL.
    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
    let client = Arc::new(SimClient::new(base_url).context("initialize HTTP client")?);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("beambench")
            .with_inner_size([1280.0, 860.0]),
        ..Default::default()
    };
    eframe::run_native(
        "beambench",
        options,
        Box::new(move |cc| Ok(Box::new(BeamBenchApp::new(cc, client)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
