use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One segment as sent to the simulation service: the catalog type name and
/// the instance's physical parameters. Reserved fields never appear inside
/// `parameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPayload {
    #[serde(rename = "segmentName")]
    pub segment_name: String,
    pub parameters: IndexMap<String, f64>,
}

/// Body of `POST /axes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateRequest {
    #[serde(rename = "beamlineData")]
    pub beamline_data: Vec<SegmentPayload>,
    #[serde(rename = "beamType")]
    pub beam_type: String,
    pub num_particles: u32,
    /// Kinetic energy in MeV.
    #[serde(rename = "kineticE")]
    pub kinetic_e: u32,
    /// Sampling step along z, in meters.
    pub interval: f64,
    #[serde(rename = "defineLim")]
    pub define_lim: bool,
    #[serde(rename = "matchScaling")]
    pub match_scaling: bool,
    pub scatter: bool,
    #[serde(rename = "saveData")]
    pub save_data: bool,
}

impl Default for SimulateRequest {
    fn default() -> Self {
        // Service-side defaults from the simulation API's parameter model.
        Self {
            beamline_data: Vec::new(),
            beam_type: "electron".to_owned(),
            num_particles: 1000,
            kinetic_e: 45,
            interval: 1.0,
            define_lim: true,
            match_scaling: true,
            scatter: true,
            save_data: false,
        }
    }
}

/// Response of `POST /axes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateResponse {
    /// Per-z phase-space renders: stringified z position → base64 png.
    /// Replaced wholesale on every response, never merged.
    pub images: IndexMap<String, String>,
    pub line_graph: LineGraph,
}

/// The `line_graph` member of a simulate response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineGraph {
    /// Service-rendered overview chart, base64 png.
    pub axis: String,
    /// Nested twiss table as a JSON string: family → axis → per-z values.
    pub twiss: String,
    /// The z sample grid the twiss values and image keys are aligned with.
    pub x_axis: Vec<f64>,
    #[serde(default)]
    pub beamsegment: Vec<Value>,
}

/// Body of a non-2xx response; `detail` is surfaced to the user verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: Value,
}

impl ErrorBody {
    /// `detail` as display text: strings unquoted, anything else as JSON.
    pub fn detail_text(&self) -> String {
        match &self.detail {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Result of `POST /excel-to-beamline`: one single-entry map per segment,
/// keyed by the segment-type name.
pub type ImportedBeamline = Vec<IndexMap<String, IndexMap<String, Value>>>;
