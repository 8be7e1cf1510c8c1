use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields::is_reserved;

/// Segment catalog returned by `GET /beamsegmentinfo`.
///
/// Maps a segment-type name (e.g. `driftLattice`, `qpfLattice`) to its
/// constructor defaults. Entry order is the service's declaration order and
/// is preserved for UI listing.
pub type SegmentCatalog = IndexMap<String, SegmentDefaults>;

/// Default parameters for one segment type.
///
/// The wire shape is a flat object mixing numeric constructor defaults with
/// the reserved `color` field, e.g.
/// `{"length": 1, "angle": 0.5, "color": "green"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDefaults {
    /// Display color reserved for this segment type (hex or named).
    #[serde(default = "default_color")]
    pub color: String,
    /// Constructor defaults keyed by parameter name. Mixed-typed on the
    /// wire; only numeric entries carry physical meaning.
    #[serde(flatten)]
    pub params: IndexMap<String, Value>,
}

fn default_color() -> String {
    "gray".to_owned()
}

impl SegmentDefaults {
    /// The numeric, non-reserved defaults: the parameter set a placed
    /// segment instance starts from. Non-numeric defaults (marker strings
    /// and the like) and any reserved names present on the wire are skipped.
    pub fn numeric_params(&self) -> IndexMap<String, f64> {
        self.params
            .iter()
            .filter(|(name, _)| !is_reserved(name))
            .filter_map(|(name, value)| value.as_f64().map(|v| (name.clone(), v)))
            .collect()
    }
}
