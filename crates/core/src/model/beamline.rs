use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use beambench_protocol::{ImportedBeamline, SegmentCatalog, SegmentPayload, is_reserved};

#[derive(Debug, Error, PartialEq)]
pub enum BeamlineError {
    #[error("unknown segment type `{0}`")]
    UnknownSegmentType(String),
    #[error("field `{0}` is system-owned and cannot be edited")]
    ReservedFieldViolation(String),
    #[error("no segment with id {0}")]
    NotFound(u32),
    #[error("`{value}` is not a valid number for field `{field}`")]
    InvalidNumber { field: String, value: String },
    #[error("import entry {0} has no segment name")]
    MalformedImport(usize),
}

/// One placed copy of a catalog segment type.
///
/// `start_pos`/`end_pos` are derived from the sequence order and `color` is
/// copied from the catalog; none of them are user-editable. The transient
/// edit flag lives in [`super::RowEditState`], keyed by `id`, so it can never
/// leak into an outbound payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentInstance {
    /// Unique within the session, stable across edits, never reused.
    pub id: u32,
    /// The originating catalog key. A copy; edits to this instance never
    /// touch the catalog or sibling instances.
    pub name: String,
    /// Display color, catalog-derived.
    pub color: String,
    /// Longitudinal start, meters. Derived.
    pub start_pos: f64,
    /// Longitudinal end, meters. Derived; always `start_pos + length`.
    pub end_pos: f64,
    params: IndexMap<String, f64>,
}

impl SegmentInstance {
    /// The segment's physical length in meters (0 if the type carries no
    /// `length` parameter).
    pub fn length(&self) -> f64 {
        self.params.get("length").copied().unwrap_or(0.0)
    }

    /// The editable physical parameters, in catalog order.
    pub fn params(&self) -> &IndexMap<String, f64> {
        &self.params
    }
}

/// Ordered sequence of segment instances with positional invariants:
/// `segments[0].start_pos == 0`, each segment starts where the previous one
/// ends, and `end_pos == start_pos + length`. Restored by a full left-to-right
/// recompute after every structural change; partial updates are not trusted
/// because a `length` edit cascades into every following segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Beamline {
    segments: Vec<SegmentInstance>,
    next_id: u32,
}

impl Beamline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[SegmentInstance] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&SegmentInstance> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Total beamline length in meters (the last segment's `end_pos`).
    pub fn total_length(&self) -> f64 {
        self.segments.last().map(|s| s.end_pos).unwrap_or(0.0)
    }

    /// Index of the segment covering z. The final segment's end is treated
    /// as inclusive so the cursor can rest on the beamline's far edge.
    pub fn segment_at(&self, z: f64) -> Option<usize> {
        if z < 0.0 || z > self.total_length() {
            return None;
        }
        match self
            .segments
            .iter()
            .position(|s| z >= s.start_pos && z < s.end_pos)
        {
            Some(i) => Some(i),
            None => self.segments.len().checked_sub(1),
        }
    }

    /// Append a fresh instance of the named catalog type.
    ///
    /// Parameters and `color` are cloned from the catalog entry; the new id
    /// is returned.
    pub fn insert(&mut self, catalog: &SegmentCatalog, type_name: &str) -> Result<u32, BeamlineError> {
        let defaults = catalog
            .get(type_name)
            .ok_or_else(|| BeamlineError::UnknownSegmentType(type_name.to_owned()))?;
        let id = self.next_id;
        self.next_id += 1;
        self.segments.push(SegmentInstance {
            id,
            name: type_name.to_owned(),
            color: defaults.color.clone(),
            start_pos: 0.0,
            end_pos: 0.0,
            params: defaults.numeric_params(),
        });
        self.recompute_positions();
        Ok(id)
    }

    /// Remove the instance with the given id. Ids of the remaining segments
    /// are untouched; deletion never renumbers.
    pub fn delete(&mut self, id: u32) -> Result<(), BeamlineError> {
        let index = self
            .segments
            .iter()
            .position(|s| s.id == id)
            .ok_or(BeamlineError::NotFound(id))?;
        self.segments.remove(index);
        self.recompute_positions();
        Ok(())
    }

    /// Set a physical parameter on one instance from raw user input.
    ///
    /// Reserved fields are rejected before anything else is looked at; a
    /// `length` change triggers a full position recompute.
    pub fn set_field(&mut self, id: u32, field: &str, raw_value: &str) -> Result<(), BeamlineError> {
        if is_reserved(field) {
            return Err(BeamlineError::ReservedFieldViolation(field.to_owned()));
        }
        let value: f64 = raw_value
            .trim()
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| BeamlineError::InvalidNumber {
                field: field.to_owned(),
                value: raw_value.to_owned(),
            })?;
        let segment = self
            .segments
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(BeamlineError::NotFound(id))?;
        segment.params.insert(field.to_owned(), value);
        if field == "length" {
            self.recompute_positions();
        }
        Ok(())
    }

    /// Replace the whole beamline from an import payload, all-or-nothing.
    ///
    /// Reserved fields in the input are never trusted: `color` is re-derived
    /// from the catalog by name and positions are recomputed. On any error
    /// the existing beamline is left exactly as it was.
    pub fn replace_all(
        &mut self,
        catalog: &SegmentCatalog,
        imported: &ImportedBeamline,
    ) -> Result<(), BeamlineError> {
        let mut staged = Vec::with_capacity(imported.len());
        let mut id = self.next_id;
        for (index, entry) in imported.iter().enumerate() {
            let (name, raw_params) = entry
                .first()
                .ok_or(BeamlineError::MalformedImport(index))?;
            let defaults = catalog
                .get(name)
                .ok_or_else(|| BeamlineError::UnknownSegmentType(name.clone()))?;
            let mut params = defaults.numeric_params();
            for (field, value) in sanitized(raw_params) {
                params.insert(field, value);
            }
            staged.push(SegmentInstance {
                id,
                name: name.clone(),
                color: defaults.color.clone(),
                start_pos: 0.0,
                end_pos: 0.0,
                params,
            });
            id += 1;
        }
        self.segments = staged;
        self.next_id = id;
        self.recompute_positions();
        Ok(())
    }

    /// The request view of the beamline: for each segment in order, its type
    /// name and physical parameters. Reserved fields are excluded by
    /// construction: they are struct fields, never parameter entries.
    pub fn outbound_payload(&self) -> Vec<SegmentPayload> {
        self.segments
            .iter()
            .map(|s| SegmentPayload {
                segment_name: s.name.clone(),
                parameters: s.params.clone(),
            })
            .collect()
    }

    /// Single left-to-right pass restoring the positional invariants.
    /// Deterministic regardless of which operation triggered it.
    fn recompute_positions(&mut self) {
        let mut offset = 0.0;
        for segment in &mut self.segments {
            segment.start_pos = offset;
            offset += segment.length();
            segment.end_pos = offset;
        }
    }
}

/// Numeric, non-reserved entries of a raw import parameter map.
fn sanitized(raw: &IndexMap<String, Value>) -> impl Iterator<Item = (String, f64)> {
    raw.iter()
        .filter(|(name, _)| !is_reserved(name))
        .filter_map(|(name, value)| value.as_f64().map(|v| (name.clone(), v)))
}
