pub mod catalog;
pub mod fields;
pub mod simulate;

pub use catalog::{SegmentCatalog, SegmentDefaults};
pub use fields::{RESERVED_FIELDS, is_reserved};
pub use simulate::{
    ErrorBody, ImportedBeamline, LineGraph, SegmentPayload, SimulateRequest, SimulateResponse,
};
