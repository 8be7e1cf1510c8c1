pub mod beamline;
pub mod cursor;
pub mod frames;
pub mod row_edit;

pub use beamline::{Beamline, BeamlineError, SegmentInstance};
pub use cursor::CursorSync;
pub use frames::{Frame, FrameStore};
pub use row_edit::{RowEditState, RowMode};
