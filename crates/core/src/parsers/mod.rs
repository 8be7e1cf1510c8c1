pub mod twiss;

pub use twiss::{TwissParseError, TwissTable, parse_twiss};
