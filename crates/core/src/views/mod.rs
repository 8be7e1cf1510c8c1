pub mod twiss_chart;

pub use twiss_chart::{
    AXES_PER_FAMILY, ChartPoint, TWISS_FAMILY_ORDER, TwissGroups, TwissSeries,
    dedupe_monotonic_x, reshape,
};
