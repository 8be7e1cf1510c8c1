use indexmap::IndexMap;

use crate::parsers::TwissTable;

/// The service's twiss column order (dataframe column labels, TeX-flavored).
/// Used as the default family-order list for positional grouping.
pub const TWISS_FAMILY_ORDER: [&str; 5] = [
    "$\\epsilon$ ($\\pi$.mm.mrad)",
    "$\\alpha$",
    "$\\beta$ (m)",
    "$D$ (mm)",
    "$D'$ (mrad)",
];

/// Every parameter family must carry exactly this many axis series (x, y, z),
/// in the same relative order. The grouping below is index arithmetic over
/// the flattened sequence and silently mislabels if this ever fails to hold,
/// so inconsistent families are dropped before flattening.
pub const AXES_PER_FAMILY: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    /// z position in meters.
    pub x: f64,
    pub y: f64,
}

/// One chart-ready curve. `id` encodes "<family>: <axis>".
#[derive(Debug, Clone, PartialEq)]
pub struct TwissSeries {
    pub id: String,
    pub data: Vec<ChartPoint>,
}

/// Reshaped twiss data: family label → its 3 axis series, plus any shape
/// warnings collected along the way.
#[derive(Debug, Clone, Default)]
pub struct TwissGroups {
    pub groups: IndexMap<String, Vec<TwissSeries>>,
    pub warnings: Vec<String>,
}

/// Reshape the parsed twiss table into per-family chart groups.
///
/// Flattens families in the table's own key order (axes likewise), zips each
/// series with the z grid, strips non-finite points, then chunks the
/// flattened sequence into groups of 3; the i-th chunk is labeled
/// `family_order[i]`. Shape problems degrade to warnings: families without
/// exactly 3 axes are dropped, sample-count mismatches zip to the shorter
/// side, and an exhausted family-order list falls back to the family portion
/// of the chunk's first series id.
pub fn reshape(table: &TwissTable, x_axis: &[f64], family_order: &[&str]) -> TwissGroups {
    let mut warnings = Vec::new();

    let mut flattened: Vec<TwissSeries> = Vec::new();
    for (family, axes) in table {
        if axes.len() != AXES_PER_FAMILY {
            warnings.push(format!(
                "family `{family}` has {} axis series, expected {AXES_PER_FAMILY}; dropped",
                axes.len()
            ));
            continue;
        }
        for (axis, values) in axes {
            if values.len() != x_axis.len() {
                warnings.push(format!(
                    "series `{family}: {axis}` has {} samples but the z grid has {}; \
                     unmatched samples dropped",
                    values.len(),
                    x_axis.len()
                ));
            }
            let data = x_axis
                .iter()
                .zip(values)
                .map(|(&x, &y)| ChartPoint { x, y })
                .filter(|p| p.x.is_finite() && p.y.is_finite())
                .collect();
            flattened.push(TwissSeries {
                id: format!("{family}: {axis}"),
                data,
            });
        }
    }

    let mut groups = IndexMap::new();
    for (index, chunk) in flattened.chunks(AXES_PER_FAMILY).enumerate() {
        let label = match family_order.get(index) {
            Some(name) => (*name).to_owned(),
            None => {
                let fallback = chunk[0]
                    .id
                    .rsplit_once(": ")
                    .map(|(family, _)| family.to_owned())
                    .unwrap_or_else(|| chunk[0].id.clone());
                warnings.push(format!(
                    "family order list exhausted at group {index}; using `{fallback}` from the \
                     series id"
                ));
                fallback
            }
        };
        groups.insert(label, chunk.to_vec());
    }

    TwissGroups { groups, warnings }
}

/// Keep-first deduplication of points sharing an x value, for chart backends
/// that require strictly monotonic x. The reshaper guarantees grid alignment
/// but not x-uniqueness (the service grid can repeat a rounded boundary z).
pub fn dedupe_monotonic_x(points: &[ChartPoint]) -> Vec<ChartPoint> {
    let mut out: Vec<ChartPoint> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().is_none_or(|prev| prev.x != p.x) {
            out.push(*p);
        }
    }
    out
}
