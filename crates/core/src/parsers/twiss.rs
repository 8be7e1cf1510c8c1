use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

/// Parsed twiss table: parameter family → spatial axis → per-z values.
///
/// Key order is the structure's own order on the wire and is preserved; the
/// reshaper iterates it as-is.
pub type TwissTable = IndexMap<String, IndexMap<String, Vec<f64>>>;

#[derive(Debug, Error)]
pub enum TwissParseError {
    #[error("twiss payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("twiss family `{0}` is not an object of per-axis arrays")]
    FamilyShape(String),
    #[error("twiss axis `{family}.{axis}` is not an array")]
    AxisShape { family: String, axis: String },
    #[error("twiss payload is not an object")]
    NotAnObject,
}

/// Parse the simulation response's `twiss` member.
///
/// The service serializes a families × axes table of per-z value lists as a
/// JSON *string* (a dataframe dump), e.g.
/// `{"$\\alpha$": {"x": [0.1, ...], "y": [...], "z": [...]}, ...}`.
/// Null or otherwise non-numeric cells become NaN and are stripped later by
/// the chart reshaper's finite filter.
pub fn parse_twiss(raw: &str) -> Result<TwissTable, TwissParseError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(families) = value else {
        return Err(TwissParseError::NotAnObject);
    };

    let mut table = TwissTable::with_capacity(families.len());
    for (family, axes_value) in families {
        let Value::Object(axes) = axes_value else {
            return Err(TwissParseError::FamilyShape(family));
        };
        let mut parsed_axes = IndexMap::with_capacity(axes.len());
        for (axis, values) in axes {
            let Value::Array(items) = values else {
                return Err(TwissParseError::AxisShape {
                    family: family.clone(),
                    axis,
                });
            };
            let series = items
                .iter()
                .map(|v| v.as_f64().unwrap_or(f64::NAN))
                .collect();
            parsed_axes.insert(axis, series);
        }
        table.insert(family, parsed_axes);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_family_axis_table_in_order() {
        let raw = r#"{
            "$\\epsilon$ ($\\pi$.mm.mrad)": {"x": [0.5, 0.6], "y": [0.6, 0.7], "z": [100.0, 101.0]},
            "$\\alpha$": {"x": [0.1, 0.2], "y": [-0.2, -0.1], "z": [0.0, 0.0]}
        }"#;
        let table = parse_twiss(raw).unwrap();
        let families: Vec<&str> = table.keys().map(String::as_str).collect();
        assert_eq!(families, ["$\\epsilon$ ($\\pi$.mm.mrad)", "$\\alpha$"]);
        let axes: Vec<&str> = table["$\\alpha$"].keys().map(String::as_str).collect();
        assert_eq!(axes, ["x", "y", "z"]);
        assert_eq!(table["$\\alpha$"]["y"], [-0.2, -0.1]);
    }

    #[test]
    fn null_cells_become_nan() {
        let table = parse_twiss(r#"{"$\\beta$ (m)": {"x": [1.0, null, 3.0]}}"#).unwrap();
        let xs = &table["$\\beta$ (m)"]["x"];
        assert_eq!(xs.len(), 3);
        assert!(xs[1].is_nan());
    }

    #[test]
    fn rejects_wrong_shapes() {
        assert!(matches!(
            parse_twiss("[1, 2]"),
            Err(TwissParseError::NotAnObject)
        ));
        assert!(matches!(
            parse_twiss(r#"{"a": 3}"#),
            Err(TwissParseError::FamilyShape(_))
        ));
        assert!(matches!(
            parse_twiss(r#"{"a": {"x": 3}}"#),
            Err(TwissParseError::AxisShape { .. })
        ));
        assert!(parse_twiss("not json").is_err());
    }
}
