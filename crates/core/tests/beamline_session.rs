//! Integration test: walk a full editing session (catalog load, insert /
//! edit / delete / import, outbound payload), then feed a simulate response
//! through the twiss pipeline and the frame cursor.

use beambench_core::model::{Beamline, BeamlineError, CursorSync, FrameStore, RowEditState, RowMode};
use beambench_core::parsers::parse_twiss;
use beambench_core::validate::{PreflightIssue, preflight};
use beambench_core::views::reshape;
use beambench_protocol::{ImportedBeamline, RESERVED_FIELDS, SegmentCatalog, SimulateResponse};

fn catalog() -> SegmentCatalog {
    serde_json::from_str(
        r#"{
            "driftLattice": {"length": 2, "color": "skyblue"},
            "qpfLattice": {"length": 1, "current": 10, "color": "red"},
            "dipole": {"length": 0.5, "angle": 1.5, "color": "green"}
        }"#,
    )
    .expect("catalog fixture should parse")
}

#[test]
fn editing_session_preserves_positional_invariants() {
    let catalog = catalog();
    let mut beamline = Beamline::new();
    let mut rows = RowEditState::new();

    // Empty beamline fails pre-flight.
    assert_eq!(
        preflight(&beamline, 1000, 0.05),
        [PreflightIssue::EmptyBeamline]
    );

    // Build drift → quad → dipole by catalog clicks.
    let drift = beamline.insert(&catalog, "driftLattice").expect("insert drift");
    let quad = beamline.insert(&catalog, "qpfLattice").expect("insert quad");
    let dipole = beamline.insert(&catalog, "dipole").expect("insert dipole");
    assert_eq!(beamline.total_length(), 3.5);

    // Edit the drift length while its row is open; the following segments
    // shift immediately (commit-live, no cancel).
    assert_eq!(rows.toggle(drift), RowMode::Edit);
    beamline.set_field(drift, "length", "3").expect("edit length");
    assert_eq!(rows.toggle(drift), RowMode::View);
    let segments = beamline.segments();
    assert_eq!(segments[1].start_pos, 3.0);
    assert_eq!(segments[2].start_pos, 4.0);
    assert_eq!(beamline.total_length(), 4.5);

    // Reserved fields stay system-owned from the table too.
    assert_eq!(
        beamline.set_field(quad, "startPos", "0"),
        Err(BeamlineError::ReservedFieldViolation("startPos".into()))
    );

    // Delete the quad; dipole closes the gap, ids untouched.
    beamline.delete(quad).expect("delete quad");
    rows.prune(beamline.segments().iter().map(|s| s.id));
    assert_eq!(beamline.segments()[1].id, dipole);
    assert_eq!(beamline.segments()[1].start_pos, 3.0);

    // A failed import leaves everything as-is...
    let before = beamline.clone();
    let bad: ImportedBeamline =
        serde_json::from_str(r#"[{"qpfLattice": {}}, {"undulator": {"length": 9}}]"#)
            .expect("import fixture");
    assert_eq!(
        beamline.replace_all(&catalog, &bad),
        Err(BeamlineError::UnknownSegmentType("undulator".into()))
    );
    assert_eq!(beamline, before);

    // ...while a good one replaces wholesale with rederived reserved fields.
    let good: ImportedBeamline = serde_json::from_str(
        r#"[{"qpfLattice": {"length": 2, "color": "hotpink"}}, {"driftLattice": {"length": 1}}]"#,
    )
    .expect("import fixture");
    beamline.replace_all(&catalog, &good).expect("import");
    rows.prune(beamline.segments().iter().map(|s| s.id));
    let segments = beamline.segments();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].color, "red");
    assert_eq!((segments[1].start_pos, segments[1].end_pos), (2.0, 3.0));
    assert_eq!(rows.mode(segments[0].id), RowMode::View);

    // The outbound view carries physical parameters only.
    let payload = beamline.outbound_payload();
    assert_eq!(payload[0].segment_name, "qpfLattice");
    assert_eq!(payload[0].parameters["current"], 10.0);
    for entry in &payload {
        for field in RESERVED_FIELDS {
            assert!(!entry.parameters.contains_key(field));
        }
    }

    assert!(preflight(&beamline, 1000, 0.05).is_empty());
}

#[test]
fn simulate_response_flows_into_charts_and_cursor() {
    let raw = r#"{
        "images": {"0.0": "frame-zero", "0.05": "frame-one", "0.1": "frame-two"},
        "line_graph": {
            "axis": "b3ZlcnZpZXc=",
            "twiss": "{\"$\\\\epsilon$ ($\\\\pi$.mm.mrad)\": {\"x\": [0.5, 0.6, 0.7], \"y\": [0.6, 0.7, 0.8], \"z\": [100.0, 101.0, 102.0]}, \"$\\\\alpha$\": {\"x\": [0.1, 0.2, 0.3], \"y\": [-0.2, -0.1, 0.0], \"z\": [0.0, 0.0, 0.0]}}",
            "x_axis": [0.0, 0.05, 0.1]
        }
    }"#;
    let response: SimulateResponse = serde_json::from_str(raw).expect("response fixture");

    // Twiss string → nested table → chart groups.
    let table = parse_twiss(&response.line_graph.twiss).expect("parse twiss");
    let order: Vec<&str> = table.keys().map(String::as_str).collect();
    let reshaped = reshape(&table, &response.line_graph.x_axis, &order);
    assert!(reshaped.warnings.is_empty());
    assert_eq!(reshaped.groups.len(), 2);
    let alpha = &reshaped.groups["$\\alpha$"];
    assert_eq!(alpha.len(), 3);
    assert_eq!(alpha[1].id, "$\\alpha$: y");
    assert_eq!(alpha[1].data[2].x, 0.1);
    assert_eq!(alpha[1].data[2].y, 0.0);

    // Image map → frame store; the cursor resets to the grid origin when a
    // response lands, then snaps to the nearest key as the user scrubs.
    let (frames, warnings) = FrameStore::from_images(&response.images);
    assert!(warnings.is_empty());
    let mut cursor = CursorSync::new();
    cursor.set_z(7.3);
    cursor.reset();
    assert_eq!(
        cursor.resolve_frame(&frames).map(|f| f.image.as_str()),
        Some("frame-zero")
    );

    cursor.set_scroll_mode(true);
    cursor.on_hover_move(0.052);
    assert_eq!(
        cursor.resolve_frame(&frames).map(|f| f.image.as_str()),
        Some("frame-one")
    );

    // Empty store yields the sentinel, never a stale frame.
    assert!(cursor.resolve_frame(&FrameStore::default()).is_none());
}
