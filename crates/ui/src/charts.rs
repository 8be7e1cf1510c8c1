use beambench_core::views::{TwissSeries, dedupe_monotonic_x};
use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke};

const CHART_HEIGHT: f32 = 260.0;
const BAND_HEIGHT: f32 = 16.0;
const MARGIN_LEFT: f32 = 48.0;
const MARGIN_BOTTOM: f32 = 22.0;
const MIN_TICK_SPACING_PX: f32 = 70.0;

/// One series polyline color per axis (x, y, z order).
const SERIES_COLORS: [Color32; 3] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
];

/// A colored stretch of the layout strip under the chart.
pub struct SegmentBand {
    pub start: f64,
    pub end: f64,
    pub color: Color32,
    pub name: String,
}

/// Pointer interaction translated back into z coordinates.
#[derive(Default)]
pub struct ChartResponse {
    pub clicked_z: Option<f64>,
    pub hovered_z: Option<f64>,
}

/// Draw one twiss family group: its three axis polylines over the z grid,
/// the beamline layout strip underneath, and the shared z cursor. Pointer
/// position is reported back in z coordinates so the caller can drive the
/// cursor in either click or hover mode.
pub fn twiss_chart(
    ui: &mut egui::Ui,
    series: &[TwissSeries],
    bands: &[SegmentBand],
    cursor_z: Option<f64>,
) -> ChartResponse {
    let width = ui.available_width();
    let (rect, response) = ui.allocate_exact_size(
        egui::vec2(width, CHART_HEIGHT + BAND_HEIGHT),
        Sense::click(),
    );
    if !ui.is_rect_visible(rect) {
        return ChartResponse::default();
    }
    let painter = ui.painter_at(rect);
    let visuals = ui.visuals();

    let plot = Rect::from_min_max(
        Pos2::new(rect.left() + MARGIN_LEFT, rect.top() + 4.0),
        Pos2::new(rect.right() - 8.0, rect.bottom() - BAND_HEIGHT - MARGIN_BOTTOM),
    );
    let band_rect = Rect::from_min_max(
        Pos2::new(plot.left(), rect.bottom() - BAND_HEIGHT),
        Pos2::new(plot.right(), rect.bottom()),
    );

    painter.rect_filled(rect, egui::CornerRadius::same(2), visuals.extreme_bg_color);

    let Some((x_range, y_range)) = data_bounds(series, bands) else {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            "no data",
            FontId::proportional(12.0),
            visuals.weak_text_color(),
        );
        return ChartResponse::default();
    };

    let to_px = |z: f64| -> f32 {
        plot.left() + ((z - x_range.0) / (x_range.1 - x_range.0)) as f32 * plot.width()
    };
    let to_py = |v: f64| -> f32 {
        plot.bottom() - ((v - y_range.0) / (y_range.1 - y_range.0)) as f32 * plot.height()
    };
    let from_px = |px: f32| -> f64 {
        x_range.0 + ((px - plot.left()) / plot.width()) as f64 * (x_range.1 - x_range.0)
    };

    let grid = Stroke::new(0.5, visuals.faint_bg_color.gamma_multiply(4.0));
    let label_color = visuals.weak_text_color();

    // Vertical grid with z labels.
    let x_step = nice_step(x_range.1 - x_range.0, plot.width(), MIN_TICK_SPACING_PX);
    let mut z = (x_range.0 / x_step).ceil() * x_step;
    while z <= x_range.1 {
        let px = to_px(z);
        painter.line_segment(
            [Pos2::new(px, plot.top()), Pos2::new(px, plot.bottom())],
            grid,
        );
        painter.text(
            Pos2::new(px, plot.bottom() + 4.0),
            Align2::CENTER_TOP,
            format_tick(z, x_step),
            FontId::proportional(10.0),
            label_color,
        );
        z += x_step;
    }

    // Horizontal grid with value labels.
    let y_step = nice_step(y_range.1 - y_range.0, plot.height(), 40.0);
    let mut v = (y_range.0 / y_step).ceil() * y_step;
    while v <= y_range.1 {
        let py = to_py(v);
        painter.line_segment(
            [Pos2::new(plot.left(), py), Pos2::new(plot.right(), py)],
            grid,
        );
        painter.text(
            Pos2::new(plot.left() - 4.0, py),
            Align2::RIGHT_CENTER,
            format_tick(v, y_step),
            FontId::proportional(10.0),
            label_color,
        );
        v += y_step;
    }

    // Beamline layout strip.
    for band in bands {
        let r = Rect::from_min_max(
            Pos2::new(to_px(band.start), band_rect.top()),
            Pos2::new(to_px(band.end), band_rect.bottom()),
        );
        painter.rect_filled(r, egui::CornerRadius::ZERO, band.color);
        painter.rect_stroke(
            r,
            egui::CornerRadius::ZERO,
            Stroke::new(0.5, visuals.window_stroke.color),
            egui::StrokeKind::Inside,
        );
    }

    // Series polylines, deduplicated so repeated grid boundaries do not
    // fold the line back on itself.
    for (index, s) in series.iter().enumerate() {
        let color = SERIES_COLORS[index % SERIES_COLORS.len()];
        let points: Vec<Pos2> = dedupe_monotonic_x(&s.data)
            .iter()
            .map(|p| Pos2::new(to_px(p.x), to_py(p.y)))
            .collect();
        if points.len() > 1 {
            painter.add(egui::Shape::line(points, Stroke::new(1.5, color)));
        }
        // Legend entry.
        let legend_y = plot.top() + 6.0 + index as f32 * 14.0;
        painter.line_segment(
            [
                Pos2::new(plot.right() - 58.0, legend_y),
                Pos2::new(plot.right() - 44.0, legend_y),
            ],
            Stroke::new(2.0, color),
        );
        let axis = s.id.rsplit_once(": ").map_or(s.id.as_str(), |(_, a)| a);
        painter.text(
            Pos2::new(plot.right() - 40.0, legend_y),
            Align2::LEFT_CENTER,
            axis,
            FontId::proportional(10.0),
            visuals.text_color(),
        );
    }

    // Shared z cursor over the whole column, strip included.
    if let Some(cz) = cursor_z {
        if cz >= x_range.0 && cz <= x_range.1 {
            let px = to_px(cz);
            painter.line_segment(
                [Pos2::new(px, plot.top()), Pos2::new(px, band_rect.bottom())],
                Stroke::new(1.0, Color32::from_rgb(0xd6, 0x2, 0x28)),
            );
        }
    }

    // Band tooltip.
    if let Some(pos) = response.hover_pos() {
        if band_rect.contains(pos) {
            let z = from_px(pos.x);
            if let Some(band) = bands.iter().find(|b| z >= b.start && z < b.end) {
                response.clone().on_hover_text(format!(
                    "{} [{:.3} m, {:.3} m)",
                    band.name, band.start, band.end
                ));
            }
        }
    }

    let pointer_z = response
        .hover_pos()
        .filter(|pos| pos.x >= plot.left() && pos.x <= plot.right())
        .map(|pos| from_px(pos.x).clamp(x_range.0, x_range.1));

    ChartResponse {
        clicked_z: if response.clicked() { pointer_z } else { None },
        hovered_z: pointer_z,
    }
}

/// Joint bounds of every series plus the layout strip, with a little
/// vertical padding so flat lines stay visible.
fn data_bounds(
    series: &[TwissSeries],
    bands: &[SegmentBand],
) -> Option<((f64, f64), (f64, f64))> {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for s in series {
        for p in &s.data {
            x_min = x_min.min(p.x);
            x_max = x_max.max(p.x);
            y_min = y_min.min(p.y);
            y_max = y_max.max(p.y);
        }
    }
    for band in bands {
        x_min = x_min.min(band.start);
        x_max = x_max.max(band.end);
    }
    if !x_min.is_finite() || !x_max.is_finite() || x_max <= x_min {
        return None;
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        (y_min, y_max) = (0.0, 1.0);
    }
    let pad = ((y_max - y_min) * 0.08).max(1e-9);
    Some(((x_min, x_max), (y_min - pad, y_max + pad)))
}

/// Pick a 1/2/5 ladder step giving roughly one tick per `min_spacing` px.
fn nice_step(span: f64, length_px: f32, min_spacing: f32) -> f64 {
    let target = (length_px / min_spacing).max(2.0) as f64;
    let raw = span / target;
    let magnitude = 10.0_f64.powf(raw.log10().floor());
    for multiple in [1.0, 2.0, 5.0] {
        if magnitude * multiple >= raw {
            return magnitude * multiple;
        }
    }
    magnitude * 10.0
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    };
    format!("{value:.decimals$}")
}

/// Resolve a catalog color into an egui color. Accepts `#rrggbb` hex and the
/// named colors the service's palettes actually use; anything unknown falls
/// back to gray.
pub fn parse_color(name: &str) -> Color32 {
    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() == 6 {
            if let Ok(v) = u32::from_str_radix(hex, 16) {
                return Color32::from_rgb((v >> 16) as u8, (v >> 8) as u8, v as u8);
            }
        }
    }
    match name.to_ascii_lowercase().as_str() {
        "black" => Color32::from_rgb(0x00, 0x00, 0x00),
        "white" => Color32::from_rgb(0xff, 0xff, 0xff),
        "red" => Color32::from_rgb(0xff, 0x00, 0x00),
        "green" => Color32::from_rgb(0x00, 0x80, 0x00),
        "blue" => Color32::from_rgb(0x00, 0x00, 0xff),
        "orange" => Color32::from_rgb(0xff, 0xa5, 0x00),
        "yellow" => Color32::from_rgb(0xff, 0xff, 0x00),
        "purple" => Color32::from_rgb(0x80, 0x00, 0x80),
        "cyan" => Color32::from_rgb(0x00, 0xff, 0xff),
        "magenta" => Color32::from_rgb(0xff, 0x00, 0xff),
        "brown" => Color32::from_rgb(0xa5, 0x2a, 0x2a),
        "pink" => Color32::from_rgb(0xff, 0xc0, 0xcb),
        "hotpink" => Color32::from_rgb(0xff, 0x69, 0xb4),
        "skyblue" => Color32::from_rgb(0x87, 0xce, 0xeb),
        "lightgreen" => Color32::from_rgb(0x90, 0xee, 0x90),
        "lightblue" => Color32::from_rgb(0xad, 0xd8, 0xe6),
        "navy" => Color32::from_rgb(0x00, 0x00, 0x80),
        "teal" => Color32::from_rgb(0x00, 0x80, 0x80),
        "olive" => Color32::from_rgb(0x80, 0x80, 0x00),
        "maroon" => Color32::from_rgb(0x80, 0x00, 0x00),
        "gold" => Color32::from_rgb(0xff, 0xd7, 0x00),
        "silver" => Color32::from_rgb(0xc0, 0xc0, 0xc0),
        "violet" => Color32::from_rgb(0xee, 0x82, 0xee),
        "salmon" => Color32::from_rgb(0xfa, 0x80, 0x72),
        "coral" => Color32::from_rgb(0xff, 0x7f, 0x50),
        "lime" => Color32::from_rgb(0x00, 0xff, 0x00),
        _ => Color32::from_rgb(0x80, 0x80, 0x80),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nice_step_picks_round_values() {
        // 10 m of beamline across 800 px wants roughly 1 m ticks.
        let step = nice_step(10.0, 800.0, 70.0);
        assert!((0.5..=2.0).contains(&step), "step={step}");
        assert_eq!(nice_step(1.0, 800.0, 70.0), 0.1);
    }

    #[test]
    fn tick_labels_match_step_precision() {
        assert_eq!(format_tick(2.0, 1.0), "2");
        assert_eq!(format_tick(0.05, 0.05), "0.05");
        assert_eq!(format_tick(1.5, 0.5), "1.5");
    }

    #[test]
    fn colors_resolve_hex_names_and_fallback() {
        assert_eq!(parse_color("#ff0080"), Color32::from_rgb(0xff, 0x00, 0x80));
        assert_eq!(parse_color("skyblue"), Color32::from_rgb(0x87, 0xce, 0xeb));
        assert_eq!(parse_color("Red"), Color32::from_rgb(0xff, 0x00, 0x00));
        assert_eq!(
            parse_color("definitely-not-a-color"),
            Color32::from_rgb(0x80, 0x80, 0x80)
        );
    }
}
