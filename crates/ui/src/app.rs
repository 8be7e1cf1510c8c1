use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use eframe::egui;

use beambench_core::model::{Beamline, CursorSync, FrameStore, RowEditState, RowMode};
use beambench_core::parsers::parse_twiss;
use beambench_core::validate::preflight;
use beambench_core::views::{TWISS_FAMILY_ORDER, TwissGroups, reshape};
use beambench_protocol::{ImportedBeamline, SegmentCatalog, SimulateRequest, SimulateResponse};

use crate::charts::{self, SegmentBand};
use crate::client::SimClient;

const BEAM_TYPES: [&str; 2] = ["electron", "proton"];

/// Completed worker-thread calls, drained at the top of every frame.
/// Last writer wins when responses overlap.
enum NetEvent {
    Catalog(Result<SegmentCatalog, String>),
    Imported(Result<ImportedBeamline, String>),
    Simulated(Box<Result<SimulateResponse, String>>),
}

enum Status {
    Idle,
    Info(String),
    Error(String),
}

/// Main application state.
pub struct BeamBenchApp {
    client: Arc<SimClient>,
    events: Receiver<NetEvent>,
    sender: Sender<NetEvent>,

    catalog: Option<SegmentCatalog>,
    catalog_loading: bool,
    beamline: Beamline,
    rows: RowEditState,
    /// In-progress cell text per (row id, field), kept while a row is open
    /// so invalid intermediate input doesn't snap back mid-keystroke.
    drafts: HashMap<(u32, String), String>,

    /// Beam settings for the next simulate call; `beamline_data` is filled
    /// in at send time.
    request: SimulateRequest,
    simulating: bool,

    cursor: CursorSync,
    frames: FrameStore,
    twiss: TwissGroups,
    selected_family: usize,
    overview_png: Option<Vec<u8>>,
    /// Decoded png for the frame the cursor currently resolves to.
    frame_cache: Option<(f64, Vec<u8>)>,
    /// Bumped on every applied response so image URIs never collide with a
    /// previous grid's.
    epoch: u64,

    status: Status,
    warnings: Vec<String>,
}

impl BeamBenchApp {
    pub fn new(cc: &eframe::CreationContext<'_>, client: Arc<SimClient>) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        let (sender, events) = channel();
        let mut app = Self {
            client,
            events,
            sender,
            catalog: None,
            catalog_loading: false,
            beamline: Beamline::new(),
            rows: RowEditState::new(),
            drafts: HashMap::new(),
            request: SimulateRequest::default(),
            simulating: false,
            cursor: CursorSync::new(),
            frames: FrameStore::default(),
            twiss: TwissGroups::default(),
            selected_family: 0,
            overview_png: None,
            frame_cache: None,
            epoch: 0,
            status: Status::Idle,
            warnings: Vec::new(),
        };
        app.fetch_catalog(&cc.egui_ctx);
        app
    }

    fn fetch_catalog(&mut self, ctx: &egui::Context) {
        self.catalog_loading = true;
        let client = self.client.clone();
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = client.fetch_catalog().map_err(|e| format!("{e:#}"));
            let _ = sender.send(NetEvent::Catalog(result));
            ctx.request_repaint();
        });
    }

    fn import_spreadsheet(&mut self, ctx: &egui::Context, path: PathBuf) {
        let client = self.client.clone();
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        self.status = Status::Info(format!("importing {}", path.display()));
        std::thread::spawn(move || {
            let result = client
                .import_spreadsheet(&path)
                .map_err(|e| format!("{e:#}"));
            let _ = sender.send(NetEvent::Imported(result));
            ctx.request_repaint();
        });
    }

    fn send_simulate(&mut self, ctx: &egui::Context) {
        let mut request = self.request.clone();
        request.beamline_data = self.beamline.outbound_payload();
        self.simulating = true;
        self.status = Status::Info("simulation running".to_owned());
        let client = self.client.clone();
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = client.simulate(&request).map_err(|e| format!("{e:#}"));
            let _ = sender.send(NetEvent::Simulated(Box::new(result)));
            ctx.request_repaint();
        });
    }

    fn handle_event(&mut self, ctx: &egui::Context, event: NetEvent) {
        match event {
            NetEvent::Catalog(Ok(catalog)) => {
                self.status =
                    Status::Info(format!("catalog loaded: {} segment types", catalog.len()));
                self.catalog = Some(catalog);
                self.catalog_loading = false;
            }
            NetEvent::Catalog(Err(e)) => {
                self.catalog_loading = false;
                self.status = Status::Error(e);
            }
            NetEvent::Imported(Ok(imported)) => {
                let Some(catalog) = &self.catalog else {
                    self.status = Status::Error("catalog not loaded yet".to_owned());
                    return;
                };
                match self.beamline.replace_all(catalog, &imported) {
                    Ok(()) => {
                        self.rows.clear();
                        self.drafts.clear();
                        self.status = Status::Info(format!(
                            "imported {} segments",
                            self.beamline.len()
                        ));
                    }
                    Err(e) => self.status = Status::Error(format!("import rejected: {e}")),
                }
            }
            NetEvent::Imported(Err(e)) => self.status = Status::Error(e),
            NetEvent::Simulated(result) => {
                self.simulating = false;
                match *result {
                    Ok(response) => self.apply_simulation(ctx, response),
                    Err(e) => self.status = Status::Error(e),
                }
            }
        }
    }

    /// Install one simulate response: replace the frame grid wholesale,
    /// reset the cursor to the new grid's origin, and rebuild the chart
    /// groups. Shape problems downgrade to warnings where possible.
    fn apply_simulation(&mut self, ctx: &egui::Context, response: SimulateResponse) {
        let (frames, mut warnings) = FrameStore::from_images(&response.images);
        self.frames = frames;
        self.cursor.reset();
        self.frame_cache = None;
        self.epoch += 1;
        ctx.forget_all_images();

        self.overview_png = match BASE64.decode(response.line_graph.axis.as_bytes()) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warnings.push(format!("overview image did not decode: {e}"));
                None
            }
        };

        match parse_twiss(&response.line_graph.twiss) {
            Ok(table) => {
                let groups = reshape(&table, &response.line_graph.x_axis, &TWISS_FAMILY_ORDER);
                warnings.extend(groups.warnings.iter().cloned());
                self.selected_family = 0;
                self.status = Status::Info(format!(
                    "simulation finished: {} frames, {} parameter groups",
                    self.frames.len(),
                    groups.groups.len()
                ));
                self.twiss = groups;
            }
            Err(e) => {
                self.twiss = TwissGroups::default();
                self.status = Status::Error(format!("twiss payload unusable: {e}"));
            }
        }
        self.warnings = warnings;
    }

    /// Decoded png for the current frame, cached until the cursor resolves
    /// to a different z.
    fn current_frame_png(&mut self) -> Option<(f64, Vec<u8>)> {
        let (z, image) = {
            let frame = self.cursor.resolve_frame(&self.frames)?;
            (frame.z, frame.image.clone())
        };
        if let Some((cached_z, bytes)) = &self.frame_cache {
            if *cached_z == z {
                return Some((z, bytes.clone()));
            }
        }
        match BASE64.decode(image.as_bytes()) {
            Ok(bytes) => {
                self.frame_cache = Some((z, bytes.clone()));
                Some((z, bytes))
            }
            Err(e) => {
                self.status = Status::Error(format!("frame at z={z} did not decode: {e}"));
                None
            }
        }
    }

    fn side_panel(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.heading("beambench");
        ui.label(
            egui::RichText::new(self.client.base_url())
                .small()
                .weak(),
        );
        ui.separator();

        ui.strong("Segments");
        let mut add: Option<String> = None;
        match &self.catalog {
            Some(catalog) => {
                for (name, defaults) in catalog {
                    let button = egui::Button::new(
                        egui::RichText::new(name).color(egui::Color32::BLACK),
                    )
                    .fill(charts::parse_color(&defaults.color));
                    if ui.add(button).clicked() {
                        add = Some(name.clone());
                    }
                }
            }
            None if self.catalog_loading => {
                ui.spinner();
            }
            None => {
                if ui.button("Reload catalog").clicked() {
                    self.fetch_catalog(ctx);
                }
            }
        }
        if let Some(name) = add {
            if let Some(catalog) = &self.catalog {
                if let Err(e) = self.beamline.insert(catalog, &name) {
                    self.status = Status::Error(e.to_string());
                }
            }
        }

        ui.separator();
        ui.strong("Beam");
        egui::Grid::new("beam_settings").num_columns(2).show(ui, |ui| {
            ui.label("type");
            egui::ComboBox::from_id_salt("beam_type")
                .selected_text(self.request.beam_type.clone())
                .show_ui(ui, |ui| {
                    for t in BEAM_TYPES {
                        ui.selectable_value(&mut self.request.beam_type, t.to_owned(), t);
                    }
                });
            ui.end_row();

            ui.label("particles");
            ui.add(egui::DragValue::new(&mut self.request.num_particles).speed(10));
            ui.end_row();

            ui.label("kinetic E (MeV)");
            ui.add(egui::DragValue::new(&mut self.request.kinetic_e).speed(1));
            ui.end_row();

            ui.label("interval (m)");
            ui.add(egui::DragValue::new(&mut self.request.interval).speed(0.01));
            ui.end_row();
        });
        ui.checkbox(&mut self.request.define_lim, "define limits");
        ui.checkbox(&mut self.request.match_scaling, "match scaling");
        ui.checkbox(&mut self.request.scatter, "scatter");
        ui.checkbox(&mut self.request.save_data, "save data server-side");

        ui.separator();
        let issues = preflight(
            &self.beamline,
            self.request.num_particles,
            self.request.interval,
        );
        for issue in &issues {
            ui.colored_label(ui.visuals().error_fg_color, issue.to_string());
        }
        let ready = issues.is_empty() && !self.simulating;
        ui.horizontal(|ui| {
            if ui
                .add_enabled(ready, egui::Button::new("Simulate"))
                .clicked()
            {
                self.send_simulate(ctx);
            }
            if ui.button("Import spreadsheet").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Spreadsheet", &["xlsx", "xls"])
                    .pick_file()
                {
                    self.import_spreadsheet(ctx, path);
                }
            }
        });
    }

    fn segment_table(&mut self, ui: &mut egui::Ui) {
        if self.beamline.is_empty() {
            ui.label("No segments yet. Add some from the catalog or import a spreadsheet.");
            return;
        }

        let mut edits: Vec<(u32, String, String)> = Vec::new();
        let mut toggles: Vec<u32> = Vec::new();
        let mut deletes: Vec<u32> = Vec::new();

        let Self {
            beamline,
            rows,
            drafts,
            ..
        } = self;
        egui::Grid::new("segment_table")
            .num_columns(5)
            .striped(true)
            .min_col_width(40.0)
            .show(ui, |ui| {
                ui.strong("type");
                ui.strong("start (m)");
                ui.strong("end (m)");
                ui.strong("parameters");
                ui.strong("");
                ui.end_row();

                for segment in beamline.segments() {
                    let mode = rows.mode(segment.id);
                    ui.label(&segment.name);
                    ui.label(format!("{:.3}", segment.start_pos));
                    ui.label(format!("{:.3}", segment.end_pos));

                    ui.horizontal_wrapped(|ui| match mode {
                        RowMode::View => {
                            for (field, value) in segment.params() {
                                ui.label(format!("{field} = {value}"));
                            }
                        }
                        RowMode::Edit => {
                            for (field, value) in segment.params() {
                                ui.label(field);
                                let draft = drafts
                                    .entry((segment.id, field.clone()))
                                    .or_insert_with(|| value.to_string());
                                let response = ui.add(
                                    egui::TextEdit::singleline(draft).desired_width(56.0),
                                );
                                if response.changed() {
                                    edits.push((segment.id, field.clone(), draft.clone()));
                                }
                            }
                        }
                    });

                    ui.horizontal(|ui| {
                        let label = match mode {
                            RowMode::View => "Edit",
                            RowMode::Edit => "Done",
                        };
                        if ui.small_button(label).clicked() {
                            toggles.push(segment.id);
                        }
                        if ui.small_button("Delete").clicked() {
                            deletes.push(segment.id);
                        }
                    });
                    ui.end_row();
                }
            });

        // Edits commit to the model as they are typed; a row leaving edit
        // mode just drops its draft buffers, there is nothing to roll back.
        for (id, field, raw) in edits {
            if let Err(e) = self.beamline.set_field(id, &field, &raw) {
                self.status = Status::Error(e.to_string());
            }
        }
        for id in toggles {
            if self.rows.toggle(id) == RowMode::View {
                self.drafts.retain(|(row, _), _| *row != id);
            }
        }
        for id in deletes {
            // An already-gone row is a no-op, not an error.
            let _ = self.beamline.delete(id);
            self.drafts.retain(|(row, _), _| *row != id);
        }
        if !self.beamline.is_empty() {
            ui.label(format!(
                "total length: {:.3} m",
                self.beamline.total_length()
            ));
        }
        self.rows.prune(self.beamline.segments().iter().map(|s| s.id));
    }

    fn chart_section(&mut self, ui: &mut egui::Ui) {
        if self.twiss.groups.is_empty() {
            return;
        }

        self.selected_family = self.selected_family.min(self.twiss.groups.len() - 1);
        ui.horizontal(|ui| {
            if ui.button("◀").clicked() && self.selected_family > 0 {
                self.selected_family -= 1;
            }
            let family = self
                .twiss
                .groups
                .get_index(self.selected_family)
                .map(|(name, _)| name.clone())
                .unwrap_or_default();
            ui.strong(format!(
                "{family}  ({}/{})",
                self.selected_family + 1,
                self.twiss.groups.len()
            ));
            if ui.button("▶").clicked() && self.selected_family + 1 < self.twiss.groups.len() {
                self.selected_family += 1;
            }
        });

        let bands: Vec<SegmentBand> = self
            .beamline
            .segments()
            .iter()
            .map(|s| SegmentBand {
                start: s.start_pos,
                end: s.end_pos,
                color: charts::parse_color(&s.color),
                name: s.name.clone(),
            })
            .collect();
        let series = self
            .twiss
            .groups
            .get_index(self.selected_family)
            .map(|(_, series)| series.as_slice())
            .unwrap_or_default();
        let response = charts::twiss_chart(
            ui,
            series,
            &bands,
            Some(self.cursor.current_z()),
        );
        if let Some(z) = response.clicked_z {
            self.cursor.set_z(z);
        } else if let Some(z) = response.hovered_z {
            self.cursor.on_hover_move(z);
        }

        for warning in &self.warnings {
            ui.label(egui::RichText::new(warning).small().weak());
        }
    }

    fn frame_section(&mut self, ui: &mut egui::Ui) {
        if self.frames.is_empty() {
            return;
        }
        ui.separator();
        ui.horizontal(|ui| {
            ui.strong("Phase space");
            let mut scroll = self.cursor.scroll_mode();
            ui.checkbox(&mut scroll, "follow hover");
            self.cursor.set_scroll_mode(scroll);
        });

        let epoch = self.epoch;
        if let Some((z, bytes)) = self.current_frame_png() {
            let location = self
                .beamline
                .segment_at(z)
                .and_then(|i| self.beamline.segments().get(i))
                .map(|s| format!(" in {}", s.name))
                .unwrap_or_default();
            ui.label(format!("z = {z} m{location}"));
            ui.add(
                egui::Image::from_bytes(format!("bytes://frame-{epoch}-{z}.png"), bytes)
                    .max_height(380.0)
                    .max_width(ui.available_width()),
            );
        }

        if let Some(bytes) = &self.overview_png {
            ui.collapsing("Service overview", |ui| {
                ui.add(
                    egui::Image::from_bytes(
                        format!("bytes://overview-{epoch}.png"),
                        bytes.clone(),
                    )
                    .max_width(ui.available_width()),
                );
            });
        }
    }
}

impl eframe::App for BeamBenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(ctx, event);
        }

        egui::SidePanel::left("controls")
            .default_width(230.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.side_panel(ctx, ui);
                });
            });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.simulating {
                    ui.spinner();
                }
                match &self.status {
                    Status::Idle => {
                        ui.label("Ready");
                    }
                    Status::Info(message) => {
                        ui.label(message);
                    }
                    Status::Error(message) => {
                        ui.colored_label(ui.visuals().error_fg_color, message);
                    }
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.segment_table(ui);
                ui.separator();
                self.chart_section(ui);
                self.frame_section(ui);
            });
        });
    }
}
