use crate::preview;
use crate::preview::PreviewLayout;
use eframe::egui;
use sp_core::EditorError;
use sp_core::constants::POPOVER_WIDTH;
use sp_css::Cascade;
use sp_css::CssParser;
use sp_css::DEFAULT_PREVIEW_CSS;
use sp_css::StyleSheet;
use sp_dom::NodePath;
use sp_session::KeyInput;
use sp_session::PreviewClick;
use sp_session::SessionStore;
use sp_style::StyleProperty;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(200, 65, 65);
const HINT_COLOR: egui::Color32 = egui::Color32::from_rgb(120, 120, 120);
const EDITOR_WIDTH: f32 = 520.0;

pub(crate) struct StylepadApp {
    session: SessionStore,
    stylesheet: StyleSheet,
    editor_text: String,
    /// Text buffers of the popover fields, seeded when the selection changes.
    fields: BTreeMap<StyleProperty, String>,
    fields_for: Option<NodePath>,
    layout: PreviewLayout,
    preview_rect: Option<egui::Rect>,
    popover_rect: Option<egui::Rect>,
}

impl StylepadApp {
    pub(crate) fn new(session: SessionStore) -> Self {
        let editor_text = session.source().to_owned();
        Self {
            session,
            stylesheet: CssParser.parse(DEFAULT_PREVIEW_CSS),
            editor_text,
            fields: BTreeMap::new(),
            fields_for: None,
            layout: PreviewLayout::default(),
            preview_rect: None,
            popover_rect: None,
        }
    }

    fn handle_pointer(&mut self, ctx: &egui::Context) {
        let (clicked, pos, alt, escape) = ctx.input(|input| {
            (
                input.pointer.primary_clicked(),
                input.pointer.interact_pos(),
                input.modifiers.alt,
                input.key_pressed(egui::Key::Escape),
            )
        });

        if escape {
            self.session.handle_key(KeyInput::Escape);
        }
        let (true, Some(pos)) = (clicked, pos) else {
            return;
        };

        let on_popover = self.popover_rect.is_some_and(|rect| rect.contains(pos));
        let in_preview = self.preview_rect.is_some_and(|rect| rect.contains(pos));
        let target = in_preview.then(|| self.layout.element_at(pos)).flatten();
        let click = PreviewClick {
            target,
            x: pos.x,
            y: pos.y,
            alt: alt && in_preview,
            on_popover,
        };
        if self.session.handle_click(click) {
            debug!(alt, ?target, "selection changed by click");
        }
    }

    fn sync_fields(&mut self) {
        let selected = self.session.selection().map(|selected| selected.path.clone());
        if selected == self.fields_for {
            return;
        }
        self.fields = self
            .session
            .current_styles()
            .map(|styles| {
                StyleProperty::ALL
                    .into_iter()
                    .map(|property| (property, styles.value(property).to_owned()))
                    .collect()
            })
            .unwrap_or_default();
        self.fields_for = selected;
    }

    fn render_editor(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Component");
            ui.label(egui::RichText::new(&self.session.config().component_filename).color(HINT_COLOR));
        });
        ui.separator();

        if self.editor_text != self.session.source() {
            self.editor_text = self.session.source().to_owned();
        }
        egui::ScrollArea::vertical()
            .id_salt("source_editor_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let response = ui.add_sized(
                    ui.available_size(),
                    egui::TextEdit::multiline(&mut self.editor_text)
                        .code_editor()
                        .desired_rows(32),
                );
                if response.changed() {
                    self.session.set_source(self.editor_text.clone());
                }
            });
    }

    fn render_preview(&mut self, ui: &mut egui::Ui) {
        if let Some(error) = self.session.compile_error() {
            error_panel(ui, error);
            self.layout = PreviewLayout::default();
            return;
        }
        if let Some(error) = self.session.runtime_error() {
            error_panel(ui, error);
            self.layout = PreviewLayout::default();
            return;
        }
        let Some(frame) = self.session.frame() else {
            ui.label("Loading preview...");
            return;
        };

        let selected = self.session.selection().map(|selected| selected.element);
        let cascade = Cascade::new(&self.stylesheet);
        let painted = egui::Frame::NONE
            .fill(egui::Color32::WHITE)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("preview_scroll")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        preview::render_document(ui, frame.document(), cascade, selected)
                    })
                    .inner
            });
        self.layout = painted.inner;
        self.preview_rect = Some(painted.response.rect);
    }

    fn render_popover(&mut self, ctx: &egui::Context) {
        let (Some(popover), Some(path)) = (
            self.session.popover(),
            self.session.selection().map(|selected| selected.path.clone()),
        ) else {
            self.popover_rect = None;
            return;
        };

        let mut close = false;
        let mut edits = Vec::new();
        let area = egui::Area::new(egui::Id::new(&self.session.config().popover_class))
            .order(egui::Order::Foreground)
            .fixed_pos(egui::pos2(popover.x - POPOVER_WIDTH / 2.0, popover.y))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(POPOVER_WIDTH);
                    ui.horizontal(|ui| {
                        ui.strong("Edit Styles");
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            close = ui.small_button("x").on_hover_text("Close style editor").clicked();
                        });
                    });
                    ui.separator();

                    for property in StyleProperty::ALL {
                        ui.label(egui::RichText::new(property.label()).small());
                        let buffer = self.fields.entry(property).or_default();
                        let response = ui.add(
                            egui::TextEdit::singleline(buffer)
                                .hint_text(property.placeholder())
                                .desired_width(f32::INFINITY),
                        );
                        if response.changed() {
                            edits.push((property, buffer.clone()));
                        }
                    }

                    ui.separator();
                    ui.label(
                        egui::RichText::new(format!("Node: {path}"))
                            .monospace()
                            .small()
                            .color(HINT_COLOR),
                    );
                });
            });
        self.popover_rect = Some(area.response.rect);

        for (property, value) in edits {
            self.session.update_style(property, value);
        }
        if close {
            self.session.close_popover();
        }
    }
}

fn error_panel(ui: &mut egui::Ui, error: &EditorError) {
    egui::Frame::NONE
        .stroke(egui::Stroke::new(1.0, ERROR_COLOR))
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.colored_label(ERROR_COLOR, egui::RichText::new(error.title()).strong());
            ui.label(egui::RichText::new(error.to_string()).monospace().size(12.0));
            ui.label(egui::RichText::new(error.code()).small().color(HINT_COLOR));
        });
}

impl eframe::App for StylepadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.session.tick();
        if self.session.patch_pending() {
            ctx.request_repaint_after(self.session.config().sync_guard_window() + Duration::from_millis(5));
        }
        self.handle_pointer(ctx);
        self.sync_fields();

        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                match self.session.component_name() {
                    Some(name) => ui.label(format!("Component: {name}")),
                    None => ui.label("Component: -"),
                };
                ui.separator();
                ui.label(format!("Render #{}", self.session.render_key()));
                ui.separator();
                ui.label(format!("Overrides: {}", self.session.overrides().len()));
                if !self.session.overrides().is_empty() && ui.button("Clear overrides").clicked() {
                    self.session.clear_overrides();
                }
                ui.separator();
                ui.label(egui::RichText::new("Alt+click an element to edit its styles").color(HINT_COLOR));
            });
        });

        egui::SidePanel::left("editor_panel")
            .resizable(true)
            .default_width(EDITOR_WIDTH)
            .show(ctx, |ui| self.render_editor(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.render_preview(ui));

        self.render_popover(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.session.unmount();
    }
}
