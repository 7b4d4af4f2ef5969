//! Paints a preview document into egui and records where each element
//! landed so clicks can be mapped back to nodes.

use crate::style::BoxStyle;
use eframe::egui;
use sp_css::Cascade;
use sp_dom::Document;
use sp_dom::NodeHandle;

const SELECTION_STROKE: egui::Color32 = egui::Color32::from_rgb(59, 130, 246);

#[derive(Debug, Clone, Copy, PartialEq)]
struct HitBox {
    element: NodeHandle,
    rect: egui::Rect,
    depth: usize,
}

/// Element rectangles from the last paint.
#[derive(Debug, Clone, Default)]
pub(crate) struct PreviewLayout {
    hits: Vec<HitBox>,
}

impl PreviewLayout {
    /// Deepest element whose box contains `pos`.
    pub(crate) fn element_at(&self, pos: egui::Pos2) -> Option<NodeHandle> {
        self.hits
            .iter()
            .filter(|hit| hit.rect.contains(pos))
            .max_by_key(|hit| hit.depth)
            .map(|hit| hit.element)
    }

    fn rect_of(&self, element: NodeHandle) -> Option<egui::Rect> {
        self.hits
            .iter()
            .find(|hit| hit.element == element)
            .map(|hit| hit.rect)
    }
}

struct Painter<'a> {
    document: &'a Document,
    cascade: Cascade<'a>,
    hits: Vec<HitBox>,
}

pub(crate) fn render_document(
    ui: &mut egui::Ui,
    document: &Document,
    cascade: Cascade<'_>,
    selected: Option<NodeHandle>,
) -> PreviewLayout {
    let mut painter = Painter {
        document,
        cascade,
        hits: Vec::new(),
    };
    let root = document.root();
    ui.vertical(|ui| {
        for child in document.children(root) {
            painter.node(ui, *child, 1);
        }
    });

    let layout = PreviewLayout { hits: painter.hits };
    if let Some(rect) = selected.and_then(|element| layout.rect_of(element)) {
        ui.painter().rect_stroke(
            rect,
            2.0,
            egui::Stroke::new(2.0, SELECTION_STROKE),
            egui::StrokeKind::Outside,
        );
    }
    layout
}

impl Painter<'_> {
    fn node(&mut self, ui: &mut egui::Ui, handle: NodeHandle, depth: usize) {
        if self.document.element(handle).is_none() {
            let text = collapse_whitespace(&self.document.text_content(handle));
            if !text.is_empty() {
                let parent = self.document.parent(handle).unwrap_or(self.document.root());
                let style = BoxStyle::resolve(&self.cascade, self.document, parent);
                ui.label(style.rich_text(text));
            }
            return;
        }

        let style = BoxStyle::resolve(&self.cascade, self.document, handle);
        if style.hidden {
            return;
        }

        let rect = if style.block {
            render_box(ui, &style, |ui| self.children(ui, handle, &style, depth))
        } else {
            render_inline(ui, &style, |ui| self.children(ui, handle, &style, depth))
        };
        self.hits.push(HitBox {
            element: handle,
            rect,
            depth,
        });
    }

    fn children(&mut self, ui: &mut egui::Ui, handle: NodeHandle, style: &BoxStyle, depth: usize) {
        let children = self.document.children(handle).to_vec();
        if style.flex_row || self.is_inline_run(&children) {
            ui.horizontal_wrapped(|ui| {
                ui.spacing_mut().item_spacing.x = if style.flex_row { style.gap } else { 0.0 };
                for child in children {
                    self.node(ui, child, depth + 1);
                }
            });
        } else {
            ui.spacing_mut().item_spacing.y = style.gap;
            for child in children {
                self.node(ui, child, depth + 1);
            }
        }
    }

    /// Text and inline elements only.
    fn is_inline_run(&self, children: &[NodeHandle]) -> bool {
        children.iter().all(|child| {
            self.document.element(*child).is_none()
                || !BoxStyle::resolve(&self.cascade, self.document, *child).block
        })
    }
}

/// Paints margin, background, border and padding around `body` and returns
/// the border box.
fn render_box(ui: &mut egui::Ui, style: &BoxStyle, body: impl FnOnce(&mut egui::Ui)) -> egui::Rect {
    if style.margin.top > 0.0 {
        ui.add_space(style.margin.top);
    }

    let mut rect = egui::Rect::NOTHING;
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        if style.margin.left > 0.0 {
            ui.add_space(style.margin.left);
        }
        let width = (ui.available_width() - style.margin.right).max(1.0);
        let response = ui.allocate_ui_with_layout(
            egui::vec2(width, 0.0),
            egui::Layout::top_down(egui::Align::Min),
            |ui| framed(ui, style, body),
        );
        rect = response.inner;
    });

    if style.margin.bottom > 0.0 {
        ui.add_space(style.margin.bottom);
    }
    rect
}

fn render_inline(ui: &mut egui::Ui, style: &BoxStyle, body: impl FnOnce(&mut egui::Ui)) -> egui::Rect {
    if style.margin.left > 0.0 {
        ui.add_space(style.margin.left);
    }
    let rect = ui.scope(|ui| framed(ui, style, body)).inner;
    if style.margin.right > 0.0 {
        ui.add_space(style.margin.right);
    }
    rect
}

fn framed(ui: &mut egui::Ui, style: &BoxStyle, body: impl FnOnce(&mut egui::Ui)) -> egui::Rect {
    let mut frame = egui::Frame::NONE.corner_radius(style.corner_radius.min(255.0) as u8);
    if let Some(background) = style.background {
        frame = frame.fill(background);
    }
    if let Some(border) = style.border {
        frame = frame.stroke(egui::Stroke::new(1.0, border));
    }

    frame
        .show(ui, |ui| {
            if style.padding.top > 0.0 {
                ui.add_space(style.padding.top);
            }
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 0.0;
                if style.padding.left > 0.0 {
                    ui.add_space(style.padding.left);
                }
                ui.vertical(body);
                if style.padding.right > 0.0 {
                    ui.add_space(style.padding.right);
                }
            });
            if style.padding.bottom > 0.0 {
                ui.add_space(style.padding.bottom);
            }
        })
        .response
        .rect
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::HitBox;
    use super::PreviewLayout;
    use super::collapse_whitespace;
    use eframe::egui;

    #[test]
    fn deepest_box_wins() {
        let layout = PreviewLayout {
            hits: vec![
                HitBox {
                    element: 3,
                    rect: egui::Rect::from_min_size(egui::pos2(10.0, 10.0), egui::vec2(20.0, 20.0)),
                    depth: 2,
                },
                HitBox {
                    element: 1,
                    rect: egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(100.0, 100.0)),
                    depth: 1,
                },
            ],
        };
        assert_eq!(layout.element_at(egui::pos2(15.0, 15.0)), Some(3));
        assert_eq!(layout.element_at(egui::pos2(50.0, 50.0)), Some(1));
        assert_eq!(layout.element_at(egui::pos2(150.0, 50.0)), None);
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(collapse_whitespace("\n  Primary   Button \n"), "Primary Button");
    }
}
