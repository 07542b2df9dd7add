//! UI components for SkyGlass.
//!
//! This module contains the dashboard panels drawn by the main window.

pub mod current_panel;
pub mod forecast_strip;
pub mod overlay_panel;

pub use current_panel::CurrentPanel;
pub use forecast_strip::ForecastStrip;
pub use overlay_panel::OverlayPanel;

use crate::image_cache::{ImageCache, ImageLookup};

pub(crate) const LABEL_COLOR: egui::Color32 = egui::Color32::from_rgb(130, 130, 130);
pub(crate) const VALUE_COLOR: egui::Color32 = egui::Color32::from_rgb(210, 210, 210);
pub(crate) const ACCENT_COLOR: egui::Color32 = egui::Color32::from_rgb(100, 180, 220);
pub(crate) const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 100, 100);

/// Draw a remote image at `size`, with a spinner while it loads and a
/// placeholder frame if it could not be fetched.
pub(crate) fn remote_image(
    ui: &mut egui::Ui,
    cache: Option<&ImageCache>,
    url: &str,
    cache_key: &str,
    size: egui::Vec2,
) {
    let lookup = match cache {
        Some(cache) => cache.get(ui.ctx(), url, cache_key),
        None => ImageLookup::Unavailable,
    };

    match lookup {
        ImageLookup::Ready(texture) => {
            ui.add(egui::Image::new(&texture).fit_to_exact_size(size));
        }
        ImageLookup::Pending => {
            ui.allocate_ui(size, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            });
        }
        ImageLookup::Unavailable => {
            let (rect, _response) = ui.allocate_exact_size(size, egui::Sense::hover());
            ui.painter().rect_stroke(
                rect,
                4.0,
                egui::Stroke::new(1.0, egui::Color32::from_rgb(60, 80, 100)),
                egui::StrokeKind::Inside,
            );
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "n/a",
                egui::FontId::proportional(10.0),
                LABEL_COLOR,
            );
        }
    }
}

/// `label: value` row in the detail grid
pub(crate) fn detail_row(ui: &mut egui::Ui, icon: &str, label: &str, value: String) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(format!("{icon} {label}:"))
            .color(LABEL_COLOR)
            .size(13.0));
        ui.label(egui::RichText::new(value)
            .color(VALUE_COLOR)
            .size(13.0)
            .monospace());
    });
}
