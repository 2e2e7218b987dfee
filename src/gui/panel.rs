//! Overlay UI: toolbar, carousel strip, loading indicator and error dialog.
//!
//! Drawing is a pure function of [`OverlayState`]; every click comes back
//! as a [`UiAction`] for the app to apply after the UI pass.

use super::thumbnails::ThumbnailCache;
use crate::carousel::{Card, Carousel};
use crate::viewer::ViewerCommand;

const CARD_WIDTH: f32 = 132.0;
const THUMB_HEIGHT: f32 = 80.0;

/// Something the user asked for in the overlay.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UiAction {
    /// A toolbar button or carousel arrow.
    Command(ViewerCommand),
    /// A card was clicked.
    Select(usize),
    /// Pick a local model file.
    OpenFile,
    /// Close the error dialog.
    DismissError,
}

/// Everything the overlay shows for one frame.
pub(crate) struct OverlayState<'a> {
    pub(crate) carousel: &'a Carousel,
    pub(crate) scroll_to: Option<usize>,
    pub(crate) thumbnails: &'a ThumbnailCache,
    pub(crate) auto_rotate: bool,
    pub(crate) locked: bool,
    pub(crate) camera_background: bool,
    /// Load progress while a load is in flight.
    pub(crate) loading: Option<f32>,
    pub(crate) error: Option<&'a str>,
}

pub(crate) fn auto_rotate_label(enabled: bool) -> &'static str {
    if enabled {
        "Pause rotation"
    } else {
        "Auto-rotate"
    }
}

pub(crate) fn lock_label(locked: bool) -> &'static str {
    if locked {
        "Unlock model"
    } else {
        "Lock model"
    }
}

pub(crate) fn background_label(camera: bool) -> &'static str {
    if camera {
        "Background: solid"
    } else {
        "Background: camera"
    }
}

pub(crate) fn error_message(error: &str) -> String {
    format!("Failed to load model:\n{error}")
}

/// Draw the overlay and collect the actions the user triggered.
pub(crate) fn show(ctx: &egui::Context, state: &OverlayState<'_>) -> Vec<UiAction> {
    let mut actions = Vec::new();
    toolbar(ctx, state, &mut actions);
    carousel_strip(ctx, state, &mut actions);
    if let Some(progress) = state.loading {
        loading_indicator(ctx, progress);
    }
    if let Some(error) = state.error {
        error_dialog(ctx, error, &mut actions);
    }
    actions
}

fn toolbar(ctx: &egui::Context, state: &OverlayState<'_>, actions: &mut Vec<UiAction>) {
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let buttons = [
                ("Fit", ViewerCommand::FitToView),
                ("+", ViewerCommand::ZoomIn),
                ("-", ViewerCommand::ZoomOut),
                (auto_rotate_label(state.auto_rotate), ViewerCommand::ToggleAutoRotate),
                (lock_label(state.locked), ViewerCommand::ToggleLock),
                (
                    background_label(state.camera_background),
                    ViewerCommand::ToggleCameraBackground,
                ),
            ];
            for (label, command) in buttons {
                if ui.button(label).clicked() {
                    actions.push(UiAction::Command(command));
                }
            }
            ui.separator();
            if ui.button("Open file").clicked() {
                actions.push(UiAction::OpenFile);
            }
        });
    });
}

fn carousel_strip(ctx: &egui::Context, state: &OverlayState<'_>, actions: &mut Vec<UiAction>) {
    egui::TopBottomPanel::bottom("carousel").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui.button("\u{25c0}").on_hover_text("Previous").clicked() {
                actions.push(UiAction::Command(ViewerCommand::CarouselPrev));
            }
            let arrow_width = 32.0;
            ui.allocate_ui(
                egui::vec2(ui.available_width() - arrow_width, THUMB_HEIGHT + 48.0),
                |ui| {
                    egui::ScrollArea::horizontal().show(ui, |ui| {
                        ui.horizontal(|ui| {
                            for (index, card) in state.carousel.cards().iter().enumerate() {
                                let response = card_widget(ui, card, state.thumbnails);
                                if state.scroll_to == Some(index) {
                                    response.scroll_to_me(Some(egui::Align::Center));
                                }
                                if response.clicked() {
                                    actions.push(UiAction::Select(index));
                                }
                            }
                        });
                    });
                },
            );
            if ui.button("\u{25b6}").on_hover_text("Next").clicked() {
                actions.push(UiAction::Command(ViewerCommand::CarouselNext));
            }
        });
    });
}

fn card_widget(ui: &mut egui::Ui, card: &Card, thumbnails: &ThumbnailCache) -> egui::Response {
    let stroke = if card.active {
        ui.visuals().selection.stroke
    } else {
        ui.visuals().widgets.noninteractive.bg_stroke
    };
    egui::Frame::group(ui.style())
        .stroke(stroke)
        .show(ui, |ui| {
            ui.set_width(CARD_WIDTH);
            ui.vertical(|ui| {
                let thumb_size = egui::vec2(CARD_WIDTH, THUMB_HEIGHT);
                match card.thumb.as_deref().and_then(|t| thumbnails.get(t)) {
                    Some(texture) => {
                        let _ = ui.add(
                            egui::Image::new(egui::load::SizedTexture::from_handle(texture))
                                .fit_to_exact_size(thumb_size),
                        );
                    }
                    None => {
                        let _ = ui.allocate_ui(thumb_size, |ui| {
                            ui.centered_and_justified(|ui| {
                                ui.heading(&card.badge);
                            });
                        });
                    }
                }
                ui.strong(&card.title);
                ui.small(&card.subtitle);
            });
        })
        .response
        .interact(egui::Sense::click())
}

fn loading_indicator(ctx: &egui::Context, progress: f32) {
    let _ = egui::Area::new(egui::Id::new("loading"))
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_width(220.0);
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading model\u{2026}");
                });
                ui.add(egui::ProgressBar::new(progress).show_percentage());
            });
        });
}

fn error_dialog(ctx: &egui::Context, error: &str, actions: &mut Vec<UiAction>) {
    let response = egui::Modal::new(egui::Id::new("load-error")).show(ctx, |ui| {
        ui.set_max_width(420.0);
        ui.label(error_message(error));
        ui.add_space(8.0);
        ui.button("OK").clicked()
    });
    if response.inner || response.should_close() {
        actions.push(UiAction::DismissError);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_viewer_state() {
        assert_eq!(auto_rotate_label(false), "Auto-rotate");
        assert_eq!(auto_rotate_label(true), "Pause rotation");
        assert_eq!(lock_label(false), "Lock model");
        assert_eq!(lock_label(true), "Unlock model");
        assert_eq!(background_label(false), "Background: camera");
        assert_eq!(background_label(true), "Background: solid");
    }

    #[test]
    fn error_message_names_the_failure() {
        assert_eq!(
            error_message("HTTP 404 while fetching x"),
            "Failed to load model:\nHTTP 404 while fetching x"
        );
    }

    #[test]
    fn overlay_reports_nothing_without_clicks() {
        let carousel = Carousel::new(|_, _| {});
        let thumbnails = ThumbnailCache::new().unwrap();
        let ctx = egui::Context::default();
        let state = OverlayState {
            carousel: &carousel,
            scroll_to: None,
            thumbnails: &thumbnails,
            auto_rotate: false,
            locked: false,
            camera_background: false,
            loading: Some(0.5),
            error: None,
        };
        let mut actions = Vec::new();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            actions = show(ctx, &state);
        });
        assert!(actions.is_empty());
    }
}
