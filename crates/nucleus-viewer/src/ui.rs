//! UI overlays using bevy_egui

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use nucleus_core::{PartId, ToggleAffordance};

use crate::app::Viewer;
use crate::parts::{LabelText, LoadProgress, PartLabel, PartScene};
use crate::scene::MainCamera;

/// Grouped system parameters for the main UI system
#[derive(SystemParam)]
pub struct UiParams<'w, 's> {
    pub contexts: EguiContexts<'w, 's>,
    pub viewer: ResMut<'w, Viewer>,
    pub progress: Res<'w, LoadProgress>,
    pub scene: PartScene<'w, 's>,
    pub labels: Query<'w, 's, (&'static PartLabel, &'static LabelText, &'static GlobalTransform)>,
    pub camera: Query<'w, 's, (&'static Camera, &'static GlobalTransform), With<MainCamera>>,
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        // Main UI system runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
        app.add_systems(EguiPrimaryContextPass, ui_system);
    }
}

/// Sidebar requests, applied once the panel is drawn
enum PartAction {
    Toggle(PartId),
    Select(PartId),
}

/// True while the pointer is over, or dragging, an egui area
pub fn egui_wants_pointer(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input() || ctx.is_pointer_over_area())
        .unwrap_or(false)
}

/// Dark translucent box used for the status banner and part labels
fn label_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(egui::Color32::from_black_alpha(178))
        .inner_margin(egui::Margin::same(5))
        .corner_radius(egui::CornerRadius::same(3))
}

fn ui_system(mut params: UiParams) {
    // Get the egui context - early return if not available
    let Ok(ctx) = params.contexts.ctx_mut() else { return };

    let mut actions = Vec::new();
    let progress = *params.progress;

    // Part list panel (left side)
    egui::SidePanel::left("parts_panel")
        .default_width(220.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.heading("Parts");
            ui.separator();

            if !progress.is_done() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(format!(
                        "Loading {}/{}",
                        progress.loaded + progress.failed,
                        progress.total
                    ));
                });
            }
            if progress.failed > 0 {
                ui.label(
                    egui::RichText::new(format!("{} failed to load", progress.failed))
                        .size(11.0)
                        .color(egui::Color32::from_rgb(255, 100, 100)),
                );
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                let selected = params.viewer.selected().map(|entry| entry.id());

                for entry in params.viewer.registry().all() {
                    ui.horizontal(|ui| {
                        let visible = entry.is_visible();
                        let affordance = ToggleAffordance::from_visible(visible);
                        let hint = if visible { "Hide" } else { "Show" };
                        if ui.button(affordance.icon()).on_hover_text(hint).clicked() {
                            actions.push(PartAction::Toggle(entry.id()));
                        }

                        let name_color = if visible {
                            egui::Color32::from_rgb(200, 200, 200)
                        } else {
                            egui::Color32::GRAY
                        };
                        let text = egui::RichText::new(entry.name()).color(name_color);
                        if ui.selectable_label(selected == Some(entry.id()), text).clicked() {
                            actions.push(PartAction::Select(entry.id()));
                        }
                    });
                }

                if params.viewer.registry().is_empty() && progress.is_done() {
                    ui.label(egui::RichText::new("No parts loaded").color(egui::Color32::GRAY));
                }
            });
        });

    // Info panel (bottom)
    egui::TopBottomPanel::bottom("info_panel")
        .max_height(100.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Nucleus v{}", env!("CARGO_PKG_VERSION")));
                ui.separator();
                ui.label("Click a part to label it | Drag to orbit | Scroll to zoom | Right-drag to pan");
            });
        });

    // Status banner (top centre)
    egui::Area::new(egui::Id::new("status_banner"))
        .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 10.0))
        .interactable(false)
        .show(ctx, |ui| {
            label_frame().show(ui, |ui| {
                ui.label(egui::RichText::new(params.viewer.status()).color(egui::Color32::WHITE));
            });
        });

    // Part labels at their projected anchors
    if let Ok((camera, camera_transform)) = params.camera.single() {
        for (label, text, transform) in params.labels.iter() {
            let Ok(position) = camera.world_to_viewport(camera_transform, transform.translation())
            else {
                continue;
            };
            egui::Area::new(egui::Id::new(("part_label", label.part)))
                .fixed_pos(egui::pos2(position.x, position.y))
                .pivot(egui::Align2::CENTER_CENTER)
                .order(egui::Order::Background)
                .interactable(false)
                .show(ctx, |ui| {
                    label_frame().show(ui, |ui| {
                        ui.label(egui::RichText::new(&text.0).color(egui::Color32::WHITE));
                    });
                });
        }
    }

    for action in actions {
        match action {
            PartAction::Toggle(id) => {
                params.viewer.toggle_visibility(id, &mut params.scene);
            }
            PartAction::Select(id) => {
                params.viewer.select(id, &mut params.scene);
            }
        }
    }
}
