//! Bevy application setup

use anyhow::Result;
use bevy::asset::AssetMetaCheck;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::{prelude::MeshPickingPlugin, DefaultPickingPlugins};
use nucleus_core::{ColorTable, PartManifest, ViewerState};

use crate::config::Config;
use crate::parts::{PartsPlugin, PartsSettings};
use crate::scene::ScenePlugin;
use crate::ui::UiPlugin;

/// Part registry, selection and status line, keyed by ECS entity
#[derive(Resource, Deref, DerefMut)]
pub struct Viewer(pub ViewerState<Entity, Entity>);

/// Run the Bevy application
pub fn run(config: Config, colors: ColorTable, manifest: PartManifest) -> Result<()> {
    let assets_root = std::path::absolute(&config.assets.root)?;
    let [r, g, b] = config.window.clear_color;

    tracing::info!(
        parts = manifest.len(),
        colors = colors.len(),
        "Starting viewer"
    );

    App::new()
        .insert_resource(ClearColor(Color::srgb(r, g, b)))
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: config.window.title.clone(),
                        resolution: (u32::from(config.window.width), u32::from(config.window.height)).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    file_path: assets_root.to_string_lossy().into_owned(),
                    // Part files ship without .meta files
                    meta_check: AssetMetaCheck::Never,
                    ..default()
                })
                // Logging is already set up by main
                .disable::<LogPlugin>(),
        )
        // Picking plugins must be added BEFORE EguiPlugin so it can detect PickingPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(MeshPickingPlugin)
        .add_plugins(EguiPlugin::default())
        .insert_resource(Viewer(ViewerState::new(colors, config.settings())))
        .insert_resource(PartsSettings::new(manifest, &config.parts))
        .add_plugins(ScenePlugin)
        .add_plugins(PartsPlugin)
        .add_plugins(UiPlugin)
        .run();

    Ok(())
}
