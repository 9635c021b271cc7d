//! Part mesh loading and the ECS side of the part scene

use bevy::asset::{LoadState, UntypedAssetId};
use bevy::ecs::system::SystemParam;
use bevy::gltf::GltfMesh;
use bevy::math::{Dir3, Ray3d};
use bevy::prelude::*;
use bevy_picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings, RayCastVisibility};
use nucleus_core::{PartLoadResult, PartManifest, Ray, RayCaster, RayHit, Rgb, ViewerError};
use std::path::PathBuf;

use crate::app::Viewer;
use crate::config::PartsConfig;
use crate::stl::{is_stl, StlLoader};

pub struct PartsPlugin;

impl Plugin for PartsPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset_loader::<StlLoader>()
            .init_resource::<PendingParts>()
            .init_resource::<LoadProgress>()
            .add_message::<PartLoaded>()
            .add_systems(Startup, start_part_loads)
            .add_systems(Update, (poll_part_loads, apply_part_loads).chain());
    }
}

/// Marker for a rendered part mesh
#[derive(Component, Debug)]
pub struct PartMesh;

/// Floating label anchored near a part
#[derive(Component, Debug)]
pub struct PartLabel {
    pub part: Entity,
}

#[derive(Component, Debug, Clone)]
pub struct LabelText(pub String);

/// A part load that has finished, successfully or not
#[derive(Message, Debug, Clone)]
pub struct PartLoaded(pub PartLoadResult<Entity>);

/// What to load and how to place it
#[derive(Resource, Debug, Clone)]
pub struct PartsSettings {
    pub manifest: PartManifest,
    pub scale: f32,
    pub center_geometry: bool,
}

impl PartsSettings {
    pub fn new(manifest: PartManifest, config: &PartsConfig) -> Self {
        Self {
            manifest,
            scale: config.scale,
            center_geometry: config.center_geometry,
        }
    }
}

/// Asset requested for one part file
#[derive(Debug)]
enum PartAsset {
    Gltf(Handle<Gltf>),
    Stl(Handle<Mesh>),
}

impl PartAsset {
    fn id(&self) -> UntypedAssetId {
        match self {
            PartAsset::Gltf(handle) => handle.id().untyped(),
            PartAsset::Stl(handle) => handle.id().untyped(),
        }
    }
}

#[derive(Debug)]
struct PendingPart {
    name: String,
    path: PathBuf,
    asset: PartAsset,
}

/// Loads that have started but not finished
#[derive(Resource, Default)]
pub struct PendingParts {
    parts: Vec<PendingPart>,
}

#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct LoadProgress {
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl LoadProgress {
    pub fn is_done(&self) -> bool {
        self.loaded + self.failed >= self.total
    }
}

/// Everything the part state needs to touch in the ECS world
#[derive(SystemParam)]
pub struct PartScene<'w, 's> {
    commands: Commands<'w, 's>,
    transforms: Query<'w, 's, &'static Transform, With<PartMesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
}

impl PartScene<'_, '_> {
    pub fn spawn_part(&mut self, name: &str, mesh: Handle<Mesh>, scale: f32) -> Entity {
        self.commands
            .spawn((
                Mesh3d(mesh),
                Transform::from_scale(Vec3::splat(scale)),
                Visibility::Visible,
                PartMesh,
                Name::new(name.to_string()),
            ))
            .id()
    }

    pub fn despawn(&mut self, entity: Entity) {
        self.commands.entity(entity).despawn();
    }
}

impl nucleus_core::Scene for PartScene<'_, '_> {
    type Handle = Entity;
    type Label = Entity;

    fn set_visible(&mut self, handle: Entity, visible: bool) {
        let visibility = if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        self.commands.entity(handle).insert(visibility);
    }

    fn local_position(&self, handle: Entity) -> Vec3 {
        self.transforms
            .get(handle)
            .map(|transform| transform.translation)
            .unwrap_or(Vec3::ZERO)
    }

    fn attach_label(&mut self, handle: Entity, text: &str, position: Vec3) -> Entity {
        self.commands
            .spawn((
                PartLabel { part: handle },
                LabelText(text.to_string()),
                Transform::from_translation(position),
            ))
            .id()
    }

    fn update_label(&mut self, label: &Entity, text: &str, position: Vec3) {
        self.commands
            .entity(*label)
            .insert((LabelText(text.to_string()), Transform::from_translation(position)));
    }

    fn set_material_color(&mut self, handle: Entity, color: Rgb) {
        let material = self.materials.add(StandardMaterial {
            base_color: Color::linear_rgb(color.r, color.g, color.b),
            ..default()
        });
        self.commands.entity(handle).insert(MeshMaterial3d(material));
    }
}

/// Mesh ray casting through the main camera
pub struct PartRayCaster<'a, 'w, 's> {
    pub ray_cast: &'a mut MeshRayCast<'w, 's>,
    pub camera: &'a Camera,
    pub camera_transform: &'a GlobalTransform,
}

impl RayCaster for PartRayCaster<'_, '_, '_> {
    type Handle = Entity;

    fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray> {
        // Reverse-Z: 1 is the near plane, values towards 0 recede to infinity
        let near = self.camera.ndc_to_world(self.camera_transform, ndc.extend(1.0))?;
        let far = self
            .camera
            .ndc_to_world(self.camera_transform, ndc.extend(f32::EPSILON))?;
        let direction = (far - near).try_normalize()?;
        Some(Ray {
            origin: near,
            direction,
        })
    }

    fn intersect(&mut self, ray: &Ray, candidates: &[Entity]) -> Vec<RayHit<Entity>> {
        let Ok(direction) = Dir3::new(ray.direction) else {
            return Vec::new();
        };
        let filter = |entity: Entity| candidates.contains(&entity);
        let settings = MeshRayCastSettings::default()
            .with_visibility(RayCastVisibility::Any)
            .with_filter(&filter)
            .never_early_exit();

        self.ray_cast
            .cast_ray(Ray3d::new(ray.origin, direction), &settings)
            .iter()
            .map(|(entity, hit)| RayHit {
                handle: *entity,
                distance: hit.distance,
            })
            .collect()
    }
}

/// Move the mesh so its bounding box is centered on the origin
pub fn center_mesh(mesh: &mut Mesh) {
    let Some(center) = mesh_center(mesh) else {
        return;
    };
    mesh.translate_by(-center);
}

fn mesh_center(mesh: &Mesh) -> Option<Vec3> {
    let positions = mesh.attribute(Mesh::ATTRIBUTE_POSITION)?.as_float3()?;
    let (min, max) = positions.iter().map(|p| Vec3::from_array(*p)).fold(
        (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
        |(min, max), p| (min.min(p), max.max(p)),
    );
    if positions.is_empty() {
        return None;
    }
    Some((min + max) * 0.5)
}

fn asset_path(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Kick off one asynchronous load per manifest entry
fn start_part_loads(
    settings: Res<PartsSettings>,
    asset_server: Res<AssetServer>,
    mut pending: ResMut<PendingParts>,
    mut progress: ResMut<LoadProgress>,
) {
    for source in settings.manifest.sources() {
        let path = asset_path(&source.path);
        tracing::info!("Starting to load part: {}", path);
        let asset = if is_stl(&source.path) {
            PartAsset::Stl(asset_server.load(path))
        } else {
            PartAsset::Gltf(asset_server.load(path))
        };
        pending.parts.push(PendingPart {
            name: source.name.clone(),
            path: source.path.clone(),
            asset,
        });
    }
    progress.total = pending.parts.len();

    if pending.parts.is_empty() {
        tracing::warn!("No part files to load");
    }
}

/// Poll pending loads and report each finished one, in completion order
fn poll_part_loads(
    mut pending: ResMut<PendingParts>,
    mut results: MessageWriter<PartLoaded>,
    mut scene: PartScene,
    mut meshes: ResMut<Assets<Mesh>>,
    asset_server: Res<AssetServer>,
    gltf_assets: Res<Assets<Gltf>>,
    gltf_meshes: Res<Assets<GltfMesh>>,
    settings: Res<PartsSettings>,
) {
    if pending.parts.is_empty() {
        return;
    }

    let mut still_loading = Vec::new();
    for part in std::mem::take(&mut pending.parts) {
        let result = match asset_server.get_load_state(part.asset.id()) {
            Some(LoadState::Loaded) => {
                let mesh = match &part.asset {
                    PartAsset::Stl(mesh) => Some(mesh.clone()),
                    PartAsset::Gltf(gltf) => gltf_assets
                        .get(gltf)
                        .and_then(|gltf| gltf.meshes.first())
                        .and_then(|mesh| gltf_meshes.get(mesh))
                        .and_then(|mesh| mesh.primitives.first())
                        .map(|primitive| primitive.mesh.clone()),
                };

                match mesh {
                    Some(mesh) => {
                        if settings.center_geometry {
                            if let Some(mesh) = meshes.get_mut(&mesh) {
                                center_mesh(mesh);
                            }
                        }
                        let entity = scene.spawn_part(&part.name, mesh, settings.scale);
                        PartLoadResult::Loaded {
                            name: part.name,
                            handle: entity,
                        }
                    }
                    None => PartLoadResult::Failed {
                        name: part.name,
                        path: part.path,
                        reason: "file contains no mesh primitive".to_string(),
                    },
                }
            }
            Some(LoadState::Failed(err)) => PartLoadResult::Failed {
                name: part.name,
                path: part.path,
                reason: err.to_string(),
            },
            _ => {
                // Still loading
                still_loading.push(part);
                continue;
            }
        };
        results.write(PartLoaded(result));
    }
    pending.parts = still_loading;
}

/// Register finished parts with the viewer state
fn apply_part_loads(
    mut results: MessageReader<PartLoaded>,
    mut progress: ResMut<LoadProgress>,
    mut viewer: ResMut<Viewer>,
    mut scene: PartScene,
) {
    let mut applied = false;
    for PartLoaded(result) in results.read() {
        applied = true;
        let spawned = match result {
            PartLoadResult::Loaded { handle, .. } => Some(*handle),
            PartLoadResult::Failed { .. } => None,
        };

        match viewer.apply_load_result(result.clone(), &mut scene) {
            Ok(_) => progress.loaded += 1,
            Err(ViewerError::Registry(err)) => {
                tracing::warn!(%err, "Discarding part");
                if let Some(entity) = spawned {
                    scene.despawn(entity);
                }
                progress.failed += 1;
            }
            Err(ViewerError::PartLoadFailed { .. }) => progress.failed += 1,
        }
    }

    if applied && progress.is_done() {
        tracing::info!(
            loaded = progress.loaded,
            failed = progress.failed,
            "All part loads finished"
        );
    }
}
