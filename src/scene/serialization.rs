use crate::render::Camera;
use crate::scene::transform::{compose_transform_matrix, TransformComponents};
use crate::scene::{Material, MeshInstance, RenderOptions, Scene};
use glam::Vec3;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SceneLoadError {
    #[error("failed to read scene {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scene {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("instance '{instance}' references unknown material '{material}'")]
    UnknownMaterial { instance: String, material: String },
    #[error("instance '{instance}' references material #{index} but only {count} exist")]
    InvalidMaterialIndex {
        instance: String,
        index: usize,
        count: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses a scene file into a live [`Scene`].
///
/// `options` is the controller's working copy; a loader may overwrite it with
/// settings stored alongside the scene.
pub trait SceneLoader {
    fn load(&self, path: &Path, options: &mut RenderOptions) -> Result<Scene, SceneLoadError>;
}

/// Loader for the JSON `.scene` format.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSceneLoader;

impl SceneLoader for JsonSceneLoader {
    fn load(&self, path: &Path, options: &mut RenderOptions) -> Result<Scene, SceneLoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| SceneLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: SceneFile = serde_json::from_str(&json).map_err(|source| SceneLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let scene = file.into_scene(options)?;
        log::info!(
            "Loaded scene {} ({} instances, {} materials)",
            path.display(),
            scene.mesh_instances().len(),
            scene.materials().len()
        );
        Ok(scene)
    }
}

pub fn save_scene_to_file(scene: &Scene, path: &Path) -> Result<(), SerializationError> {
    let json = serde_json::to_string_pretty(&SceneFile::from_scene(scene))?;
    std::fs::write(path, json)?;
    Ok(())
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct SceneFile {
    #[serde(default)]
    camera: CameraData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    render_options: Option<RenderOptions>,
    #[serde(default)]
    materials: Vec<Material>,
    #[serde(default)]
    instances: Vec<InstanceData>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct CameraData {
    position: [f32; 3],
    look_at: [f32; 3],
    fov: f32,
    aperture: f32,
    focal_dist: f32,
}

impl Default for CameraData {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 5.0],
            look_at: [0.0, 0.0, 0.0],
            fov: 45.0,
            aperture: 0.0,
            focal_dist: 1.0,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct InstanceData {
    name: String,
    material: String,
    #[serde(default)]
    position: [f32; 3],
    #[serde(default)]
    rotation_deg: [f32; 3],
    #[serde(default = "unit_scale")]
    scale: [f32; 3],
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl SceneFile {
    fn into_scene(self, options: &mut RenderOptions) -> Result<Scene, SceneLoadError> {
        let mut materials = self.materials;
        for material in &mut materials {
            if material.clamp_to_ranges() {
                log::warn!(
                    "Material '{}' had values outside the editable ranges; clamped",
                    material.name
                );
            }
        }

        let mut instances = Vec::with_capacity(self.instances.len());
        for data in self.instances {
            let material_id = materials
                .iter()
                .position(|material| material.name == data.material)
                .ok_or_else(|| SceneLoadError::UnknownMaterial {
                    instance: data.name.clone(),
                    material: data.material.clone(),
                })?;
            let transform = compose_transform_matrix(data.position, data.rotation_deg, data.scale);
            instances.push(MeshInstance::new(data.name, transform, material_id));
        }

        let mut camera = Camera::look_at(
            Vec3::from(self.camera.position),
            Vec3::from(self.camera.look_at),
            self.camera.fov,
        );
        camera.aperture = self.camera.aperture.max(0.0);
        camera.focal_dist = self.camera.focal_dist.max(0.01);

        if let Some(mut stored) = self.render_options {
            stored.sanitize();
            *options = stored;
        }

        let mut scene = Scene::new(camera, materials, instances)?;
        scene.set_render_options(options.clone());
        Ok(scene)
    }

    fn from_scene(scene: &Scene) -> Self {
        let camera = scene.camera();
        let instances = scene
            .mesh_instances()
            .iter()
            .map(|instance| {
                let components = TransformComponents::decompose(&instance.transform);
                InstanceData {
                    name: instance.name.clone(),
                    material: scene.material_of(instance).name.clone(),
                    position: components.translation,
                    rotation_deg: components.rotation_deg,
                    scale: components.scale,
                }
            })
            .collect();

        Self {
            camera: CameraData {
                position: camera.position().to_array(),
                look_at: camera.pivot().to_array(),
                fov: camera.fov_degrees(),
                aperture: camera.aperture,
                focal_dist: camera.focal_dist,
            },
            render_options: Some(scene.render_options().clone()),
            materials: scene.materials().to_vec(),
            instances,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CORNELL: &str = r#"{
        "camera": { "position": [0.0, 1.0, 4.0], "look_at": [0.0, 1.0, 0.0], "fov": 40.0 },
        "materials": [
            { "name": "white", "albedo": [0.7, 0.7, 0.7] },
            { "name": "light", "emission": [15.0, 15.0, 15.0], "roughness": 0.0 }
        ],
        "instances": [
            { "name": "floor", "material": "white", "position": [0.0, -100.0, 0.0], "scale": [100.0, 100.0, 100.0] },
            { "name": "lamp", "material": "light", "position": [0.0, 3.0, 0.0] }
        ]
    }"#;

    fn write_scene(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_instances_and_resolves_materials() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scene(dir.path(), "cornell.scene", CORNELL);
        let mut options = RenderOptions::default();

        let scene = JsonSceneLoader.load(&path, &mut options).unwrap();
        assert_eq!(scene.instance_names(), vec!["floor", "lamp"]);
        assert_eq!(scene.mesh_instances()[1].material_id(), 1);
        // Out-of-range roughness clamped on load.
        assert_eq!(scene.materials()[1].roughness, 0.001);
        assert_eq!(scene.render_options(), &options);
        assert!((scene.camera().fov_degrees() - 40.0).abs() < 1e-4);
    }

    #[test]
    fn stored_render_options_override_controller_copy() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{ "render_options": { "max_depth": 6, "use_env_map": true } }"#;
        let path = write_scene(dir.path(), "env.scene", body);
        let mut options = RenderOptions::default();

        let scene = JsonSceneLoader.load(&path, &mut options).unwrap();
        assert_eq!(options.max_depth, 6);
        assert!(options.use_env_map);
        assert_eq!(scene.render_options().max_depth, 6);
        assert!(scene.mesh_instances().is_empty());
    }

    #[test]
    fn unknown_material_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{ "instances": [ { "name": "ghost", "material": "missing" } ] }"#;
        let path = write_scene(dir.path(), "bad.scene", body);
        let err = JsonSceneLoader
            .load(&path, &mut RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, SceneLoadError::UnknownMaterial { .. }));
    }

    #[test]
    fn missing_file_and_bad_json_report_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.scene");
        let err = JsonSceneLoader
            .load(&missing, &mut RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, SceneLoadError::Read { .. }));

        let garbage = write_scene(dir.path(), "garbage.scene", "{ not json");
        let err = JsonSceneLoader
            .load(&garbage, &mut RenderOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("garbage.scene"));
    }

    #[test]
    fn saved_scene_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scene(dir.path(), "cornell.scene", CORNELL);
        let mut options = RenderOptions::default();
        let scene = JsonSceneLoader.load(&path, &mut options).unwrap();

        let saved = dir.path().join("saved.scene");
        save_scene_to_file(&scene, &saved).unwrap();
        let reloaded = JsonSceneLoader
            .load(&saved, &mut RenderOptions::default())
            .unwrap();

        assert_eq!(reloaded.instance_names(), scene.instance_names());
        assert_eq!(reloaded.materials(), scene.materials());
        for (a, b) in reloaded.mesh_instances().iter().zip(scene.mesh_instances()) {
            assert!(a.transform.abs_diff_eq(b.transform, 1e-3));
        }
    }
}
