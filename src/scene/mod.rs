pub mod catalog;
pub mod material;
pub mod serialization;
pub mod transform;

pub use catalog::SceneCatalog;
pub use material::Material;
pub use serialization::{JsonSceneLoader, SceneLoadError, SceneLoader};
pub use transform::TransformComponents;

use crate::render::Camera;
use glam::Mat4;

/// Renderer settings edited in the Render Settings panel.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub resolution: [u32; 2],
    pub max_depth: u32,
    pub hdr_multiplier: f32,
    pub enable_rr: bool,
    pub rr_depth: u32,
    pub use_constant_bg: bool,
    pub background_color: [f32; 3],
    pub use_env_map: bool,
    pub enable_denoiser: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            resolution: [1280, 720],
            max_depth: 2,
            hdr_multiplier: 1.0,
            enable_rr: true,
            rr_depth: 2,
            use_constant_bg: false,
            background_color: [0.3, 0.3, 0.3],
            use_env_map: false,
            enable_denoiser: false,
        }
    }
}

impl RenderOptions {
    /// Brings integer and float fields back inside the ranges the sliders allow.
    pub fn sanitize(&mut self) {
        self.resolution = [self.resolution[0].max(1), self.resolution[1].max(1)];
        self.max_depth = self.max_depth.max(1);
        self.rr_depth = self.rr_depth.max(1);
        if !(self.hdr_multiplier.is_finite() && self.hdr_multiplier > 0.0) {
            self.hdr_multiplier = 1.0;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.resolution[0].max(1) as f32 / self.resolution[1].max(1) as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshInstance {
    pub name: String,
    pub transform: Mat4,
    material_id: usize,
}

impl MeshInstance {
    pub fn new(name: impl Into<String>, transform: Mat4, material_id: usize) -> Self {
        Self {
            name: name.into(),
            transform,
            material_id,
        }
    }

    pub fn material_id(&self) -> usize {
        self.material_id
    }
}

/// The live scene: instances, materials, the last applied options and the camera.
#[derive(Debug, Clone)]
pub struct Scene {
    mesh_instances: Vec<MeshInstance>,
    materials: Vec<Material>,
    render_options: RenderOptions,
    camera: Camera,
}

impl Scene {
    /// Every instance must reference an existing material.
    pub fn new(
        camera: Camera,
        materials: Vec<Material>,
        mesh_instances: Vec<MeshInstance>,
    ) -> Result<Self, SceneLoadError> {
        if let Some(instance) = mesh_instances
            .iter()
            .find(|instance| instance.material_id >= materials.len())
        {
            return Err(SceneLoadError::InvalidMaterialIndex {
                instance: instance.name.clone(),
                index: instance.material_id,
                count: materials.len(),
            });
        }
        Ok(Self {
            mesh_instances,
            materials,
            render_options: RenderOptions::default(),
            camera,
        })
    }

    pub fn mesh_instances(&self) -> &[MeshInstance] {
        &self.mesh_instances
    }

    pub fn instance_names(&self) -> Vec<&str> {
        self.mesh_instances
            .iter()
            .map(|instance| instance.name.as_str())
            .collect()
    }

    pub fn instance_mut(&mut self, index: usize) -> Option<&mut MeshInstance> {
        self.mesh_instances.get_mut(index)
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material_of(&self, instance: &MeshInstance) -> &Material {
        // Index validated in `Scene::new`; instances never change material.
        &self.materials[instance.material_id]
    }

    pub fn material_for_instance_mut(&mut self, index: usize) -> Option<&mut Material> {
        let material_id = self.mesh_instances.get(index)?.material_id;
        self.materials.get_mut(material_id)
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.render_options
    }

    pub(crate) fn set_render_options(&mut self, options: RenderOptions) {
        self.render_options = options;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_dangling_material_reference() {
        let result = Scene::new(
            Camera::default(),
            vec![Material::default()],
            vec![MeshInstance::new("floor", Mat4::IDENTITY, 1)],
        );
        assert!(matches!(
            result,
            Err(SceneLoadError::InvalidMaterialIndex { index: 1, count: 1, .. })
        ));
    }

    #[test]
    fn material_lookup_follows_instance() {
        let mut scene = Scene::new(
            Camera::default(),
            vec![Material::default(), Material::default()],
            vec![
                MeshInstance::new("a", Mat4::IDENTITY, 1),
                MeshInstance::new("b", Mat4::IDENTITY, 0),
            ],
        )
        .unwrap();
        scene.material_for_instance_mut(0).unwrap().metallic = 0.75;
        assert_eq!(scene.materials()[1].metallic, 0.75);
        assert_eq!(scene.materials()[0].metallic, 0.0);
        assert!(scene.material_for_instance_mut(5).is_none());
        assert_eq!(scene.instance_names(), vec!["a", "b"]);
    }

    #[test]
    fn sanitize_restores_slider_minimums() {
        let mut options = RenderOptions {
            resolution: [0, 0],
            max_depth: 0,
            rr_depth: 0,
            hdr_multiplier: -2.0,
            ..RenderOptions::default()
        };
        options.sanitize();
        assert_eq!(options.resolution, [1, 1]);
        assert_eq!(options.max_depth, 1);
        assert_eq!(options.rr_depth, 1);
        assert_eq!(options.hdr_multiplier, 1.0);
    }
}
