use crate::scene::transform::matrices_bit_equal;
use crate::scene::{Scene, TransformComponents};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum GizmoOperation {
    #[default]
    Translate,
    Rotate,
    Scale,
}

impl GizmoOperation {
    pub const ALL: [GizmoOperation; 3] = [Self::Translate, Self::Rotate, Self::Scale];

    pub fn label(self) -> &'static str {
        match self {
            Self::Translate => "Translate",
            Self::Rotate => "Rotate",
            Self::Scale => "Scale",
        }
    }
}

/// Anything that can edit decomposed transform components for one frame:
/// the numeric editors, a viewport drag, or a test double.
pub trait TransformManipulator {
    fn manipulate(&mut self, operation: GizmoOperation, components: &mut TransformComponents);
}

impl<F> TransformManipulator for F
where
    F: FnMut(GizmoOperation, &mut TransformComponents),
{
    fn manipulate(&mut self, operation: GizmoOperation, components: &mut TransformComponents) {
        self(operation, components)
    }
}

/// Index into the scene's mesh instances; `None` when the scene has none.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Selection(Option<usize>);

impl Selection {
    pub fn index(self) -> Option<usize> {
        self.0
    }

    /// First instance, or nothing for an empty scene.
    pub fn reset(&mut self, instance_count: usize) {
        self.0 = (instance_count > 0).then_some(0);
    }

    pub fn select(&mut self, index: usize, instance_count: usize) {
        self.0 = Some(index);
        self.clamp(instance_count);
    }

    pub fn clamp(&mut self, instance_count: usize) {
        self.0 = match self.0 {
            _ if instance_count == 0 => None,
            Some(index) if index >= instance_count => Some(instance_count - 1),
            other => other,
        };
    }
}

/// Gizmo state plus the selected instance.
#[derive(Debug, Default)]
pub struct TransformEditSession {
    operation: GizmoOperation,
    selection: Selection,
}

impl TransformEditSession {
    pub fn new(scene: &Scene) -> Self {
        let mut session = Self::default();
        session.on_scene_swapped(scene);
        session
    }

    pub fn operation(&self) -> GizmoOperation {
        self.operation
    }

    pub fn set_operation(&mut self, operation: GizmoOperation) {
        self.operation = operation;
    }

    pub fn selected(&self) -> Option<usize> {
        self.selection.index()
    }

    pub fn select(&mut self, index: usize, scene: &Scene) {
        self.selection.select(index, scene.mesh_instances().len());
    }

    pub fn on_scene_swapped(&mut self, scene: &Scene) {
        self.selection.reset(scene.mesh_instances().len());
    }

    /// Runs `manipulator` over the selected instance's decomposed transform.
    ///
    /// The instance is only written, and `true` returned, when the recomposed
    /// matrix differs bit-for-bit from the one it replaces.
    pub fn edit<M>(&mut self, scene: &mut Scene, manipulator: &mut M) -> bool
    where
        M: TransformManipulator + ?Sized,
    {
        self.selection.clamp(scene.mesh_instances().len());
        let Some(instance) = self
            .selection
            .index()
            .and_then(|index| scene.instance_mut(index))
        else {
            return false;
        };

        let original = instance.transform;
        let before = TransformComponents::decompose(&original);
        let mut edited = before;
        manipulator.manipulate(self.operation, &mut edited);
        if edited == before {
            return false;
        }

        let candidate = edited.recompose();
        if matrices_bit_equal(&candidate, &original) {
            return false;
        }
        instance.transform = candidate;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Camera;
    use crate::scene::transform::compose_transform_matrix;
    use crate::scene::{Material, MeshInstance};

    fn scene_with(count: usize) -> Scene {
        let instances = (0..count)
            .map(|i| {
                let transform = compose_transform_matrix([i as f32, 0.0, 0.0], [0.0, 30.0, 0.0], [1.0; 3]);
                MeshInstance::new(format!("mesh{i}"), transform, 0)
            })
            .collect();
        Scene::new(Camera::default(), vec![Material::default()], instances).unwrap()
    }

    #[test]
    fn untouched_session_reports_no_change() {
        let mut scene = scene_with(2);
        let before = scene.mesh_instances()[0].transform;
        let mut session = TransformEditSession::new(&scene);
        let mut idle = |_: GizmoOperation, _: &mut TransformComponents| {};

        assert!(!session.edit(&mut scene, &mut idle));
        assert!(matrices_bit_equal(&scene.mesh_instances()[0].transform, &before));
    }

    #[test]
    fn translation_edit_commits_new_matrix() {
        let mut scene = scene_with(2);
        let mut session = TransformEditSession::new(&scene);
        session.select(1, &scene);
        let mut nudge = |op: GizmoOperation, c: &mut TransformComponents| {
            assert_eq!(op, GizmoOperation::Translate);
            c.translation[1] += 0.5;
        };

        assert!(session.edit(&mut scene, &mut nudge));
        let moved = scene.mesh_instances()[1].transform;
        assert!((moved.w_axis.y - 0.5).abs() < 1e-6);
        assert_eq!(scene.mesh_instances()[0].transform.w_axis.y, 0.0);
    }

    #[test]
    fn operation_is_passed_to_manipulator() {
        let mut scene = scene_with(1);
        let mut session = TransformEditSession::new(&scene);
        session.set_operation(GizmoOperation::Scale);
        let mut grow = |op: GizmoOperation, c: &mut TransformComponents| {
            if op == GizmoOperation::Scale {
                c.scale = [2.0; 3];
            }
        };
        assert!(session.edit(&mut scene, &mut grow));
        let components = TransformComponents::decompose(&scene.mesh_instances()[0].transform);
        assert!((components.scale[0] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn selection_clamps_after_shrinking_scene() {
        let big = scene_with(5);
        let mut session = TransformEditSession::new(&big);
        session.select(4, &big);
        assert_eq!(session.selected(), Some(4));

        let mut small = scene_with(2);
        let mut idle = |_: GizmoOperation, _: &mut TransformComponents| {};
        assert!(!session.edit(&mut small, &mut idle));
        assert_eq!(session.selected(), Some(1));

        session.on_scene_swapped(&small);
        assert_eq!(session.selected(), Some(0));
    }

    #[test]
    fn empty_scene_has_no_selection() {
        let mut empty = Scene::new(Camera::default(), vec![], vec![]).unwrap();
        let mut session = TransformEditSession::new(&empty);
        session.select(3, &empty);
        assert_eq!(session.selected(), None);
        let mut nudge = |_: GizmoOperation, c: &mut TransformComponents| c.translation[0] += 1.0;
        assert!(!session.edit(&mut empty, &mut nudge));
    }

    #[test]
    fn selection_clamp_rules() {
        let mut selection = Selection::default();
        selection.select(9, 3);
        assert_eq!(selection.index(), Some(2));
        selection.clamp(0);
        assert_eq!(selection.index(), None);
        selection.reset(4);
        assert_eq!(selection.index(), Some(0));
    }
}
