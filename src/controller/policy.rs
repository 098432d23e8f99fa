//! Reduces one frame's worth of edits to a single renderer lifecycle action.

use crate::scene::RenderOptions;

/// Everything that happened to the scene or its settings during one frame.
///
/// Built fresh every frame by the UI pass and consumed once by [`decide`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameEdits {
    pub camera_moved: bool,
    pub soft_options_changed: bool,
    pub structural_options_changed: bool,
    pub material_changed: bool,
    pub transform_changed: bool,
    pub scene_swapped: bool,
    pub viewport_resized: bool,
}

impl FrameEdits {
    pub fn merge(&mut self, other: FrameEdits) {
        self.camera_moved |= other.camera_moved;
        self.soft_options_changed |= other.soft_options_changed;
        self.structural_options_changed |= other.structural_options_changed;
        self.material_changed |= other.material_changed;
        self.transform_changed |= other.transform_changed;
        self.scene_swapped |= other.scene_swapped;
        self.viewport_resized |= other.viewport_resized;
    }

    pub fn record_options(&mut self, changes: OptionChanges) {
        self.soft_options_changed |= changes.soft;
        self.structural_options_changed |= changes.structural;
    }

    pub fn needs_reconstruct(&self) -> bool {
        self.scene_swapped || self.viewport_resized || self.structural_options_changed
    }

    pub fn needs_reset(&self) -> bool {
        self.camera_moved
            || self.soft_options_changed
            || self.material_changed
            || self.transform_changed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererAction {
    /// Keep accumulating on the current handle.
    NoOp,
    /// Clear the accumulation buffer and sample counter.
    ResetAccumulation,
    /// Drop the handle and build a new one for the current scene and options.
    Reconstruct,
}

/// Highest-precedence action wins; any number of structural edits still
/// yields a single [`RendererAction::Reconstruct`].
pub fn decide(edits: &FrameEdits) -> RendererAction {
    if edits.needs_reconstruct() {
        RendererAction::Reconstruct
    } else if edits.needs_reset() {
        RendererAction::ResetAccumulation
    } else {
        RendererAction::NoOp
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OptionChanges {
    pub soft: bool,
    pub structural: bool,
}

/// Compares the options last applied to the scene against the working copy.
///
/// Structural fields change the renderer's resources or code paths; soft fields
/// only change per-sample evaluation. `enable_denoiser` is neither.
pub fn classify_options(applied: &RenderOptions, working: &RenderOptions) -> OptionChanges {
    let structural = applied.resolution != working.resolution
        || applied.use_env_map != working.use_env_map
        || applied.enable_rr != working.enable_rr
        || applied.rr_depth != working.rr_depth
        || applied.use_constant_bg != working.use_constant_bg;
    let soft = applied.max_depth != working.max_depth
        || applied.hdr_multiplier.to_bits() != working.hdr_multiplier.to_bits()
        || applied
            .background_color
            .iter()
            .zip(working.background_color.iter())
            .any(|(a, b)| a.to_bits() != b.to_bits());
    OptionChanges { soft, structural }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_edits_keep_accumulating() {
        assert_eq!(decide(&FrameEdits::default()), RendererAction::NoOp);
    }

    #[test]
    fn soft_edits_reset_accumulation() {
        let cases = [
            FrameEdits { camera_moved: true, ..Default::default() },
            FrameEdits { soft_options_changed: true, ..Default::default() },
            FrameEdits { material_changed: true, ..Default::default() },
            FrameEdits { transform_changed: true, ..Default::default() },
        ];
        for edits in cases {
            assert_eq!(decide(&edits), RendererAction::ResetAccumulation, "{edits:?}");
        }
    }

    #[test]
    fn structural_edits_win_over_soft_ones() {
        let edits = FrameEdits {
            camera_moved: true,
            material_changed: true,
            viewport_resized: true,
            ..Default::default()
        };
        assert_eq!(decide(&edits), RendererAction::Reconstruct);

        let swap = FrameEdits { scene_swapped: true, ..Default::default() };
        assert_eq!(decide(&swap), RendererAction::Reconstruct);
    }

    #[test]
    fn classification_splits_soft_and_structural_fields() {
        let applied = RenderOptions::default();

        let mut working = applied.clone();
        working.max_depth += 3;
        working.background_color[1] = 0.9;
        assert_eq!(
            classify_options(&applied, &working),
            OptionChanges { soft: true, structural: false }
        );

        let mut working = applied.clone();
        working.use_env_map = !working.use_env_map;
        working.enable_rr = !working.enable_rr;
        working.rr_depth += 1;
        working.resolution = [640, 480];
        let changes = classify_options(&applied, &working);
        assert!(changes.structural && !changes.soft);

        let mut edits = FrameEdits::default();
        edits.record_options(changes);
        assert_eq!(decide(&edits), RendererAction::Reconstruct);
    }

    #[test]
    fn denoiser_toggle_is_not_an_edit() {
        let applied = RenderOptions::default();
        let working = RenderOptions {
            enable_denoiser: !applied.enable_denoiser,
            ..applied.clone()
        };
        assert_eq!(classify_options(&applied, &working), OptionChanges::default());
    }

    #[test]
    fn merge_accumulates_flags() {
        let mut edits = FrameEdits { camera_moved: true, ..Default::default() };
        edits.merge(FrameEdits { scene_swapped: true, ..Default::default() });
        assert!(edits.camera_moved && edits.scene_swapped);
    }
}
