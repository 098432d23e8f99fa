use std::ops::RangeInclusive;

pub const UNIT_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const ROUGHNESS_RANGE: RangeInclusive<f32> = 0.001..=1.0;
pub const IOR_RANGE: RangeInclusive<f32> = 1.001..=2.0;
pub const AT_DISTANCE_RANGE: RangeInclusive<f32> = 0.05..=10.0;

/// Disney-style principled material as edited in the Objects panel.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Material {
    pub name: String,
    pub albedo: [f32; 3],
    pub emission: [f32; 3],
    pub extinction: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub specular: f32,
    pub specular_tint: f32,
    pub subsurface: f32,
    pub sheen: f32,
    pub sheen_tint: f32,
    pub clearcoat: f32,
    pub clearcoat_gloss: f32,
    pub transmission: f32,
    pub ior: f32,
    pub at_distance: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::from("default"),
            albedo: [1.0, 1.0, 1.0],
            emission: [0.0, 0.0, 0.0],
            extinction: [1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            specular: 0.5,
            specular_tint: 0.0,
            subsurface: 0.0,
            sheen: 0.0,
            sheen_tint: 0.0,
            clearcoat: 0.0,
            clearcoat_gloss: 0.0,
            transmission: 0.0,
            ior: 1.45,
            at_distance: 1.0,
        }
    }
}

/// Scalar parameter as listed in the material editor: label, value, allowed range.
pub struct ScalarParam<'a> {
    pub label: &'static str,
    pub value: &'a mut f32,
    pub range: RangeInclusive<f32>,
}

impl Material {
    /// Every scalar with the range the editor enforces, in display order.
    pub fn scalar_params_mut(&mut self) -> [ScalarParam<'_>; 12] {
        [
            ScalarParam { label: "Metallic", value: &mut self.metallic, range: UNIT_RANGE },
            ScalarParam { label: "Roughness", value: &mut self.roughness, range: ROUGHNESS_RANGE },
            ScalarParam { label: "Specular", value: &mut self.specular, range: UNIT_RANGE },
            ScalarParam { label: "SpecularTint", value: &mut self.specular_tint, range: UNIT_RANGE },
            ScalarParam { label: "Subsurface", value: &mut self.subsurface, range: UNIT_RANGE },
            ScalarParam { label: "Sheen", value: &mut self.sheen, range: UNIT_RANGE },
            ScalarParam { label: "SheenTint", value: &mut self.sheen_tint, range: UNIT_RANGE },
            ScalarParam { label: "Clearcoat", value: &mut self.clearcoat, range: UNIT_RANGE },
            ScalarParam { label: "ClearcoatGloss", value: &mut self.clearcoat_gloss, range: UNIT_RANGE },
            ScalarParam { label: "Transmission", value: &mut self.transmission, range: UNIT_RANGE },
            ScalarParam { label: "Ior", value: &mut self.ior, range: IOR_RANGE },
            ScalarParam { label: "AtDistance", value: &mut self.at_distance, range: AT_DISTANCE_RANGE },
        ]
    }

    /// Forces every field into its editor range. Returns true if anything moved.
    pub fn clamp_to_ranges(&mut self) -> bool {
        let mut changed = false;
        for param in self.scalar_params_mut() {
            let clamped = clamp_finite(*param.value, &param.range);
            if clamped.to_bits() != param.value.to_bits() {
                *param.value = clamped;
                changed = true;
            }
        }
        for color in [&mut self.albedo, &mut self.extinction] {
            for channel in color.iter_mut() {
                let clamped = clamp_finite(*channel, &UNIT_RANGE);
                if clamped.to_bits() != channel.to_bits() {
                    *channel = clamped;
                    changed = true;
                }
            }
        }
        for channel in self.emission.iter_mut() {
            let clamped = if channel.is_finite() { channel.max(0.0) } else { 0.0 };
            if clamped.to_bits() != channel.to_bits() {
                *channel = clamped;
                changed = true;
            }
        }
        changed
    }
}

fn clamp_finite(value: f32, range: &RangeInclusive<f32>) -> f32 {
    if value.is_nan() {
        *range.start()
    } else {
        value.clamp(*range.start(), *range.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_material_is_within_ranges() {
        let mut material = Material::default();
        assert!(!material.clamp_to_ranges());
    }

    #[test]
    fn clamp_pulls_values_into_editor_ranges() {
        let mut material = Material {
            roughness: 0.0,
            ior: 3.5,
            at_distance: -1.0,
            metallic: f32::NAN,
            albedo: [2.0, 0.5, -1.0],
            emission: [-4.0, 12.0, 0.0],
            ..Material::default()
        };
        assert!(material.clamp_to_ranges());
        assert_eq!(material.roughness, 0.001);
        assert_eq!(material.ior, 2.0);
        assert_eq!(material.at_distance, 0.05);
        assert_eq!(material.metallic, 0.0);
        assert_eq!(material.albedo, [1.0, 0.5, 0.0]);
        // Emission is unbounded above.
        assert_eq!(material.emission, [0.0, 12.0, 0.0]);
    }
}
