// gradient/config.rs - Sampler configuration
//
// Every field has a default so that `SamplerConfig::default()` is the
// identity pipeline and partial JSON documents fill in the rest.

use crate::error::{SamplerError, SamplerResult};
use crate::gradient::math::{Transform3x4, Vec3};
use crate::gradient::source::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::hash::{Hash, Hasher};

/// Optional affine remap of the query position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformConfig {
    pub enabled: bool,
    pub translate: Vec3,
    pub scale: Vec3,
    /// Euler angles in degrees.
    pub rotate: Vec3,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            enabled: false,
            translate: Vec3::ZERO,
            scale: Vec3::ONE,
            rotate: Vec3::ZERO,
        }
    }
}

impl TransformConfig {
    pub fn params_set(&self) -> bool {
        self.translate != Vec3::ZERO || self.rotate != Vec3::ZERO || self.scale != Vec3::ONE
    }

    /// True when positions must actually be transformed.
    pub fn is_active(&self) -> bool {
        self.enabled && self.params_set()
    }

    /// Compose rotate, scale and translate into a single matrix.
    pub fn to_matrix(&self) -> Transform3x4 {
        let mut matrix = Transform3x4::from_euler_degrees(self.rotate);
        matrix.multiply_by_scale(self.scale);
        matrix.set_translation(self.translate);
        matrix
    }
}

/// Embedded levels controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LevelsConfig {
    pub enabled: bool,
    pub input_mid: f32,
    pub input_min: f32,
    pub input_max: f32,
    pub output_min: f32,
    pub output_max: f32,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        LevelsConfig {
            enabled: false,
            input_mid: 0.5,
            input_min: 0.0,
            input_max: 1.0,
            output_min: 0.0,
            output_max: 1.0,
        }
    }
}

impl LevelsConfig {
    pub fn params_set(&self) -> bool {
        let d = LevelsConfig::default();
        self.input_mid != d.input_mid
            || self.input_min != d.input_min
            || self.input_max != d.input_max
            || self.output_min != d.output_min
            || self.output_max != d.output_max
    }

    pub fn is_active(&self) -> bool {
        self.enabled && self.params_set()
    }
}

/// Per-sampler configuration. Read-only while an evaluation is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SamplerConfig {
    /// The gradient this sampler reads from. May be invalid or unregistered.
    pub gradient_id: EntityId,
    pub opacity: f32,
    pub invert_input: bool,
    pub transform: TransformConfig,
    pub levels: LevelsConfig,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            gradient_id: EntityId::INVALID,
            opacity: 1.0,
            invert_input: false,
            transform: TransformConfig::default(),
            levels: LevelsConfig::default(),
        }
    }
}

impl SamplerConfig {
    /// Shorthand for a config that reads `gradient_id` with everything else default.
    pub fn for_gradient(gradient_id: EntityId) -> Self {
        SamplerConfig {
            gradient_id,
            ..Default::default()
        }
    }

    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> SamplerResult<Self> {
        let config: SamplerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_value(value: Value) -> SamplerResult<Self> {
        let config: SamplerConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject non-finite numbers. Range checks are left to the pipeline,
    /// which clamps where it needs to.
    pub fn validate(&self) -> SamplerResult<()> {
        if !self.opacity.is_finite() {
            return Err(SamplerError::Config(format!(
                "opacity must be finite, got {}",
                self.opacity
            )));
        }

        let t = &self.transform;
        for (name, v) in [
            ("translate", t.translate),
            ("scale", t.scale),
            ("rotate", t.rotate),
        ] {
            if !v.is_finite() {
                return Err(SamplerError::Config(format!(
                    "transform.{} must be finite, got {:?}",
                    name, v
                )));
            }
        }

        let l = &self.levels;
        for (name, v) in [
            ("inputMid", l.input_mid),
            ("inputMin", l.input_min),
            ("inputMax", l.input_max),
            ("outputMin", l.output_min),
            ("outputMax", l.output_max),
        ] {
            if !v.is_finite() {
                return Err(SamplerError::Config(format!(
                    "levels.{} must be finite, got {}",
                    name, v
                )));
            }
        }

        Ok(())
    }

    /// Hash every field that influences evaluation, bit-exact for floats.
    pub fn hash_into<H: Hasher>(&self, hasher: &mut H) {
        self.gradient_id.hash(hasher);
        self.opacity.to_bits().hash(hasher);
        self.invert_input.hash(hasher);

        self.transform.enabled.hash(hasher);
        self.transform.translate.hash_bits(hasher);
        self.transform.scale.hash_bits(hasher);
        self.transform.rotate.hash_bits(hasher);

        let l = &self.levels;
        l.enabled.hash(hasher);
        for v in [
            l.input_mid,
            l.input_min,
            l.input_max,
            l.output_min,
            l.output_max,
        ] {
            v.to_bits().hash(hasher);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_identity() {
        let c = SamplerConfig::default();
        assert!(!c.gradient_id.is_valid());
        assert_eq!(c.opacity, 1.0);
        assert!(!c.invert_input);
        assert!(!c.transform.params_set());
        assert!(!c.transform.is_active());
        assert!(!c.levels.params_set());
        assert!(!c.levels.is_active());
    }

    #[test]
    fn enabled_without_params_is_inactive() {
        let mut c = SamplerConfig::default();
        c.transform.enabled = true;
        c.levels.enabled = true;
        assert!(!c.transform.is_active());
        assert!(!c.levels.is_active());

        c.transform.scale = Vec3::new(2.0, 1.0, 1.0);
        c.levels.input_max = 0.8;
        assert!(c.transform.is_active());
        assert!(c.levels.is_active());
    }

    #[test]
    fn params_without_enabled_is_inactive() {
        let mut c = SamplerConfig::default();
        c.transform.translate = Vec3::new(1.0, 0.0, 0.0);
        c.levels.output_min = 0.2;
        assert!(c.transform.params_set());
        assert!(!c.transform.is_active());
        assert!(!c.levels.is_active());
    }

    #[test]
    fn parse_partial_json() {
        let c = SamplerConfig::from_value(json!({
            "gradientId": 7,
            "opacity": 0.5,
            "transform": { "enabled": true, "translate": { "x": 1.0, "y": 2.0, "z": 3.0 } },
            "levels": { "enabled": true, "inputMax": 0.8 }
        }))
        .unwrap();

        assert_eq!(c.gradient_id, EntityId::new(7));
        assert_eq!(c.opacity, 0.5);
        assert!(!c.invert_input);
        assert_eq!(c.transform.translate, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(c.transform.scale, Vec3::ONE);
        assert_eq!(c.levels.input_mid, 0.5);
        assert_eq!(c.levels.input_max, 0.8);
        assert!(c.levels.is_active());
    }

    #[test]
    fn parse_empty_document_gives_defaults() {
        let c = SamplerConfig::from_json("{}").unwrap();
        assert_eq!(c, SamplerConfig::default());
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = SamplerConfig::from_json("{ \"opacity\": \"high\" }").unwrap_err();
        assert!(matches!(err, SamplerError::Json(_)), "got {:?}", err);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut c = SamplerConfig::default();
        c.opacity = f32::NAN;
        assert!(matches!(c.validate(), Err(SamplerError::Config(_))));

        let mut c = SamplerConfig::default();
        c.transform.rotate = Vec3::new(0.0, f32::INFINITY, 0.0);
        let msg = c.validate().unwrap_err().to_string();
        assert!(msg.contains("transform.rotate"), "got {}", msg);

        let mut c = SamplerConfig::default();
        c.levels.input_mid = f32::NEG_INFINITY;
        let msg = c.validate().unwrap_err().to_string();
        assert!(msg.contains("levels.inputMid"), "got {}", msg);
    }

    #[test]
    fn round_trips_through_json() {
        let mut c = SamplerConfig::for_gradient(EntityId::new(3));
        c.invert_input = true;
        c.levels.enabled = true;
        c.levels.input_mid = 0.25;
        let text = serde_json::to_string(&c).unwrap();
        assert!(text.contains("\"invertInput\":true"));
        assert_eq!(SamplerConfig::from_json(&text).unwrap(), c);
    }

    #[test]
    fn matrix_order_is_rotate_scale_translate() {
        let t = TransformConfig {
            enabled: true,
            translate: Vec3::new(10.0, 0.0, 0.0),
            scale: Vec3::new(2.0, 1.0, 1.0),
            rotate: Vec3::new(0.0, 0.0, 90.0),
        };
        let p = t.to_matrix().transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!((p.x - 10.0).abs() < 1e-5 && (p.y - 2.0).abs() < 1e-5 && p.z.abs() < 1e-5, "got {:?}", p);
    }
}
