//! Rig tunables.

use crate::controller::{AnimationController, DEFAULT_BLEND_DURATION};
use crate::error::ConfigError;
use crate::ik::{FootIk, HandIk, LookAtLimits};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Solver settings and blend timing for one character rig.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RigConfig {
    /// Leg IK.
    pub foot: FootIk,
    /// Arm IK.
    pub hand: HandIk,
    /// Head aiming limits.
    pub look_at: LookAtLimits,
    /// Crossfade length when no transition specifies one, in seconds.
    pub default_blend_duration: f32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            foot: FootIk::default(),
            hand: HandIk::default(),
            look_at: LookAtLimits::default(),
            default_blend_duration: DEFAULT_BLEND_DURATION,
        }
    }
}

impl RigConfig {
    /// Parses and validates a JSON document.
    ///
    /// Missing fields take their default values.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects negative, non-finite, or zero-where-positive values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("foot.upper_length", self.foot.upper_length())?;
        non_negative("foot.lower_length", self.foot.lower_length())?;
        positive("foot.max_stretch", self.foot.max_stretch())?;
        non_negative("hand.upper_length", self.hand.upper_length())?;
        non_negative("hand.lower_length", self.hand.lower_length())?;
        non_negative("look_at.max_yaw", self.look_at.max_yaw)?;
        non_negative("look_at.max_pitch", self.look_at.max_pitch)?;
        non_negative("default_blend_duration", self.default_blend_duration)?;
        Ok(())
    }

    /// Creates an empty controller using this config's blend duration.
    pub fn controller(&self) -> AnimationController {
        AnimationController::new().with_default_blend_duration(self.default_blend_duration)
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RigConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_blend_duration, 0.3);
        assert_eq!(config.foot, FootIk::default());
    }

    #[test]
    fn test_rejects_negative_length() {
        let mut config = RigConfig::default();
        config.hand.set_arm_lengths(-1.0, 1.5);
        match config.validate() {
            Err(ConfigError::InvalidValue { field, value }) => {
                assert_eq!(field, "hand.upper_length");
                assert_eq!(value, -1.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rejects_zero_stretch() {
        let mut config = RigConfig::default();
        config.foot.set_max_stretch(0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "foot.max_stretch",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_nan() {
        let config = RigConfig {
            default_blend_duration: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_controller_uses_blend_duration() {
        let config = RigConfig {
            default_blend_duration: 0.75,
            ..Default::default()
        };
        assert_eq!(config.controller().default_blend_duration(), 0.75);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_partial() {
        let config = RigConfig::from_json_str(
            r#"{ "default_blend_duration": 0.5, "foot": { "max_stretch": 1.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.default_blend_duration, 0.5);
        assert_eq!(config.foot.max_stretch(), 1.0);
        assert_eq!(config.foot.upper_length(), 2.0);
        assert_eq!(config.hand, HandIk::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            RigConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RigConfig::from_json_str(r#"{ "look_at": { "max_yaw": -1.0 } }"#),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
