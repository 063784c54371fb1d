use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{PhysicsError, PhysicsResult};
use crate::fixed_math::{FixedNum, FixedVec2};

/// Human-authored physics tuning, loaded from RON.
///
/// Floats live only here. Every value is converted exactly once into a
/// [`WorldConfig`] before a world is built, so all peers that load the same file
/// produce the same fixed-point configuration. Changing these values mid-match
/// desyncs peers; lock configuration before the first tick.
///
/// Missing fields in a RON file fall back to [`PhysicsSettings::default`].
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PhysicsSettings {
    // Timestep
    pub tick_rate: f64,
    pub iterations: usize,
    pub history_length: usize,

    // Integration
    pub gravity: (f32, f32),
    pub linear_damping: f32,
    pub angular_damping: f32,

    // Contact resolution
    pub elasticity: f32,
    pub resolve_slop: f32,
    pub resolve_rate: f32,
    pub area_mass_ratio: f32,

    // Broadphase
    pub broadphase_cell_size: f32,
    pub dynamic_aabb_margin: f32,

    // Queries and motion
    pub explosion_occluder_slop: f32,
    pub motion_substeps: usize,
    pub motion_bisection_steps: usize,
    pub motion_tolerance: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            iterations: 20,
            history_length: 20,
            gravity: (0.0, 0.0),
            linear_damping: 0.999,
            angular_damping: 0.999,
            elasticity: 1.0,
            resolve_slop: 0.01,
            resolve_rate: 0.1,
            area_mass_ratio: 1.0,
            broadphase_cell_size: 4.0,
            dynamic_aabb_margin: 0.2,
            explosion_occluder_slop: 0.05,
            motion_substeps: 8,
            motion_bisection_steps: 10,
            motion_tolerance: 0.001,
        }
    }
}

impl PhysicsSettings {
    pub fn from_ron_str(contents: &str) -> PhysicsResult<Self> {
        ron::from_str::<Self>(contents).map_err(|e| PhysicsError::ConfigParse(e.to_string()))
    }

    /// Read and parse a RON settings file.
    pub fn load(path: impl AsRef<Path>) -> PhysicsResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| PhysicsError::ConfigIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let settings = Self::from_ron_str(&contents)?;
        info!("[CONFIG] Loaded physics settings from {}", path.display());
        Ok(settings)
    }

    fn validate(&self) -> PhysicsResult<()> {
        let invalid = |msg: String| Err(PhysicsError::InvalidConfig(msg));

        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return invalid(format!("tick_rate must be positive, got {}", self.tick_rate));
        }
        check_iterations(self.iterations)?;
        check_history_length(self.history_length)?;
        for (name, value) in [
            ("linear_damping", self.linear_damping),
            ("angular_damping", self.angular_damping),
            ("resolve_rate", self.resolve_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must be in [0, 1], got {value}"));
            }
        }
        for (name, value) in [
            ("elasticity", self.elasticity),
            ("resolve_slop", self.resolve_slop),
            ("dynamic_aabb_margin", self.dynamic_aabb_margin),
            ("explosion_occluder_slop", self.explosion_occluder_slop),
            ("motion_tolerance", self.motion_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{name} must be non-negative, got {value}"));
            }
        }
        if !self.area_mass_ratio.is_finite() || self.area_mass_ratio <= 0.0 {
            return invalid(format!("area_mass_ratio must be positive, got {}", self.area_mass_ratio));
        }
        if !self.broadphase_cell_size.is_finite() || self.broadphase_cell_size <= 0.0 {
            return invalid(format!(
                "broadphase_cell_size must be positive, got {}",
                self.broadphase_cell_size
            ));
        }
        if !self.gravity.0.is_finite() || !self.gravity.1.is_finite() {
            return invalid("gravity must be finite".into());
        }
        if self.motion_substeps == 0 {
            return invalid("motion_substeps must be at least 1".into());
        }
        Ok(())
    }
}

/// Fixed-point runtime configuration owned by one [`World`](crate::world::World).
///
/// Built from [`PhysicsSettings`] with `WorldConfig::try_from`. Independent worlds
/// (prediction, rollback) each carry their own copy; nothing here is global.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    pub tick_rate: f64,
    pub delta_time: FixedNum,
    pub iterations: usize,
    pub history_length: usize,
    pub gravity: FixedVec2,
    pub linear_damping: FixedNum,
    pub angular_damping: FixedNum,
    pub elasticity: FixedNum,
    pub resolve_slop: FixedNum,
    pub resolve_rate: FixedNum,
    pub area_mass_ratio: FixedNum,
    pub broadphase_cell_size: FixedNum,
    pub dynamic_aabb_margin: FixedNum,
    pub explosion_occluder_slop: FixedNum,
    pub motion_substeps: usize,
    pub motion_bisection_steps: usize,
    pub motion_tolerance: FixedNum,
}

impl WorldConfig {
    fn from_settings(s: &PhysicsSettings) -> Self {
        Self {
            tick_rate: s.tick_rate,
            delta_time: FixedNum::from_num(1.0 / s.tick_rate),
            iterations: s.iterations,
            history_length: s.history_length,
            gravity: FixedVec2::from_f32(s.gravity.0, s.gravity.1),
            linear_damping: FixedNum::from_num(s.linear_damping),
            angular_damping: FixedNum::from_num(s.angular_damping),
            elasticity: FixedNum::from_num(s.elasticity),
            resolve_slop: FixedNum::from_num(s.resolve_slop),
            resolve_rate: FixedNum::from_num(s.resolve_rate),
            area_mass_ratio: FixedNum::from_num(s.area_mass_ratio),
            broadphase_cell_size: FixedNum::from_num(s.broadphase_cell_size),
            dynamic_aabb_margin: FixedNum::from_num(s.dynamic_aabb_margin),
            explosion_occluder_slop: FixedNum::from_num(s.explosion_occluder_slop),
            motion_substeps: s.motion_substeps,
            motion_bisection_steps: s.motion_bisection_steps,
            motion_tolerance: FixedNum::from_num(s.motion_tolerance),
        }
    }

    pub fn with_gravity(mut self, gravity: FixedVec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Rejects zero the same way loading settings does.
    pub fn with_iterations(mut self, iterations: usize) -> PhysicsResult<Self> {
        check_iterations(iterations)?;
        self.iterations = iterations;
        Ok(self)
    }

    pub fn with_history_length(mut self, history_length: usize) -> PhysicsResult<Self> {
        check_history_length(history_length)?;
        self.history_length = history_length;
        Ok(self)
    }
}

fn check_iterations(iterations: usize) -> PhysicsResult<()> {
    if iterations == 0 {
        return Err(PhysicsError::InvalidConfig("iterations must be at least 1".into()));
    }
    Ok(())
}

fn check_history_length(history_length: usize) -> PhysicsResult<()> {
    if history_length == 0 {
        return Err(PhysicsError::InvalidConfig("history_length must be at least 1".into()));
    }
    Ok(())
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::from_settings(&PhysicsSettings::default())
    }
}

impl TryFrom<PhysicsSettings> for WorldConfig {
    type Error = PhysicsError;

    fn try_from(settings: PhysicsSettings) -> PhysicsResult<Self> {
        Self::try_from(&settings)
    }
}

impl TryFrom<&PhysicsSettings> for WorldConfig {
    type Error = PhysicsError;

    fn try_from(settings: &PhysicsSettings) -> PhysicsResult<Self> {
        settings.validate()?;
        Ok(Self::from_settings(settings))
    }
}
