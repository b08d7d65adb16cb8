//! Robot configuration – reads/writes `robot.toml`.
//!
//! Every section is optional; anything missing takes the value the robot
//! was tuned with.  A handful of fields can be overridden from the
//! environment so a match-day alliance or loop rate does not need a file
//! edit.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ftc_hal::pinpoint::{EncoderDirection, GoBildaOdometryPods};
use ftc_hal::registry::DeviceNames;
use ftc_subsystems::aim::GoalAim;
use ftc_subsystems::drivetrain::DEFAULT_TURTLE_MULTIPLIER;
use ftc_subsystems::limelight::{
    OBELISK_PIPELINE_INDEX, POLLING_RATE_HZ, TARGETING_PIPELINE_INDEX, VisionSettings,
};
use ftc_subsystems::odometry::PodSettings;
use ftc_subsystems::output::OutputSettings;
use ftc_types::{Alliance, HardwareError, PidfCoefficients};

/// Default file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "robot.toml";

/// Top-level robot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub alliance: Alliance,
    /// Control loop rate in Hz.
    pub loop_hz: u32,
    pub devices: DeviceNames,
    pub drivetrain: DrivetrainConfig,
    pub odometry: OdometryConfig,
    pub output: OutputConfig,
    pub vision: VisionConfig,
    pub aim: AimConfig,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            alliance: Alliance::Blue,
            loop_hz: 50,
            devices: DeviceNames::default(),
            drivetrain: DrivetrainConfig::default(),
            odometry: OdometryConfig::default(),
            output: OutputConfig::default(),
            vision: VisionConfig::default(),
            aim: AimConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivetrainConfig {
    pub turtle_multiplier: f64,
}

impl Default for DrivetrainConfig {
    fn default() -> Self {
        Self {
            turtle_multiplier: DEFAULT_TURTLE_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdometryConfig {
    pub x_offset_mm: f64,
    pub y_offset_mm: f64,
    pub pods: GoBildaOdometryPods,
    pub x_direction: EncoderDirection,
    pub y_direction: EncoderDirection,
}

impl Default for OdometryConfig {
    fn default() -> Self {
        let pods = PodSettings::default();
        Self {
            x_offset_mm: pods.x_offset_mm,
            y_offset_mm: pods.y_offset_mm,
            pods: pods.pods,
            x_direction: pods.x_direction,
            y_direction: pods.y_direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub ticks_per_revolution: f64,
    pub gear_ratio: f64,
    pub rpm_tolerance: f64,
    pub feed_position: f64,
    pub reset_position: f64,
    pub feed_duration_ms: u64,
    /// Flywheel speed used by TeleOp when the shoot trigger is held.
    pub shot_rpm: f64,
    /// Hood servo change per dpad press.
    pub hood_step: f64,
    pub pidf: PidfCoefficients,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let s = OutputSettings::default();
        Self {
            ticks_per_revolution: s.ticks_per_revolution,
            gear_ratio: s.gear_ratio,
            rpm_tolerance: s.rpm_tolerance,
            feed_position: s.feed_position,
            reset_position: s.reset_position,
            feed_duration_ms: u64::try_from(s.feed_duration.as_millis()).unwrap_or(u64::MAX),
            shot_rpm: 3000.0,
            hood_step: 0.05,
            pidf: s.pidf,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub poll_rate_hz: u32,
    pub targeting_pipeline: i32,
    pub obelisk_pipeline: i32,
    /// How long the obelisk scan waits for a motif before giving up.
    pub scan_timeout_ms: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            poll_rate_hz: POLLING_RATE_HZ,
            targeting_pipeline: TARGETING_PIPELINE_INDEX,
            obelisk_pipeline: OBELISK_PIPELINE_INDEX,
            scan_timeout_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimConfig {
    pub kp: f64,
    pub kd: f64,
    pub deadband_deg: f64,
    pub max_rotation: f64,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            kp: 0.025,
            kd: 0.002,
            deadband_deg: 1.0,
            max_rotation: 0.5,
        }
    }
}

impl RobotConfig {
    /// Loop period derived from [`loop_hz`][Self::loop_hz]; a rate of 0 is
    /// treated as 1 Hz.
    pub fn loop_period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.loop_hz.max(1)))
    }

    pub fn output_settings(&self) -> OutputSettings {
        let o = &self.output;
        OutputSettings {
            ticks_per_revolution: o.ticks_per_revolution,
            gear_ratio: o.gear_ratio,
            rpm_tolerance: o.rpm_tolerance,
            feed_position: o.feed_position,
            reset_position: o.reset_position,
            feed_duration: Duration::from_millis(o.feed_duration_ms),
            pidf: o.pidf,
        }
    }

    pub fn pod_settings(&self) -> PodSettings {
        let o = &self.odometry;
        PodSettings {
            x_offset_mm: o.x_offset_mm,
            y_offset_mm: o.y_offset_mm,
            pods: o.pods,
            x_direction: o.x_direction,
            y_direction: o.y_direction,
        }
    }

    pub fn vision_settings(&self) -> VisionSettings {
        VisionSettings {
            poll_rate_hz: self.vision.poll_rate_hz,
            targeting_pipeline: self.vision.targeting_pipeline,
            obelisk_pipeline: self.vision.obelisk_pipeline,
        }
    }

    pub fn goal_aim(&self) -> GoalAim {
        GoalAim::new(self.aim.kp, self.aim.kd)
            .with_deadband(self.aim.deadband_deg)
            .with_max_rotation(self.aim.max_rotation)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.vision.scan_timeout_ms)
    }
}

/// `robot.toml` in the current directory.
pub fn config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Load the config from `path` and apply environment overrides.  A missing
/// file yields the defaults.
///
/// # Errors
///
/// Returns [`HardwareError::Config`] if the file exists but cannot be read
/// or parsed.
pub fn load_from(path: &Path) -> Result<RobotConfig, HardwareError> {
    let mut cfg = if path.exists() {
        let raw = fs::read_to_string(path).map_err(|e| {
            HardwareError::Config(format!("Failed to read config at {}: {}", path.display(), e))
        })?;
        toml::from_str(&raw)
            .map_err(|e| HardwareError::Config(format!("Failed to parse config: {}", e)))?
    } else {
        RobotConfig::default()
    };
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Apply `FTC_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `FTC_ALLIANCE` | `alliance` |
/// | `FTC_LOOP_HZ` | `loop_hz` |
/// | `FTC_TURTLE_MULTIPLIER` | `drivetrain.turtle_multiplier` |
/// | `FTC_FEED_DURATION_MS` | `output.feed_duration_ms` |
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(cfg: &mut RobotConfig) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides(cfg: &mut RobotConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("FTC_ALLIANCE") {
        cfg.alliance = Alliance::from_name(&v);
    }
    if let Some(v) = lookup("FTC_LOOP_HZ")
        && let Ok(hz) = v.trim().parse::<u32>()
    {
        cfg.loop_hz = hz;
    }
    if let Some(v) = lookup("FTC_TURTLE_MULTIPLIER")
        && let Ok(m) = v.trim().parse::<f64>()
    {
        cfg.drivetrain.turtle_multiplier = m;
    }
    if let Some(v) = lookup("FTC_FEED_DURATION_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
    {
        cfg.output.feed_duration_ms = ms;
    }
}

/// Save the config to `path`, creating parent directories if necessary.
///
/// # Errors
///
/// Returns [`HardwareError::Config`] on serialisation or I/O failure.
pub fn save_to(cfg: &RobotConfig, path: &Path) -> Result<(), HardwareError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| {
            HardwareError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| HardwareError::Config(format!("Failed to serialize config: {}", e)))?;
    fs::write(path, raw).map_err(|e| {
        HardwareError::Config(format!("Failed to write config at {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let cfg = load_from(&dir.path().join("robot.toml")).expect("load");
        let mut expected = RobotConfig::default();
        apply_env_overrides(&mut expected);
        assert_eq!(cfg, expected);
    }

    #[test]
    fn save_then_load_preserves_fields() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("nested").join("robot.toml");

        let mut cfg = RobotConfig::default();
        cfg.devices.flywheel = "shooter".to_string();
        cfg.odometry.pods = GoBildaOdometryPods::Swingarm;
        cfg.output.pidf = PidfCoefficients::new(1.0, 2.0, 3.0, 4.0);
        cfg.vision.obelisk_pipeline = 3;
        save_to(&cfg, &path).expect("save");

        let raw = fs::read_to_string(&path).expect("read");
        let loaded: RobotConfig = toml::from_str(&raw).expect("parse");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let raw = r#"
            alliance = "red"

            [devices]
            limelight = "ll3a"

            [output]
            shot_rpm = 3600.0
        "#;
        let cfg: RobotConfig = toml::from_str(raw).expect("parse");
        assert_eq!(cfg.alliance, Alliance::Red);
        assert_eq!(cfg.devices.limelight, "ll3a");
        assert_eq!(cfg.devices.front_left, "frontLeft");
        assert_eq!(cfg.output.shot_rpm, 3600.0);
        assert_eq!(cfg.output.feed_duration_ms, 250);
        assert_eq!(cfg.loop_hz, 50);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("robot.toml");
        fs::write(&path, "loop_hz = \"fast\"").expect("write");
        assert!(matches!(load_from(&path), Err(HardwareError::Config(_))));
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = RobotConfig::default();
        apply_overrides(
            &mut cfg,
            env(&[
                ("FTC_ALLIANCE", "Red"),
                ("FTC_LOOP_HZ", "100"),
                ("FTC_TURTLE_MULTIPLIER", "0.4"),
                ("FTC_FEED_DURATION_MS", "400"),
            ]),
        );
        assert_eq!(cfg.alliance, Alliance::Red);
        assert_eq!(cfg.loop_hz, 100);
        assert_eq!(cfg.drivetrain.turtle_multiplier, 0.4);
        assert_eq!(cfg.output_settings().feed_duration, Duration::from_millis(400));
    }

    #[test]
    fn unparsable_env_values_are_ignored() {
        let mut cfg = RobotConfig::default();
        apply_overrides(
            &mut cfg,
            env(&[("FTC_LOOP_HZ", "lots"), ("FTC_FEED_DURATION_MS", "-1")]),
        );
        assert_eq!(cfg.loop_hz, 50);
        assert_eq!(cfg.output.feed_duration_ms, 250);
    }

    #[test]
    fn settings_conversions() {
        let cfg = RobotConfig::default();
        assert_eq!(cfg.pod_settings(), PodSettings::default());
        assert_eq!(cfg.vision_settings(), VisionSettings::default());
        assert_eq!(cfg.output_settings(), OutputSettings::default());
        assert_eq!(cfg.loop_period(), Duration::from_millis(20));
    }

    #[test]
    fn zero_loop_rate_does_not_divide_by_zero() {
        let cfg = RobotConfig {
            loop_hz: 0,
            ..RobotConfig::default()
        };
        assert_eq!(cfg.loop_period(), Duration::from_secs(1));
    }
}
