// src/params.rs

//! # Tunable Parameter Module
//!
//! Named floating-point constants with hard-coded defaults, bulk-reloadable
//! from `key=value` text. The set of parameters is closed: every [`Param`]
//! exists from construction on and only its value changes afterwards.
//!
//! ```text
//! # comment lines and blank lines are ignored
//! DrivetrainAngleP = 0.06
//! ShooterResetTime=1200
//! ```
//!
//! Malformed lines and unknown keys are logged and skipped; the rest of the
//! text still applies. After a successful reload every dependent
//! [`Tunable`] is notified exactly once.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading tunable parameters.
#[derive(Debug, Error)]
pub enum ParamError {
    /// The constants source could not be read.
    #[error("could not read constants from {path}: {source}")]
    Io {
        /// Where the read was attempted.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A line was neither a comment, blank, nor `key=value` with a numeric value.
    #[error("malformed constants line {line}: {text:?}")]
    Malformed {
        /// One-based line number.
        line: usize,
        /// The offending text.
        text: String,
    },

    /// A well-formed line named a parameter that does not exist.
    #[error("unknown constant {key:?} on line {line}")]
    UnknownKey {
        /// One-based line number.
        line: usize,
        /// The key as written.
        key: String,
    },
}

macro_rules! params {
    ($($(#[$doc:meta])* $variant:ident = $default:expr,)+) => {
        /// Every tunable constant known to the robot.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Param {
            $($(#[$doc])* $variant,)+
        }

        impl Param {
            /// All parameters in declaration order.
            pub const ALL: &'static [Param] = &[$(Param::$variant,)+];

            /// Key used in constants text.
            pub fn name(self) -> &'static str {
                match self {
                    $(Param::$variant => stringify!($variant),)+
                }
            }

            /// Value the parameter holds until a reload changes it.
            pub fn default_value(self) -> f64 {
                match self {
                    $(Param::$variant => $default,)+
                }
            }
        }
    };
}

params! {
    /// Distance-hold proportional gain, low gear.
    DrivetrainDistanceLowP = 0.0005,
    /// Distance-hold integral gain, low gear.
    DrivetrainDistanceLowI = 0.0,
    /// Distance-hold derivative gain, low gear.
    DrivetrainDistanceLowD = 0.0,
    /// Distance-hold proportional gain, high gear.
    DrivetrainDistanceHighP = 0.0003,
    /// Distance-hold integral gain, high gear.
    DrivetrainDistanceHighI = 0.0,
    /// Distance-hold derivative gain, high gear.
    DrivetrainDistanceHighD = 0.0,
    /// Heading-hold proportional gain.
    DrivetrainAngleP = 0.05,
    /// Heading-hold integral gain.
    DrivetrainAngleI = 0.0,
    /// Heading-hold derivative gain.
    DrivetrainAngleD = 0.0,
    /// Cheesy drive quick-turn gain.
    DrivetrainTurnGain = 1.5,
    /// Throttle magnitude above which the quick-turn gain applies.
    DrivetrainQuickTurnThreshold = 0.5,
    /// Fraction of saturation overflow moved to the opposite side.
    DrivetrainSkimGain = 0.25,
    /// Shape of the cheesy drive sine turn curve, in `(0, 1]`.
    DrivetrainWheelNonLinearity = 0.5,
    /// Encoder ticks covering the autonomous drive-up distance.
    Drivetrain8ft = 20700.0,
    /// Arm position proportional gain.
    ShooterP = 2.0,
    /// Arm position integral gain.
    ShooterI = 0.0,
    /// Arm position derivative gain.
    ShooterD = 0.0,
    /// Clutch cooldown after firing, in milliseconds.
    ShooterResetTime = 1000.0,
    /// Potentiometer voltage treated as the loading position.
    ShooterLoadingVoltage = 4.5,
    /// Offset added to autonomous arm setpoints.
    ShooterAngleOffset = 0.0,
    /// Arm setpoint for a ten foot shot.
    Shooter10ft = 1.6,
    /// Arm setpoint used by the high goal routine.
    AutonomousShooterSetpoint = 1.4,
    /// Control ticks between dashboard publishes.
    DashboardUpdateFrequency = 10.0,
}

impl Param {
    /// Looks a parameter up by its constants-text key.
    pub fn from_name(name: &str) -> Option<Param> {
        Param::ALL.iter().copied().find(|param| param.name() == name)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Component whose behavior depends on tunable parameters.
pub trait Tunable {
    /// Re-reads every parameter the component uses.
    fn update_constants(&mut self, params: &ParameterStore);
}

/// Outcome of applying one block of constants text.
#[derive(Debug, Default)]
pub struct ReloadReport {
    /// Parameters whose value was assigned, in file order.
    pub updated: Vec<Param>,
    /// Lines that were skipped, with the reason.
    pub skipped: Vec<ParamError>,
}

impl ReloadReport {
    /// `true` when every non-comment line applied.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Where constants text comes from.
pub trait ConstantsSource {
    /// Reads the full text of the constants.
    fn load(&self) -> Result<String, ParamError>;
}

/// Constants stored in a text file on disk.
#[derive(Debug, Clone)]
pub struct ConstantsFile {
    path: PathBuf,
}

impl ConstantsFile {
    /// Conventional file name on the robot.
    pub const DEFAULT_NAME: &'static str = "Constants.txt";

    /// Reads constants from `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        ConstantsFile {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConstantsSource for ConstantsFile {
    fn load(&self) -> Result<String, ParamError> {
        fs::read_to_string(&self.path).map_err(|source| ParamError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

/// Constants held in memory, for simulations and tests.
#[derive(Debug, Clone, Default)]
pub struct ConstantsText(pub String);

impl ConstantsSource for ConstantsText {
    fn load(&self) -> Result<String, ParamError> {
        Ok(self.0.clone())
    }
}

/// Store of every [`Param`] value.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    values: HashMap<Param, f64>,
}

impl ParameterStore {
    /// Creates a store holding every default.
    pub fn new() -> Self {
        let values = Param::ALL
            .iter()
            .map(|&param| (param, param.default_value()))
            .collect();
        ParameterStore { values }
    }

    /// Current value of `param`.
    pub fn get(&self, param: Param) -> f64 {
        self.values
            .get(&param)
            .copied()
            .unwrap_or_else(|| param.default_value())
    }

    /// Assigns a single value directly.
    pub fn set(&mut self, param: Param, value: f64) {
        self.values.insert(param, value);
    }

    /// Applies constants text. Parameters not mentioned keep their values.
    pub fn apply(&mut self, text: &str) -> ReloadReport {
        let mut report = ReloadReport::default();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            match parse_line(line, raw) {
                Ok(None) => {}
                Ok(Some((param, value))) => {
                    self.values.insert(param, value);
                    report.updated.push(param);
                }
                Err(err) => {
                    log::warn!("skipping constant: {}", err);
                    report.skipped.push(err);
                }
            }
        }

        log::debug!(
            "applied {} constants, skipped {} lines",
            report.updated.len(),
            report.skipped.len()
        );
        report
    }

    /// Loads text from `source`, applies it, then notifies each dependent once.
    ///
    /// When the source cannot be read nothing changes and nobody is notified.
    pub fn reload_and_notify(
        &mut self,
        source: &dyn ConstantsSource,
        dependents: &mut [&mut dyn Tunable],
    ) -> Result<ReloadReport, ParamError> {
        let text = source.load().map_err(|err| {
            log::error!("constants reload failed: {}", err);
            err
        })?;
        let report = self.apply(&text);
        for dependent in dependents.iter_mut() {
            dependent.update_constants(self);
        }
        Ok(report)
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_line(line: usize, raw: &str) -> Result<Option<(Param, f64)>, ParamError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let malformed = || ParamError::Malformed {
        line,
        text: raw.to_string(),
    };
    let (key, value) = trimmed.split_once('=').ok_or_else(malformed)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(malformed());
    }
    let value: f64 = value.trim().parse().map_err(|_| malformed())?;
    if !value.is_finite() {
        return Err(malformed());
    }

    let param = Param::from_name(key).ok_or_else(|| ParamError::UnknownKey {
        line,
        key: key.to_string(),
    })?;
    Ok(Some((param, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use std::collections::HashSet;

    #[derive(Default)]
    struct CountingDependent {
        calls: usize,
        skim_gain: f64,
    }

    impl Tunable for CountingDependent {
        fn update_constants(&mut self, params: &ParameterStore) {
            self.calls += 1;
            self.skim_gain = params.get(Param::DrivetrainSkimGain);
        }
    }

    struct FailingSource;

    impl ConstantsSource for FailingSource {
        fn load(&self) -> Result<String, ParamError> {
            Err(ParamError::Io {
                path: "missing.txt".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            })
        }
    }

    /// Test that parameter names are unique and round-trip through lookup.
    #[test]
    fn test_params_names_unique() {
        let names: HashSet<&str> = Param::ALL.iter().map(|param| param.name()).collect();
        assert_eq!(names.len(), Param::ALL.len(), "Parameter names must be unique.");
        for &param in Param::ALL {
            assert_eq!(Param::from_name(param.name()), Some(param));
        }
    }

    /// Test that a new store holds every default.
    #[test]
    fn test_params_defaults() {
        let store = ParameterStore::new();
        for &param in Param::ALL {
            assert!(value_close(param.default_value(), store.get(param)));
        }
    }

    /// Test that comments, blanks and whitespace are handled.
    #[test]
    fn test_params_apply_parses_lines() {
        let mut store = ParameterStore::new();
        let report = store.apply("# tuning\n\n  DrivetrainAngleP = 0.08  \nShooterResetTime=1200\n");

        assert!(report.is_clean());
        assert_eq!(report.updated, vec![Param::DrivetrainAngleP, Param::ShooterResetTime]);
        assert!(value_close(0.08, store.get(Param::DrivetrainAngleP)));
        assert!(value_close(1200.0, store.get(Param::ShooterResetTime)));
    }

    /// Test that bad lines are skipped without aborting the reload.
    #[test]
    fn test_params_apply_skips_bad_lines() {
        let mut store = ParameterStore::new();
        let report = store.apply("NoEquals\nShooterP=abc\nMystery=3\n=4\nShooterI=0.25\n");

        assert_eq!(report.updated, vec![Param::ShooterI]);
        assert_eq!(report.skipped.len(), 4);
        assert!(matches!(report.skipped[0], ParamError::Malformed { line: 1, .. }));
        assert!(matches!(report.skipped[1], ParamError::Malformed { line: 2, .. }));
        assert!(matches!(report.skipped[2], ParamError::UnknownKey { line: 3, .. }));
        assert!(matches!(report.skipped[3], ParamError::Malformed { line: 4, .. }));
        assert!(value_close(0.25, store.get(Param::ShooterI)));
        assert!(value_close(Param::ShooterP.default_value(), store.get(Param::ShooterP)));
    }

    /// Test that a partial reload keeps other values and notifies each dependent once.
    #[test]
    fn test_params_reload_scoping() {
        let mut store = ParameterStore::new();
        store.set(Param::ShooterP, 3.5);
        let mut drivetrain = CountingDependent::default();
        let mut shooter = CountingDependent::default();

        let source = ConstantsText("DrivetrainSkimGain=0.4\n".to_string());
        let report = store
            .reload_and_notify(&source, &mut [&mut drivetrain, &mut shooter])
            .expect("in-memory source");

        assert_eq!(report.updated, vec![Param::DrivetrainSkimGain]);
        assert!(value_close(3.5, store.get(Param::ShooterP)), "Unmentioned value must survive.");
        assert!(value_close(
            Param::DrivetrainAngleP.default_value(),
            store.get(Param::DrivetrainAngleP)
        ));
        assert_eq!(drivetrain.calls, 1);
        assert_eq!(shooter.calls, 1);
        assert!(value_close(0.4, drivetrain.skim_gain));
    }

    /// Test that an unreadable source changes nothing and notifies nobody.
    #[test]
    fn test_params_reload_failure_is_silent_to_dependents() {
        let mut store = ParameterStore::new();
        let mut dependent = CountingDependent::default();
        let result = store.reload_and_notify(&FailingSource, &mut [&mut dependent]);

        assert!(matches!(result, Err(ParamError::Io { .. })));
        assert_eq!(dependent.calls, 0);
    }

    /// Test reading constants from a file on disk.
    #[test]
    fn test_params_constants_file() {
        let path = std::env::temp_dir().join(format!("constants-{}.txt", std::process::id()));
        fs::write(&path, "ShooterLoadingVoltage=4.2\n").expect("temp file");

        let mut store = ParameterStore::new();
        let report = store
            .reload_and_notify(&ConstantsFile::new(&path), &mut [])
            .expect("file should load");
        let _ = fs::remove_file(&path);

        assert_eq!(report.updated, vec![Param::ShooterLoadingVoltage]);
        assert!(value_close(4.2, store.get(Param::ShooterLoadingVoltage)));
    }
}
