//! Errors raised while turning a configuration into a problem instance.
//!
//! Solver failures are not errors: they are recorded in the solve report.

use std::fmt::Display;

use crate::instance::AircraftClass;

#[derive(Debug, Clone, PartialEq)]
pub enum TimeGridError {
    /// The aircraft has a window with `arrival >= departure`.
    EmptyWindow { aircraft: usize, arrival: f64, departure: f64 },
    /// The aircraft has a NaN or infinite timestamp.
    NonFiniteTime { aircraft: usize },
}

impl Display for TimeGridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeGridError::EmptyWindow { aircraft, arrival, departure } => write!(
                f,
                "Aircraft {} has an empty ground window: arrival {} is not before departure {}",
                aircraft, arrival, departure
            ),
            TimeGridError::NonFiniteTime { aircraft } => {
                write!(f, "Aircraft {} has a non-finite arrival or departure time", aircraft)
            }
        }
    }
}

impl std::error::Error for TimeGridError {}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A class has aircraft but no real gate to put them on.
    NoGatesForClass { class: AircraftClass, aircraft: usize },
    /// The time discretization must be a positive number of minutes.
    InvalidDiscretization(f64),
    /// Turnaround durations must be finite and non-negative.
    InvalidTurnaround { class: AircraftClass, value: f64 },
    /// The transfer matrix does not match the number of aircraft.
    TransferShape { expected: usize, found: usize },
    /// A named parameter could not be read into the configuration record.
    Parameter(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoGatesForClass { class, aircraft } => write!(
                f,
                "{} {} aircraft requested but no {} gate is available",
                aircraft, class, class
            ),
            ConfigError::InvalidDiscretization(v) => {
                write!(f, "Time discretization must be a positive number of minutes, got {}", v)
            }
            ConfigError::InvalidTurnaround { class, value } => {
                write!(f, "Invalid {} turnaround duration {}", class, value)
            }
            ConfigError::TransferShape { expected, found } => write!(
                f,
                "Transfer matrix must be {}x{}, found a row count or row length of {}",
                expected, expected, found
            ),
            ConfigError::Parameter(msg) => write!(f, "Invalid configuration parameter: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// The flow computation behind the apron floor did not reach a proven optimum.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessError {
    class: AircraftClass,
    status: String,
}

impl PreprocessError {
    #[inline]
    pub fn new(class: AircraftClass, status: impl Into<String>) -> Self {
        Self { class, status: status.into() }
    }

    #[inline]
    pub fn class(&self) -> AircraftClass {
        self.class
    }

    #[inline]
    pub fn status(&self) -> &str {
        &self.status
    }
}

impl Display for PreprocessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Apron floor for {} aircraft could not be computed: flow solver returned {}",
            self.class, self.status
        )
    }
}

impl std::error::Error for PreprocessError {}

#[derive(Debug, Clone, PartialEq)]
pub enum InstanceError {
    Config(ConfigError),
    TimeGrid(TimeGridError),
    Preprocess(PreprocessError),
}

impl Display for InstanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceError::Config(e) => write!(f, "Configuration error: {}", e),
            InstanceError::TimeGrid(e) => write!(f, "Time grid error: {}", e),
            InstanceError::Preprocess(e) => write!(f, "Preprocessing error: {}", e),
        }
    }
}

impl std::error::Error for InstanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InstanceError::Config(e) => Some(e),
            InstanceError::TimeGrid(e) => Some(e),
            InstanceError::Preprocess(e) => Some(e),
        }
    }
}

impl From<ConfigError> for InstanceError {
    fn from(e: ConfigError) -> Self {
        InstanceError::Config(e)
    }
}

impl From<TimeGridError> for InstanceError {
    fn from(e: TimeGridError) -> Self {
        InstanceError::TimeGrid(e)
    }
}

impl From<PreprocessError> for InstanceError {
    fn from(e: PreprocessError) -> Self {
        InstanceError::Preprocess(e)
    }
}
