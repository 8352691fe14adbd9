use std::fmt;
use std::error::Error;

/// Represents errors that can occur while configuring or driving a simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Indicates a non-positive or non-finite world extent.
    InvalidWorldSize,
    /// Indicates a node capacity of zero particles.
    InvalidCapacity,
    /// Indicates a substep count of zero.
    InvalidSubsteps,
    /// Indicates a non-positive or non-finite time step or frame rate.
    InvalidTimeStep,
    /// Indicates an invalid mass value (e.g., negative or zero mass).
    InvalidMass,
    /// Indicates an invalid radius value (e.g., negative or zero radius).
    InvalidRadius,
    /// Indicates a non-finite spawn position or velocity.
    InvalidPosition,
    /// Indicates a solver or scheduling coefficient outside its valid range.
    InvalidCoefficient(String),
    /// The worker thread pool could not be created.
    ThreadPool(String),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimulationError::InvalidWorldSize => write!(f, "World extent must be positive and finite"),
            SimulationError::InvalidCapacity => write!(f, "Node capacity must be at least one particle"),
            SimulationError::InvalidSubsteps => write!(f, "Substep count must be at least one"),
            SimulationError::InvalidTimeStep => write!(f, "Invalid time step value"),
            SimulationError::InvalidMass => write!(f, "Invalid mass value"),
            SimulationError::InvalidRadius => write!(f, "Invalid radius value"),
            SimulationError::InvalidPosition => write!(f, "Position and velocity must be finite"),
            SimulationError::InvalidCoefficient(msg) => write!(f, "Invalid coefficient: {}", msg),
            SimulationError::ThreadPool(msg) => write!(f, "Thread pool error: {}", msg),
        }
    }
}

impl Error for SimulationError {}
