//! Error module for the Rusty Cortex library.
use std::error::Error;
use std::fmt;

use crate::population::Population;

/// Error types for the library.
///
/// All of them are raised while setting up a simulation: once a network is built, stepping it
/// cannot fail.
#[derive(Debug, PartialEq)]
pub enum CortexError {
    /// Error for a population tag that does not name any of the four populations.
    UnknownPopulation(String),
    /// Error for a parameter vector whose length does not match the population arity.
    ParameterLength {
        population: Population,
        expected: usize,
        found: usize,
    },
    /// Error for invalid parameters, e.g., a negative standard deviation.
    InvalidParameters(String),
    /// Error for incompatible topology, e.g., the connectivity does not fit the population sizes.
    IncompatibleTopology(String),
    /// Error for out of bounds access, e.g., neuron not found.
    OutOfBounds(String),
    /// Error while building the worker pool.
    ThreadPool(String),
    /// Error for I/O operations.
    IOError(String),
}

impl fmt::Display for CortexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CortexError::UnknownPopulation(tag) => write!(f, "Unknown population: {}", tag),
            CortexError::ParameterLength {
                population,
                expected,
                found,
            } => write!(
                f,
                "Invalid parameter vector for the {} population: expected {} values, found {}",
                population, expected, found
            ),
            CortexError::InvalidParameters(e) => write!(f, "Invalid parameters: {}", e),
            CortexError::IncompatibleTopology(e) => write!(f, "Incompatible topology: {}", e),
            CortexError::OutOfBounds(e) => write!(f, "Index out of bounds: {}", e),
            CortexError::ThreadPool(e) => write!(f, "Thread pool error: {}", e),
            CortexError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for CortexError {}
