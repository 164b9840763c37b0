//! Module defining the four neuron populations of the network.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CortexError;

/// A population (cell type) of the thalamocortical network.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Population {
    /// Cortical pyramidal cells, with a somatic and a dendritic compartment.
    Principal,
    /// Cortical fast-spiking interneurons.
    Inhibitory,
    /// Thalamocortical relay cells.
    Relay,
    /// Thalamic reticular cells.
    Reticular,
}

impl Population {
    /// All populations, in the order they are stepped and recorded.
    pub const ALL: [Population; 4] = [
        Population::Principal,
        Population::Inhibitory,
        Population::Relay,
        Population::Reticular,
    ];

    /// Returns true if the population releases glutamate (AMPA and NMDA receptors) and false if it
    /// releases GABA.
    pub fn is_excitatory(&self) -> bool {
        matches!(self, Population::Principal | Population::Relay)
    }

    /// The number of heterogeneous parameters drawn for every neuron of the population.
    pub fn arity(&self) -> usize {
        match self {
            Population::Principal => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Population::Principal => write!(f, "principal"),
            Population::Inhibitory => write!(f, "inhibitory"),
            Population::Relay => write!(f, "relay"),
            Population::Reticular => write!(f, "reticular"),
        }
    }
}

impl FromStr for Population {
    type Err = CortexError;

    /// Parse a population tag. The short names of the cell types (`PY`, `IN`, `TC`, `RE`) are
    /// accepted as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "principal" | "pyramidal" | "py" => Ok(Population::Principal),
            "inhibitory" | "interneuron" | "in" => Ok(Population::Inhibitory),
            "relay" | "thalamocortical" | "tc" => Ok(Population::Relay),
            "reticular" | "re" => Ok(Population::Reticular),
            _ => Err(CortexError::UnknownPopulation(s.to_string())),
        }
    }
}

/// The number of neurons in each population.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct PopulationSizes {
    pub principal: usize,
    pub inhibitory: usize,
    pub relay: usize,
    pub reticular: usize,
}

impl PopulationSizes {
    pub fn new(principal: usize, inhibitory: usize, relay: usize, reticular: usize) -> Self {
        PopulationSizes {
            principal,
            inhibitory,
            relay,
            reticular,
        }
    }

    /// Returns the size of a given population.
    pub fn get(&self, population: Population) -> usize {
        match population {
            Population::Principal => self.principal,
            Population::Inhibitory => self.inhibitory,
            Population::Relay => self.relay,
            Population::Reticular => self.reticular,
        }
    }

    /// The total number of neurons in the network.
    pub fn total(&self) -> usize {
        self.principal + self.inhibitory + self.relay + self.reticular
    }
}

impl Default for PopulationSizes {
    fn default() -> Self {
        PopulationSizes::new(128, 32, 128, 32)
    }
}
