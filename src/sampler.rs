//! Module for sampling the heterogeneous per-neuron parameters.
//!
//! Every neuron draws its leak reversal potential and leak conductance (and, for principal cells,
//! the somato-dendritic coupling conductance) independently from a normal distribution.
//!
//! # Examples
//!
//! ```rust
//! use rusty_cortex::population::Population;
//! use rusty_cortex::sampler::ParameterSampler;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let sampler = ParameterSampler::default();
//! let params = sampler.sample(Population::Principal, 10, &mut rng).unwrap();
//!
//! assert_eq!(params.len(), 10);
//! assert!(params.iter().all(|p| p.len() == 3));
//! ```
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::CortexError;
use crate::population::{Population, PopulationSizes};

/// Independent normal distributions, one per parameter component.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ParameterDistribution {
    /// The mean of each component.
    pub means: Vec<f64>,
    /// The standard deviation of each component.
    pub std_devs: Vec<f64>,
}

impl ParameterDistribution {
    pub fn new(means: Vec<f64>, std_devs: Vec<f64>) -> Self {
        ParameterDistribution { means, std_devs }
    }

    /// A distribution without spread, i.e., every draw returns the means.
    pub fn constant(means: Vec<f64>) -> Self {
        let std_devs = vec![0.0; means.len()];
        ParameterDistribution { means, std_devs }
    }

    fn normals(&self) -> Result<Vec<Normal<f64>>, CortexError> {
        self.means
            .iter()
            .zip(self.std_devs.iter())
            .map(|(&mean, &std_dev)| {
                Normal::new(mean, std_dev).map_err(|e| {
                    CortexError::InvalidParameters(format!(
                        "Invalid parameter distribution N({}, {}): {}",
                        mean, std_dev, e
                    ))
                })
            })
            .collect()
    }
}

/// The heterogeneous parameters of every neuron of a network, one vector per neuron.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct NetworkParameters {
    pub principal: Vec<Vec<f64>>,
    pub inhibitory: Vec<Vec<f64>>,
    pub relay: Vec<Vec<f64>>,
    pub reticular: Vec<Vec<f64>>,
}

impl NetworkParameters {
    /// Returns the parameters of a given population.
    pub fn population(&self, population: Population) -> &[Vec<f64>] {
        match population {
            Population::Principal => &self.principal,
            Population::Inhibitory => &self.inhibitory,
            Population::Relay => &self.relay,
            Population::Reticular => &self.reticular,
        }
    }

    /// The number of neurons per population.
    pub fn sizes(&self) -> PopulationSizes {
        PopulationSizes::new(
            self.principal.len(),
            self.inhibitory.len(),
            self.relay.len(),
            self.reticular.len(),
        )
    }
}

/// The parameter distributions of all four populations.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ParameterSampler {
    pub principal: ParameterDistribution,
    pub inhibitory: ParameterDistribution,
    pub relay: ParameterDistribution,
    pub reticular: ParameterDistribution,
}

impl Default for ParameterSampler {
    fn default() -> Self {
        ParameterSampler {
            // E_L, g_L, g_sd
            principal: ParameterDistribution::new(
                vec![-60.95, 66.7E-3, 1.75E-3],
                vec![0.3, 6.7E-3, 0.1E-3],
            ),
            // E_L, g_L
            inhibitory: ParameterDistribution::new(vec![-63.8, 102.5E-3], vec![0.15, 2.5E-3]),
            relay: ParameterDistribution::new(vec![-63.8, 102.5E-3], vec![0.15, 2.5E-3]),
            reticular: ParameterDistribution::new(vec![-63.8, 102.5E-3], vec![0.15, 2.5E-3]),
        }
    }
}

impl ParameterSampler {
    /// Returns the distribution of a given population.
    pub fn distribution(&self, population: Population) -> &ParameterDistribution {
        match population {
            Population::Principal => &self.principal,
            Population::Inhibitory => &self.inhibitory,
            Population::Relay => &self.relay,
            Population::Reticular => &self.reticular,
        }
    }

    /// Check that every distribution has one mean and one finite, non-negative standard deviation
    /// per parameter.
    pub fn validate(&self) -> Result<(), CortexError> {
        for population in Population::ALL {
            let distribution = self.distribution(population);
            for len in [distribution.means.len(), distribution.std_devs.len()] {
                if len != population.arity() {
                    return Err(CortexError::ParameterLength {
                        population,
                        expected: population.arity(),
                        found: len,
                    });
                }
            }
            distribution.normals()?;
        }
        Ok(())
    }

    /// Sample one parameter vector per neuron of the population.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        population: Population,
        num_neurons: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<f64>>, CortexError> {
        let distribution = self.distribution(population);
        if distribution.means.len() != population.arity() {
            return Err(CortexError::ParameterLength {
                population,
                expected: population.arity(),
                found: distribution.means.len(),
            });
        }
        if distribution.std_devs.len() != distribution.means.len() {
            return Err(CortexError::InvalidParameters(format!(
                "The {} distribution has {} means but {} standard deviations",
                population,
                distribution.means.len(),
                distribution.std_devs.len()
            )));
        }
        let normals = distribution.normals()?;

        Ok((0..num_neurons)
            .map(|_| normals.iter().map(|normal| normal.sample(rng)).collect())
            .collect())
    }

    /// Sample the parameters of all neurons of a network, population after population.
    pub fn sample_network<R: Rng + ?Sized>(
        &self,
        sizes: &PopulationSizes,
        rng: &mut R,
    ) -> Result<NetworkParameters, CortexError> {
        Ok(NetworkParameters {
            principal: self.sample(Population::Principal, sizes.principal, rng)?,
            inhibitory: self.sample(Population::Inhibitory, sizes.inhibitory, rng)?,
            relay: self.sample(Population::Relay, sizes.relay, rng)?,
            reticular: self.sample(Population::Reticular, sizes.reticular, rng)?,
        })
    }

    /// Sample parameters for a population given by its tag, e.g., "principal" or "RE".
    /// Unknown tags are rejected.
    pub fn sample_tag<R: Rng + ?Sized>(
        &self,
        tag: &str,
        num_neurons: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<f64>>, CortexError> {
        self.sample(tag.parse()?, num_neurons, rng)
    }
}
