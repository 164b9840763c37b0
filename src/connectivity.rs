//! Module generating the random connectivity between populations.
//!
//! All populations are laid out on a shared ring whose length is five times the number of principal
//! cells. A source neuron projects to targets drawn from a normal profile centered on its own
//! index; the breadth of the profile grows with the density of the target population on the ring.
//!
//! The generator produces *receives-from* lists: for every target neuron, the indices of the source
//! neurons projecting onto it. A source index can appear several times in the same list, in which
//! case its synaptic drive is counted several times.
//!
//! # Examples
//!
//! ```rust
//! use rusty_cortex::connectivity::{ConnectivitySampler, Projection};
//! use rusty_cortex::population::Population;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let sampler = ConnectivitySampler::new(32);
//! let projection = Projection::new(Population::Principal, Population::Principal, 250.0);
//! let receives_from = sampler.sample(&projection, 32, 32, &mut rng).unwrap();
//!
//! assert_eq!(receives_from.len(), 32);
//! assert!(receives_from.iter().enumerate().all(|(i, sources)| !sources.contains(&i)));
//! ```
use log;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::CortexError;
use crate::population::{Population, PopulationSizes};

/// Mean of the number of outgoing connections of a neuron, per projection.
pub const MEAN_OUT_DEGREE: f64 = 20.0;
/// Standard deviation of the number of outgoing connections of a neuron, per projection.
pub const STD_OUT_DEGREE: f64 = 5.0;
/// Length of the ring, in units of principal cells.
pub const RING_LENGTH_PER_PRINCIPAL: f64 = 5.0;
/// Maximum number of offset draws for a single connection of a recurrent projection.
pub const MAX_REDRAWS: usize = 10_000;

/// A directed projection from a source population onto a target population.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Projection {
    /// The population sending the synapses.
    pub source: Population,
    /// The population receiving the synapses.
    pub target: Population,
    /// The spatial breadth of the projection, in ring units.
    pub width: f64,
}

impl Projection {
    pub fn new(source: Population, target: Population, width: f64) -> Self {
        Projection {
            source,
            target,
            width,
        }
    }

    /// The standard deviation of the target offset, in units of target neurons.
    pub fn sigma(&self, ring_length: f64, target_size: usize) -> f64 {
        self.width / ring_length * target_size as f64
    }

    /// Returns true if self-connections are forbidden, i.e., if the projection is recurrent within
    /// a population.
    pub fn is_recurrent(&self) -> bool {
        self.source == self.target
    }

    /// The default projections of the thalamocortical loop.
    /// Excitatory sources project with width 250, inhibitory ones with width 125.
    pub fn default_plan() -> Vec<Projection> {
        use Population::*;
        [
            (Principal, Principal),
            (Principal, Inhibitory),
            (Inhibitory, Principal),
            (Inhibitory, Inhibitory),
            (Relay, Principal),
            (Relay, Inhibitory),
            (Principal, Relay),
            (Reticular, Relay),
            (Principal, Reticular),
            (Relay, Reticular),
            (Reticular, Reticular),
        ]
        .into_iter()
        .map(|(source, target)| {
            let width = if source.is_excitatory() { 250.0 } else { 125.0 };
            Projection::new(source, target, width)
        })
        .collect()
    }
}

/// Sampler of receives-from lists on the ring.
#[derive(Debug, Clone)]
pub struct ConnectivitySampler {
    /// The length of the ring.
    ring_length: f64,
    /// The distribution of the number of outgoing connections per source neuron.
    out_degree: Normal<f64>,
}

impl ConnectivitySampler {
    /// Create a sampler for a network with the given number of principal cells.
    pub fn new(num_principal: usize) -> Self {
        ConnectivitySampler {
            ring_length: RING_LENGTH_PER_PRINCIPAL * num_principal as f64,
            // The parameters are constants for which the construction cannot fail
            out_degree: Normal::new(MEAN_OUT_DEGREE, STD_OUT_DEGREE).unwrap(),
        }
    }

    /// Returns the length of the ring.
    pub fn ring_length(&self) -> f64 {
        self.ring_length
    }

    /// Sample the receives-from lists of a projection. The function returns one list per target
    /// neuron; it returns an error if the offset distribution is invalid.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        projection: &Projection,
        source_size: usize,
        target_size: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<usize>>, CortexError> {
        let mut receives_from: Vec<Vec<usize>> = vec![Vec::new(); target_size];
        if source_size == 0 || target_size == 0 {
            return Ok(receives_from);
        }
        if self.ring_length <= 0.0 {
            return Err(CortexError::InvalidParameters(format!(
                "The projection {} -> {} needs the ring, whose length is set by the principal \
                 population, but there is no principal neuron",
                projection.source, projection.target
            )));
        }

        let sigma = projection.sigma(self.ring_length, target_size);
        let offset_dist = Normal::new(0.0, sigma).map_err(|e| {
            CortexError::InvalidParameters(format!(
                "Invalid target offset distribution for {} -> {} (sigma = {}): {}",
                projection.source, projection.target, sigma, e
            ))
        })?;

        // Within a single neuron population, a ring of one neuron has no valid target
        let no_target = projection.is_recurrent() && target_size == 1;

        for source_id in 0..source_size {
            let num_outputs = self.out_degree.sample(rng).trunc().abs() as usize;
            if no_target {
                continue;
            }
            for _ in 0..num_outputs {
                let target_id = (0..MAX_REDRAWS)
                    .map(|_| {
                        let offset = offset_dist.sample(rng).trunc() as i64;
                        (offset + source_id as i64).rem_euclid(target_size as i64) as usize
                    })
                    .find(|&target_id| !(projection.is_recurrent() && target_id == source_id))
                    .ok_or_else(|| {
                        CortexError::InvalidParameters(format!(
                            "The recurrent projection {} -> {} is too narrow (sigma = {}): \
                             no target other than the source after {} draws",
                            projection.source,
                            projection.target,
                            sigma,
                            MAX_REDRAWS
                        ))
                    })?;
                receives_from[target_id].push(source_id);
            }
        }

        log::debug!(
            "Projection {} -> {}: {} connections sampled",
            projection.source,
            projection.target,
            receives_from.iter().map(|sources| sources.len()).sum::<usize>()
        );

        Ok(receives_from)
    }
}

/// The receives-from lists of a neuron, one per presynaptic population.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Afferents {
    pub principal: Vec<usize>,
    pub inhibitory: Vec<usize>,
    pub relay: Vec<usize>,
    pub reticular: Vec<usize>,
}

impl Afferents {
    /// Returns the receives-from list for a given presynaptic population.
    pub fn from_population(&self, population: Population) -> &[usize] {
        match population {
            Population::Principal => &self.principal,
            Population::Inhibitory => &self.inhibitory,
            Population::Relay => &self.relay,
            Population::Reticular => &self.reticular,
        }
    }

    fn from_population_mut(&mut self, population: Population) -> &mut Vec<usize> {
        match population {
            Population::Principal => &mut self.principal,
            Population::Inhibitory => &mut self.inhibitory,
            Population::Relay => &mut self.relay,
            Population::Reticular => &mut self.reticular,
        }
    }

    /// The total number of inputs of the neuron.
    pub fn num_inputs(&self) -> usize {
        self.principal.len() + self.inhibitory.len() + self.relay.len() + self.reticular.len()
    }

    /// Returns true if the neuron receives no input at all.
    pub fn is_empty(&self) -> bool {
        self.num_inputs() == 0
    }
}

/// The realized connectivity of a network: the afferents of every neuron of every population.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Connectivity {
    pub principal: Vec<Afferents>,
    pub inhibitory: Vec<Afferents>,
    pub relay: Vec<Afferents>,
    pub reticular: Vec<Afferents>,
}

impl Connectivity {
    /// A network without any connection.
    pub fn empty(sizes: &PopulationSizes) -> Self {
        Connectivity {
            principal: vec![Afferents::default(); sizes.principal],
            inhibitory: vec![Afferents::default(); sizes.inhibitory],
            relay: vec![Afferents::default(); sizes.relay],
            reticular: vec![Afferents::default(); sizes.reticular],
        }
    }

    /// Sample the connectivity of all projections of the plan.
    /// Projections listed twice are sampled twice and their connections accumulate.
    pub fn sample<R: Rng + ?Sized>(
        sizes: &PopulationSizes,
        plan: &[Projection],
        rng: &mut R,
    ) -> Result<Self, CortexError> {
        let sampler = ConnectivitySampler::new(sizes.principal);
        let mut connectivity = Connectivity::empty(sizes);

        for projection in plan.iter() {
            let receives_from = sampler.sample(
                projection,
                sizes.get(projection.source),
                sizes.get(projection.target),
                rng,
            )?;
            connectivity.extend(projection, receives_from)?;
        }

        Ok(connectivity)
    }

    /// Returns the afferents of the neurons of a given population.
    pub fn population(&self, population: Population) -> &[Afferents] {
        match population {
            Population::Principal => &self.principal,
            Population::Inhibitory => &self.inhibitory,
            Population::Relay => &self.relay,
            Population::Reticular => &self.reticular,
        }
    }

    fn population_mut(&mut self, population: Population) -> &mut Vec<Afferents> {
        match population {
            Population::Principal => &mut self.principal,
            Population::Inhibitory => &mut self.inhibitory,
            Population::Relay => &mut self.relay,
            Population::Reticular => &mut self.reticular,
        }
    }

    /// Append the receives-from lists of a projection, one list per target neuron.
    pub fn extend(
        &mut self,
        projection: &Projection,
        receives_from: Vec<Vec<usize>>,
    ) -> Result<(), CortexError> {
        let targets = self.population_mut(projection.target);
        if targets.len() != receives_from.len() {
            return Err(CortexError::IncompatibleTopology(format!(
                "{} receives-from lists for {} {} neurons",
                receives_from.len(),
                targets.len(),
                projection.target
            )));
        }
        for (afferents, sources) in targets.iter_mut().zip(receives_from) {
            afferents.from_population_mut(projection.source).extend(sources);
        }
        Ok(())
    }

    /// Check that the connectivity fits the population sizes, i.e., one entry per neuron and valid
    /// source indices.
    pub fn validate(&self, sizes: &PopulationSizes) -> Result<(), CortexError> {
        for target in Population::ALL {
            let afferents = self.population(target);
            if afferents.len() != sizes.get(target) {
                return Err(CortexError::IncompatibleTopology(format!(
                    "{} afferent lists for {} {} neurons",
                    afferents.len(),
                    sizes.get(target),
                    target
                )));
            }
            for source in Population::ALL {
                let num_sources = sizes.get(source);
                if let Some(&source_id) = afferents
                    .iter()
                    .flat_map(|a| a.from_population(source))
                    .find(|&&id| id >= num_sources)
                {
                    return Err(CortexError::IncompatibleTopology(format!(
                        "{} neuron {} projects onto a {} neuron but the population has {} neurons",
                        source, source_id, target, num_sources
                    )));
                }
            }
        }
        Ok(())
    }

    /// The total number of connections in the network.
    pub fn num_connections(&self) -> usize {
        Population::ALL
            .iter()
            .flat_map(|&population| self.population(population))
            .map(|afferents| afferents.num_inputs())
            .sum()
    }
}
