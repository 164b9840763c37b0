//! This crate provides tools for simulating conductance-based thalamocortical networks in Rust.
//!
//! A network is made of four populations: cortical principal (pyramidal) cells, cortical inhibitory
//! interneurons, thalamic relay cells and thalamic reticular cells. Every neuron integrates its own
//! Hodgkin-Huxley type equations with a 4-stage Runge-Kutta scheme, and reads the synaptic gating
//! of the neurons projecting onto it.
//!
//! # Creating Networks
//!
//! ## At Random
//!
//! ```rust
//! use rusty_cortex::config::SimulationConfig;
//! use rusty_cortex::network::Network;
//! use rusty_cortex::population::PopulationSizes;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut config = SimulationConfig::default();
//! config.sizes = PopulationSizes::new(32, 8, 32, 8);
//!
//! // Sample the parameters of every neuron, then the connectivity
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let network = Network::rand(&config, &mut rng).unwrap();
//!
//! assert_eq!(network.num_neurons(), 80);
//! ```
//!
//! ## From Explicit Parameters
//!
//! ```rust
//! use rusty_cortex::config::Biophysics;
//! use rusty_cortex::connectivity::{Connectivity, Projection};
//! use rusty_cortex::network::Network;
//! use rusty_cortex::population::{Population, PopulationSizes};
//! use rusty_cortex::sampler::NetworkParameters;
//!
//! let parameters = NetworkParameters {
//!     principal: vec![vec![-60.95, 0.0667, 1.75E-3]; 2],
//!     inhibitory: vec![vec![-63.8, 0.1025]],
//!     relay: vec![],
//!     reticular: vec![],
//! };
//!
//! // The inhibitory neuron receives from both principal neurons
//! let mut connectivity = Connectivity::empty(&parameters.sizes());
//! connectivity
//!     .extend(
//!         &Projection::new(Population::Principal, Population::Inhibitory, 250.0),
//!         vec![vec![0, 1]],
//!     )
//!     .unwrap();
//!
//! let network = Network::build_from(&Biophysics::default(), &parameters, &connectivity).unwrap();
//! assert_eq!(network.sizes(), PopulationSizes::new(2, 1, 0, 0));
//! ```
//!
//! # Simulating Networks
//!
//! ```rust
//! use rusty_cortex::config::SimulationConfig;
//! use rusty_cortex::network::Network;
//! use rusty_cortex::population::{Population, PopulationSizes};
//! use rusty_cortex::simulation::Simulation;
//!
//! let config = SimulationConfig {
//!     duration: 0.001,
//!     sizes: PopulationSizes::new(8, 2, 8, 2),
//!     num_threads: 2,
//!     seed: Some(1),
//!     ..Default::default()
//! };
//!
//! let mut simulation = Simulation::new(config).unwrap();
//! simulation.network_mut().set_input(Population::Relay, 0, 1.0).unwrap();
//!
//! // Collect the mean somatic potential of the principal cells every 10 steps
//! let mut means = vec![];
//! simulation.run(&mut |_: usize, network: &Network| {
//!     let potentials = network.potentials(Population::Principal);
//!     means.push(potentials.iter().sum::<f64>() / potentials.len() as f64);
//! });
//!
//! assert_eq!(means.len(), 5);
//! ```
pub mod channels;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod integrator;
pub mod network;
pub mod neuron;
pub mod population;
pub mod sampler;
pub mod simulation;
pub mod stepper;

/// Populations with at least this many neurons are swept with parallel iterators.
pub const MIN_PARALLEL_NEURONS: usize = 32;
