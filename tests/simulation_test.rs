use rusty_cortex::config::{Biophysics, SimulationConfig};
use rusty_cortex::connectivity::Connectivity;
use rusty_cortex::error::CortexError;
use rusty_cortex::network::Network;
use rusty_cortex::population::{Population, PopulationSizes};
use rusty_cortex::sampler::{NetworkParameters, ParameterDistribution};
use rusty_cortex::simulation::{Simulation, Trace};

use approx::assert_relative_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const TOLERANCE: f64 = 1e-9;

/// A toy network where only the leak currents are left.
fn leak_only_config() -> SimulationConfig {
    let mut config = SimulationConfig {
        duration: 0.02,
        decimation: 1,
        sizes: PopulationSizes::new(2, 1, 0, 0),
        num_threads: 1,
        seed: Some(42),
        plan: vec![],
        ..Default::default()
    };
    config.sampler.principal =
        ParameterDistribution::new(vec![-60.95, 66.7E-3, 0.0], vec![0.3, 6.7E-3, 0.0]);

    let principal = &mut config.biophysics.principal;
    principal.g_na = 0.0;
    principal.g_k = 0.0;
    principal.g_a = 0.0;
    principal.g_ks = 0.0;
    principal.g_kna = 0.0;
    principal.g_ca = 0.0;
    principal.g_kca = 0.0;
    principal.g_nap = 0.0;
    principal.g_ar = 0.0;

    let inhibitory = &mut config.biophysics.inhibitory;
    inhibitory.g_na = 0.0;
    inhibitory.g_k = 0.0;

    config
}

#[test]
fn test_leak_only_decay() {
    let config = leak_only_config();
    assert_eq!(config.num_steps(), 1000);

    let mut simulation = Simulation::new(config).unwrap();
    let principal_rest: Vec<f64> = simulation
        .network()
        .potentials(Population::Principal);
    let inhibitory_rest: Vec<f64> = simulation
        .network()
        .potentials(Population::Inhibitory);

    // start above rest for the first principal neuron, below rest for the others
    simulation
        .network_mut()
        .set_potential(Population::Principal, 0, principal_rest[0] + 10.0)
        .unwrap();
    simulation
        .network_mut()
        .set_potential(Population::Principal, 1, principal_rest[1] - 15.0)
        .unwrap();
    simulation
        .network_mut()
        .set_potential(Population::Inhibitory, 0, inhibitory_rest[0] + 20.0)
        .unwrap();

    let mut trace = Trace::default();
    simulation.run(&mut trace);
    assert_eq!(trace.len(), 1000);

    let rest = [principal_rest[0], principal_rest[1], inhibitory_rest[0]];
    let distances = |frame: &rusty_cortex::simulation::Frame| {
        [
            frame.principal_soma[0] - rest[0],
            frame.principal_soma[1] - rest[1],
            frame.inhibitory[0] - rest[2],
        ]
    };

    let mut previous: [f64; 3] = [10.0, -15.0, 20.0];
    for frame in trace.frames() {
        let current = distances(frame);
        for (prev, cur) in previous.iter().zip(current.iter()) {
            // same side of the rest potential, strictly closer to it
            assert!(prev.signum() == cur.signum());
            assert!(cur.abs() < prev.abs() + TOLERANCE);
        }
        previous = current;
    }
    // after 20 ms with g_L around 0.07 to 0.1 mS/cm², a good part of the gap is closed
    assert!(previous[0].abs() < 10.0 * 0.5);
    assert!(previous[2].abs() < 20.0 * 0.3);
}

#[test]
fn test_disconnected_network_has_no_synaptic_current() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let config = SimulationConfig {
        duration: 0.002,
        sizes: PopulationSizes::new(6, 2, 6, 2),
        num_threads: 2,
        ..Default::default()
    };
    let parameters = config.sampler.sample_network(&config.sizes, &mut rng).unwrap();
    let connectivity = Connectivity::empty(&config.sizes);
    let mut network =
        Network::build_from(&Biophysics::default(), &parameters, &connectivity).unwrap();
    for id in 0..6 {
        network.set_input(Population::Relay, id, 2.0).unwrap();
    }

    let mut simulation = Simulation::from_network(config.clone(), network).unwrap();
    simulation.run(&mut |_: usize, network: &Network| {
        for population in Population::ALL {
            for id in 0..config.sizes.get(population) {
                assert_eq!(network.synaptic_currents(population, id).unwrap(), [0.0; 3]);
            }
        }
    });
}

#[test]
fn test_gating_fractions_remain_bounded() {
    let config = SimulationConfig {
        duration: 0.02,
        decimation: 50,
        sizes: PopulationSizes::new(16, 4, 16, 4),
        num_threads: 2,
        seed: Some(3),
        ..Default::default()
    };
    let mut simulation = Simulation::new(config).unwrap();
    for id in 0..4 {
        simulation
            .network_mut()
            .set_input(Population::Principal, id, 1.0)
            .unwrap();
    }

    let mut num_frames = 0;
    simulation.run(&mut |_: usize, network: &Network| {
        num_frames += 1;
        for population in Population::ALL {
            for fractions in network.gating_fractions(population) {
                for x in fractions {
                    assert!(x.is_finite());
                    assert!(
                        (-1e-6..=1.0 + 1e-6).contains(&x),
                        "{} gating fraction {}",
                        population,
                        x
                    );
                }
            }
        }
        for state in network.principal_states() {
            assert!(state.ca >= -1e-9);
            assert!(state.na >= 0.0);
        }
    });
    assert_eq!(num_frames, 20);
}

fn replay(sizes: PopulationSizes, num_threads: usize) -> Trace {
    let mut config = SimulationConfig {
        duration: 0.01,
        decimation: 1,
        sizes,
        num_threads,
        seed: Some(2024),
        ..Default::default()
    };
    config.noise.enabled = true;

    let mut simulation = Simulation::new(config).unwrap();
    assert_eq!(simulation.config().num_steps(), 500);
    simulation
        .network_mut()
        .set_input(Population::Principal, 0, 2.0)
        .unwrap();

    let mut trace = Trace::default();
    simulation.run(&mut trace);
    trace
}

#[test]
fn test_deterministic_replay() {
    let sizes = PopulationSizes::new(8, 2, 0, 0);
    let reference = replay(sizes, 1);
    assert_eq!(reference.len(), 500);
    assert_eq!(reference, replay(sizes, 1));
    assert_eq!(reference, replay(sizes, 4));
}

#[test]
fn test_deterministic_replay_parallel_sweeps() {
    // large enough populations to be swept in parallel
    let sizes = PopulationSizes::new(40, 8, 40, 8);
    let reference = replay(sizes, 1);
    assert_eq!(reference, replay(sizes, 3));
}

/// A ring of 8 principal cells, each exciting its two neighbours, with 2 interneurons inhibiting
/// alternate principal cells. Only the first principal cell is driven.
fn reference_network() -> Network {
    let rest = [-61.2, -60.95, -60.7, -61.5, -60.4, -61.0, -60.8, -61.3];
    let parameters = NetworkParameters {
        principal: rest.iter().map(|&e_l| vec![e_l, 66.7E-3, 1.75E-3]).collect(),
        inhibitory: vec![vec![-63.8, 102.5E-3], vec![-64.2, 98.0E-3]],
        ..Default::default()
    };

    let sizes = PopulationSizes::new(8, 2, 0, 0);
    let mut connectivity = Connectivity::empty(&sizes);
    for (id, afferents) in connectivity.principal.iter_mut().enumerate() {
        afferents.principal = vec![(id + 7) % 8, (id + 1) % 8];
        afferents.inhibitory = vec![id % 2];
    }
    for (id, afferents) in connectivity.inhibitory.iter_mut().enumerate() {
        afferents.principal = vec![id, id + 2, id + 4, id + 6];
        afferents.inhibitory = vec![1 - id];
    }

    let mut network =
        Network::build_from(&Biophysics::default(), &parameters, &connectivity).unwrap();
    network.set_input(Population::Principal, 0, 10.0).unwrap();
    network
}

fn reference_run(num_threads: usize) -> Trace {
    let config = SimulationConfig {
        duration: 0.01,
        decimation: 50,
        sizes: PopulationSizes::new(8, 2, 0, 0),
        num_threads,
        ..Default::default()
    };
    let mut simulation = Simulation::from_network(config, reference_network()).unwrap();
    let mut trace = Trace::default();
    simulation.run(&mut trace);
    trace
}

fn assert_frame_eq(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert_relative_eq!(*a, *e, max_relative = 1e-9);
    }
}

#[test]
fn test_reference_trace() {
    let trace = reference_run(1);
    assert_eq!(trace.len(), 10);

    // the driven cell is at the peak of its first spike
    let frame = &trace.frames()[4];
    assert_eq!(frame.index, 4);
    assert_frame_eq(
        &frame.principal_soma,
        &[
            22.421852495194454,
            -60.362774528047794,
            -60.09548991682633,
            -61.09685151904164,
            -59.708391712620745,
            -60.47593796426333,
            -60.223013841318,
            -60.79982893607583,
        ],
    );
    assert_frame_eq(&frame.inhibitory, &[-63.476144775566446, -63.98217217529545]);
    assert_frame_eq(&frame.principal_calcium[..2], &[1.919586168608445e-05, 6.311677788567368e-08]);

    // its neighbours 1 and 7 and the interneuron 0 have been depolarized by the spike
    let frame = &trace.frames()[9];
    assert_eq!(frame.index, 9);
    assert_frame_eq(
        &frame.principal_soma,
        &[
            -52.81230887736867,
            -58.4895501118934,
            -59.39525397333583,
            -60.71755095138024,
            -58.85386541423978,
            -59.9095765924644,
            -59.56947763041308,
            -59.093071292297225,
        ],
    );
    assert_frame_eq(&frame.inhibitory, &[-62.06937013543538, -63.65702844047394]);
    assert_frame_eq(
        &frame.principal_calcium[..2],
        &[8.072954321408509e-05, 1.6706160182782256e-07],
    );

    assert_eq!(trace, reference_run(4));
}

#[test]
fn test_configuration_errors() {
    let mut config = SimulationConfig {
        sizes: PopulationSizes::new(4, 2, 2, 2),
        seed: Some(1),
        ..Default::default()
    };
    config.sampler.principal = ParameterDistribution::new(vec![-60.95, 66.7E-3], vec![0.3, 6.7E-3]);
    assert_eq!(
        Simulation::new(config).err(),
        Some(CortexError::ParameterLength {
            population: Population::Principal,
            expected: 3,
            found: 2
        })
    );

    assert_eq!(
        "thalamus".parse::<Population>(),
        Err(CortexError::UnknownPopulation("thalamus".to_string()))
    );

    let config = SimulationConfig {
        resolution: 0,
        ..Default::default()
    };
    assert!(matches!(
        Simulation::new(config),
        Err(CortexError::InvalidParameters(_))
    ));
}
