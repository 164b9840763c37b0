use clap::Parser;
use log;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use sha2::{Digest, Sha256};

use rusty_cortex::config::SimulationConfig;
use rusty_cortex::error::CortexError;
use rusty_cortex::population::{Population, PopulationSizes};
use rusty_cortex::simulation::{Simulation, Trace};

#[derive(Parser, Debug)]
struct Args {
    /// A JSON configuration file; the other options override its clock, sizes and seed when given
    #[arg(long)]
    config: Option<String>,
    /// The seed used for parameter sampling, connectivity sampling and noise
    #[arg(long)]
    seed: u64,
    /// The simulated time (s)
    #[arg(short = 'T', long)]
    duration: Option<f64>,
    /// The number of steps per second
    #[arg(long)]
    resolution: Option<usize>,
    /// A frame is recorded every `decimation` steps
    #[arg(long)]
    decimation: Option<usize>,
    /// The number of principal, inhibitory, relay and reticular neurons
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<usize>>,
    /// The number of worker threads
    #[arg(long)]
    num_threads: Option<usize>,
    /// Enable the membrane noise
    #[arg(long)]
    noise: bool,
    /// The input current of the first relay neurons (µA/cm²)
    #[arg(long, default_value = "0.0")]
    relay_input: f64,
    /// The number of relay neurons receiving the input current
    #[arg(long, default_value = "0")]
    num_driven: usize,
}

impl Args {
    fn simulation_config(&self) -> Result<SimulationConfig, CortexError> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load_from(path)?,
            None => SimulationConfig::default(),
        };
        config.seed = Some(self.seed);
        if let Some(duration) = self.duration {
            config.duration = duration;
        }
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(decimation) = self.decimation {
            config.decimation = decimation;
        }
        if let Some(sizes) = &self.sizes {
            if sizes.len() != 4 {
                return Err(CortexError::InvalidParameters(format!(
                    "Expected 4 population sizes, got {}",
                    sizes.len()
                )));
            }
            config.sizes = PopulationSizes::new(sizes[0], sizes[1], sizes[2], sizes[3]);
        }
        if let Some(num_threads) = self.num_threads {
            config.num_threads = num_threads;
        }
        config.noise.enabled |= self.noise;
        Ok(config)
    }
}

fn main() -> Result<(), CortexError> {
    let args = Args::parse();

    let mut hasher = Sha256::new();
    hasher.update(format!("{:?}", args));
    let hash = hasher.finalize();
    let log_path = format!("log/{:x}.log", hash);
    let config_path = format!("trace/{:x}.config.json", hash);
    let trace_path = format!("trace/{:x}.json", hash);

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {l} - {m}\n")))
        .build();
    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
        .build(log_path)
        .map_err(|e| CortexError::IOError(e.to_string()))?;

    let log_config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .build(
            Root::builder()
                .appender("stdout")
                .appender("logfile")
                .build(LevelFilter::Info),
        )
        .map_err(|e| CortexError::IOError(e.to_string()))?;

    log4rs::init_config(log_config).map_err(|e| CortexError::IOError(e.to_string()))?;

    log::info!("{:?}", args);

    let config = args.simulation_config()?;
    std::fs::create_dir_all("trace").map_err(|e| CortexError::IOError(e.to_string()))?;
    config.save_to(&config_path)?;
    log::info!("Configuration saving: done! Saved to {}", config_path);

    let mut simulation = Simulation::new(config)?;
    for id in 0..args.num_driven {
        simulation
            .network_mut()
            .set_input(Population::Relay, id, args.relay_input)?;
    }
    log::info!("Network sampling: done!");

    let mut trace = Trace::default();
    simulation.run(&mut trace);
    log::info!("Simulation: done! {} frames recorded", trace.len());

    trace.save_to(&trace_path)?;
    log::info!("Trace saving: done! Saved to {}", trace_path);

    if let Some(last) = trace.frames().last() {
        for (population, potentials) in [
            (Population::Principal, &last.principal_soma),
            (Population::Inhibitory, &last.inhibitory),
            (Population::Relay, &last.relay),
            (Population::Reticular, &last.reticular),
        ] {
            if !potentials.is_empty() {
                log::info!(
                    "Final mean potential of the {} population: {:.3} mV",
                    population,
                    potentials.iter().sum::<f64>() / potentials.len() as f64
                );
            }
        }
    }

    Ok(())
}
