//! CLI for qkd-sim: run one QKD protocol and print a JSON envelope.

use clap::{Args, Parser, Subcommand};
use qkd_sim::errors::{ParameterError, SimulationError};
use qkd_sim::protocols::{b92, bb84, e91};
use qkd_sim::statistics::report;
use qkd_sim::{BellState, SimulationResponse};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "qkd-sim")]
#[command(about = "Statistical simulation of the BB84, E91 and B92 QKD protocols")]
#[command(version = qkd_sim::VERSION)]
struct Cli {
    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Omit the human-readable analysis from the output
    #[arg(long, global = true)]
    no_analysis: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare-and-measure BB84 with four states in two bases
    Bb84(Bb84Args),
    /// Entanglement-based E91 with a CHSH Bell test
    E91(E91Args),
    /// Two-state B92 with unambiguous state discrimination
    B92(B92Args),
}

#[derive(Args)]
struct Bb84Args {
    /// JSON file with run parameters; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    n_bits: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    depolarization: Option<f64>,
    #[arg(long)]
    phase_damping: Option<f64>,
    #[arg(long)]
    amplitude_damping: Option<f64>,
    /// Fiber length in km
    #[arg(long)]
    fiber_length: Option<f64>,
    /// Fiber attenuation in dB/km
    #[arg(long)]
    attenuation_coeff: Option<f64>,
    #[arg(long)]
    eavesdropping_rate: Option<f64>,
}

#[derive(Args)]
struct E91Args {
    /// JSON file with run parameters; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    n_pairs: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    depolarization: Option<f64>,
    #[arg(long)]
    eavesdropping_rate: Option<f64>,
    #[arg(long)]
    dark_count_rate: Option<f64>,
    /// psi_minus (default), psi_plus, phi_minus or phi_plus
    #[arg(long)]
    bell_state: Option<String>,
}

#[derive(Args)]
struct B92Args {
    /// JSON file with run parameters; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    n_signals: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    channel_loss: Option<f64>,
    #[arg(long)]
    depolarization: Option<f64>,
    #[arg(long)]
    eavesdropping_rate: Option<f64>,
    #[arg(long)]
    dark_count_rate: Option<f64>,
}

fn load_config<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T, ParameterError> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| ParameterError::Config(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| ParameterError::Config(format!("{}: {}", path.display(), e)))
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl Bb84Args {
    fn into_params(self) -> Result<bb84::Bb84Params, ParameterError> {
        let mut params: bb84::Bb84Params = load_config(self.config.as_deref())?;
        override_with(&mut params.n_bits, self.n_bits);
        override_with(&mut params.seed, self.seed.map(Some));
        override_with(&mut params.depolarization, self.depolarization);
        override_with(&mut params.phase_damping, self.phase_damping);
        override_with(&mut params.amplitude_damping, self.amplitude_damping);
        override_with(&mut params.fiber_length, self.fiber_length);
        override_with(&mut params.attenuation_coeff, self.attenuation_coeff);
        override_with(&mut params.eavesdropping_rate, self.eavesdropping_rate);
        Ok(params)
    }
}

impl E91Args {
    fn into_params(self) -> Result<e91::E91Params, ParameterError> {
        let mut params: e91::E91Params = load_config(self.config.as_deref())?;
        override_with(&mut params.n_pairs, self.n_pairs);
        override_with(&mut params.seed, self.seed.map(Some));
        override_with(&mut params.depolarization, self.depolarization);
        override_with(&mut params.eavesdropping_rate, self.eavesdropping_rate);
        override_with(&mut params.dark_count_rate, self.dark_count_rate);
        if let Some(name) = self.bell_state {
            params.bell_state = name.parse::<BellState>()?;
        }
        Ok(params)
    }
}

impl B92Args {
    fn into_params(self) -> Result<b92::B92Params, ParameterError> {
        let mut params: b92::B92Params = load_config(self.config.as_deref())?;
        override_with(&mut params.n_signals, self.n_signals);
        override_with(&mut params.seed, self.seed.map(Some));
        override_with(&mut params.channel_loss, self.channel_loss);
        override_with(&mut params.depolarization, self.depolarization);
        override_with(&mut params.eavesdropping_rate, self.eavesdropping_rate);
        override_with(&mut params.dark_count_rate, self.dark_count_rate);
        Ok(params)
    }
}

fn emit<T: Serialize>(
    result: Result<T, SimulationError>,
    analyze: impl FnOnce(&T) -> String,
    pretty: bool,
    no_analysis: bool,
) -> ExitCode {
    let code = match &result {
        Ok(_) => ExitCode::SUCCESS,
        Err(SimulationError::InvalidParameters(_)) => ExitCode::from(2),
        Err(SimulationError::Internal(_)) => ExitCode::FAILURE,
    };
    if let Err(err) = &result {
        log::error!("{}", err);
    }

    let response =
        SimulationResponse::from_result(result, |data| (!no_analysis).then(|| analyze(data)));
    let rendered = if pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    };

    match rendered {
        Ok(json) => {
            println!("{}", json);
            code
        }
        Err(e) => {
            eprintln!("failed to serialize response: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let (pretty, no_analysis) = (cli.pretty, cli.no_analysis);

    match cli.command {
        Commands::Bb84(args) => {
            let result = args
                .into_params()
                .map_err(SimulationError::from)
                .and_then(|params| bb84::run(&params));
            emit(result, report::bb84_analysis, pretty, no_analysis)
        }
        Commands::E91(args) => {
            let result = args
                .into_params()
                .map_err(SimulationError::from)
                .and_then(|params| e91::run(&params));
            emit(result, report::e91_analysis, pretty, no_analysis)
        }
        Commands::B92(args) => {
            let result = args
                .into_params()
                .map_err(SimulationError::from)
                .and_then(|params| b92::run(&params));
            emit(result, report::b92_analysis, pretty, no_analysis)
        }
    }
}
