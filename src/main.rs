use std::{fs, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use prophetic_bandits::{
    cli::{Cli, Commands, GenerateArgs, RunArgs},
    config::SimulationConfig,
    data::PriceSeries,
    generator::{PriceModel, generate},
    report::{self, GnuplotSink},
    simulation::{self, clock_seed},
};

fn init_logging(verbose: bool) {
    let default = if verbose {
        "info,prophetic_bandits=debug"
    } else {
        "info,prophetic_bandits=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(args: &RunArgs) -> Result<()> {
    let mut config = SimulationConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let start = Instant::now();
    info!(file = %args.file.display(), "importing file");
    let mut prices = PriceSeries::load(&args.file)
        .with_context(|| format!("could not import {}", args.file.display()))?;
    info!(
        rounds = prices.rounds(),
        prices_per_round = prices.prices_per_round(),
        "took {}ms to parse data",
        start.elapsed().as_millis()
    );

    let evaluation = simulation::evaluate(&mut prices, &config.bandit)?;

    print!("{}", report::render_oracle(&evaluation.best_hand));
    if let Some(extrema) = &evaluation.local_extrema {
        print!("{}", report::render_oracle(extrema));
    }
    for policy_run in &evaluation.runs {
        print!("{}", report::render_policy(policy_run, &evaluation.best_hand.gains)?);
    }

    let regret = evaluation.regret_series()?;
    let best_hand = evaluation.best_hand_series()?;

    if let Some(dir) = &config.report.output_dir {
        report::write_csv(dir, "average_regret.csv", &regret)?;
        report::write_csv(dir, "best_hand_percentage.csv", &best_hand)?;
    }

    if config.report.plot {
        let sink = GnuplotSink::new(&config.report.plot_command, config.report.max_plot_points);
        info!("plotting best hand regret");
        if let Err(e) = sink.plot("Average Regret", "Regret", &regret) {
            warn!(error = %e, "average regret plot failed");
        }
        if let Err(e) = sink.plot("Percentage of Best Hand Played", "Best Hand %", &best_hand) {
            warn!(error = %e, "best hand plot failed");
        }
    }

    info!(seed = evaluation.seed, "done");
    Ok(())
}

fn generate_prices(args: &GenerateArgs) -> Result<()> {
    let model = PriceModel::from_kind(args.model, args.param);
    let seed = args.seed.unwrap_or_else(clock_seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let series = generate(model, args.randomize, args.rounds, args.prices, &mut rng)?;

    let path = match &args.out {
        Some(path) => path.clone(),
        None => {
            let dir = PathBuf::from("prophetData");
            fs::create_dir_all(&dir)?;
            dir.join(model.file_name(args.randomize, args.rounds, args.prices))
        }
    };
    series
        .save(&path)
        .with_context(|| format!("could not write {}", path.display()))?;
    info!(path = %path.display(), ?model, seed, "prices written");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Run(args) => run(args),
        Commands::Generate(args) => generate_prices(args),
    }
}
