use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;

use ballistic_mc::aimpoint::{range_for_angle, solve_thrust_angle, update_aimpoint};
use ballistic_mc::monte_carlo::{mc_run, save_results, ImpactStatistics};
use ballistic_mc::output::{run_directory, CsvTrajectoryWriter, NullSink, TrajectorySink};
use ballistic_mc::sensitivity::{log_factors, run_sensitivity, save_sensitivity_csv};
use ballistic_mc::{fly, run_rng, FlightOutcome, RunParams, Vehicle};

#[derive(Parser)]
#[command(name = "ballistic-mc")]
#[command(version = "0.1.0")]
#[command(
    about = "Monte Carlo trajectory and error-budget simulator for ballistic missiles",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that builds a run configuration
#[derive(clap::Args, Debug, Clone)]
struct RunOptions {
    /// JSON configuration file (defaults are used when omitted)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of Monte Carlo runs
    #[arg(short = 'n', long)]
    runs: Option<usize>,

    /// Ensemble seed
    #[arg(short = 's', long)]
    seed: Option<u64>,

    /// Output directory
    #[arg(long)]
    output_dir: Option<String>,

    /// Longitudinal thrust angle (rad)
    #[arg(long)]
    theta_long: Option<f64>,

    /// Evaluate runs in parallel
    #[arg(long)]
    parallel: bool,
}

impl RunOptions {
    fn params(&self) -> Result<RunParams, Box<dyn Error>> {
        let mut params = match &self.config {
            Some(path) => RunParams::load(path)?,
            None => RunParams::default(),
        };
        if let Some(runs) = self.runs {
            params.num_runs = runs;
        }
        if let Some(seed) = self.seed {
            params.seed = seed;
        }
        if let Some(dir) = &self.output_dir {
            params.output_dir = dir.clone();
        }
        if let Some(theta_long) = self.theta_long {
            params.theta_long = theta_long;
        }
        if self.parallel {
            params.parallel = true;
        }
        params.validate()?;
        Ok(params)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Monte Carlo ensemble
    Run {
        #[command(flatten)]
        options: RunOptions,

        /// Write a trajectory file for every run
        #[arg(long)]
        traj: bool,

        /// Aim at the error-free impact point before running
        #[arg(long)]
        update_aimpoint: bool,

        /// Do not write impact and summary files
        #[arg(long)]
        no_save: bool,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Fly a single run and report its impact
    Fly {
        #[command(flatten)]
        options: RunOptions,

        /// Index of the run within the ensemble
        #[arg(long, default_value = "0")]
        run_index: usize,

        /// Write the trajectory to this CSV file
        #[arg(long)]
        traj_file: Option<PathBuf>,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Error-free impact point, or the thrust angle for a given range
    Aimpoint {
        #[command(flatten)]
        options: RunOptions,

        /// Solve for the thrust angle reaching this range (m)
        #[arg(long)]
        range: Option<f64>,
    },

    /// Sweep each error source over a range of scale factors
    Sensitivity {
        #[command(flatten)]
        options: RunOptions,

        /// Number of log-spaced factors between 0.1 and 10
        #[arg(long, default_value = "7")]
        factors: usize,
    },

    /// Write the default configuration as JSON
    Config {
        /// Destination file
        #[arg(default_value = "config.json")]
        path: PathBuf,
    },

    /// Display simulator information
    Info,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Table,
}

#[derive(Debug, Serialize)]
struct EnsembleReport<'a> {
    run_name: &'a str,
    total_runs: usize,
    exhausted_runs: usize,
    statistics: &'a ImpactStatistics,
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            options,
            traj,
            update_aimpoint: aim_first,
            no_save,
            output,
        } => {
            let mut params = options.params()?;
            if traj {
                params.traj_output = true;
            }
            if aim_first {
                update_aimpoint(&mut params)?;
            }
            params.log_summary();

            let results = mc_run(&params)?;
            if !no_save {
                save_results(&params, &results)?;
            }
            let stats = results.statistics(&params.aimpoint())?;
            let report = EnsembleReport {
                run_name: &params.run_name,
                total_runs: results.total_runs,
                exhausted_runs: results.exhausted_runs,
                statistics: &stats,
            };
            display_ensemble(&report, output)?;
        }

        Commands::Fly {
            options,
            run_index,
            traj_file,
            output,
        } => {
            let params = options.params()?;
            let mut rng = run_rng(params.seed, run_index);
            let mut sink: Box<dyn TrajectorySink> = match traj_file {
                Some(path) => Box::new(CsvTrajectoryWriter::create(path)?),
                None => Box::new(NullSink),
            };
            let result = fly(&params, &mut rng, sink.as_mut())?;

            match result.outcome {
                FlightOutcome::Impacted(impact) => {
                    let miss = (impact.position - params.aimpoint()).norm();
                    match output {
                        OutputFormat::Json => {
                            println!("{}", serde_json::to_string_pretty(&impact)?)
                        }
                        OutputFormat::Csv => {
                            println!("t,x,y,z,vx,vy,vz,miss");
                            println!(
                                "{:.3},{:.3},{:.3},{:.3},{:.3},{:.3},{:.3},{:.3}",
                                impact.t,
                                impact.position.x,
                                impact.position.y,
                                impact.position.z,
                                impact.velocity.x,
                                impact.velocity.y,
                                impact.velocity.z,
                                miss
                            );
                        }
                        OutputFormat::Table => {
                            println!("╔════════════════════════════════════════╗");
                            println!("║            IMPACT RESULTS              ║");
                            println!("╠════════════════════════════════════════╣");
                            println!("║ Time of Flight:  {:>12.3} s        ║", impact.t);
                            let speed = impact.velocity.norm();
                            println!("║ Impact Speed:    {:>12.2} m/s      ║", speed);
                            println!("║ Miss Distance:   {:>12.2} m        ║", miss);
                            println!("║ Steps:           {:>12}          ║", result.steps);
                            println!("╚════════════════════════════════════════╝");
                        }
                    }
                }
                FlightOutcome::Exhausted(state) => {
                    return Err(format!(
                        "no impact within {} steps (t = {:.1} s, altitude {:.1} m)",
                        params.max_steps,
                        state.t,
                        state.altitude()
                    )
                    .into());
                }
            }
        }

        Commands::Aimpoint { options, range } => {
            let mut params = options.params()?;
            if let Some(target) = range {
                params.theta_long = solve_thrust_angle(&params, target)?;
            }
            let aim = update_aimpoint(&mut params)?;
            let reached = range_for_angle(&params, params.theta_long)?;

            println!("╔════════════════════════════════════════╗");
            println!("║            AIMPOINT                    ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ theta_long:      {:>12.6} rad      ║", params.theta_long);
            println!("║ Range:           {:>12.1} km       ║", reached / 1000.0);
            println!("║ x_aim:           {:>12.1} m        ║", aim.x);
            println!("║ y_aim:           {:>12.1} m        ║", aim.y);
            println!("║ z_aim:           {:>12.1} m        ║", aim.z);
            println!("╚════════════════════════════════════════╝");
        }

        Commands::Sensitivity { options, factors } => {
            let params = options.params()?;
            params.log_summary();
            let rows = run_sensitivity(&params, &log_factors(factors))?;
            let path =
                run_directory(&params.output_dir, &params.run_name).join("sensitivity_data.csv");
            save_sensitivity_csv(&path, &rows)?;
            info!("sensitivity data written to {}", path.display());

            println!("┌──────────────────────┬──────────┬──────────────┐");
            println!("│ Parameter            │  Factor  │   CEP (m)    │");
            println!("├──────────────────────┼──────────┼──────────────┤");
            for row in &rows {
                println!(
                    "│ {:<20} │ {:>8.3} │ {:>12.3} │",
                    row.parameter.label(),
                    row.factor,
                    row.cep
                );
            }
            println!("└──────────────────────┴──────────┴──────────────┘");
        }

        Commands::Config { path } => {
            RunParams::default().save(&path)?;
            println!("Default configuration written to {}", path.display());
        }

        Commands::Info => {
            let vehicle = Vehicle::from_rv_type(RunParams::default().rv_type);
            println!("╔════════════════════════════════════════╗");
            println!("║      BALLISTIC MC v0.1.0               ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Monte Carlo ballistic missile          ║");
            println!("║ trajectory and error-budget tool.      ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Features:                              ║");
            println!("║ • Fixed-step RK4 integration           ║");
            println!("║ • True, estimated and desired tracks   ║");
            println!("║ • IMU and GNSS error models            ║");
            println!("║ • Perturbed atmosphere                 ║");
            println!("║ • Maneuvering reentry guidance         ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Booster: {:<29} ║", vehicle.booster.name);
            println!("║ Burn time:       {:>12.1} s        ║", vehicle.total_burn_time());
            println!("║ Launch mass:     {:>12.1} kg       ║", vehicle.current_mass);
            println!("╚════════════════════════════════════════╝");
        }
    }

    Ok(())
}

fn display_ensemble(report: &EnsembleReport, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    let stats = report.statistics;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }

        OutputFormat::Csv => {
            println!("metric,value");
            println!("total_runs,{}", report.total_runs);
            println!("impacts,{}", stats.impacts);
            println!("exhausted_runs,{}", report.exhausted_runs);
            println!("cep,{:.3}", stats.cep);
            println!("mean_miss,{:.3}", stats.miss.mean);
            println!("max_miss,{:.3}", stats.miss.max);
            println!("mean_east,{:.3}", stats.east.mean);
            println!("mean_north,{:.3}", stats.north.mean);
            println!("mean_flight_time,{:.3}", stats.flight_time.mean);
            println!("mean_impact_speed,{:.3}", stats.impact_speed.mean);
        }

        OutputFormat::Table => {
            println!("╔════════════════════════════════════════╗");
            println!("║      MONTE CARLO SIMULATION            ║");
            let runs = format!("{} runs ({} impacts)", report.total_runs, stats.impacts);
            println!("║      {:<34}║", runs);
            println!("╠════════════════════════════════════════╣");
            println!("║ MISS DISTANCE                          ║");
            println!("║ CEP:             {:>12.2} m        ║", stats.cep);
            println!("║ Mean:            {:>12.2} m        ║", stats.miss.mean);
            println!("║ Std Dev:         {:>12.2} m        ║", stats.miss.std);
            println!("║ Max:             {:>12.2} m        ║", stats.miss.max);
            println!("╠════════════════════════════════════════╣");
            println!("║ MEAN POINT OF IMPACT                   ║");
            println!("║ East:            {:>12.2} m        ║", stats.east.mean);
            println!("║ North:           {:>12.2} m        ║", stats.north.mean);
            println!("╠════════════════════════════════════════╣");
            println!("║ FLIGHT                                 ║");
            println!("║ Time of Flight:  {:>12.2} s        ║", stats.flight_time.mean);
            println!("║ Impact Speed:    {:>12.2} m/s      ║", stats.impact_speed.mean);
            println!("╚════════════════════════════════════════╝");
            if report.exhausted_runs > 0 {
                println!("{} runs did not reach the ground", report.exhausted_runs);
            }
        }
    }

    Ok(())
}
