//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - runs the fit pipeline or the synthetic generator
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, FitArgs, SimulateArgs, SolverArgs};
use crate::data::{HAND_ESTIMATE, generate_profile};
use crate::domain::{FitConfig, GuessSource, LogLawParams, SeedGrid, SolverConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `logfit` binary.
pub fn run() -> Result<(), AppError> {
    // Solver knobs may come from a `.env` file; a missing file is fine.
    dotenvy::dotenv().ok();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    crate::logging::init_logger(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_fit_summary(&run.observations, run.initial_guess, &run.fit)
    );
    println!("{}", crate::report::format_residual_table(&run.residuals));
    if let Some(cmp) = &run.comparison {
        println!("{}", crate::report::format_comparison("hand estimate", cmp));
    }
    if let Some(est) = run.linearized {
        println!(
            "Linearized (u vs ln z) estimate: u*={:.5} z_o={:.5}",
            est.u_star, est.z_o
        );
    }

    // Optional exports.
    if let Some(path) = &config.export_residuals {
        crate::io::write_residuals_csv(path, &run.residuals)?;
        info!(path = %path.display(), "wrote residuals CSV");
    }
    if let Some(path) = &config.export_fit {
        crate::io::write_fit_json(path, &run.observations, &run.fit)?;
        info!(path = %path.display(), "wrote fit JSON");
    }

    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let truth = LogLawParams::new(args.u_star, args.z_o);
    let obs = generate_profile(truth, &args.z, args.noise, args.seed)?;
    print!("{}", crate::report::format_observations(&obs));

    if args.fit {
        let solver = solver_config_from_args(&args.solver);
        let guess = crate::fit::seed_from_grid(&obs, &SeedGrid::for_observations(&obs))?;
        let fit = crate::fit::fit_with(&obs, guess, &solver)?;
        println!();
        println!("{}", crate::report::format_fit_summary(&obs, guess, &fit));
        let cmp = crate::report::compare_to_reference(&fit, truth);
        println!("{}", crate::report::format_comparison("true parameters", &cmp));
    }

    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    let guess = if args.auto_seed {
        GuessSource::Grid
    } else {
        GuessSource::Explicit(LogLawParams::new(args.u_star0, args.z0))
    };

    FitConfig {
        heights: args.z.clone(),
        velocities: args.u.clone(),
        guess,
        solver: solver_config_from_args(&args.solver),
        reference: args.compare_hand.then_some(HAND_ESTIMATE),
        export_residuals: args.export_residuals.clone(),
        export_fit: args.export_fit.clone(),
    }
}

fn solver_config_from_args(args: &SolverArgs) -> SolverConfig {
    SolverConfig {
        max_iter: args.max_iter,
        ftol: args.ftol,
        xtol: args.xtol,
        bounded: !args.unbounded,
        ..SolverConfig::default()
    }
}

/// Rewrite argv so `logfit` defaults to `logfit fit`.
///
/// Rules:
/// - `logfit`                      -> `logfit fit`
/// - `logfit --z0 0.2 ...`         -> `logfit fit --z0 0.2 ...`
/// - `logfit --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "simulate");
    if is_subcommand {
        return argv;
    }

    // Global flags may precede the subcommand.
    if matches!(arg1.as_str(), "-v" | "--verbose") {
        let has_subcommand = argv
            .iter()
            .skip(2)
            .any(|a| matches!(a.as_str(), "fit" | "simulate"));
        if !has_subcommand {
            argv.insert(2, "fit".to_string());
        }
        return argv;
    }

    // If the first token is a flag, treat it as "fit flags".
    if arg1.starts_with('-') {
        argv.insert(1, "fit".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_runs_fit() {
        assert_eq!(rewrite_args(argv(&["logfit"])), argv(&["logfit", "fit"]));
    }

    #[test]
    fn leading_flags_are_fit_flags() {
        assert_eq!(
            rewrite_args(argv(&["logfit", "--z0", "0.2"])),
            argv(&["logfit", "fit", "--z0", "0.2"])
        );
        assert_eq!(
            rewrite_args(argv(&["logfit", "-v"])),
            argv(&["logfit", "-v", "fit"])
        );
        assert_eq!(
            rewrite_args(argv(&["logfit", "-v", "simulate", "--u-star", "1", "--z-o", "0.1"])),
            argv(&["logfit", "-v", "simulate", "--u-star", "1", "--z-o", "0.1"])
        );
    }

    #[test]
    fn help_and_subcommands_are_untouched() {
        assert_eq!(rewrite_args(argv(&["logfit", "--help"])), argv(&["logfit", "--help"]));
        assert_eq!(rewrite_args(argv(&["logfit", "simulate"])), argv(&["logfit", "simulate"]));
    }

    #[test]
    fn config_maps_flags() {
        let cli = crate::cli::Cli::parse_from(["logfit", "fit", "--auto-seed", "--compare-hand", "--unbounded"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let config = fit_config_from_args(&args);
        assert_eq!(config.guess, GuessSource::Grid);
        assert_eq!(config.reference, Some(HAND_ESTIMATE));
        assert!(!config.solver.bounded);
    }

    #[test]
    fn negative_simulated_roughness_is_a_domain_error() {
        let cli = crate::cli::Cli::parse_from(["logfit", "simulate", "--u-star", "2", "--z-o", "-0.1"]);
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.z_o, -0.1);
        let err = handle_simulate(args).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
