use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use jobrank_core::tracing_config;
use jobrank_eval::cli::{self, exit_code};
use jobrank_eval::{Evaluation, RelationalSink, ResultSink, TabularSink};

fn main() -> ExitCode {
    let level = tracing_config::level_from_env(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{}={level}", tracing_config::TARGET_PREFIX))),
        )
        .with_target(true)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let parsed = match cli::parse_cli_args(&args) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            println!("{}", cli::USAGE);
            return ExitCode::from(exit_code::OK);
        }
        Err(message) => {
            eprintln!("error: {message}\n\n{}", cli::USAGE);
            return ExitCode::from(exit_code::USAGE_ERROR);
        }
    };

    match run(parsed) {
        Ok(()) => ExitCode::from(exit_code::OK),
        Err(err) => {
            error!(target: "jobrank.cli", %err, "evaluation failed");
            ExitCode::from(exit_code::RUNTIME_ERROR)
        }
    }
}

fn run(args: cli::CliArgs) -> jobrank_core::EvalResult<()> {
    let spec = args.into_spec();
    let evaluation = Evaluation::new(spec.clone())?;
    let recommender = cli::build_recommender(&spec, evaluation.config())?;

    let tabular = TabularSink::in_dir(&spec.evaluation_dir);
    let relational = RelationalSink::in_dir(&spec.evaluation_dir);
    let sinks: [&dyn ResultSink; 2] = [&tabular, &relational];

    evaluation.run(recommender.as_ref(), &sinks)?;
    Ok(())
}
