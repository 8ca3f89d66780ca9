use crate::commands::{run_generate, run_transition, GenerateArgs, TransitionArgs};
use crate::demo::{run_demo, DemoArgs};
use clap::{Parser, Subcommand};
use mlm_rewards::config::AppConfig;
use mlm_rewards::error::AppError;
use mlm_rewards::rewards::RewardTransition;
use mlm_rewards::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "MLM Rewards",
    about = "Generate, approve and deny network rewards kept in a CSV ledger",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate rewards for every subject of a subject sheet
    Generate(GenerateArgs),
    /// Approve pending rewards whose approval delay has elapsed
    Approve(TransitionArgs),
    /// Deny pending rewards whose denial delay has elapsed
    Deny(TransitionArgs),
    /// Run an in-memory generation and settlement walkthrough
    Demo(DemoArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Generate(args) => run_generate(args, &config),
        Command::Approve(args) => run_transition(args, RewardTransition::Approve, &config),
        Command::Deny(args) => run_transition(args, RewardTransition::Deny, &config),
        Command::Demo(args) => run_demo(args, &config),
    }
}
