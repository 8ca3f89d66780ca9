mod cli;
mod commands;
mod demo;
mod infra;

use mlm_rewards::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
