mod cli;
mod commands;
mod infra;

use review_rules::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
