mod cli;
mod leads;
mod map;

use outreach::error::AppError;

/// Entry point for the `outreach` binary. Runs synchronously; the gateways
/// drive their own runtimes.
pub fn run() -> Result<(), AppError> {
    cli::run()
}
