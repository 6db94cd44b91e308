use itom_runner::cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    itom_runner::init();

    match cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
