use clap::Parser;
use retrograde_cli::config::{Cli, Config};
use retrograde_logger::log::{log, set_min_severity};
use retrograde_logger::severity::LogSeverity::{Fatal, Info};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version are not failures
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    let config = Config::from(cli);
    set_min_severity(config.log_level);
    log("Retrograde init".to_owned(), Info);

    match retrograde_cli::run(&config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            log(format!("{}", err), Fatal);
            ExitCode::FAILURE
        }
    }
}
