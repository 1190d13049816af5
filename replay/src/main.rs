mod scenario;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        tracing::error!("usage: floodwatch-replay <scenario.json>");
        return ExitCode::FAILURE;
    };

    let scenario = match scenario::load(&path) {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "failed to load scenario");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(steps = scenario.steps.len(), profile = %scenario.profile, "replaying scenario");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = scenario.replay(&mut out) {
        tracing::error!(error = %e, "replay failed");
        return ExitCode::FAILURE;
    }
    if let Err(e) = out.flush() {
        tracing::error!(error = %e, "failed to flush output");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
