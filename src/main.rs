// src/main.rs

use std::any::Any;
use std::process::ExitCode;

use ci_orch::{RunContext, cli, logging, record_panic, run};

#[tokio::main]
async fn main() -> ExitCode {
    let parsed = cli::parse();
    let level = parsed.as_ref().ok().and_then(|inv| inv.log_level);
    if let Err(err) = logging::init_logging(level) {
        eprintln!("ci-orch: {err:#}");
    }

    // The run lives in its own task so a panic surfaces as a JoinError here.
    match tokio::spawn(run(parsed)).await {
        Ok(summary) => ExitCode::from(summary.exit_code()),
        Err(err) => {
            let message = if err.is_panic() {
                panic_message(err.into_panic())
            } else {
                err.to_string()
            };
            record_panic(RunContext::production(), &message);
            ExitCode::FAILURE
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
