use std::io::Write;
use std::process::ExitCode;

fn main() -> ExitCode {
    match dirbridged::run_bridge() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: "dirbridged::process", error = %error, "bridge exited");
            // Telemetry is not installed when configuration fails to load.
            let _ = writeln!(std::io::stderr(), "dirbridged: {error}");
            ExitCode::FAILURE
        }
    }
}
