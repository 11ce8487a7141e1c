//! `zylith-prover-worker`: the proving subprocess.
//!
//! Reads `--artifact-dir <path>` from argv, initializes Poseidon, prints
//! the ready line and serves newline-delimited JSON commands on stdio until
//! stdin closes.

use std::path::PathBuf;
use std::process::ExitCode;

fn artifact_dir_from_args() -> Option<PathBuf> {
    let mut args = std::env::args_os().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--artifact-dir" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let Some(artifact_dir) = artifact_dir_from_args() else {
        eprintln!("usage: zylith-prover-worker --artifact-dir <path>");
        return ExitCode::FAILURE;
    };

    match zylith_prover::worker::run(artifact_dir).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("worker: {e}");
            ExitCode::FAILURE
        }
    }
}
