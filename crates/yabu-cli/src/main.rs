mod cli;

use clap::Parser;

use yabu_core::run::{run_backup, RunRequest};
use yabu_core::store::S3cmdStore;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let store = S3cmdStore::new();
    let request = RunRequest {
        bucket: &cli.bucket,
        backup_name: &cli.backup_name,
        encrypt: cli.encrypt,
        encrypt_for: cli.encrypt_for.as_deref(),
        control_file: &cli.control_file,
        scratch_root: &cli.scratch_root,
        run_dir: &cli.run_dir,
    };

    tracing::info!("backup '{}' started", cli.backup_name);
    match run_backup(&store, &request) {
        Ok(outcome) => {
            tracing::info!(
                "backup complete: s3://{}/{}",
                cli.bucket,
                outcome.uploaded_key
            );
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
