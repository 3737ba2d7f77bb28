mod cli;

use std::fs;

use clap::Parser;

use yabu_core::control::{BackupDefinition, ControlFile};
use yabu_core::error::Result;
use yabu_core::schedule::{
    install_cron_entry, render_cron_entry, validate_required, CronContext, DEFAULT_CRON_TEMPLATE,
};

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

    if let Err(e) = configure(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn configure(cli: &Cli) -> Result<()> {
    validate_required(&cli.bucket, &cli.backup_name, &cli.files)?;

    let template = match &cli.skel_file {
        Some(path) => fs::read_to_string(path)?,
        None => DEFAULT_CRON_TEMPLATE.to_string(),
    };

    // Rendering is pure, so doing it first means a bad template value fails
    // the whole invocation before the control file has been touched.
    let ctx = CronContext {
        bucket: cli.bucket.clone(),
        backup_name: cli.backup_name.clone(),
        runner_path: cli.runner_path.clone(),
        encrypt: cli.encrypt,
        encrypt_for: cli.encrypt_for.clone(),
    };
    let rendered = render_cron_entry(&template, &ctx)?;

    // The control file must already exist, even if only as an empty mapping.
    // Refusing to invent it keeps a typoed --control-file from silently
    // writing a parallel config nothing reads.
    let mut control = ControlFile::load(&cli.control_file)?;

    let mut def = BackupDefinition::new(cli.files.clone(), cli.max_backups);
    def.preflight = cli.preflight.clone();
    def.postflight = cli.postflight.clone();
    control.upsert(&cli.backup_name, def);
    control.save(&cli.control_file)?;
    tracing::info!(
        "'{}' recorded in {}",
        cli.backup_name,
        cli.control_file.display()
    );

    let frequency = cli.frequency();
    let target = install_cron_entry(&cli.cron_root, frequency, &cli.backup_name, &rendered)?;
    tracing::info!("cron entry installed at {}", target.display());

    Ok(())
}
