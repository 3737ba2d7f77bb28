use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "yabu",
    version,
    about = "Tar up configured paths and ship the archive to object storage",
    after_help = "\
Examples:
  yabu --bucket yet-another-server-mail-config --backup-name mail_config
  yabu --bucket yet-another-server-mail-config --backup-name mail_config \\
       --encrypt --encrypt-for mark@someplace.com

The backup definition (file list, retention ceiling, hooks) is looked up
under --backup-name in the control file."
)]
pub(crate) struct Cli {
    /// Bucket to upload into
    #[arg(short, long)]
    pub bucket: String,

    /// Backup name: archive prefix and control-file key
    #[arg(short = 'n', long = "backup-name")]
    pub backup_name: String,

    /// GPG-encrypt the archive before upload
    #[arg(short, long, requires = "encrypt_for")]
    pub encrypt: bool,

    /// GPG keychain identity to encrypt the archive for
    #[arg(short = 'u', long = "encrypt-for")]
    pub encrypt_for: Option<String>,

    /// Control file location
    #[arg(short, long, default_value = "/etc/yabu.yml")]
    pub control_file: PathBuf,

    /// Parent directory for per-run scratch directories
    #[arg(long, default_value = "/tmp", hide = true)]
    pub scratch_root: PathBuf,

    /// Directory the success sentinel is touched in
    #[arg(long, default_value = "/var/run", hide = true)]
    pub run_dir: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
