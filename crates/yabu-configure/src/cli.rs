use std::path::PathBuf;

use clap::Parser;

use yabu_core::schedule::Frequency;

#[derive(Parser)]
#[command(
    name = "yabu-configure",
    version,
    about = "Register a named backup in the control file and install its cron entry",
    group(clap::ArgGroup::new("frequency").required(true)),
    after_help = "\
Examples:
  yabu-configure --bucket yet-another-server-mail-config --backup-name mail_config \\
                 --daily --files /etc/mail,/etc/aliases --max-backups 14

The control file must already exist; seed a fresh host with a file
containing '{}'."
)]
pub(crate) struct Cli {
    /// Bucket the installed cron entry will upload into
    #[arg(short, long)]
    pub bucket: String,

    /// Backup name: control-file key and cron entry basename
    #[arg(short = 'n', long = "backup-name")]
    pub backup_name: String,

    /// Run the backup every hour
    #[arg(long, group = "frequency")]
    pub hourly: bool,

    /// Run the backup every day
    #[arg(long, group = "frequency")]
    pub daily: bool,

    /// Run the backup every week
    #[arg(long, group = "frequency")]
    pub weekly: bool,

    /// Run the backup every month
    #[arg(long, group = "frequency")]
    pub monthly: bool,

    /// How many archives to keep in the bucket
    #[arg(
        short,
        long,
        default_value_t = 14,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_backups: u32,

    /// Comma-separated paths to back up
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub files: Vec<String>,

    /// Shell command to run before staging
    #[arg(long)]
    pub preflight: Option<String>,

    /// Shell command to run after the archive is created
    #[arg(long)]
    pub postflight: Option<String>,

    /// Configure the installed entry to GPG-encrypt its archives
    #[arg(short, long, requires = "encrypt_for")]
    pub encrypt: bool,

    /// GPG keychain identity the archives are encrypted for
    #[arg(short = 'u', long = "encrypt-for")]
    pub encrypt_for: Option<String>,

    /// Control file location
    #[arg(short, long, default_value = "/etc/yabu.yml")]
    pub control_file: PathBuf,

    /// Cron entry template; the built-in one is used when omitted
    #[arg(short, long)]
    pub skel_file: Option<PathBuf>,

    /// Path to the runner binary substituted into the template
    #[arg(short = 'a', long, default_value = "/usr/local/bin/yabu")]
    pub runner_path: String,

    /// Parent of the cron.<frequency> directories
    #[arg(long, default_value = "/etc", hide = true)]
    pub cron_root: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Exactly one of the group flags is set; clap enforces that.
    pub fn frequency(&self) -> Frequency {
        if self.hourly {
            Frequency::Hourly
        } else if self.daily {
            Frequency::Daily
        } else if self.weekly {
            Frequency::Weekly
        } else {
            Frequency::Monthly
        }
    }
}
