//! Configurator support: input validation, cron-entry rendering, and
//! installation into the scheduler's directory-per-frequency convention.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, YabuError};

/// Built-in cron entry used when no `--skel-file` is given.
pub const DEFAULT_CRON_TEMPLATE: &str = "\
#!/bin/sh
# Installed by yabu-configure; rerun it to regenerate rather than editing here.
@@RUNNER_PATH@@ --bucket @@BUCKET@@ --backup-name @@BACKUP_NAME@@ @@ENCRYPTION@@ @@ENCRYPT_FOR@@
";

/// The scheduling granularities the cron directory convention supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = YabuError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hourly" => Ok(Frequency::Hourly),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(YabuError::Validation(format!(
                "unknown frequency '{other}' (expected hourly, daily, weekly or monthly)"
            ))),
        }
    }
}

/// Values substituted into the cron-entry template.
#[derive(Debug, Clone)]
pub struct CronContext {
    pub bucket: String,
    pub backup_name: String,
    pub runner_path: String,
    pub encrypt: bool,
    pub encrypt_for: Option<String>,
}

const TOKEN_DELIM: &str = "@@";

/// Reject missing or blank required inputs before anything is written.
pub fn validate_required(bucket: &str, backup_name: &str, files: &[String]) -> Result<()> {
    if bucket.trim().is_empty() {
        return Err(YabuError::Validation("bucket must not be empty".into()));
    }
    if backup_name.trim().is_empty() {
        return Err(YabuError::Validation("backup name must not be empty".into()));
    }
    if backup_name.contains('/') {
        return Err(YabuError::Validation(format!(
            "backup name '{backup_name}' must not contain '/'"
        )));
    }
    if files.is_empty() || files.iter().any(|f| f.trim().is_empty()) {
        return Err(YabuError::Validation(
            "file list must not be empty or contain blank entries".into(),
        ));
    }
    Ok(())
}

fn checked<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    if value.contains(TOKEN_DELIM) {
        return Err(YabuError::Validation(format!(
            "{field} value '{value}' contains the template delimiter '{TOKEN_DELIM}'"
        )));
    }
    Ok(value)
}

/// Render the cron entry by literal token substitution. Values containing the
/// delimiter are rejected up front instead of corrupting the output, and a
/// template with tokens outside the known set fails rather than installing
/// them verbatim.
pub fn render_cron_entry(template: &str, ctx: &CronContext) -> Result<String> {
    let encryption = if ctx.encrypt { "--encrypt" } else { "" };
    let encrypt_for = match (ctx.encrypt, ctx.encrypt_for.as_deref()) {
        (true, Some(id)) => format!("--encrypt-for {id}"),
        _ => String::new(),
    };

    let rendered = template
        .replace("@@BUCKET@@", checked("bucket", &ctx.bucket)?)
        .replace("@@BACKUP_NAME@@", checked("backup name", &ctx.backup_name)?)
        .replace("@@RUNNER_PATH@@", checked("runner path", &ctx.runner_path)?)
        .replace("@@ENCRYPTION@@", encryption)
        .replace("@@ENCRYPT_FOR@@", checked("encrypt-for", &encrypt_for)?);
    if let Some(pos) = rendered.find(TOKEN_DELIM) {
        let leftover: String = rendered[pos..].chars().take(40).collect();
        return Err(YabuError::Validation(format!(
            "template contains unrecognized tokens after substitution: {}",
            leftover.lines().next().unwrap_or(&leftover)
        )));
    }
    Ok(rendered)
}

/// Install a rendered entry as `<cron_root>/cron.<frequency>/<name>_backup`,
/// executable by owner only. The temp-file-then-rename dance keeps a
/// concurrent cron scan from picking up a half-written entry.
pub fn install_cron_entry(
    cron_root: &Path,
    frequency: Frequency,
    backup_name: &str,
    rendered: &str,
) -> Result<PathBuf> {
    let dir = cron_root.join(format!("cron.{frequency}"));
    let target = dir.join(format!("{backup_name}_backup"));

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| {
        YabuError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot write into '{}': {e}", dir.display()),
        ))
    })?;
    tmp.write_all(rendered.as_bytes())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o700))?;
    }
    tmp.persist(&target).map_err(|e| YabuError::Io(e.error))?;
    Ok(target)
}
