//! The backup runner lifecycle: lookup, list, stage, archive, upload, prune,
//! sentinel. Strictly sequential and fail-fast — any error abandons the run
//! at the point of failure with no rollback of completed steps.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Local;

use crate::control::ControlFile;
use crate::error::{Result, YabuError};
use crate::hooks::{run_hook, HookStage};
use crate::lineage::{check_ordering, prune_decision, PruneDecision};
use crate::shell;
use crate::store::ObjectStore;

/// Everything one run needs, resolved up front and passed explicitly.
pub struct RunRequest<'a> {
    pub bucket: &'a str,
    /// Archive name prefix and control-file key.
    pub backup_name: &'a str,
    pub encrypt: bool,
    pub encrypt_for: Option<&'a str>,
    pub control_file: &'a Path,
    /// Parent directory for per-run scratch directories (normally `/tmp`).
    pub scratch_root: &'a Path,
    /// Directory the success sentinel is touched in (normally `/var/run`).
    pub run_dir: &'a Path,
}

/// What a successful run did, for reporting.
#[derive(Debug)]
pub struct RunOutcome {
    pub uploaded_key: String,
    pub pruned_key: Option<String>,
    pub sentinel: PathBuf,
}

pub fn run_backup(store: &dyn ObjectStore, req: &RunRequest<'_>) -> Result<RunOutcome> {
    if req.encrypt && req.encrypt_for.is_none() {
        return Err(YabuError::Validation(
            "--encrypt-for must be given with --encrypt".into(),
        ));
    }

    // Everything up to staging is side-effect free; a bad control file or an
    // unreachable bucket aborts before anything local or remote is touched.
    let control = ControlFile::load(req.control_file)?;
    let def = control.lookup(req.backup_name)?.clone();

    store.verify_access(req.bucket)?;
    let listing = store.list(req.bucket, req.backup_name)?;
    check_ordering(&listing)?;
    if listing.len() <= 1 {
        tracing::info!(
            "fewer than 2 previous archives for '{}', assuming new lineage",
            req.backup_name
        );
    }

    let stamp = Local::now().format("%Y%m%d%H%M").to_string();
    let archive_name = archive_file_name(req.backup_name, &stamp, req.encrypt);
    let scratch = req
        .scratch_root
        .join(format!("{}_backup_temp_{stamp}", req.backup_name));

    run_hook(HookStage::Preflight, def.preflight.as_deref())?;

    stage(&def.files, &scratch)?;
    create_archive(&scratch, &archive_name, req.encrypt, req.encrypt_for)?;
    tracing::info!("archive {archive_name} created");

    run_hook(HookStage::Postflight, def.postflight.as_deref())?;

    // An upload failure keeps the scratch directory for manual recovery and
    // skips pruning entirely.
    let local_archive = scratch.join(&archive_name);
    store.put(&local_archive, req.bucket, &archive_name)?;
    tracing::info!(
        "uploaded s3://{}/{archive_name}, removing scratch directory",
        req.bucket
    );
    if let Err(e) = fs::remove_dir_all(&scratch) {
        tracing::warn!(
            "could not remove scratch directory '{}': {e}",
            scratch.display()
        );
    }

    // The fresh upload sorts after every verified entry, so it can be counted
    // against the ceiling without another round trip to the store.
    let mut after_upload = listing;
    after_upload.push(archive_name.clone());
    let pruned_key = match prune_decision(&after_upload, def.max_backups())? {
        PruneDecision::None => {
            tracing::info!(
                "{} archives stored, within ceiling of {}, nothing to delete",
                after_upload.len(),
                def.max_backups()
            );
            None
        }
        PruneDecision::Delete(oldest) => {
            tracing::info!("deleting oldest archive: {}", oldest.key);
            store.delete(req.bucket, &oldest.key)?;
            Some(oldest.key)
        }
    };

    let sentinel = touch_sentinel(req.run_dir, req.backup_name)?;

    Ok(RunOutcome {
        uploaded_key: archive_name,
        pruned_key,
        sentinel,
    })
}

fn archive_file_name(name: &str, stamp: &str, encrypt: bool) -> String {
    let ext = if encrypt { "tar.gpg" } else { "tar.gz" };
    format!("{name}-{stamp}.{ext}")
}

/// Copy every source path into a freshly created scratch directory, one `cp`
/// batch per path so permissions and symlinks survive. A failure partway
/// through leaves the scratch directory as-is; the run aborts without
/// cleanup.
fn stage(files: &[String], scratch: &Path) -> Result<()> {
    if let Some(parent) = scratch.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| YabuError::Staging(format!("cannot create '{}': {e}", parent.display())))?;
    }
    // Plain create_dir: a leftover directory from a same-minute run is an
    // error, not something to silently merge into.
    fs::create_dir(scratch).map_err(|e| {
        YabuError::Staging(format!(
            "cannot create scratch directory '{}': {e}",
            scratch.display()
        ))
    })?;

    for item in files {
        tracing::debug!("staging {item}");
        let mut cmd = Command::new("cp");
        cmd.arg("-Rpv").arg(item).arg(scratch);
        let result = shell::run_command(&mut cmd)
            .map_err(|e| YabuError::Staging(format!("cannot invoke cp: {e}")))?;
        if !result.success() {
            return Err(YabuError::Staging(format!(
                "copying '{item}' into '{}' exited with {}: {}",
                scratch.display(),
                result.code_display(),
                result.stderr.trim()
            )));
        }
    }
    Ok(())
}

/// Produce the archive inside the scratch directory. Success requires both a
/// zero exit status and the output file existing: the exit check keeps a
/// stale file from a previous run from being mistaken for a fresh archive.
fn create_archive(
    scratch: &Path,
    archive_name: &str,
    encrypt: bool,
    recipient: Option<&str>,
) -> Result<()> {
    let mut cmd = if encrypt {
        let recipient = recipient.ok_or_else(|| {
            YabuError::Validation("--encrypt-for must be given with --encrypt".into())
        })?;
        let mut c = Command::new("gpg-zip");
        c.args(["--encrypt", "--output", archive_name, "-r", recipient, "./"]);
        c
    } else {
        let mut c = Command::new("tar");
        c.args(["-czf", archive_name, "./"]);
        c
    };
    cmd.current_dir(scratch);

    let result = shell::run_command(&mut cmd)
        .map_err(|e| YabuError::ArchiveCreation(format!("cannot invoke archiver: {e}")))?;
    if !result.success() {
        return Err(YabuError::ArchiveCreation(format!(
            "archiver exited with {}: {}",
            result.code_display(),
            result.stderr.trim()
        )));
    }
    if !scratch.join(archive_name).exists() {
        return Err(YabuError::ArchiveCreation(format!(
            "archiver reported success but '{archive_name}' was not created"
        )));
    }
    Ok(())
}

/// Create or refresh the success marker. Its mtime is the external signal a
/// monitoring system alerts on when a backup goes missing.
fn touch_sentinel(run_dir: &Path, name: &str) -> Result<PathBuf> {
    let path = run_dir.join(format!("{name}_backup"));
    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&path)?;
    file.set_modified(std::time::SystemTime::now())?;
    Ok(path)
}
