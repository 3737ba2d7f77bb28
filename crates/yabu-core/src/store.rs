use std::path::Path;
use std::process::Command;

use crate::error::{Result, YabuError};
use crate::shell::{self, CommandResult};

/// The object-store collaborator boundary. Implementations resolve their own
/// credentials; nothing here handles them. Every operation is passed an
/// explicit store instead of reaching for a shared client handle.
pub trait ObjectStore {
    /// Probe access to the bucket. Failure means unreachable or denied, which
    /// the caller cannot tell apart from the probe alone.
    fn verify_access(&self, bucket: &str) -> Result<()>;

    /// List object keys under `prefix`, in the order the store returns them
    /// (expected oldest-first; callers verify). Keys are relative to the
    /// bucket.
    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Upload a local file to `key` in the bucket.
    fn put(&self, local: &Path, bucket: &str, key: &str) -> Result<()>;

    /// Delete one object.
    fn delete(&self, bucket: &str, key: &str) -> Result<()>;
}

/// Passthrough to the `s3cmd` CLI. Credentials come from the invoking user's
/// own `.s3cfg`. Exit status and stderr are inspected on every call; an `ls`
/// that exits non-zero is treated as no access rather than an empty bucket.
pub struct S3cmdStore {
    program: String,
}

impl S3cmdStore {
    pub fn new() -> Self {
        Self::with_program("s3cmd")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str]) -> std::io::Result<CommandResult> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        tracing::debug!("running {} {}", self.program, args.join(" "));
        shell::run_command(&mut cmd)
    }
}

impl Default for S3cmdStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for S3cmdStore {
    fn verify_access(&self, bucket: &str) -> Result<()> {
        let url = format!("s3://{bucket}");
        let result = self
            .run(&["ls", &url])
            .map_err(|e| YabuError::Connectivity(format!("cannot invoke s3cmd: {e}")))?;
        if !result.success() {
            return Err(YabuError::Connectivity(format!(
                "cannot access '{url}' (exit {}): check bucket name or credentials: {}",
                result.code_display(),
                result.stderr.trim()
            )));
        }
        Ok(())
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let query = format!("s3://{bucket}/{prefix}");
        let result = self
            .run(&["ls", &query])
            .map_err(|e| YabuError::Connectivity(format!("cannot invoke s3cmd: {e}")))?;
        if !result.success() {
            return Err(YabuError::Connectivity(format!(
                "listing '{query}' failed (exit {}): {}",
                result.code_display(),
                result.stderr.trim()
            )));
        }
        Ok(parse_ls_output(&result.stdout, bucket))
    }

    fn put(&self, local: &Path, bucket: &str, key: &str) -> Result<()> {
        let dest = format!("s3://{bucket}/{key}");
        let local = local.to_string_lossy();
        let result = self
            .run(&["put", local.as_ref(), &dest])
            .map_err(|e| YabuError::Upload(format!("cannot invoke s3cmd: {e}")))?;
        if !result.success() {
            return Err(YabuError::Upload(format!(
                "s3cmd put to '{dest}' exited with {}: {}",
                result.code_display(),
                result.stderr.trim()
            )));
        }
        Ok(())
    }

    fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let url = format!("s3://{bucket}/{key}");
        let result = self
            .run(&["del", &url])
            .map_err(|e| YabuError::Connectivity(format!("cannot invoke s3cmd: {e}")))?;
        if !result.success() {
            return Err(YabuError::Connectivity(format!(
                "s3cmd del of '{url}' exited with {}: {}",
                result.code_display(),
                result.stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Pull bucket-relative keys out of `s3cmd ls` output. Each listing line ends
/// in the object URL; everything else on the line (date, size) is ignored.
fn parse_ls_output(stdout: &str, bucket: &str) -> Vec<String> {
    let bucket_prefix = format!("s3://{bucket}/");
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().last())
        .filter_map(|url| url.strip_prefix(bucket_prefix.as_str()))
        .filter(|key| !key.is_empty())
        .map(|key| key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ls_extracts_keys_in_order() {
        let stdout = "\
2023-01-01 00:00      1024  s3://mybucket/mail_config-202301010000.tar.gz
2023-12-31 00:00      2048  s3://mybucket/mail_config-202312310000.tar.gz
";
        let keys = parse_ls_output(stdout, "mybucket");
        assert_eq!(
            keys,
            vec![
                "mail_config-202301010000.tar.gz",
                "mail_config-202312310000.tar.gz"
            ]
        );
    }

    #[test]
    fn parse_ls_ignores_foreign_lines_and_other_buckets() {
        let stdout = "\
WARNING: something harmless
2023-01-01 00:00      1024  s3://otherbucket/x-202301010000.tar.gz

2023-06-01 00:00      1024  s3://mybucket/x-202306010000.tar.gz
";
        let keys = parse_ls_output(stdout, "mybucket");
        assert_eq!(keys, vec!["x-202306010000.tar.gz"]);
    }

    #[test]
    fn parse_ls_empty_output_is_empty_listing() {
        assert!(parse_ls_output("", "mybucket").is_empty());
    }

    #[test]
    fn missing_program_is_connectivity_error() {
        let store = S3cmdStore::with_program("/nonexistent/s3cmd-for-test");
        let err = store.verify_access("mybucket").unwrap_err();
        assert!(matches!(err, YabuError::Connectivity(_)), "unexpected: {err}");
    }
}
