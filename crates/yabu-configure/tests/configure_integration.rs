//! Runs the `yabu-configure` binary against a throwaway control file and cron
//! root, checking the on-disk results of each invocation.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

struct ConfigureFixture {
    _tmp: TempDir,
    control_file: PathBuf,
    cron_root: PathBuf,
}

impl ConfigureFixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let control_file = tmp.path().join("control.yml");
        let cron_root = tmp.path().join("etc");
        fs::write(&control_file, "{}\n").unwrap();
        fs::create_dir_all(cron_root.join("cron.daily")).unwrap();
        fs::create_dir_all(cron_root.join("cron.hourly")).unwrap();

        Self {
            _tmp: tmp,
            control_file,
            cron_root,
        }
    }

    fn run(&self, extra: &[&str]) -> Output {
        let control = self.control_file.display().to_string();
        let cron_root = self.cron_root.display().to_string();
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_yabu-configure"));
        cmd.args([
            "--control-file",
            &control,
            "--cron-root",
            &cron_root,
        ])
        .args(extra);
        cmd.output().unwrap()
    }

    fn control_contents(&self) -> String {
        fs::read_to_string(&self.control_file).unwrap()
    }

    fn cron_entry(&self, frequency: &str, name: &str) -> PathBuf {
        self.cron_root
            .join(format!("cron.{frequency}"))
            .join(format!("{name}_backup"))
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn configure_records_definition_and_installs_cron_entry() {
    let fixture = ConfigureFixture::new();

    let output = fixture.run(&[
        "--bucket",
        "yet-another-server-mail-config",
        "--backup-name",
        "mail_config",
        "--daily",
        "--files",
        "/etc/mail,/etc/aliases",
        "--max-backups",
        "7",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let control: serde_yaml::Value =
        serde_yaml::from_str(&fixture.control_contents()).unwrap();
    let def = &control["mail_config"];
    assert_eq!(def["files"][0], "/etc/mail");
    assert_eq!(def["files"][1], "/etc/aliases");
    assert_eq!(def["maxbackups"][0], 7);

    let entry = fixture.cron_entry("daily", "mail_config");
    let script = fs::read_to_string(&entry).unwrap();
    assert!(script.starts_with("#!/bin/sh"));
    assert!(script.contains("--bucket yet-another-server-mail-config"));
    assert!(script.contains("--backup-name mail_config"));
    assert!(!script.contains("@@"), "leftover tokens: {script}");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&entry).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700, "mode was {mode:o}");
    }
}

#[test]
fn reconfiguring_overwrites_the_existing_definition() {
    let fixture = ConfigureFixture::new();

    let first = fixture.run(&[
        "--bucket", "b", "--backup-name", "mail_config", "--daily", "--files", "/etc/mail",
    ]);
    assert!(first.status.success(), "stderr: {}", stderr(&first));

    let second = fixture.run(&[
        "--bucket",
        "b",
        "--backup-name",
        "mail_config",
        "--hourly",
        "--files",
        "/etc/postfix",
        "--max-backups",
        "3",
        "--preflight",
        "/usr/local/bin/dump_db.sh",
    ]);
    assert!(second.status.success(), "stderr: {}", stderr(&second));

    let control: serde_yaml::Value =
        serde_yaml::from_str(&fixture.control_contents()).unwrap();
    let def = &control["mail_config"];
    assert_eq!(def["files"][0], "/etc/postfix");
    assert_eq!(def["maxbackups"][0], 3);
    assert_eq!(def["preflight"], "/usr/local/bin/dump_db.sh");

    assert!(fixture.cron_entry("hourly", "mail_config").exists());
}

#[test]
fn custom_skel_file_is_used_verbatim() {
    let fixture = ConfigureFixture::new();
    let skel = fixture._tmp.path().join("skel");
    fs::write(
        &skel,
        "#!/bin/sh\nlogger backup-start\n@@RUNNER_PATH@@ -b @@BUCKET@@ -n @@BACKUP_NAME@@\n",
    )
    .unwrap();
    let skel_arg = skel.display().to_string();

    let output = fixture.run(&[
        "--bucket",
        "b",
        "--backup-name",
        "mail_config",
        "--daily",
        "--files",
        "/etc/mail",
        "--skel-file",
        &skel_arg,
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let script = fs::read_to_string(fixture.cron_entry("daily", "mail_config")).unwrap();
    assert!(script.contains("logger backup-start"));
    assert!(script.contains("-b b -n mail_config"));
}

#[test]
fn skel_with_unknown_tokens_is_rejected() {
    let fixture = ConfigureFixture::new();
    let before = fixture.control_contents();
    let skel = fixture._tmp.path().join("skel");
    fs::write(&skel, "#!/bin/sh\n@@RUNNER@@ -b @@BUCKET@@ -n @@NAME@@\n").unwrap();
    let skel_arg = skel.display().to_string();

    let output = fixture.run(&[
        "--bucket",
        "b",
        "--backup-name",
        "mail_config",
        "--daily",
        "--files",
        "/etc/mail",
        "--skel-file",
        &skel_arg,
    ]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("unrecognized tokens"),
        "stderr: {}",
        stderr(&output)
    );
    assert_eq!(fixture.control_contents(), before);
    assert!(!fixture.cron_entry("daily", "mail_config").exists());
}

#[test]
fn zero_max_backups_is_rejected() {
    let fixture = ConfigureFixture::new();
    let before = fixture.control_contents();

    let output = fixture.run(&[
        "--bucket",
        "b",
        "--backup-name",
        "mail_config",
        "--daily",
        "--files",
        "/etc/mail",
        "--max-backups",
        "0",
    ]);
    assert!(!output.status.success());
    assert_eq!(fixture.control_contents(), before);
}

#[test]
fn non_numeric_max_backups_is_rejected() {
    let fixture = ConfigureFixture::new();
    let before = fixture.control_contents();

    let output = fixture.run(&[
        "--bucket",
        "b",
        "--backup-name",
        "mail_config",
        "--daily",
        "--files",
        "/etc/mail",
        "--max-backups",
        "fourteen",
    ]);
    assert!(!output.status.success());
    assert_eq!(fixture.control_contents(), before);
    assert!(!fixture.cron_entry("daily", "mail_config").exists());
}

#[test]
fn template_delimiter_in_bucket_fails_without_touching_anything() {
    let fixture = ConfigureFixture::new();
    let before = fixture.control_contents();

    let output = fixture.run(&[
        "--bucket",
        "evil@@BUCKET@@",
        "--backup-name",
        "mail_config",
        "--daily",
        "--files",
        "/etc/mail",
    ]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("invalid input"),
        "stderr: {}",
        stderr(&output)
    );
    assert_eq!(fixture.control_contents(), before);
    assert!(!fixture.cron_entry("daily", "mail_config").exists());
}

#[test]
fn missing_control_file_fails_with_a_hint() {
    let fixture = ConfigureFixture::new();
    fs::remove_file(&fixture.control_file).unwrap();

    let output = fixture.run(&[
        "--bucket", "b", "--backup-name", "mail_config", "--daily", "--files", "/etc/mail",
    ]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("control file"),
        "stderr: {}",
        stderr(&output)
    );
    assert!(!fixture.cron_entry("daily", "mail_config").exists());
}

#[test]
fn frequency_flag_is_required_and_exclusive() {
    let fixture = ConfigureFixture::new();

    let none = fixture.run(&[
        "--bucket", "b", "--backup-name", "x", "--files", "/etc/mail",
    ]);
    assert!(!none.status.success());

    let both = fixture.run(&[
        "--bucket", "b", "--backup-name", "x", "--daily", "--weekly", "--files", "/etc/mail",
    ]);
    assert!(!both.status.success());
    assert!(
        stderr(&both).contains("cannot be used with"),
        "stderr: {}",
        stderr(&both)
    );
}
