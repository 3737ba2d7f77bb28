use std::process::{Command, ExitStatus, Output, Stdio};

/// Typed result of a finished external command: exit code plus captured
/// output. Collaborator boundaries return this instead of free text.
#[derive(Debug)]
pub struct CommandResult {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// The exit code for error messages, or "signal" if there was none.
    pub fn code_display(&self) -> String {
        self.code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string())
    }

    fn from_output(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Build a shell command for a user-supplied script string.
pub fn command_for_script(script: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(script);
    cmd
}

/// Run a script through the shell with captured output.
pub fn run_script(script: &str) -> std::io::Result<CommandResult> {
    let output = command_for_script(script)
        .stdin(Stdio::null())
        .output()?;
    Ok(CommandResult::from_output(output))
}

/// Run a script through the shell with inherited stdout/stderr, so hook
/// output goes straight to the operator's terminal or cron mail.
pub fn run_script_status(script: &str) -> std::io::Result<ExitStatus> {
    command_for_script(script).stdin(Stdio::null()).status()
}

/// Run an already-configured `Command` with captured output.
pub fn run_command(cmd: &mut Command) -> std::io::Result<CommandResult> {
    Ok(CommandResult::from_output(cmd.output()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_exit_code() {
        let result = run_script("echo hello").unwrap();
        assert!(result.success());
        assert_eq!(result.code, Some(0));
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn nonzero_exit_is_not_success() {
        let result = run_script("exit 3").unwrap();
        assert!(!result.success());
        assert_eq!(result.code, Some(3));
        assert_eq!(result.code_display(), "3");
    }

    #[test]
    fn captures_stderr() {
        let result = run_script("echo oops >&2; exit 1").unwrap();
        assert_eq!(result.stderr.trim(), "oops");
        assert!(!result.success());
    }
}
