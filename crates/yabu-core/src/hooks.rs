use crate::error::{Result, YabuError};
use crate::shell;

/// Which side of archive creation a hook runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Preflight,
    Postflight,
}

impl HookStage {
    pub fn as_str(self) -> &'static str {
        match self {
            HookStage::Preflight => "preflight",
            HookStage::Postflight => "postflight",
        }
    }
}

/// Run one optional hook command through the shell. Hook output is inherited
/// so it reaches the operator's terminal or cron mail directly. A non-zero
/// exit is fatal to the run.
pub fn run_hook(stage: HookStage, command: Option<&str>) -> Result<()> {
    let Some(command) = command else {
        return Ok(());
    };
    tracing::info!("running {} hook: {command}", stage.as_str());
    let status = shell::run_script_status(command).map_err(|e| {
        YabuError::Hook(format!(
            "{} hook '{command}' failed to start: {e}",
            stage.as_str()
        ))
    })?;
    if !status.success() {
        let code = status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        return Err(YabuError::Hook(format!(
            "{} hook '{command}' exited with {code}",
            stage.as_str()
        )));
    }
    Ok(())
}
