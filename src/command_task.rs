//! Callback that runs an external command on every tick

use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct CommandTask {
    program: String,
    args: Vec<String>,
}

impl CommandTask {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a `[program, args...]` list as found in settings.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("Command is empty"))?;
        Ok(Self::new(program.clone(), args.to_vec()))
    }

    /// Run the command to completion. A non-zero exit is an error.
    pub fn run(&self) -> Result<()> {
        debug!("Running {} {:?}", self.program, self.args);
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .with_context(|| format!("Failed to spawn {}", self.program))?;

        if !status.success() {
            bail!("{} exited with {}", self.program, status);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_argv() {
        let argv = vec!["echo".to_string(), "a".to_string(), "b".to_string()];
        let task = CommandTask::from_argv(&argv).unwrap();
        assert_eq!(task.program, "echo");
        assert_eq!(task.args, vec!["a", "b"]);
    }

    #[test]
    fn test_from_empty_argv() {
        assert!(CommandTask::from_argv(&[]).is_err());
    }

    #[test]
    fn test_missing_program_fails() {
        let task = CommandTask::new("minicron-no-such-program", Vec::new());
        let err = task.run().unwrap_err();
        assert!(err.to_string().contains("Failed to spawn"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status() {
        assert!(CommandTask::new("true", Vec::new()).run().is_ok());

        let err = CommandTask::new("false", Vec::new()).run().unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }
}
