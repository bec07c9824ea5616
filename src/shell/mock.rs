//! Scripted shell runner for testing.
//!
//! Records every command line it is asked to run and answers with queued or
//! pattern-matched outcomes, so translation and lifecycle logic can be tested
//! without `stty` or `mode` on the machine.

use super::{CommandOutcome, ShellRunner};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Default)]
struct ScriptState {
    /// Every command line, in execution order.
    log: Vec<String>,
    /// Outcomes handed out in order before any rule is consulted.
    queued: VecDeque<CommandOutcome>,
    /// `(needle, outcome)` pairs; the first rule whose needle occurs in the
    /// command line wins.
    rules: Vec<(String, CommandOutcome)>,
    /// Answer when neither queue nor rules apply.
    fallback: CommandOutcome,
    /// Make the next `run` fail to spawn.
    spawn_failure: bool,
}

/// [`ShellRunner`] that never starts a process.
///
/// Clones share state, so a test can keep one clone for inspection while the
/// device owns another.
///
/// # Example
/// ```
/// use serialctl::shell::{CommandOutcome, ScriptedShell, ShellRunner};
///
/// let shell = ScriptedShell::new();
/// shell.fail_when("ttyS9", CommandOutcome::failure(1, "no such device"));
///
/// assert!(shell.run("stty -F /dev/ttyS0").unwrap().is_success());
/// assert_eq!(shell.run("stty -F /dev/ttyS9").unwrap().exit_code, 1);
/// assert_eq!(shell.commands(), vec!["stty -F /dev/ttyS0", "stty -F /dev/ttyS9"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedShell {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedShell {
    /// A runner where every command succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for the next command.
    pub fn push_outcome(&self, outcome: CommandOutcome) {
        self.state.lock().queued.push_back(outcome);
    }

    /// Answer with `outcome` whenever a command line contains `needle`.
    pub fn fail_when(&self, needle: impl Into<String>, outcome: CommandOutcome) {
        self.state.lock().rules.push((needle.into(), outcome));
    }

    /// Change the answer used when nothing else matches.
    pub fn set_fallback(&self, outcome: CommandOutcome) {
        self.state.lock().fallback = outcome;
    }

    /// Make the next command fail as if the shell could not be started.
    pub fn fail_next_spawn(&self) {
        self.state.lock().spawn_failure = true;
    }

    /// All command lines run so far.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().log.clone()
    }

    /// The most recent command line, if any.
    pub fn last_command(&self) -> Option<String> {
        self.state.lock().log.last().cloned()
    }

    pub fn clear_log(&self) {
        self.state.lock().log.clear();
    }
}

impl ShellRunner for ScriptedShell {
    fn run(&self, command_line: &str) -> std::io::Result<CommandOutcome> {
        let mut state = self.state.lock();
        state.log.push(command_line.to_string());

        if state.spawn_failure {
            state.spawn_failure = false;
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "shell not available",
            ));
        }

        if let Some(outcome) = state.queued.pop_front() {
            return Ok(outcome);
        }

        let matched = state
            .rules
            .iter()
            .find(|(needle, _)| command_line.contains(needle.as_str()))
            .map(|(_, outcome)| outcome.clone());

        Ok(matched.unwrap_or_else(|| state.fallback.clone()))
    }
}
