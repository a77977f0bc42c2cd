// SPDX-License-Identifier: MIT

//! What to spawn and how to stop it.

use std::collections::HashMap;
use std::path::PathBuf;

/// Signal sent by `Process::interrupt`. Configurable per job (the agent
/// exposes this as `cancel-signal`); default is `Term`, matching most
/// CI bootstrap scripts' expectation of a graceful shutdown request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterruptSignal {
    #[default]
    Term,
    Int,
    Hup,
    Usr1,
    Usr2,
}

#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub dir: PathBuf,
    /// Attach the child to a freshly allocated pseudo-terminal instead of
    /// plain pipes.
    pub pty: bool,
    pub interrupt_signal: InterruptSignal,
}

impl ProcessConfig {
    pub fn new(path: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            env: HashMap::new(),
            dir: dir.into(),
            pty: false,
            interrupt_signal: InterruptSignal::default(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_pty(mut self, pty: bool) -> Self {
        self.pty = pty;
        self
    }
}
