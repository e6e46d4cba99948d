//! Clipboard sink for generated prompts.

use std::fmt;
use std::io::Write;
use std::process::{Child, Command, Stdio};
#[cfg(all(unix, not(target_os = "macos")))]
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};

/// External program that reads clipboard contents from stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeCommand {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

#[cfg(target_os = "macos")]
const PIPE_COMMANDS: &[PipeCommand] = &[PipeCommand {
    program: "pbcopy",
    args: &[],
}];

#[cfg(all(unix, not(target_os = "macos")))]
const PIPE_COMMANDS: &[PipeCommand] = &[
    PipeCommand {
        program: "wl-copy",
        args: &[],
    },
    PipeCommand {
        program: "xclip",
        args: &["-selection", "clipboard"],
    },
    PipeCommand {
        program: "xsel",
        args: &["--clipboard", "--input"],
    },
];

#[cfg(target_os = "windows")]
const PIPE_COMMANDS: &[PipeCommand] = &[PipeCommand {
    program: "clip.exe",
    args: &[],
}];

#[cfg(not(any(unix, target_os = "windows")))]
const PIPE_COMMANDS: &[PipeCommand] = &[];

/// X11 and Wayland selections die with the owning process, while the pipe commands leave a
/// background owner behind. Those platforms try the commands before the in-process clipboard.
const COMMANDS_FIRST: bool = cfg!(all(unix, not(target_os = "macos")));

/// How long the in-process clipboard keeps serving the selection before the process exits.
#[cfg(all(unix, not(target_os = "macos")))]
const SELECTION_LINGER: Duration = Duration::from_secs(2);

/// Which mechanism accepted the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    System,
    Command(&'static str),
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::System => f.write_str("system clipboard"),
            Backend::Command(program) => write!(f, "{program}"),
        }
    }
}

/// Copies text via `arboard`, falling back to platform clipboard commands.
pub struct Clipboard {
    system: Option<arboard::Clipboard>,
    commands: &'static [PipeCommand],
    commands_first: bool,
}

impl Clipboard {
    pub fn new() -> Self {
        let system = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                tracing::debug!(error = %err, "system clipboard unavailable");
                None
            }
        };
        Self {
            system,
            commands: PIPE_COMMANDS,
            commands_first: COMMANDS_FIRST,
        }
    }

    /// Copy `text`, returning the backend that took it.
    pub fn copy(&mut self, text: &str) -> Result<Backend> {
        if self.commands_first {
            if let Some(backend) = self.copy_with_commands(text) {
                return Ok(backend);
            }
            if self.copy_with_system(text) {
                return Ok(Backend::System);
            }
        } else {
            if self.copy_with_system(text) {
                return Ok(Backend::System);
            }
            if let Some(backend) = self.copy_with_commands(text) {
                return Ok(backend);
            }
        }

        Err(anyhow!("no clipboard backend accepted the prompt"))
    }

    fn copy_with_system(&mut self, text: &str) -> bool {
        let Some(system) = self.system.as_mut() else {
            return false;
        };
        match set_system_text(system, text) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(error = %err, "system clipboard rejected text");
                self.system = None;
                false
            }
        }
    }

    fn copy_with_commands(&self, text: &str) -> Option<Backend> {
        for command in self.commands {
            match pipe_to(command, text) {
                Ok(()) => return Some(Backend::Command(command.program)),
                Err(err) => {
                    tracing::debug!(program = command.program, error = %err, "clipboard command failed")
                }
            }
        }
        None
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn set_system_text(system: &mut arboard::Clipboard, text: &str) -> Result<(), arboard::Error> {
    use arboard::SetExtLinux;

    // Serve the selection briefly so a clipboard manager can take it over before exit.
    system
        .set()
        .wait_until(Instant::now() + SELECTION_LINGER)
        .text(text.to_owned())
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn set_system_text(system: &mut arboard::Clipboard, text: &str) -> Result<(), arboard::Error> {
    system.set_text(text.to_owned())
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

fn pipe_to(command: &PipeCommand, text: &str) -> Result<()> {
    let mut child = Command::new(command.program)
        .args(command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn {}", command.program))?;

    // Dropping stdin closes the pipe so the command sees end of input.
    if let Some(mut stdin) = child.stdin.take()
        && let Err(err) = stdin.write_all(text.as_bytes())
    {
        drop(stdin);
        reap(&mut child, command.program);
        return Err(err).with_context(|| format!("failed to write to {}", command.program));
    }

    let status = child
        .wait()
        .with_context(|| format!("{} did not exit cleanly", command.program))?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("{} exited with {status}", command.program))
    }
}

fn reap(child: &mut Child, program: &str) {
    if let Err(err) = child.kill() {
        tracing::debug!(program, error = %err, "failed to kill clipboard command");
    }
    if let Err(err) = child.wait() {
        tracing::debug!(program, error = %err, "failed to wait for clipboard command");
    }
}
