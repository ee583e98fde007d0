//! Inbound control commands and their dispatch onto workers.
//!
//! Frames look like `{"type": "select", "args": ["<hash>", 2]}`. Commands are
//! fire-and-forget: the outcome is logged and counted but never reported back
//! to the observer that sent it.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use seedwire_torrent_core::{TorrentError, WorkerRegistry};

/// Decoded control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pause the worker's swarm.
    Pause {
        /// Target worker.
        info_hash: String,
    },
    /// Resume the worker's swarm.
    Resume {
        /// Target worker.
        info_hash: String,
    },
    /// Schedule a file for download.
    Select {
        /// Target worker.
        info_hash: String,
        /// File position in the worker's file list.
        file_index: usize,
    },
    /// Unschedule a file.
    Deselect {
        /// Target worker.
        info_hash: String,
        /// File position in the worker's file list.
        file_index: usize,
    },
}

/// Errors raised while decoding an inbound frame.
#[derive(Debug, Error)]
pub enum CommandDecodeError {
    /// Frame was not a JSON command envelope.
    #[error("malformed command frame")]
    Malformed {
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// Frame named a command the relay does not implement.
    #[error("unknown command")]
    UnknownCommand {
        /// Name supplied by the observer.
        name: String,
    },
    /// A positional argument was absent.
    #[error("missing command argument")]
    MissingArgument {
        /// Command being decoded.
        command: &'static str,
        /// Zero-based argument position.
        position: usize,
    },
    /// A positional argument had the wrong shape.
    #[error("invalid command argument")]
    InvalidArgument {
        /// Command being decoded.
        command: &'static str,
        /// Zero-based argument position.
        position: usize,
    },
}

#[derive(Debug, Deserialize)]
struct CommandFrame {
    #[serde(rename = "type")]
    name: String,
    #[serde(default)]
    args: Vec<Value>,
}

impl Command {
    /// Decode a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandDecodeError`] describing why the frame was rejected.
    pub fn decode(text: &str) -> Result<Self, CommandDecodeError> {
        let frame: CommandFrame = serde_json::from_str(text)
            .map_err(|source| CommandDecodeError::Malformed { source })?;
        Self::from_frame(frame)
    }

    /// Command name used in logs and metric labels.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pause { .. } => "pause",
            Self::Resume { .. } => "resume",
            Self::Select { .. } => "select",
            Self::Deselect { .. } => "deselect",
        }
    }

    /// Worker the command targets.
    #[must_use]
    pub fn info_hash(&self) -> &str {
        match self {
            Self::Pause { info_hash }
            | Self::Resume { info_hash }
            | Self::Select { info_hash, .. }
            | Self::Deselect { info_hash, .. } => info_hash,
        }
    }

    /// File position for selection commands.
    #[must_use]
    pub const fn file_index(&self) -> Option<usize> {
        match self {
            Self::Select { file_index, .. } | Self::Deselect { file_index, .. } => {
                Some(*file_index)
            }
            Self::Pause { .. } | Self::Resume { .. } => None,
        }
    }

    fn from_frame(frame: CommandFrame) -> Result<Self, CommandDecodeError> {
        let args = Args {
            values: &frame.args,
            command: "",
        };
        match frame.name.as_str() {
            "pause" => Ok(Self::Pause {
                info_hash: args.named("pause").hash()?,
            }),
            "resume" => Ok(Self::Resume {
                info_hash: args.named("resume").hash()?,
            }),
            "select" => {
                let args = args.named("select");
                Ok(Self::Select {
                    info_hash: args.hash()?,
                    file_index: args.index()?,
                })
            }
            "deselect" => {
                let args = args.named("deselect");
                Ok(Self::Deselect {
                    info_hash: args.hash()?,
                    file_index: args.index()?,
                })
            }
            other => Err(CommandDecodeError::UnknownCommand {
                name: other.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy)]
struct Args<'a> {
    values: &'a [Value],
    command: &'static str,
}

impl Args<'_> {
    const fn named(self, command: &'static str) -> Self {
        Self { command, ..self }
    }

    fn at(&self, position: usize) -> Result<&Value, CommandDecodeError> {
        self.values
            .get(position)
            .ok_or(CommandDecodeError::MissingArgument {
                command: self.command,
                position,
            })
    }

    fn hash(&self) -> Result<String, CommandDecodeError> {
        self.at(0)?
            .as_str()
            .map(str::to_string)
            .ok_or(CommandDecodeError::InvalidArgument {
                command: self.command,
                position: 0,
            })
    }

    fn index(&self) -> Result<usize, CommandDecodeError> {
        self.at(1)?
            .as_u64()
            .and_then(|value| usize::try_from(value).ok())
            .ok_or(CommandDecodeError::InvalidArgument {
                command: self.command,
                position: 1,
            })
    }
}

/// What happened to a dispatched command.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The worker accepted the command.
    Applied,
    /// No worker with the requested info-hash.
    UnknownTorrent,
    /// The worker lacks the swarm or file list the command needs.
    MissingCapability,
    /// The worker refused the command.
    Rejected(TorrentError),
}

impl CommandOutcome {
    /// Label recorded in metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::UnknownTorrent => "unknown_torrent",
            Self::MissingCapability => "missing_capability",
            Self::Rejected(_) => "rejected",
        }
    }
}

/// Apply `command` to the worker it names.
///
/// Unknown workers and missing capabilities are reported as outcomes, not
/// errors; the caller decides how loudly to log them.
///
/// Errors returned by the worker, such as an out-of-range file index, come
/// back intact inside [`CommandOutcome::Rejected`]. The connection logs them
/// at warn level and counts them; observers never see a reply, since
/// commands are fire-and-forget.
#[must_use]
pub fn dispatch_command(registry: &dyn WorkerRegistry, command: &Command) -> CommandOutcome {
    let Some(worker) = registry.get(command.info_hash()) else {
        return CommandOutcome::UnknownTorrent;
    };

    match command {
        Command::Pause { .. } | Command::Resume { .. } => {
            let Some(swarm) = worker.swarm() else {
                return CommandOutcome::MissingCapability;
            };
            if matches!(command, Command::Pause { .. }) {
                swarm.pause();
            } else {
                swarm.resume();
            }
            CommandOutcome::Applied
        }
        Command::Select { file_index, .. } | Command::Deselect { file_index, .. } => {
            let selected = matches!(command, Command::Select { .. });
            match worker.set_file_selected(*file_index, selected) {
                Ok(()) => CommandOutcome::Applied,
                Err(TorrentError::MetadataUnavailable { .. }) => {
                    CommandOutcome::MissingCapability
                }
                Err(err) => CommandOutcome::Rejected(err),
            }
        }
    }
}
