//! Outstanding command table and completion handles.
//!
//! Every submitted command gets a local submission number and a oneshot
//! completion. tmux numbers commands itself, so replies are matched to the
//! oldest command written to the channel: control mode answers strictly in
//! the order commands were received. The tmux number is recorded on the reply.
//!
//! Commands submitted before the connection is attached are deferred. They
//! cannot be matched until they are released and written.

use crate::commands::TmuxCommand;
use crate::error::{Result, TmuxError};
use std::collections::BTreeMap;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

/// Output of a successfully completed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    /// Number tmux assigned to the command (from `%begin`/`%end`)
    pub command_number: u32,
    /// Response lines joined by `\n`
    pub output: String,
}

/// What the manager does with a reply besides fulfilling the handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandKind {
    #[default]
    Generic,
    /// Reply is parsed as `list-windows` output
    ListWindows,
    /// Reply is parsed as `list-sessions` output
    ListSessions,
}

#[derive(Debug)]
struct PendingCommand {
    submission: u64,
    command: String,
    kind: CommandKind,
    sender: oneshot::Sender<Result<CommandReply>>,
}

/// Single-shot completion for a submitted command.
#[derive(Debug)]
pub struct CommandHandle {
    submission: u64,
    receiver: oneshot::Receiver<Result<CommandReply>>,
}

impl CommandHandle {
    /// Local submission number of this command
    pub fn submission(&self) -> u64 {
        self.submission
    }

    /// Wait for the command's reply.
    pub async fn wait(self) -> Result<CommandReply> {
        self.receiver.await.map_err(|_| TmuxError::Dropped)?
    }

    /// Non-blocking poll; `None` while the command is still outstanding.
    pub fn try_result(&mut self) -> Option<Result<CommandReply>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(TmuxError::Dropped)),
        }
    }
}

/// Commands awaiting a `%end`/`%error` block, oldest first.
#[derive(Debug, Default)]
pub struct PendingCommands {
    next_submission: u64,
    next_sequence: u64,
    /// Written commands keyed by write order
    entries: BTreeMap<u64, PendingCommand>,
    /// Submitted but not yet written
    deferred: Vec<PendingCommand>,
}

impl PendingCommands {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(
        &mut self,
        command: &TmuxCommand,
        kind: CommandKind,
    ) -> (PendingCommand, CommandHandle) {
        let submission = self.next_submission;
        self.next_submission += 1;

        let (sender, receiver) = oneshot::channel();
        let entry = PendingCommand {
            submission,
            command: command.as_str().to_string(),
            kind,
            sender,
        };
        (
            entry,
            CommandHandle {
                submission,
                receiver,
            },
        )
    }

    fn push_written(&mut self, entry: PendingCommand) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.insert(sequence, entry);
    }

    /// Record a command about to be written and return its handle.
    pub fn register(&mut self, command: &TmuxCommand, kind: CommandKind) -> CommandHandle {
        let (entry, handle) = self.entry(command, kind);
        self.push_written(entry);
        handle
    }

    /// Hold a command until `release_deferred`; replies never match it
    /// before then.
    pub fn defer(&mut self, command: &TmuxCommand, kind: CommandKind) -> CommandHandle {
        let (entry, handle) = self.entry(command, kind);
        crate::debug_log!("TMUX", "Deferring until attached: {}", entry.command);
        self.deferred.push(entry);
        handle
    }

    /// Move deferred commands behind everything already written.
    ///
    /// Returns `(submission, command text)` in the order they must be sent.
    pub fn release_deferred(&mut self) -> Vec<(u64, TmuxCommand)> {
        let deferred = std::mem::take(&mut self.deferred);
        let mut released = Vec::with_capacity(deferred.len());
        for entry in deferred {
            released.push((entry.submission, TmuxCommand::raw(entry.command.clone())));
            self.push_written(entry);
        }
        released
    }

    /// Withdraw a command that never reached the channel.
    pub fn cancel(&mut self, submission: u64, error: TmuxError) {
        let entry = if let Some(index) = self
            .deferred
            .iter()
            .position(|entry| entry.submission == submission)
        {
            Some(self.deferred.remove(index))
        } else {
            let sequence = self
                .entries
                .iter()
                .find(|(_, entry)| entry.submission == submission)
                .map(|(sequence, _)| *sequence);
            sequence.and_then(|sequence| self.entries.remove(&sequence))
        };
        if let Some(entry) = entry {
            let _ = entry.sender.send(Err(error));
        }
    }

    /// Fulfil the oldest written command with a block's outcome.
    ///
    /// `outcome` is the block body, `Ok` for `%end` and `Err` for `%error`.
    /// Returns the command's kind, or `None` when nothing was outstanding.
    pub fn complete(
        &mut self,
        command_number: u32,
        outcome: std::result::Result<String, String>,
    ) -> Option<CommandKind> {
        let (_, entry) = self.entries.pop_first()?;
        crate::debug_trace!(
            "TMUX",
            "Command {} ({}) completed, ok={}",
            command_number,
            entry.command,
            outcome.is_ok()
        );

        let result = match outcome {
            Ok(output) => Ok(CommandReply {
                command_number,
                output,
            }),
            Err(message) => Err(TmuxError::CommandFailed {
                command_number,
                message,
            }),
        };
        if entry.sender.send(result).is_err() {
            crate::debug_trace!("TMUX", "Handle for '{}' was dropped", entry.command);
        }
        Some(entry.kind)
    }

    /// Fail every outstanding command, deferred ones included, with `error`.
    pub fn fail_all(&mut self, error: TmuxError) {
        let entries = std::mem::take(&mut self.entries);
        let deferred = std::mem::take(&mut self.deferred);
        let count = entries.len() + deferred.len();
        if count > 0 {
            crate::debug_info!("TMUX", "Failing {} pending commands: {}", count, error);
        }
        for entry in entries.into_values().chain(deferred) {
            let _ = entry.sender.send(Err(error.clone()));
        }
    }

    /// Raw text of outstanding commands in send order, deferred ones last
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.entries
            .values()
            .chain(self.deferred.iter())
            .map(|entry| entry.command.as_str())
    }

    /// Number of commands waiting to be written
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.deferred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.deferred.is_empty()
    }
}
