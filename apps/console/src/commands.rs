//! Console commands standing in for the page's buttons and forms.

use std::sync::Arc;

use client_core::{MutationError, RenderedView, SyncController, WorkflowMode};
use shared::domain::{EntryDraft, EntryId, SortOrder};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

pub const HELP: &str = "\
commands:
  add <name> | <message>     submit a new entry
  edit <id>                  open the edit form for a listed entry
  fields <name> | <message>  change the open edit form
  save                       submit the edit form
  delete <id>                ask to purge a listed entry
  confirm                    confirm the pending purge
  cancel                     close the open form or confirmation
  sort asc|desc              change sort order
  refresh                    refresh entries, stats and health now
  show                       print the dashboard again
  help                       print this help
  quit                       exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Add { draft: EntryDraft },
    Edit { id: EntryId },
    Fields { draft: EntryDraft },
    Save,
    Delete { id: EntryId },
    Confirm,
    Cancel,
    Sort { order: SortOrder },
    Refresh,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`; type `help`")]
    Unknown(String),
    #[error("`{command}` needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("`{command}`: {value:?} is not {expected}")]
    InvalidArgument {
        command: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Splits `<name> | <message>`; a missing separator leaves the message empty
/// so the coordinator's validation reports it.
fn parse_draft(rest: &str) -> EntryDraft {
    match rest.split_once('|') {
        Some((name, message)) => EntryDraft::new(name, message),
        None => EntryDraft::new(rest, ""),
    }
}

fn parse_id(command: &'static str, rest: &str) -> Result<EntryId, CommandError> {
    if rest.trim().is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            expected: "an entry id",
        });
    }
    rest.parse().map_err(|_| CommandError::InvalidArgument {
        command,
        value: rest.trim().to_string(),
        expected: "an entry id",
    })
}

/// Parses one input line; blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    let command = match word.to_ascii_lowercase().as_str() {
        "add" => ConsoleCommand::Add {
            draft: parse_draft(rest),
        },
        "edit" => ConsoleCommand::Edit {
            id: parse_id("edit", rest)?,
        },
        "fields" => ConsoleCommand::Fields {
            draft: parse_draft(rest),
        },
        "save" => ConsoleCommand::Save,
        "delete" | "purge" => ConsoleCommand::Delete {
            id: parse_id("delete", rest)?,
        },
        "confirm" | "yes" => ConsoleCommand::Confirm,
        "cancel" | "no" => ConsoleCommand::Cancel,
        "sort" => {
            if rest.trim().is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "sort",
                    expected: "asc or desc",
                });
            }
            ConsoleCommand::Sort {
                order: rest.parse().map_err(|_| CommandError::InvalidArgument {
                    command: "sort",
                    value: rest.trim().to_string(),
                    expected: "asc or desc",
                })?,
            }
        }
        "refresh" => ConsoleCommand::Refresh,
        "show" | "ls" => ConsoleCommand::Show,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn command_name(cmd: &ConsoleCommand) -> &'static str {
    match cmd {
        ConsoleCommand::Add { .. } => "add",
        ConsoleCommand::Edit { .. } => "edit",
        ConsoleCommand::Fields { .. } => "fields",
        ConsoleCommand::Save => "save",
        ConsoleCommand::Delete { .. } => "delete",
        ConsoleCommand::Confirm => "confirm",
        ConsoleCommand::Cancel => "cancel",
        ConsoleCommand::Sort { .. } => "sort",
        ConsoleCommand::Refresh => "refresh",
        ConsoleCommand::Show => "show",
        ConsoleCommand::Help => "help",
        ConsoleCommand::Quit => "quit",
    }
}

/// Validation and transport failures already surface as notices; only
/// workflow conflicts need a status line of their own.
fn describe_failure(err: &MutationError) -> Option<String> {
    match err {
        MutationError::Validation(_) | MutationError::Transport(_) => None,
        MutationError::WorkflowBusy { active, target } => Some(match active {
            WorkflowMode::ConfirmDelete => {
                format!("Purge of entry {target} is awaiting `confirm` or `cancel`.")
            }
            _ => format!("Entry {target} is being edited; `save` or `cancel` first."),
        }),
        MutationError::NoActiveWorkflow { expected } => Some(match expected {
            WorkflowMode::ConfirmDelete => "Nothing to confirm.".to_string(),
            _ => "No edit form is open; use `edit <id>` first.".to_string(),
        }),
    }
}

/// Runs a command against the controller. `view` is what is currently on
/// screen; edit and delete only accept entries listed there.
pub async fn dispatch(
    controller: &SyncController,
    view: &RenderedView,
    cmd: ConsoleCommand,
    status: &mut String,
) {
    debug!(command = command_name(&cmd), "dispatching console command");
    let coordinator = controller.coordinator();

    let result = match cmd {
        ConsoleCommand::Add { draft } => {
            coordinator.set_create_form(draft).await;
            coordinator.submit_create().await
        }
        ConsoleCommand::Edit { id } => match view.find(id) {
            Some(rendered) => {
                let prefill = rendered.edit_prefill();
                let opened = coordinator.open_edit(id, prefill.clone()).await;
                if opened.is_ok() {
                    *status = format!(
                        "Editing entry {id} (name: {:?}, message: {:?}). Use `fields <name> | <message>`, then `save` or `cancel`.",
                        prefill.name, prefill.message
                    );
                }
                opened
            }
            None => {
                *status = format!("Entry {id} is not listed.");
                return;
            }
        },
        ConsoleCommand::Fields { draft } => coordinator.set_edit_fields(draft).await,
        ConsoleCommand::Save => coordinator.submit_edit().await,
        ConsoleCommand::Delete { id } => {
            if view.find(id).is_none() {
                *status = format!("Entry {id} is not listed.");
                return;
            }
            let opened = coordinator.open_delete(id).await;
            if opened.is_ok() {
                *status = format!("Purge entry {id}? Type `confirm` or `cancel`.");
            }
            opened
        }
        ConsoleCommand::Confirm => coordinator.confirm_delete().await,
        ConsoleCommand::Cancel => {
            if coordinator.cancel().await == WorkflowMode::None {
                *status = "Nothing to cancel.".to_string();
            }
            Ok(())
        }
        ConsoleCommand::Sort { order } => {
            controller.store().set_sort_order(order);
            Ok(())
        }
        ConsoleCommand::Refresh => {
            controller.store().refresh_all().await;
            Ok(())
        }
        ConsoleCommand::Show | ConsoleCommand::Help | ConsoleCommand::Quit => Ok(()),
    };

    if let Err(err) = result {
        debug!(error = %err, "console command failed");
        if let Some(text) = describe_failure(&err) {
            *status = text;
        }
    }
}

/// A command together with the list that was on display when it was typed.
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    pub cmd: ConsoleCommand,
    pub view: RenderedView,
}

/// Runs queued commands one at a time off the input loop, sending back each
/// non-empty status line. The worker exits once the command sender is dropped.
pub fn spawn_command_worker(
    controller: Arc<SyncController>,
) -> (
    mpsc::UnboundedSender<QueuedCommand>,
    mpsc::UnboundedReceiver<String>,
) {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<QueuedCommand>();
    let (status_tx, status_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(QueuedCommand { cmd, view }) = cmd_rx.recv().await {
            let mut status = String::new();
            dispatch(&controller, &view, cmd, &mut status).await;
            if !status.is_empty() && status_tx.send(status).is_err() {
                break;
            }
        }
        debug!("command worker stopped");
    });
    (cmd_tx, status_rx)
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
