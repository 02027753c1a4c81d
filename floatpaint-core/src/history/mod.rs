//! # History
//!
//! A linear undo/redo stack of applied [`Command`]s. Pushing applies the command to its target frame
//! and then tries to fold it into the entry on top of the stack:
//!
//! * A freshly pushed [bunch](crate::commands::CommandBunch) is offered the commands that follow it,
//!   until it first refuses one.
//! * Otherwise the top command is offered a merge ([`Command::try_merge`]).
//! * Otherwise it becomes a new entry.
//!
//! Groups collect everything pushed between [`History::open_group`] and [`History::close_group`] into
//! one entry, undone and redone as a single step. Nothing ever merges across a group boundary.

use crate::{
    commands::{Command, CommandID, Contexts, Variant},
    state::FrameID,
};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    #[error("no group is open")]
    NoOpenGroup,
    #[error("frame {0} does not exist")]
    UnknownFrame(FrameID),
}

#[derive(Debug)]
enum Entry {
    Command { target: FrameID, command: Command },
    Group { name: String, entries: Vec<Entry> },
}
impl Entry {
    fn name(&self) -> &str {
        match self {
            Self::Command { command, .. } => command.name(),
            Self::Group { name, .. } => name,
        }
    }
    /// ID of the most recent document-modifying command within this entry.
    fn last_modifying(&self) -> Option<CommandID> {
        match self {
            Self::Command { command, .. } => {
                command.document_modifying().then(|| command.id())
            }
            Self::Group { entries, .. } => last_modifying(entries),
        }
    }
    fn apply(&mut self, contexts: &mut dyn Contexts) {
        match self {
            Self::Command { target, command } => match contexts.context(*target) {
                Some(ctx) => command.apply(ctx),
                None => missing_target(*target, command),
            },
            Self::Group { entries, .. } => {
                for entry in entries {
                    entry.apply(contexts);
                }
            }
        }
    }
    fn revert(&mut self, contexts: &mut dyn Contexts) {
        match self {
            Self::Command { target, command } => match contexts.context(*target) {
                Some(ctx) => command.revert(ctx),
                None => missing_target(*target, command),
            },
            Self::Group { entries, .. } => {
                for entry in entries.iter_mut().rev() {
                    entry.revert(contexts);
                }
            }
        }
    }
    /// Drop every command targeting `target`. Returns false if nothing is left of this entry.
    fn retain_targets(&mut self, target: FrameID) -> bool {
        match self {
            Self::Command { target: t, .. } => *t != target,
            Self::Group { entries, .. } => {
                entries.retain_mut(|entry| entry.retain_targets(target));
                !entries.is_empty()
            }
        }
    }
}

fn last_modifying(entries: &[Entry]) -> Option<CommandID> {
    entries.iter().rev().find_map(Entry::last_modifying)
}

fn missing_target(target: FrameID, command: &Command) {
    debug_assert!(false, "{command} targets missing frame {target}");
    log::error!("{command} targets missing frame {target}, skipped");
}

/// What happened to a pushed command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pushed {
    /// Became a new undo step.
    New,
    /// Appended to the bunch on top of the stack.
    Appended,
    /// Merged into the command on top of the stack.
    Merged,
}

#[derive(Debug)]
pub struct History {
    undo: Vec<Entry>,
    redo: Vec<Entry>,
    /// Groups currently open, innermost last.
    open: Vec<(String, Vec<Entry>)>,
    /// Whether the top entry is a bunch still accepting appends.
    append_open: bool,
    /// The most recent modifying command at the time of the last save. `None` if that state
    /// can no longer be reached.
    saved: Option<Option<CommandID>>,
}
impl Default for History {
    fn default() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            open: Vec::new(),
            append_open: false,
            // A new document starts out saved.
            saved: Some(None),
        }
    }
}
impl History {
    /// The list that pushes go to - the innermost open group, or the stack itself.
    fn current(&mut self) -> &mut Vec<Entry> {
        match self.open.last_mut() {
            Some((_, entries)) => entries,
            None => &mut self.undo,
        }
    }
    fn last_modifying(&self) -> Option<CommandID> {
        // Open groups are the most recent.
        self.open
            .iter()
            .rev()
            .find_map(|(_, entries)| last_modifying(entries))
            .or_else(|| last_modifying(&self.undo))
    }
    /// Apply `command` to `target` and record it.
    ///
    /// Clears the redo stack. The command is dropped unapplied if the target doesn't exist.
    pub fn push(
        &mut self,
        mut command: Command,
        target: FrameID,
        contexts: &mut dyn Contexts,
    ) -> Result<Pushed, HistoryError> {
        let ctx = contexts
            .context(target)
            .ok_or(HistoryError::UnknownFrame(target))?;
        command.apply(ctx);
        self.redo.clear();

        let modifying = command.document_modifying();
        let append_open = self.append_open;
        let entries = self.current();
        let top_modifying = entries.last().and_then(Entry::last_modifying);

        let pushed = match entries.last_mut() {
            Some(Entry::Command {
                target: top_target,
                command: top,
            }) => {
                let same_target = *top_target == target;
                // Bunch window first, then plain merging.
                let command = match top.bunch_mut() {
                    Some(bunch) if append_open && same_target => bunch.try_append(command),
                    _ => Err(command),
                };
                match command {
                    Ok(()) => Ok(Pushed::Appended),
                    Err(command) => top
                        .try_merge(command, same_target)
                        .map(|()| Pushed::Merged),
                }
            }
            _ => Err(command),
        };
        let pushed = match pushed {
            Ok(pushed) => pushed,
            Err(command) => {
                let is_bunch = matches!(command.variant(), Variant::Bunch(_));
                self.current().push(Entry::Command { target, command });
                self.append_open = is_bunch;
                return Ok(Pushed::New);
            }
        };
        if pushed == Pushed::Merged {
            self.append_open = false;
        }
        // The saved state had the top entry as it was before this was folded in.
        if modifying && top_modifying.is_some() && self.saved == Some(top_modifying) {
            self.saved = None;
        }
        Ok(pushed)
    }
    /// Revert the most recent step. Closes any open groups first.
    pub fn undo(&mut self, contexts: &mut dyn Contexts) -> Result<(), HistoryError> {
        while !self.open.is_empty() {
            self.close_group()?;
        }
        let mut entry = self.undo.pop().ok_or(HistoryError::NothingToUndo)?;
        log::debug!("undo \"{}\"", entry.name());
        entry.revert(contexts);
        self.redo.push(entry);
        self.append_open = false;
        Ok(())
    }
    /// Re-apply the most recently undone step.
    pub fn redo(&mut self, contexts: &mut dyn Contexts) -> Result<(), HistoryError> {
        let mut entry = self.redo.pop().ok_or(HistoryError::NothingToRedo)?;
        log::debug!("redo \"{}\"", entry.name());
        entry.apply(contexts);
        self.current().push(entry);
        self.append_open = false;
        Ok(())
    }
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty() || self.open.iter().any(|(_, entries)| !entries.is_empty())
    }
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
    /// Start collecting pushes into one step. Groups nest.
    pub fn open_group(&mut self, name: impl Into<String>) {
        let name = name.into();
        log::trace!("open group \"{name}\"");
        self.open.push((name, Vec::new()));
        self.append_open = false;
    }
    /// Finish the innermost group. A group with nothing in it leaves nothing behind.
    pub fn close_group(&mut self) -> Result<(), HistoryError> {
        let (name, entries) = self.open.pop().ok_or(HistoryError::NoOpenGroup)?;
        log::trace!("close group \"{name}\" with {} entries", entries.len());
        if !entries.is_empty() {
            self.current().push(Entry::Group { name, entries });
        }
        self.append_open = false;
        Ok(())
    }
    #[must_use]
    pub fn group_depth(&self) -> usize {
        self.open.len()
    }
    /// Name of the step [`Self::undo`] would revert.
    #[must_use]
    pub fn undo_name(&self) -> Option<&str> {
        self.open
            .iter()
            .rev()
            .find(|(_, entries)| !entries.is_empty())
            .map(|(name, _)| name.as_str())
            .or_else(|| self.undo.last().map(Entry::name))
    }
    #[must_use]
    pub fn redo_name(&self) -> Option<&str> {
        self.redo.last().map(Entry::name)
    }
    /// Number of undo steps, not counting open groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.undo.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.undo.is_empty() && self.redo.is_empty() && self.open.is_empty()
    }
    /// Remember the current state as the saved one.
    pub fn mark_saved(&mut self) {
        self.saved = Some(self.last_modifying());
    }
    /// Whether the document differs from the last saved state.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.saved != Some(self.last_modifying())
    }
    /// Drop all steps acting on `target`, after it was removed.
    pub fn forget(&mut self, target: FrameID) {
        let before = self.undo.len() + self.redo.len();
        self.undo.retain_mut(|entry| entry.retain_targets(target));
        self.redo.retain_mut(|entry| entry.retain_targets(target));
        for (_, entries) in &mut self.open {
            entries.retain_mut(|entry| entry.retain_targets(target));
        }
        self.append_open = false;
        log::debug!(
            "forgot {} steps of {target}",
            before - (self.undo.len() + self.redo.len())
        );
    }
}
