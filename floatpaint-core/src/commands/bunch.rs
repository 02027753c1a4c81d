//! Composite commands, applied and reverted as one.

use super::{Command, CommandContext, CommandKind};

/// Decides whether a freshly pushed bunch may swallow the command pushed right after it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MergeCondition {
    /// A plain composite.
    Never,
    /// Accept a single appendable selection change, and take its name. Used so that
    /// "deselect, then select somewhere else" undoes in one step.
    AppendSelection { appended: bool },
    /// Accept any number of region moves, collapsing them into the bunch's trailing move.
    AppendMoves,
}
impl MergeCondition {
    #[must_use]
    pub fn append_selection() -> Self {
        Self::AppendSelection { appended: false }
    }
    /// Ask whether `next` may be appended. Records the decision where the condition is one-shot.
    pub fn accepts_append(&mut self, next: &Command) -> bool {
        match self {
            Self::Never => false,
            Self::AppendSelection { appended } => {
                if *appended || !next.should_append() {
                    return false;
                }
                *appended = true;
                true
            }
            Self::AppendMoves => next.is_region_move(),
        }
    }
    /// Whether the bunch takes over the name of an appended command.
    #[must_use]
    pub fn adopt_name(&self) -> bool {
        matches!(self, Self::AppendSelection { .. })
    }
}

#[derive(Debug)]
pub struct CommandBunch {
    kind: CommandKind,
    name: String,
    commands: smallvec::SmallVec<[Command; 2]>,
    condition: MergeCondition,
}
impl CommandBunch {
    pub fn new(
        kind: CommandKind,
        name: impl Into<String>,
        commands: impl IntoIterator<Item = Command>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            commands: commands.into_iter().collect(),
            condition: MergeCondition::Never,
        }
    }
    #[must_use]
    pub fn with_condition(self, condition: MergeCondition) -> Self {
        Self { condition, ..self }
    }
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        self.kind
    }
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
    #[must_use]
    pub fn condition(&self) -> MergeCondition {
        self.condition
    }
    #[must_use]
    pub fn document_modifying(&self) -> bool {
        self.commands.iter().any(Command::document_modifying)
    }
    pub fn apply(&mut self, ctx: &mut dyn CommandContext) {
        for command in &mut self.commands {
            command.apply(ctx);
        }
    }
    pub fn revert(&mut self, ctx: &mut dyn CommandContext) {
        for command in self.commands.iter_mut().rev() {
            command.revert(ctx);
        }
    }
    /// Fold an already-applied command into this bunch, if the merge condition allows it.
    /// Hands the command back otherwise.
    pub fn try_append(&mut self, next: Command) -> Result<(), Command> {
        if !self.condition.accepts_append(&next) {
            return Err(next);
        }
        log::trace!("appending {next} to bunch \"{}\"", self.name);
        if self.condition.adopt_name() {
            next.name().clone_into(&mut self.name);
        }
        if next.kind() != self.kind {
            self.kind = CommandKind::Hybrid;
        }
        // Collapse consecutive moves.
        let next = match self.commands.last_mut() {
            Some(last) if self.condition == MergeCondition::AppendMoves && last.is_region_move() => {
                match last.try_merge(next, true) {
                    Ok(()) => return Ok(()),
                    Err(next) => next,
                }
            }
            _ => next,
        };
        self.commands.push(next);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{CommandBunch, MergeCondition};
    use crate::{
        commands::{test_util::TestContext, Command, CommandKind, MoveRegion, SetRegion},
        geom::{Point, Rect, Size},
        selection::SelectionState,
    };
    fn select(rect: Rect, old: &SelectionState) -> Command {
        SetRegion::new("Select Rectangle", SelectionState::fixed(rect), old.clone())
            .appendable()
            .into()
    }
    #[test]
    fn append_selection_once() {
        let fixed = SelectionState::fixed(Rect::new(0, 0, 4, 4));
        let deselect: Command =
            SetRegion::new("Deselect", SelectionState::Empty, fixed.clone()).into();
        let mut bunch = CommandBunch::new(CommandKind::Selection, "Deselect", [deselect])
            .with_condition(MergeCondition::append_selection());

        let first = select(Rect::new(1, 1, 2, 2), &SelectionState::Empty);
        assert!(bunch.try_append(first).is_ok());
        assert_eq!(bunch.name(), "Select Rectangle");
        assert_eq!(bunch.commands().len(), 2);

        // Second offer is refused even though it is appendable.
        let second = select(Rect::new(2, 2, 2, 2), &SelectionState::Empty);
        assert!(bunch.try_append(second).is_err());
        assert_eq!(bunch.commands().len(), 2);
    }
    #[test]
    fn append_selection_refuses_unappendable() {
        let mut bunch = CommandBunch::new(CommandKind::Selection, "Deselect", [])
            .with_condition(MergeCondition::append_selection());
        let plain: Command =
            SetRegion::new("Float", SelectionState::Empty, SelectionState::Empty).into();
        assert!(bunch.try_append(plain).is_err());
        // Refusal doesn't use up the window.
        assert!(bunch
            .try_append(select(Rect::new(0, 0, 1, 1), &SelectionState::Empty))
            .is_ok());
    }
    #[test]
    fn append_moves_collapse() {
        let mut bunch = CommandBunch::new(
            CommandKind::Hybrid,
            "Offset Selection",
            [MoveRegion::new(Point::new(1, 0), Point::ZERO).into()],
        )
        .with_condition(MergeCondition::AppendMoves);
        for x in 2..5 {
            let step = MoveRegion::new(Point::new(x, 0), Point::new(x - 1, 0));
            assert!(bunch.try_append(step.into()).is_ok());
        }
        assert_eq!(bunch.commands().len(), 1);
        assert_eq!(bunch.name(), "Offset Selection");

        let mut ctx = TestContext::patterned(Size::new(8, 8));
        ctx.selection = SelectionState::fixed(Rect::new(0, 0, 2, 2));
        bunch.apply(&mut ctx);
        assert_eq!(ctx.selection.top_left(), Some(Point::new(4, 0)));
        bunch.revert(&mut ctx);
        assert_eq!(ctx.selection.top_left(), Some(Point::ZERO));
    }
    #[test]
    fn nested_bunch() {
        let inner = CommandBunch::new(
            CommandKind::Selection,
            "Inner",
            [MoveRegion::new(Point::new(1, 0), Point::ZERO).into()],
        );
        let mut outer: Command = CommandBunch::new(
            CommandKind::Selection,
            "Outer",
            [inner.into(), MoveRegion::new(Point::new(3, 3), Point::new(1, 0)).into()],
        )
        .into();
        let mut ctx = TestContext::patterned(Size::new(8, 8));
        ctx.selection = SelectionState::fixed(Rect::new(0, 0, 2, 2));
        outer.apply(&mut ctx);
        assert_eq!(ctx.selection.top_left(), Some(Point::new(3, 3)));
        outer.revert(&mut ctx);
        assert_eq!(ctx.selection.top_left(), Some(Point::ZERO));
        assert_eq!(outer.name(), "Outer");
    }
    #[test]
    fn never_accepts() {
        let mut bunch = CommandBunch::new(CommandKind::Raster, "Composite", []);
        let step: Command = MoveRegion::new(Point::new(1, 0), Point::ZERO).into();
        assert!(bunch.try_append(step).is_err());
    }
}
