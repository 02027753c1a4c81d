//! # Commands
//!
//! Commands are the only way the content of a frame changes. Every edit - drawing, selecting, floating,
//! stamping - is expressed as a [`Command`] which knows how to apply itself to a [`CommandContext`] and how
//! to revert itself again. Commands are recorded by the [`History`](crate::history::History), which may fuse
//! adjacent commands together.

pub mod bunch;
pub mod draw;

pub use bunch::{CommandBunch, MergeCondition};
pub use draw::{Draw, DrawCommand, ResizeCanvas};
pub use selection_commands::{MoveRegion, SetOptions, SetRegion, StampFloating};

use crate::{
    bitmap::{Bitmap, BlitOptions, Snapshot},
    color::Color,
    geom::{Point, Rect, Size},
    selection::{commands as selection_commands, SelectionOptions, SelectionState},
    state::FrameID,
};

pub type CommandID = crate::UniqueID<Command>;

/// What part of the document a command touches. Determines how it can be reversed.
#[derive(strum::AsRefStr, strum::EnumIter, PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub enum CommandKind {
    /// Structured edits, reversed by restoring the previous value.
    Vector,
    /// Direct pixel mutation. Reversed by repainting captured pixels.
    Raster,
    /// Only the selection metadata, never the pixels of the canvas.
    Selection,
    /// Both raster and selection changes.
    Hybrid,
}
impl CommandKind {
    /// Can be undone purely by restoring structured values.
    #[must_use]
    pub fn fully_reversible(self) -> bool {
        matches!(self, Self::Vector | Self::Selection)
    }
    /// Contains at least one step which paints the canvas.
    #[must_use]
    pub fn has_raster_steps(self) -> bool {
        matches!(self, Self::Raster | Self::Hybrid)
    }
    /// At least part of the command is reversible without captured pixels.
    #[must_use]
    pub fn somewhat_reversible(self) -> bool {
        !matches!(self, Self::Raster)
    }
}

/// The surface a command applies itself to.
///
/// Commands only ever touch a frame through these methods. Anything returned by reference
/// may be invalidated by the mutating methods.
pub trait CommandContext {
    fn canvas_size(&self) -> Size;
    /// Copy out the pixels under `rect`, clipped to the canvas.
    fn snapshot(&self, rect: Rect) -> Snapshot;
    /// Fill `rect` with a solid color, clipped to the canvas.
    fn paint_rect(&mut self, rect: Rect, color: Color);
    /// Draw a bitmap with its top-left at `origin`, clipped to the canvas.
    fn composite_bitmap(&mut self, bitmap: &Bitmap, origin: Point, options: BlitOptions);
    /// Change the canvas size, keeping content anchored at the top-left and filling new area.
    fn resize_canvas(&mut self, size: Size, fill: Color);
    fn selection_state(&self) -> &SelectionState;
    fn set_selection(&mut self, state: SelectionState);
    /// Move the selected region (and floating payload, if any) to a new top-left.
    fn move_selection(&mut self, top_left: Point);
    fn selection_options(&self) -> SelectionOptions;
    fn set_selection_options(&mut self, options: SelectionOptions);
}

/// A registry of frames, which the history uses to find the target of each entry.
pub trait Contexts {
    /// Get the context of the given frame, or None if it no longer exists.
    fn context(&mut self, target: FrameID) -> Option<&mut dyn CommandContext>;
}

#[derive(Debug)]
pub enum Variant {
    SetSelectionRegion(SetRegion),
    MoveSelectionRegion(MoveRegion),
    SetSelectionOptions(SetOptions),
    StampFloating(StampFloating),
    Draw(DrawCommand),
    ResizeCanvas(ResizeCanvas),
    // Boxed, a bunch holds commands inline.
    Bunch(Box<CommandBunch>),
}

/// An undoable edit, with a process-unique identity.
///
/// Deliberately not `Clone` - two commands with the same ID must never exist.
#[derive(Debug)]
pub struct Command {
    id: CommandID,
    variant: Variant,
}
impl From<Variant> for Command {
    fn from(variant: Variant) -> Self {
        Self {
            id: CommandID::default(),
            variant,
        }
    }
}
impl From<SetRegion> for Command {
    fn from(value: SetRegion) -> Self {
        Variant::SetSelectionRegion(value).into()
    }
}
impl From<MoveRegion> for Command {
    fn from(value: MoveRegion) -> Self {
        Variant::MoveSelectionRegion(value).into()
    }
}
impl From<SetOptions> for Command {
    fn from(value: SetOptions) -> Self {
        Variant::SetSelectionOptions(value).into()
    }
}
impl From<StampFloating> for Command {
    fn from(value: StampFloating) -> Self {
        Variant::StampFloating(value).into()
    }
}
impl From<DrawCommand> for Command {
    fn from(value: DrawCommand) -> Self {
        Variant::Draw(value).into()
    }
}
impl From<ResizeCanvas> for Command {
    fn from(value: ResizeCanvas) -> Self {
        Variant::ResizeCanvas(value).into()
    }
}
impl From<CommandBunch> for Command {
    fn from(value: CommandBunch) -> Self {
        Variant::Bunch(Box::new(value)).into()
    }
}
impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" ({}, {})", self.name(), self.id, self.kind().as_ref())
    }
}

impl Command {
    #[must_use]
    pub fn id(&self) -> CommandID {
        self.id
    }
    #[must_use]
    pub fn variant(&self) -> &Variant {
        &self.variant
    }
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match &self.variant {
            Variant::SetSelectionRegion(_)
            | Variant::MoveSelectionRegion(_)
            | Variant::SetSelectionOptions(_) => CommandKind::Selection,
            Variant::StampFloating(_) | Variant::Draw(_) => CommandKind::Raster,
            Variant::ResizeCanvas(_) => CommandKind::Hybrid,
            Variant::Bunch(bunch) => bunch.kind(),
        }
    }
    /// User-visible name, as shown by "Undo <name>".
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.variant {
            Variant::SetSelectionRegion(c) => c.name(),
            Variant::MoveSelectionRegion(_) => MoveRegion::NAME,
            Variant::SetSelectionOptions(_) => SetOptions::NAME,
            Variant::StampFloating(_) => StampFloating::NAME,
            Variant::Draw(c) => c.name(),
            Variant::ResizeCanvas(_) => ResizeCanvas::NAME,
            Variant::Bunch(c) => c.name(),
        }
    }
    /// Whether this command changes the document content, rather than just which part of it is selected.
    #[must_use]
    pub fn document_modifying(&self) -> bool {
        match &self.variant {
            Variant::SetSelectionRegion(c) => c.document_modifying(),
            Variant::MoveSelectionRegion(c) => c.document_modifying(),
            Variant::SetSelectionOptions(_) => false,
            Variant::StampFloating(c) => c.document_modifying(),
            Variant::Draw(_) | Variant::ResizeCanvas(_) => true,
            Variant::Bunch(c) => c.document_modifying(),
        }
    }
    /// Whether a bunch with an [`MergeCondition::AppendSelection`] may fold this command into itself.
    #[must_use]
    pub fn should_append(&self) -> bool {
        match &self.variant {
            Variant::SetSelectionRegion(c) => c.is_appendable(),
            _ => false,
        }
    }
    /// Whether this is a move of the selected region, foldable by [`MergeCondition::AppendMoves`].
    #[must_use]
    pub fn is_region_move(&self) -> bool {
        matches!(self.variant, Variant::MoveSelectionRegion(_))
    }
    pub(crate) fn bunch_mut(&mut self) -> Option<&mut CommandBunch> {
        match &mut self.variant {
            Variant::Bunch(bunch) => Some(bunch.as_mut()),
            _ => None,
        }
    }
    /// Perform the edit. Must be called exactly once before each [`Self::revert`].
    pub fn apply(&mut self, ctx: &mut dyn CommandContext) {
        log::trace!("apply {self}");
        match &mut self.variant {
            Variant::SetSelectionRegion(c) => c.apply(ctx),
            Variant::MoveSelectionRegion(c) => c.apply(ctx),
            Variant::SetSelectionOptions(c) => c.apply(ctx),
            Variant::StampFloating(c) => c.apply(ctx),
            Variant::Draw(c) => c.apply(ctx),
            Variant::ResizeCanvas(c) => c.apply(ctx),
            Variant::Bunch(c) => c.apply(ctx),
        }
    }
    /// Undo the edit made by the most recent [`Self::apply`].
    pub fn revert(&mut self, ctx: &mut dyn CommandContext) {
        log::trace!("revert {self}");
        match &mut self.variant {
            Variant::SetSelectionRegion(c) => c.revert(ctx),
            Variant::MoveSelectionRegion(c) => c.revert(ctx),
            Variant::SetSelectionOptions(c) => c.revert(ctx),
            Variant::StampFloating(c) => c.revert(ctx),
            Variant::Draw(c) => c.revert(ctx),
            Variant::ResizeCanvas(c) => c.revert(ctx),
            Variant::Bunch(c) => c.revert(ctx),
        }
    }
    /// Offer an already-applied `candidate` to be absorbed into `self`, the most recent command.
    ///
    /// Only commands of the same variant acting on the same target may merge. On success the
    /// candidate is consumed, otherwise it is handed back unchanged.
    pub fn try_merge(&mut self, candidate: Command, same_target: bool) -> Result<(), Command> {
        if !same_target {
            return Err(candidate);
        }
        let Variant::MoveSelectionRegion(this) = &mut self.variant else {
            return Err(candidate);
        };
        let Variant::MoveSelectionRegion(next) = &candidate.variant else {
            return Err(candidate);
        };
        this.absorb(next);
        log::trace!("merged {} into {}", candidate.id, self.id);
        Ok(())
    }
}

/// Helper for raster commands: put captured pixels back exactly as they were.
pub(crate) fn restore(ctx: &mut dyn CommandContext, snapshot: &Snapshot) {
    if !snapshot.is_empty() {
        ctx.composite_bitmap(&snapshot.pixels, snapshot.rect.origin, BlitOptions::REPLACE);
    }
}

/// Helper for the revert-before-apply precondition. Fatal in debug, logged and ignored in release.
pub(crate) fn reverted_unapplied(name: &str) {
    debug_assert!(false, "\"{name}\" reverted without being applied");
    log::error!("\"{name}\" reverted without being applied, ignoring");
}

#[cfg(test)]
pub(crate) mod test_util {
    //! An in-memory context for exercising commands without a document.
    use super::CommandContext;
    use crate::{
        bitmap::{Bitmap, BlitOptions, Snapshot},
        color::Color,
        geom::{Point, Rect, Size},
        selection::{SelectionOptions, SelectionState},
    };

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct TestContext {
        pub canvas: Bitmap,
        pub selection: SelectionState,
        pub options: SelectionOptions,
        /// Leave the canvas as is on resize, as when out of memory.
        pub fail_resize: bool,
    }
    impl TestContext {
        /// A canvas where every pixel is distinct, so misplaced pixels are caught.
        pub fn patterned(size: Size) -> Self {
            let mut canvas = Bitmap::new(size, Color::WHITE).unwrap();
            for y in 0..size.height as i32 {
                for x in 0..size.width as i32 {
                    canvas.put(Point::new(x, y), Color::rgb(x as u8, y as u8, 100));
                }
            }
            Self {
                canvas,
                selection: SelectionState::Empty,
                options: SelectionOptions::default(),
                fail_resize: false,
            }
        }
    }
    impl CommandContext for TestContext {
        fn canvas_size(&self) -> Size {
            self.canvas.size()
        }
        fn snapshot(&self, rect: Rect) -> Snapshot {
            Snapshot {
                rect: rect.intersection(&self.canvas.rect()),
                pixels: self.canvas.sub_copy(rect),
            }
        }
        fn paint_rect(&mut self, rect: Rect, color: Color) {
            self.canvas.fill_rect(rect, color);
        }
        fn composite_bitmap(&mut self, bitmap: &Bitmap, origin: Point, options: BlitOptions) {
            self.canvas.blit(bitmap, origin, options);
        }
        fn resize_canvas(&mut self, size: Size, fill: Color) {
            if self.fail_resize {
                return;
            }
            self.canvas = self.canvas.resized(size, fill).unwrap();
        }
        fn selection_state(&self) -> &SelectionState {
            &self.selection
        }
        fn set_selection(&mut self, state: SelectionState) {
            self.selection = state;
        }
        fn move_selection(&mut self, top_left: Point) {
            self.selection.move_to(top_left);
        }
        fn selection_options(&self) -> SelectionOptions {
            self.options
        }
        fn set_selection_options(&mut self, options: SelectionOptions) {
            self.options = options;
        }
    }
}

#[cfg(test)]
mod test {
    use super::{test_util::TestContext, Command, CommandKind, MoveRegion, SetOptions};
    use crate::{
        color::Color,
        geom::{Point, Size},
        selection::SelectionOptions,
    };
    #[test]
    fn kind_reversibility() {
        use strum::IntoEnumIterator;
        for kind in CommandKind::iter() {
            // Everything is at least partially reversible, except raw raster edits.
            assert_eq!(kind.somewhat_reversible(), kind != CommandKind::Raster);
            // Never both fully reversible and raster.
            assert!(!(kind.fully_reversible() && kind.has_raster_steps()));
        }
    }
    #[test]
    fn ids_distinct() {
        let a: Command = MoveRegion::new(Point::new(1, 1), Point::ZERO).into();
        let b: Command = MoveRegion::new(Point::new(1, 1), Point::ZERO).into();
        assert_ne!(a.id(), b.id());
    }
    #[test]
    fn merge_only_moves_on_same_target() {
        let mut a: Command = MoveRegion::new(Point::new(1, 1), Point::ZERO).into();
        let b: Command = MoveRegion::new(Point::new(2, 2), Point::new(1, 1)).into();
        // Different frames
        let b = a.try_merge(b, false).unwrap_err();
        // Different variant
        let options: Command = SetOptions::new(
            SelectionOptions {
                background: Color::BLACK,
                ..SelectionOptions::default()
            },
            SelectionOptions::default(),
        )
        .into();
        let options = a.try_merge(options, true).unwrap_err();
        assert!(!options.document_modifying());
        assert!(a.try_merge(b, true).is_ok());

        let mut ctx = TestContext::patterned(Size::new(4, 4));
        ctx.selection = crate::selection::SelectionState::fixed(crate::geom::Rect::new(0, 0, 2, 2));
        a.apply(&mut ctx);
        assert_eq!(ctx.selection.top_left(), Some(Point::new(2, 2)));
        a.revert(&mut ctx);
        assert_eq!(ctx.selection.top_left(), Some(Point::ZERO));
    }
}
