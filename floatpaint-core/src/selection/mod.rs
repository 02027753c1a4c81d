//! # Selection
//!
//! A frame has exactly one committed selection, which is in one of three states:
//!
//! * [`SelectionState::Empty`] - nothing selected.
//! * [`SelectionState::Fixed`] - a region of the canvas is marked, the pixels stay where they are.
//! * [`SelectionState::Floating`] - the pixels of the region have been lifted off the canvas into an
//!   owned payload which can be moved around freely. Nothing is painted until the float is stamped.
//!
//! A float lifted as a move leaves a "hole" behind, which is erased with the background color when
//! stamped. A float lifted as a copy does not. Once a float is a copy it stays a copy.
//!
//! The transition methods on [`SelectionState`] mutate in place, for previews. The committed
//! selection of a frame only ever changes through the commands built by [`Selection`].

pub mod commands;

use crate::{
    bitmap::{Bitmap, BitmapError, BlitOptions},
    color::Color,
    commands::{Command, CommandBunch, CommandKind, MergeCondition},
    geom::{Point, Rect},
};
use commands::{MoveRegion, SetOptions, SetRegion, StampFloating};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    #[error("nothing is selected")]
    Empty,
    #[error("selection is not floating")]
    NotFloating,
    #[error(transparent)]
    Bitmap(#[from] BitmapError),
}

/// How a floating selection is painted when stamped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SelectionOptions {
    /// Treat pixels of the background color as transparent.
    pub mask_enabled: bool,
    /// Color used to erase the hole left by a moved float, and the mask color.
    pub background: Color,
    pub alpha_blend: bool,
}
impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            mask_enabled: false,
            background: Color::WHITE,
            alpha_blend: false,
        }
    }
}
impl SelectionOptions {
    #[must_use]
    pub fn blit_options(&self) -> BlitOptions {
        BlitOptions {
            mask: self.mask_enabled.then_some(self.background),
            alpha_blend: self.alpha_blend,
        }
    }
}

/// Where the pixels of a float came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatOrigin {
    /// Lifted from the canvas. `hole` is erased when stamped.
    Moved { hole: Rect },
    /// Copied or pasted. The canvas below is left alone.
    Copied,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FloatingSelection {
    // Always the same size as `payload`.
    region: Rect,
    payload: Bitmap,
    origin: FloatOrigin,
}
impl FloatingSelection {
    #[must_use]
    pub fn region(&self) -> Rect {
        self.region
    }
    #[must_use]
    pub fn payload(&self) -> &Bitmap {
        &self.payload
    }
    #[must_use]
    pub fn origin(&self) -> FloatOrigin {
        self.origin
    }
    #[must_use]
    pub fn is_copy(&self) -> bool {
        self.origin == FloatOrigin::Copied
    }
    /// The area to erase when stamping, if any.
    #[must_use]
    pub fn source_hole(&self) -> Option<Rect> {
        match self.origin {
            FloatOrigin::Moved { hole } if !hole.is_empty() => Some(hole),
            _ => None,
        }
    }
    pub(crate) fn into_parts(self) -> (Rect, Bitmap, Option<Rect>) {
        let hole = self.source_hole();
        (self.region, self.payload, hole)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Empty,
    Fixed(Rect),
    Floating(FloatingSelection),
}
impl SelectionState {
    /// A fixed selection of `region`, or Empty if it has no area.
    #[must_use]
    pub fn fixed(region: Rect) -> Self {
        if region.is_empty() {
            Self::Empty
        } else {
            Self::Fixed(region)
        }
    }
    /// A copied float holding `payload`, as from a clipboard paste.
    #[must_use]
    pub fn pasted(payload: Bitmap, top_left: Point) -> Self {
        if payload.size().is_empty() {
            return Self::Empty;
        }
        Self::Floating(FloatingSelection {
            region: Rect::from_origin_size(top_left, payload.size()),
            payload,
            origin: FloatOrigin::Copied,
        })
    }
    /// The selected area, [`Rect::EMPTY`] if nothing is selected.
    #[must_use]
    pub fn region(&self) -> Rect {
        match self {
            Self::Empty => Rect::EMPTY,
            Self::Fixed(region) => *region,
            Self::Floating(float) => float.region,
        }
    }
    #[must_use]
    pub fn exists(&self) -> bool {
        !matches!(self, Self::Empty)
    }
    #[must_use]
    pub fn is_floating(&self) -> bool {
        matches!(self, Self::Floating(_))
    }
    #[must_use]
    pub fn floating(&self) -> Option<&FloatingSelection> {
        match self {
            Self::Floating(float) => Some(float),
            _ => None,
        }
    }
    #[must_use]
    pub fn is_copy(&self) -> bool {
        self.floating().is_some_and(FloatingSelection::is_copy)
    }
    #[must_use]
    pub fn source_hole(&self) -> Option<Rect> {
        self.floating().and_then(FloatingSelection::source_hole)
    }
    #[must_use]
    pub fn payload(&self) -> Option<&Bitmap> {
        self.floating().map(FloatingSelection::payload)
    }
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.region().contains(point)
    }
    #[must_use]
    pub fn top_left(&self) -> Option<Point> {
        self.exists().then(|| self.region().origin)
    }

    /// Mark a new region. A float in progress is dropped without being stamped.
    pub fn select(&mut self, region: Rect) {
        if self.is_floating() {
            log::debug!("selecting {region} over a float, float dropped");
        }
        *self = Self::fixed(region);
    }
    /// Lift the selected pixels off `canvas`.
    ///
    /// The region is clipped to the canvas first. If already floating, `copy` turns the float into a copy
    /// and otherwise nothing changes. On error the state is left untouched.
    pub fn begin_float(&mut self, canvas: &Bitmap, copy: bool) -> Result<(), SelectionError> {
        match self {
            Self::Empty => {
                debug_assert!(false, "float with nothing selected");
                log::error!("float with nothing selected");
                Err(SelectionError::Empty)
            }
            Self::Floating(float) => {
                if copy && !float.is_copy() {
                    log::debug!("float at {} became a copy", float.region);
                    float.origin = FloatOrigin::Copied;
                }
                Ok(())
            }
            Self::Fixed(region) => {
                let region = region.intersection(&canvas.rect());
                if region.is_empty() {
                    return Err(SelectionError::Empty);
                }
                let payload = canvas.try_sub_copy(region)?;
                log::debug!(
                    "floated {region} ({}), copy: {copy}",
                    human_bytes::human_bytes(payload.byte_len() as f64)
                );
                *self = Self::Floating(FloatingSelection {
                    region,
                    payload,
                    origin: if copy {
                        FloatOrigin::Copied
                    } else {
                        FloatOrigin::Moved { hole: region }
                    },
                });
                Ok(())
            }
        }
    }
    /// Move the region to a new top-left. A floating payload moves with it, the hole does not.
    pub fn move_to(&mut self, top_left: Point) {
        match self {
            Self::Empty => (),
            Self::Fixed(region) => *region = region.with_origin(top_left),
            Self::Floating(float) => float.region = float.region.with_origin(top_left),
        }
    }
    pub fn offset(&mut self, delta: Point) {
        if let Some(top_left) = self.top_left() {
            self.move_to(top_left + delta);
        }
    }
    /// Restrict the selection to `bounds`, cropping any floating payload to match.
    pub fn clip(&mut self, bounds: Rect) {
        let kept = self.region().intersection(&bounds);
        if kept.is_empty() {
            *self = Self::Empty;
            return;
        }
        match self {
            Self::Empty => (),
            Self::Fixed(region) => *region = kept,
            Self::Floating(float) => {
                if kept != float.region {
                    let local = kept.translated(Point::ZERO - float.region.origin);
                    float.payload.crop_in_place(local);
                    float.region = kept;
                }
                if let FloatOrigin::Moved { hole } = &mut float.origin {
                    *hole = hole.intersection(&bounds);
                }
            }
        }
    }
    /// Replace the selection with a pasted float.
    pub fn paste(&mut self, payload: Bitmap, top_left: Point) {
        *self = Self::pasted(payload, top_left);
    }
    /// Drop a float without painting it.
    pub fn discard(&mut self) {
        if self.is_floating() {
            log::debug!("discarded float at {}", self.region());
        }
        *self = Self::Empty;
    }
    /// What remains selected once a float is stamped onto a canvas covering `canvas`.
    fn stamped(&self, canvas: Rect) -> Self {
        Self::fixed(self.region().intersection(&canvas))
    }
    /// Paint the float, leaving its region selected. Returns the command which does the painting.
    pub fn stamp(&mut self, options: SelectionOptions, canvas: Rect) -> Result<Command, SelectionError> {
        let command = self
            .stamp_command(options, canvas)
            .ok_or(SelectionError::NotFloating)?;
        *self = self.stamped(canvas);
        Ok(command)
    }
    /// Deselect, stamping any float first. None if nothing was selected.
    pub fn deselect(&mut self, options: SelectionOptions, canvas: Rect) -> Option<Command> {
        let command = self.deselect_command(options, canvas)?;
        *self = Self::Empty;
        Some(command)
    }
    /// The commands to stamp and then replace this state with `next`.
    ///
    /// Without a float, just the selection change.
    fn stamp_then(
        &self,
        options: SelectionOptions,
        canvas: Rect,
        next: SetRegion,
    ) -> smallvec::SmallVec<[Command; 2]> {
        let mut commands = smallvec::SmallVec::new();
        if let Self::Floating(float) = self {
            commands.push(StampFloating::new(float.clone(), options, canvas).into());
        }
        commands.push(next.into());
        commands
    }
    /// Build the "Stamp Selection" command without changing `self`.
    #[must_use]
    pub fn stamp_command(&self, options: SelectionOptions, canvas: Rect) -> Option<Command> {
        if !self.is_floating() {
            return None;
        }
        let set = SetRegion::new(StampFloating::NAME, self.stamped(canvas), self.clone());
        Some(
            CommandBunch::new(
                CommandKind::Hybrid,
                StampFloating::NAME,
                self.stamp_then(options, canvas, set),
            )
            .into(),
        )
    }
    /// Build the "Deselect" command without changing `self`. None if nothing is selected.
    #[must_use]
    pub fn deselect_command(&self, options: SelectionOptions, canvas: Rect) -> Option<Command> {
        if !self.exists() {
            return None;
        }
        let kind = if self.is_floating() {
            CommandKind::Hybrid
        } else {
            CommandKind::Selection
        };
        let set = SetRegion::new(Selection::DESELECT, Self::Empty, self.clone());
        Some(
            CommandBunch::new(kind, Selection::DESELECT, self.stamp_then(options, canvas, set))
                .with_condition(MergeCondition::append_selection())
                .into(),
        )
    }
}

/// The committed selection of a frame, and the options it is stamped with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    state: SelectionState,
    options: SelectionOptions,
}
impl Selection {
    pub const DESELECT: &'static str = "Deselect";
    pub const CLONE: &'static str = "Clone Selection";

    #[must_use]
    pub fn new(options: SelectionOptions) -> Self {
        Self {
            state: SelectionState::Empty,
            options,
        }
    }
    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }
    #[must_use]
    pub fn options(&self) -> SelectionOptions {
        self.options
    }
    pub(crate) fn state_mut(&mut self) -> &mut SelectionState {
        &mut self.state
    }
    pub(crate) fn set_options(&mut self, options: SelectionOptions) {
        self.options = options;
    }

    /// Select `region`. A float is stamped first. The result can be folded into a preceding deselect.
    #[must_use]
    pub fn select_command(&self, region: Rect, canvas: Rect, name: &str) -> Command {
        let set = SetRegion::new(name, SelectionState::fixed(region), self.state.clone()).appendable();
        if self.state.is_floating() {
            CommandBunch::new(
                CommandKind::Hybrid,
                name,
                self.state.stamp_then(self.options, canvas, set),
            )
            .into()
        } else {
            set.into()
        }
    }
    /// Like [`Self::select_command`], changing the options at the same time. A float is stamped
    /// with the options it had.
    #[must_use]
    pub fn select_with_options_command(
        &self,
        region: Rect,
        options: SelectionOptions,
        canvas: Rect,
        name: &str,
    ) -> Command {
        let mut set =
            SetRegion::new(name, SelectionState::fixed(region), self.state.clone()).appendable();
        if options != self.options {
            set = set.with_options(SetOptions::new(options, self.options));
        }
        if self.state.is_floating() {
            CommandBunch::new(
                CommandKind::Hybrid,
                name,
                self.state.stamp_then(self.options, canvas, set),
            )
            .into()
        } else {
            set.into()
        }
    }
    #[must_use]
    pub fn deselect_command(&self, canvas: Rect) -> Option<Command> {
        self.state.deselect_command(self.options, canvas)
    }
    #[must_use]
    pub fn stamp_command(&self, canvas: Rect) -> Option<Command> {
        self.state.stamp_command(self.options, canvas)
    }
    /// Lift the selection off the canvas. None if already floating and nothing would change.
    pub fn float_command(&self, canvas: &Bitmap, copy: bool) -> Result<Option<Command>, SelectionError> {
        if !self.state.exists() {
            return Err(SelectionError::Empty);
        }
        let mut floated = self.state.clone();
        floated.begin_float(canvas, copy)?;
        if floated == self.state {
            return Ok(None);
        }
        let name = if copy { "Copy Selection" } else { "Float Selection" };
        Ok(Some(SetRegion::new(name, floated, self.state.clone()).into()))
    }
    /// Move the selected region to `top_left`. None if nothing is selected or it wouldn't move.
    #[must_use]
    pub fn move_command(&self, top_left: Point) -> Option<Command> {
        let old = self.state.top_left()?;
        (old != top_left).then(|| {
            MoveRegion::new(top_left, old)
                .with_floating(self.state.is_floating())
                .into()
        })
    }
    /// Stamp a copy of the float where it is and keep floating, now as a copy. None if not floating.
    ///
    /// A following selection change may be folded into the same step.
    #[must_use]
    pub fn clone_command(&self, canvas: Rect) -> Option<Command> {
        let SelectionState::Floating(float) = &self.state else {
            return None;
        };
        let cloned = SelectionState::Floating(FloatingSelection {
            origin: FloatOrigin::Copied,
            ..float.clone()
        });
        let set = SetRegion::new(Self::CLONE, cloned, self.state.clone());
        Some(
            CommandBunch::new(
                CommandKind::Hybrid,
                Self::CLONE,
                self.state.stamp_then(self.options, canvas, set),
            )
            .with_condition(MergeCondition::append_selection())
            .into(),
        )
    }
    /// Nudge the selection by `delta`. A fixed selection is floated first, and later nudges
    /// fold into the same undo step.
    pub fn offset_command(&self, canvas: &Bitmap, delta: Point) -> Result<Option<Command>, SelectionError> {
        match &self.state {
            SelectionState::Empty => Ok(None),
            SelectionState::Floating(_) => Ok(self.move_command(self.state.region().origin + delta)),
            SelectionState::Fixed(_) => {
                let mut floated = self.state.clone();
                floated.begin_float(canvas, false)?;
                let from = floated.region().origin;
                let float = SetRegion::new("Float Selection", floated, self.state.clone());
                let moved = MoveRegion::new(from + delta, from).with_floating(true);
                Ok(Some(
                    CommandBunch::new(
                        CommandKind::Hybrid,
                        "Offset Selection",
                        [float.into(), moved.into()],
                    )
                    .with_condition(MergeCondition::AppendMoves)
                    .into(),
                ))
            }
        }
    }
    /// Throw away a float without stamping it. None if not floating.
    #[must_use]
    pub fn discard_command(&self) -> Option<Command> {
        self.state.is_floating().then(|| {
            SetRegion::new("Discard Selection", SelectionState::Empty, self.state.clone()).into()
        })
    }
    /// Replace the selection with a pasted float, stamping any current float first.
    #[must_use]
    pub fn paste_command(&self, payload: Bitmap, top_left: Point, canvas: Rect) -> Command {
        let set = SetRegion::new("Paste", SelectionState::pasted(payload, top_left), self.state.clone());
        if self.state.is_floating() {
            CommandBunch::new(
                CommandKind::Hybrid,
                "Paste",
                self.state.stamp_then(self.options, canvas, set),
            )
            .into()
        } else {
            set.into()
        }
    }
    /// None if the options are unchanged.
    #[must_use]
    pub fn options_command(&self, options: SelectionOptions) -> Option<Command> {
        (options != self.options).then(|| SetOptions::new(options, self.options).into())
    }
}
