//! Commands acting on the selection of a frame.

use super::{FloatingSelection, SelectionOptions, SelectionState};
use crate::{
    bitmap::{Bitmap, Snapshot},
    commands::{restore, reverted_unapplied, CommandContext},
    geom::{Point, Rect},
};

/// Replace the selection state, optionally changing the options along with it.
#[derive(Debug)]
pub struct SetRegion {
    name: String,
    new: SelectionState,
    old: SelectionState,
    appendable: bool,
    options: Option<SetOptions>,
}
impl SetRegion {
    pub fn new(name: impl Into<String>, new: SelectionState, old: SelectionState) -> Self {
        Self {
            name: name.into(),
            new,
            old,
            appendable: false,
            options: None,
        }
    }
    /// Allow a preceding deselect bunch to absorb this.
    #[must_use]
    pub fn appendable(self) -> Self {
        Self {
            appendable: true,
            ..self
        }
    }
    #[must_use]
    pub fn with_options(self, options: SetOptions) -> Self {
        Self {
            options: Some(options),
            ..self
        }
    }
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[must_use]
    pub fn new_state(&self) -> &SelectionState {
        &self.new
    }
    #[must_use]
    pub fn old_state(&self) -> &SelectionState {
        &self.old
    }
    #[must_use]
    pub fn is_appendable(&self) -> bool {
        self.appendable
    }
    /// Floats carry pixels, so changing one changes the document.
    #[must_use]
    pub fn document_modifying(&self) -> bool {
        self.new.is_floating() || self.old.is_floating()
    }
    pub fn apply(&mut self, ctx: &mut dyn CommandContext) {
        if let Some(options) = &mut self.options {
            options.apply(ctx);
        }
        ctx.set_selection(self.new.clone());
    }
    pub fn revert(&mut self, ctx: &mut dyn CommandContext) {
        ctx.set_selection(self.old.clone());
        if let Some(options) = &mut self.options {
            options.revert(ctx);
        }
    }
}

/// Move the selection without changing its size or content.
#[derive(Debug)]
pub struct MoveRegion {
    new: Point,
    old: Point,
    // Whether pixels move along with the region.
    floating: bool,
    // How many later moves have been folded into this one.
    merged: usize,
}
impl MoveRegion {
    pub const NAME: &'static str = "Move Selected Content";
    #[must_use]
    pub fn new(new: Point, old: Point) -> Self {
        Self {
            new,
            old,
            floating: false,
            merged: 0,
        }
    }
    /// Mark this as a move of floating pixels rather than of a bare region.
    #[must_use]
    pub fn with_floating(self, floating: bool) -> Self {
        Self { floating, ..self }
    }
    #[must_use]
    pub fn new_top_left(&self) -> Point {
        self.new
    }
    #[must_use]
    pub fn old_top_left(&self) -> Point {
        self.old
    }
    #[must_use]
    pub fn merged(&self) -> usize {
        self.merged
    }
    /// Moving a bare region only changes what is selected.
    #[must_use]
    pub fn document_modifying(&self) -> bool {
        self.floating
    }
    /// Take the destination of a move which happened right after this one.
    pub(crate) fn absorb(&mut self, next: &MoveRegion) {
        self.new = next.new;
        self.floating |= next.floating;
        self.merged += 1 + next.merged;
    }
    pub fn apply(&mut self, ctx: &mut dyn CommandContext) {
        ctx.move_selection(self.new);
    }
    pub fn revert(&mut self, ctx: &mut dyn CommandContext) {
        ctx.move_selection(self.old);
    }
}

#[derive(Debug)]
pub struct SetOptions {
    new: SelectionOptions,
    old: SelectionOptions,
}
impl SetOptions {
    pub const NAME: &'static str = "Change Selection Settings";
    #[must_use]
    pub fn new(new: SelectionOptions, old: SelectionOptions) -> Self {
        Self { new, old }
    }
    pub fn apply(&mut self, ctx: &mut dyn CommandContext) {
        ctx.set_selection_options(self.new);
    }
    pub fn revert(&mut self, ctx: &mut dyn CommandContext) {
        ctx.set_selection_options(self.old);
    }
}

/// Paint a floating payload onto the canvas, erasing the hole it was lifted from.
#[derive(Debug)]
pub struct StampFloating {
    payload: Bitmap,
    region: Rect,
    hole: Option<Rect>,
    options: SelectionOptions,
    // Entirely offscreen, nothing to paint.
    noop: bool,
    // Pixels under the hole and the region, in capture order.
    captured: Option<smallvec::SmallVec<[Snapshot; 2]>>,
}
impl StampFloating {
    pub const NAME: &'static str = "Stamp Selection";
    #[must_use]
    pub fn new(float: FloatingSelection, options: SelectionOptions, canvas: Rect) -> Self {
        let (region, payload, hole) = float.into_parts();
        let noop = !region.intersects(&canvas);
        if noop {
            log::debug!("stamp of {region} is entirely outside {canvas}");
        }
        Self {
            payload,
            region,
            hole,
            options,
            noop,
            captured: None,
        }
    }
    #[must_use]
    pub fn region(&self) -> Rect {
        self.region
    }
    #[must_use]
    pub fn document_modifying(&self) -> bool {
        !self.noop
    }
    pub fn apply(&mut self, ctx: &mut dyn CommandContext) {
        let mut captured = smallvec::SmallVec::new();
        if !self.noop {
            // Capture both before painting either, they may overlap.
            if let Some(hole) = self.hole {
                captured.push(ctx.snapshot(hole));
            }
            captured.push(ctx.snapshot(self.region));
            if let Some(hole) = self.hole {
                ctx.paint_rect(hole, self.options.background);
            }
            ctx.composite_bitmap(&self.payload, self.region.origin, self.options.blit_options());
        }
        self.captured = Some(captured);
    }
    pub fn revert(&mut self, ctx: &mut dyn CommandContext) {
        let Some(captured) = self.captured.take() else {
            reverted_unapplied(Self::NAME);
            return;
        };
        for snapshot in captured.iter().rev() {
            restore(ctx, snapshot);
        }
    }
}
