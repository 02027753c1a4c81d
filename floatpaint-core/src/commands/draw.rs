//! Plain raster edits which don't involve the selection.

use super::{restore, reverted_unapplied, CommandContext};
use crate::{
    bitmap::{Bitmap, BitmapError, BlitOptions, Snapshot},
    color::Color,
    geom::{Point, Rect, Size},
    selection::SelectionState,
};

#[derive(Debug)]
pub enum Draw {
    FillRect {
        rect: Rect,
        color: Color,
    },
    PutPixels {
        pixels: Bitmap,
        origin: Point,
        options: BlitOptions,
    },
}
impl Draw {
    /// The area of the canvas this may touch.
    #[must_use]
    pub fn area(&self) -> Rect {
        match self {
            Self::FillRect { rect, .. } => *rect,
            Self::PutPixels { pixels, origin, .. } => {
                Rect::from_origin_size(*origin, pixels.size())
            }
        }
    }
}

/// A [`Draw`], along with the pixels it covered up.
#[derive(Debug)]
pub struct DrawCommand {
    draw: Draw,
    before: Option<Snapshot>,
}
impl From<Draw> for DrawCommand {
    fn from(draw: Draw) -> Self {
        Self { draw, before: None }
    }
}
impl DrawCommand {
    #[must_use]
    pub fn draw(&self) -> &Draw {
        &self.draw
    }
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self.draw {
            Draw::FillRect { .. } => "Fill Rectangle",
            Draw::PutPixels { .. } => "Put Pixels",
        }
    }
    pub fn apply(&mut self, ctx: &mut dyn CommandContext) {
        self.before = Some(ctx.snapshot(self.draw.area()));
        match &self.draw {
            Draw::FillRect { rect, color } => ctx.paint_rect(*rect, *color),
            Draw::PutPixels {
                pixels,
                origin,
                options,
            } => ctx.composite_bitmap(pixels, *origin, *options),
        }
    }
    pub fn revert(&mut self, ctx: &mut dyn CommandContext) {
        match self.before.take() {
            Some(before) => restore(ctx, &before),
            None => reverted_unapplied(self.name()),
        }
    }
}

/// Change the canvas size. Content stays anchored at the top-left, and the selection is
/// clipped to the new bounds.
#[derive(Debug)]
pub struct ResizeCanvas {
    new_size: Size,
    fill: Color,
    before: Option<(Snapshot, SelectionState)>,
}
impl ResizeCanvas {
    pub const NAME: &'static str = "Resize Image";
    /// Fails if the new size could never be allocated.
    pub fn new(new_size: Size, fill: Color) -> Result<Self, BitmapError> {
        Bitmap::checked_area(new_size)?;
        Ok(Self {
            new_size,
            fill,
            before: None,
        })
    }
    #[must_use]
    pub fn new_size(&self) -> Size {
        self.new_size
    }
    pub fn apply(&mut self, ctx: &mut dyn CommandContext) {
        let old_size = ctx.canvas_size();
        let canvas = ctx.snapshot(Rect::of_size(old_size));
        let selection = ctx.selection_state().clone();

        ctx.resize_canvas(self.new_size, self.fill);
        self.before = Some((canvas, selection.clone()));
        if ctx.canvas_size() != self.new_size {
            log::warn!("canvas left at {old_size}, selection not clipped");
            return;
        }
        let mut clipped = selection.clone();
        clipped.clip(Rect::of_size(self.new_size));
        if clipped != selection {
            log::debug!("selection clipped by resize to {}", self.new_size);
            ctx.set_selection(clipped);
        }
    }
    pub fn revert(&mut self, ctx: &mut dyn CommandContext) {
        let Some((canvas, selection)) = self.before.take() else {
            reverted_unapplied(Self::NAME);
            return;
        };
        ctx.resize_canvas(canvas.pixels.size(), self.fill);
        restore(ctx, &canvas);
        ctx.set_selection(selection);
    }
}

#[cfg(test)]
mod test {
    use super::{Draw, DrawCommand, ResizeCanvas};
    use crate::{
        color::Color,
        commands::{test_util::TestContext, Command},
        geom::{Point, Rect, Size},
        selection::SelectionState,
    };
    #[test]
    fn fill_round_trip() {
        let mut ctx = TestContext::patterned(Size::new(6, 6));
        let initial = ctx.clone();
        let mut fill: Command = DrawCommand::from(Draw::FillRect {
            rect: Rect::new(4, 4, 10, 10),
            color: Color::BLACK,
        })
        .into();
        fill.apply(&mut ctx);
        assert_eq!(ctx.canvas.get(Point::new(5, 5)), Some(Color::BLACK));
        assert_ne!(ctx, initial);
        fill.revert(&mut ctx);
        assert_eq!(ctx, initial);
    }
    #[test]
    fn resize_clips_selection() {
        let mut ctx = TestContext::patterned(Size::new(8, 8));
        ctx.selection = SelectionState::fixed(Rect::new(4, 4, 4, 4));
        ctx.selection
            .begin_float(&ctx.canvas.clone(), false)
            .unwrap();
        let initial = ctx.clone();

        let mut resize: Command = ResizeCanvas::new(Size::new(6, 5), Color::BLACK)
            .unwrap()
            .into();
        resize.apply(&mut ctx);
        assert_eq!(ctx.canvas.size(), Size::new(6, 5));
        assert_eq!(ctx.selection.region(), Rect::new(4, 4, 2, 1));
        assert_eq!(ctx.selection.payload().map(|p| p.size()), Some(Size::new(2, 1)));

        resize.revert(&mut ctx);
        assert_eq!(ctx, initial);
    }
    #[test]
    fn failed_resize_keeps_selection() {
        let mut ctx = TestContext::patterned(Size::new(8, 8));
        ctx.fail_resize = true;
        ctx.selection = SelectionState::fixed(Rect::new(4, 4, 4, 4));
        let initial = ctx.clone();

        let mut resize: Command = ResizeCanvas::new(Size::new(5, 5), Color::BLACK)
            .unwrap()
            .into();
        resize.apply(&mut ctx);
        assert_eq!(ctx, initial);
        resize.revert(&mut ctx);
        assert_eq!(ctx, initial);
    }
    #[test]
    fn resize_rejects_huge() {
        assert!(ResizeCanvas::new(Size::new(u32::MAX, u32::MAX), Color::WHITE).is_err());
    }
}
