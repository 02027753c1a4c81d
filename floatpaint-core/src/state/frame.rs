//! A single canvas and its selection.

use crate::{
    bitmap::{Bitmap, BitmapError, BlitOptions, Snapshot},
    color::Color,
    commands::{Command, CommandContext},
    geom::{Point, Rect, Size},
    selection::{commands::SetRegion, Selection, SelectionOptions, SelectionState},
};

pub type FrameID = crate::UniqueID<Frame>;

/// Which selection a frame currently shows.
///
/// While a gesture is in progress it is edited freely as a preview, without touching the
/// committed selection or the history. Finishing the gesture turns the preview into one command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ActiveSelection {
    #[default]
    Committed,
    PreviewDuring(SelectionState),
}

#[derive(Debug)]
pub struct Frame {
    id: FrameID,
    canvas: Bitmap,
    selection: Selection,
    active: ActiveSelection,
}
impl Frame {
    pub fn new(size: Size, fill: Color, options: SelectionOptions) -> Result<Self, BitmapError> {
        Ok(Self {
            id: FrameID::default(),
            canvas: Bitmap::new(size, fill)?,
            selection: Selection::new(options),
            active: ActiveSelection::Committed,
        })
    }
    #[must_use]
    pub fn id(&self) -> FrameID {
        self.id
    }
    #[must_use]
    pub fn canvas(&self) -> &Bitmap {
        &self.canvas
    }
    #[must_use]
    pub fn size(&self) -> Size {
        self.canvas.size()
    }
    /// Area covered by the canvas.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.canvas.rect()
    }
    /// The committed selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }
    #[must_use]
    pub fn active_selection(&self) -> &ActiveSelection {
        &self.active
    }
    /// The preview if a gesture is in progress, otherwise the committed selection.
    #[must_use]
    pub fn visible_selection(&self) -> &SelectionState {
        match &self.active {
            ActiveSelection::Committed => self.selection.state(),
            ActiveSelection::PreviewDuring(preview) => preview,
        }
    }
    #[must_use]
    pub fn is_previewing(&self) -> bool {
        matches!(self.active, ActiveSelection::PreviewDuring(_))
    }
    /// Start a gesture, with a preview copied from the committed selection. Replaces any
    /// preview already in progress.
    pub fn begin_preview(&mut self) -> &mut SelectionState {
        if self.is_previewing() {
            log::debug!("{} preview restarted", self.id);
        }
        self.active = ActiveSelection::PreviewDuring(self.selection.state().clone());
        match &mut self.active {
            ActiveSelection::PreviewDuring(preview) => preview,
            // Just set.
            ActiveSelection::Committed => unreachable!(),
        }
    }
    #[must_use]
    pub fn preview_mut(&mut self) -> Option<&mut SelectionState> {
        match &mut self.active {
            ActiveSelection::PreviewDuring(preview) => Some(preview),
            ActiveSelection::Committed => None,
        }
    }
    /// End the gesture, returning the command that commits it. None if there was no preview or
    /// it ended up where it started.
    pub fn finish_preview(&mut self, name: &str) -> Option<Command> {
        let ActiveSelection::PreviewDuring(preview) = std::mem::take(&mut self.active) else {
            return None;
        };
        if &preview == self.selection.state() {
            return None;
        }
        Some(SetRegion::new(name, preview, self.selection.state().clone()).into())
    }
    /// End the gesture without committing anything.
    pub fn cancel_preview(&mut self) {
        if let ActiveSelection::PreviewDuring(_) = std::mem::take(&mut self.active) {
            log::debug!("{} preview cancelled", self.id);
        }
    }
}

impl CommandContext for Frame {
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
        match self.canvas.resized(size, fill) {
            Ok(canvas) => self.canvas = canvas,
            // Size was checked when the command was made, so this is a true out-of-memory.
            Err(err) => log::error!("{} failed to resize: {err}", self.id),
        }
    }
    fn selection_state(&self) -> &SelectionState {
        self.selection.state()
    }
    fn set_selection(&mut self, state: SelectionState) {
        log::trace!("{} selection {:?} -> {:?}", self.id, self.selection.state().region(), state.region());
        *self.selection.state_mut() = state;
    }
    fn move_selection(&mut self, top_left: Point) {
        self.selection.state_mut().move_to(top_left);
    }
    fn selection_options(&self) -> SelectionOptions {
        self.selection.options()
    }
    fn set_selection_options(&mut self, options: SelectionOptions) {
        self.selection.set_options(options);
    }
}
