use super::{Frame, FrameID};
use crate::{
    bitmap::BitmapError,
    color::Color,
    commands::{Command, CommandContext, Contexts},
    geom::Size,
    history::{History, HistoryError, Pushed},
    selection::SelectionOptions,
};

pub type DocumentID = crate::UniqueID<Document>;

/// An ordered set of frames, sharing one undo history.
#[derive(Debug)]
pub struct Document {
    id: DocumentID,
    /// Name of the document, shown in window titles and logs.
    pub name: String,
    frames: hashbrown::HashMap<FrameID, Frame>,
    order: Vec<FrameID>,
    active: FrameID,
    history: History,
}

impl Contexts for hashbrown::HashMap<FrameID, Frame> {
    fn context(&mut self, target: FrameID) -> Option<&mut dyn CommandContext> {
        self.get_mut(&target).map(|frame| frame as &mut dyn CommandContext)
    }
}
impl Contexts for Document {
    fn context(&mut self, target: FrameID) -> Option<&mut dyn CommandContext> {
        self.frames.context(target)
    }
}

impl Document {
    /// A new document with a single frame.
    pub fn new(size: Size, fill: Color, options: SelectionOptions) -> Result<Self, BitmapError> {
        let frame = Frame::new(size, fill, options)?;
        let active = frame.id();
        let mut frames = hashbrown::HashMap::new();
        frames.insert(active, frame);
        Ok(Self {
            id: DocumentID::default(),
            name: "New Document".into(),
            frames,
            order: vec![active],
            active,
            history: History::default(),
        })
    }
    #[must_use]
    pub fn id(&self) -> DocumentID {
        self.id
    }
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }
    /// Append a new frame. Does not change the active frame.
    pub fn add_frame(
        &mut self,
        size: Size,
        fill: Color,
        options: SelectionOptions,
    ) -> Result<FrameID, BitmapError> {
        let frame = Frame::new(size, fill, options)?;
        let id = frame.id();
        self.frames.insert(id, frame);
        self.order.push(id);
        log::debug!("{} added {id}", self.id);
        Ok(id)
    }
    /// Remove a frame along with its history. The last frame can't be removed.
    pub fn remove_frame(&mut self, id: FrameID) -> Option<Frame> {
        if self.order.len() <= 1 {
            return None;
        }
        let frame = self.frames.remove(&id)?;
        self.order.retain(|other| *other != id);
        self.history.forget(id);
        if self.active == id {
            // Checked above that one remains.
            self.active = self.order[0];
        }
        log::debug!("{} removed {id}", self.id);
        Some(frame)
    }
    /// Frames, in order.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> + '_ {
        self.order.iter().filter_map(|id| self.frames.get(id))
    }
    #[must_use]
    pub fn frame(&self, id: FrameID) -> Option<&Frame> {
        self.frames.get(&id)
    }
    #[must_use]
    pub fn frame_mut(&mut self, id: FrameID) -> Option<&mut Frame> {
        self.frames.get_mut(&id)
    }
    #[must_use]
    pub fn active_id(&self) -> FrameID {
        self.active
    }
    /// Returns false if there is no such frame.
    pub fn set_active(&mut self, id: FrameID) -> bool {
        if !self.frames.contains_key(&id) {
            return false;
        }
        if let Some(frame) = self.frames.get_mut(&self.active) {
            frame.cancel_preview();
        }
        self.active = id;
        true
    }
    #[must_use]
    pub fn active(&self) -> &Frame {
        // Always present - removal refuses the last frame and moves `active` off removed frames.
        &self.frames[&self.active]
    }
    #[must_use]
    pub fn active_mut(&mut self) -> &mut Frame {
        self.frames
            .get_mut(&self.active)
            .expect("active frame missing")
    }
    /// Apply a command to the active frame and record it.
    pub fn run(&mut self, command: Command) -> Result<Pushed, HistoryError> {
        self.run_on(self.active, command)
    }
    pub fn run_on(&mut self, target: FrameID, command: Command) -> Result<Pushed, HistoryError> {
        if let Some(frame) = self.frames.get_mut(&target) {
            // Preview was derived from the selection this is about to change.
            frame.cancel_preview();
        }
        self.history.push(command, target, &mut self.frames)
    }
    fn cancel_previews(&mut self) {
        self.frames.values_mut().for_each(Frame::cancel_preview);
    }
    pub fn undo(&mut self) -> Result<(), HistoryError> {
        self.cancel_previews();
        self.history.undo(&mut self.frames)
    }
    pub fn redo(&mut self) -> Result<(), HistoryError> {
        self.cancel_previews();
        self.history.redo(&mut self.frames)
    }
    pub fn open_group(&mut self, name: impl Into<String>) {
        self.history.open_group(name);
    }
    pub fn close_group(&mut self) -> Result<(), HistoryError> {
        self.history.close_group()
    }
    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.history.is_modified()
    }
}

#[cfg(test)]
mod test {
    use super::Document;
    use crate::{
        bitmap::Bitmap,
        color::Color,
        commands::CommandKind,
        geom::{Point, Rect, Size},
        selection::{FloatOrigin, SelectionOptions, SelectionState},
    };
    const CANVAS: Rect = Rect::new(0, 0, 20, 20);

    /// 20x20 document where every pixel differs from its neighbours and none are white.
    fn patterned() -> Document {
        let mut document =
            Document::new(Size::new(20, 20), Color::WHITE, SelectionOptions::default()).unwrap();
        let mut pattern = Bitmap::new(Size::new(20, 20), Color::WHITE).unwrap();
        for y in 0..20 {
            for x in 0..20 {
                pattern.put(Point::new(x, y), Color::rgb(x as u8 * 10, y as u8 * 10, 50));
            }
        }
        let put = crate::commands::DrawCommand::from(crate::commands::Draw::PutPixels {
            pixels: pattern,
            origin: Point::ZERO,
            options: crate::bitmap::BlitOptions::REPLACE,
        });
        document.run(put.into()).unwrap();
        document.mark_saved();
        document
    }

    #[test]
    fn float_move_stamp_scenario() {
        let mut document = patterned();
        let initial = document.active().canvas().clone();

        // Select the top-left quarter.
        let select = document
            .active()
            .selection()
            .select_command(Rect::new(0, 0, 10, 10), CANVAS, "Select Rectangle");
        document.run(select).unwrap();
        assert!(!document.is_modified());

        // Drag it, as a move.
        let frame = document.active_mut();
        let canvas = frame.canvas().clone();
        let preview = frame.begin_preview();
        preview.begin_float(&canvas, false).unwrap();
        preview.offset(Point::new(5, 5));
        let drag = frame.finish_preview("Move Selection").unwrap();
        document.run(drag).unwrap();

        let state = document.active().selection().state().clone();
        assert_eq!(state.region(), Rect::new(5, 5, 10, 10));
        assert_eq!(
            state.floating().map(|float| float.origin()),
            Some(FloatOrigin::Moved {
                hole: Rect::new(0, 0, 10, 10)
            })
        );
        // Not painted yet.
        assert_eq!(document.active().canvas(), &initial);
        assert!(document.is_modified());

        let stamp = document.active().selection().stamp_command(CANVAS).unwrap();
        assert_eq!(stamp.kind(), CommandKind::Hybrid);
        document.run(stamp).unwrap();
        let stamped = document.active().canvas().clone();
        // Uncovered part of the hole is background.
        assert_eq!(stamped.get(Point::new(0, 0)), Some(Color::WHITE));
        assert_eq!(stamped.get(Point::new(4, 9)), Some(Color::WHITE));
        // Lifted content landed offset by 5,5.
        assert_eq!(stamped.sub_copy(Rect::new(5, 5, 10, 10)), initial.sub_copy(Rect::new(0, 0, 10, 10)));
        // Outside both, untouched.
        assert_eq!(stamped.get(Point::new(19, 0)), initial.get(Point::new(19, 0)));
        assert_eq!(
            document.active().selection().state(),
            &SelectionState::fixed(Rect::new(5, 5, 10, 10))
        );

        // Undo the stamp: canvas back, still floating.
        document.undo().unwrap();
        assert_eq!(document.active().canvas(), &initial);
        assert_eq!(document.active().selection().state(), &state);
        // Undo the drag: fixed at the original place.
        document.undo().unwrap();
        assert_eq!(
            document.active().selection().state(),
            &SelectionState::fixed(Rect::new(0, 0, 10, 10))
        );
        assert!(!document.is_modified());

        document.redo().unwrap();
        document.redo().unwrap();
        assert_eq!(document.active().canvas(), &stamped);
    }
    #[test]
    fn copy_leaves_source() {
        let mut document = patterned();
        let initial = document.active().canvas().clone();
        let select = document
            .active()
            .selection()
            .select_command(Rect::new(0, 0, 4, 4), CANVAS, "Select");
        document.run(select).unwrap();
        let frame = document.active();
        let float = frame.selection().float_command(frame.canvas(), true).unwrap().unwrap();
        document.run(float).unwrap();
        let step = document
            .active()
            .selection()
            .move_command(Point::new(12, 12))
            .unwrap();
        document.run(step).unwrap();
        let stamp = document.active().selection().stamp_command(CANVAS).unwrap();
        document.run(stamp).unwrap();

        let canvas = document.active().canvas();
        assert_eq!(canvas.sub_copy(Rect::new(0, 0, 4, 4)), initial.sub_copy(Rect::new(0, 0, 4, 4)));
        assert_eq!(canvas.sub_copy(Rect::new(12, 12, 4, 4)), initial.sub_copy(Rect::new(0, 0, 4, 4)));
    }
    #[test]
    fn deselect_then_select_one_step() {
        let mut document = patterned();
        let select = document
            .active()
            .selection()
            .select_command(Rect::new(0, 0, 4, 4), CANVAS, "Select");
        document.run(select).unwrap();
        let steps = document.history().len();

        let deselect = document.active().selection().deselect_command(CANVAS).unwrap();
        document.run(deselect).unwrap();
        let select = document
            .active()
            .selection()
            .select_command(Rect::new(8, 8, 4, 4), CANVAS, "Select Again");
        document.run(select).unwrap();
        assert_eq!(document.history().len(), steps + 1);
        assert_eq!(document.history().undo_name(), Some("Select Again"));

        document.undo().unwrap();
        assert_eq!(
            document.active().selection().state(),
            &SelectionState::fixed(Rect::new(0, 0, 4, 4))
        );
    }
    #[test]
    fn moving_fixed_selection_stays_saved() {
        let mut document = patterned();
        let select = document
            .active()
            .selection()
            .select_command(Rect::new(0, 0, 4, 4), CANVAS, "Select");
        document.run(select).unwrap();
        document.mark_saved();
        let step = document
            .active()
            .selection()
            .move_command(Point::new(5, 5))
            .unwrap();
        document.run(step).unwrap();
        assert!(!document.active().selection().state().is_floating());
        assert!(!document.is_modified());
    }
    #[test]
    fn clone_then_deselect() {
        let mut document = patterned();
        let initial = document.active().canvas().clone();
        let select = document
            .active()
            .selection()
            .select_command(Rect::new(0, 0, 4, 4), CANVAS, "Select");
        document.run(select).unwrap();
        let offset = {
            let frame = document.active();
            frame
                .selection()
                .offset_command(frame.canvas(), Point::new(6, 0))
                .unwrap()
                .unwrap()
        };
        document.run(offset).unwrap();
        let clone = document.active().selection().clone_command(CANVAS).unwrap();
        document.run(clone).unwrap();
        assert_eq!(document.history().undo_name(), Some("Clone Selection"));
        let step = document
            .active()
            .selection()
            .move_command(Point::new(12, 0))
            .unwrap();
        document.run(step).unwrap();
        let deselect = document.active().selection().deselect_command(CANVAS).unwrap();
        document.run(deselect).unwrap();

        let canvas = document.active().canvas();
        let source = initial.sub_copy(Rect::new(0, 0, 4, 4));
        assert_eq!(canvas.sub_copy(Rect::new(6, 0, 4, 4)), source);
        assert_eq!(canvas.sub_copy(Rect::new(12, 0, 4, 4)), source);
        assert_eq!(canvas.get(Point::new(0, 0)), Some(Color::WHITE));
    }
    #[test]
    fn undo_cancels_preview() {
        let mut document = patterned();
        document.active_mut().begin_preview().select(Rect::new(1, 1, 1, 1));
        document.undo().unwrap();
        assert!(!document.active().is_previewing());
    }
    #[test]
    fn offset_nudges_fold() {
        let mut document = patterned();
        let select = document
            .active()
            .selection()
            .select_command(Rect::new(0, 0, 4, 4), CANVAS, "Select");
        document.run(select).unwrap();
        let steps = document.history().len();
        for _ in 0..3 {
            let frame = document.active();
            let nudge = frame
                .selection()
                .offset_command(frame.canvas(), Point::new(1, 0))
                .unwrap()
                .unwrap();
            document.run(nudge).unwrap();
        }
        assert_eq!(document.history().len(), steps + 1);
        assert_eq!(document.active().selection().state().region(), Rect::new(3, 0, 4, 4));
        document.undo().unwrap();
        assert_eq!(
            document.active().selection().state(),
            &SelectionState::fixed(Rect::new(0, 0, 4, 4))
        );
    }
    #[test]
    fn frames() {
        let mut document = patterned();
        let first = document.active_id();
        let second = document
            .add_frame(Size::new(4, 4), Color::BLACK, SelectionOptions::default())
            .unwrap();
        assert_eq!(document.frames().count(), 2);
        assert!(document.set_active(second));
        let fill = crate::commands::DrawCommand::from(crate::commands::Draw::FillRect {
            rect: Rect::new(0, 0, 1, 1),
            color: Color::WHITE,
        });
        document.run(fill.into()).unwrap();
        assert!(document.remove_frame(second).is_some());
        assert_eq!(document.active_id(), first);
        assert!(document.remove_frame(first).is_none());
        // The pattern is still undoable, the removed frame's fill is gone.
        assert_eq!(document.history().undo_name(), Some("Put Pixels"));
    }
}
