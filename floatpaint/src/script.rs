//! Edit scripts - a list of steps replayed against a document, standing in for a user at the canvas.
//!
//! ```toml
//! [[step]]
//! action = "select"
//! x = 0
//! y = 0
//! width = 10
//! height = 10
//!
//! [[step]]
//! action = "move_to"
//! x = 5
//! y = 5
//!
//! [[step]]
//! action = "stamp"
//! ```

use anyhow::Context;
use floatpaint_core::{
    bitmap::Bitmap,
    color::Color,
    commands::{Command, Draw, DrawCommand, ResizeCanvas},
    geom::{Point, Rect, Size},
    selection::SelectionOptions,
    state::Document,
};

fn default_color() -> [u8; 4] {
    Color::BLACK.into()
}

#[derive(serde::Deserialize, strum::AsRefStr, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Step {
    Select {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    /// Lift the selection off the canvas.
    Float {
        #[serde(default)]
        copy: bool,
    },
    /// Drag the selection to a new top-left, floating it first if needed.
    MoveTo {
        x: i32,
        y: i32,
        #[serde(default)]
        copy: bool,
    },
    /// Nudge the selection, as with the arrow keys.
    Offset {
        dx: i32,
        dy: i32,
    },
    Stamp,
    /// Stamp the float where it is and keep floating a copy.
    CloneFloat,
    Deselect,
    Discard,
    /// Paste a solid block, as a floating selection.
    PasteFill {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        #[serde(default = "default_color")]
        color: [u8; 4],
    },
    FillRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        #[serde(default = "default_color")]
        color: [u8; 4],
    },
    Resize {
        width: u32,
        height: u32,
        fill: Option<[u8; 4]>,
    },
    SetOptions {
        mask: Option<bool>,
        background: Option<[u8; 4]>,
        alpha_blend: Option<bool>,
    },
    Undo,
    Redo,
    OpenGroup {
        name: String,
    },
    CloseGroup,
    Save,
}

#[derive(serde::Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}
impl Script {
    pub fn parse(string: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(string)?)
    }
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let string = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::parse(&string).with_context(|| format!("Failed to parse script {}", path.display()))
    }
    /// Run every step in order, stopping at the first failure.
    pub fn run(&self, document: &mut Document, fill: Color) -> anyhow::Result<()> {
        for (idx, step) in self.steps.iter().enumerate() {
            log::debug!("step {idx}: {step:?}");
            step.run(document, fill)
                .with_context(|| format!("Step {idx} ({}) failed", step.as_ref()))?;
        }
        Ok(())
    }
}

fn run_some(document: &mut Document, command: Option<Command>, step: &Step) -> anyhow::Result<()> {
    match command {
        Some(command) => {
            document.run(command)?;
        }
        None => log::info!("{} had nothing to do", step.as_ref()),
    }
    Ok(())
}

impl Step {
    /// Perform this step on the active frame of `document`. `fill` is used for new canvas area.
    pub fn run(&self, document: &mut Document, fill: Color) -> anyhow::Result<()> {
        let frame = document.active();
        let bounds = frame.bounds();
        let selection = frame.selection();
        match self {
            Self::Select {
                x,
                y,
                width,
                height,
            } => {
                let command =
                    selection.select_command(Rect::new(*x, *y, *width, *height), bounds, "Select Rectangle");
                document.run(command)?;
            }
            Self::Float { copy } => {
                let command = selection.float_command(frame.canvas(), *copy)?;
                run_some(document, command, self)?;
            }
            Self::MoveTo { x, y, copy } => {
                let frame = document.active_mut();
                let canvas = frame.canvas().clone();
                let preview = frame.begin_preview();
                if !preview.exists() {
                    frame.cancel_preview();
                    anyhow::bail!("Nothing selected to move");
                }
                if let Err(err) = preview.begin_float(&canvas, *copy) {
                    frame.cancel_preview();
                    return Err(err.into());
                }
                preview.move_to(Point::new(*x, *y));
                let command = frame.finish_preview("Move Selection");
                run_some(document, command, self)?;
            }
            Self::Offset { dx, dy } => {
                let command = selection.offset_command(frame.canvas(), Point::new(*dx, *dy))?;
                run_some(document, command, self)?;
            }
            Self::Stamp => {
                let command = selection.stamp_command(bounds);
                run_some(document, command, self)?;
            }
            Self::CloneFloat => {
                let command = selection.clone_command(bounds);
                run_some(document, command, self)?;
            }
            Self::Deselect => {
                let command = selection.deselect_command(bounds);
                run_some(document, command, self)?;
            }
            Self::Discard => {
                let command = selection.discard_command();
                run_some(document, command, self)?;
            }
            Self::PasteFill {
                x,
                y,
                width,
                height,
                color,
            } => {
                let payload = Bitmap::new(Size::new(*width, *height), (*color).into())?;
                let command = selection.paste_command(payload, Point::new(*x, *y), bounds);
                document.run(command)?;
            }
            Self::FillRect {
                x,
                y,
                width,
                height,
                color,
            } => {
                let draw = DrawCommand::from(Draw::FillRect {
                    rect: Rect::new(*x, *y, *width, *height),
                    color: (*color).into(),
                });
                document.run(draw.into())?;
            }
            Self::Resize {
                width,
                height,
                fill: resize_fill,
            } => {
                let color = resize_fill.map_or(fill, Color::from);
                let resize = ResizeCanvas::new(Size::new(*width, *height), color)?;
                document.run(resize.into())?;
            }
            Self::SetOptions {
                mask,
                background,
                alpha_blend,
            } => {
                let old = selection.options();
                let options = SelectionOptions {
                    mask_enabled: mask.unwrap_or(old.mask_enabled),
                    background: background.map_or(old.background, Color::from),
                    alpha_blend: alpha_blend.unwrap_or(old.alpha_blend),
                };
                let command = selection.options_command(options);
                run_some(document, command, self)?;
            }
            Self::Undo => document.undo()?,
            Self::Redo => document.redo()?,
            Self::OpenGroup { name } => document.open_group(name.clone()),
            Self::CloseGroup => document.close_group()?,
            Self::Save => document.mark_saved(),
        }
        Ok(())
    }
}

/// Checksum of a canvas's pixel data.
#[must_use]
pub fn checksum(bitmap: &Bitmap) -> u32 {
    const CRC: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);
    CRC.checksum(bitmap.as_bytes())
}

/// Human readable summary of the document and its history.
#[must_use]
pub fn report(document: &Document) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    for frame in document.frames() {
        let _ = writeln!(
            out,
            "{}: {} canvas, crc32 {:08x}, selection {}{}",
            frame.id(),
            frame.size(),
            checksum(frame.canvas()),
            frame.selection().state().region(),
            if frame.selection().state().is_floating() {
                " (floating)"
            } else {
                ""
            },
        );
    }
    let history = document.history();
    let _ = writeln!(
        out,
        "history: {} steps, undo: {}, redo: {}, modified: {}",
        history.len(),
        history.undo_name().unwrap_or("-"),
        history.redo_name().unwrap_or("-"),
        document.is_modified(),
    );
    out
}

#[cfg(test)]
mod test {
    use super::{checksum, report, Script, Step};
    use floatpaint_core::{
        color::Color,
        geom::{Rect, Size},
        selection::SelectionOptions,
        state::Document,
    };
    fn document() -> Document {
        Document::new(Size::new(20, 20), Color::WHITE, SelectionOptions::default()).unwrap()
    }
    #[test]
    fn parse_steps() {
        let script = Script::parse(
            r#"
[[step]]
action = "select"
x = 0
y = 0
width = 10
height = 10

[[step]]
action = "move_to"
x = 5
y = 5

[[step]]
action = "stamp"

[[step]]
action = "open_group"
name = "Both"
"#,
        )
        .unwrap();
        assert_eq!(script.steps.len(), 4);
        assert_eq!(script.steps[1], Step::MoveTo { x: 5, y: 5, copy: false });
        assert_eq!(script.steps[2], Step::Stamp);
        assert!(Script::parse("[[step]]\naction = \"fly\"").is_err());
    }
    #[test]
    fn move_and_undo() {
        let mut document = document();
        let initial = checksum(document.active().canvas());
        let script = Script {
            steps: vec![
                Step::FillRect {
                    x: 0,
                    y: 0,
                    width: 10,
                    height: 10,
                    color: [0, 0, 0, 255],
                },
                Step::Select {
                    x: 0,
                    y: 0,
                    width: 10,
                    height: 10,
                },
                Step::MoveTo { x: 5, y: 5, copy: false },
                Step::Stamp,
            ],
        };
        script.run(&mut document, Color::WHITE).unwrap();
        let frame = document.active();
        assert_eq!(frame.canvas().get(floatpaint_core::geom::Point::new(0, 0)), Some(Color::WHITE));
        assert_eq!(frame.canvas().get(floatpaint_core::geom::Point::new(14, 14)), Some(Color::BLACK));
        assert_eq!(frame.selection().state().region(), Rect::new(5, 5, 10, 10));

        for _ in 0..4 {
            Step::Undo.run(&mut document, Color::WHITE).unwrap();
        }
        assert_eq!(checksum(document.active().canvas()), initial);
        assert!(Step::Undo.run(&mut document, Color::WHITE).is_err());
        assert!(report(&document).contains("redo: Fill Rectangle"));
    }
    #[test]
    fn clone_float() {
        let mut document = document();
        let script = Script::parse(
            r#"
[[step]]
action = "fill_rect"
x = 0
y = 0
width = 4
height = 4

[[step]]
action = "select"
x = 0
y = 0
width = 4
height = 4

[[step]]
action = "move_to"
x = 5
y = 0

[[step]]
action = "clone_float"

[[step]]
action = "move_to"
x = 10
y = 0

[[step]]
action = "deselect"
"#,
        )
        .unwrap();
        script.run(&mut document, Color::WHITE).unwrap();
        let canvas = document.active().canvas();
        assert_eq!(canvas.get(floatpaint_core::geom::Point::new(0, 0)), Some(Color::WHITE));
        assert_eq!(canvas.get(floatpaint_core::geom::Point::new(5, 0)), Some(Color::BLACK));
        assert_eq!(canvas.get(floatpaint_core::geom::Point::new(13, 3)), Some(Color::BLACK));
        assert!(document.is_modified());
    }
    #[test]
    fn float_nothing_fails() {
        let mut document = document();
        let err = Script {
            steps: vec![Step::Float { copy: false }],
        }
        .run(&mut document, Color::WHITE)
        .unwrap_err();
        assert!(format!("{err:#}").contains("float"));
    }
}
