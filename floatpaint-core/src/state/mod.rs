pub mod document;
pub mod frame;

pub use document::{Document, DocumentID};
pub use frame::{ActiveSelection, Frame, FrameID};
