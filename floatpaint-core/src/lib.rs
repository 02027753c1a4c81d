#![warn(clippy::pedantic)]

pub mod bitmap;
pub mod color;
pub mod commands;
pub mod geom;
pub mod history;
pub mod id;
pub mod selection;
pub mod state;

pub use id::UniqueID;
