mod difficulty;
mod sketch;

pub use difficulty::Difficulty;
pub use sketch::{RawVideo, SketchEntry, SketchRecord};
