mod decoder;
mod engine;
#[cfg(feature = "ffmpeg")]
mod probe;
mod rate;
mod timecode;

pub use decoder::*;
pub use engine::*;
#[cfg(feature = "ffmpeg")]
pub use probe::*;
pub use rate::*;
pub use timecode::*;
