mod camera;
mod entry;
mod source;

pub use camera::*;
pub use entry::*;
pub use source::*;
