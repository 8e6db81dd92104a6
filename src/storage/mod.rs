mod fs;
mod scan;

pub use fs::*;
pub use scan::*;
