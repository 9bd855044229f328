mod market;
mod source;
mod write;

pub use market::*;
pub use source::*;
pub use write::*;
