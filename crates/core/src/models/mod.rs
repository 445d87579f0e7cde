pub mod job;
pub mod target;

pub use job::*;
pub use target::*;
