pub mod batch;
pub mod cost;
pub mod period;

pub use batch::*;
pub use cost::*;
pub use period::*;
