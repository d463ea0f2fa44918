pub mod fit;
pub mod price;
pub mod report;
pub mod types;

pub use fit::*;
pub use price::*;
pub use report::*;
pub use types::*;
