pub mod features;
pub mod guard;
pub mod metrics;
pub mod model;
pub mod training;

pub use features::*;
pub use guard::*;
pub use metrics::*;
pub use model::*;
pub use training::*;
