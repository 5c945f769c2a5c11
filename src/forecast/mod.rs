pub mod confidence;
pub mod engine;
pub mod features;
pub mod metrics;

pub use confidence::*;
pub use engine::*;
pub use features::*;
pub use metrics::*;
