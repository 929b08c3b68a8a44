pub mod error;
pub mod model;
pub mod monitor;
pub mod validation;

pub use error::{Error, Result};
pub use model::{HealthMetrics, LayerHealth, LayerStatus, SystemHealth, SystemStatus, ValidationReport};
pub use monitor::HealthMonitor;
pub use validation::validate_all_conversations;
