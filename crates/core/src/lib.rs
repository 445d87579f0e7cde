pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use config::{ApiConfig, AppConfig, DatabaseConfig, DispatcherConfig, ObservabilityConfig};
pub use errors::*;
pub use models::{Job, JobStatus, Target, TargetLoad};
pub use traits::{TargetRegistry, TargetSelectionStrategy};
