pub mod paths;
pub mod routine_config;
pub mod routinely_config;
pub mod scheduler_config;

pub use paths::ProjectPaths;
pub use routine_config::RoutineConfig;
pub use routinely_config::{ConfigLoadError, LoggingConfig, RoutinelyConfig, EXAMPLE_CONFIG};
pub use scheduler_config::SchedulerConfig;
