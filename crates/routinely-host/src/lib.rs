//! Runtime around a routinely [`Scheduler`](routinely_scheduler::Scheduler)
//!
//! Loads routines from a TOML config, ticks the scheduler on a tokio
//! interval and stops on a tick budget or a shutdown signal.

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod shutdown;

pub use config::{ConfigLoadError, RoutineConfig, RoutinelyConfig, SchedulerConfig};
pub use error::HostError;
pub use host::RoutineHost;
pub use logging::init_logging;
pub use shutdown::{shutdown_channel, shutdown_on_ctrl_c};
