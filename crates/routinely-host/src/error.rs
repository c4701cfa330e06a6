use routinely_scheduler::RoutineError;

/// Failure seeding the scheduler from config
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Failed to create routine '{tag}': {source}")]
    Routine {
        tag: String,
        #[source]
        source: RoutineError,
    },

    #[error("Routine '{tag}' has an unsupported {kind} argument")]
    UnsupportedArgument { tag: String, kind: &'static str },
}
