pub mod execution;
pub mod metadata;
pub mod step;

pub mod prelude {
    pub use crate::execution::{
        ExecuteTaskRequest, ExecutionResult, FlowDefinition, PatternDefinition,
        PayloadHandlerRequest, Platform,
    };
    pub use crate::metadata::{ActionDescriptor, PluginMetadata};
    pub use crate::step::{StepMessage, StepStatus, StepUpdate};
}
