//! The realm model: values, objects, realms and the agent that owns them.

pub mod agent;
pub mod array_object;
pub mod error;
pub mod error_object;
pub mod execution_context;
pub mod function_object;
pub mod host_object;
pub mod object;
pub mod object_property;
pub mod operations;
pub mod primitive_object;
pub mod promise_object;
pub mod realm;
pub mod regexp_object;
pub mod symbol;
pub mod typed_array_object;
pub mod value;
