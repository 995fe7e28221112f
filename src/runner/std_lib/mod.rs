//! Standard library built-in objects.
//!
//! Every realm gets its own copy of these, so prototypes never cross realm boundaries.

pub mod builtin;
pub mod core;
pub mod console;
pub mod object;
pub mod array;
pub mod error;
pub mod promise;
pub mod primitive;
pub mod regexp;
pub mod typed_array;
pub mod dom;

pub use builtin::BuiltInObject;
pub use core::install_builtins;
