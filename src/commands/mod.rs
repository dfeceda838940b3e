pub mod builtins;
pub mod registry;

pub use registry::{BuiltinCommand, BuiltinRegistry, BUILTINS};
