pub mod demo;
pub mod dsl;
pub mod engine;
pub mod error;
pub mod loader;
pub mod registry;
pub mod settings;
pub mod sink;
pub mod value;

pub use engine::Engine;
pub use error::{CommandError, RegistryError};
pub use value::{ConsoleObject, Value};
