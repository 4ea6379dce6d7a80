//! Shared utilities for the forge compiler.
mod errors;
mod id;
mod namegenerator;

pub use errors::{Error, ErrorKind, ForgeResult};
pub use id::{GetName, Id};
pub use namegenerator::NameGenerator;
