//! Foundation types for rule generation.
//!
//! This module provides the primitive identifiers used throughout the engine:
//! - [`DirPath`] - Normalized repository-relative directory
//! - [`TypeName`] - Fully-qualified type name (`com.example.Foo`)
//! - [`Label`] - Build target label (`@repo//pkg:name`)
//!
//! This module has NO dependencies on other rulegen modules.

mod dir_path;
mod label;
mod type_name;

pub use dir_path::DirPath;
pub use label::{Label, LabelParseError};
pub use type_name::TypeName;
