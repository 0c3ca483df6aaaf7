//! Core data model layer shared across the language adapter.

pub mod imports;

pub use imports::{
    DepInfo, ExistingImport, ExportKind, LibEntry, LibsToAdd, ModuleId, Priority, RegistryEntry,
};
