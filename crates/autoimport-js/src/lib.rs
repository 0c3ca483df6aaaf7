//! JavaScript/TypeScript adapter: `oxc`-based parsing and the rewrite
//! pipeline that turns a parsed file into a corrected import block.
//!
//! - `parser`: parser/semantic-analysis adapter (C3)
//! - `existing_imports`: existing import/require extractor (C4)
//! - `export_analyzer`: static export analysis for project files (C5)
//! - `resolver`: missing-identifier resolver (C8)
//! - `composer`: import block composer (C9)
//! - `rewriter`: source splice (C10)
//! - `files`: project source file collection
//! - `layers`: shared data model (module ids, registry entries, merged targets)

pub mod composer;
pub mod existing_imports;
pub mod export_analyzer;
pub mod files;
pub mod layers;
pub mod parser;
pub mod resolver;
pub mod rewriter;
