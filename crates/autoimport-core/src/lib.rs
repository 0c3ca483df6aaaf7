//! Core infrastructure for autoimport.
//!
//! This crate provides language-agnostic infrastructure shared by every
//! language adapter:
//! - Style descriptor: the formatting preferences detected from a file
//! - Source view: a line-indexed, mutable view over file text
//! - Text position utilities: byte offset <-> line/column conversions
//! - A unified error type and stable error codes

pub mod error;
pub mod source_view;
pub mod style;
pub mod text;
pub mod types;
