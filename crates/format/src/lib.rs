// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! accord-format: the format-conversion engine.
//!
//! A registry of named, typed data formats and converter edges between
//! them, a path finder that searches the converter graph for the best
//! route between formats, and a runner that applies a found path to a
//! data buffer.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod converter;
pub mod error;
pub mod format;
pub mod path;
pub mod registry;
pub mod runner;

pub use converter::{ConvertFn, Converter, ConverterId, ConverterKind, DetectFn};
pub use error::FormatError;
pub use format::{FormatId, ObjFormat};
pub use path::ConverterPath;
pub use registry::FormatRegistry;
pub use runner::Data;
