// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Error taxonomy for the conversion engine.

use thiserror::Error;

/// Errors from registration, path search, and path application.
#[derive(Debug, Error)]
pub enum FormatError {
    /// A format with this name is already registered.
    #[error("format {0:?} is already registered")]
    DuplicateFormat(String),

    /// A converter or lookup referenced a format name the registry
    /// does not know.
    #[error("unknown format {0:?}")]
    UnknownFormat(String),

    /// The target list passed to the path finder was empty.
    #[error("no target formats given")]
    NoTargets,

    /// No conversion route exists from the source to any acceptable
    /// target (including the case where a detector rejected every
    /// candidate route).
    #[error("no conversion path from {from:?} to any of {targets:?}")]
    NoPath { from: String, targets: Vec<String> },

    /// A converter's transform function failed on the given bytes.
    #[error("converter {from:?} -> {target:?} failed: {reason}")]
    ConvertFailed { from: String, target: String, reason: String },

    /// A converter function rejected its input as malformed.
    ///
    /// This is the variant converter authors return from their own
    /// transform closures.
    #[error("malformed input: {0}")]
    MalformedInput(String),
}
