// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Converter edges between formats.

use crate::error::FormatError;
use crate::format::FormatId;

/// Stable handle to a converter owned by a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConverterId(pub(crate) usize);

impl ConverterId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// What a converter edge does to the data passing over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterKind {
    /// Plain conversion between two representations.
    Conv,
    /// Wrap inner-format data back into an outer envelope. Lossless
    /// with respect to its decap counterpart.
    Encap,
    /// Unwrap an outer format to reveal the inner payload. Discards
    /// the envelope, so this edge is inherently lossy.
    Decap,
    /// A zero-transform predicate edge used only to test whether data
    /// already matches a deeper format.
    Detector,
}

impl ConverterKind {
    /// Lossy edges are penalized by the path finder.
    pub fn is_lossy(self) -> bool {
        matches!(self, ConverterKind::Decap)
    }
}

/// Transform function: input bytes plus an optional per-path config
/// string, producing the converted bytes.
pub type ConvertFn =
    Box<dyn Fn(&[u8], Option<&str>) -> Result<Vec<u8>, FormatError> + Send + Sync>;

/// Detector predicate: does this byte sample match the target format?
pub type DetectFn = Box<dyn Fn(&[u8]) -> bool + Send + Sync>;

/// A typed edge in the converter graph.
///
/// Created once at registration time, owned by the registry, never
/// mutated afterwards.
pub struct Converter {
    pub(crate) source: FormatId,
    pub(crate) target: FormatId,
    pub(crate) kind: ConverterKind,
    pub(crate) convert: Option<ConvertFn>,
    pub(crate) detect: Option<DetectFn>,
}

impl Converter {
    pub fn source(&self) -> FormatId {
        self.source
    }

    pub fn target(&self) -> FormatId {
        self.target
    }

    pub fn kind(&self) -> ConverterKind {
        self.kind
    }

    pub fn is_detector(&self) -> bool {
        self.kind == ConverterKind::Detector
    }

    /// Run the detector predicate on a byte sample. Non-detector edges
    /// match unconditionally.
    pub(crate) fn detects(&self, bytes: &[u8]) -> bool {
        match &self.detect {
            Some(f) => f(bytes),
            None => true,
        }
    }

    /// Apply the transform. Detector edges carry no transform and pass
    /// the bytes through untouched.
    pub(crate) fn run(
        &self,
        bytes: &[u8],
        config: Option<&str>,
    ) -> Result<Vec<u8>, FormatError> {
        match &self.convert {
            Some(f) => f(bytes, config),
            None => Ok(bytes.to_vec()),
        }
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("kind", &self.kind)
            .finish()
    }
}
