// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Applying a found path to a data buffer, and walking detectors to
//! pin down what format a buffer is really in.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::converter::ConverterKind;
use crate::error::FormatError;
use crate::format::FormatId;
use crate::path::ConverterPath;
use crate::registry::FormatRegistry;

/// A byte buffer tagged with its current format. Mutated in place by
/// [`FormatRegistry::apply_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    pub(crate) bytes: Vec<u8>,
    pub(crate) format: FormatId,
}

impl Data {
    pub fn new(bytes: Vec<u8>, format: FormatId) -> Self {
        Self { bytes, format }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> FormatId {
        self.format
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl FormatRegistry {
    /// Apply each edge of `path` to `data` in order, replacing its
    /// bytes and format as it goes. Detector edges only advance the
    /// format tag.
    ///
    /// On any step failure the buffer is restored to its pre-call bytes
    /// and format before the error is returned, so a failed conversion
    /// never leaves partially converted data behind.
    pub fn apply_path(&self, path: &ConverterPath, data: &mut Data) -> Result<(), FormatError> {
        let original = data.clone();

        for &edge in path.edges() {
            let conv = self.converter(edge);
            if conv.is_detector() {
                data.format = conv.target();
                continue;
            }
            match conv.run(&data.bytes, path.config()) {
                Ok(out) => {
                    trace!(
                        from = self.format(conv.source()).name(),
                        to = self.format(conv.target()).name(),
                        len = out.len(),
                        "converted"
                    );
                    data.bytes = out;
                    data.format = conv.target();
                }
                Err(err) => {
                    *data = original;
                    return Err(FormatError::ConvertFailed {
                        from: self.format(conv.source()).name().to_string(),
                        target: self.format(conv.target()).name().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Determine the deepest format a buffer nominally in `start`
    /// actually matches.
    ///
    /// At each step the detectors out of the current format are tried;
    /// when one accepts, its target becomes the current format. If a
    /// decap converter exists for the confirmed pair it is applied, so
    /// deeper detectors see the unwrapped payload. The walk stops when
    /// no detector fires (or a format repeats) and returns the format
    /// reached.
    pub fn detect_format(&self, bytes: &[u8], start: &str) -> Result<FormatId, FormatError> {
        let mut current = self
            .find_format(start)
            .ok_or_else(|| FormatError::UnknownFormat(start.to_string()))?;
        let mut buf = bytes.to_vec();
        let mut seen: HashSet<FormatId> = HashSet::new();
        seen.insert(current);

        'walk: loop {
            for (_, conv) in self.outgoing(current) {
                if !conv.is_detector() || !conv.detects(&buf) {
                    continue;
                }
                let target = conv.target();

                if let Some(id) = self.find_converter(current, target) {
                    let decap = self.converter(id);
                    if decap.kind() == ConverterKind::Decap {
                        match decap.run(&buf, None) {
                            Ok(out) => buf = out,
                            // Cannot unwrap further; the format reached
                            // so far stands.
                            Err(_) => break 'walk,
                        }
                    }
                }

                if !seen.insert(target) {
                    break 'walk;
                }
                current = target;
                continue 'walk;
            }
            break;
        }

        debug!(start, detected = self.format(current).name(), "format detected");
        Ok(current)
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
