// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! The format registry: catalogue of registered formats and the
//! converter edges between them.
//!
//! Plugins register formats and converters at startup; afterwards the
//! registry is only read. Callers that need to share it across threads
//! wrap it in an `Arc` once registration is done (build once, then
//! freeze).

use std::collections::HashMap;

use tracing::debug;

use crate::converter::{Converter, ConverterId, ConverterKind, ConvertFn, DetectFn};
use crate::error::FormatError;
use crate::format::{FormatId, ObjFormat};

/// Owns every [`ObjFormat`] and [`Converter`]; hands out copyable
/// arena handles.
#[derive(Default)]
pub struct FormatRegistry {
    formats: Vec<ObjFormat>,
    converters: Vec<Converter>,
    by_name: HashMap<String, FormatId>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new format. The name must be unique within the
    /// registry.
    pub fn register_format(
        &mut self,
        name: &str,
        objtype: &str,
    ) -> Result<FormatId, FormatError> {
        if self.by_name.contains_key(name) {
            return Err(FormatError::DuplicateFormat(name.to_string()));
        }

        let id = FormatId(self.formats.len());
        self.formats.push(ObjFormat::new(name, objtype));
        self.by_name.insert(name.to_string(), id);
        debug!(format = name, objtype, "registered format");
        Ok(id)
    }

    /// Register a converter edge between two already-registered
    /// formats. Use [`register_detector`] for detector edges.
    ///
    /// [`register_detector`]: FormatRegistry::register_detector
    pub fn register_converter(
        &mut self,
        kind: ConverterKind,
        source: &str,
        target: &str,
        convert: ConvertFn,
    ) -> Result<ConverterId, FormatError> {
        let source = self.lookup(source)?;
        let target = self.lookup(target)?;

        let id = ConverterId(self.converters.len());
        self.converters.push(Converter { source, target, kind, convert: Some(convert), detect: None });
        debug!(
            from = self.format(source).name(),
            to = self.format(target).name(),
            ?kind,
            "registered converter"
        );
        Ok(id)
    }

    /// Register a detector edge: a zero-transform predicate that tests
    /// whether data nominally in `source` already matches `target`.
    pub fn register_detector(
        &mut self,
        source: &str,
        target: &str,
        detect: DetectFn,
    ) -> Result<ConverterId, FormatError> {
        let source = self.lookup(source)?;
        let target = self.lookup(target)?;

        let id = ConverterId(self.converters.len());
        self.converters.push(Converter {
            source,
            target,
            kind: ConverterKind::Detector,
            convert: None,
            detect: Some(detect),
        });
        debug!(
            from = self.format(source).name(),
            to = self.format(target).name(),
            "registered detector"
        );
        Ok(id)
    }

    /// Look up a format by name.
    pub fn find_format(&self, name: &str) -> Option<FormatId> {
        self.by_name.get(name).copied()
    }

    pub fn format(&self, id: FormatId) -> &ObjFormat {
        &self.formats[id.index()]
    }

    pub fn converter(&self, id: ConverterId) -> &Converter {
        &self.converters[id.index()]
    }

    pub fn num_formats(&self) -> usize {
        self.formats.len()
    }

    pub fn num_converters(&self) -> usize {
        self.converters.len()
    }

    /// Find the first non-detector converter between two formats.
    pub fn find_converter(&self, source: FormatId, target: FormatId) -> Option<ConverterId> {
        self.converters
            .iter()
            .position(|c| c.source == source && c.target == target && !c.is_detector())
            .map(ConverterId)
    }

    /// Find the detector edge between two formats, if one is
    /// registered.
    pub fn find_detector(&self, source: FormatId, target: FormatId) -> Option<ConverterId> {
        self.converters
            .iter()
            .position(|c| c.source == source && c.target == target && c.is_detector())
            .map(ConverterId)
    }

    /// All converter edges leaving `source`, in registration order.
    pub(crate) fn outgoing(
        &self,
        source: FormatId,
    ) -> impl Iterator<Item = (ConverterId, &Converter)> {
        self.converters
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.source == source)
            .map(|(i, c)| (ConverterId(i), c))
    }

    fn lookup(&self, name: &str) -> Result<FormatId, FormatError> {
        self.find_format(name).ok_or_else(|| FormatError::UnknownFormat(name.to_string()))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
