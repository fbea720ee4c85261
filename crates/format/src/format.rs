// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Object formats: named, typed data representations.

use std::fmt;

/// Stable handle to a format owned by a [`FormatRegistry`].
///
/// Handles are plain indices into the registry's format arena and stay
/// valid for the registry's lifetime (formats are never removed).
///
/// [`FormatRegistry`]: crate::registry::FormatRegistry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatId(pub(crate) usize);

impl FormatId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// A named data representation (e.g. "vcard30") tagged with an object
/// type (e.g. "contact"). Immutable after registration; the name is
/// unique within a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjFormat {
    name: String,
    objtype: String,
}

impl ObjFormat {
    pub(crate) fn new(name: impl Into<String>, objtype: impl Into<String>) -> Self {
        Self { name: name.into(), objtype: objtype.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn objtype(&self) -> &str {
        &self.objtype
    }
}

impl fmt::Display for ObjFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.objtype)
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
