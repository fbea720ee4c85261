// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Best-first search over the converter graph.
//!
//! The finder walks converter edges outward from the source format,
//! popping candidate vertices in lexicographic cost order: fewest lossy
//! edges, then fewest object-type changes, then fewest conversions.
//! Cost is accumulated per edge as the frontier expands, so no second
//! pass over candidate paths is needed.
//!
//! Detector edges are gated by their predicate, and a decap edge with a
//! registered detector for the same format pair is gated by that
//! predicate too: detection overrides nominal adjacency. Vertex bytes
//! are materialized lazily, only when some predicate actually needs
//! them.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::converter::{ConverterId, ConverterKind};
use crate::error::FormatError;
use crate::format::FormatId;
use crate::registry::FormatRegistry;
use crate::runner::Data;

/// An ordered list of converter edges from one format to another, plus
/// an optional configuration string handed to each transform when the
/// path is applied.
#[derive(Debug, Clone)]
pub struct ConverterPath {
    edges: Vec<ConverterId>,
    config: Option<String>,
}

impl ConverterPath {
    pub(crate) fn new(edges: Vec<ConverterId>) -> Self {
        Self { edges, config: None }
    }

    pub fn edges(&self) -> &[ConverterId] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn set_config(&mut self, config: impl Into<String>) {
        self.config = Some(config.into());
    }

    pub fn config(&self) -> Option<&str> {
        self.config.as_deref()
    }
}

/// Lexicographic path cost. Field order is the comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Cost {
    lossy: u32,
    objtype_changes: u32,
    edges: u32,
}

impl Cost {
    const ZERO: Cost = Cost { lossy: 0, objtype_changes: 0, edges: 0 };
}

enum Bytes {
    Pending,
    Ready(Rc<Vec<u8>>),
    /// A converter failed while replaying this chain; every gated edge
    /// out of this vertex is disqualified.
    Failed,
}

/// A search vertex: a format reached via a chain of edges back to the
/// source. Bytes are replayed from the source sample on first demand.
struct Vertex {
    format: FormatId,
    parent: Option<(Rc<Vertex>, ConverterId)>,
    cost: Cost,
    bytes: RefCell<Bytes>,
}

impl Vertex {
    fn root(format: FormatId, sample: &[u8]) -> Rc<Self> {
        Rc::new(Self {
            format,
            parent: None,
            cost: Cost::ZERO,
            bytes: RefCell::new(Bytes::Ready(Rc::new(sample.to_vec()))),
        })
    }

    fn child(self: &Rc<Self>, edge: ConverterId, format: FormatId, cost: Cost) -> Rc<Self> {
        Rc::new(Self {
            format,
            parent: Some((Rc::clone(self), edge)),
            cost,
            bytes: RefCell::new(Bytes::Pending),
        })
    }

    /// Edge ids from the source to this vertex, in application order.
    fn path(&self) -> Vec<ConverterId> {
        let mut edges = Vec::new();
        let mut cur = self;
        while let Some((parent, edge)) = &cur.parent {
            edges.push(*edge);
            cur = parent;
        }
        edges.reverse();
        edges
    }
}

/// Materialize the bytes at a vertex by replaying its edge chain.
/// Returns `None` if any converter on the chain failed.
fn materialize(registry: &FormatRegistry, vertex: &Rc<Vertex>) -> Option<Rc<Vec<u8>>> {
    match &*vertex.bytes.borrow() {
        Bytes::Ready(bytes) => return Some(Rc::clone(bytes)),
        Bytes::Failed => return None,
        Bytes::Pending => {}
    }

    let (parent, edge) = match &vertex.parent {
        Some(pair) => pair,
        // Root vertices are constructed Ready.
        None => return None,
    };

    let result = materialize(registry, parent).and_then(|input| {
        let conv = registry.converter(*edge);
        if conv.is_detector() {
            // Detectors never transform; the bytes pass through.
            return Some(input);
        }
        match conv.run(&input, None) {
            Ok(out) => Some(Rc::new(out)),
            Err(err) => {
                trace!(%err, "converter failed during search, edge disqualified");
                None
            }
        }
    });

    *vertex.bytes.borrow_mut() = match &result {
        Some(bytes) => Bytes::Ready(Rc::clone(bytes)),
        None => Bytes::Failed,
    };
    result
}

struct Entry {
    cost: Cost,
    seq: u64,
    vertex: Rc<Vertex>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.cost, self.seq).cmp(&(other.cost, other.seq))
    }
}

impl FormatRegistry {
    /// Find the cheapest conversion route from the data's current
    /// format to one of `targets`.
    ///
    /// A target matching `preferred` wins over any other target, even a
    /// nearer one. Among paths to the same target, fewer lossy edges
    /// beat fewer object-type changes beat fewer edges.
    pub fn find_path(
        &self,
        data: &Data,
        targets: &[FormatId],
        preferred: Option<FormatId>,
    ) -> Result<ConverterPath, FormatError> {
        if targets.is_empty() {
            return Err(FormatError::NoTargets);
        }
        let source = data.format();
        if targets.contains(&source) && preferred.map_or(true, |p| p == source) {
            return Ok(ConverterPath::new(Vec::new()));
        }

        let mut heap = BinaryHeap::new();
        let mut finalized: HashSet<FormatId> = HashSet::new();
        let mut seq: u64 = 0;
        let mut fallback: Option<Rc<Vertex>> = None;

        heap.push(Reverse(Entry {
            cost: Cost::ZERO,
            seq,
            vertex: Vertex::root(source, data.bytes()),
        }));

        // Each format is finalized at most once, so the loop is bounded
        // by the number of registered formats even if the graph cycles.
        let cap = self.num_formats();
        let mut popped = 0usize;

        while let Some(Reverse(Entry { vertex, .. })) = heap.pop() {
            if !finalized.insert(vertex.format) {
                continue;
            }
            popped += 1;

            if targets.contains(&vertex.format) {
                if preferred.map_or(true, |p| p == vertex.format) {
                    debug!(
                        to = self.format(vertex.format).name(),
                        edges = vertex.cost.edges,
                        lossy = vertex.cost.lossy,
                        "conversion path found"
                    );
                    return Ok(ConverterPath::new(vertex.path()));
                }
                // Keep the first (cheapest) non-preferred hit in case
                // the preferred target turns out to be unreachable.
                if fallback.is_none() {
                    fallback = Some(Rc::clone(&vertex));
                }
            }

            if popped > cap {
                break;
            }

            for (edge, conv) in self.outgoing(vertex.format) {
                if finalized.contains(&conv.target()) {
                    continue;
                }
                // A detector sharing its pair with a real converter is
                // a gate for that converter, not a route of its own.
                if conv.is_detector()
                    && self.find_converter(conv.source(), conv.target()).is_some()
                {
                    continue;
                }

                let gate = match conv.kind() {
                    ConverterKind::Detector => Some(edge),
                    ConverterKind::Decap => self.find_detector(conv.source(), conv.target()),
                    _ => None,
                };
                if let Some(det) = gate {
                    let Some(bytes) = materialize(self, &vertex) else {
                        continue;
                    };
                    if !self.converter(det).detects(&bytes) {
                        continue;
                    }
                }

                let crosses_objtype =
                    self.format(conv.source()).objtype() != self.format(conv.target()).objtype();
                let cost = Cost {
                    lossy: vertex.cost.lossy + u32::from(conv.kind().is_lossy()),
                    objtype_changes: vertex.cost.objtype_changes + u32::from(crosses_objtype),
                    edges: vertex.cost.edges + u32::from(!conv.is_detector()),
                };

                seq += 1;
                heap.push(Reverse(Entry { cost, seq, vertex: vertex.child(edge, conv.target(), cost) }));
            }
        }

        if let Some(vertex) = fallback {
            debug!(
                to = self.format(vertex.format).name(),
                "preferred target unreachable, using cheapest alternative"
            );
            return Ok(ConverterPath::new(vertex.path()));
        }

        Err(FormatError::NoPath {
            from: self.format(source).name().to_string(),
            targets: targets.iter().map(|t| self.format(*t).name().to_string()).collect(),
        })
    }
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
