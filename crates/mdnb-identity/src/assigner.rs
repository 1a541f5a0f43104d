//! Identity assignment
//!
//! Gives documents and code cells stable ids without any counter or
//! database. Existing ids are never replaced, except for repeated ids
//! inside one document: the first occurrence keeps its id, later ones
//! receive fresh ids.

use crate::namespace::IdentityNamespace;
use crate::policy::IdentityPolicy;
use mdnb_annotations::resolve;
use mdnb_annotations::schema::{self, ID};
use mdnb_document::{Cell, CodeCell, ContentHash, Document};
use std::collections::HashSet;

/// What an assignment pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentReport {
    /// Document id after the pass
    pub document_id: Option<String>,
    /// Whether the document id was newly written
    pub document_assigned: bool,
    /// Whether `runme.version` was raised
    pub version_upgraded: bool,
    /// Code cells that received their first id
    pub cells_assigned: usize,
    /// Code cells re-keyed because their id repeated an earlier one
    pub collisions_healed: usize,
}

impl AssignmentReport {
    /// Whether the document was modified
    #[must_use]
    pub fn changed(&self) -> bool {
        self.document_assigned
            || self.version_upgraded
            || self.cells_assigned > 0
            || self.collisions_healed > 0
    }
}

/// Assigns ids according to an [`IdentityPolicy`]
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityAssigner {
    namespace: IdentityNamespace,
    policy: IdentityPolicy,
}

impl IdentityAssigner {
    /// Create assigner
    #[inline]
    #[must_use]
    pub fn new(namespace: IdentityNamespace, policy: IdentityPolicy) -> Self {
        Self { namespace, policy }
    }

    /// Active policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> IdentityPolicy {
        self.policy
    }

    /// Assign missing identity in place
    ///
    /// Idempotent: a second pass over an unchanged document reports no
    /// changes and leaves every id as it was.
    pub fn assign(&self, document: &mut Document) -> AssignmentReport {
        let mut report = AssignmentReport::default();
        if self.policy == IdentityPolicy::None {
            report.document_id = document.frontmatter.document_id().map(str::to_string);
            return report;
        }

        let document_id = match document.frontmatter.document_id() {
            Some(id) => id.to_string(),
            None => {
                let id = self.document_id_for(document);
                document.frontmatter.runme_mut().id = Some(id.clone());
                report.document_assigned = true;
                id
            }
        };

        let runme = document.frontmatter.runme_mut();
        if runme
            .version_level()
            .map_or(true, |level| level < self.policy.level())
        {
            runme.version = Some(self.policy.version_tag());
            report.version_upgraded = true;
        }

        let existing: HashSet<String> = document.code_cells().filter_map(cell_id).collect();
        let mut seen: HashSet<String> = HashSet::with_capacity(existing.len());

        for (ordinal, cell) in document.code_cells_mut().enumerate() {
            match cell_id(cell) {
                Some(id) if seen.insert(id.clone()) => {}
                Some(duplicate) => {
                    let fresh = self.fresh_cell_id(&document_id, ordinal, cell, &existing, &seen);
                    tracing::warn!(
                        "duplicate cell id {} at code cell {}, reassigned to {}",
                        duplicate,
                        ordinal,
                        fresh
                    );
                    write_cell_id(cell, &fresh);
                    seen.insert(fresh);
                    report.collisions_healed += 1;
                }
                None if self.policy.assigns_cells() => {
                    let fresh = self.fresh_cell_id(&document_id, ordinal, cell, &existing, &seen);
                    write_cell_id(cell, &fresh);
                    seen.insert(fresh);
                    report.cells_assigned += 1;
                }
                None => {}
            }
        }

        if report.changed() {
            tracing::debug!(
                "identity pass (policy {}): document_assigned={} cells_assigned={} \
                 collisions_healed={}",
                self.policy,
                report.document_assigned,
                report.cells_assigned,
                report.collisions_healed
            );
        }

        report.document_id = Some(document_id);
        report
    }

    /// Content-derived document id
    #[must_use]
    pub fn document_id_for(&self, document: &Document) -> String {
        let digest = ContentHash::compute_parts(document.cells.iter().map(Cell::value));
        self.namespace
            .derive(&format!("document:{digest}"))
            .to_string()
    }

    fn fresh_cell_id(
        &self,
        document_id: &str,
        ordinal: usize,
        cell: &CodeCell,
        existing: &HashSet<String>,
        seen: &HashSet<String>,
    ) -> String {
        (0u64..)
            .map(|attempt| {
                self.namespace
                    .derive(&format!("{document_id}:{ordinal}:{attempt}:{}", cell.value))
                    .to_string()
            })
            .find(|id| !existing.contains(id) && !seen.contains(id))
            .unwrap_or_default()
    }
}

/// Resolved id of a code cell, honoring the legacy alias
#[must_use]
pub fn cell_id(cell: &CodeCell) -> Option<String> {
    resolve(&cell.metadata, ID, legacy_id_key())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn legacy_id_key() -> Option<&'static str> {
    schema::field(ID).and_then(|f| f.legacy)
}

fn write_cell_id(cell: &mut CodeCell, id: &str) {
    if let Some(alias) = legacy_id_key() {
        cell.metadata.remove(alias);
    }
    cell.metadata.insert(ID.to_string(), id.to_string());
}
