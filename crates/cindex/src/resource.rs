//! Memory usage of a translation unit.

use crate::error::Result;
use crate::registry::{Native, Registry};
use crate::string::c_str_to_string;
use crate::translation_unit::TranslationUnit;
use cindex_common::RawId;
use clang_sys::*;
use std::rc::Rc;

/// One line of a resource usage report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUsageEntry {
    /// Raw `CXTUResourceUsageKind`.
    pub kind: i32,
    /// Human-readable name, e.g. `AST: ASTContext: expressions`.
    pub name: String,
    /// Bytes.
    pub amount: u64,
}

/// A resource usage report, a disposable child of its translation unit.
///
/// The report is a copy; it stays readable after the unit is reparsed.
#[derive(Debug)]
pub struct ResourceUsage {
    registry: Rc<Registry>,
    id: RawId,
}

impl TranslationUnit {
    /// Snapshot of the memory this unit uses.
    pub fn resource_usage(&self) -> Result<ResourceUsage> {
        let raw = self.raw()?;
        let usage = unsafe { clang_getCXTUResourceUsage(raw) };
        let id = self
            .registry()
            .wrap_child(self.id(), Native::ResourceUsage(usage))?;
        Ok(ResourceUsage {
            registry: self.registry().clone(),
            id,
        })
    }
}

/// Name of a resource usage kind.
pub fn resource_usage_name(kind: i32) -> String {
    c_str_to_string(unsafe { clang_getTUResourceUsageName(kind as _) })
}

impl ResourceUsage {
    pub fn entries(&self) -> Result<Vec<ResourceUsageEntry>> {
        let usage = self.registry.get(self.id)?.resource_usage();
        let Some(usage) = usage else {
            return Ok(Vec::new());
        };
        if usage.entries.is_null() {
            return Ok(Vec::new());
        }
        let entries = unsafe { std::slice::from_raw_parts(usage.entries, usage.numEntries as usize) };
        Ok(entries
            .iter()
            .map(|e| ResourceUsageEntry {
                kind: e.kind as i32,
                name: resource_usage_name(e.kind as i32),
                amount: e.amount as u64,
            })
            .collect())
    }

    /// Sum of every entry.
    pub fn total(&self) -> Result<u64> {
        Ok(self.entries()?.iter().map(|e| e.amount).sum())
    }

    pub fn is_live(&self) -> bool {
        self.registry.is_live(self.id)
    }

    /// Release the report. Fails with `DoubleDispose` the second time.
    pub fn dispose(&self) -> Result<()> {
        Ok(self.registry.dispose(self.id)?)
    }
}

impl Drop for ResourceUsage {
    fn drop(&mut self) {
        self.registry.dispose_on_drop(self.id);
    }
}
