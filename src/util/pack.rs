use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use indexmap::{map::Entry, IndexMap};
use tracing::{info, warn};

use crate::util::{
    chip_id::{extract_identities, ChipId, QcdtVersion, QCDT_DT_TAG},
    dtc::Decompiler,
};

pub const DEFAULT_PAGE_SIZE: u32 = 2048;
pub const MAX_PAGE_SIZE: u32 = 1024 * 1024;

/// Settings shared by the scan and write passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOptions {
    pub page_size: u32,
    /// Tag carrying chipset information (normally `qcom,msm-id = <`).
    pub dt_tag: String,
    /// Forces the output table version instead of using the highest one found.
    pub force_version: Option<QcdtVersion>,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, dt_tag: QCDT_DT_TAG.to_string(), force_version: None }
    }
}

impl PackOptions {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.page_size > 0 && self.page_size <= MAX_PAGE_SIZE,
            "Invalid page size {} (must be > 0 and <= {})",
            self.page_size,
            MAX_PAGE_SIZE
        );
        ensure!(!self.dt_tag.is_empty(), "DT tag must not be empty");
        Ok(())
    }
}

/// Size of `size` once padded to the next page boundary.
///
/// A size that is already page aligned still receives a full page of padding.
/// Existing QCDT images depend on this, so it must not be changed.
#[inline]
pub fn padded_size(size: u64, page_size: u32) -> u64 {
    size + (page_size as u64 - size % page_size as u64)
}

/// A DTB file referenced by the index table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtbRecord {
    pub path: PathBuf,
    /// Size on disk when scanned.
    pub size: u64,
    /// Size including padding to the next page boundary.
    pub padded_size: u64,
    /// Absolute offset inside the output image, once assigned.
    pub offset: Option<u32>,
}

/// All DTB files accepted during a scan, keyed by path.
#[derive(Debug, Default)]
pub struct DtbCatalog {
    records: IndexMap<PathBuf, DtbRecord>,
}

impl DtbCatalog {
    pub fn record(&mut self, path: &Path, size: u64, page_size: u32) -> &DtbRecord {
        let record = DtbRecord {
            path: path.to_path_buf(),
            size,
            padded_size: padded_size(size, page_size),
            offset: None,
        };
        match self.records.entry(path.to_path_buf()) {
            Entry::Occupied(mut e) => {
                e.insert(record);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(record),
        }
    }

    pub fn lookup(&self, path: &Path) -> Option<&DtbRecord> { self.records.get(path) }

    pub fn lookup_mut(&mut self, path: &Path) -> Option<&mut DtbRecord> {
        self.records.get_mut(path)
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DtbRecord> {
        self.records.values_mut()
    }
}

/// A chip identity together with the DTB that provides it.
#[derive(Debug, Clone)]
pub struct ChipEntry {
    pub id: ChipId,
    pub dtb: PathBuf,
}

/// Unique chip identities, in discovery order.
#[derive(Debug, Default)]
pub struct ChipRegistry {
    entries: Vec<ChipEntry>,
}

impl ChipRegistry {
    /// Adds an identity unless an equal one already exists.
    pub fn try_add(&mut self, id: ChipId, dtb: &Path) -> bool {
        if self.entries.iter().any(|e| e.id == id) {
            return false;
        }
        self.entries.push(ChipEntry { id, dtb: dtb.to_path_buf() });
        true
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Entries in index table order.
    pub fn sorted(&self) -> Vec<&ChipEntry> {
        let mut sorted = self.entries.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        sorted
    }
}

/// State accumulated while scanning DTBs for a single image.
#[derive(Debug, Default)]
pub struct PackContext {
    pub chips: ChipRegistry,
    pub dtbs: DtbCatalog,
    /// Highest version among successfully scanned DTBs.
    pub version: Option<QcdtVersion>,
}

impl PackContext {
    pub fn new() -> Self { Self::default() }

    /// Table version to write, honoring a forced version.
    pub fn output_version(&self, options: &PackOptions) -> QcdtVersion {
        options.force_version.or(self.version).unwrap_or(QcdtVersion::V1)
    }

    /// Decompiles and scans a single DTB file. Returns the number of new chip entries.
    pub fn scan_dtb(
        &mut self,
        path: &Path,
        decompiler: &dyn Decompiler,
        options: &PackOptions,
    ) -> Result<usize> {
        let dts = match decompiler.decompile(path) {
            Ok(dts) => dts,
            Err(e) => {
                warn!("Skipping '{}': failed to decompile: {:#}", path.display(), e);
                return Ok(0);
            }
        };
        let size = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat '{}'", path.display()))?
            .len();
        Ok(self.add_dtb(path, &dts, size, options))
    }

    /// Registers the chip identities found in a decompiled DTB.
    /// Returns the number of new chip entries.
    pub fn add_dtb(&mut self, path: &Path, dts: &str, size: u64, options: &PackOptions) -> usize {
        let Some((version, ids)) = extract_identities(dts, &options.dt_tag) else {
            warn!("Skipping '{}': failed to scan for chip identity tags", path.display());
            return 0;
        };
        info!("Version: {}", version);
        if size == 0 {
            warn!("Skipping '{}': empty file", path.display());
            return 0;
        }
        self.version = self.version.max(Some(version));
        self.dtbs.record(path, size, options.page_size);

        let mut count = 0;
        for id in ids {
            info!("{}", id);
            if self.chips.try_add(id, path) {
                count += 1;
            } else {
                info!("... duplicate info, skipped");
            }
        }
        count
    }
}
