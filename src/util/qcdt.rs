use std::{
    io::Write,
    mem::size_of,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, info, warn};
use zerocopy::{little_endian::U32, FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    static_assert,
    util::{
        chip_id::{ChipId, QcdtVersion},
        pack::{padded_size, PackContext, PackOptions},
    },
};

pub const QCDT_MAGIC: [u8; 4] = *b"QCDT";

/// Size of the zero word terminating the index table.
const END_OF_TABLE_SIZE: usize = 4;

/// QCDT image header.
#[derive(Clone, Debug, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct QcdtHeader {
    pub magic: [u8; 4],
    pub version: U32,
    pub entry_count: U32,
}

static_assert!(size_of::<QcdtHeader>() == 12);

/// Index entry, version 1.
#[derive(Clone, Debug, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct QcdtEntryV1 {
    pub chipset: U32,
    pub platform: U32,
    pub revision: U32,
    pub dtb_offset: U32,
    pub dtb_size: U32,
}

static_assert!(size_of::<QcdtEntryV1>() == QcdtVersion::V1.entry_size());

/// Index entry, version 2. Adds the board subtype.
#[derive(Clone, Debug, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct QcdtEntryV2 {
    pub chipset: U32,
    pub platform: U32,
    pub subtype: U32,
    pub revision: U32,
    pub dtb_offset: U32,
    pub dtb_size: U32,
}

static_assert!(size_of::<QcdtEntryV2>() == QcdtVersion::V2.entry_size());

/// Index entry, version 3. Adds PMIC models.
#[derive(Clone, Debug, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct QcdtEntryV3 {
    pub chipset: U32,
    pub platform: U32,
    pub subtype: U32,
    pub revision: U32,
    pub pmic: [U32; 4],
    pub dtb_offset: U32,
    pub dtb_size: U32,
}

static_assert!(size_of::<QcdtEntryV3>() == QcdtVersion::V3.entry_size());

/// A decoded index entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QcdtEntry {
    pub id: ChipId,
    pub dtb_offset: u32,
    pub dtb_size: u32,
}

impl From<&QcdtEntryV1> for QcdtEntry {
    fn from(e: &QcdtEntryV1) -> Self {
        Self {
            id: ChipId::V1 {
                chipset: e.chipset.get(),
                platform: e.platform.get(),
                revision: e.revision.get(),
            },
            dtb_offset: e.dtb_offset.get(),
            dtb_size: e.dtb_size.get(),
        }
    }
}

impl From<&QcdtEntryV2> for QcdtEntry {
    fn from(e: &QcdtEntryV2) -> Self {
        Self {
            id: ChipId::V2 {
                chipset: e.chipset.get(),
                platform: e.platform.get(),
                subtype: e.subtype.get(),
                revision: e.revision.get(),
            },
            dtb_offset: e.dtb_offset.get(),
            dtb_size: e.dtb_size.get(),
        }
    }
}

impl From<&QcdtEntryV3> for QcdtEntry {
    fn from(e: &QcdtEntryV3) -> Self {
        Self {
            id: ChipId::V3 {
                chipset: e.chipset.get(),
                platform: e.platform.get(),
                subtype: e.subtype.get(),
                revision: e.revision.get(),
                pmic: e.pmic.map(|p| p.get()),
            },
            dtb_offset: e.dtb_offset.get(),
            dtb_size: e.dtb_size.get(),
        }
    }
}

/// End of the header, index table and terminator.
fn table_end(version: QcdtVersion, entry_count: usize) -> u64 {
    (size_of::<QcdtHeader>() + entry_count * version.entry_size() + END_OF_TABLE_SIZE) as u64
}

/// Offset of the first DTB, following the header, index table and terminator.
pub fn first_dtb_offset(version: QcdtVersion, entry_count: usize, page_size: u32) -> u64 {
    padded_size(table_end(version, entry_count), page_size)
}

const ZERO_BUF: [u8; 4096] = [0u8; 4096];

fn write_zeros<W>(out: &mut W, mut count: u64) -> std::io::Result<()>
where W: Write + ?Sized {
    while count > 0 {
        let len = count.min(ZERO_BUF.len() as u64) as usize;
        out.write_all(&ZERO_BUF[..len])?;
        count -= len as u64;
    }
    Ok(())
}

fn write_entry<W>(
    out: &mut W,
    version: QcdtVersion,
    id: &ChipId,
    dtb_offset: u32,
    dtb_size: u32,
) -> std::io::Result<()>
where
    W: Write + ?Sized,
{
    let (chipset, platform, subtype, revision) = id.sort_key();
    let (dtb_offset, dtb_size) = (U32::new(dtb_offset), U32::new(dtb_size));
    match version {
        QcdtVersion::V1 => out.write_all(
            QcdtEntryV1 {
                chipset: U32::new(chipset),
                platform: U32::new(platform),
                revision: U32::new(revision),
                dtb_offset,
                dtb_size,
            }
            .as_bytes(),
        ),
        QcdtVersion::V2 => out.write_all(
            QcdtEntryV2 {
                chipset: U32::new(chipset),
                platform: U32::new(platform),
                subtype: U32::new(subtype),
                revision: U32::new(revision),
                dtb_offset,
                dtb_size,
            }
            .as_bytes(),
        ),
        QcdtVersion::V3 => out.write_all(
            QcdtEntryV3 {
                chipset: U32::new(chipset),
                platform: U32::new(platform),
                subtype: U32::new(subtype),
                revision: U32::new(revision),
                pmic: id.pmic().map(U32::new),
                dtb_offset,
                dtb_size,
            }
            .as_bytes(),
        ),
    }
}

/// Writes a QCDT image containing every chip entry and referenced DTB in `ctx`.
///
/// `read_dtb` supplies the contents of each DTB. Its length must still match
/// the size recorded when the DTB was scanned.
pub fn write_qcdt<W, F>(
    out: &mut W,
    ctx: &mut PackContext,
    options: &PackOptions,
    mut read_dtb: F,
) -> Result<()>
where
    W: Write + ?Sized,
    F: FnMut(&Path) -> Result<Vec<u8>>,
{
    let version = ctx.output_version(options);
    let entry_count = ctx.chips.len();
    let first_offset = first_dtb_offset(version, entry_count, options.page_size);
    let mut next_offset = u32::try_from(first_offset)
        .map_err(|_| anyhow!("Index table too large ({} entries)", entry_count))?;
    for record in ctx.dtbs.iter_mut() {
        record.offset = None;
    }

    info!("Writing header...");
    out.write_all(
        QcdtHeader {
            magic: QCDT_MAGIC,
            version: U32::new(version.into()),
            entry_count: U32::new(entry_count as u32),
        }
        .as_bytes(),
    )?;

    info!("Writing chip index table...");
    let mut dtb_order = Vec::<PathBuf>::new();
    for entry in ctx.chips.sorted() {
        let record = ctx
            .dtbs
            .lookup_mut(&entry.dtb)
            .ok_or_else(|| anyhow!("DTB not found: '{}'", entry.dtb.display()))?;
        let dtb_size = u32::try_from(record.padded_size)
            .map_err(|_| anyhow!("DTB too large: '{}'", record.path.display()))?;
        let dtb_offset = match record.offset {
            Some(offset) => offset,
            None => {
                let offset = next_offset;
                next_offset = next_offset
                    .checked_add(dtb_size)
                    .ok_or_else(|| anyhow!("QCDT image exceeds 4 GiB"))?;
                record.offset = Some(offset);
                dtb_order.push(record.path.clone());
                offset
            }
        };
        write_entry(out, version, &entry.id, dtb_offset, dtb_size)?;
    }
    out.write_all(&0u32.to_le_bytes())?;
    write_zeros(out, first_offset - table_end(version, entry_count))?;

    info!("Appending DTB images...");
    for path in &dtb_order {
        let record = ctx
            .dtbs
            .lookup(path)
            .ok_or_else(|| anyhow!("DTB not found: '{}'", path.display()))?;
        let data = read_dtb(path)?;
        let padding = padded_size(data.len() as u64, options.page_size) - data.len() as u64;
        ensure!(
            data.len() as u64 + padding == record.padded_size,
            "DTB size mismatch, please re-run: expected {} vs actual {} ({})",
            record.padded_size,
            data.len() as u64 + padding,
            path.display()
        );
        debug!(
            "{}: offset {:#X}, {} bytes (scanned {} bytes)",
            path.display(),
            record.offset.unwrap_or_default(),
            data.len(),
            record.size
        );
        out.write_all(&data)?;
        write_zeros(out, padding)?;
    }
    out.flush()?;
    Ok(())
}

/// A distinct DTB payload referenced by one or more index entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QcdtPayload {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

/// A view into a QCDT image.
pub struct QcdtView<'a> {
    pub header: &'a QcdtHeader,
    pub version: QcdtVersion,
    pub entries: Vec<QcdtEntry>,
    data: &'a [u8],
}

impl<'a> QcdtView<'a> {
    /// Parses the header and index table.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let Ok((header, rest)) = QcdtHeader::ref_from_prefix(data) else {
            bail!("Buffer not large enough for QCDT header");
        };
        if header.magic != QCDT_MAGIC {
            warn!(
                "QCDT magic mismatch: expected {:?}, found {:?}",
                String::from_utf8_lossy(&QCDT_MAGIC),
                String::from_utf8_lossy(&header.magic)
            );
        }
        let version = QcdtVersion::try_from(header.version.get())
            .map_err(|_| anyhow!("Unsupported QCDT version {}", header.version.get()))?;
        let count = header.entry_count.get() as usize;
        let table = count
            .checked_mul(version.entry_size())
            .and_then(|size| rest.get(..size))
            .ok_or_else(|| {
                anyhow!("QCDT index table truncated: expected {count} version {version} entries")
            })?;
        let entries = match version {
            QcdtVersion::V1 => parse_entries::<QcdtEntryV1>(table)?,
            QcdtVersion::V2 => parse_entries::<QcdtEntryV2>(table)?,
            QcdtVersion::V3 => parse_entries::<QcdtEntryV3>(table)?,
        };
        Ok(Self { header, version, entries, data })
    }

    pub fn magic(&self) -> String { String::from_utf8_lossy(&self.header.magic).into_owned() }

    /// Distinct payloads, named in order of first reference.
    ///
    /// Entries sharing an offset refer to the same payload.
    pub fn payloads(&self) -> Vec<QcdtPayload> {
        let mut payloads = Vec::<QcdtPayload>::new();
        for entry in &self.entries {
            if payloads.iter().any(|p| p.offset == entry.dtb_offset) {
                continue;
            }
            payloads.push(QcdtPayload {
                name: format!("dtb_{}.dtb", payloads.len() + 1),
                offset: entry.dtb_offset,
                size: entry.dtb_size,
            });
        }
        payloads
    }

    /// Raw (padded) bytes of a payload.
    pub fn payload_data(&self, payload: &QcdtPayload) -> Result<&'a [u8]> {
        let start = payload.offset as usize;
        (payload.size as usize)
            .checked_add(start)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| {
                anyhow!(
                    "{}: range {:#X}+{:#X} out of bounds (file size {:#X})",
                    payload.name,
                    start,
                    payload.size,
                    self.data.len()
                )
            })
    }
}

fn parse_entries<'a, T>(table: &'a [u8]) -> Result<Vec<QcdtEntry>>
where
    T: FromBytes + Immutable + KnownLayout + 'a,
    QcdtEntry: From<&'a T>,
{
    let entries =
        <[T]>::ref_from_bytes(table).map_err(|_| anyhow!("QCDT index table size mismatch"))?;
    Ok(entries.iter().map(QcdtEntry::from).collect())
}

/// Writes each distinct payload of `view` into `out_dir`.
pub fn extract_qcdt(view: &QcdtView, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for payload in view.payloads() {
        let data = view.payload_data(&payload)?;
        let path = out_dir.join(&payload.name);
        info!("Extracting {}...", payload.name);
        std::fs::write(&path, data)
            .with_context(|| format!("Failed to write file '{}'", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct Inputs {
        files: HashMap<PathBuf, Vec<u8>>,
        ctx: PackContext,
        options: PackOptions,
    }

    impl Inputs {
        fn new(options: PackOptions) -> Self {
            Self { files: HashMap::new(), ctx: PackContext::new(), options }
        }

        fn add(&mut self, name: &str, dts: &str, data: Vec<u8>) -> usize {
            let path = PathBuf::from(name);
            let count = self.ctx.add_dtb(&path, dts, data.len() as u64, &self.options);
            self.files.insert(path, data);
            count
        }

        fn write(&mut self) -> Result<Vec<u8>> {
            let mut out = Vec::new();
            let files = &self.files;
            write_qcdt(&mut out, &mut self.ctx, &self.options, |path| {
                files.get(path).cloned().ok_or_else(|| anyhow!("missing {}", path.display()))
            })?;
            Ok(out)
        }
    }

    fn blob(len: usize, seed: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
    }

    const DTS_V1: &str = "\tqcom,msm-id = <0x1 0x2 0x3>;\n";
    const DTS_V2: &str = "\tqcom,msm-id = <0x1 0x5>;\n\tqcom,board-id = <0x10 0x0, 0x11 0x1>;\n";

    #[test]
    fn test_single_v1() {
        let mut inputs = Inputs::new(PackOptions::default());
        inputs.add("a.dtb", DTS_V1, blob(100, 1));
        let out = inputs.write().unwrap();

        assert_eq!(&out[0..4], b"QCDT");
        assert_eq!(out[4..8], 1u32.to_le_bytes());
        assert_eq!(out[8..12], 1u32.to_le_bytes());
        let words = <[U32]>::ref_from_bytes(&out[12..36]).unwrap();
        let words = words.iter().map(|w| w.get()).collect::<Vec<_>>();
        // chipset, platform, revision, offset, size, end of table
        assert_eq!(words, vec![1, 2, 3, 2048, 2048, 0]);
        assert_eq!(out.len(), 4096);
        assert_eq!(&out[2048..2148], blob(100, 1).as_slice());
        assert!(out[2148..].iter().all(|&b| b == 0));

        let view = QcdtView::new(&out).unwrap();
        assert_eq!(view.version, QcdtVersion::V1);
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.entries[0].id.sort_key(), (1, 2, 0, 3));
    }

    #[test]
    fn test_duplicate_dtb_not_written() {
        let mut inputs = Inputs::new(PackOptions::default());
        assert_eq!(inputs.add("a.dtb", DTS_V1, blob(100, 1)), 1);
        assert_eq!(inputs.add("b.dtb", DTS_V1, blob(300, 2)), 0);
        let out = inputs.write().unwrap();
        let view = QcdtView::new(&out).unwrap();
        assert_eq!(view.header.entry_count.get(), 1);
        assert_eq!(view.payloads().len(), 1);
        assert_eq!(out.len(), 4096);
        assert_eq!(inputs.ctx.dtbs.lookup(Path::new("b.dtb")).unwrap().offset, None);
    }

    #[test]
    fn test_shared_payload_v2() {
        let mut inputs = Inputs::new(PackOptions::default());
        assert_eq!(inputs.add("a.dtb", DTS_V2, blob(3000, 3)), 2);
        let out = inputs.write().unwrap();
        let view = QcdtView::new(&out).unwrap();
        assert_eq!(view.version, QcdtVersion::V2);
        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[0].id.sort_key(), (1, 0x10, 0, 5));
        assert_eq!(view.entries[1].id.sort_key(), (1, 0x11, 1, 5));
        assert_eq!(view.entries[0].dtb_offset, view.entries[1].dtb_offset);
        assert_eq!(view.entries[0].dtb_size, view.entries[1].dtb_size);
        assert_eq!(view.entries[0].dtb_size, 4096);
        // 12 + 2 * 24 + 4 = 64 bytes of table
        assert_eq!(out[64..2048].iter().filter(|&&b| b != 0).count(), 0);
        assert_eq!(out.len(), 2048 + 4096);
    }

    #[test]
    fn test_page_aligned_dtb_gets_extra_page() {
        let mut inputs = Inputs::new(PackOptions::default());
        inputs.add("a.dtb", DTS_V1, blob(2048, 4));
        let out = inputs.write().unwrap();
        let view = QcdtView::new(&out).unwrap();
        assert_eq!(view.entries[0].dtb_size, 4096);
        assert_eq!(out.len(), 2048 + 4096);
    }

    #[test]
    fn test_sorted_and_aligned_round_trip() {
        let options = PackOptions { page_size: 512, ..Default::default() };
        let mut inputs = Inputs::new(options);
        let dts_c = "\tqcom,msm-id = <0x9 0x1>;\n\tqcom,board-id = <0x8 0x0>;\n";
        let dts_a = "\tqcom,msm-id = <0x2 0x0 0x1 0x0>;\n\tqcom,board-id = <0x8 0x0 0x7 0x3>;\n";
        let dts_b = concat!(
            "\tqcom,msm-id = <0x1 0x0>;\n",
            "\tqcom,board-id = <0x1 0x0>;\n",
            "\tqcom,pmic-id = <0x1 0x0 0x0 0x0 0x2 0x0 0x0 0x0>;\n"
        );
        inputs.add("c.dtb", dts_c, blob(700, 5));
        inputs.add("a.dtb", dts_a, blob(512, 6));
        inputs.add("b.dtb", dts_b, blob(1, 7));
        let out = inputs.write().unwrap();

        let view = QcdtView::new(&out).unwrap();
        assert_eq!(view.version, QcdtVersion::V3);
        assert_eq!(view.header.entry_count.get() as usize, view.entries.len());
        assert_eq!(view.entries.len(), 1 + 4 + 2);
        let keys = view.entries.iter().map(|e| e.id.sort_key()).collect::<Vec<_>>();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        let payloads = view.payloads();
        assert_eq!(payloads.len(), 3);
        for payload in &payloads {
            assert_eq!(payload.offset % 512, 0);
            assert_eq!(payload.size % 512, 0);
        }
        // Every chip from the same DTB shares its payload
        let by_chipset = |chipset: u32| {
            view.entries
                .iter()
                .filter(|e| e.id.chipset() == chipset)
                .map(|e| (e.dtb_offset, e.dtb_size))
                .collect::<Vec<_>>()
        };
        assert!(by_chipset(2).windows(2).all(|w| w[0] == w[1]));

        for (name, seed, len) in [("a.dtb", 6, 512), ("b.dtb", 7, 1), ("c.dtb", 5, 700)] {
            let record = inputs.ctx.dtbs.lookup(Path::new(name)).unwrap();
            let payload = payloads.iter().find(|p| Some(p.offset) == record.offset).unwrap();
            let data = view.payload_data(payload).unwrap();
            assert_eq!(&data[..len], blob(len, seed).as_slice());
            assert!(data[len..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_idempotent() {
        let mut inputs = Inputs::new(PackOptions::default());
        inputs.add("a.dtb", DTS_V2, blob(100, 1));
        inputs.add("b.dtb", DTS_V1, blob(5000, 2));
        let first = inputs.write().unwrap();
        let second = inputs.write().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_forced_version() {
        let options = PackOptions { force_version: Some(QcdtVersion::V3), ..Default::default() };
        let mut inputs = Inputs::new(options);
        inputs.add("a.dtb", DTS_V1, blob(10, 1));
        let out = inputs.write().unwrap();
        let view = QcdtView::new(&out).unwrap();
        assert_eq!(view.version, QcdtVersion::V3);
        assert_eq!(view.entries[0].id.pmic(), [0; 4]);
        assert_eq!(view.entries[0].dtb_offset, 2048);
    }

    #[test]
    fn test_size_mismatch() {
        let mut inputs = Inputs::new(PackOptions::default());
        inputs.add("a.dtb", DTS_V1, blob(100, 1));
        inputs.files.insert(PathBuf::from("a.dtb"), blob(2100, 1));
        let err = inputs.write().unwrap_err();
        assert!(err.to_string().contains("DTB size mismatch"));
    }

    #[test]
    fn test_missing_dtb_record() {
        let mut ctx = PackContext::new();
        ctx.chips.try_add(ChipId::V1 { chipset: 1, platform: 2, revision: 3 }, Path::new("a.dtb"));
        let mut out = Vec::new();
        let result = write_qcdt(&mut out, &mut ctx, &PackOptions::default(), |_| Ok(vec![]));
        assert!(result.is_err());
    }

    #[test]
    fn test_truncated_table() {
        let mut inputs = Inputs::new(PackOptions::default());
        inputs.add("a.dtb", DTS_V2, blob(100, 1));
        let out = inputs.write().unwrap();
        // Header + one and a half entries
        assert!(QcdtView::new(&out[..12 + 24 + 12]).is_err());
        assert!(QcdtView::new(&out[..8]).is_err());
        assert!(QcdtView::new(&out[..12 + 48]).is_ok());
    }

    #[test]
    fn test_unsupported_version() {
        let mut data = vec![0u8; 64];
        data[0..4].copy_from_slice(b"QCDT");
        data[4..8].copy_from_slice(&4u32.to_le_bytes());
        assert!(QcdtView::new(&data).is_err());
    }

    #[test]
    fn test_magic_mismatch_is_not_fatal() {
        let mut data = vec![0u8; 64];
        data[0..4].copy_from_slice(b"ABCD");
        data[4..8].copy_from_slice(&1u32.to_le_bytes());
        let view = QcdtView::new(&data).unwrap();
        assert_eq!(view.magic(), "ABCD");
        assert!(view.entries.is_empty());
    }

    #[test]
    fn test_shared_payload_v3_decode() {
        let mut data = Vec::new();
        data.extend_from_slice(
            QcdtHeader { magic: QCDT_MAGIC, version: U32::new(3), entry_count: U32::new(2) }
                .as_bytes(),
        );
        for platform in [1, 2] {
            write_entry(
                &mut data,
                QcdtVersion::V3,
                &ChipId::V3 { chipset: 7, platform, subtype: 0, revision: 1, pmic: [1, 2, 3, 4] },
                128,
                64,
            )
            .unwrap();
        }
        data.resize(128, 0);
        data.extend_from_slice(&[0xAB; 64]);

        let view = QcdtView::new(&data).unwrap();
        assert_eq!(view.entries[1].id.pmic(), [1, 2, 3, 4]);
        let payloads = view.payloads();
        assert_eq!(payloads, vec![QcdtPayload { name: "dtb_1.dtb".into(), offset: 128, size: 64 }]);
        assert_eq!(view.payload_data(&payloads[0]).unwrap(), &[0xAB; 64][..]);
    }

    #[test]
    fn test_payload_out_of_bounds() {
        let mut data = Vec::new();
        data.extend_from_slice(
            QcdtHeader { magic: QCDT_MAGIC, version: U32::new(1), entry_count: U32::new(1) }
                .as_bytes(),
        );
        let id = ChipId::V1 { chipset: 1, platform: 1, revision: 1 };
        write_entry(&mut data, QcdtVersion::V1, &id, 2048, 2048).unwrap();
        let view = QcdtView::new(&data).unwrap();
        let payloads = view.payloads();
        assert!(view.payload_data(&payloads[0]).is_err());
    }

    #[test]
    fn test_payload_range_overflow() {
        let data = [0u8; 16];
        let view = QcdtView {
            header: QcdtHeader::ref_from_prefix(&data).unwrap().0,
            version: QcdtVersion::V1,
            entries: Vec::new(),
            data: &data,
        };
        let payload =
            QcdtPayload { name: "dtb_1.dtb".to_string(), offset: u32::MAX, size: u32::MAX };
        assert!(view.payload_data(&payload).is_err());
    }

    #[test]
    fn test_first_dtb_offset() {
        assert_eq!(first_dtb_offset(QcdtVersion::V1, 1, 2048), 2048);
        assert_eq!(first_dtb_offset(QcdtVersion::V3, 60, 2048), 4096);
        // 12 + 4 * 20 + 4 = 96, already aligned to 16
        assert_eq!(first_dtb_offset(QcdtVersion::V1, 4, 16), 112);
    }
}
