use std::{cmp::Ordering, fmt};

use itertools::iproduct;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::warn;

/// Default tag carrying chipset, platform and revision (v1) or chipset and revision (v2/v3).
pub const QCDT_DT_TAG: &str = "qcom,msm-id = <";
/// Tag carrying platform and subtype pairs (v2/v3).
pub const QCDT_BOARD_TAG: &str = "qcom,board-id = <";
/// Tag carrying PMIC model quadruples (v3).
pub const QCDT_PMIC_TAG: &str = "qcom,pmic-id = <";

/// QCDT table format version. Determines the shape of each index entry.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u32)]
pub enum QcdtVersion {
    V1 = 1,
    V2 = 2,
    V3 = 3,
}

impl QcdtVersion {
    /// Byte size of one index entry.
    pub const fn entry_size(self) -> usize {
        match self {
            QcdtVersion::V1 => 20,
            QcdtVersion::V2 => 24,
            QcdtVersion::V3 => 40,
        }
    }
}

impl fmt::Display for QcdtVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", u32::from(*self)) }
}

/// Hardware identification for a single index entry.
///
/// Which fields exist depends on the version the identity was read with.
/// Fields absent from a version read back as zero.
#[derive(Copy, Clone, Debug)]
pub enum ChipId {
    V1 { chipset: u32, platform: u32, revision: u32 },
    V2 { chipset: u32, platform: u32, subtype: u32, revision: u32 },
    V3 { chipset: u32, platform: u32, subtype: u32, revision: u32, pmic: [u32; 4] },
}

impl ChipId {
    pub fn chipset(&self) -> u32 {
        match *self {
            ChipId::V1 { chipset, .. }
            | ChipId::V2 { chipset, .. }
            | ChipId::V3 { chipset, .. } => chipset,
        }
    }

    pub fn platform(&self) -> u32 {
        match *self {
            ChipId::V1 { platform, .. }
            | ChipId::V2 { platform, .. }
            | ChipId::V3 { platform, .. } => platform,
        }
    }

    pub fn subtype(&self) -> u32 {
        match *self {
            ChipId::V1 { .. } => 0,
            ChipId::V2 { subtype, .. } | ChipId::V3 { subtype, .. } => subtype,
        }
    }

    pub fn revision(&self) -> u32 {
        match *self {
            ChipId::V1 { revision, .. }
            | ChipId::V2 { revision, .. }
            | ChipId::V3 { revision, .. } => revision,
        }
    }

    pub fn pmic(&self) -> [u32; 4] {
        match *self {
            ChipId::V3 { pmic, .. } => pmic,
            _ => [0; 4],
        }
    }

    /// Index table ordering key.
    pub fn sort_key(&self) -> (u32, u32, u32, u32) {
        (self.chipset(), self.platform(), self.subtype(), self.revision())
    }

    fn fields(&self) -> [u32; 8] {
        let [p0, p1, p2, p3] = self.pmic();
        [self.chipset(), self.platform(), self.subtype(), self.revision(), p0, p1, p2, p3]
    }
}

// Identities compare by value, regardless of which version they were read with.
impl PartialEq for ChipId {
    fn eq(&self, other: &Self) -> bool { self.fields() == other.fields() }
}

impl Eq for ChipId {}

impl PartialOrd for ChipId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ChipId {
    fn cmp(&self, other: &Self) -> Ordering { self.fields().cmp(&other.fields()) }
}

impl fmt::Display for ChipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [p0, p1, p2, p3] = self.pmic();
        write!(
            f,
            "chipset: {}, rev: {}, platform: {}, subtype: {}, ",
            self.chipset(),
            self.revision(),
            self.platform(),
            self.subtype()
        )?;
        write!(f, "pmic0: {}, pmic1: {}, pmic2: {}, pmic3: {}", p0, p1, p2, p3)
    }
}

/// Determines the table version implied by decompiled device tree source.
pub fn detect_version(dts: &str) -> QcdtVersion {
    if dts.contains(QCDT_PMIC_TAG) {
        QcdtVersion::V3
    } else if dts.contains(QCDT_BOARD_TAG) {
        QcdtVersion::V2
    } else {
        QcdtVersion::V1
    }
}

/// Parses the cell list following `tag` on `line` into groups of `width` values.
///
/// All `<...>` groups after the tag are considered. Cells may be separated by
/// whitespace or commas. A trailing incomplete group is dropped.
fn parse_cells(line: &str, tag: &str, width: usize) -> Option<Vec<Vec<u32>>> {
    let pos = line.find(tag)?;
    let mut values = Vec::new();
    let mut rest = &line[pos + tag.trim_end_matches('<').len()..];
    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>').map(|close| close + open) else {
            warn!("Unterminated cell list in '{}'", line.trim());
            return None;
        };
        for token in rest[open + 1..close].split(|c: char| c.is_whitespace() || c == ',') {
            if token.is_empty() {
                continue;
            }
            let digits =
                token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")).unwrap_or(token);
            match u32::from_str_radix(digits, 16) {
                Ok(value) => values.push(value),
                Err(_) => {
                    warn!("Invalid cell '{}' in '{}'", token, line.trim());
                    return None;
                }
            }
        }
        rest = &rest[close + 1..];
    }
    Some(values.chunks_exact(width).map(<[u32]>::to_vec).collect())
}

/// Cell groups for one tag: `None` on a malformed line, empty if the tag was never seen.
fn scan_tag(dts: &str, tag: &str, width: usize) -> Option<Vec<Vec<u32>>> {
    let mut result = Vec::new();
    for line in dts.lines().filter(|line| line.contains(tag)) {
        result = parse_cells(line, tag, width)?;
    }
    Some(result)
}

/// Extracts every chip identity described by decompiled device tree source.
///
/// Returns the version implied by the tags present along with the identities,
/// or `None` if a tag required by that version is missing or malformed.
pub fn extract_identities(dts: &str, dt_tag: &str) -> Option<(QcdtVersion, Vec<ChipId>)> {
    let version = detect_version(dts);
    if version == QcdtVersion::V1 {
        let cpr = scan_tag(dts, dt_tag, 3)?;
        if cpr.is_empty() {
            warn!("Incorrect '{}' format", dt_tag);
            return None;
        }
        let ids: Vec<ChipId> = cpr
            .iter()
            .map(|v| ChipId::V1 { chipset: v[0], platform: v[1], revision: v[2] })
            .collect();
        return Some((version, ids));
    }

    let cr = scan_tag(dts, dt_tag, 2)?;
    if cr.is_empty() {
        warn!("Incorrect '{}' format", dt_tag);
        return None;
    }
    let ps = scan_tag(dts, QCDT_BOARD_TAG, 2)?;
    if ps.is_empty() {
        warn!("Incorrect '{}' format", QCDT_BOARD_TAG);
        return None;
    }
    let ids: Vec<ChipId> = if version == QcdtVersion::V3 {
        let pmic = scan_tag(dts, QCDT_PMIC_TAG, 4)?;
        if pmic.is_empty() {
            warn!("Incorrect '{}' format", QCDT_PMIC_TAG);
            return None;
        }
        iproduct!(&cr, &ps, &pmic)
            .map(|(cr, ps, pmic)| ChipId::V3 {
                chipset: cr[0],
                platform: ps[0],
                subtype: ps[1],
                revision: cr[1],
                pmic: [pmic[0], pmic[1], pmic[2], pmic[3]],
            })
            .collect()
    } else {
        iproduct!(&cr, &ps)
            .map(|(cr, ps)| ChipId::V2 {
                chipset: cr[0],
                platform: ps[0],
                subtype: ps[1],
                revision: cr[1],
            })
            .collect()
    };
    Some((version, ids))
}
