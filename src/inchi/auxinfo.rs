//! The optional `AuxInfo=` appendix.
//!
//! AuxInfo maps canonical atom numbers back to the numbering of the input
//! structure and may carry coordinates. It is advisory: parts that cannot
//! be read are skipped with a warning, unless the caller asked for
//! coordinates, in which case a missing or short coordinate list fails the
//! read.

use log::{trace, warn};

use crate::inchi::error::Fault;
use crate::inchi::source::AUX_PREFIX;
use crate::inchi::state::LayerState;
use crate::options::ReadOptions;
use crate::record::{RecordSet, TautomerDomain, Variant};

/// One atom's coordinates; `None` when the structure had none.
pub type Coordinates = Option<[f64; 3]>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuxInfo {
    pub version: u8,
    /// Normalization type from the second field.
    pub normalization: u8,
    /// `N:`: original atom numbers in canonical order, per component.
    pub numbering: Vec<Vec<u32>>,
    /// `E:`: classes of equivalent atoms, per component.
    pub equivalence: Vec<Vec<Vec<u32>>>,
    /// `gE:`: classes of equivalent tautomeric groups.
    pub group_equivalence: Vec<Vec<Vec<u32>>>,
    /// `it:`: which layers had their tetrahedral parities inverted.
    pub inverted_tetrahedral: Option<String>,
    /// `iN:`: isotopic numbering, per component.
    pub isotopic_numbering: Vec<Vec<u32>>,
    /// `F:`: fixed-H numbering, per component.
    pub fixed_numbering: Vec<Vec<u32>>,
    /// `rC:`: one entry per original atom.
    pub coordinates: Option<Vec<Coordinates>>,
    /// Everything after `R:`.
    pub reconnected: Option<Box<AuxInfo>>,
}

impl AuxInfo {
    /// Original number of canonical atom `atom` in `component` (both 1-based
    /// and 0-based respectively).
    pub fn original_number(&self, component: usize, atom: u32) -> Option<u32> {
        let list = self.numbering.get(component)?;
        list.get(atom.checked_sub(1)? as usize).copied()
    }

    fn numbered_atoms(&self) -> usize {
        self.numbering.iter().map(Vec::len).sum()
    }
}

pub(crate) fn parse_auxinfo(
    text: &str,
    records: &RecordSet,
    options: &ReadOptions,
    layer: &mut LayerState,
) -> Result<Option<AuxInfo>, Fault> {
    let body = text.trim().strip_prefix(AUX_PREFIX).unwrap_or(text.trim());
    let mut parts = body.split('/');
    *layer = LayerState::AuxVersion;
    let version = match parts.next().map(str::parse::<u8>) {
        Some(Ok(1)) => 1,
        _ => {
            if options.require_coordinates {
                return Err(Fault::Coordinates("unsupported AuxInfo version".into()));
            }
            warn!("skipping AuxInfo with unsupported version");
            return Ok(None);
        }
    };
    *layer = LayerState::AuxNormalization;
    let normalization = match parts.next().map(str::parse::<u8>) {
        Some(Ok(n)) => n,
        _ => {
            warn!("AuxInfo normalization type unreadable");
            0
        }
    };
    let rest: Vec<&str> = parts.collect();
    let mut aux = AuxInfo {
        version,
        normalization,
        ..AuxInfo::default()
    };
    read_parts(&rest, &mut aux, layer);

    if options.require_coordinates {
        *layer = LayerState::AuxCoordinates;
        let coordinates = aux
            .coordinates
            .as_ref()
            .ok_or_else(|| Fault::Coordinates("no rC: part".into()))?;
        let expected = if aux.numbering.is_empty() {
            records
                .view(Variant::Disconnected, TautomerDomain::Mobile)
                .map_or(0, |v| v.atom_total())
        } else {
            aux.numbered_atoms()
        };
        if coordinates.len() != expected {
            return Err(Fault::Coordinates(format!(
                "{} coordinate entries for {expected} atoms",
                coordinates.len()
            )));
        }
    }
    Ok(Some(aux))
}

fn read_parts(parts: &[&str], aux: &mut AuxInfo, layer: &mut LayerState) {
    for (i, part) in parts.iter().enumerate() {
        let Some((key, value)) = part.split_once(':') else {
            warn!("AuxInfo part {part:?} has no key");
            continue;
        };
        match key {
            "N" => {
                *layer = LayerState::AuxNumbering;
                store(&mut aux.numbering, numbering(value, &[]), key);
            }
            "E" => {
                *layer = LayerState::AuxEquivalence;
                store(&mut aux.equivalence, classes(value), key);
            }
            "gE" => {
                *layer = LayerState::AuxGroupEquivalence;
                store(&mut aux.group_equivalence, classes(value), key);
            }
            "it" => {
                *layer = LayerState::AuxInvertedTetrahedral;
                aux.inverted_tetrahedral = Some(value.to_string());
            }
            "iN" | "I" => {
                *layer = LayerState::AuxIsotopicNumbering;
                let parsed = numbering(value, &aux.numbering);
                store(&mut aux.isotopic_numbering, parsed, key);
            }
            "F" => {
                *layer = LayerState::AuxFixedNumbering;
                let parsed = numbering(value, &aux.numbering);
                store(&mut aux.fixed_numbering, parsed, key);
            }
            "rA" | "rB" => {
                *layer = LayerState::AuxReverse;
                trace!("skipping AuxInfo {key}: part");
            }
            "rC" => {
                *layer = LayerState::AuxCoordinates;
                match coordinates(value) {
                    Some(c) => aux.coordinates = Some(c),
                    None => warn!("AuxInfo coordinates unreadable"),
                }
            }
            "R" => {
                let mut nested = AuxInfo {
                    version: aux.version,
                    normalization: aux.normalization,
                    ..AuxInfo::default()
                };
                let mut rest = &parts[i + 1..];
                if let Some(n) = rest.first().and_then(|p| p.parse().ok()) {
                    nested.normalization = n;
                    rest = &rest[1..];
                }
                read_parts(rest, &mut nested, layer);
                aux.reconnected = Some(Box::new(nested));
                return;
            }
            _ => warn!("unknown AuxInfo part {key:?}"),
        }
    }
}

fn store<T>(field: &mut Vec<T>, parsed: Option<Vec<T>>, key: &str) {
    match parsed {
        Some(v) => *field = v,
        None => warn!("AuxInfo {key}: part unreadable"),
    }
}

fn numbers(text: &str) -> Option<Vec<u32>> {
    if text.is_empty() {
        return Some(Vec::new());
    }
    text.split(',').map(|n| n.parse().ok()).collect()
}

/// `;`-separated number lists; `m` repeats the same component of `base`.
fn numbering(value: &str, base: &[Vec<u32>]) -> Option<Vec<Vec<u32>>> {
    value
        .split(';')
        .enumerate()
        .map(|(i, entry)| match entry {
            "m" => base.get(i).cloned(),
            _ => numbers(entry),
        })
        .collect()
}

/// `(a,b)(c,d);(e,f)`: equivalence classes per component.
fn classes(value: &str) -> Option<Vec<Vec<Vec<u32>>>> {
    value
        .split(';')
        .map(|entry| {
            let mut out = Vec::new();
            let mut rest = entry;
            while !rest.is_empty() {
                let inner = rest.strip_prefix('(')?;
                let close = inner.find(')')?;
                out.push(numbers(&inner[..close])?);
                rest = &inner[close + 1..];
            }
            Some(out)
        })
        .collect()
}

/// `x,y,z;` per atom; an empty entry means no coordinates.
fn coordinates(value: &str) -> Option<Vec<Coordinates>> {
    if value.is_empty() {
        return Some(Vec::new());
    }
    let entries = value.strip_suffix(';').unwrap_or(value);
    entries
        .split(';')
        .map(|entry| {
            if entry.is_empty() {
                return Some(None);
            }
            let mut xyz = [0.0f64; 3];
            let mut count = 0;
            for (slot, field) in xyz.iter_mut().zip(entry.split(',')) {
                *slot = if field.is_empty() { 0.0 } else { field.parse().ok()? };
                count += 1;
            }
            (count >= 2 && entry.split(',').count() <= 3).then_some(Some(xyz))
        })
        .collect()
}
