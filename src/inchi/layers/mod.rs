//! Per-layer grammars.
//!
//! Each submodule parses the body of one family of layers into plain
//! values; writing them into the record set is left to the driver. The
//! helpers here split per-component layers on `;`, expand `N*`
//! multipliers and recognise whole-entry abbreviations.

pub(crate) mod charge;
pub(crate) mod connections;
pub(crate) mod formula;
pub(crate) mod hydrogen;
pub(crate) mod isotopic;
pub(crate) mod polymer;
pub(crate) mod stereo;
pub(crate) mod transposition;

use crate::inchi::cursor::Cursor;
use crate::inchi::error::Fault;
use crate::record::{IsotopeDomain, TautomerDomain};

/// Whole-entry shorthand for data held by a related layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abbrev {
    /// `m`: the mobile-H layer of the same isotope domain.
    Mobile,
    /// `n`: the non-isotopic layer of the same tautomer domain.
    NonIsotopic,
    /// `M`: the mobile-H isotopic layer.
    MobileIsotopic,
    /// `N`: the mobile-H non-isotopic layer.
    MobileNonIsotopic,
    /// `e`: explicitly empty.
    Empty,
}

impl Abbrev {
    pub fn from_byte(b: u8) -> Option<Abbrev> {
        Some(match b {
            b'm' => Abbrev::Mobile,
            b'n' => Abbrev::NonIsotopic,
            b'M' => Abbrev::MobileIsotopic,
            b'N' => Abbrev::MobileNonIsotopic,
            b'e' => Abbrev::Empty,
            _ => return None,
        })
    }

    pub fn letter(self) -> char {
        match self {
            Abbrev::Mobile => 'm',
            Abbrev::NonIsotopic => 'n',
            Abbrev::MobileIsotopic => 'M',
            Abbrev::MobileNonIsotopic => 'N',
            Abbrev::Empty => 'e',
        }
    }

    /// The layer this abbreviation copies from when it appears in a layer
    /// of `domain`/`isotope`; `None` for [`Abbrev::Empty`].
    pub fn source(
        self,
        domain: TautomerDomain,
        isotope: IsotopeDomain,
    ) -> Result<Option<(TautomerDomain, IsotopeDomain)>, Fault> {
        let fixed = domain == TautomerDomain::Fixed;
        let iso = isotope == IsotopeDomain::Isotopic;
        let src = match self {
            Abbrev::Empty => return Ok(None),
            Abbrev::Mobile if fixed => (TautomerDomain::Mobile, isotope),
            Abbrev::NonIsotopic if iso => (domain, IsotopeDomain::NonIsotopic),
            Abbrev::MobileIsotopic if fixed && iso => {
                (TautomerDomain::Mobile, IsotopeDomain::Isotopic)
            }
            Abbrev::MobileNonIsotopic if fixed && iso => {
                (TautomerDomain::Mobile, IsotopeDomain::NonIsotopic)
            }
            _ => {
                return Err(Fault::BadAbbreviation {
                    abbrev: self.letter(),
                })
            }
        };
        Ok(Some(src))
    }
}

/// One component's entry in a per-component layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot<T> {
    Empty,
    Abbrev(Abbrev),
    Value(T),
}

/// Reserve exactly `n` slots, reporting exhaustion instead of aborting.
pub(crate) fn reserve<T>(n: usize) -> Result<Vec<T>, Fault> {
    let mut v = Vec::new();
    v.try_reserve_exact(n).map_err(|_| Fault::Allocation(n))?;
    Ok(v)
}

/// Split a `;`-separated layer body into one slot per component.
///
/// The first pass measures how many components the body describes
/// (multipliers included) so the result is allocated once; the second
/// pass parses each entry with `parse`, which gets the 0-based component
/// index. A multiplied entry is parsed once per component it covers since
/// components may differ in size.
pub(crate) fn per_component<'a, T>(
    cur: &mut Cursor<'a>,
    components: usize,
    abbreviations: bool,
    mut parse: impl FnMut(&mut Cursor<'a>, usize) -> Result<T, Fault>,
) -> Result<Vec<Slot<T>>, Fault> {
    let text = cur.rest();
    let mut total = 0usize;
    for piece in text.split(';') {
        total = total.saturating_add(multiplier(piece).0 as usize);
    }
    if total > components {
        return Err(Fault::TooManyComponents {
            expected: components,
            found: total,
        });
    }
    let mut out = reserve(total)?;
    let mut encoding = cur.encoding();
    for piece in text.split(';') {
        let (count, prefix) = multiplier(piece);
        if count == 0 {
            return Err(Fault::UnexpectedChar {
                pos: cur.pos(),
                ch: '0',
            });
        }
        cur.split(prefix);
        let entry = cur.split(piece.len() - prefix);
        cur.eat(b';');
        let abbrev = match entry.rest().as_bytes() {
            [b] if abbreviations => Abbrev::from_byte(*b),
            _ => None,
        };
        for _ in 0..count {
            cur.set_component(out.len());
            let slot = if let Some(a) = abbrev {
                Slot::Abbrev(a)
            } else if entry.is_empty() {
                Slot::Empty
            } else {
                let mut sub = entry.clone();
                sub.set_encoding(encoding);
                let value = parse(&mut sub, out.len())?;
                sub.finish()?;
                encoding = sub.encoding();
                Slot::Value(value)
            };
            out.push(slot);
        }
    }
    cur.set_encoding(encoding);
    Ok(out)
}

/// Leading `N*` of an entry: the repeat count and the prefix length.
fn multiplier(piece: &str) -> (u32, usize) {
    let digits = piece.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && piece.as_bytes().get(digits) == Some(&b'*') {
        let n = piece[..digits].parse::<u32>().unwrap_or(u32::MAX);
        (n, digits + 1)
    } else {
        (1, 0)
    }
}

/// A whole-layer abbreviation: the body is one abbreviation letter.
pub(crate) fn whole_layer_abbrev(cur: &Cursor<'_>) -> Option<Abbrev> {
    match cur.rest().as_bytes() {
        [b] => Abbrev::from_byte(*b),
        _ => None,
    }
}
