use crate::inchi::cursor::Cursor;
use crate::inchi::error::Fault;
use crate::inchi::layers::{reserve, whole_layer_abbrev, Abbrev};
use crate::record::{Inversion, Parity, StereoBond, StereoCenter, StereoType};

fn parity(cur: &mut Cursor<'_>) -> Result<Parity, Fault> {
    let p = cur.peek().and_then(Parity::from_char).ok_or_else(|| cur.unexpected())?;
    cur.bump();
    Ok(p)
}

/// Items are `,`-joined in decimal and simply concatenated in alphabetic.
fn next_item(cur: &mut Cursor<'_>) -> Result<bool, Fault> {
    if cur.at_end() {
        return Ok(false);
    }
    if !cur.alphabetic_mode() {
        cur.expect(b',')?;
    }
    Ok(true)
}

fn measure(cur: &Cursor<'_>) -> usize {
    cur.rest().bytes().filter(|&b| b == b',').count() + 1
}

/// One component's `/b` entry: `a-b±` (decimal) or `ab±` (alphabetic),
/// with `a > b` and entries ascending.
pub(crate) fn parse_sp2(cur: &mut Cursor<'_>, atoms: u32) -> Result<Vec<StereoBond>, Fault> {
    let mut out: Vec<StereoBond> = reserve(measure(cur))?;
    loop {
        let pos = cur.pos();
        let first = cur.atom(atoms)?;
        if !cur.alphabetic_mode() {
            cur.expect(b'-')?;
        }
        let second = cur.atom_before_parity(atoms)?;
        let parity = parity(cur)?;
        if first <= second {
            return Err(Fault::NotAscending { pos });
        }
        if out
            .last()
            .is_some_and(|b: &StereoBond| (b.first, b.second) >= (first, second))
        {
            return Err(Fault::NotAscending { pos });
        }
        out.push(StereoBond {
            first,
            second,
            parity,
        });
        if !next_item(cur)? {
            return Ok(out);
        }
    }
}

/// One component's `/t` entry: `a±` items in ascending atom order.
pub(crate) fn parse_sp3(cur: &mut Cursor<'_>, atoms: u32) -> Result<Vec<StereoCenter>, Fault> {
    let mut out: Vec<StereoCenter> = reserve(measure(cur))?;
    loop {
        let pos = cur.pos();
        let atom = cur.atom_before_parity(atoms)?;
        let parity = parity(cur)?;
        if out.last().is_some_and(|c: &StereoCenter| c.atom >= atom) {
            return Err(Fault::NotAscending { pos });
        }
        out.push(StereoCenter { atom, parity });
        if !next_item(cur)? {
            return Ok(out);
        }
    }
}

/// Parsed `/m` layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InversionLayer {
    Abbrev(Abbrev),
    /// One flag per listed component; `None` for `.`.
    Flags(Vec<Option<Inversion>>),
}

pub(crate) fn parse_inversion(
    cur: &mut Cursor<'_>,
    components: usize,
) -> Result<InversionLayer, Fault> {
    if let Some(a) = whole_layer_abbrev(cur) {
        cur.split(1);
        return Ok(InversionLayer::Abbrev(a));
    }
    let found = cur.rest().len();
    if found > components {
        return Err(Fault::TooManyComponents {
            expected: components,
            found,
        });
    }
    let mut flags = reserve(found)?;
    while let Some(b) = cur.peek() {
        flags.push(match b {
            b'0' => Some(Inversion::Absolute),
            b'1' => Some(Inversion::Inverted),
            b'.' => None,
            _ => return Err(cur.unexpected()),
        });
        cur.bump();
    }
    Ok(InversionLayer::Flags(flags))
}

/// Parsed `/s` layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StereoTypeLayer {
    Abbrev(Abbrev),
    Code(StereoType),
}

pub(crate) fn parse_stereo_type(cur: &mut Cursor<'_>) -> Result<StereoTypeLayer, Fault> {
    if let Some(a) = whole_layer_abbrev(cur) {
        cur.split(1);
        return Ok(StereoTypeLayer::Abbrev(a));
    }
    let code = cur
        .peek()
        .and_then(StereoType::from_code)
        .ok_or_else(|| cur.unexpected())?;
    cur.bump();
    cur.finish()?;
    Ok(StereoTypeLayer::Code(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inchi::state::Encoding;

    fn cur(s: &str) -> Cursor<'_> {
        Cursor::new(s, 0, Encoding::Undetermined)
    }

    #[test]
    fn decimal_double_bonds() {
        let b = parse_sp2(&mut cur("2-1-,4-3+"), 4).unwrap();
        assert_eq!(
            b,
            vec![
                StereoBond {
                    first: 2,
                    second: 1,
                    parity: Parity::Odd
                },
                StereoBond {
                    first: 4,
                    second: 3,
                    parity: Parity::Even
                },
            ]
        );
    }

    #[test]
    fn alphabetic_double_bonds() {
        let b = parse_sp2(&mut cur("BA-DCu"), 4).unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b[1].parity, Parity::Unknown);
        assert_eq!((b[1].first, b[1].second), (4, 3));
    }

    #[test]
    fn double_bond_order_checked() {
        assert!(parse_sp2(&mut cur("1-2-"), 2).is_err());
        assert!(parse_sp2(&mut cur("4-3+,2-1-"), 4).is_err());
    }

    #[test]
    fn centers() {
        let t = parse_sp3(&mut cur("1-,2+,5?"), 5).unwrap();
        let atoms: Vec<u32> = t.iter().map(|c| c.atom).collect();
        assert_eq!(atoms, vec![1, 2, 5]);
        assert_eq!(t[2].parity, Parity::Undefined);
        let t = parse_sp3(&mut cur("A-BuC+"), 3).unwrap();
        assert_eq!(t[1].parity, Parity::Unknown);
        assert_eq!(t[2].atom, 3);
        assert!(parse_sp3(&mut cur("2-,1+"), 2).is_err());
        assert!(parse_sp3(&mut cur("2"), 2).is_err());
    }

    #[test]
    fn inversion_flags() {
        assert_eq!(
            parse_inversion(&mut cur("1.0"), 3).unwrap(),
            InversionLayer::Flags(vec![
                Some(Inversion::Inverted),
                None,
                Some(Inversion::Absolute)
            ])
        );
        assert_eq!(
            parse_inversion(&mut cur("m"), 1).unwrap(),
            InversionLayer::Abbrev(Abbrev::Mobile)
        );
        assert!(parse_inversion(&mut cur("11"), 1).is_err());
        assert!(parse_inversion(&mut cur("2"), 1).is_err());
    }

    #[test]
    fn stereo_types() {
        assert_eq!(
            parse_stereo_type(&mut cur("2")).unwrap(),
            StereoTypeLayer::Code(StereoType::Relative)
        );
        assert!(parse_stereo_type(&mut cur("4")).is_err());
        assert!(parse_stereo_type(&mut cur("11")).is_err());
    }
}
