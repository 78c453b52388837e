use crate::inchi::cursor::Cursor;
use crate::inchi::error::Fault;
use crate::inchi::layers::reserve;
use crate::record::{IsotopicAtom, IsotopicHydrogens};

/// One component's `/i` entry: `a[±shift][T[n]][D[n]][H[n]]` items joined
/// by `,`, ascending by atom.
pub(crate) fn parse_isotopic_atoms(
    cur: &mut Cursor<'_>,
    atoms: u32,
) -> Result<Vec<IsotopicAtom>, Fault> {
    let n = cur.rest().bytes().filter(|&b| b == b',').count() + 1;
    let mut out: Vec<IsotopicAtom> = reserve(n)?;
    loop {
        let pos = cur.pos();
        let atom = cur.atom(atoms)?;
        let mass_shift = match cur.peek() {
            Some(b'+') | Some(b'-') => Some(cur.signed()? as i16),
            _ => None,
        };
        let mut hydrogens = IsotopicHydrogens::default();
        for (marker, slot) in [
            (b'T', &mut hydrogens.tritium),
            (b'D', &mut hydrogens.deuterium),
            (b'H', &mut hydrogens.protium),
        ] {
            if cur.eat(marker) {
                *slot = cur.opt_number()?.unwrap_or(1);
            }
        }
        if mass_shift.is_none() && hydrogens.is_empty() {
            return Err(cur.unexpected());
        }
        if out.last().is_some_and(|a| a.atom >= atom) {
            return Err(Fault::NotAscending { pos });
        }
        out.push(IsotopicAtom {
            atom,
            mass_shift,
            hydrogens,
        });
        if cur.at_end() {
            return Ok(out);
        }
        cur.expect(b',')?;
    }
}

/// Exchangeable isotopic hydrogen from an `/i/h` layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExchangeLayer {
    Aggregate(IsotopicHydrogens),
    PerComponent(Vec<IsotopicHydrogens>),
}

pub(crate) fn parse_exchangeable(
    cur: &mut Cursor<'_>,
    components: usize,
) -> Result<ExchangeLayer, Fault> {
    let text = cur.rest();
    if !text.contains(';') {
        let h = counts(cur)?;
        if h.is_empty() {
            return Err(cur.unexpected());
        }
        return Ok(ExchangeLayer::Aggregate(h));
    }
    let found = text.split(';').count();
    if found > components {
        return Err(Fault::TooManyComponents {
            expected: components,
            found,
        });
    }
    let mut out = reserve(found)?;
    loop {
        out.push(counts(cur)?);
        if cur.at_end() {
            return Ok(ExchangeLayer::PerComponent(out));
        }
        cur.expect(b';')?;
    }
}

/// `T[n]`, `D[n]` and `H[n]` in any order, each at most once.
fn counts(cur: &mut Cursor<'_>) -> Result<IsotopicHydrogens, Fault> {
    let mut h = IsotopicHydrogens::default();
    let mut seen = [false; 3];
    while let Some(b) = cur.peek() {
        let i = match b {
            b'H' => 0,
            b'D' => 1,
            b'T' => 2,
            b';' => break,
            _ => return Err(cur.unexpected()),
        };
        if seen[i] {
            return Err(Fault::AlreadySet("exchangeable isotopic hydrogen"));
        }
        seen[i] = true;
        cur.bump();
        let n = cur.opt_number()?.unwrap_or(1);
        match i {
            0 => h.protium = n,
            1 => h.deuterium = n,
            _ => h.tritium = n,
        }
    }
    Ok(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inchi::state::Encoding;

    fn cur(s: &str) -> Cursor<'_> {
        Cursor::new(s, 0, Encoding::Undetermined)
    }

    #[test]
    fn labelled_atoms() {
        let a = parse_isotopic_atoms(&mut cur("1+1,3D2,4-1T"), 4).unwrap();
        assert_eq!(a[0].mass_shift, Some(1));
        assert_eq!(a[1].hydrogens.deuterium, 2);
        assert_eq!(a[1].mass_shift, None);
        assert_eq!(a[2].mass_shift, Some(-1));
        assert_eq!(a[2].hydrogens.tritium, 1);
    }

    #[test]
    fn alphabetic_labelled_atoms() {
        let a = parse_isotopic_atoms(&mut cur("A+1,CTD2"), 3).unwrap();
        assert_eq!(a[1].atom, 3);
        assert_eq!(a[1].hydrogens.tritium, 1);
        assert_eq!(a[1].hydrogens.deuterium, 2);
    }

    #[test]
    fn labelled_atom_errors() {
        assert!(parse_isotopic_atoms(&mut cur("1"), 2).is_err());
        assert!(parse_isotopic_atoms(&mut cur("2+1,1+1"), 2).is_err());
        assert!(parse_isotopic_atoms(&mut cur("1+1,"), 2).is_err());
    }

    #[test]
    fn exchangeable() {
        assert_eq!(
            parse_exchangeable(&mut cur("D2T"), 1).unwrap(),
            ExchangeLayer::Aggregate(IsotopicHydrogens {
                protium: 0,
                deuterium: 2,
                tritium: 1
            })
        );
        match parse_exchangeable(&mut cur("D;T2"), 2).unwrap() {
            ExchangeLayer::PerComponent(v) => {
                assert_eq!(v[0].deuterium, 1);
                assert_eq!(v[1].tritium, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse_exchangeable(&mut cur("DD"), 1).is_err());
        assert!(parse_exchangeable(&mut cur("X"), 1).is_err());
    }
}
