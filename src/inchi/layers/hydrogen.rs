use crate::inchi::cursor::Cursor;
use crate::inchi::error::Fault;
use crate::inchi::layers::reserve;
use crate::record::TautomericGroup;

/// Parsed `/h` entry of one component.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct HydrogenEntry {
    pub hydrogens: Vec<u8>,
    pub groups: Vec<TautomericGroup>,
}

/// Parse a mobile-H entry: per-atom counts followed by tautomeric groups.
pub(crate) fn parse_mobile_h(cur: &mut Cursor<'_>, atoms: u32) -> Result<HydrogenEntry, Fault> {
    entry(cur, atoms, true)
}

/// Parse a fixed-H entry: per-atom counts only.
pub(crate) fn parse_fixed_h(cur: &mut Cursor<'_>, atoms: u32) -> Result<Vec<u8>, Fault> {
    entry(cur, atoms, false).map(|e| e.hydrogens)
}

fn entry(cur: &mut Cursor<'_>, atoms: u32, groups_allowed: bool) -> Result<HydrogenEntry, Fault> {
    let mut hydrogens: Vec<u8> = reserve(atoms as usize)?;
    hydrogens.resize(atoms as usize, 0);
    let mut seen = vec![false; atoms as usize];
    let mut groups = Vec::new();
    let mut list = Vec::new();
    while !cur.at_end() {
        if cur.peek() == Some(b'(') {
            if !groups_allowed {
                return Err(cur.unexpected());
            }
            groups.push(group(cur, atoms)?);
            if cur.eat(b',') && cur.peek() != Some(b'(') {
                return Err(cur.unexpected());
            }
            continue;
        }
        if !groups.is_empty() {
            return Err(cur.unexpected());
        }
        list.clear();
        cur.atom_ranges(atoms, &mut list)?;
        let pos = cur.pos();
        let count = if cur.alphabetic_mode() {
            cur.number()?
        } else {
            cur.expect(b'H')?;
            cur.opt_number()?.unwrap_or(1)
        };
        let count = u8::try_from(count).map_err(|_| Fault::NumberTooLarge { pos })?;
        for &atom in &list {
            let slot = &mut seen[atom as usize - 1];
            if *slot {
                return Err(Fault::DuplicateAtom(atom));
            }
            *slot = true;
            hydrogens[atom as usize - 1] = count;
        }
        if !cur.alphabetic_mode() && cur.eat(b',') && cur.at_end() {
            return Err(cur.unexpected());
        }
    }
    Ok(HydrogenEntry { hydrogens, groups })
}

/// `(H[n][-[m]],a,b,...)` in decimal, `(H[n][-[m]]ab...)` in alphabetic.
fn group(cur: &mut Cursor<'_>, atoms: u32) -> Result<TautomericGroup, Fault> {
    let open = cur.pos();
    cur.expect(b'(')?;
    cur.expect(b'H')?;
    let hydrogens = cur.opt_number()?.unwrap_or(1);
    let negative_charges = if cur.eat(b'-') {
        cur.opt_number()?.unwrap_or(1)
    } else {
        0
    };
    let decimal = cur.peek() == Some(b',');
    let mut members: Vec<u32> = Vec::new();
    loop {
        if decimal {
            cur.expect(b',')?;
        }
        let pos = cur.pos();
        let atom = cur.atom(atoms)?;
        if members.last().is_some_and(|&prev| prev >= atom) {
            return Err(Fault::NotAscending { pos });
        }
        members.push(atom);
        match cur.peek() {
            Some(b')') => break,
            None => return Err(Fault::Unterminated { pos: open }),
            _ => {}
        }
    }
    cur.expect(b')')?;
    Ok(TautomericGroup {
        hydrogens,
        negative_charges,
        atoms: members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inchi::state::Encoding;

    fn mobile(s: &str, atoms: u32) -> Result<HydrogenEntry, Fault> {
        parse_mobile_h(&mut Cursor::new(s, 0, Encoding::Undetermined), atoms)
    }

    #[test]
    fn per_atom_counts() {
        let e = mobile("1H4", 1).unwrap();
        assert_eq!(e.hydrogens, vec![4]);
        let e = mobile("1-2H2", 2).unwrap();
        assert_eq!(e.hydrogens, vec![2, 2]);
        let e = mobile("1H3,3,5H", 5).unwrap();
        assert_eq!(e.hydrogens, vec![3, 0, 1, 0, 1]);
    }

    #[test]
    fn tautomeric_groups() {
        let e = mobile("1H3,(H,3,4)", 4).unwrap();
        assert_eq!(e.hydrogens, vec![3, 0, 0, 0]);
        assert_eq!(
            e.groups,
            vec![TautomericGroup {
                hydrogens: 1,
                negative_charges: 0,
                atoms: vec![3, 4]
            }]
        );
        let e = mobile("(H2-,1,2)(H,3,4)", 4).unwrap();
        assert_eq!(e.groups.len(), 2);
        assert_eq!(e.groups[0].hydrogens, 2);
        assert_eq!(e.groups[0].negative_charges, 1);
    }

    #[test]
    fn alphabetic_entries() {
        let e = mobile("A3C-D1(H2AB)", 4).unwrap();
        assert_eq!(e.hydrogens, vec![3, 0, 1, 1]);
        assert_eq!(e.groups[0].atoms, vec![1, 2]);
        assert_eq!(e.groups[0].hydrogens, 2);
    }

    #[test]
    fn fixed_h_rejects_groups() {
        let mut c = Cursor::new("3H,(H,1,2)", 0, Encoding::Undetermined);
        assert!(parse_fixed_h(&mut c, 3).is_err());
        let mut c = Cursor::new("3H", 0, Encoding::Undetermined);
        assert_eq!(parse_fixed_h(&mut c, 3).unwrap(), vec![0, 0, 1]);
    }

    #[test]
    fn errors() {
        assert_eq!(mobile("1H,1H2", 2), Err(Fault::DuplicateAtom(1)));
        assert_eq!(mobile("(H,1,2", 2), Err(Fault::Unterminated { pos: 0 }));
        assert!(mobile("1H3,", 1).is_err());
        assert!(mobile("(H,1,2),1H", 2).is_err());
        assert!(mobile("(H,2,1)", 2).is_err());
        assert!(mobile("1H300", 1).is_err());
    }
}
