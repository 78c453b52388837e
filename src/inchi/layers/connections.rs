use crate::inchi::cursor::Cursor;
use crate::inchi::error::Fault;
use crate::inchi::layers::reserve;
use crate::record::ConnectionTable;

/// Parse one component's `/c` entry.
///
/// Decimal entries are chains such as `1-2(3,4)5-1`; alphabetic entries
/// are runs of an atom followed by its lower-numbered neighbours.
pub(crate) fn parse_connections(
    cur: &mut Cursor<'_>,
    atoms: u32,
) -> Result<ConnectionTable, Fault> {
    let mut lower: Vec<Vec<u32>> = reserve(atoms as usize)?;
    lower.resize_with(atoms as usize, Vec::new);
    if cur.alphabetic_mode() {
        runs(cur, atoms, &mut lower)?;
    } else {
        chains(cur, atoms, &mut lower)?;
    }
    for neighbors in &mut lower {
        neighbors.sort_unstable();
    }
    Ok(ConnectionTable::from_lower(lower))
}

fn add_bond(lower: &mut [Vec<u32>], a: u32, b: u32) -> Result<(), Fault> {
    if a == b {
        return Err(Fault::SelfBond(a));
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    let list = &mut lower[hi as usize - 1];
    if list.contains(&lo) {
        return Err(Fault::DuplicateBond(hi, lo));
    }
    list.push(lo);
    Ok(())
}

fn chains(cur: &mut Cursor<'_>, atoms: u32, lower: &mut [Vec<u32>]) -> Result<(), Fault> {
    // open branches: (origin atom, offset of the parenthesis)
    let mut origins: Vec<(u32, usize)> = Vec::new();
    let mut bond_to: Option<u32> = None;
    loop {
        let atom = cur.atom(atoms)?;
        if let Some(prev) = bond_to {
            add_bond(lower, prev, atom)?;
        }
        let mut last = atom;
        let mut closed = false;
        loop {
            match cur.peek() {
                None => {
                    return match origins.last() {
                        Some(&(_, pos)) => Err(Fault::Unterminated { pos }),
                        None => Ok(()),
                    };
                }
                Some(b'-') if !closed => {
                    cur.bump();
                    bond_to = Some(last);
                    break;
                }
                Some(b'(') if !closed => {
                    origins.push((last, cur.pos()));
                    cur.bump();
                    bond_to = Some(last);
                    break;
                }
                Some(b',') if !origins.is_empty() => {
                    cur.bump();
                    bond_to = origins.last().map(|&(a, _)| a);
                    break;
                }
                Some(b')') => {
                    let (origin, _) = origins.pop().ok_or_else(|| cur.unexpected())?;
                    cur.bump();
                    last = origin;
                    bond_to = Some(origin);
                    closed = true;
                    if cur.at_atom() {
                        break;
                    }
                }
                _ => return Err(cur.unexpected()),
            }
        }
    }
}

fn runs(cur: &mut Cursor<'_>, atoms: u32, lower: &mut [Vec<u32>]) -> Result<(), Fault> {
    let mut entry = 0u32;
    let mut last_neighbor = 0u32;
    while !cur.at_end() {
        let pos = cur.pos();
        let atom = cur.atom(atoms)?;
        if entry != 0 && atom < entry && atom > last_neighbor {
            add_bond(lower, entry, atom)?;
            last_neighbor = atom;
        } else if atom > entry {
            if entry != 0 && last_neighbor == 0 {
                return Err(Fault::NotAscending { pos });
            }
            entry = atom;
            last_neighbor = 0;
        } else {
            return Err(Fault::NotAscending { pos });
        }
    }
    if entry != 0 && last_neighbor == 0 {
        return Err(Fault::UnexpectedEnd { pos: cur.pos() });
    }
    Ok(())
}
