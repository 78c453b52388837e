use crate::inchi::cursor::Cursor;
use crate::inchi::error::Fault;
use crate::inchi::layers::reserve;
use crate::polymer::{
    Crossing, PolymerConnectivity, PolymerDescriptor, PolymerStyle, PolymerSubtype, PolymerUnit,
};
use crate::record::Variant;

/// Parse a `/z` layer. Atom numbers are decimal and count across all
/// components of the view.
pub(crate) fn parse_polymer(
    cur: &mut Cursor<'_>,
    atoms: u32,
    variant: Variant,
) -> Result<PolymerDescriptor, Fault> {
    let mut units: Vec<PolymerUnit> = reserve(cur.rest().split(';').count())?;
    loop {
        units.push(unit(cur, atoms, units.len() as u32 + 1)?);
        if cur.at_end() {
            return Ok(PolymerDescriptor { variant, units });
        }
        cur.expect(b';')?;
    }
}

fn unit(cur: &mut Cursor<'_>, atoms: u32, id: u32) -> Result<PolymerUnit, Fault> {
    let style = code_digit(cur, PolymerStyle::from_digit)?;
    let subtype = code_digit(cur, PolymerSubtype::from_digit)?;
    let connectivity = code_digit(cur, PolymerConnectivity::from_digit)?;
    cur.expect(b'-')?;
    let mut members = Vec::new();
    loop {
        let first = atom(cur, atoms)?;
        if cur.peek() == Some(b'-') {
            cur.bump();
            let pos = cur.pos();
            let last = atom(cur, atoms)?;
            if last <= first {
                return Err(Fault::NotAscending { pos });
            }
            members.extend(first..=last);
        } else {
            members.push(first);
        }
        if !cur.eat(b',') {
            break;
        }
    }
    let crossing = if cur.peek() == Some(b'(') {
        Some(crossing(cur, atoms)?)
    } else {
        None
    };
    Ok(PolymerUnit {
        id,
        label: style.label().to_string(),
        style,
        subtype,
        connectivity,
        atoms: members,
        crossing,
    })
}

fn code_digit<T>(cur: &mut Cursor<'_>, decode: fn(u8) -> Option<T>) -> Result<T, Fault> {
    let value = cur.peek().and_then(decode).ok_or_else(|| cur.unexpected())?;
    cur.bump();
    Ok(value)
}

fn atom(cur: &mut Cursor<'_>, atoms: u32) -> Result<u32, Fault> {
    let a = cur.number()?;
    if a == 0 || a > atoms {
        return Err(Fault::AtomOutOfRange {
            atom: a,
            count: atoms,
        });
    }
    Ok(a)
}

fn crossing(cur: &mut Cursor<'_>, atoms: u32) -> Result<Crossing, Fault> {
    let open = cur.pos();
    cur.expect(b'(')?;
    let a = atom(cur, atoms)?;
    let clause = match cur.peek() {
        Some(b')') => Crossing::StarRingClosure { atom: a },
        Some(b'-') => {
            cur.bump();
            let b = atom(cur, atoms)?;
            cur.expect(b',')?;
            let c = atom(cur, atoms)?;
            cur.expect(b'-')?;
            let d = atom(cur, atoms)?;
            Crossing::EndGroupPair {
                first: (a, b),
                second: (c, d),
            }
        }
        Some(op @ (b'=' | b'#')) => {
            cur.bump();
            let b = atom(cur, atoms)?;
            Crossing::StarHigherOrder {
                atoms: (a, b),
                order: if op == b'=' { 2 } else { 3 },
            }
        }
        Some(b':') => {
            cur.bump();
            let b = atom(cur, atoms)?;
            Crossing::StarDiradical { atoms: (a, b) }
        }
        None => return Err(Fault::Unterminated { pos: open }),
        _ => return Err(cur.unexpected()),
    };
    if cur.at_end() {
        return Err(Fault::Unterminated { pos: open });
    }
    cur.expect(b')')?;
    Ok(clause)
}
