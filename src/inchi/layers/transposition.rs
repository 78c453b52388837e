use crate::inchi::cursor::Cursor;
use crate::inchi::error::Fault;
use crate::record::Transposition;

/// `/o(1,2)(3,5,4)`: cycles over fixed-H component numbers.
pub(crate) fn parse_transposition(
    cur: &mut Cursor<'_>,
    components: usize,
) -> Result<Transposition, Fault> {
    let mut seen = vec![false; components];
    let mut cycles = Vec::new();
    while !cur.at_end() {
        let open = cur.pos();
        cur.expect(b'(')?;
        let mut cycle = Vec::new();
        loop {
            let c = cur.number()?;
            let slot = c
                .checked_sub(1)
                .and_then(|i| seen.get_mut(i as usize))
                .ok_or(Fault::AtomOutOfRange {
                    atom: c,
                    count: components as u32,
                })?;
            if *slot {
                return Err(Fault::DuplicateAtom(c));
            }
            *slot = true;
            cycle.push(c);
            match cur.peek() {
                Some(b',') => {
                    cur.bump();
                }
                Some(b')') => break,
                None => return Err(Fault::Unterminated { pos: open }),
                _ => return Err(cur.unexpected()),
            }
        }
        cur.bump();
        if cycle.len() < 2 {
            return Err(Fault::UnexpectedChar { pos: open, ch: '(' });
        }
        cycles.push(cycle);
    }
    Ok(Transposition { cycles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inchi::state::Encoding;

    fn parse(s: &str, n: usize) -> Result<Transposition, Fault> {
        parse_transposition(&mut Cursor::new(s, 0, Encoding::Undetermined), n)
    }

    #[test]
    fn cycles() {
        let t = parse("(1,2)(3,5,4)", 5).unwrap();
        assert_eq!(t.cycles, vec![vec![1, 2], vec![3, 5, 4]]);
        assert_eq!(t.fixed_to_mobile(5), vec![1, 0, 4, 2, 3]);
    }

    #[test]
    fn errors() {
        assert_eq!(parse("(1,1)", 2), Err(Fault::DuplicateAtom(1)));
        assert!(parse("(1,3)", 2).is_err());
        assert!(parse("(1)", 2).is_err());
        assert_eq!(parse("(1,2", 2), Err(Fault::Unterminated { pos: 0 }));
    }
}
