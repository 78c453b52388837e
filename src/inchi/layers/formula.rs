use crate::element::{hill_cmp, Element};
use crate::formula::Formula;
use crate::inchi::cursor::Cursor;
use crate::inchi::error::Fault;
use crate::inchi::layers::reserve;

/// Parse a `.`-separated formula layer into one formula per component.
///
/// A leading count repeats a component: `2H2O` is two waters.
pub(crate) fn parse_formula(cur: &mut Cursor<'_>) -> Result<Vec<Formula>, Fault> {
    let text = cur.rest();
    let mut total = 0usize;
    for piece in text.split('.') {
        let digits = piece.bytes().take_while(u8::is_ascii_digit).count();
        total = total.saturating_add(piece[..digits].parse::<usize>().unwrap_or(1));
    }
    let mut out = reserve(total.min(text.len() + 1))?;
    loop {
        let start = cur.pos();
        let repeat = cur.opt_number()?.unwrap_or(1);
        if repeat == 0 {
            return Err(Fault::UnexpectedChar { pos: start, ch: '0' });
        }
        let formula = component(cur)?;
        for _ in 1..repeat {
            out.push(formula.clone());
        }
        out.push(formula);
        if cur.at_end() {
            break;
        }
        cur.expect(b'.')?;
    }
    Ok(out)
}

fn component(cur: &mut Cursor<'_>) -> Result<Formula, Fault> {
    let mut counts: Vec<(Element, u32)> = Vec::new();
    while cur.peek().is_some_and(|b| b.is_ascii_uppercase()) {
        let element = symbol(cur)?;
        let pos = cur.pos();
        let n = cur.opt_number()?.unwrap_or(1);
        if n == 0 {
            return Err(Fault::UnexpectedChar { pos, ch: '0' });
        }
        if let Some(&(prev, _)) = counts.last() {
            let has_carbon = counts[0].0 == Element::C;
            if element == Element::C || !hill_cmp(prev, element, has_carbon).is_lt() {
                return Err(Fault::HillOrder(element.symbol().to_string()));
            }
        }
        counts.push((element, n));
    }
    if counts.is_empty() {
        return Err(cur.unexpected());
    }
    Ok(Formula::from_counts(counts))
}

fn symbol(cur: &mut Cursor<'_>) -> Result<Element, Fault> {
    let text = cur.rest();
    let len = 1 + text[1..]
        .bytes()
        .take_while(u8::is_ascii_lowercase)
        .count();
    let sym = &text[..len];
    let element = Element::from_symbol(sym).ok_or_else(|| Fault::UnknownElement(sym.to_string()))?;
    cur.split(len);
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inchi::state::Encoding;

    fn parse(s: &str) -> Result<Vec<Formula>, Fault> {
        parse_formula(&mut Cursor::new(s, 0, Encoding::Undetermined))
    }

    #[test]
    fn single_component() {
        let f = parse("C2H4O2").unwrap();
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].to_string(), "C2H4O2");
        assert_eq!(f[0].atom_count(), 4);
    }

    #[test]
    fn components_and_multiplier() {
        let f = parse("C2H3O2.2H2O.Na").unwrap();
        let s: Vec<String> = f.iter().map(Formula::to_string).collect();
        assert_eq!(s, ["C2H3O2", "H2O", "H2O", "Na"]);
    }

    #[test]
    fn hill_order_enforced() {
        assert_eq!(parse("H4C"), Err(Fault::HillOrder("C".into())));
        assert_eq!(parse("CH4O2N"), Err(Fault::HillOrder("N".into())));
        assert!(parse("BrC").is_err());
        assert!(parse("ClNa").is_ok());
        assert!(parse("H3N").is_ok());
    }

    #[test]
    fn unknown_element() {
        assert_eq!(parse("Xx2"), Err(Fault::UnknownElement("Xx".into())));
    }

    #[test]
    fn malformed() {
        assert!(parse("C2..H2").is_err());
        assert!(parse("c2").is_err());
        assert!(parse("C0").is_err());
        assert!(parse("0C").is_err());
    }
}
