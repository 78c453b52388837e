use crate::inchi::cursor::Cursor;
use crate::inchi::error::Fault;
use crate::inchi::layers::reserve;

/// One component's `/q` entry: `+n` or `-n`.
pub(crate) fn parse_charge(cur: &mut Cursor<'_>) -> Result<i32, Fault> {
    cur.signed()
}

/// Parsed `/p` layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProtonLayer {
    Aggregate(i32),
    PerComponent(Vec<i32>),
}

/// `/p+n` for the whole structure, or a `;` list with one (possibly
/// empty, meaning zero) entry per component.
pub(crate) fn parse_protons(cur: &mut Cursor<'_>, components: usize) -> Result<ProtonLayer, Fault> {
    let text = cur.rest();
    if !text.contains(';') {
        let p = cur.signed()?;
        cur.finish()?;
        return Ok(ProtonLayer::Aggregate(p));
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
        if matches!(cur.peek(), Some(b';') | None) {
            out.push(0);
        } else {
            out.push(cur.signed()?);
        }
        if cur.at_end() {
            break;
        }
        cur.expect(b';')?;
    }
    Ok(ProtonLayer::PerComponent(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inchi::state::Encoding;

    fn protons(s: &str, n: usize) -> Result<ProtonLayer, Fault> {
        parse_protons(&mut Cursor::new(s, 0, Encoding::Undetermined), n)
    }

    #[test]
    fn aggregate() {
        assert_eq!(protons("-1", 1).unwrap(), ProtonLayer::Aggregate(-1));
        assert_eq!(protons("+2", 0).unwrap(), ProtonLayer::Aggregate(2));
        assert!(protons("2", 1).is_err());
    }

    #[test]
    fn per_component() {
        assert_eq!(
            protons("+1;;-1", 3).unwrap(),
            ProtonLayer::PerComponent(vec![1, 0, -1])
        );
        assert!(protons("+1;-1", 1).is_err());
    }

    #[test]
    fn charges() {
        let mut c = Cursor::new("-2", 0, Encoding::Undetermined);
        assert_eq!(parse_charge(&mut c).unwrap(), -2);
    }
}
