//! Prefix and segment splitting.
//!
//! Nothing here interprets layer contents; the driver receives `/`-separated
//! segments with their absolute offsets so faults can point into the
//! original text.

use crate::inchi::error::Fault;
use crate::inchi::Flavour;

const PREFIX: &str = "InChI=";
pub(crate) const AUX_PREFIX: &str = "AuxInfo=";

/// Identifier prefix and the layer text behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Prefix<'a> {
    pub version: u8,
    pub flavour: Flavour,
    pub body: &'a str,
    /// Offset of `body` in the identifier.
    pub offset: usize,
}

/// Split `InChI=1[S|B]/...` into version, flavour and layer text.
pub(crate) fn split_prefix(text: &str) -> Result<Prefix<'_>, Fault> {
    let rest = text.strip_prefix(PREFIX).ok_or(Fault::BadPrefix)?;
    let rest = rest.strip_prefix('1').ok_or(Fault::BadPrefix)?;
    let (flavour, rest) = match rest.as_bytes().first() {
        Some(b'S') => (Flavour::Standard, &rest[1..]),
        Some(b'B') => (Flavour::Beta, &rest[1..]),
        _ => (Flavour::NonStandard, rest),
    };
    let body = match rest.strip_prefix('/') {
        Some(body) => body,
        None if rest.is_empty() => return Err(Fault::NoLayers),
        None => return Err(Fault::BadPrefix),
    };
    if body.is_empty() {
        return Err(Fault::NoLayers);
    }
    Ok(Prefix {
        version: 1,
        flavour,
        body,
        offset: text.len() - body.len(),
    })
}

/// One `/`-separated piece of layer text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment<'a> {
    pub offset: usize,
    pub text: &'a str,
}

impl<'a> Segment<'a> {
    /// The layer prefix letter, if the segment starts with one.
    pub fn letter(&self) -> Option<u8> {
        self.text
            .as_bytes()
            .first()
            .copied()
            .filter(u8::is_ascii_lowercase)
    }
}

pub(crate) fn split_segments(body: &str, offset: usize) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    for piece in body.split('/') {
        out.push(Segment {
            offset: offset + start,
            text: piece,
        });
        start += piece.len() + 1;
    }
    out
}

/// Cut an identifier at the first byte that terminates it.
pub(crate) fn terminate(text: &str) -> &str {
    let end = text
        .find(|c: char| c == '\t' || c == '\n' || c == '\r' || c == ' ')
        .unwrap_or(text.len());
    &text[..end]
}

/// The record at the start of `text`: cut at a terminator byte or where a
/// second identifier begins.
pub(crate) fn first_record(text: &str) -> &str {
    let text = terminate(text);
    let end = text
        .get(1..)
        .and_then(|rest| rest.find(PREFIX))
        .map_or(text.len(), |i| i + 1);
    &text[..end]
}

/// Identifiers and AuxInfo records found on one line, in order.
///
/// A line may carry leading text before the first prefix (a name column,
/// say); anything not starting with a recognised prefix is dropped.
pub(crate) fn records_in_line(line: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = line
        .match_indices(PREFIX)
        .map(|(i, _)| i)
        .chain(line.match_indices(AUX_PREFIX).map(|(i, _)| i))
        .collect();
    starts.sort_unstable();
    starts
        .iter()
        .enumerate()
        .map(|(k, &start)| {
            let end = starts.get(k + 1).copied().unwrap_or(line.len());
            terminate(&line[start..end])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes() {
        let p = split_prefix("InChI=1S/CH4/h1H4").unwrap();
        assert_eq!(p.flavour, Flavour::Standard);
        assert_eq!(p.body, "CH4/h1H4");
        assert_eq!(p.offset, 9);
        assert_eq!(
            split_prefix("InChI=1/CH4").unwrap().flavour,
            Flavour::NonStandard
        );
        assert_eq!(split_prefix("InChI=1B/CH4").unwrap().flavour, Flavour::Beta);
    }

    #[test]
    fn bad_prefixes() {
        assert_eq!(split_prefix("InChI=2S/CH4"), Err(Fault::BadPrefix));
        assert_eq!(split_prefix("InChl=1S/CH4"), Err(Fault::BadPrefix));
        assert_eq!(split_prefix("InChI=1X/CH4"), Err(Fault::BadPrefix));
        assert_eq!(split_prefix("InChI=1S"), Err(Fault::NoLayers));
        assert_eq!(split_prefix("InChI=1S/"), Err(Fault::NoLayers));
    }

    #[test]
    fn segments_keep_offsets() {
        let segs = split_segments("CH4/h1H4", 9);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].offset, 13);
        assert_eq!(segs[1].letter(), Some(b'h'));
        assert_eq!(segs[0].letter(), None);
        let segs = split_segments("C2H4O2/i/h", 0);
        assert_eq!(segs[1].text, "i");
        assert_eq!(segs[2].offset, 9);
    }

    #[test]
    fn splits_lines() {
        let line = "methane\tInChI=1S/CH4/h1H4InChI=1S/H2O/h1H2\tAuxInfo=1/0/N:1/rA:1C/rB:/rC:;";
        assert_eq!(
            records_in_line(line),
            vec![
                "InChI=1S/CH4/h1H4",
                "InChI=1S/H2O/h1H2",
                "AuxInfo=1/0/N:1/rA:1C/rB:/rC:;"
            ]
        );
        assert_eq!(terminate("InChI=1S/CH4\r"), "InChI=1S/CH4");
    }

    #[test]
    fn first_record_stops_at_terminators() {
        assert_eq!(first_record("InChI=1S/CH4/h1H4"), "InChI=1S/CH4/h1H4");
        assert_eq!(
            first_record("InChI=1S/CH4/h1H4\tAuxInfo=1/0/N:1"),
            "InChI=1S/CH4/h1H4"
        );
        assert_eq!(
            first_record("InChI=1S/CH4/h1H4\nInChI=1S/H2O/h1H2"),
            "InChI=1S/CH4/h1H4"
        );
        assert_eq!(
            first_record("InChI=1S/CH4/h1H4InChI=1S/H2O/h1H2"),
            "InChI=1S/CH4/h1H4"
        );
        assert_eq!(first_record("InChI=1S/CH4\r\n"), "InChI=1S/CH4");
    }
}
