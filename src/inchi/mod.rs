//! InChI reading.
//!
//! [`InchiParser`] turns one identifier (and optionally its AuxInfo
//! record) into an [`Inchi`]; [`InchiReader`] does the same for every
//! identifier in a line-oriented stream. [`to_inchi`] writes a parsed
//! structure back out.

pub mod auxinfo;
mod balance;
mod cursor;
pub mod error;
mod layers;
mod parser;
mod reconstruct;
mod source;
pub mod state;
mod writer;

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, Lines};

use log::{trace, warn};

use crate::polymer::PolymerDescriptor;
use crate::record::RecordSet;
pub use auxinfo::AuxInfo;
pub use error::{ErrorKind, Fault, ReadError};
pub use parser::InchiParser;
pub use state::{Encoding, LayerState, ParserState, Status};
pub use writer::to_inchi;

use source::{records_in_line, AUX_PREFIX};

/// Which identifier family the prefix announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavour {
    /// `InChI=1S/`
    Standard,
    /// `InChI=1/`
    NonStandard,
    /// `InChI=1B/`
    Beta,
}

/// A parsed identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Inchi {
    pub version: u8,
    pub flavour: Flavour,
    pub records: RecordSet,
    pub polymer: Option<PolymerDescriptor>,
    pub aux: Option<AuxInfo>,
}

impl Inchi {
    pub fn new(version: u8, flavour: Flavour) -> Self {
        Self {
            version,
            flavour,
            records: RecordSet::new(),
            polymer: None,
            aux: None,
        }
    }
}

impl fmt::Display for Inchi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_inchi(self, Encoding::Decimal))
    }
}

/// Parse one identifier with default options.
pub fn parse_inchi(text: &str) -> Result<Inchi, ReadError> {
    InchiParser::default().parse(text)
}

/// Reads every identifier in a stream, pairing each with the AuxInfo
/// record that directly follows it.
///
/// A line may hold several records and leading text; a failed record does
/// not end iteration.
pub struct InchiReader<R> {
    lines: Lines<R>,
    pending: VecDeque<String>,
    deferred: Option<io::Error>,
    parser: InchiParser,
}

impl<R: BufRead> InchiReader<R> {
    pub fn new(input: R) -> Self {
        Self::with_parser(input, InchiParser::default())
    }

    pub fn with_parser(input: R, parser: InchiParser) -> Self {
        Self {
            lines: input.lines(),
            pending: VecDeque::new(),
            deferred: None,
            parser,
        }
    }

    /// State of the last record read.
    pub fn state(&self) -> &ParserState {
        self.parser.state()
    }

    /// Make sure a record is queued; `Ok(false)` at end of input.
    fn fill(&mut self) -> io::Result<bool> {
        while self.pending.is_empty() {
            match self.lines.next() {
                None => return Ok(false),
                Some(line) => {
                    let line = line?;
                    self.pending
                        .extend(records_in_line(&line).into_iter().map(String::from));
                }
            }
        }
        Ok(true)
    }

    /// Take the next record if it is an AuxInfo record.
    fn take_aux(&mut self) -> Option<String> {
        match self.fill() {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                self.deferred = Some(e);
                return None;
            }
        }
        if self.pending.front()?.starts_with(AUX_PREFIX) {
            self.pending.pop_front()
        } else {
            None
        }
    }
}

impl<R: BufRead> Iterator for InchiReader<R> {
    type Item = Result<Inchi, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.deferred.take() {
                return Some(Err(io_error(e)));
            }
            match self.fill() {
                Ok(true) => {}
                Ok(false) => {
                    self.parser.end_of_stream();
                    return None;
                }
                Err(e) => return Some(Err(io_error(e))),
            }
            let record = self.pending.pop_front()?;
            if record.starts_with(AUX_PREFIX) {
                warn!("AuxInfo record without an identifier");
                continue;
            }
            let aux = self.take_aux();
            trace!("reading {record}");
            return Some(self.parser.parse_with_aux(&record, aux.as_deref()));
        }
    }
}

fn io_error(e: io::Error) -> ReadError {
    ReadError::new(LayerState::Start, false, Fault::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_stream() {
        let text = "\
methane\tInChI=1S/CH4/h1H4\tAuxInfo=1/0/N:1/rA:1C/rB:/rC:;
InChI=1S/H2O/h1H2
InChI=1S/XX/h1H
InChI=1S/C2H6/c1-2/h1-2H3
AuxInfo=1/0/N:1,2
";
        let results: Vec<_> = InchiReader::new(Cursor::new(text)).collect();
        assert_eq!(results.len(), 4);
        let methane = results[0].as_ref().unwrap();
        assert_eq!(methane.aux.as_ref().unwrap().numbering, vec![vec![1]]);
        assert!(results[1].as_ref().unwrap().aux.is_none());
        assert!(results[2].is_err());
        let ethane = results[3].as_ref().unwrap();
        assert_eq!(ethane.aux.as_ref().unwrap().numbering, vec![vec![1, 2]]);
    }

    #[test]
    fn exhausted_reader_reports_end_of_stream() {
        let mut reader = InchiReader::new(Cursor::new("InChI=1S/CH4/h1H4\n"));
        assert!(reader.next().unwrap().is_ok());
        assert_eq!(reader.state().status, Status::EndOfRecord);
        assert!(reader.next().is_none());
        assert_eq!(reader.state().status, Status::EndOfStream);
    }

    #[test]
    fn orphan_auxinfo_is_skipped() {
        let text = "AuxInfo=1/0/N:1\nInChI=1S/CH4/h1H4\n";
        let results: Vec<_> = InchiReader::new(Cursor::new(text)).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[test]
    fn displays_as_identifier() {
        let inchi = parse_inchi("InChI=1S/CH4/h1H4").unwrap();
        assert_eq!(inchi.to_string(), "InChI=1S/CH4/h1H4");
        assert_eq!(inchi.flavour, Flavour::Standard);
    }
}
