use thiserror::Error;

use crate::inchi::state::LayerState;

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Memory for a layer could not be reserved; callers may want to stop
    /// the whole batch.
    AllocationFailure,
    /// The identifier violates the grammar or a consistency rule.
    Syntax,
    /// An internal invariant was broken.
    Program,
    /// The line ended before any layer was read.
    EndOfLine,
    /// The underlying stream ended or failed.
    EndOfStream,
}

/// The precise reason a read failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("unexpected character '{ch}' at offset {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    #[error("unexpected end of layer at offset {pos}")]
    UnexpectedEnd { pos: usize },
    #[error("numeral at offset {pos} exceeds the supported maximum")]
    NumberTooLarge { pos: usize },
    #[error("atom {atom} out of range (component has {count} atoms)")]
    AtomOutOfRange { atom: u32, count: u32 },
    #[error("{0} atoms exceed the configured limit")]
    TooManyAtoms(u32),
    #[error("{0} is not a recognized element")]
    UnknownElement(String),
    #[error("element {0} breaks Hill order")]
    HillOrder(String),
    #[error("numbers not ascending at offset {pos}")]
    NotAscending { pos: usize },
    #[error("bracket opened at offset {pos} is not closed")]
    Unterminated { pos: usize },
    #[error("{0} is already populated")]
    AlreadySet(&'static str),
    #[error("numeral at offset {pos} does not match the identifier's encoding")]
    EncodingMismatch { pos: usize },
    #[error("layer lists {found} components, only {expected} exist")]
    TooManyComponents { expected: usize, found: usize },
    #[error("abbreviation '{abbrev}' is not valid in this layer")]
    BadAbbreviation { abbrev: char },
    #[error("abbreviation '{abbrev}' refers to a layer that holds no data")]
    MissingSource { abbrev: char },
    #[error("component {0} has no stereocenters to qualify")]
    NoStereo(usize),
    #[error("empty layer")]
    EmptyLayer,
    #[error("identifier ends with an empty layer")]
    EmptyFinalLayer,
    #[error("layer '{0}' is not allowed here")]
    UnexpectedLayer(char),
    #[error("bond {0}-{1} given twice")]
    DuplicateBond(u32, u32),
    #[error("atom {0} bonded to itself")]
    SelfBond(u32),
    #[error("atom {0} given twice")]
    DuplicateAtom(u32),
    #[error("component {0} is not connected")]
    Disconnected(usize),
    #[error("component {component} atom {atom} has mass number {mass}, below its atomic number")]
    MassNumber {
        component: usize,
        atom: u32,
        mass: u16,
    },
    #[error("aggregate and per-component proton counts mixed")]
    MixedProtonForms,
    #[error("{views} views disagree: {detail}")]
    Imbalance {
        views: &'static str,
        detail: String,
    },
    #[error("missing or unsupported InChI prefix")]
    BadPrefix,
    #[error("no layers after the prefix")]
    NoLayers,
    #[error("bad AuxInfo coordinates: {0}")]
    Coordinates(String),
    #[error("could not reserve room for {0} items")]
    Allocation(usize),
    #[error("internal error: {0}")]
    Internal(&'static str),
    #[error("read failed: {0}")]
    Io(String),
}

impl Fault {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Fault::Allocation(_) => ErrorKind::AllocationFailure,
            Fault::Internal(_) => ErrorKind::Program,
            Fault::NoLayers => ErrorKind::EndOfLine,
            Fault::Io(_) => ErrorKind::EndOfStream,
            _ => ErrorKind::Syntax,
        }
    }
}

/// A failed read: the fault plus where in the layer sequence it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{fault} in {state} layer{}", reconnected_suffix(.reconnected))]
pub struct ReadError {
    pub state: LayerState,
    pub kind: ErrorKind,
    /// The failure happened inside the reconnected-metal part.
    pub reconnected: bool,
    #[source]
    pub fault: Fault,
}

impl ReadError {
    pub fn new(state: LayerState, reconnected: bool, fault: Fault) -> Self {
        Self {
            state,
            kind: fault.kind(),
            reconnected,
            fault,
        }
    }

    pub fn is_syntax(&self) -> bool {
        self.kind == ErrorKind::Syntax
    }
}

fn reconnected_suffix(reconnected: &bool) -> &'static str {
    if *reconnected {
        " (reconnected)"
    } else {
        ""
    }
}
