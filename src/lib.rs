pub mod atom;
pub mod element;
pub mod formula;
pub mod inchi;
pub mod mol;
pub mod options;
pub mod polymer;
pub mod record;

pub use atom::Atom;
pub use element::Element;
pub use formula::Formula;
pub use inchi::{
    parse_inchi, to_inchi, AuxInfo, Encoding, ErrorKind, Fault, Flavour, Inchi, InchiParser,
    InchiReader, LayerState, ParserState, ReadError, Status,
};
pub use mol::Mol;
pub use options::ReadOptions;
pub use polymer::{PolymerDescriptor, PolymerUnit};
pub use record::{
    Charge, ComponentRecord, ConnectionTable, IsotopeDomain, RecordSet, StereoDescriptorSet,
    TautomerDomain, Variant, View,
};
