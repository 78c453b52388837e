//! Layer sequencing.
//!
//! Layers appear in a fixed order; several share a prefix letter (`h` is
//! mobile-H, isotopic exchange or fixed-H depending on where it shows up).
//! [`next_state`] resolves a prefix letter against the current position by
//! scanning forward through [`ORDER`], honouring the block a state belongs
//! to and the layers that open each block.

use std::fmt;

use crate::inchi::error::Fault;
use crate::record::{IsotopeDomain, TautomerDomain, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayerState {
    #[default]
    Start,
    Formula,
    Connections,
    MobileH,
    Charge,
    Protons,
    Sp2,
    Sp3,
    Inversion,
    StereoType,
    Isotopic,
    IsoExchangeH,
    IsoSp2,
    IsoSp3,
    IsoInversion,
    IsoStereoType,
    Polymer,
    FixedFormula,
    FixedH,
    FixedCharge,
    FixedSp2,
    FixedSp3,
    FixedInversion,
    FixedStereoType,
    FixedIsotopic,
    FixedIsoSp2,
    FixedIsoSp3,
    FixedIsoInversion,
    FixedIsoStereoType,
    Transposition,
    Reconnected,
    Reconstruction,
    Balance,
    AuxVersion,
    AuxNormalization,
    AuxNumbering,
    AuxEquivalence,
    AuxGroupEquivalence,
    AuxInvertedTetrahedral,
    AuxIsotopicNumbering,
    AuxFixedNumbering,
    AuxReverse,
    AuxCoordinates,
    End,
}

/// Groups of layers that are entered together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Main,
    MainIso,
    Polymer,
    Fixed,
    FixedIso,
    Transposition,
    Reconnected,
    Outside,
}

use LayerState::*;

/// Identifier layers of one variant in the order they must appear.
pub(crate) const ORDER: [LayerState; 30] = [
    Formula,
    Connections,
    MobileH,
    Charge,
    Protons,
    Sp2,
    Sp3,
    Inversion,
    StereoType,
    Isotopic,
    IsoExchangeH,
    IsoSp2,
    IsoSp3,
    IsoInversion,
    IsoStereoType,
    Polymer,
    FixedFormula,
    FixedH,
    FixedCharge,
    FixedSp2,
    FixedSp3,
    FixedInversion,
    FixedStereoType,
    FixedIsotopic,
    FixedIsoSp2,
    FixedIsoSp3,
    FixedIsoInversion,
    FixedIsoStereoType,
    Transposition,
    Reconnected,
];

impl LayerState {
    pub fn name(self) -> &'static str {
        match self {
            Start => "start",
            Formula => "formula",
            Connections => "connections",
            MobileH => "mobile-H",
            Charge => "charge",
            Protons => "protons",
            Sp2 => "sp2 stereo",
            Sp3 => "sp3 stereo",
            Inversion => "sp3 inversion",
            StereoType => "stereo type",
            Isotopic => "isotopic",
            IsoExchangeH => "isotopic exchangeable H",
            IsoSp2 => "isotopic sp2 stereo",
            IsoSp3 => "isotopic sp3 stereo",
            IsoInversion => "isotopic sp3 inversion",
            IsoStereoType => "isotopic stereo type",
            Polymer => "polymer",
            FixedFormula => "fixed-H formula",
            FixedH => "fixed-H",
            FixedCharge => "fixed-H charge",
            FixedSp2 => "fixed-H sp2 stereo",
            FixedSp3 => "fixed-H sp3 stereo",
            FixedInversion => "fixed-H sp3 inversion",
            FixedStereoType => "fixed-H stereo type",
            FixedIsotopic => "fixed-H isotopic",
            FixedIsoSp2 => "fixed-H isotopic sp2 stereo",
            FixedIsoSp3 => "fixed-H isotopic sp3 stereo",
            FixedIsoInversion => "fixed-H isotopic sp3 inversion",
            FixedIsoStereoType => "fixed-H isotopic stereo type",
            Transposition => "transposition",
            Reconnected => "reconnected",
            Reconstruction => "reconstruction",
            Balance => "balance",
            AuxVersion => "AuxInfo version",
            AuxNormalization => "AuxInfo normalization",
            AuxNumbering => "AuxInfo numbering",
            AuxEquivalence => "AuxInfo equivalence",
            AuxGroupEquivalence => "AuxInfo group equivalence",
            AuxInvertedTetrahedral => "AuxInfo inverted tetrahedral",
            AuxIsotopicNumbering => "AuxInfo isotopic numbering",
            AuxFixedNumbering => "AuxInfo fixed-H numbering",
            AuxReverse => "AuxInfo reversibility",
            AuxCoordinates => "AuxInfo coordinates",
            End => "end",
        }
    }

    /// Prefix letter of the segment that carries this layer.
    pub fn letter(self) -> Option<u8> {
        Some(match self {
            Connections => b'c',
            MobileH | IsoExchangeH | FixedH => b'h',
            Charge | FixedCharge => b'q',
            Protons => b'p',
            Sp2 | IsoSp2 | FixedSp2 | FixedIsoSp2 => b'b',
            Sp3 | IsoSp3 | FixedSp3 | FixedIsoSp3 => b't',
            Inversion | IsoInversion | FixedInversion | FixedIsoInversion => b'm',
            StereoType | IsoStereoType | FixedStereoType | FixedIsoStereoType => b's',
            Isotopic | FixedIsotopic => b'i',
            Polymer => b'z',
            FixedFormula => b'f',
            Transposition => b'o',
            Reconnected => b'r',
            _ => return None,
        })
    }

    fn block(self) -> Block {
        match self {
            Start | Formula | Connections | MobileH | Charge | Protons | Sp2 | Sp3 | Inversion
            | StereoType => Block::Main,
            Isotopic | IsoExchangeH | IsoSp2 | IsoSp3 | IsoInversion | IsoStereoType => {
                Block::MainIso
            }
            Polymer => Block::Polymer,
            FixedFormula | FixedH | FixedCharge | FixedSp2 | FixedSp3 | FixedInversion
            | FixedStereoType => Block::Fixed,
            FixedIsotopic | FixedIsoSp2 | FixedIsoSp3 | FixedIsoInversion
            | FixedIsoStereoType => Block::FixedIso,
            Transposition => Block::Transposition,
            Reconnected => Block::Reconnected,
            _ => Block::Outside,
        }
    }

    /// Blocks from which this block-opening layer may be entered; empty for
    /// layers that continue their own block.
    fn entered_from(self) -> &'static [Block] {
        match self {
            Isotopic => &[Block::Main],
            Polymer => &[Block::Main, Block::MainIso],
            FixedFormula => &[Block::Main, Block::MainIso, Block::Polymer],
            FixedIsotopic => &[Block::Fixed],
            Transposition => &[Block::Fixed, Block::FixedIso],
            Reconnected => &[
                Block::Main,
                Block::MainIso,
                Block::Polymer,
                Block::Fixed,
                Block::FixedIso,
                Block::Transposition,
            ],
            _ => &[],
        }
    }

    /// Layers that must immediately precede this one.
    fn requires(self) -> &'static [LayerState] {
        match self {
            IsoExchangeH => &[Isotopic],
            Inversion => &[Sp3],
            StereoType => &[Sp3, Inversion],
            IsoInversion => &[IsoSp3],
            IsoStereoType => &[IsoSp3, IsoInversion],
            FixedInversion => &[FixedSp3],
            FixedStereoType => &[FixedSp3, FixedInversion],
            FixedIsoInversion => &[FixedIsoSp3],
            FixedIsoStereoType => &[FixedIsoSp3, FixedIsoInversion],
            _ => &[],
        }
    }

    fn position(self) -> Option<usize> {
        ORDER.iter().position(|s| *s == self)
    }

    /// Layers whose body may be empty (but never at the end of input).
    pub fn allows_empty(self) -> bool {
        matches!(self, FixedFormula | Isotopic | FixedIsotopic)
    }

    /// Tautomer domain a layer writes to.
    pub fn domain(self) -> TautomerDomain {
        match self.block() {
            Block::Fixed | Block::FixedIso | Block::Transposition => TautomerDomain::Fixed,
            _ => TautomerDomain::Mobile,
        }
    }

    /// Isotope domain a layer writes to.
    pub fn isotope(self) -> IsotopeDomain {
        match self.block() {
            Block::MainIso | Block::FixedIso => IsotopeDomain::Isotopic,
            _ => IsotopeDomain::NonIsotopic,
        }
    }
}

impl fmt::Display for LayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve the layer a segment with prefix `letter` belongs to.
pub fn next_state(current: LayerState, letter: u8) -> Result<LayerState, Fault> {
    let from = match current {
        Start => 0,
        s => s.position().map(|p| p + 1).ok_or(Fault::Internal("state outside layer order"))?,
    };
    let block = current.block();
    let found = ORDER[from..].iter().copied().find(|s| {
        s.letter() == Some(letter) && (s.block() == block || s.entered_from().contains(&block))
    });
    match found {
        Some(next) => {
            let required = next.requires();
            if required.is_empty() || required.contains(&current) {
                Ok(next)
            } else {
                Err(Fault::UnexpectedLayer(letter as char))
            }
        }
        None => Err(Fault::UnexpectedLayer(letter as char)),
    }
}

/// Which encoding atom numbers use in the identifier being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    #[default]
    Undetermined,
    Decimal,
    Alphabetic,
}

/// Terminal condition of the last read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// A read is under way, or nothing has been read yet.
    #[default]
    MoreInput,
    EndOfRecord,
    EndOfStream,
    Error,
}

/// Per-read scratch state; cleared, not reallocated, between identifiers.
#[derive(Debug, Clone, Default)]
pub struct ParserState {
    pub layer: LayerState,
    /// 0-based component entry last read; after a failure, the entry
    /// that failed.
    pub component: usize,
    pub encoding: Encoding,
    pub status: Status,
    pub variant: Variant,
}

impl ParserState {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn reconnected(&self) -> bool {
        self.variant == Variant::Reconnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_layers_in_order() {
        let mut s = Start;
        for (letter, want) in [
            (b'c', Connections),
            (b'h', MobileH),
            (b'q', Charge),
            (b't', Sp3),
            (b'm', Inversion),
            (b's', StereoType),
        ] {
            s = next_state(s, letter).unwrap();
            assert_eq!(s, want);
        }
    }

    #[test]
    fn shared_letters_resolve_by_block() {
        assert_eq!(next_state(Isotopic, b'h').unwrap(), IsoExchangeH);
        assert_eq!(next_state(Isotopic, b'b').unwrap(), IsoSp2);
        assert_eq!(next_state(FixedFormula, b'h').unwrap(), FixedH);
        assert_eq!(next_state(FixedCharge, b'i').unwrap(), FixedIsotopic);
        assert_eq!(next_state(FixedIsotopic, b't').unwrap(), FixedIsoSp3);
    }

    #[test]
    fn out_of_order_rejected() {
        assert_eq!(
            next_state(Charge, b'h'),
            Err(Fault::UnexpectedLayer('h'))
        );
        assert!(next_state(Sp3, b'b').is_err());
        assert!(next_state(IsoSp3, b'b').is_err());
        // fixed-H isotopic can only be opened from the fixed-H block
        assert_eq!(next_state(IsoSp3, b'i'), Err(Fault::UnexpectedLayer('i')));
    }

    #[test]
    fn prerequisites() {
        assert!(next_state(Charge, b'm').is_err());
        assert!(next_state(Charge, b's').is_err());
        assert_eq!(next_state(Sp3, b's').unwrap(), StereoType);
        assert!(next_state(IsoSp2, b'h').is_err());
    }

    #[test]
    fn reconnected_from_anywhere() {
        for s in [Formula, IsoStereoType, Polymer, FixedH, Transposition] {
            assert_eq!(next_state(s, b'r').unwrap(), Reconnected);
        }
        assert_eq!(next_state(FixedIsoSp3, b'o').unwrap(), Transposition);
        assert!(next_state(Charge, b'o').is_err());
    }

    #[test]
    fn domains() {
        assert_eq!(FixedIsoSp3.domain(), TautomerDomain::Fixed);
        assert_eq!(FixedIsoSp3.isotope(), IsotopeDomain::Isotopic);
        assert_eq!(Sp3.isotope(), IsotopeDomain::NonIsotopic);
        assert_eq!(IsoExchangeH.domain(), TautomerDomain::Mobile);
    }
}
