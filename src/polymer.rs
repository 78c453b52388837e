//! Polymer units from the `/z` layer.

use crate::record::Variant;

/// Polymer unit style (first digit of the unit code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolymerStyle {
    /// Structure-based repeating unit.
    Sru,
    Monomer,
    Copolymer,
    Modification,
    CrossLink,
    Mer,
}

/// Copolymer subtype (second digit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolymerSubtype {
    None,
    Alternating,
    Random,
    Block,
}

/// Repeat-unit connectivity (third digit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolymerConnectivity {
    None,
    HeadToTail,
    HeadToHead,
    Either,
}

impl PolymerStyle {
    pub fn from_digit(d: u8) -> Option<Self> {
        Some(match d {
            b'1' => Self::Sru,
            b'2' => Self::Monomer,
            b'3' => Self::Copolymer,
            b'4' => Self::Modification,
            b'5' => Self::CrossLink,
            b'6' => Self::Mer,
            _ => return None,
        })
    }

    pub fn digit(self) -> char {
        match self {
            Self::Sru => '1',
            Self::Monomer => '2',
            Self::Copolymer => '3',
            Self::Modification => '4',
            Self::CrossLink => '5',
            Self::Mer => '6',
        }
    }

    /// Conventional bracket label for units of this style.
    pub fn label(self) -> &'static str {
        match self {
            Self::Sru => "n",
            Self::Monomer => "mon",
            Self::Copolymer => "co",
            Self::Modification => "mod",
            Self::CrossLink => "xl",
            Self::Mer => "mer",
        }
    }
}

impl PolymerSubtype {
    pub fn from_digit(d: u8) -> Option<Self> {
        Some(match d {
            b'0' => Self::None,
            b'1' => Self::Alternating,
            b'2' => Self::Random,
            b'3' => Self::Block,
            _ => return None,
        })
    }

    pub fn digit(self) -> char {
        match self {
            Self::None => '0',
            Self::Alternating => '1',
            Self::Random => '2',
            Self::Block => '3',
        }
    }
}

impl PolymerConnectivity {
    pub fn from_digit(d: u8) -> Option<Self> {
        Some(match d {
            b'0' => Self::None,
            b'1' => Self::HeadToTail,
            b'2' => Self::HeadToHead,
            b'3' => Self::Either,
            _ => return None,
        })
    }

    pub fn digit(self) -> char {
        match self {
            Self::None => '0',
            Self::HeadToTail => '1',
            Self::HeadToHead => '2',
            Self::Either => '3',
        }
    }
}

/// Bonds that cross a unit's brackets when it closes on itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crossing {
    /// `a-b,c-d`: the two bonds joining the unit to its end groups.
    EndGroupPair { first: (u32, u32), second: (u32, u32) },
    /// `a`: both star atoms sit on the same unit atom.
    StarRingClosure { atom: u32 },
    /// `a=b` or `a#b`: star atoms joined by a bond of order 2 or 3.
    StarHigherOrder { atoms: (u32, u32), order: u8 },
    /// `a:b`: each star atom replaced by a radical centre.
    StarDiradical { atoms: (u32, u32) },
}

impl Crossing {
    /// Frame-shiftable bond atom pairs described by this clause.
    pub fn bonds(&self) -> Vec<(u32, u32)> {
        match *self {
            Crossing::EndGroupPair { first, second } => vec![first, second],
            Crossing::StarRingClosure { atom } => vec![(atom, atom)],
            Crossing::StarHigherOrder { atoms, .. } | Crossing::StarDiradical { atoms } => {
                vec![atoms]
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolymerUnit {
    /// 1-based position of the unit in the layer.
    pub id: u32,
    pub label: String,
    pub style: PolymerStyle,
    pub subtype: PolymerSubtype,
    pub connectivity: PolymerConnectivity,
    /// Member atoms, numbered across all components of the view.
    pub atoms: Vec<u32>,
    pub crossing: Option<Crossing>,
}

/// The polymer layer of one variant view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolymerDescriptor {
    pub variant: Variant,
    pub units: Vec<PolymerUnit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_digits_round_trip() {
        for d in b'1'..=b'6' {
            let s = PolymerStyle::from_digit(d).unwrap();
            assert_eq!(s.digit() as u8, d);
        }
        for d in b'0'..=b'3' {
            assert_eq!(PolymerSubtype::from_digit(d).unwrap().digit() as u8, d);
            assert_eq!(PolymerConnectivity::from_digit(d).unwrap().digit() as u8, d);
        }
        assert!(PolymerStyle::from_digit(b'0').is_none());
        assert!(PolymerSubtype::from_digit(b'4').is_none());
    }

    #[test]
    fn crossing_bonds() {
        let c = Crossing::EndGroupPair {
            first: (1, 3),
            second: (2, 4),
        };
        assert_eq!(c.bonds(), vec![(1, 3), (2, 4)]);
        assert_eq!(Crossing::StarRingClosure { atom: 5 }.bonds(), vec![(5, 5)]);
    }
}
