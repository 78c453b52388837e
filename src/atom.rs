use crate::element::Element;

/// Skeleton atom built from a parsed component record.
///
/// Carries only what the identifier itself states: the element, the
/// hydrogens attached in the record's view and an isotopic mass shift.
/// Bond orders, formal charges and coordinates are not part of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: Element,
    /// Attached hydrogens, fixed hydrogens included for fixed-H records.
    pub hydrogen_count: u8,
    /// Difference from the element's nominal mass, when labelled.
    pub mass_shift: Option<i16>,
}

impl Atom {
    /// Mass number of a labelled atom.
    pub fn mass_number(&self) -> Option<u16> {
        self.mass_shift
            .map(|shift| (self.element.nominal_mass() as i32 + shift as i32).max(0) as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_number_from_shift() {
        let c13 = Atom {
            element: Element::C,
            hydrogen_count: 4,
            mass_shift: Some(1),
        };
        assert_eq!(c13.mass_number(), Some(13));
        let plain = Atom {
            mass_shift: None,
            ..c13
        };
        assert_eq!(plain.mass_number(), None);
    }
}
