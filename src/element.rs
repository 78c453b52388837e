//! Read-only element lookup table.
//!
//! Symbols, standard atomic weights and the valence options InChI layers
//! are checked against. The tables are compiled-in constants; nothing here
//! is ever mutated, so they can be shared freely between parser instances.

use std::cmp::Ordering;

/// Periodic table data for elements 1–118.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Element {
    H = 1,
    He = 2,
    Li = 3,
    Be = 4,
    B = 5,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Ne = 10,
    Na = 11,
    Mg = 12,
    Al = 13,
    Si = 14,
    P = 15,
    S = 16,
    Cl = 17,
    Ar = 18,
    K = 19,
    Ca = 20,
    Sc = 21,
    Ti = 22,
    V = 23,
    Cr = 24,
    Mn = 25,
    Fe = 26,
    Co = 27,
    Ni = 28,
    Cu = 29,
    Zn = 30,
    Ga = 31,
    Ge = 32,
    As = 33,
    Se = 34,
    Br = 35,
    Kr = 36,
    Rb = 37,
    Sr = 38,
    Y = 39,
    Zr = 40,
    Nb = 41,
    Mo = 42,
    Tc = 43,
    Ru = 44,
    Rh = 45,
    Pd = 46,
    Ag = 47,
    Cd = 48,
    In = 49,
    Sn = 50,
    Sb = 51,
    Te = 52,
    I = 53,
    Xe = 54,
    Cs = 55,
    Ba = 56,
    La = 57,
    Ce = 58,
    Pr = 59,
    Nd = 60,
    Pm = 61,
    Sm = 62,
    Eu = 63,
    Gd = 64,
    Tb = 65,
    Dy = 66,
    Ho = 67,
    Er = 68,
    Tm = 69,
    Yb = 70,
    Lu = 71,
    Hf = 72,
    Ta = 73,
    W = 74,
    Re = 75,
    Os = 76,
    Ir = 77,
    Pt = 78,
    Au = 79,
    Hg = 80,
    Tl = 81,
    Pb = 82,
    Bi = 83,
    Po = 84,
    At = 85,
    Rn = 86,
    Fr = 87,
    Ra = 88,
    Ac = 89,
    Th = 90,
    Pa = 91,
    U = 92,
    Np = 93,
    Pu = 94,
    Am = 95,
    Cm = 96,
    Bk = 97,
    Cf = 98,
    Es = 99,
    Fm = 100,
    Md = 101,
    No = 102,
    Lr = 103,
    Rf = 104,
    Db = 105,
    Sg = 106,
    Bh = 107,
    Hs = 108,
    Mt = 109,
    Ds = 110,
    Rg = 111,
    Cn = 112,
    Nh = 113,
    Fl = 114,
    Mc = 115,
    Lv = 116,
    Ts = 117,
    Og = 118,
}

impl Element {
    pub fn from_atomic_num(n: u8) -> Option<Element> {
        if (1..=118).contains(&n) {
            // SAFETY: Element is repr(u8) with variants 1..=118, and we checked bounds.
            Some(unsafe { std::mem::transmute::<u8, Element>(n) })
        } else {
            None
        }
    }

    pub fn from_symbol(s: &str) -> Option<Element> {
        SYMBOLS
            .iter()
            .position(|sym| *sym == s)
            .and_then(|i| Element::from_atomic_num(i as u8 + 1))
    }

    pub fn atomic_num(self) -> u8 {
        self as u8
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[self as usize - 1]
    }

    pub fn atomic_weight(self) -> f64 {
        ATOMIC_WEIGHTS[self as usize - 1]
    }

    /// Integer mass the isotopic layer's mass shifts are relative to.
    ///
    /// This is the standard atomic weight rounded to the nearest integer,
    /// so `13C` is written as a shift of `+1` and `79Br` as `-1`.
    pub fn nominal_mass(self) -> u16 {
        self.atomic_weight().round() as u16
    }

    /// Allowed valences for this element carrying the given formal charge.
    ///
    /// Returns an empty slice when the table has no opinion (metals, noble
    /// gases, unusual charge states).
    pub fn valences(self, charge: i8) -> &'static [u8] {
        use Element::*;
        match (self, charge) {
            (H, 0) => &[1],
            (H, 1) | (H, -1) => &[0],
            (B, 0) => &[3],
            (B, -1) => &[4],
            (C, 0) | (Si, 0) | (Ge, 0) => &[4],
            (C, 1) | (C, -1) => &[3],
            (N, 0) | (P, 0) | (As, 0) => &[3, 5],
            (N, 1) | (P, 1) | (As, 1) => &[4],
            (N, -1) | (P, -1) | (As, -1) => &[2],
            (O, 0) => &[2],
            (O, 1) => &[3],
            (O, -1) => &[1],
            (S, 0) | (Se, 0) | (Te, 0) => &[2, 4, 6],
            (S, 1) | (Se, 1) | (Te, 1) => &[3, 5],
            (S, -1) | (Se, -1) | (Te, -1) => &[1, 3, 5],
            (F, 0) => &[1],
            (Cl, 0) | (Br, 0) | (I, 0) => &[1, 3, 5, 7],
            (F, -1) | (Cl, -1) | (Br, -1) | (I, -1) => &[0],
            (F, 1) | (Cl, 1) | (Br, 1) | (I, 1) => &[2],
            _ => &[],
        }
    }

    /// Whether hydrogen on this element is exchangeable: a heteroatom whose
    /// anion has a lower valence than the neutral atom, so it can lose a
    /// proton (N, P, O, S, the halogens, ...).
    pub fn has_exchangeable_h(self) -> bool {
        if matches!(self, Element::H | Element::C) {
            return false;
        }
        match (self.valences(0).first(), self.valences(-1).first()) {
            (Some(neutral), Some(anion)) => anion < neutral,
            _ => false,
        }
    }

    pub fn is_hydrogen(self) -> bool {
        self == Element::H
    }
}

/// Ordering of element symbols in a Hill formula.
///
/// With carbon present: C, then H, then the rest alphabetically. Without
/// carbon every symbol, hydrogen included, sorts alphabetically.
pub fn hill_cmp(a: Element, b: Element, has_carbon: bool) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    if has_carbon {
        let rank = |e: Element| match e {
            Element::C => 0,
            Element::H => 1,
            _ => 2,
        };
        match rank(a).cmp(&rank(b)) {
            Ordering::Equal => a.symbol().cmp(b.symbol()),
            other => other,
        }
    } else {
        a.symbol().cmp(b.symbol())
    }
}

static SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm",
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

// IUPAC CIAAW 2021 standard atomic weights.
// For radioactive elements without stable isotopes, mass number of longest-lived isotope.
static ATOMIC_WEIGHTS: [f64; 118] = [
    1.008,    // H
    4.002602, // He
    6.941,    // Li
    9.0121831,// Be
    10.81,    // B
    12.011,   // C
    14.007,   // N
    15.999,   // O
    18.998403163, // F
    20.1797,  // Ne
    22.98976928, // Na
    24.305,   // Mg
    26.9815384, // Al
    28.085,   // Si
    30.973761998, // P
    32.06,    // S
    35.45,    // Cl
    39.948,   // Ar
    39.0983,  // K
    40.078,   // Ca
    44.955908, // Sc
    47.867,   // Ti
    50.9415,  // V
    51.9961,  // Cr
    54.938043, // Mn
    55.845,   // Fe
    58.933194, // Co
    58.6934,  // Ni
    63.546,   // Cu
    65.38,    // Zn
    69.723,   // Ga
    72.630,   // Ge
    74.921595, // As
    78.971,   // Se
    79.904,   // Br
    83.798,   // Kr
    85.4678,  // Rb
    87.62,    // Sr
    88.90584, // Y
    91.224,   // Zr
    92.90637, // Nb
    95.95,    // Mo
    97.0,     // Tc (longest-lived isotope: 97)
    101.07,   // Ru
    102.90549, // Rh
    106.42,   // Pd
    107.8682, // Ag
    112.414,  // Cd
    114.818,  // In
    118.710,  // Sn
    121.760,  // Sb
    127.60,   // Te
    126.90447, // I
    131.293,  // Xe
    132.90545196, // Cs
    137.327,  // Ba
    138.90547, // La
    140.116,  // Ce
    140.90766, // Pr
    144.242,  // Nd
    145.0,    // Pm (longest-lived isotope: 145)
    150.36,   // Sm
    151.964,  // Eu
    157.25,   // Gd
    158.925354, // Tb
    162.500,  // Dy
    164.930328, // Ho
    167.259,  // Er
    168.934218, // Tm
    173.045,  // Yb
    174.9668, // Lu
    178.486,  // Hf
    180.94788, // Ta
    183.84,   // W
    186.207,  // Re
    190.23,   // Os
    192.217,  // Ir
    195.084,  // Pt
    196.966570, // Au
    200.592,  // Hg
    204.38,   // Tl
    207.2,    // Pb
    208.98040, // Bi
    209.0,    // Po (longest-lived: 209)
    210.0,    // At (longest-lived: 210)
    222.0,    // Rn (longest-lived: 222)
    223.0,    // Fr (longest-lived: 223)
    226.0,    // Ra (longest-lived: 226)
    227.0,    // Ac (longest-lived: 227)
    232.0377, // Th
    231.03588, // Pa
    238.02891, // U
    237.0,    // Np (longest-lived: 237)
    244.0,    // Pu (longest-lived: 244)
    243.0,    // Am (longest-lived: 243)
    247.0,    // Cm (longest-lived: 247)
    247.0,    // Bk (longest-lived: 247)
    251.0,    // Cf (longest-lived: 251)
    252.0,    // Es (longest-lived: 252)
    257.0,    // Fm (longest-lived: 257)
    258.0,    // Md (longest-lived: 258)
    259.0,    // No (longest-lived: 259)
    266.0,    // Lr (longest-lived: 266)
    267.0,    // Rf (longest-lived: 267)
    268.0,    // Db (longest-lived: 268)
    269.0,    // Sg (longest-lived: 269)
    270.0,    // Bh (longest-lived: 270)
    277.0,    // Hs (longest-lived: 277)
    278.0,    // Mt (longest-lived: 278)
    281.0,    // Ds (longest-lived: 281)
    282.0,    // Rg (longest-lived: 282)
    285.0,    // Cn (longest-lived: 285)
    286.0,    // Nh (longest-lived: 286)
    289.0,    // Fl (longest-lived: 289)
    290.0,    // Mc (longest-lived: 290)
    293.0,    // Lv (longest-lived: 293)
    294.0,    // Ts (longest-lived: 294)
    294.0,    // Og (longest-lived: 294)
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_atomic_num_round_trip() {
        for n in 1u8..=118 {
            let e = Element::from_atomic_num(n).unwrap();
            assert_eq!(e.atomic_num(), n);
        }
    }

    #[test]
    fn from_atomic_num_boundaries() {
        assert!(Element::from_atomic_num(0).is_none());
        assert!(Element::from_atomic_num(119).is_none());
        assert_eq!(Element::from_atomic_num(1), Some(Element::H));
        assert_eq!(Element::from_atomic_num(118), Some(Element::Og));
    }

    #[test]
    fn from_symbol_case_sensitive() {
        assert_eq!(Element::from_symbol("Cl"), Some(Element::Cl));
        assert!(Element::from_symbol("cl").is_none());
        assert!(Element::from_symbol("CL").is_none());
        assert!(Element::from_symbol("").is_none());
        assert!(Element::from_symbol("Zz").is_none());
    }

    #[test]
    fn symbol_round_trip() {
        for n in 1u8..=118 {
            let e = Element::from_atomic_num(n).unwrap();
            assert_eq!(Element::from_symbol(e.symbol()), Some(e));
        }
    }

    #[test]
    fn nominal_masses() {
        assert_eq!(Element::H.nominal_mass(), 1);
        assert_eq!(Element::C.nominal_mass(), 12);
        assert_eq!(Element::Cl.nominal_mass(), 35);
        assert_eq!(Element::Br.nominal_mass(), 80);
        assert_eq!(Element::Tc.nominal_mass(), 97);
    }

    #[test]
    fn valences_by_charge() {
        assert_eq!(Element::N.valences(0), &[3, 5]);
        assert_eq!(Element::N.valences(1), &[4]);
        assert_eq!(Element::O.valences(-1), &[1]);
        assert_eq!(Element::Fe.valences(0), &[] as &[u8]);
    }

    #[test]
    fn hill_order_with_carbon() {
        let mut v = vec![Element::O, Element::H, Element::Br, Element::C];
        v.sort_by(|a, b| hill_cmp(*a, *b, true));
        assert_eq!(v, vec![Element::C, Element::H, Element::Br, Element::O]);
    }

    #[test]
    fn hill_order_without_carbon() {
        let mut v = vec![Element::O, Element::H, Element::Na, Element::Cl];
        v.sort_by(|a, b| hill_cmp(*a, *b, false));
        assert_eq!(v, vec![Element::Cl, Element::H, Element::Na, Element::O]);
    }

    #[test]
    fn exchangeable_hydrogen_carriers() {
        assert!(Element::O.has_exchangeable_h());
        assert!(Element::N.has_exchangeable_h());
        assert!(!Element::C.has_exchangeable_h());
        for halogen in [Element::F, Element::Cl, Element::Br, Element::I] {
            assert!(halogen.has_exchangeable_h(), "{halogen:?}");
        }
        assert!(!Element::B.has_exchangeable_h());
        assert!(!Element::Na.has_exchangeable_h());
    }
}
