//! In-memory record set produced by the InChI reader.
//!
//! One [`ComponentRecord`] describes one connected component in one view
//! of the molecule. Views are addressed by [`Variant`] and
//! [`TautomerDomain`]; the [`IsotopeDomain`] selects which half of a
//! record's stereo and isotopic data is being looked at.
//!
//! Every field that a layer populates is write-once: the reader refuses a
//! second write to an already populated field, and the reconstruction
//! pass only fills fields that are still empty.

use std::fmt;

use crate::atom::Atom;
use crate::element::Element;
use crate::mol::Mol;

/// Disconnected vs. reconnected-metal view of the structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    #[default]
    Disconnected,
    Reconnected,
}

/// Mobile-H vs. fixed-H tautomer assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TautomerDomain {
    Mobile,
    Fixed,
}

/// Non-isotopic vs. isotopic composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsotopeDomain {
    NonIsotopic,
    Isotopic,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Disconnected, Variant::Reconnected];

    fn index(self) -> usize {
        self as usize
    }
}

impl TautomerDomain {
    pub const ALL: [TautomerDomain; 2] = [TautomerDomain::Mobile, TautomerDomain::Fixed];

    fn index(self) -> usize {
        self as usize
    }
}

impl IsotopeDomain {
    pub const ALL: [IsotopeDomain; 2] = [IsotopeDomain::NonIsotopic, IsotopeDomain::Isotopic];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Reconnected => write!(f, "reconnected"),
        }
    }
}

impl fmt::Display for TautomerDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mobile => write!(f, "mobile-H"),
            Self::Fixed => write!(f, "fixed-H"),
        }
    }
}

/// Total charge of a component; `Unset` is distinct from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Charge {
    #[default]
    Unset,
    Value(i32),
}

impl Charge {
    pub fn is_set(self) -> bool {
        matches!(self, Charge::Value(_))
    }

    /// The charge, reading `Unset` as neutral.
    pub fn value(self) -> i32 {
        match self {
            Charge::Unset => 0,
            Charge::Value(v) => v,
        }
    }
}

/// Parity of a stereo element as written in the `/b` and `/t` layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    /// `-`
    Odd,
    /// `+`
    Even,
    /// `u`
    Unknown,
    /// `?`
    Undefined,
}

impl Parity {
    pub fn from_char(c: u8) -> Option<Parity> {
        match c {
            b'-' => Some(Parity::Odd),
            b'+' => Some(Parity::Even),
            b'u' => Some(Parity::Unknown),
            b'?' => Some(Parity::Undefined),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Parity::Odd => '-',
            Parity::Even => '+',
            Parity::Unknown => 'u',
            Parity::Undefined => '?',
        }
    }

    /// Parity after mirror inversion; only well-defined parities change.
    pub fn inverted(self) -> Parity {
        match self {
            Parity::Odd => Parity::Even,
            Parity::Even => Parity::Odd,
            other => other,
        }
    }
}

/// A stereogenic double bond (or cumulene) between two atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StereoBond {
    /// Higher-numbered end.
    pub first: u32,
    /// Lower-numbered end.
    pub second: u32,
    pub parity: Parity,
}

/// A tetrahedral stereocenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StereoCenter {
    pub atom: u32,
    pub parity: Parity,
}

/// Whether recorded sp3 parities are absolute or need inverting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Inversion {
    #[default]
    Unset,
    /// `/m0`: parities correspond to the absolute configuration.
    Absolute,
    /// `/m1`: parities must be inverted to obtain the absolute configuration.
    Inverted,
}

/// Stereo convention recorded in an `/s` layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StereoType {
    Absolute,
    Relative,
    Racemic,
}

impl StereoType {
    pub fn from_code(c: u8) -> Option<StereoType> {
        match c {
            b'1' => Some(StereoType::Absolute),
            b'2' => Some(StereoType::Relative),
            b'3' => Some(StereoType::Racemic),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            StereoType::Absolute => '1',
            StereoType::Relative => '2',
            StereoType::Racemic => '3',
        }
    }

    /// Relative and racemic parities do not pin down one enantiomer.
    pub fn is_ambiguous(self) -> bool {
        !matches!(self, StereoType::Absolute)
    }
}

/// One stereo layer's worth of descriptors for one component.
///
/// `D` is [`StereoBond`] for sp2 sets and [`StereoCenter`] for sp3 sets.
/// The inversion flag and stereo type are only meaningful for sp3 sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StereoDescriptorSet<D> {
    /// Sorted by ascending canonical atom number(s).
    pub descriptors: Vec<D>,
    pub inversion: Inversion,
    pub stereo_type: Option<StereoType>,
    /// The inversion flag was carried over from a related layer rather than
    /// recorded in this one.
    pub trivial_inversion: bool,
    /// Filled by reconstruction rather than read from the identifier.
    pub inherited: bool,
}

impl<D> StereoDescriptorSet<D> {
    pub fn new(descriptors: Vec<D>) -> Self {
        Self {
            descriptors,
            inversion: Inversion::Unset,
            stereo_type: None,
            trivial_inversion: false,
            inherited: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

pub type Sp2Set = StereoDescriptorSet<StereoBond>;
pub type Sp3Set = StereoDescriptorSet<StereoCenter>;

/// Counts of the three hydrogen isotopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IsotopicHydrogens {
    pub protium: u32,
    pub deuterium: u32,
    pub tritium: u32,
}

impl IsotopicHydrogens {
    pub fn total(&self) -> u32 {
        self.protium + self.deuterium + self.tritium
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Counts in greedy-distribution order: protium, deuterium, tritium.
    pub fn as_array(&self) -> [u32; 3] {
        [self.protium, self.deuterium, self.tritium]
    }

    pub fn from_array(a: [u32; 3]) -> Self {
        Self {
            protium: a[0],
            deuterium: a[1],
            tritium: a[2],
        }
    }
}

/// An isotopically labelled atom from an `/i` layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IsotopicAtom {
    pub atom: u32,
    /// Mass difference from the element's nominal mass, if labelled.
    pub mass_shift: Option<i16>,
    pub hydrogens: IsotopicHydrogens,
}

/// Hydrogens and negative charges shared by a set of atoms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TautomericGroup {
    pub hydrogens: u32,
    pub negative_charges: u32,
    /// Member atoms in ascending order.
    pub atoms: Vec<u32>,
}

/// Compact adjacency table: for each atom, its lower-numbered neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionTable {
    lower: Vec<Vec<u32>>,
}

impl ConnectionTable {
    /// The table of a single atom without bonds.
    pub fn trivial() -> Self {
        Self {
            lower: vec![Vec::new()],
        }
    }

    pub(crate) fn from_lower(lower: Vec<Vec<u32>>) -> Self {
        Self { lower }
    }

    pub fn atom_count(&self) -> usize {
        self.lower.len()
    }

    /// Neighbours of `atom` (1-based) that have a smaller number.
    pub fn lower_neighbors(&self, atom: u32) -> &[u32] {
        self.lower
            .get(atom as usize - 1)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All bonds as `(higher, lower)` pairs in ascending order.
    pub fn bonds(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.lower
            .iter()
            .enumerate()
            .flat_map(|(i, ns)| ns.iter().map(move |&n| (i as u32 + 1, n)))
    }

    pub fn bond_count(&self) -> usize {
        self.lower.iter().map(Vec::len).sum()
    }

    pub fn contains(&self, a: u32, b: u32) -> bool {
        let (hi, lo) = if a > b { (a, b) } else { (b, a) };
        self.lower_neighbors(hi).binary_search(&lo).is_ok()
    }

    /// All neighbours of `atom`, ascending.
    pub fn neighbors(&self, atom: u32) -> Vec<u32> {
        let mut out: Vec<u32> = self.lower_neighbors(atom).to_vec();
        for (i, ns) in self.lower.iter().enumerate().skip(atom as usize) {
            if ns.binary_search(&atom).is_ok() {
                out.push(i as u32 + 1);
            }
        }
        out
    }
}

/// One connected component in one view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComponentRecord {
    /// Element at each canonical position (index 0 is atom 1).
    pub atoms: Vec<Element>,
    /// Hill formula of this component.
    pub formula: String,
    /// Hydrogen count from the formula.
    pub formula_hydrogens: u32,
    pub connections: Option<ConnectionTable>,
    /// Per-atom hydrogens outside tautomeric groups.
    pub hydrogens: Option<Vec<u8>>,
    /// Fixed-H only: hydrogens the fixed-H layer pins to each atom.
    pub fixed_hydrogens: Option<Vec<u8>>,
    pub tautomeric_groups: Option<Vec<TautomericGroup>>,
    pub charge: Charge,
    /// Placeholder for a component that exists in the counterpart view only.
    pub deleted: bool,
    /// Indexed by [`IsotopeDomain`].
    pub sp2: [Option<Sp2Set>; 2],
    /// Indexed by [`IsotopeDomain`].
    pub sp3: [Option<Sp3Set>; 2],
    pub isotopic_atoms: Option<Vec<IsotopicAtom>>,
}

impl ComponentRecord {
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn sp2(&self, iso: IsotopeDomain) -> Option<&Sp2Set> {
        self.sp2[iso.index()].as_ref()
    }

    pub fn sp3(&self, iso: IsotopeDomain) -> Option<&Sp3Set> {
        self.sp3[iso.index()].as_ref()
    }

    /// Hydrogens on `atom` (1-based) outside tautomeric groups.
    pub fn hydrogens_on(&self, atom: u32) -> u8 {
        self.hydrogens
            .as_ref()
            .and_then(|h| h.get(atom as usize - 1))
            .copied()
            .unwrap_or(0)
    }

    pub fn fixed_hydrogens_on(&self, atom: u32) -> u8 {
        self.fixed_hydrogens
            .as_ref()
            .and_then(|h| h.get(atom as usize - 1))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of per-atom hydrogens outside tautomeric groups.
    pub fn attached_hydrogens(&self) -> u32 {
        self.hydrogens
            .as_ref()
            .map_or(0, |h| h.iter().map(|&n| n as u32).sum())
    }

    pub fn group_hydrogens(&self) -> u32 {
        self.tautomeric_groups
            .as_ref()
            .map_or(0, |g| g.iter().map(|t| t.hydrogens).sum())
    }

    /// Hydrogens the formula counts as atoms rather than as attached H.
    ///
    /// A component made of hydrogen only keeps one H as its single atom.
    pub fn hydrogen_atoms(&self) -> u32 {
        self.atoms.iter().filter(|e| e.is_hydrogen()).count() as u32
    }

    /// Count of each non-hydrogen element, in Hill order of first appearance.
    pub fn heavy_atom_counts(&self) -> Vec<(Element, u32)> {
        let mut out: Vec<(Element, u32)> = Vec::new();
        for &e in self.atoms.iter().filter(|e| !e.is_hydrogen()) {
            match out.iter_mut().find(|(x, _)| *x == e) {
                Some((_, n)) => *n += 1,
                None => out.push((e, 1)),
            }
        }
        out
    }

    /// Whether this component is nothing but a proton.
    pub fn is_bare_proton(&self) -> bool {
        self.atoms == [Element::H] && self.formula_hydrogens == 1
    }

    /// Build an atom/bond skeleton graph; bond orders are not encoded.
    pub fn skeleton(&self) -> Mol<Atom, ()> {
        let mut mol = Mol::new();
        let nodes: Vec<_> = self
            .atoms
            .iter()
            .enumerate()
            .map(|(i, &element)| {
                let atom_no = i as u32 + 1;
                mol.add_atom(Atom {
                    element,
                    hydrogen_count: self
                        .hydrogens_on(atom_no)
                        .saturating_add(self.fixed_hydrogens_on(atom_no)),
                    mass_shift: self.isotopic_atoms.as_ref().and_then(|iso| {
                        iso.iter().find(|a| a.atom == atom_no).and_then(|a| a.mass_shift)
                    }),
                })
            })
            .collect();
        if let Some(ct) = &self.connections {
            for (hi, lo) in ct.bonds() {
                mol.add_bond(nodes[hi as usize - 1], nodes[lo as usize - 1], ());
            }
        }
        mol
    }
}

/// Removed protons and exchangeable isotopic hydrogens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProtonCounts {
    /// Protons added (positive) or removed (negative) by the mobile-H
    /// normalisation.
    pub protons: i32,
    pub exchangeable: IsotopicHydrogens,
}

/// Proton bookkeeping for one view: exactly one representation is held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtonBalance {
    Aggregate(ProtonCounts),
    PerComponent(Vec<ProtonCounts>),
}

impl ProtonBalance {
    pub fn total(&self) -> ProtonCounts {
        match self {
            ProtonBalance::Aggregate(c) => *c,
            ProtonBalance::PerComponent(v) => {
                v.iter().fold(ProtonCounts::default(), |mut acc, c| {
                    acc.protons += c.protons;
                    acc.exchangeable.protium += c.exchangeable.protium;
                    acc.exchangeable.deuterium += c.exchangeable.deuterium;
                    acc.exchangeable.tritium += c.exchangeable.tritium;
                    acc
                })
            }
        }
    }
}

/// Outcome of splitting an aggregate proton count across components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Unambiguous,
    /// Several distributions were possible; the greedy one was taken.
    Ambiguous,
}

/// Per-component proton counts derived by the balance validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtonDistribution {
    pub per_component: Vec<ProtonCounts>,
    pub resolution: Resolution,
}

/// Fixed-H component order as cycles over component numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transposition {
    pub cycles: Vec<Vec<u32>>,
}

impl Transposition {
    /// Mobile-H component index (0-based) for each fixed-H component.
    pub fn fixed_to_mobile(&self, count: usize) -> Vec<usize> {
        let mut map: Vec<usize> = (0..count).collect();
        for cycle in &self.cycles {
            for (i, &c) in cycle.iter().enumerate() {
                let next = cycle[(i + 1) % cycle.len()];
                if let Some(slot) = map.get_mut(c as usize - 1) {
                    *slot = next as usize - 1;
                }
            }
        }
        map
    }
}

/// All components of one (variant, tautomer-domain) view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct View {
    pub components: Vec<ComponentRecord>,
    pub protons: Option<ProtonBalance>,
    /// An isotopic layer was present for this view.
    pub isotopic: bool,
    /// Fixed-H only.
    pub transposition: Option<Transposition>,
    pub distribution: Option<ProtonDistribution>,
}

impl View {
    pub fn total_charge(&self) -> i32 {
        self.components
            .iter()
            .filter(|c| !c.deleted)
            .map(|c| c.charge.value())
            .sum()
    }

    pub fn atom_total(&self) -> usize {
        self.components.iter().map(ComponentRecord::atom_count).sum()
    }

    /// Mobile-H component index for each component of this (fixed-H) view.
    pub fn counterpart_map(&self) -> Vec<usize> {
        let n = self.components.len();
        match &self.transposition {
            Some(t) => t.fixed_to_mobile(n),
            None => (0..n).collect(),
        }
    }
}

/// Fixed-size struct of views indexed by variant and tautomer domain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordSet {
    views: [[Option<View>; 2]; 2],
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self, variant: Variant, domain: TautomerDomain) -> Option<&View> {
        self.views[variant.index()][domain.index()].as_ref()
    }

    pub fn view_mut(&mut self, variant: Variant, domain: TautomerDomain) -> Option<&mut View> {
        self.views[variant.index()][domain.index()].as_mut()
    }

    pub(crate) fn slot(&mut self, variant: Variant, domain: TautomerDomain) -> &mut Option<View> {
        &mut self.views[variant.index()][domain.index()]
    }

    /// Both tautomer views of a variant, mobile first.
    pub(crate) fn pair_mut(&mut self, variant: Variant) -> (Option<&mut View>, Option<&mut View>) {
        let [mobile, fixed] = &mut self.views[variant.index()];
        (mobile.as_mut(), fixed.as_mut())
    }

    pub fn clear(&mut self) {
        self.views = Default::default();
    }
}
