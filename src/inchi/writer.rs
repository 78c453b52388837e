//! Identifier text from a parsed structure.
//!
//! The output is not a canonical identifier; it is a layer string that
//! reads back into the same record set. Data the reader reconstructs on
//! its own (inherited stereo, borrowed inversion flags, charges and
//! isotopic atoms copied into the fixed-H view) is left out.

use std::collections::HashSet;
use std::fmt::Write;

use crate::inchi::cursor::alphabetic;
use crate::inchi::state::Encoding;
use crate::inchi::{Flavour, Inchi};
use crate::polymer::{Crossing, PolymerDescriptor, PolymerUnit};
use crate::record::{
    Charge, ComponentRecord, ConnectionTable, Inversion, IsotopeDomain, IsotopicAtom,
    IsotopicHydrogens, ProtonBalance, StereoDescriptorSet, TautomerDomain, TautomericGroup,
    Variant, View,
};

/// Write `inchi` with atom numbers in `encoding`; an undetermined
/// encoding writes decimal.
pub fn to_inchi(inchi: &Inchi, encoding: Encoding) -> String {
    let mut w = Writer {
        alphabetic: encoding == Encoding::Alphabetic,
        segments: Vec::new(),
    };
    for variant in Variant::ALL {
        let Some(mobile) = inchi.records.view(variant, TautomerDomain::Mobile) else {
            continue;
        };
        let formula = formula_layer(mobile);
        match variant {
            Variant::Disconnected if formula.is_empty() => {}
            Variant::Disconnected => w.segments.push(formula),
            Variant::Reconnected => w.segments.push(format!("r{formula}")),
        }
        w.main(mobile);
        if let Some(p) = inchi.polymer.as_ref().filter(|p| p.variant == variant) {
            w.polymer(p);
        }
        if let Some(fixed) = inchi.records.view(variant, TautomerDomain::Fixed) {
            w.fixed(mobile, fixed);
        }
    }
    // an empty isotopic layer cannot end an identifier
    if w.segments.last().is_some_and(|s| s == "i") {
        w.segments.pop();
    }
    let flavour = match inchi.flavour {
        Flavour::Standard => "S",
        Flavour::Beta => "B",
        Flavour::NonStandard => "",
    };
    format!("InChI={}{flavour}/{}", inchi.version, w.segments.join("/"))
}

struct Writer {
    alphabetic: bool,
    segments: Vec<String>,
}

fn live(view: &View) -> impl Iterator<Item = &ComponentRecord> {
    view.components.iter().filter(|c| !c.deleted)
}

fn formula_layer(view: &View) -> String {
    live(view).map(|c| c.formula.as_str()).collect::<Vec<_>>().join(".")
}

fn charge_text(charge: Charge) -> String {
    match charge {
        Charge::Unset => String::new(),
        Charge::Value(v) => format!("{v:+}"),
    }
}

fn counts_text(h: &IsotopicHydrogens) -> String {
    let mut out = String::new();
    for (marker, n) in [('H', h.protium), ('D', h.deuterium), ('T', h.tritium)] {
        push_count(&mut out, marker, n);
    }
    out
}

fn push_count(out: &mut String, marker: char, n: u32) {
    match n {
        0 => {}
        1 => out.push(marker),
        n => {
            let _ = write!(out, "{marker}{n}");
        }
    }
}

impl Writer {
    fn atom(&self, n: u32) -> String {
        if self.alphabetic {
            alphabetic(n)
        } else {
            n.to_string()
        }
    }

    /// Push `letter` and the `;`-joined entries unless every entry is empty.
    fn per_component(&mut self, letter: char, mut entries: Vec<String>) -> bool {
        while entries.last().is_some_and(String::is_empty) {
            entries.pop();
        }
        if entries.is_empty() {
            return false;
        }
        self.segments.push(format!("{letter}{}", entries.join(";")));
        true
    }

    fn main(&mut self, view: &View) {
        let comps: Vec<&ComponentRecord> = live(view).collect();
        let connections = comps.iter().map(|c| self.connections(c)).collect();
        self.per_component('c', connections);
        let hydrogens = comps
            .iter()
            .map(|c| {
                let groups = c.tautomeric_groups.as_deref().unwrap_or(&[]);
                self.hydrogens(c.hydrogens.as_deref().unwrap_or(&[]), groups)
            })
            .collect();
        self.per_component('h', hydrogens);
        self.per_component('q', comps.iter().map(|c| charge_text(c.charge)).collect());
        self.protons(view);
        self.stereo(&comps, IsotopeDomain::NonIsotopic);
        if view.isotopic {
            let entries = comps.iter().map(|c| self.isotopic_entry(c, None)).collect();
            self.isotopic_layer(entries);
            self.exchangeable(view);
            self.stereo(&comps, IsotopeDomain::Isotopic);
        }
    }

    fn fixed(&mut self, mobile: &View, fixed: &View) {
        let comps: Vec<&ComponentRecord> = live(fixed).collect();
        self.segments.push(format!("f{}", formula_layer(fixed)));
        let hydrogens = comps
            .iter()
            .map(|c| self.hydrogens(c.fixed_hydrogens.as_deref().unwrap_or(&[]), &[]))
            .collect();
        self.per_component('h', hydrogens);

        let counterparts = fixed.counterpart_map();
        let charges = comps
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mobile_charge = counterparts
                    .get(i)
                    .and_then(|&m| mobile.components.get(m))
                    .map(|m| m.charge);
                if mobile_charge == Some(c.charge) {
                    String::new()
                } else {
                    charge_text(c.charge)
                }
            })
            .collect();
        self.per_component('q', charges);
        self.stereo(&comps, IsotopeDomain::NonIsotopic);

        if fixed.isotopic && self.fixed_isotopic_needed(mobile, &comps, &counterparts) {
            let entries = comps
                .iter()
                .enumerate()
                .map(|(i, c)| self.isotopic_entry(c, mobile.components.get(i)))
                .collect();
            self.isotopic_layer(entries);
            self.stereo(&comps, IsotopeDomain::Isotopic);
        }

        if let Some(t) = fixed.transposition.as_ref().filter(|t| !t.cycles.is_empty()) {
            let mut body = String::new();
            for cycle in &t.cycles {
                let members: Vec<String> = cycle.iter().map(u32::to_string).collect();
                let _ = write!(body, "({})", members.join(","));
            }
            self.segments.push(format!("o{body}"));
        }
    }

    /// `/i` is written even when empty; it opens the isotopic block.
    fn isotopic_layer(&mut self, mut entries: Vec<String>) {
        while entries.last().is_some_and(String::is_empty) {
            entries.pop();
        }
        self.segments.push(format!("i{}", entries.join(";")));
    }

    /// Whether the fixed-H isotopic block says anything the reader would
    /// not rebuild from the mobile-H view.
    fn fixed_isotopic_needed(
        &self,
        mobile: &View,
        comps: &[&ComponentRecord],
        counterparts: &[usize],
    ) -> bool {
        if !mobile.isotopic {
            return true;
        }
        let explicit_stereo = comps.iter().any(|c| {
            explicit(c.sp2(IsotopeDomain::Isotopic)).is_some()
                || explicit(c.sp3(IsotopeDomain::Isotopic)).is_some()
        });
        let own_atoms = comps.iter().enumerate().any(|(i, c)| {
            let src = counterparts.get(i).and_then(|&m| mobile.components.get(m));
            src.map(|s| &s.isotopic_atoms) != Some(&c.isotopic_atoms)
        });
        explicit_stereo || own_atoms
    }

    /// An `/i` entry; `same_as` is the mobile-H component an `m` refers to.
    fn isotopic_entry(&self, c: &ComponentRecord, same_as: Option<&ComponentRecord>) -> String {
        let Some(atoms) = &c.isotopic_atoms else {
            return String::new();
        };
        if same_as.is_some_and(|m| m.isotopic_atoms.as_ref() == Some(atoms)) {
            return "m".into();
        }
        if atoms.is_empty() {
            return "e".into();
        }
        atoms
            .iter()
            .map(|a| self.isotopic_atom(a))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn isotopic_atom(&self, a: &IsotopicAtom) -> String {
        let mut out = self.atom(a.atom);
        if let Some(shift) = a.mass_shift {
            let _ = write!(out, "{shift:+}");
        }
        let h = &a.hydrogens;
        for (marker, n) in [('T', h.tritium), ('D', h.deuterium), ('H', h.protium)] {
            push_count(&mut out, marker, n);
        }
        out
    }

    fn protons(&mut self, view: &View) {
        match &view.protons {
            None => {}
            Some(ProtonBalance::Aggregate(c)) => {
                if c.protons != 0 || c.exchangeable.is_empty() {
                    self.segments.push(format!("p{:+}", c.protons));
                }
            }
            Some(ProtonBalance::PerComponent(list)) => {
                let any_protons = list.iter().any(|c| c.protons != 0);
                let no_exchange = list.iter().all(|c| c.exchangeable.is_empty());
                if any_protons || no_exchange {
                    let entries: Vec<String> = list
                        .iter()
                        .map(|c| match c.protons {
                            0 => String::new(),
                            p => format!("{p:+}"),
                        })
                        .collect();
                    self.segments.push(format!("p{}", entries.join(";")));
                }
            }
        }
    }

    fn exchangeable(&mut self, view: &View) {
        match &view.protons {
            Some(ProtonBalance::Aggregate(c)) if !c.exchangeable.is_empty() => {
                self.segments.push(format!("h{}", counts_text(&c.exchangeable)));
            }
            Some(ProtonBalance::PerComponent(list))
                if list.iter().any(|c| !c.exchangeable.is_empty()) =>
            {
                let entries: Vec<String> =
                    list.iter().map(|c| counts_text(&c.exchangeable)).collect();
                self.segments.push(format!("h{}", entries.join(";")));
            }
            _ => {}
        }
    }

    fn stereo(&mut self, comps: &[&ComponentRecord], iso: IsotopeDomain) {
        let bonds = comps
            .iter()
            .map(|c| match explicit(c.sp2(iso)) {
                None => String::new(),
                Some(s) if s.is_empty() => "e".into(),
                Some(s) => {
                    let items: Vec<String> = s
                        .descriptors
                        .iter()
                        .map(|b| {
                            let sep = if self.alphabetic { "" } else { "-" };
                            format!(
                                "{}{sep}{}{}",
                                self.atom(b.first),
                                self.atom(b.second),
                                b.parity.as_char()
                            )
                        })
                        .collect();
                    items.join(self.item_separator())
                }
            })
            .collect();
        self.per_component('b', bonds);

        let centers = comps
            .iter()
            .map(|c| match explicit(c.sp3(iso)) {
                None => String::new(),
                Some(s) if s.is_empty() => "e".into(),
                Some(s) => {
                    let items: Vec<String> = s
                        .descriptors
                        .iter()
                        .map(|t| format!("{}{}", self.atom(t.atom), t.parity.as_char()))
                        .collect();
                    items.join(self.item_separator())
                }
            })
            .collect();
        if !self.per_component('t', centers) {
            return;
        }

        let mut flags: String = comps
            .iter()
            .map(|c| match explicit(c.sp3(iso)) {
                Some(s) if !s.is_empty() && !s.trivial_inversion => match s.inversion {
                    Inversion::Absolute => '0',
                    Inversion::Inverted => '1',
                    Inversion::Unset => '.',
                },
                _ => '.',
            })
            .collect();
        while flags.ends_with('.') {
            flags.pop();
        }
        if !flags.is_empty() {
            self.segments.push(format!("m{flags}"));
        }

        let stereo_type = comps
            .iter()
            .filter_map(|c| explicit(c.sp3(iso)))
            .filter(|s| !s.is_empty())
            .find_map(|s| s.stereo_type);
        if let Some(t) = stereo_type {
            self.segments.push(format!("s{}", t.code()));
        }
    }

    fn item_separator(&self) -> &'static str {
        if self.alphabetic {
            ""
        } else {
            ","
        }
    }

    fn connections(&self, c: &ComponentRecord) -> String {
        match &c.connections {
            Some(ct) if ct.bond_count() > 0 => {
                if self.alphabetic {
                    self.runs(ct)
                } else {
                    Chain::new(ct).write(self)
                }
            }
            _ => String::new(),
        }
    }

    /// Each bonded atom followed by its lower-numbered neighbours.
    fn runs(&self, ct: &ConnectionTable) -> String {
        let mut out = String::new();
        for atom in 1..=ct.atom_count() as u32 {
            let lower = ct.lower_neighbors(atom);
            if lower.is_empty() {
                continue;
            }
            out.push_str(&self.atom(atom));
            for &n in lower {
                out.push_str(&self.atom(n));
            }
        }
        out
    }

    /// Atoms grouped by hydrogen count, fewest first, then the groups.
    fn hydrogens(&self, counts: &[u8], groups: &[TautomericGroup]) -> String {
        let mut distinct: Vec<u8> = counts.iter().copied().filter(|&n| n > 0).collect();
        distinct.sort_unstable();
        distinct.dedup();
        let mut items = Vec::new();
        for n in distinct {
            let atoms: Vec<u32> = counts
                .iter()
                .enumerate()
                .filter(|&(_, &h)| h == n)
                .map(|(i, _)| i as u32 + 1)
                .collect();
            let list = self.ranges(&atoms);
            items.push(if self.alphabetic {
                format!("{list}{n}")
            } else if n == 1 {
                format!("{list}H")
            } else {
                format!("{list}H{n}")
            });
        }
        for g in groups {
            items.push(self.group(g));
        }
        if self.alphabetic {
            items.concat()
        } else {
            items.join(",")
        }
    }

    fn ranges(&self, atoms: &[u32]) -> String {
        let mut parts = Vec::new();
        let mut i = 0;
        while i < atoms.len() {
            let mut j = i;
            while j + 1 < atoms.len() && atoms[j + 1] == atoms[j] + 1 {
                j += 1;
            }
            parts.push(if j > i {
                format!("{}-{}", self.atom(atoms[i]), self.atom(atoms[j]))
            } else {
                self.atom(atoms[i])
            });
            i = j + 1;
        }
        parts.join(self.item_separator())
    }

    fn group(&self, g: &TautomericGroup) -> String {
        let mut out = String::from("(H");
        if g.hydrogens != 1 {
            let _ = write!(out, "{}", g.hydrogens);
        }
        match g.negative_charges {
            0 => {}
            1 => out.push('-'),
            n => {
                let _ = write!(out, "-{n}");
            }
        }
        for &a in &g.atoms {
            if !self.alphabetic {
                out.push(',');
            }
            out.push_str(&self.atom(a));
        }
        out.push(')');
        out
    }

    fn polymer(&mut self, p: &PolymerDescriptor) {
        let units: Vec<String> = p.units.iter().map(unit_text).collect();
        self.segments.push(format!("z{}", units.join(";")));
    }
}

fn unit_text(u: &PolymerUnit) -> String {
    let members: Vec<String> = u.atoms.iter().map(u32::to_string).collect();
    let mut out = format!(
        "{}{}{}-{}",
        u.style.digit(),
        u.subtype.digit(),
        u.connectivity.digit(),
        members.join(",")
    );
    match u.crossing {
        None => {}
        Some(Crossing::EndGroupPair { first, second }) => {
            let _ = write!(out, "({}-{},{}-{})", first.0, first.1, second.0, second.1);
        }
        Some(Crossing::StarRingClosure { atom }) => {
            let _ = write!(out, "({atom})");
        }
        Some(Crossing::StarHigherOrder { atoms, order }) => {
            let op = if order == 3 { '#' } else { '=' };
            let _ = write!(out, "({}{op}{})", atoms.0, atoms.1);
        }
        Some(Crossing::StarDiradical { atoms }) => {
            let _ = write!(out, "({}:{})", atoms.0, atoms.1);
        }
    }
    out
}

/// A set the reader would not rebuild by itself.
fn explicit<D>(set: Option<&StereoDescriptorSet<D>>) -> Option<&StereoDescriptorSet<D>> {
    set.filter(|s| !s.inherited)
}

/// Depth-first walk of a connection table in decimal chain notation.
///
/// A visited atom reached again over an unused bond is written as a leaf,
/// which closes the ring. Every child but the last goes in parentheses.
struct Chain {
    adjacency: Vec<Vec<u32>>,
    visited: Vec<bool>,
    used: HashSet<(u32, u32)>,
}

impl Chain {
    fn new(ct: &ConnectionTable) -> Self {
        let n = ct.atom_count();
        Self {
            adjacency: (1..=n as u32).map(|a| ct.neighbors(a)).collect(),
            visited: vec![false; n + 1],
            used: HashSet::new(),
        }
    }

    fn write(mut self, w: &Writer) -> String {
        let mut out = String::new();
        self.walk(1, w, &mut out);
        out
    }

    fn walk(&mut self, atom: u32, w: &Writer, out: &mut String) {
        self.visited[atom as usize] = true;
        out.push_str(&w.atom(atom));
        let mut children = Vec::new();
        for n in self.adjacency[atom as usize - 1].clone() {
            let bond = (atom.max(n), atom.min(n));
            if !self.used.insert(bond) {
                continue;
            }
            let mut part = String::new();
            if self.visited[n as usize] {
                part.push_str(&w.atom(n));
            } else {
                self.walk(n, w, &mut part);
            }
            children.push(part);
        }
        match children.split_last() {
            None => {}
            Some((only, [])) => {
                out.push('-');
                out.push_str(only);
            }
            Some((last, rest)) => {
                out.push('(');
                out.push_str(&rest.join(","));
                out.push(')');
                out.push_str(last);
            }
        }
    }
}
