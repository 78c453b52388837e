//! The layer-sequencing driver.
//!
//! [`InchiParser`] walks the segments of one identifier, resolves each
//! prefix letter to a [`LayerState`], hands the body to the matching
//! grammar and writes the result into the record set. Every field is
//! written once; abbreviations are expanded against the same-ordinal
//! component of the layer they name as soon as they are read.

use log::{debug, error, trace};

use crate::formula::Formula;
use crate::inchi::auxinfo::parse_auxinfo;
use crate::inchi::balance;
use crate::inchi::cursor::Cursor;
use crate::inchi::error::{ErrorKind, Fault, ReadError};
use crate::inchi::layers::charge::{parse_charge, parse_protons, ProtonLayer};
use crate::inchi::layers::connections::parse_connections;
use crate::inchi::layers::formula::parse_formula;
use crate::inchi::layers::hydrogen::{parse_fixed_h, parse_mobile_h};
use crate::inchi::layers::isotopic::{parse_exchangeable, parse_isotopic_atoms, ExchangeLayer};
use crate::inchi::layers::polymer::parse_polymer;
use crate::inchi::layers::stereo::{
    parse_inversion, parse_sp2, parse_sp3, parse_stereo_type, InversionLayer, StereoTypeLayer,
};
use crate::inchi::layers::transposition::parse_transposition;
use crate::inchi::layers::{per_component, reserve, Abbrev, Slot};
use crate::inchi::reconstruct::{copy_descriptors, reconstruct};
use crate::inchi::source::{first_record, split_prefix, split_segments, Segment};
use crate::inchi::state::{next_state, LayerState, ParserState, Status};
use crate::inchi::Inchi;
use crate::options::ReadOptions;
use crate::record::{
    Charge, ComponentRecord, Inversion, IsotopeDomain, ProtonBalance, ProtonCounts, RecordSet,
    StereoBond, StereoCenter, StereoDescriptorSet, StereoType, TautomerDomain, Variant, View,
};

use LayerState as L;

/// Reads identifiers one at a time, reusing its scratch state.
#[derive(Debug, Clone, Default)]
pub struct InchiParser {
    options: ReadOptions,
    state: ParserState,
}

impl InchiParser {
    pub fn new(options: ReadOptions) -> Self {
        Self {
            options,
            state: ParserState::default(),
        }
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// State left behind by the last read.
    pub fn state(&self) -> &ParserState {
        &self.state
    }

    pub fn parse(&mut self, text: &str) -> Result<Inchi, ReadError> {
        self.parse_with_aux(text, None)
    }

    /// Mark the input the parser was reading as exhausted.
    pub(crate) fn end_of_stream(&mut self) {
        self.state.status = Status::EndOfStream;
    }

    /// Parse an identifier and, when the options ask for it, the AuxInfo
    /// record that accompanied it.
    ///
    /// `text` ends at a tab, space, line break or the prefix of a second
    /// identifier; anything after that is ignored.
    pub fn parse_with_aux(&mut self, text: &str, aux: Option<&str>) -> Result<Inchi, ReadError> {
        self.state.clear();
        self.state.status = Status::MoreInput;
        match self.read(first_record(text), aux) {
            Ok(inchi) => {
                self.state.layer = LayerState::End;
                self.state.status = Status::EndOfRecord;
                Ok(inchi)
            }
            Err(fault) => {
                let err = ReadError::new(self.state.layer, self.state.reconnected(), fault);
                if err.kind == ErrorKind::Program {
                    error!("{err}");
                } else {
                    debug!("{err}");
                }
                self.state.status = Status::Error;
                Err(err)
            }
        }
    }

    fn read(&mut self, text: &str, aux: Option<&str>) -> Result<Inchi, Fault> {
        let prefix = split_prefix(text)?;
        let mut inchi = Inchi::new(prefix.version, prefix.flavour);
        let segments = split_segments(prefix.body, prefix.offset);
        let last = segments.len().saturating_sub(1);
        for (i, seg) in segments.iter().enumerate() {
            self.segment(&mut inchi, seg, i == 0, i == last)?;
        }

        self.state.layer = LayerState::Reconstruction;
        reconstruct(&mut inchi.records)?;
        self.state.layer = LayerState::Balance;
        balance::validate(&mut inchi.records, &self.options)?;

        if let Some(aux) = aux.filter(|_| self.options.read_auxinfo) {
            self.state.layer = LayerState::AuxVersion;
            inchi.aux = parse_auxinfo(aux, &inchi.records, &self.options, &mut self.state.layer)?;
        }
        Ok(inchi)
    }

    fn segment(
        &mut self,
        inchi: &mut Inchi,
        seg: &Segment<'_>,
        first: bool,
        last: bool,
    ) -> Result<(), Fault> {
        let (layer, body, offset) = match seg.letter() {
            Some(letter) => {
                let next = next_state(self.state.layer, letter)?;
                if next == LayerState::Reconnected && self.state.reconnected() {
                    return Err(Fault::UnexpectedLayer('r'));
                }
                (next, &seg.text[1..], seg.offset + 1)
            }
            None if first => (LayerState::Formula, seg.text, seg.offset),
            None if seg.text.is_empty() => {
                return Err(if last {
                    Fault::EmptyFinalLayer
                } else {
                    Fault::EmptyLayer
                })
            }
            None => {
                return Err(Fault::UnexpectedChar {
                    pos: seg.offset,
                    ch: seg.text.chars().next().unwrap_or('/'),
                })
            }
        };
        self.state.layer = layer;
        self.state.component = 0;

        if body.is_empty() {
            if last {
                return Err(Fault::EmptyFinalLayer);
            }
            if !layer.allows_empty() && layer != LayerState::Formula {
                return Err(Fault::EmptyLayer);
            }
        }
        if first && layer != LayerState::Formula {
            debug!("no formula layer, starting from an empty view");
            let slot = inchi.records.slot(Variant::Disconnected, TautomerDomain::Mobile);
            *slot = Some(View::default());
        }

        trace!("{layer} layer at offset {offset}: {body:?}");
        let mut cur = Cursor::new(body, offset, self.state.encoding);
        let applied = self.apply(inchi, layer, &mut cur);
        self.state.component = cur.component();
        applied?;
        cur.finish()?;
        self.state.encoding = cur.encoding();
        if layer == LayerState::Reconnected {
            self.state.layer = LayerState::Formula;
        }
        Ok(())
    }

    /// Apply one layer; returns how many component entries it carried.
    fn apply(
        &mut self,
        inchi: &mut Inchi,
        layer: LayerState,
        cur: &mut Cursor<'_>,
    ) -> Result<usize, Fault> {
        let variant = self.state.variant;
        let domain = layer.domain();
        let iso = layer.isotope();
        let records = &mut inchi.records;
        match layer {
            L::Formula => self.formula(records, variant, TautomerDomain::Mobile, cur),
            L::Reconnected => {
                debug!("entering reconnected layers");
                self.state.variant = Variant::Reconnected;
                self.formula(records, Variant::Reconnected, TautomerDomain::Mobile, cur)
            }
            L::FixedFormula if cur.is_empty() => copy_formula(records, variant),
            L::FixedFormula => {
                debug!("entering fixed-H layers");
                self.formula(records, variant, TautomerDomain::Fixed, cur)
            }
            L::Connections => connections(records, variant, cur),
            L::MobileH => mobile_hydrogens(records, variant, cur),
            L::FixedH => fixed_hydrogens(records, variant, cur),
            L::Charge | L::FixedCharge => charges(records, variant, domain, cur),
            L::Protons => protons(records, variant, cur),
            L::Sp2 | L::IsoSp2 | L::FixedSp2 | L::FixedIsoSp2 => {
                double_bonds(records, variant, domain, iso, cur)
            }
            L::Sp3 | L::IsoSp3 | L::FixedSp3 | L::FixedIsoSp3 => {
                centers(records, variant, domain, iso, cur)
            }
            L::Inversion | L::IsoInversion | L::FixedInversion | L::FixedIsoInversion => {
                inversion(records, variant, domain, iso, cur)
            }
            L::StereoType | L::IsoStereoType | L::FixedStereoType | L::FixedIsoStereoType => {
                stereo_type(records, variant, domain, iso, cur)
            }
            L::Isotopic | L::FixedIsotopic => isotopic_atoms(records, variant, domain, cur),
            L::IsoExchangeH => exchangeable(records, variant, cur),
            L::Polymer => {
                let atoms = view(records, variant, TautomerDomain::Mobile)?.atom_total() as u32;
                let descriptor = parse_polymer(cur, atoms, variant)?;
                let n = descriptor.units.len();
                set_once(&mut inchi.polymer, descriptor, "polymer")?;
                Ok(n)
            }
            L::Transposition => {
                let fixed = view_mut(records, variant, TautomerDomain::Fixed)?;
                let t = parse_transposition(cur, fixed.components.len())?;
                let n = t.cycles.len();
                set_once(&mut fixed.transposition, t, "transposition")?;
                Ok(n)
            }
            _ => Err(Fault::Internal("segment resolved to a non-layer state")),
        }
    }

    fn formula(
        &self,
        records: &mut RecordSet,
        variant: Variant,
        domain: TautomerDomain,
        cur: &mut Cursor<'_>,
    ) -> Result<usize, Fault> {
        let view = if cur.is_empty() {
            View::default()
        } else {
            let formulas = parse_formula(cur)?;
            let total: u64 = formulas.iter().map(|f| u64::from(f.atom_count())).sum();
            if total > u64::from(self.options.atom_limit()) {
                return Err(Fault::TooManyAtoms(u32::try_from(total).unwrap_or(u32::MAX)));
            }
            let mut components = reserve(formulas.len())?;
            components.extend(formulas.iter().map(component_from));
            View {
                components,
                ..View::default()
            }
        };
        let n = view.components.len();
        set_once(records.slot(variant, domain), view, "formula")?;
        Ok(n)
    }
}

fn component_from(formula: &Formula) -> ComponentRecord {
    ComponentRecord {
        atoms: formula.canonical_atoms(),
        formula: formula.to_string(),
        formula_hydrogens: formula.hydrogens(),
        ..ComponentRecord::default()
    }
}

fn set_once<T>(field: &mut Option<T>, value: T, what: &'static str) -> Result<(), Fault> {
    if field.is_some() {
        return Err(Fault::AlreadySet(what));
    }
    *field = Some(value);
    Ok(())
}

fn view(records: &RecordSet, variant: Variant, domain: TautomerDomain) -> Result<&View, Fault> {
    records
        .view(variant, domain)
        .ok_or(Fault::Internal("layer read before its formula"))
}

fn view_mut(
    records: &mut RecordSet,
    variant: Variant,
    domain: TautomerDomain,
) -> Result<&mut View, Fault> {
    records
        .view_mut(variant, domain)
        .ok_or(Fault::Internal("layer read before its formula"))
}

fn atom_counts(view: &View) -> Vec<u32> {
    view.components.iter().map(|c| c.atom_count() as u32).collect()
}

fn source_component(
    records: &RecordSet,
    variant: Variant,
    domain: TautomerDomain,
    index: usize,
    abbrev: Abbrev,
) -> Result<&ComponentRecord, Fault> {
    records
        .view(variant, domain)
        .and_then(|v| v.components.get(index))
        .ok_or(Fault::MissingSource {
            abbrev: abbrev.letter(),
        })
}

/// An empty `/f` repeats the mobile-H formula.
fn copy_formula(records: &mut RecordSet, variant: Variant) -> Result<usize, Fault> {
    let mobile = view(records, variant, TautomerDomain::Mobile)?;
    let mut components = reserve(mobile.components.len())?;
    components.extend(mobile.components.iter().map(|c| ComponentRecord {
        atoms: c.atoms.clone(),
        formula: c.formula.clone(),
        formula_hydrogens: c.formula_hydrogens,
        ..ComponentRecord::default()
    }));
    let n = components.len();
    let fixed = View {
        components,
        ..View::default()
    };
    set_once(records.slot(variant, TautomerDomain::Fixed), fixed, "fixed-H formula")?;
    Ok(n)
}

fn connections(
    records: &mut RecordSet,
    variant: Variant,
    cur: &mut Cursor<'_>,
) -> Result<usize, Fault> {
    let view = view_mut(records, variant, TautomerDomain::Mobile)?;
    let counts = atom_counts(view);
    let slots = per_component(cur, counts.len(), false, |c, i| parse_connections(c, counts[i]))?;
    let n = slots.len();
    for (comp, slot) in view.components.iter_mut().zip(slots) {
        if let Slot::Value(table) = slot {
            set_once(&mut comp.connections, table, "connection table")?;
        }
    }
    Ok(n)
}

fn mobile_hydrogens(
    records: &mut RecordSet,
    variant: Variant,
    cur: &mut Cursor<'_>,
) -> Result<usize, Fault> {
    let view = view_mut(records, variant, TautomerDomain::Mobile)?;
    let counts = atom_counts(view);
    let slots = per_component(cur, counts.len(), false, |c, i| parse_mobile_h(c, counts[i]))?;
    let n = slots.len();
    for (comp, slot) in view.components.iter_mut().zip(slots) {
        if let Slot::Value(entry) = slot {
            set_once(&mut comp.hydrogens, entry.hydrogens, "hydrogens")?;
            if !entry.groups.is_empty() {
                set_once(&mut comp.tautomeric_groups, entry.groups, "tautomeric groups")?;
            }
        }
    }
    Ok(n)
}

fn fixed_hydrogens(
    records: &mut RecordSet,
    variant: Variant,
    cur: &mut Cursor<'_>,
) -> Result<usize, Fault> {
    let view = view_mut(records, variant, TautomerDomain::Fixed)?;
    let counts = atom_counts(view);
    let slots = per_component(cur, counts.len(), false, |c, i| parse_fixed_h(c, counts[i]))?;
    let n = slots.len();
    for (comp, slot) in view.components.iter_mut().zip(slots) {
        if let Slot::Value(h) = slot {
            set_once(&mut comp.fixed_hydrogens, h, "fixed hydrogens")?;
        }
    }
    Ok(n)
}

fn charges(
    records: &mut RecordSet,
    variant: Variant,
    domain: TautomerDomain,
    cur: &mut Cursor<'_>,
) -> Result<usize, Fault> {
    let n = view(records, variant, domain)?.components.len();
    let slots = per_component(cur, n, true, |c, _| parse_charge(c))?;
    let mut resolved: Vec<Option<Charge>> = reserve(slots.len())?;
    for (i, slot) in slots.into_iter().enumerate() {
        resolved.push(match slot {
            Slot::Empty => None,
            Slot::Value(v) => Some(Charge::Value(v)),
            Slot::Abbrev(a) => match a.source(domain, IsotopeDomain::NonIsotopic)? {
                None => Some(Charge::Value(0)),
                Some((src, _)) => {
                    let charge = source_component(records, variant, src, i, a)?.charge;
                    if !charge.is_set() {
                        return Err(Fault::MissingSource { abbrev: a.letter() });
                    }
                    Some(charge)
                }
            },
        });
    }
    let view = view_mut(records, variant, domain)?;
    for (comp, charge) in view.components.iter_mut().zip(&resolved) {
        if let Some(charge) = *charge {
            if comp.charge.is_set() {
                return Err(Fault::AlreadySet("charge"));
            }
            comp.charge = charge;
        }
    }
    Ok(resolved.len())
}

fn protons(
    records: &mut RecordSet,
    variant: Variant,
    cur: &mut Cursor<'_>,
) -> Result<usize, Fault> {
    let view = view_mut(records, variant, TautomerDomain::Mobile)?;
    let n = view.components.len();
    let balance = match parse_protons(cur, n)? {
        ProtonLayer::Aggregate(protons) => ProtonBalance::Aggregate(ProtonCounts {
            protons,
            ..ProtonCounts::default()
        }),
        ProtonLayer::PerComponent(list) => {
            let mut counts: Vec<ProtonCounts> = reserve(n)?;
            counts.extend(list.into_iter().map(|protons| ProtonCounts {
                protons,
                ..ProtonCounts::default()
            }));
            counts.resize(n, ProtonCounts::default());
            ProtonBalance::PerComponent(counts)
        }
    };
    set_once(&mut view.protons, balance, "protons")?;
    Ok(n)
}

fn exchangeable(
    records: &mut RecordSet,
    variant: Variant,
    cur: &mut Cursor<'_>,
) -> Result<usize, Fault> {
    let view = view_mut(records, variant, TautomerDomain::Mobile)?;
    let n = view.components.len();
    let exchange = parse_exchangeable(cur, n)?;
    let balance = view.protons.get_or_insert_with(|| match &exchange {
        ExchangeLayer::Aggregate(_) => ProtonBalance::Aggregate(ProtonCounts::default()),
        ExchangeLayer::PerComponent(_) => {
            ProtonBalance::PerComponent(vec![ProtonCounts::default(); n])
        }
    });
    match (balance, exchange) {
        (ProtonBalance::Aggregate(counts), ExchangeLayer::Aggregate(h)) => {
            counts.exchangeable = h;
            Ok(1)
        }
        (ProtonBalance::PerComponent(counts), ExchangeLayer::PerComponent(list)) => {
            let listed = list.len();
            for (c, h) in counts.iter_mut().zip(list) {
                c.exchangeable = h;
            }
            Ok(listed)
        }
        _ => Err(Fault::MixedProtonForms),
    }
}

/// Resolve stereo slots to the sets they stand for.
fn stereo_sets<D: Clone>(
    records: &RecordSet,
    variant: Variant,
    domain: TautomerDomain,
    iso: IsotopeDomain,
    slots: Vec<Slot<Vec<D>>>,
    pick: fn(&ComponentRecord, IsotopeDomain) -> Option<&StereoDescriptorSet<D>>,
) -> Result<Vec<Option<StereoDescriptorSet<D>>>, Fault> {
    let mut out = reserve(slots.len())?;
    for (i, slot) in slots.into_iter().enumerate() {
        out.push(match slot {
            Slot::Empty => None,
            Slot::Value(descriptors) => Some(StereoDescriptorSet::new(descriptors)),
            Slot::Abbrev(a) => match a.source(domain, iso)? {
                None => Some(StereoDescriptorSet::new(Vec::new())),
                Some((src_domain, src_iso)) => {
                    let comp = source_component(records, variant, src_domain, i, a)?;
                    let set = pick(comp, src_iso)
                        .ok_or(Fault::MissingSource { abbrev: a.letter() })?;
                    Some(copy_descriptors(set))
                }
            },
        });
    }
    Ok(out)
}

fn store_sets<D>(
    view: &mut View,
    iso: IsotopeDomain,
    sets: Vec<Option<StereoDescriptorSet<D>>>,
    field: fn(&mut ComponentRecord) -> &mut [Option<StereoDescriptorSet<D>>; 2],
    what: &'static str,
) -> Result<usize, Fault> {
    let n = sets.len();
    for (comp, set) in view.components.iter_mut().zip(sets) {
        if let Some(set) = set {
            set_once(&mut field(comp)[iso.index()], set, what)?;
        }
    }
    Ok(n)
}

fn sp2_field(c: &mut ComponentRecord) -> &mut [Option<StereoDescriptorSet<StereoBond>>; 2] {
    &mut c.sp2
}

fn sp3_field(c: &mut ComponentRecord) -> &mut [Option<StereoDescriptorSet<StereoCenter>>; 2] {
    &mut c.sp3
}

fn double_bonds(
    records: &mut RecordSet,
    variant: Variant,
    domain: TautomerDomain,
    iso: IsotopeDomain,
    cur: &mut Cursor<'_>,
) -> Result<usize, Fault> {
    let counts = atom_counts(view(records, variant, domain)?);
    let slots = per_component(cur, counts.len(), true, |c, i| parse_sp2(c, counts[i]))?;
    let sets = stereo_sets(records, variant, domain, iso, slots, ComponentRecord::sp2)?;
    store_sets(view_mut(records, variant, domain)?, iso, sets, sp2_field, "sp2 stereo")
}

fn centers(
    records: &mut RecordSet,
    variant: Variant,
    domain: TautomerDomain,
    iso: IsotopeDomain,
    cur: &mut Cursor<'_>,
) -> Result<usize, Fault> {
    let counts = atom_counts(view(records, variant, domain)?);
    let slots = per_component(cur, counts.len(), true, |c, i| parse_sp3(c, counts[i]))?;
    let sets = stereo_sets(records, variant, domain, iso, slots, ComponentRecord::sp3)?;
    store_sets(view_mut(records, variant, domain)?, iso, sets, sp3_field, "sp3 stereo")
}

fn has_centers(comp: &ComponentRecord, iso: IsotopeDomain) -> bool {
    comp.sp3(iso).is_some_and(|s| !s.is_empty())
}

fn inversion(
    records: &mut RecordSet,
    variant: Variant,
    domain: TautomerDomain,
    iso: IsotopeDomain,
    cur: &mut Cursor<'_>,
) -> Result<usize, Fault> {
    let n = view(records, variant, domain)?.components.len();
    let flags = match parse_inversion(cur, n)? {
        InversionLayer::Flags(flags) => flags,
        InversionLayer::Abbrev(a) => match a.source(domain, iso)? {
            None => return Ok(0),
            Some((src_domain, src_iso)) => {
                let src = records
                    .view(variant, src_domain)
                    .ok_or(Fault::MissingSource { abbrev: a.letter() })?;
                let target = view(records, variant, domain)?;
                let flags: Vec<_> = target
                    .components
                    .iter()
                    .enumerate()
                    .map(|(i, comp)| {
                        let inv = src.components.get(i)?.sp3(src_iso)?.inversion;
                        (has_centers(comp, iso) && inv != Inversion::Unset)
                            .then_some(inv)
                    })
                    .collect();
                if flags.iter().all(Option::is_none) {
                    return Err(Fault::MissingSource { abbrev: a.letter() });
                }
                flags
            }
        },
    };
    let view = view_mut(records, variant, domain)?;
    for (i, flag) in flags.iter().enumerate() {
        let Some(inv) = *flag else {
            continue;
        };
        let set = view.components[i].sp3[iso.index()]
            .as_mut()
            .filter(|s| !s.is_empty())
            .ok_or(Fault::NoStereo(i + 1))?;
        if set.inversion != Inversion::Unset {
            return Err(Fault::AlreadySet("inversion flag"));
        }
        set.inversion = inv;
    }
    Ok(flags.len())
}

fn stereo_type(
    records: &mut RecordSet,
    variant: Variant,
    domain: TautomerDomain,
    iso: IsotopeDomain,
    cur: &mut Cursor<'_>,
) -> Result<usize, Fault> {
    let target = view(records, variant, domain)?;
    let types: Vec<Option<StereoType>> = match parse_stereo_type(cur)? {
        StereoTypeLayer::Code(t) => target
            .components
            .iter()
            .map(|c| has_centers(c, iso).then_some(t))
            .collect(),
        StereoTypeLayer::Abbrev(a) => match a.source(domain, iso)? {
            None => return Ok(0),
            Some((src_domain, src_iso)) => {
                let src = records
                    .view(variant, src_domain)
                    .ok_or(Fault::MissingSource { abbrev: a.letter() })?;
                let types: Vec<_> = target
                    .components
                    .iter()
                    .enumerate()
                    .map(|(i, comp)| {
                        let t = src.components.get(i)?.sp3(src_iso)?.stereo_type;
                        t.filter(|_| has_centers(comp, iso))
                    })
                    .collect();
                if types.iter().all(Option::is_none) {
                    return Err(Fault::MissingSource { abbrev: a.letter() });
                }
                types
            }
        },
    };
    let view = view_mut(records, variant, domain)?;
    let mut applied = 0;
    for (comp, t) in view.components.iter_mut().zip(types) {
        let (Some(t), Some(set)) = (t, comp.sp3[iso.index()].as_mut()) else {
            continue;
        };
        set_once(&mut set.stereo_type, t, "stereo type")?;
        applied += 1;
    }
    Ok(applied)
}

fn isotopic_atoms(
    records: &mut RecordSet,
    variant: Variant,
    domain: TautomerDomain,
    cur: &mut Cursor<'_>,
) -> Result<usize, Fault> {
    if cur.is_empty() {
        view_mut(records, variant, domain)?.isotopic = true;
        return Ok(0);
    }
    let counts = atom_counts(view(records, variant, domain)?);
    let slots = per_component(cur, counts.len(), true, |c, i| parse_isotopic_atoms(c, counts[i]))?;
    let mut resolved = reserve(slots.len())?;
    for (i, slot) in slots.into_iter().enumerate() {
        resolved.push(match slot {
            Slot::Empty => None,
            Slot::Value(atoms) => Some(atoms),
            Slot::Abbrev(a) => match a.source(domain, IsotopeDomain::Isotopic)? {
                None => Some(Vec::new()),
                Some((src, IsotopeDomain::Isotopic)) => Some(
                    source_component(records, variant, src, i, a)?
                        .isotopic_atoms
                        .clone()
                        .ok_or(Fault::MissingSource { abbrev: a.letter() })?,
                ),
                Some(_) => return Err(Fault::BadAbbreviation { abbrev: a.letter() }),
            },
        });
    }
    let view = view_mut(records, variant, domain)?;
    view.isotopic = true;
    let n = resolved.len();
    for (comp, atoms) in view.components.iter_mut().zip(resolved) {
        if let Some(atoms) = atoms {
            set_once(&mut comp.isotopic_atoms, atoms, "isotopic atoms")?;
        }
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::inchi::state::Encoding;
    use crate::record::Parity;

    fn parse(s: &str) -> Result<Inchi, ReadError> {
        InchiParser::default().parse(s)
    }

    fn mobile(inchi: &Inchi) -> &View {
        inchi
            .records
            .view(Variant::Disconnected, TautomerDomain::Mobile)
            .unwrap()
    }

    fn fixed(inchi: &Inchi) -> &View {
        inchi
            .records
            .view(Variant::Disconnected, TautomerDomain::Fixed)
            .unwrap()
    }

    #[test]
    fn methane() {
        let inchi = parse("InChI=1S/CH4/h1H4").unwrap();
        let view = mobile(&inchi);
        assert_eq!(view.components.len(), 1);
        let c = &view.components[0];
        assert_eq!(c.formula, "CH4");
        assert_eq!(c.atoms, vec![Element::C]);
        assert_eq!(c.hydrogens, Some(vec![4]));
        assert!(c.sp2.iter().all(Option::is_none));
        assert!(c.sp3.iter().all(Option::is_none));
        assert_eq!(c.connections, Some(crate::record::ConnectionTable::trivial()));
        assert!(inchi
            .records
            .view(Variant::Disconnected, TautomerDomain::Fixed)
            .is_none());
        assert!(!view.isotopic);
    }

    #[test]
    fn state_after_success_and_failure() {
        let mut parser = InchiParser::default();
        parser.parse("InChI=1S/C2H6/c1-2/h1-2H3").unwrap();
        assert_eq!(parser.state().status, Status::EndOfRecord);
        assert_eq!(parser.state().encoding, Encoding::Decimal);
        let err = parser.parse("InChI=1S/C2H6/c1-3").unwrap_err();
        assert_eq!(parser.state().status, Status::Error);
        assert_eq!(err.state, LayerState::Connections);
        assert!(err.is_syntax());
    }

    #[test]
    fn fixed_layer_with_charge() {
        let inchi = parse("InChI=1/C2H4O2/c1-2(3)4/h1H3,(H,3,4)/p-1/fC2H3O2/q-1").unwrap();
        let m = mobile(&inchi);
        assert_eq!(m.components[0].tautomeric_groups.as_ref().unwrap()[0].atoms, vec![3, 4]);
        let f = fixed(&inchi);
        assert_eq!(f.components[0].charge, Charge::Value(-1));
        assert_eq!(f.components[0].hydrogens, Some(vec![3, 0, 0, 0]));
        assert_eq!(f.components[0].connections, m.components[0].connections);
    }

    #[test]
    fn empty_fixed_formula_copies_mobile() {
        let inchi = parse("InChI=1/C2H4O2/c1-2(3)4/h1H3,(H,3,4)/f/h3H").unwrap();
        let f = fixed(&inchi);
        assert_eq!(f.components[0].formula, "C2H4O2");
        assert_eq!(f.components[0].fixed_hydrogens, Some(vec![0, 0, 1, 0]));
    }

    #[test]
    fn stereo_layers() {
        let inchi = parse("InChI=1S/C4H10O/c1-3-4(2)5/h4-5H,3H2,1-2H3/t4-/m0/s1").unwrap();
        let set = mobile(&inchi).components[0].sp3[0].as_ref().unwrap();
        assert_eq!(set.descriptors[0].atom, 4);
        assert_eq!(set.descriptors[0].parity, Parity::Odd);
        assert_eq!(set.inversion, Inversion::Absolute);
        assert_eq!(set.stereo_type, Some(StereoType::Absolute));
    }

    #[test]
    fn inversion_needs_centers() {
        let err =
            parse("InChI=1S/C4H10O.CH4/c1-3-4(2)5;/h4-5H,3H2,1-2H3;1H4/t4-;/m.1").unwrap_err();
        assert_eq!(err.fault, Fault::NoStereo(2));
        assert_eq!(err.state, LayerState::Inversion);
    }

    #[test]
    fn abbreviation_copies_mobile_centers() {
        let inchi =
            parse("InChI=1/C4H10O/c1-3-4(2)5/h4-5H,3H2,1-2H3/t4-/m0/s1/i1D/t4-/m0/fC4H10O/tm")
                .unwrap();
        let set = fixed(&inchi).components[0].sp3[0].as_ref().unwrap();
        assert!(!set.inherited);
        assert_eq!(set.descriptors.len(), 1);
        assert_eq!(set.inversion, Inversion::Absolute);
        assert!(set.trivial_inversion);
    }

    #[test]
    fn missing_abbreviation_source() {
        let err = parse("InChI=1/C2H6O/c1-2-3/h3H,2H2,1H3/fC2H6O/tm").unwrap_err();
        assert_eq!(err.fault, Fault::MissingSource { abbrev: 'm' });
    }

    #[test]
    fn proton_only_identifier() {
        let inchi = parse("InChI=1S/p+1").unwrap();
        let view = mobile(&inchi);
        assert!(view.components.is_empty());
        assert_eq!(
            view.protons,
            Some(ProtonBalance::Aggregate(ProtonCounts {
                protons: 1,
                ..ProtonCounts::default()
            }))
        );
    }

    #[test]
    fn proton_component() {
        let inchi = parse("InChI=1S/H/q+1").unwrap();
        let view = mobile(&inchi);
        assert_eq!(view.components.len(), 1);
        assert!(!view.components[0].deleted);
        assert_eq!(view.components[0].charge, Charge::Value(1));
    }

    #[test]
    fn empty_final_layer() {
        let err = parse("InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3/i").unwrap_err();
        assert_eq!(err.fault, Fault::EmptyFinalLayer);
        assert_eq!(err.state, LayerState::Isotopic);
    }

    #[test]
    fn empty_layers_only_where_allowed() {
        let err = parse("InChI=1S/CH4//h1H4").unwrap_err();
        assert_eq!(err.fault, Fault::EmptyLayer);
        let err = parse("InChI=1S/CH4/c/h1H4").unwrap_err();
        assert_eq!(err.fault, Fault::EmptyLayer);
    }

    #[test]
    fn layers_out_of_order() {
        let err = parse("InChI=1S/C2H6/h1-2H3/c1-2").unwrap_err();
        assert_eq!(err.fault, Fault::UnexpectedLayer('c'));
    }

    #[test]
    fn reconnected_layers() {
        let inchi = parse(
            "InChI=1/2CH2O2.Zn/c2*2-1-3;/h2*1H,(H,2,3);/q;;+2/p-2/rC2H2O4Zn/c3-1-5-7-6-2-4/h1-2H",
        )
        .unwrap();
        let r = inchi
            .records
            .view(Variant::Reconnected, TautomerDomain::Mobile)
            .unwrap();
        assert_eq!(r.components.len(), 1);
        assert_eq!(r.components[0].atoms.len(), 7);
        let err = parse("InChI=1/CH4/h1H4/rCH4/h1H4/rCH4").unwrap_err();
        assert_eq!(err.fault, Fault::UnexpectedLayer('r'));
        assert!(err.reconnected);
    }

    #[test]
    fn encoding_is_sticky() {
        let mut parser = InchiParser::default();
        parser.parse("InChI=1/C2H6/cBA/hA-B3").unwrap();
        assert_eq!(parser.state().encoding, Encoding::Alphabetic);
        let err = parser.parse("InChI=1/C2H6/cBA/h1-2H3").unwrap_err();
        assert!(matches!(err.fault, Fault::EncodingMismatch { .. }));
    }

    #[test]
    fn unbonded_atoms_are_rejected() {
        let err = parse("InChI=1S/CH4N/h1H4/q+1").unwrap_err();
        assert_eq!(err.fault, Fault::Disconnected(1));
        assert_eq!(err.state, LayerState::Balance);
    }

    #[test]
    fn identifier_ends_at_terminator() {
        for text in [
            "InChI=1S/CH4/h1H4\tAuxInfo=1/0/N:1",
            "InChI=1S/CH4/h1H4\nInChI=1S/H2O/h1H2",
            "InChI=1S/CH4/h1H4\r\n",
            "InChI=1S/CH4/h1H4InChI=1S/H2O/h1H2",
        ] {
            let inchi = parse(text).unwrap_or_else(|e| panic!("{text:?}: {e}"));
            assert_eq!(mobile(&inchi).components.len(), 1);
            assert_eq!(mobile(&inchi).components[0].formula, "CH4");
        }
    }

    #[test]
    fn failing_component_is_recorded() {
        let mut parser = InchiParser::default();
        let err = parser
            .parse("InChI=1S/C2H6O.H2O/c1-2-3;1-3/h3H,2H2,1H3;1H2")
            .unwrap_err();
        assert_eq!(err.state, LayerState::Connections);
        assert_eq!(parser.state().component, 1);
    }

    #[test]
    fn atom_limit() {
        let mut parser = InchiParser::new(ReadOptions {
            max_atoms: 3,
            ..ReadOptions::default()
        });
        let err = parser.parse("InChI=1S/C4H10/c1-3-4-2/h3-4H2,1-2H3").unwrap_err();
        assert_eq!(err.fault, Fault::TooManyAtoms(4));
    }
}
