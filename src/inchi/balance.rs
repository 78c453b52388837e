//! Material-balance validation.
//!
//! Checks that every view accounts for the hydrogens its formula promises,
//! that mobile-H and fixed-H views describe the same heavy atoms with
//! hydrogen and charge moving together, and that the disconnected and
//! reconnected variants agree on heavy atoms and net charge. Aggregate
//! proton counts are split across components on the way.

use log::debug;

use crate::element::Element;
use crate::inchi::error::Fault;
use crate::options::ReadOptions;
use crate::record::{
    ComponentRecord, IsotopicHydrogens, ProtonBalance, ProtonCounts, ProtonDistribution,
    RecordSet, Resolution, TautomerDomain, Variant, View,
};

const PAIR: &str = "mobile-H/fixed-H";
const VARIANTS: &str = "disconnected/reconnected";

pub fn validate(records: &mut RecordSet, options: &ReadOptions) -> Result<(), Fault> {
    for variant in Variant::ALL {
        let (mobile, fixed) = records.pair_mut(variant);
        let Some(mobile) = mobile else {
            continue;
        };
        let fixed = fixed.as_deref();
        check_view(mobile, TautomerDomain::Mobile, options)?;
        let deltas = match fixed {
            Some(fixed) => {
                check_view(fixed, TautomerDomain::Fixed, options)?;
                Some(pair_deltas(mobile, fixed)?)
            }
            None => None,
        };
        let distribution = distribute(mobile, deltas.as_deref())?;
        if distribution.resolution == Resolution::Ambiguous {
            debug!("{variant} proton distribution is ambiguous, kept the greedy one");
        }
        mobile.distribution = Some(distribution);
    }
    check_variants(records)
}

fn label(domain: TautomerDomain) -> &'static str {
    match domain {
        TautomerDomain::Mobile => "mobile-H",
        TautomerDomain::Fixed => "fixed-H",
    }
}

fn imbalance(views: &'static str, detail: String) -> Fault {
    Fault::Imbalance { views, detail }
}

fn check_view(view: &View, domain: TautomerDomain, options: &ReadOptions) -> Result<(), Fault> {
    let views = label(domain);
    for (i, c) in view.components.iter().enumerate().filter(|(_, c)| !c.deleted) {
        let n = i + 1;
        let expected = i64::from(c.formula_hydrogens) - i64::from(c.hydrogen_atoms());
        let extra = match domain {
            TautomerDomain::Mobile => c.group_hydrogens(),
            TautomerDomain::Fixed => c
                .fixed_hydrogens
                .as_ref()
                .map_or(0, |h| h.iter().map(|&x| u32::from(x)).sum()),
        };
        let found = i64::from(c.attached_hydrogens()) + i64::from(extra);
        if expected != found {
            return Err(imbalance(
                views,
                format!("component {n} formula has {expected} hydrogens, layers place {found}"),
            ));
        }
        for group in c.tautomeric_groups.iter().flatten() {
            if group.negative_charges as usize > group.atoms.len() {
                return Err(imbalance(
                    views,
                    format!(
                        "component {n} group carries {} negative charges on {} atoms",
                        group.negative_charges,
                        group.atoms.len()
                    ),
                ));
            }
        }
        for atom in c.isotopic_atoms.iter().flatten() {
            let available =
                u32::from(c.hydrogens_on(atom.atom)) + u32::from(c.fixed_hydrogens_on(atom.atom));
            if atom.hydrogens.total() > available {
                return Err(imbalance(
                    views,
                    format!(
                        "component {n} atom {} has {available} hydrogens, {} isotopic",
                        atom.atom,
                        atom.hydrogens.total()
                    ),
                ));
            }
        }
        let labelled = c.isotopic_atoms.iter().flatten().any(|a| a.mass_shift.is_some());
        if labelled {
            check_mass_numbers(c, n)?;
        }
        if options.validate_connectivity && c.atom_count() > 1 && !c.skeleton().is_connected() {
            return Err(Fault::Disconnected(n));
        }
    }
    Ok(())
}

/// A mass shift may not take an atom below its own proton count.
fn check_mass_numbers(c: &ComponentRecord, n: usize) -> Result<(), Fault> {
    let skeleton = c.skeleton();
    for (i, idx) in skeleton.atoms().enumerate() {
        let atom = skeleton.atom(idx);
        if let Some(mass) = atom.mass_number() {
            if mass < u16::from(atom.element.atomic_num()) {
                return Err(Fault::MassNumber {
                    component: n,
                    atom: i as u32 + 1,
                    mass,
                });
            }
        }
    }
    Ok(())
}

fn sorted_heavy(c: &ComponentRecord) -> Vec<(Element, u32)> {
    let mut counts = c.heavy_atom_counts();
    counts.sort_by_key(|(e, _)| e.atomic_num());
    counts
}

/// Hydrogen change from each mobile-H component to its fixed-H
/// counterpart, indexed by mobile-H component.
fn pair_deltas(mobile: &View, fixed: &View) -> Result<Vec<i32>, Fault> {
    let mut deltas = vec![0i32; mobile.components.len()];
    let mut matched = vec![false; mobile.components.len()];
    for (f, m) in fixed.counterpart_map().into_iter().enumerate() {
        let fc = &fixed.components[f];
        let Some(mc) = mobile.components.get(m) else {
            return Err(imbalance(
                PAIR,
                format!("fixed-H component {} has no mobile-H counterpart", f + 1),
            ));
        };
        matched[m] = true;
        if fc.deleted {
            continue;
        }
        if sorted_heavy(fc) != sorted_heavy(mc) {
            return Err(imbalance(
                PAIR,
                format!("component {} heavy atoms differ", f + 1),
            ));
        }
        let dh = i64::from(fc.formula_hydrogens) - i64::from(mc.formula_hydrogens);
        let dq = i64::from(fc.charge.value()) - i64::from(mc.charge.value());
        if dh != dq {
            return Err(imbalance(
                PAIR,
                format!("component {} gains {dh} hydrogens but {dq} charge", f + 1),
            ));
        }
        deltas[m] = dh as i32;
    }
    if let Some(m) = matched.iter().position(|&seen| !seen) {
        return Err(imbalance(
            PAIR,
            format!("mobile-H component {} has no fixed-H counterpart", m + 1),
        ));
    }
    Ok(deltas)
}

/// Hydrogens a component can give up: tautomeric-group hydrogens plus
/// hydrogens on heteroatoms.
fn removable(c: &ComponentRecord) -> u32 {
    let on_heteroatoms: u32 = c
        .atoms
        .iter()
        .enumerate()
        .filter(|(_, e)| e.has_exchangeable_h())
        .map(|(i, _)| u32::from(c.hydrogens_on(i as u32 + 1)))
        .sum();
    c.group_hydrogens() + on_heteroatoms
}

/// Atoms a component can place an added proton on.
fn acceptors(c: &ComponentRecord) -> u32 {
    c.atoms.iter().filter(|e| e.has_exchangeable_h()).count() as u32
}

/// Fill `capacity` front to back with `demand`; `None` if it does not fit.
fn greedy(capacity: &[u32], demand: u32) -> Option<(Vec<u32>, Resolution)> {
    let total: u64 = capacity.iter().map(|&c| u64::from(c)).sum();
    if u64::from(demand) > total {
        return None;
    }
    let mut left = demand;
    let take = capacity
        .iter()
        .map(|&c| {
            let t = c.min(left);
            left -= t;
            t
        })
        .collect();
    let holders = capacity.iter().filter(|&&c| c > 0).count();
    let resolution = if demand > 0 && u64::from(demand) < total && holders >= 2 {
        Resolution::Ambiguous
    } else {
        Resolution::Unambiguous
    };
    Some((take, resolution))
}

fn distribute(mobile: &View, deltas: Option<&[i32]>) -> Result<ProtonDistribution, Fault> {
    let n = mobile.components.len();
    let (protons, mut resolution) = match (&mobile.protons, deltas) {
        (balance, Some(deltas)) => {
            check_deltas(balance.as_ref(), deltas)?;
            (deltas.to_vec(), Resolution::Unambiguous)
        }
        (Some(ProtonBalance::PerComponent(list)), None) => {
            let mut protons: Vec<i32> = list.iter().map(|c| c.protons).collect();
            protons.resize(n, 0);
            (protons, Resolution::Unambiguous)
        }
        (Some(ProtonBalance::Aggregate(counts)), None) => greedy_protons(mobile, counts.protons)?,
        (None, None) => (vec![0; n], Resolution::Unambiguous),
    };

    let exchangeable = match &mobile.protons {
        Some(ProtonBalance::PerComponent(list)) => {
            let mut out: Vec<IsotopicHydrogens> = list.iter().map(|c| c.exchangeable).collect();
            out.resize(n, IsotopicHydrogens::default());
            out
        }
        Some(ProtonBalance::Aggregate(counts)) => {
            let (out, r) = greedy_exchange(mobile, &protons, counts.exchangeable)?;
            if r == Resolution::Ambiguous {
                resolution = r;
            }
            out
        }
        None => vec![IsotopicHydrogens::default(); n],
    };

    Ok(ProtonDistribution {
        per_component: protons
            .into_iter()
            .zip(exchangeable)
            .map(|(protons, exchangeable)| ProtonCounts {
                protons,
                exchangeable,
            })
            .collect(),
        resolution,
    })
}

/// With a fixed-H view the hydrogen differences must match `/p`.
fn check_deltas(balance: Option<&ProtonBalance>, deltas: &[i32]) -> Result<(), Fault> {
    let moved: i64 = deltas.iter().map(|&d| i64::from(d)).sum();
    match balance {
        Some(ProtonBalance::PerComponent(list)) => {
            for (i, &d) in deltas.iter().enumerate() {
                let p = list.get(i).map_or(0, |c| c.protons);
                if d != p {
                    return Err(imbalance(
                        PAIR,
                        format!("component {} moves {d} protons, /p records {p}", i + 1),
                    ));
                }
            }
            Ok(())
        }
        other => {
            let p = other.map_or(0, |b| b.total().protons);
            if moved != i64::from(p) {
                return Err(imbalance(
                    PAIR,
                    format!("fixed-H layers move {moved} protons, /p records {p}"),
                ));
            }
            Ok(())
        }
    }
}

fn greedy_protons(mobile: &View, p: i32) -> Result<(Vec<i32>, Resolution), Fault> {
    let n = mobile.components.len();
    if p == 0 || (n == 0 && p > 0) {
        return Ok((vec![0; n], Resolution::Unambiguous));
    }
    let capacity: Vec<u32> = mobile
        .components
        .iter()
        .map(|c| if p < 0 { removable(c) } else { acceptors(c) })
        .collect();
    let (take, resolution) = greedy(&capacity, p.unsigned_abs()).ok_or_else(|| {
        imbalance(
            "mobile-H",
            format!("cannot place {p} protons on {n} components"),
        )
    })?;
    let sign = p.signum();
    Ok((take.into_iter().map(|t| sign * t as i32).collect(), resolution))
}

/// Spread exchangeable isotopic hydrogen over components, protium first,
/// then deuterium, then tritium.
fn greedy_exchange(
    mobile: &View,
    protons: &[i32],
    total: IsotopicHydrogens,
) -> Result<(Vec<IsotopicHydrogens>, Resolution), Fault> {
    let n = mobile.components.len();
    let mut capacity: Vec<u32> = mobile
        .components
        .iter()
        .zip(protons)
        .map(|(c, &p)| removable(c).saturating_sub(if p < 0 { p.unsigned_abs() } else { 0 }))
        .collect();
    let mut counts = vec![[0u32; 3]; n];
    let mut resolution = Resolution::Unambiguous;
    for (k, demand) in total.as_array().into_iter().enumerate() {
        let (take, r) = greedy(&capacity, demand).ok_or_else(|| {
            imbalance(
                "mobile-H",
                format!("{demand} exchangeable isotopic hydrogens do not fit"),
            )
        })?;
        if r == Resolution::Ambiguous {
            resolution = r;
        }
        for (i, t) in take.into_iter().enumerate() {
            capacity[i] -= t;
            counts[i][k] = t;
        }
    }
    Ok((
        counts.into_iter().map(IsotopicHydrogens::from_array).collect(),
        resolution,
    ))
}

fn heavy_totals(view: &View) -> Vec<(Element, u32)> {
    let mut totals: Vec<(Element, u32)> = Vec::new();
    for c in view.components.iter().filter(|c| !c.deleted) {
        for (e, n) in c.heavy_atom_counts() {
            match totals.iter_mut().find(|(x, _)| *x == e) {
                Some((_, m)) => *m += n,
                None => totals.push((e, n)),
            }
        }
    }
    totals.sort_by_key(|(e, _)| e.atomic_num());
    totals
}

fn net_charge(view: &View) -> i64 {
    let protons = view.protons.as_ref().map_or(0, |p| p.total().protons);
    i64::from(view.total_charge()) + i64::from(protons)
}

fn check_variants(records: &RecordSet) -> Result<(), Fault> {
    let (Some(d), Some(r)) = (
        records.view(Variant::Disconnected, TautomerDomain::Mobile),
        records.view(Variant::Reconnected, TautomerDomain::Mobile),
    ) else {
        return Ok(());
    };
    if heavy_totals(d) != heavy_totals(r) {
        return Err(imbalance(VARIANTS, "heavy atom totals differ".to_string()));
    }
    let (qd, qr) = (net_charge(d), net_charge(r));
    if qd != qr {
        return Err(imbalance(VARIANTS, format!("net charge {qd} against {qr}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inchi::parser::InchiParser;
    use crate::inchi::Inchi;

    fn parse(s: &str) -> Result<Inchi, Fault> {
        InchiParser::default().parse(s).map_err(|e| e.fault)
    }

    fn distribution(inchi: &Inchi) -> &ProtonDistribution {
        inchi
            .records
            .view(Variant::Disconnected, TautomerDomain::Mobile)
            .and_then(|v| v.distribution.as_ref())
            .unwrap()
    }

    fn is_imbalance(r: Result<Inchi, Fault>, between: &str) -> bool {
        matches!(r, Err(Fault::Imbalance { views, .. }) if views == between)
    }

    #[test]
    fn hydrogen_totals() {
        assert!(parse("InChI=1S/CH4/h1H4").is_ok());
        assert!(is_imbalance(parse("InChI=1S/CH4/h1H3"), "mobile-H"));
        assert!(is_imbalance(parse("InChI=1S/C2H6/c1-2/h1-2H2"), "mobile-H"));
    }

    #[test]
    fn group_charges_bounded_by_members() {
        assert!(parse("InChI=1S/C2H4O2/c1-2(3)4/h1H3,(H,3,4)").is_ok());
        assert!(is_imbalance(
            parse("InChI=1S/C2H4O2/c1-2(3)4/h1H3,(H-3,3,4)"),
            "mobile-H"
        ));
    }

    #[test]
    fn isotopic_hydrogen_bounded_by_atom() {
        assert!(parse("InChI=1S/CH4/h1H4/i1D2").is_ok());
        assert!(is_imbalance(parse("InChI=1S/CH4/h1H4/i1D5"), "mobile-H"));
    }

    #[test]
    fn single_component_protons() {
        let inchi = parse("InChI=1S/C2H4O2/c1-2(3)4/h1H3,(H,3,4)/p-1").unwrap();
        let d = distribution(&inchi);
        assert_eq!(d.per_component[0].protons, -1);
        assert_eq!(d.resolution, Resolution::Unambiguous);
    }

    #[test]
    fn ambiguous_protons_go_to_first_component() {
        let inchi = parse("InChI=1S/2C2H4O2/c2*1-2(3)4/h2*1H3,(H,3,4)/p-1").unwrap();
        let d = distribution(&inchi);
        assert_eq!(d.resolution, Resolution::Ambiguous);
        let protons: Vec<i32> = d.per_component.iter().map(|c| c.protons).collect();
        assert_eq!(protons, vec![-1, 0]);
    }

    #[test]
    fn impossible_protons() {
        assert!(is_imbalance(parse("InChI=1S/CH4/h1H4/p-1"), "mobile-H"));
    }

    #[test]
    fn fixed_view_deltas() {
        assert!(parse("InChI=1/C2H4O2/c1-2(3)4/h1H3,(H,3,4)/p-1/fC2H3O2/q-1").is_ok());
        assert!(is_imbalance(
            parse("InChI=1/C2H4O2/c1-2(3)4/h1H3,(H,3,4)/p-1/fC2H3O2/q-2"),
            PAIR
        ));
        assert!(is_imbalance(
            parse("InChI=1/C2H4O2/c1-2(3)4/h1H3,(H,3,4)/fC2H3O2/q-1"),
            PAIR
        ));
    }

    #[test]
    fn exchangeable_isotopes() {
        let inchi = parse("InChI=1S/CH4O/c1-2/h2H,1H3/i/hD").unwrap();
        assert_eq!(distribution(&inchi).per_component[0].exchangeable.deuterium, 1);
        assert!(is_imbalance(
            parse("InChI=1S/CH4O/c1-2/h2H,1H3/i/hD2"),
            "mobile-H"
        ));
    }

    #[test]
    fn variants_agree() {
        let base = concat!(
            "InChI=1/2CH2O2.Zn/c2*2-1-3;/h2*1H,(H,2,3);/q;;+2/p-2",
            "/rC2H2O4Zn/c3-1-5-7-6-2-4/h1-2H"
        );
        assert!(parse(base).is_ok());
        assert!(is_imbalance(parse(&format!("{base}/q+1")), VARIANTS));
    }

    #[test]
    fn hydrogen_halides_give_up_protons() {
        for text in [
            "InChI=1S/ClH/h1H/p-1",
            "InChI=1S/FH/h1H/p-1",
            "InChI=1S/BrH.K/h1H;/q;+1/p-1",
        ] {
            assert!(parse(text).is_ok(), "{text}");
        }
        let inchi = parse("InChI=1S/ClH.Na/h1H;/q;+1/p-1").unwrap();
        let d = distribution(&inchi);
        let protons: Vec<i32> = d.per_component.iter().map(|c| c.protons).collect();
        assert_eq!(protons, vec![-1, 0]);
        assert_eq!(d.resolution, Resolution::Unambiguous);
    }

    #[test]
    fn fixed_view_with_other_heavy_atoms() {
        let mut parser = InchiParser::new(ReadOptions {
            validate_connectivity: false,
            ..ReadOptions::default()
        });
        let err = parser
            .parse("InChI=1/C2H4O2/c1-2(3)4/h1H3,(H,3,4)/fC2H4OS/h1H3,3H")
            .unwrap_err();
        assert!(matches!(err.fault, Fault::Imbalance { views, .. } if views == PAIR));
    }

    #[test]
    fn reconnected_view_with_other_heavy_atoms() {
        assert!(is_imbalance(
            parse("InChI=1/CH4/h1H4/rCH3Cl/c1-2/h1H3"),
            VARIANTS
        ));
    }

    #[test]
    fn mass_numbers_stay_above_atomic_numbers() {
        assert!(parse("InChI=1S/CH4/h1H4/i1-6").is_ok());
        assert_eq!(
            parse("InChI=1S/CH4/h1H4/i1-7").unwrap_err(),
            Fault::MassNumber {
                component: 1,
                atom: 1,
                mass: 5
            }
        );
    }

    #[test]
    fn connectivity_can_be_skipped() {
        let text = "InChI=1S/CH4N/h1H4/q+1";
        assert_eq!(parse(text).unwrap_err(), Fault::Disconnected(1));
        let mut parser = InchiParser::new(ReadOptions {
            validate_connectivity: false,
            ..ReadOptions::default()
        });
        assert!(parser.parse(text).is_ok());
    }
}
