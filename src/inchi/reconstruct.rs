//! Cross-layer reconstruction.
//!
//! Fills data an identifier leaves out because another view already holds
//! it. Only empty fields are written, so running the pass twice changes
//! nothing the second time. Per variant the steps are:
//!
//! 0. fixed-H placeholders for bare protons the fixed-H view dropped;
//! 1. fixed-H stereo from mobile-H stereo;
//! 2. isotopic mobile-H stereo from non-isotopic mobile-H stereo;
//! 3. isotopic fixed-H stereo from non-isotopic fixed-H stereo, else from
//!    isotopic mobile-H stereo;
//! 4. a trivial connection table for single-atom components;
//! 5. fixed-H charges from mobile-H charges;
//!
//! followed by the fixed-H skeleton, hydrogens and isotopic atoms, and a
//! canonical inversion flag for relative or racemic stereo.

use log::debug;

use crate::inchi::error::Fault;
use crate::record::{
    ComponentRecord, ConnectionTable, Inversion, IsotopeDomain, RecordSet, StereoDescriptorSet,
    Variant, View,
};

const NON_ISO: usize = 0;
const ISO: usize = 1;

pub fn reconstruct(records: &mut RecordSet) -> Result<(), Fault> {
    for variant in Variant::ALL {
        let (mobile, fixed) = records.pair_mut(variant);
        let Some(mobile) = mobile else {
            if fixed.is_some() {
                return Err(Fault::Internal("fixed-H view without mobile-H view"));
            }
            continue;
        };
        let mut fixed = fixed;
        let fixed_had_isotopic = fixed.as_ref().is_some_and(|f| f.isotopic);

        if let Some(fixed) = fixed.as_deref_mut() {
            add_deleted_placeholders(mobile, fixed);
        }

        // 1
        if let Some(fixed) = fixed.as_deref_mut() {
            for (f, m) in pairs(mobile, fixed) {
                let (src, dst) = (&mobile.components[m], &mut fixed.components[f]);
                inherit(&mut dst.sp2[NON_ISO], src.sp2[NON_ISO].as_ref());
                inherit(&mut dst.sp3[NON_ISO], src.sp3[NON_ISO].as_ref());
            }
        }

        // 2
        if mobile.isotopic {
            for c in &mut mobile.components {
                let sp2 = c.sp2[NON_ISO].clone();
                let sp3 = c.sp3[NON_ISO].clone();
                inherit(&mut c.sp2[ISO], sp2.as_ref());
                inherit(&mut c.sp3[ISO], sp3.as_ref());
            }
        }

        // 3
        if let Some(fixed) = fixed.as_deref_mut() {
            if fixed.isotopic || mobile.isotopic {
                fixed.isotopic = true;
                for (f, m) in pairs(mobile, fixed) {
                    let counterpart = &mobile.components[m];
                    let dst = &mut fixed.components[f];
                    let sp2 = dst.sp2[NON_ISO].clone().or_else(|| counterpart.sp2[ISO].clone());
                    let sp3 = dst.sp3[NON_ISO].clone().or_else(|| counterpart.sp3[ISO].clone());
                    inherit(&mut dst.sp2[ISO], sp2.as_ref());
                    inherit(&mut dst.sp3[ISO], sp3.as_ref());
                }
            }
        }

        // 4
        trivial_connections(mobile);
        if let Some(fixed) = fixed.as_deref_mut() {
            trivial_connections(fixed);
        }

        // 5
        if let Some(fixed) = fixed.as_deref_mut() {
            for (f, m) in pairs(mobile, fixed) {
                let dst = &mut fixed.components[f];
                if !dst.charge.is_set() && mobile.components[m].charge.is_set() {
                    debug!("fixed-H component {} takes mobile-H charge", f + 1);
                    dst.charge = mobile.components[m].charge;
                }
            }
        }

        for c in &mut mobile.components {
            if c.hydrogens.is_none() {
                c.hydrogens = Some(vec![0; c.atom_count()]);
            }
        }
        if let Some(fixed) = fixed.as_deref_mut() {
            fixed_skeleton(mobile, fixed, fixed_had_isotopic);
        }

        canonical_inversion(mobile);
        if let Some(fixed) = fixed.as_deref_mut() {
            canonical_inversion(fixed);
        }
    }
    Ok(())
}

/// `(fixed index, mobile index)` for every fixed-H component that has a
/// mobile-H counterpart.
fn pairs(mobile: &View, fixed: &View) -> Vec<(usize, usize)> {
    fixed
        .counterpart_map()
        .into_iter()
        .enumerate()
        .filter(|&(_, m)| m < mobile.components.len())
        .collect()
}

/// Copy `src` into an empty `dst`; a `dst` with its own centers but no
/// inversion flag borrows the flag from `src`.
pub(crate) fn inherit<D: Clone>(
    dst: &mut Option<StereoDescriptorSet<D>>,
    src: Option<&StereoDescriptorSet<D>>,
) {
    let Some(src) = src else {
        return;
    };
    match dst {
        None => {
            let mut set = src.clone();
            set.inherited = true;
            *dst = Some(set);
        }
        Some(set) if !set.descriptors.is_empty() => {
            if set.inversion == Inversion::Unset && src.inversion != Inversion::Unset {
                set.inversion = src.inversion;
                set.trivial_inversion = true;
            }
            if set.stereo_type.is_none() {
                set.stereo_type = src.stereo_type;
            }
        }
        Some(_) => {}
    }
}

/// Descriptors of `src` as a fresh set of their own, for abbreviations.
pub(crate) fn copy_descriptors<D: Clone>(src: &StereoDescriptorSet<D>) -> StereoDescriptorSet<D> {
    StereoDescriptorSet::new(src.descriptors.clone())
}

fn add_deleted_placeholders(mobile: &View, fixed: &mut View) {
    if fixed.components.len() >= mobile.components.len() {
        return;
    }
    let mut matched = vec![false; mobile.components.len()];
    for (_, m) in pairs(mobile, fixed) {
        matched[m] = true;
    }
    let unmatched: Vec<usize> = (0..matched.len()).filter(|&i| !matched[i]).collect();
    if !unmatched
        .iter()
        .all(|&i| mobile.components[i].is_bare_proton())
    {
        return;
    }
    for i in unmatched {
        debug!("deleted fixed-H placeholder for mobile-H component {}", i + 1);
        let mut placeholder = mobile.components[i].clone();
        placeholder.deleted = true;
        if placeholder.connections.is_none() {
            placeholder.connections = Some(ConnectionTable::trivial());
        }
        fixed.components.push(placeholder);
    }
}

fn trivial_connections(view: &mut View) {
    for c in &mut view.components {
        if c.connections.is_none() && c.atom_count() == 1 {
            c.connections = Some(ConnectionTable::trivial());
        }
    }
}

fn fixed_skeleton(mobile: &View, fixed: &mut View, fixed_had_isotopic: bool) {
    let pairs = pairs(mobile, fixed);
    for (f, m) in pairs {
        let src: &ComponentRecord = &mobile.components[m];
        let dst = &mut fixed.components[f];
        let same_atoms = src.atoms == dst.atoms;
        if dst.connections.is_none() && same_atoms {
            dst.connections = src.connections.clone();
        }
        if dst.hydrogens.is_none() {
            dst.hydrogens = Some(match (&src.hydrogens, same_atoms) {
                (Some(h), true) => h.clone(),
                _ => vec![0; dst.atom_count()],
            });
        }
        if dst.fixed_hydrogens.is_none() {
            dst.fixed_hydrogens = Some(vec![0; dst.atom_count()]);
        }
        if !fixed_had_isotopic && dst.isotopic_atoms.is_none() && src.isotopic_atoms.is_some() {
            debug!("fixed-H component {} takes mobile-H isotopic atoms", f + 1);
            dst.isotopic_atoms = src.isotopic_atoms.clone();
        }
    }
    for c in &mut fixed.components {
        if c.hydrogens.is_none() {
            c.hydrogens = Some(vec![0; c.atom_count()]);
        }
        if c.fixed_hydrogens.is_none() {
            c.fixed_hydrogens = Some(vec![0; c.atom_count()]);
        }
    }
}

fn canonical_inversion(view: &mut View) {
    for c in &mut view.components {
        for iso in IsotopeDomain::ALL {
            if let Some(set) = &mut c.sp3[iso.index()] {
                if !set.descriptors.is_empty()
                    && set.inversion == Inversion::Unset
                    && set.stereo_type.is_some_and(|t| t.is_ambiguous())
                {
                    set.inversion = Inversion::Absolute;
                }
            }
        }
    }
}
