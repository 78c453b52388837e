use serde::Deserialize;

use inchicrab::{parse_inchi, TautomerDomain, Variant, View};

#[derive(Deserialize)]
struct InchiEntry {
    inchi: String,
    #[serde(default)]
    formula: Option<String>,
    #[serde(default)]
    atoms: Option<usize>,
    #[serde(default)]
    bonds: Option<usize>,
    #[serde(default)]
    charge: Option<i32>,
    #[serde(default)]
    protons: Option<i32>,
    /// Expected error kind, for entries that must not parse.
    #[serde(default)]
    error: Option<String>,
    /// Layer the error is reported in.
    #[serde(default)]
    layer: Option<String>,
}

fn mobile(inchi: &inchicrab::Inchi) -> &View {
    inchi
        .records
        .view(Variant::Disconnected, TautomerDomain::Mobile)
        .expect("mobile-H view")
}

#[test]
fn approval_inchi() {
    let data: Vec<InchiEntry> =
        serde_json::from_str(include_str!("approval_data/inchi.json")).unwrap();

    let mut failures = Vec::new();
    for entry in &data {
        let result = parse_inchi(&entry.inchi);

        if let Some(kind) = &entry.error {
            match result {
                Ok(_) => failures.push(format!("[error] {}: parsed, expected {kind}", entry.inchi)),
                Err(e) => {
                    if &format!("{:?}", e.kind) != kind {
                        failures.push(format!(
                            "[error] {}: expected {kind}, got {:?} ({e})",
                            entry.inchi, e.kind
                        ));
                    }
                    if let Some(layer) = &entry.layer {
                        if e.state.name() != layer {
                            failures.push(format!(
                                "[layer] {}: expected {layer:?}, got {:?}",
                                entry.inchi,
                                e.state.name()
                            ));
                        }
                    }
                }
            }
            continue;
        }

        let inchi = match result {
            Ok(i) => i,
            Err(e) => {
                failures.push(format!("[parse] {}: {e}", entry.inchi));
                continue;
            }
        };
        let view = mobile(&inchi);

        if let Some(formula) = &entry.formula {
            let got: Vec<&str> = view.components.iter().map(|c| c.formula.as_str()).collect();
            let got = got.join(".");
            if &got != formula {
                failures.push(format!(
                    "[formula] {}: expected {formula:?}, got {got:?}",
                    entry.inchi
                ));
            }
        }
        if let Some(atoms) = entry.atoms {
            if view.atom_total() != atoms {
                failures.push(format!(
                    "[atoms] {}: expected {atoms}, got {}",
                    entry.inchi,
                    view.atom_total()
                ));
            }
        }
        if let Some(bonds) = entry.bonds {
            let got: usize = view
                .components
                .iter()
                .filter_map(|c| c.connections.as_ref())
                .map(|ct| ct.bond_count())
                .sum();
            if got != bonds {
                failures.push(format!("[bonds] {}: expected {bonds}, got {got}", entry.inchi));
            }
        }
        if let Some(charge) = entry.charge {
            if view.total_charge() != charge {
                failures.push(format!(
                    "[charge] {}: expected {charge}, got {}",
                    entry.inchi,
                    view.total_charge()
                ));
            }
        }
        if let Some(protons) = entry.protons {
            let got = view.protons.as_ref().map_or(0, |p| p.total().protons);
            if got != protons {
                failures.push(format!(
                    "[protons] {}: expected {protons}, got {got}",
                    entry.inchi
                ));
            }
        }
    }

    if !failures.is_empty() {
        panic!(
            "{} approval failures:\n{}",
            failures.len(),
            failures.join("\n")
        );
    }
}
