use inchicrab::{
    parse_inchi, to_inchi, Encoding, Fault, Inchi, InchiParser, IsotopeDomain, ReadOptions,
    TautomerDomain, Variant,
};

const CORPUS: &[&str] = &[
    "InChI=1S/CH4/h1H4",
    "InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3",
    "InChI=1S/C2H4O2/c1-2(3)4/h1H3,(H,3,4)",
    "InChI=1S/C2H4O2/c1-2(3)4/h1H3,(H,3,4)/p-1",
    "InChI=1/C2H4O2/c1-2(3)4/h1H3,(H,3,4)/p-1/fC2H3O2/q-1",
    "InChI=1S/C3H6/c1-2-3-1/h1-3H2",
    "InChI=1S/C4H10O/c1-3-4(2)5/h4-5H,3H2,1-2H3/t4-/m0/s1",
    "InChI=1S/C4H10O/c1-3-4(2)5/h4-5H,3H2,1-2H3/t4-/m0/s1/i1D",
    "InChI=1S/CH4O/c1-2/h2H,1H3/i/hD",
    "InChI=1S/C2H6O.H2O/c1-2-3;/h3H,2H2,1H3;1H2",
    "InChI=1S/H/q+1",
    "InChI=1S/p+1",
    "InChI=1/2CH2O2.Zn/c2*2-1-3;/h2*1H,(H,2,3);/q;;+2/p-2/rC2H2O4Zn/c3-1-5-7-6-2-4/h1-2H",
];

fn parse(text: &str) -> Inchi {
    parse_inchi(text).unwrap_or_else(|e| panic!("{text}: {e}"))
}

/// `C{n}H{2n+2}` as a canonical straight chain: odd atoms up, even atoms back.
fn alkane(n: u32) -> String {
    let up = (1..=n).step_by(2);
    let down = (2..=n).rev().filter(|a| a % 2 == 0);
    let chain: Vec<String> = up.chain(down).map(|a| a.to_string()).collect();
    format!(
        "InChI=1S/C{n}H{}/c{}/h3-{n}H2,1-2H3",
        2 * n + 2,
        chain.join("-")
    )
}

#[test]
fn decimal_round_trip() {
    for text in CORPUS {
        let inchi = parse(text);
        let written = to_inchi(&inchi, Encoding::Decimal);
        let again = parse(&written);
        assert_eq!(again.records, inchi.records, "{text} -> {written}");
    }
}

#[test]
fn alphabetic_round_trip() {
    for text in CORPUS {
        let inchi = parse(text);
        let written = to_inchi(&inchi, Encoding::Alphabetic);
        let again = parse(&written);
        assert_eq!(again.records, inchi.records, "{text} -> {written}");
    }
}

#[test]
fn writing_is_idempotent() {
    for text in CORPUS {
        let once = parse(text).to_string();
        let twice = parse(&once).to_string();
        assert_eq!(once, twice, "{text}");
    }
}

#[test]
fn long_chain_uses_multi_letter_numerals() {
    let text = alkane(30);
    let inchi = parse(&text);
    let written = to_inchi(&inchi, Encoding::Alphabetic);
    assert!(written.contains("A@"), "{written}");
    let again = parse(&written);
    assert_eq!(again.records, inchi.records);
}

#[test]
fn abbreviations_match_explicit_layers() {
    let pairs = [
        (
            "InChI=1/C4H10O/c1-3-4(2)5/h4-5H,3H2,1-2H3/t4-/m0/s1/fC4H10O/tm/m0",
            "InChI=1/C4H10O/c1-3-4(2)5/h4-5H,3H2,1-2H3/t4-/m0/s1/fC4H10O/t4-/m0",
        ),
        (
            "InChI=1S/C4H10O/c1-3-4(2)5/h4-5H,3H2,1-2H3/t4-/m0/s1/i1D/tn",
            "InChI=1S/C4H10O/c1-3-4(2)5/h4-5H,3H2,1-2H3/t4-/m0/s1/i1D/t4-",
        ),
    ];
    for (short, long) in pairs {
        assert_eq!(parse(short).records, parse(long).records, "{short}");
    }
}

#[test]
fn fixed_stereo_is_rebuilt_from_mobile() {
    let inchi = parse("InChI=1/C4H10O/c1-3-4(2)5/h4-5H,3H2,1-2H3/t4-/m0/s1/fC4H10O");
    let fixed = inchi
        .records
        .view(Variant::Disconnected, TautomerDomain::Fixed)
        .unwrap();
    let set = fixed.components[0].sp3(IsotopeDomain::NonIsotopic).unwrap();
    assert!(set.inherited);
    assert_eq!(set.descriptors.len(), 1);
}

#[test]
fn hydrogen_changes_break_the_balance() {
    let perturbed = [
        "InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H2",
        "InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3,3H",
        "InChI=1S/C2H4O2/c1-2(3)4/h1H3,(H2,3,4)",
        "InChI=1/C2H4O2/c1-2(3)4/h1H3,(H,3,4)/p-1/fC2H3O2",
    ];
    for text in perturbed {
        assert!(parse_inchi(text).is_err(), "{text} should not parse");
    }
}

#[test]
fn atom_limit_boundary() {
    let mut parser = InchiParser::new(ReadOptions {
        max_atoms: 3,
        ..ReadOptions::default()
    });
    assert!(parser.parse("InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3").is_ok());
    let err = parser.parse(&alkane(4)).unwrap_err();
    assert_eq!(err.fault, Fault::TooManyAtoms(4));
}

#[test]
fn component_count_boundary() {
    assert!(parse_inchi("InChI=1S/C2H6O.H2O/c1-2-3;/h3H,2H2,1H3;1H2/q;;+1").is_err());
    assert!(parse_inchi("InChI=1S/C2H6O.H2O/c1-2-3;;/h3H,2H2,1H3;1H2").is_err());
}
