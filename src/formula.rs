//! Hill-system formulas of single components.
//!
//! [`Formula`] keeps element counts in Hill order, writes them back out as
//! a Hill string and expands them into the canonical atom list an InChI
//! numbers its atoms by.

use std::fmt::{self, Write};

use crate::element::{hill_cmp, Element};

/// Element counts of one component, kept in Hill order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Formula {
    counts: Vec<(Element, u32)>,
}

impl Formula {
    /// Build from arbitrary counts; zero counts are dropped and repeated
    /// elements merged.
    pub fn from_counts(counts: impl IntoIterator<Item = (Element, u32)>) -> Self {
        let mut merged: Vec<(Element, u32)> = Vec::new();
        for (e, n) in counts {
            if n == 0 {
                continue;
            }
            match merged.iter_mut().find(|(x, _)| *x == e) {
                Some((_, m)) => *m += n,
                None => merged.push((e, n)),
            }
        }
        let has_carbon = merged.iter().any(|(e, _)| *e == Element::C);
        merged.sort_by(|a, b| hill_cmp(a.0, b.0, has_carbon));
        Self { counts: merged }
    }

    pub fn counts(&self) -> &[(Element, u32)] {
        &self.counts
    }

    pub fn count(&self, element: Element) -> u32 {
        self.counts
            .iter()
            .find(|(e, _)| *e == element)
            .map_or(0, |(_, n)| *n)
    }

    pub fn hydrogens(&self) -> u32 {
        self.count(Element::H)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Whether hydrogen is the only element.
    pub fn is_hydrogen_only(&self) -> bool {
        !self.counts.is_empty() && self.counts.iter().all(|(e, _)| e.is_hydrogen())
    }

    /// Canonical atom list: non-hydrogen atoms in Hill order.
    ///
    /// A hydrogen-only formula keeps a single H as its atom; the remaining
    /// hydrogens are attached to it.
    pub fn canonical_atoms(&self) -> Vec<Element> {
        if self.is_hydrogen_only() {
            return vec![Element::H];
        }
        self.counts
            .iter()
            .filter(|(e, _)| !e.is_hydrogen())
            .flat_map(|&(e, n)| std::iter::repeat(e).take(n as usize))
            .collect()
    }

    /// Number of atoms [`canonical_atoms`](Self::canonical_atoms) yields.
    pub fn atom_count(&self) -> u32 {
        if self.is_hydrogen_only() {
            1
        } else {
            self.counts
                .iter()
                .filter(|(e, _)| !e.is_hydrogen())
                .map(|(_, n)| n)
                .sum()
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = String::new();
        for &(e, n) in &self.counts {
            append_element(&mut buf, e.symbol(), n);
        }
        f.write_str(&buf)
    }
}

fn append_element(buf: &mut String, symbol: &str, count: u32) {
    buf.push_str(symbol);
    if count > 1 {
        let _ = write!(buf, "{count}");
    }
}
