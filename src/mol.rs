use petgraph::algo::connected_components;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};

/// Undirected molecular skeleton over a petgraph graph.
///
/// Built from a component's connection table; node `i` is canonical atom
/// `i + 1`.
pub struct Mol<A, B> {
    graph: UnGraph<A, B>,
}

impl<A, B> Mol<A, B> {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
        }
    }

    pub fn graph(&self) -> &UnGraph<A, B> {
        &self.graph
    }

    pub fn atom(&self, idx: NodeIndex) -> &A {
        &self.graph[idx]
    }

    /// Node of the 1-based canonical atom number, if present.
    pub fn canonical(&self, atom: u32) -> Option<NodeIndex> {
        let idx = NodeIndex::new(atom.checked_sub(1)? as usize);
        (idx.index() < self.atom_count()).then_some(idx)
    }

    pub fn add_atom(&mut self, atom: A) -> NodeIndex {
        self.graph.add_node(atom)
    }

    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: B) -> EdgeIndex {
        self.graph.add_edge(a, b, bond)
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    /// Number of connected pieces; an empty skeleton has none.
    pub fn fragment_count(&self) -> usize {
        connected_components(&self.graph)
    }

    pub fn is_connected(&self) -> bool {
        self.fragment_count() <= 1
    }
}

impl<A, B> Default for Mol<A, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: std::fmt::Debug, B: std::fmt::Debug> std::fmt::Debug for Mol<A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mol")
            .field("atom_count", &self.atom_count())
            .field("bond_count", &self.bond_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments() {
        let mut mol = Mol::<u8, ()>::new();
        let a = mol.add_atom(6);
        let b = mol.add_atom(6);
        let c = mol.add_atom(8);
        mol.add_bond(a, b, ());
        assert_eq!(mol.fragment_count(), 2);
        assert!(!mol.is_connected());
        mol.add_bond(b, c, ());
        assert!(mol.is_connected());
        assert!(mol.bond_between(c, b).is_some());
    }

    #[test]
    fn canonical_lookup() {
        let mut mol = Mol::<u8, ()>::new();
        mol.add_atom(6);
        assert_eq!(mol.canonical(1), Some(NodeIndex::new(0)));
        assert_eq!(mol.canonical(0), None);
        assert_eq!(mol.canonical(2), None);
    }

    #[test]
    fn empty_is_connected() {
        let mol = Mol::<u8, ()>::new();
        assert!(mol.is_connected());
        assert_eq!(mol.neighbors(NodeIndex::new(0)).count(), 0);
    }
}
