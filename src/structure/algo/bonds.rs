use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::Element;

/// Decides whether two atoms are bonded, given their squared distance in Angstrom^2.
///
/// Implemented for closures, so a one-off cutoff can be written inline:
///
/// ```
/// # use xtal_structure::{BondPredicate, Element};
/// let cutoff = |_: Element, _: Element, d2: f64| d2 < 1.6 * 1.6;
/// assert!(cutoff.is_bonded(Element::CARBON, Element::CARBON, 1.5 * 1.5));
/// ```
pub trait BondPredicate {
    fn is_bonded(&self, a: Element, b: Element, distance2: f64) -> bool;
}

impl<F> BondPredicate for F
where F: Fn(Element, Element, f64) -> bool,
{
    fn is_bonded(&self, a: Element, b: Element, distance2: f64) -> bool
    { self(a, b, distance2) }
}

/// Cutoff distances per pair of elements, with an optional fallback for unlisted pairs.
///
/// A pair is bonded when its distance is strictly below the cutoff.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondRanges {
    default: Option<f64>,
    // keys are sorted pairs
    pairs: HashMap<(Element, Element), f64>,
}

impl BondRanges {
    /// No pair is bonded.
    pub fn new() -> Self { Default::default() }

    /// Every pair is bonded below `radius`.
    pub fn uniform(radius: f64) -> Self
    { BondRanges { default: Some(radius), pairs: HashMap::new() } }

    /// Cutoff for a specific pair, in either order.
    pub fn with_pair(mut self, a: Element, b: Element, radius: f64) -> Self {
        self.set_pair(a, b, radius);
        self
    }

    pub fn set_pair(&mut self, a: Element, b: Element, radius: f64)
    { self.pairs.insert(sorted_pair(a, b), radius); }

    pub fn set_default(&mut self, radius: Option<f64>)
    { self.default = radius; }

    pub fn get_range(&self, a: Element, b: Element) -> Option<f64> {
        self.pairs.get(&sorted_pair(a, b)).cloned().or(self.default)
    }
}

impl BondPredicate for BondRanges {
    fn is_bonded(&self, a: Element, b: Element, distance2: f64) -> bool {
        match self.get_range(a, b) {
            Some(range) => distance2 < range * range,
            None => false,
        }
    }
}

fn sorted_pair(a: Element, b: Element) -> (Element, Element) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Symmetric table of bonds between atoms, indexed by atom.
#[derive(Clone, PartialEq, Eq)]
pub struct BondTable {
    neighbors: Vec<Vec<usize>>,
}

impl BondTable {
    pub fn new(num_atoms: usize) -> Self
    { BondTable { neighbors: vec![vec![]; num_atoms] } }

    pub fn num_atoms(&self) -> usize { self.neighbors.len() }

    /// Record a bond in both directions.  Adding a bond twice has no effect.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn add_bond(&mut self, a: usize, b: usize) {
        assert!(a < self.num_atoms() && b < self.num_atoms(), "bond {}-{} out of range", a, b);
        if !self.neighbors[a].contains(&b) {
            self.neighbors[a].push(b);
        }
        if !self.neighbors[b].contains(&a) {
            self.neighbors[b].push(a);
        }
    }

    pub fn are_bonded(&self, a: usize, b: usize) -> bool
    { self.neighbors.get(a).map_or(false, |list| list.contains(&b)) }

    /// Atoms bonded to `atom`, in the order the bonds were added.
    pub fn neighbors(&self, atom: usize) -> &[usize]
    { &self.neighbors[atom] }

    pub fn num_bonds(&self) -> usize {
        let ends: usize = self.neighbors.iter().map(|list| list.len()).sum();
        // self-bonds are stored once, everything else twice
        let loops = self.neighbors.iter().enumerate().filter(|&(i, list)| list.contains(&i)).count();
        (ends - loops) / 2 + loops
    }

    /// Partition the atoms into connected components.
    ///
    /// Each component is sorted, and the components are ordered by their
    /// smallest atom.  Unbonded atoms form components of their own.
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let mut vertex_sets = petgraph::unionfind::UnionFind::<usize>::new(self.num_atoms());
        for (a, list) in self.neighbors.iter().enumerate() {
            for &b in list {
                vertex_sets.union(a, b);
            }
        }

        // BTreeMap keyed by first member keeps the output order deterministic
        let mut by_root: HashMap<usize, usize> = HashMap::new();
        let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (atom, root) in vertex_sets.into_labeling().into_iter().enumerate() {
            let first = *by_root.entry(root).or_insert(atom);
            components.entry(first).or_insert_with(Vec::new).push(atom);
        }
        components.into_iter().map(|(_, members)| members).collect()
    }
}

impl fmt::Debug for BondTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for (a, neighbors) in self.neighbors.iter().enumerate() {
            for &b in neighbors {
                if a <= b {
                    list.entry(&(a, b));
                }
            }
        }
        list.finish()
    }
}
