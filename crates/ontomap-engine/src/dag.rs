//! Equivalence DAGs over ontology entities.
//!
//! An external classifier groups logically equivalent entities into nodes
//! and orders the nodes by subsumption; the saturator only consumes the
//! result. `sub(node)` — every node transitively subsumed by it, itself
//! included — is precomputed at construction, since saturation queries it
//! once per representative.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equivalences<T> {
    representative: T,
    members: Vec<T>,
}

impl<T> Equivalences<T> {
    /// `representative` must be listed among `members`.
    pub fn new(representative: T, members: Vec<T>) -> Self
    where
        T: PartialEq,
    {
        debug_assert!(members.contains(&representative));
        Equivalences {
            representative,
            members,
        }
    }

    pub fn singleton(entity: T) -> Self
    where
        T: Clone,
    {
        Equivalences {
            members: vec![entity.clone()],
            representative: entity,
        }
    }

    pub fn representative(&self) -> &T {
        &self.representative
    }

    pub fn members(&self) -> &[T] {
        &self.members
    }
}

#[derive(Debug, Clone)]
pub struct EquivalencesDag<T> {
    nodes: Vec<Equivalences<T>>,
    /// For each node, the indices of all transitively subsumed nodes,
    /// the node itself first.
    sub: Vec<Vec<usize>>,
}

impl<T> EquivalencesDag<T> {
    /// Builds the DAG from nodes and direct subsumption edges
    /// `(child, parent)`: node `child` is subsumed by node `parent`
    /// (indices into `nodes`).
    pub fn new(nodes: Vec<Equivalences<T>>, edges: &[(usize, usize)]) -> Self {
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for &(child, parent) in edges {
            children[parent].push(child);
        }

        fn collect(node: usize, children: &[Vec<usize>], seen: &mut Vec<bool>, out: &mut Vec<usize>) {
            if seen[node] {
                return;
            }
            seen[node] = true;
            out.push(node);
            for &c in &children[node] {
                collect(c, children, seen, out);
            }
        }

        let sub = (0..nodes.len())
            .map(|i| {
                let mut seen = vec![false; nodes.len()];
                let mut out = Vec::new();
                collect(i, &children, &mut seen, &mut out);
                out
            })
            .collect();

        EquivalencesDag { nodes, sub }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Equivalences<T>> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes transitively subsumed by `node` (by index), including
    /// itself.
    pub fn sub(&self, node: usize) -> impl Iterator<Item = &Equivalences<T>> {
        self.sub[node].iter().map(|&i| &self.nodes[i])
    }

    pub fn node(&self, index: usize) -> &Equivalences<T> {
        &self.nodes[index]
    }
}

impl<T> Default for EquivalencesDag<T> {
    fn default() -> Self {
        EquivalencesDag {
            nodes: Vec::new(),
            sub: Vec::new(),
        }
    }
}
