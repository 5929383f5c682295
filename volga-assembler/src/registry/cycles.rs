//! Static cycle analysis of a frozen registry

use super::{Lookup, Registry};
use crate::types::{KeyMap, TypeKey};
use std::{
    collections::{HashMap, HashSet},
    hash::{BuildHasher, Hash}
};

/// Returns every registered type that lies on a dependency cycle,
/// i.e. can reach itself through the dependencies of its rules.
///
/// Edges follow the same lookup as assembly does, so a dependency on a capability
/// points to the single type implementing it. Dependencies that cannot be looked up
/// have no edge, since assembling them fails before anything else is visited.
pub(crate) fn cyclic_types(registry: &Registry) -> HashSet<TypeKey> {
    let graph: KeyMap<Vec<TypeKey>> = registry
        .rules()
        .map(|rule| {
            let edges = rule
                .dependencies()
                .filter_map(|dependency| match registry.lookup(dependency) {
                    Ok(Lookup::Exact(rule)) | Ok(Lookup::Capability(rule, _)) => Some(rule.target),
                    Err(_) => None,
                })
                .collect();
            (rule.target, edges)
        })
        .collect();

    cyclic_nodes(&graph)
}

/// Returns the nodes of `graph` that lie on a cycle
fn cyclic_nodes<N, S>(graph: &HashMap<N, Vec<N>, S>) -> HashSet<N>
where
    N: Copy + Eq + Hash,
    S: BuildHasher
{
    let mut tarjan = Tarjan::new(graph);
    for node in graph.keys() {
        if !tarjan.indices.contains_key(node) {
            tarjan.connect(*node);
        }
    }
    tarjan.cyclic
}

/// Tarjan's strongly connected components
struct Tarjan<'a, N, S> {
    graph: &'a HashMap<N, Vec<N>, S>,
    index: usize,
    indices: HashMap<N, usize>,
    low_links: HashMap<N, usize>,
    stack: Vec<N>,
    on_stack: HashSet<N>,
    cyclic: HashSet<N>,
}

impl<'a, N, S> Tarjan<'a, N, S>
where
    N: Copy + Eq + Hash,
    S: BuildHasher
{
    fn new(graph: &'a HashMap<N, Vec<N>, S>) -> Self {
        Self {
            graph,
            index: 0,
            indices: HashMap::new(),
            low_links: HashMap::new(),
            stack: Vec::new(),
            on_stack: HashSet::new(),
            cyclic: HashSet::new(),
        }
    }

    /// Visits everything reachable from `root` with an explicit stack of
    /// `(node, next edge)` frames, so long dependency chains do not grow the call stack
    fn connect(&mut self, root: N) {
        let graph = self.graph;
        let mut frames = vec![(root, 0usize)];
        self.visit(root);

        while let Some((node, edge)) = frames.last_mut() {
            let node = *node;
            let edges = graph.get(&node).map(Vec::as_slice).unwrap_or_default();

            if let Some(next) = edges.get(*edge) {
                *edge += 1;
                if !self.indices.contains_key(next) {
                    self.visit(*next);
                    frames.push((*next, 0));
                } else if self.on_stack.contains(next) {
                    let low = self.low_links[&node].min(self.indices[next]);
                    self.low_links.insert(node, low);
                }
                continue;
            }

            frames.pop();
            if let Some((parent, _)) = frames.last() {
                let low = self.low_links[parent].min(self.low_links[&node]);
                self.low_links.insert(*parent, low);
            }
            if self.low_links[&node] == self.indices[&node] {
                self.collect(node, edges);
            }
        }
    }

    fn visit(&mut self, node: N) {
        self.indices.insert(node, self.index);
        self.low_links.insert(node, self.index);
        self.index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);
    }

    /// Pops the component rooted at `node` and keeps it if it is a cycle
    fn collect(&mut self, node: N, edges: &[N]) {
        let mut component = Vec::new();
        while let Some(member) = self.stack.pop() {
            self.on_stack.remove(&member);
            component.push(member);
            if member == node {
                break;
            }
        }

        if component.len() > 1 || edges.contains(&node) {
            self.cyclic.extend(component);
        }
    }
}
