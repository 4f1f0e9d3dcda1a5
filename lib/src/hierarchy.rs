//! Traversal over the class hierarchy: ancestor chains, descendant sets, and
//! the properties available to a class as subject.
//!
//! The adjacency (a parent map plus a child digraph) is built once per query
//! batch from the ontology store rather than re-queried per node. Walks are
//! iterative and carry a visited set; source data is supposed to be a forest,
//! but a cycle fails loudly instead of looping forever.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};

use crate::errors::CatalogError;
use crate::ontology::{ClassId, OntologyStore, RdfProperty};

pub struct ClassHierarchy {
    parents: HashMap<ClassId, ClassId>,
    children: DiGraph<ClassId, ()>,
    indexes: HashMap<ClassId, NodeIndex>,
    labels: HashMap<ClassId, String>,
    identifiers: HashMap<ClassId, String>,
}

impl ClassHierarchy {
    pub fn new(store: &OntologyStore) -> Self {
        let mut parents = HashMap::new();
        let mut children: DiGraph<ClassId, ()> = DiGraph::new();
        let mut indexes: HashMap<ClassId, NodeIndex> = HashMap::new();
        let mut labels = HashMap::new();
        let mut identifiers = HashMap::new();

        for class in store.classes() {
            let index = children.add_node(class.id);
            indexes.insert(class.id, index);
            labels.insert(class.id, class.label.clone());
            identifiers.insert(class.id, class.identifier.clone());
        }
        // edges run parent -> child so descendant walks follow edge direction
        for class in store.classes() {
            if let Some(parent) = class.sub_class_of {
                parents.insert(class.id, parent);
                if let (Some(&p), Some(&c)) = (indexes.get(&parent), indexes.get(&class.id)) {
                    children.add_edge(p, c, ());
                }
            }
        }

        Self {
            parents,
            children,
            indexes,
            labels,
            identifiers,
        }
    }

    pub fn contains(&self, class: ClassId) -> bool {
        self.indexes.contains_key(&class)
    }

    fn require(&self, class: ClassId) -> Result<(), CatalogError> {
        if self.contains(class) {
            Ok(())
        } else {
            Err(CatalogError::NotFound {
                kind: "class",
                id: class.0,
            })
        }
    }

    fn cycle_at(&self, class: ClassId) -> CatalogError {
        CatalogError::CycleDetected {
            identifier: self
                .identifiers
                .get(&class)
                .cloned()
                .unwrap_or_else(|| class.to_string()),
        }
    }

    /// The chain from `class` up to its root, inclusive of `class` itself.
    pub fn ancestors(&self, class: ClassId) -> Result<Vec<ClassId>, CatalogError> {
        self.require(class)?;
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = class;
        loop {
            if !seen.insert(cursor) {
                return Err(self.cycle_at(cursor));
            }
            chain.push(cursor);
            match self.parents.get(&cursor) {
                Some(parent) => cursor = *parent,
                None => break,
            }
        }
        Ok(chain)
    }

    /// `class` plus every class transitively below it, sorted by label for
    /// stable display.
    pub fn descendants(&self, class: ClassId) -> Result<Vec<ClassId>, CatalogError> {
        self.require(class)?;
        let mut found = HashSet::new();
        let mut queue = VecDeque::new();
        found.insert(class);
        queue.push_back(class);
        while let Some(current) = queue.pop_front() {
            let index = self.indexes[&current];
            for neighbor in self.children.neighbors(index) {
                let child = self.children[neighbor];
                // single-parent edges make the child graph a forest; reaching
                // a node twice means the data contains a cycle
                if !found.insert(child) {
                    return Err(self.cycle_at(child));
                }
                queue.push_back(child);
            }
        }
        let mut result: Vec<ClassId> = found.into_iter().collect();
        result.sort_by(|a, b| self.labels[a].cmp(&self.labels[b]).then(a.cmp(b)));
        Ok(result)
    }

    /// Is `class` the same as `ancestor`, or a descendant of it?
    pub fn is_a(&self, class: ClassId, ancestor: ClassId) -> Result<bool, CatalogError> {
        Ok(self.ancestors(class)?.contains(&ancestor))
    }

    /// Properties usable with instances of `class` as subject: those whose
    /// domain is this class or any of its ancestors. Widening is monotonic up
    /// the hierarchy, not down.
    pub fn available_properties<'a>(
        &self,
        store: &'a OntologyStore,
        class: ClassId,
    ) -> Result<Vec<&'a RdfProperty>, CatalogError> {
        let ancestors: HashSet<ClassId> = self.ancestors(class)?.into_iter().collect();
        let mut properties: Vec<&RdfProperty> = store
            .properties()
            .filter(|p| ancestors.contains(&p.domain))
            .collect();
        properties.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(properties)
    }

    /// Returns the GraphViz dot representation of the class hierarchy.
    pub fn to_dot(&self) -> String {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut indexes: HashMap<ClassId, NodeIndex> = HashMap::new();
        let mut ids: Vec<ClassId> = self.identifiers.keys().copied().collect();
        ids.sort();
        for id in &ids {
            let index = graph.add_node(self.identifiers[id].clone());
            indexes.insert(*id, index);
        }
        for (child, parent) in &self.parents {
            graph.add_edge(indexes[parent], indexes[child], ());
        }
        let dot = petgraph::dot::Dot::with_config(&graph, &[petgraph::dot::Config::EdgeNoLabel]);
        format!("{:?}", dot)
    }
}
