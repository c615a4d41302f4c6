//! Arena-backed computation graph with cached, dirty-flag driven evaluation.

use std::collections::BTreeMap;

use pwa_core::errors::{ErrorInfo, PwaError};
use pwa_core::ParameterSet;
use pwa_data::{EventStore, KinVariable, Partition};
use serde::{Deserialize, Serialize};

use crate::strategy::Strategy;
use crate::value::{Value, ValueKind};

/// Identifier for a node within a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates an identifier from its raw integer representation.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub fn as_raw(&self) -> u32 {
        self.0
    }

    fn idx(&self) -> usize {
        self.0 as usize
    }
}

/// Source a leaf value is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafBinding {
    /// A named fit parameter, re-read on every evaluation pass.
    Parameter(String),
    /// A per-event column of the event store.
    Column {
        /// Partition the column belongs to.
        partition: Partition,
        /// Derived variable identifying the column.
        variable: KinVariable,
    },
    /// A constant value fixed at construction time.
    Constant(Value),
}

impl LeafBinding {
    fn kind(&self) -> ValueKind {
        match self {
            LeafBinding::Parameter(_) => ValueKind::Scalar,
            LeafBinding::Column { .. } => ValueKind::Vector,
            LeafBinding::Constant(value) => value.kind(),
        }
    }

    fn label(&self) -> String {
        match self {
            LeafBinding::Parameter(name) => format!("parameter:{name}"),
            LeafBinding::Column {
                partition,
                variable,
            } => format!("column:{}/{}", partition.as_raw(), variable.label()),
            LeafBinding::Constant(value) => format!("constant:{}", value.kind().label()),
        }
    }
}

struct Node {
    name: String,
    kind: ValueKind,
    value: Value,
    dirty: bool,
    children: Vec<NodeId>,
    op: Option<Box<dyn Strategy>>,
    binding: Option<LeafBinding>,
    seen_revision: u64,
    eval_count: u64,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("dirty", &self.dirty)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Read-only structural description of one node, used by diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    /// Node name.
    pub name: String,
    /// Output type tag.
    pub kind: String,
    /// Operation name or leaf binding label.
    pub role: String,
    /// Child node names in declaration order.
    pub children: Vec<String>,
}

/// The cached computation graph.
///
/// Built once per model configuration, evaluated many times. Topology is
/// frozen by [`Graph::resolve_links`]; afterwards only leaf values and node
/// caches change.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    names: BTreeMap<String, NodeId>,
    head: Option<NodeId>,
    pending: Vec<(String, String)>,
    topo: Vec<NodeId>,
    resolved: bool,
}

fn with_node(err: PwaError, node: &str) -> PwaError {
    let attach = |mut info: ErrorInfo| {
        info.context.insert("node".into(), node.into());
        info
    };
    match err {
        PwaError::Graph(info) => PwaError::Graph(attach(info)),
        PwaError::Storage(info) => PwaError::Storage(attach(info)),
        PwaError::Model(info) => PwaError::Model(attach(info)),
        PwaError::Params(info) => PwaError::Params(attach(info)),
        PwaError::Generator(info) => PwaError::Generator(attach(info)),
    }
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn frozen_guard(&self) -> Result<(), PwaError> {
        if self.resolved {
            return Err(PwaError::Graph(ErrorInfo::new(
                "frozen-graph",
                "graph topology is immutable after resolve_links()",
            )));
        }
        Ok(())
    }

    fn register(&mut self, node: Node) -> Result<NodeId, PwaError> {
        if self.names.contains_key(&node.name) {
            return Err(PwaError::Graph(
                ErrorInfo::new("duplicate-node", "a node with this name is already registered")
                    .with_context("node", node.name.clone()),
            ));
        }
        let id = NodeId(self.nodes.len() as u32);
        self.names.insert(node.name.clone(), id);
        self.nodes.push(node);
        Ok(id)
    }

    /// Registers a computing node. The operation's declared output kind must
    /// match `kind`; a disagreement is a construction-time `type-mismatch`.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        kind: ValueKind,
        op: Box<dyn Strategy>,
    ) -> Result<NodeId, PwaError> {
        self.frozen_guard()?;
        let name = name.into();
        if op.output_kind() != kind {
            return Err(PwaError::Graph(
                ErrorInfo::new(
                    "type-mismatch",
                    "operation output type disagrees with the node's declared type",
                )
                .with_context("node", name)
                .with_context("declared", kind.label())
                .with_context("operation", op.output_kind().label()),
            ));
        }
        self.register(Node {
            name,
            kind,
            value: Value::zero_of(kind),
            dirty: true,
            children: Vec::new(),
            op: Some(op),
            binding: None,
            seen_revision: 0,
            eval_count: 0,
        })
    }

    /// Registers a leaf bound to a parameter, store column or constant and
    /// attaches it as a child of `parent`. Fails with `unresolved-parent` if
    /// the parent is not registered yet.
    ///
    /// Re-registering the same name with an identical binding attaches the
    /// existing leaf to the additional parent; shared parameters and columns
    /// are deduplicated this way.
    pub fn add_leaf(
        &mut self,
        name: impl Into<String>,
        binding: LeafBinding,
        parent: &str,
    ) -> Result<NodeId, PwaError> {
        self.frozen_guard()?;
        let name = name.into();
        let parent_id = *self.names.get(parent).ok_or_else(|| {
            PwaError::Graph(
                ErrorInfo::new("unresolved-parent", "leaf parent is not registered")
                    .with_context("node", name.clone())
                    .with_context("parent", parent),
            )
        })?;
        let id = match self.names.get(&name) {
            Some(&existing) => {
                let node = &self.nodes[existing.idx()];
                if node.binding.as_ref() != Some(&binding) {
                    return Err(PwaError::Graph(
                        ErrorInfo::new(
                            "duplicate-node",
                            "leaf name is already registered with a different binding",
                        )
                        .with_context("node", name),
                    ));
                }
                existing
            }
            None => {
                let kind = binding.kind();
                let value = match &binding {
                    LeafBinding::Constant(value) => value.clone(),
                    _ => Value::zero_of(kind),
                };
                self.register(Node {
                    name,
                    kind,
                    value,
                    dirty: true,
                    children: Vec::new(),
                    op: None,
                    binding: Some(binding),
                    seen_revision: 0,
                    eval_count: 0,
                })?
            }
        };
        self.nodes[parent_id.idx()].children.push(id);
        Ok(id)
    }

    /// Declares a parent/child link by name. Links to not-yet-registered
    /// children are recorded and resolved by [`Graph::resolve_links`].
    pub fn link_child(&mut self, parent: &str, child: &str) -> Result<(), PwaError> {
        self.frozen_guard()?;
        match (self.names.get(parent).copied(), self.names.get(child).copied()) {
            (Some(parent_id), Some(child_id)) => {
                self.nodes[parent_id.idx()].children.push(child_id);
            }
            _ => {
                self.pending.push((parent.to_string(), child.to_string()));
            }
        }
        Ok(())
    }

    /// Declares the root node.
    pub fn set_head(&mut self, name: &str) -> Result<(), PwaError> {
        self.frozen_guard()?;
        let id = *self.names.get(name).ok_or_else(|| {
            PwaError::Graph(
                ErrorInfo::new("broken-link", "head node is not registered")
                    .with_context("node", name),
            )
        })?;
        self.head = Some(id);
        Ok(())
    }

    /// Verifies that every declared child reference resolves to a registered
    /// node, checks operation arities, detects cycles and freezes the
    /// topology. Must succeed before any evaluation.
    pub fn resolve_links(&mut self) -> Result<(), PwaError> {
        self.frozen_guard()?;
        let pending = std::mem::take(&mut self.pending);
        let mut unresolved = Vec::new();
        for (parent, child) in pending {
            match (self.names.get(&parent).copied(), self.names.get(&child).copied()) {
                (Some(parent_id), Some(child_id)) => {
                    self.nodes[parent_id.idx()].children.push(child_id);
                }
                (None, _) => unresolved.push(parent),
                (_, None) => unresolved.push(child),
            }
        }
        if !unresolved.is_empty() {
            unresolved.sort();
            unresolved.dedup();
            return Err(PwaError::Graph(
                ErrorInfo::new("broken-link", "child references do not resolve")
                    .with_context("unresolved", unresolved.join(", ")),
            ));
        }
        if self.head.is_none() {
            return Err(PwaError::Graph(ErrorInfo::new(
                "broken-link",
                "graph has no head node",
            )));
        }
        for node in &self.nodes {
            if let Some(op) = &node.op {
                if let Some(arity) = op.arity() {
                    if node.children.len() != arity {
                        return Err(PwaError::Graph(
                            ErrorInfo::new("broken-link", "operation child count is wrong")
                                .with_context("node", node.name.clone())
                                .with_context("expected", arity.to_string())
                                .with_context("found", node.children.len().to_string()),
                        ));
                    }
                }
            } else if !node.children.is_empty() {
                return Err(PwaError::Graph(
                    ErrorInfo::new("broken-link", "leaf node declares children")
                        .with_context("node", node.name.clone()),
                ));
            }
        }
        self.topo = self.topological_order()?;
        self.resolved = true;
        Ok(())
    }

    /// Child-before-parent ordering over all registered nodes.
    fn topological_order(&self) -> Result<Vec<NodeId>, PwaError> {
        const WHITE: u8 = 0;
        const GREY: u8 = 1;
        const BLACK: u8 = 2;
        let mut color = vec![WHITE; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        // Iterative DFS; the stack entry remembers how many children were
        // already visited.
        for start in 0..self.nodes.len() {
            if color[start] != WHITE {
                continue;
            }
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            color[start] = GREY;
            while let Some(&mut (node, ref mut next_child)) = stack.last_mut() {
                let children = &self.nodes[node].children;
                if *next_child < children.len() {
                    let child = children[*next_child].idx();
                    *next_child += 1;
                    match color[child] {
                        WHITE => {
                            color[child] = GREY;
                            stack.push((child, 0));
                        }
                        GREY => {
                            return Err(PwaError::Graph(
                                ErrorInfo::new("broken-link", "graph contains a cycle")
                                    .with_context("node", self.nodes[child].name.clone()),
                            ));
                        }
                        _ => {}
                    }
                } else {
                    color[node] = BLACK;
                    order.push(NodeId(node as u32));
                    stack.pop();
                }
            }
        }
        Ok(order)
    }

    fn resolved_guard(&self) -> Result<(), PwaError> {
        if !self.resolved {
            return Err(PwaError::Graph(
                ErrorInfo::new("broken-link", "graph links were never resolved")
                    .with_hint("call resolve_links() after construction"),
            ));
        }
        Ok(())
    }

    /// Reloads leaves whose bound source moved, marking them dirty.
    fn refresh_leaves(
        &mut self,
        parameters: &ParameterSet,
        store: &EventStore,
    ) -> Result<(), PwaError> {
        for node in &mut self.nodes {
            match &node.binding {
                Some(LeafBinding::Parameter(name)) => {
                    let revision = parameters
                        .revision(name)
                        .map_err(|err| with_node(err, &node.name))?;
                    if revision != node.seen_revision {
                        let value = parameters
                            .value(name)
                            .map_err(|err| with_node(err, &node.name))?;
                        node.value = Value::Scalar(value);
                        node.seen_revision = revision;
                        node.dirty = true;
                    }
                }
                Some(LeafBinding::Column {
                    partition,
                    variable,
                }) => {
                    let revision = store.revision(*partition);
                    if revision != node.seen_revision {
                        let column = store
                            .column(*partition, variable)
                            .map_err(|err| with_node(err, &node.name))?;
                        node.value = Value::Vector(column.to_vec());
                        node.seen_revision = revision;
                        node.dirty = true;
                    }
                }
                Some(LeafBinding::Constant(_)) | None => {}
            }
        }
        Ok(())
    }

    /// Recomputes every stale node in child-before-parent order.
    ///
    /// A node is stale when its own dirty flag is set or any child is stale.
    /// Leaves bound to parameters or columns are refreshed first, so a
    /// parameter change or a batch swap is picked up here without any
    /// explicit invalidation call.
    pub fn evaluate(
        &mut self,
        parameters: &ParameterSet,
        store: &EventStore,
    ) -> Result<(), PwaError> {
        self.resolved_guard()?;
        self.refresh_leaves(parameters, store)?;
        let mut stale = vec![false; self.nodes.len()];
        let topo = std::mem::take(&mut self.topo);
        for &id in &topo {
            let (is_stale, computes) = {
                let node = &self.nodes[id.idx()];
                let is_stale = node.dirty
                    || node.children.iter().any(|child| stale[child.idx()]);
                (is_stale, node.op.is_some())
            };
            stale[id.idx()] = is_stale;
            if is_stale && computes {
                if let Err(err) = self.recompute(id) {
                    self.topo = topo;
                    return Err(err);
                }
            }
        }
        for &id in &topo {
            self.nodes[id.idx()].dirty = false;
        }
        self.topo = topo;
        Ok(())
    }

    /// Recomputes every node regardless of dirty state.
    pub fn force_recalculate(
        &mut self,
        parameters: &ParameterSet,
        store: &EventStore,
    ) -> Result<(), PwaError> {
        self.resolved_guard()?;
        for node in &mut self.nodes {
            node.dirty = true;
        }
        self.evaluate(parameters, store)
    }

    fn recompute(&mut self, id: NodeId) -> Result<(), PwaError> {
        let Some(op) = self.nodes[id.idx()].op.take() else {
            return Ok(());
        };
        let children = self.nodes[id.idx()].children.clone();
        let result = {
            let child_values: Vec<&Value> = children
                .iter()
                .map(|child| &self.nodes[child.idx()].value)
                .collect();
            op.execute(&child_values)
        };
        let node = &mut self.nodes[id.idx()];
        node.op = Some(op);
        match result {
            Ok(value) => {
                node.value = value;
                node.eval_count += 1;
                Ok(())
            }
            Err(err) => {
                let name = node.name.clone();
                Err(with_node(err, &name))
            }
        }
    }

    /// Returns the cached value of the head node.
    pub fn head_value(&self) -> Result<&Value, PwaError> {
        self.resolved_guard()?;
        match self.head {
            Some(head) => Ok(&self.nodes[head.idx()].value),
            None => Err(PwaError::Graph(ErrorInfo::new(
                "broken-link",
                "graph has no head node",
            ))),
        }
    }

    /// Returns the cached value of a named node, if registered.
    pub fn value_of(&self, name: &str) -> Option<&Value> {
        self.names
            .get(name)
            .map(|id| &self.nodes[id.idx()].value)
    }

    /// Returns the identifier of a registered node.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Per-node evaluation counters, keyed by node name. Leaves never count;
    /// they are refreshed, not computed.
    pub fn evaluation_counts(&self) -> BTreeMap<String, u64> {
        self.nodes
            .iter()
            .filter(|node| node.op.is_some())
            .map(|node| (node.name.clone(), node.eval_count))
            .collect()
    }

    /// Structural description of every node in registration order.
    pub fn structure(&self) -> Vec<NodeDescription> {
        self.nodes
            .iter()
            .map(|node| NodeDescription {
                name: node.name.clone(),
                kind: node.kind.label().to_string(),
                role: match (&node.op, &node.binding) {
                    (Some(op), _) => format!("op:{}", op.name()),
                    (None, Some(binding)) => format!("leaf:{}", binding.label()),
                    (None, None) => "leaf:unbound".to_string(),
                },
                children: node
                    .children
                    .iter()
                    .map(|child| self.nodes[child.idx()].name.clone())
                    .collect(),
            })
            .collect()
    }

    /// Name of the head node, if set.
    pub fn head_name(&self) -> Option<&str> {
        self.head.map(|id| self.nodes[id.idx()].name.as_str())
    }
}
