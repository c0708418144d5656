//! Chart-of-accounts tree.
//!
//! [`build_hierarchy`] arranges groups and accounts into an ordered forest.
//! Nodes live in a flat arena inside [`AccountTree`] and refer to each other
//! by [`NodeIndex`], so parent links never own their targets.
//!
//! Unresolvable references are tolerated: a group whose parent is unknown,
//! or an account whose group is unknown, simply becomes a root. When two
//! records of the same kind share an id the later one replaces the earlier.
//! A cycle in the group parent relation is reported as
//! [`HierarchyError::Cycle`].
//!
//! ```text
//! 1 Assets                 (group, level 0)
//! ├── 12 Bank              (group, level 1)
//! │   ├── 1200 Checking    (account, level 2)
//! │   └── 1210 Savings     (account, level 2)
//! └── 1400 Receivables     (account, level 1)
//! ```

use ledgerbook_core::{Account, AccountGroup, AccountId, AccountType, GroupId};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

use crate::balances::BalanceMap;

/// Errors that can occur while building the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// The group parent relation contains a cycle.
    #[error("account group cycle detected: {}", format_cycle(.groups))]
    Cycle {
        /// Groups on the cycle, in parent-walk order.
        groups: Vec<GroupId>,
    },
}

fn format_cycle(groups: &[GroupId]) -> String {
    let mut parts: Vec<&str> = groups.iter().map(GroupId::as_str).collect();
    if let Some(first) = parts.first().copied() {
        parts.push(first);
    }
    parts.join(" -> ")
}

/// Key of a node: groups and accounts live in separate id spaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum NodeId {
    /// A group node.
    Group(GroupId),
    /// An account node.
    Account(AccountId),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "group:{id}"),
            Self::Account(id) => write!(f, "account:{id}"),
        }
    }
}

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// An account group.
    Group,
    /// A leaf account of the given type.
    Account(AccountType),
}

/// Position of a node in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// The raw arena position.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

/// A group or account placed in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountNode {
    /// Node key.
    pub id: NodeId,
    /// Group or account number.
    pub number: String,
    /// Display name.
    pub name: String,
    /// Group or typed account.
    pub kind: NodeKind,
    /// Children, sorted by number.
    pub children: Vec<NodeIndex>,
    /// Enclosing node, if any.
    pub parent: Option<NodeIndex>,
    /// Depth from the root, starting at 0.
    pub level: usize,
}

impl AccountNode {
    fn new(id: NodeId, number: &str, name: &str, kind: NodeKind) -> Self {
        Self {
            id,
            number: number.to_string(),
            name: name.to_string(),
            kind,
            children: Vec::new(),
            parent: None,
            level: 0,
        }
    }

    /// Whether this node is a group.
    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group)
    }
}

/// The assembled chart-of-accounts forest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountTree {
    nodes: Vec<AccountNode>,
    roots: Vec<NodeIndex>,
    #[serde(skip)]
    index: HashMap<NodeId, NodeIndex>,
}

impl AccountTree {
    /// All nodes, groups first, each kind in input order.
    #[must_use]
    pub fn nodes(&self) -> &[AccountNode] {
        &self.nodes
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root nodes, sorted by number.
    pub fn roots(&self) -> impl Iterator<Item = &AccountNode> {
        self.roots.iter().map(|&idx| self.node(idx))
    }

    /// Node at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` was produced by a different tree.
    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> &AccountNode {
        &self.nodes[idx.0]
    }

    /// Look up a node by id.
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&AccountNode> {
        self.index_of(id).map(|idx| self.node(idx))
    }

    /// Arena position of a node.
    #[must_use]
    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Look up a group node.
    #[must_use]
    pub fn group(&self, id: &GroupId) -> Option<&AccountNode> {
        self.get(&NodeId::Group(id.clone()))
    }

    /// Look up an account node.
    #[must_use]
    pub fn account(&self, id: &AccountId) -> Option<&AccountNode> {
        self.get(&NodeId::Account(id.clone()))
    }

    /// Children of `node`, in order.
    pub fn children<'a>(&'a self, node: &'a AccountNode) -> impl Iterator<Item = &'a AccountNode> {
        node.children.iter().map(move |&idx| self.node(idx))
    }

    /// Parent of `node`, if any.
    #[must_use]
    pub fn parent(&self, node: &AccountNode) -> Option<&AccountNode> {
        node.parent.map(|idx| self.node(idx))
    }

    /// Every node in display order: depth first, siblings by number.
    #[must_use]
    pub fn walk(&self) -> Vec<&AccountNode> {
        self.preorder().into_iter().map(|idx| self.node(idx)).collect()
    }

    fn preorder(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeIndex> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.node(idx).children.iter().rev().copied());
        }
        order
    }

    /// Roll balances up the tree.
    ///
    /// Account nodes take their own balance (zero when absent from
    /// `balances`); group nodes take the sum of everything below them.
    /// Balances are summed as signed, so a group mixing debit-normal and
    /// credit-normal accounts nets them against each other.
    #[must_use]
    pub fn rollup(&self, balances: &BalanceMap) -> HashMap<NodeId, Decimal> {
        let mut totals: Vec<Decimal> = self
            .nodes
            .iter()
            .map(|node| match &node.id {
                NodeId::Account(id) => balances.get(id).copied().unwrap_or_default(),
                NodeId::Group(_) => Decimal::ZERO,
            })
            .collect();

        for idx in self.preorder().into_iter().rev() {
            if let Some(parent) = self.node(idx).parent {
                let child = totals[idx.0];
                totals[parent.0] += child;
            }
        }

        self.nodes
            .iter()
            .zip(totals)
            .map(|(node, total)| (node.id.clone(), total))
            .collect()
    }
}

/// Compare two numbers the way a locale-aware string collation would:
/// case-insensitively first, then lowercase before uppercase at the first
/// position where the case differs, then by raw code points.
#[must_use]
pub fn collate(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| {
            a.chars()
                .map(char::is_uppercase)
                .cmp(b.chars().map(char::is_uppercase))
        })
        .then_with(|| a.cmp(b))
}

/// Assemble `accounts` and `groups` into an ordered forest.
///
/// Groups attach to their parent group, accounts to their group; anything
/// whose reference does not resolve becomes a root. Every sibling list is
/// sorted by number with [`collate`].
pub fn build_hierarchy(
    accounts: &[Account],
    groups: &[AccountGroup],
) -> Result<AccountTree, HierarchyError> {
    let groups = last_wins(groups, |group| &group.id, "group");
    let accounts = last_wins(accounts, |account| &account.id, "account");

    let mut tree = AccountTree {
        nodes: Vec::with_capacity(groups.len() + accounts.len()),
        roots: Vec::new(),
        index: HashMap::with_capacity(groups.len() + accounts.len()),
    };

    for group in &groups {
        let id = NodeId::Group(group.id.clone());
        tree.index.insert(id.clone(), NodeIndex(tree.nodes.len()));
        tree.nodes
            .push(AccountNode::new(id, &group.number, &group.name, NodeKind::Group));
    }

    let parents: Vec<Option<usize>> = groups
        .iter()
        .map(|group| {
            let parent_id = group.parent_id.as_ref()?;
            let parent = tree.index_of(&NodeId::Group(parent_id.clone()));
            if parent.is_none() {
                tracing::debug!(
                    group = %group.id,
                    parent = %parent_id,
                    "unknown parent group, promoting to root"
                );
            }
            parent.map(NodeIndex::get)
        })
        .collect();

    detect_cycle(&groups, &parents)?;

    for (child, parent) in parents.iter().enumerate() {
        tree.attach(NodeIndex(child), parent.map(NodeIndex));
    }

    for account in &accounts {
        let id = NodeId::Account(account.id.clone());
        let parent = account.group_id.as_ref().and_then(|group_id| {
            let parent = tree.index_of(&NodeId::Group(group_id.clone()));
            if parent.is_none() {
                tracing::debug!(
                    account = %account.id,
                    group = %group_id,
                    "unknown group, promoting to root"
                );
            }
            parent
        });

        let idx = NodeIndex(tree.nodes.len());
        tree.index.insert(id.clone(), idx);
        tree.nodes.push(AccountNode::new(
            id,
            &account.number,
            &account.name,
            NodeKind::Account(account.account_type),
        ));
        tree.attach(idx, parent);
    }

    tree.sort_siblings();
    tree.assign_levels();

    Ok(tree)
}

impl AccountTree {
    fn attach(&mut self, child: NodeIndex, parent: Option<NodeIndex>) {
        match parent {
            Some(parent) => {
                self.nodes[parent.0].children.push(child);
                self.nodes[child.0].parent = Some(parent);
            }
            None => self.roots.push(child),
        }
    }

    fn sort_siblings(&mut self) {
        let by_number = |nodes: &[AccountNode], a: &NodeIndex, b: &NodeIndex| {
            collate(&nodes[a.0].number, &nodes[b.0].number)
        };

        for i in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[i].children);
            children.sort_by(|a, b| by_number(&self.nodes, a, b));
            self.nodes[i].children = children;
        }

        let mut roots = std::mem::take(&mut self.roots);
        roots.sort_by(|a, b| by_number(&self.nodes, a, b));
        self.roots = roots;
    }

    fn assign_levels(&mut self) {
        for idx in self.preorder() {
            let level = self.nodes[idx.0]
                .parent
                .map_or(0, |parent| self.nodes[parent.0].level + 1);
            self.nodes[idx.0].level = level;
        }
    }
}

/// Keep one record per id: the last one, at the position of the first.
fn last_wins<'a, T, K>(records: &'a [T], key: impl Fn(&'a T) -> &'a K, kind: &str) -> Vec<&'a T>
where
    K: Eq + Hash + fmt::Display + 'a,
{
    let mut kept: Vec<&T> = Vec::with_capacity(records.len());
    let mut seen: HashMap<&K, usize> = HashMap::with_capacity(records.len());

    for record in records {
        let id = key(record);
        if let Some(&pos) = seen.get(id) {
            tracing::debug!(kind, %id, "duplicate id, keeping the later record");
            kept[pos] = record;
        } else {
            seen.insert(id, kept.len());
            kept.push(record);
        }
    }

    kept
}

/// Walk each group's parent chain once, with a visited set, and report the
/// first cycle found.
fn detect_cycle(groups: &[&AccountGroup], parents: &[Option<usize>]) -> Result<(), HierarchyError> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; parents.len()];
    let mut path: Vec<usize> = Vec::new();

    for start in 0..parents.len() {
        path.clear();
        let mut current = Some(start);

        while let Some(node) = current {
            match marks[node] {
                Mark::Done => break,
                Mark::OnPath => {
                    let from = path.iter().position(|&p| p == node).unwrap_or(0);
                    return Err(HierarchyError::Cycle {
                        groups: path[from..]
                            .iter()
                            .map(|&i| groups[i].id.clone())
                            .collect(),
                    });
                }
                Mark::Unvisited => {
                    marks[node] = Mark::OnPath;
                    path.push(node);
                    current = parents[node];
                }
            }
        }

        for &node in &path {
            marks[node] = Mark::Done;
        }
    }

    Ok(())
}
