//! Arena of nodes and the structural operations on it

use crate::error::{ModelError, Result};
use crate::node::{Connection, FieldValue, Node, NodeId, SlotKind};
use std::collections::BTreeMap;
use tracing::debug;

/// All nodes of one program graph, keyed by id.
///
/// Iteration follows id order so every walk over the workspace is
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u32,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Create a bare node of `block_type` at top level
    pub fn add_node(&mut self, block_type: impl Into<String>) -> Result<NodeId> {
        let id = NodeId::new(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(ModelError::IdsExhausted)?;
        self.nodes.insert(id, Node::new(id, block_type));
        Ok(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(ModelError::NodeNotFound { id })
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(ModelError::NodeNotFound { id })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    /// Parentless nodes in id order
    pub fn top_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.is_top())
            .map(|n| n.id)
            .collect()
    }

    /// `head` followed by every node reachable through `next`
    pub fn chain(&self, head: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = Some(head);
        while let Some(id) = cursor {
            let Some(node) = self.nodes.get(&id) else { break };
            out.push(id);
            cursor = node.next;
        }
        out
    }

    /// Directly attached nodes: slot targets in slot order, then `next`
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        node.slots
            .iter()
            .filter_map(|slot| slot.target)
            .chain(node.next)
            .collect()
    }

    /// Everything attached below `id`, depth first, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).into_iter().rev());
        }
        out
    }

    /// Node whose slot holds the chain `id` sits in
    pub fn surround_parent(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.nodes.get(&id)?;
        loop {
            match &current.parent {
                None => return None,
                Some(Connection::Slot { node, .. }) => return Some(*node),
                Some(Connection::Next { node }) => current = self.nodes.get(node)?,
            }
        }
    }

    /// Enabled itself and not inside a disabled enclosing node
    pub fn is_effectively_enabled(&self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        if !node.enabled {
            return false;
        }
        let mut ancestor = self.surround_parent(id);
        while let Some(a) = ancestor {
            match self.nodes.get(&a) {
                Some(n) if !n.enabled => return false,
                Some(_) => ancestor = self.surround_parent(a),
                None => break,
            }
        }
        true
    }

    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> Result<()> {
        self.node_mut(id)?.enabled = enabled;
        Ok(())
    }

    pub fn field(&self, id: NodeId, name: &str) -> Option<&FieldValue> {
        self.nodes.get(&id).and_then(|n| n.field(name))
    }

    /// Set a field wherever the node keeps it, adding it to the node if new
    pub fn set_field(&mut self, id: NodeId, name: &str, value: FieldValue) -> Result<()> {
        let node = self.node_mut(id)?;
        if let Some(slot_field) = node
            .slots
            .iter_mut()
            .find_map(|slot| slot.fields.get_mut(name))
        {
            *slot_field = value;
        } else {
            node.fields.insert(name.to_string(), value);
        }
        Ok(())
    }

    pub fn slot_target(&self, id: NodeId, slot: &str) -> Result<Option<NodeId>> {
        let node = self.node(id)?;
        node.slot(slot)
            .map(|s| s.target)
            .ok_or_else(|| ModelError::slot_not_found(id, slot))
    }

    fn ensure_acyclic(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if parent == child || self.descendants(child).contains(&parent) {
            return Err(ModelError::Cycle { parent, child });
        }
        Ok(())
    }

    fn tail(&self, head: NodeId) -> NodeId {
        self.chain(head).last().copied().unwrap_or(head)
    }

    /// Plug `child` (and its chain) into `slot` of `parent`.
    ///
    /// A shadow occupant is destroyed. A real occupant of a value slot is
    /// moved to top level and returned. A displaced statement chain is
    /// re-connected after the tail of the inserted chain.
    pub fn attach(&mut self, parent: NodeId, slot: &str, child: NodeId) -> Result<Option<NodeId>> {
        self.node(child)?;
        let (kind, occupant) = {
            let node = self.node(parent)?;
            let s = node
                .slot(slot)
                .ok_or_else(|| ModelError::slot_not_found(parent, slot))?;
            (s.kind, s.target)
        };
        if !kind.is_connectable() {
            return Err(ModelError::NotConnectable {
                id: parent,
                slot: slot.to_string(),
            });
        }
        self.ensure_acyclic(parent, child)?;
        if occupant == Some(child) {
            return Ok(None);
        }

        self.detach(child)?;

        let mut displaced = None;
        if let Some(old) = occupant {
            self.detach(old)?;
            if self.node(old)?.shadow {
                self.destroy_subtree(old);
            } else {
                displaced = Some(old);
            }
        }

        if let Some(s) = self.node_mut(parent)?.slot_mut(slot) {
            s.target = Some(child);
        }
        self.node_mut(child)?.parent = Some(Connection::Slot {
            node: parent,
            slot: slot.to_string(),
        });

        if kind == SlotKind::Statement {
            if let Some(old) = displaced.take() {
                let tail = self.tail(child);
                self.link_next(tail, old)?;
            }
        }

        debug!("Attached {} to {}.{}", child, parent, slot);
        Ok(displaced)
    }

    /// Make `next` (and its chain) follow `prev`, splicing in front of
    /// whatever followed `prev` before
    pub fn connect_next(&mut self, prev: NodeId, next: NodeId) -> Result<()> {
        self.node(prev)?;
        self.node(next)?;
        self.ensure_acyclic(prev, next)?;
        if self.node(prev)?.next == Some(next) {
            return Ok(());
        }

        self.detach(next)?;
        let old = self.node(prev)?.next;
        if let Some(old) = old {
            self.detach(old)?;
        }
        self.link_next(prev, next)?;
        if let Some(old) = old {
            let tail = self.tail(next);
            self.link_next(tail, old)?;
        }
        Ok(())
    }

    fn link_next(&mut self, prev: NodeId, next: NodeId) -> Result<()> {
        self.node_mut(prev)?.next = Some(next);
        self.node_mut(next)?.parent = Some(Connection::Next { node: prev });
        Ok(())
    }

    /// Unlink `id` from its parent; the chain after it comes along
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node_mut(id)?.parent.take();
        match parent {
            Some(Connection::Slot { node, slot }) => {
                if let Some(s) = self.node_mut(node)?.slot_mut(&slot) {
                    if s.target == Some(id) {
                        s.target = None;
                    }
                }
            }
            Some(Connection::Next { node }) => {
                let prev = self.node_mut(node)?;
                if prev.next == Some(id) {
                    prev.next = None;
                }
            }
            None => {}
        }
        Ok(())
    }

    /// Destroy `id` and everything attached below it.
    ///
    /// With `heal_stack` the node after `id` takes its place instead of
    /// being destroyed. Returns the removed ids.
    pub fn remove(&mut self, id: NodeId, heal_stack: bool) -> Result<Vec<NodeId>> {
        let (parent, next) = {
            let node = self.node(id)?;
            (node.parent.clone(), node.next)
        };

        if heal_stack {
            if let Some(next) = next {
                self.detach(next)?;
                self.detach(id)?;
                match parent {
                    Some(Connection::Slot { node, slot }) => {
                        self.attach(node, &slot, next)?;
                    }
                    Some(Connection::Next { node }) => self.link_next(node, next)?,
                    None => {}
                }
            }
        }

        self.detach(id)?;
        let removed = self.destroy_subtree(id);
        debug!("Removed {} node(s) starting at {}", removed.len(), id);
        Ok(removed)
    }

    /// Drop a detached node and its descendants from the arena
    pub(crate) fn destroy_subtree(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut removed = vec![id];
        removed.extend(self.descendants(id));
        for gone in &removed {
            self.nodes.remove(gone);
        }
        removed
    }

    /// Destroy a top-level node and its descendants
    pub fn dispose(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        self.detach(id)?;
        Ok(self.destroy_subtree(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Slot;

    fn with_slots(ws: &mut Workspace, block_type: &str, slots: &[(&str, SlotKind)]) -> NodeId {
        let id = ws.add_node(block_type).unwrap();
        let node = ws.node_mut(id).unwrap();
        for (name, kind) in slots {
            node.slots.push(Slot::new(*name, *kind, None));
        }
        id
    }

    #[test]
    fn test_attach_value_and_displace() {
        let mut ws = Workspace::new();
        let parent = with_slots(&mut ws, "p", &[("A", SlotKind::Value)]);
        let first = ws.add_node("v").unwrap();
        let second = ws.add_node("v").unwrap();

        assert_eq!(ws.attach(parent, "A", first).unwrap(), None);
        assert_eq!(ws.attach(parent, "A", second).unwrap(), Some(first));
        assert_eq!(ws.slot_target(parent, "A").unwrap(), Some(second));
        assert!(ws.node(first).unwrap().is_top());
        assert_eq!(ws.top_nodes(), vec![parent, first]);
    }

    #[test]
    fn test_attach_replaces_shadow() {
        let mut ws = Workspace::new();
        let parent = with_slots(&mut ws, "p", &[("A", SlotKind::Value)]);
        let shadow = ws.add_node("type_null").unwrap();
        ws.node_mut(shadow).unwrap().shadow = true;
        ws.attach(parent, "A", shadow).unwrap();

        let real = ws.add_node("type_number").unwrap();
        assert_eq!(ws.attach(parent, "A", real).unwrap(), None);
        assert!(!ws.contains(shadow));
    }

    #[test]
    fn test_statement_attach_reconnects_displaced_chain() {
        let mut ws = Workspace::new();
        let parent = with_slots(&mut ws, "p", &[("DO", SlotKind::Statement)]);
        let old = ws.add_node("s").unwrap();
        let new_head = ws.add_node("s").unwrap();
        let new_tail = ws.add_node("s").unwrap();
        ws.attach(parent, "DO", old).unwrap();
        ws.connect_next(new_head, new_tail).unwrap();

        assert_eq!(ws.attach(parent, "DO", new_head).unwrap(), None);
        let head = ws.slot_target(parent, "DO").unwrap().unwrap();
        assert_eq!(ws.chain(head), vec![new_head, new_tail, old]);
    }

    #[test]
    fn test_connect_next_splices() {
        let mut ws = Workspace::new();
        let a = ws.add_node("s").unwrap();
        let b = ws.add_node("s").unwrap();
        let c = ws.add_node("s").unwrap();
        ws.connect_next(a, c).unwrap();
        ws.connect_next(a, b).unwrap();
        assert_eq!(ws.chain(a), vec![a, b, c]);
        assert_eq!(ws.node(c).unwrap().previous(), Some(b));
    }

    #[test]
    fn test_cycles_and_dummy_slots_are_refused() {
        let mut ws = Workspace::new();
        let a = with_slots(&mut ws, "p", &[("A", SlotKind::Value), ("ROW", SlotKind::Dummy)]);
        let b = with_slots(&mut ws, "p", &[("A", SlotKind::Value), ("ROW", SlotKind::Dummy)]);
        ws.attach(a, "A", b).unwrap();

        assert!(matches!(ws.attach(b, "A", a), Err(ModelError::Cycle { .. })));
        assert!(matches!(ws.attach(a, "A", a), Err(ModelError::Cycle { .. })));
        let c = ws.add_node("v").unwrap();
        assert!(matches!(ws.attach(a, "ROW", c), Err(ModelError::NotConnectable { .. })));
        assert!(matches!(ws.attach(a, "MISSING", c), Err(ModelError::SlotNotFound { .. })));
    }

    #[test]
    fn test_remove_with_and_without_healing() {
        let mut ws = Workspace::new();
        let parent = with_slots(&mut ws, "p", &[("DO", SlotKind::Statement)]);
        let a = ws.add_node("s").unwrap();
        let b = ws.add_node("s").unwrap();
        let c = ws.add_node("s").unwrap();
        ws.attach(parent, "DO", a).unwrap();
        ws.connect_next(a, b).unwrap();
        ws.connect_next(b, c).unwrap();

        ws.remove(a, true).unwrap();
        assert_eq!(ws.slot_target(parent, "DO").unwrap(), Some(b));
        assert_eq!(ws.chain(b), vec![b, c]);

        let removed = ws.remove(b, false).unwrap();
        assert_eq!(removed, vec![b, c]);
        assert_eq!(ws.slot_target(parent, "DO").unwrap(), None);
        assert_eq!(ws.len(), 1);
    }

    #[test]
    fn test_inherited_disable_follows_enclosing_node() {
        let mut ws = Workspace::new();
        let outer = with_slots(&mut ws, "p", &[("DO", SlotKind::Statement)]);
        let first = ws.add_node("s").unwrap();
        let second = ws.add_node("s").unwrap();
        ws.attach(outer, "DO", first).unwrap();
        ws.connect_next(first, second).unwrap();

        ws.set_enabled(first, false).unwrap();
        assert!(!ws.is_effectively_enabled(first));
        assert!(ws.is_effectively_enabled(second));

        ws.set_enabled(first, true).unwrap();
        ws.set_enabled(outer, false).unwrap();
        assert!(!ws.is_effectively_enabled(second));
    }

    #[test]
    fn test_id_allocation_stops_at_the_last_id() {
        let mut ws = Workspace {
            next_id: u32::MAX - 1,
            ..Workspace::default()
        };
        assert_eq!(ws.add_node("s").unwrap(), NodeId::new(u32::MAX - 1));
        assert!(matches!(ws.add_node("s"), Err(ModelError::IdsExhausted)));
        assert_eq!(ws.len(), 1);
    }
}
