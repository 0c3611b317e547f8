//! Fixed-capacity entity pool
//!
//! All slots are allocated up front. Free slots are handed out FIFO, a
//! per-kind index keeps "first/all of kind" queries cheap, and a separate
//! iteration order is re-sorted by draw order every frame.

use std::collections::{HashMap, VecDeque};

use super::entity::{Entity, EntityKind, EntityRef};
use crate::error::ConsoleError;

/// Default slot count
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug)]
pub struct EntityPool {
    slots: Vec<Entity>,
    free: VecDeque<u32>,
    /// Live slots per kind, in creation order
    by_kind: HashMap<EntityKind, Vec<u32>>,
    /// Update and draw order over every slot, live or not
    order: Vec<u32>,
    next_id: u64,
}

impl EntityPool {
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity as u32).map(Entity::vacant).collect();
        Self {
            slots,
            free: (0..capacity as u32).collect(),
            by_kind: HashMap::new(),
            order: (0..capacity as u32).collect(),
            next_id: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Id the next created entity will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|e| !e.destroyed).count()
    }

    /// Take the oldest free slot, reset it, and optionally attach it to `parent`.
    pub fn create(
        &mut self,
        kind: EntityKind,
        parent: Option<EntityRef>,
    ) -> Result<EntityRef, ConsoleError> {
        let Some(slot) = self.free.pop_front() else {
            return Err(ConsoleError::PoolExhausted {
                capacity: self.capacity(),
                kind,
            });
        };
        let id = self.next_id;
        self.next_id += 1;

        self.slots[slot as usize] = Entity::new(slot, id, kind);
        self.by_kind.entry(kind).or_default().push(slot);

        let handle = EntityRef { slot, id };
        if parent.is_some() {
            self.set_parent(handle, parent);
        }
        Ok(handle)
    }

    /// Destroy an entity and, first, all of its descendants.
    ///
    /// Returns every entity destroyed by this call in the order their
    /// destruction completed (children before parents). Stale handles are a
    /// no-op.
    pub fn destroy(&mut self, handle: EntityRef) -> Vec<(EntityRef, EntityKind)> {
        let mut destroyed = Vec::new();
        self.destroy_into(handle, &mut destroyed);
        destroyed
    }

    fn destroy_into(&mut self, handle: EntityRef, out: &mut Vec<(EntityRef, EntityKind)>) {
        if !self.is_alive(handle) {
            return;
        }
        let slot = handle.slot as usize;
        let kind = self.slots[slot].kind;
        self.slots[slot].destroyed = true;
        self.free.push_back(handle.slot);
        if let Some(list) = self.by_kind.get_mut(&kind) {
            if let Some(pos) = list.iter().position(|&s| s == handle.slot) {
                list.remove(pos);
            }
        }

        let children = std::mem::take(&mut self.slots[slot].children);
        for child in children {
            if let Some(c) = self.get_mut(child) {
                c.parent = None;
            }
            self.destroy_into(child, out);
        }

        if let Some(parent) = self.slots[slot].parent.take() {
            if let Some(p) = self.get_mut(parent) {
                p.children.retain(|&c| c != handle);
            }
        }
        out.push((handle, kind));
    }

    /// Re-parent `child`, detaching it from any previous parent.
    pub fn set_parent(&mut self, child: EntityRef, parent: Option<EntityRef>) {
        if !self.is_alive(child) {
            return;
        }
        if let Some(old) = self.slots[child.slot as usize].parent.take() {
            if let Some(p) = self.get_mut(old) {
                p.children.retain(|&c| c != child);
            }
        }
        if let Some(new) = parent {
            if let Some(p) = self.get_mut(new) {
                p.children.push(child);
                self.slots[child.slot as usize].parent = Some(new);
            }
        }
    }

    pub fn is_alive(&self, handle: EntityRef) -> bool {
        self.slots
            .get(handle.slot as usize)
            .is_some_and(|e| !e.destroyed && e.id == handle.id)
    }

    pub fn get(&self, handle: EntityRef) -> Option<&Entity> {
        self.slots
            .get(handle.slot as usize)
            .filter(|e| !e.destroyed && e.id == handle.id)
    }

    pub fn get_mut(&mut self, handle: EntityRef) -> Option<&mut Entity> {
        self.slots
            .get_mut(handle.slot as usize)
            .filter(|e| !e.destroyed && e.id == handle.id)
    }

    /// Handle to whatever currently lives in `slot`.
    pub fn live_at(&self, slot: u32) -> Option<EntityRef> {
        self.slots
            .get(slot as usize)
            .filter(|e| !e.destroyed)
            .map(Entity::handle)
    }

    /// Replace an entity's state with a working copy, keeping its hierarchy
    /// links. Does nothing if the handle went stale meanwhile.
    pub fn write_back(&mut self, handle: EntityRef, mut entity: Entity) {
        if let Some(slot) = self.get_mut(handle) {
            entity.slot = slot.slot;
            entity.id = slot.id;
            entity.destroyed = false;
            entity.parent = slot.parent;
            entity.children = std::mem::take(&mut slot.children);
            *slot = entity;
        }
    }

    /// Oldest live entity of a kind.
    pub fn first_of_kind(&self, kind: EntityKind) -> Option<EntityRef> {
        self.kind_slots(kind)
            .first()
            .map(|&s| self.slots[s as usize].handle())
    }

    /// Live entities of a kind, oldest first.
    pub fn all_of_kind(&self, kind: EntityKind) -> Vec<EntityRef> {
        self.kind_slots(kind)
            .iter()
            .map(|&s| self.slots[s as usize].handle())
            .collect()
    }

    pub fn kind_slots(&self, kind: EntityKind) -> &[u32] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Slot iteration order.
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    /// Stable sort of the iteration order by draw order.
    pub fn sort_by_draw_order(&mut self) {
        let slots = &self.slots;
        self.order.sort_by_key(|&s| slots[s as usize].draw_order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_create_hands_out_fifo_slots() {
        let mut pool = EntityPool::new(4);
        let a = pool.create(EntityKind::Smoke, None).unwrap();
        let b = pool.create(EntityKind::Smoke, None).unwrap();
        assert_eq!((a.slot(), b.slot()), (0, 1));
        pool.destroy(a);
        let c = pool.create(EntityKind::Smoke, None).unwrap();
        // Slot 0 went to the back of the queue
        assert_eq!(c.slot(), 2);
        assert_eq!(pool.live_count(), 2);
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn test_exhaustion_is_reported() {
        let mut pool = EntityPool::new(1);
        pool.create(EntityKind::Cloud, None).unwrap();
        let err = pool.create(EntityKind::Smoke, None).unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::PoolExhausted {
                capacity: 1,
                kind: EntityKind::Smoke
            }
        ));
    }

    #[test]
    fn test_stale_handle_never_resolves() {
        let mut pool = EntityPool::new(1);
        let a = pool.create(EntityKind::Smoke, None).unwrap();
        pool.destroy(a);
        let b = pool.create(EntityKind::Cloud, None).unwrap();
        assert_eq!(a.slot(), b.slot());
        assert!(pool.get(a).is_none());
        assert!(pool.get(b).is_some());
        // Destroying through the stale handle leaves the new occupant alone
        assert!(pool.destroy(a).is_empty());
        assert!(pool.is_alive(b));
    }

    #[test]
    fn test_destroy_is_depth_first_children_before_parent() {
        let mut pool = EntityPool::new(8);
        let root = pool.create(EntityKind::Level, None).unwrap();
        let a = pool.create(EntityKind::Terrain, Some(root)).unwrap();
        let a1 = pool.create(EntityKind::Hair, Some(a)).unwrap();
        let b = pool.create(EntityKind::Platform, Some(root)).unwrap();

        let order: Vec<EntityRef> = pool.destroy(root).into_iter().map(|(r, _)| r).collect();
        assert_eq!(order, vec![a1, a, b, root]);
        assert_eq!(pool.live_count(), 0);
    }

    #[test]
    fn test_destroy_detaches_from_parent() {
        let mut pool = EntityPool::new(4);
        let parent = pool.create(EntityKind::Hairs, None).unwrap();
        let child = pool.create(EntityKind::Hair, Some(parent)).unwrap();
        pool.destroy(child);
        assert!(pool.get(parent).unwrap().children().is_empty());
    }

    #[test]
    fn test_kind_index_keeps_creation_order() {
        let mut pool = EntityPool::new(8);
        let a1 = pool.create(EntityKind::Smoke, None).unwrap();
        let a2 = pool.create(EntityKind::Smoke, None).unwrap();
        let b = pool.create(EntityKind::Cloud, None).unwrap();
        let a3 = pool.create(EntityKind::Smoke, None).unwrap();

        pool.destroy(a2);
        assert_eq!(pool.all_of_kind(EntityKind::Smoke), vec![a1, a3]);
        assert_eq!(pool.first_of_kind(EntityKind::Cloud), Some(b));
        assert_eq!(pool.first_of_kind(EntityKind::Player), None);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut pool = EntityPool::new(4);
        for order in [3, 1, 2, 1] {
            let e = pool.create(EntityKind::Smoke, None).unwrap();
            pool.get_mut(e).unwrap().draw_order = order;
        }
        pool.sort_by_draw_order();
        assert_eq!(pool.order(), &[1, 3, 2, 0]);
    }

    #[test]
    fn test_write_back_keeps_links() {
        let mut pool = EntityPool::new(4);
        let p = pool.create(EntityKind::Player, None).unwrap();
        let h = pool.create(EntityKind::Hairs, Some(p)).unwrap();

        let mut copy = pool.get(p).unwrap().clone();
        copy.x = 12.0;
        copy.children.clear();
        pool.write_back(p, copy);

        let e = pool.get(p).unwrap();
        assert_eq!(e.x, 12.0);
        assert_eq!(e.children(), &[h]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create { kind: usize, parent: Option<usize> },
        Destroy(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..EntityKind::ALL.len(), proptest::option::of(0usize..64))
                .prop_map(|(kind, parent)| Op::Create { kind, parent }),
            (0usize..64).prop_map(Op::Destroy),
        ]
    }

    fn check_invariants(pool: &EntityPool) {
        let cap = pool.capacity();
        assert_eq!(pool.live_count() + pool.free_count(), cap);

        let mut in_free = vec![false; cap];
        for &s in &pool.free {
            assert!(!in_free[s as usize], "slot {s} free twice");
            in_free[s as usize] = true;
        }
        for (i, e) in pool.slots.iter().enumerate() {
            assert_eq!(e.destroyed, in_free[i]);
            if e.destroyed {
                continue;
            }
            assert!(pool.kind_slots(e.kind).contains(&(i as u32)));
            for c in e.children() {
                let child = pool.get(*c).expect("child is live");
                assert_eq!(child.parent(), Some(e.handle()));
            }
        }
        for kind in EntityKind::ALL {
            for &s in pool.kind_slots(kind) {
                let e = &pool.slots[s as usize];
                assert!(!e.destroyed);
                assert_eq!(e.kind, kind);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_pool_bookkeeping_holds(ops in proptest::collection::vec(op(), 1..200)) {
            let mut pool = EntityPool::new(16);
            let mut handles: Vec<EntityRef> = Vec::new();
            for op in ops {
                match op {
                    Op::Create { kind, parent } => {
                        let parent = parent
                            .and_then(|i| handles.get(i % handles.len().max(1)).copied())
                            .filter(|p| pool.is_alive(*p));
                        if let Ok(h) = pool.create(EntityKind::ALL[kind], parent) {
                            handles.push(h);
                        }
                    }
                    Op::Destroy(i) => {
                        if let Some(h) = handles.get(i % handles.len().max(1)).copied() {
                            pool.destroy(h);
                        }
                    }
                }
                check_invariants(&pool);
            }
        }
    }
}
