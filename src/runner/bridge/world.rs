//! A frame and the worlds running in it.
//!
//! Every world is a realm of the frame's single agent, so all of them share one job queue.
//! They also share one document: each world wraps the same host nodes in its own objects.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::runner::bridge::error::BridgeError;
use crate::runner::ds::error::ErrorKind;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::host_object::{HostNode, HostNodeRef};
use crate::runner::ds::promise_object::reject_promise;
use crate::runner::ds::realm::{JsCodeRealmType, RealmId};
use crate::runner::ds::value::JsValue;

/// The world page content runs in.
pub const MAIN_WORLD_ID: i32 = 0;

/// The world preload scripts run in.
pub const ISOLATED_WORLD_ID: i32 = 999;

pub struct Frame {
    ctx: EvalContext,
    document: HostNodeRef,
    worlds: BTreeMap<i32, RealmId>,
}
impl Frame {
    /// A frame with a fresh document and its main world.
    pub fn new() -> Result<Self, BridgeError> {
        let mut frame = Frame {
            ctx: EvalContext::new(),
            document: HostNode::new_document(),
            worlds: BTreeMap::new(),
        };
        frame.create_world(MAIN_WORLD_ID)?;
        Ok(frame)
    }

    pub fn ctx(&mut self) -> &mut EvalContext {
        &mut self.ctx
    }

    pub fn document(&self) -> &HostNodeRef {
        &self.document
    }

    pub fn world(&self, world_id: i32) -> Result<RealmId, BridgeError> {
        self.worlds
            .get(&world_id)
            .copied()
            .ok_or(BridgeError::UnknownWorld(world_id))
    }

    pub fn main_world(&self) -> Result<RealmId, BridgeError> {
        self.world(MAIN_WORLD_ID)
    }

    pub fn world_ids(&self) -> Vec<i32> {
        self.worlds.keys().copied().collect()
    }

    pub fn realm(&self, world_id: i32) -> Result<JsCodeRealmType, BridgeError> {
        let id = self.world(world_id)?;
        self.ctx
            .agent
            .realm(id)
            .ok_or(BridgeError::StaleHandle { realm: id })
    }

    fn create_world(&mut self, world_id: i32) -> Result<RealmId, BridgeError> {
        let realm = self
            .ctx
            .agent
            .create_realm(world_id, Some(self.document.clone()))?;
        let id = realm.borrow().id();
        self.worlds.insert(world_id, id);
        info!(world_id, realm = %id, "created world");
        Ok(id)
    }

    /// The realm of `world_id`, created on first use.
    pub fn create_isolated_world(&mut self, world_id: i32) -> Result<RealmId, BridgeError> {
        match self.worlds.get(&world_id) {
            Some(id) => Ok(*id),
            None => self.create_world(world_id),
        }
    }

    /// Tears down one world. Proxies into it become stale and promises it still owed other
    /// worlds are rejected.
    pub fn tear_down_world(&mut self, world_id: i32) -> Result<(), BridgeError> {
        let id = self
            .worlds
            .remove(&world_id)
            .ok_or(BridgeError::UnknownWorld(world_id))?;
        let realm = match self.ctx.agent.remove_realm(id) {
            Some(realm) => realm,
            None => return Ok(()),
        };

        let pending = realm.borrow_mut().bridge.take_pending_promises();
        let stale = BridgeError::StaleHandle { realm: id }.to_string();
        let rejected = pending.len();
        for p in pending {
            let destination = match self.ctx.agent.realm(p.destination_realm) {
                Some(d) => d,
                None => continue,
            };
            let reason = destination.borrow().new_error(ErrorKind::Error, &stale);
            if let Err(e) = reject_promise(&mut self.ctx, &p.promise, JsValue::Object(reason)) {
                warn!(realm = %id, error = %e, "failed to reject a promise of a torn down world");
            }
        }

        for other in self.ctx.agent.realm_ids() {
            if let Some(other) = self.ctx.agent.realm(other) {
                other.borrow_mut().bridge.forget_peer(id);
            }
        }
        realm.borrow_mut().tear_down();
        info!(world_id, realm = %id, rejected, "tore down world");
        Ok(())
    }

    /// Tears down every world, loads a new document and recreates the main world.
    pub fn reload(&mut self) -> Result<RealmId, BridgeError> {
        self.destroy();
        self.document = HostNode::new_document();
        self.create_world(MAIN_WORLD_ID)
    }

    /// Tears down every world.
    pub fn destroy(&mut self) {
        // Isolated worlds first, the main world last.
        for world_id in self.world_ids().into_iter().rev() {
            if let Err(e) = self.tear_down_world(world_id) {
                warn!(world_id, error = %e, "failed to tear down world");
            }
        }
    }

    pub fn run_microtasks(&mut self) -> usize {
        self.ctx.run_microtasks()
    }

    /// Drops bookkeeping of bridged values that have been reclaimed. Returns how many
    /// identity store entries were removed.
    pub fn collect_garbage(&mut self) -> usize {
        let mut pruned = 0;
        for id in self.ctx.agent.realm_ids() {
            if let Some(realm) = self.ctx.agent.realm(id) {
                pruned += realm.borrow_mut().bridge.prune();
            }
        }
        pruned
    }
}
