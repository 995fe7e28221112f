//! Per realm bookkeeping of everything that crossed the bridge.
//!
//! Each realm keeps one [`IdentityStore`] per peer realm, with two tables. The outgoing table
//! maps an object of the owning realm to the proxy built for it in the peer; its key also
//! carries the [`ProxyFlavour`] and, for functions, the receiver the proxy calls with. The
//! incoming table maps a proxy living in the owning realm back to its original in the peer,
//! which is what unwraps a proxy that is sent back home. Every crossing is recorded in both
//! realms.
//!
//! Entries hold weak references only. An entry whose object has been dropped is a miss, and
//! a reused address is told apart by comparing the upgraded pointer with the queried one.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::trace;

use crate::runner::ds::object::{JsObjectType, JsObjectWeakType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::realm::RealmId;

/// How a proxy behaves. Crossings of one object with different flavours get different proxies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProxyFlavour {
    /// The proxy and everything created along with it is frozen.
    pub frozen: bool,
    /// Source accessors are mirrored live instead of being read once.
    pub dynamic_props: bool,
}

/// Outgoing table key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProxyKey {
    object: usize,
    receiver: usize,
    flavour: ProxyFlavour,
}
impl ProxyKey {
    /// `receiver` is only given for functions, whose proxies call with a fixed `this`.
    pub fn new(object: &JsObjectType, receiver: Option<&JsObjectType>, flavour: ProxyFlavour) -> Self {
        ProxyKey {
            object: address_of(object),
            receiver: receiver.map(address_of).unwrap_or(0),
            flavour,
        }
    }
}

/// One crossing of an object from `source_realm` into `destination_realm`.
pub struct ObjectProxyHandle {
    pub source_realm: RealmId,
    source: JsObjectWeakType,
    pub destination_realm: RealmId,
    proxy: JsObjectWeakType,
    frozen: bool,
    /// Source keys the proxy mirrors, as of its last sync.
    mirrored_keys: RefCell<Vec<PropertyKey>>,
}
impl ObjectProxyHandle {
    pub fn new(
        source_realm: RealmId,
        source: &JsObjectType,
        destination_realm: RealmId,
        proxy: &JsObjectType,
        frozen: bool,
    ) -> Self {
        ObjectProxyHandle {
            source_realm,
            source: Rc::downgrade(source),
            destination_realm,
            proxy: Rc::downgrade(proxy),
            frozen,
            mirrored_keys: RefCell::new(vec![]),
        }
    }

    pub fn source(&self) -> Option<JsObjectType> {
        self.source.upgrade()
    }

    pub fn proxy(&self) -> Option<JsObjectType> {
        self.proxy.upgrade()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn is_alive(&self) -> bool {
        self.source.strong_count() > 0 && self.proxy.strong_count() > 0
    }

    pub fn mirrored_keys(&self) -> Vec<PropertyKey> {
        self.mirrored_keys.borrow().clone()
    }

    pub fn set_mirrored_keys(&self, keys: Vec<PropertyKey>) {
        *self.mirrored_keys.borrow_mut() = keys;
    }

    fn is_source(&self, object: &JsObjectType) -> bool {
        self.source().map_or(false, |s| Rc::ptr_eq(&s, object))
    }

    fn is_proxy(&self, object: &JsObjectType) -> bool {
        self.proxy().map_or(false, |p| Rc::ptr_eq(&p, object))
    }
}

fn address_of(object: &JsObjectType) -> usize {
    Rc::as_ptr(object) as *const () as usize
}

/// Crossings between the owning realm and one peer realm.
pub struct IdentityStore {
    peer: RealmId,
    outgoing: HashMap<ProxyKey, Rc<ObjectProxyHandle>>,
    incoming: HashMap<usize, Rc<ObjectProxyHandle>>,
}
impl IdentityStore {
    pub fn new(peer: RealmId) -> Self {
        IdentityStore {
            peer,
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
        }
    }

    pub fn peer(&self) -> RealmId {
        self.peer
    }

    /// The live proxy in the peer built for `object` under `key`.
    pub fn proxy_handle(&self, key: &ProxyKey, object: &JsObjectType) -> Option<Rc<ObjectProxyHandle>> {
        self.outgoing
            .get(key)
            .filter(|h| h.is_source(object) && h.proxy().is_some())
            .cloned()
    }

    /// The peer original of `proxy`, a proxy living in the owning realm.
    pub fn original(&self, proxy: &JsObjectType) -> Option<JsObjectType> {
        self.incoming
            .get(&address_of(proxy))
            .filter(|h| h.is_proxy(proxy))
            .and_then(|h| h.source())
    }

    pub fn insert_outgoing(&mut self, key: ProxyKey, handle: Rc<ObjectProxyHandle>) {
        self.outgoing.insert(key, handle);
    }

    pub fn insert_incoming(&mut self, proxy: &JsObjectType, handle: Rc<ObjectProxyHandle>) {
        self.incoming.insert(address_of(proxy), handle);
    }

    /// Drops the outgoing entry under `key` if it still belongs to `object`.
    pub fn remove_outgoing(&mut self, key: &ProxyKey, object: &JsObjectType) {
        if self.outgoing.get(key).map_or(false, |h| h.is_source(object)) {
            self.outgoing.remove(key);
        }
    }

    /// Drops the incoming entry of `proxy` if it still belongs to it.
    pub fn remove_incoming(&mut self, proxy: &JsObjectType) {
        let key = address_of(proxy);
        if self.incoming.get(&key).map_or(false, |h| h.is_proxy(proxy)) {
            self.incoming.remove(&key);
        }
    }

    /// Removes entries whose source or proxy is gone. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.len();
        self.outgoing.retain(|_, h| h.is_alive());
        self.incoming.retain(|_, h| h.is_alive());
        before - self.len()
    }

    pub fn len(&self) -> usize {
        self.outgoing.len() + self.incoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty() && self.incoming.is_empty()
    }
}

/// A destination promise still waiting on a source promise of the owning realm.
pub struct PendingPromise {
    pub destination_realm: RealmId,
    pub promise: JsObjectType,
}

/// Bridge state owned by a realm. Created with the realm and cleared when it is torn down.
pub struct RealmBridgeState {
    stores: HashMap<RealmId, IdentityStore>,
    exposed_names: HashSet<String>,
    pending_promises: Vec<PendingPromise>,
}
impl RealmBridgeState {
    pub fn new() -> Self {
        RealmBridgeState {
            stores: HashMap::new(),
            exposed_names: HashSet::new(),
            pending_promises: vec![],
        }
    }

    pub fn store(&self, peer: RealmId) -> Option<&IdentityStore> {
        self.stores.get(&peer)
    }

    fn store_mut(&mut self, peer: RealmId) -> &mut IdentityStore {
        self.stores
            .entry(peer)
            .or_insert_with(|| IdentityStore::new(peer))
    }

    /// Handle of the proxy in `peer` built for `object`, an object of this realm.
    pub fn proxy_handle(
        &self,
        peer: RealmId,
        key: &ProxyKey,
        object: &JsObjectType,
    ) -> Option<Rc<ObjectProxyHandle>> {
        let found = self.stores.get(&peer).and_then(|s| s.proxy_handle(key, object));
        if found.is_some() {
            trace!(peer = %peer, "identity store hit");
        }
        found
    }

    /// Original in `peer` of `proxy`, a proxy living in this realm.
    pub fn original(&self, peer: RealmId, proxy: &JsObjectType) -> Option<JsObjectType> {
        let found = self.stores.get(&peer).and_then(|s| s.original(proxy));
        if found.is_some() {
            trace!(peer = %peer, "unwrapped proxy");
        }
        found
    }

    pub fn register_outgoing(&mut self, peer: RealmId, key: ProxyKey, handle: Rc<ObjectProxyHandle>) {
        self.store_mut(peer).insert_outgoing(key, handle);
    }

    pub fn register_incoming(&mut self, peer: RealmId, proxy: &JsObjectType, handle: Rc<ObjectProxyHandle>) {
        self.store_mut(peer).insert_incoming(proxy, handle);
    }

    pub fn unregister_outgoing(&mut self, peer: RealmId, key: &ProxyKey, object: &JsObjectType) {
        if let Some(store) = self.stores.get_mut(&peer) {
            store.remove_outgoing(key, object);
        }
    }

    pub fn unregister_incoming(&mut self, peer: RealmId, proxy: &JsObjectType) {
        if let Some(store) = self.stores.get_mut(&peer) {
            store.remove_incoming(proxy);
        }
    }

    /// Forgets everything shared with a realm that went away.
    pub fn forget_peer(&mut self, peer: RealmId) {
        self.stores.remove(&peer);
        self.pending_promises.retain(|p| p.destination_realm != peer);
    }

    pub fn is_exposed(&self, name: &str) -> bool {
        self.exposed_names.contains(name)
    }

    pub fn mark_exposed(&mut self, name: &str) {
        self.exposed_names.insert(name.to_string());
    }

    pub fn exposed_names(&self) -> impl Iterator<Item = &str> {
        self.exposed_names.iter().map(|s| s.as_str())
    }

    pub fn add_pending_promise(&mut self, pending: PendingPromise) {
        self.pending_promises.retain(|p| is_pending(&p.promise));
        self.pending_promises.push(pending);
    }

    pub fn take_pending_promises(&mut self) -> Vec<PendingPromise> {
        std::mem::take(&mut self.pending_promises)
            .into_iter()
            .filter(|p| is_pending(&p.promise))
            .collect()
    }

    /// Prunes dead entries from every store. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        self.pending_promises.retain(|p| is_pending(&p.promise));
        self.stores.values_mut().map(|s| s.prune()).sum()
    }

    pub fn entry_count(&self) -> usize {
        self.stores.values().map(|s| s.len()).sum()
    }

    pub fn clear(&mut self) {
        self.stores.clear();
        self.exposed_names.clear();
        self.pending_promises.clear();
    }
}
impl Default for RealmBridgeState {
    fn default() -> Self {
        Self::new()
    }
}

fn is_pending(promise: &JsObjectType) -> bool {
    (**promise)
        .borrow()
        .as_promise()
        .map(|p| p.is_pending())
        .unwrap_or(false)
}
