//! The agent: every realm of a frame plus the one job queue they share.

use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::cell::RefCell;

use tracing::debug;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::host_object::HostNodeRef;
use crate::runner::ds::realm::{CodeRealm, JsCodeRealmType, RealmId};

pub type Job = Box<dyn FnOnce(&mut EvalContext) -> Result<(), JErrorType>>;

struct PendingJob {
    realm: RealmId,
    job: Job,
}

pub struct Agent {
    realms: BTreeMap<RealmId, JsCodeRealmType>,
    next_realm_id: u32,
    jobs: VecDeque<PendingJob>,
}
impl Agent {
    pub fn new() -> Self {
        Agent {
            realms: BTreeMap::new(),
            next_realm_id: 1,
            jobs: VecDeque::new(),
        }
    }

    pub fn create_realm(
        &mut self,
        world_id: i32,
        document: Option<HostNodeRef>,
    ) -> Result<JsCodeRealmType, JErrorType> {
        let id = RealmId(self.next_realm_id);
        self.next_realm_id += 1;
        let realm = Rc::new(RefCell::new(CodeRealm::new(id, world_id, document)?));
        self.realms.insert(id, realm.clone());
        debug!(realm = %id, world_id, "created realm");
        Ok(realm)
    }

    pub fn realm(&self, id: RealmId) -> Option<JsCodeRealmType> {
        self.realms.get(&id).cloned()
    }

    pub fn has_realm(&self, id: RealmId) -> bool {
        self.realms.contains_key(&id)
    }

    /// Unregisters a realm. Queued jobs tagged with it are dropped.
    pub fn remove_realm(&mut self, id: RealmId) -> Option<JsCodeRealmType> {
        let removed = self.realms.remove(&id);
        if removed.is_some() {
            self.jobs.retain(|j| j.realm != id);
        }
        removed
    }

    pub fn realm_ids(&self) -> Vec<RealmId> {
        self.realms.keys().copied().collect()
    }

    pub fn enqueue_job<F>(&mut self, realm: RealmId, job: F)
    where
        F: FnOnce(&mut EvalContext) -> Result<(), JErrorType> + 'static,
    {
        self.jobs.push_back(PendingJob {
            realm,
            job: Box::new(job),
        });
    }

    pub(crate) fn next_job(&mut self) -> Option<(RealmId, Job)> {
        self.jobs.pop_front().map(|j| (j.realm, j.job))
    }
}
impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}
