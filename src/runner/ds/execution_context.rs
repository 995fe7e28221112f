use tracing::{trace, warn};

use crate::runner::ds::agent::Agent;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::realm::{JsCodeRealmType, RealmId};
use crate::runner::ds::value::JsValue;

pub struct ExecutionContext {
    pub function: Option<JsObjectType>,
    pub realm: RealmId,
}

pub struct ExecutionContextStack {
    stack: Vec<ExecutionContext>,
}
impl ExecutionContextStack {
    pub fn new() -> Self {
        ExecutionContextStack { stack: Vec::new() }
    }

    pub fn get_running_execution_ctx(&self) -> Option<&ExecutionContext> {
        self.stack.last()
    }

    pub fn pop_running_execution_ctx(&mut self) -> Option<ExecutionContext> {
        self.stack.pop()
    }

    pub fn push_execution_ctx(&mut self, ctx: ExecutionContext) {
        self.stack.push(ctx)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
impl Default for ExecutionContextStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle passed to every native function: the agent plus the stack of running
/// execution contexts, whose top decides the current realm.
pub struct EvalContext {
    pub agent: Agent,
    pub ctx_stack: ExecutionContextStack,
}
impl EvalContext {
    pub fn new() -> Self {
        EvalContext {
            agent: Agent::new(),
            ctx_stack: ExecutionContextStack::new(),
        }
    }

    pub fn current_realm_id(&self) -> Option<RealmId> {
        self.ctx_stack.get_running_execution_ctx().map(|c| c.realm)
    }

    pub fn current_realm(&self) -> Result<JsCodeRealmType, JErrorType> {
        match self.current_realm_id() {
            Some(id) => self.realm(id),
            None => Err(JErrorType::Error("no realm is running".to_string())),
        }
    }

    pub fn realm(&self, id: RealmId) -> Result<JsCodeRealmType, JErrorType> {
        self.agent
            .realm(id)
            .ok_or_else(|| JErrorType::Error(format!("{} is no longer available", id)))
    }

    /// Runs `f` with `realm` as the current realm.
    pub fn with_realm<R>(
        &mut self,
        realm: RealmId,
        function: Option<JsObjectType>,
        f: impl FnOnce(&mut EvalContext) -> R,
    ) -> R {
        self.ctx_stack
            .push_execution_ctx(ExecutionContext { function, realm });
        let result = f(self);
        self.ctx_stack.pop_running_execution_ctx();
        result
    }

    /// Drains the job queue in FIFO order, including jobs enqueued while draining.
    /// Returns the number of jobs run.
    pub fn run_microtasks(&mut self) -> usize {
        let mut ran = 0;
        while let Some((realm, job)) = self.agent.next_job() {
            if !self.agent.has_realm(realm) {
                trace!(realm = %realm, "dropping job of torn down realm");
                continue;
            }
            ran += 1;
            if let Err(e) = self.with_realm(realm, None, job) {
                warn!(realm = %realm, error = %e, "uncaught error in job");
            }
        }
        ran
    }

    /// Materialises an error as a JS value in the current realm. Thrown values pass
    /// through unchanged.
    pub fn error_to_value(&self, error: JErrorType) -> JsValue {
        match error {
            JErrorType::Exception(v) => v,
            e => {
                let message = e.message().unwrap_or_default().to_string();
                match self.current_realm() {
                    Ok(realm) => JsValue::Object(realm.borrow().new_error(e.kind(), &message)),
                    Err(_) => JsValue::String(message),
                }
            }
        }
    }
}
impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}
