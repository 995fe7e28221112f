//! Promise objects and the abstract operations that settle them.
//!
//! Reactions never run synchronously: settling a promise enqueues one job per reaction on
//! the agent's job queue, tagged with the realm the handler belongs to.

use std::cell::Cell;
use std::mem;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object::{JsObject, JsObjectType, ObjectBase};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{call, get};
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::value::JsValue;

#[derive(Clone, Debug, PartialEq)]
pub enum PromiseState {
    Pending,
    Fulfilled(JsValue),
    Rejected(JsValue),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactionKind {
    Fulfill,
    Reject,
}

#[derive(Clone)]
pub struct PromiseReaction {
    pub capability: Option<JsObjectType>,
    pub kind: ReactionKind,
    pub handler: Option<JsValue>,
}

pub struct PromiseObject {
    base: ObjectBase,
    state: PromiseState,
    fulfill_reactions: Vec<PromiseReaction>,
    reject_reactions: Vec<PromiseReaction>,
}
impl PromiseObject {
    pub fn new(realm: RealmId, prototype: Option<JsObjectType>) -> Self {
        PromiseObject {
            base: ObjectBase::new(realm, prototype),
            state: PromiseState::Pending,
            fulfill_reactions: vec![],
            reject_reactions: vec![],
        }
    }

    pub fn state(&self) -> &PromiseState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == PromiseState::Pending
    }

    /// Moves the promise out of `Pending`, handing back the reactions that must now run.
    fn settle(&mut self, state: PromiseState) -> Option<Vec<PromiseReaction>> {
        if !self.is_pending() {
            return None;
        }
        let fulfill_reactions = mem::take(&mut self.fulfill_reactions);
        let reject_reactions = mem::take(&mut self.reject_reactions);
        let reactions = match &state {
            PromiseState::Rejected(_) => reject_reactions,
            _ => fulfill_reactions,
        };
        self.state = state;
        Some(reactions)
    }
}
impl JsObject for PromiseObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn as_super_trait(&self) -> &dyn JsObject {
        self
    }

    fn as_super_trait_mut(&mut self) -> &mut dyn JsObject {
        self
    }

    fn class_name(&self) -> &'static str {
        "Promise"
    }
}

fn not_a_promise() -> JErrorType {
    JErrorType::TypeError("receiver is not a promise".to_string())
}

pub fn is_promise(value: &JsValue) -> bool {
    match value {
        JsValue::Object(o) => (**o).borrow().as_promise().is_some(),
        _ => false,
    }
}

pub fn promise_state(promise: &JsObjectType) -> Option<PromiseState> {
    (**promise).borrow().as_promise().map(|p| p.state().clone())
}

fn promise_realm(promise: &JsObjectType) -> RealmId {
    (**promise).borrow().as_js_object().realm()
}

pub fn fulfill_promise(
    ctx: &mut EvalContext,
    promise: &JsObjectType,
    value: JsValue,
) -> Result<(), JErrorType> {
    let reactions = {
        let mut p = (**promise).borrow_mut();
        let p = p.as_promise_mut().ok_or_else(not_a_promise)?;
        p.settle(PromiseState::Fulfilled(value.clone()))
    };
    if let Some(reactions) = reactions {
        trigger_promise_reactions(ctx, reactions, value, promise_realm(promise));
    }
    Ok(())
}

pub fn reject_promise(
    ctx: &mut EvalContext,
    promise: &JsObjectType,
    reason: JsValue,
) -> Result<(), JErrorType> {
    let reactions = {
        let mut p = (**promise).borrow_mut();
        let p = p.as_promise_mut().ok_or_else(not_a_promise)?;
        p.settle(PromiseState::Rejected(reason.clone()))
    };
    if let Some(reactions) = reactions {
        trigger_promise_reactions(ctx, reactions, reason, promise_realm(promise));
    }
    Ok(())
}

/// Resolves `promise` with `resolution`, adopting the state of thenables.
pub fn resolve_promise(
    ctx: &mut EvalContext,
    promise: &JsObjectType,
    resolution: JsValue,
) -> Result<(), JErrorType> {
    if let JsValue::Object(o) = &resolution {
        if Rc::ptr_eq(o, promise) {
            let reason = ctx.error_to_value(JErrorType::TypeError(
                "Chaining cycle detected for promise".to_string(),
            ));
            return reject_promise(ctx, promise, reason);
        }
        let then = match get(ctx, o, &PropertyKey::Str("then".to_string())) {
            Ok(then) => then,
            Err(e) => {
                let reason = ctx.error_to_value(e);
                return reject_promise(ctx, promise, reason);
            }
        };
        if then.is_callable() {
            let job_promise = promise.clone();
            ctx.agent.enqueue_job(
                promise_realm(promise),
                move |ctx| promise_resolve_thenable_job(ctx, &job_promise, resolution, then),
            );
            return Ok(());
        }
    }
    fulfill_promise(ctx, promise, resolution)
}

fn promise_resolve_thenable_job(
    ctx: &mut EvalContext,
    promise: &JsObjectType,
    thenable: JsValue,
    then: JsValue,
) -> Result<(), JErrorType> {
    let (resolve, reject) = create_resolving_functions(ctx, promise)?;
    let result = call(
        ctx,
        &then,
        thenable,
        vec![JsValue::Object(resolve), JsValue::Object(reject.clone())],
    );
    if let Err(e) = result {
        let reason = ctx.error_to_value(e);
        call(ctx, &JsValue::Object(reject), JsValue::Undefined, vec![reason])?;
    }
    Ok(())
}

/// The `resolve`/`reject` pair handed to executors and thenables. Only the first call of
/// either function has any effect.
pub fn create_resolving_functions(
    ctx: &mut EvalContext,
    promise: &JsObjectType,
) -> Result<(JsObjectType, JsObjectType), JErrorType> {
    let realm = ctx.realm(promise_realm(promise))?;
    let already_resolved = Rc::new(Cell::new(false));

    let resolve = {
        let promise = promise.clone();
        let already_resolved = already_resolved.clone();
        realm.borrow().new_closure_function(
            "",
            move |ctx, _this, args| {
                if already_resolved.replace(true) {
                    return Ok(JsValue::Undefined);
                }
                let resolution = args.into_iter().next().unwrap_or(JsValue::Undefined);
                resolve_promise(ctx, &promise, resolution)?;
                Ok(JsValue::Undefined)
            },
        )
    };
    let reject = {
        let promise = promise.clone();
        realm.borrow().new_closure_function(
            "",
            move |ctx, _this, args| {
                if already_resolved.replace(true) {
                    return Ok(JsValue::Undefined);
                }
                let reason = args.into_iter().next().unwrap_or(JsValue::Undefined);
                reject_promise(ctx, &promise, reason)?;
                Ok(JsValue::Undefined)
            },
        )
    };
    Ok((resolve, reject))
}

/// PerformPromiseThen. `capability` is the derived promise settled with the handler's
/// outcome, if any.
pub fn perform_promise_then(
    ctx: &mut EvalContext,
    promise: &JsObjectType,
    on_fulfilled: JsValue,
    on_rejected: JsValue,
    capability: Option<JsObjectType>,
) -> Result<(), JErrorType> {
    let fulfill_reaction = PromiseReaction {
        capability: capability.clone(),
        kind: ReactionKind::Fulfill,
        handler: if on_fulfilled.is_callable() {
            Some(on_fulfilled)
        } else {
            None
        },
    };
    let reject_reaction = PromiseReaction {
        capability,
        kind: ReactionKind::Reject,
        handler: if on_rejected.is_callable() {
            Some(on_rejected)
        } else {
            None
        },
    };
    let settled = {
        let mut p = (**promise).borrow_mut();
        let p = p.as_promise_mut().ok_or_else(not_a_promise)?;
        match &p.state {
            PromiseState::Pending => {
                p.fulfill_reactions.push(fulfill_reaction);
                p.reject_reactions.push(reject_reaction);
                None
            }
            PromiseState::Fulfilled(v) => Some((fulfill_reaction, v.clone())),
            PromiseState::Rejected(r) => Some((reject_reaction, r.clone())),
        }
    };
    if let Some((reaction, argument)) = settled {
        enqueue_reaction_job(ctx, reaction, argument, promise_realm(promise));
    }
    Ok(())
}

fn trigger_promise_reactions(
    ctx: &mut EvalContext,
    reactions: Vec<PromiseReaction>,
    argument: JsValue,
    fallback_realm: RealmId,
) {
    for reaction in reactions {
        enqueue_reaction_job(ctx, reaction, argument.clone(), fallback_realm);
    }
}

fn enqueue_reaction_job(
    ctx: &mut EvalContext,
    reaction: PromiseReaction,
    argument: JsValue,
    fallback_realm: RealmId,
) {
    let realm = reaction
        .handler
        .as_ref()
        .and_then(|h| h.as_object())
        .map(|h| (**h).borrow().as_js_object().realm())
        .unwrap_or(fallback_realm);
    ctx.agent.enqueue_job(
        realm,
        move |ctx| promise_reaction_job(ctx, reaction, argument),
    );
}

fn promise_reaction_job(
    ctx: &mut EvalContext,
    reaction: PromiseReaction,
    argument: JsValue,
) -> Result<(), JErrorType> {
    let handler_result = match &reaction.handler {
        None => match reaction.kind {
            ReactionKind::Fulfill => Ok(argument),
            ReactionKind::Reject => Err(JErrorType::Exception(argument)),
        },
        Some(handler) => call(ctx, handler, JsValue::Undefined, vec![argument]),
    };
    match reaction.capability {
        None => handler_result.map(|_| ()),
        Some(capability) => match handler_result {
            Ok(value) => resolve_promise(ctx, &capability, value),
            Err(e) => {
                let reason = ctx.error_to_value(e);
                reject_promise(ctx, &capability, reason)
            }
        },
    }
}
