//! Promises crossing the bridge.
//!
//! The destination gets a fresh promise. Reactions registered on the source promise settle it
//! with the bridged outcome; those reactions live in the source realm so they run on the
//! source side of the shared job queue.

use tracing::debug;

use crate::runner::bridge::converter::{live_realm, pass_value, Crossing};
use crate::runner::bridge::error::BridgeError;
use crate::runner::bridge::identity_store::PendingPromise;
use crate::runner::ds::error::{ErrorKind, JErrorType};
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::promise_object::{
    fulfill_promise, perform_promise_then, reject_promise, ReactionKind,
};
use crate::runner::ds::value::JsValue;

/// Proxies `promise`, a promise of `crossing.source`, into `crossing.destination`.
pub fn create_promise_proxy(
    ctx: &mut EvalContext,
    crossing: Crossing,
    promise: &JsObjectType,
) -> Result<JsObjectType, BridgeError> {
    // Settled values are never frozen and read accessors once.
    let crossing = crossing.with_dynamic_props(false).with_freeze(false);
    let source = live_realm(ctx, crossing.source)?;
    let destination = live_realm(ctx, crossing.destination)?;
    let proxy = destination.borrow().new_promise();

    let (on_fulfilled, on_rejected) = {
        let source = source.borrow();
        let fulfilled_proxy = proxy.clone();
        let rejected_proxy = proxy.clone();
        (
            source.new_closure_function("", move |ctx, _this, args| {
                let value = args.into_iter().next().unwrap_or(JsValue::Undefined);
                settle(ctx, crossing, &fulfilled_proxy, value, ReactionKind::Fulfill)?;
                Ok(JsValue::Undefined)
            }),
            source.new_closure_function("", move |ctx, _this, args| {
                let reason = args.into_iter().next().unwrap_or(JsValue::Undefined);
                settle(ctx, crossing, &rejected_proxy, reason, ReactionKind::Reject)?;
                Ok(JsValue::Undefined)
            }),
        )
    };
    perform_promise_then(
        ctx,
        promise,
        JsValue::Object(on_fulfilled),
        JsValue::Object(on_rejected),
        None,
    )?;
    source.borrow_mut().bridge.add_pending_promise(PendingPromise {
        destination_realm: crossing.destination,
        promise: proxy.clone(),
    });
    debug!(
        source = %crossing.source,
        destination = %crossing.destination,
        "created promise proxy"
    );
    Ok(proxy)
}

/// Settles the destination promise with the bridged outcome of the source promise.
fn settle(
    ctx: &mut EvalContext,
    crossing: Crossing,
    proxy: &JsObjectType,
    outcome: JsValue,
    kind: ReactionKind,
) -> Result<(), JErrorType> {
    let (source, destination) = match (
        ctx.agent.realm(crossing.source),
        ctx.agent.realm(crossing.destination),
    ) {
        (Some(s), Some(d)) => (s, d),
        _ => {
            debug!(destination = %crossing.destination, "dropping settlement for a torn down realm");
            return Ok(());
        }
    };
    let receiver = JsValue::Object(source.borrow().global_object());
    match pass_value(ctx, crossing, &outcome, &receiver) {
        Ok(value) => match kind {
            ReactionKind::Fulfill => fulfill_promise(ctx, proxy, value),
            ReactionKind::Reject => reject_promise(ctx, proxy, value),
        },
        Err(e) => {
            let error = destination
                .borrow()
                .new_error(ErrorKind::Error, &e.message());
            reject_promise(ctx, proxy, JsValue::Object(error))
        }
    }
}
