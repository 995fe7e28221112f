//! Functions crossing the bridge.
//!
//! The destination gets a new function whose every call is forwarded to the original. The
//! caller's `this` is ignored; the original is invoked with the value it was reached through.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::runner::bridge::converter::{live_realm, pass_value, Crossing};
use crate::runner::bridge::error::BridgeError;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::function_object::JsFunctionObject;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{call, get};
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::value::JsValue;

pub const UNKNOWN_EXCEPTION_MESSAGE: &str = "An unknown exception occurred in the isolated context, an error occurred but a valid exception was not thrown.";

/// State captured by a function proxy.
pub struct FunctionHandle {
    pub source_realm: RealmId,
    pub destination_realm: RealmId,
    function: JsObjectType,
    receiver: JsValue,
    crossing: Crossing,
}
impl FunctionHandle {
    fn invoke(&self, ctx: &mut EvalContext, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
        let owning_global = match live_realm(ctx, self.source_realm) {
            Ok(realm) => JsValue::Object(realm.borrow().global_object()),
            Err(e) => {
                warn!(realm = %self.source_realm, "call through a proxy of a torn down realm");
                return Err(e.into());
            }
        };
        let calling_global = {
            let realm = live_realm(ctx, self.destination_realm)?;
            let global = realm.borrow().global_object();
            JsValue::Object(global)
        };

        let back = self.crossing.reversed();
        let mut converted_args = Vec::with_capacity(args.len());
        for arg in &args {
            converted_args.push(pass_value(ctx, back, arg, &calling_global)?);
        }

        let result = match call(
            ctx,
            &JsValue::Object(self.function.clone()),
            self.receiver.clone(),
            converted_args,
        ) {
            Ok(result) => result,
            Err(thrown) => {
                let message = thrown_message(ctx, &thrown)
                    .unwrap_or_else(|| UNKNOWN_EXCEPTION_MESSAGE.to_string());
                debug!(realm = %self.source_realm, message = %message, "proxied function threw");
                return Err(JErrorType::Error(message));
            }
        };

        pass_value(ctx, self.crossing, &result, &owning_global)
            .map_err(|e| JErrorType::Error(e.message()))
    }
}

/// Message of a thrown value, if it looks like an error.
pub(crate) fn thrown_message(ctx: &mut EvalContext, thrown: &JErrorType) -> Option<String> {
    match thrown {
        JErrorType::Exception(JsValue::Object(o)) => {
            match get(ctx, o, &PropertyKey::from("message")) {
                Ok(JsValue::String(message)) => Some(message),
                _ => None,
            }
        }
        JErrorType::Exception(_) => None,
        e => e.message().map(str::to_string),
    }
}

/// Wraps `function`, which lives in `crossing.source`, in a function of `crossing.destination`.
/// `receiver` is the `this` every forwarded call uses. Arguments and results are never frozen,
/// even when the proxy itself is.
pub fn create_function_proxy(
    ctx: &mut EvalContext,
    crossing: Crossing,
    function: &JsObjectType,
    receiver: &JsValue,
) -> Result<JsObjectType, BridgeError> {
    let crossing = crossing.with_freeze(false);
    let destination = live_realm(ctx, crossing.destination)?;
    let name = (**function)
        .borrow()
        .as_function()
        .map(|f| f.name().to_string())
        .unwrap_or_default();
    let handle = Rc::new(FunctionHandle {
        source_realm: crossing.source,
        destination_realm: crossing.destination,
        function: function.clone(),
        receiver: receiver.clone(),
        crossing,
    });
    debug!(
        source = %crossing.source,
        destination = %crossing.destination,
        name = %name,
        "created function proxy"
    );
    let proxy = destination
        .borrow()
        .new_closure_function(&name, move |ctx, _this, args| handle.invoke(ctx, args));
    Ok(proxy)
}
