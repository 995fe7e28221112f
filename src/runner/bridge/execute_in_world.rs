//! Running a function inside another world.
//!
//! Only stateless native functions can move: the function is re-created in the target realm
//! from its function pointer, so it runs against the target's own built-ins.

use tracing::{debug, info};

use crate::runner::bridge::converter::{live_realm, pass_value, ConvertOptions, Crossing};
use crate::runner::bridge::error::BridgeError;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::function_object::{BuiltInFn, JsFunctionObject};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{call, get, length_of_array_like};
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::value::JsValue;

/// Most arguments a script may pass.
pub const MAX_SCRIPT_ARGUMENTS: u32 = 65_535;

/// The `{ func, args }` pair handed to `executeInWorld`.
#[derive(Clone, Debug)]
pub struct ExecutionScript {
    pub func: JsValue,
    pub args: Vec<JsValue>,
}
impl ExecutionScript {
    pub fn new(func: JsValue, args: Vec<JsValue>) -> Self {
        ExecutionScript { func, args }
    }

    /// Reads `func` and `args` off a script object.
    pub fn from_value(ctx: &mut EvalContext, script: &JsValue) -> Result<Self, BridgeError> {
        let script = match script {
            JsValue::Object(o) => o.clone(),
            _ => return Err(JErrorType::TypeError("The script must be an object".to_string()).into()),
        };
        let func = get(ctx, &script, &PropertyKey::from("func"))?;
        if !func.is_callable() {
            return Err(JErrorType::Error("Function 'func' is required in script".to_string()).into());
        }
        let args = match get(ctx, &script, &PropertyKey::from("args"))? {
            JsValue::Undefined => vec![],
            JsValue::Object(list) if (*list).borrow().is_array() => {
                let length = length_of_array_like(ctx, &list)?;
                if length > MAX_SCRIPT_ARGUMENTS {
                    return Err(JErrorType::RangeError(format!(
                        "'args' may hold at most {} arguments",
                        MAX_SCRIPT_ARGUMENTS
                    ))
                    .into());
                }
                let mut args = Vec::with_capacity(length as usize);
                for idx in 0..length {
                    args.push(get(ctx, &list, &PropertyKey::Int(idx))?);
                }
                args
            }
            _ => return Err(JErrorType::Error("'args' must be an array".to_string()).into()),
        };
        Ok(ExecutionScript { func, args })
    }
}

/// Calls `script.func` in `target` with `script.args` bridged over from `caller`, and bridges
/// the result back.
pub fn execute_in_world(
    ctx: &mut EvalContext,
    caller: RealmId,
    target: RealmId,
    script: &ExecutionScript,
    options: ConvertOptions,
) -> Result<JsValue, BridgeError> {
    let caller_realm = live_realm(ctx, caller)?;
    let target_realm = live_realm(ctx, target)?;

    let (name, behavior) = match &script.func {
        JsValue::Object(o) => match (**o).borrow().as_function() {
            Some(f) => (f.name().to_string(), f.behavior()),
            None => {
                return Err(JErrorType::Error("Function 'func' is required in script".to_string()).into())
            }
        },
        _ => return Err(JErrorType::Error("Function 'func' is required in script".to_string()).into()),
    };
    let native = match behavior {
        BuiltInFn::Native(f) => f,
        BuiltInFn::Closure(_) => {
            return Err(JErrorType::Error(format!(
                "Function '{}' captures state and cannot run in another world",
                name
            ))
            .into())
        }
    };
    let function = target_realm.borrow().new_native_function(&name, native);

    let caller_global = JsValue::Object(caller_realm.borrow().global_object());
    let inbound = Crossing::new(caller, target, options);
    let mut args = Vec::with_capacity(script.args.len());
    for (idx, arg) in script.args.iter().enumerate() {
        match pass_value(ctx, inbound, arg, &caller_global) {
            Ok(arg) => args.push(arg),
            Err(e) => {
                debug!(index = idx, error = %e, "failed to bridge script argument");
                return Err(JErrorType::Error(format!("Failed to proxy argument at index {}", idx)).into());
            }
        }
    }

    info!(caller = %caller, target = %target, function = %name, "executing in world");
    let result = match call(ctx, &JsValue::Object(function), JsValue::Null, args) {
        Ok(result) => result,
        Err(thrown) => {
            let message = match thrown {
                JErrorType::Exception(value) => ctx
                    .with_realm(target, None, |ctx| to_string(ctx, &value))
                    .unwrap_or_else(|e| e.to_string()),
                e => format!("{}: {}", e.kind().name(), e.message().unwrap_or_default()),
            };
            return Err(BridgeError::CrossRealmException(message));
        }
    };

    let target_global = JsValue::Object(target_realm.borrow().global_object());
    pass_value(ctx, inbound.reversed(), &result, &target_global)
}
