//! Promise built-in.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::object::call;
use crate::runner::ds::promise_object::{
    create_resolving_functions, is_promise, perform_promise_then, reject_promise,
    resolve_promise,
};
use crate::runner::ds::realm::{CodeRealm, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::builtin::{argument, BuiltInObject};

/// Install the Promise built-in.
pub fn install(realm: &mut CodeRealm) -> Result<(), JErrorType> {
    BuiltInObject::new("Promise")
        .with_prototype(WellKnownIntrinsics::PromisePrototype)
        .with_constructor(WellKnownIntrinsics::Promise, promise_constructor)
        .add_method("then", promise_then)
        .add_method("catch", promise_catch)
        .add_static_method("resolve", promise_resolve)
        .add_static_method("reject", promise_reject)
        .install(realm)?;
    Ok(())
}

fn new_promise(ctx: &EvalContext) -> Result<JsObjectType, JErrorType> {
    Ok(ctx.current_realm()?.borrow().new_promise())
}

/// Promise constructor. The executor runs synchronously; a throw rejects the promise.
fn promise_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let executor = argument(&args, 0);
    if !executor.is_callable() {
        return Err(JErrorType::TypeError(
            "Promise resolver is not a function".to_string(),
        ));
    }
    let promise = new_promise(ctx)?;
    let (resolve, reject) = create_resolving_functions(ctx, &promise)?;
    let outcome = call(
        ctx,
        &executor,
        JsValue::Undefined,
        vec![JsValue::Object(resolve), JsValue::Object(reject.clone())],
    );
    if let Err(e) = outcome {
        let reason = ctx.error_to_value(e);
        call(ctx, &JsValue::Object(reject), JsValue::Undefined, vec![reason])?;
    }
    Ok(JsValue::Object(promise))
}

/// Promise.prototype.then
fn promise_then(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let promise = match &this {
        JsValue::Object(o) if is_promise(&this) => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(
                "Promise.prototype.then called on incompatible receiver".to_string(),
            ))
        }
    };
    let derived = new_promise(ctx)?;
    perform_promise_then(
        ctx,
        &promise,
        argument(&args, 0),
        argument(&args, 1),
        Some(derived.clone()),
    )?;
    Ok(JsValue::Object(derived))
}

/// Promise.prototype.catch
fn promise_catch(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    promise_then(ctx, this, vec![JsValue::Undefined, argument(&args, 0)])
}

/// Promise.resolve. Promises of the running realm are returned as they are.
fn promise_resolve(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let value = argument(&args, 0);
    if let JsValue::Object(o) = &value {
        if is_promise(&value)
            && Some((**o).borrow().as_js_object().realm()) == ctx.current_realm_id()
        {
            return Ok(value);
        }
    }
    let promise = new_promise(ctx)?;
    resolve_promise(ctx, &promise, value)?;
    Ok(JsValue::Object(promise))
}

/// Promise.reject
fn promise_reject(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let promise = new_promise(ctx)?;
    reject_promise(ctx, &promise, argument(&args, 0))?;
    Ok(JsValue::Object(promise))
}
