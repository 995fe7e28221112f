//! Error built-in objects.
//!
//! Provides Error, TypeError, RangeError, ReferenceError and SyntaxError.

use crate::runner::ds::error::{ErrorKind, JErrorType};
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::get;
use crate::runner::ds::operations::type_conversion::{display_string, to_string};
use crate::runner::ds::realm::{CodeRealm, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::builtin::{argument, BuiltInObject};

/// Install all error types.
pub fn install(realm: &mut CodeRealm) -> Result<(), JErrorType> {
    BuiltInObject::new("Error")
        .with_prototype(WellKnownIntrinsics::ErrorPrototype)
        .with_constructor(WellKnownIntrinsics::Error, error_constructor)
        .add_property("name", JsValue::from("Error"))
        .add_property("message", JsValue::from(""))
        .add_method("toString", error_to_string)
        .install(realm)?;

    BuiltInObject::new("TypeError")
        .with_prototype(WellKnownIntrinsics::TypeErrorPrototype)
        .inherits(WellKnownIntrinsics::ErrorPrototype)
        .with_constructor(WellKnownIntrinsics::TypeError, type_error_constructor)
        .add_property("name", JsValue::from("TypeError"))
        .install(realm)?;

    BuiltInObject::new("RangeError")
        .with_prototype(WellKnownIntrinsics::RangeErrorPrototype)
        .inherits(WellKnownIntrinsics::ErrorPrototype)
        .with_constructor(WellKnownIntrinsics::RangeError, range_error_constructor)
        .add_property("name", JsValue::from("RangeError"))
        .install(realm)?;

    BuiltInObject::new("ReferenceError")
        .with_prototype(WellKnownIntrinsics::ReferenceErrorPrototype)
        .inherits(WellKnownIntrinsics::ErrorPrototype)
        .with_constructor(WellKnownIntrinsics::ReferenceError, reference_error_constructor)
        .add_property("name", JsValue::from("ReferenceError"))
        .install(realm)?;

    BuiltInObject::new("SyntaxError")
        .with_prototype(WellKnownIntrinsics::SyntaxErrorPrototype)
        .inherits(WellKnownIntrinsics::ErrorPrototype)
        .with_constructor(WellKnownIntrinsics::SyntaxError, syntax_error_constructor)
        .add_property("name", JsValue::from("SyntaxError"))
        .install(realm)?;
    Ok(())
}

fn construct(ctx: &mut EvalContext, kind: ErrorKind, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let message = match argument(&args, 0) {
        JsValue::Undefined => String::new(),
        m => to_string(ctx, &m)?,
    };
    Ok(JsValue::Object(ctx.current_realm()?.borrow().new_error(kind, &message)))
}

/// Error constructor.
fn error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct(ctx, ErrorKind::Error, args)
}

/// TypeError constructor.
fn type_error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct(ctx, ErrorKind::TypeError, args)
}

/// RangeError constructor.
fn range_error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct(ctx, ErrorKind::RangeError, args)
}

/// ReferenceError constructor.
fn reference_error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct(ctx, ErrorKind::ReferenceError, args)
}

/// SyntaxError constructor.
fn syntax_error_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct(ctx, ErrorKind::SyntaxError, args)
}

/// Error.prototype.toString
fn error_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = match &this {
        JsValue::Object(o) => o.clone(),
        v => return Ok(JsValue::String(display_string(v))),
    };
    let name = get(ctx, &o, &PropertyKey::from("name"))?;
    let message = get(ctx, &o, &PropertyKey::from("message"))?;
    let name = if name.is_nullish() { "Error".to_string() } else { to_string(ctx, &name)? };
    let message = if message.is_nullish() { String::new() } else { to_string(ctx, &message)? };
    Ok(JsValue::String(match (name.is_empty(), message.is_empty()) {
        (_, true) => name,
        (true, false) => message,
        (false, false) => format!("{}: {}", name, message),
    }))
}
