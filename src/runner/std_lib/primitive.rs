//! Symbol, String, Number, Boolean and BigInt.
//!
//! Only what boxed primitives need: constructors that convert, and `toString`/`valueOf`.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::operations::type_conversion::{display_string, to_boolean, to_number, to_string};
use crate::runner::ds::realm::{CodeRealm, WellKnownIntrinsics};
use crate::runner::ds::symbol::{SymbolData, SYMBOL_TO_STRING_TAG};
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::builtin::{argument, BuiltInObject};

/// Install the primitive wrappers.
pub fn install(realm: &mut CodeRealm) -> Result<(), JErrorType> {
    BuiltInObject::new("Symbol")
        .with_prototype(WellKnownIntrinsics::SymbolPrototype)
        .with_constructor(WellKnownIntrinsics::Symbol, symbol_constructor)
        .add_method("toString", primitive_to_string)
        .add_method("valueOf", primitive_value_of)
        .add_getter("description", symbol_description)
        .add_static_property("toStringTag", JsValue::Symbol(SYMBOL_TO_STRING_TAG.clone()))
        .install(realm)?;

    BuiltInObject::new("String")
        .with_prototype(WellKnownIntrinsics::StringPrototype)
        .with_constructor(WellKnownIntrinsics::String, string_constructor)
        .add_method("toString", primitive_to_string)
        .add_method("valueOf", primitive_value_of)
        .install(realm)?;

    BuiltInObject::new("Number")
        .with_prototype(WellKnownIntrinsics::NumberPrototype)
        .with_constructor(WellKnownIntrinsics::Number, number_constructor)
        .add_method("toString", primitive_to_string)
        .add_method("valueOf", primitive_value_of)
        .install(realm)?;

    BuiltInObject::new("Boolean")
        .with_prototype(WellKnownIntrinsics::BooleanPrototype)
        .with_constructor(WellKnownIntrinsics::Boolean, boolean_constructor)
        .add_method("toString", primitive_to_string)
        .add_method("valueOf", primitive_value_of)
        .install(realm)?;

    BuiltInObject::new("BigInt")
        .with_prototype(WellKnownIntrinsics::BigIntPrototype)
        .add_method("toString", primitive_to_string)
        .add_method("valueOf", primitive_value_of)
        .install(realm)?;
    Ok(())
}

/// Unboxes `this` when it is a wrapper object.
fn this_primitive(this: &JsValue) -> JsValue {
    if let JsValue::Object(o) = this {
        if let ObjectType::PrimitiveWrapper(p) = &*(**o).borrow() {
            return p.primitive().clone();
        }
    }
    this.clone()
}

/// Symbol(description)
fn symbol_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Symbol(match argument(&args, 0) {
        JsValue::Undefined => SymbolData::new_empty(),
        d => SymbolData::new(to_string(ctx, &d)?),
    }))
}

/// Symbol.prototype.description
fn symbol_description(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match this_primitive(&this) {
        JsValue::Symbol(s) => Ok(s
            .description()
            .map(JsValue::from)
            .unwrap_or(JsValue::Undefined)),
        _ => Err(JErrorType::TypeError("not a symbol".to_string())),
    }
}

/// String(value). Unlike ToString, symbols are described rather than rejected.
fn string_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(match argument(&args, 0) {
        JsValue::Undefined if args.is_empty() => String::new(),
        s @ JsValue::Symbol(_) => display_string(&s),
        v => to_string(ctx, &v)?,
    }))
}

/// Number(value)
fn number_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if args.is_empty() {
        return Ok(JsValue::from(0));
    }
    Ok(JsValue::from(to_number(&argument(&args, 0))?))
}

/// Boolean(value)
fn boolean_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_boolean(&argument(&args, 0))))
}

fn primitive_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(display_string(&this_primitive(&this))))
}

fn primitive_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(this_primitive(&this))
}
