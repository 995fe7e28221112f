//! Array built-in.
//!
//! Provides the Array constructor and the prototype methods the bridge tests lean on.
//! Every mutation goes through `put`, so frozen arrays refuse it with a TypeError.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{
    capacity_hint, delete_property_or_throw, get, is_array, length_of_array_like, put,
};
use crate::runner::ds::operations::test_and_comparison::strict_equals;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::realm::{CodeRealm, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::builtin::{argument, this_object, BuiltInObject};

lazy_static! {
    static ref LENGTH: PropertyKey = PropertyKey::Str("length".to_string());
}

/// Install the Array built-in.
pub fn install(realm: &mut CodeRealm) -> Result<(), JErrorType> {
    BuiltInObject::new("Array")
        .with_prototype(WellKnownIntrinsics::ArrayPrototype)
        .with_constructor(WellKnownIntrinsics::Array, array_constructor)
        .add_method("push", array_push)
        .add_method("pop", array_pop)
        .add_method("indexOf", array_index_of)
        .add_method("includes", array_includes)
        .add_method("join", array_join)
        .add_method("toString", array_to_string)
        .add_static_method("isArray", array_is_array)
        .install(realm)?;
    Ok(())
}

/// Array constructor. `Array(n)` makes `n` holes, anything else lists the elements.
fn array_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let realm = ctx.current_realm()?;
    let realm = realm.borrow();
    if let [JsValue::Number(n)] = args.as_slice() {
        let f = n.as_f64();
        if f < 0.0 || f.fract() != 0.0 || f > u32::MAX as f64 {
            return Err(JErrorType::RangeError("Invalid array length".to_string()));
        }
        return Ok(JsValue::Object(realm.new_array_with_length(f as u32)));
    }
    Ok(JsValue::Object(realm.new_array(args)))
}

/// Array.prototype.push
fn array_push(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = this_object(&this, "Array.prototype.push")?;
    let mut len = length_of_array_like(ctx, &o)?;
    for item in args {
        put(ctx, &o, PropertyKey::Int(len), item)?;
        len += 1;
    }
    put(ctx, &o, LENGTH.clone(), JsValue::from(len as i64))?;
    Ok(JsValue::from(len as i64))
}

/// Array.prototype.pop
fn array_pop(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = this_object(&this, "Array.prototype.pop")?;
    let len = length_of_array_like(ctx, &o)?;
    if len == 0 {
        put(ctx, &o, LENGTH.clone(), JsValue::from(0))?;
        return Ok(JsValue::Undefined);
    }
    let index = PropertyKey::Int(len - 1);
    let element = get(ctx, &o, &index)?;
    delete_property_or_throw(&o, &index)?;
    put(ctx, &o, LENGTH.clone(), JsValue::from((len - 1) as i64))?;
    Ok(element)
}

fn find_index(ctx: &mut EvalContext, this: &JsValue, target: &JsValue) -> Result<Option<u32>, JErrorType> {
    let o = this_object(this, "Array.prototype.indexOf")?;
    let len = length_of_array_like(ctx, &o)?;
    for i in 0..len {
        if strict_equals(&get(ctx, &o, &PropertyKey::Int(i))?, target) {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

/// Array.prototype.indexOf
fn array_index_of(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(match find_index(ctx, &this, &argument(&args, 0))? {
        Some(i) => JsValue::from(i as i64),
        None => JsValue::from(-1),
    })
}

/// Array.prototype.includes
fn array_includes(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(find_index(ctx, &this, &argument(&args, 0))?.is_some()))
}

/// Array.prototype.join
fn array_join(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = this_object(&this, "Array.prototype.join")?;
    let separator = match argument(&args, 0) {
        JsValue::Undefined => ",".to_string(),
        s => to_string(ctx, &s)?,
    };
    let len = length_of_array_like(ctx, &o)?;
    let mut parts = Vec::with_capacity(capacity_hint(len));
    for i in 0..len {
        let item = get(ctx, &o, &PropertyKey::Int(i))?;
        parts.push(if item.is_nullish() {
            String::new()
        } else {
            to_string(ctx, &item)?
        });
    }
    Ok(JsValue::String(parts.join(&separator)))
}

/// Array.prototype.toString
fn array_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    array_join(ctx, this, vec![])
}

/// Array.isArray
fn array_is_array(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(is_array(&argument(&args, 0))))
}
