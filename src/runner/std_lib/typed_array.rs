//! Typed array constructors, one per element kind.

use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::function_object::JsFunctionObject;
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{get, length_of_array_like};
use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::realm::{CodeRealm, WellKnownIntrinsics};
use crate::runner::ds::typed_array_object::{TypedArrayKind, TypedArrayObject};
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::builtin::{argument, BuiltInObject};

/// Longest typed array a constructor will allocate.
pub const MAX_TYPED_ARRAY_LENGTH: u32 = 1 << 27;

fn invalid_length() -> JErrorType {
    JErrorType::RangeError("Invalid typed array length".to_string())
}

/// Install `Int8Array` through `Float64Array`.
pub fn install(realm: &mut CodeRealm) -> Result<(), JErrorType> {
    for kind in TypedArrayKind::ALL.iter() {
        BuiltInObject::new(kind.name())
            .with_prototype(WellKnownIntrinsics::TypedArrayPrototype(*kind))
            .with_constructor(WellKnownIntrinsics::TypedArray(*kind), typed_array_constructor)
            .add_getter("length", typed_array_length)
            .add_getter("byteLength", typed_array_byte_length)
            .add_static_property(
                "BYTES_PER_ELEMENT",
                JsValue::from(kind.element_size()),
            )
            .install(realm)?;
    }
    Ok(())
}

/// The kind of the constructor currently running, read off its name.
fn running_kind(ctx: &EvalContext) -> Result<TypedArrayKind, JErrorType> {
    let name = ctx
        .ctx_stack
        .get_running_execution_ctx()
        .and_then(|c| c.function.as_ref())
        .and_then(|f| (**f).borrow().as_function().map(|f| f.name().to_string()));
    name.and_then(|n| TypedArrayKind::ALL.iter().copied().find(|k| k.name() == n))
        .ok_or_else(|| JErrorType::TypeError("Illegal constructor".to_string()))
}

/// new XArray(length | arrayLike)
fn typed_array_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let kind = running_kind(ctx)?;
    let realm = ctx.current_realm()?;
    let prototype = realm
        .borrow()
        .intrinsic(WellKnownIntrinsics::TypedArrayPrototype(kind));
    let realm_id = realm.borrow().id();

    let source = argument(&args, 0);
    let object = match &source {
        JsValue::Object(o) => {
            let len = length_of_array_like(ctx, o)?;
            if len > MAX_TYPED_ARRAY_LENGTH {
                return Err(invalid_length());
            }
            let mut values = Vec::with_capacity(len as usize);
            for i in 0..len {
                values.push(to_number(&get(ctx, o, &PropertyKey::Int(i))?)?);
            }
            let mut array = TypedArrayObject::new(realm_id, prototype, kind, values.len());
            for (i, v) in values.into_iter().enumerate() {
                array.set_index(i, v);
            }
            array
        }
        JsValue::Undefined => TypedArrayObject::new(realm_id, prototype, kind, 0),
        length => {
            let n = to_number(length)?;
            if !(n >= 0.0 && n.fract() == 0.0 && n <= MAX_TYPED_ARRAY_LENGTH as f64) {
                return Err(invalid_length());
            }
            TypedArrayObject::new(realm_id, prototype, kind, n as usize)
        }
    };
    let object: JsObjectType = Rc::new(RefCell::new(ObjectType::TypedArray(object)));
    Ok(JsValue::Object(object))
}

fn with_typed_array<R>(
    this: &JsValue,
    f: impl FnOnce(&TypedArrayObject) -> R,
) -> Result<R, JErrorType> {
    if let JsValue::Object(o) = this {
        if let ObjectType::TypedArray(t) = &*(**o).borrow() {
            return Ok(f(t));
        }
    }
    Err(JErrorType::TypeError("receiver is not a typed array".to_string()))
}

/// get %TypedArray%.prototype.length
fn typed_array_length(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    with_typed_array(&this, |t| JsValue::from(t.length()))
}

/// get %TypedArray%.prototype.byteLength
fn typed_array_byte_length(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    with_typed_array(&this, |t| JsValue::from(t.bytes().len()))
}
