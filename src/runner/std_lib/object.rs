//! Object built-in.
//!
//! Provides the Object constructor, its static helpers and `Object.prototype`.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{
    PropertyDescriptor, PropertyDescriptorAccessor, PropertyDescriptorData,
    PropertyDescriptorSetter, PropertyKey,
};
use crate::runner::ds::operations::integrity::{
    set_integrity_level, test_integrity_level, IntegrityLevel,
};
use crate::runner::ds::operations::object::{
    define_property_or_throw, get, get_prototype_of, has_own_property, has_property,
    own_enumerable_keys,
};
use crate::runner::ds::operations::type_conversion::{to_boolean, to_property_key};
use crate::runner::ds::realm::{CodeRealm, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::builtin::{argument, BuiltInObject};

/// Install the Object built-in.
pub fn install(realm: &mut CodeRealm) -> Result<(), JErrorType> {
    BuiltInObject::new("Object")
        .with_prototype(WellKnownIntrinsics::ObjectPrototype)
        .with_constructor(WellKnownIntrinsics::Object, object_constructor)
        .add_method("toString", object_to_string)
        .add_method("valueOf", object_value_of)
        .add_method("hasOwnProperty", object_has_own_property)
        .add_static_method("keys", object_keys)
        .add_static_method("getPrototypeOf", object_get_prototype_of)
        .add_static_method("freeze", object_freeze)
        .add_static_method("isFrozen", object_is_frozen)
        .add_static_method("defineProperty", object_define_property)
        .install(realm)?;
    Ok(())
}

fn to_object_arg(args: &[JsValue], method: &str) -> Result<JsObjectType, JErrorType> {
    match argument(args, 0) {
        JsValue::Object(o) => Ok(o),
        v => Err(JErrorType::TypeError(format!(
            "Object.{} called on non-object {}",
            method, v
        ))),
    }
}

/// Object constructor.
fn object_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let realm = ctx.current_realm()?;
    let realm = realm.borrow();
    Ok(match argument(&args, 0) {
        JsValue::Null | JsValue::Undefined => JsValue::Object(realm.new_object()),
        o @ JsValue::Object(_) => o,
        primitive => JsValue::Object(realm.new_primitive_wrapper(primitive)),
    })
}

/// Object.prototype.toString
fn object_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let tag = match &this {
        JsValue::Undefined => "Undefined",
        JsValue::Null => "Null",
        JsValue::Boolean(_) => "Boolean",
        JsValue::Number(_) => "Number",
        JsValue::String(_) => "String",
        JsValue::Symbol(_) => "Symbol",
        JsValue::BigInt(_) => "BigInt",
        JsValue::Object(o) => (**o).borrow().as_js_object().class_name(),
    };
    Ok(JsValue::String(format!("[object {}]", tag)))
}

/// Object.prototype.valueOf
fn object_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(this)
}

/// Object.prototype.hasOwnProperty
fn object_has_own_property(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let key = to_property_key(ctx, &argument(&args, 0))?;
    Ok(JsValue::Boolean(match &this {
        JsValue::Object(o) => has_own_property(o, &key),
        _ => false,
    }))
}

/// Object.keys - enumerable own string keys.
fn object_keys(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = to_object_arg(&args, "keys")?;
    let keys = own_enumerable_keys(&o)
        .into_iter()
        .filter(|k| !k.is_symbol())
        .map(|k| k.to_value())
        .collect();
    Ok(JsValue::Object(ctx.current_realm()?.borrow().new_array(keys)))
}

/// Object.getPrototypeOf
fn object_get_prototype_of(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = to_object_arg(&args, "getPrototypeOf")?;
    Ok(match get_prototype_of(&o) {
        Some(p) => JsValue::Object(p),
        None => JsValue::Null,
    })
}

/// Object.freeze (shallow).
fn object_freeze(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = argument(&args, 0);
    if let JsValue::Object(o) = &target {
        if !set_integrity_level(o, IntegrityLevel::Frozen) {
            return Err(JErrorType::TypeError("Cannot freeze".to_string()));
        }
    }
    Ok(target)
}

/// Object.isFrozen
fn object_is_frozen(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(match argument(&args, 0) {
        JsValue::Object(o) => test_integrity_level(&o, IntegrityLevel::Frozen),
        _ => true,
    }))
}

/// ToPropertyDescriptor.
fn to_property_descriptor(
    ctx: &mut EvalContext,
    desc: &JsObjectType,
) -> Result<PropertyDescriptorSetter, JErrorType> {
    let field = |ctx: &mut EvalContext, name: &str| -> Result<Option<JsValue>, JErrorType> {
        let key = PropertyKey::from(name);
        if has_property(desc, &key) {
            Ok(Some(get(ctx, desc, &key)?))
        } else {
            Ok(None)
        }
    };
    let value = field(ctx, "value")?;
    let writable = field(ctx, "writable")?;
    let enumerable = field(ctx, "enumerable")?;
    let configurable = field(ctx, "configurable")?;
    let getter = field(ctx, "get")?;
    let setter = field(ctx, "set")?;

    let as_function = |v: &Option<JsValue>| -> Result<Option<JsObjectType>, JErrorType> {
        match v {
            None | Some(JsValue::Undefined) => Ok(None),
            Some(f @ JsValue::Object(o)) if f.is_callable() => Ok(Some(o.clone())),
            Some(other) => Err(JErrorType::TypeError(format!(
                "Getter or setter must be a function: {}",
                other
            ))),
        }
    };
    let is_accessor = getter.is_some() || setter.is_some();
    if is_accessor && (value.is_some() || writable.is_some()) {
        return Err(JErrorType::TypeError(
            "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute"
                .to_string(),
        ));
    }
    let flag = |v: &Option<JsValue>| v.as_ref().map(to_boolean).unwrap_or(false);
    let descriptor = if is_accessor {
        PropertyDescriptor::Accessor(PropertyDescriptorAccessor {
            get: as_function(&getter)?,
            set: as_function(&setter)?,
            enumerable: flag(&enumerable),
            configurable: flag(&configurable),
        })
    } else {
        PropertyDescriptor::Data(PropertyDescriptorData {
            value: value.clone().unwrap_or(JsValue::Undefined),
            writable: flag(&writable),
            enumerable: flag(&enumerable),
            configurable: flag(&configurable),
        })
    };
    Ok(PropertyDescriptorSetter {
        honour_value: value.is_some(),
        honour_writable: writable.is_some(),
        honour_get: getter.is_some(),
        honour_set: setter.is_some(),
        honour_enumerable: enumerable.is_some(),
        honour_configurable: configurable.is_some(),
        descriptor,
    })
}

/// Object.defineProperty
fn object_define_property(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = to_object_arg(&args, "defineProperty")?;
    let key = to_property_key(ctx, &argument(&args, 1))?;
    let desc = match argument(&args, 2) {
        JsValue::Object(d) => d,
        _ => {
            return Err(JErrorType::TypeError(
                "Property description must be an object".to_string(),
            ))
        }
    };
    let setter = to_property_descriptor(ctx, &desc)?;
    define_property_or_throw(&o, key, setter)?;
    Ok(JsValue::Object(o))
}
