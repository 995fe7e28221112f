use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorSetter, PropertyKey};
use crate::runner::ds::operations::type_conversion::display_string;
use crate::runner::ds::value::JsValue;

pub fn get_own_property(o: &JsObjectType, p: &PropertyKey) -> Option<PropertyDescriptor> {
    (**o).borrow().as_js_object().get_own_property(p)
}

pub fn get_prototype_of(o: &JsObjectType) -> Option<JsObjectType> {
    (**o).borrow().as_js_object().get_prototype_of()
}

pub fn own_property_keys(o: &JsObjectType) -> Vec<PropertyKey> {
    (**o).borrow().as_js_object().own_property_keys()
}

/// Own enumerable keys, strings and symbols alike, in property order.
pub fn own_enumerable_keys(o: &JsObjectType) -> Vec<PropertyKey> {
    let o = (**o).borrow();
    let o = o.as_js_object();
    o.own_property_keys()
        .into_iter()
        .filter(|k| {
            o.get_own_property(k)
                .map(|d| d.is_enumerable())
                .unwrap_or(false)
        })
        .collect()
}

/// Walks the prototype chain looking for `p`, starting at `o`.
fn find_property(o: &JsObjectType, p: &PropertyKey) -> Option<PropertyDescriptor> {
    let mut current = Some(o.clone());
    while let Some(c) = current {
        if let Some(desc) = get_own_property(&c, p) {
            return Some(desc);
        }
        current = get_prototype_of(&c);
    }
    None
}

pub fn get(ctx: &mut EvalContext, o: &JsObjectType, p: &PropertyKey) -> Result<JsValue, JErrorType> {
    get_with_receiver(ctx, o, p, &JsValue::Object(o.clone()))
}

pub fn get_with_receiver(
    ctx: &mut EvalContext,
    o: &JsObjectType,
    p: &PropertyKey,
    receiver: &JsValue,
) -> Result<JsValue, JErrorType> {
    match find_property(o, p) {
        None => Ok(JsValue::Undefined),
        Some(PropertyDescriptor::Data(d)) => Ok(d.value),
        Some(PropertyDescriptor::Accessor(a)) => match a.get {
            None => Ok(JsValue::Undefined),
            Some(getter) => call(ctx, &JsValue::Object(getter), receiver.clone(), vec![]),
        },
    }
}

/// GetV: property lookup on any value. Primitives read through their realm's prototype.
pub fn get_value(ctx: &mut EvalContext, v: &JsValue, p: &PropertyKey) -> Result<JsValue, JErrorType> {
    match v {
        JsValue::Object(o) => get(ctx, o, p),
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot read properties of {} (reading '{}')",
            v, p
        ))),
        JsValue::String(s) if *p == PropertyKey::Str("length".to_string()) => {
            Ok(JsValue::from(s.chars().count()))
        }
        _ => {
            let wrapper = ctx.current_realm()?.borrow().new_primitive_wrapper(v.clone());
            get_with_receiver(ctx, &wrapper, p, v)
        }
    }
}

/// OrdinarySet. Returns `false` when the assignment is refused.
pub fn set(
    ctx: &mut EvalContext,
    o: &JsObjectType,
    p: PropertyKey,
    v: JsValue,
    receiver: &JsValue,
) -> Result<bool, JErrorType> {
    match find_property(o, &p) {
        Some(PropertyDescriptor::Accessor(a)) => match a.set {
            None => Ok(false),
            Some(setter) => {
                call(ctx, &JsValue::Object(setter), receiver.clone(), vec![v])?;
                Ok(true)
            }
        },
        Some(PropertyDescriptor::Data(d)) if !d.writable => Ok(false),
        _ => {
            let receiver = match receiver {
                JsValue::Object(r) => r,
                _ => return Ok(false),
            };
            match get_own_property(receiver, &p) {
                Some(PropertyDescriptor::Accessor(_)) => Ok(false),
                Some(PropertyDescriptor::Data(d)) => {
                    if !d.writable {
                        return Ok(false);
                    }
                    Ok((**receiver)
                        .borrow_mut()
                        .as_js_object_mut()
                        .define_own_property(p, PropertyDescriptorSetter::value_only(v)))
                }
                None => Ok(create_data_property(receiver, p, v)),
            }
        }
    }
}

/// Strict-mode assignment: a refused write throws.
pub fn put(ctx: &mut EvalContext, o: &JsObjectType, p: PropertyKey, v: JsValue) -> Result<(), JErrorType> {
    let key = p.clone();
    if set(ctx, o, p, v, &JsValue::Object(o.clone()))? {
        Ok(())
    } else {
        Err(JErrorType::TypeError(format!(
            "Cannot assign to read only property '{}' of object",
            key
        )))
    }
}

pub fn call(
    ctx: &mut EvalContext,
    f: &JsValue,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let function = match f {
        JsValue::Object(o) if (**o).borrow().is_callable() => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(format!(
                "{} is not a function",
                display_string(f)
            )))
        }
    };
    let (behavior, realm) = {
        let fo = (*function).borrow();
        match fo.as_function() {
            Some(func) => (func.behavior(), func.realm()),
            None => return Err(JErrorType::TypeError("not a function".to_string())),
        }
    };
    if !ctx.agent.has_realm(realm) {
        return Err(JErrorType::Error(format!(
            "Cannot call a function whose {} was torn down",
            realm
        )));
    }
    ctx.with_realm(realm, Some(function), |ctx| behavior.call(ctx, this, args))
}

pub fn invoke(
    ctx: &mut EvalContext,
    v: &JsValue,
    p: &PropertyKey,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let f = get_value(ctx, v, p)?;
    call(ctx, &f, v.clone(), args)
}

pub fn define_property_or_throw(
    o: &JsObjectType,
    p: PropertyKey,
    desc: PropertyDescriptorSetter,
) -> Result<(), JErrorType> {
    let key = p.clone();
    if (**o).borrow_mut().as_js_object_mut().define_own_property(p, desc) {
        Ok(())
    } else {
        Err(JErrorType::TypeError(format!("Cannot redefine property: {}", key)))
    }
}

pub fn create_data_property(o: &JsObjectType, p: PropertyKey, v: JsValue) -> bool {
    (**o)
        .borrow_mut()
        .as_js_object_mut()
        .define_own_property(p, PropertyDescriptorSetter::data(v, true, true, true))
}

pub fn has_own_property(o: &JsObjectType, p: &PropertyKey) -> bool {
    get_own_property(o, p).is_some()
}

pub fn has_property(o: &JsObjectType, p: &PropertyKey) -> bool {
    find_property(o, p).is_some()
}

pub fn delete_property_or_throw(o: &JsObjectType, p: &PropertyKey) -> Result<(), JErrorType> {
    if (**o).borrow_mut().as_js_object_mut().delete(p) {
        Ok(())
    } else {
        Err(JErrorType::TypeError(format!("Cannot delete property '{}'", p)))
    }
}

pub fn is_array(v: &JsValue) -> bool {
    match v {
        JsValue::Object(o) => (**o).borrow().is_array(),
        _ => false,
    }
}

/// Most capacity reserved up front for the elements of an array-like, whose `length` the
/// caller controls.
pub const MAX_PREALLOCATED_LENGTH: u32 = 1 << 16;

/// Capacity to reserve before reading `len` elements of an array-like.
pub fn capacity_hint(len: u32) -> usize {
    len.min(MAX_PREALLOCATED_LENGTH) as usize
}

/// `ToLength(Get(o, "length"))` for array-likes.
pub fn length_of_array_like(ctx: &mut EvalContext, o: &JsObjectType) -> Result<u32, JErrorType> {
    let len = get(ctx, o, &PropertyKey::Str("length".to_string()))?;
    Ok(len
        .as_f64()
        .filter(|f| f.is_finite() && *f > 0.0)
        .map(|f| f.min(u32::MAX as f64) as u32)
        .unwrap_or(0))
}
