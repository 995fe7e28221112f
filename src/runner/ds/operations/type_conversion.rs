use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{capacity_hint, get, length_of_array_like};
use crate::runner::ds::value::{JsNumberType, JsValue};

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";

pub fn to_boolean(v: &JsValue) -> bool {
    match v {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::String(s) => !s.is_empty(),
        JsValue::Symbol(_) => true,
        JsValue::Number(n) => {
            let f = n.as_f64();
            !(f == 0.0 || f.is_nan())
        }
        JsValue::BigInt(i) => *i != 0,
        JsValue::Object(_) => true,
    }
}

pub fn to_number(v: &JsValue) -> Result<f64, JErrorType> {
    match v {
        JsValue::Undefined => Ok(f64::NAN),
        JsValue::Null => Ok(0.0),
        JsValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        JsValue::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(0.0)
            } else {
                Ok(match s {
                    "Infinity" | "+Infinity" => f64::INFINITY,
                    "-Infinity" => f64::NEG_INFINITY,
                    _ => s.parse::<f64>().unwrap_or(f64::NAN),
                })
            }
        }
        JsValue::Symbol(s) => Err(JErrorType::TypeError(format!(
            "Cannot convert a {} value to a number",
            s
        ))),
        JsValue::Number(n) => Ok(n.as_f64()),
        JsValue::BigInt(_) => Err(JErrorType::TypeError(
            "Cannot convert a BigInt value to a number".to_string(),
        )),
        JsValue::Object(o) => match &*(**o).borrow() {
            ObjectType::PrimitiveWrapper(p) => to_number(p.primitive()),
            _ => Ok(f64::NAN),
        },
    }
}

pub fn number_to_string(n: &JsNumberType) -> String {
    match n {
        JsNumberType::Integer(i) => i.to_string(),
        JsNumberType::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e21 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        JsNumberType::NaN => "NaN".to_string(),
        JsNumberType::PositiveInfinity => "Infinity".to_string(),
        JsNumberType::NegativeInfinity => "-Infinity".to_string(),
    }
}

/// ToString. Arrays join their elements with `,` the way `Array.prototype.toString` does.
pub fn to_string(ctx: &mut EvalContext, v: &JsValue) -> Result<String, JErrorType> {
    match v {
        JsValue::Symbol(s) => Err(JErrorType::TypeError(format!(
            "Cannot convert a {} value to a string",
            s
        ))),
        JsValue::Object(o) => {
            if (**o).borrow().is_array() {
                let len = length_of_array_like(ctx, o)?;
                let mut parts = Vec::with_capacity(capacity_hint(len));
                for i in 0..len {
                    let item = get(ctx, o, &PropertyKey::Int(i))?;
                    parts.push(if item.is_nullish() {
                        String::new()
                    } else {
                        to_string(ctx, &item)?
                    });
                }
                return Ok(parts.join(","));
            }
            let primitive = match &*(**o).borrow() {
                ObjectType::PrimitiveWrapper(p) => Some(p.primitive().clone()),
                _ => None,
            };
            match primitive {
                Some(p) => to_string(ctx, &p),
                None => Ok(display_string(v)),
            }
        }
        _ => Ok(display_string(v)),
    }
}

pub fn to_property_key(ctx: &mut EvalContext, v: &JsValue) -> Result<PropertyKey, JErrorType> {
    match v {
        JsValue::Symbol(s) => Ok(PropertyKey::Sym(s.clone())),
        JsValue::Number(JsNumberType::Integer(i)) if *i >= 0 && *i < u32::MAX as i64 => {
            Ok(PropertyKey::Int(*i as u32))
        }
        _ => Ok(PropertyKey::from(to_string(ctx, v)?)),
    }
}

/// Never-failing rendering used in logs and error messages.
pub fn display_string(v: &JsValue) -> String {
    match v {
        JsValue::Undefined => TYPE_STR_UNDEFINED.to_string(),
        JsValue::Null => TYPE_STR_NULL.to_string(),
        JsValue::Boolean(b) => b.to_string(),
        JsValue::String(s) => s.clone(),
        JsValue::Symbol(s) => s.to_string(),
        JsValue::Number(n) => number_to_string(n),
        JsValue::BigInt(i) => i.to_string(),
        JsValue::Object(o) => match o.try_borrow() {
            Ok(o) => o.as_js_object().to_string(),
            Err(_) => "[object Object]".to_string(),
        },
    }
}
