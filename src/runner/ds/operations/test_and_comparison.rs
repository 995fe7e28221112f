use std::rc::Rc;

use crate::runner::ds::value::JsValue;

fn numbers(a: &JsValue, b: &JsValue) -> Option<(f64, f64)> {
    match (a, b) {
        (JsValue::Number(a), JsValue::Number(b)) => Some((a.as_f64(), b.as_f64())),
        _ => None,
    }
}

fn same_non_number(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
        (JsValue::String(a), JsValue::String(b)) => a == b,
        (JsValue::Symbol(a), JsValue::Symbol(b)) => a == b,
        (JsValue::BigInt(a), JsValue::BigInt(b)) => a == b,
        (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

/// SameValue: `NaN` equals itself and `+0` differs from `-0`.
pub fn same_value(a: &JsValue, b: &JsValue) -> bool {
    match numbers(a, b) {
        Some((x, y)) => {
            if x.is_nan() && y.is_nan() {
                true
            } else {
                x == y && x.is_sign_negative() == y.is_sign_negative()
            }
        }
        None => same_non_number(a, b),
    }
}

/// `===`.
pub fn strict_equals(a: &JsValue, b: &JsValue) -> bool {
    match numbers(a, b) {
        Some((x, y)) => x == y,
        None => same_non_number(a, b),
    }
}
