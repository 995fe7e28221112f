use crate::runner::ds::object::{JsObject, JsObjectType, ObjectBase};
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::value::JsValue;

/// A boxed primitive, e.g. the result of `Object(Symbol('x'))` or `new Number(1)`.
pub struct PrimitiveObject {
    base: ObjectBase,
    primitive: JsValue,
}
impl PrimitiveObject {
    pub fn new(realm: RealmId, prototype: Option<JsObjectType>, primitive: JsValue) -> Self {
        PrimitiveObject {
            base: ObjectBase::new(realm, prototype),
            primitive,
        }
    }

    pub fn primitive(&self) -> &JsValue {
        &self.primitive
    }
}
impl JsObject for PrimitiveObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn as_super_trait(&self) -> &dyn JsObject {
        self
    }

    fn as_super_trait_mut(&mut self) -> &mut dyn JsObject {
        self
    }

    fn class_name(&self) -> &'static str {
        match self.primitive {
            JsValue::Boolean(_) => "Boolean",
            JsValue::String(_) => "String",
            JsValue::Symbol(_) => "Symbol",
            JsValue::Number(_) => "Number",
            JsValue::BigInt(_) => "BigInt",
            _ => "Object",
        }
    }
}
