//! Classification of values crossing the bridge.

use std::fmt;

use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::value::JsValue;

/// Values that are rebuilt natively on the other side instead of being proxied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughKind {
    TypedArray,
    RegExp,
    Error,
    HostNode,
    BoxedPrimitive,
}

/// A value tagged with how it crosses a realm boundary.
#[derive(Clone)]
pub enum BridgedValue {
    /// Copied by value. Symbols keep their identity.
    Primitive(JsValue),
    /// Plain objects and arrays, mirrored property by property.
    ObjectProxy(JsObjectType),
    FunctionProxy(JsObjectType),
    PromiseProxy(JsObjectType),
    Passthrough(PassthroughKind, JsObjectType),
}

impl BridgedValue {
    pub fn classify(value: &JsValue) -> BridgedValue {
        let o = match value {
            JsValue::Object(o) => o,
            v => return BridgedValue::Primitive(v.clone()),
        };
        let kind = match &*(**o).borrow() {
            ObjectType::Function(_) => None,
            ObjectType::Promise(_) => {
                return BridgedValue::PromiseProxy(o.clone());
            }
            ObjectType::Ordinary(_) | ObjectType::Array(_) => {
                return BridgedValue::ObjectProxy(o.clone());
            }
            ObjectType::Error(_) => Some(PassthroughKind::Error),
            ObjectType::TypedArray(_) => Some(PassthroughKind::TypedArray),
            ObjectType::RegExp(_) => Some(PassthroughKind::RegExp),
            ObjectType::PrimitiveWrapper(_) => Some(PassthroughKind::BoxedPrimitive),
            ObjectType::Host(_) => Some(PassthroughKind::HostNode),
        };
        match kind {
            None => BridgedValue::FunctionProxy(o.clone()),
            Some(kind) => BridgedValue::Passthrough(kind, o.clone()),
        }
    }

    pub fn value(&self) -> JsValue {
        match self {
            BridgedValue::Primitive(v) => v.clone(),
            BridgedValue::ObjectProxy(o)
            | BridgedValue::FunctionProxy(o)
            | BridgedValue::PromiseProxy(o)
            | BridgedValue::Passthrough(_, o) => JsValue::Object(o.clone()),
        }
    }

    pub fn into_value(self) -> JsValue {
        match self {
            BridgedValue::Primitive(v) => v,
            BridgedValue::ObjectProxy(o)
            | BridgedValue::FunctionProxy(o)
            | BridgedValue::PromiseProxy(o)
            | BridgedValue::Passthrough(_, o) => JsValue::Object(o),
        }
    }

    pub fn as_object(&self) -> Option<&JsObjectType> {
        match self {
            BridgedValue::Primitive(_) => None,
            BridgedValue::ObjectProxy(o)
            | BridgedValue::FunctionProxy(o)
            | BridgedValue::PromiseProxy(o)
            | BridgedValue::Passthrough(_, o) => Some(o),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            BridgedValue::Primitive(_) => "primitive",
            BridgedValue::ObjectProxy(_) => "object",
            BridgedValue::FunctionProxy(_) => "function",
            BridgedValue::PromiseProxy(_) => "promise",
            BridgedValue::Passthrough(PassthroughKind::TypedArray, _) => "typed array",
            BridgedValue::Passthrough(PassthroughKind::RegExp, _) => "regexp",
            BridgedValue::Passthrough(PassthroughKind::Error, _) => "error",
            BridgedValue::Passthrough(PassthroughKind::HostNode, _) => "host node",
            BridgedValue::Passthrough(PassthroughKind::BoxedPrimitive, _) => "boxed primitive",
        }
    }
}

impl fmt::Debug for BridgedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BridgedValue::{}({:?})", self.kind_name(), self.value())
    }
}
