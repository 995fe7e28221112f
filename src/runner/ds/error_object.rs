use crate::runner::ds::error::ErrorKind;
use crate::runner::ds::object::{JsObject, JsObjectType, ObjectBase};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::realm::RealmId;

/// An instance of `Error` or one of its native subclasses. The message lives in an
/// ordinary own `message` property.
pub struct ErrorObject {
    base: ObjectBase,
    kind: ErrorKind,
}
impl ErrorObject {
    pub fn new(realm: RealmId, prototype: Option<JsObjectType>, kind: ErrorKind) -> Self {
        ErrorObject {
            base: ObjectBase::new(realm, prototype),
            kind,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The own `message` property, when it is a string data property.
    pub fn own_message(&self) -> Option<String> {
        match self.base.get(&PropertyKey::Str("message".to_string())) {
            Some(PropertyDescriptor::Data(d)) => d.value.as_str().map(|s| s.to_string()),
            _ => None,
        }
    }
}
impl JsObject for ErrorObject {
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
        "Error"
    }

    fn to_string(&self) -> String {
        match self.own_message() {
            Some(m) if !m.is_empty() => format!("{}: {}", self.kind.name(), m),
            _ => self.kind.name().to_string(),
        }
    }
}
