use crate::runner::ds::object::{JsObject, JsObjectType, ObjectBase};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorData, PropertyKey};
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::value::JsValue;

pub struct RegExpObject {
    base: ObjectBase,
    source: String,
    flags: String,
}
impl RegExpObject {
    pub fn new(
        realm: RealmId,
        prototype: Option<JsObjectType>,
        source: impl Into<String>,
        flags: impl Into<String>,
    ) -> Self {
        let mut base = ObjectBase::new(realm, prototype);
        base.insert(
            PropertyKey::Str("lastIndex".to_string()),
            PropertyDescriptor::Data(PropertyDescriptorData {
                value: JsValue::from(0),
                writable: true,
                enumerable: false,
                configurable: false,
            }),
        );
        let mut flags: Vec<char> = flags.into().chars().collect();
        flags.sort_unstable();
        flags.dedup();
        RegExpObject {
            base,
            source: source.into(),
            flags: flags.into_iter().collect(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }
}
impl JsObject for RegExpObject {
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
        "RegExp"
    }

    fn to_string(&self) -> String {
        format!("/{}/{}", self.source, self.flags)
    }
}
