use crate::runner::ds::object::{
    ordinary_define_own_property, JsObject, JsObjectType, ObjectBase,
};
use crate::runner::ds::object_property::{
    PropertyDescriptor, PropertyDescriptorData, PropertyDescriptorSetter, PropertyKey,
};
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::value::{JsNumberType, JsValue};

lazy_static! {
    pub static ref ARRAY_LENGTH_PROP: PropertyKey = PropertyKey::Str("length".to_string());
}

pub trait JsArrayObject: JsObject {
    fn as_js_array_object(&self) -> &dyn JsArrayObject;

    fn length(&self) -> u32;
}

pub struct CoreArrayObject {
    base: ObjectBase,
}
impl CoreArrayObject {
    pub fn new(realm: RealmId, prototype: Option<JsObjectType>) -> Self {
        let mut base = ObjectBase::new(realm, prototype);
        base.insert(
            ARRAY_LENGTH_PROP.clone(),
            PropertyDescriptor::Data(PropertyDescriptorData {
                value: JsValue::Number(JsNumberType::Integer(0)),
                writable: true,
                enumerable: false,
                configurable: false,
            }),
        );
        CoreArrayObject { base }
    }

    fn length_descriptor(&self) -> (u32, bool) {
        match self.base.get(&ARRAY_LENGTH_PROP) {
            Some(PropertyDescriptor::Data(d)) => {
                (d.value.as_f64().map(|f| f as u32).unwrap_or(0), d.writable)
            }
            _ => (0, false),
        }
    }

    fn write_length(&mut self, length: u32) -> bool {
        ordinary_define_own_property(
            &mut self.base,
            ARRAY_LENGTH_PROP.clone(),
            PropertyDescriptorSetter::value_only(JsValue::Number(JsNumberType::Integer(
                length as i64,
            ))),
        )
    }

    /// ArraySetLength: shrinking deletes trailing elements, stopping at the first one
    /// that cannot be deleted.
    fn set_length(&mut self, mut descriptor_setter: PropertyDescriptorSetter) -> bool {
        if !descriptor_setter.honour_value {
            return ordinary_define_own_property(
                &mut self.base,
                ARRAY_LENGTH_PROP.clone(),
                descriptor_setter,
            );
        }
        let new_len = match &descriptor_setter.descriptor {
            PropertyDescriptor::Data(d) => match to_array_length(&d.value) {
                Some(l) => l,
                None => return false,
            },
            PropertyDescriptor::Accessor(_) => return false,
        };
        if let PropertyDescriptor::Data(d) = &mut descriptor_setter.descriptor {
            d.value = JsValue::Number(JsNumberType::Integer(new_len as i64));
        }
        let (old_len, writable) = self.length_descriptor();
        if new_len >= old_len {
            return ordinary_define_own_property(
                &mut self.base,
                ARRAY_LENGTH_PROP.clone(),
                descriptor_setter,
            );
        }
        if !writable {
            return false;
        }
        let mut doomed: Vec<u32> = self
            .base
            .keys()
            .filter_map(|k| k.as_index())
            .filter(|i| *i >= new_len)
            .collect();
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        for idx in doomed {
            let key = PropertyKey::Int(idx);
            let configurable = self
                .base
                .get(&key)
                .map(|d| d.is_configurable())
                .unwrap_or(true);
            if !configurable {
                self.write_length(idx + 1);
                return false;
            }
            self.base.remove(&key);
        }
        ordinary_define_own_property(&mut self.base, ARRAY_LENGTH_PROP.clone(), descriptor_setter)
    }
}

fn to_array_length(value: &JsValue) -> Option<u32> {
    let f = value.as_f64()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

impl JsObject for CoreArrayObject {
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
        "Array"
    }

    fn define_own_property(
        &mut self,
        property: PropertyKey,
        descriptor_setter: PropertyDescriptorSetter,
    ) -> bool {
        if property == *ARRAY_LENGTH_PROP {
            return self.set_length(descriptor_setter);
        }
        if let PropertyKey::Int(idx) = property {
            let (old_len, writable) = self.length_descriptor();
            if idx >= old_len && !writable {
                return false;
            }
            if !ordinary_define_own_property(&mut self.base, property, descriptor_setter) {
                return false;
            }
            if idx >= old_len {
                self.write_length(idx + 1);
            }
            return true;
        }
        ordinary_define_own_property(&mut self.base, property, descriptor_setter)
    }
}
impl JsArrayObject for CoreArrayObject {
    fn as_js_array_object(&self) -> &dyn JsArrayObject {
        self
    }

    fn length(&self) -> u32 {
        self.length_descriptor().0
    }
}
