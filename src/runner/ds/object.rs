use crate::runner::ds::array_object::JsArrayObject;
use crate::runner::ds::error_object::ErrorObject;
use crate::runner::ds::function_object::JsFunctionObject;
use crate::runner::ds::host_object::HostObject;
use crate::runner::ds::object_property::{
    same_function, PropertyDescriptor, PropertyDescriptorSetter, PropertyKey,
};
use crate::runner::ds::operations::test_and_comparison::same_value;
use crate::runner::ds::primitive_object::PrimitiveObject;
use crate::runner::ds::promise_object::PromiseObject;
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::regexp_object::RegExpObject;
use crate::runner::ds::typed_array_object::TypedArrayObject;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub type JsObjectType = Rc<RefCell<ObjectType>>;
pub type JsObjectWeakType = Weak<RefCell<ObjectType>>;

pub enum ObjectType {
    Ordinary(Box<dyn JsObject>),
    Function(Box<dyn JsFunctionObject>),
    Array(Box<dyn JsArrayObject>),
    Promise(PromiseObject),
    Error(ErrorObject),
    TypedArray(TypedArrayObject),
    RegExp(RegExpObject),
    PrimitiveWrapper(PrimitiveObject),
    Host(HostObject),
}
impl ObjectType {
    pub fn is_callable(&self) -> bool {
        matches!(self, ObjectType::Function(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ObjectType::Array(_))
    }

    pub fn as_js_object(&self) -> &dyn JsObject {
        match self {
            ObjectType::Ordinary(o) => o.as_super_trait(),
            ObjectType::Function(o) => o.as_super_trait(),
            ObjectType::Array(o) => o.as_super_trait(),
            ObjectType::Promise(o) => o,
            ObjectType::Error(o) => o,
            ObjectType::TypedArray(o) => o,
            ObjectType::RegExp(o) => o,
            ObjectType::PrimitiveWrapper(o) => o,
            ObjectType::Host(o) => o,
        }
    }

    pub fn as_js_object_mut(&mut self) -> &mut dyn JsObject {
        match self {
            ObjectType::Ordinary(o) => o.as_super_trait_mut(),
            ObjectType::Function(o) => o.as_super_trait_mut(),
            ObjectType::Array(o) => o.as_super_trait_mut(),
            ObjectType::Promise(o) => o,
            ObjectType::Error(o) => o,
            ObjectType::TypedArray(o) => o,
            ObjectType::RegExp(o) => o,
            ObjectType::PrimitiveWrapper(o) => o,
            ObjectType::Host(o) => o,
        }
    }

    pub fn as_function(&self) -> Option<&dyn JsFunctionObject> {
        match self {
            ObjectType::Function(f) => Some(f.as_ref()),
            _ => None,
        }
    }

    pub fn as_promise(&self) -> Option<&PromiseObject> {
        match self {
            ObjectType::Promise(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_promise_mut(&mut self) -> Option<&mut PromiseObject> {
        match self {
            ObjectType::Promise(p) => Some(p),
            _ => None,
        }
    }
}

pub struct ObjectBase {
    properties: HashMap<PropertyKey, PropertyDescriptor>,
    insertion_order: Vec<PropertyKey>,
    is_extensible: bool,
    prototype: Option<JsObjectType>,
    realm: RealmId,
}
impl ObjectBase {
    pub fn new(realm: RealmId, prototype: Option<JsObjectType>) -> Self {
        ObjectBase {
            properties: HashMap::new(),
            insertion_order: Vec::new(),
            is_extensible: true,
            prototype,
            realm,
        }
    }

    pub fn realm(&self) -> RealmId {
        self.realm
    }

    pub fn get(&self, property: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.properties.get(property)
    }

    pub fn insert(&mut self, property: PropertyKey, descriptor: PropertyDescriptor) {
        if !self.properties.contains_key(&property) {
            self.insertion_order.push(property.clone());
        }
        self.properties.insert(property, descriptor);
    }

    pub fn remove(&mut self, property: &PropertyKey) -> Option<PropertyDescriptor> {
        let removed = self.properties.remove(property);
        if removed.is_some() {
            self.insertion_order.retain(|k| k != property);
        }
        removed
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.insertion_order.iter()
    }

    /// Drops every property and the prototype link. Used when a realm is torn down to
    /// break reference cycles between intrinsics.
    pub fn clear(&mut self) {
        self.properties.clear();
        self.insertion_order.clear();
        self.prototype = None;
    }
}

pub trait JsObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase;

    fn get_object_base(&self) -> &ObjectBase;

    fn as_super_trait(&self) -> &dyn JsObject;

    fn as_super_trait_mut(&mut self) -> &mut dyn JsObject;

    fn class_name(&self) -> &'static str {
        "Object"
    }

    fn realm(&self) -> RealmId {
        self.get_object_base().realm
    }

    fn get_prototype_of(&self) -> Option<JsObjectType> {
        self.get_object_base().prototype.clone()
    }

    fn set_prototype_of(&mut self, prototype: Option<JsObjectType>) -> bool {
        let unchanged = match (&self.get_object_base().prototype, &prototype) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        if unchanged {
            return true;
        }
        if !self.is_extensible() {
            return false;
        }
        let mut p = prototype.clone();
        while let Some(some_p) = p {
            // The object being modified is mutably borrowed, so failing to borrow a link
            // of the new chain means the chain leads back to it.
            p = match some_p.try_borrow() {
                Ok(b) => b.as_js_object().get_prototype_of(),
                Err(_) => return false,
            };
        }
        self.get_object_base_mut().prototype = prototype;
        true
    }

    fn is_extensible(&self) -> bool {
        self.get_object_base().is_extensible
    }

    fn prevent_extensions(&mut self) -> bool {
        self.get_object_base_mut().is_extensible = false;
        true
    }

    fn get_own_property(&self, property: &PropertyKey) -> Option<PropertyDescriptor> {
        self.get_object_base().get(property).cloned()
    }

    fn define_own_property(
        &mut self,
        property: PropertyKey,
        descriptor_setter: PropertyDescriptorSetter,
    ) -> bool {
        ordinary_define_own_property(self.get_object_base_mut(), property, descriptor_setter)
    }

    fn delete(&mut self, property: &PropertyKey) -> bool {
        match self.get_object_base().get(property) {
            None => true,
            Some(pd) => {
                if pd.is_configurable() {
                    self.get_object_base_mut().remove(property);
                    true
                } else {
                    false
                }
            }
        }
    }

    fn own_property_keys(&self) -> Vec<PropertyKey> {
        let mut int_keys = vec![];
        let mut str_keys = vec![];
        let mut sym_keys = vec![];
        for key in self.get_object_base().keys() {
            match key {
                PropertyKey::Str(_) => str_keys.push(key.clone()),
                PropertyKey::Int(d) => int_keys.push(*d),
                PropertyKey::Sym(_) => sym_keys.push(key.clone()),
            }
        }
        int_keys.sort_unstable();

        let mut result: Vec<PropertyKey> = int_keys.into_iter().map(PropertyKey::Int).collect();
        result.append(&mut str_keys);
        result.append(&mut sym_keys);
        result
    }

    fn to_string(&self) -> String {
        format!("[object {}]", self.class_name())
    }
}

/// ValidateAndApplyPropertyDescriptor for ordinary objects.
pub fn ordinary_define_own_property(
    base: &mut ObjectBase,
    property: PropertyKey,
    descriptor_setter: PropertyDescriptorSetter,
) -> bool {
    let current = match base.get(&property) {
        None => {
            if !base.is_extensible {
                return false;
            }
            let descriptor =
                PropertyDescriptor::new_from_property_descriptor_setter(&descriptor_setter, None);
            base.insert(property, descriptor);
            return true;
        }
        Some(current) => current.clone(),
    };
    if descriptor_setter.is_empty() {
        return true;
    }
    let descriptor = &descriptor_setter.descriptor;
    if !current.is_configurable() {
        if descriptor_setter.honour_configurable && descriptor.is_configurable() {
            return false;
        }
        if descriptor_setter.honour_enumerable
            && descriptor.is_enumerable() != current.is_enumerable()
        {
            return false;
        }
    }
    if !descriptor_setter.is_generic_descriptor() {
        if current.is_data_descriptor() != descriptor.is_data_descriptor() {
            if !current.is_configurable() {
                return false;
            }
        } else if !current.is_configurable() {
            match (&current, descriptor) {
                (PropertyDescriptor::Data(current_data), PropertyDescriptor::Data(desc_data)) => {
                    if !current_data.writable {
                        if descriptor_setter.honour_writable && desc_data.writable {
                            return false;
                        }
                        if descriptor_setter.honour_value
                            && !same_value(&current_data.value, &desc_data.value)
                        {
                            return false;
                        }
                    }
                }
                (
                    PropertyDescriptor::Accessor(current_acc),
                    PropertyDescriptor::Accessor(desc_acc),
                ) => {
                    if descriptor_setter.honour_set && !same_function(&current_acc.set, &desc_acc.set)
                    {
                        return false;
                    }
                    if descriptor_setter.honour_get && !same_function(&current_acc.get, &desc_acc.get)
                    {
                        return false;
                    }
                }
                _ => {}
            }
        }
    }
    let merged =
        PropertyDescriptor::new_from_property_descriptor_setter(&descriptor_setter, Some(&current));
    base.insert(property, merged);
    true
}

/// A plain `{}` object.
pub struct CoreObject {
    base: ObjectBase,
}
impl CoreObject {
    pub fn new(realm: RealmId, prototype: Option<JsObjectType>) -> Self {
        CoreObject {
            base: ObjectBase::new(realm, prototype),
        }
    }
}
impl JsObject for CoreObject {
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
}
