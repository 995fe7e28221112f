//! Declarative description of a built-in constructor and its prototype, materialised
//! into a realm by [`BuiltInObject::install`].

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::NativeFn;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{PropertyDescriptorSetter, PropertyKey};
use crate::runner::ds::operations::object::define_property_or_throw;
use crate::runner::ds::realm::{CodeRealm, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;

/// Built-in object definition.
/// Represents a JavaScript built-in like Array, Promise or console.
pub struct BuiltInObject {
    /// Name of the object (e.g., "Array", "Promise", "console").
    pub name: String,

    /// Intrinsic slot the prototype object is stored under.
    pub prototype: Option<WellKnownIntrinsics>,

    /// Parent of the prototype object.
    pub parent: WellKnownIntrinsics,

    /// Constructor function and the intrinsic slot it is stored under.
    pub constructor: Option<(WellKnownIntrinsics, NativeFn)>,

    /// Methods defined on the prototype.
    pub methods: Vec<(String, NativeFn)>,

    /// Read-only accessors defined on the prototype.
    pub getters: Vec<(String, NativeFn)>,

    /// Data properties defined on the prototype.
    pub properties: Vec<(String, JsValue)>,

    /// Methods defined on the constructor, or on the namespace object.
    pub static_methods: Vec<(String, NativeFn)>,

    /// Static data properties.
    pub static_properties: Vec<(PropertyKey, JsValue)>,

    /// Installed on the global as a plain object holding the static methods.
    pub namespace: bool,
}

impl BuiltInObject {
    /// Create a new built-in object with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            prototype: None,
            parent: WellKnownIntrinsics::ObjectPrototype,
            constructor: None,
            methods: Vec::new(),
            getters: Vec::new(),
            properties: Vec::new(),
            static_methods: Vec::new(),
            static_properties: Vec::new(),
            namespace: false,
        }
    }

    pub fn with_prototype(mut self, prototype: WellKnownIntrinsics) -> Self {
        self.prototype = Some(prototype);
        self
    }

    /// Set the prototype chain parent.
    pub fn inherits(mut self, parent: WellKnownIntrinsics) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_constructor(mut self, intrinsic: WellKnownIntrinsics, constructor: NativeFn) -> Self {
        self.constructor = Some((intrinsic, constructor));
        self
    }

    pub fn as_namespace(mut self) -> Self {
        self.namespace = true;
        self
    }

    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.methods.push((name.into(), func));
        self
    }

    pub fn add_getter(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.getters.push((name.into(), func));
        self
    }

    pub fn add_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    pub fn add_static_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.static_methods.push((name.into(), func));
        self
    }

    pub fn add_static_property(mut self, key: impl Into<PropertyKey>, value: JsValue) -> Self {
        self.static_properties.push((key.into(), value));
        self
    }

    /// Creates (or reuses) the prototype, the constructor and the global binding.
    /// Returns the prototype when there is one.
    pub fn install(self, realm: &mut CodeRealm) -> Result<Option<JsObjectType>, JErrorType> {
        let prototype = match self.prototype {
            None => None,
            Some(slot) => {
                let proto = match realm.intrinsic(slot) {
                    Some(existing) => existing,
                    None => {
                        let proto = realm.new_object();
                        (*proto)
                            .borrow_mut()
                            .as_js_object_mut()
                            .set_prototype_of(realm.intrinsic(self.parent));
                        realm.set_intrinsic(slot, proto.clone());
                        proto
                    }
                };
                for (name, f) in &self.methods {
                    let method = realm.new_native_function(name, *f);
                    define_method(&proto, name, JsValue::Object(method))?;
                }
                for (name, f) in &self.getters {
                    let getter = realm.new_native_function(&format!("get {}", name), *f);
                    define_property_or_throw(
                        &proto,
                        PropertyKey::from(name.as_str()),
                        PropertyDescriptorSetter::accessor(Some(getter), None, false, true),
                    )?;
                }
                for (name, value) in &self.properties {
                    define_method(&proto, name, value.clone())?;
                }
                Some(proto)
            }
        };

        let holder = if let Some((slot, f)) = self.constructor {
            let constructor = realm.new_native_function(&self.name, f);
            if let Some(proto) = &prototype {
                define_property_or_throw(
                    &constructor,
                    PropertyKey::from("prototype"),
                    PropertyDescriptorSetter::data(JsValue::Object(proto.clone()), false, false, false),
                )?;
                define_method(proto, "constructor", JsValue::Object(constructor.clone()))?;
            }
            realm.set_intrinsic(slot, constructor.clone());
            Some(constructor)
        } else if self.namespace {
            Some(realm.new_object())
        } else {
            None
        };

        if let Some(holder) = holder {
            for (name, f) in &self.static_methods {
                let method = realm.new_native_function(name, *f);
                define_method(&holder, name, JsValue::Object(method))?;
            }
            for (key, value) in self.static_properties {
                define_property_or_throw(
                    &holder,
                    key,
                    PropertyDescriptorSetter::data(value, false, false, false),
                )?;
            }
            define_method(&realm.global_object(), &self.name, JsValue::Object(holder))?;
        }
        Ok(prototype)
    }
}

/// Built-in methods are writable, configurable and not enumerable.
pub fn define_method(o: &JsObjectType, name: &str, value: JsValue) -> Result<(), JErrorType> {
    define_property_or_throw(
        o,
        PropertyKey::from(name),
        PropertyDescriptorSetter::data(value, true, false, true),
    )
}

pub fn argument(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or(JsValue::Undefined)
}

pub fn this_object(this: &JsValue, method: &str) -> Result<JsObjectType, JErrorType> {
    match this {
        JsValue::Object(o) => Ok(o.clone()),
        _ => Err(JErrorType::TypeError(format!(
            "{} called on non-object",
            method
        ))),
    }
}
