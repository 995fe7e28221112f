use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::test_and_comparison::same_value;
use crate::runner::ds::symbol::SymbolData;
use crate::runner::ds::value::JsValue;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum PropertyKey {
    Str(String),
    Int(u32),
    Sym(SymbolData),
}
impl PropertyKey {
    pub fn as_index(&self) -> Option<u32> {
        match self {
            PropertyKey::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, PropertyKey::Sym(_))
    }

    /// The property key as a JS value (integer keys become their canonical string).
    pub fn to_value(&self) -> JsValue {
        match self {
            PropertyKey::Str(s) => JsValue::String(s.to_string()),
            PropertyKey::Int(i) => JsValue::String(i.to_string()),
            PropertyKey::Sym(s) => JsValue::Symbol(s.clone()),
        }
    }
}

/// Array index strings ("0", "17", but not "017" or "4294967295") are stored as `Int`.
pub fn canonical_index(s: &str) -> Option<u32> {
    s.parse::<u32>()
        .ok()
        .filter(|i| *i != u32::MAX && i.to_string() == s)
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        match canonical_index(s) {
            Some(i) => PropertyKey::Int(i),
            None => PropertyKey::Str(s.to_string()),
        }
    }
}
impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        match canonical_index(&s) {
            Some(i) => PropertyKey::Int(i),
            None => PropertyKey::Str(s),
        }
    }
}
impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        PropertyKey::Int(i)
    }
}
impl From<SymbolData> for PropertyKey {
    fn from(s: SymbolData) -> Self {
        PropertyKey::Sym(s)
    }
}
impl Display for PropertyKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Str(s) => write!(f, "{}", s),
            PropertyKey::Int(i) => write!(f, "{}", i),
            PropertyKey::Sym(s) => write!(f, "[{}]", s),
        }
    }
}

/// Partial property descriptor used with `[[DefineOwnProperty]]`. Only the fields whose
/// `honour_*` flag is set are applied; the rest keep their current values.
pub struct PropertyDescriptorSetter {
    pub honour_value: bool,
    pub honour_writable: bool,
    pub honour_set: bool,
    pub honour_get: bool,
    pub honour_enumerable: bool,
    pub honour_configurable: bool,
    pub descriptor: PropertyDescriptor,
}
impl PropertyDescriptorSetter {
    pub fn new_from_property_descriptor(desc: PropertyDescriptor) -> Self {
        match desc {
            PropertyDescriptor::Data { .. } => PropertyDescriptorSetter {
                honour_value: true,
                honour_writable: true,
                honour_configurable: true,
                honour_enumerable: true,
                descriptor: desc,
                honour_set: false,
                honour_get: false,
            },
            PropertyDescriptor::Accessor { .. } => PropertyDescriptorSetter {
                honour_set: true,
                honour_get: true,
                honour_configurable: true,
                honour_enumerable: true,
                descriptor: desc,
                honour_value: false,
                honour_writable: false,
            },
        }
    }

    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self::new_from_property_descriptor(PropertyDescriptor::Data(PropertyDescriptorData {
            value,
            writable,
            enumerable,
            configurable,
        }))
    }

    pub fn accessor(
        get: Option<JsObjectType>,
        set: Option<JsObjectType>,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self::new_from_property_descriptor(PropertyDescriptor::Accessor(
            PropertyDescriptorAccessor {
                get,
                set,
                enumerable,
                configurable,
            },
        ))
    }

    /// Replaces only `[[Value]]`, as an ordinary assignment does.
    pub fn value_only(value: JsValue) -> Self {
        PropertyDescriptorSetter {
            honour_value: true,
            honour_writable: false,
            honour_set: false,
            honour_get: false,
            honour_enumerable: false,
            honour_configurable: false,
            descriptor: PropertyDescriptor::Data(PropertyDescriptorData {
                value,
                writable: false,
                enumerable: false,
                configurable: false,
            }),
        }
    }

    /// Replaces only `[[Get]]`/`[[Set]]`; `set: None` removes the setter.
    pub fn accessor_only(get: Option<JsObjectType>, set: Option<JsObjectType>) -> Self {
        PropertyDescriptorSetter {
            honour_value: false,
            honour_writable: false,
            honour_set: true,
            honour_get: true,
            honour_enumerable: false,
            honour_configurable: false,
            descriptor: PropertyDescriptor::Accessor(PropertyDescriptorAccessor {
                get,
                set,
                enumerable: false,
                configurable: false,
            }),
        }
    }

    /// `{configurable: false}` as applied when sealing.
    pub fn sealed() -> Self {
        PropertyDescriptorSetter {
            honour_value: false,
            honour_writable: false,
            honour_set: false,
            honour_get: false,
            honour_enumerable: false,
            honour_configurable: true,
            descriptor: PropertyDescriptor::Data(PropertyDescriptorData {
                value: JsValue::Undefined,
                writable: false,
                enumerable: false,
                configurable: false,
            }),
        }
    }

    /// `{configurable: false, writable: false}` as applied to data properties when freezing.
    pub fn frozen() -> Self {
        PropertyDescriptorSetter {
            honour_writable: true,
            ..Self::sealed()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.honour_configurable
            && !self.honour_enumerable
            && !self.honour_get
            && !self.honour_set
            && !self.honour_value
            && !self.honour_writable
    }

    pub fn is_generic_descriptor(&self) -> bool {
        !self.honour_get && !self.honour_set && !self.honour_value && !self.honour_writable
    }
}

#[derive(Clone)]
pub struct PropertyDescriptorData {
    pub value: JsValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

#[derive(Clone)]
pub struct PropertyDescriptorAccessor {
    pub get: Option<JsObjectType>,
    pub set: Option<JsObjectType>,
    pub enumerable: bool,
    pub configurable: bool,
}

#[derive(Clone)]
pub enum PropertyDescriptor {
    Data(PropertyDescriptorData),
    Accessor(PropertyDescriptorAccessor),
}
impl PropertyDescriptor {
    /// Builds the descriptor that results from applying `desc_setter` on top of `current`
    /// (fields not honoured by the setter keep their current values, or their defaults
    /// when there is no current property or its kind changes).
    pub fn new_from_property_descriptor_setter(
        desc_setter: &PropertyDescriptorSetter,
        current: Option<&PropertyDescriptor>,
    ) -> Self {
        let enumerable = if desc_setter.honour_enumerable {
            desc_setter.descriptor.is_enumerable()
        } else {
            current.map(|c| c.is_enumerable()).unwrap_or(false)
        };
        let configurable = if desc_setter.honour_configurable {
            desc_setter.descriptor.is_configurable()
        } else {
            current.map(|c| c.is_configurable()).unwrap_or(false)
        };
        let as_data = if desc_setter.is_generic_descriptor() {
            current.map(|c| c.is_data_descriptor()).unwrap_or(true)
        } else {
            desc_setter.descriptor.is_data_descriptor()
        };
        if as_data {
            let (mut value, mut writable) = match current {
                Some(PropertyDescriptor::Data(d)) => (d.value.clone(), d.writable),
                _ => (JsValue::Undefined, false),
            };
            if let PropertyDescriptor::Data(d) = &desc_setter.descriptor {
                if desc_setter.honour_value {
                    value = d.value.clone();
                }
                if desc_setter.honour_writable {
                    writable = d.writable;
                }
            }
            PropertyDescriptor::Data(PropertyDescriptorData {
                value,
                writable,
                enumerable,
                configurable,
            })
        } else {
            let (mut get, mut set) = match current {
                Some(PropertyDescriptor::Accessor(a)) => (a.get.clone(), a.set.clone()),
                _ => (None, None),
            };
            if let PropertyDescriptor::Accessor(a) = &desc_setter.descriptor {
                if desc_setter.honour_get {
                    get = a.get.clone();
                }
                if desc_setter.honour_set {
                    set = a.set.clone();
                }
            }
            PropertyDescriptor::Accessor(PropertyDescriptorAccessor {
                get,
                set,
                enumerable,
                configurable,
            })
        }
    }

    pub fn is_enumerable(&self) -> bool {
        match self {
            PropertyDescriptor::Data(d) => d.enumerable,
            PropertyDescriptor::Accessor(a) => a.enumerable,
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            PropertyDescriptor::Data(d) => d.configurable,
            PropertyDescriptor::Accessor(a) => a.configurable,
        }
    }

    pub fn is_data_descriptor(&self) -> bool {
        matches!(self, PropertyDescriptor::Data(_))
    }

    pub fn is_writable(&self) -> bool {
        match self {
            PropertyDescriptor::Data(d) => d.writable,
            PropertyDescriptor::Accessor(_) => false,
        }
    }
}
impl PartialEq for PropertyDescriptor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyDescriptor::Data(a), PropertyDescriptor::Data(b)) => {
                same_value(&a.value, &b.value)
                    && a.writable == b.writable
                    && a.enumerable == b.enumerable
                    && a.configurable == b.configurable
            }
            (PropertyDescriptor::Accessor(a), PropertyDescriptor::Accessor(b)) => {
                same_function(&a.get, &b.get)
                    && same_function(&a.set, &b.set)
                    && a.enumerable == b.enumerable
                    && a.configurable == b.configurable
            }
            _ => false,
        }
    }
}

pub fn same_function(a: &Option<JsObjectType>, b: &Option<JsObjectType>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}
