use crate::runner::ds::object::{ordinary_define_own_property, JsObject, JsObjectType, ObjectBase};
use crate::runner::ds::object_property::{
    PropertyDescriptor, PropertyDescriptorData, PropertyDescriptorSetter, PropertyKey,
};
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::value::{JsNumberType, JsValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypedArrayKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}
impl TypedArrayKind {
    pub const ALL: [TypedArrayKind; 9] = [
        TypedArrayKind::Int8,
        TypedArrayKind::Uint8,
        TypedArrayKind::Uint8Clamped,
        TypedArrayKind::Int16,
        TypedArrayKind::Uint16,
        TypedArrayKind::Int32,
        TypedArrayKind::Uint32,
        TypedArrayKind::Float32,
        TypedArrayKind::Float64,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TypedArrayKind::Int8 => "Int8Array",
            TypedArrayKind::Uint8 => "Uint8Array",
            TypedArrayKind::Uint8Clamped => "Uint8ClampedArray",
            TypedArrayKind::Int16 => "Int16Array",
            TypedArrayKind::Uint16 => "Uint16Array",
            TypedArrayKind::Int32 => "Int32Array",
            TypedArrayKind::Uint32 => "Uint32Array",
            TypedArrayKind::Float32 => "Float32Array",
            TypedArrayKind::Float64 => "Float64Array",
        }
    }

    pub fn element_size(&self) -> usize {
        match self {
            TypedArrayKind::Int8 | TypedArrayKind::Uint8 | TypedArrayKind::Uint8Clamped => 1,
            TypedArrayKind::Int16 | TypedArrayKind::Uint16 => 2,
            TypedArrayKind::Int32 | TypedArrayKind::Uint32 | TypedArrayKind::Float32 => 4,
            TypedArrayKind::Float64 => 8,
        }
    }

    /// Decodes one little-endian element; `bytes` is exactly `element_size()` long.
    fn read(&self, bytes: &[u8]) -> f64 {
        match self {
            TypedArrayKind::Int8 => bytes[0] as i8 as f64,
            TypedArrayKind::Uint8 | TypedArrayKind::Uint8Clamped => bytes[0] as f64,
            TypedArrayKind::Int16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            TypedArrayKind::Uint16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            TypedArrayKind::Int32 => i32::from_le_bytes(four(bytes)) as f64,
            TypedArrayKind::Uint32 => u32::from_le_bytes(four(bytes)) as f64,
            TypedArrayKind::Float32 => f32::from_le_bytes(four(bytes)) as f64,
            TypedArrayKind::Float64 => {
                let eight: [u8; 8] = bytes.try_into().unwrap_or([0; 8]);
                f64::from_le_bytes(eight)
            }
        }
    }

    fn encode(&self, value: f64) -> Vec<u8> {
        let int = if value.is_finite() { value.trunc() as i64 } else { 0 };
        match self {
            TypedArrayKind::Int8 => (int as i8).to_le_bytes().to_vec(),
            TypedArrayKind::Uint8 => (int as u8).to_le_bytes().to_vec(),
            TypedArrayKind::Uint8Clamped => {
                let clamped = if value.is_nan() {
                    0.0
                } else {
                    value.max(0.0).min(255.0).round()
                };
                vec![clamped as u8]
            }
            TypedArrayKind::Int16 => (int as i16).to_le_bytes().to_vec(),
            TypedArrayKind::Uint16 => (int as u16).to_le_bytes().to_vec(),
            TypedArrayKind::Int32 => (int as i32).to_le_bytes().to_vec(),
            TypedArrayKind::Uint32 => (int as u32).to_le_bytes().to_vec(),
            TypedArrayKind::Float32 => (value as f32).to_le_bytes().to_vec(),
            TypedArrayKind::Float64 => value.to_le_bytes().to_vec(),
        }
    }
}

fn four(bytes: &[u8]) -> [u8; 4] {
    bytes.try_into().unwrap_or([0; 4])
}

/// A typed array owning its backing store. Indexed elements are virtual properties
/// backed by `buffer`.
pub struct TypedArrayObject {
    base: ObjectBase,
    kind: TypedArrayKind,
    buffer: Vec<u8>,
}
impl TypedArrayObject {
    pub fn new(
        realm: RealmId,
        prototype: Option<JsObjectType>,
        kind: TypedArrayKind,
        length: usize,
    ) -> Self {
        TypedArrayObject {
            base: ObjectBase::new(realm, prototype),
            kind,
            buffer: vec![0; length * kind.element_size()],
        }
    }

    /// Wraps a copy of `bytes`; a trailing partial element is dropped.
    pub fn from_bytes(
        realm: RealmId,
        prototype: Option<JsObjectType>,
        kind: TypedArrayKind,
        bytes: &[u8],
    ) -> Self {
        let usable = bytes.len() - bytes.len() % kind.element_size();
        TypedArrayObject {
            base: ObjectBase::new(realm, prototype),
            kind,
            buffer: bytes[..usable].to_vec(),
        }
    }

    pub fn kind(&self) -> TypedArrayKind {
        self.kind
    }

    pub fn length(&self) -> usize {
        self.buffer.len() / self.kind.element_size()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn get_index(&self, index: usize) -> Option<JsValue> {
        if index >= self.length() {
            return None;
        }
        let size = self.kind.element_size();
        let start = index * size;
        let value = self.kind.read(&self.buffer[start..start + size]);
        Some(JsValue::Number(JsNumberType::from_f64(value)))
    }

    pub fn set_index(&mut self, index: usize, value: f64) -> bool {
        if index >= self.length() {
            return false;
        }
        let size = self.kind.element_size();
        let start = index * size;
        let encoded = self.kind.encode(value);
        self.buffer[start..start + size].copy_from_slice(&encoded);
        true
    }
}
impl JsObject for TypedArrayObject {
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
        self.kind.name()
    }

    fn get_own_property(&self, property: &PropertyKey) -> Option<PropertyDescriptor> {
        match property {
            PropertyKey::Int(i) => self.get_index(*i as usize).map(|value| {
                PropertyDescriptor::Data(PropertyDescriptorData {
                    value,
                    writable: true,
                    enumerable: true,
                    configurable: true,
                })
            }),
            _ => self.base.get(property).cloned(),
        }
    }

    fn define_own_property(
        &mut self,
        property: PropertyKey,
        descriptor_setter: PropertyDescriptorSetter,
    ) -> bool {
        let index = match property {
            PropertyKey::Int(i) => i as usize,
            _ => return ordinary_define_own_property(&mut self.base, property, descriptor_setter),
        };
        if index >= self.length() {
            return false;
        }
        let descriptor = &descriptor_setter.descriptor;
        if (descriptor_setter.honour_configurable && !descriptor.is_configurable())
            || (descriptor_setter.honour_enumerable && !descriptor.is_enumerable())
            || (descriptor_setter.honour_writable && !descriptor.is_writable())
            || descriptor_setter.honour_get
            || descriptor_setter.honour_set
        {
            return false;
        }
        if descriptor_setter.honour_value {
            if let PropertyDescriptor::Data(d) = descriptor {
                let value = d.value.as_f64().unwrap_or(f64::NAN);
                return self.set_index(index, value);
            }
        }
        true
    }

    fn delete(&mut self, property: &PropertyKey) -> bool {
        match property {
            PropertyKey::Int(i) => (*i as usize) >= self.length(),
            _ => {
                if self.base.get(property).map(|d| d.is_configurable()).unwrap_or(true) {
                    self.base.remove(property);
                    true
                } else {
                    false
                }
            }
        }
    }

    fn own_property_keys(&self) -> Vec<PropertyKey> {
        let mut keys: Vec<PropertyKey> = (0..self.length() as u32).map(PropertyKey::Int).collect();
        keys.extend(self.base.keys().cloned());
        keys
    }
}
