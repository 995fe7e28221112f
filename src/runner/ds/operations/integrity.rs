use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorSetter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegrityLevel {
    Sealed,
    Frozen,
}

/// SetIntegrityLevel. Returns `false` if some property could not be locked, in which
/// case the properties already visited stay locked.
pub fn set_integrity_level(o: &JsObjectType, level: IntegrityLevel) -> bool {
    let mut o = (**o).borrow_mut();
    let o = o.as_js_object_mut();
    if !o.prevent_extensions() {
        return false;
    }
    let mut ok = true;
    for key in o.own_property_keys() {
        let setter = match (level, o.get_own_property(&key)) {
            (IntegrityLevel::Frozen, Some(PropertyDescriptor::Data(_))) => {
                PropertyDescriptorSetter::frozen()
            }
            (_, Some(_)) => PropertyDescriptorSetter::sealed(),
            (_, None) => continue,
        };
        ok &= o.define_own_property(key, setter);
    }
    ok
}

pub fn test_integrity_level(o: &JsObjectType, level: IntegrityLevel) -> bool {
    let o = (**o).borrow();
    let o = o.as_js_object();
    if o.is_extensible() {
        return false;
    }
    o.own_property_keys().iter().all(|k| match o.get_own_property(k) {
        Some(d) => {
            !d.is_configurable() && (level == IntegrityLevel::Sealed || !d.is_writable())
        }
        None => true,
    })
}
