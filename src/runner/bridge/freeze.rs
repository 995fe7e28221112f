//! Freezing what an exposure created.
//!
//! Only objects built by the conversion itself are frozen. Originals that were unwrapped on
//! the way and proxies made by earlier crossings are left as they are.

use tracing::debug;

use crate::runner::bridge::error::BridgeError;
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::operations::integrity::{set_integrity_level, IntegrityLevel};
use crate::runner::ds::operations::type_conversion::display_string;
use crate::runner::ds::value::JsValue;

/// Typed arrays cannot be frozen while they have elements and host objects belong to the
/// page, so both are left alone.
fn is_freezable(object: &JsObjectType) -> bool {
    !matches!(
        &*(**object).borrow(),
        ObjectType::TypedArray(_) | ObjectType::Host(_)
    )
}

/// Freezes every object of `created`. Returns the number of objects frozen.
pub fn freeze_created(created: &[JsObjectType]) -> Result<usize, BridgeError> {
    let mut frozen = 0;
    for object in created.iter().filter(|o| is_freezable(o)) {
        if !set_integrity_level(object, IntegrityLevel::Frozen) {
            return Err(BridgeError::FreezeFailed(display_string(&JsValue::Object(
                object.clone(),
            ))));
        }
        frozen += 1;
    }
    debug!(frozen, skipped = created.len() - frozen, "froze bridged objects");
    Ok(frozen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::agent::Agent;
    use crate::runner::ds::operations::integrity::test_integrity_level;
    use crate::runner::ds::realm::JsCodeRealmType;
    use crate::runner::ds::typed_array_object::TypedArrayKind;

    fn new_realm() -> JsCodeRealmType {
        Agent::new().create_realm(0, None).unwrap()
    }

    #[test]
    fn test_freezes_listed_objects() {
        let realm = new_realm();
        let (object, list) = {
            let r = realm.borrow();
            (r.new_object_with(vec![("x", JsValue::from(1))]), r.new_array(vec![JsValue::from("a")]))
        };
        assert_eq!(freeze_created(&[object.clone(), list.clone()]).unwrap(), 2);
        assert!(test_integrity_level(&object, IntegrityLevel::Frozen));
        assert!(test_integrity_level(&list, IntegrityLevel::Frozen));
    }

    #[test]
    fn test_unlisted_children_stay_mutable() {
        let realm = new_realm();
        let (root, child) = {
            let r = realm.borrow();
            let child = r.new_object_with(vec![("x", JsValue::from(1))]);
            let root = r.new_object_with(vec![("child", JsValue::Object(child.clone()))]);
            (root, child)
        };
        assert_eq!(freeze_created(&[root.clone()]).unwrap(), 1);
        assert!(test_integrity_level(&root, IntegrityLevel::Frozen));
        assert!(!test_integrity_level(&child, IntegrityLevel::Frozen));
    }

    #[test]
    fn test_typed_arrays_are_skipped() {
        let realm = new_realm();
        let (root, bytes) = {
            let r = realm.borrow();
            let bytes = r.new_typed_array(TypedArrayKind::Uint8, &[1, 2, 3]);
            let root = r.new_object_with(vec![("bytes", JsValue::Object(bytes.clone()))]);
            (root, bytes)
        };
        assert_eq!(freeze_created(&[root.clone(), bytes.clone()]).unwrap(), 1);
        assert!(test_integrity_level(&root, IntegrityLevel::Frozen));
        assert!(!test_integrity_level(&bytes, IntegrityLevel::Frozen));
    }
}
