//! Tests for exposing APIs onto another world's global.

extern crate context_bridge;


use std::cell::RefCell;
use std::rc::Rc;

use bridge_util::*;
use context_bridge::runner::bridge::{BridgeConfig, BridgeError, MAIN_WORLD_ID};
use context_bridge::runner::ds::object_property::PropertyKey;
use context_bridge::runner::ds::operations::integrity::{test_integrity_level, IntegrityLevel};
use context_bridge::runner::ds::operations::object::{get_own_property, set};
use context_bridge::runner::ds::realm::WellKnownIntrinsics;
use context_bridge::runner::ds::typed_array_object::TypedArrayKind;
use context_bridge::runner::ds::value::JsValue;

fn mutable_bridge() -> context_bridge::runner::api::ContextBridge {
    new_bridge_with(BridgeConfig {
        mutability: true,
        ..BridgeConfig::default()
    })
}

fn try_set(
    bridge: &mut context_bridge::runner::api::ContextBridge,
    target: &JsValue,
    key: &str,
    value: JsValue,
) -> bool {
    let o = as_object(target);
    set(bridge.ctx(), &o, PropertyKey::from(key), value, target).unwrap()
}

// ============================================================================
// Read-only exposure
// ============================================================================

mod frozen_tests {
    use super::*;

    #[test]
    fn test_exposed_object_is_frozen() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let inner = object(&realm, vec![("level", JsValue::from(2))]);
        let api = object(&realm, vec![("inner", inner), ("name", JsValue::from("api"))]);
        let exposed = expose(&mut bridge, "api", api);

        assert!(test_integrity_level(&as_object(&exposed), IntegrityLevel::Frozen));
        assert!(!try_set(&mut bridge, &exposed, "name", JsValue::from("changed")));
        assert!(!try_set(&mut bridge, &exposed, "added", JsValue::from(1)));
        assert_eq!(prop(&mut bridge, &exposed, "name"), JsValue::from("api"));
        assert_eq!(prop(&mut bridge, &exposed, "added"), JsValue::Undefined);

        let inner = prop(&mut bridge, &exposed, "inner");
        assert!(!try_set(&mut bridge, &inner, "level", JsValue::from(3)));
        assert_eq!(prop(&mut bridge, &inner, "level"), JsValue::from(2));
    }

    #[test]
    fn test_frozen_array_rejects_push() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let list = array(&realm, vec![JsValue::from(1), JsValue::from(2)]);
        let exposed = expose(&mut bridge, "list", list);

        assert!(call_method(&mut bridge, &exposed, "push", vec![JsValue::from(3)]).is_err());
        assert_eq!(prop(&mut bridge, &exposed, "length"), JsValue::from(2));
    }

    #[test]
    fn test_source_stays_mutable() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let api = object(&realm, vec![("n", JsValue::from(1))]);
        expose(&mut bridge, "api", api.clone());

        assert!(!test_integrity_level(&as_object(&api), IntegrityLevel::Frozen));
        assert!(try_set(&mut bridge, &api, "n", JsValue::from(2)));
    }

    #[test]
    fn test_frozen_exposure_reads_live_state() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let state = object(&realm, vec![("count", JsValue::from(1))]);
        let get_state = {
            let state = state.clone();
            closure(&realm, "getState", move |_ctx, _this, _args| Ok(state.clone()))
        };
        let api = object(&realm, vec![("state", state.clone()), ("getState", get_state)]);
        let exposed = expose(&mut bridge, "api", api);

        assert!(try_set(&mut bridge, &state, "count", JsValue::from(5)));
        let frozen_state = prop(&mut bridge, &exposed, "state");
        assert_eq!(prop(&mut bridge, &frozen_state, "count"), JsValue::from(5));
        assert!(test_integrity_level(&as_object(&frozen_state), IntegrityLevel::Frozen));
        assert!(!try_set(&mut bridge, &frozen_state, "count", JsValue::from(6)));

        let result = call_method(&mut bridge, &exposed, "getState", vec![]).unwrap();
        assert_eq!(prop(&mut bridge, &result, "count"), JsValue::from(5));
        assert_ne!(result, frozen_state);
        assert!(!test_integrity_level(&as_object(&result), IntegrityLevel::Frozen));
    }

    #[test]
    fn test_page_object_passed_back_stays_mutable() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let saved = Rc::new(RefCell::new(JsValue::Undefined));
        let store = {
            let saved = saved.clone();
            closure(&realm, "store", move |_ctx, _this, args| {
                *saved.borrow_mut() = args.into_iter().next().unwrap_or(JsValue::Undefined);
                Ok(JsValue::Undefined)
            })
        };
        let store = expose(&mut bridge, "store", store);
        let main = main_realm(&mut bridge);
        let page_object = object(&main, vec![("n", JsValue::from(1))]);
        call_fn(&mut bridge, &store, vec![page_object.clone()]).unwrap();

        let held = saved.borrow().clone();
        let api = object(&realm, vec![("held", held)]);
        let exposed = expose(&mut bridge, "api", api);
        assert_eq!(prop(&mut bridge, &exposed, "held"), page_object);
        assert!(!test_integrity_level(&as_object(&page_object), IntegrityLevel::Frozen));
        assert!(try_set(&mut bridge, &page_object, "n", JsValue::from(2)));
        assert_eq!(prop(&mut bridge, &page_object, "n"), JsValue::from(2));
    }

    #[test]
    fn test_global_binding_is_read_only() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let api = object(&realm, vec![]);
        expose(&mut bridge, "api", api);

        let main = main_realm(&mut bridge);
        let global = main.borrow().global_object();
        let desc = get_own_property(&global, &PropertyKey::from("api")).unwrap();
        assert!(desc.is_data_descriptor());
        assert!(!desc.is_writable());
        assert!(desc.is_enumerable());
        assert!(!desc.is_configurable());

        let global = JsValue::Object(global);
        assert!(!try_set(&mut bridge, &global, "api", JsValue::from(1)));
    }

    #[test]
    fn test_primitive_exposed_read_only() {
        let mut bridge = new_bridge();
        let exposed = expose(&mut bridge, "answer", JsValue::from(42));
        assert_eq!(exposed, JsValue::from(42));

        let global = JsValue::Object(main_realm(&mut bridge).borrow().global_object());
        assert!(!try_set(&mut bridge, &global, "answer", JsValue::from(0)));
        assert_eq!(main_global(&mut bridge, "answer"), JsValue::from(42));
    }

    #[test]
    fn test_typed_array_stays_writable() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let bytes = JsValue::Object(realm.borrow().new_typed_array(TypedArrayKind::Uint8, &[1, 2, 3]));
        let exposed = expose(&mut bridge, "bytes", bytes);

        assert!(!test_integrity_level(&as_object(&exposed), IntegrityLevel::Frozen));
        let main = main_realm(&mut bridge);
        assert!(has_prototype(
            &exposed,
            &intrinsic(&main, WellKnownIntrinsics::TypedArrayPrototype(TypedArrayKind::Uint8))
        ));
    }
}

// ============================================================================
// Mutable exposure
// ============================================================================

mod mutability_tests {
    use super::*;

    #[test]
    fn test_mutations_succeed() {
        let mut bridge = mutable_bridge();
        let realm = isolated(&mut bridge);
        let list = array(&realm, vec![JsValue::from(1)]);
        let api = object(&realm, vec![("list", list), ("name", JsValue::from("api"))]);
        let exposed = expose(&mut bridge, "api", api.clone());

        assert!(try_set(&mut bridge, &exposed, "name", JsValue::from("changed")));
        assert_eq!(prop(&mut bridge, &exposed, "name"), JsValue::from("changed"));
        assert_eq!(prop(&mut bridge, &api, "name"), JsValue::from("changed"));

        let list = prop(&mut bridge, &exposed, "list");
        assert!(try_set(&mut bridge, &list, "0", JsValue::from(9)));
        let source_list = prop(&mut bridge, &api, "list");
        assert_eq!(prop(&mut bridge, &source_list, "0"), JsValue::from(9));
    }

    #[test]
    fn test_source_changes_are_visible() {
        let mut bridge = mutable_bridge();
        let realm = isolated(&mut bridge);
        let list = array(&realm, vec![JsValue::from(1)]);
        let api = object(&realm, vec![("list", list.clone()), ("name", JsValue::from("api"))]);
        let exposed = expose(&mut bridge, "api", api.clone());

        call_method(&mut bridge, &list, "push", vec![JsValue::from(2)]).unwrap();
        assert!(try_set(&mut bridge, &api, "name", JsValue::from("renamed")));

        let exposed_list = prop(&mut bridge, &exposed, "list");
        assert_eq!(prop(&mut bridge, &exposed_list, "length"), JsValue::from(2));
        assert_eq!(prop(&mut bridge, &exposed_list, "1"), JsValue::from(2));
        assert_eq!(prop(&mut bridge, &exposed, "name"), JsValue::from("renamed"));
    }

    #[test]
    fn test_global_binding_is_writable() {
        let mut bridge = mutable_bridge();
        expose(&mut bridge, "answer", JsValue::from(42));
        let global = JsValue::Object(main_realm(&mut bridge).borrow().global_object());
        assert!(try_set(&mut bridge, &global, "answer", JsValue::from(0)));
        assert_eq!(main_global(&mut bridge, "answer"), JsValue::from(0));
    }
}

// ============================================================================
// Name collisions
// ============================================================================

mod collision_tests {
    use super::*;

    #[test]
    fn test_second_exposure_collides() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let first = object(&realm, vec![("v", JsValue::from(1))]);
        let second = object(&realm, vec![("v", JsValue::from(2))]);
        expose(&mut bridge, "api", first);

        match bridge.expose_in_main_world("api", &second) {
            Err(BridgeError::NameCollision(name)) => assert_eq!(name, "api"),
            other => panic!("unexpected {:?}", other),
        }
        let exposed = main_global(&mut bridge, "api");
        assert_eq!(prop(&mut bridge, &exposed, "v"), JsValue::from(1));
    }

    #[test]
    fn test_existing_global_collides() {
        let mut bridge = new_bridge();
        let document = main_global(&mut bridge, "document");
        let err = bridge
            .expose_in_main_world("document", &JsValue::from("fake"))
            .unwrap_err();
        assert!(matches!(err, BridgeError::NameCollision(_)));
        assert_eq!(
            err.to_string(),
            "Cannot bind an API on top of an existing property on the window object"
        );
        assert_eq!(main_global(&mut bridge, "document"), document);
    }

    #[test]
    fn test_mutable_exposure_still_collides() {
        let mut bridge = mutable_bridge();
        expose(&mut bridge, "api", JsValue::from(1));
        assert!(matches!(
            bridge.expose_in_main_world("api", &JsValue::from(2)),
            Err(BridgeError::NameCollision(_))
        ));
    }
}

// ============================================================================
// Other worlds
// ============================================================================

mod world_tests {
    use super::*;

    #[test]
    fn test_exposure_into_new_world() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let api = object(&realm, vec![("v", JsValue::from(1))]);
        bridge.expose_in_isolated_world(1004, "api", &api).unwrap();

        let exposed = global(&mut bridge, 1004, "api");
        assert_eq!(prop(&mut bridge, &exposed, "v"), JsValue::from(1));
        let world = bridge.realm(1004).unwrap();
        assert!(has_prototype(&exposed, &intrinsic(&world, WellKnownIntrinsics::ObjectPrototype)));
        assert_eq!(main_global(&mut bridge, "api"), JsValue::Undefined);
    }

    #[test]
    fn test_same_name_in_different_worlds() {
        let mut bridge = new_bridge();
        bridge.expose_in_isolated_world(MAIN_WORLD_ID, "api", &JsValue::from(1)).unwrap();
        bridge.expose_in_isolated_world(1004, "api", &JsValue::from(2)).unwrap();
        assert_eq!(main_global(&mut bridge, "api"), JsValue::from(1));
        assert_eq!(global(&mut bridge, 1004, "api"), JsValue::from(2));
    }
}
