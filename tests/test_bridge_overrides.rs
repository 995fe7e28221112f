//! Tests for the internal override operations.

extern crate context_bridge;


use std::cell::Cell;
use std::rc::Rc;

use bridge_util::*;
use context_bridge::parser::KeyPath;
use context_bridge::runner::api::ContextBridge;
use context_bridge::runner::bridge::BridgeError;
use context_bridge::runner::ds::object_property::{PropertyDescriptorSetter, PropertyKey};
use context_bridge::runner::ds::operations::object::{create_data_property, define_property_or_throw, set};
use context_bridge::runner::ds::value::JsValue;

/// Gives the main world a `foo` object to override properties of.
fn with_main_foo(bridge: &mut ContextBridge) -> JsValue {
    let main = main_realm(bridge);
    let foo = object(&main, vec![("bar", JsValue::from("original"))]);
    let global = main.borrow().global_object();
    assert!(create_data_property(&global, PropertyKey::from("foo"), foo.clone()));
    foo
}

/// An isolated world object whose `count` getter counts its own invocations.
fn counting_object(bridge: &mut ContextBridge, counter: Rc<Cell<i32>>) -> JsValue {
    let realm = isolated(bridge);
    let value = object(&realm, vec![]);
    let getter = closure(&realm, "get count", move |_ctx, _this, _args| {
        counter.set(counter.get() + 1);
        Ok(JsValue::from(counter.get()))
    });
    define_property_or_throw(
        &as_object(&value),
        PropertyKey::from("count"),
        PropertyDescriptorSetter::accessor(getter.as_object().cloned(), None, true, true),
    )
    .unwrap();
    value
}

// ============================================================================
// Values
// ============================================================================

mod value_tests {
    use super::*;

    #[test]
    fn test_override_nested_value() {
        let mut bridge = new_bridge();
        let foo = with_main_foo(&mut bridge);
        let realm = isolated(&mut bridge);
        let replacement = object(&realm, vec![("patched", JsValue::from(true))]);

        bridge
            .internal()
            .override_global_value_from_isolated_world("foo.bar", &replacement)
            .unwrap();

        let bar = prop(&mut bridge, &foo, "bar");
        assert_ne!(bar, replacement);
        assert_eq!(prop(&mut bridge, &bar, "patched"), JsValue::from(true));
        // overrides are not frozen
        let bar_object = as_object(&bar);
        assert!(set(bridge.ctx(), &bar_object, PropertyKey::from("patched"), JsValue::from(false), &bar).unwrap());
    }

    #[test]
    fn test_override_with_function() {
        let mut bridge = new_bridge();
        let foo = with_main_foo(&mut bridge);
        let realm = isolated(&mut bridge);
        let f = closure(&realm, "bar", |_ctx, _this, _args| Ok(JsValue::from("from preload")));

        bridge
            .internal()
            .override_global_value_from_isolated_world("foo.bar", &f)
            .unwrap();
        let result = call_method(&mut bridge, &foo, "bar", vec![]).unwrap();
        assert_eq!(result, JsValue::from("from preload"));
    }

    #[test]
    fn test_override_top_level_global() {
        let mut bridge = new_bridge();
        bridge
            .internal()
            .override_global_value_from_isolated_world("foo", &JsValue::from(3))
            .unwrap();
        assert_eq!(main_global(&mut bridge, "foo"), JsValue::from(3));
    }

    #[test]
    fn test_segment_list_paths() {
        let mut bridge = new_bridge();
        let foo = with_main_foo(&mut bridge);
        bridge
            .internal()
            .override_global_value_from_isolated_world(
                vec!["foo".to_string(), "bar".to_string()],
                &JsValue::from(1),
            )
            .unwrap();
        bridge
            .internal()
            .override_global_value_from_isolated_world(["foo", "baz qux"], &JsValue::from(2))
            .unwrap();
        bridge
            .internal()
            .override_global_value_from_isolated_world(KeyPath::parse("foo['quoted']").unwrap(), &JsValue::from(3))
            .unwrap();

        assert_eq!(prop(&mut bridge, &foo, "bar"), JsValue::from(1));
        assert_eq!(prop(&mut bridge, &foo, "baz qux"), JsValue::from(2));
        assert_eq!(prop(&mut bridge, &foo, "quoted"), JsValue::from(3));
    }
}

// ============================================================================
// Accessors
// ============================================================================

mod property_tests {
    use super::*;

    #[test]
    fn test_getter_and_setter_forward() {
        let mut bridge = new_bridge();
        let foo = with_main_foo(&mut bridge);
        let realm = isolated(&mut bridge);
        let store = object(&realm, vec![("value", JsValue::from(1))]);
        let getter = {
            let store = store.clone();
            closure(&realm, "get", move |ctx, _this, _args| {
                context_bridge::runner::ds::operations::object::get_value(
                    ctx,
                    &store,
                    &PropertyKey::from("value"),
                )
            })
        };
        let setter = {
            let store = as_object(&store);
            closure(&realm, "set", move |ctx, _this, args| {
                let v = args.into_iter().next().unwrap_or(JsValue::Undefined);
                context_bridge::runner::ds::operations::object::put(ctx, &store, PropertyKey::from("value"), v)?;
                Ok(JsValue::Undefined)
            })
        };

        bridge
            .internal()
            .override_global_property_from_isolated_world("foo.bar", &getter, Some(&setter))
            .unwrap();

        assert_eq!(prop(&mut bridge, &foo, "bar"), JsValue::from(1));
        let foo_object = as_object(&foo);
        assert!(set(bridge.ctx(), &foo_object, PropertyKey::from("bar"), JsValue::from(5), &foo).unwrap());
        assert_eq!(prop(&mut bridge, &store, "value"), JsValue::from(5));
        assert_eq!(prop(&mut bridge, &foo, "bar"), JsValue::from(5));
    }

    #[test]
    fn test_getter_only_ignores_writes() {
        let mut bridge = new_bridge();
        let foo = with_main_foo(&mut bridge);
        let realm = isolated(&mut bridge);
        let getter = closure(&realm, "get", |_ctx, _this, _args| Ok(JsValue::from("fixed")));

        bridge
            .internal()
            .override_global_property_from_isolated_world("foo.bar", &getter, None)
            .unwrap();

        let foo_object = as_object(&foo);
        assert!(!set(bridge.ctx(), &foo_object, PropertyKey::from("bar"), JsValue::from(5), &foo).unwrap());
        assert_eq!(prop(&mut bridge, &foo, "bar"), JsValue::from("fixed"));
    }

    #[test]
    fn test_non_function_setter_is_ignored() {
        let mut bridge = new_bridge();
        let foo = with_main_foo(&mut bridge);
        let realm = isolated(&mut bridge);
        let getter = closure(&realm, "get", |_ctx, _this, _args| Ok(JsValue::from(1)));

        bridge
            .internal()
            .override_global_property_from_isolated_world("foo.bar", &getter, Some(&JsValue::Null))
            .unwrap();
        let foo_object = as_object(&foo);
        assert!(!set(bridge.ctx(), &foo_object, PropertyKey::from("bar"), JsValue::from(5), &foo).unwrap());
    }

    #[test]
    fn test_getter_must_be_callable() {
        let mut bridge = new_bridge();
        with_main_foo(&mut bridge);
        let err = bridge
            .internal()
            .override_global_property_from_isolated_world("foo.bar", &JsValue::from(1), None)
            .unwrap_err();
        assert!(err.to_string().contains("getter must be a function"));
    }
}

// ============================================================================
// Dynamic properties
// ============================================================================

mod dynamic_tests {
    use super::*;

    #[test]
    fn test_getters_stay_live() {
        let mut bridge = new_bridge();
        let counter = Rc::new(Cell::new(0));
        let value = counting_object(&mut bridge, counter.clone());

        bridge
            .internal()
            .override_global_value_with_dynamic_props_from_isolated_world("live", &value)
            .unwrap();
        let live = main_global(&mut bridge, "live");
        assert_eq!(prop(&mut bridge, &live, "count"), JsValue::from(1));
        assert_eq!(prop(&mut bridge, &live, "count"), JsValue::from(2));
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_static_override_snapshots() {
        let mut bridge = new_bridge();
        let counter = Rc::new(Cell::new(0));
        let value = counting_object(&mut bridge, counter.clone());

        bridge
            .internal()
            .override_global_value_from_isolated_world("snapshot", &value)
            .unwrap();
        let snapshot = main_global(&mut bridge, "snapshot");
        assert_eq!(prop(&mut bridge, &snapshot, "count"), JsValue::from(1));
        assert_eq!(prop(&mut bridge, &snapshot, "count"), JsValue::from(1));
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_nested_getters_stay_live() {
        let mut bridge = new_bridge();
        let counter = Rc::new(Cell::new(0));
        let inner = counting_object(&mut bridge, counter.clone());
        let realm = isolated(&mut bridge);
        let outer = object(&realm, vec![("inner", inner)]);

        bridge
            .internal()
            .override_global_value_with_dynamic_props_from_isolated_world("outer", &outer)
            .unwrap();
        let outer = main_global(&mut bridge, "outer");
        let inner = prop(&mut bridge, &outer, "inner");
        prop(&mut bridge, &inner, "count");
        assert_eq!(prop(&mut bridge, &inner, "count"), JsValue::from(2));
    }
}

// ============================================================================
// Invalid paths
// ============================================================================

mod path_tests {
    use super::*;

    fn assert_invalid(result: Result<(), BridgeError>) {
        match result {
            Err(BridgeError::InvalidKeyPath { .. }) => {}
            other => panic!("expected an invalid key path, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_parent() {
        let mut bridge = new_bridge();
        assert_invalid(
            bridge
                .internal()
                .override_global_value_from_isolated_world("missing.bar", &JsValue::from(1)),
        );
    }

    #[test]
    fn test_primitive_parent() {
        let mut bridge = new_bridge();
        bridge
            .internal()
            .override_global_value_from_isolated_world("flag", &JsValue::from(true))
            .unwrap();
        let err = bridge
            .internal()
            .override_global_value_from_isolated_world("flag.bar", &JsValue::from(1))
            .unwrap_err();
        assert!(err.to_string().contains("'flag' is not an object"));
    }

    #[test]
    fn test_unparseable_and_empty_paths() {
        let mut bridge = new_bridge();
        assert_invalid(
            bridge
                .internal()
                .override_global_value_from_isolated_world("foo..bar", &JsValue::from(1)),
        );
        assert_invalid(
            bridge
                .internal()
                .override_global_value_from_isolated_world(Vec::<String>::new(), &JsValue::from(1)),
        );
    }
}
