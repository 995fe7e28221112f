//! Tests for running code in other worlds, navigation and weak tracking.

extern crate context_bridge;


use bridge_util::*;
use context_bridge::runner::api::ContextBridge;
use context_bridge::runner::bridge::execute_in_world::ExecutionScript;
use context_bridge::runner::bridge::{BridgeConfig, BridgeError, ISOLATED_WORLD_ID, MAIN_WORLD_ID};
use context_bridge::runner::ds::error::JErrorType;
use context_bridge::runner::ds::execution_context::EvalContext;
use context_bridge::runner::ds::realm::WellKnownIntrinsics;
use context_bridge::runner::ds::value::JsValue;

fn current_world(ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let id = ctx.current_realm()?.borrow().world_id();
    Ok(JsValue::from(id))
}

fn sum(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::from(args.iter().filter_map(|a| a.as_f64()).sum::<f64>()))
}

fn this_value(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(this)
}

fn make_list(ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let realm = ctx.current_realm()?;
    let list = realm.borrow().new_array(vec![JsValue::from(1), JsValue::from(2)]);
    Ok(JsValue::Object(list))
}

fn fail(_ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Err(JErrorType::Error("bad".to_string()))
}

fn throw_string(_ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Err(JErrorType::Exception(JsValue::from("plain")))
}

fn native(bridge: &mut ContextBridge, name: &str, f: context_bridge::runner::ds::function_object::NativeFn) -> JsValue {
    let realm = isolated(bridge);
    let f = realm.borrow().new_native_function(name, f);
    JsValue::Object(f)
}

fn script(bridge: &mut ContextBridge, func: JsValue, args: Option<JsValue>) -> JsValue {
    let realm = isolated(bridge);
    let mut entries = vec![("func", func)];
    if let Some(args) = args {
        entries.push(("args", args));
    }
    object(&realm, entries)
}

// ============================================================================
// executeInWorld
// ============================================================================

mod execute_tests {
    use super::*;

    #[test]
    fn test_runs_in_target_world() {
        let mut bridge = new_bridge();
        let func = native(&mut bridge, "currentWorld", current_world);
        let script = script(&mut bridge, func, None);
        let result = bridge.execute_in_world(MAIN_WORLD_ID, &script).unwrap();
        assert_eq!(result, JsValue::from(MAIN_WORLD_ID));

        let result = bridge.execute_in_world(1004, &script).unwrap();
        assert_eq!(result, JsValue::from(1004));
    }

    #[test]
    fn test_arguments_cross() {
        let mut bridge = new_bridge();
        let func = native(&mut bridge, "sum", sum);
        let realm = isolated(&mut bridge);
        let args = array(&realm, vec![JsValue::from(1), JsValue::from(2), JsValue::from(3)]);
        let script = script(&mut bridge, func, Some(args));
        assert_eq!(bridge.execute_in_world(MAIN_WORLD_ID, &script).unwrap(), JsValue::from(6));
    }

    #[test]
    fn test_this_is_null() {
        let mut bridge = new_bridge();
        let func = native(&mut bridge, "thisValue", this_value);
        let script = ExecutionScript::new(func, vec![]);
        assert_eq!(
            bridge.execute_script_in_world(MAIN_WORLD_ID, &script).unwrap(),
            JsValue::Null
        );
    }

    #[test]
    fn test_result_crosses_back() {
        let mut bridge = new_bridge();
        let func = native(&mut bridge, "makeList", make_list);
        let script = ExecutionScript::new(func, vec![]);
        let list = bridge.execute_script_in_world(MAIN_WORLD_ID, &script).unwrap();

        let realm = isolated(&mut bridge);
        assert!(has_prototype(&list, &intrinsic(&realm, WellKnownIntrinsics::ArrayPrototype)));
        assert_eq!(prop(&mut bridge, &list, "length"), JsValue::from(2));
    }

    #[test]
    fn test_closures_are_rejected() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let func = closure(&realm, "stateful", |_ctx, _this, _args| Ok(JsValue::Undefined));
        let script = script(&mut bridge, func, None);
        let err = bridge.execute_in_world(MAIN_WORLD_ID, &script).unwrap_err();
        assert_eq!(
            err.message(),
            "Function 'stateful' captures state and cannot run in another world"
        );
    }

    #[test]
    fn test_missing_func() {
        let mut bridge = new_bridge();
        let script = script(&mut bridge, JsValue::from(1), None);
        let err = bridge.execute_in_world(MAIN_WORLD_ID, &script).unwrap_err();
        assert_eq!(err.message(), "Function 'func' is required in script");
    }

    #[test]
    fn test_args_must_be_an_array() {
        let mut bridge = new_bridge();
        let func = native(&mut bridge, "sum", sum);
        let script = script(&mut bridge, func, Some(JsValue::from(1)));
        let err = bridge.execute_in_world(MAIN_WORLD_ID, &script).unwrap_err();
        assert_eq!(err.message(), "'args' must be an array");
    }

    #[test]
    fn test_oversized_args_are_rejected() {
        let mut bridge = new_bridge();
        let func = native(&mut bridge, "sum", sum);
        let realm = isolated(&mut bridge);
        let args = JsValue::Object(realm.borrow().new_array_with_length(u32::MAX));
        let script = script(&mut bridge, func, Some(args));
        match bridge.execute_in_world(MAIN_WORLD_ID, &script) {
            Err(BridgeError::Script(JErrorType::RangeError(message))) => {
                assert_eq!(message, "'args' may hold at most 65535 arguments")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unbridgeable_argument() {
        let mut bridge = new_bridge();
        let func = native(&mut bridge, "sum", sum);
        let realm = isolated(&mut bridge);
        let args = array(&realm, vec![JsValue::from(1), nested_array(&realm, 1000)]);
        let script = script(&mut bridge, func, Some(args));
        let err = bridge.execute_in_world(MAIN_WORLD_ID, &script).unwrap_err();
        assert_eq!(err.message(), "Failed to proxy argument at index 1");
    }

    #[test]
    fn test_thrown_errors_surface() {
        let mut bridge = new_bridge();
        let func = native(&mut bridge, "fail", fail);
        let script = ExecutionScript::new(func, vec![]);
        match bridge.execute_script_in_world(MAIN_WORLD_ID, &script) {
            Err(BridgeError::CrossRealmException(message)) => assert_eq!(message, "Error: bad"),
            other => panic!("unexpected {:?}", other),
        }

        let func = native(&mut bridge, "throwString", throw_string);
        let script = ExecutionScript::new(func, vec![]);
        match bridge.execute_script_in_world(MAIN_WORLD_ID, &script) {
            Err(BridgeError::CrossRealmException(message)) => assert_eq!(message, "plain"),
            other => panic!("unexpected {:?}", other),
        }
    }
}

// ============================================================================
// Navigation
// ============================================================================

mod reload_tests {
    use super::*;

    #[test]
    fn test_reload_starts_fresh() {
        let mut bridge = new_bridge();
        let before = bridge.main_world().unwrap();
        expose(&mut bridge, "api", JsValue::from(1));

        let after = bridge.reload().unwrap();
        assert_ne!(before, after);
        assert_eq!(bridge.main_world().unwrap(), after);
        assert_eq!(main_global(&mut bridge, "api"), JsValue::Undefined);

        // the name is free again
        expose(&mut bridge, "api", JsValue::from(2));
        assert_eq!(main_global(&mut bridge, "api"), JsValue::from(2));
    }

    #[test]
    fn test_reload_drops_other_worlds() {
        let mut bridge = new_bridge();
        bridge.world(1004).unwrap();
        let isolated_before = bridge.isolated_world().unwrap();
        bridge.reload().unwrap();

        assert_eq!(bridge.frame().world_ids(), vec![MAIN_WORLD_ID]);
        assert!(matches!(
            bridge.frame().world(ISOLATED_WORLD_ID),
            Err(BridgeError::UnknownWorld(ISOLATED_WORLD_ID))
        ));
        assert_ne!(bridge.isolated_world().unwrap(), isolated_before);
    }

    #[test]
    fn test_document_is_replaced() {
        let mut bridge = new_bridge();
        let before = main_global(&mut bridge, "document");
        bridge.reload().unwrap();
        let after = main_global(&mut bridge, "document");
        assert_ne!(before, after);
        assert!(matches!(after, JsValue::Object(_)));
    }
}

// ============================================================================
// Weak tracking
// ============================================================================

mod weak_tests {
    use super::*;

    #[test]
    fn test_dropped_values_are_not_live() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let kept = object(&realm, vec![]);
        let dropped = object(&realm, vec![]);
        bridge.track_weak_value(&kept).unwrap();
        bridge.track_weak_value(&dropped).unwrap();
        bridge.track_weak_value(&JsValue::from(1)).unwrap();
        assert_eq!(bridge.weakly_tracked_count().unwrap(), 2);

        drop(dropped);
        bridge.collect_garbage();
        assert_eq!(bridge.weakly_tracked_count().unwrap(), 1);
        let live = bridge.weakly_tracked_values().unwrap();
        assert_eq!(live.len(), 1);
        assert!(std::rc::Rc::ptr_eq(&live[0], &as_object(&kept)));
    }

    #[test]
    fn test_proxy_dies_with_its_world() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let api = object(&realm, vec![("v", JsValue::from(1))]);
        let exposed = expose(&mut bridge, "api", api);
        bridge.track_weak_value(&exposed).unwrap();
        drop(exposed);
        assert_eq!(bridge.weakly_tracked_count().unwrap(), 1);

        bridge.reload().unwrap();
        bridge.collect_garbage();
        assert_eq!(bridge.weakly_tracked_count().unwrap(), 0);
    }

    #[test]
    fn test_sandboxed_has_no_tracking() {
        let mut bridge = new_bridge_with(BridgeConfig {
            sandboxed: true,
            ..BridgeConfig::default()
        });
        assert!(matches!(
            bridge.track_weak_value(&JsValue::from(1)),
            Err(BridgeError::WeakTrackingUnavailable)
        ));
        assert!(matches!(
            bridge.weakly_tracked_count(),
            Err(BridgeError::WeakTrackingUnavailable)
        ));
    }

    #[test]
    fn test_collect_garbage_prunes_identity_entries() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let identity = closure(&realm, "identity", |_ctx, _this, args| {
            Ok(args.into_iter().next().unwrap_or(JsValue::Undefined))
        });
        let identity = expose(&mut bridge, "identity", identity);

        let main = main_realm(&mut bridge);
        let before = main.borrow().bridge_state().entry_count();
        {
            let temp = object(&main, vec![]);
            call_fn(&mut bridge, &identity, vec![temp]).unwrap();
        }
        assert!(main.borrow().bridge_state().entry_count() > before);
        assert!(bridge.collect_garbage() > 0);
        assert_eq!(main.borrow().bridge_state().entry_count(), before);
    }
}
