//! Tests for function proxies: argument and result marshalling, identity, errors and the
//! recursion bound on arguments.

extern crate context_bridge;


use std::cell::RefCell;
use std::rc::Rc;

use bridge_util::*;
use context_bridge::runner::bridge::function_proxy::UNKNOWN_EXCEPTION_MESSAGE;
use context_bridge::runner::bridge::ISOLATED_WORLD_ID;
use context_bridge::runner::ds::error::{ErrorKind, JErrorType};
use context_bridge::runner::ds::object_property::PropertyKey;
use context_bridge::runner::ds::operations::object::{call, create_data_property, delete_property_or_throw, set};
use context_bridge::runner::ds::realm::WellKnownIntrinsics;
use context_bridge::runner::ds::symbol::SymbolData;
use context_bridge::runner::ds::value::JsValue;

fn first_arg(args: Vec<JsValue>) -> JsValue {
    args.into_iter().next().unwrap_or(JsValue::Undefined)
}

// ============================================================================
// Calls
// ============================================================================

mod call_tests {
    use super::*;

    #[test]
    fn test_arguments_and_result_cross() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let add = closure(&realm, "add", |_ctx, _this, args| {
            let sum: f64 = args.iter().filter_map(|a| a.as_f64()).sum();
            Ok(JsValue::from(sum))
        });
        let api = object(&realm, vec![("add", add)]);
        let exposed = expose(&mut bridge, "api", api);

        let add = prop(&mut bridge, &exposed, "add");
        let result = call_fn(&mut bridge, &add, vec![JsValue::from(2), JsValue::from(40)]).unwrap();
        assert_eq!(result, JsValue::from(42));

        let main = main_realm(&mut bridge);
        assert!(has_prototype(&add, &intrinsic(&main, WellKnownIntrinsics::FunctionPrototype)));
        assert_eq!(prop(&mut bridge, &add, "name"), JsValue::from("add"));
    }

    #[test]
    fn test_function_runs_in_its_own_world() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let world = closure(&realm, "world", |ctx, _this, _args| {
            let id = ctx.current_realm()?.borrow().world_id();
            Ok(JsValue::from(id))
        });
        let world = expose(&mut bridge, "world", world);
        assert_eq!(call_fn(&mut bridge, &world, vec![]).unwrap(), JsValue::from(ISOLATED_WORLD_ID));
    }

    #[test]
    fn test_this_is_the_holding_object() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let seen = Rc::new(RefCell::new(JsValue::Undefined));
        let recorder = {
            let seen = seen.clone();
            closure(&realm, "whoAmI", move |_ctx, this, _args| {
                *seen.borrow_mut() = this;
                Ok(JsValue::Undefined)
            })
        };
        let api = object(&realm, vec![("whoAmI", recorder)]);
        let exposed = expose(&mut bridge, "api", api.clone());

        let bogus_this = object(&main_realm(&mut bridge), vec![]);
        let f = prop(&mut bridge, &exposed, "whoAmI");
        call(bridge.ctx(), &f, bogus_this, vec![]).unwrap();
        assert_eq!(*seen.borrow(), api);
    }

    #[test]
    fn test_shared_function_binds_each_holder() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let seen = Rc::new(RefCell::new(JsValue::Undefined));
        let recorder = {
            let seen = seen.clone();
            closure(&realm, "whoAmI", move |_ctx, this, _args| {
                *seen.borrow_mut() = this;
                Ok(JsValue::Undefined)
            })
        };
        let a = object(&realm, vec![("whoAmI", recorder.clone())]);
        let b = object(&realm, vec![("whoAmI", recorder)]);
        let api = object(&realm, vec![("a", a.clone()), ("b", b.clone())]);
        let exposed = expose(&mut bridge, "api", api);

        let exposed_a = prop(&mut bridge, &exposed, "a");
        let exposed_b = prop(&mut bridge, &exposed, "b");
        call_method(&mut bridge, &exposed_b, "whoAmI", vec![]).unwrap();
        assert_eq!(*seen.borrow(), b);
        call_method(&mut bridge, &exposed_a, "whoAmI", vec![]).unwrap();
        assert_eq!(*seen.borrow(), a);
        assert_ne!(prop(&mut bridge, &exposed_a, "whoAmI"), prop(&mut bridge, &exposed_b, "whoAmI"));
    }

    #[test]
    fn test_results_use_caller_prototypes() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let make = closure(&realm, "make", |ctx, _this, _args| {
            let realm = ctx.current_realm()?;
            let list = realm.borrow().new_array(vec![JsValue::from(1)]);
            let result = realm
                .borrow()
                .new_object_with(vec![("list", JsValue::Object(list))]);
            Ok(JsValue::Object(result))
        });
        let make = expose(&mut bridge, "make", make);
        let result = call_fn(&mut bridge, &make, vec![]).unwrap();

        let main = main_realm(&mut bridge);
        assert!(has_prototype(&result, &intrinsic(&main, WellKnownIntrinsics::ObjectPrototype)));
        let list = prop(&mut bridge, &result, "list");
        assert!(has_prototype(&list, &intrinsic(&main, WellKnownIntrinsics::ArrayPrototype)));
    }

    #[test]
    fn test_callbacks_cross_back() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let invoke = closure(&realm, "invoke", |ctx, _this, args| {
            let callback = first_arg(args);
            let answer = call(ctx, &callback, JsValue::Undefined, vec![JsValue::from(20)])?;
            Ok(JsValue::from(answer.as_f64().unwrap_or(0.0) + 1.0))
        });
        let invoke = expose(&mut bridge, "invoke", invoke);

        let main = main_realm(&mut bridge);
        let double = closure(&main, "double", |_ctx, _this, args| {
            Ok(JsValue::from(first_arg(args).as_f64().unwrap_or(0.0) * 2.0))
        });
        let result = call_fn(&mut bridge, &invoke, vec![double]).unwrap();
        assert_eq!(result, JsValue::from(41));
    }

    #[test]
    fn test_repeated_calls_are_independent() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let counter = Rc::new(RefCell::new(0));
        let next = {
            let counter = counter.clone();
            closure(&realm, "next", move |_ctx, _this, _args| {
                *counter.borrow_mut() += 1;
                Ok(JsValue::from(*counter.borrow() as i64))
            })
        };
        let next = expose(&mut bridge, "next", next);
        for expected in 1..=5 {
            assert_eq!(call_fn(&mut bridge, &next, vec![]).unwrap(), JsValue::from(expected));
        }
    }
}

// ============================================================================
// Identity
// ============================================================================

mod identity_tests {
    use super::*;

    #[test]
    fn test_round_trip_identity() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let identity = closure(&realm, "identity", |_ctx, _this, args| Ok(first_arg(args)));
        let identity = expose(&mut bridge, "identity", identity);

        let main = main_realm(&mut bridge);
        let x = object(&main, vec![("a", JsValue::from(1))]);
        let f = closure(&main, "f", |_ctx, _this, _args| Ok(JsValue::Undefined));
        assert_eq!(call_fn(&mut bridge, &identity, vec![x.clone()]).unwrap(), x);
        assert_eq!(call_fn(&mut bridge, &identity, vec![f.clone()]).unwrap(), f);
    }

    #[test]
    fn test_proxy_passed_back_unwraps() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let original = closure(&realm, "original", |_ctx, _this, _args| Ok(JsValue::Undefined));
        let is_original = {
            let original = original.clone();
            closure(&realm, "isOriginal", move |_ctx, _this, args| {
                Ok(JsValue::from(first_arg(args) == original))
            })
        };
        let api = object(&realm, vec![("original", original), ("isOriginal", is_original)]);
        let exposed = expose(&mut bridge, "api", api);

        let proxy = prop(&mut bridge, &exposed, "original");
        let check = prop(&mut bridge, &exposed, "isOriginal");
        assert_eq!(call_fn(&mut bridge, &check, vec![proxy]).unwrap(), JsValue::from(true));
    }

    #[test]
    fn test_same_source_object_gives_same_proxy() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let state = object(&realm, vec![("n", JsValue::from(1))]);
        let get_state = closure(&realm, "getState", move |_ctx, _this, _args| Ok(state.clone()));
        let get_state = expose(&mut bridge, "getState", get_state);

        let first = call_fn(&mut bridge, &get_state, vec![]).unwrap();
        let second = call_fn(&mut bridge, &get_state, vec![]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_recrossing_reflects_source_changes() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let state = object(&realm, vec![("count", JsValue::from(1))]);
        let get_state = {
            let state = state.clone();
            closure(&realm, "getState", move |_ctx, _this, _args| Ok(state.clone()))
        };
        let get_state = expose(&mut bridge, "getState", get_state);

        let first = call_fn(&mut bridge, &get_state, vec![]).unwrap();
        assert_eq!(prop(&mut bridge, &first, "count"), JsValue::from(1));

        let source = as_object(&state);
        assert!(set(bridge.ctx(), &source, PropertyKey::from("count"), JsValue::from(2), &state).unwrap());
        let second = call_fn(&mut bridge, &get_state, vec![]).unwrap();
        assert_eq!(second, first);
        assert_eq!(prop(&mut bridge, &second, "count"), JsValue::from(2));
    }

    #[test]
    fn test_recrossing_picks_up_added_and_removed_keys() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let state = object(&realm, vec![("a", JsValue::from(1)), ("b", JsValue::from(2))]);
        let get_state = {
            let state = state.clone();
            closure(&realm, "getState", move |_ctx, _this, _args| Ok(state.clone()))
        };
        let get_state = expose(&mut bridge, "getState", get_state);
        let first = call_fn(&mut bridge, &get_state, vec![]).unwrap();

        let source = as_object(&state);
        assert!(create_data_property(&source, PropertyKey::from("c"), JsValue::from(3)));
        delete_property_or_throw(&source, &PropertyKey::from("a")).unwrap();

        let second = call_fn(&mut bridge, &get_state, vec![]).unwrap();
        assert_eq!(second, first);
        assert_eq!(prop(&mut bridge, &second, "a"), JsValue::Undefined);
        assert_eq!(prop(&mut bridge, &second, "b"), JsValue::from(2));
        assert_eq!(prop(&mut bridge, &second, "c"), JsValue::from(3));
    }

    #[test]
    fn test_symbol_round_trip() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let symbol = JsValue::Symbol(SymbolData::new("unique"));
        let get_symbol = {
            let symbol = symbol.clone();
            closure(&realm, "getSymbol", move |_ctx, _this, _args| Ok(symbol.clone()))
        };
        let is_symbol = {
            let symbol = symbol.clone();
            closure(&realm, "isSymbol", move |_ctx, _this, args| {
                Ok(JsValue::from(first_arg(args) == symbol))
            })
        };
        let api = object(&realm, vec![("getSymbol", get_symbol), ("isSymbol", is_symbol)]);
        let exposed = expose(&mut bridge, "api", api);

        let symbol = call_method(&mut bridge, &exposed, "getSymbol", vec![]).unwrap();
        let same = call_method(&mut bridge, &exposed, "isSymbol", vec![symbol]).unwrap();
        assert_eq!(same, JsValue::from(true));
    }
}

// ============================================================================
// Errors
// ============================================================================

mod error_tests {
    use super::*;

    #[test]
    fn test_thrown_error_is_rebuilt() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let fail = closure(&realm, "fail", |ctx, _this, _args| {
            let error = ctx.current_realm()?.borrow().new_error(ErrorKind::TypeError, "boom");
            Err(JErrorType::Exception(JsValue::Object(error)))
        });
        let fail = expose(&mut bridge, "fail", fail);
        match call_fn(&mut bridge, &fail, vec![]) {
            Err(JErrorType::Error(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_engine_error_keeps_message() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let fail = closure(&realm, "fail", |_ctx, _this, _args| {
            Err(JErrorType::RangeError("out of range".to_string()))
        });
        let fail = expose(&mut bridge, "fail", fail);
        let error = call_fn(&mut bridge, &fail, vec![]).unwrap_err();
        assert_eq!(error_message(&error), "out of range");
    }

    #[test]
    fn test_thrown_non_error_gets_default_message() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let fail = closure(&realm, "fail", |_ctx, _this, _args| {
            Err(JErrorType::Exception(JsValue::from("just a string")))
        });
        let fail = expose(&mut bridge, "fail", fail);
        let error = call_fn(&mut bridge, &fail, vec![]).unwrap_err();
        assert_eq!(error_message(&error), UNKNOWN_EXCEPTION_MESSAGE);
    }

    #[test]
    fn test_error_value_materialises_in_caller() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let fail = closure(&realm, "fail", |_ctx, _this, _args| {
            Err(JErrorType::Error("nope".to_string()))
        });
        let fail = expose(&mut bridge, "fail", fail);
        let main = main_realm(&mut bridge);
        let main_id = main.borrow().id();
        let error = call_fn(&mut bridge, &fail, vec![]).unwrap_err();
        let value = bridge
            .ctx()
            .with_realm(main_id, None, |ctx| ctx.error_to_value(error));
        assert!(has_prototype(&value, &intrinsic(&main, WellKnownIntrinsics::ErrorPrototype)));
    }

    #[test]
    fn test_boxed_symbol_argument_fails_call() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let called = Rc::new(RefCell::new(false));
        let sink = {
            let called = called.clone();
            closure(&realm, "sink", move |_ctx, _this, _args| {
                *called.borrow_mut() = true;
                Ok(JsValue::Undefined)
            })
        };
        let sink = expose(&mut bridge, "sink", sink);

        let main = main_realm(&mut bridge);
        let boxed = JsValue::Object(
            main.borrow()
                .new_primitive_wrapper(JsValue::Symbol(SymbolData::new("boxed"))),
        );
        match call_fn(&mut bridge, &sink, vec![boxed]) {
            Err(JErrorType::TypeError(message)) => {
                assert_eq!(message, "An object could not be cloned.")
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
        assert!(!*called.borrow());
    }
}

// ============================================================================
// Recursion bound on arguments
// ============================================================================

mod depth_tests {
    use super::*;

    fn depth_of(value: &JsValue, ctx: &mut context_bridge::runner::ds::execution_context::EvalContext) -> i64 {
        let mut depth = 0;
        let mut current = value.clone();
        loop {
            let next = match &current {
                JsValue::Object(o) => context_bridge::runner::ds::operations::object::get(
                    ctx,
                    o,
                    &0u32.into(),
                )
                .unwrap_or(JsValue::Undefined),
                _ => break,
            };
            if next == JsValue::Undefined {
                break;
            }
            depth += 1;
            current = next;
        }
        depth
    }

    fn expose_measure(bridge: &mut context_bridge::runner::api::ContextBridge) -> JsValue {
        let realm = isolated(bridge);
        let measure = closure(&realm, "measure", |ctx, _this, args| {
            Ok(JsValue::from(depth_of(&first_arg(args), ctx)))
        });
        expose(bridge, "measure", measure)
    }

    #[test]
    fn test_nested_argument_within_limit() {
        let mut bridge = new_bridge();
        let measure = expose_measure(&mut bridge);
        let main = main_realm(&mut bridge);
        let arg = nested_array(&main, 999);
        assert_eq!(call_fn(&mut bridge, &measure, vec![arg]).unwrap(), JsValue::from(999));
    }

    #[test]
    fn test_nested_argument_over_limit() {
        let mut bridge = new_bridge();
        let measure = expose_measure(&mut bridge);
        let main = main_realm(&mut bridge);
        let arg = nested_array(&main, 1000);
        let error = call_fn(&mut bridge, &measure, vec![arg]).unwrap_err();
        assert!(matches!(error, JErrorType::TypeError(_)));
        assert!(error_message(&error).contains("recursion depth exceeded"));
    }
}

// ============================================================================
// Teardown
// ============================================================================

mod teardown_tests {
    use super::*;

    #[test]
    fn test_proxy_of_torn_down_world_fails() {
        let mut bridge = new_bridge();
        let realm = isolated(&mut bridge);
        let ping = closure(&realm, "ping", |_ctx, _this, _args| Ok(JsValue::from("pong")));
        let ping = expose(&mut bridge, "ping", ping);
        assert_eq!(call_fn(&mut bridge, &ping, vec![]).unwrap(), JsValue::from("pong"));

        bridge.frame().tear_down_world(ISOLATED_WORLD_ID).unwrap();
        let error = call_fn(&mut bridge, &ping, vec![]).unwrap_err();
        assert!(error_message(&error).contains("torn down"));
    }
}
