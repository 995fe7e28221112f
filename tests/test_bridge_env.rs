//! Tests for configuration coming from the environment.
//!
//! The feature list is read once per process, so this binary holds a single test.

extern crate context_bridge;


use bridge_util::*;
use context_bridge::runner::api::ContextBridge;
use context_bridge::runner::bridge::config::{FEATURES_ENV_VAR, MUTABILITY_FEATURE};
use context_bridge::runner::ds::object_property::PropertyKey;
use context_bridge::runner::ds::operations::object::set;
use context_bridge::runner::ds::value::JsValue;

// ============================================================================
// Feature flags
// ============================================================================

mod feature_tests {
    use super::*;

    #[test]
    fn test_mutability_feature_from_env() {
        std::env::set_var(FEATURES_ENV_VAR, format!("Unrelated, {}", MUTABILITY_FEATURE));
        init_logging();
        let mut bridge = ContextBridge::from_env().unwrap();
        assert!(bridge.config().mutability);

        let realm = isolated(&mut bridge);
        let api = object(&realm, vec![("n", JsValue::from(1))]);
        let exposed = expose(&mut bridge, "api", api.clone());
        let target = as_object(&exposed);
        assert!(set(bridge.ctx(), &target, PropertyKey::from("n"), JsValue::from(2), &exposed).unwrap());
        assert_eq!(prop(&mut bridge, &api, "n"), JsValue::from(2));
    }
}
