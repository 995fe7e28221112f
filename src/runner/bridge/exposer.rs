//! Binding an API object onto another world's global.

use tracing::info;

use crate::runner::bridge::config::BridgeConfig;
use crate::runner::bridge::converter::{live_realm, pass_value, Crossing};
use crate::runner::bridge::error::BridgeError;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object_property::{PropertyDescriptorSetter, PropertyKey};
use crate::runner::ds::operations::object::{define_property_or_throw, has_property, put};
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::value::JsValue;

/// Bridges `api` from `source` and binds it as `name` on the global of `target`.
///
/// The name must not exist on the target global, nor have been exposed before. Unless
/// mutability is enabled the binding is read-only and non-configurable, and every object the
/// conversion builds is frozen. Page objects that were unwrapped along the way are not.
pub fn expose_api(
    ctx: &mut EvalContext,
    source: RealmId,
    target: RealmId,
    name: &str,
    api: &JsValue,
    config: &BridgeConfig,
) -> Result<(), BridgeError> {
    let source_realm = live_realm(ctx, source)?;
    let target_realm = live_realm(ctx, target)?;
    let global = target_realm.borrow().global_object();
    let key = PropertyKey::from(name);
    if has_property(&global, &key) || target_realm.borrow().bridge.is_exposed(name) {
        return Err(BridgeError::NameCollision(name.to_string()));
    }

    let receiver = JsValue::Object(source_realm.borrow().global_object());
    let crossing = Crossing::new(source, target, config.convert_options())
        .with_freeze(!config.mutability);
    let value = pass_value(ctx, crossing, api, &receiver)?;

    if config.mutability {
        put(ctx, &global, key, value)?;
    } else {
        define_property_or_throw(
            &global,
            key,
            PropertyDescriptorSetter::data(value, false, true, false),
        )?;
    }
    target_realm.borrow_mut().bridge.mark_exposed(name);
    info!(
        source = %source,
        target = %target,
        name,
        mutable = config.mutability,
        "exposed API"
    );
    Ok(())
}
