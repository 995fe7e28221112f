//! Replacing values and accessors at a key path under the main world's global.
//!
//! These are the internal variants of exposure used by the preload machinery itself: they
//! write through whatever is already there, and nothing is frozen.

use tracing::info;

use crate::parser::KeyPath;
use crate::runner::bridge::config::BridgeConfig;
use crate::runner::bridge::converter::{live_realm, pass_value, Crossing};
use crate::runner::bridge::error::BridgeError;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{PropertyDescriptorSetter, PropertyKey};
use crate::runner::ds::operations::object::{define_property_or_throw, get, put};
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::value::JsValue;

/// Walks every segment of `path` but the last, starting at `root`, and returns the object
/// that owns the final property.
pub fn trace_key_path(
    ctx: &mut EvalContext,
    root: &JsObjectType,
    path: &KeyPath,
) -> Result<JsObjectType, BridgeError> {
    if path.is_empty() {
        return Err(BridgeError::invalid_key_path(path, "the path is empty"));
    }
    let mut current = root.clone();
    for segment in path.parent() {
        current = match get(ctx, &current, &PropertyKey::from(segment.as_str()))? {
            JsValue::Object(o) => o,
            JsValue::Undefined => {
                return Err(BridgeError::invalid_key_path(
                    path,
                    format!("'{}' does not exist", segment),
                ))
            }
            _ => {
                return Err(BridgeError::invalid_key_path(
                    path,
                    format!("'{}' is not an object", segment),
                ))
            }
        };
    }
    Ok(current)
}

struct Target {
    parent: JsObjectType,
    key: PropertyKey,
    receiver: JsValue,
    crossing: Crossing,
}

fn resolve_target(
    ctx: &mut EvalContext,
    source: RealmId,
    target: RealmId,
    path: &KeyPath,
    config: &BridgeConfig,
) -> Result<Target, BridgeError> {
    let global = live_realm(ctx, target)?.borrow().global_object();
    let receiver = JsValue::Object(live_realm(ctx, source)?.borrow().global_object());
    let parent = trace_key_path(ctx, &global, path)?;
    let key = match path.last() {
        Some(last) => PropertyKey::from(last),
        None => return Err(BridgeError::invalid_key_path(path, "the path is empty")),
    };
    Ok(Target {
        parent,
        key,
        receiver,
        crossing: Crossing::new(source, target, config.convert_options()),
    })
}

fn assign(
    ctx: &mut EvalContext,
    target: Target,
    value: &JsValue,
    crossing: Crossing,
) -> Result<(), BridgeError> {
    let converted = pass_value(ctx, crossing, value, &target.receiver)?;
    put(ctx, &target.parent, target.key, converted)?;
    Ok(())
}

/// Assigns the bridged `value` at `path` on the global of `target`.
pub fn override_global_value(
    ctx: &mut EvalContext,
    source: RealmId,
    target: RealmId,
    path: &KeyPath,
    value: &JsValue,
    config: &BridgeConfig,
) -> Result<(), BridgeError> {
    let resolved = resolve_target(ctx, source, target, path, config)?;
    let crossing = resolved.crossing;
    assign(ctx, resolved, value, crossing)?;
    info!(source = %source, target = %target, path = %path, "overrode global value");
    Ok(())
}

/// Like [`override_global_value`], but accessors of `value` stay live: reads and writes
/// through the bridged copy reach the source getters and setters.
pub fn override_global_value_with_dynamic_props(
    ctx: &mut EvalContext,
    source: RealmId,
    target: RealmId,
    path: &KeyPath,
    value: &JsValue,
    config: &BridgeConfig,
) -> Result<(), BridgeError> {
    let resolved = resolve_target(ctx, source, target, path, config)?;
    let crossing = resolved.crossing.with_dynamic_props(true);
    assign(ctx, resolved, value, crossing)?;
    info!(
        source = %source,
        target = %target,
        path = %path,
        "overrode global value with dynamic properties"
    );
    Ok(())
}

/// Defines an accessor at `path` whose getter and setter forward to functions of `source`.
/// The setter is installed only when `setter` is an object.
pub fn override_global_property(
    ctx: &mut EvalContext,
    source: RealmId,
    target: RealmId,
    path: &KeyPath,
    getter: &JsValue,
    setter: Option<&JsValue>,
    config: &BridgeConfig,
) -> Result<(), BridgeError> {
    if !getter.is_callable() {
        return Err(JErrorType::TypeError("The getter must be a function".to_string()).into());
    }
    let resolved = resolve_target(ctx, source, target, path, config)?;
    let getter_proxy = pass_value(ctx, resolved.crossing, getter, &resolved.receiver)?;
    let setter_proxy = match setter {
        Some(setter @ JsValue::Object(_)) => {
            Some(pass_value(ctx, resolved.crossing, setter, &resolved.receiver)?)
        }
        _ => None,
    };
    define_property_or_throw(
        &resolved.parent,
        resolved.key,
        PropertyDescriptorSetter::accessor_only(
            getter_proxy.as_object().cloned(),
            setter_proxy.as_ref().and_then(|s| s.as_object().cloned()),
        ),
    )?;
    info!(
        source = %source,
        target = %target,
        path = %path,
        has_setter = setter_proxy.is_some(),
        "overrode global property"
    );
    Ok(())
}
