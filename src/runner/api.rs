//! The embedder facing `contextBridge` API.
//!
//! A [`ContextBridge`] owns a [`Frame`] and acts on behalf of the preload script, which runs
//! in the isolated world. Values are exposed from there into the main world or into other
//! isolated worlds.

use tracing::info;

use crate::parser::KeyPath;
use crate::runner::bridge::config::BridgeConfig;
use crate::runner::bridge::error::BridgeError;
use crate::runner::bridge::execute_in_world::{execute_in_world, ExecutionScript};
use crate::runner::bridge::exposer::expose_api;
use crate::runner::bridge::override_installer::{
    override_global_property, override_global_value, override_global_value_with_dynamic_props,
};
use crate::runner::bridge::weak_tracker::WeakTracker;
use crate::runner::bridge::world::{Frame, ISOLATED_WORLD_ID, MAIN_WORLD_ID};
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::realm::{JsCodeRealmType, RealmId};
use crate::runner::ds::value::JsValue;

/// Anything naming a nested property of a global: a dotted string such as `"document.foo"`,
/// a parsed [`KeyPath`] or a list of segments.
pub trait IntoKeyPath {
    fn into_key_path(self) -> Result<KeyPath, BridgeError>;
}
impl IntoKeyPath for KeyPath {
    fn into_key_path(self) -> Result<KeyPath, BridgeError> {
        Ok(self)
    }
}
impl IntoKeyPath for &str {
    fn into_key_path(self) -> Result<KeyPath, BridgeError> {
        KeyPath::parse(self).map_err(|reason| BridgeError::invalid_key_path(self, reason))
    }
}
impl IntoKeyPath for Vec<String> {
    fn into_key_path(self) -> Result<KeyPath, BridgeError> {
        Ok(KeyPath::from(self))
    }
}
impl<const N: usize> IntoKeyPath for [&str; N] {
    fn into_key_path(self) -> Result<KeyPath, BridgeError> {
        Ok(KeyPath::from(self))
    }
}

pub struct ContextBridge {
    frame: Frame,
    config: BridgeConfig,
    weak_tracker: WeakTracker,
}
impl ContextBridge {
    pub fn new(config: BridgeConfig) -> Result<Self, BridgeError> {
        info!(
            mutability = config.mutability,
            sandboxed = config.sandboxed,
            max_recursion_depth = config.max_recursion_depth,
            "starting context bridge"
        );
        Ok(ContextBridge {
            frame: Frame::new()?,
            weak_tracker: WeakTracker::new(config.sandboxed),
            config,
        })
    }

    /// A bridge with the default configuration plus the features enabled through
    /// `CONTEXT_BRIDGE_ENABLE_FEATURES`.
    pub fn from_env() -> Result<Self, BridgeError> {
        ContextBridge::new(BridgeConfig::from_env())
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn frame(&mut self) -> &mut Frame {
        &mut self.frame
    }

    pub fn ctx(&mut self) -> &mut EvalContext {
        self.frame.ctx()
    }

    pub fn main_world(&self) -> Result<RealmId, BridgeError> {
        self.frame.main_world()
    }

    /// The preload world, created on first use.
    pub fn isolated_world(&mut self) -> Result<RealmId, BridgeError> {
        self.frame.create_isolated_world(ISOLATED_WORLD_ID)
    }

    /// The realm of `world_id`. Worlds other than the main one are created on first use.
    pub fn world(&mut self, world_id: i32) -> Result<RealmId, BridgeError> {
        if world_id == MAIN_WORLD_ID {
            self.frame.main_world()
        } else {
            self.frame.create_isolated_world(world_id)
        }
    }

    pub fn realm(&mut self, world_id: i32) -> Result<JsCodeRealmType, BridgeError> {
        self.world(world_id)?;
        self.frame.realm(world_id)
    }

    /// `contextBridge.exposeInMainWorld(name, api)`.
    pub fn expose_in_main_world(&mut self, name: &str, api: &JsValue) -> Result<(), BridgeError> {
        self.expose_in_isolated_world(MAIN_WORLD_ID, name, api)
    }

    /// `contextBridge.exposeInIsolatedWorld(worldId, name, api)`.
    pub fn expose_in_isolated_world(
        &mut self,
        world_id: i32,
        name: &str,
        api: &JsValue,
    ) -> Result<(), BridgeError> {
        let source = self.isolated_world()?;
        let target = self.world(world_id)?;
        let config = self.config.clone();
        expose_api(self.ctx(), source, target, name, api, &config)
    }

    /// `contextBridge.executeInMainWorld({ func, args })` generalised to any world. `script`
    /// is an object of the preload world.
    pub fn execute_in_world(&mut self, world_id: i32, script: &JsValue) -> Result<JsValue, BridgeError> {
        let caller = self.isolated_world()?;
        let script = self
            .ctx()
            .with_realm(caller, None, |ctx| ExecutionScript::from_value(ctx, script))?;
        self.execute_script_in_world(world_id, &script)
    }

    pub fn execute_script_in_world(
        &mut self,
        world_id: i32,
        script: &ExecutionScript,
    ) -> Result<JsValue, BridgeError> {
        let caller = self.isolated_world()?;
        let target = self.world(world_id)?;
        let options = self.config.convert_options();
        execute_in_world(self.ctx(), caller, target, script, options)
    }

    /// Operations reserved for the preload machinery itself.
    pub fn internal(&mut self) -> InternalContextBridge<'_> {
        InternalContextBridge { bridge: self }
    }

    /// Starts watching whether `value` stays alive.
    pub fn track_weak_value(&mut self, value: &JsValue) -> Result<(), BridgeError> {
        self.weak_tracker.track(value)
    }

    pub fn weakly_tracked_values(&self) -> Result<Vec<JsObjectType>, BridgeError> {
        self.weak_tracker.live_values()
    }

    pub fn weakly_tracked_count(&self) -> Result<usize, BridgeError> {
        self.weak_tracker.live_count()
    }

    /// Prunes bookkeeping of reclaimed values. Returns how many identity store entries went.
    pub fn collect_garbage(&mut self) -> usize {
        self.weak_tracker.prune();
        self.frame.collect_garbage()
    }

    /// Navigates the frame again: every world is torn down and the main world recreated.
    /// The isolated world comes back on first use.
    pub fn reload(&mut self) -> Result<RealmId, BridgeError> {
        self.frame.reload()
    }

    pub fn run_microtasks(&mut self) -> usize {
        self.frame.run_microtasks()
    }
}

/// `contextBridge.internalContextBridge`. Paths are resolved on the main world's global and
/// values come from the preload world.
pub struct InternalContextBridge<'a> {
    bridge: &'a mut ContextBridge,
}
impl<'a> InternalContextBridge<'a> {
    fn worlds(&mut self) -> Result<(RealmId, RealmId), BridgeError> {
        Ok((self.bridge.isolated_world()?, self.bridge.main_world()?))
    }

    pub fn override_global_value_from_isolated_world(
        &mut self,
        path: impl IntoKeyPath,
        value: &JsValue,
    ) -> Result<(), BridgeError> {
        let path = path.into_key_path()?;
        let (source, target) = self.worlds()?;
        let config = self.bridge.config.clone();
        override_global_value(self.bridge.ctx(), source, target, &path, value, &config)
    }

    pub fn override_global_property_from_isolated_world(
        &mut self,
        path: impl IntoKeyPath,
        getter: &JsValue,
        setter: Option<&JsValue>,
    ) -> Result<(), BridgeError> {
        let path = path.into_key_path()?;
        let (source, target) = self.worlds()?;
        let config = self.bridge.config.clone();
        override_global_property(self.bridge.ctx(), source, target, &path, getter, setter, &config)
    }

    pub fn override_global_value_with_dynamic_props_from_isolated_world(
        &mut self,
        path: impl IntoKeyPath,
        value: &JsValue,
    ) -> Result<(), BridgeError> {
        let path = path.into_key_path()?;
        let (source, target) = self.worlds()?;
        let config = self.bridge.config.clone();
        override_global_value_with_dynamic_props(
            self.bridge.ctx(),
            source,
            target,
            &path,
            value,
            &config,
        )
    }
}
