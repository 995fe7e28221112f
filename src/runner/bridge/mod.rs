//! The context bridge: moving values between worlds of a frame.
//!
//! [`converter`] decides how each value crosses. Functions and promises get live proxies
//! ([`function_proxy`], [`promise_proxy`]), plain objects and arrays get structural proxies
//! reading through to their source, and native values are rebuilt. Every crossing is recorded
//! in the [`identity_store`] of both realms so the same object always maps to the same proxy
//! and a proxy sent back home unwraps to its original.

pub mod bridged_value;
pub mod config;
pub mod converter;
pub mod error;
pub mod execute_in_world;
pub mod exposer;
pub mod freeze;
pub mod function_proxy;
pub mod identity_store;
pub mod override_installer;
pub mod promise_proxy;
pub mod weak_tracker;
pub mod world;

pub use bridged_value::{BridgedValue, PassthroughKind};
pub use config::BridgeConfig;
pub use converter::{convert, pass_value, ConvertOptions, Crossing};
pub use error::BridgeError;
pub use execute_in_world::ExecutionScript;
pub use world::{Frame, ISOLATED_WORLD_ID, MAIN_WORLD_ID};
