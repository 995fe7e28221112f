//! # context-bridge - Electron's `contextBridge` on a Rust realm model
//!
//! A preload script runs in a privileged *isolated world* and hands a narrow API to the page,
//! which runs in the *main world*. Both worlds are realms with their own globals and built-ins.
//! The bridge moves values between them:
//!
//! - primitives are copied, symbols keep their identity
//! - functions and promises become live proxies whose calls and settlements cross back
//! - plain objects and arrays are copied structurally, cycles included
//! - errors, typed arrays, regexps and boxed primitives are rebuilt from the destination's
//!   own built-ins, DOM nodes and Blobs are rewrapped
//!
//! Exposed APIs are frozen unless mutability is enabled, and the same object always crosses
//! as the same counterpart.
//!
//! ## Quick Start
//!
//! ```
//! use context_bridge::runner::api::ContextBridge;
//! use context_bridge::runner::bridge::{BridgeConfig, ISOLATED_WORLD_ID, MAIN_WORLD_ID};
//! use context_bridge::runner::ds::operations::object::get;
//! use context_bridge::runner::ds::value::JsValue;
//!
//! let mut bridge = ContextBridge::new(BridgeConfig::default()).unwrap();
//! let api = bridge
//!     .realm(ISOLATED_WORLD_ID)
//!     .unwrap()
//!     .borrow()
//!     .new_object_with(vec![("version", JsValue::from("1.0"))]);
//! bridge.expose_in_main_world("electron", &JsValue::Object(api)).unwrap();
//!
//! let global = bridge.realm(MAIN_WORLD_ID).unwrap().borrow().global_object();
//! let exposed = get(bridge.ctx(), &global, &"electron".into()).unwrap();
//! let exposed = exposed.as_object().unwrap().clone();
//! let version = get(bridge.ctx(), &exposed, &"version".into()).unwrap();
//! assert_eq!(version, JsValue::from("1.0"));
//! ```
//!
//! ## Architecture
//!
//! - **[`parser`]** - key paths (`document.foo`, `a['b'][0]`) for the override operations
//! - **[`runner`]**
//!   - **[`runner::ds`]** - values, objects, realms and the agent with its job queue
//!   - **[`runner::std_lib`]** - the built-ins every realm gets
//!   - **[`runner::bridge`]** - conversion, proxies, identity stores and worlds
//!   - **[`runner::api`]** - the `contextBridge` surface

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;
