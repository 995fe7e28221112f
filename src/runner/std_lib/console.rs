//! Console built-in object.
//!
//! console.log and friends write through `tracing` under the `console` target, tagged with
//! the realm they were called from.

use tracing::{debug, error, info, warn};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::realm::CodeRealm;
use crate::runner::ds::value::JsValue;
use crate::runner::ds::operations::type_conversion::display_string;
use crate::runner::std_lib::builtin::BuiltInObject;

/// Install the console namespace.
pub fn install(realm: &mut CodeRealm) -> Result<(), JErrorType> {
    BuiltInObject::new("console")
        .as_namespace()
        .add_static_method("log", console_log)
        .add_static_method("info", console_info)
        .add_static_method("warn", console_warn)
        .add_static_method("error", console_error)
        .add_static_method("debug", console_debug)
        .install(realm)?;
    Ok(())
}

/// Format all arguments for console output.
fn format_args(args: &[JsValue]) -> String {
    args.iter()
        .map(display_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn realm_label(ctx: &EvalContext) -> String {
    ctx.current_realm_id()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// console.log
fn console_log(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    info!(target: "console", realm = %realm_label(ctx), "{}", format_args(&args));
    Ok(JsValue::Undefined)
}

/// console.info
fn console_info(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    info!(target: "console", realm = %realm_label(ctx), "{}", format_args(&args));
    Ok(JsValue::Undefined)
}

/// console.warn
fn console_warn(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    warn!(target: "console", realm = %realm_label(ctx), "{}", format_args(&args));
    Ok(JsValue::Undefined)
}

/// console.error
fn console_error(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    error!(target: "console", realm = %realm_label(ctx), "{}", format_args(&args));
    Ok(JsValue::Undefined)
}

/// console.debug
fn console_debug(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    debug!(target: "console", realm = %realm_label(ctx), "{}", format_args(&args));
    Ok(JsValue::Undefined)
}
