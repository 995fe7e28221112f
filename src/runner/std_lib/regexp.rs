//! RegExp built-in.
//!
//! Patterns are kept as source text; `test` matches the source as a literal substring.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::realm::{CodeRealm, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::builtin::{argument, BuiltInObject};

/// Install the RegExp built-in.
pub fn install(realm: &mut CodeRealm) -> Result<(), JErrorType> {
    BuiltInObject::new("RegExp")
        .with_prototype(WellKnownIntrinsics::RegExpPrototype)
        .with_constructor(WellKnownIntrinsics::RegExp, regexp_constructor)
        .add_getter("source", regexp_source)
        .add_getter("flags", regexp_flags)
        .add_getter("global", regexp_global)
        .add_method("test", regexp_test)
        .add_method("toString", regexp_to_string)
        .install(realm)?;
    Ok(())
}

/// Source and flags of `this`, which must be a RegExp.
fn this_regexp(this: &JsValue) -> Result<(String, String), JErrorType> {
    if let JsValue::Object(o) = this {
        if let ObjectType::RegExp(r) = &*(**o).borrow() {
            return Ok((r.source().to_string(), r.flags().to_string()));
        }
    }
    Err(JErrorType::TypeError("receiver is not a RegExp".to_string()))
}

/// RegExp(pattern, flags)
fn regexp_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let source = match argument(&args, 0) {
        JsValue::Undefined => "(?:)".to_string(),
        pattern => match this_regexp(&pattern) {
            Ok((source, _)) => source,
            Err(_) => to_string(ctx, &pattern)?,
        },
    };
    let flags = match argument(&args, 1) {
        JsValue::Undefined => String::new(),
        f => to_string(ctx, &f)?,
    };
    if let Some(bad) = flags.chars().find(|c| !"dgimsuy".contains(*c)) {
        return Err(JErrorType::SyntaxError(format!(
            "Invalid regular expression flags '{}'",
            bad
        )));
    }
    Ok(JsValue::Object(
        ctx.current_realm()?.borrow().new_regexp(&source, &flags),
    ))
}

/// get RegExp.prototype.source
fn regexp_source(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_regexp(&this)?.0))
}

/// get RegExp.prototype.flags
fn regexp_flags(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_regexp(&this)?.1))
}

/// get RegExp.prototype.global
fn regexp_global(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(this_regexp(&this)?.1.contains('g')))
}

/// RegExp.prototype.test
fn regexp_test(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (source, flags) = this_regexp(&this)?;
    let input = to_string(ctx, &argument(&args, 0))?;
    let found = if flags.contains('i') {
        input.to_lowercase().contains(&source.to_lowercase())
    } else {
        input.contains(&source)
    };
    Ok(JsValue::Boolean(found))
}

/// RegExp.prototype.toString
fn regexp_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (source, flags) = this_regexp(&this)?;
    Ok(JsValue::String(format!("/{}/{}", source, flags)))
}
