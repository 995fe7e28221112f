use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object::{JsObject, JsObjectType, ObjectBase};
use crate::runner::ds::object_property::{PropertyDescriptorSetter, PropertyKey};
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::value::JsValue;

/// Function signature for built-in methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn =
    fn(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType>;

/// Function behaviour that captures state, e.g. promise resolving functions or
/// script callbacks written in Rust.
pub type ClosureFn = Rc<dyn Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType>>;

/// What happens when a function object is called.
#[derive(Clone)]
pub enum BuiltInFn {
    /// Direct function pointer. Carries no state, so it can be re-instantiated in any realm.
    Native(NativeFn),

    /// Stateful behaviour.
    Closure(ClosureFn),
}
impl BuiltInFn {
    pub fn call(
        &self,
        ctx: &mut EvalContext,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        match self {
            BuiltInFn::Native(f) => f(ctx, this, args),
            BuiltInFn::Closure(f) => f(ctx, this, args),
        }
    }
}

pub trait JsFunctionObject: JsObject {
    fn name(&self) -> &str;

    fn behavior(&self) -> BuiltInFn;
}

pub struct NativeFunctionObject {
    base: ObjectBase,
    name: String,
    behavior: BuiltInFn,
}
impl NativeFunctionObject {
    pub fn new(
        realm: RealmId,
        prototype: Option<JsObjectType>,
        name: impl Into<String>,
        behavior: BuiltInFn,
    ) -> Self {
        let name = name.into();
        let mut f = NativeFunctionObject {
            base: ObjectBase::new(realm, prototype),
            name: name.to_string(),
            behavior,
        };
        f.define_own_property(
            PropertyKey::Str("name".to_string()),
            PropertyDescriptorSetter::data(JsValue::String(name), false, false, true),
        );
        f
    }
}
impl JsObject for NativeFunctionObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn as_super_trait(&self) -> &dyn JsObject {
        self
    }

    fn as_super_trait_mut(&mut self) -> &mut dyn JsObject {
        self
    }

    fn class_name(&self) -> &'static str {
        "Function"
    }

    fn to_string(&self) -> String {
        format!("function {}() {{ [native code] }}", self.name)
    }
}
impl JsFunctionObject for NativeFunctionObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn behavior(&self) -> BuiltInFn {
        self.behavior.clone()
    }
}
