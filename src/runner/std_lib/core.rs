//! Core built-ins installation.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{CoreObject, ObjectType};
use crate::runner::ds::realm::{CodeRealm, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::builtin::define_method;
use std::cell::RefCell;
use std::rc::Rc;

use super::array;
use super::console;
use super::dom;
use super::error;
use super::object;
use super::primitive;
use super::promise;
use super::regexp;
use super::typed_array;

/// Install every built-in into a freshly created realm.
pub fn install_builtins(realm: &mut CodeRealm) -> Result<(), JErrorType> {
    // Function.prototype must exist before the first function is created.
    let function_prototype = Rc::new(RefCell::new(ObjectType::Ordinary(Box::new(
        CoreObject::new(
            realm.id(),
            realm.intrinsic(WellKnownIntrinsics::ObjectPrototype),
        ),
    ))));
    realm.set_intrinsic(WellKnownIntrinsics::FunctionPrototype, function_prototype);

    object::install(realm)?;
    array::install(realm)?;
    error::install(realm)?;
    promise::install(realm)?;
    primitive::install(realm)?;
    regexp::install(realm)?;
    typed_array::install(realm)?;
    dom::install(realm)?;
    console::install(realm)?;

    let global = realm.global_object();
    define_method(&global, "window", JsValue::Object(global.clone()))?;
    Ok(())
}
