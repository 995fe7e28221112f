use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use uuid::Uuid;

use crate::runner::bridge::identity_store::RealmBridgeState;
use crate::runner::ds::array_object::{CoreArrayObject, ARRAY_LENGTH_PROP};
use crate::runner::ds::error::{ErrorKind, JErrorType};
use crate::runner::ds::error_object::ErrorObject;
use crate::runner::ds::function_object::{BuiltInFn, NativeFn, NativeFunctionObject};
use crate::runner::ds::host_object::{HostNodeRef, HostObject};
use crate::runner::ds::object::{CoreObject, JsObject, JsObjectType, JsObjectWeakType, ObjectType};
use crate::runner::ds::object_property::{PropertyDescriptorSetter, PropertyKey};
use crate::runner::ds::promise_object::PromiseObject;
use crate::runner::ds::regexp_object::RegExpObject;
use crate::runner::ds::typed_array_object::{TypedArrayKind, TypedArrayObject};
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::value::JsValue;
use crate::runner::ds::primitive_object::PrimitiveObject;
use crate::runner::std_lib::install_builtins;

/// Identifies a realm within its agent. Ids are never reused, so a stale id simply stops
/// resolving once its realm is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RealmId(pub u32);
impl Display for RealmId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "realm#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WellKnownIntrinsics {
    Array,
    ArrayPrototype,
    BigIntPrototype,
    Blob,
    BlobPrototype,
    Boolean,
    BooleanPrototype,
    Error,
    ErrorPrototype,
    Function,
    FunctionPrototype,
    HTMLBodyElementPrototype,
    HTMLDivElementPrototype,
    HTMLDocumentPrototype,
    HTMLElementPrototype,
    Number,
    NumberPrototype,
    Object,
    ObjectPrototype,
    Promise,
    PromisePrototype,
    RangeError,
    RangeErrorPrototype,
    ReferenceError,
    ReferenceErrorPrototype,
    RegExp,
    RegExpPrototype,
    String,
    StringPrototype,
    Symbol,
    SymbolPrototype,
    SyntaxError,
    SyntaxErrorPrototype,
    TypeError,
    TypeErrorPrototype,
    TypedArray(TypedArrayKind),
    TypedArrayPrototype(TypedArrayKind),
}
impl WellKnownIntrinsics {
    pub fn error_prototype(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Error => WellKnownIntrinsics::ErrorPrototype,
            ErrorKind::TypeError => WellKnownIntrinsics::TypeErrorPrototype,
            ErrorKind::RangeError => WellKnownIntrinsics::RangeErrorPrototype,
            ErrorKind::ReferenceError => WellKnownIntrinsics::ReferenceErrorPrototype,
            ErrorKind::SyntaxError => WellKnownIntrinsics::SyntaxErrorPrototype,
        }
    }

    /// Prototype for wrappers of host nodes implementing `interface_name`.
    pub fn host_prototype(interface_name: &str) -> Self {
        match interface_name {
            "HTMLDocument" => WellKnownIntrinsics::HTMLDocumentPrototype,
            "HTMLBodyElement" => WellKnownIntrinsics::HTMLBodyElementPrototype,
            "HTMLDivElement" => WellKnownIntrinsics::HTMLDivElementPrototype,
            "Blob" => WellKnownIntrinsics::BlobPrototype,
            _ => WellKnownIntrinsics::HTMLElementPrototype,
        }
    }

    /// Prototype a boxed primitive of this value's type gets.
    pub fn primitive_prototype(primitive: &JsValue) -> Self {
        match primitive {
            JsValue::Boolean(_) => WellKnownIntrinsics::BooleanPrototype,
            JsValue::String(_) => WellKnownIntrinsics::StringPrototype,
            JsValue::Symbol(_) => WellKnownIntrinsics::SymbolPrototype,
            JsValue::Number(_) => WellKnownIntrinsics::NumberPrototype,
            JsValue::BigInt(_) => WellKnownIntrinsics::BigIntPrototype,
            _ => WellKnownIntrinsics::ObjectPrototype,
        }
    }
}

pub type JsCodeRealmType = Rc<RefCell<CodeRealm>>;

pub struct CodeRealm {
    id: RealmId,
    world_id: i32,
    intrinsics: HashMap<WellKnownIntrinsics, JsObjectType>,
    global_this: JsObjectType,
    document: Option<HostNodeRef>,
    host_wrappers: HashMap<Uuid, JsObjectWeakType>,
    pub(crate) bridge: RealmBridgeState,
    torn_down: bool,
}
impl CodeRealm {
    /// Creates a realm with its built-ins installed. `document`, when given, is exposed
    /// as the `document` global.
    pub fn new(
        id: RealmId,
        world_id: i32,
        document: Option<HostNodeRef>,
    ) -> Result<Self, JErrorType> {
        let object_prototype = Rc::new(RefCell::new(ObjectType::Ordinary(Box::new(
            CoreObject::new(id, None),
        ))));
        let global_this = Rc::new(RefCell::new(ObjectType::Ordinary(Box::new(
            CoreObject::new(id, Some(object_prototype.clone())),
        ))));
        let mut intrinsics = HashMap::new();
        intrinsics.insert(WellKnownIntrinsics::ObjectPrototype, object_prototype);
        let mut realm = CodeRealm {
            id,
            world_id,
            intrinsics,
            global_this,
            document,
            host_wrappers: HashMap::new(),
            bridge: RealmBridgeState::new(),
            torn_down: false,
        };
        install_builtins(&mut realm)?;
        Ok(realm)
    }

    pub fn id(&self) -> RealmId {
        self.id
    }

    pub fn world_id(&self) -> i32 {
        self.world_id
    }

    pub fn document(&self) -> Option<&HostNodeRef> {
        self.document.as_ref()
    }

    /// Bookkeeping of everything this realm exchanged over the bridge.
    pub fn bridge_state(&self) -> &RealmBridgeState {
        &self.bridge
    }

    pub fn global_object(&self) -> JsObjectType {
        self.global_this.clone()
    }

    pub fn intrinsic(&self, intrinsic: WellKnownIntrinsics) -> Option<JsObjectType> {
        self.intrinsics.get(&intrinsic).cloned()
    }

    pub fn set_intrinsic(&mut self, intrinsic: WellKnownIntrinsics, value: JsObjectType) {
        self.intrinsics.insert(intrinsic, value);
    }

    fn alloc(object: ObjectType) -> JsObjectType {
        Rc::new(RefCell::new(object))
    }

    pub fn new_object(&self) -> JsObjectType {
        CodeRealm::alloc(ObjectType::Ordinary(Box::new(CoreObject::new(
            self.id,
            self.intrinsic(WellKnownIntrinsics::ObjectPrototype),
        ))))
    }

    /// A plain object with the given enumerable, writable, configurable data properties.
    pub fn new_object_with<K: Into<PropertyKey>>(
        &self,
        entries: impl IntoIterator<Item = (K, JsValue)>,
    ) -> JsObjectType {
        let o = self.new_object();
        {
            let mut ob = (*o).borrow_mut();
            for (k, v) in entries {
                ob.as_js_object_mut()
                    .define_own_property(k.into(), PropertyDescriptorSetter::data(v, true, true, true));
            }
        }
        o
    }

    pub fn new_array(&self, items: Vec<JsValue>) -> JsObjectType {
        let mut array = CoreArrayObject::new(
            self.id,
            self.intrinsic(WellKnownIntrinsics::ArrayPrototype),
        );
        for (idx, item) in items.into_iter().enumerate() {
            array.define_own_property(
                PropertyKey::Int(idx as u32),
                PropertyDescriptorSetter::data(item, true, true, true),
            );
        }
        CodeRealm::alloc(ObjectType::Array(Box::new(array)))
    }

    /// An empty array whose `length` is preset, leaving holes for the elements.
    pub fn new_array_with_length(&self, length: u32) -> JsObjectType {
        let mut array = CoreArrayObject::new(
            self.id,
            self.intrinsic(WellKnownIntrinsics::ArrayPrototype),
        );
        array.define_own_property(
            ARRAY_LENGTH_PROP.clone(),
            PropertyDescriptorSetter::value_only(JsValue::from(length as i64)),
        );
        CodeRealm::alloc(ObjectType::Array(Box::new(array)))
    }

    pub fn new_function(&self, name: &str, behavior: BuiltInFn) -> JsObjectType {
        CodeRealm::alloc(ObjectType::Function(Box::new(NativeFunctionObject::new(
            self.id,
            self.intrinsic(WellKnownIntrinsics::FunctionPrototype),
            name,
            behavior,
        ))))
    }

    pub fn new_native_function(&self, name: &str, f: NativeFn) -> JsObjectType {
        self.new_function(name, BuiltInFn::Native(f))
    }

    pub fn new_closure_function<F>(&self, name: &str, f: F) -> JsObjectType
    where
        F: Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType> + 'static,
    {
        self.new_function(name, BuiltInFn::Closure(Rc::new(f)))
    }

    pub fn new_error(&self, kind: ErrorKind, message: &str) -> JsObjectType {
        let mut error = ErrorObject::new(
            self.id,
            self.intrinsic(WellKnownIntrinsics::error_prototype(kind)),
            kind,
        );
        error.define_own_property(
            PropertyKey::Str("message".to_string()),
            PropertyDescriptorSetter::data(JsValue::from(message), true, false, true),
        );
        CodeRealm::alloc(ObjectType::Error(error))
    }

    pub fn new_promise(&self) -> JsObjectType {
        CodeRealm::alloc(ObjectType::Promise(PromiseObject::new(
            self.id,
            self.intrinsic(WellKnownIntrinsics::PromisePrototype),
        )))
    }

    pub fn new_typed_array(&self, kind: TypedArrayKind, bytes: &[u8]) -> JsObjectType {
        CodeRealm::alloc(ObjectType::TypedArray(TypedArrayObject::from_bytes(
            self.id,
            self.intrinsic(WellKnownIntrinsics::TypedArrayPrototype(kind)),
            kind,
            bytes,
        )))
    }

    pub fn new_regexp(&self, source: &str, flags: &str) -> JsObjectType {
        CodeRealm::alloc(ObjectType::RegExp(RegExpObject::new(
            self.id,
            self.intrinsic(WellKnownIntrinsics::RegExpPrototype),
            source,
            flags,
        )))
    }

    /// `Object(primitive)`.
    pub fn new_primitive_wrapper(&self, primitive: JsValue) -> JsObjectType {
        let prototype = self.intrinsic(WellKnownIntrinsics::primitive_prototype(&primitive));
        CodeRealm::alloc(ObjectType::PrimitiveWrapper(PrimitiveObject::new(
            self.id, prototype, primitive,
        )))
    }

    /// This realm's wrapper for `node`. The same node always yields the same wrapper while
    /// that wrapper is alive.
    pub fn wrap_host_node(&mut self, node: &HostNodeRef) -> JsObjectType {
        let node_id = node.borrow().id();
        if let Some(existing) = self.host_wrappers.get(&node_id).and_then(|w| w.upgrade()) {
            return existing;
        }
        let interface = node.borrow().interface_name();
        let wrapper = CodeRealm::alloc(ObjectType::Host(HostObject::new(
            self.id,
            self.intrinsic(WellKnownIntrinsics::host_prototype(interface)),
            node.clone(),
        )));
        self.host_wrappers.retain(|_, w| w.strong_count() > 0);
        self.host_wrappers.insert(node_id, Rc::downgrade(&wrapper));
        wrapper
    }

    /// Drops everything the realm holds. Intrinsics and the global object refer to each
    /// other, so their properties are cleared to let the `Rc`s go.
    pub fn tear_down(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        let mut objects: Vec<JsObjectType> = self.intrinsics.drain().map(|(_, o)| o).collect();
        objects.push(self.global_this.clone());
        for o in objects {
            if let Ok(mut o) = o.try_borrow_mut() {
                o.as_js_object_mut().get_object_base_mut().clear();
            }
        }
        self.host_wrappers.clear();
        self.document = None;
        self.bridge.clear();
    }
}
