//! Moves values from one realm into another.
//!
//! Primitives are copied, functions and promises are proxied, a few native kinds are rebuilt
//! from their contents, and plain objects and arrays get structural proxies. A structural
//! proxy mirrors each own enumerable property of its source with an accessor that converts
//! the current source value on every read and, unless the crossing freezes, writes assignments
//! back to the source. Keys added to or removed from the source are picked up the next time
//! the source crosses.
//!
//! The first values of a new proxy are converted up front off an explicit work stack, which
//! keeps depth failures at crossing time. A proxy is registered in the identity stores before
//! its properties are visited, so a property pointing back at an ancestor resolves to the
//! proxy that is still being built.
//!
//! A failed conversion unregisters every crossing it recorded.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::runner::bridge::bridged_value::{BridgedValue, PassthroughKind};
use crate::runner::bridge::config::DEFAULT_MAX_RECURSION_DEPTH;
use crate::runner::bridge::error::BridgeError;
use crate::runner::bridge::freeze::freeze_created;
use crate::runner::bridge::function_proxy::create_function_proxy;
use crate::runner::bridge::identity_store::{ObjectProxyHandle, ProxyFlavour, ProxyKey};
use crate::runner::bridge::promise_proxy::create_promise_proxy;
use crate::runner::ds::array_object::JsArrayObject;
use crate::runner::ds::error::{ErrorKind, JErrorType};
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::object_property::{
    PropertyDescriptor, PropertyDescriptorAccessor, PropertyDescriptorSetter, PropertyKey,
};
use crate::runner::ds::operations::object::{
    create_data_property, define_property_or_throw, delete_property_or_throw, get,
    get_own_property, own_enumerable_keys, put,
};
use crate::runner::ds::operations::type_conversion::display_string;
use crate::runner::ds::realm::{JsCodeRealmType, RealmId};
use crate::runner::ds::value::JsValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvertOptions {
    pub max_depth: usize,

    /// Accessors are bridged as live getter/setter proxies instead of being read once.
    pub dynamic_props: bool,

    /// Everything the conversion creates is frozen and structural proxies refuse writes.
    pub freeze: bool,
}
impl ConvertOptions {
    pub fn flavour(&self) -> ProxyFlavour {
        ProxyFlavour {
            frozen: self.freeze,
            dynamic_props: self.dynamic_props,
        }
    }
}
impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            max_depth: DEFAULT_MAX_RECURSION_DEPTH,
            dynamic_props: false,
            freeze: false,
        }
    }
}

/// Direction of a conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crossing {
    pub source: RealmId,
    pub destination: RealmId,
    pub options: ConvertOptions,
}
impl Crossing {
    pub fn new(source: RealmId, destination: RealmId, options: ConvertOptions) -> Self {
        Crossing {
            source,
            destination,
            options,
        }
    }

    pub fn reversed(&self) -> Self {
        Crossing {
            source: self.destination,
            destination: self.source,
            options: self.options,
        }
    }

    pub fn with_dynamic_props(&self, dynamic_props: bool) -> Self {
        Crossing {
            options: ConvertOptions {
                dynamic_props,
                ..self.options
            },
            ..*self
        }
    }

    pub fn with_freeze(&self, freeze: bool) -> Self {
        Crossing {
            options: ConvertOptions {
                freeze,
                ..self.options
            },
            ..*self
        }
    }
}

/// A property of a structural proxy, read from and written to its source on every access.
struct MirroredProperty {
    crossing: Crossing,
    source: JsObjectType,
    key: PropertyKey,
    depth: usize,
    /// Source value behind `last`.
    last_source: RefCell<JsValue>,
    /// Last value handed out. Keeps its proxy alive as long as the holder is.
    last: RefCell<JsValue>,
}
impl MirroredProperty {
    fn remember(&self, source_value: JsValue, value: JsValue) {
        *self.last_source.borrow_mut() = source_value;
        *self.last.borrow_mut() = value;
    }

    fn read(&self, ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
        let value = get(ctx, &self.source, &self.key)?;
        if value == *self.last_source.borrow() && is_current_copy(&value, &self.last.borrow()) {
            return Ok(self.last.borrow().clone());
        }
        let receiver = JsValue::Object(self.source.clone());
        let converted = convert(ctx, self.crossing, &value, &receiver, self.depth)?.into_value();
        self.remember(value, converted.clone());
        Ok(converted)
    }

    /// `this` is the proxy the assignment went through.
    fn write(&self, ctx: &mut EvalContext, this: &JsValue, value: JsValue) -> Result<(), JErrorType> {
        let converted = pass_value(ctx, self.crossing.reversed(), &value, this)?;
        put(ctx, &self.source, self.key.clone(), converted.clone())?;
        self.remember(converted, value);
        Ok(())
    }

    /// Defines the accessor pair on `target`, a proxy of `destination`.
    fn install(
        self: &Rc<Self>,
        destination: &JsCodeRealmType,
        target: &JsObjectType,
    ) -> Result<(), BridgeError> {
        let name = self.key.to_string();
        let getter = {
            let mirror = self.clone();
            destination
                .borrow()
                .new_closure_function(&name, move |ctx, _this, _args| mirror.read(ctx))
        };
        let setter = if self.crossing.options.freeze {
            None
        } else {
            let mirror = self.clone();
            Some(
                destination
                    .borrow()
                    .new_closure_function(&name, move |ctx, this, args| {
                        let value = args.into_iter().next().unwrap_or(JsValue::Undefined);
                        mirror.write(ctx, &this, value)?;
                        Ok(JsValue::Undefined)
                    }),
            )
        };
        define_property_or_throw(
            target,
            self.key.clone(),
            PropertyDescriptorSetter::accessor(Some(getter), setter, true, true),
        )?;
        Ok(())
    }
}

/// Whether `copy`, rebuilt earlier from the native value `source`, still matches it.
fn is_current_copy(source: &JsValue, copy: &JsValue) -> bool {
    let (source, copy) = match (source, copy) {
        (JsValue::Object(s), JsValue::Object(c)) if !Rc::ptr_eq(s, c) => (s, c),
        _ => return false,
    };
    let (source, copy) = ((**source).borrow(), (**copy).borrow());
    match (&*source, &*copy) {
        (ObjectType::TypedArray(s), ObjectType::TypedArray(c)) => s.bytes() == c.bytes(),
        (ObjectType::Error(_), ObjectType::Error(_))
        | (ObjectType::RegExp(_), ObjectType::RegExp(_))
        | (ObjectType::PrimitiveWrapper(_), ObjectType::PrimitiveWrapper(_)) => true,
        _ => false,
    }
}

/// Where a converted value goes once it is ready.
enum Slot {
    Root,
    /// A data property holding the value read once from a source accessor.
    Property { target: JsObjectType, key: PropertyKey },
    /// First value of a mirrored property.
    Mirror(Rc<MirroredProperty>),
}

struct Visit {
    value: JsValue,
    /// The value holding `value`; proxied functions are called with it as `this`.
    receiver: JsValue,
    depth: usize,
    slot: Slot,
}

/// A crossing recorded by a conversion. Rebuilt values only get the incoming half.
struct Registration {
    key: Option<ProxyKey>,
    source: JsObjectType,
    proxy: JsObjectType,
}

struct Conversion {
    crossing: Crossing,
    source_realm: JsCodeRealmType,
    destination_realm: JsCodeRealmType,
    pending: Vec<Visit>,
    journal: Vec<Registration>,
    /// Objects this conversion built, frozen once it completes when the crossing freezes.
    created: Vec<JsObjectType>,
    /// Native values rebuilt so far, so a value shared within the graph is rebuilt once.
    rebuilt: Vec<(JsObjectType, JsObjectType)>,
    root: Option<JsValue>,
}

pub(crate) fn live_realm(ctx: &EvalContext, realm: RealmId) -> Result<JsCodeRealmType, BridgeError> {
    ctx.realm(realm)
        .map_err(|_| BridgeError::StaleHandle { realm })
}

/// Converts `value`, which lives in `crossing.source`, for use in `crossing.destination`.
///
/// `receiver` is the source value that holds `value`, usually the source global. `depth` is
/// the nesting level `value` sits at.
pub fn convert(
    ctx: &mut EvalContext,
    crossing: Crossing,
    value: &JsValue,
    receiver: &JsValue,
    depth: usize,
) -> Result<BridgedValue, BridgeError> {
    let mut conversion = Conversion {
        crossing,
        source_realm: live_realm(ctx, crossing.source)?,
        destination_realm: live_realm(ctx, crossing.destination)?,
        pending: vec![Visit {
            value: value.clone(),
            receiver: receiver.clone(),
            depth,
            slot: Slot::Root,
        }],
        journal: vec![],
        created: vec![],
        rebuilt: vec![],
        root: None,
    };
    match conversion.run(ctx) {
        Ok(converted) => {
            let bridged = BridgedValue::classify(&converted);
            debug!(
                source = %crossing.source,
                destination = %crossing.destination,
                kind = bridged.kind_name(),
                handles = conversion.journal.len(),
                frozen = crossing.options.freeze,
                "converted value"
            );
            Ok(bridged)
        }
        Err(e) => {
            conversion.roll_back();
            debug!(
                source = %crossing.source,
                destination = %crossing.destination,
                error = %e,
                "conversion failed"
            );
            Err(e)
        }
    }
}

/// [`convert`] at the top level, returning the plain destination value.
pub fn pass_value(
    ctx: &mut EvalContext,
    crossing: Crossing,
    value: &JsValue,
    receiver: &JsValue,
) -> Result<JsValue, BridgeError> {
    convert(ctx, crossing, value, receiver, 0).map(BridgedValue::into_value)
}

impl Conversion {
    fn run(&mut self, ctx: &mut EvalContext) -> Result<JsValue, BridgeError> {
        while let Some(visit) = self.pending.pop() {
            let Visit {
                value,
                receiver,
                depth,
                slot,
            } = visit;
            let converted = self.visit(ctx, value.clone(), &receiver, depth)?;
            match slot {
                Slot::Root => self.root = Some(converted),
                Slot::Property { target, key } => {
                    if !create_data_property(&target, key.clone(), converted) {
                        return Err(JErrorType::TypeError(format!(
                            "Cannot define property {} on the bridged object",
                            key
                        ))
                        .into());
                    }
                }
                Slot::Mirror(mirror) => mirror.remember(value, converted),
            }
        }
        if self.crossing.options.freeze {
            freeze_created(&self.created)?;
        }
        Ok(self.root.take().unwrap_or(JsValue::Undefined))
    }

    fn visit(
        &mut self,
        ctx: &mut EvalContext,
        value: JsValue,
        receiver: &JsValue,
        depth: usize,
    ) -> Result<JsValue, BridgeError> {
        if depth >= self.crossing.options.max_depth {
            return Err(BridgeError::RecursionDepthExceeded(
                self.crossing.options.max_depth,
            ));
        }
        let object = match &value {
            JsValue::Object(o) => o.clone(),
            _ => return Ok(value),
        };
        let original = self
            .source_realm
            .borrow()
            .bridge
            .original(self.crossing.destination, &object);
        if let Some(original) = original {
            return Ok(JsValue::Object(original));
        }

        let bridged = BridgedValue::classify(&value);
        let key = match (&bridged, receiver) {
            (BridgedValue::FunctionProxy(_), JsValue::Object(r)) => {
                ProxyKey::new(&object, Some(r), self.crossing.options.flavour())
            }
            _ => ProxyKey::new(&object, None, self.crossing.options.flavour()),
        };
        let known = self
            .source_realm
            .borrow()
            .bridge
            .proxy_handle(self.crossing.destination, &key, &object);
        if let Some((handle, proxy)) = known.and_then(|h| h.proxy().map(|p| (h, p))) {
            if matches!(bridged, BridgedValue::ObjectProxy(_)) && !handle.is_frozen() {
                self.sync_shape(ctx, &object, &proxy, &handle, depth)?;
            }
            return Ok(JsValue::Object(proxy));
        }

        let converted = match bridged {
            BridgedValue::Primitive(v) => return Ok(v),
            BridgedValue::FunctionProxy(f) => {
                let proxy = create_function_proxy(ctx, self.crossing, &f, receiver)?;
                self.register(Some(key), &f, &proxy);
                proxy
            }
            BridgedValue::PromiseProxy(p) => {
                let proxy = create_promise_proxy(ctx, self.crossing, &p)?;
                self.register(Some(key), &p, &proxy);
                proxy
            }
            BridgedValue::Passthrough(kind, o) => self.rebuild(ctx, kind, &o)?,
            BridgedValue::ObjectProxy(o) => self.mirror_structure(ctx, key, &o, depth)?,
        };
        Ok(JsValue::Object(converted))
    }

    /// Records the crossing in both realms. Without a key only the way back is recorded.
    fn register(
        &mut self,
        key: Option<ProxyKey>,
        source: &JsObjectType,
        proxy: &JsObjectType,
    ) -> Rc<ObjectProxyHandle> {
        let handle = Rc::new(ObjectProxyHandle::new(
            self.crossing.source,
            source,
            self.crossing.destination,
            proxy,
            self.crossing.options.freeze,
        ));
        if let Some(key) = key {
            self.source_realm
                .borrow_mut()
                .bridge
                .register_outgoing(self.crossing.destination, key, handle.clone());
        }
        self.destination_realm
            .borrow_mut()
            .bridge
            .register_incoming(self.crossing.source, proxy, handle.clone());
        trace!(
            source = %self.crossing.source,
            destination = %self.crossing.destination,
            "registered proxy handle"
        );
        self.journal.push(Registration {
            key,
            source: source.clone(),
            proxy: proxy.clone(),
        });
        self.created.push(proxy.clone());
        handle
    }

    fn roll_back(&mut self) {
        for registration in self.journal.drain(..).rev() {
            if let Some(key) = &registration.key {
                self.source_realm.borrow_mut().bridge.unregister_outgoing(
                    self.crossing.destination,
                    key,
                    &registration.source,
                );
            }
            self.destination_realm
                .borrow_mut()
                .bridge
                .unregister_incoming(self.crossing.source, &registration.proxy);
        }
        self.created.clear();
    }

    /// Rebuilds a native value from its contents in the destination realm. Every crossing
    /// gets a fresh copy, so later changes to the source are picked up.
    fn rebuild(
        &mut self,
        ctx: &mut EvalContext,
        kind: PassthroughKind,
        object: &JsObjectType,
    ) -> Result<JsObjectType, BridgeError> {
        if let Some((_, copy)) = self.rebuilt.iter().find(|(s, _)| Rc::ptr_eq(s, object)) {
            return Ok(copy.clone());
        }
        let rebuilt = match kind {
            PassthroughKind::Error => {
                let message = match get(ctx, object, &PropertyKey::from("message"))? {
                    JsValue::String(m) => m,
                    _ => display_string(&JsValue::Object(object.clone())),
                };
                self.destination_realm
                    .borrow()
                    .new_error(ErrorKind::Error, &message)
            }
            PassthroughKind::TypedArray => {
                let contents = match &*(**object).borrow() {
                    ObjectType::TypedArray(t) => Some((t.kind(), t.bytes().to_vec())),
                    _ => None,
                };
                let (array_kind, bytes) = contents.ok_or(BridgeError::Uncloneable)?;
                self.destination_realm
                    .borrow()
                    .new_typed_array(array_kind, &bytes)
            }
            PassthroughKind::RegExp => {
                let pattern = match &*(**object).borrow() {
                    ObjectType::RegExp(r) => Some((r.source().to_string(), r.flags().to_string())),
                    _ => None,
                };
                let (source, flags) = pattern.ok_or(BridgeError::Uncloneable)?;
                self.destination_realm.borrow().new_regexp(&source, &flags)
            }
            PassthroughKind::HostNode => {
                let node = match &*(**object).borrow() {
                    ObjectType::Host(h) => Some(h.node().clone()),
                    _ => None,
                };
                let node = node.ok_or(BridgeError::Uncloneable)?;
                // Host wrappers are cached per realm, no handle needed.
                return Ok(self.destination_realm.borrow_mut().wrap_host_node(&node));
            }
            PassthroughKind::BoxedPrimitive => {
                let primitive = match &*(**object).borrow() {
                    ObjectType::PrimitiveWrapper(p) => Some(p.primitive().clone()),
                    _ => None,
                };
                let wrapper = match primitive {
                    None | Some(JsValue::Symbol(_)) => return Err(BridgeError::Uncloneable),
                    Some(p) => self.destination_realm.borrow().new_primitive_wrapper(p),
                };
                self.created.push(wrapper.clone());
                return Ok(wrapper);
            }
        };
        self.register(None, object, &rebuilt);
        self.rebuilt.push((object.clone(), rebuilt.clone()));
        Ok(rebuilt)
    }

    /// Creates the structural proxy of `object` and schedules the first values of its
    /// properties.
    fn mirror_structure(
        &mut self,
        ctx: &mut EvalContext,
        key: ProxyKey,
        object: &JsObjectType,
        depth: usize,
    ) -> Result<JsObjectType, BridgeError> {
        let array_length = match &*(**object).borrow() {
            ObjectType::Array(a) => Some(a.length()),
            _ => None,
        };
        let target = match array_length {
            Some(length) => self.destination_realm.borrow().new_array_with_length(length),
            None => self.destination_realm.borrow().new_object(),
        };
        let handle = self.register(Some(key), object, &target);

        let keys = own_enumerable_keys(object);
        handle.set_mirrored_keys(keys.clone());
        let mut children = vec![];
        for key in keys {
            children.extend(self.mirror_property(ctx, object, &target, key, depth)?);
        }
        self.pending.extend(children.into_iter().rev());
        Ok(target)
    }

    /// Defines `key` on `target` after the same property of `source`, which sits at `depth`.
    /// Returns the visit producing the property's first value, if it needs one.
    fn mirror_property(
        &mut self,
        ctx: &mut EvalContext,
        source: &JsObjectType,
        target: &JsObjectType,
        key: PropertyKey,
        depth: usize,
    ) -> Result<Option<Visit>, BridgeError> {
        let receiver = JsValue::Object(source.clone());
        if let Some(PropertyDescriptor::Accessor(accessor)) = get_own_property(source, &key) {
            if self.crossing.options.dynamic_props {
                self.define_live_accessor(ctx, source, target, key, accessor, depth)?;
                return Ok(None);
            }
            // Read once.
            let value = get(ctx, source, &key)?;
            return Ok(Some(Visit {
                value,
                receiver,
                depth: depth + 1,
                slot: Slot::Property {
                    target: target.clone(),
                    key,
                },
            }));
        }

        let value = get(ctx, source, &key)?;
        let mirror = Rc::new(MirroredProperty {
            crossing: self.crossing,
            source: source.clone(),
            key,
            depth: depth + 1,
            last_source: RefCell::new(JsValue::Undefined),
            last: RefCell::new(JsValue::Undefined),
        });
        mirror.install(&self.destination_realm, target)?;
        Ok(Some(Visit {
            value,
            receiver,
            depth: depth + 1,
            slot: Slot::Mirror(mirror),
        }))
    }

    /// Brings a proxy up to date with keys added to or removed from its source since the
    /// proxy was built or last synced.
    fn sync_shape(
        &mut self,
        ctx: &mut EvalContext,
        source: &JsObjectType,
        proxy: &JsObjectType,
        handle: &ObjectProxyHandle,
        depth: usize,
    ) -> Result<(), BridgeError> {
        let keys = own_enumerable_keys(source);
        let mirrored = handle.mirrored_keys();
        if keys == mirrored {
            return Ok(());
        }
        handle.set_mirrored_keys(keys.clone());

        for gone in mirrored.iter().filter(|k| !keys.contains(k)) {
            delete_property_or_throw(proxy, gone)?;
        }
        let array_length = match &*(**source).borrow() {
            ObjectType::Array(a) => Some(a.length()),
            _ => None,
        };
        if let Some(length) = array_length {
            put(ctx, proxy, PropertyKey::from("length"), JsValue::from(length as f64))?;
        }
        let mut children = vec![];
        for key in keys.into_iter().filter(|k| !mirrored.contains(k)) {
            children.extend(self.mirror_property(ctx, source, proxy, key, depth)?);
        }
        trace!(
            source = %self.crossing.source,
            destination = %self.crossing.destination,
            added = children.len(),
            "synced proxy shape"
        );
        self.pending.extend(children.into_iter().rev());
        Ok(())
    }

    /// Mirrors a source accessor with proxies of its getter and setter, so every read and
    /// write reaches the source object.
    fn define_live_accessor(
        &mut self,
        ctx: &mut EvalContext,
        holder: &JsObjectType,
        target: &JsObjectType,
        key: PropertyKey,
        accessor: PropertyDescriptorAccessor,
        depth: usize,
    ) -> Result<(), BridgeError> {
        let crossing = self.crossing;
        let receiver = JsValue::Object(holder.clone());
        let mut bridge_accessor = |f: Option<JsObjectType>| -> Result<Option<JsObjectType>, BridgeError> {
            match f {
                None => Ok(None),
                Some(f) => Ok(convert(ctx, crossing, &JsValue::Object(f), &receiver, depth + 1)?
                    .as_object()
                    .cloned()),
            }
        };
        let getter = bridge_accessor(accessor.get)?;
        let setter = bridge_accessor(accessor.set)?;
        define_property_or_throw(
            target,
            key,
            PropertyDescriptorSetter::accessor(
                getter,
                setter,
                accessor.enumerable,
                accessor.configurable,
            ),
        )?;
        Ok(())
    }
}
