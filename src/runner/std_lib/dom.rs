//! The slice of the DOM a preload script reaches for: `document`, elements and `Blob`.
//!
//! Wrappers are per realm, the nodes behind them are shared by the whole frame.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::EvalContext;
use crate::runner::ds::host_object::{HostNode, HostNodeRef};
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{get, length_of_array_like};
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::promise_object::fulfill_promise;
use crate::runner::ds::realm::{CodeRealm, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::builtin::{argument, define_method, BuiltInObject};

/// Install the DOM prototypes, the `Blob` constructor and, if the realm has one, the
/// `document` global.
pub fn install(realm: &mut CodeRealm) -> Result<(), JErrorType> {
    BuiltInObject::new("HTMLElement")
        .with_prototype(WellKnownIntrinsics::HTMLElementPrototype)
        .add_getter("tagName", element_tag_name)
        .add_method("querySelector", node_query_selector)
        .add_method("appendChild", node_append_child)
        .add_method("setAttribute", element_set_attribute)
        .add_method("getAttribute", element_get_attribute)
        .install(realm)?;
    BuiltInObject::new("HTMLBodyElement")
        .with_prototype(WellKnownIntrinsics::HTMLBodyElementPrototype)
        .inherits(WellKnownIntrinsics::HTMLElementPrototype)
        .install(realm)?;
    BuiltInObject::new("HTMLDivElement")
        .with_prototype(WellKnownIntrinsics::HTMLDivElementPrototype)
        .inherits(WellKnownIntrinsics::HTMLElementPrototype)
        .install(realm)?;
    BuiltInObject::new("HTMLDocument")
        .with_prototype(WellKnownIntrinsics::HTMLDocumentPrototype)
        .add_getter("body", document_body)
        .add_method("querySelector", node_query_selector)
        .add_method("createElement", document_create_element)
        .install(realm)?;
    BuiltInObject::new("Blob")
        .with_prototype(WellKnownIntrinsics::BlobPrototype)
        .with_constructor(WellKnownIntrinsics::Blob, blob_constructor)
        .add_getter("size", blob_size)
        .add_getter("type", blob_type)
        .add_method("text", blob_text)
        .install(realm)?;

    if let Some(document) = realm.document().cloned() {
        let wrapper = realm.wrap_host_node(&document);
        define_method(&realm.global_object(), "document", JsValue::Object(wrapper))?;
    }
    Ok(())
}

fn this_node(this: &JsValue) -> Result<HostNodeRef, JErrorType> {
    if let JsValue::Object(o) = this {
        if let ObjectType::Host(h) = &*(**o).borrow() {
            return Ok(h.node().clone());
        }
    }
    Err(JErrorType::TypeError("Illegal invocation".to_string()))
}

fn wrap(ctx: &EvalContext, node: &HostNodeRef) -> Result<JsObjectType, JErrorType> {
    Ok(ctx.current_realm()?.borrow_mut().wrap_host_node(node))
}

/// get HTMLElement.prototype.tagName
fn element_tag_name(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let node = this_node(&this)?;
    let tag = node.borrow().tag_name().map(JsValue::from);
    Ok(tag.unwrap_or(JsValue::Undefined))
}

/// querySelector on documents and elements.
fn node_query_selector(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let node = this_node(&this)?;
    let selector = to_string(ctx, &argument(&args, 0))?;
    match HostNode::query_selector(&node, &selector) {
        Some(found) => Ok(JsValue::Object(wrap(ctx, &found)?)),
        None => Ok(JsValue::Null),
    }
}

/// appendChild on documents and elements. Returns the appended child.
fn node_append_child(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let parent = this_node(&this)?;
    let child_value = argument(&args, 0);
    let child = this_node(&child_value).map_err(|_| {
        JErrorType::TypeError(
            "Failed to execute 'appendChild' on 'Node': parameter 1 is not of type 'Node'."
                .to_string(),
        )
    })?;
    HostNode::append_child(&parent, child);
    Ok(child_value)
}

/// HTMLElement.prototype.setAttribute
fn element_set_attribute(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let node = this_node(&this)?;
    let name = to_string(ctx, &argument(&args, 0))?;
    let value = to_string(ctx, &argument(&args, 1))?;
    node.borrow_mut().set_attribute(&name, &value);
    Ok(JsValue::Undefined)
}

/// HTMLElement.prototype.getAttribute
fn element_get_attribute(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let node = this_node(&this)?;
    let name = to_string(ctx, &argument(&args, 0))?;
    let value = node.borrow().get_attribute(&name).map(JsValue::from);
    Ok(value.unwrap_or(JsValue::Null))
}

/// get HTMLDocument.prototype.body
fn document_body(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let document = this_node(&this)?;
    match HostNode::body(&document) {
        Some(body) => Ok(JsValue::Object(wrap(ctx, &body)?)),
        None => Ok(JsValue::Null),
    }
}

/// HTMLDocument.prototype.createElement
fn document_create_element(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    this_node(&this)?;
    let tag = to_string(ctx, &argument(&args, 0))?;
    let element = HostNode::new_element(&tag);
    Ok(JsValue::Object(wrap(ctx, &element)?))
}

/// new Blob(parts, { type })
fn blob_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut data = vec![];
    if let JsValue::Object(parts) = argument(&args, 0) {
        let len = length_of_array_like(ctx, &parts)?;
        for i in 0..len {
            let part = get(ctx, &parts, &PropertyKey::Int(i))?;
            append_blob_part(ctx, &mut data, &part)?;
        }
    }
    let mime_type = match argument(&args, 1) {
        JsValue::Object(options) => match get(ctx, &options, &PropertyKey::from("type"))? {
            JsValue::Undefined => String::new(),
            t => to_string(ctx, &t)?,
        },
        _ => String::new(),
    };
    let blob = HostNode::new_blob(data, &mime_type);
    Ok(JsValue::Object(wrap(ctx, &blob)?))
}

fn append_blob_part(
    ctx: &mut EvalContext,
    data: &mut Vec<u8>,
    part: &JsValue,
) -> Result<(), JErrorType> {
    if let JsValue::Object(o) = part {
        match &*(**o).borrow() {
            ObjectType::TypedArray(t) => {
                data.extend_from_slice(t.bytes());
                return Ok(());
            }
            ObjectType::Host(h) => {
                if let Some(text) = h.node().borrow().blob_text() {
                    data.extend_from_slice(text.as_bytes());
                    return Ok(());
                }
            }
            _ => {}
        }
    }
    data.extend_from_slice(to_string(ctx, part)?.as_bytes());
    Ok(())
}

fn this_blob_property<R>(
    this: &JsValue,
    f: impl FnOnce(&HostNode) -> Option<R>,
) -> Result<R, JErrorType> {
    let node = this_node(this)?;
    let result = f(&node.borrow());
    result.ok_or_else(|| JErrorType::TypeError("Illegal invocation".to_string()))
}

/// get Blob.prototype.size
fn blob_size(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    this_blob_property(&this, |n| n.blob_size().map(JsValue::from))
}

/// get Blob.prototype.type
fn blob_type(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    this_blob_property(&this, |n| n.blob_type().map(JsValue::from))
}

/// Blob.prototype.text. Resolves with the contents decoded as UTF-8.
fn blob_text(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let text = this_blob_property(&this, |n| n.blob_text())?;
    let promise = ctx.current_realm()?.borrow().new_promise();
    fulfill_promise(ctx, &promise, JsValue::String(text))?;
    Ok(JsValue::Object(promise))
}
