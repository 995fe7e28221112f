//! Host objects (DOM nodes and Blobs).
//!
//! A host node is owned by the embedder and shared by every realm of a frame. Each realm
//! sees it through its own wrapper object, whose prototype chain comes from that realm.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use uuid::Uuid;

use crate::runner::ds::object::{JsObject, JsObjectType, ObjectBase};
use crate::runner::ds::realm::RealmId;

pub type HostNodeRef = Rc<RefCell<HostNode>>;

#[derive(Debug, Clone, PartialEq)]
pub enum HostNodeKind {
    Document,
    Element { tag_name: String },
    Blob { data: Vec<u8>, mime_type: String },
}

pub struct HostNode {
    id: Uuid,
    kind: HostNodeKind,
    attributes: HashMap<String, String>,
    children: Vec<HostNodeRef>,
}
impl HostNode {
    fn new(kind: HostNodeKind) -> HostNodeRef {
        Rc::new(RefCell::new(HostNode {
            id: Uuid::new_v4(),
            kind,
            attributes: HashMap::new(),
            children: vec![],
        }))
    }

    /// A document with an empty `<body>`.
    pub fn new_document() -> HostNodeRef {
        let document = HostNode::new(HostNodeKind::Document);
        HostNode::append_child(&document, HostNode::new_element("body"));
        document
    }

    pub fn new_element(tag_name: &str) -> HostNodeRef {
        HostNode::new(HostNodeKind::Element {
            tag_name: tag_name.to_ascii_uppercase(),
        })
    }

    pub fn new_blob(data: Vec<u8>, mime_type: &str) -> HostNodeRef {
        HostNode::new(HostNodeKind::Blob {
            data,
            mime_type: mime_type.to_ascii_lowercase(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &HostNodeKind {
        &self.kind
    }

    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            HostNodeKind::Element { tag_name } => Some(tag_name),
            _ => None,
        }
    }

    /// The name of the DOM interface this node implements.
    pub fn interface_name(&self) -> &'static str {
        match &self.kind {
            HostNodeKind::Document => "HTMLDocument",
            HostNodeKind::Element { tag_name } => match tag_name.as_str() {
                "BODY" => "HTMLBodyElement",
                "DIV" => "HTMLDivElement",
                _ => "HTMLElement",
            },
            HostNodeKind::Blob { .. } => "Blob",
        }
    }

    pub fn children(&self) -> &[HostNodeRef] {
        &self.children
    }

    pub fn append_child(parent: &HostNodeRef, child: HostNodeRef) {
        parent.borrow_mut().children.push(child);
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn body(document: &HostNodeRef) -> Option<HostNodeRef> {
        document
            .borrow()
            .children
            .iter()
            .find(|c| c.borrow().tag_name() == Some("BODY"))
            .cloned()
    }

    fn matches(&self, selector: &str) -> bool {
        match selector.strip_prefix('#') {
            Some(id) => self.get_attribute("id") == Some(id),
            None => self
                .tag_name()
                .map(|t| t.eq_ignore_ascii_case(selector))
                .unwrap_or(false),
        }
    }

    /// First descendant of `root` (depth first, document order) matching a tag name or
    /// `#id` selector.
    pub fn query_selector(root: &HostNodeRef, selector: &str) -> Option<HostNodeRef> {
        let selector = selector.trim();
        let mut stack: Vec<HostNodeRef> = root.borrow().children.iter().rev().cloned().collect();
        while let Some(node) = stack.pop() {
            let n = node.borrow();
            if n.matches(selector) {
                drop(n);
                return Some(node);
            }
            stack.extend(n.children.iter().rev().cloned());
        }
        None
    }

    pub fn blob_size(&self) -> Option<usize> {
        match &self.kind {
            HostNodeKind::Blob { data, .. } => Some(data.len()),
            _ => None,
        }
    }

    pub fn blob_type(&self) -> Option<&str> {
        match &self.kind {
            HostNodeKind::Blob { mime_type, .. } => Some(mime_type),
            _ => None,
        }
    }

    pub fn blob_text(&self) -> Option<String> {
        match &self.kind {
            HostNodeKind::Blob { data, .. } => Some(String::from_utf8_lossy(data).into_owned()),
            _ => None,
        }
    }
}

/// A realm's wrapper around a host node.
pub struct HostObject {
    base: ObjectBase,
    node: HostNodeRef,
}
impl HostObject {
    pub fn new(realm: RealmId, prototype: Option<JsObjectType>, node: HostNodeRef) -> Self {
        HostObject {
            base: ObjectBase::new(realm, prototype),
            node,
        }
    }

    pub fn node(&self) -> &HostNodeRef {
        &self.node
    }
}
impl JsObject for HostObject {
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
        self.node.borrow().interface_name()
    }
}
