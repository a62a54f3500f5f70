//! Arena-backed document owned by one render session.
//!
//! Invariants:
//! - Node ids index `nodes` and are never reused; detached subtrees stay in the
//!   arena but are unreachable from `root`.
//! - Form-control state lives in `controls`, seeded from markup whenever HTML is
//!   injected. Markup attributes (`value`, `checked`) are never rewritten by user
//!   interaction; serialization reads current state from `controls`.
//! - Radio groups are scoped per form owner (nearest `<form>`, else the root).

use crate::controls::{ControlKind, RadioGroupIndex, RadioGroupKey};
use crate::entities::{escape_attr, escape_text};
use crate::tokenizer::{is_void_element, tokenize};
use crate::types::{Attribute, NodeData, NodeId, NodeKind, Token};
use input_core::ControlStore;

#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    focused: Option<NodeId>,
    controls: ControlStore,
    radio: RadioGroupIndex,
}

impl Document {
    /// Create a document whose root container is `<div id="{root_id}">`.
    pub fn new(root_id: &str) -> Self {
        let root = NodeData::new(NodeKind::Element {
            name: "div".to_string(),
            attributes: vec![("id".to_string(), Some(root_id.to_string()))],
        });
        Self {
            nodes: vec![root],
            root: NodeId(0),
            focused: None,
            controls: ControlStore::new(),
            radio: RadioGroupIndex::default(),
        }
    }

    /// Parse `html` into a fresh document rooted at `<div id="{root_id}">`.
    pub fn from_html(root_id: &str, html: &str) -> Self {
        let mut doc = Self::new(root_id);
        let root = doc.root;
        doc.set_inner_html(root, html);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // -- Building ---

    /// Replace the children of `parent` with the parsed `html`.
    pub fn set_inner_html(&mut self, parent: NodeId, html: &str) {
        for child in std::mem::take(&mut self.node_mut(parent).children) {
            self.node_mut(child).parent = None;
        }
        if self.focused.is_some_and(|f| !self.is_connected(f)) {
            self.focused = None;
        }
        self.append_html(parent, html);
    }

    /// Parse `html` and append the resulting nodes to `parent`.
    pub fn append_html(&mut self, parent: NodeId, html: &str) {
        let tokens = tokenize(html);
        let mut open_elements: Vec<NodeId> = Vec::new();
        let mut created: Vec<NodeId> = Vec::new();

        for token in tokens {
            let current = open_elements.last().copied().unwrap_or(parent);
            match token {
                Token::Text(text) => {
                    let id = self.push_node(NodeKind::Text(text));
                    self.append_child(current, id);
                }
                Token::Comment(text) => {
                    let id = self.push_node(NodeKind::Comment(text));
                    self.append_child(current, id);
                }
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                } => {
                    let id = self.push_node(NodeKind::Element { name, attributes });
                    self.append_child(current, id);
                    created.push(id);
                    if !self_closing {
                        open_elements.push(id);
                    }
                }
                Token::EndTag(name) => {
                    // Pop to the matching open element; ignore unmatched end tags.
                    if let Some(pos) = open_elements
                        .iter()
                        .rposition(|&id| self.is_element_named(id, &name))
                    {
                        open_elements.truncate(pos);
                    }
                }
            }
        }

        self.seed_controls(&created);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Detach `node` from the tree. Its control state is kept.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root {
            return;
        }
        self.detach(node);
        if self.focused.is_some_and(|f| !self.is_connected(f)) {
            self.focused = None;
        }
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.node_mut(node).parent.take() {
            self.node_mut(parent).children.retain(|&c| c != node);
        }
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData::new(kind));
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0 as usize]
    }

    // -- Structure ---

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.node(node).kind
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element_named(&self, node: NodeId, name: &str) -> bool {
        self.tag_name(node)
            .is_some_and(|tag| tag.eq_ignore_ascii_case(name))
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == self.root {
                return true;
            }
            cur = self.parent(id);
        }
        false
    }

    /// `node` itself, then each ancestor up to the top of its tree.
    pub fn ancestors_inclusive(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(node), move |&id| self.parent(id))
    }

    /// Nearest inclusive ancestor element satisfying `pred`.
    pub fn closest(&self, node: NodeId, pred: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        self.ancestors_inclusive(node)
            .find(|&id| self.tag_name(id).is_some() && pred(self, id))
    }

    pub fn closest_tag(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        self.closest(node, |doc, id| doc.is_element_named(id, tag))
    }

    /// Descendant elements of `node` in document order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.tag_name(id).is_some() {
                out.push(id);
                stack.extend(self.children(id).iter().rev().copied());
            }
        }
        out
    }

    pub fn find_descendant(
        &self,
        node: NodeId,
        pred: impl Fn(&Self, NodeId) -> bool,
    ) -> Option<NodeId> {
        self.descendants(node).into_iter().find(|&id| pred(self, id))
    }

    /// True if `node` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors_inclusive(node).any(|id| id == ancestor)
    }

    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        if self.element_id(self.root) == Some(element_id) {
            return Some(self.root);
        }
        self.find_descendant(self.root, |doc, id| doc.element_id(id) == Some(element_id))
    }

    pub fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.has_class(id, class))
            .collect()
    }

    pub fn elements_with_attr(&self, name: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.has_attr(id, name))
            .collect()
    }

    pub fn text_content(&self, node: NodeId) -> String {
        fn walk(doc: &Document, node: NodeId, out: &mut String) {
            match doc.kind(node) {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Element { .. } => {
                    for &c in doc.children(node) {
                        walk(doc, c, out);
                    }
                }
                NodeKind::Comment(_) => {}
            }
        }
        let mut out = String::new();
        walk(self, node, &mut out);
        out
    }

    // -- Attributes ---

    fn attributes(&self, node: NodeId) -> &[Attribute] {
        match &self.node(node).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    fn attributes_mut(&mut self, node: NodeId) -> Option<&mut Vec<Attribute>> {
        match &mut self.node_mut(node).kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attributes(node)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attributes(node)
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let Some(attributes) = self.attributes_mut(node) else {
            return;
        };
        match attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = Some(value),
            None => attributes.push((name.to_ascii_lowercase(), Some(value))),
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Option<String> {
        let attributes = self.attributes_mut(node)?;
        let pos = attributes
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        let (_, value) = attributes.remove(pos);
        Some(value.unwrap_or_default())
    }

    pub fn element_id(&self, node: NodeId) -> Option<&str> {
        self.attr(node, "id").filter(|id| !id.is_empty())
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let list = match self.attr(node, "class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attr(node, "class", list);
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            return;
        }
        let list = self
            .attr(node, "class")
            .unwrap_or("")
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(node, "class", list);
    }

    /// Append a declaration such as `display: none` to the inline style.
    pub fn push_style(&mut self, node: NodeId, declaration: &str) {
        let style = match self.attr(node, "style").map(str::trim) {
            Some(existing) if !existing.is_empty() => {
                format!("{}; {declaration}", existing.trim_end_matches(';'))
            }
            _ => declaration.to_string(),
        };
        self.set_attr(node, "style", style);
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.attr(node, "style").is_some_and(|style| {
            style
                .split(';')
                .any(|decl| decl.replace(' ', "").eq_ignore_ascii_case("display:none"))
        })
    }

    // -- Focus ---

    pub fn active_element(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn focus(&mut self, node: NodeId) {
        self.focused = Some(node);
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    // -- Form controls ---

    pub fn control_kind(&self, node: NodeId) -> ControlKind {
        match self.tag_name(node) {
            Some(tag) => ControlKind::classify(tag, self.attr(node, "type")),
            None => ControlKind::Other,
        }
    }

    pub fn value(&self, node: NodeId) -> &str {
        self.controls.value(node.into())
    }

    /// Set a control's value. Returns `true` if it changed.
    pub fn set_value(&mut self, node: NodeId, value: impl Into<String>) -> bool {
        self.controls.set_value(node.into(), value.into())
    }

    /// Append typed text. Returns `true` if the value changed.
    pub fn insert_text(&mut self, node: NodeId, text: &str) -> bool {
        let multiline = self.control_kind(node) == ControlKind::Textarea;
        self.controls.type_text(node.into(), text, multiline)
    }

    pub fn backspace(&mut self, node: NodeId) -> bool {
        self.controls.backspace(node.into())
    }

    pub fn is_checked(&self, node: NodeId) -> bool {
        self.controls.is_checked(node.into())
    }

    /// Set the checked flag the way assigning `.checked` does: checking a radio
    /// unchecks the rest of its group. Returns `true` if anything changed.
    pub fn set_checked(&mut self, node: NodeId, checked: bool) -> bool {
        if checked && self.control_kind(node) == ControlKind::Radio {
            return self.radio.check(&mut self.controls, node);
        }
        self.controls.set_checked(node.into(), checked)
    }

    /// Platform default action of a click on a checkbox or radio.
    pub fn activate_toggle(&mut self, node: NodeId) -> bool {
        match self.control_kind(node) {
            ControlKind::Checkbox => {
                self.controls.toggle_checked(node.into());
                true
            }
            ControlKind::Radio => self.set_checked(node, true),
            _ => false,
        }
    }

    /// Radios sharing a group with `node`, including `node`.
    pub fn radio_group(&self, node: NodeId) -> Vec<NodeId> {
        let members = self.radio.members_of(node);
        if members.is_empty() {
            vec![node]
        } else {
            members.to_vec()
        }
    }

    fn seed_controls(&mut self, nodes: &[NodeId]) {
        for &id in nodes {
            match self.control_kind(id) {
                ControlKind::Checkbox => {
                    let checked = self.has_attr(id, "checked");
                    let value = self.attr(id, "value").unwrap_or("on").to_string();
                    self.controls.seed(id.into(), value, checked);
                }
                ControlKind::Radio => {
                    let checked = self.has_attr(id, "checked");
                    let value = self.attr(id, "value").unwrap_or("on").to_string();
                    self.controls.seed(id.into(), value, checked);
                    if let Some(key) = self.radio_group_key(id) {
                        self.radio.register(key, id);
                    }
                    if checked {
                        self.set_checked(id, true);
                    }
                }
                ControlKind::Textarea => {
                    let mut initial = self.text_content(id);
                    if initial.starts_with('\n') {
                        initial.remove(0);
                    }
                    self.controls.seed(id.into(), initial, false);
                }
                ControlKind::Select => {
                    let options: Vec<NodeId> = self
                        .descendants(id)
                        .into_iter()
                        .filter(|&o| self.is_element_named(o, "option"))
                        .collect();
                    let chosen = options
                        .iter()
                        .copied()
                        .find(|&o| self.has_attr(o, "selected"))
                        .or_else(|| options.first().copied());
                    let initial = chosen.map(|o| self.option_value(o)).unwrap_or_default();
                    self.controls.seed(id.into(), initial, false);
                }
                kind if kind.is_text_entry() => {
                    let initial = self.attr(id, "value").unwrap_or("").to_string();
                    self.controls.seed(id.into(), initial, false);
                }
                _ => {}
            }
        }
    }

    fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(v) => v.to_string(),
            None => self.text_content(option).trim().to_string(),
        }
    }

    fn radio_group_key(&self, radio: NodeId) -> Option<RadioGroupKey> {
        let name = self.attr(radio, "name")?.trim();
        if name.is_empty() {
            return None;
        }
        let scope = self.closest_tag(radio, "form").unwrap_or(self.root);
        Some(RadioGroupKey {
            scope,
            name: name.to_string(),
        })
    }

    // -- Serialization ---

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &c in self.children(node) {
            self.write_html(c, &mut out);
        }
        out
    }

    /// Serialize `node`, reflecting current control state into `value`/`checked`.
    fn write_html(&self, node: NodeId, out: &mut String) {
        match self.kind(node) {
            NodeKind::Text(text) => {
                if self
                    .parent(node)
                    .is_some_and(|p| self.is_element_named(p, "script") || self.is_element_named(p, "style"))
                {
                    out.push_str(text);
                } else {
                    escape_text(text, out);
                }
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Element { name, attributes } => {
                let kind = self.control_kind(node);
                out.push('<');
                out.push_str(name);
                for (k, v) in attributes {
                    let reflected = (k == "value" && kind.is_text_entry() && kind != ControlKind::Textarea)
                        || (k == "checked" && kind.is_toggle());
                    if reflected {
                        continue;
                    }
                    out.push(' ');
                    out.push_str(k);
                    if let Some(v) = v {
                        out.push_str("=\"");
                        escape_attr(v, out);
                        out.push('"');
                    }
                }
                if kind.is_text_entry() && kind != ControlKind::Textarea {
                    let value = self.value(node);
                    if !value.is_empty() {
                        out.push_str(" value=\"");
                        escape_attr(value, out);
                        out.push('"');
                    }
                }
                if kind.is_toggle() && self.is_checked(node) {
                    out.push_str(" checked");
                }
                out.push('>');
                if is_void_element(name) {
                    return;
                }
                if kind == ControlKind::Textarea {
                    escape_text(self.value(node), out);
                } else {
                    for &c in self.children(node) {
                        self.write_html(c, out);
                    }
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}
