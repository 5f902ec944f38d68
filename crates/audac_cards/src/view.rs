//! Retained view tree for cards.
//!
//! A [`View`] is built once from a [`ViewBuilder`] and then only patched in
//! place through setters keyed by stable element ids. Listeners can only be
//! declared on the builder, so a built view can never accumulate duplicates.
//! Every setter compares before writing and only counts a patch when the
//! element actually changed, which makes re-rendering with identical inputs
//! observable as zero patches.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fmt::Write as _;

use tracing::debug;

/// Stable identifier of an element within one view.
pub type ElementId = &'static str;

/// DOM event kinds cards listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DomEvent {
    Click,
    Change,
}

/// A user interaction delivered by the host against one element.
#[derive(Debug, Clone, PartialEq)]
pub struct UiEvent {
    pub target: String,
    pub kind: DomEvent,
    /// Current value of the target for `change` events.
    pub value: Option<String>,
}

impl UiEvent {
    pub fn click(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: DomEvent::Click,
            value: None,
        }
    }

    pub fn change(target: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: DomEvent::Change,
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: &'static str,
    pub parent: Option<ElementId>,
    pub classes: BTreeSet<String>,
    pub attrs: BTreeMap<&'static str, String>,
    pub text: String,
    pub options: Vec<String>,
    pub hidden: bool,
}

#[derive(Debug, Clone)]
struct Listener<A> {
    element: ElementId,
    event: DomEvent,
    action: A,
}

pub struct ViewBuilder<A> {
    order: Vec<ElementId>,
    elements: HashMap<ElementId, Element>,
    listeners: Vec<Listener<A>>,
}

impl<A> ViewBuilder<A> {
    pub fn new(root: ElementId, tag: &'static str) -> Self {
        let mut elements = HashMap::new();
        elements.insert(
            root,
            Element {
                tag,
                ..Element::default()
            },
        );
        Self {
            order: vec![root],
            elements,
            listeners: Vec::new(),
        }
    }

    /// Append `id` as the last child of `parent`.
    pub fn child(mut self, parent: ElementId, id: ElementId, tag: &'static str) -> Self {
        if !self.elements.contains_key(parent) || self.elements.contains_key(id) {
            debug!("view builder ignoring element {} under {}", id, parent);
            return self;
        }

        // Keep document order: insert after the parent's last descendant.
        let mut at = self.order.len();
        if let Some(pos) = self.order.iter().position(|e| *e == parent) {
            at = pos + 1;
            while at < self.order.len() && self.is_descendant(self.order[at], parent) {
                at += 1;
            }
        }
        self.order.insert(at, id);
        self.elements.insert(
            id,
            Element {
                tag,
                parent: Some(parent),
                ..Element::default()
            },
        );
        self
    }

    pub fn text(mut self, id: ElementId, text: impl Into<String>) -> Self {
        if let Some(el) = self.elements.get_mut(id) {
            el.text = text.into();
        }
        self
    }

    pub fn class(mut self, id: ElementId, class: impl Into<String>) -> Self {
        if let Some(el) = self.elements.get_mut(id) {
            el.classes.insert(class.into());
        }
        self
    }

    pub fn attr(mut self, id: ElementId, key: &'static str, value: impl Into<String>) -> Self {
        if let Some(el) = self.elements.get_mut(id) {
            el.attrs.insert(key, value.into());
        }
        self
    }

    pub fn options(mut self, id: ElementId, options: Vec<String>) -> Self {
        if let Some(el) = self.elements.get_mut(id) {
            el.options = options;
        }
        self
    }

    pub fn listen(mut self, id: ElementId, event: DomEvent, action: A) -> Self {
        self.listeners.push(Listener {
            element: id,
            event,
            action,
        });
        self
    }

    pub fn build(self) -> View<A> {
        View {
            order: self.order,
            elements: self.elements,
            listeners: self.listeners,
            patches: 0,
        }
    }

    fn is_descendant(&self, id: ElementId, ancestor: ElementId) -> bool {
        let mut cur = self.elements.get(id).and_then(|e| e.parent);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.elements.get(p).and_then(|e| e.parent);
        }
        false
    }
}

pub struct View<A> {
    order: Vec<ElementId>,
    elements: HashMap<ElementId, Element>,
    listeners: Vec<Listener<A>>,
    patches: u64,
}

impl<A> View<A> {
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.element(id).map(|e| e.text.as_str())
    }

    pub fn attr(&self, id: &str, key: &str) -> Option<&str> {
        self.element(id)
            .and_then(|e| e.attrs.get(key))
            .map(String::as_str)
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.classes.contains(class))
    }

    pub fn options(&self, id: &str) -> &[String] {
        self.element(id).map(|e| e.options.as_slice()).unwrap_or(&[])
    }

    /// Whether `id` is part of the rendered output: present, and neither it
    /// nor any ancestor is hidden.
    pub fn is_rendered(&self, id: &str) -> bool {
        let mut cur = self.elements.get(id);
        while let Some(el) = cur {
            if el.hidden {
                return false;
            }
            cur = el.parent.and_then(|p| self.elements.get(p));
        }
        self.elements.contains_key(id)
    }

    /// Number of mutations applied since construction.
    pub fn patch_count(&self) -> u64 {
        self.patches
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Find the action bound to `event` on `target`.
    pub fn route(&self, target: &str, event: DomEvent) -> Option<&A> {
        self.listeners
            .iter()
            .find(|l| l.element == target && l.event == event)
            .map(|l| &l.action)
    }

    pub fn set_text(&mut self, id: &str, text: &str) {
        self.patch(id, |el| {
            if el.text == text {
                return false;
            }
            el.text = text.to_string();
            true
        });
    }

    pub fn set_attr(&mut self, id: &str, key: &'static str, value: &str) {
        self.patch(id, |el| {
            if el.attrs.get(key).is_some_and(|v| v == value) {
                return false;
            }
            el.attrs.insert(key, value.to_string());
            true
        });
    }

    pub fn set_class(&mut self, id: &str, class: &str, on: bool) {
        self.patch(id, |el| {
            if on {
                el.classes.insert(class.to_string())
            } else {
                el.classes.remove(class)
            }
        });
    }

    pub fn set_hidden(&mut self, id: &str, hidden: bool) {
        self.patch(id, |el| {
            if el.hidden == hidden {
                return false;
            }
            el.hidden = hidden;
            true
        });
    }

    pub fn set_options(&mut self, id: &str, options: &[String]) {
        self.patch(id, |el| {
            if el.options == options {
                return false;
            }
            el.options = options.to_vec();
            true
        });
    }

    fn patch(&mut self, id: &str, f: impl FnOnce(&mut Element) -> bool) {
        match self.elements.get_mut(id) {
            Some(el) => {
                if f(el) {
                    self.patches += 1;
                }
            }
            None => debug!("no element with id {} to patch", id),
        }
    }

    /// Render the visible tree as indented text, one element per line.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for id in &self.order {
            if !self.is_rendered(id) {
                continue;
            }
            let Some(el) = self.elements.get(id) else {
                continue;
            };

            let depth = self.depth(id);
            let _ = write!(out, "{}{}#{}", "  ".repeat(depth), el.tag, id);
            for class in &el.classes {
                let _ = write!(out, ".{}", class);
            }
            for (key, value) in &el.attrs {
                let _ = write!(out, " {}=\"{}\"", key, value);
            }
            if !el.options.is_empty() {
                let _ = write!(out, " options=[{}]", el.options.join("|"));
            }
            if !el.text.is_empty() {
                let _ = write!(out, " \"{}\"", el.text);
            }
            out.push('\n');
        }
        out
    }

    fn depth(&self, id: &str) -> usize {
        let mut depth = 0;
        let mut cur = self.elements.get(id).and_then(|e| e.parent);
        while let Some(p) = cur {
            depth += 1;
            cur = self.elements.get(p).and_then(|e| e.parent);
        }
        depth
    }
}
