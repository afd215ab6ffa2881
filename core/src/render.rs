//! Projecting posts into a display container.
//!
//! # Design
//! The container is an element tree held behind a shared handle. A
//! `PostRenderer` receives that handle when it is built; clones of the handle
//! see the same children, so completions running on different tasks can
//! render into one container. Each render takes the container lock once, so
//! a batch from `render_list` is attached in a single step and never
//! interleaves with another render.

use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::types::Post;

/// A display element: a tag, CSS classes, optional text and child elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Concatenated text of this element and all descendants, in document
    /// order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    fn write_html(&self, out: &mut String) -> fmt::Result {
        write!(out, "<{}", self.tag)?;
        if !self.classes.is_empty() {
            write!(out, " class=\"{}\"", escape(&self.classes.join(" ")))?;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape(text));
        }
        for child in &self.children {
            child.write_html(out)?;
        }
        write!(out, "</{}>", self.tag)
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.write_html(&mut out);
        out
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Shared handle to the element that accumulates rendered posts.
#[derive(Debug, Clone)]
pub struct Container {
    root: Arc<Mutex<Element>>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new(Element::new("div").class("container"))
    }
}

impl Container {
    pub fn new(root: Element) -> Self {
        Self {
            root: Arc::new(Mutex::new(root)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Element> {
        // an element tree has no invariant a panicking writer could break
        self.root.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the current children.
    pub fn children(&self) -> Vec<Element> {
        self.lock().children.clone()
    }

    pub fn text_content(&self) -> String {
        self.lock().text_content()
    }

    pub fn to_html(&self) -> String {
        self.lock().to_html()
    }

    fn append_all(&self, batch: Vec<Element>) {
        if batch.is_empty() {
            return;
        }
        self.lock().children.extend(batch);
    }

    fn prepend(&self, element: Element) {
        self.lock().children.insert(0, element);
    }
}

/// Renders posts as cards into a `Container`.
#[derive(Debug, Clone)]
pub struct PostRenderer {
    container: Container,
}

impl PostRenderer {
    pub fn new(container: Container) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Append one card per post after the existing children, in input order.
    pub fn render_list(&self, posts: &[Post]) {
        let batch: Vec<Element> = posts.iter().map(card).collect();
        self.container.append_all(batch);
    }

    /// Insert a card for `post` as the first child.
    pub fn render_one(&self, post: &Post) {
        self.container.prepend(card(post));
    }
}

/// `div.card > div.card-body > (h5.card-title, p.card-text)`
pub fn card(post: &Post) -> Element {
    let title = Element::new("h5").class("card-title").text(post.title.as_str());
    let text = Element::new("p").class("card-text").text(post.body.as_str());
    Element::new("div")
        .class("card")
        .child(Element::new("div").class("card-body").child(title).child(text))
}
