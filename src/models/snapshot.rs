//! Page snapshot schema: the capture-side JSON a browser extension or
//! headless harness emits for one rendered page.
//!
//! A snapshot carries three sections:
//! - `document`: the element tree with a computed-style subset per node.
//! - `performance`: the Performance Timeline entries observed so far.
//! - `runtime`: user agent plus a capability table (globals, `CSS.supports`
//!   probe results, canvas probes) for the compatibility audit.
//!
//! Audit logic never touches a live DOM; `DocumentIndex` flattens the tree
//! into document order, assigns each element a stable path string, and
//! answers computed-style lookups (inherited properties walk ancestors).

use crate::color::{parse_color, ParsedColor};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
/// One captured page.
pub struct PageSnapshot {
    #[serde(default)]
    pub url: Option<String>,
    pub document: ElementNode,
    #[serde(default)]
    pub performance: Vec<PerfEntry>,
    #[serde(default)]
    pub runtime: RuntimeProfile,
}

#[derive(Deserialize, Debug, Clone, Default)]
/// An element with its attributes, computed-style subset, and children.
pub struct ElementNode {
    pub tag: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub style: StyleDecl,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
/// A child node: plain strings deserialize as text, objects as elements.
pub enum Node {
    Text(String),
    Element(ElementNode),
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
/// Computed-style subset captured per element. Font sizes are pixels.
pub struct StyleDecl {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_weight: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub opacity: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "entryType")]
/// A Performance Timeline entry. Unknown entry types are kept as `Other`
/// and ignored by the collectors.
pub enum PerfEntry {
    #[serde(rename = "paint")]
    Paint {
        name: String,
        #[serde(rename = "startTime")]
        start_time: f64,
    },
    #[serde(rename = "largest-contentful-paint")]
    LargestContentfulPaint {
        #[serde(rename = "startTime")]
        start_time: f64,
    },
    #[serde(rename = "layout-shift")]
    LayoutShift {
        value: f64,
        #[serde(rename = "hadRecentInput", default)]
        had_recent_input: bool,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
/// Runtime capability table captured alongside the document.
///
/// `css_supports` keys are the probe expressions with whitespace removed,
/// e.g. `display:grid`, `display:flex`, `--test`.
pub struct RuntimeProfile {
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub globals: Vec<String>,
    #[serde(default)]
    pub css_supports: HashMap<String, bool>,
    #[serde(default)]
    pub canvas_webp: bool,
    #[serde(default)]
    pub canvas_webgl: bool,
    #[serde(default)]
    pub service_worker: bool,
    #[serde(default)]
    pub image_decode: bool,
    #[serde(default)]
    pub lazy_loading: bool,
}

impl RuntimeProfile {
    pub fn has_global(&self, name: &str) -> bool {
        self.globals.iter().any(|g| g == name)
    }

    pub fn css_supports(&self, probe: &str) -> bool {
        self.css_supports.get(probe).copied().unwrap_or(false)
    }
}

/// One element in flattened document order.
pub struct ElementRef<'a> {
    pub node: &'a ElementNode,
    pub parent: Option<usize>,
    pub path: String,
}

/// Flattened view of a snapshot document with computed-style lookup.
pub struct DocumentIndex<'a> {
    elements: Vec<ElementRef<'a>>,
}

impl<'a> DocumentIndex<'a> {
    pub fn build(root: &'a ElementNode) -> Self {
        fn walk<'a>(
            node: &'a ElementNode,
            parent: Option<usize>,
            child_pos: usize,
            out: &mut Vec<ElementRef<'a>>,
        ) {
            let path = match parent {
                None => node.tag.clone(),
                Some(p) => format!("{} > {}:nth-child({})", out[p].path, node.tag, child_pos),
            };
            let idx = out.len();
            out.push(ElementRef { node, parent, path });
            let mut pos = 0;
            for child in &node.children {
                if let Node::Element(el) = child {
                    pos += 1;
                    walk(el, Some(idx), pos, out);
                }
            }
        }
        let mut elements = Vec::new();
        walk(root, None, 1, &mut elements);
        DocumentIndex { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn path(&self, i: usize) -> &str {
        &self.elements[i].path
    }

    /// Elements in document order, with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ElementRef<'a>)> + '_ {
        self.elements.iter().enumerate()
    }

    /// Inherited text color; defaults to black when no ancestor sets one.
    pub fn color(&self, i: usize) -> String {
        self.inherited(i, |s| s.color.clone())
            .unwrap_or_else(|| "rgb(0, 0, 0)".to_string())
    }

    /// Inherited font size in pixels; defaults to 16.
    pub fn font_size(&self, i: usize) -> f64 {
        self.inherited(i, |s| s.font_size).unwrap_or(16.0)
    }

    /// Inherited font weight; defaults to `normal`.
    pub fn font_weight(&self, i: usize) -> String {
        self.inherited(i, |s| s.font_weight.clone())
            .unwrap_or_else(|| "normal".to_string())
    }

    pub fn display(&self, i: usize) -> &str {
        self.elements[i].node.style.display.as_deref().unwrap_or("block")
    }

    pub fn visibility(&self, i: usize) -> &str {
        self.elements[i]
            .node
            .style
            .visibility
            .as_deref()
            .unwrap_or("visible")
    }

    pub fn opacity(&self, i: usize) -> f64 {
        self.elements[i].node.style.opacity.unwrap_or(1.0)
    }

    /// Whether the element has a direct text child with non-whitespace
    /// content (descendant text does not count).
    pub fn has_direct_text(&self, i: usize) -> bool {
        self.elements[i].node.children.iter().any(|c| match c {
            Node::Text(t) => !t.trim().is_empty(),
            Node::Element(_) => false,
        })
    }

    /// Nearest non-transparent background color on the ancestor chain,
    /// starting at the element itself. Falls back to the white canvas when
    /// the whole chain is transparent. O(depth) and bounded by tree height.
    pub fn effective_background(&self, i: usize) -> String {
        let mut cur = Some(i);
        while let Some(j) = cur {
            if let Some(bg) = self.elements[j].node.style.background_color.as_deref() {
                if !is_transparent_background(bg) {
                    return bg.to_string();
                }
            }
            cur = self.elements[j].parent;
        }
        "rgb(255, 255, 255)".to_string()
    }

    fn inherited<T>(&self, i: usize, pick: impl Fn(&StyleDecl) -> Option<T>) -> Option<T> {
        let mut cur = Some(i);
        while let Some(j) = cur {
            if let Some(v) = pick(&self.elements[j].node.style) {
                return Some(v);
            }
            cur = self.elements[j].parent;
        }
        None
    }
}

/// Treats the CSS keywords and any fully-transparent `rgba()` as "keep
/// walking up".
fn is_transparent_background(bg: &str) -> bool {
    match bg.trim() {
        "" | "transparent" | "initial" | "inherit" => true,
        other => matches!(parse_color(other), ParsedColor::Rgba(_, a) if a == 0.0),
    }
}
