//! # Node Model
//!
//! A page is a flat map of nodes keyed by id. Structure lives entirely in the
//! ordered `children` lists of container nodes; there are no parent pointers
//! and no object references, only ids.
//!
//! Styles are an open bag: known property names get their own [`StyleKey`]
//! variant, anything else is carried through as [`StyleKey::Other`] so that
//! documents written by newer editors still load.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};

use crate::id_generator::generate_id;

pub type NodeId = String;

/// Complete id → node dictionary of one document
pub type NodeMap = BTreeMap<NodeId, Node>;

/// Id of the page root. Always present in a loaded document.
pub const ROOT_ID: &str = "root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Text,
    Button,
    Image,
    Container,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Text,
        NodeKind::Button,
        NodeKind::Image,
        NodeKind::Container,
    ];

    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Container)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Text => "text",
            NodeKind::Button => "button",
            NodeKind::Image => "image",
            NodeKind::Container => "container",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown node type '{}'", s))
    }
}

/// Visual property name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StyleKey {
    FontSize,
    FontWeight,
    Color,
    BackgroundColor,
    Padding,
    Margin,
    BorderRadius,
    Width,
    Height,
    TextAlign,
    ObjectFit,
    Top,
    Left,
    /// Property this editor has no name for
    Other(String),
}

impl StyleKey {
    pub fn as_str(&self) -> &str {
        match self {
            StyleKey::FontSize => "fontSize",
            StyleKey::FontWeight => "fontWeight",
            StyleKey::Color => "color",
            StyleKey::BackgroundColor => "backgroundColor",
            StyleKey::Padding => "padding",
            StyleKey::Margin => "margin",
            StyleKey::BorderRadius => "borderRadius",
            StyleKey::Width => "width",
            StyleKey::Height => "height",
            StyleKey::TextAlign => "textAlign",
            StyleKey::ObjectFit => "objectFit",
            StyleKey::Top => "top",
            StyleKey::Left => "left",
            StyleKey::Other(name) => name,
        }
    }
}

impl From<String> for StyleKey {
    fn from(name: String) -> Self {
        match name.as_str() {
            "fontSize" => StyleKey::FontSize,
            "fontWeight" => StyleKey::FontWeight,
            "color" => StyleKey::Color,
            "backgroundColor" => StyleKey::BackgroundColor,
            "padding" => StyleKey::Padding,
            "margin" => StyleKey::Margin,
            "borderRadius" => StyleKey::BorderRadius,
            "width" => StyleKey::Width,
            "height" => StyleKey::Height,
            "textAlign" => StyleKey::TextAlign,
            "objectFit" => StyleKey::ObjectFit,
            "top" => StyleKey::Top,
            "left" => StyleKey::Left,
            _ => StyleKey::Other(name),
        }
    }
}

impl From<&str> for StyleKey {
    fn from(name: &str) -> Self {
        StyleKey::from(name.to_string())
    }
}

impl From<StyleKey> for String {
    fn from(key: StyleKey) -> Self {
        key.as_str().to_string()
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Style value. Never interpreted by the mutation engine.
///
/// Numbers are held as `f64`; whole values are written back as JSON integers
/// so `fontSize: 16` round-trips as `16` rather than `16.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Number(#[serde(serialize_with = "write_number")] f64),
    /// Top, right, bottom, left
    Sides(#[serde(serialize_with = "write_sides")] [f64; 4]),
    Text(String),
    /// Any other JSON shape, kept as-is
    Other(serde_json::Value),
}

fn write_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn write_sides<S: Serializer>(value: &[f64; 4], serializer: S) -> Result<S::Ok, S::Error> {
    struct Side(f64);

    impl Serialize for Side {
        fn serialize<T: Serializer>(&self, serializer: T) -> Result<T::Ok, T::Error> {
            write_number(&self.0, serializer)
        }
    }

    let mut tuple = serializer.serialize_tuple(4)?;
    for side in value {
        tuple.serialize_element(&Side(*side))?;
    }
    tuple.end()
}

impl From<f64> for StyleValue {
    fn from(value: f64) -> Self {
        StyleValue::Number(value)
    }
}

impl From<[f64; 4]> for StyleValue {
    fn from(value: [f64; 4]) -> Self {
        StyleValue::Sides(value)
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        StyleValue::Text(value.to_string())
    }
}

/// Lenient parsing used by text front ends: `16` is a number, `8,16,8,16`
/// is a 4-tuple, everything else is text.
impl FromStr for StyleValue {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<f64>() {
            return Ok(StyleValue::Number(n));
        }

        let parts: Vec<f64> = trimmed
            .split(',')
            .filter_map(|p| p.trim().parse::<f64>().ok())
            .collect();
        if parts.len() == 4 && trimmed.split(',').count() == 4 {
            return Ok(StyleValue::Sides([parts[0], parts[1], parts[2], parts[3]]));
        }

        Ok(StyleValue::Text(trimmed.to_string()))
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Number(n) => write!(f, "{}", n),
            StyleValue::Sides([t, r, b, l]) => write!(f, "{} {} {} {}", t, r, b, l),
            StyleValue::Text(s) => f.write_str(s),
            StyleValue::Other(v) => write!(f, "{}", v),
        }
    }
}

/// Open mapping of style properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Styles(BTreeMap<StyleKey, StyleValue>);

impl Styles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<StyleKey>, value: impl Into<StyleValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<StyleKey>, value: impl Into<StyleValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &StyleKey) -> Option<&StyleValue> {
        self.0.get(key)
    }

    /// Shallow merge: keys in `other` overwrite, all other keys are kept
    pub fn merge(&mut self, other: &Styles) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StyleKey, &StyleValue)> {
        self.0.iter()
    }
}

impl FromIterator<(StyleKey, StyleValue)> for Styles {
    fn from_iter<I: IntoIterator<Item = (StyleKey, StyleValue)>>(iter: I) -> Self {
        Styles(iter.into_iter().collect())
    }
}

/// A single visual element of the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,

    #[serde(rename = "type")]
    pub kind: NodeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    #[serde(default)]
    pub styles: Styles,

    /// Ordered child ids. Only containers carry a list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeId>>,
}

impl Node {
    /// Bare node with no content and no styles
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            content: None,
            image_url: None,
            href: None,
            styles: Styles::new(),
            children: kind.is_container().then(Vec::new),
        }
    }

    /// Node with a fresh id, the element panel defaults for `kind`, and
    /// `overrides` merged on top.
    pub fn create(kind: NodeKind, overrides: NodePatch) -> Self {
        let mut node = Self::new(generate_id(), kind);

        match kind {
            NodeKind::Text => {
                node.content = Some("New text element".to_string());
                node.styles = Styles::new()
                    .with(StyleKey::FontSize, 16.0)
                    .with(StyleKey::Color, "#000000")
                    .with(StyleKey::Margin, [8.0, 8.0, 8.0, 8.0])
                    .with(StyleKey::Padding, [8.0, 8.0, 8.0, 8.0]);
            }
            NodeKind::Button => {
                node.content = Some("New Button".to_string());
                node.href = Some("#".to_string());
                node.styles = Styles::new()
                    .with(StyleKey::BackgroundColor, "#3b82f6")
                    .with(StyleKey::Color, "#ffffff")
                    .with(StyleKey::Padding, [12.0, 24.0, 12.0, 24.0])
                    .with(StyleKey::BorderRadius, 6.0)
                    .with(StyleKey::FontSize, 16.0)
                    .with(StyleKey::Margin, [8.0, 8.0, 8.0, 8.0]);
            }
            NodeKind::Image => {
                node.image_url = Some("/placeholder.svg?height=200&width=300".to_string());
                node.styles = Styles::new()
                    .with(StyleKey::Width, 300.0)
                    .with(StyleKey::Height, 200.0)
                    .with(StyleKey::Margin, [8.0, 8.0, 8.0, 8.0]);
            }
            NodeKind::Container => {
                node.styles = Styles::new()
                    .with(StyleKey::BackgroundColor, "#f3f4f6")
                    .with(StyleKey::Padding, [20.0, 20.0, 20.0, 20.0])
                    .with(StyleKey::Margin, [8.0, 8.0, 8.0, 8.0]);
            }
        }

        node.apply_patch(&overrides);
        node
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_styles(mut self, styles: Styles) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.children = Some(children.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    /// Child ids in order (empty for leaves)
    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Shallow-merge a patch: set fields replace, `styles` merge key by key
    pub fn apply_patch(&mut self, patch: &NodePatch) {
        if let Some(content) = &patch.content {
            self.content = Some(content.clone());
        }
        if let Some(url) = &patch.image_url {
            self.image_url = Some(url.clone());
        }
        if let Some(href) = &patch.href {
            self.href = Some(href.clone());
        }
        if let Some(styles) = &patch.styles {
            self.styles.merge(styles);
        }
    }
}

/// Partial update of a node's content fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Styles>,
}

impl NodePatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn styles(styles: Styles) -> Self {
        Self {
            styles: Some(styles),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.image_url.is_none()
            && self.href.is_none()
            && self.styles.is_none()
    }
}
