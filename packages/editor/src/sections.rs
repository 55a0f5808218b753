//! Prebuilt page sections (a container plus its content) with fresh ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::id_generator::generate_id;
use crate::node::{Node, NodeKind, StyleKey, Styles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Hero,
    Feature,
    Cta,
    Testimonial,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Hero,
        SectionKind::Feature,
        SectionKind::Cta,
        SectionKind::Testimonial,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Hero => "hero",
            SectionKind::Feature => "feature",
            SectionKind::Cta => "cta",
            SectionKind::Testimonial => "testimonial",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = crate::EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| crate::EditorError::UnknownSection(s.to_string()))
    }
}

/// A section ready for `Mutation::InsertSubtree`
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub root: Node,
    pub descendants: Vec<Node>,
}

impl Section {
    pub fn build(kind: SectionKind) -> Self {
        match kind {
            SectionKind::Hero => Self::assemble(
                section_styles("#f8fafc", true),
                vec![
                    text("Your Amazing Headline", 48.0, Some(700.0), "#1f2937", true, [0.0, 0.0, 16.0, 0.0]),
                    text(
                        "A compelling subtitle that explains your value proposition and engages your audience.",
                        20.0,
                        None,
                        "#6b7280",
                        true,
                        [0.0, 0.0, 32.0, 0.0],
                    ),
                    button("Get Started"),
                ],
            ),
            SectionKind::Feature => Self::assemble(
                section_styles("#ffffff", false),
                vec![
                    text("Amazing Features", 36.0, Some(600.0), "#1f2937", false, [0.0, 0.0, 20.0, 0.0]),
                    text(
                        "Discover the powerful features that make our product stand out from the competition.",
                        16.0,
                        None,
                        "#6b7280",
                        false,
                        [0.0, 0.0, 24.0, 0.0],
                    ),
                    Node::new(generate_id(), NodeKind::Image)
                        .with_image_url("/placeholder.svg?height=300&width=400")
                        .with_styles(
                            Styles::new()
                                .with(StyleKey::Width, 400.0)
                                .with(StyleKey::Height, 300.0)
                                .with(StyleKey::BorderRadius, 8.0),
                        ),
                ],
            ),
            SectionKind::Cta => Self::assemble(
                section_styles("#1f2937", true),
                vec![
                    text("Ready to Get Started?", 36.0, Some(600.0), "#ffffff", true, [0.0, 0.0, 16.0, 0.0]),
                    text(
                        "Join thousands of satisfied customers who have transformed their business with our solution.",
                        18.0,
                        None,
                        "#d1d5db",
                        true,
                        [0.0, 0.0, 32.0, 0.0],
                    ),
                    button("Start Free Trial"),
                ],
            ),
            SectionKind::Testimonial => Self::assemble(
                section_styles("#f9fafb", true),
                vec![
                    text(
                        "\"This product has completely transformed how we work. Highly recommended!\"",
                        24.0,
                        Some(500.0),
                        "#1f2937",
                        true,
                        [0.0, 0.0, 20.0, 0.0],
                    ),
                    text("John Smith, CEO at TechCorp", 16.0, None, "#6b7280", true, [0.0; 4]),
                ],
            ),
        }
    }

    fn assemble(styles: Styles, descendants: Vec<Node>) -> Self {
        let root = Node::new(generate_id(), NodeKind::Container)
            .with_styles(styles)
            .with_children(descendants.iter().map(|n| n.id.clone()));
        Self { root, descendants }
    }
}

fn section_styles(background: &str, centered: bool) -> Styles {
    let styles = Styles::new()
        .with(StyleKey::BackgroundColor, background)
        .with(StyleKey::Padding, [60.0, 40.0, 60.0, 40.0])
        .with(StyleKey::Margin, [0.0, 0.0, 20.0, 0.0]);
    if centered {
        styles.with(StyleKey::TextAlign, "center")
    } else {
        styles
    }
}

fn text(content: &str, size: f64, weight: Option<f64>, color: &str, centered: bool, margin: [f64; 4]) -> Node {
    let mut styles = Styles::new()
        .with(StyleKey::FontSize, size)
        .with(StyleKey::Color, color)
        .with(StyleKey::Margin, margin);
    if let Some(weight) = weight {
        styles.set(StyleKey::FontWeight, weight);
    }
    if centered {
        styles.set(StyleKey::TextAlign, "center");
    }
    Node::new(generate_id(), NodeKind::Text)
        .with_content(content)
        .with_styles(styles)
}

fn button(label: &str) -> Node {
    Node::new(generate_id(), NodeKind::Button)
        .with_content(label)
        .with_href("#")
        .with_styles(
            Styles::new()
                .with(StyleKey::BackgroundColor, "#3b82f6")
                .with(StyleKey::Color, "#ffffff")
                .with(StyleKey::FontSize, 18.0)
                .with(StyleKey::Padding, [16.0, 32.0, 16.0, 32.0])
                .with(StyleKey::BorderRadius, 8.0),
        )
}
