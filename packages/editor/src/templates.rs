//! # Template Library
//!
//! Named seed trees for new pages. Built-in templates are bundled as JSON and
//! validated when the library is built; callers always receive a deep copy.

use serde::Serialize;

use crate::document::Document;
use crate::node::NodeMap;
use crate::EditorError;

/// Template used when an unknown id is requested
pub const DEFAULT_TEMPLATE: &str = "template1";

struct BuiltinTemplate {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    json: &'static str,
}

const BUILTIN: &[BuiltinTemplate] = &[
    BuiltinTemplate {
        id: "template1",
        name: "Modern Landing Page",
        description: "Hero, features and call-to-action sections",
        json: include_str!("../templates/template1.json"),
    },
    BuiltinTemplate {
        id: "template2",
        name: "SaaS Product Page",
        description: "Hero, stats, features, testimonial, pricing and CTA",
        json: include_str!("../templates/template2.json"),
    },
    BuiltinTemplate {
        id: "template3",
        name: "Portfolio / Agency",
        description: "Hero, about, services, portfolio and contact",
        json: include_str!("../templates/template3.json"),
    },
    BuiltinTemplate {
        id: "product-template",
        name: "Product Page",
        description: "Product hero, features, testimonial, pricing, FAQ and CTA",
        json: include_str!("../templates/product-template.json"),
    },
    BuiltinTemplate {
        id: "simple-landing-page",
        name: "Simple Landing Page",
        description: "Single offer with benefits and social proof",
        json: include_str!("../templates/simple-landing-page.json"),
    },
    BuiltinTemplate {
        id: "personal-portfolio",
        name: "Personal Portfolio",
        description: "Profile, about, projects, skills and contact",
        json: include_str!("../templates/personal-portfolio.json"),
    },
    BuiltinTemplate {
        id: "blank",
        name: "Blank Page",
        description: "Empty root container",
        json: include_str!("../templates/blank.json"),
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub node_count: usize,
}

#[derive(Debug, Clone)]
struct Template {
    info: TemplateInfo,
    nodes: NodeMap,
}

/// Registry of seed trees
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
    default_id: String,
}

impl TemplateLibrary {
    /// Empty library falling back to `default_id`
    pub fn new(default_id: impl Into<String>) -> Self {
        Self {
            templates: Vec::new(),
            default_id: default_id.into(),
        }
    }

    /// Library of the bundled templates
    pub fn builtin() -> Result<Self, EditorError> {
        let mut library = Self::new(DEFAULT_TEMPLATE);
        for template in BUILTIN {
            let nodes: NodeMap = serde_json::from_str(template.json).map_err(|e| {
                EditorError::Template(format!("{}: {}", template.id, e))
            })?;
            library.register(template.id, template.name, template.description, nodes)?;
        }
        Ok(library)
    }

    /// Add a template. The tree must be a strict tree under `root` with no
    /// dangling references and no orphans.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        nodes: NodeMap,
    ) -> Result<(), EditorError> {
        let id = id.into();

        for (key, node) in &nodes {
            if key != &node.id {
                return Err(EditorError::Template(format!(
                    "{}: entry {} holds node {}",
                    id, key, node.id
                )));
            }
        }

        let report = Document::from_nodes(nodes.clone())
            .map_err(|e| EditorError::Template(format!("{}: {}", id, e)))?
            .check_integrity();
        if !report.is_consistent() || report.has_orphans() {
            return Err(EditorError::Template(format!(
                "{}: inconsistent tree {:?}",
                id, report
            )));
        }

        let info = TemplateInfo {
            id: id.clone(),
            name: name.into(),
            description: description.into(),
            node_count: nodes.len(),
        };
        self.templates.retain(|t| t.info.id != id);
        self.templates.push(Template { info, nodes });
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Template id that `get(id)` will actually serve
    pub fn resolve_id<'a>(&'a self, id: &'a str) -> &'a str {
        if self.contains(id) {
            id
        } else {
            &self.default_id
        }
    }

    /// Deep copy of a template's node map. Unknown ids fall back to the
    /// default template; a library without it yields a bare root.
    pub fn get(&self, id: &str) -> NodeMap {
        match self.find(id).or_else(|| self.find(&self.default_id)) {
            Some(template) => template.nodes.clone(),
            None => Document::root_only().into_nodes(),
        }
    }

    pub fn list(&self) -> impl Iterator<Item = &TemplateInfo> {
        self.templates.iter().map(|t| &t.info)
    }

    fn find(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.info.id == id)
    }
}
