//! Project descriptor (`pom.xml`) parsing.
//!
//! The harness only needs a generic key-value view of the fixture project after
//! the build ran: coordinates, properties, modules, and a flattened map of every
//! simple element so tests can query values like `build.finalName` without a
//! full Maven model.

use crate::error::{ItfError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;

/// File name of the project descriptor inside a project directory.
pub const POM_FILE: &str = "pom.xml";

/// Coordinates of the parent project, when declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentCoordinates {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
}

/// Generic project model read from `pom.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectModel {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub name: Option<String>,
    pub parent: Option<ParentCoordinates>,
    pub properties: BTreeMap<String, String>,
    pub modules: Vec<String>,
    /// Every element with text content, keyed by its dotted path below
    /// `<project>`. Repeated siblings are indexed: `dependencies.dependency[1].artifactId`.
    pub values: BTreeMap<String, String>,
}

impl ProjectModel {
    /// Look up a flattened value by dotted path.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Group id, inherited from the parent when not declared.
    #[must_use]
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref()?.group_id.as_deref())
    }

    /// Version, inherited from the parent when not declared.
    #[must_use]
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref()?.version.as_deref())
    }

    /// Packaging, defaulting to `jar`.
    #[must_use]
    pub fn effective_packaging(&self) -> &str {
        self.packaging.as_deref().unwrap_or("jar")
    }
}

/// Reads a project model from a project directory.
pub trait ProjectModelParser: Send + Sync + Debug {
    /// # Errors
    ///
    /// Returns [`ItfError::ProjectModel`] if the descriptor is missing or malformed.
    fn parse(&self, project_dir: &Path) -> Result<ProjectModel>;
}

/// Parser for `pom.xml` descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct PomParser;

impl ProjectModelParser for PomParser {
    fn parse(&self, project_dir: &Path) -> Result<ProjectModel> {
        read_project(project_dir)
    }
}

/// Read `<project_dir>/pom.xml`.
///
/// # Errors
///
/// Returns [`ItfError::ProjectModel`] if the file cannot be read or parsed.
pub fn read_project(project_dir: &Path) -> Result<ProjectModel> {
    let path = project_dir.join(POM_FILE);
    let contents = std::fs::read_to_string(&path).map_err(|source| ItfError::ProjectModel {
        path: path.clone(),
        reason: source.to_string(),
    })?;
    parse_pom_str(&contents).map_err(|reason| ItfError::ProjectModel { path, reason })
}

/// Parse descriptor text.
///
/// # Errors
///
/// Returns a description of the problem when the XML is malformed or the root
/// element is not `<project>`.
pub fn parse_pom_str(contents: &str) -> std::result::Result<ProjectModel, String> {
    let doc = roxmltree::Document::parse(contents).map_err(|err| err.to_string())?;
    let project = doc.root_element();
    if project.tag_name().name() != "project" {
        return Err(format!(
            "expected <project> root element, found <{}>",
            project.tag_name().name()
        ));
    }

    let mut model = ProjectModel {
        group_id: child_text(&project, "groupId"),
        artifact_id: child_text(&project, "artifactId"),
        version: child_text(&project, "version"),
        packaging: child_text(&project, "packaging"),
        name: child_text(&project, "name"),
        ..ProjectModel::default()
    };

    if let Some(parent) = child_element(&project, "parent") {
        model.parent = Some(ParentCoordinates {
            group_id: child_text(&parent, "groupId"),
            artifact_id: child_text(&parent, "artifactId"),
            version: child_text(&parent, "version"),
        });
    }

    if let Some(props) = child_element(&project, "properties") {
        for child in props.children().filter(roxmltree::Node::is_element) {
            if let Some(value) = child.text().map(str::trim).filter(|t| !t.is_empty()) {
                model
                    .properties
                    .insert(child.tag_name().name().to_string(), value.to_string());
            }
        }
    }

    if let Some(modules) = child_element(&project, "modules") {
        model.modules = modules
            .children()
            .filter(|n| n.is_element() && n.has_tag_name("module"))
            .filter_map(|n| n.text())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }

    flatten(&project, "", &mut model.values);
    Ok(model)
}

fn flatten(node: &roxmltree::Node<'_, '_>, prefix: &str, out: &mut BTreeMap<String, String>) {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for child in node.children().filter(roxmltree::Node::is_element) {
        let name = child.tag_name().name();
        let repeated = node
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == name)
            .count()
            > 1;
        let index = seen.entry(name).or_insert(0);
        let segment = if repeated {
            format!("{name}[{index}]")
        } else {
            name.to_string()
        };
        *index += 1;

        let key = if prefix.is_empty() {
            segment
        } else {
            format!("{prefix}.{segment}")
        };

        if child.children().any(|n| n.is_element()) {
            flatten(&child, &key, out);
        } else if let Some(text) = child.text().map(str::trim).filter(|t| !t.is_empty()) {
            out.insert(key, text.to_string());
        }
    }
}

fn child_element<'a, 'i>(
    node: &roxmltree::Node<'a, 'i>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'i>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text(node: &roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    child_element(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
