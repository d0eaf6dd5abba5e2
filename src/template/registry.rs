//! Template registry for storing and retrieving parsed templates

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{DocumentError, RegistryError};
use crate::template::document::load_document;
use crate::template::loader::{directory_category, find_documents, LoadFailure, LoadReport};
use crate::template::model::{Category, Template};
use crate::template::validate::validate;

/// Registry of templates keyed by [`Template::id`]
///
/// Constructed explicitly by whoever owns it. Re-registering an id replaces
/// the stored template.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
    /// Ids in registration order, most recent last
    order: Vec<String>,
}

impl TemplateRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a template, returning its id
    ///
    /// Errors about variable declarations are tolerated; any other
    /// validation error rejects the template.
    pub fn register(&mut self, template: Template) -> Result<String, RegistryError> {
        let id = template.id();
        let report = validate(&template);

        let reasons: Vec<String> = report
            .blocking_errors()
            .map(|issue| issue.message.clone())
            .collect();
        if !reasons.is_empty() {
            warn!(%id, reasons = ?reasons, "rejected template");
            return Err(RegistryError::Rejected { id, reasons });
        }
        if !report.valid {
            warn!(%id, errors = report.errors.len(), "registering template with variable errors");
        }

        self.order.retain(|existing| existing != &id);
        self.order.push(id.clone());
        if self.templates.insert(id.clone(), template).is_some() {
            debug!(%id, "replaced template");
        } else {
            debug!(%id, warnings = report.warnings.len(), "registered template");
        }
        Ok(id)
    }

    /// Get a template by id
    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    /// Most recently registered template with this name
    pub fn find_by_name(&self, name: &str) -> Option<&Template> {
        self.iter().rev().find(|template| template.name == name)
    }

    pub fn by_category(&self, category: Category) -> Vec<&Template> {
        self.iter()
            .filter(|template| template.category == category)
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Ids in registration order
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.order.iter().map(|id| id.as_str())
    }

    /// Templates in registration order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Template> {
        self.order.iter().filter_map(|id| self.templates.get(id))
    }

    pub fn remove(&mut self, id: &str) -> Option<Template> {
        self.order.retain(|existing| existing != id);
        self.templates.remove(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Parse and register every document under `dir` with the given extension
    ///
    /// Per-file failures are collected in the report and never stop the walk.
    /// A document left in the `custom` category takes its category from the
    /// directory it sits in, when that directory names one.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Io` if the directory tree cannot be read.
    pub fn load_dir(&mut self, dir: &Path, extension: &str) -> Result<LoadReport, DocumentError> {
        let mut report = LoadReport::default();
        for path in find_documents(dir, extension)? {
            let outcome = load_document(&path)
                .map(|mut template| {
                    if template.category == Category::Custom {
                        if let Some(category) = directory_category(&path) {
                            template.category = category;
                        }
                    }
                    template
                })
                .map_err(|e| e.to_string())
                .and_then(|template| self.register(template).map_err(|e| e.to_string()));
            match outcome {
                Ok(id) => report.registered.push(id),
                Err(reason) => {
                    warn!(path = %path.display(), %reason, "failed to load template");
                    report.failures.push(LoadFailure { path, reason });
                }
            }
        }
        debug!(
            dir = %dir.display(),
            registered = report.registered.len(),
            failed = report.failures.len(),
            "loaded template directory"
        );
        Ok(report)
    }
}
