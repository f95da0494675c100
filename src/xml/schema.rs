//! Schema gate for fes documents.
//!
//! A compiled schema is the set of element names an XSD file (and every
//! local file it includes or imports) declares, per target namespace. A
//! document passes when its root is a global declaration and every element
//! in a compiled namespace is declared somewhere in that namespace.
//!
//! This is a name check, not XSD validation. Content models, child order,
//! occurrence counts, attributes and simple types are not checked; the fes
//! parser rejects most structural problems on its own.
//!
//! Compiled schemas are cached for the life of the process, keyed by
//! canonical path. Each path is compiled at most once.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

use super::clark_name;
use crate::error::{FesError, Result};

/// Environment variable naming the default schema file.
pub const SCHEMA_PATH_ENV: &str = "FES_SCHEMA_PATH";

const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

static SCHEMA_CACHE: LazyLock<RwLock<HashMap<PathBuf, Arc<CompiledSchema>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

#[derive(Debug, Default)]
struct Declarations {
    global: HashSet<String>,
    all: HashSet<String>,
}

#[derive(Debug)]
pub struct CompiledSchema {
    path: PathBuf,
    // Keyed by target namespace; "" for schemas without one.
    namespaces: HashMap<String, Declarations>,
}

impl CompiledSchema {
    fn compile(path: &Path) -> Result<Self> {
        let mut schema = CompiledSchema {
            path: path.to_path_buf(),
            namespaces: HashMap::new(),
        };
        let mut visited = HashSet::new();
        schema.read_file(path, &mut visited)?;
        Ok(schema)
    }

    fn read_file(&mut self, path: &Path, visited: &mut HashSet<PathBuf>) -> Result<()> {
        if !visited.insert(path.to_path_buf()) {
            return Ok(());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| FesError::Config(format!("cannot read schema {}: {e}", path.display())))?;
        let doc = roxmltree::Document::parse(&text)
            .map_err(|e| FesError::Config(format!("cannot parse schema {}: {e}", path.display())))?;
        let root = doc.root_element();
        if root.tag_name().namespace() != Some(XSD_NAMESPACE) || root.tag_name().name() != "schema" {
            return Err(FesError::Config(format!(
                "{} is not an XML Schema (root is {})",
                path.display(),
                clark_name(root)
            )));
        }

        let target = root.attribute("targetNamespace").unwrap_or_default().to_string();
        let declarations = self.namespaces.entry(target).or_default();
        for element in root
            .descendants()
            .filter(|n| n.tag_name().namespace() == Some(XSD_NAMESPACE) && n.tag_name().name() == "element")
        {
            let Some(name) = element.attribute("name") else {
                continue;
            };
            if element.parent_element() == Some(root) {
                declarations.global.insert(name.to_string());
            }
            declarations.all.insert(name.to_string());
        }

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for reference in root.children().filter(|n| {
            n.tag_name().namespace() == Some(XSD_NAMESPACE)
                && matches!(n.tag_name().name(), "include" | "import")
        }) {
            match reference.attribute("schemaLocation") {
                Some(location) if !location.contains("://") => {
                    // Canonical, so `visited` sees through `..` detours.
                    let target = base.join(location);
                    let target = std::fs::canonicalize(&target).map_err(|e| {
                        FesError::Config(format!(
                            "schema {} referenced from {}: {e}",
                            target.display(),
                            path.display()
                        ))
                    })?;
                    self.read_file(&target, visited)?;
                }
                Some(location) => {
                    debug!(schema = %path.display(), %location, "skipping remote schema reference");
                }
                None => {}
            }
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn declares(&self, namespace: &str, name: &str) -> bool {
        self.namespaces
            .get(namespace)
            .is_some_and(|d| d.all.contains(name))
    }

    fn declares_global(&self, namespace: &str, name: &str) -> bool {
        self.namespaces
            .get(namespace)
            .is_some_and(|d| d.global.contains(name))
    }
}

/// Shared handle on a compiled schema.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: Arc<CompiledSchema>,
}

impl SchemaValidator {
    /// Compile `path`, or reuse the compiled schema if this process has
    /// already seen it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let key = std::fs::canonicalize(path)
            .map_err(|e| FesError::Config(format!("schema {}: {e}", path.display())))?;

        if let Some(schema) = SCHEMA_CACHE.read().get(&key) {
            debug!(schema = %key.display(), "schema served from cache");
            return Ok(Self {
                schema: Arc::clone(schema),
            });
        }

        let mut cache = SCHEMA_CACHE.write();
        // Another thread may have compiled it while we waited for the lock.
        if let Some(schema) = cache.get(&key) {
            return Ok(Self {
                schema: Arc::clone(schema),
            });
        }
        let schema = Arc::new(CompiledSchema::compile(&key)?);
        debug!(
            schema = %key.display(),
            namespaces = schema.namespaces.len(),
            "compiled schema"
        );
        cache.insert(key, Arc::clone(&schema));
        Ok(Self { schema })
    }

    /// Validator for the schema named by `FES_SCHEMA_PATH`, if it is set.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var_os(SCHEMA_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::load(PathBuf::from(path)).map(Some),
            _ => {
                warn!("{SCHEMA_PATH_ENV} is not set; no schema to validate against");
                Ok(None)
            }
        }
    }

    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    /// Check element names only; see the module docs for what is not checked.
    pub fn validate(&self, doc: &roxmltree::Document<'_>) -> Result<()> {
        let fail = |reason: String| FesError::SchemaValidation {
            schema: self.schema.path.display().to_string(),
            reason,
        };

        let root = doc.root_element();
        let root_ns = root.tag_name().namespace().unwrap_or_default();
        if !self.schema.declares_global(root_ns, root.tag_name().name()) {
            return Err(fail(format!(
                "root element {} is not declared",
                clark_name(root)
            )));
        }

        for element in root.descendants().filter(|n| n.is_element()) {
            let ns = element.tag_name().namespace().unwrap_or_default();
            if self.schema.namespaces.contains_key(ns)
                && !self.schema.declares(ns, element.tag_name().name())
            {
                return Err(fail(format!(
                    "element {} is not declared",
                    clark_name(element)
                )));
            }
        }
        Ok(())
    }

    pub fn validate_str(&self, xml: &str) -> Result<()> {
        let doc = roxmltree::Document::parse(xml).map_err(|e| FesError::SchemaValidation {
            schema: self.schema.path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.validate(&doc)
    }
}
