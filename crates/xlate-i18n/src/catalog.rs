#![forbid(unsafe_code)]

//! In-memory resource catalog.
//!
//! Resources are stored per language and namespace as JSON trees, the
//! layout most translation tooling exports:
//!
//! ```json
//! { "en": { "common": { "foo": "bar", "menu": { "open": "Open {{file}}" } } } }
//! ```
//!
//! # Resolution
//!
//! 1. `"ns:path"` names its namespace when `ns` is a namespace the catalog
//!    knows; otherwise the namespace comes from the options, then from the
//!    configured default.
//! 2. The path is tried as a flat key first, then as a nested path.
//! 3. With a plural hint, `path_zero` (count 0), `path_one` (|count| = 1)
//!    and `path_other` are tried before the bare path.
//! 4. The options' language (or the active language) is searched before the
//!    configured fallback language.
//!
//! # Invariants
//!
//! - Interpolation never re-scans substituted text.
//! - A placeholder with no matching variable is left intact.
//! - Cloning is cheap: resources are shared until the next mutation.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{I18nConfig, MissingKeyPolicy};
use crate::engine::{Translate, TranslateOptions};
use crate::error::{I18nError, Result};

type Namespaces = BTreeMap<String, Value>;
type Resources = BTreeMap<String, Namespaces>;

/// A localization engine backed by in-memory JSON resources.
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    config: Rc<I18nConfig>,
    resources: Rc<Resources>,
    language: String,
}

impl Default for ResourceCatalog {
    fn default() -> Self {
        Self::new(I18nConfig::default())
    }
}

impl ResourceCatalog {
    #[must_use]
    pub fn new(config: I18nConfig) -> Self {
        let language = config.language.clone();
        Self {
            config: Rc::new(config),
            resources: Rc::new(Resources::new()),
            language,
        }
    }

    #[must_use]
    pub fn config(&self) -> &I18nConfig {
        &self.config
    }

    /// Active language.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// A catalog sharing these resources with a different active language.
    #[must_use]
    pub fn with_language(&self, language: impl Into<String>) -> Self {
        Self {
            config: Rc::clone(&self.config),
            resources: Rc::clone(&self.resources),
            language: language.into(),
        }
    }

    /// Add one string at `key` (split on the key separator).
    pub fn add_resource(&mut self, language: &str, namespace: &str, key: &str, value: impl Into<String>) {
        let separator = self.config.key_separator.clone();
        let segments: Vec<&str> = key.split(separator.as_str()).collect();
        let Some((leaf, parents)) = segments.split_last() else {
            return;
        };
        let mut node = Rc::make_mut(&mut self.resources)
            .entry(language.to_string())
            .or_default()
            .entry(namespace.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        for segment in parents {
            node = as_object(node)
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        as_object(node).insert((*leaf).to_string(), Value::String(value.into()));
    }

    /// Deep-merge a JSON object into `language`/`namespace`.
    pub fn add_bundle(&mut self, language: &str, namespace: &str, bundle: Value) -> Result<()> {
        if !bundle.is_object() {
            return Err(I18nError::Config(format!(
                "bundle for {language}/{namespace} must be a JSON object"
            )));
        }
        let slot = Rc::make_mut(&mut self.resources)
            .entry(language.to_string())
            .or_default()
            .entry(namespace.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        merge(slot, bundle);
        debug!(language, namespace, "resource bundle added");
        Ok(())
    }

    pub fn add_bundle_json(&mut self, language: &str, namespace: &str, json: &str) -> Result<()> {
        let bundle: Value = serde_json::from_str(json)?;
        self.add_bundle(language, namespace, bundle)
    }

    /// Load a whole `{ language: { namespace: { .. } } }` document.
    pub fn load_resources_json(&mut self, json: &str) -> Result<()> {
        let document: BTreeMap<String, BTreeMap<String, Value>> = serde_json::from_str(json)?;
        for (language, namespaces) in document {
            for (namespace, bundle) in namespaces {
                self.add_bundle(&language, &namespace, bundle)?;
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn languages(&self) -> Vec<&str> {
        self.resources.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn namespaces(&self, language: &str) -> Vec<&str> {
        self.resources
            .get(language)
            .map(|ns| ns.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_namespace(&self, language: &str, namespace: &str) -> bool {
        self.resources
            .get(language)
            .is_some_and(|ns| ns.contains_key(namespace))
    }

    fn knows_namespace(&self, namespace: &str) -> bool {
        self.resources.values().any(|ns| ns.contains_key(namespace))
    }

    fn split_namespace<'k>(&self, key: &'k str, options: &TranslateOptions) -> (String, &'k str) {
        if let Some((ns, path)) = key.split_once(self.config.namespace_separator.as_str())
            && !ns.is_empty()
            && self.knows_namespace(ns)
        {
            return (ns.to_string(), path);
        }
        let ns = options
            .ns
            .clone()
            .unwrap_or_else(|| self.config.default_namespace.clone());
        (ns, key)
    }

    fn language_chain<'a>(&'a self, options: &'a TranslateOptions) -> Vec<&'a str> {
        let mut chain = vec![options.language.as_deref().unwrap_or(&self.language)];
        if let Some(fallback) = self.config.fallback_language.as_deref()
            && !chain.contains(&fallback)
        {
            chain.push(fallback);
        }
        chain
    }

    fn lookup(&self, language: &str, namespace: &str, path: &str) -> Option<&Value> {
        let root = self.resources.get(language)?.get(namespace)?;
        if let Some(flat) = root.get(path) {
            return Some(flat);
        }
        path.split(self.config.key_separator.as_str())
            .try_fold(root, |node, segment| node.get(segment))
    }

    /// Substitute `{{name}}` placeholders from the options.
    #[must_use]
    pub fn interpolate(&self, template: &str, options: &TranslateOptions) -> String {
        let prefix = self.config.interpolation.prefix.as_str();
        let suffix = self.config.interpolation.suffix.as_str();
        let count = options.count.map(|c| c.to_string());

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find(prefix) {
            out.push_str(&rest[..start]);
            let after = &rest[start + prefix.len()..];
            let Some(end) = after.find(suffix) else {
                out.push_str(&rest[start..]);
                return out;
            };
            let name = after[..end].trim();
            let value = options
                .args
                .get(name)
                .map(String::as_str)
                .or_else(|| (name == "count").then_some(count.as_deref()).flatten());
            match value {
                Some(value) => out.push_str(value),
                None => out.push_str(&rest[start..start + prefix.len() + end + suffix.len()]),
            }
            rest = &after[end + suffix.len()..];
        }
        out.push_str(rest);
        out
    }
}

impl Translate for ResourceCatalog {
    fn translate(&self, key: &str, options: &TranslateOptions) -> Result<String> {
        let (namespace, path) = self.split_namespace(key, options);
        let candidates = plural_candidates(path, options.count);

        for language in self.language_chain(options) {
            for candidate in &candidates {
                match self.lookup(language, &namespace, candidate) {
                    Some(Value::String(text)) => return Ok(self.interpolate(text, options)),
                    Some(Value::Number(n)) => return Ok(n.to_string()),
                    Some(Value::Bool(b)) => return Ok(b.to_string()),
                    Some(Value::Object(_) | Value::Array(_)) => {
                        return Err(I18nError::NotAString {
                            namespace,
                            key: path.to_string(),
                        });
                    }
                    Some(Value::Null) | None => {}
                }
            }
        }

        debug!(namespace = %namespace, key = path, language = %self.language, "translation missing");
        if let Some(default) = options.default_value.as_deref() {
            return Ok(self.interpolate(default, options));
        }
        match self.config.missing_key {
            MissingKeyPolicy::ReturnKey => Ok(path.to_string()),
            MissingKeyPolicy::Error => Err(I18nError::MissingKey {
                namespace,
                key: path.to_string(),
            }),
        }
    }
}

fn plural_candidates(path: &str, count: Option<i64>) -> Vec<String> {
    let Some(count) = count else {
        return vec![path.to_string()];
    };
    let mut candidates = Vec::with_capacity(3);
    if count == 0 {
        candidates.push(format!("{path}_zero"));
    }
    let form = if count.unsigned_abs() == 1 { "one" } else { "other" };
    candidates.push(format!("{path}_{form}"));
    candidates.push(path.to_string());
    candidates
}

fn as_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced by an object"),
    }
}

fn merge(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
