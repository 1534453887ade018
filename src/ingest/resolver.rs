//! Symbol resolution for one PHP translation unit.
//!
//! Scope is layered and passed explicitly down the tree walk:
//!
//! ```text
//! FileScope    namespace + `use` aliases      (reset per namespace)
//!   ClassScope   class FQN, parent, field types
//!     MethodScope  local variable types        (seeded from fields)
//! ```
//!
//! A variable whose type cannot be inferred is [`InferredType::Unknown`];
//! calls on it produce no edge.

use std::collections::HashMap;

/// Namespace separator in PHP names.
pub const NS_SEPARATOR: char = '\\';

/// Best-guess static type of a variable or field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferredType {
    /// Fully-qualified class name
    Known(String),
    Unknown,
}

impl InferredType {
    pub fn known(&self) -> Option<&str> {
        match self {
            InferredType::Known(fqn) => Some(fqn),
            InferredType::Unknown => None,
        }
    }
}

/// Namespace and alias table of the translation unit being walked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileScope {
    namespace: String,
    aliases: HashMap<String, String>,
}

impl FileScope {
    /// Fresh scope for a namespace declaration. Aliases never carry over
    /// from a previous namespace.
    pub fn for_namespace(namespace: &str) -> Self {
        Self {
            namespace: namespace.trim_matches(NS_SEPARATOR).to_string(),
            aliases: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Register `use Path\To\Type [as Alias]`.
    pub fn add_use(&mut self, path: &str, alias: Option<&str>) {
        let path = path.trim().trim_start_matches(NS_SEPARATOR);
        if path.is_empty() {
            return;
        }
        let alias = match alias {
            Some(alias) => alias.trim().to_string(),
            None => path.rsplit(NS_SEPARATOR).next().unwrap_or(path).to_string(),
        };
        self.aliases.insert(alias, path.to_string());
    }

    pub fn alias(&self, short: &str) -> Option<&str> {
        self.aliases.get(short).map(String::as_str)
    }

    /// Resolve a class name as written in source to its best-guess FQN.
    ///
    /// 1. leading `\` → already fully qualified
    ///    (`namespace\X` → current namespace + `X`)
    /// 2. first segment is an alias → alias target + remaining segments
    /// 3. contains `\` → used as written
    /// 4. otherwise → prefixed with the current namespace
    pub fn resolve(&self, name: &str) -> String {
        let name = name.trim();
        if let Some(stripped) = name.strip_prefix(NS_SEPARATOR) {
            return stripped.to_string();
        }
        if let Some(relative) = strip_namespace_keyword(name) {
            return self.qualify(relative);
        }

        let (head, rest) = match name.split_once(NS_SEPARATOR) {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };
        if let Some(target) = self.aliases.get(head) {
            return match rest {
                Some(rest) => format!("{}{}{}", target, NS_SEPARATOR, rest),
                None => target.clone(),
            };
        }

        if rest.is_some() {
            return name.to_string();
        }
        self.qualify(name)
    }

    /// FQN of a type declared in this scope.
    pub fn qualify(&self, short: &str) -> String {
        if self.namespace.is_empty() {
            short.to_string()
        } else {
            format!("{}{}{}", self.namespace, NS_SEPARATOR, short)
        }
    }
}

/// State of the class-like declaration being walked.
#[derive(Debug, Clone)]
pub struct ClassScope<'f> {
    file: &'f FileScope,
    fqn: String,
    parent: Option<String>,
    fields: HashMap<String, String>,
}

impl<'f> ClassScope<'f> {
    pub fn new(file: &'f FileScope, fqn: String, parent: Option<String>) -> Self {
        Self {
            file,
            fqn,
            parent,
            fields: HashMap::new(),
        }
    }

    pub fn fqn(&self) -> &str {
        &self.fqn
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Record a field with its declared class type as written in source.
    pub fn add_field(&mut self, name: &str, declared_type: &str) {
        if let Some(fqn) = self.resolve_class(declared_type) {
            self.fields.insert(normalize_variable(name).to_string(), fqn);
        }
    }

    pub fn field_type(&self, name: &str) -> InferredType {
        match self.fields.get(normalize_variable(name)) {
            Some(fqn) => InferredType::Known(fqn.clone()),
            None => InferredType::Unknown,
        }
    }

    /// Resolve a class reference, honouring `self`, `static` and `parent`.
    ///
    /// Returns `None` for `parent` in a class without an `extends` clause.
    pub fn resolve_class(&self, name: &str) -> Option<String> {
        match name.trim().to_ascii_lowercase().as_str() {
            "self" | "static" => Some(self.fqn.clone()),
            "parent" => self.parent.clone(),
            "" => None,
            _ => Some(self.file.resolve(name)),
        }
    }
}

/// Local variable types for the method being walked.
///
/// `$this->name` and `$name` share one lookup key (`name`), and the table
/// starts as a copy of the class field types.
#[derive(Debug, Clone)]
pub struct MethodScope<'c> {
    class: &'c ClassScope<'c>,
    locals: HashMap<String, String>,
}

impl<'c> MethodScope<'c> {
    pub fn new(class: &'c ClassScope<'c>) -> Self {
        Self {
            class,
            locals: class.fields.clone(),
        }
    }

    pub fn class(&self) -> &ClassScope<'c> {
        self.class
    }

    /// Type of `$name` or `$this->name`. `$this` is the enclosing class.
    pub fn type_of(&self, name: &str) -> InferredType {
        let key = normalize_variable(name);
        if key == "this" {
            return InferredType::Known(self.class.fqn.clone());
        }
        match self.locals.get(key) {
            Some(fqn) => InferredType::Known(fqn.clone()),
            None => InferredType::Unknown,
        }
    }

    /// Record an assignment. Assigning something of unknown type forgets
    /// any earlier inference for that name.
    pub fn assign(&mut self, name: &str, inferred: InferredType) {
        let key = normalize_variable(name);
        if key == "this" {
            return;
        }
        match inferred {
            InferredType::Known(fqn) => {
                self.locals.insert(key.to_string(), fqn);
            }
            InferredType::Unknown => {
                self.locals.remove(key);
            }
        }
    }

    pub fn resolve_class(&self, name: &str) -> Option<String> {
        self.class.resolve_class(name)
    }

    /// Scope for a `function () use ($a, &$b) { ... }` body: field types plus
    /// the captured variables, nothing else from the enclosing method.
    pub fn closure(&self, captured: &[&str]) -> MethodScope<'c> {
        let mut inner = MethodScope::new(self.class);
        for name in captured {
            inner.assign(name, self.type_of(name));
        }
        inner
    }

    /// Copy back the by-reference captures of a finished closure.
    pub fn adopt(&mut self, inner: &MethodScope<'_>, by_ref: &[&str]) {
        for name in by_ref {
            self.assign(name, inner.type_of(name));
        }
    }
}

/// `namespace\Sub\B` → `Sub\B`; the keyword is case-insensitive.
fn strip_namespace_keyword(name: &str) -> Option<&str> {
    let (head, rest) = name.split_once(NS_SEPARATOR)?;
    head.eq_ignore_ascii_case("namespace")
        .then(|| rest.trim_start_matches(NS_SEPARATOR))
}

/// `$name` → `name`
pub fn normalize_variable(name: &str) -> &str {
    name.trim().trim_start_matches('$')
}
