//! PHP call extraction using tree-sitter-php.
//!
//! Walks one syntax tree and produces the classes, methods and call edges
//! declared in that translation unit. Resolution state travels down the walk
//! as explicit [`FileScope`] / [`ClassScope`] / [`MethodScope`] values.

use std::path::Path;
use tree_sitter::Node;

use crate::common::node_text;
use crate::graph::{CallEdge, CallKind, CallTarget, MethodKey, Visibility};
use crate::ingest::resolver::{ClassScope, FileScope, InferredType, MethodScope};
use crate::ingest::FileFacts;

/// Name of the PHP constructor method.
pub const CONSTRUCTOR: &str = "__construct";

/// Declarations that open a class scope.
const CLASS_LIKE: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "trait_declaration",
    "enum_declaration",
];

/// Node kinds that name a class in `new X`, `X::m()` and type positions.
const CLASS_NAME_KINDS: &[&str] = &["name", "qualified_name", "relative_name", "relative_scope"];

/// Extracts declarations and call edges from one PHP syntax tree.
///
/// Pure: input (path, source, tree) → output [`FileFacts`]. No filesystem
/// access.
pub struct PhpCallExtractor<'s> {
    source: &'s [u8],
    facts: FileFacts,
}

impl<'s> PhpCallExtractor<'s> {
    pub fn new(path: &Path, source: &'s [u8]) -> Self {
        Self {
            source,
            facts: FileFacts::new(path.to_path_buf()),
        }
    }

    /// Walk the whole tree rooted at `root` and return the collected facts.
    pub fn extract(mut self, root: Node<'_>) -> FileFacts {
        let mut file = FileScope::default();
        self.walk_declarations(root, &mut file);
        self.facts
    }

    fn text(&self, node: Node<'_>) -> Option<&'s str> {
        node_text(&node, self.source)
    }

    /// Top-level walk: namespaces, `use` imports and class-like declarations.
    /// Statement-form namespaces replace `file` for the following siblings;
    /// braced namespaces get their own scope.
    fn walk_declarations(&mut self, node: Node<'_>, file: &mut FileScope) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "namespace_definition" => {
                    let name = child
                        .child_by_field_name("name")
                        .and_then(|n| self.text(n))
                        .unwrap_or("");
                    let mut scope = FileScope::for_namespace(name);
                    match child.child_by_field_name("body") {
                        Some(body) => self.walk_declarations(body, &mut scope),
                        None => *file = scope,
                    }
                }
                "namespace_use_declaration" => self.collect_use(child, file),
                kind if CLASS_LIKE.contains(&kind) => self.walk_class(child, file),
                "function_definition" => {}
                _ => self.walk_declarations(child, file),
            }
        }
    }

    /// `use A\B;`, `use A\B as C;`, `use A\{B, C as D};`
    ///
    /// `use function` and `use const` imports never name a class and are
    /// left out of the alias table.
    fn collect_use(&self, node: Node<'_>, file: &mut FileScope) {
        if !self.imports_classes(node) {
            return;
        }
        let mut prefix: Option<&str> = None;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "namespace_name" | "namespace_name_as_prefix" => {
                    prefix = self.text(child).map(|p| p.trim_end_matches('\\'));
                }
                "namespace_use_clause" => self.collect_use_clause(child, None, file),
                "namespace_use_group" => {
                    let mut group_cursor = child.walk();
                    for clause in child.children(&mut group_cursor) {
                        if matches!(
                            clause.kind(),
                            "namespace_use_clause" | "namespace_use_group_clause"
                        ) && self.imports_classes(clause)
                        {
                            self.collect_use_clause(clause, prefix, file);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn imports_classes(&self, node: Node<'_>) -> bool {
        if let Some(kind) = node.child_by_field_name("type").and_then(|t| self.text(t)) {
            return !is_function_or_const(kind);
        }
        let mut cursor = node.walk();
        let found = node.children(&mut cursor).any(|c| is_function_or_const(c.kind()));
        !found
    }

    fn collect_use_clause(&self, clause: Node<'_>, prefix: Option<&str>, file: &mut FileScope) {
        let alias_node = clause.child_by_field_name("alias").or_else(|| {
            let mut cursor = clause.walk();
            let aliasing = clause
                .children(&mut cursor)
                .find(|c| c.kind() == "namespace_aliasing_clause")?;
            let mut inner = aliasing.walk();
            let name = aliasing.children(&mut inner).find(|c| c.kind() == "name");
            name
        });
        let alias_id = alias_node.map(|n| n.id());

        let mut cursor = clause.walk();
        let path_node = clause.children(&mut cursor).find(|c| {
            matches!(c.kind(), "name" | "qualified_name" | "namespace_name") && Some(c.id()) != alias_id
        });
        let Some(path) = path_node.and_then(|n| self.text(n)) else {
            return;
        };

        let full = match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{}\\{}", prefix, path.trim_start_matches('\\')),
            _ => path.to_string(),
        };
        let alias = alias_node.and_then(|n| self.text(n));
        file.add_use(&full, alias);
    }

    fn walk_class(&mut self, node: Node<'_>, file: &FileScope) {
        let Some(name) = node.child_by_field_name("name").and_then(|n| self.text(n)) else {
            return;
        };
        let fqn = file.qualify(name);
        self.facts.classes.push(fqn.clone());

        let parent = self.base_class(node).map(|p| file.resolve(p));
        let mut class = ClassScope::new(file, fqn, parent);

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };

        // Fields first: a method may use a property declared below it.
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "property_declaration" => self.collect_properties(member, &mut class),
                "method_declaration" if self.is_constructor(member) => {
                    self.collect_promoted_parameters(member, &mut class)
                }
                _ => {}
            }
        }

        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if member.kind() == "method_declaration" {
                self.walk_method(member, &class);
            }
        }
    }

    fn base_class(&self, class: Node<'_>) -> Option<&'s str> {
        let mut cursor = class.walk();
        let base = class.children(&mut cursor).find(|c| c.kind() == "base_clause")?;
        let mut inner = base.walk();
        let name = base
            .children(&mut inner)
            .find(|c| matches!(c.kind(), "name" | "qualified_name" | "relative_name"))?;
        self.text(name)
    }

    fn is_constructor(&self, method: Node<'_>) -> bool {
        method
            .child_by_field_name("name")
            .and_then(|n| self.text(n))
            .is_some_and(|name| name.eq_ignore_ascii_case(CONSTRUCTOR))
    }

    /// `private B $b;`, `protected ?B $x, $y;`
    fn collect_properties(&self, declaration: Node<'_>, class: &mut ClassScope<'_>) {
        let Some(declared) = self.declared_class_type(declaration) else {
            return;
        };
        let mut cursor = declaration.walk();
        for element in declaration.children(&mut cursor) {
            if element.kind() != "property_element" {
                continue;
            }
            if let Some(var) = self.variable_in(element) {
                class.add_field(var, declared);
            }
        }
    }

    /// `public function __construct(private B $b)`
    fn collect_promoted_parameters(&self, constructor: Node<'_>, class: &mut ClassScope<'_>) {
        let Some(params) = constructor.child_by_field_name("parameters") else {
            return;
        };
        let mut cursor = params.walk();
        for param in params.children(&mut cursor) {
            if param.kind() != "property_promotion_parameter" || !has_child(param, "visibility_modifier") {
                continue;
            }
            let Some(declared) = self.declared_class_type(param) else {
                continue;
            };
            let var = param
                .child_by_field_name("name")
                .and_then(|n| self.text(n))
                .or_else(|| self.variable_in(param));
            if let Some(var) = var {
                class.add_field(var, declared);
            }
        }
    }

    fn variable_in(&self, node: Node<'_>) -> Option<&'s str> {
        if let Some(name) = node.child_by_field_name("name") {
            if name.kind() == "variable_name" {
                return self.text(name);
            }
        }
        let mut cursor = node.walk();
        let var = node.children(&mut cursor).find(|c| c.kind() == "variable_name")?;
        self.text(var)
    }

    /// The single class type of a declaration's `type`, if there is one.
    ///
    /// `B`, `?B` and `B|null` yield `B`; primitives and multi-class unions
    /// yield nothing.
    fn declared_class_type(&self, declaration: Node<'_>) -> Option<&'s str> {
        let type_node = declaration.child_by_field_name("type").or_else(|| {
            let mut cursor = declaration.walk();
            let found = declaration.children(&mut cursor).find(|c| is_type_kind(c.kind()));
            found
        })?;
        let mut named = Vec::new();
        collect_named_types(type_node, &mut named);
        match named.as_slice() {
            [single] => self.text(*single),
            _ => None,
        }
    }

    fn walk_method(&mut self, node: Node<'_>, class: &ClassScope<'_>) {
        let Some(name) = node.child_by_field_name("name").and_then(|n| self.text(n)) else {
            return;
        };
        let key = MethodKey::new(class.fqn(), name);
        let visibility = self.visibility_of(node);
        self.facts.methods.push((key.clone(), visibility));

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let mut scope = MethodScope::new(class);
        self.walk_body(body, &key, &mut scope);
    }

    fn visibility_of(&self, method: Node<'_>) -> Visibility {
        let mut cursor = method.walk();
        let modifier = method
            .children(&mut cursor)
            .find(|c| c.kind() == "visibility_modifier");
        modifier
            .and_then(|m| self.text(m))
            .and_then(Visibility::from_modifier)
            .unwrap_or_default()
    }

    fn walk_children(&mut self, node: Node<'_>, method: &MethodKey, scope: &mut MethodScope<'_>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk_body(child, method, scope);
        }
    }

    /// Walk a method body. Children of a call are walked before the call
    /// is recorded so edges come out in evaluation order.
    fn walk_body(&mut self, node: Node<'_>, method: &MethodKey, scope: &mut MethodScope<'_>) {
        match node.kind() {
            "assignment_expression" => {
                self.walk_children(node, method, scope);
                let (Some(left), Some(right)) = (
                    node.child_by_field_name("left"),
                    node.child_by_field_name("right"),
                ) else {
                    return;
                };
                if let Some(var) = self.assignable_name(left) {
                    let inferred = match self.created_class(right, scope) {
                        Some(fqn) => InferredType::Known(fqn),
                        None => InferredType::Unknown,
                    };
                    scope.assign(var, inferred);
                }
            }
            "object_creation_expression" => {
                if is_anonymous_class(node) {
                    if let Some(arguments) = anonymous_class_arguments(node) {
                        self.walk_children(arguments, method, scope);
                    }
                    return;
                }
                self.walk_children(node, method, scope);
                if let Some(fqn) = self.created_class(node, scope) {
                    self.push_call(
                        method,
                        CallTarget::Method(MethodKey::new(fqn, CONSTRUCTOR)),
                        CallKind::Constructor,
                    );
                }
            }
            "member_call_expression" | "nullsafe_member_call_expression" => {
                self.walk_children(node, method, scope);
                let Some(name) = self.call_name(node) else {
                    return;
                };
                let receiver = node
                    .child_by_field_name("object")
                    .map(|object| self.receiver_type(object, scope))
                    .unwrap_or(InferredType::Unknown);
                if let InferredType::Known(class) = receiver {
                    self.push_call(
                        method,
                        CallTarget::Method(MethodKey::new(class, name)),
                        CallKind::Instance,
                    );
                }
            }
            "scoped_call_expression" => {
                self.walk_children(node, method, scope);
                let Some(name) = self.call_name(node) else {
                    return;
                };
                let class = node
                    .child_by_field_name("scope")
                    .filter(|s| CLASS_NAME_KINDS.contains(&s.kind()))
                    .and_then(|s| self.text(s))
                    .and_then(|s| scope.resolve_class(s));
                if let Some(class) = class {
                    self.push_call(
                        method,
                        CallTarget::Method(MethodKey::new(class, name)),
                        CallKind::Static,
                    );
                }
            }
            "function_call_expression" => {
                self.walk_children(node, method, scope);
                let function = node
                    .child_by_field_name("function")
                    .filter(|f| matches!(f.kind(), "name" | "qualified_name"))
                    .and_then(|f| self.text(f));
                if let Some(function) = function {
                    self.push_call(
                        method,
                        CallTarget::Unresolved(function.trim_start_matches('\\').to_string()),
                        CallKind::Function,
                    );
                }
            }
            "anonymous_function" | "anonymous_function_creation_expression" => {
                self.walk_closure(node, method, scope)
            }
            "arrow_function" => {
                let mut inner = scope.clone();
                self.bind_parameters(node, &mut inner);
                if let Some(body) = node.child_by_field_name("body") {
                    self.walk_body(body, method, &mut inner);
                }
            }
            _ => self.walk_children(node, method, scope),
        }
    }

    /// Closure bodies see only field types and their `use` captures. Calls
    /// inside still belong to `method`; only `&$x` captures flow back out.
    fn walk_closure(&mut self, node: Node<'_>, method: &MethodKey, scope: &mut MethodScope<'_>) {
        let (captured, by_ref) = self.closure_captures(node);
        let mut inner = scope.closure(&captured);
        self.bind_parameters(node, &mut inner);
        if let Some(body) = node.child_by_field_name("body") {
            self.walk_body(body, method, &mut inner);
        }
        scope.adopt(&inner, &by_ref);
    }

    /// Variables listed in `use (...)`, and the subset captured by reference.
    fn closure_captures(&self, closure: Node<'_>) -> (Vec<&'s str>, Vec<&'s str>) {
        let mut captured = Vec::new();
        let mut by_ref = Vec::new();
        let mut cursor = closure.walk();
        let Some(clause) = closure
            .children(&mut cursor)
            .find(|c| c.kind() == "anonymous_function_use_clause")
        else {
            return (captured, by_ref);
        };

        let mut reference = false;
        let mut cursor = clause.walk();
        for child in clause.children(&mut cursor) {
            match child.kind() {
                "&" | "reference_modifier" => reference = true,
                "variable_name" => {
                    if let Some(var) = self.text(child) {
                        captured.push(var);
                        if reference {
                            by_ref.push(var);
                        }
                    }
                    reference = false;
                }
                "by_ref" => {
                    if let Some(var) = self.variable_in(child) {
                        captured.push(var);
                        by_ref.push(var);
                    }
                    reference = false;
                }
                _ => {}
            }
        }
        (captured, by_ref)
    }

    /// Parameters shadow outer variables: a declared class type is known,
    /// anything else is not.
    fn bind_parameters(&self, function: Node<'_>, scope: &mut MethodScope<'_>) {
        let Some(params) = function.child_by_field_name("parameters") else {
            return;
        };
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            let Some(var) = self.variable_in(param) else {
                continue;
            };
            let inferred = self
                .declared_class_type(param)
                .and_then(|declared| scope.resolve_class(declared))
                .map_or(InferredType::Unknown, InferredType::Known);
            scope.assign(var, inferred);
        }
    }

    fn push_call(&mut self, method: &MethodKey, target: CallTarget, kind: CallKind) {
        self.facts
            .calls
            .push(CallEdge::new(method.clone(), target, kind));
    }

    /// Static method name of a call; dynamic names (`$obj->$m()`) yield `None`.
    fn call_name(&self, call: Node<'_>) -> Option<&'s str> {
        call.child_by_field_name("name")
            .filter(|n| n.kind() == "name")
            .and_then(|n| self.text(n))
    }

    /// Lookup key for `$var` or `$this->field`.
    fn assignable_name(&self, node: Node<'_>) -> Option<&'s str> {
        match node.kind() {
            "variable_name" => self.text(node),
            "member_access_expression" | "nullsafe_member_access_expression" => {
                let object = node.child_by_field_name("object")?;
                if object.kind() != "variable_name" || self.text(object)? != "$this" {
                    return None;
                }
                node.child_by_field_name("name")
                    .filter(|n| n.kind() == "name")
                    .and_then(|n| self.text(n))
            }
            _ => None,
        }
    }

    fn receiver_type(&self, object: Node<'_>, scope: &MethodScope<'_>) -> InferredType {
        let object = unwrap_parens(object);
        if object.kind() == "object_creation_expression" {
            return match self.created_class(object, scope) {
                Some(fqn) => InferredType::Known(fqn),
                None => InferredType::Unknown,
            };
        }
        match self.assignable_name(object) {
            Some(name) => scope.type_of(name),
            None => InferredType::Unknown,
        }
    }

    /// Class instantiated by `new X(...)`, resolved. Dynamic and anonymous
    /// instantiations yield `None`.
    fn created_class(&self, node: Node<'_>, scope: &MethodScope<'_>) -> Option<String> {
        let node = unwrap_parens(node);
        if node.kind() != "object_creation_expression" || is_anonymous_class(node) {
            return None;
        }
        let mut cursor = node.walk();
        let class = node
            .children(&mut cursor)
            .find(|c| CLASS_NAME_KINDS.contains(&c.kind()))?;
        scope.resolve_class(self.text(class)?)
    }
}

fn has_child(node: Node<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}

fn is_anonymous_class(creation: Node<'_>) -> bool {
    has_child(creation, "anonymous_class") || has_child(creation, "declaration_list")
}

/// `new class(...)` keeps its arguments either directly on the creation
/// expression or on a nested `anonymous_class` node.
fn anonymous_class_arguments(creation: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = creation.walk();
    let holder = creation
        .children(&mut cursor)
        .find(|c| c.kind() == "anonymous_class")
        .unwrap_or(creation);
    let mut inner = holder.walk();
    let arguments = holder.children(&mut inner).find(|c| c.kind() == "arguments");
    arguments
}

fn is_function_or_const(kind: &str) -> bool {
    kind.eq_ignore_ascii_case("function") || kind.eq_ignore_ascii_case("const")
}

fn unwrap_parens(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn is_type_kind(kind: &str) -> bool {
    matches!(
        kind,
        "named_type"
            | "optional_type"
            | "union_type"
            | "intersection_type"
            | "disjunctive_normal_form_type"
            | "primitive_type"
            | "type_list"
    )
}

fn collect_named_types<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    match node.kind() {
        "named_type" | "name" | "qualified_name" | "relative_name" => out.push(node),
        "primitive_type" => {}
        _ => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_named_types(child, out);
            }
        }
    }
}
