//! # Model Registry
//!
//! [`ModelManager`] owns every [`ClassDeclaration`] of one business network,
//! indexed by fully-qualified name and kept in registration order.
//!
//! ## Lifetime & Sharing
//!
//! A registry is built once (system declarations first, then the network's own
//! models) and is read-only afterwards. Instances and the factory hold it as an
//! `Arc<ModelManager>`; dropping the last handle tears the network down. There is
//! no process-wide registry.
//!
//! ## Registration
//!
//! [`ModelManager::add_class_declarations`] registers a batch atomically. The
//! batch is checked together with what is already registered; if any
//! declaration is illegal nothing from the batch is kept.

use crate::declaration::{
    system_declarations, ClassDeclaration, DeclarationKind, FieldDeclaration, FieldType,
    FieldValidator, PrimitiveType, SYSTEM_NAMESPACE,
};
use crate::error::{ModelError, Result};
use crate::populator::convert_primitive;
use crate::validator;
use crate::value::Value;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Registry of class declarations for one business network.
#[derive(Debug, Clone)]
pub struct ModelManager {
    declarations: Vec<ClassDeclaration>,
    index: HashMap<String, usize>,
    patterns: HashMap<String, Regex>,
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelManager {
    /// Creates a registry holding only the system declarations.
    pub fn new() -> Self {
        let mut manager = Self {
            declarations: Vec::new(),
            index: HashMap::new(),
            patterns: HashMap::new(),
        };
        for decl in system_declarations() {
            manager.insert(decl);
        }
        manager
    }

    /// Builds a registry from a JSON array of declarations.
    pub fn from_json(document: &str) -> Result<Self> {
        let mut manager = Self::new();
        manager.add_json(document)?;
        Ok(manager)
    }

    /// Registers the declarations in a JSON array.
    pub fn add_json(&mut self, document: &str) -> Result<()> {
        let decls: Vec<ClassDeclaration> = serde_json::from_str(document)
            .map_err(|e| ModelError::SerializationError(format!("invalid model document: {}", e)))?;
        self.add_class_declarations(decls)
    }

    pub fn add_class_declaration(&mut self, decl: ClassDeclaration) -> Result<()> {
        self.add_class_declarations([decl])
    }

    /// Registers a batch of declarations, all or nothing.
    pub fn add_class_declarations<I>(&mut self, decls: I) -> Result<()>
    where
        I: IntoIterator<Item = ClassDeclaration>,
    {
        let mut candidate = self.clone();
        let mut added = Vec::new();
        for decl in decls {
            let decl = with_implicit_super_type(decl);
            let fqn = decl.fully_qualified_name();
            if candidate.index.contains_key(&fqn) {
                warn!(type_name = %fqn, "Duplicate declaration");
                return Err(ModelError::illegal(fqn, "type is already declared"));
            }
            candidate.insert(decl);
            added.push(fqn);
        }

        for fqn in &added {
            candidate.check_structure(fqn)?;
        }
        for fqn in &added {
            candidate.compile_patterns(fqn)?;
            candidate.check_fields(fqn)?;
        }

        info!(added = added.len(), total = candidate.declarations.len(), "Registered declarations");
        *self = candidate;
        Ok(())
    }

    /// Resolves a declaration by fully-qualified name.
    pub fn get_class_declaration(&self, fqn: &str) -> Result<&ClassDeclaration> {
        self.lookup(fqn)
            .ok_or_else(|| ModelError::TypeNotFound(fqn.to_string()))
    }

    /// All declarations, in registration order.
    pub fn class_declarations(&self) -> &[ClassDeclaration] {
        &self.declarations
    }

    /// Distinct namespaces, in the order they were first registered.
    pub fn namespaces(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.declarations
            .iter()
            .map(|d| d.namespace.as_str())
            .filter(|ns| seen.insert(*ns))
            .collect()
    }

    /// The declaration followed by each of its ancestors.
    pub fn super_type_chain(&self, fqn: &str) -> Result<Vec<&ClassDeclaration>> {
        let mut current = self.get_class_declaration(fqn)?;
        let mut chain = vec![current];
        while let Some(super_type) = current.super_type.as_deref() {
            current = self.get_class_declaration(super_type)?;
            chain.push(current);
        }
        Ok(chain)
    }

    /// Whether `fqn` is `ancestor` or derives from it.
    pub fn is_subtype_of(&self, fqn: &str, ancestor: &str) -> bool {
        let mut current = self.lookup(fqn);
        while let Some(decl) = current {
            if decl.fully_qualified_name() == ancestor {
                return true;
            }
            current = decl.super_type.as_deref().and_then(|s| self.lookup(s));
        }
        false
    }

    /// Finds a field on the type or the nearest ancestor declaring it.
    pub fn find_field(&self, fqn: &str, field: &str) -> Option<&FieldDeclaration> {
        let mut current = self.lookup(fqn);
        while let Some(decl) = current {
            if let Some(found) = decl.own_field(field) {
                return Some(found);
            }
            current = decl.super_type.as_deref().and_then(|s| self.lookup(s));
        }
        None
    }

    /// Every field of the type, root supertype's fields first.
    pub fn all_fields(&self, fqn: &str) -> Vec<&FieldDeclaration> {
        let chain = self.super_type_chain(fqn).unwrap_or_default();
        chain.iter().rev().flat_map(|d| d.fields.iter()).collect()
    }

    /// Name of the identifying field, declared here or inherited.
    pub fn identifier_field(&self, fqn: &str) -> Option<&str> {
        let mut current = self.lookup(fqn);
        while let Some(decl) = current {
            if let Some(id) = decl.identified_by.as_deref() {
                return Some(id);
            }
            current = decl.super_type.as_deref().and_then(|s| self.lookup(s));
        }
        None
    }

    pub fn is_identifiable(&self, fqn: &str) -> bool {
        self.identifier_field(fqn).is_some()
    }

    /// Compiled form of a regex validator registered with some field.
    pub(crate) fn pattern(&self, pattern: &str) -> Option<&Regex> {
        self.patterns.get(pattern)
    }

    fn compile_patterns(&mut self, fqn: &str) -> Result<()> {
        let mut compiled = Vec::new();
        for field in &self.get_class_declaration(fqn)?.fields {
            if let Some(FieldValidator::Regex(pattern)) = &field.validator {
                if !self.patterns.contains_key(pattern) {
                    let regex = Regex::new(pattern).map_err(|e| {
                        ModelError::illegal(fqn, format!("invalid regex on {}: {}", field.name, e))
                    })?;
                    compiled.push((pattern.clone(), regex));
                }
            }
        }
        self.patterns.extend(compiled);
        Ok(())
    }

    fn lookup(&self, fqn: &str) -> Option<&ClassDeclaration> {
        self.index.get(fqn).map(|&idx| &self.declarations[idx])
    }

    fn insert(&mut self, decl: ClassDeclaration) {
        let fqn = decl.fully_qualified_name();
        debug!(type_name = %fqn, kind = %decl.kind, "Declaration added");
        self.index.insert(fqn, self.declarations.len());
        self.declarations.push(decl);
    }

    /// Names, enum shape, supertype resolution and cycles.
    fn check_structure(&self, fqn: &str) -> Result<()> {
        let decl = self.get_class_declaration(fqn)?;
        if decl.name.is_empty() || decl.name.contains('.') {
            return Err(ModelError::illegal(fqn, "invalid type name"));
        }

        if decl.is_enum() {
            if decl.super_type.is_some() || !decl.fields.is_empty() || decl.identified_by.is_some() {
                return Err(ModelError::illegal(fqn, "enums declare values only"));
            }
            if decl.enum_values.is_empty() {
                return Err(ModelError::illegal(fqn, "enum has no values"));
            }
            let mut seen = HashSet::new();
            if let Some(dup) = decl.enum_values.iter().find(|v| !seen.insert(v.as_str())) {
                return Err(ModelError::illegal(fqn, format!("duplicate enum value {}", dup)));
            }
            return Ok(());
        }
        if !decl.enum_values.is_empty() {
            return Err(ModelError::illegal(fqn, "only enums declare values"));
        }

        let mut visited = HashSet::from([fqn.to_string()]);
        let mut current = decl;
        while let Some(super_name) = current.super_type.as_deref() {
            let parent = self.lookup(super_name).ok_or_else(|| {
                ModelError::illegal(fqn, format!("supertype {} is not declared", super_name))
            })?;
            if parent.kind != current.kind {
                return Err(ModelError::illegal(
                    fqn,
                    format!("{} {} cannot extend {} {}", current.kind, current.name, parent.kind, super_name),
                ));
            }
            if !visited.insert(super_name.to_string()) {
                return Err(ModelError::illegal(fqn, "cyclic supertype chain"));
            }
            current = parent;
        }
        Ok(())
    }

    /// Field names, types, identifiers, validators and defaults. Assumes the
    /// supertype chains are acyclic.
    fn check_fields(&self, fqn: &str) -> Result<()> {
        let decl = self.get_class_declaration(fqn)?;
        if decl.is_enum() {
            return Ok(());
        }

        let mut names = HashSet::new();
        for field in self.all_fields(fqn) {
            if field.name.is_empty() || field.name.starts_with('$') {
                return Err(ModelError::illegal(fqn, format!("invalid field name '{}'", field.name)));
            }
            if !names.insert(field.name.as_str()) {
                return Err(ModelError::illegal(fqn, format!("field {} is declared more than once", field.name)));
            }
        }

        for field in &decl.fields {
            self.check_field_type(fqn, field)?;
            check_validator(fqn, field)?;
            self.check_default(fqn, field)?;
        }

        if let Some(id) = decl.identified_by.as_deref() {
            if let Some(inherited) = decl.super_type.as_deref().and_then(|s| self.identifier_field(s)) {
                return Err(ModelError::illegal(
                    fqn,
                    format!("identifier already inherited as {}", inherited),
                ));
            }
            let field = self
                .find_field(fqn, id)
                .ok_or_else(|| ModelError::illegal(fqn, format!("identifier field {} is not declared", id)))?;
            if field.field_type != FieldType::STRING || field.is_array || field.optional {
                return Err(ModelError::illegal(
                    fqn,
                    format!("identifier field {} must be a required String", id),
                ));
            }
        }

        if decl.kind == DeclarationKind::Concept && self.is_identifiable(fqn) {
            return Err(ModelError::illegal(fqn, "concepts cannot be identified"));
        }
        Ok(())
    }

    fn check_field_type(&self, fqn: &str, field: &FieldDeclaration) -> Result<()> {
        match &field.field_type {
            FieldType::Primitive(_) => Ok(()),
            FieldType::Class(target) => {
                self.lookup(target).map(|_| ()).ok_or_else(|| {
                    ModelError::illegal(fqn, format!("field {} references undeclared type {}", field.name, target))
                })
            }
            FieldType::Relationship(target) => {
                let target_decl = self.lookup(target).ok_or_else(|| {
                    ModelError::illegal(fqn, format!("field {} references undeclared type {}", field.name, target))
                })?;
                if target_decl.is_enum() || !self.is_identifiable(target) {
                    return Err(ModelError::illegal(
                        fqn,
                        format!("relationship {} must target an identified type, not {}", field.name, target),
                    ));
                }
                Ok(())
            }
        }
    }

    fn check_default(&self, fqn: &str, field: &FieldDeclaration) -> Result<()> {
        let Some(default) = &field.default_value else {
            return Ok(());
        };
        let illegal = |reason: String| {
            ModelError::illegal(
                fqn,
                format!("default value {} does not fit field {}: {}", default, field.name, reason),
            )
        };
        if field.is_array {
            return Err(illegal("array fields take no default".to_string()));
        }
        let value = match &field.field_type {
            FieldType::Primitive(primitive) => {
                convert_primitive(fqn, &field.name, *primitive, default).map_err(|e| illegal(e.to_string()))?
            }
            FieldType::Class(_) => match default.as_str() {
                Some(name) => Value::String(name.to_string()),
                None => return Err(illegal("expected an enum value name".to_string())),
            },
            FieldType::Relationship(_) => return Err(illegal("relationships take no default".to_string())),
        };
        let value = validator::coerce(field, value);
        validator::check_element(self, fqn, field, &value).map_err(|e| illegal(e.to_string()))
    }
}

fn check_validator(fqn: &str, field: &FieldDeclaration) -> Result<()> {
    match (&field.validator, &field.field_type) {
        (None, _) => Ok(()),
        (Some(FieldValidator::Regex(_)), FieldType::Primitive(PrimitiveType::String)) => Ok(()),
        (Some(FieldValidator::Range { lower, upper }), FieldType::Primitive(p)) if p.is_numeric() => {
            match (lower, upper) {
                (Some(lo), Some(hi)) if lo > hi => Err(ModelError::illegal(
                    fqn,
                    format!("range on {} has lower bound above upper bound", field.name),
                )),
                _ => Ok(()),
            }
        }
        (Some(_), other) => Err(ModelError::illegal(
            fqn,
            format!("validator not applicable to {} field {}", other, field.name),
        )),
    }
}

/// Transactions and events outside the system namespace derive from the
/// system roots unless they name a supertype.
fn with_implicit_super_type(mut decl: ClassDeclaration) -> ClassDeclaration {
    if decl.super_type.is_none() && decl.namespace != SYSTEM_NAMESPACE {
        let root = match decl.kind {
            DeclarationKind::Transaction => Some("Transaction"),
            DeclarationKind::Event => Some("Event"),
            _ => None,
        };
        decl.super_type = root.map(|name| format!("{}.{}", SYSTEM_NAMESPACE, name));
    }
    decl
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::FieldDeclaration;

    fn order_models() -> ModelManager {
        let mut models = ModelManager::new();
        models
            .add_class_declarations([
                ClassDeclaration::participant("net", "Customer")
                    .identified_by("email")
                    .with_field(FieldDeclaration::new("email", FieldType::STRING)),
                ClassDeclaration::asset("net", "Order")
                    .identified_by("id")
                    .with_field(FieldDeclaration::new("id", FieldType::STRING))
                    .with_field(FieldDeclaration::new("customer", FieldType::relationship("net.Customer"))),
                ClassDeclaration::asset("net", "RushOrder")
                    .extends("net.Order")
                    .with_field(FieldDeclaration::new("priority", FieldType::INTEGER)),
            ])
            .unwrap();
        models
    }

    #[test]
    fn test_resolves_registered_types_in_order() {
        let models = order_models();
        let names: Vec<String> = models
            .class_declarations()
            .iter()
            .map(|d| d.fully_qualified_name())
            .filter(|n| n.starts_with("net."))
            .collect();
        assert_eq!(names, vec!["net.Customer", "net.Order", "net.RushOrder"]);
        assert_eq!(models.namespaces(), vec![SYSTEM_NAMESPACE, "net"]);
        assert!(matches!(
            models.get_class_declaration("net.Missing"),
            Err(ModelError::TypeNotFound(name)) if name == "net.Missing"
        ));
    }

    #[test]
    fn test_walks_the_supertype_chain() {
        let models = order_models();
        assert_eq!(models.identifier_field("net.RushOrder"), Some("id"));
        assert!(models.is_subtype_of("net.RushOrder", "net.Order"));
        assert!(!models.is_subtype_of("net.Order", "net.RushOrder"));
        assert!(models.find_field("net.RushOrder", "customer").is_some());
        let fields: Vec<&str> = models
            .all_fields("net.RushOrder")
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(fields, vec!["id", "customer", "priority"]);
    }

    #[test]
    fn test_transactions_extend_the_system_root() {
        let mut models = ModelManager::new();
        models
            .add_class_declaration(
                ClassDeclaration::transaction("net", "Ship")
                    .with_field(FieldDeclaration::new("carrier", FieldType::STRING)),
            )
            .unwrap();
        assert_eq!(models.identifier_field("net.Ship"), Some("transactionId"));
        assert!(models.is_subtype_of("net.Ship", &format!("{}.Transaction", SYSTEM_NAMESPACE)));
    }

    #[test]
    fn test_rejects_cyclic_supertypes_atomically() {
        let mut models = ModelManager::new();
        let before = models.class_declarations().len();
        let err = models
            .add_class_declarations([
                ClassDeclaration::concept("net", "A").extends("net.B"),
                ClassDeclaration::concept("net", "B").extends("net.A"),
            ])
            .unwrap_err();
        assert!(matches!(err, ModelError::IllegalModel { .. }));
        assert_eq!(models.class_declarations().len(), before);
    }

    #[test]
    fn test_rejects_structurally_invalid_declarations() {
        let mut models = order_models();
        let cases = vec![
            ClassDeclaration::asset("net", "Order"),
            ClassDeclaration::asset("net", "Orphan").extends("net.Nowhere"),
            ClassDeclaration::concept("net", "Bad").extends("net.Order"),
            ClassDeclaration::asset("net", "NoId").identified_by("id"),
            ClassDeclaration::asset("net", "NumericId")
                .identified_by("id")
                .with_field(FieldDeclaration::new("id", FieldType::INTEGER)),
            ClassDeclaration::asset("net", "Dup")
                .extends("net.Order")
                .with_field(FieldDeclaration::new("customer", FieldType::STRING)),
            ClassDeclaration::concept("net", "Ref")
                .with_field(FieldDeclaration::new("r", FieldType::relationship("net.Ref"))),
            ClassDeclaration::concept("net", "Regex").with_field(
                FieldDeclaration::new("n", FieldType::INTEGER)
                    .with_validator(FieldValidator::Regex("^a".into())),
            ),
            ClassDeclaration::concept("net", "Defaulted")
                .with_field(FieldDeclaration::new("n", FieldType::INTEGER).with_default("x")),
            ClassDeclaration::concept("net", "BadDate").with_field(
                FieldDeclaration::new("when", FieldType::DATE_TIME).with_default("not-a-date"),
            ),
            ClassDeclaration::concept("net", "BigInt").with_field(
                FieldDeclaration::new("n", FieldType::INTEGER).with_default(3_000_000_000i64),
            ),
            ClassDeclaration::concept("net", "Negative").with_field(
                FieldDeclaration::new("amount", FieldType::DOUBLE)
                    .with_validator(FieldValidator::Range { lower: Some(0.0), upper: None })
                    .with_default(-5),
            ),
            ClassDeclaration::concept("net", "Code").with_field(
                FieldDeclaration::new("code", FieldType::STRING)
                    .with_validator(FieldValidator::Regex("^[0-9]+$".into()))
                    .with_default("xyz"),
            ),
            ClassDeclaration::enumeration("net", "Empty", Vec::<String>::new()),
        ];
        for decl in cases {
            let name = decl.fully_qualified_name();
            let result = models.add_class_declaration(decl);
            assert!(
                matches!(result, Err(ModelError::IllegalModel { .. })),
                "{} should be rejected, got {:?}",
                name,
                result
            );
        }
    }

    #[test]
    fn test_loads_declarations_from_json() {
        let models = ModelManager::from_json(
            r#"[
                { "namespace": "net", "name": "Status", "kind": "enum", "enumValues": ["OPEN", "CLOSED"] },
                { "namespace": "net", "name": "Ticket", "kind": "asset", "identifiedBy": "id",
                  "fields": [
                    { "name": "id", "type": { "primitive": "String" } },
                    { "name": "status", "type": { "class": "net.Status" }, "default": "OPEN" }
                  ] }
            ]"#,
        )
        .unwrap();
        assert!(models.get_class_declaration("net.Status").unwrap().is_enum());
        assert!(models.is_identifiable("net.Ticket"));
        assert!(matches!(
            ModelManager::from_json("not json"),
            Err(ModelError::SerializationError(_))
        ));
    }
}
