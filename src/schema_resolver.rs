use crate::document::{DocumentModel, Schema};
use crate::error::{Error, Result};
use crate::type_extractor::{SymbolTable, TypeRef, TypeSymbol};
use log::{debug, warn};
use std::collections::{BTreeMap, HashSet, VecDeque};

/// Default bound on resolver passes
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Schema resolver - materialises `components.schemas` from the symbol table
///
/// Starting from the names a document references, each pass synthesises a schema for every name
/// in the worklist and queues the named types those schemas mention. A name is queued at most
/// once per document, so self-referencing types terminate without special handling. The pass
/// limit only guards against runaway reference chains.
pub struct SchemaResolver<'a> {
    symbols: &'a SymbolTable,
    max_iterations: usize,
}

/// What a call to [`SchemaResolver::resolve`] did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    /// Number of schemas added to `components.schemas`
    pub resolved: usize,
    /// Number of worklist passes
    pub passes: usize,
    /// Referenced names missing from the symbol table, rendered as plain strings
    pub unresolved: Vec<String>,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Resolves every schema reachable from the document.
    ///
    /// Names already present in `components.schemas` are never recomputed, so running this
    /// twice on the same model does no work the second time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResolverOverflow`] if new names are still being discovered after
    /// `max_iterations` passes.
    pub fn resolve(&self, model: &mut DocumentModel) -> Result<ResolveSummary> {
        let mut seen: HashSet<String> = model
            .document
            .components
            .schemas
            .keys()
            .cloned()
            .collect();
        let mut worklist: VecDeque<String> = VecDeque::new();

        let seeds = model
            .referenced
            .iter()
            .cloned()
            .chain(model.document.referenced_schemas());
        for name in seeds {
            if seen.insert(name.clone()) {
                worklist.push_back(name);
            }
        }

        let mut summary = ResolveSummary::default();
        while !worklist.is_empty() {
            if summary.passes == self.max_iterations {
                return Err(Error::ResolverOverflow {
                    alias: model.alias.clone(),
                    limit: self.max_iterations,
                });
            }
            summary.passes += 1;

            let current: Vec<String> = worklist.drain(..).collect();
            debug!(
                "Resolver pass {}: {} schema(s) {:?}",
                summary.passes,
                current.len(),
                current
            );

            for name in current {
                let mut discovered = Vec::new();
                let schema = match self.symbols.get(&name) {
                    Some(symbol) => Self::synthesize(symbol, &mut discovered),
                    None => {
                        warn!(
                            "API '{}': type '{}' not found, documented as string",
                            model.alias, name
                        );
                        summary.unresolved.push(name.clone());
                        Schema::of_type("string")
                    }
                };

                model.document.components.schemas.insert(name, schema);
                summary.resolved += 1;

                for next in discovered {
                    if seen.insert(next.clone()) {
                        worklist.push_back(next);
                    }
                }
            }
        }

        debug!(
            "API '{}': resolved {} schema(s) in {} pass(es)",
            model.alias, summary.resolved, summary.passes
        );
        Ok(summary)
    }

    /// Builds the schema of one declared type, collecting the names it references.
    fn synthesize(symbol: &TypeSymbol, discovered: &mut Vec<String>) -> Schema {
        match symbol {
            TypeSymbol::Struct { fields } => {
                let properties = fields
                    .iter()
                    .map(|field| {
                        (
                            field.name.clone(),
                            Self::field_schema(&field.type_ref, discovered),
                        )
                    })
                    .collect();
                Self::object(properties)
            }
            TypeSymbol::Alias { target } => Self::field_schema(target, discovered),
            TypeSymbol::Map { key, value } => {
                // Keyed by type name; identical key and value types collapse to one property.
                let mut properties = BTreeMap::new();
                properties.insert(key.name(), Self::field_schema(key, discovered));
                properties.insert(value.name(), Self::field_schema(value, discovered));
                Self::object(properties)
            }
            TypeSymbol::Enum { variants } => Schema {
                enum_values: Some(variants.clone()),
                ..Schema::of_type("string")
            },
        }
    }

    fn field_schema(type_ref: &TypeRef, discovered: &mut Vec<String>) -> Schema {
        if let Some(name) = type_ref.referenced_name() {
            discovered.push(name.to_string());
        }
        Schema::from_type_ref(type_ref)
    }

    fn object(properties: BTreeMap<String, Schema>) -> Schema {
        Schema {
            properties: (!properties.is_empty()).then_some(properties),
            ..Schema::of_type("object")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use crate::lexer::Lexer;
    use crate::parser::ParsedFile;
    use crate::type_extractor::TypeExtractor;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn symbols(code: &str) -> SymbolTable {
        TypeExtractor::extract(&[ParsedFile {
            path: PathBuf::from("models.rs"),
            syntax_tree: syn::parse_file(code).unwrap(),
        }])
    }

    fn model(lines: &[&str]) -> DocumentModel {
        let lexer = Lexer::default();
        let commands: Vec<_> = lines.iter().filter_map(|l| lexer.lex_line(l)).collect();
        Interpreter::run(&commands).unwrap().remove(0)
    }

    fn referencing(names: &[&str]) -> DocumentModel {
        let mut model = DocumentModel::new("");
        for name in names {
            model.reference(name);
        }
        model
    }

    fn object(properties: &[(&str, Schema)]) -> Schema {
        Schema {
            properties: Some(
                properties
                    .iter()
                    .map(|(name, schema)| (name.to_string(), schema.clone()))
                    .collect(),
            ),
            ..Schema::of_type("object")
        }
    }

    fn int32() -> Schema {
        Schema {
            format: Some("int32".to_string()),
            ..Schema::of_type("integer")
        }
    }

    #[test]
    fn test_struct_response() {
        let table = symbols(
            r#"
            pub struct User {
                #[serde(rename = "name")]
                pub name: String,
                #[serde(rename = "age")]
                pub age: i32,
            }
        "#,
        );
        let mut model = model(&[
            "// docapi: route /users/me me",
            "// docapi: begin me",
            "// docapi: method get",
            "// docapi: response 200 {User} ok",
            "// docapi: end",
        ]);

        let summary = SchemaResolver::new(&table).resolve(&mut model).unwrap();

        assert_eq!(summary.resolved, 1);
        assert_eq!(
            model.document.components.schemas["User"],
            object(&[("age", int32()), ("name", Schema::of_type("string"))])
        );
        assert_eq!(
            model.document.paths["/users/me"]["get"].responses["200"]
                .content
                .as_ref()
                .unwrap()["application/json"]
                .schema,
            Schema::reference_to("User")
        );
    }

    #[test]
    fn test_array_body_item_is_resolved() {
        let table = symbols(
            r#"
            pub struct Item {
                #[serde(rename = "id")]
                pub id: u32,
            }
        "#,
        );
        let mut model = model(&[
            "// docapi: route /items put_items",
            "// docapi: begin put_items",
            "// docapi: method put",
            "// docapi: body {[]Item} list",
            "// docapi: end",
        ]);

        SchemaResolver::new(&table).resolve(&mut model).unwrap();
        assert_eq!(
            model.document.components.schemas["Item"],
            object(&[("id", int32())])
        );
    }

    #[test]
    fn test_missing_symbol_degrades_to_string() {
        let mut model = referencing(&["Ghost"]);
        let summary = SchemaResolver::new(&SymbolTable::new())
            .resolve(&mut model)
            .unwrap();

        assert_eq!(
            model.document.components.schemas["Ghost"],
            Schema::of_type("string")
        );
        assert_eq!(summary.unresolved, vec!["Ghost"]);
    }

    #[test]
    fn test_transitive_references() {
        let table = symbols(
            r#"
            pub struct Order {
                #[serde(rename = "lines")]
                pub lines: Vec<OrderLine>,
                #[serde(rename = "customer")]
                pub customer: Option<Box<Customer>>,
            }
            pub struct OrderLine {
                #[serde(rename = "sku")]
                pub sku: Sku,
            }
            pub struct Customer {
                #[serde(rename = "name")]
                pub name: String,
            }
            pub type Sku = String;
        "#,
        );
        let mut model = referencing(&["Order"]);
        let summary = SchemaResolver::new(&table).resolve(&mut model).unwrap();

        let schemas = &model.document.components.schemas;
        assert_eq!(summary.resolved, 4);
        assert_eq!(summary.passes, 3);
        assert_eq!(
            schemas["Order"],
            object(&[
                ("customer", Schema::reference_to("Customer")),
                ("lines", Schema::array_of(Schema::reference_to("OrderLine"))),
            ])
        );
        assert_eq!(
            schemas["OrderLine"],
            object(&[("sku", Schema::reference_to("Sku"))])
        );
        assert_eq!(schemas["Sku"], Schema::of_type("string"));
    }

    #[test]
    fn test_self_reference_terminates() {
        let table = symbols(
            r#"
            pub struct Node {
                #[serde(rename = "children")]
                pub children: Vec<Node>,
                #[serde(rename = "parent")]
                pub parent: Option<Box<Node>>,
            }
        "#,
        );
        let mut model = referencing(&["Node"]);
        let summary = SchemaResolver::new(&table).resolve(&mut model).unwrap();

        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.passes, 1);
    }

    #[test]
    fn test_map_type_has_key_and_value_properties() {
        let table = symbols(
            r#"
            pub type Inventory = HashMap<String, Item>;
            pub type Counters = BTreeMap<String, String>;
            pub struct Item {
                #[serde(rename = "id")]
                pub id: u32,
            }
        "#,
        );
        let mut model = referencing(&["Inventory", "Counters"]);
        SchemaResolver::new(&table).resolve(&mut model).unwrap();

        let schemas = &model.document.components.schemas;
        assert_eq!(
            schemas["Inventory"],
            object(&[
                ("Item", Schema::reference_to("Item")),
                ("string", Schema::of_type("string")),
            ])
        );
        assert_eq!(
            schemas["Counters"],
            object(&[("string", Schema::of_type("string"))])
        );
        assert!(schemas.contains_key("Item"));
    }

    #[test]
    fn test_enum_schema() {
        let table = symbols(
            r#"
            pub enum Status {
                #[serde(rename = "active")]
                Active,
                #[serde(rename = "closed")]
                Closed,
            }
        "#,
        );
        let mut model = referencing(&["Status"]);
        SchemaResolver::new(&table).resolve(&mut model).unwrap();

        assert_eq!(
            model.document.components.schemas["Status"],
            Schema {
                enum_values: Some(vec!["active".to_string(), "closed".to_string()]),
                ..Schema::of_type("string")
            }
        );
    }

    #[test]
    fn test_second_run_does_nothing() {
        let table = symbols(
            r#"
            pub struct A {
                #[serde(rename = "b")]
                pub b: B,
            }
            pub struct B {
                #[serde(rename = "x")]
                pub x: bool,
            }
        "#,
        );
        let mut model = referencing(&["A"]);
        let resolver = SchemaResolver::new(&table);

        resolver.resolve(&mut model).unwrap();
        let first = model.document.clone();
        let summary = resolver.resolve(&mut model).unwrap();

        assert_eq!(summary, ResolveSummary::default());
        assert_eq!(model.document, first);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let code = r#"
            pub struct Root {
                #[serde(rename = "a")]
                pub a: Leaf,
                #[serde(rename = "b")]
                pub b: Vec<Other>,
            }
            pub struct Leaf {
                #[serde(rename = "v")]
                pub v: f64,
            }
            pub type Other = HashMap<Leaf, u8>;
        "#;

        let mut first = referencing(&["Root", "Missing"]);
        let mut second = referencing(&["Root", "Missing"]);
        SchemaResolver::new(&symbols(code)).resolve(&mut first).unwrap();
        SchemaResolver::new(&symbols(code)).resolve(&mut second).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_iteration_cap() {
        let table = symbols(
            r#"
            pub type A = B;
            pub type B = C;
            pub type C = String;
        "#,
        );

        let mut model = referencing(&["A"]);
        let err = SchemaResolver::new(&table)
            .with_max_iterations(2)
            .resolve(&mut model)
            .unwrap_err();
        assert!(matches!(err, Error::ResolverOverflow { limit: 2, .. }));
        assert!(err.to_string().contains("too many iterations"));

        let mut model = referencing(&["A"]);
        let summary = SchemaResolver::new(&table)
            .with_max_iterations(3)
            .resolve(&mut model)
            .unwrap();
        assert_eq!(summary.passes, 3);
    }

    #[test]
    fn test_existing_schemas_are_kept() {
        let mut model = referencing(&["User"]);
        model
            .document
            .components
            .schemas
            .insert("User".to_string(), Schema::of_type("object"));

        let summary = SchemaResolver::new(&SymbolTable::new())
            .resolve(&mut model)
            .unwrap();
        assert_eq!(summary.resolved, 0);
        assert_eq!(
            model.document.components.schemas["User"],
            Schema::of_type("object")
        );
    }
}
