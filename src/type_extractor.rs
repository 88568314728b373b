use crate::parser::ParsedFile;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;
use syn::visit::Visit;

/// Type wrappers that do not change the exposed shape of a value.
const TRANSPARENT_WRAPPERS: &[&str] = &["Option", "Box", "Rc", "Arc", "Cow", "RefCell", "Cell"];
/// Collections serialised as JSON arrays.
const SEQUENCE_TYPES: &[&str] = &["Vec", "VecDeque", "LinkedList", "HashSet", "BTreeSet"];
/// Collections serialised as JSON objects.
const MAP_TYPES: &[&str] = &["HashMap", "BTreeMap", "IndexMap"];

/// Primitive types, normalised to what OpenAPI can express
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Integer of unspecified width (`integer`, `int`, `uint`)
    Integer,
    Integer32,
    Integer64,
    /// Number of unspecified precision (`number`)
    Number,
    Float,
    Double,
    String,
    Boolean,
}

impl PrimitiveType {
    /// Recognises Rust spellings as well as the OpenAPI and Go-style names used in annotations.
    pub fn from_name(name: &str) -> Option<Self> {
        let primitive = match name {
            "String" | "str" | "char" | "string" => PrimitiveType::String,
            "bool" | "boolean" => PrimitiveType::Boolean,
            "i8" | "i16" | "i32" | "u8" | "u16" | "u32" | "int8" | "int16" | "int32" | "uint8"
            | "uint16" | "uint32" | "byte" | "rune" => PrimitiveType::Integer32,
            "i64" | "i128" | "u64" | "u128" | "isize" | "usize" | "int64" | "uint64" => {
                PrimitiveType::Integer64
            }
            "integer" | "int" | "uint" | "uintptr" => PrimitiveType::Integer,
            "f32" | "float" | "float32" => PrimitiveType::Float,
            "f64" | "double" | "float64" => PrimitiveType::Double,
            "number" => PrimitiveType::Number,
            _ => return None,
        };
        Some(primitive)
    }

    /// The OpenAPI `type` keyword.
    pub fn schema_type(&self) -> &'static str {
        match self {
            PrimitiveType::Integer | PrimitiveType::Integer32 | PrimitiveType::Integer64 => {
                "integer"
            }
            PrimitiveType::Number | PrimitiveType::Float | PrimitiveType::Double => "number",
            PrimitiveType::String => "string",
            PrimitiveType::Boolean => "boolean",
        }
    }

    /// The OpenAPI `format` keyword, when the width is known.
    pub fn format(&self) -> Option<&'static str> {
        match self {
            PrimitiveType::Integer32 => Some("int32"),
            PrimitiveType::Integer64 => Some("int64"),
            PrimitiveType::Float => Some("float"),
            PrimitiveType::Double => Some("double"),
            _ => None,
        }
    }
}

/// Shape of a field, alias target or annotation type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    /// Another declared type, looked up in the symbol table
    Named(String),
    List(Box<TypeRef>),
    /// Nested dictionary or a shape that has no better description
    Object,
}

impl TypeRef {
    /// Parses an annotation type name such as `User`, `[]User` or `string`.
    pub fn from_name(name: &str) -> TypeRef {
        if let Some(inner) = name.strip_prefix("[]") {
            return TypeRef::List(Box::new(TypeRef::from_name(inner)));
        }
        match PrimitiveType::from_name(name) {
            Some(primitive) => TypeRef::Primitive(primitive),
            None => TypeRef::Named(name.to_string()),
        }
    }

    /// Infers the exposed shape of a declared Rust type.
    pub fn from_syn(ty: &syn::Type) -> TypeRef {
        match ty {
            syn::Type::Reference(reference) => TypeRef::from_syn(&reference.elem),
            syn::Type::Ptr(pointer) => TypeRef::from_syn(&pointer.elem),
            syn::Type::Paren(paren) => TypeRef::from_syn(&paren.elem),
            syn::Type::Group(group) => TypeRef::from_syn(&group.elem),
            syn::Type::Slice(slice) => TypeRef::List(Box::new(TypeRef::from_syn(&slice.elem))),
            syn::Type::Array(array) => TypeRef::List(Box::new(TypeRef::from_syn(&array.elem))),
            syn::Type::Path(type_path) => Self::from_path(&type_path.path),
            _ => TypeRef::Object,
        }
    }

    fn from_path(path: &syn::Path) -> TypeRef {
        let Some(segment) = path.segments.last() else {
            return TypeRef::Object;
        };
        let name = segment.ident.to_string();
        let first_arg = || type_arguments(segment).next().map(TypeRef::from_syn);

        if TRANSPARENT_WRAPPERS.contains(&name.as_str()) {
            return first_arg().unwrap_or(TypeRef::Object);
        }
        if SEQUENCE_TYPES.contains(&name.as_str()) {
            return TypeRef::List(Box::new(first_arg().unwrap_or(TypeRef::Object)));
        }
        if MAP_TYPES.contains(&name.as_str()) {
            return TypeRef::Object;
        }
        match PrimitiveType::from_name(&name) {
            Some(primitive) => TypeRef::Primitive(primitive),
            None => TypeRef::Named(name),
        }
    }

    /// Human readable name, as written in annotations.
    pub fn name(&self) -> String {
        match self {
            TypeRef::Primitive(primitive) => primitive.schema_type().to_string(),
            TypeRef::Named(name) => name.clone(),
            TypeRef::List(inner) => format!("[]{}", inner.name()),
            TypeRef::Object => "object".to_string(),
        }
    }

    /// The declared type this reference points at, looking through lists.
    pub fn referenced_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            TypeRef::List(inner) => inner.referenced_name(),
            _ => None,
        }
    }
}

fn type_arguments(segment: &syn::PathSegment) -> impl Iterator<Item = &syn::Type> {
    let args = match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => Some(args.args.iter()),
        _ => None,
    };
    args.into_iter().flatten().filter_map(|arg| match arg {
        syn::GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

/// Key and value of a dictionary type, looking through transparent wrappers.
fn map_entry(ty: &syn::Type) -> Option<(TypeRef, TypeRef)> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    let name = segment.ident.to_string();

    if TRANSPARENT_WRAPPERS.contains(&name.as_str()) {
        return type_arguments(segment).next().and_then(map_entry);
    }
    if !MAP_TYPES.contains(&name.as_str()) {
        return None;
    }
    let mut args = type_arguments(segment);
    let key = TypeRef::from_syn(args.next()?);
    let value = TypeRef::from_syn(args.next()?);
    Some((key, value))
}

/// A field exposed by a struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Externally visible name, taken from `#[serde(rename = "...")]`
    pub name: String,
    pub type_ref: TypeRef,
}

/// A declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSymbol {
    Struct { fields: Vec<FieldDef> },
    Alias { target: TypeRef },
    Map { key: TypeRef, value: TypeRef },
    Enum { variants: Vec<String> },
}

impl TypeSymbol {
    fn kind_name(&self) -> &'static str {
        match self {
            TypeSymbol::Struct { .. } => "struct",
            TypeSymbol::Alias { .. } => "alias",
            TypeSymbol::Map { .. } => "map",
            TypeSymbol::Enum { .. } => "enum",
        }
    }
}

/// Declared type names mapped to their shapes. Immutable once extraction is done.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, TypeSymbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a symbol. A later declaration with the same name replaces the earlier one.
    pub fn insert(&mut self, name: impl Into<String>, symbol: TypeSymbol) -> Option<TypeSymbol> {
        let name = name.into();
        let new_kind = symbol.kind_name();
        let previous = self.symbols.insert(name.clone(), symbol);
        if let Some(ref previous) = previous {
            warn!(
                "Type '{}' declared more than once; {} replaces earlier {}",
                name,
                new_kind,
                previous.kind_name()
            );
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&TypeSymbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Folds `other` into this table with last-write-wins semantics.
    pub fn merge(&mut self, other: SymbolTable) {
        let mut entries: Vec<(String, TypeSymbol)> = other.symbols.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, symbol) in entries {
            self.insert(name, symbol);
        }
    }
}

/// Serde attributes that decide how a field or variant is exposed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SerdeAttributes {
    rename: Option<String>,
    skip: bool,
}

fn serde_attributes(attrs: &[syn::Attribute]) -> SerdeAttributes {
    let mut serde_attrs = SerdeAttributes::default();

    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }

        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if meta.input.peek(syn::Token![=]) {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    serde_attrs.rename = Some(value.value());
                } else {
                    // rename(serialize = "...", deserialize = "...")
                    meta.parse_nested_meta(|inner| {
                        let value: syn::LitStr = inner.value()?.parse()?;
                        if inner.path.is_ident("serialize") {
                            serde_attrs.rename = Some(value.value());
                        }
                        Ok(())
                    })?;
                }
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                serde_attrs.skip = true;
            } else if meta.input.peek(syn::Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                meta.parse_nested_meta(|inner| {
                    if inner.input.peek(syn::Token![=]) {
                        let _: syn::Expr = inner.value()?.parse()?;
                    }
                    Ok(())
                })?;
            }
            Ok(())
        });

        if let Err(e) = result {
            debug!("Ignoring unreadable serde attribute: {}", e);
        }
    }

    serde_attrs
}

/// Builds the symbol table from parsed Rust files.
///
/// Structs, type aliases and enums are collected from anywhere in a file, including inline
/// modules. Struct fields are only exposed when they carry `#[serde(rename = "...")]`, and
/// `#[serde(skip)]` hides a field even when it is renamed.
pub struct TypeExtractor;

impl TypeExtractor {
    /// Extracts every declaration from the files, in order. Later files win on name collisions.
    pub fn extract(parsed_files: &[ParsedFile]) -> SymbolTable {
        debug!("Extracting types from {} files", parsed_files.len());
        let mut table = SymbolTable::new();
        for parsed_file in parsed_files {
            Self::extract_file(parsed_file, &mut table);
        }
        debug!("Extracted {} type symbols", table.len());
        table
    }

    pub fn extract_file(parsed_file: &ParsedFile, table: &mut SymbolTable) {
        let mut collector = SymbolCollector {
            file: &parsed_file.path,
            table,
        };
        collector.visit_file(&parsed_file.syntax_tree);
    }

    fn struct_symbol(item: &syn::ItemStruct) -> TypeSymbol {
        match &item.fields {
            syn::Fields::Named(named) => TypeSymbol::Struct {
                fields: named.named.iter().filter_map(Self::field_def).collect(),
            },
            syn::Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => TypeSymbol::Alias {
                target: TypeRef::from_syn(&unnamed.unnamed[0].ty),
            },
            _ => TypeSymbol::Struct { fields: Vec::new() },
        }
    }

    fn field_def(field: &syn::Field) -> Option<FieldDef> {
        let attrs = serde_attributes(&field.attrs);
        if attrs.skip {
            return None;
        }
        let name = attrs.rename?;
        Some(FieldDef {
            name,
            type_ref: TypeRef::from_syn(&field.ty),
        })
    }

    fn alias_symbol(item: &syn::ItemType) -> TypeSymbol {
        match map_entry(&item.ty) {
            Some((key, value)) => TypeSymbol::Map { key, value },
            None => TypeSymbol::Alias {
                target: TypeRef::from_syn(&item.ty),
            },
        }
    }

    fn enum_symbol(item: &syn::ItemEnum) -> TypeSymbol {
        let variants = item
            .variants
            .iter()
            .filter_map(|variant| {
                let attrs = serde_attributes(&variant.attrs);
                if attrs.skip {
                    return None;
                }
                Some(attrs.rename.unwrap_or_else(|| variant.ident.to_string()))
            })
            .collect();
        TypeSymbol::Enum { variants }
    }
}

struct SymbolCollector<'a> {
    file: &'a Path,
    table: &'a mut SymbolTable,
}

impl SymbolCollector<'_> {
    fn record(&mut self, ident: &syn::Ident, symbol: TypeSymbol) {
        debug!(
            "Found {} {} in {}",
            symbol.kind_name(),
            ident,
            self.file.display()
        );
        self.table.insert(ident.to_string(), symbol);
    }
}

impl<'ast> Visit<'ast> for SymbolCollector<'_> {
    fn visit_item_struct(&mut self, item: &'ast syn::ItemStruct) {
        self.record(&item.ident, TypeExtractor::struct_symbol(item));
        syn::visit::visit_item_struct(self, item);
    }

    fn visit_item_type(&mut self, item: &'ast syn::ItemType) {
        self.record(&item.ident, TypeExtractor::alias_symbol(item));
        syn::visit::visit_item_type(self, item);
    }

    fn visit_item_enum(&mut self, item: &'ast syn::ItemEnum) {
        self.record(&item.ident, TypeExtractor::enum_symbol(item));
        syn::visit::visit_item_enum(self, item);
    }
}
