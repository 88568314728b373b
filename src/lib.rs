//! docapi - OpenAPI documents from annotated Rust sources.
//!
//! API documentation is written as line comments next to the code it describes, and the shapes
//! of request and response bodies are taken from the Rust type declarations in the same tree:
//!
//! ```text
//! // docapi: title Pet Store
//! // docapi: version 1.0.0
//! // docapi: route /pets/{id} get_pet
//! // docapi: begin get_pet
//! // docapi: method GET
//! // docapi: response 200 {Pet} the pet
//! // docapi: end
//! ```
//!
//! # Architecture
//!
//! 1. [`scanner`] - Walks the project and loads `.rs` files in sorted order
//! 2. [`lexer`] - Turns annotation comments into a command stream
//! 3. [`interpreter`] - Builds one document per API alias from the commands
//! 4. [`parser`] - Parses the same files into syntax trees
//! 5. [`type_extractor`] - Collects structs, aliases, maps and enums into a symbol table
//! 6. [`schema_resolver`] - Materialises every schema reachable from a document
//! 7. [`serializer`] - Renders documents as YAML or JSON
//!
//! [`generator`] chains these steps; [`document`] holds the OpenAPI model they share.
//!
//! # Example Usage
//!
//! ```no_run
//! use docapi::generator::{Generator, GeneratorOptions};
//! use docapi::serializer::serialize_yaml;
//! use std::path::Path;
//!
//! let generation = Generator::new(GeneratorOptions::default())
//!     .generate(Path::new("./my-service"))
//!     .unwrap();
//! for api in &generation.documents {
//!     println!("{}", serialize_yaml(&api.document).unwrap());
//! }
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod cli;
pub mod document;
pub mod error;
pub mod generator;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod scanner;
pub mod schema_resolver;
pub mod serializer;
pub mod type_extractor;
