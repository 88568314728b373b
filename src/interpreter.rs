//! Command interpreter.
//!
//! Folds the ordered command stream into one [`DocumentModel`] per API alias. Each alias gets its
//! own [`ApiBuilder`], which owns the handler currently being described:
//!
//! ```text
//! Idle --begin--> HandlerOpen --end--> Idle
//! ```
//!
//! While a handler is open only handler fields (`method`, `summary`, `desc`, `tags`, `body`,
//! `query`, `response`) and `end` are accepted; while idle those are rejected. Routes are
//! collected as `(path, handler)` pairs and joined with the finished handlers once the whole
//! stream has been consumed, followed by linking bare `response <code>` entries to the shared
//! responses declared with `code`.

use crate::document::{
    json_content, DocumentModel, OpenApiDocument, Operation, Parameter, RequestBody, Response,
    Schema, Server, ServerVariable,
};
use crate::error::{Error, Result, StructuralErrorKind};
use crate::lexer::{Command, CommandKind};
use crate::scanner::Location;
use crate::type_extractor::TypeRef;
use log::{debug, warn};
use std::collections::BTreeMap;

type ApplyResult = std::result::Result<(), StructuralErrorKind>;

/// Applies one command to one API.
type Apply = fn(&mut ApiBuilder, &Command) -> ApplyResult;

/// Handler data collected between `begin` and `end`.
#[derive(Debug, Clone)]
struct HandlerScratch {
    id: String,
    method: Option<String>,
    operation: Operation,
    opened_at: Option<Location>,
}

/// Builds the document of a single API alias.
#[derive(Debug)]
pub struct ApiBuilder {
    model: DocumentModel,
    open: Option<HandlerScratch>,
    handlers: BTreeMap<String, HandlerScratch>,
    routes: Vec<(String, String)>,
}

impl ApiBuilder {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            model: DocumentModel::new(alias),
            open: None,
            handlers: BTreeMap::new(),
            routes: Vec::new(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.model.alias
    }

    /// Applies a command after checking it against the handler state machine. Unknown kinds are
    /// ignored; [`Interpreter::run`] reports them.
    pub fn apply(&mut self, command: &Command) -> Result<()> {
        let Some(apply) = dispatch(&command.kind) else {
            return Ok(());
        };

        self.check_state(&command.kind)
            .and_then(|()| apply(self, command))
            .map_err(|kind| self.structural(command.location.clone(), kind))
    }

    fn check_state(&self, kind: &CommandKind) -> ApplyResult {
        match (&self.open, kind) {
            (_, CommandKind::Begin | CommandKind::End) => Ok(()),
            (None, kind) if kind.is_handler_field() => Err(StructuralErrorKind::NoOpenHandler {
                kind: kind.to_string(),
            }),
            (Some(open), kind) if !kind.is_handler_field() => {
                Err(StructuralErrorKind::NotAllowedInHandler {
                    kind: kind.to_string(),
                    open: open.id.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    fn structural(&self, location: Option<Location>, kind: StructuralErrorKind) -> Error {
        Error::Structural {
            alias: self.model.alias.clone(),
            location,
            kind,
        }
    }

    fn open_handler(
        &mut self,
        command: &Command,
    ) -> std::result::Result<&mut HandlerScratch, StructuralErrorKind> {
        self.open
            .as_mut()
            .ok_or_else(|| StructuralErrorKind::NoOpenHandler {
                kind: command.kind.to_string(),
            })
    }

    /// Inline schema for a type reference, remembering any named type it mentions.
    fn schema_for(&mut self, type_ref: &TypeRef) -> Schema {
        if let Some(name) = type_ref.referenced_name() {
            self.model.reference(name);
        }
        Schema::from_type_ref(type_ref)
    }

    /// Closes the stream: joins routes with handlers and links shared responses.
    pub fn finish(mut self) -> Result<DocumentModel> {
        if let Some(open) = self.open.take() {
            return Err(self.structural(
                open.opened_at,
                StructuralErrorKind::UnclosedHandler { id: open.id },
            ));
        }

        for (path, handler_id) in &self.routes {
            let Some(handler) = self.handlers.get(handler_id) else {
                warn!(
                    "API '{}': route {} points at unknown handler '{}', skipped",
                    self.model.alias, path, handler_id
                );
                continue;
            };
            let Some(method) = &handler.method else {
                warn!(
                    "API '{}': handler '{}' has no method, route {} skipped",
                    self.model.alias, handler_id, path
                );
                continue;
            };

            debug!("Routing {} {} -> {}", method, path, handler_id);
            let item = self.model.document.paths.entry(path.clone()).or_default();
            if item
                .insert(method.clone(), handler.operation.clone())
                .is_some()
            {
                warn!(
                    "API '{}': {} {} documented twice; '{}' wins",
                    self.model.alias, method, path, handler_id
                );
            }
        }

        link_responses(&self.model.alias, &mut self.model.document);
        Ok(self.model)
    }
}

/// Replaces bare route responses with references to the shared response of the same code.
fn link_responses(alias: &str, document: &mut OpenApiDocument) {
    let OpenApiDocument {
        paths, components, ..
    } = document;

    for (path, item) in paths.iter_mut() {
        for (method, operation) in item.iter_mut() {
            for (code, response) in operation.responses.iter_mut() {
                if !response.is_unlinked() {
                    continue;
                }
                if components.responses.contains_key(code) {
                    *response = Response::shared(code);
                } else {
                    warn!(
                        "API '{}': {} {} response {} has no shared 'code {}' to reuse",
                        alias, method, path, code, code
                    );
                }
            }
        }
    }
}

fn location_prefix(location: &Option<Location>) -> String {
    location
        .as_ref()
        .map(|l| format!("{}: ", l))
        .unwrap_or_default()
}

/// Maps a command kind to the function that applies it. `None` for unknown kinds.
fn dispatch(kind: &CommandKind) -> Option<Apply> {
    let apply: Apply = match kind {
        CommandKind::Title => apply_title,
        CommandKind::Description => apply_description,
        CommandKind::Version => apply_version,
        CommandKind::Filename => apply_filename,
        CommandKind::Url => apply_url,
        CommandKind::UrlVar => apply_url_var,
        CommandKind::Code => apply_code,
        CommandKind::Route => apply_route,
        CommandKind::Begin => apply_begin,
        CommandKind::Method => apply_method,
        CommandKind::Summary => apply_summary,
        CommandKind::Desc => apply_desc,
        CommandKind::Tags => apply_tags,
        CommandKind::Body => apply_body,
        CommandKind::Query => apply_query,
        CommandKind::Response => apply_response,
        CommandKind::End => apply_end,
        CommandKind::Unknown(_) => return None,
    };
    Some(apply)
}

fn arity_error(command: &Command, expected: &'static str) -> StructuralErrorKind {
    StructuralErrorKind::InvalidArity {
        kind: command.kind.to_string(),
        expected,
        found: command.args.len(),
    }
}

fn exactly(command: &Command, count: usize, expected: &'static str) -> ApplyResult {
    if command.args.len() == count {
        Ok(())
    } else {
        Err(arity_error(command, expected))
    }
}

fn at_least(command: &Command, count: usize, expected: &'static str) -> ApplyResult {
    if command.args.len() >= count {
        Ok(())
    } else {
        Err(arity_error(command, expected))
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn is_braced(token: &str) -> bool {
    token.len() >= 2 && token.starts_with('{') && token.ends_with('}')
}

/// `{Name}`, `{[]Name}` or a bare type name.
fn type_token(
    command: &Command,
    token: &str,
) -> std::result::Result<TypeRef, StructuralErrorKind> {
    let inner = if is_braced(token) {
        &token[1..token.len() - 1]
    } else {
        token
    };
    let mut element = inner;
    while let Some(rest) = element.strip_prefix("[]") {
        element = rest;
    }
    if element.is_empty() {
        return Err(StructuralErrorKind::EmptyTypeReference {
            kind: command.kind.to_string(),
            token: token.to_string(),
        });
    }
    Ok(TypeRef::from_name(inner))
}

fn apply_title(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    at_least(command, 1, "at least 1")?;
    api.model.document.info.title = command.text_from(0);
    Ok(())
}

fn apply_description(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    at_least(command, 1, "at least 1")?;
    api.model.document.info.description = Some(command.text_from(0));
    Ok(())
}

fn apply_version(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    exactly(command, 1, "1")?;
    api.model.document.info.version = command.args[0].clone();
    Ok(())
}

fn apply_filename(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    exactly(command, 1, "1")?;
    api.model.filename = Some(command.args[0].clone());
    Ok(())
}

/// `url <url>`, or `url <alias> <url>` when broadcast.
fn apply_url(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    let url = match (command.alias.is_some(), command.args.as_slice()) {
        (_, [url]) => url,
        (false, [_, url]) => url,
        _ => return Err(arity_error(command, "1, or 2 without an alias")),
    };
    api.model.document.servers.push(Server {
        url: url.clone(),
        ..Server::default()
    });
    Ok(())
}

fn apply_url_var(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    at_least(command, 2, "at least 2")?;
    let server = api
        .model
        .document
        .servers
        .last_mut()
        .ok_or(StructuralErrorKind::NoServer)?;
    server.variables.insert(
        command.args[0].clone(),
        ServerVariable {
            default: command.args[1].clone(),
            description: non_empty(command.text_from(2)),
        },
    );
    Ok(())
}

fn apply_code(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    at_least(command, 1, "at least 1")?;
    let code = command.args[0].clone();

    let response = match command.args.get(1) {
        Some(token) if is_braced(token) => {
            let schema = api.schema_for(&type_token(command, token)?);
            Response::described(command.text_from(2)).with_json(schema)
        }
        _ => Response::described(command.text_from(1)),
    };
    api.model.document.components.responses.insert(code, response);
    Ok(())
}

fn apply_route(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    exactly(command, 2, "2")?;
    api.routes
        .push((command.args[0].clone(), command.args[1].clone()));
    Ok(())
}

fn apply_begin(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    exactly(command, 1, "1")?;
    let id = command.args[0].clone();
    if let Some(open) = &api.open {
        return Err(StructuralErrorKind::NestedBegin {
            id,
            open: open.id.clone(),
        });
    }
    api.open = Some(HandlerScratch {
        id: id.clone(),
        method: None,
        operation: Operation {
            operation_id: Some(id),
            ..Operation::default()
        },
        opened_at: command.location.clone(),
    });
    Ok(())
}

fn apply_method(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    exactly(command, 1, "1")?;
    api.open_handler(command)?.method = Some(command.args[0].to_lowercase());
    Ok(())
}

fn apply_summary(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    at_least(command, 1, "at least 1")?;
    api.open_handler(command)?.operation.summary = Some(command.text_from(0));
    Ok(())
}

fn apply_desc(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    at_least(command, 1, "at least 1")?;
    api.open_handler(command)?.operation.description = Some(command.text_from(0));
    Ok(())
}

fn apply_tags(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    at_least(command, 1, "at least 1")?;
    api.open_handler(command)?.operation.tags = command.args.clone();
    Ok(())
}

fn apply_body(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    at_least(command, 1, "at least 1")?;
    let schema = api.schema_for(&type_token(command, &command.args[0])?);
    api.open_handler(command)?.operation.request_body = Some(RequestBody {
        description: non_empty(command.text_from(1)),
        required: true,
        content: json_content(schema),
    });
    Ok(())
}

fn apply_query(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    at_least(command, 2, "at least 2")?;
    let schema = api.schema_for(&type_token(command, &command.args[1])?);
    api.open_handler(command)?.operation.parameters.push(Parameter {
        name: command.args[0].clone(),
        location: "query".to_string(),
        description: non_empty(command.text_from(2)),
        required: true,
        schema,
    });
    Ok(())
}

fn apply_response(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    at_least(command, 1, "at least 1")?;
    let code = command.args[0].clone();

    let response = match command.args.get(1) {
        None => Response::default(),
        Some(token) if is_braced(token) => {
            let schema = api.schema_for(&type_token(command, token)?);
            Response::described(command.text_from(2)).with_json(schema)
        }
        Some(_) => Response::described(command.text_from(1)),
    };
    api.open_handler(command)?.operation.responses.insert(code, response);
    Ok(())
}

fn apply_end(api: &mut ApiBuilder, command: &Command) -> ApplyResult {
    if command.args.len() > 1 {
        return Err(arity_error(command, "0 or 1"));
    }
    let handler = api.open.take().ok_or(StructuralErrorKind::UnmatchedEnd)?;
    if let Some(found) = command.args.first() {
        if found != &handler.id {
            let open = handler.id.clone();
            api.open = Some(handler);
            return Err(StructuralErrorKind::EndMismatch {
                open,
                found: found.clone(),
            });
        }
    }

    debug!("API '{}': handler '{}' closed", api.model.alias, handler.id);
    if api.handlers.contains_key(&handler.id) {
        warn!(
            "API '{}': handler '{}' described twice; the later block wins",
            api.model.alias, handler.id
        );
    }
    api.handlers.insert(handler.id.clone(), handler);
    Ok(())
}

/// Runs a command stream through one builder per API alias.
pub struct Interpreter;

impl Interpreter {
    /// Aliases in first-mention order. A stream without aliases describes a single implicit API
    /// with the empty alias.
    pub fn discover_aliases(commands: &[Command]) -> Vec<String> {
        let mut aliases: Vec<String> = Vec::new();
        for command in commands {
            let declared = match (&command.alias, &command.kind) {
                (Some(alias), _) => Some(alias),
                (None, CommandKind::Url) if command.args.len() == 2 => Some(&command.args[0]),
                _ => None,
            };
            if let Some(alias) = declared {
                if !aliases.contains(alias) {
                    aliases.push(alias.clone());
                }
            }
        }
        if aliases.is_empty() {
            aliases.push(String::new());
        }
        aliases
    }

    /// Builds every API described by the command stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] on the first arity or `begin`/`end` violation. No document
    /// is returned in that case.
    pub fn run(commands: &[Command]) -> Result<Vec<DocumentModel>> {
        let aliases = Self::discover_aliases(commands);
        debug!("Building {} API(s): {:?}", aliases.len(), aliases);

        let mut builders: Vec<ApiBuilder> = aliases.into_iter().map(ApiBuilder::new).collect();

        for command in commands {
            if let CommandKind::Unknown(keyword) = &command.kind {
                warn!(
                    "{}unknown command '{}', skipped",
                    location_prefix(&command.location),
                    keyword
                );
                continue;
            }

            let target = match (&command.alias, &command.kind) {
                (Some(alias), _) => Some(alias.as_str()),
                (None, CommandKind::Url) if command.args.len() == 2 => {
                    Some(command.args[0].as_str())
                }
                _ => None,
            };

            for builder in builders.iter_mut() {
                if target.map_or(true, |alias| alias == builder.alias()) {
                    builder.apply(command)?;
                }
            }
        }

        builders.into_iter().map(ApiBuilder::finish).collect()
    }
}
