//! Annotation lexer.
//!
//! Turns raw source lines into [`Command`]s. A line is an annotation when, after trimming, it
//! starts with the sentinel prefix (`// docapi` by default). Everything after the prefix is split
//! on spaces; an optional leading `:alias` token scopes the command to one API.
//!
//! ```text
//! // docapi: title Pet Store          -> title, args ["Pet", "Store"], no alias
//! // docapi:admin version 2.1         -> version, args ["2.1"], alias "admin"
//! ```
//!
//! The lexer only checks syntax. Whether a kind is known, or has the right number of arguments,
//! is up to the interpreter.

use crate::scanner::{Location, SourceFile};
use log::debug;
use std::fmt;

/// Default sentinel that marks an annotation comment.
pub const DEFAULT_PREFIX: &str = "// docapi";

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The closed set of annotation kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Title,
    Description,
    Version,
    Filename,
    Url,
    UrlVar,
    Code,
    Route,
    Begin,
    Method,
    Summary,
    Desc,
    Tags,
    Body,
    Query,
    Response,
    End,
    /// A keyword outside the DSL, kept verbatim for diagnostics.
    Unknown(String),
}

impl CommandKind {
    pub fn parse(keyword: &str) -> Self {
        match keyword {
            "title" => CommandKind::Title,
            "description" => CommandKind::Description,
            "version" => CommandKind::Version,
            "filename" => CommandKind::Filename,
            "url" => CommandKind::Url,
            "urlvar" => CommandKind::UrlVar,
            "code" => CommandKind::Code,
            "route" => CommandKind::Route,
            "begin" => CommandKind::Begin,
            "method" => CommandKind::Method,
            "summary" => CommandKind::Summary,
            "desc" => CommandKind::Desc,
            "tags" => CommandKind::Tags,
            "body" => CommandKind::Body,
            "query" => CommandKind::Query,
            "response" => CommandKind::Response,
            "end" => CommandKind::End,
            other => CommandKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CommandKind::Title => "title",
            CommandKind::Description => "description",
            CommandKind::Version => "version",
            CommandKind::Filename => "filename",
            CommandKind::Url => "url",
            CommandKind::UrlVar => "urlvar",
            CommandKind::Code => "code",
            CommandKind::Route => "route",
            CommandKind::Begin => "begin",
            CommandKind::Method => "method",
            CommandKind::Summary => "summary",
            CommandKind::Desc => "desc",
            CommandKind::Tags => "tags",
            CommandKind::Body => "body",
            CommandKind::Query => "query",
            CommandKind::Response => "response",
            CommandKind::End => "end",
            CommandKind::Unknown(keyword) => keyword,
        }
    }

    /// Kinds that only make sense between `begin` and `end`.
    pub fn is_handler_field(&self) -> bool {
        matches!(
            self,
            CommandKind::Method
                | CommandKind::Summary
                | CommandKind::Desc
                | CommandKind::Tags
                | CommandKind::Body
                | CommandKind::Query
                | CommandKind::Response
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lexed annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub args: Vec<String>,
    /// `None` broadcasts the command to every API.
    pub alias: Option<String>,
    pub location: Option<Location>,
}

impl Command {
    pub fn new(kind: CommandKind, args: &[&str]) -> Self {
        Self {
            kind,
            args: args.iter().map(|a| a.to_string()).collect(),
            alias: None,
            location: None,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Arguments from `start` on, joined with single spaces.
    pub fn text_from(&self, start: usize) -> String {
        self.args.get(start..).map(|a| a.join(" ")).unwrap_or_default()
    }
}

/// Line-oriented annotation lexer.
#[derive(Debug, Clone)]
pub struct Lexer {
    prefix: String,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Lexer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Lexes a single line. Lines without the sentinel prefix yield `None`.
    pub fn lex_line(&self, line: &str) -> Option<Command> {
        let rest = line.trim().strip_prefix(self.prefix.as_str())?;

        // `// docapiv2` is a different word, not an annotation. A prefix that already ends in
        // punctuation (`// docapi:`) has its own boundary.
        if self.prefix.chars().last().is_some_and(is_word_char)
            && rest.chars().next().is_some_and(is_word_char)
        {
            return None;
        }

        let mut tokens = rest.trim().split(' ').filter(|t| !t.is_empty());
        let mut first = tokens.next()?;

        let mut alias = None;
        if let Some(name) = first.strip_prefix(':') {
            if !name.is_empty() {
                alias = Some(name.to_string());
            }
            first = tokens.next()?;
        }

        Some(Command {
            kind: CommandKind::parse(first),
            args: tokens.map(str::to_string).collect(),
            alias,
            location: None,
        })
    }

    /// Lexes every line of a file, tagging commands with their location.
    pub fn lex_source(&self, source: &SourceFile) -> Vec<Command> {
        let commands: Vec<Command> = source
            .lines()
            .filter_map(|line| {
                self.lex_line(line.text)
                    .map(|command| command.at(line.location))
            })
            .collect();

        if !commands.is_empty() {
            debug!(
                "Found {} annotations in {}",
                commands.len(),
                source.path.display()
            );
        }
        commands
    }

    /// Lexes files in the given order into one command stream.
    pub fn lex_sources(&self, sources: &[SourceFile]) -> Vec<Command> {
        sources
            .iter()
            .flat_map(|source| self.lex_source(source))
            .collect()
    }
}
