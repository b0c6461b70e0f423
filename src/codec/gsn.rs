//! The `.gsn` text codec.
//!
//! ```text
//! GOALS ns
//! {
//!     goal G1
//!     {
//!         uuid:"0b0c...";
//!         summary:'''The system is acceptably safe''';
//!         label:safety;
//!         strategy S1
//!         {
//!             solvedBy: ns.G2;
//!         }
//!         inContextOf: ns.C1;
//!     }
//! }
//! ```
//!
//! Inline node blocks are declarations; `solvedBy:`/`inContextOf:` entries are references to a
//! dotted identifier. The older `ref_<kind>:` spelling is read as a reference whose relation is
//! implied by the target kind, and is rewritten in the canonical form on save.
use std::{fmt::Write, path::Path};

use crate::{
    case::{Definition, Document},
    codec::DocCodec,
    error::AssuranceError,
    nodekey::{check_name, NodeKey},
    properties::{Detail, Node, NodeKind, Reference, Relation, SourcePosition},
};

const TEXT_DELIMITER: &str = "'''";

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    /// Identifiers, keywords and dotted identifiers.
    Word(String),
    /// `"..."`
    Str(String),
    /// `'''...'''`
    Text(String),
    Open,
    Close,
    Colon,
    Semi,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Word(w) => format!("'{w}'"),
            Tok::Str(_) => "a string".to_string(),
            Tok::Text(_) => "a text block".to_string(),
            Tok::Open => "'{'".to_string(),
            Tok::Close => "'}'".to_string(),
            Tok::Colon => "':'".to_string(),
            Tok::Semi => "';'".to_string(),
        }
    }
}

fn lex(content: &str, path: &Path) -> Result<Vec<(Tok, usize)>, AssuranceError> {
    let err = |line: usize, msg: &str| {
        AssuranceError::Codec(format!("{}:{line}: {msg}", path.display()))
    };
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut rest = content;
    while let Some(c) = rest.chars().next() {
        if c == '\n' {
            line += 1;
            rest = &rest[1..];
        } else if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
        } else if rest.starts_with("//") {
            rest = rest.find('\n').map(|end| &rest[end..]).unwrap_or("");
        } else if let Some(body) = rest.strip_prefix("/*") {
            let end = body
                .find("*/")
                .ok_or_else(|| err(line, "unterminated comment"))?;
            line += body[..end].matches('\n').count();
            rest = &body[end + 2..];
        } else if let Some(body) = rest.strip_prefix(TEXT_DELIMITER) {
            // A block closes on the last three quotes of a run, so text may end in `'` or `''`.
            let start = body
                .find(TEXT_DELIMITER)
                .ok_or_else(|| err(line, "unterminated ''' text block"))?;
            let run = body[start..].chars().take_while(|&q| q == '\'').count();
            let end = start + run - TEXT_DELIMITER.len();
            tokens.push((Tok::Text(body[..end].to_string()), line));
            line += body[..end].matches('\n').count();
            rest = &body[end + TEXT_DELIMITER.len()..];
        } else if let Some(body) = rest.strip_prefix('"') {
            let end = body
                .find('"')
                .ok_or_else(|| err(line, "unterminated string"))?;
            tokens.push((Tok::Str(body[..end].to_string()), line));
            line += body[..end].matches('\n').count();
            rest = &body[end + 1..];
        } else if c.is_ascii_alphanumeric() || c == '_' {
            let end = rest
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'))
                .unwrap_or(rest.len());
            tokens.push((Tok::Word(rest[..end].to_string()), line));
            rest = &rest[end..];
        } else {
            let tok = match c {
                '{' => Tok::Open,
                '}' => Tok::Close,
                ':' => Tok::Colon,
                ';' => Tok::Semi,
                other => return Err(err(line, &format!("unexpected character '{other}'"))),
            };
            tokens.push((tok, line));
            rest = &rest[1..];
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<(Tok, usize)>,
    pos: usize,
    path: &'a Path,
}

impl Parser<'_> {
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(_, line)| *line)
            .unwrap_or(1)
    }

    fn error(&self, msg: impl AsRef<str>) -> AssuranceError {
        AssuranceError::Codec(format!(
            "{}:{}: {}",
            self.path.display(),
            self.line(),
            msg.as_ref()
        ))
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    fn next(&mut self, expected: &str) -> Result<(Tok, usize), AssuranceError> {
        let tok = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| self.error(format!("expected {expected}, found end of file")))?;
        self.pos += 1;
        Ok(tok)
    }

    fn expect(&mut self, want: Tok) -> Result<(), AssuranceError> {
        let (tok, _) = self.next(&want.describe())?;
        if tok != want {
            self.pos -= 1;
            return Err(self.error(format!(
                "expected {}, found {}",
                want.describe(),
                tok.describe()
            )));
        }
        Ok(())
    }

    fn word(&mut self, expected: &str) -> Result<(String, usize), AssuranceError> {
        match self.next(expected)? {
            (Tok::Word(word), line) => Ok((word, line)),
            (other, _) => {
                self.pos -= 1;
                Err(self.error(format!("expected {expected}, found {}", other.describe())))
            }
        }
    }

    fn string(&mut self, expected: &str) -> Result<String, AssuranceError> {
        match self.next(expected)? {
            (Tok::Str(s), _) | (Tok::Text(s), _) => Ok(s),
            (other, _) => {
                self.pos -= 1;
                Err(self.error(format!("expected {expected}, found {}", other.describe())))
            }
        }
    }

    fn name(&mut self, what: &str) -> Result<String, AssuranceError> {
        let (name, _) = self.word(what)?;
        check_name(what, &name).map_err(|e| self.error(e.to_string()))?;
        Ok(name)
    }

    fn document(&mut self) -> Result<Vec<Definition>, AssuranceError> {
        let mut definitions = Vec::new();
        while self.peek().is_some() {
            let (keyword, line) = self.word("a namespace keyword")?;
            let kind = NodeKind::from_namespace_keyword(&keyword).ok_or_else(|| {
                self.error(format!("'{keyword}' is not a namespace keyword"))
            })?;
            let mut definition = Definition::new(kind, self.name("Namespace name")?);
            definition.position = Some(SourcePosition { line });
            self.expect(Tok::Open)?;
            while self.peek() != Some(&Tok::Close) {
                let (keyword, line) = self.word("a node keyword")?;
                definition.nodes.push(self.node(&keyword, line)?);
            }
            self.expect(Tok::Close)?;
            definitions.push(definition);
        }
        Ok(definitions)
    }

    fn node(&mut self, keyword: &str, line: usize) -> Result<Node, AssuranceError> {
        let kind = NodeKind::from_keyword(keyword)
            .ok_or_else(|| self.error(format!("'{keyword}' is not a node keyword")))?;
        let mut node = Node::new(kind, self.name("Node name")?);
        node.position = Some(SourcePosition { line });
        self.expect(Tok::Open)?;
        loop {
            let (word, line) = match self.next("a node entry or '}'")? {
                (Tok::Close, _) => break,
                (Tok::Word(word), line) => (word, line),
                (other, _) => {
                    self.pos -= 1;
                    return Err(self.error(format!(
                        "expected a node entry, found {}",
                        other.describe()
                    )));
                }
            };
            if NodeKind::from_keyword(&word).is_some() {
                node.details.push(Detail::Declaration(self.node(&word, line)?));
                continue;
            }
            self.expect(Tok::Colon)?;
            match word.as_str() {
                "uuid" => node.uuid = Some(self.string("a uuid string")?),
                "summary" => node.summary = Some(self.string("summary text")?),
                "info" => node.info = Some(self.string("info text")?),
                "label" => {
                    let label = self.name("Label")?;
                    if !node.labels.contains(&label) {
                        node.labels.push(label);
                    }
                }
                "artifact" => node.artifacts.push(self.string("an artifact uri")?),
                "status" => {
                    let (status, _) = self.word("a status")?;
                    node.status = Some(status.parse().map_err(|e| self.error(format!("{e}")))?);
                }
                other => {
                    let relation = match other.strip_prefix("ref_") {
                        Some(kind) => NodeKind::from_keyword(kind)
                            .map(|k| k.default_relation())
                            .ok_or_else(|| self.error(format!("unknown reference kind '{kind}'")))?,
                        None => other.parse::<Relation>().map_err(|_| {
                            self.error(format!("unknown node entry '{other}'"))
                        })?,
                    };
                    let (target, _) = self.word("a dotted node identifier")?;
                    node.details.push(Detail::Reference(Reference {
                        relation,
                        target: NodeKey::from_dotted(&target),
                    }));
                }
            }
            self.expect(Tok::Semi)?;
        }
        Ok(node)
    }
}

/// Reads and writes the `.gsn` notation.
#[derive(Debug, Clone)]
pub struct GsnCodec {
    indent: String,
}

impl Default for GsnCodec {
    fn default() -> Self {
        GsnCodec::new("    ")
    }
}

impl GsnCodec {
    pub fn new(indent: &str) -> Self {
        GsnCodec {
            indent: indent.to_string(),
        }
    }

    fn line(&self, out: &mut String, depth: usize, text: &str) -> Result<(), AssuranceError> {
        writeln!(out, "{}{text}", self.indent.repeat(depth))?;
        Ok(())
    }

    fn write_node(
        &self,
        out: &mut String,
        depth: usize,
        id: &NodeKey,
        node: &Node,
    ) -> Result<(), AssuranceError> {
        let plain = |what: &str, value: &str| -> Result<(), AssuranceError> {
            if value.contains('"') {
                return Err(AssuranceError::Codec(format!(
                    "{what} of {id} contains '\"' and cannot be written"
                )));
            }
            Ok(())
        };
        let text = |what: &str, value: &str| -> Result<(), AssuranceError> {
            if value.contains(TEXT_DELIMITER) {
                return Err(AssuranceError::Codec(format!(
                    "{what} of {id} contains ''' and cannot be written"
                )));
            }
            Ok(())
        };

        self.line(out, depth, &format!("{} {}", node.kind.keyword(), node.name))?;
        self.line(out, depth, "{")?;
        let inner = depth + 1;
        if let Some(uuid) = node.uuid.as_ref() {
            plain("uuid", uuid)?;
            self.line(out, inner, &format!("uuid:\"{uuid}\";"))?;
        }
        if let Some(summary) = node.summary.as_ref() {
            text("summary", summary)?;
            self.line(out, inner, &format!("summary:'''{summary}''';"))?;
        }
        if let Some(info) = node.info.as_ref() {
            text("info", info)?;
            self.line(out, inner, &format!("info:'''{info}''';"))?;
        }
        if let Some(status) = node.status.as_ref() {
            self.line(out, inner, &format!("status:{status};"))?;
        }
        for label in node.labels.iter() {
            self.line(out, inner, &format!("label:{label};"))?;
        }
        for artifact in node.artifacts.iter() {
            plain("artifact", artifact)?;
            self.line(out, inner, &format!("artifact:\"{artifact}\";"))?;
        }
        for detail in node.details.iter() {
            match detail {
                Detail::Declaration(child) => {
                    self.write_node(out, inner, &id.child(&child.name), child)?
                }
                Detail::Reference(reference) => self.line(
                    out,
                    inner,
                    &format!("{}: {};", reference.relation, reference.target.to_dotted()),
                )?,
            }
        }
        self.line(out, depth, "}")
    }
}

impl DocCodec for GsnCodec {
    fn parse(&self, content: &str, path: &Path) -> Result<Document, AssuranceError> {
        let mut parser = Parser {
            tokens: lex(content, path)?,
            pos: 0,
            path,
        };
        let mut doc = Document::new(path);
        doc.definitions = parser.document()?;
        Ok(doc)
    }

    fn generate_source(&self, doc: &Document) -> Result<String, AssuranceError> {
        let mut out = String::new();
        for (idx, definition) in doc.definitions.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            self.line(
                &mut out,
                0,
                &format!("{} {}", definition.kind.namespace_keyword(), definition.name),
            )?;
            self.line(&mut out, 0, "{")?;
            for node in definition.nodes.iter() {
                let id = NodeKey::root(&definition.name, &node.name);
                self.write_node(&mut out, 1, &id, node)?;
            }
            self.line(&mut out, 0, "}")?;
        }
        Ok(out)
    }
}
