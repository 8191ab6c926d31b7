// File: src/core/newick.rs
//! Newick reader: a small lexer with explicit modes feeding a stack-based
//! parser. The output is a flat pre-order node list per tree; turning it
//! into a queryable forest is `core::tree`'s job.
//!
//! Accepted syntax per node, after an optional parenthesised child list:
//! a label (bare or `'quoted'`), a `:branch-length`, `#a/b` annotation
//! labels and `[comment]` blocks, in any order. Every tree ends with `;`.

use crate::error::{ProjectionError, Result};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Open,
    Close,
    Comma,
    Semicolon,
    Label(String),
    BranchLength(String),
    Annotation(String),
    Comment(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Open => write!(f, "'('"),
            TokenKind::Close => write!(f, "')'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Label(s) => write!(f, "label '{}'", s),
            TokenKind::BranchLength(s) => write!(f, "branch length ':{}'", s),
            TokenKind::Annotation(s) => write!(f, "annotation '#{}'", s),
            TokenKind::Comment(s) => write!(f, "comment '[{}]'", s),
        }
    }
}

/// A token and the char offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Lexer modes and their transitions.
///
/// - `Between`: `(`, `)`, `,` and `;` are emitted directly. `:` enters
///   `BranchLength`, `#` enters `Annotation`, `[` enters `Comment`, `'`
///   enters `Quoted`. Whitespace is skipped; any other char starts a `Label`.
/// - `Label`: ends at punctuation, `:`, `#` or `[`. Surrounding whitespace
///   is trimmed, inner whitespace kept.
/// - `BranchLength`: ends at punctuation, `#` or `[`.
/// - `Annotation`: ends at punctuation, `:` or `[`.
/// - `Comment`: ends at `]`, which is consumed.
/// - `Quoted`: ends at a lone `'`, which is consumed; `''` is a literal quote.
///
/// Ending an unquoted run re-reads the terminating char in `Between`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Between,
    Label,
    BranchLength,
    Annotation,
    Comment,
    Quoted,
}

fn is_punctuation(c: char) -> bool {
    matches!(c, '(' | ')' | ',' | ';')
}

impl LexState {
    fn ends_at(self, c: char) -> bool {
        match self {
            LexState::Label => is_punctuation(c) || matches!(c, ':' | '#' | '['),
            LexState::BranchLength => is_punctuation(c) || matches!(c, '#' | '['),
            LexState::Annotation => is_punctuation(c) || matches!(c, ':' | '['),
            LexState::Between | LexState::Comment | LexState::Quoted => false,
        }
    }
}

/// Splits Newick text into tokens. Fails on unterminated quotes and comments.
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut state = LexState::Between;
    let mut buf = String::new();
    let mut start = 0;
    let mut chars = text.chars().enumerate().peekable();

    while let Some((offset, c)) = chars.next() {
        match state {
            LexState::Quoted => {
                if c != '\'' {
                    buf.push(c);
                } else if matches!(chars.peek(), Some(&(_, '\''))) {
                    chars.next();
                    buf.push('\'');
                } else {
                    tokens.push(Token { kind: TokenKind::Label(std::mem::take(&mut buf)), offset: start });
                    state = LexState::Between;
                }
                continue;
            }
            LexState::Comment => {
                if c == ']' {
                    let text = std::mem::take(&mut buf).trim().to_string();
                    tokens.push(Token { kind: TokenKind::Comment(text), offset: start });
                    state = LexState::Between;
                } else {
                    buf.push(c);
                }
                continue;
            }
            _ => {}
        }

        if state.ends_at(c) {
            flush(state, &mut buf, start, &mut tokens);
            state = LexState::Between;
        }

        if state != LexState::Between {
            buf.push(c);
            continue;
        }

        let punctuation = match c {
            '(' => Some(TokenKind::Open),
            ')' => Some(TokenKind::Close),
            ',' => Some(TokenKind::Comma),
            ';' => Some(TokenKind::Semicolon),
            _ => None,
        };
        if let Some(kind) = punctuation {
            tokens.push(Token { kind, offset });
            continue;
        }

        start = offset;
        state = match c {
            ':' => LexState::BranchLength,
            '#' => LexState::Annotation,
            '[' => LexState::Comment,
            '\'' => LexState::Quoted,
            c if c.is_whitespace() => LexState::Between,
            c => {
                buf.push(c);
                LexState::Label
            }
        };
    }

    match state {
        LexState::Quoted => Err(ProjectionError::parse(start, "unterminated quoted label")),
        LexState::Comment => Err(ProjectionError::parse(start, "unterminated comment")),
        _ => {
            flush(state, &mut buf, start, &mut tokens);
            Ok(tokens)
        }
    }
}

fn flush(state: LexState, buf: &mut String, offset: usize, tokens: &mut Vec<Token>) {
    let text = std::mem::take(buf).trim().to_string();
    let kind = match state {
        LexState::Label => TokenKind::Label(text),
        LexState::BranchLength => TokenKind::BranchLength(text),
        LexState::Annotation => TokenKind::Annotation(text),
        _ => return,
    };
    tokens.push(Token { kind, offset });
}

/// One node of a parsed Newick tree. Links are indices into the owning
/// [`NewickTree`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewickNode {
    pub name: Option<String>,
    pub branch_length: Option<f64>,
    pub annotations: Vec<String>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Char offset of the node's first token.
    pub offset: usize,
}

impl NewickNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A parsed tree stored flat in pre-order: the root is at index 0 and every
/// parent precedes its children.
#[derive(Debug, Clone, PartialEq)]
pub struct NewickTree {
    nodes: Vec<NewickNode>,
}

impl NewickTree {
    pub fn root(&self) -> &NewickNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: usize) -> Option<&NewickNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[NewickNode] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<NewickNode> {
        self.nodes
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |t| t.offset)
    }

    /// tree := subtree ';'
    /// subtree := ( '(' subtree (',' subtree)* ')' )? suffix
    ///
    /// Open groups are kept on an explicit stack, so nesting depth is
    /// limited by memory only.
    fn tree(&mut self) -> Result<NewickTree> {
        let mut nodes: Vec<NewickNode> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        loop {
            let id = nodes.len();
            let parent = open.last().copied();
            nodes.push(NewickNode { parent, offset: self.offset(), ..NewickNode::default() });
            if let Some(parent) = parent {
                nodes[parent].children.push(id);
            }

            if matches!(self.peek(), Some(Token { kind: TokenKind::Open, .. })) {
                self.pos += 1;
                open.push(id);
                continue;
            }
            self.suffix(&mut nodes[id])?;

            // Close finished groups until a sibling follows or the tree ends.
            loop {
                let Some(&group) = open.last() else {
                    self.semicolon()?;
                    return Ok(NewickTree { nodes });
                };
                match self.advance() {
                    Some(Token { kind: TokenKind::Comma, .. }) => break,
                    Some(Token { kind: TokenKind::Close, .. }) => {
                        open.pop();
                        self.suffix(&mut nodes[group])?;
                    }
                    Some(token) => {
                        return Err(ProjectionError::parse(
                            token.offset,
                            format!("expected ',' or ')', found {}", token.kind),
                        ))
                    }
                    None => {
                        return Err(ProjectionError::parse(
                            self.end,
                            "unbalanced parentheses: missing ')'",
                        ))
                    }
                }
            }
        }
    }

    fn semicolon(&mut self) -> Result<()> {
        match self.advance() {
            Some(Token { kind: TokenKind::Semicolon, .. }) => Ok(()),
            Some(Token { kind: TokenKind::Close, offset }) => {
                Err(ProjectionError::parse(offset, "unbalanced parentheses: unexpected ')'"))
            }
            Some(token) => Err(ProjectionError::parse(
                token.offset,
                format!("expected ';', found {}", token.kind),
            )),
            None => Err(ProjectionError::parse(self.end, "missing ';' at end of tree")),
        }
    }

    /// suffix := (label | ':' length | '#' annotation | '[' comment ']')*
    fn suffix(&mut self, node: &mut NewickNode) -> Result<()> {
        while let Some(token) = self.peek() {
            let offset = token.offset;
            match &token.kind {
                TokenKind::Label(label) => {
                    if node.name.is_some() {
                        return Err(ProjectionError::parse(offset, format!("unexpected label '{}'", label)));
                    }
                    node.name = Some(label.clone());
                }
                TokenKind::BranchLength(text) => {
                    if node.branch_length.is_some() {
                        return Err(ProjectionError::parse(offset, "duplicate branch length"));
                    }
                    let length = text.parse::<f64>().map_err(|_| {
                        ProjectionError::parse(offset, format!("invalid branch length '{}'", text))
                    })?;
                    node.branch_length = Some(length);
                }
                TokenKind::Annotation(text) => {
                    node.annotations.extend(
                        text.split('/').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
                    );
                }
                TokenKind::Comment(text) => {
                    if !text.is_empty() {
                        node.annotations.push(text.clone());
                    }
                }
                _ => return Ok(()),
            }
            self.pos += 1;
        }
        Ok(())
    }
}

/// Parses every `;`-terminated tree in `text`. Blank input yields no trees.
pub fn parse_forest(text: &str) -> Result<Vec<NewickTree>> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens, pos: 0, end: text.chars().count() };
    let mut trees = Vec::new();
    while parser.peek().is_some() {
        trees.push(parser.tree()?);
    }
    Ok(trees)
}
