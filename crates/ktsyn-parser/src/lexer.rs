//! Lexer using Logos
//!
//! Produces every token of the input, trivia included, so the syntax tree can
//! reproduce the source byte for byte. Soft keywords are lexed as identifiers;
//! the parser decides where they act as keywords.

use crate::syntax::SyntaxKind;
use logos::Logos;
use std::fmt;

/// Raw tokens
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    // Trivia
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,
    #[regex(r"//[^\n]*")]
    EolComment,
    /// Block or doc comment. Nests, may run to end of input.
    #[token("/*", block_comment)]
    BlockComment(BlockComment),
    #[regex(r"#![^\n]*", |lex| lex.span().start == 0)]
    Shebang,

    // Hard keywords
    #[token("package")]
    Package,
    #[token("as")]
    As,
    #[token("typealias")]
    Typealias,
    #[token("class")]
    Class,
    #[token("this")]
    This,
    #[token("super")]
    Super,
    #[token("val")]
    Val,
    #[token("var")]
    Var,
    #[token("fun")]
    Fun,
    #[token("for")]
    For,
    #[token("null")]
    Null,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("is")]
    Is,
    #[token("in")]
    In,
    #[token("throw")]
    Throw,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("object")]
    Object,
    #[token("if")]
    If,
    #[token("try")]
    Try,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("when")]
    When,
    #[token("interface")]
    Interface,
    #[token("typeof")]
    Typeof,

    // Names and literals
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    #[regex(r"`[^`\r\n]+`")]
    Identifier,
    #[regex(r"[0-9][0-9_]*[lLuU]*")]
    #[regex(r"0[xX][0-9a-fA-F_]+[lLuU]*")]
    #[regex(r"0[bB][01_]+[lLuU]*")]
    IntegerLiteral,
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?[fF]?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?[fF]?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+[fF]?")]
    #[regex(r"[0-9][0-9_]*[fF]")]
    FloatLiteral,
    #[regex(r"'([^'\\\n]|\\[^\n])*'")]
    CharacterLiteral,
    #[token("\"", string_literal)]
    StringLiteral,

    // Brackets
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LPar,
    #[token(")")]
    RPar,

    // Operators
    #[token(".")]
    Dot,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("*")]
    Mul,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("!")]
    Excl,
    #[token("/")]
    Div,
    #[token("%")]
    Perc,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("===")]
    EqEqEq,
    #[token("!==")]
    ExclEqEqEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    ExclEq,
    #[token("&&")]
    AndAnd,
    #[token("&")]
    And,
    #[token("||")]
    OrOr,
    #[token("?")]
    Quest,
    #[token("::")]
    ColonColon,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("..")]
    Range,
    #[token("..<")]
    RangeUntil,
    #[token("=")]
    Eq,
    #[token("*=")]
    MultEq,
    #[token("/=")]
    DivEq,
    #[token("%=")]
    PercEq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token(",")]
    Comma,
    #[token("->")]
    Arrow,
    #[token("=>")]
    DoubleArrow,
    #[token("#")]
    Hash,
    #[token("@")]
    At,

    // Error token
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    Block,
    Doc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockComment {
    pub style: CommentStyle,
    /// False when input ended before every nested `/*` was closed
    pub closed: bool,
}

/// Consume the rest of a (possibly nested) block comment after the opening `/*`.
/// Runs to end of input when the comment is never closed.
fn block_comment(lex: &mut logos::Lexer<Token>) -> BlockComment {
    let rest = lex.remainder();
    let style = if rest.starts_with('*') && !rest.starts_with("*/") {
        CommentStyle::Doc
    } else {
        CommentStyle::Block
    };
    let bytes = rest.as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"*/") {
            i += 2;
            depth -= 1;
            if depth == 0 {
                break;
            }
        } else if bytes[i..].starts_with(b"/*") {
            i += 2;
            depth += 1;
        } else {
            i += 1;
        }
    }
    lex.bump(i);
    BlockComment {
        style,
        closed: depth == 0,
    }
}

/// Consume a string literal after its opening quote. Templates (`${...}`) stay
/// inside the literal; raw strings (`"""`) may span lines.
fn string_literal(lex: &mut logos::Lexer<Token>) {
    let rest = lex.remainder();
    let bytes = rest.as_bytes();

    if rest.starts_with("\"\"") {
        // Raw string: ends at the first `"""`, plus any extra trailing quotes.
        let mut i = 2;
        while i < bytes.len() {
            if bytes[i..].starts_with(b"\"\"\"") {
                i += 3;
                while i < bytes.len() && bytes[i] == b'"' {
                    i += 1;
                }
                break;
            }
            i += 1;
        }
        lex.bump(i.min(bytes.len()));
        return;
    }

    let mut i = 0;
    let mut braces = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() && bytes[i + 1] != b'\n' => i += 2,
            b'\n' if braces == 0 => break,
            b'"' if braces == 0 => {
                i += 1;
                break;
            }
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                braces += 1;
                i += 2;
            }
            b'{' if braces > 0 => {
                braces += 1;
                i += 1;
            }
            b'}' if braces > 0 => {
                braces -= 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    // An escape before a multi-byte character can overshoot a char boundary.
    while !rest.is_char_boundary(i.min(rest.len())) {
        i += 1;
    }
    lex.bump(i.min(rest.len()));
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SyntaxKind::from(*self).description())
    }
}

/// Token with position information
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithPos {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}

impl TokenWithPos {
    pub fn kind(&self) -> SyntaxKind {
        self.token.into()
    }

    /// A block or doc comment cut off by end of input
    pub fn is_unclosed_comment(&self) -> bool {
        matches!(self.token, Token::BlockComment(BlockComment { closed: false, .. }))
    }
}

/// Lexer wrapper
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, Token>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: Token::lexer(source),
        }
    }

    /// Get the next token with position
    pub fn next_token(&mut self) -> Option<TokenWithPos> {
        self.inner.next().map(|result| {
            let token = result.unwrap_or(Token::Error);
            let span = self.inner.span();
            TokenWithPos { token, span }
        })
    }

    /// Tokenize entire source into a vector
    pub fn tokenize(&mut self) -> Vec<TokenWithPos> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    /// Get current source slice
    pub fn slice(&self) -> &'a str {
        self.inner.slice()
    }

    /// Get current span
    pub fn span(&self) -> std::ops::Range<usize> {
        self.inner.span()
    }
}

/// Convert raw tokens to syntax kinds
impl From<Token> for SyntaxKind {
    fn from(token: Token) -> Self {
        use SyntaxKind::*;

        match token {
            Token::Whitespace => WHITESPACE,
            Token::EolComment => EOL_COMMENT,
            Token::BlockComment(BlockComment {
                style: CommentStyle::Block,
                ..
            }) => BLOCK_COMMENT,
            Token::BlockComment(BlockComment {
                style: CommentStyle::Doc,
                ..
            }) => DOC_COMMENT,
            Token::Shebang => SHEBANG_COMMENT,

            Token::Package => PACKAGE_KW,
            Token::As => AS_KW,
            Token::Typealias => TYPEALIAS_KW,
            Token::Class => CLASS_KW,
            Token::This => THIS_KW,
            Token::Super => SUPER_KW,
            Token::Val => VAL_KW,
            Token::Var => VAR_KW,
            Token::Fun => FUN_KW,
            Token::For => FOR_KW,
            Token::Null => NULL_KW,
            Token::True => TRUE_KW,
            Token::False => FALSE_KW,
            Token::Is => IS_KW,
            Token::In => IN_KW,
            Token::Throw => THROW_KW,
            Token::Return => RETURN_KW,
            Token::Break => BREAK_KW,
            Token::Continue => CONTINUE_KW,
            Token::Object => OBJECT_KW,
            Token::If => IF_KW,
            Token::Try => TRY_KW,
            Token::Else => ELSE_KW,
            Token::While => WHILE_KW,
            Token::Do => DO_KW,
            Token::When => WHEN_KW,
            Token::Interface => INTERFACE_KW,
            Token::Typeof => TYPEOF_KW,

            Token::Identifier => IDENTIFIER,
            Token::IntegerLiteral => INTEGER_LITERAL,
            Token::FloatLiteral => FLOAT_LITERAL,
            Token::CharacterLiteral => CHARACTER_LITERAL,
            Token::StringLiteral => STRING_LITERAL,

            Token::LBracket => LBRACKET,
            Token::RBracket => RBRACKET,
            Token::LBrace => LBRACE,
            Token::RBrace => RBRACE,
            Token::LPar => LPAR,
            Token::RPar => RPAR,

            Token::Dot => DOT,
            Token::PlusPlus => PLUSPLUS,
            Token::MinusMinus => MINUSMINUS,
            Token::Mul => MUL,
            Token::Plus => PLUS,
            Token::Minus => MINUS,
            Token::Excl => EXCL,
            Token::Div => DIV,
            Token::Perc => PERC,
            Token::Lt => LT,
            Token::Gt => GT,
            Token::LtEq => LTEQ,
            Token::GtEq => GTEQ,
            Token::EqEqEq => EQEQEQ,
            Token::ExclEqEqEq => EXCLEQEQEQ,
            Token::EqEq => EQEQ,
            Token::ExclEq => EXCLEQ,
            Token::AndAnd => ANDAND,
            Token::And => AND,
            Token::OrOr => OROR,
            Token::Quest => QUEST,
            Token::ColonColon => COLONCOLON,
            Token::Colon => COLON,
            Token::Semicolon => SEMICOLON,
            Token::Range => RANGE,
            Token::RangeUntil => RANGE_UNTIL,
            Token::Eq => EQ,
            Token::MultEq => MULTEQ,
            Token::DivEq => DIVEQ,
            Token::PercEq => PERCEQ,
            Token::PlusEq => PLUSEQ,
            Token::MinusEq => MINUSEQ,
            Token::Comma => COMMA,
            Token::Arrow => ARROW,
            Token::DoubleArrow => DOUBLE_ARROW,
            Token::Hash => HASH,
            Token::At => AT,

            Token::Error => BAD_CHARACTER,
        }
    }
}
