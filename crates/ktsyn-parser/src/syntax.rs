//! Syntax tree definitions using Rowan
//!
//! This module defines the syntax kinds shared by the lexer, the parser and the
//! green tree, plus the soft-keyword table.

/// Syntax kinds for tokens and nodes
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // === Sentinels ===
    /// Dropped marker, never reaches the tree
    TOMBSTONE,
    /// Returned by lookahead past the end of input
    EOF,
    /// Synthetic member of recovery sets: end of input, `;` or a line break
    EOL_OR_SEMICOLON,

    // === Trivia ===
    WHITESPACE,
    EOL_COMMENT,
    BLOCK_COMMENT,
    DOC_COMMENT,
    SHEBANG_COMMENT,

    // === Literals and names ===
    IDENTIFIER,
    INTEGER_LITERAL,
    FLOAT_LITERAL,
    CHARACTER_LITERAL,
    STRING_LITERAL,

    // === Hard keywords ===
    PACKAGE_KW,
    AS_KW,
    TYPEALIAS_KW,
    CLASS_KW,
    THIS_KW,
    SUPER_KW,
    VAL_KW,
    VAR_KW,
    FUN_KW,
    FOR_KW,
    NULL_KW,
    TRUE_KW,
    FALSE_KW,
    IS_KW,
    IN_KW,
    THROW_KW,
    RETURN_KW,
    BREAK_KW,
    CONTINUE_KW,
    OBJECT_KW,
    IF_KW,
    TRY_KW,
    ELSE_KW,
    WHILE_KW,
    DO_KW,
    WHEN_KW,
    INTERFACE_KW,
    TYPEOF_KW,

    // === Soft keywords (lexed as IDENTIFIER, remapped by the parser) ===
    FILE_KW,
    IMPORT_KW,
    WHERE_KW,
    BY_KW,
    GET_KW,
    SET_KW,
    ABSTRACT_KW,
    ENUM_KW,
    CONTRACT_KW,
    OPEN_KW,
    INNER_KW,
    OVERRIDE_KW,
    PRIVATE_KW,
    PUBLIC_KW,
    INTERNAL_KW,
    PROTECTED_KW,
    CATCH_KW,
    FINALLY_KW,
    OUT_KW,
    FINAL_KW,
    VARARG_KW,
    REIFIED_KW,
    DYNAMIC_KW,
    COMPANION_KW,
    CONSTRUCTOR_KW,
    INIT_KW,
    SEALED_KW,
    FIELD_KW,
    PROPERTY_KW,
    RECEIVER_KW,
    PARAM_KW,
    SETPARAM_KW,
    DELEGATE_KW,
    LATEINIT_KW,
    DATA_KW,
    INLINE_KW,
    NOINLINE_KW,
    TAILREC_KW,
    EXTERNAL_KW,
    ANNOTATION_KW,
    CROSSINLINE_KW,
    CONST_KW,
    OPERATOR_KW,
    INFIX_KW,
    SUSPEND_KW,
    EXPECT_KW,
    ACTUAL_KW,
    VALUE_KW,
    CONTEXT_KW,
    ALL_KW,

    // === Punctuation and operators ===
    LBRACKET,
    RBRACKET,
    LBRACE,
    RBRACE,
    LPAR,
    RPAR,
    DOT,
    PLUSPLUS,
    MINUSMINUS,
    MUL,
    PLUS,
    MINUS,
    EXCL,
    DIV,
    PERC,
    LT,
    GT,
    LTEQ,
    GTEQ,
    EQEQEQ,
    EXCLEQEQEQ,
    EQEQ,
    EXCLEQ,
    ANDAND,
    AND,
    OROR,
    QUEST,
    COLONCOLON,
    COLON,
    SEMICOLON,
    RANGE,
    RANGE_UNTIL,
    EQ,
    MULTEQ,
    DIVEQ,
    PERCEQ,
    PLUSEQ,
    MINUSEQ,
    COMMA,
    ARROW,
    DOUBLE_ARROW,
    HASH,
    AT,
    BAD_CHARACTER,

    // Joined from two adjacent raw tokens while complex-token joining is on
    SAFE_ACCESS,
    ELVIS,
    EXCLEXCL,
    NOT_IN,
    NOT_IS,
    AS_SAFE,

    // === Nodes ===
    ERROR,

    // Files and fragments
    FILE,
    SCRIPT,
    TYPE_CODE_FRAGMENT,
    EXPRESSION_CODE_FRAGMENT,
    BLOCK_CODE_FRAGMENT,

    // Preamble
    FILE_ANNOTATION_LIST,
    PACKAGE_DIRECTIVE,
    IMPORT_LIST,
    IMPORT_DIRECTIVE,
    IMPORT_ALIAS,

    // Modifiers and annotations
    MODIFIER_LIST,
    ANNOTATION,
    ANNOTATION_ENTRY,
    ANNOTATION_TARGET,
    CONSTRUCTOR_CALLEE,
    CONTEXT_RECEIVER_LIST,
    CONTEXT_RECEIVER,

    // Declarations
    CLASS,
    OBJECT_DECLARATION,
    CLASS_BODY,
    ENUM_ENTRY,
    INITIALIZER_LIST,
    ENUM_ENTRY_SUPERCLASS_REFERENCE_EXPRESSION,
    PRIMARY_CONSTRUCTOR,
    SECONDARY_CONSTRUCTOR,
    CONSTRUCTOR_DELEGATION_CALL,
    CONSTRUCTOR_DELEGATION_REFERENCE,
    CLASS_INITIALIZER,
    SUPER_TYPE_LIST,
    SUPER_TYPE_ENTRY,
    SUPER_TYPE_CALL_ENTRY,
    DELEGATED_SUPER_TYPE_ENTRY,
    FUN,
    PROPERTY,
    DESTRUCTURING_DECLARATION,
    DESTRUCTURING_DECLARATION_ENTRY,
    PROPERTY_DELEGATE,
    PROPERTY_ACCESSOR,
    BACKING_FIELD,
    TYPEALIAS,
    CONTRACT_EFFECT_LIST,
    CONTRACT_EFFECT,

    // Parameters
    TYPE_PARAMETER_LIST,
    TYPE_PARAMETER,
    TYPE_CONSTRAINT_LIST,
    TYPE_CONSTRAINT,
    VALUE_PARAMETER_LIST,
    VALUE_PARAMETER,

    // Types
    TYPE_REFERENCE,
    USER_TYPE,
    DYNAMIC_TYPE,
    FUNCTION_TYPE,
    FUNCTION_TYPE_RECEIVER,
    NULLABLE_TYPE,
    INTERSECTION_TYPE,
    TYPE_ARGUMENT_LIST,
    TYPE_PROJECTION,

    // Expressions
    BLOCK,
    REFERENCE_EXPRESSION,
    DOT_QUALIFIED_EXPRESSION,
    SAFE_ACCESS_EXPRESSION,
    INTEGER_CONSTANT,
    FLOAT_CONSTANT,
    CHARACTER_CONSTANT,
    BOOLEAN_CONSTANT,
    NULL,
    STRING_TEMPLATE,
    THIS_EXPRESSION,
    SUPER_EXPRESSION,
    PARENTHESIZED,
    CALL_EXPRESSION,
    ARRAY_ACCESS_EXPRESSION,
    INDICES,
    PREFIX_EXPRESSION,
    POSTFIX_EXPRESSION,
    BINARY_EXPRESSION,
    BINARY_WITH_TYPE,
    IS_EXPRESSION,
    OPERATION_REFERENCE,
    CALLABLE_REFERENCE_EXPRESSION,
    CLASS_LITERAL_EXPRESSION,
    COLLECTION_LITERAL_EXPRESSION,
    VALUE_ARGUMENT_LIST,
    VALUE_ARGUMENT,
    VALUE_ARGUMENT_NAME,
    LAMBDA_ARGUMENT,
    LAMBDA_EXPRESSION,
    FUNCTION_LITERAL,
    OBJECT_LITERAL,
    ANNOTATED_EXPRESSION,
    LABELED_EXPRESSION,
    LABEL_QUALIFIER,
    LABEL,
    IF,
    CONDITION,
    THEN,
    ELSE,
    WHEN,
    WHEN_ENTRY,
    WHEN_CONDITION_EXPRESSION,
    WHEN_CONDITION_IN_RANGE,
    WHEN_CONDITION_IS_PATTERN,
    TRY,
    CATCH,
    FINALLY,
    FOR,
    LOOP_RANGE,
    BODY,
    WHILE,
    DO_WHILE,
    RETURN,
    THROW,
    BREAK,
    CONTINUE,
    SCRIPT_INITIALIZER,

    // Placeholder for the end
    __LAST,
}

use SyntaxKind::*;

impl SyntaxKind {
    /// Check if this is a trivia token (whitespace or comment)
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            WHITESPACE | EOL_COMMENT | BLOCK_COMMENT | DOC_COMMENT | SHEBANG_COMMENT
        )
    }

    /// Check if this is a comment of any flavour
    pub fn is_comment(self) -> bool {
        self.is_trivia() && self != WHITESPACE
    }

    /// Check if this is a hard (reserved) keyword
    pub fn is_hard_keyword(self) -> bool {
        (PACKAGE_KW as u16..=TYPEOF_KW as u16).contains(&(self as u16))
    }

    /// Check if this is a soft (contextual) keyword
    pub fn is_soft_keyword(self) -> bool {
        (FILE_KW as u16..=ALL_KW as u16).contains(&(self as u16))
    }

    pub fn is_keyword(self) -> bool {
        self.is_hard_keyword() || self.is_soft_keyword()
    }

    /// Check if this kind is a leaf (token) rather than a node
    pub fn is_token(self) -> bool {
        (self as u16) < ERROR as u16
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            INTEGER_LITERAL | FLOAT_LITERAL | CHARACTER_LITERAL | STRING_LITERAL
        )
    }

    /// Look up the soft keyword spelled by `text`
    pub fn from_soft_keyword(text: &str) -> Option<SyntaxKind> {
        let kind = match text {
            "file" => FILE_KW,
            "import" => IMPORT_KW,
            "where" => WHERE_KW,
            "by" => BY_KW,
            "get" => GET_KW,
            "set" => SET_KW,
            "abstract" => ABSTRACT_KW,
            "enum" => ENUM_KW,
            "contract" => CONTRACT_KW,
            "open" => OPEN_KW,
            "inner" => INNER_KW,
            "override" => OVERRIDE_KW,
            "private" => PRIVATE_KW,
            "public" => PUBLIC_KW,
            "internal" => INTERNAL_KW,
            "protected" => PROTECTED_KW,
            "catch" => CATCH_KW,
            "finally" => FINALLY_KW,
            "out" => OUT_KW,
            "final" => FINAL_KW,
            "vararg" => VARARG_KW,
            "reified" => REIFIED_KW,
            "dynamic" => DYNAMIC_KW,
            "companion" => COMPANION_KW,
            "constructor" => CONSTRUCTOR_KW,
            "init" => INIT_KW,
            "sealed" => SEALED_KW,
            "field" => FIELD_KW,
            "property" => PROPERTY_KW,
            "receiver" => RECEIVER_KW,
            "param" => PARAM_KW,
            "setparam" => SETPARAM_KW,
            "delegate" => DELEGATE_KW,
            "lateinit" => LATEINIT_KW,
            "data" => DATA_KW,
            "inline" => INLINE_KW,
            "noinline" => NOINLINE_KW,
            "tailrec" => TAILREC_KW,
            "external" => EXTERNAL_KW,
            "annotation" => ANNOTATION_KW,
            "crossinline" => CROSSINLINE_KW,
            "const" => CONST_KW,
            "operator" => OPERATOR_KW,
            "infix" => INFIX_KW,
            "suspend" => SUSPEND_KW,
            "expect" => EXPECT_KW,
            "actual" => ACTUAL_KW,
            "value" => VALUE_KW,
            "context" => CONTEXT_KW,
            "all" => ALL_KW,
            _ => return None,
        };
        Some(kind)
    }

    /// Surface text of a keyword, hard or soft
    pub fn keyword_text(self) -> Option<&'static str> {
        let text = match self {
            PACKAGE_KW => "package",
            AS_KW => "as",
            TYPEALIAS_KW => "typealias",
            CLASS_KW => "class",
            THIS_KW => "this",
            SUPER_KW => "super",
            VAL_KW => "val",
            VAR_KW => "var",
            FUN_KW => "fun",
            FOR_KW => "for",
            NULL_KW => "null",
            TRUE_KW => "true",
            FALSE_KW => "false",
            IS_KW => "is",
            IN_KW => "in",
            THROW_KW => "throw",
            RETURN_KW => "return",
            BREAK_KW => "break",
            CONTINUE_KW => "continue",
            OBJECT_KW => "object",
            IF_KW => "if",
            TRY_KW => "try",
            ELSE_KW => "else",
            WHILE_KW => "while",
            DO_KW => "do",
            WHEN_KW => "when",
            INTERFACE_KW => "interface",
            TYPEOF_KW => "typeof",
            FILE_KW => "file",
            IMPORT_KW => "import",
            WHERE_KW => "where",
            BY_KW => "by",
            GET_KW => "get",
            SET_KW => "set",
            ABSTRACT_KW => "abstract",
            ENUM_KW => "enum",
            CONTRACT_KW => "contract",
            OPEN_KW => "open",
            INNER_KW => "inner",
            OVERRIDE_KW => "override",
            PRIVATE_KW => "private",
            PUBLIC_KW => "public",
            INTERNAL_KW => "internal",
            PROTECTED_KW => "protected",
            CATCH_KW => "catch",
            FINALLY_KW => "finally",
            OUT_KW => "out",
            FINAL_KW => "final",
            VARARG_KW => "vararg",
            REIFIED_KW => "reified",
            DYNAMIC_KW => "dynamic",
            COMPANION_KW => "companion",
            CONSTRUCTOR_KW => "constructor",
            INIT_KW => "init",
            SEALED_KW => "sealed",
            FIELD_KW => "field",
            PROPERTY_KW => "property",
            RECEIVER_KW => "receiver",
            PARAM_KW => "param",
            SETPARAM_KW => "setparam",
            DELEGATE_KW => "delegate",
            LATEINIT_KW => "lateinit",
            DATA_KW => "data",
            INLINE_KW => "inline",
            NOINLINE_KW => "noinline",
            TAILREC_KW => "tailrec",
            EXTERNAL_KW => "external",
            ANNOTATION_KW => "annotation",
            CROSSINLINE_KW => "crossinline",
            CONST_KW => "const",
            OPERATOR_KW => "operator",
            INFIX_KW => "infix",
            SUSPEND_KW => "suspend",
            EXPECT_KW => "expect",
            ACTUAL_KW => "actual",
            VALUE_KW => "value",
            CONTEXT_KW => "context",
            ALL_KW => "all",
            _ => return None,
        };
        Some(text)
    }

    /// Human-readable description used in diagnostics
    pub fn description(self) -> &'static str {
        if let Some(text) = self.keyword_text() {
            return text;
        }
        match self {
            EOF => "end of file",
            EOL_OR_SEMICOLON => "newline or ';'",
            IDENTIFIER => "identifier",
            INTEGER_LITERAL => "integer literal",
            FLOAT_LITERAL => "floating point literal",
            CHARACTER_LITERAL => "character literal",
            STRING_LITERAL => "string literal",
            LBRACKET => "'['",
            RBRACKET => "']'",
            LBRACE => "'{'",
            RBRACE => "'}'",
            LPAR => "'('",
            RPAR => "')'",
            DOT => "'.'",
            PLUSPLUS => "'++'",
            MINUSMINUS => "'--'",
            MUL => "'*'",
            PLUS => "'+'",
            MINUS => "'-'",
            EXCL => "'!'",
            DIV => "'/'",
            PERC => "'%'",
            LT => "'<'",
            GT => "'>'",
            LTEQ => "'<='",
            GTEQ => "'>='",
            EQEQEQ => "'==='",
            EXCLEQEQEQ => "'!=='",
            EQEQ => "'=='",
            EXCLEQ => "'!='",
            ANDAND => "'&&'",
            AND => "'&'",
            OROR => "'||'",
            QUEST => "'?'",
            COLONCOLON => "'::'",
            COLON => "':'",
            SEMICOLON => "';'",
            RANGE => "'..'",
            RANGE_UNTIL => "'..<'",
            EQ => "'='",
            MULTEQ => "'*='",
            DIVEQ => "'/='",
            PERCEQ => "'%='",
            PLUSEQ => "'+='",
            MINUSEQ => "'-='",
            COMMA => "','",
            ARROW => "'->'",
            DOUBLE_ARROW => "'=>'",
            HASH => "'#'",
            AT => "'@'",
            SAFE_ACCESS => "'?.'",
            ELVIS => "'?:'",
            EXCLEXCL => "'!!'",
            NOT_IN => "'!in'",
            NOT_IS => "'!is'",
            AS_SAFE => "'as?'",
            WHITESPACE => "whitespace",
            EOL_COMMENT | BLOCK_COMMENT | DOC_COMMENT | SHEBANG_COMMENT => "comment",
            BAD_CHARACTER => "unexpected character",
            _ => "syntax node",
        }
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for Rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KtLanguage {}

impl rowan::Language for KtLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 < (__LAST as u16));
        // SAFETY: `SyntaxKind` is `repr(u16)` and the bound was checked above.
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<KtLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<KtLanguage>;
pub type SyntaxElement = rowan::NodeOrToken<SyntaxNode, SyntaxToken>;
pub type SyntaxNodeChildren = rowan::SyntaxNodeChildren<KtLanguage>;

/// Extension methods for SyntaxNode
pub trait SyntaxNodeExt {
    /// Get the first child of a specific kind
    fn first_child_of_kind(&self, kind: SyntaxKind) -> Option<SyntaxNode>;

    /// Get all children of a specific kind
    fn children_of_kind(&self, kind: SyntaxKind) -> Vec<SyntaxNode>;

    /// Get the first token of a specific kind
    fn first_token_of_kind(&self, kind: SyntaxKind) -> Option<SyntaxToken>;

    /// Get all descendant nodes (including self) of a specific kind
    fn descendants_of_kind(&self, kind: SyntaxKind) -> Vec<SyntaxNode>;
}

impl SyntaxNodeExt for SyntaxNode {
    fn first_child_of_kind(&self, kind: SyntaxKind) -> Option<SyntaxNode> {
        self.children().find(|n| n.kind() == kind)
    }

    fn children_of_kind(&self, kind: SyntaxKind) -> Vec<SyntaxNode> {
        self.children().filter(|n| n.kind() == kind).collect()
    }

    fn first_token_of_kind(&self, kind: SyntaxKind) -> Option<SyntaxToken> {
        self.children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| t.kind() == kind)
    }

    fn descendants_of_kind(&self, kind: SyntaxKind) -> Vec<SyntaxNode> {
        self.descendants().filter(|n| n.kind() == kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::Language;

    #[test]
    fn test_soft_keyword_table_round_trips() {
        for raw in FILE_KW as u16..=ALL_KW as u16 {
            let kind = KtLanguage::kind_from_raw(rowan::SyntaxKind(raw));
            let text = kind.keyword_text().unwrap();
            assert_eq!(SyntaxKind::from_soft_keyword(text), Some(kind));
        }
    }

    #[test]
    fn test_hard_keywords_are_not_soft() {
        assert!(CLASS_KW.is_hard_keyword());
        assert!(!CLASS_KW.is_soft_keyword());
        assert_eq!(SyntaxKind::from_soft_keyword("class"), None);
        assert!(GET_KW.is_soft_keyword());
    }

    #[test]
    fn test_token_node_split() {
        assert!(IDENTIFIER.is_token());
        assert!(AS_SAFE.is_token());
        assert!(!ERROR.is_token());
        assert!(!CLASS.is_token());
        assert!(DOC_COMMENT.is_trivia());
        assert!(DOC_COMMENT.is_comment());
        assert!(!WHITESPACE.is_comment());
    }
}
