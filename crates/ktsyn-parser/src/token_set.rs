//! Fixed-size sets of syntax kinds used for first-sets and recovery sets

use crate::syntax::SyntaxKind::{self, *};

const WORDS: usize = (SyntaxKind::__LAST as usize) / 64 + 1;

/// A set of [`SyntaxKind`]s, usable in `const` context
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenSet([u64; WORDS]);

impl TokenSet {
    pub const EMPTY: TokenSet = TokenSet([0; WORDS]);

    pub const fn new(kinds: &[SyntaxKind]) -> TokenSet {
        let mut words = [0u64; WORDS];
        let mut i = 0;
        while i < kinds.len() {
            let raw = kinds[i] as usize;
            words[raw / 64] |= 1 << (raw % 64);
            i += 1;
        }
        TokenSet(words)
    }

    pub const fn union(self, other: TokenSet) -> TokenSet {
        let mut words = self.0;
        let mut i = 0;
        while i < WORDS {
            words[i] |= other.0[i];
            i += 1;
        }
        TokenSet(words)
    }

    pub const fn without(self, other: TokenSet) -> TokenSet {
        let mut words = self.0;
        let mut i = 0;
        while i < WORDS {
            words[i] &= !other.0[i];
            i += 1;
        }
        TokenSet(words)
    }

    pub const fn with(self, kind: SyntaxKind) -> TokenSet {
        let mut words = self.0;
        let raw = kind as usize;
        words[raw / 64] |= 1 << (raw % 64);
        TokenSet(words)
    }

    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let raw = kind as usize;
        self.0[raw / 64] & (1 << (raw % 64)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    /// Iterate over the kinds in the set, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = SyntaxKind> + '_ {
        (0..SyntaxKind::__LAST as u16).filter_map(move |raw| {
            let word = self.0[raw as usize / 64];
            if word & (1 << (raw % 64)) == 0 {
                return None;
            }
            Some(<crate::syntax::KtLanguage as rowan::Language>::kind_from_raw(
                rowan::SyntaxKind(raw),
            ))
        })
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

// === Keyword families ===

pub const SOFT_KEYWORDS: TokenSet = TokenSet::new(&[
    FILE_KW, IMPORT_KW, WHERE_KW, BY_KW, GET_KW, SET_KW, ABSTRACT_KW, ENUM_KW, CONTRACT_KW,
    OPEN_KW, INNER_KW, OVERRIDE_KW, PRIVATE_KW, PUBLIC_KW, INTERNAL_KW, PROTECTED_KW, CATCH_KW,
    FINALLY_KW, OUT_KW, FINAL_KW, VARARG_KW, REIFIED_KW, DYNAMIC_KW, COMPANION_KW,
    CONSTRUCTOR_KW, INIT_KW, SEALED_KW, FIELD_KW, PROPERTY_KW, RECEIVER_KW, PARAM_KW,
    SETPARAM_KW, DELEGATE_KW, LATEINIT_KW, DATA_KW, INLINE_KW, NOINLINE_KW, TAILREC_KW,
    EXTERNAL_KW, ANNOTATION_KW, CROSSINLINE_KW, CONST_KW, OPERATOR_KW, INFIX_KW, SUSPEND_KW,
    EXPECT_KW, ACTUAL_KW, VALUE_KW, CONTEXT_KW, ALL_KW,
]);

pub const MODIFIER_KEYWORDS: TokenSet = TokenSet::new(&[
    ABSTRACT_KW, ENUM_KW, CONTRACT_KW, OPEN_KW, INNER_KW, OVERRIDE_KW, PRIVATE_KW, PUBLIC_KW,
    INTERNAL_KW, PROTECTED_KW, OUT_KW, IN_KW, FINAL_KW, VARARG_KW, REIFIED_KW, COMPANION_KW,
    SEALED_KW, LATEINIT_KW, DATA_KW, INLINE_KW, NOINLINE_KW, TAILREC_KW, EXTERNAL_KW,
    ANNOTATION_KW, CROSSINLINE_KW, CONST_KW, OPERATOR_KW, INFIX_KW, SUSPEND_KW, EXPECT_KW,
    ACTUAL_KW, FUN_KW, VALUE_KW,
]);

pub const TYPE_MODIFIER_KEYWORDS: TokenSet = TokenSet::new(&[SUSPEND_KW]);
pub const TYPE_ARGUMENT_MODIFIER_KEYWORDS: TokenSet = TokenSet::new(&[IN_KW, OUT_KW]);
pub const RESERVED_VALUE_PARAMETER_MODIFIER_KEYWORDS: TokenSet =
    TokenSet::new(&[OUT_KW, VARARG_KW]);

pub const ANNOTATION_TARGETS: TokenSet = TokenSet::new(&[
    FILE_KW, FIELD_KW, GET_KW, SET_KW, PROPERTY_KW, RECEIVER_KW, PARAM_KW, SETPARAM_KW,
    DELEGATE_KW, ALL_KW,
]);

// === Declaration first-sets and recovery sets ===

pub const TOP_LEVEL_DECLARATION_FIRST: TokenSet = TokenSet::new(&[
    TYPEALIAS_KW, INTERFACE_KW, CLASS_KW, OBJECT_KW, FUN_KW, VAL_KW, PACKAGE_KW,
]);

pub const DECLARATION_FIRST: TokenSet = TOP_LEVEL_DECLARATION_FIRST
    .union(TokenSet::new(&[INIT_KW, GET_KW, SET_KW, CONSTRUCTOR_KW]));

pub const CLASS_NAME_RECOVERY_SET: TokenSet =
    TokenSet::new(&[LT, LPAR, COLON, LBRACE]).union(TOP_LEVEL_DECLARATION_FIRST);

pub const TYPE_PARAMETER_GT_RECOVERY_SET: TokenSet =
    TokenSet::new(&[WHERE_KW, LPAR, COLON, LBRACE, GT]);

pub const PARAMETER_NAME_RECOVERY_SET: TokenSet =
    TokenSet::new(&[COLON, EQ, COMMA, RPAR, VAL_KW, VAR_KW]);

pub const PACKAGE_NAME_RECOVERY_SET: TokenSet = TokenSet::new(&[DOT, EOL_OR_SEMICOLON]);

pub const IMPORT_RECOVERY_SET: TokenSet = TokenSet::new(&[AS_KW, DOT, EOL_OR_SEMICOLON]);

pub const TYPE_REF_FIRST: TokenSet =
    TokenSet::new(&[LBRACKET, IDENTIFIER, LPAR, HASH, DYNAMIC_KW]);

pub const RECEIVER_TYPE_TERMINATORS: TokenSet = TokenSet::new(&[DOT, SAFE_ACCESS]);

pub const VALUE_PARAMETER_FIRST: TokenSet = TokenSet::new(&[IDENTIFIER, LBRACKET, VAL_KW, VAR_KW])
    .union(MODIFIER_KEYWORDS.without(TokenSet::new(&[FUN_KW])));

pub const LAMBDA_VALUE_PARAMETER_FIRST: TokenSet = TokenSet::new(&[IDENTIFIER, LBRACKET])
    .union(MODIFIER_KEYWORDS.without(TokenSet::new(&[FUN_KW])));

pub const SOFT_KEYWORDS_AT_MEMBER_START: TokenSet = TokenSet::new(&[CONSTRUCTOR_KW, INIT_KW]);

pub const NO_MODIFIER_BEFORE_FOR_VALUE_PARAMETER: TokenSet = TokenSet::new(&[COMMA, COLON, EQ, RPAR]);

// === Expression first-sets shared with the declaration grammar ===

pub const LITERAL_FIRST: TokenSet = TokenSet::new(&[
    TRUE_KW, FALSE_KW, STRING_LITERAL, INTEGER_LITERAL, CHARACTER_LITERAL, FLOAT_LITERAL,
    NULL_KW,
]);

pub const EXPRESSION_FIRST: TokenSet = TokenSet::new(&[
    // Prefix
    MINUS, PLUS, MINUSMINUS, PLUSPLUS, EXCL, EXCLEXCL, LBRACKET, AT,
    // Atomic
    COLONCOLON, LPAR, THIS_KW, SUPER_KW, IF_KW, WHEN_KW, TRY_KW, OBJECT_KW, THROW_KW,
    RETURN_KW, CONTINUE_KW, BREAK_KW, FOR_KW, WHILE_KW, DO_KW, IDENTIFIER, LBRACE, FUN_KW,
])
.union(LITERAL_FIRST);

pub const STATEMENT_FIRST: TokenSet = EXPRESSION_FIRST
    .union(TokenSet::new(&[FUN_KW, VAL_KW, VAR_KW, INTERFACE_KW, CLASS_KW, TYPEALIAS_KW]))
    .union(MODIFIER_KEYWORDS);

pub const EXPRESSION_FOLLOW: TokenSet =
    TokenSet::new(&[EOL_OR_SEMICOLON, ARROW, COMMA, RBRACE, RPAR, RBRACKET]);

pub const EOL_OR_SEMICOLON_SET: TokenSet = TokenSet::new(&[EOL_OR_SEMICOLON]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_and_union() {
        let a = TokenSet::new(&[LPAR, RPAR]);
        let b = TokenSet::new(&[COMMA]);
        let both = a.union(b);
        assert!(both.contains(LPAR));
        assert!(both.contains(COMMA));
        assert!(!both.contains(LBRACE));
        assert!(!TokenSet::EMPTY.contains(TOMBSTONE));
    }

    #[test]
    fn test_sets_span_all_words() {
        let set = TokenSet::new(&[TOMBSTONE, SCRIPT_INITIALIZER]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![TOMBSTONE, SCRIPT_INITIALIZER]);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_declaration_sets() {
        assert!(DECLARATION_FIRST.contains(CONSTRUCTOR_KW));
        assert!(CLASS_NAME_RECOVERY_SET.contains(FUN_KW));
        assert!(MODIFIER_KEYWORDS.contains(FUN_KW));
        assert!(STATEMENT_FIRST.contains(TYPEALIAS_KW));
        assert!(VALUE_PARAMETER_FIRST.contains(VARARG_KW));
        assert!(!VALUE_PARAMETER_FIRST.contains(FUN_KW));
    }
}
