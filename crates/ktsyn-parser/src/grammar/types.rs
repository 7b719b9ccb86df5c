//! Type references
//!
//! ```text
//! type        : typeModifiers (functionType | userType | nullableType | "dynamic")
//! userType    : simpleUserType ("." simpleUserType)*
//! functionType: (type ".")? "(" parameter,* ")" "->" type
//! ```

use crate::parser::{Marker, Parser};
use crate::syntax::SyntaxKind::*;
use crate::token_set::{
    TokenSet, DECLARATION_FIRST, EXPRESSION_FIRST, EXPRESSION_FOLLOW, TOP_LEVEL_DECLARATION_FIRST, TYPE_REF_FIRST,
};

const TYPE_RECOVERY_SET: TokenSet = TOP_LEVEL_DECLARATION_FIRST.union(TokenSet::new(&[
    EQ, COMMA, GT, RBRACKET, DOT, RPAR, RBRACE, LBRACE, SEMICOLON,
]));

const TYPE_NAME_RECOVERY_SET: TokenSet = EXPRESSION_FIRST.union(EXPRESSION_FOLLOW).union(DECLARATION_FIRST);

impl<'t> Parser<'t> {
    /// Parse a TYPE_REFERENCE
    pub(crate) fn parse_type_ref(&mut self) {
        self.parse_type_ref_with(TokenSet::EMPTY, true);
    }

    /// A TYPE_REFERENCE in which `&` does not start an intersection
    pub(crate) fn parse_type_ref_without_intersections(&mut self) {
        self.parse_type_ref_with(TokenSet::EMPTY, false);
    }

    /// A TYPE_REFERENCE that also stops at `extra_recovery` when no type is found
    pub(crate) fn parse_type_ref_with(&mut self, extra_recovery: TokenSet, allow_intersections: bool) {
        let type_ref = self.parse_type_ref_contents(extra_recovery, allow_intersections);
        type_ref.commit(self, TYPE_REFERENCE);
    }

    fn parse_type_ref_contents(&mut self, extra_recovery: TokenSet, allow_intersections: bool) -> Marker {
        let type_ref = self.start();
        self.parse_type_modifier_list();

        let mut element = self.start();
        let mut type_before_dot = true;

        let next = self.lookahead(1);
        let after_next = self.lookahead(2);
        if self.at(IDENTIFIER)
            && !(next == DOT && after_next == IDENTIFIER)
            && next != LT
            && self.at(DYNAMIC_KW)
        {
            let dynamic = self.start();
            self.bump(); // consume 'dynamic'
            dynamic.commit(self, DYNAMIC_TYPE);
        } else if self.at(IDENTIFIER) || self.at(PACKAGE_KW) || self.at_parenthesized_mutable(0) {
            self.parse_user_type();
        } else if self.at(FUN_KW) && next == LPAR {
            // `fun (x: Int) -> Int`
            let function_type = self.start();
            self.bump(); // consume 'fun'
            self.parse_function_type_contents();
            function_type.commit(self, FUNCTION_TYPE);
        } else if self.at(LPAR) {
            // Either a parameter list or a parenthesized type
            let parenthesized = self.start();
            self.bump(); // consume '('
            let inner = self.parse_type_ref_contents(TokenSet::EMPTY, true);
            inner.drop(self);

            if self.eat(RPAR) && !self.at(ARROW) {
                // (A)
                parenthesized.drop(self);
            } else {
                // (A) -> B, (A, B) -> C, (a: A) -> C
                parenthesized.rollback(self);
                self.parse_function_type();
            }
        } else {
            self.error_with_recovery("Type expected", Some(TYPE_RECOVERY_SET.union(extra_recovery)));
            type_before_dot = false;
        }

        // `Int?.(Foo) -> Bar` needs `?` and `.` apart
        self.disable_joining();
        element = self.parse_nullable_type_suffix(element);
        self.restore_joining();

        let mut was_intersection = false;
        if allow_intersections && self.at(AND) {
            let left = element.commit(self, TYPE_REFERENCE);
            let intersection = left.precede(self);
            self.bump(); // consume '&'
            self.parse_type_ref_with(extra_recovery, true);
            let done = intersection.commit(self, INTERSECTION_TYPE);
            element = done.precede(self);
            was_intersection = true;
        }

        if type_before_dot && !was_intersection && self.at(DOT) {
            // A receiver: `A.(B) -> C`
            let receiver_ref = element.commit(self, TYPE_REFERENCE);
            let receiver = receiver_ref.precede(self).commit(self, FUNCTION_TYPE_RECEIVER);
            let function_type = receiver.precede(self);

            self.bump(); // consume '.'
            if self.at(LPAR) {
                self.parse_function_type_contents();
            } else {
                self.error("Expecting function type");
            }
            let done = function_type.commit(self, FUNCTION_TYPE);
            element = done.precede(self);
        }

        element.drop(self);
        type_ref
    }

    fn parse_nullable_type_suffix(&mut self, mut element: Marker) -> Marker {
        // `?:` is an elvis, not a nullable type
        while self.at(QUEST) && self.raw_lookup(1) != COLON {
            self.bump(); // consume '?'
            let done = element.commit(self, NULLABLE_TYPE);
            element = done.precede(self);
        }
        element
    }

    /// USER_TYPE: `a.b.C<T>`, with recovery on platform type notation
    /// (`Foo!`, `(Mutable)List<Foo>`, `Array<(out) Foo>`)
    pub(crate) fn parse_user_type(&mut self) {
        let mut user_type = self.start();

        if self.at(PACKAGE_KW) {
            let keyword = self.start();
            self.bump(); // consume 'package'
            keyword.error(self, "Expecting an element");
            self.expect_with_recovery(DOT, "Expecting '.'", Some(TokenSet::new(&[IDENTIFIER, LBRACE, RBRACE])));
        }

        let mut reference = self.start();
        loop {
            self.recover_on_parenthesized_word(0, "Mutable", true);

            if !self.expect_with_recovery(IDENTIFIER, "Expecting type name", Some(TYPE_NAME_RECOVERY_SET)) {
                reference.drop(self);
                break;
            }
            reference.commit(self, REFERENCE_EXPRESSION);

            self.parse_type_argument_list();

            if self.at(EXCL) {
                let error = self.start();
                self.bump(); // consume '!'
                error.error(self, "Unexpected token");
            }

            if !self.at(DOT) {
                break;
            }
            if self.lookahead(1) == LPAR && !self.at_parenthesized_mutable(1) {
                // Receiver of a function type: `Int.(Int) -> Int`
                break;
            }

            let done = user_type.commit(self, USER_TYPE);
            user_type = done.precede(self);
            self.bump(); // consume '.'
            reference = self.start();
        }

        user_type.commit(self, USER_TYPE);
    }

    fn at_parenthesized_mutable(&mut self, offset: usize) -> bool {
        self.recover_on_parenthesized_word(offset, "Mutable", false)
    }

    /// Recognize `(word) Name` at `offset`; with `consume`, the parenthesized
    /// word becomes an error node
    fn recover_on_parenthesized_word(&mut self, offset: usize, word: &str, consume: bool) -> bool {
        let shape = [LPAR, IDENTIFIER, RPAR, IDENTIFIER];
        let matches = shape.iter().enumerate().all(|(i, &kind)| {
            let actual = self.lookahead(offset + i);
            actual == kind || (kind == IDENTIFIER && actual.is_soft_keyword())
        });
        if !matches || self.lookahead_text(offset + 1) != word {
            return false;
        }

        let error = self.start();
        self.bump_n(offset);
        self.bump(); // consume '('
        self.bump(); // consume word
        self.bump(); // consume ')'
        if consume {
            error.error(self, "Unexpected tokens");
        } else {
            error.rollback(self);
        }
        true
    }

    // === Type arguments ===

    /// TYPE_ARGUMENT_LIST if at `<`. Returns whether the list closed with `>`.
    pub(crate) fn parse_type_argument_list(&mut self) -> bool {
        if !self.at(LT) {
            return false;
        }
        let list = self.start();
        let closed = self.try_parse_type_argument_list(TokenSet::EMPTY);
        list.commit(self, TYPE_ARGUMENT_LIST);
        closed
    }

    /// `<` projection,* `>` without the list node. Returns whether `>` was found.
    pub(crate) fn try_parse_type_argument_list(&mut self, extra_recovery: TokenSet) -> bool {
        self.disable_newlines();
        self.bump(); // consume '<'

        loop {
            let projection = self.start();
            self.recover_on_parenthesized_word(0, "out", true);
            self.parse_type_argument_modifier_list();

            if !self.eat(MUL) {
                self.parse_type_ref_with(extra_recovery, true);
            }
            projection.commit(self, TYPE_PROJECTION);

            if !self.eat(COMMA) || self.at(GT) {
                break;
            }
        }

        let closed = self.eat(GT);
        if !closed {
            self.error("Expecting a '>'");
        }
        self.restore_newlines();
        closed
    }

    // === Function types ===

    fn parse_function_type(&mut self) {
        let function_type = self.start();
        self.parse_function_type_contents();
        function_type.commit(self, FUNCTION_TYPE);
    }

    /// `(params) -> R` without the FUNCTION_TYPE node
    fn parse_function_type_contents(&mut self) {
        self.parse_value_parameter_list(true, true, TokenSet::EMPTY);
        self.expect_with_recovery(
            ARROW,
            "Expecting '->' to specify return type of a function type",
            Some(TYPE_REF_FIRST),
        );
        self.parse_type_ref();
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::DefaultExpressions;
    use crate::parser::Parser;
    use crate::syntax::SyntaxKind::{self, *};
    use crate::syntax::SyntaxNode;

    fn parse_type(source: &str) -> (SyntaxNode, Vec<String>) {
        let exprs = DefaultExpressions;
        let mut p = Parser::new(source, &exprs);
        p.parse_type_code_fragment();
        let parse = p.into_parse();
        let errors = parse.errors().iter().map(|e| e.message.clone()).collect();
        (parse.syntax(), errors)
    }

    fn kinds(node: &SyntaxNode) -> Vec<SyntaxKind> {
        node.descendants().map(|n| n.kind()).collect()
    }

    fn type_element(root: &SyntaxNode) -> SyntaxKind {
        let type_ref = root.first_child().unwrap();
        assert_eq!(type_ref.kind(), TYPE_REFERENCE);
        type_ref
            .children()
            .find(|n| n.kind() != MODIFIER_LIST)
            .map(|n| n.kind())
            .unwrap()
    }

    #[test]
    fn test_qualified_user_type_with_arguments() {
        let (root, errors) = parse_type("kotlin.collections.Map<String, out List<*>>");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(type_element(&root), USER_TYPE);
        let outer = root.first_child().unwrap().first_child().unwrap();
        // qualifier nests to the left
        assert_eq!(outer.first_child().unwrap().kind(), USER_TYPE);
        assert_eq!(
            root.descendants().filter(|n| n.kind() == TYPE_PROJECTION).count(),
            3
        );
    }

    #[test]
    fn test_nullable_and_dynamic() {
        let (root, errors) = parse_type("String??");
        assert!(errors.is_empty());
        assert_eq!(type_element(&root), NULLABLE_TYPE);
        assert_eq!(
            kinds(&root),
            vec![TYPE_CODE_FRAGMENT, TYPE_REFERENCE, NULLABLE_TYPE, NULLABLE_TYPE, USER_TYPE, REFERENCE_EXPRESSION]
        );

        let (root, _) = parse_type("dynamic");
        assert_eq!(type_element(&root), DYNAMIC_TYPE);

        // a type named like the keyword, qualified
        let (root, _) = parse_type("dynamic.Foo");
        assert_eq!(type_element(&root), USER_TYPE);
    }

    #[test]
    fn test_function_types() {
        let (root, errors) = parse_type("(Int, String) -> Unit");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(type_element(&root), FUNCTION_TYPE);

        let (root, errors) = parse_type("suspend String.(x: Int) -> Unit");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(type_element(&root), FUNCTION_TYPE);
        assert!(kinds(&root).contains(&FUNCTION_TYPE_RECEIVER));

        let (root, errors) = parse_type("fun (x: Int) -> Int");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(type_element(&root), FUNCTION_TYPE);
    }

    #[test]
    fn test_parenthesized_type_is_not_a_function() {
        let (root, errors) = parse_type("(Int)");
        assert!(errors.is_empty());
        assert_eq!(type_element(&root), USER_TYPE);
    }

    #[test]
    fn test_intersection() {
        let (root, errors) = parse_type("T & Any");
        assert!(errors.is_empty());
        assert_eq!(type_element(&root), INTERSECTION_TYPE);
    }

    #[test]
    fn test_annotated_function_type_reparses_with_significant_whitespace() {
        let (root, errors) = parse_type("@Foo (x) -> Unit");
        assert!(errors.is_empty(), "{errors:?}");
        let type_ref = root.first_child().unwrap();
        let children: Vec<SyntaxKind> = type_ref.children().map(|n| n.kind()).collect();
        assert_eq!(children, vec![MODIFIER_LIST, FUNCTION_TYPE]);
        let entry = type_ref.descendants().find(|n| n.kind() == ANNOTATION_ENTRY).unwrap();
        assert_eq!(entry.text().to_string(), "@Foo");
    }

    #[test]
    fn test_platform_type_recovery() {
        let (_, errors) = parse_type("(Mutable)List<Foo>!");
        assert_eq!(errors, vec!["Unexpected tokens", "Unexpected token"]);
    }

    #[test]
    fn test_missing_type() {
        let (_, errors) = parse_type("");
        assert_eq!(errors, vec!["Type expected"]);

        let (_, errors) = parse_type("List<Int");
        assert_eq!(errors, vec!["Expecting a '>'"]);
    }
}
