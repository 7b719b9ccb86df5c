//! The default expression and statement grammar
//!
//! Binary operators are parsed by precedence climbing over [`Precedence`],
//! from assignment down to `as`; prefix, postfix and atomic expressions sit
//! below the lowest level. Statements, lambdas, value arguments, labels and
//! contract descriptions are here as well since the declaration grammar only
//! reaches them through [`ExpressionGrammar`].

use super::{AnnotationMode, DeclarationMode, ExpressionGrammar, ModifierDetector, NameMode};
use crate::parser::{CompletedMarker, LeadingTrivia, Marker, Parser, TrailingTrivia};
use crate::syntax::SyntaxKind::{self, *};
use crate::token_set::{TokenSet, EXPRESSION_FIRST, EXPRESSION_FOLLOW, STATEMENT_FIRST};

/// The expression grammar used unless another one is plugged in
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExpressions;

/// Binary operator levels, loosest binding last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precedence {
    As,
    Multiplicative,
    Additive,
    Range,
    /// Infix calls: `a shl b`
    SimpleName,
    Elvis,
    InOrIs,
    Comparison,
    Equality,
    Conjunction,
    Disjunction,
    Assignment,
}

impl Precedence {
    /// The next tighter level, or `None` below which prefix expressions start
    fn higher(self) -> Option<Precedence> {
        use Precedence::*;
        match self {
            As => None,
            Multiplicative => Some(As),
            Additive => Some(Multiplicative),
            Range => Some(Additive),
            SimpleName => Some(Range),
            Elvis => Some(SimpleName),
            InOrIs => Some(Elvis),
            Comparison => Some(InOrIs),
            Equality => Some(Comparison),
            Conjunction => Some(Equality),
            Disjunction => Some(Conjunction),
            Assignment => Some(Disjunction),
        }
    }

    fn operations(self) -> TokenSet {
        use Precedence::*;
        match self {
            As => TokenSet::new(&[AS_KW, AS_SAFE]),
            Multiplicative => TokenSet::new(&[MUL, DIV, PERC]),
            Additive => TokenSet::new(&[PLUS, MINUS]),
            Range => TokenSet::new(&[RANGE, RANGE_UNTIL]),
            SimpleName => TokenSet::new(&[IDENTIFIER]),
            Elvis => TokenSet::new(&[ELVIS]),
            InOrIs => TokenSet::new(&[IN_KW, NOT_IN, IS_KW, NOT_IS]),
            Comparison => TokenSet::new(&[LT, GT, LTEQ, GTEQ]),
            Equality => TokenSet::new(&[EQEQ, EXCLEQ, EQEQEQ, EXCLEQEQEQ]),
            Conjunction => TokenSet::new(&[ANDAND]),
            Disjunction => TokenSet::new(&[OROR]),
            Assignment => TokenSet::new(&[EQ, PLUSEQ, MINUSEQ, MULTEQ, DIVEQ, PERCEQ]),
        }
    }
}

const PREFIX_OPERATIONS: TokenSet = TokenSet::new(&[MINUS, PLUS, MINUSMINUS, PLUSPLUS, EXCL]);
const POSTFIX_OPERATIONS: TokenSet = TokenSet::new(&[PLUSPLUS, MINUSMINUS, EXCLEXCL]);

/// Operators that may continue an expression on the next line.
/// `is` and `!is` are left out so that when-conditions can start a line.
const ALLOW_NEWLINE_OPERATIONS: TokenSet =
    TokenSet::new(&[DOT, SAFE_ACCESS, COLON, AS_KW, AS_SAFE, ELVIS, ANDAND, OROR]);

/// Tokens that end a `<...>` after a call target, which is then a comparison
const TYPE_ARGUMENT_LIST_STOPPERS: TokenSet = TokenSet::new(&[
    INTEGER_LITERAL, FLOAT_LITERAL, CHARACTER_LITERAL, STRING_LITERAL, PACKAGE_KW, AS_KW,
    TYPEALIAS_KW, INTERFACE_KW, CLASS_KW, THIS_KW, VAL_KW, VAR_KW, FUN_KW, FOR_KW, NULL_KW,
    TRUE_KW, FALSE_KW, IS_KW, THROW_KW, RETURN_KW, BREAK_KW, CONTINUE_KW, OBJECT_KW, IF_KW,
    TRY_KW, ELSE_KW, WHILE_KW, DO_KW, WHEN_KW, RBRACKET, RBRACE, RPAR, PLUSPLUS, MINUSMINUS,
    EXCLEXCL, PLUS, MINUS, EXCL, DIV, PERC, LTEQ, EQEQEQ, EXCLEQEQEQ, EQEQ, EXCLEQ, ANDAND,
    OROR, SAFE_ACCESS, ELVIS, SEMICOLON, RANGE, RANGE_UNTIL, EQ, MULTEQ, DIVEQ, PERCEQ, PLUSEQ,
    MINUSEQ, NOT_IN, NOT_IS, COLONCOLON, COLON,
]);

/// Statement starters that are hard keywords (`in` excepted): seeing one on
/// the same line after a statement only needs a missing-separator report
const STATEMENT_NEW_LINE_QUICK_RECOVERY_SET: TokenSet = TokenSet::new(&[
    THIS_KW, SUPER_KW, IF_KW, WHEN_KW, TRY_KW, OBJECT_KW, THROW_KW, RETURN_KW, CONTINUE_KW,
    BREAK_KW, FOR_KW, WHILE_KW, DO_KW, FUN_KW, VAL_KW, VAR_KW, INTERFACE_KW, CLASS_KW,
    TYPEALIAS_KW, TRUE_KW, FALSE_KW, NULL_KW, EOL_OR_SEMICOLON,
]);

const WHEN_CONDITION_RECOVERY_SET: TokenSet = TokenSet::new(&[RBRACE, IN_KW, NOT_IN, IS_KW, NOT_IS, ELSE_KW]);
const WHEN_CONDITION_RECOVERY_SET_WITH_ARROW: TokenSet = WHEN_CONDITION_RECOVERY_SET.with(ARROW).with(DOT);
const TRY_CATCH_RECOVERY: TokenSet = TokenSet::new(&[LBRACE, RBRACE, FINALLY_KW, CATCH_KW]);
const LAMBDA_DESTRUCTURING_FOLLOW: TokenSet = TokenSet::new(&[ARROW, COMMA, COLON]);
const LOOP_DESTRUCTURING_FOLLOW: TokenSet = TokenSet::new(&[IN_KW, LBRACE]);

fn interrupted_with_newline(p: &Parser<'_>) -> bool {
    !ALLOW_NEWLINE_OPERATIONS.contains(p.current()) && p.newline_before_current()
}

impl ExpressionGrammar for DefaultExpressions {
    fn expression(&self, p: &mut Parser<'_>) {
        if !p.at_set(EXPRESSION_FIRST) {
            p.error("Expecting an expression");
            return;
        }
        self.parse_binary_expression(p, Precedence::Assignment);
    }

    fn statements(&self, p: &mut Parser<'_>, script_top_level: bool) {
        while p.eat(SEMICOLON) {}

        while !p.at_eof() && !p.at(RBRACE) {
            let start = p.raw_position();
            if !p.at_set(STATEMENT_FIRST) {
                p.error_and_advance("Expecting an element", 1);
            }
            if p.at_set(STATEMENT_FIRST) {
                self.parse_statement(p, script_top_level);
            }

            if p.at(SEMICOLON) {
                while p.eat(SEMICOLON) {}
            } else if p.at(RBRACE) {
                break;
            } else if !script_top_level && !p.newline_before_current() {
                const SEVERAL_STATEMENTS: &str = "Unexpected tokens (use ';' to separate expressions on the same line)";
                if p.at_set(STATEMENT_NEW_LINE_QUICK_RECOVERY_SET) {
                    p.error(SEVERAL_STATEMENTS);
                } else {
                    p.error_until(SEVERAL_STATEMENTS, TokenSet::new(&[EOL_OR_SEMICOLON, LBRACE, RBRACE]));
                }
            }

            if p.raw_position() == start && !p.at_eof() && !p.at(RBRACE) {
                p.error_and_advance("Expecting an element", 1);
            }
        }
    }

    fn function_literal(&self, p: &mut Parser<'_>, prefer_block: bool, collapse: bool) {
        let literal_expression = p.start();
        let literal = p.start();

        p.enable_newlines();
        p.bump(); // consume '{'

        let mut params_found = false;
        if p.at(ARROW) {
            // `{ -> ... }`
            let list = p.start();
            list.commit(p, VALUE_PARAMETER_LIST);
            p.bump(); // consume '->'
            params_found = true;
        } else if p.at(IDENTIFIER) || p.at(COLON) || p.at(LPAR) {
            // `{ a -> ... }`, `{ a, b -> ... }` or `{ (a, b) -> ... }`
            let trial = p.start();
            let prefer_params = matches!(p.lookahead(1), COMMA | COLON);
            self.parse_function_literal_parameter_list(p);

            params_found = if prefer_params {
                rollback_or_drop(p, trial, Some("An -> is expected"))
            } else {
                rollback_or_drop(p, trial, None)
            };
        }

        if !params_found && prefer_block {
            literal.drop(p);
            self.statements(p, false);
            p.expect(RBRACE, "Expecting '}'");
            p.restore_newlines();
            literal_expression.commit(p, BLOCK);
            return;
        }

        if collapse && p.collapse_blocks() {
            p.advance_balanced_block();
            p.restore_newlines();
            literal.drop(p);
            literal_expression.collapse(p, LAMBDA_EXPRESSION);
            return;
        }

        let body = p.start();
        self.statements(p, false);
        body.commit_with(p, BLOCK, LeadingTrivia::All, TrailingTrivia::All);

        p.expect(RBRACE, "Expecting '}'");
        p.restore_newlines();
        literal.commit(p, FUNCTION_LITERAL);
        literal_expression.commit(p, LAMBDA_EXPRESSION);
    }

    fn value_argument_list(&self, p: &mut Parser<'_>) {
        let list = p.start();
        p.disable_newlines();

        if p.expect_with_recovery(LPAR, "Expecting an argument list", Some(EXPRESSION_FOLLOW)) {
            if !p.at(RPAR) {
                loop {
                    self.parse_value_argument(p);

                    if p.at(COLON) && p.lookahead(1) == IDENTIFIER {
                        p.error_and_advance("Unexpected type specification", 2);
                    }
                    if !p.at(COMMA) {
                        if p.at_set(EXPRESSION_FIRST) {
                            p.error("Expecting ','");
                            continue;
                        }
                        break;
                    }
                    p.bump(); // consume ','
                    if p.at(RPAR) {
                        break;
                    }
                }
            }
            p.expect_with_recovery(RPAR, "Expecting ')'", Some(EXPRESSION_FOLLOW));
        }

        p.restore_newlines();
        list.commit(p, VALUE_ARGUMENT_LIST);
    }

    fn contract_description(&self, p: &mut Parser<'_>) {
        p.bump_remap(CONTRACT_KW);

        let list = p.start();
        p.expect(LBRACKET, "Expecting '['");
        p.enable_newlines();

        loop {
            if p.at(COMMA) {
                p.error_and_advance("Expecting a contract effect", 1);
            }
            if p.at(RBRACKET) {
                break;
            }
            let effect = p.start();
            self.expression(p);
            effect.commit(p, CONTRACT_EFFECT);
            if !p.eat(COMMA) {
                break;
            }
        }

        p.expect(RBRACKET, "Expecting ']'");
        p.restore_newlines();
        list.commit(p, CONTRACT_EFFECT_LIST);
    }

    fn at_label_definition(&self, p: &mut Parser<'_>) -> bool {
        (p.at(IDENTIFIER) && p.raw_lookup(1) == AT) || p.at(AT)
    }

    /// LABEL_QUALIFIER > LABEL: `name@`
    fn label_definition(&self, p: &mut Parser<'_>) {
        if p.at(AT) {
            p.error_and_advance("Expecting identifier before '@' in label definition", 1);
            return;
        }

        let qualifier = p.start();
        let label = p.start();
        p.bump(); // consume name
        p.bump(); // consume '@'
        label.commit(p, LABEL);
        qualifier.commit(p, LABEL_QUALIFIER);
    }
}

/// After a trial parameter list: keep it when `->` follows. With a message,
/// a `}` also keeps it and reports the missing arrow.
fn rollback_or_drop(p: &mut Parser<'_>, trial: Marker, missing_arrow: Option<&str>) -> bool {
    if p.at(ARROW) {
        p.bump(); // consume '->'
        trial.drop(p);
        return true;
    }
    match missing_arrow {
        Some(message) if p.at(RBRACE) => {
            trial.drop(p);
            p.expect(ARROW, message);
            true
        }
        _ => {
            trial.rollback(p);
            false
        }
    }
}

impl DefaultExpressions {
    // === Operators ===

    fn parse_binary_expression(&self, p: &mut Parser<'_>, precedence: Precedence) {
        let mut expression = p.start();
        self.parse_higher_precedence(p, precedence);

        while !interrupted_with_newline(p) && p.at_set(precedence.operations()) {
            let operation = p.current();
            self.parse_operation_reference(p);

            let kind = match (precedence, operation) {
                (Precedence::As, _) => {
                    p.parse_type_ref_without_intersections();
                    BINARY_WITH_TYPE
                }
                (Precedence::InOrIs, IS_KW | NOT_IS) => {
                    p.parse_type_ref_without_intersections();
                    IS_EXPRESSION
                }
                _ => {
                    self.parse_higher_precedence(p, precedence);
                    BINARY_EXPRESSION
                }
            };
            let done = expression.commit(p, kind);
            expression = done.precede(p);
        }
        expression.drop(p);
    }

    fn parse_higher_precedence(&self, p: &mut Parser<'_>, precedence: Precedence) {
        match precedence.higher() {
            Some(higher) => self.parse_binary_expression(p, higher),
            None => self.parse_prefix_expression(p),
        }
    }

    fn parse_operation_reference(&self, p: &mut Parser<'_>) {
        let reference = p.start();
        p.bump(); // consume operator
        reference.commit(p, OPERATION_REFERENCE);
    }

    fn parse_prefix_expression(&self, p: &mut Parser<'_>) {
        if p.at(AT) {
            if !self.parse_local_declaration(p, false, false) {
                let expression = p.start();
                p.parse_annotations(AnnotationMode::Default);
                self.parse_prefix_expression(p);
                expression.commit(p, ANNOTATED_EXPRESSION);
            }
            return;
        }

        // `!in` and `!!` must not swallow a prefix `!`
        p.disable_joining();
        if self.at_label_definition(p) {
            p.restore_joining();
            self.parse_labeled_expression(p);
        } else if p.at_set(PREFIX_OPERATIONS) {
            let expression = p.start();
            self.parse_operation_reference(p);
            p.restore_joining();
            self.parse_prefix_expression(p);
            expression.commit(p, PREFIX_EXPRESSION);
        } else {
            p.restore_joining();
            self.parse_postfix_expression(p);
        }
    }

    fn parse_labeled_expression(&self, p: &mut Parser<'_>) {
        let expression = p.start();
        self.label_definition(p);
        self.parse_prefix_expression(p);
        expression.commit(p, LABELED_EXPRESSION);
    }

    fn parse_postfix_expression(&self, p: &mut Parser<'_>) {
        let mut expression = p.start();

        let mut first_parsed = if p.at(COLONCOLON) {
            let reference = p.start();
            self.parse_double_colon_suffix(p, reference);
            true
        } else {
            self.parse_atomic_expression(p)
        };

        loop {
            if interrupted_with_newline(p) {
                break;
            }

            let done = if p.at(LBRACKET) {
                self.parse_collection_literal(p, INDICES, false);
                expression.commit(p, ARRAY_ACCESS_EXPRESSION)
            } else if self.parse_call_suffix(p) {
                expression.commit(p, CALL_EXPRESSION)
            } else if p.at(DOT) || p.at(SAFE_ACCESS) {
                let kind = if p.at(DOT) {
                    DOT_QUALIFIED_EXPRESSION
                } else {
                    SAFE_ACCESS_EXPRESSION
                };
                p.bump(); // consume '.' or '?.'

                if !first_parsed {
                    expression.drop(p);
                    expression = p.start();
                    first_parsed = self.parse_atomic_expression(p);
                    continue;
                }

                self.parse_selector_call_expression(p);
                expression.commit(p, kind)
            } else if p.at_set(POSTFIX_OPERATIONS) {
                self.parse_operation_reference(p);
                expression.commit(p, POSTFIX_EXPRESSION)
            } else {
                self.skip_question_marks_before_double_colon(p);
                if !p.at(COLONCOLON) {
                    break;
                }
                self.parse_double_colon_suffix(p, expression)
            };
            expression = done.precede(p);
        }
        expression.drop(p);
    }

    /// `Type?::name`: the question marks belong to the receiver type
    fn skip_question_marks_before_double_colon(&self, p: &mut Parser<'_>) {
        if !p.at(QUEST) {
            return;
        }
        let mut k = 1;
        while p.lookahead(k) == QUEST {
            k += 1;
        }
        if p.lookahead(k) == COLONCOLON {
            p.bump_n(k);
        }
    }

    /// `::name` or `::class` at the current `::`, closing `expression`
    fn parse_double_colon_suffix(&self, p: &mut Parser<'_>, expression: Marker) -> CompletedMarker {
        p.bump(); // consume '::'

        if p.at(CLASS_KW) {
            p.bump(); // consume 'class'
            return expression.commit(p, CLASS_LITERAL_EXPRESSION);
        }

        self.parse_simple_name_expression(p);

        if p.at(LT) {
            let arguments = p.start();
            if p.try_parse_type_argument_list(TYPE_ARGUMENT_LIST_STOPPERS) {
                arguments.error(p, "Type arguments are not allowed");
            } else {
                arguments.rollback(p);
            }
        }

        if p.at(LPAR) && !p.newline_before_current() {
            let call = p.start();
            self.parse_call_suffix(p);
            call.error(
                p,
                "This syntax is reserved for future use; to call a reference, enclose it in parentheses: (foo::bar)(args)",
            );
        }

        expression.commit(p, CALLABLE_REFERENCE_EXPRESSION)
    }

    /// Type arguments, value arguments and trailing lambdas after a call target
    fn parse_call_suffix(&self, p: &mut Parser<'_>) -> bool {
        if self.parse_call_with_closure(p) {
            return true;
        }

        if p.at(LPAR) {
            self.value_argument_list(p);
            self.parse_call_with_closure(p);
            return true;
        }

        if p.at(LT) {
            let arguments = p.start();
            if !p.try_parse_type_argument_list(TYPE_ARGUMENT_LIST_STOPPERS) {
                arguments.rollback(p);
                return false;
            }
            arguments.commit(p, TYPE_ARGUMENT_LIST);
            if !p.newline_before_current() && p.at(LPAR) {
                self.value_argument_list(p);
            }
            self.parse_call_with_closure(p);
            return true;
        }

        false
    }

    /// Member selector after `.`: a name, possibly called
    fn parse_selector_call_expression(&self, p: &mut Parser<'_>) {
        let call = p.start();
        self.parse_atomic_expression(p);
        if !p.newline_before_current() && self.parse_call_suffix(p) {
            call.commit(p, CALL_EXPRESSION);
        } else {
            call.drop(p);
        }
    }

    /// Trailing lambdas, each a LAMBDA_ARGUMENT
    fn parse_call_with_closure(&self, p: &mut Parser<'_>) -> bool {
        if !p.trailing_lambda_allowed() {
            return false;
        }

        let mut success = false;
        loop {
            let argument = p.start();
            if !self.parse_annotated_lambda(p, false) {
                argument.drop(p);
                break;
            }
            argument.commit(p, LAMBDA_ARGUMENT);
            success = true;
        }
        success
    }

    /// `@Ann label@ { ... }`. Rolls back and returns false unless a `{` follows.
    fn parse_annotated_lambda(&self, p: &mut Parser<'_>, prefer_block: bool) -> bool {
        let annotated = p.start();
        let annotations = p.parse_annotations(AnnotationMode::Default);

        let labeled = p.start();
        let label = self.at_label_definition(p);
        if label {
            self.label_definition(p);
        }

        if !p.at(LBRACE) {
            labeled.drop(p);
            annotated.rollback(p);
            return false;
        }

        self.function_literal(p, prefer_block, true);

        p.done_or_drop(labeled, LABELED_EXPRESSION, label);
        p.done_or_drop(annotated, ANNOTATED_EXPRESSION, annotations);
        true
    }

    // === Atomic expressions ===

    /// Returns false when no expression starts here
    fn parse_atomic_expression(&self, p: &mut Parser<'_>) -> bool {
        let ok = match p.current() {
            LPAR => {
                self.parse_parenthesized_expression(p);
                true
            }
            LBRACKET => {
                self.parse_collection_literal(p, COLLECTION_LITERAL_EXPRESSION, true);
                true
            }
            THIS_KW => {
                self.parse_this_expression(p);
                true
            }
            SUPER_KW => {
                self.parse_super_expression(p);
                true
            }
            OBJECT_KW => {
                self.parse_object_literal(p);
                true
            }
            THROW_KW => {
                self.parse_one_keyword_with_expression(p, THROW);
                true
            }
            RETURN_KW => {
                self.parse_return(p);
                true
            }
            CONTINUE_KW => {
                self.parse_jump(p, CONTINUE);
                true
            }
            BREAK_KW => {
                self.parse_jump(p, BREAK);
                true
            }
            IF_KW => {
                self.parse_if(p);
                true
            }
            WHEN_KW => {
                self.parse_when(p);
                true
            }
            TRY_KW => {
                self.parse_try(p);
                true
            }
            FOR_KW => {
                self.parse_for(p);
                true
            }
            WHILE_KW => {
                self.parse_while(p);
                true
            }
            DO_KW => {
                self.parse_do_while(p);
                true
            }
            LBRACE => {
                self.function_literal(p, false, true);
                true
            }
            STRING_LITERAL => self.parse_one_token_expression(p, STRING_TEMPLATE),
            TRUE_KW | FALSE_KW => self.parse_one_token_expression(p, BOOLEAN_CONSTANT),
            INTEGER_LITERAL => self.parse_one_token_expression(p, INTEGER_CONSTANT),
            CHARACTER_LITERAL => self.parse_one_token_expression(p, CHARACTER_CONSTANT),
            FLOAT_LITERAL => self.parse_one_token_expression(p, FLOAT_CONSTANT),
            NULL_KW => self.parse_one_token_expression(p, NULL),
            CLASS_KW | INTERFACE_KW | FUN_KW | VAL_KW | VAR_KW | TYPEALIAS_KW => {
                let newline = p.newline_before_current();
                self.parse_local_declaration(p, newline, false)
            }
            kind if kind == IDENTIFIER || kind.is_soft_keyword() => {
                p.at(IDENTIFIER);
                self.parse_simple_name_expression(p);
                true
            }
            _ => false,
        };

        if !ok {
            p.error_with_recovery("Expecting an element", Some(EXPRESSION_FOLLOW));
        }
        ok
    }

    fn parse_one_token_expression(&self, p: &mut Parser<'_>, kind: SyntaxKind) -> bool {
        let expression = p.start();
        p.bump(); // consume literal
        expression.commit(p, kind);
        true
    }

    fn parse_simple_name_expression(&self, p: &mut Parser<'_>) {
        let name = p.start();
        p.expect(IDENTIFIER, "Expecting an identifier");
        name.commit(p, REFERENCE_EXPRESSION);
    }

    fn parse_parenthesized_expression(&self, p: &mut Parser<'_>) {
        let expression = p.start();
        p.disable_newlines();
        p.bump(); // consume '('
        if p.at(RPAR) {
            p.error("Expecting an expression");
        } else {
            self.expression(p);
        }
        p.expect(RPAR, "Expecting ')'");
        p.restore_newlines();
        expression.commit(p, PARENTHESIZED);
    }

    /// `[a, b]`, or the indices of `a[i, j]` when `can_be_empty` is false
    fn parse_collection_literal(&self, p: &mut Parser<'_>, kind: SyntaxKind, can_be_empty: bool) {
        let literal = p.start();
        p.disable_newlines();
        p.bump(); // consume '['

        if !can_be_empty && p.at(RBRACKET) {
            p.error("Expecting an index element");
        } else {
            loop {
                if p.at(COMMA) {
                    p.error_and_advance("Expecting an element", 1);
                    continue;
                }
                if p.at(RBRACKET) {
                    break;
                }
                self.expression(p);
                if !p.eat(COMMA) {
                    break;
                }
            }
        }

        p.expect(RBRACKET, "Expecting ']'");
        p.restore_newlines();
        literal.commit(p, kind);
    }

    fn parse_this_expression(&self, p: &mut Parser<'_>) {
        let expression = p.start();
        let reference = p.start();
        p.bump(); // consume 'this'
        reference.commit(p, REFERENCE_EXPRESSION);
        self.parse_label_reference_with_no_whitespace(p);
        expression.commit(p, THIS_EXPRESSION);
    }

    /// `super`, `super<Base>`, `super@Label`
    fn parse_super_expression(&self, p: &mut Parser<'_>) {
        let expression = p.start();
        let reference = p.start();
        p.bump(); // consume 'super'
        reference.commit(p, REFERENCE_EXPRESSION);

        if p.at(LT) {
            // `super < x` is a comparison, `super<T>` a qualifier
            let supertype = p.start();
            p.disable_newlines();
            p.bump(); // consume '<'
            p.parse_type_ref();
            if p.eat(GT) {
                p.restore_newlines();
                supertype.drop(p);
            } else {
                supertype.rollback(p);
            }
        }
        self.parse_label_reference_with_no_whitespace(p);

        expression.commit(p, SUPER_EXPRESSION);
    }

    fn parse_object_literal(&self, p: &mut Parser<'_>) {
        let literal = p.start();
        let declaration = p.start();
        // the body is required: `foo(object : A, B)`
        p.parse_object(NameMode::Prohibited, false);
        declaration.commit(p, OBJECT_DECLARATION);
        literal.commit(p, OBJECT_LITERAL);
    }

    fn parse_one_keyword_with_expression(&self, p: &mut Parser<'_>, kind: SyntaxKind) {
        let expression = p.start();
        p.bump(); // consume keyword
        self.expression(p);
        expression.commit(p, kind);
    }

    fn parse_return(&self, p: &mut Parser<'_>) {
        let expression = p.start();
        p.bump(); // consume 'return'
        self.parse_label_reference_with_no_whitespace(p);
        if p.at_set(EXPRESSION_FIRST) && !p.at(EOL_OR_SEMICOLON) {
            self.expression(p);
        }
        expression.commit(p, RETURN);
    }

    fn parse_jump(&self, p: &mut Parser<'_>, kind: SyntaxKind) {
        let expression = p.start();
        p.bump(); // consume 'break'/'continue'
        self.parse_label_reference_with_no_whitespace(p);
        expression.commit(p, kind);
    }

    fn parse_label_reference_with_no_whitespace(&self, p: &mut Parser<'_>) {
        if !p.at(AT) || p.newline_before_current() {
            return;
        }
        if p.raw_lookup(-1).is_trivia() {
            p.error("There should be no space or comments before '@' in label reference");
        }

        if p.raw_lookup(1) != IDENTIFIER {
            p.error_and_advance("Label must be named", 1);
            return;
        }
        let qualifier = p.start();
        let label = p.start();
        p.bump(); // consume '@'
        p.bump(); // consume name
        label.commit(p, LABEL);
        qualifier.commit(p, LABEL_QUALIFIER);
    }

    // === Control structures ===

    /// `( condition )` of `if`, `while` and `do-while`
    fn parse_condition(&self, p: &mut Parser<'_>) {
        p.disable_newlines();
        if p.expect_with_recovery(LPAR, "Expecting a condition in parentheses '(...)'", Some(EXPRESSION_FIRST)) {
            let condition = p.start();
            self.expression(p);
            condition.commit(p, CONDITION);
            p.expect(RPAR, "Expecting ')'");
        }
        p.restore_newlines();
    }

    fn parse_if(&self, p: &mut Parser<'_>) {
        let expression = p.start();
        p.bump(); // consume 'if'
        self.parse_condition(p);

        let then = p.start();
        if !p.at(ELSE_KW) && !p.at(SEMICOLON) {
            self.parse_control_structure_body(p);
        }
        if p.at(SEMICOLON) && p.lookahead(1) == ELSE_KW {
            p.bump(); // consume ';'
        }
        then.commit(p, THEN);

        // `else ->` is a when entry, not this branch
        if p.at(ELSE_KW) && p.lookahead(1) != ARROW {
            p.bump(); // consume 'else'
            let otherwise = p.start();
            if !p.at(SEMICOLON) {
                self.parse_control_structure_body(p);
            }
            otherwise.commit(p, ELSE);
        }

        expression.commit(p, IF);
    }

    /// `when (subject) { entries }`; the subject may declare a `val`
    fn parse_when(&self, p: &mut Parser<'_>) {
        let expression = p.start();
        p.bump(); // consume 'when'

        p.disable_newlines();
        if p.eat(LPAR) {
            let subject = p.start();
            p.parse_annotations_list(AnnotationMode::Default, TokenSet::new(&[EQ, RPAR]));
            if p.at(VAL_KW) || p.at(VAR_KW) {
                let kind = p.parse_property(DeclarationMode::Local);
                subject.commit_with(p, kind, LeadingTrivia::DocComment, TrailingTrivia::SameLineComments);
            } else {
                subject.drop(p);
                self.expression(p);
            }
            p.expect(RPAR, "Expecting ')'");
        }
        p.restore_newlines();

        p.enable_newlines();
        if p.expect(LBRACE, "Expecting '{'") {
            while !p.at_eof() && !p.at(RBRACE) {
                self.parse_when_entry(p);
            }
            p.expect(RBRACE, "Expecting '}'");
        }
        p.restore_newlines();

        expression.commit(p, WHEN);
    }

    fn parse_when_entry(&self, p: &mut Parser<'_>) {
        let entry = p.start();

        if p.at(ELSE_KW) {
            p.bump(); // consume 'else'

            if !p.at(ARROW) {
                p.error_until("Expecting '->'", TokenSet::new(&[ARROW, LBRACE, RBRACE, EOL_OR_SEMICOLON]));
            }

            if p.eat(ARROW) {
                if p.at_set(WHEN_CONDITION_RECOVERY_SET) {
                    p.error("Expecting an element");
                } else {
                    self.parse_control_structure_body(p);
                }
            } else if p.at(LBRACE) {
                // the arrow is most likely just missing
                self.parse_control_structure_body(p);
            } else if !p.at_set(WHEN_CONDITION_RECOVERY_SET) {
                p.error_and_advance("Expecting '->'", 1);
            }
        } else {
            self.parse_when_entry_not_else(p);
        }

        entry.commit(p, WHEN_ENTRY);
        p.eat(SEMICOLON);
    }

    fn parse_when_entry_not_else(&self, p: &mut Parser<'_>) {
        loop {
            while p.at(COMMA) {
                p.error_and_advance("Expecting a when-condition", 1);
            }
            self.parse_when_condition(p);
            if !p.eat(COMMA) || p.at(ARROW) {
                break;
            }
        }

        p.expect_with_recovery(ARROW, "Expecting '->'", Some(WHEN_CONDITION_RECOVERY_SET));
        if p.at_set(WHEN_CONDITION_RECOVERY_SET) {
            p.error("Expecting an element");
        } else {
            self.parse_control_structure_body(p);
        }
    }

    fn parse_when_condition(&self, p: &mut Parser<'_>) {
        let condition = p.start();
        p.disable_newlines();

        let kind = match p.current() {
            IN_KW | NOT_IN => {
                self.parse_operation_reference(p);
                if p.at_set(WHEN_CONDITION_RECOVERY_SET_WITH_ARROW) {
                    p.error("Expecting an element");
                } else {
                    self.expression(p);
                }
                WHEN_CONDITION_IN_RANGE
            }
            IS_KW | NOT_IS => {
                p.bump(); // consume 'is' or '!is'
                if p.at_set(WHEN_CONDITION_RECOVERY_SET_WITH_ARROW) {
                    p.error("Expecting a type");
                } else {
                    p.parse_type_ref();
                }
                WHEN_CONDITION_IS_PATTERN
            }
            RBRACE | ELSE_KW | ARROW | DOT => {
                p.error("Expecting an expression, is-condition or in-condition");
                WHEN_CONDITION_EXPRESSION
            }
            _ => {
                self.expression(p);
                WHEN_CONDITION_EXPRESSION
            }
        };

        p.restore_newlines();
        condition.commit(p, kind);
    }

    /// `try { } catch (e: E) { } finally { }`
    fn parse_try(&self, p: &mut Parser<'_>) {
        let expression = p.start();
        p.bump(); // consume 'try'
        p.parse_block();

        let mut catch_or_finally = false;
        while p.at(CATCH_KW) {
            catch_or_finally = true;
            let catch = p.start();
            p.bump(); // consume 'catch'

            if p.at_set(TRY_CATCH_RECOVERY) {
                p.error("Expecting exception variable declaration");
            } else {
                let parameters = p.start();
                p.expect_with_recovery(LPAR, "Expecting '('", Some(TRY_CATCH_RECOVERY));
                if !p.at_set(TRY_CATCH_RECOVERY) {
                    p.parse_value_parameter(true);
                    p.eat(COMMA);
                    p.expect_with_recovery(RPAR, "Expecting ')'", Some(TRY_CATCH_RECOVERY));
                } else {
                    p.error("Expecting exception variable declaration");
                }
                parameters.commit(p, VALUE_PARAMETER_LIST);
            }

            if p.at(LBRACE) {
                p.parse_block();
            } else {
                p.error("Expecting a block: { ... }");
            }
            catch.commit(p, CATCH);
        }

        if p.at(FINALLY_KW) {
            catch_or_finally = true;
            let finally = p.start();
            p.bump(); // consume 'finally'
            p.parse_block();
            finally.commit(p, FINALLY);
        }

        if !catch_or_finally {
            p.error("Expecting 'catch' or 'finally'");
        }

        expression.commit(p, TRY);
    }

    /// `for (x in xs) body`, `for ((a, b) in pairs) body`
    fn parse_for(&self, p: &mut Parser<'_>) {
        let expression = p.start();
        p.bump(); // consume 'for'

        if p.expect_with_recovery(LPAR, "Expecting '(' to open a loop range", Some(EXPRESSION_FIRST)) {
            p.disable_newlines();

            if !p.at(RPAR) {
                let parameter = p.start();
                if !p.at(IN_KW) {
                    p.parse_modifier_list(None, AnnotationMode::Default, TokenSet::new(&[IN_KW, RPAR, COLON]));
                }
                if p.at(VAL_KW) || p.at(VAR_KW) {
                    p.bump(); // consume 'val'/'var'
                }

                if p.at(LPAR) {
                    let destructuring = p.start();
                    p.parse_multi_declaration_name(LOOP_DESTRUCTURING_FOLLOW);
                    destructuring.commit(p, DESTRUCTURING_DECLARATION);
                } else {
                    p.expect_with_recovery(IDENTIFIER, "Expecting a variable name", Some(TokenSet::new(&[COLON, IN_KW])));
                    if p.eat(COLON) {
                        p.parse_type_ref_with(TokenSet::new(&[IN_KW]), true);
                    }
                }
                parameter.commit(p, VALUE_PARAMETER);

                if p.expect_with_recovery(IN_KW, "Expecting 'in'", Some(TokenSet::new(&[LPAR, LBRACE, RPAR]))) {
                    let range = p.start();
                    self.expression(p);
                    range.commit(p, LOOP_RANGE);
                }
            } else {
                p.error("Expecting a variable name");
            }

            p.expect(RPAR, "Expecting ')'");
            p.restore_newlines();
        }

        self.parse_loop_body(p);
        expression.commit(p, FOR);
    }

    fn parse_while(&self, p: &mut Parser<'_>) {
        let expression = p.start();
        p.bump(); // consume 'while'
        self.parse_condition(p);
        self.parse_loop_body(p);
        expression.commit(p, WHILE);
    }

    fn parse_do_while(&self, p: &mut Parser<'_>) {
        let expression = p.start();
        p.bump(); // consume 'do'

        if !p.at(WHILE_KW) {
            self.parse_loop_body(p);
        }
        if p.expect(WHILE_KW, "Expecting 'while' followed by a post-condition") {
            self.parse_condition(p);
        }

        expression.commit(p, DO_WHILE);
    }

    fn parse_loop_body(&self, p: &mut Parser<'_>) {
        let body = p.start();
        if !p.at(SEMICOLON) {
            self.parse_control_structure_body(p);
        }
        body.commit(p, BODY);
    }

    /// A block when braced, otherwise a single expression
    fn parse_control_structure_body(&self, p: &mut Parser<'_>) {
        if !self.parse_annotated_lambda(p, true) {
            self.parse_block_level_expression(p);
        }
    }

    // === Statements ===

    fn parse_statement(&self, p: &mut Parser<'_>, script_top_level: bool) {
        if self.parse_local_declaration(p, false, script_top_level) {
            return;
        }

        if !p.at_set(EXPRESSION_FIRST) {
            p.error_and_advance("Expecting a statement", 1);
        } else if script_top_level {
            let initializer = p.start();
            self.parse_block_level_expression(p);
            initializer.commit(p, SCRIPT_INITIALIZER);
        } else {
            self.parse_block_level_expression(p);
        }
    }

    /// Annotations on a line of their own annotate the whole expression below
    fn parse_block_level_expression(&self, p: &mut Parser<'_>) {
        if !p.at(AT) {
            self.expression(p);
            return;
        }

        let expression = p.start();
        p.parse_annotations(AnnotationMode::Default);
        if !p.newline_before_current() {
            expression.rollback(p);
            self.expression(p);
            return;
        }

        self.parse_block_level_expression(p);
        expression.commit(p, ANNOTATED_EXPRESSION);
    }

    /// A declaration in statement position. With `rollback_if_not_expression`
    /// only an anonymous function is accepted.
    fn parse_local_declaration(&self, p: &mut Parser<'_>, rollback_if_not_expression: bool, script_top_level: bool) -> bool {
        let declaration = p.start();
        let mut detector = ModifierDetector::default();
        p.parse_modifier_list(Some(&mut detector), AnnotationMode::Default, TokenSet::EMPTY);

        match self.parse_local_declaration_rest(p, detector, rollback_if_not_expression, script_top_level) {
            Some(kind) => {
                // plain comments above a local variable usually describe the following statements
                let preceding_comments = kind != PROPERTY && kind != DESTRUCTURING_DECLARATION;
                p.close_declaration(declaration, kind, preceding_comments);
                true
            }
            None => {
                declaration.rollback(p);
                false
            }
        }
    }

    fn parse_local_declaration_rest(
        &self,
        p: &mut Parser<'_>,
        detector: ModifierDetector,
        fail_if_not_expression: bool,
        script_top_level: bool,
    ) -> Option<SyntaxKind> {
        if fail_if_not_expression {
            if !p.at(FUN_KW) {
                return None;
            }
            return p.try_parse_function(true);
        }

        // `object : Base { }` in statement position is an object literal
        if p.at(OBJECT_KW) && matches!(p.lookahead(1), COLON | LBRACE) {
            return None;
        }

        let mode = if script_top_level {
            DeclarationMode::ScriptTopLevel
        } else {
            DeclarationMode::Local
        };
        p.parse_common_declaration(detector, NameMode::Required, mode)
    }

    // === Lambdas and arguments ===

    /// `a, b: Int, (c, d)` before the `->` of a lambda
    fn parse_function_literal_parameter_list(&self, p: &mut Parser<'_>) {
        let list = p.start();

        while !p.at_eof() {
            if p.at(ARROW) {
                break;
            }

            let parameter = p.start();
            if p.at(COLON) {
                p.error("Expecting parameter name");
            } else if p.at(LPAR) {
                let destructuring = p.start();
                p.parse_multi_declaration_name(LAMBDA_DESTRUCTURING_FOLLOW);
                destructuring.commit(p, DESTRUCTURING_DECLARATION);
            } else {
                p.expect_with_recovery(IDENTIFIER, "Expecting parameter name", Some(TokenSet::new(&[ARROW])));
            }

            if p.eat(COLON) {
                p.parse_type_ref_with(TokenSet::new(&[ARROW, COMMA]), true);
            }
            parameter.commit(p, VALUE_PARAMETER);

            if p.at(ARROW) {
                break;
            }
            if !p.eat(COMMA) {
                p.error("Expecting '->' or ','");
                break;
            }
        }

        list.commit(p, VALUE_PARAMETER_LIST);
    }

    /// `name = *value`
    fn parse_value_argument(&self, p: &mut Parser<'_>) {
        let argument = p.start();

        if p.at(IDENTIFIER) && p.lookahead(1) == EQ {
            let name = p.start();
            let reference = p.start();
            p.bump(); // consume name
            reference.commit(p, REFERENCE_EXPRESSION);
            name.commit(p, VALUE_ARGUMENT_NAME);
            p.bump(); // consume '='
        }
        p.eat(MUL);

        if p.at(RPAR) || p.at(COMMA) {
            p.error("Expecting an expression");
        } else {
            self.expression(p);
        }

        argument.commit(p, VALUE_ARGUMENT);
    }
}

#[cfg(test)]
mod tests {
    use super::DefaultExpressions;
    use crate::parser::Parser;
    use crate::syntax::SyntaxKind::{self, *};
    use crate::syntax::SyntaxNode;

    fn parse_expression(source: &str) -> (SyntaxNode, Vec<String>) {
        let exprs = DefaultExpressions;
        let mut p = Parser::new(source, &exprs);
        p.parse_expression_code_fragment();
        let parse = p.into_parse();
        let errors = parse.errors().iter().map(|e| e.message.clone()).collect();
        (parse.syntax(), errors)
    }

    fn parse_block(source: &str) -> (SyntaxNode, Vec<String>) {
        let exprs = DefaultExpressions;
        let mut p = Parser::new(source, &exprs);
        p.parse_block_code_fragment();
        let parse = p.into_parse();
        let errors = parse.errors().iter().map(|e| e.message.clone()).collect();
        (parse.syntax(), errors)
    }

    fn texts(root: &SyntaxNode, kind: SyntaxKind) -> Vec<String> {
        root.descendants()
            .filter(|n| n.kind() == kind)
            .map(|n| n.text().to_string())
            .collect()
    }

    fn top(root: &SyntaxNode) -> SyntaxNode {
        root.first_child().unwrap()
    }

    #[test]
    fn test_precedence() {
        let (root, errors) = parse_expression("a = b || c && d == e + f * g");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(
            texts(&root, BINARY_EXPRESSION),
            vec!["a = b || c && d == e + f * g", "b || c && d == e + f * g", "c && d == e + f * g", "d == e + f * g", "e + f * g", "f * g"]
        );
    }

    #[test]
    fn test_type_operators() {
        let (root, errors) = parse_expression("x as? String ?: y is Int");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(top(&root).kind(), IS_EXPRESSION);
        assert_eq!(texts(&root, BINARY_WITH_TYPE), vec!["x as? String"]);
        assert_eq!(texts(&root, BINARY_EXPRESSION), vec!["x as? String ?: y"]);
    }

    #[test]
    fn test_infix_call_and_range() {
        let (root, errors) = parse_expression("1 shl 2..3");
        assert!(errors.is_empty(), "{errors:?}");
        let operations = texts(&root, OPERATION_REFERENCE);
        assert_eq!(operations, vec!["shl", ".."]);
    }

    #[test]
    fn test_prefix_and_postfix() {
        let (root, errors) = parse_expression("-a!!.b++");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(top(&root).kind(), PREFIX_EXPRESSION);
        assert_eq!(texts(&root, POSTFIX_EXPRESSION), vec!["a!!.b++", "a!!"]);

        let (root, _) = parse_expression("!!x");
        assert_eq!(texts(&root, PREFIX_EXPRESSION), vec!["!!x", "!x"]);
    }

    #[test]
    fn test_calls_and_trailing_lambdas() {
        let (root, errors) = parse_expression("list.map<Int>(1, f = 2, *xs) { it + 1 }");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(top(&root).kind(), DOT_QUALIFIED_EXPRESSION);
        assert_eq!(texts(&root, VALUE_ARGUMENT), vec!["1", "f = 2", "*xs"]);
        assert_eq!(texts(&root, VALUE_ARGUMENT_NAME), vec!["f"]);
        assert_eq!(texts(&root, LAMBDA_ARGUMENT), vec!["{ it + 1 }"]);
        assert_eq!(texts(&root, TYPE_ARGUMENT_LIST), vec!["<Int>"]);
    }

    #[test]
    fn test_comparison_is_not_type_arguments() {
        let (root, errors) = parse_expression("a < b && c > d");
        assert!(errors.is_empty(), "{errors:?}");
        assert!(texts(&root, TYPE_ARGUMENT_LIST).is_empty());
        assert_eq!(texts(&root, BINARY_EXPRESSION).len(), 3);
    }

    #[test]
    fn test_value_argument_errors() {
        let (_, errors) = parse_expression("f(a 1)");
        assert_eq!(errors, vec!["Expecting ','"]);

        let (_, errors) = parse_expression("f(a: Int)");
        assert_eq!(errors, vec!["Unexpected type specification"]);

        let (_, errors) = parse_expression("f(, a)");
        assert_eq!(errors, vec!["Expecting an expression"]);
    }

    #[test]
    fn test_indexing_and_collection_literals() {
        let (root, errors) = parse_expression("m[1, 2] + [3, 4]");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, ARRAY_ACCESS_EXPRESSION), vec!["m[1, 2]"]);
        assert_eq!(texts(&root, INDICES), vec!["[1, 2]"]);
        assert_eq!(texts(&root, COLLECTION_LITERAL_EXPRESSION), vec!["[3, 4]"]);

        let (_, errors) = parse_expression("m[]");
        assert_eq!(errors, vec!["Expecting an index element"]);
    }

    #[test]
    fn test_callable_references() {
        let (root, errors) = parse_expression("String::length");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(top(&root).kind(), CALLABLE_REFERENCE_EXPRESSION);

        let (root, errors) = parse_expression("Foo::class");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(top(&root).kind(), CLASS_LITERAL_EXPRESSION);

        let (_, errors) = parse_expression("::foo<Int>");
        assert_eq!(errors, vec!["Type arguments are not allowed"]);
    }

    #[test]
    fn test_if_and_when() {
        let (root, errors) = parse_expression("if (a) b else c");
        assert!(errors.is_empty(), "{errors:?}");
        let kinds: Vec<SyntaxKind> = top(&root).children().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec![CONDITION, THEN, ELSE]);

        let source = "when (val x = f()) {\n  1, 2 -> a\n  in r -> b\n  !is T -> c\n  else -> d\n}";
        let (root, errors) = parse_expression(source);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, WHEN_ENTRY).len(), 4);
        assert_eq!(texts(&root, WHEN_CONDITION_EXPRESSION), vec!["1", "2"]);
        assert_eq!(texts(&root, WHEN_CONDITION_IN_RANGE), vec!["in r"]);
        assert_eq!(texts(&root, WHEN_CONDITION_IS_PATTERN), vec!["!is T"]);
        assert_eq!(texts(&root, PROPERTY), vec!["val x = f()"]);
    }

    #[test]
    fn test_when_errors() {
        let (_, errors) = parse_expression("when { -> a }");
        assert_eq!(errors, vec!["Expecting an expression, is-condition or in-condition"]);

        let (_, errors) = parse_expression("when { else }");
        assert_eq!(errors, vec!["Expecting '->'"]);
    }

    #[test]
    fn test_try() {
        let (root, errors) = parse_expression("try { a } catch (e: E) { b } finally { c }");
        assert!(errors.is_empty(), "{errors:?}");
        let kinds: Vec<SyntaxKind> = top(&root).children().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec![BLOCK, CATCH, FINALLY]);

        let (_, errors) = parse_expression("try { a }");
        assert_eq!(errors, vec!["Expecting 'catch' or 'finally'"]);

        let (_, errors) = parse_expression("try { a } catch { }");
        assert_eq!(errors, vec!["Expecting exception variable declaration"]);
    }

    #[test]
    fn test_loops() {
        let (root, errors) = parse_block("for ((k, v) in map) println(k)\nwhile (x) x--\ndo { } while (y)");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, DESTRUCTURING_DECLARATION), vec!["(k, v)"]);
        assert_eq!(texts(&root, LOOP_RANGE), vec!["map"]);
        assert_eq!(texts(&root, BODY), vec!["println(k)", "x--", "{ }"]);
        assert_eq!(texts(&root, DO_WHILE).len(), 1);

        let (_, errors) = parse_block("for x in xs) {}");
        assert_eq!(errors[0], "Expecting '(' to open a loop range");
    }

    #[test]
    fn test_jumps_and_labels() {
        let (root, errors) = parse_block("loop@ for (x in xs) { if (x) break@loop else continue }\nreturn@f 1");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, LABEL), vec!["loop@", "@loop", "@f"]);
        assert_eq!(texts(&root, LABELED_EXPRESSION).len(), 1);
        assert_eq!(texts(&root, RETURN), vec!["return@f 1"]);

        let (_, errors) = parse_block("break @loop");
        assert_eq!(errors, vec!["There should be no space or comments before '@' in label reference"]);
    }

    #[test]
    fn test_lambda_parameters() {
        let (root, errors) = parse_expression("{ a, (b, c): P -> a }");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, VALUE_PARAMETER), vec!["a", "(b, c): P"]);
        assert_eq!(top(&root).kind(), LAMBDA_EXPRESSION);

        // no arrow: the identifier is the body
        let (root, errors) = parse_expression("{ a }");
        assert!(errors.is_empty(), "{errors:?}");
        assert!(texts(&root, VALUE_PARAMETER_LIST).is_empty());

        let (_, errors) = parse_expression("{ a, b }");
        assert!(errors.contains(&"An -> is expected".to_string()), "{errors:?}");
    }

    #[test]
    fn test_statements_on_one_line() {
        let (_, errors) = parse_block("a) b");
        assert_eq!(errors, vec!["Unexpected tokens (use ';' to separate expressions on the same line)"]);

        let (_, errors) = parse_block("a if (b) c");
        assert_eq!(errors, vec!["Unexpected tokens (use ';' to separate expressions on the same line)"]);

        let (_, errors) = parse_block("a; b\nc");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_newline_ends_binary_expression() {
        let (root, errors) = parse_block("a\n+ b\nc\n?: d");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, PREFIX_EXPRESSION), vec!["+ b"]);
        assert_eq!(texts(&root, BINARY_EXPRESSION), vec!["c\n?: d"]);
    }

    #[test]
    fn test_local_declarations() {
        let (root, errors) = parse_block("val (a, b) = p\nfun local() = 1\nclass Local\nobject : Runnable { }");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, DESTRUCTURING_DECLARATION), vec!["val (a, b) = p"]);
        assert_eq!(texts(&root, FUN), vec!["fun local() = 1"]);
        assert_eq!(texts(&root, CLASS), vec!["class Local"]);
        assert_eq!(texts(&root, OBJECT_LITERAL), vec!["object : Runnable { }"]);
    }

    #[test]
    fn test_anonymous_function() {
        let (root, errors) = parse_expression("fun(x: Int): Int = x");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(top(&root).kind(), FUN);
    }

    #[test]
    fn test_annotated_expressions() {
        let (root, errors) = parse_block("@Suppress(\"x\")\nfoo()\n@A bar");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, ANNOTATED_EXPRESSION), vec!["@Suppress(\"x\")\nfoo()", "@A bar"]);
    }

    #[test]
    fn test_this_super_and_literals() {
        let (root, errors) = parse_expression("super<Base>@Outer.f(this@A, 'c', 1.5, null, true, \"s\")");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, SUPER_EXPRESSION), vec!["super<Base>@Outer"]);
        assert_eq!(texts(&root, THIS_EXPRESSION), vec!["this@A"]);
        assert_eq!(texts(&root, CHARACTER_CONSTANT), vec!["'c'"]);
        assert_eq!(texts(&root, FLOAT_CONSTANT), vec!["1.5"]);
        assert_eq!(texts(&root, NULL), vec!["null"]);
        assert_eq!(texts(&root, BOOLEAN_CONSTANT), vec!["true"]);
        assert_eq!(texts(&root, STRING_TEMPLATE), vec!["\"s\""]);
    }

    #[test]
    fn test_missing_expression() {
        let (_, errors) = parse_expression(")");
        assert_eq!(errors[0], "Expecting an expression");
    }
}
