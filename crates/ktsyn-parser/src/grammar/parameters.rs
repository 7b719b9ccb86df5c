//! Type parameters, type constraints and value parameters

use super::AnnotationMode;
use crate::parser::Parser;
use crate::syntax::SyntaxKind::*;
use crate::token_set::{
    TokenSet, LAMBDA_VALUE_PARAMETER_FIRST, NO_MODIFIER_BEFORE_FOR_VALUE_PARAMETER,
    PARAMETER_NAME_RECOVERY_SET, TYPE_PARAMETER_GT_RECOVERY_SET, TYPE_REF_FIRST, VALUE_PARAMETER_FIRST,
};

impl<'t> Parser<'t> {
    // === Type parameters ===

    /// TYPE_PARAMETER_LIST if at `<`. Returns whether there was one.
    pub(crate) fn parse_type_parameter_list(&mut self, recovery: TokenSet) -> bool {
        if !self.at(LT) {
            return false;
        }

        let list = self.start();
        self.disable_newlines();
        self.bump(); // consume '<'

        loop {
            if self.at(COMMA) {
                self.error_and_advance("Expecting type parameter declaration", 1);
            }
            self.parse_type_parameter();

            if !self.eat(COMMA) || self.at(GT) {
                break;
            }
        }

        self.expect_with_recovery(GT, "Missing '>'", Some(recovery));
        self.restore_newlines();
        list.commit(self, TYPE_PARAMETER_LIST);
        true
    }

    /// `reified T : Bound`
    fn parse_type_parameter(&mut self) {
        if self.at_set(TYPE_PARAMETER_GT_RECOVERY_SET) {
            self.error("Type parameter declaration expected");
            return;
        }

        let parameter = self.start();
        self.parse_modifier_list(None, AnnotationMode::Default, TokenSet::new(&[GT, COMMA, COLON]));
        self.expect_with_recovery(IDENTIFIER, "Type parameter name expected", Some(TokenSet::EMPTY));
        if self.eat(COLON) {
            self.parse_type_ref();
        }
        parameter.commit(self, TYPE_PARAMETER);
    }

    // === Type constraints ===

    /// A `where` clause, reported when there are no type parameters to constrain
    pub(crate) fn parse_type_constraints_guarded(&mut self, type_parameters_declared: bool) {
        let error = self.start();
        let constraints = self.parse_type_constraints();
        self.error_if(
            error,
            constraints && !type_parameters_declared,
            "Type constraints are not allowed when no type parameters declared",
        );
    }

    /// `where T : A, U : B`. Returns whether there was a `where`.
    pub(crate) fn parse_type_constraints(&mut self) -> bool {
        if !self.at(WHERE_KW) {
            return false;
        }
        self.bump(); // consume 'where'

        let list = self.start();
        loop {
            if self.at(COMMA) {
                self.error_and_advance("Type constraint expected", 1);
            }
            self.parse_type_constraint();
            if !self.eat(COMMA) {
                break;
            }
        }
        list.commit(self, TYPE_CONSTRAINT_LIST);
        true
    }

    fn parse_type_constraint(&mut self) {
        let constraint = self.start();
        self.parse_annotations(AnnotationMode::Default);

        let reference = self.start();
        let name_recovery = TokenSet::new(&[COLON, COMMA, LBRACE, RBRACE]).union(TYPE_REF_FIRST);
        let found = self.expect_with_recovery(IDENTIFIER, "Expecting type parameter name", Some(name_recovery));
        self.done_or_drop(reference, REFERENCE_EXPRESSION, found);

        self.expect_with_recovery(
            COLON,
            "Expecting ':' before the upper bound",
            Some(TokenSet::new(&[LBRACE, RBRACE]).union(TYPE_REF_FIRST)),
        );
        self.parse_type_ref();
        constraint.commit(self, TYPE_CONSTRAINT);
    }

    // === Value parameters ===

    /// VALUE_PARAMETER_LIST at `(`. In a function type (`function_type`) a
    /// parameter may be a bare type.
    pub(crate) fn parse_value_parameter_list(&mut self, function_type: bool, type_required: bool, recovery: TokenSet) {
        let list = self.start();
        self.disable_newlines();
        self.bump(); // consume '('

        let first_set = if function_type {
            LAMBDA_VALUE_PARAMETER_FIRST
        } else {
            VALUE_PARAMETER_FIRST
        };

        if !self.at(RPAR) && !self.at_set(recovery) {
            loop {
                if self.at(COMMA) {
                    self.error_and_advance("Expecting a parameter declaration", 1);
                } else if self.at(RPAR) {
                    break;
                }

                if function_type {
                    if !self.try_parse_value_parameter(type_required) {
                        let parameter = self.start();
                        self.parse_function_type_value_parameter_modifier_list();
                        self.parse_type_ref();
                        self.close_declaration(parameter, VALUE_PARAMETER, false);
                    }
                } else {
                    self.parse_value_parameter(type_required);
                }

                if self.eat(COMMA) {
                    continue;
                }
                if self.at(COLON) {
                    // `x: Array<Int> : Int`, reported by the next parameter
                    continue;
                }
                if !self.at(RPAR) {
                    self.error("Expecting comma or ')'");
                }
                if !self.at_set(first_set) {
                    break;
                }
            }
        }

        self.expect_with_recovery(RPAR, "Expecting ')'", Some(recovery));
        self.restore_newlines();
        list.commit(self, VALUE_PARAMETER_LIST);
    }

    /// A parameter that may turn out not to be one; rolled back on failure
    pub(crate) fn try_parse_value_parameter(&mut self, type_required: bool) -> bool {
        self.parse_value_parameter_with(true, type_required)
    }

    pub(crate) fn parse_value_parameter(&mut self, type_required: bool) {
        self.parse_value_parameter_with(false, type_required);
    }

    fn parse_value_parameter_with(&mut self, rollback_on_failure: bool, type_required: bool) -> bool {
        let parameter = self.start();
        self.parse_modifier_list(None, AnnotationMode::Default, NO_MODIFIER_BEFORE_FOR_VALUE_PARAMETER);

        if self.at(VAR_KW) || self.at(VAL_KW) {
            self.bump(); // consume 'val'/'var'
        }

        if !self.parse_function_parameter_rest(type_required) && rollback_on_failure {
            parameter.rollback(self);
            return false;
        }

        self.close_declaration(parameter, VALUE_PARAMETER, false);
        true
    }

    /// `name: Type = default`. Returns false on errors that make the parameter
    /// doubtful.
    fn parse_function_parameter_rest(&mut self, type_required: bool) -> bool {
        let mut no_errors = true;

        if (self.at(IDENTIFIER) && self.lookahead(1) == LT) || self.at(COLON) {
            // `fun f(Array<String>)` or `fun f(: Int)`
            self.error("Parameter name expected");
            if self.at(COLON) {
                // unnamed parameters starting with `:` stay, for function types
                self.bump(); // consume ':'
            } else {
                no_errors = false;
            }
            self.parse_type_ref();
        } else {
            self.expect_with_recovery(IDENTIFIER, "Parameter name expected", Some(PARAMETER_NAME_RECOVERY_SET));

            if self.eat(COLON) {
                if self.at(IDENTIFIER) && self.lookahead(1) == COLON {
                    // `fun f(x: y: Int)`: `y` names the next parameter
                    self.error("Type reference expected");
                    return false;
                }
                self.parse_type_ref();
            } else if type_required {
                self.error_with_recovery("Parameters must have type annotation", Some(PARAMETER_NAME_RECOVERY_SET));
                no_errors = false;
            }
        }

        if self.eat(EQ) {
            self.expression();
        }

        no_errors
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::DefaultExpressions;
    use crate::parser::Parser;
    use crate::syntax::SyntaxKind::*;
    use crate::syntax::SyntaxNode;
    use crate::token_set::TokenSet;

    fn parse_with(source: &str, f: impl FnOnce(&mut Parser<'_>)) -> (SyntaxNode, Vec<String>) {
        let exprs = DefaultExpressions;
        let mut p = Parser::new(source, &exprs);
        let file = p.start();
        f(&mut p);
        while !p.at_eof() {
            p.bump();
        }
        file.commit(&mut p, FILE);
        let parse = p.into_parse();
        let errors = parse.errors().iter().map(|e| e.message.clone()).collect();
        (parse.syntax(), errors)
    }

    fn texts(root: &SyntaxNode, kind: crate::SyntaxKind) -> Vec<String> {
        root.descendants()
            .filter(|n| n.kind() == kind)
            .map(|n| n.text().to_string())
            .collect()
    }

    #[test]
    fn test_type_parameters() {
        let (root, errors) = parse_with("<in T, reified R : Any?>", |p| {
            assert!(p.parse_type_parameter_list(TokenSet::EMPTY));
        });
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, TYPE_PARAMETER), vec!["in T", "reified R : Any?"]);
    }

    #[test]
    fn test_type_parameter_list_missing_gt() {
        let (_, errors) = parse_with("<T (", |p| {
            p.parse_type_parameter_list(TokenSet::new(&[LPAR]));
        });
        assert_eq!(errors, vec!["Missing '>'"]);
    }

    #[test]
    fn test_type_constraints() {
        let (root, errors) = parse_with("where T : Comparable<T>, @A U : Any", |p| {
            p.parse_type_constraints_guarded(true);
        });
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, TYPE_CONSTRAINT).len(), 2);

        let (_, errors) = parse_with("where T : Any", |p| {
            p.parse_type_constraints_guarded(false);
        });
        assert_eq!(errors, vec!["Type constraints are not allowed when no type parameters declared"]);
    }

    #[test]
    fn test_value_parameters() {
        let (root, errors) = parse_with("(val x: Int = 1, vararg ys: String)", |p| {
            p.parse_value_parameter_list(false, true, TokenSet::EMPTY);
        });
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, VALUE_PARAMETER), vec!["val x: Int = 1", "vararg ys: String"]);
    }

    #[test]
    fn test_value_parameter_errors() {
        let (_, errors) = parse_with("(x, y: Int)", |p| {
            p.parse_value_parameter_list(false, true, TokenSet::EMPTY);
        });
        assert_eq!(errors, vec!["Parameters must have type annotation"]);

        let (_, errors) = parse_with("(Array<String>)", |p| {
            p.parse_value_parameter_list(false, true, TokenSet::EMPTY);
        });
        assert_eq!(errors, vec!["Parameter name expected"]);

        let (_, errors) = parse_with("(x: y: Int)", |p| {
            p.parse_value_parameter_list(false, true, TokenSet::EMPTY);
        });
        assert_eq!(errors[0], "Type reference expected");
    }

    #[test]
    fn test_function_type_parameters_may_be_bare_types() {
        let (root, errors) = parse_with("(Int, name: String)", |p| {
            p.parse_value_parameter_list(true, true, TokenSet::EMPTY);
        });
        assert!(errors.is_empty(), "{errors:?}");
        let parameters = texts(&root, VALUE_PARAMETER);
        assert_eq!(parameters, vec!["Int", "name: String"]);
    }
}
