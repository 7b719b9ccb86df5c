//! File preamble: file annotations, `package` and `import` directives

use super::AnnotationMode;
use crate::parser::{LeadingTrivia, Marker, Parser, TrailingTrivia};
use crate::syntax::SyntaxKind::*;
use crate::token_set::{TokenSet, EOL_OR_SEMICOLON_SET, IMPORT_RECOVERY_SET, PACKAGE_NAME_RECOVERY_SET};

impl<'t> Parser<'t> {
    /// Parse the preamble: file annotations, an optional package directive and
    /// the import list
    pub(crate) fn parse_preamble(&mut self) {
        let first_entry = self.start();
        self.parse_file_annotation_list(AnnotationMode::FileBeforePackage);

        let package_directive = self.start();
        self.parse_modifier_list(None, AnnotationMode::Default, TokenSet::EMPTY);

        if self.at(PACKAGE_KW) {
            self.bump(); // consume 'package'
            self.parse_package_name();
            first_entry.drop(self);
            self.eat(SEMICOLON);
            package_directive.commit(self, PACKAGE_DIRECTIVE);
        } else {
            // Without `package`, annotations at the top belong to the first
            // declaration unless they carry a `file:` target
            first_entry.rollback(self);
            self.parse_file_annotation_list(AnnotationMode::FileWhenPackageOmitted);
            let package_directive = self.start();
            // Only a shebang goes in; leading comments stay free for the first declaration
            package_directive.commit_with(self, PACKAGE_DIRECTIVE, LeadingTrivia::Shebang, TrailingTrivia::Exclude);
        }

        self.parse_import_directives();
    }

    /// `a.b.c` on a single line
    fn parse_package_name(&mut self) {
        const NOT_A_NAME: &str = "Package name must be a '.'-separated identifier list";

        let mut qualified = self.start();
        let mut simple_name = true;
        loop {
            if self.newline_before_current() {
                self.error_with_recovery(
                    "Package name must be a '.'-separated identifier list placed on a single line",
                    Some(PACKAGE_NAME_RECOVERY_SET),
                );
                break;
            }

            if self.at(DOT) {
                self.bump(); // consume '.'
                qualified.error(self, NOT_A_NAME);
                qualified = self.start();
                continue;
            }

            let name = self.start();
            let name_found = self.expect_with_recovery(IDENTIFIER, NOT_A_NAME, Some(PACKAGE_NAME_RECOVERY_SET));
            self.done_or_drop(name, REFERENCE_EXPRESSION, name_found);

            if !simple_name {
                let done = qualified.commit(self, DOT_QUALIFIED_EXPRESSION);
                qualified = done.precede(self);
            }

            if !self.at(DOT) {
                break;
            }
            self.bump(); // consume '.'
            if simple_name && !name_found {
                qualified.drop(self);
                qualified = self.start();
            } else {
                simple_name = false;
            }
        }
        qualified.drop(self);
    }

    pub(crate) fn parse_import_directives(&mut self) {
        let list = self.start();
        let empty = !self.at(IMPORT_KW);
        while self.at(IMPORT_KW) {
            self.parse_import_directive();
        }
        if empty {
            // An empty list sits before leading comments, leaving them to the
            // first declaration
            list.commit_with(self, IMPORT_LIST, LeadingTrivia::All, TrailingTrivia::Exclude);
        } else {
            list.commit(self, IMPORT_LIST);
        }
    }

    /// `import a.b.c`, `import a.b.*`, `import a.b.C as D`
    fn parse_import_directive(&mut self) {
        let directive = self.start();
        self.bump(); // consume 'import'

        let Some(directive) = self.close_import_if_newline(directive, "Expecting qualified name") else {
            return;
        };

        if !self.at(IDENTIFIER) {
            self.error_until("Expecting qualified name", EOL_OR_SEMICOLON_SET);
            self.close_import(directive);
            self.eat(SEMICOLON);
            return;
        }

        let mut qualified = self.start();
        let reference = self.start();
        self.bump(); // consume name
        reference.commit(self, REFERENCE_EXPRESSION);

        let mut directive = directive;
        while self.at(DOT) && self.lookahead(1) != MUL {
            self.bump(); // consume '.'

            directive = match self.close_import_if_newline(directive, "Import must be placed on a single line") {
                Some(directive) => directive,
                None => {
                    qualified.drop(self);
                    return;
                }
            };

            let reference = self.start();
            let found = self.expect_with_recovery(
                IDENTIFIER,
                "Qualified name must be a '.'-separated identifier list",
                Some(IMPORT_RECOVERY_SET),
            );
            self.done_or_drop(reference, REFERENCE_EXPRESSION, found);

            let done = qualified.commit(self, DOT_QUALIFIED_EXPRESSION);
            qualified = done.precede(self);
        }
        qualified.drop(self);

        if self.at(DOT) {
            self.bump(); // consume '.'
            self.bump(); // consume '*'
            if self.at(AS_KW) {
                let alias = self.start();
                self.bump(); // consume 'as'
                if self.newline_before_current() {
                    alias.drop(self);
                    self.error("Expecting identifier");
                    self.close_import(directive);
                    return;
                }
                self.eat(IDENTIFIER);
                let alias = alias.commit(self, IMPORT_ALIAS);
                alias.precede(self).error(self, "Cannot rename all imported items to one identifier");
            }
        }

        if self.at(AS_KW) {
            let alias = self.start();
            self.bump(); // consume 'as'
            if self.newline_before_current() {
                alias.commit(self, IMPORT_ALIAS);
                self.error("Expecting identifier");
                self.close_import(directive);
                return;
            }
            self.expect_with_recovery(IDENTIFIER, "Expecting identifier", Some(TokenSet::new(&[SEMICOLON])));
            alias.commit(self, IMPORT_ALIAS);
        }

        self.eat(SEMICOLON);
        self.close_import(directive);
    }

    /// Close the directive with `message` when the name continues on the next
    /// line. Hands the directive back when it stays open.
    fn close_import_if_newline(&mut self, directive: Marker, message: &str) -> Option<Marker> {
        if !self.newline_before_current() {
            return Some(directive);
        }
        self.error(message);
        self.close_import(directive);
        None
    }

    fn close_import(&mut self, directive: Marker) {
        directive.commit_with(self, IMPORT_DIRECTIVE, LeadingTrivia::Exclude, TrailingTrivia::SameLineComments);
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::DefaultExpressions;
    use crate::parser::Parser;
    use crate::syntax::SyntaxKind::{self, *};
    use crate::syntax::SyntaxNode;

    fn preamble(source: &str) -> (SyntaxNode, Vec<String>) {
        let exprs = DefaultExpressions;
        let mut p = Parser::new(source, &exprs);
        let file = p.start();
        p.parse_preamble();
        while !p.at_eof() {
            p.bump();
        }
        file.commit(&mut p, FILE);
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

    #[test]
    fn test_package_and_imports() {
        let (root, errors) = preamble("package a.b.c\n\nimport x.Y\nimport z.*\nimport q.R as S // why\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, PACKAGE_DIRECTIVE), vec!["package a.b.c"]);
        assert_eq!(
            texts(&root, IMPORT_DIRECTIVE),
            vec!["import x.Y", "import z.*", "import q.R as S // why"]
        );
        assert_eq!(texts(&root, IMPORT_ALIAS), vec!["as S"]);

        let package = root.descendants().find(|n| n.kind() == PACKAGE_DIRECTIVE).unwrap();
        let name = package.children().next().unwrap();
        assert_eq!(name.kind(), DOT_QUALIFIED_EXPRESSION);
        assert_eq!(name.text().to_string(), "a.b.c");
    }

    #[test]
    fn test_missing_package_directive_is_empty() {
        let (root, errors) = preamble("// about\nclass A");
        assert!(errors.is_empty());
        let package = root.first_child().unwrap();
        assert_eq!(package.kind(), PACKAGE_DIRECTIVE);
        assert_eq!(package.text().to_string(), "");
        // the comment is left after the empty directive and import list
        let kinds: Vec<SyntaxKind> = root.children_with_tokens().map(|e| e.kind()).collect();
        assert_eq!(&kinds[..3], &[PACKAGE_DIRECTIVE, IMPORT_LIST, EOL_COMMENT]);
    }

    #[test]
    fn test_shebang_goes_into_package_directive() {
        let (root, _) = preamble("#!/usr/bin/env kotlin\nprintln()");
        assert_eq!(texts(&root, PACKAGE_DIRECTIVE), vec!["#!/usr/bin/env kotlin\n"]);
    }

    #[test]
    fn test_package_name_on_multiple_lines() {
        let (_, errors) = preamble("package a.\nb");
        assert_eq!(
            errors,
            vec!["Package name must be a '.'-separated identifier list placed on a single line"]
        );
    }

    #[test]
    fn test_import_errors() {
        let (_, errors) = preamble("import");
        assert_eq!(errors, vec!["Expecting qualified name"]);

        let (root, errors) = preamble("import a.* as B");
        assert_eq!(errors, vec!["Cannot rename all imported items to one identifier"]);
        assert_eq!(texts(&root, ERROR), vec!["as B"]);

        let (_, errors) = preamble("import a.\nb");
        assert_eq!(errors, vec!["Import must be placed on a single line"]);
    }

    #[test]
    fn test_file_annotations_before_package() {
        let (root, errors) = preamble("@file:JvmName(\"Util\")\npackage p\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, FILE_ANNOTATION_LIST), vec!["@file:JvmName(\"Util\")"]);
    }
}
