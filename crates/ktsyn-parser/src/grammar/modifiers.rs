//! Modifier lists, annotations and context receivers

use crate::parser::Parser;
use crate::syntax::SyntaxKind::{self, *};
use crate::token_set::{
    TokenSet, ANNOTATION_TARGETS, MODIFIER_KEYWORDS,
    NO_MODIFIER_BEFORE_FOR_VALUE_PARAMETER, RESERVED_VALUE_PARAMETER_MODIFIER_KEYWORDS,
    TYPE_ARGUMENT_MODIFIER_KEYWORDS, TYPE_MODIFIER_KEYWORDS,
};

/// Where annotations are being parsed, which decides what they may look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationMode {
    Default,
    /// File annotations before a `package` directive
    FileBeforePackage,
    /// File annotations in a file without `package`; each needs a `file:` target
    FileWhenPackageOmitted,
    /// Annotations on a type
    TypeContext,
    /// Type annotations where whitespace before `(` ends the annotation
    SignificantWhitespace,
    NoAnnotations,
}

impl AnnotationMode {
    fn is_file(self) -> bool {
        matches!(self, Self::FileBeforePackage | Self::FileWhenPackageOmitted)
    }

    fn allow_annotations(self) -> bool {
        self != Self::NoAnnotations
    }

    fn type_context(self) -> bool {
        matches!(self, Self::TypeContext | Self::SignificantWhitespace)
    }

    fn whitespace_significant(self) -> bool {
        self == Self::SignificantWhitespace
    }
}

/// Records modifiers that change how the following declaration parses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierDetector {
    pub enum_detected: bool,
    pub companion_detected: bool,
}

impl ModifierDetector {
    fn consume(&mut self, kind: SyntaxKind) {
        match kind {
            ENUM_KW => self.enum_detected = true,
            COMPANION_KW => self.companion_detected = true,
            _ => {}
        }
    }
}

const ANNOTATION_TARGET_RECOVERY: TokenSet = TokenSet::new(&[IDENTIFIER, RBRACKET, LBRACKET]);

impl<'t> Parser<'t> {
    // === Modifier lists ===

    /// Parse a MODIFIER_LIST of keywords and annotations. Returns whether one
    /// was found.
    pub(crate) fn parse_modifier_list(
        &mut self,
        detector: Option<&mut ModifierDetector>,
        mode: AnnotationMode,
        no_modifiers_before: TokenSet,
    ) -> bool {
        self.do_parse_modifier_list(detector, MODIFIER_KEYWORDS, mode, no_modifiers_before)
    }

    /// Annotations only, no modifier keywords
    pub(crate) fn parse_annotations_list(&mut self, mode: AnnotationMode, no_modifiers_before: TokenSet) -> bool {
        self.do_parse_modifier_list(None, TokenSet::EMPTY, mode, no_modifiers_before)
    }

    /// Modifiers before a type: `suspend` and annotations
    pub(crate) fn parse_type_modifier_list(&mut self) -> bool {
        self.do_parse_modifier_list(None, TYPE_MODIFIER_KEYWORDS, AnnotationMode::TypeContext, TokenSet::EMPTY)
    }

    /// Variance before a type argument: `in`, `out`
    pub(crate) fn parse_type_argument_modifier_list(&mut self) -> bool {
        self.do_parse_modifier_list(
            None,
            TYPE_ARGUMENT_MODIFIER_KEYWORDS,
            AnnotationMode::NoAnnotations,
            TokenSet::new(&[COMMA, COLON, GT]),
        )
    }

    /// Modifiers before a function type parameter, kept for error reporting
    pub(crate) fn parse_function_type_value_parameter_modifier_list(&mut self) -> bool {
        self.do_parse_modifier_list(
            None,
            RESERVED_VALUE_PARAMETER_MODIFIER_KEYWORDS,
            AnnotationMode::NoAnnotations,
            NO_MODIFIER_BEFORE_FOR_VALUE_PARAMETER,
        )
    }

    fn do_parse_modifier_list(
        &mut self,
        mut detector: Option<&mut ModifierDetector>,
        keywords: TokenSet,
        mode: AnnotationMode,
        no_modifiers_before: TokenSet,
    ) -> bool {
        let list = self.start();
        let empty = !self.do_parse_modifier_list_body(detector.as_deref_mut(), keywords, mode, no_modifiers_before);
        if empty {
            list.drop(self);
        } else {
            list.commit(self, MODIFIER_LIST);
        }
        !empty
    }

    fn do_parse_modifier_list_body(
        &mut self,
        mut detector: Option<&mut ModifierDetector>,
        keywords: TokenSet,
        mode: AnnotationMode,
        no_modifiers_before: TokenSet,
    ) -> bool {
        let mut empty = true;
        while !self.at_eof() {
            if self.at(AT) && mode.allow_annotations() {
                let annotation = self.start();
                let complete = self.parse_annotation_or_list(mode);
                if !complete && !mode.whitespace_significant() {
                    // Retry the whole list with whitespace before `(` ending an
                    // annotation: `@A (x) -> Unit` annotates a function type
                    annotation.rollback(self);
                    self.do_parse_modifier_list_body(
                        detector,
                        keywords,
                        AnnotationMode::SignificantWhitespace,
                        no_modifiers_before,
                    );
                    return true;
                }
                annotation.drop(self);
            } else if !self.try_parse_modifier(detector.as_deref_mut(), keywords, no_modifiers_before) {
                break;
            }
            empty = false;
        }
        !empty
    }

    fn try_parse_modifier(
        &mut self,
        detector: Option<&mut ModifierDetector>,
        keywords: TokenSet,
        no_modifiers_before: TokenSet,
    ) -> bool {
        let m = self.start();
        if self.at_set(keywords) {
            let next = self.lookahead(1);
            let fun_not_before_interface = self.at(FUN_KW) && next != INTERFACE_KW;
            if !fun_not_before_interface && next != EOF && !no_modifiers_before.contains(next) {
                let kind = self.current();
                if let Some(detector) = detector {
                    detector.consume(kind);
                }
                self.bump();
                m.collapse(self, kind);
                return true;
            }
        }
        m.rollback(self);
        false
    }

    // === Context receivers ===

    /// `context(A, label@B)`
    pub(crate) fn parse_context_receiver_list(&mut self) {
        let list = self.start();
        self.bump(); // consume 'context'
        if !self.at(LPAR) {
            self.error_with_recovery("Expecting context receivers", Some(TokenSet::EMPTY));
            list.drop(self);
            return;
        }

        self.bump(); // consume '('
        loop {
            if self.at(COMMA) {
                self.error_and_advance("Expecting a type reference", 1);
            }
            self.parse_context_receiver();
            if self.eat(RPAR) {
                break;
            }
            if !self.eat(COMMA) {
                self.error("Expecting comma or ')'");
                break;
            }
        }
        list.commit(self, CONTEXT_RECEIVER_LIST);
    }

    fn parse_context_receiver(&mut self) {
        let receiver = self.start();
        if self.at_label_definition() {
            self.label_definition();
        }
        self.parse_type_ref();
        receiver.commit(self, CONTEXT_RECEIVER);
    }

    // === Annotations ===

    /// FILE_ANNOTATION_LIST of `@file:` annotations
    pub(crate) fn parse_file_annotation_list(&mut self, mode: AnnotationMode) {
        if !mode.is_file() {
            return;
        }
        let list = self.start();
        if self.parse_annotations(mode) {
            list.commit(self, FILE_ANNOTATION_LIST);
        } else {
            list.drop(self);
        }
    }

    /// A run of annotations, returns whether there was at least one
    pub(crate) fn parse_annotations(&mut self, mode: AnnotationMode) -> bool {
        if !self.parse_annotation_or_list(mode) {
            return false;
        }
        while self.parse_annotation_or_list(mode) {}
        true
    }

    /// `@Ann`, `@target:Ann(args)` or `@[A B]`. Returns false when nothing
    /// was parsed, or when a type-context annotation took arguments that may
    /// belong to a function type instead.
    fn parse_annotation_or_list(&mut self, mode: AnnotationMode) -> bool {
        if !self.at(AT) {
            return false;
        }

        let after_at = self.raw_lookup(1);
        let mut token_to_match = after_at;
        let mut is_targeted = false;
        if (after_at == IDENTIFIER || ANNOTATION_TARGETS.contains(after_at)) && self.lookahead(2) == COLON {
            token_to_match = self.lookahead(3);
            is_targeted = true;
        } else if self.lookahead(1) == COLON {
            // recovery for `@:ann`
            token_to_match = self.lookahead(2);
            is_targeted = true;
        }

        // Soft keywords still carry IDENTIFIER as their lexed kind
        if token_to_match.is_soft_keyword() {
            token_to_match = IDENTIFIER;
        }
        match token_to_match {
            IDENTIFIER => return self.parse_annotation(mode),
            LBRACKET => return self.parse_annotation_list(mode),
            _ => {}
        }

        if !is_targeted {
            self.error_and_advance("Expected annotation identifier after '@'", 1);
        } else if self.lookahead(1) == COLON {
            self.error_and_advance("Expected annotation identifier after ':'", 2);
        } else {
            self.error_and_advance("Expected annotation identifier after ':'", 3);
        }
        true
    }

    fn parse_annotation_list(&mut self, mode: AnnotationMode) -> bool {
        let list = self.start();
        self.disable_newlines();
        self.bump(); // consume '@'

        if !self.parse_annotation_target_if_needed(mode) {
            self.restore_newlines();
            list.rollback(self);
            return false;
        }

        self.bump(); // consume '['
        if !self.at(IDENTIFIER) && !self.at(AT) {
            self.error("Expecting a list of annotations");
        } else {
            while self.at(IDENTIFIER) || self.at(AT) {
                if self.at(AT) {
                    self.error_and_advance("No '@' needed in annotation list", 1);
                    continue;
                }
                self.parse_annotation(AnnotationMode::Default);
                while self.at(COMMA) {
                    self.error_and_advance("No commas needed to separate annotations", 1);
                }
            }
        }
        self.expect(RBRACKET, "Expecting ']' to close the annotation list");
        self.restore_newlines();

        list.commit(self, ANNOTATION);
        true
    }

    /// Parse the `target:` of an annotation, or check that it may be omitted.
    /// Returns false when the annotation does not belong in this position.
    fn parse_annotation_target_if_needed(&mut self, mode: AnnotationMode) -> bool {
        const NO_TARGET: &str = "Expected annotation target before ':'";

        if self.at(COLON) {
            // recovery for `@:ann`
            self.error_and_advance(NO_TARGET, 1);
            return true;
        }

        let target = self.at_target_keyword();
        if mode == AnnotationMode::FileWhenPackageOmitted
            && !(target == Some(FILE_KW) && self.lookahead(1) == COLON)
        {
            return false;
        }

        if self.lookahead(1) == COLON && target.is_none() && self.at(IDENTIFIER) {
            // recovery for `@fil:ann`
            self.error_and_advance(NO_TARGET, 1);
            self.bump(); // consume ':'
            return true;
        }

        match target {
            Some(target) => self.parse_annotation_target(target),
            None if mode.is_file() => self.parse_annotation_target(FILE_KW),
            None => {}
        }
        true
    }

    fn parse_annotation_target(&mut self, keyword: SyntaxKind) {
        let message = format!(
            "Expecting \"{}:\" prefix for {} annotations",
            keyword.keyword_text().unwrap_or(""),
            keyword.keyword_text().unwrap_or("")
        );

        let target = self.start();
        if !self.expect(keyword, &message) {
            target.drop(self);
        } else {
            target.commit(self, ANNOTATION_TARGET);
        }
        self.expect_with_recovery(COLON, &message, Some(ANNOTATION_TARGET_RECOVERY));
    }

    fn at_target_keyword(&mut self) -> Option<SyntaxKind> {
        ANNOTATION_TARGETS.iter().find(|&target| self.at(target))
    }

    /// ANNOTATION_ENTRY: `@Name<Args>(args)`. Returns false when, in a type
    /// context, the arguments might be a function type's parameters instead.
    pub(crate) fn parse_annotation(&mut self, mode: AnnotationMode) -> bool {
        let annotation = self.start();
        let has_at = self.at(AT);
        if has_at {
            self.bump(); // consume '@'
        }
        if has_at && !self.parse_annotation_target_if_needed(mode) {
            annotation.rollback(self);
            return false;
        }

        let reference = self.start();
        let type_reference = self.start();
        self.parse_user_type();
        type_reference.commit(self, TYPE_REFERENCE);
        reference.commit(self, CONSTRUCTOR_CALLEE);

        self.parse_type_argument_list();

        let whitespace_after_annotation = self.raw_lookup(-1).is_trivia();
        let should_parse_arguments = !(whitespace_after_annotation && mode.whitespace_significant());
        if self.at(LPAR) && should_parse_arguments {
            self.value_argument_list();
            if mode.type_context() && (self.last_token() != RPAR || self.at(ARROW)) {
                annotation.commit(self, ANNOTATION_ENTRY);
                return false;
            }
        }
        annotation.commit(self, ANNOTATION_ENTRY);
        true
    }
}
