//! Declarations: classes, objects, functions, properties and type aliases

use super::{AnnotationMode, ModifierDetector};
use crate::parser::Parser;
use crate::syntax::SyntaxKind::{self, *};
use crate::token_set::{
    TokenSet, CLASS_NAME_RECOVERY_SET, DECLARATION_FIRST, MODIFIER_KEYWORDS, PARAMETER_NAME_RECOVERY_SET,
    RECEIVER_TYPE_TERMINATORS, SOFT_KEYWORDS_AT_MEMBER_START, TOP_LEVEL_DECLARATION_FIRST,
    TYPE_PARAMETER_GT_RECOVERY_SET,
};

/// Whether a class-like declaration must, may or must not carry a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMode {
    Required,
    Allowed,
    /// Object expressions: a name is reported and skipped
    Prohibited,
}

/// Where a declaration appears, which decides the forms allowed there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationMode {
    MemberOrTopLevel,
    Local,
    ScriptTopLevel,
}

impl DeclarationMode {
    /// `val (a, b) = ...`
    pub fn destructuring_allowed(self) -> bool {
        !matches!(self, Self::MemberOrTopLevel)
    }

    pub fn accessors_allowed(self) -> bool {
        !matches!(self, Self::Local)
    }

    /// Whether `enum Name` without `class` is taken as a (broken) enum class
    pub fn enum_soft_keyword_allowed(self) -> bool {
        matches!(self, Self::MemberOrTopLevel)
    }
}

/// How an enum entry ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumEntryEnd {
    Failed,
    NoDelimiter,
    Comma,
    Semicolon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccessorKind {
    Get,
    Set,
    Field,
}

const PROPERTY_NAME_FOLLOW: TokenSet =
    TokenSet::new(&[COLON, EQ, LBRACE, RBRACE, SEMICOLON, VAL_KW, VAR_KW, FUN_KW, CLASS_KW]);
const FUNCTION_NAME_FOLLOW: TokenSet = TokenSet::new(&[LT, LPAR, RPAR, COLON, EQ]);
const VALUE_PARAMETERS_FOLLOW: TokenSet = TokenSet::new(&[EQ, LBRACE, RBRACE, SEMICOLON, RPAR]);
const ACCESSOR_FIRST_OR_PROPERTY_END: TokenSet =
    MODIFIER_KEYWORDS.union(TokenSet::new(&[AT, GET_KW, SET_KW, FIELD_KW, EOL_OR_SEMICOLON, RBRACE]));
const SECONDARY_CONSTRUCTOR_RECOVERY: TokenSet =
    TokenSet::new(&[LBRACE, SEMICOLON, RPAR, EOL_OR_SEMICOLON, RBRACE]);

impl<'t> Parser<'t> {
    // === Dispatch ===

    pub(crate) fn parse_top_level_declaration(&mut self) {
        if self.eat(SEMICOLON) {
            return;
        }
        let decl = self.start();

        if self.at(CONTEXT_KW) {
            self.parse_context_receiver_list();
        }

        let mut detector = ModifierDetector::default();
        self.parse_modifier_list(Some(&mut detector), AnnotationMode::Default, TokenSet::EMPTY);

        let mut kind = self.parse_common_declaration(detector, NameMode::Required, DeclarationMode::MemberOrTopLevel);

        if kind.is_none() && self.at(LBRACE) {
            self.error("Expecting a top level declaration");
            self.parse_block();
            kind = Some(FUN);
        }

        match kind {
            Some(kind) => {
                self.close_declaration(decl, kind, true);
            }
            None if self.at(IMPORT_KW) => {
                self.error("imports are only allowed in the beginning of file");
                self.parse_import_directives();
                decl.drop(self);
            }
            None => {
                self.error_and_advance("Expecting a top level declaration", 1);
                decl.drop(self);
            }
        }
    }

    /// The declarations shared by files, class bodies and blocks. Returns the
    /// node kind to close the declaration with, or `None` when none starts here.
    pub(crate) fn parse_common_declaration(
        &mut self,
        detector: ModifierDetector,
        object_name_mode: NameMode,
        mode: DeclarationMode,
    ) -> Option<SyntaxKind> {
        let kind = match self.current() {
            CLASS_KW | INTERFACE_KW => self.parse_class(detector.enum_detected, true),
            FUN_KW => self.parse_function(),
            VAL_KW | VAR_KW => self.parse_property(mode),
            TYPEALIAS_KW => self.parse_type_alias(),
            OBJECT_KW => {
                self.parse_object(object_name_mode, true);
                OBJECT_DECLARATION
            }
            IDENTIFIER if detector.enum_detected && mode.enum_soft_keyword_allowed() => self.parse_class(true, false),
            _ => return None,
        };
        Some(kind)
    }

    // === Classes and objects ===

    fn parse_class(&mut self, enum_class: bool, expect_kind_keyword: bool) -> SyntaxKind {
        self.parse_class_or_object(false, NameMode::Required, true, enum_class, expect_kind_keyword)
    }

    /// `object Name : Super { ... }`, also used for object literals
    pub(crate) fn parse_object(&mut self, name_mode: NameMode, optional_body: bool) {
        self.parse_class_or_object(true, name_mode, optional_body, false, true);
    }

    fn parse_class_or_object(
        &mut self,
        object: bool,
        name_mode: NameMode,
        optional_body: bool,
        enum_class: bool,
        expect_kind_keyword: bool,
    ) -> SyntaxKind {
        let kind = if object { OBJECT_DECLARATION } else { CLASS };

        if expect_kind_keyword {
            self.bump(); // consume 'class', 'interface' or 'object'
        } else {
            self.error("'class' keyword is expected after 'enum'");
        }

        let mut name_missing = false;
        match name_mode {
            NameMode::Required => {
                name_missing = !self.expect_with_recovery(IDENTIFIER, "Name expected", Some(CLASS_NAME_RECOVERY_SET));
            }
            NameMode::Allowed => {
                self.eat(IDENTIFIER);
            }
            NameMode::Prohibited => {
                if self.at(IDENTIFIER) {
                    self.error_and_advance("An object expression cannot bind a name", 1);
                }
            }
        }

        let type_parameters = self.parse_type_parameter_list(TYPE_PARAMETER_GT_RECOVERY_SET);

        let before_constructor_modifiers = self.start();
        let primary_constructor = self.start();
        let has_modifiers = self.parse_modifier_list(None, AnnotationMode::Default, TokenSet::EMPTY);

        // Modifiers with nothing constructor-like after them start the next declaration
        if has_modifiers && !self.at_set(TokenSet::new(&[LPAR, LBRACE, COLON, CONSTRUCTOR_KW])) {
            primary_constructor.drop(self);
            before_constructor_modifiers.rollback(self);
            return kind;
        }
        before_constructor_modifiers.drop(self);

        let has_constructor_keyword = self.eat(CONSTRUCTOR_KW);
        if self.at(LPAR) {
            self.parse_value_parameter_list(false, true, TokenSet::new(&[LBRACE, RBRACE]));
            primary_constructor.commit(self, PRIMARY_CONSTRUCTOR);
        } else if has_modifiers || has_constructor_keyword {
            // `class A private : B` or `class A constructor {`
            primary_constructor.commit(self, PRIMARY_CONSTRUCTOR);
            if has_constructor_keyword {
                self.error("Expecting primary constructor parameter list");
            } else {
                self.error("Expecting 'constructor' keyword");
            }
        } else {
            primary_constructor.drop(self);
        }

        if self.eat(COLON) {
            self.parse_delegation_specifier_list();
        }

        let where_clause = if object { Some(self.start()) } else { None };
        let before_where = self.raw_position();
        self.parse_type_constraints_guarded(type_parameters);
        if let Some(where_clause) = where_clause {
            let found = self.raw_position() != before_where;
            self.error_if(where_clause, found, "Where clause is not allowed for objects");
        }

        if self.at(LBRACE) {
            if enum_class {
                self.parse_enum_class_body();
            } else {
                self.parse_class_body();
            }
        } else if !optional_body {
            let body = self.start();
            self.error("Expecting a class body");
            body.commit(self, CLASS_BODY);
        } else if name_missing {
            let body = self.start();
            body.commit(self, CLASS_BODY);
        }

        kind
    }

    /// `{ members }`
    pub(crate) fn parse_class_body(&mut self) {
        let body = self.start();
        self.enable_newlines();
        if self.expect(LBRACE, "Expecting a class body") {
            self.parse_members();
            self.expect(RBRACE, "Missing '}'");
        }
        self.restore_newlines();
        body.commit(self, CLASS_BODY);
    }

    /// `{ A, B(1) { ... }; members }`
    fn parse_enum_class_body(&mut self) {
        if !self.at(LBRACE) {
            return;
        }
        let body = self.start();
        self.enable_newlines();
        self.bump(); // consume '{'

        if !self.parse_enum_entries() && !self.at(RBRACE) {
            self.error("Expecting ';' after the last enum entry or '}' to close enum class body");
        }
        self.parse_members();
        self.expect(RBRACE, "Expecting '}' to close enum class body");

        self.restore_newlines();
        body.commit(self, CLASS_BODY);
    }

    /// Returns whether regular members may follow the entries
    fn parse_enum_entries(&mut self) -> bool {
        while !self.at_eof() && !self.at(RBRACE) {
            match self.parse_enum_entry() {
                // no entries at all, members may still follow a `;`
                EnumEntryEnd::Failed => return self.eat(SEMICOLON),
                EnumEntryEnd::NoDelimiter => return false,
                EnumEntryEnd::Comma => {}
                EnumEntryEnd::Semicolon => return true,
            }
        }
        false
    }

    fn parse_enum_entry(&mut self) -> EnumEntryEnd {
        let entry = self.start();
        self.parse_modifier_list(None, AnnotationMode::Default, TokenSet::new(&[COMMA, SEMICOLON, RBRACE]));

        if self.at_set(SOFT_KEYWORDS_AT_MEMBER_START) || !self.at(IDENTIFIER) {
            entry.rollback(self);
            return EnumEntryEnd::Failed;
        }
        self.bump(); // consume name

        if self.at(LPAR) {
            // The arguments go into a superclass call with an empty callee
            let initializer_list = self.start();
            let super_call = self.start();
            let callee = self.start();
            let type_reference = self.start();
            let user_type = self.start();
            let reference = self.start();
            reference.commit(self, ENUM_ENTRY_SUPERCLASS_REFERENCE_EXPRESSION);
            user_type.commit(self, USER_TYPE);
            type_reference.commit(self, TYPE_REFERENCE);
            callee.commit(self, CONSTRUCTOR_CALLEE);

            self.value_argument_list();
            super_call.commit(self, SUPER_TYPE_CALL_ENTRY);
            initializer_list.commit(self, INITIALIZER_LIST);
        }
        if self.at(LBRACE) {
            self.parse_class_body();
        }

        let comma = self.eat(COMMA);
        let semicolon = self.eat(SEMICOLON);
        self.close_declaration(entry, ENUM_ENTRY, true);

        if semicolon {
            EnumEntryEnd::Semicolon
        } else if comma {
            EnumEntryEnd::Comma
        } else {
            EnumEntryEnd::NoDelimiter
        }
    }

    fn parse_members(&mut self) {
        while !self.at_eof() && !self.at(RBRACE) {
            self.parse_member_declaration();
        }
    }

    fn parse_member_declaration(&mut self) {
        if self.eat(SEMICOLON) {
            return;
        }
        let decl = self.start();

        if self.at(CONTEXT_KW) {
            self.parse_context_receiver_list();
        }

        let mut detector = ModifierDetector::default();
        self.parse_modifier_list(Some(&mut detector), AnnotationMode::Default, TokenSet::EMPTY);

        match self.parse_member_declaration_rest(detector) {
            Some(kind) => {
                self.close_declaration(decl, kind, true);
            }
            None => {
                self.error_with_recovery("Expecting member declaration", Some(TokenSet::EMPTY));
                decl.drop(self);
            }
        }
    }

    fn parse_member_declaration_rest(&mut self, detector: ModifierDetector) -> Option<SyntaxKind> {
        let object_name_mode = if detector.companion_detected {
            NameMode::Allowed
        } else {
            NameMode::Required
        };
        if let Some(kind) = self.parse_common_declaration(detector, object_name_mode, DeclarationMode::MemberOrTopLevel)
        {
            return Some(kind);
        }

        if self.at(INIT_KW) {
            self.bump(); // consume 'init'
            if self.at(LBRACE) {
                self.parse_block();
            } else {
                self.error("Expecting '{' after 'init'");
            }
            Some(CLASS_INITIALIZER)
        } else if self.at(CONSTRUCTOR_KW) {
            self.parse_secondary_constructor();
            Some(SECONDARY_CONSTRUCTOR)
        } else if self.at(LBRACE) {
            self.error("Expecting member declaration");
            self.parse_block();
            Some(FUN)
        } else {
            None
        }
    }

    /// `constructor(params) : this(args) { ... }`
    fn parse_secondary_constructor(&mut self) {
        self.bump(); // consume 'constructor'

        if self.at(LPAR) {
            self.parse_value_parameter_list(false, true, SECONDARY_CONSTRUCTOR_RECOVERY);
        } else {
            self.error_with_recovery("Expecting '('", Some(SECONDARY_CONSTRUCTOR_RECOVERY.with(COLON)));
        }

        if self.eat(COLON) {
            let call = self.start();
            if self.at(THIS_KW) || self.at(SUPER_KW) {
                let reference = self.start();
                self.bump(); // consume 'this'/'super'
                reference.commit(self, CONSTRUCTOR_DELEGATION_REFERENCE);
                self.value_argument_list();
            } else {
                self.error("Expecting a 'this' or 'super' constructor call");
                let wrong_callee = if self.at(LPAR) {
                    None
                } else {
                    let m = self.start();
                    self.bump(); // consume wrong callee
                    Some(m)
                };
                self.value_argument_list();
                if let Some(wrong_callee) = wrong_callee {
                    if self.at(LBRACE) {
                        wrong_callee.drop(self);
                    } else {
                        wrong_callee.rollback(self);
                    }
                }
            }
            call.commit(self, CONSTRUCTOR_DELEGATION_CALL);
        } else {
            // implicit delegation
            let call = self.start();
            let reference = self.start();
            reference.commit(self, CONSTRUCTOR_DELEGATION_REFERENCE);
            call.commit(self, CONSTRUCTOR_DELEGATION_CALL);
        }

        if self.at(LBRACE) {
            self.parse_block();
        }
    }

    /// SUPER_TYPE_LIST after `:`
    fn parse_delegation_specifier_list(&mut self) {
        let list = self.start();
        loop {
            if self.at(COMMA) {
                self.error_and_advance("Expecting a delegation specifier", 1);
                continue;
            }
            self.parse_delegation_specifier();
            if !self.eat(COMMA) {
                break;
            }
        }
        list.commit(self, SUPER_TYPE_LIST);
    }

    /// `A`, `A(args)` or `A by expr`
    fn parse_delegation_specifier(&mut self) {
        let entry = self.start();
        let reference = self.start();
        self.parse_type_ref();

        if self.at(BY_KW) {
            reference.drop(self);
            self.bump(); // consume 'by'
            self.in_by_clause(|p| p.expression());
            entry.commit(self, DELEGATED_SUPER_TYPE_ENTRY);
        } else if self.at(LPAR) {
            reference.commit(self, CONSTRUCTOR_CALLEE);
            self.value_argument_list();
            entry.commit(self, SUPER_TYPE_CALL_ENTRY);
        } else {
            reference.drop(self);
            entry.commit(self, SUPER_TYPE_ENTRY);
        }
    }

    // === Type aliases ===

    fn parse_type_alias(&mut self) -> SyntaxKind {
        self.bump(); // consume 'typealias'

        self.expect_with_recovery(
            IDENTIFIER,
            "Type name expected",
            Some(TokenSet::new(&[LT, EQ, SEMICOLON]).union(TOP_LEVEL_DECLARATION_FIRST)),
        );
        self.parse_type_parameter_list(TYPE_PARAMETER_GT_RECOVERY_SET);

        if self.at(WHERE_KW) {
            let error = self.start();
            self.parse_type_constraints();
            error.error(self, "Type alias parameters can't have bounds");
        }

        self.expect_with_recovery(EQ, "Expecting '='", Some(TOP_LEVEL_DECLARATION_FIRST.with(SEMICOLON)));
        self.parse_type_ref();
        self.eat(SEMICOLON);
        TYPEALIAS
    }

    // === Properties ===

    /// `val <T> Recv.name: Type where ... = init` with optional accessors, or a
    /// destructuring `val (a, b) = init`
    pub(crate) fn parse_property(&mut self, mode: DeclarationMode) -> SyntaxKind {
        self.bump(); // consume 'val'/'var'

        let type_parameters =
            self.at(LT) && self.parse_type_parameter_list(TokenSet::new(&[IDENTIFIER, EQ, COLON, SEMICOLON]));

        self.disable_joining();

        let receiver = self.start();
        let receiver_declared = self.parse_receiver_type("property", PROPERTY_NAME_FOLLOW);
        let destructuring = self.at(LPAR);
        self.error_if(
            receiver,
            destructuring && receiver_declared,
            "Receiver type is not allowed on a destructuring declaration",
        );

        let name_on_next_line = self.eol();
        let before_name = self.start();

        if destructuring {
            let entries = self.start();
            self.parse_multi_declaration_name(PROPERTY_NAME_FOLLOW);
            self.error_if(
                entries,
                !mode.destructuring_allowed(),
                "Destructuring declarations are only allowed for local variables/values",
            );
        } else {
            self.parse_function_or_property_name(receiver_declared, "property", PROPERTY_NAME_FOLLOW, true);
        }

        self.restore_joining();

        let mut has_type = false;
        if self.at(COLON) {
            has_type = true;
            let type_annotation = self.start();
            self.bump(); // consume ':'
            self.parse_type_ref();
            self.error_if(
                type_annotation,
                destructuring,
                "Type annotations are not allowed on destructuring declarations",
            );
        }

        self.parse_type_constraints_guarded(type_parameters);

        if !self.parse_property_delegate_or_assignment() && name_on_next_line && !has_type && !receiver_declared {
            // The name on the next line most likely starts the next statement
            before_name.rollback(self);
            self.restore_joining();
            self.error("Expecting property name or receiver type");
            return PROPERTY;
        }
        before_name.drop(self);

        // Local properties end here: `val a = 1; b` must not read `b` as an accessor
        if mode.accessors_allowed() {
            self.enable_newlines();
            let semicolon_then_newline = self.eat(SEMICOLON) && self.newline_before_current();
            self.restore_newlines();

            if !semicolon_then_newline {
                self.parse_property_accessors();
            }
        }

        if destructuring {
            DESTRUCTURING_DECLARATION
        } else {
            PROPERTY
        }
    }

    fn parse_property_accessors(&mut self) {
        let mut seen: Vec<AccessorKind> = Vec::with_capacity(3);
        while let Some(kind) = self.parse_property_component(&seen) {
            seen.push(kind);
        }

        if !self.at_set(TokenSet::new(&[EOL_OR_SEMICOLON, RBRACE])) {
            if self.last_token() != SEMICOLON {
                self.error_until(
                    "Property getter or setter expected",
                    DECLARATION_FIRST.union(TokenSet::new(&[EOL_OR_SEMICOLON, LBRACE, RBRACE])),
                );
            }
        } else {
            self.eat(SEMICOLON);
        }
    }

    fn parse_property_delegate_or_assignment(&mut self) -> bool {
        if self.at(BY_KW) {
            let delegate = self.start();
            self.bump(); // consume 'by'
            self.expression();
            delegate.commit(self, PROPERTY_DELEGATE);
            true
        } else if self.eat(EQ) {
            self.expression();
            true
        } else {
            false
        }
    }

    /// `(a, b: Int)` of a destructuring declaration, without the node around it
    pub(crate) fn parse_multi_declaration_name(&mut self, follow: TokenSet) {
        self.disable_newlines();
        self.bump(); // consume '('

        let recovery = PARAMETER_NAME_RECOVERY_SET.union(follow);
        if !self.at_set(follow) {
            loop {
                if self.at(COMMA) {
                    self.error_and_advance("Expecting a name", 1);
                } else if self.at(RPAR) {
                    // `val () = x`
                    self.error("Expecting a name");
                    break;
                }

                let entry = self.start();
                self.parse_modifier_list(None, AnnotationMode::Default, TokenSet::new(&[COMMA, RPAR, COLON, EQ]));
                self.expect_with_recovery(IDENTIFIER, "Expecting a name", Some(recovery));
                if self.eat(COLON) {
                    self.parse_type_ref_with(follow, true);
                }
                entry.commit(self, DESTRUCTURING_DECLARATION_ENTRY);

                if !self.eat(COMMA) || self.at(RPAR) {
                    break;
                }
            }
        }

        self.expect_with_recovery(RPAR, "Expecting ')'", Some(follow));
        self.restore_newlines();
    }

    /// One of `get`, `set(v)` or `field = x`; `None` when none starts here or
    /// the kind was already seen
    fn parse_property_component(&mut self, seen: &[AccessorKind]) -> Option<AccessorKind> {
        let component = self.start();
        self.parse_modifier_list(None, AnnotationMode::Default, TokenSet::EMPTY);

        let kind = if self.at(GET_KW) {
            AccessorKind::Get
        } else if self.at(SET_KW) {
            AccessorKind::Set
        } else if self.at(FIELD_KW) {
            AccessorKind::Field
        } else {
            component.rollback(self);
            return None;
        };
        if seen.contains(&kind) {
            component.rollback(self);
            return None;
        }
        self.bump(); // consume 'get', 'set' or 'field'

        if kind != AccessorKind::Field && !self.at(LPAR) {
            // `val a: Int get`, a bodiless accessor
            if self.at_set(ACCESSOR_FIRST_OR_PROPERTY_END) {
                self.close_declaration(component, PROPERTY_ACCESSOR, true);
                return Some(kind);
            }
            self.error_until(
                "Accessor body expected",
                ACCESSOR_FIRST_OR_PROPERTY_END.union(TokenSet::new(&[LBRACE, LPAR, EQ])),
            );
        }

        self.disable_newlines();
        if kind != AccessorKind::Field {
            self.expect_with_recovery(LPAR, "Expecting '('", Some(TokenSet::new(&[RPAR, IDENTIFIER, COLON, LBRACE, EQ])));
            if kind == AccessorKind::Set {
                self.parse_setter_parameter();
            }
            if !self.at(RPAR) {
                self.error_until(
                    "Expecting ')'",
                    TokenSet::new(&[RPAR, COLON, LBRACE, RBRACE, EQ, EOL_OR_SEMICOLON]),
                );
            }
            self.eat(RPAR);
        }
        self.restore_newlines();

        if self.eat(COLON) {
            self.parse_type_ref();
        }

        if kind == AccessorKind::Field {
            if self.eat(EQ) {
                self.expression();
                self.eat(SEMICOLON);
            }
            self.close_declaration(component, BACKING_FIELD, true);
        } else {
            self.parse_function_contract();
            self.parse_function_body();
            self.close_declaration(component, PROPERTY_ACCESSOR, true);
        }
        Some(kind)
    }

    fn parse_setter_parameter(&mut self) {
        let list = self.start();
        let parameter = self.start();
        self.parse_modifier_list(None, AnnotationMode::Default, TokenSet::new(&[COMMA, COLON, RPAR]));
        self.expect_with_recovery(
            IDENTIFIER,
            "Expecting parameter name",
            Some(TokenSet::new(&[RPAR, COLON, LBRACE, EQ])),
        );
        if self.eat(COLON) {
            self.parse_type_ref();
        }
        parameter.commit(self, VALUE_PARAMETER);
        self.eat(COMMA);
        list.commit(self, VALUE_PARAMETER_LIST);
    }

    // === Functions ===

    pub(crate) fn parse_function(&mut self) -> SyntaxKind {
        self.try_parse_function(false).unwrap_or(FUN)
    }

    /// `fun <T> Recv.name<T>(params): Ret where ... { body }`.
    ///
    /// With `fail_if_named`, returns `None` as soon as a name shows up; callers
    /// parsing anonymous functions roll back and try a declaration instead.
    pub(crate) fn try_parse_function(&mut self, fail_if_named: bool) -> Option<SyntaxKind> {
        self.bump(); // consume 'fun'

        // `class A { fun }`
        if self.at(RBRACE) {
            self.error("Function body expected");
            return Some(FUN);
        }

        let mut type_parameters = false;
        if self.at(LT) {
            self.parse_type_parameter_list(TokenSet::new(&[LBRACKET, LBRACE, RBRACE, LPAR]));
            type_parameters = true;
        }

        self.disable_joining();
        let receiver_found = self.parse_receiver_type("function", FUNCTION_NAME_FOLLOW);

        if fail_if_named && self.at(IDENTIFIER) {
            self.restore_joining();
            return None;
        }

        // anonymous functions have no name
        self.parse_function_or_property_name(receiver_found, "function", FUNCTION_NAME_FOLLOW, false);
        self.restore_joining();

        if self.at(LT) {
            let list = self.start();
            self.parse_type_parameter_list(TokenSet::new(&[LPAR]).union(VALUE_PARAMETERS_FOLLOW));
            if type_parameters {
                // re-consume the second list flat, inside an error
                let end = self.raw_position();
                list.rollback(self);
                let error = self.start();
                while !self.at_eof() && self.raw_position() < end {
                    self.bump();
                }
                error.error(self, "Only one type parameter list is allowed for a function");
            } else {
                list.drop(self);
            }
            type_parameters = true;
        }

        if self.at(LPAR) {
            self.parse_value_parameter_list(false, false, VALUE_PARAMETERS_FOLLOW);
        } else {
            self.error("Expecting '('");
        }

        if self.eat(COLON) {
            self.parse_type_ref();
        }

        let contract = self.parse_function_contract();
        self.parse_type_constraints_guarded(type_parameters);
        if !contract {
            self.parse_function_contract();
        }

        if !self.eat(SEMICOLON) && (self.at(EQ) || self.at(LBRACE)) {
            self.parse_function_body();
        }

        Some(FUN)
    }

    /// An explicit receiver `Type.` before a function or property name.
    /// Annotations that do not start a receiver are reported.
    fn parse_receiver_type(&mut self, title: &str, name_follow: TokenSet) -> bool {
        let annotations = self.start();
        let annotations_present = self.parse_annotations(AnnotationMode::Default);
        let last_dot = self.last_dot_after_receiver();

        if annotations_present {
            if last_dot.is_some() {
                // the annotations belong to the receiver type
                annotations.rollback(self);
            } else {
                annotations.error(self, "Annotations are not allowed in this position");
            }
        } else {
            annotations.drop(self);
        }

        let Some(last_dot) = last_dot else {
            return false;
        };

        self.with_eof_at(last_dot, |p| p.parse_type_ref_without_intersections());

        if self.at_set(RECEIVER_TYPE_TERMINATORS) {
            self.bump(); // consume '.'
        } else {
            self.error_with_recovery(&format!("Expecting '.' before a {title} name"), Some(name_follow));
        }
        true
    }

    fn parse_function_or_property_name(
        &mut self,
        receiver_found: bool,
        title: &str,
        name_follow: TokenSet,
        name_required: bool,
    ) -> bool {
        if !name_required && self.at_set(name_follow) {
            return true;
        }

        let recovery = name_follow
            .union(TokenSet::new(&[LBRACE, RBRACE]))
            .union(TOP_LEVEL_DECLARATION_FIRST);
        let message = if receiver_found {
            format!("Expecting {title} name")
        } else {
            format!("Expecting {title} name or receiver type")
        };
        self.expect_with_recovery(IDENTIFIER, &message, Some(recovery))
    }

    fn parse_function_contract(&mut self) -> bool {
        if self.at(CONTRACT_KW) {
            self.contract_description();
            true
        } else {
            false
        }
    }

    /// `{ ... }` or `= expr`
    fn parse_function_body(&mut self) {
        if self.at(LBRACE) {
            self.parse_block();
        } else if self.eat(EQ) {
            self.expression();
            self.eat(SEMICOLON);
        } else {
            self.error("Expecting function body");
        }
    }

    /// A BLOCK, collapsed into one token when block collapsing is on
    pub(crate) fn parse_block(&mut self) {
        let collapse = self.collapse_blocks();
        self.parse_block_with(collapse);
    }

    pub(crate) fn parse_block_with(&mut self, collapse: bool) {
        let block = self.start();
        self.enable_newlines();

        let has_open_brace = self.expect(LBRACE, "Expecting '{' to open a block");
        let collapse = collapse && has_open_brace;
        if collapse {
            self.advance_balanced_block();
        } else {
            self.statements(false);
            self.expect(RBRACE, "Expecting '}'");
        }

        self.restore_newlines();
        if collapse {
            block.collapse(self, BLOCK);
        } else {
            block.commit(self, BLOCK);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::DefaultExpressions;
    use crate::parser::Parser;
    use crate::syntax::SyntaxKind::{self, *};
    use crate::syntax::SyntaxNode;

    fn parse(source: &str) -> (SyntaxNode, Vec<String>) {
        let exprs = DefaultExpressions;
        let mut p = Parser::new(source, &exprs);
        p.parse_file();
        let parse = p.into_parse();
        let errors = parse.errors().iter().map(|e| e.message.clone()).collect();
        (parse.syntax(), errors)
    }

    fn nodes(root: &SyntaxNode, kind: SyntaxKind) -> Vec<SyntaxNode> {
        root.descendants().filter(|n| n.kind() == kind).collect()
    }

    fn texts(root: &SyntaxNode, kind: SyntaxKind) -> Vec<String> {
        nodes(root, kind).iter().map(|n| n.text().to_string()).collect()
    }

    fn child_kinds(node: &SyntaxNode) -> Vec<SyntaxKind> {
        node.children().map(|n| n.kind()).collect()
    }

    #[test]
    fn test_class_header_and_body() {
        let (root, errors) = parse("class Box<T>(val item: T) : Base(item), Shape by impl {\n    val size = 1\n}");
        assert!(errors.is_empty(), "{errors:?}");

        let class = &nodes(&root, CLASS)[0];
        assert_eq!(
            child_kinds(class),
            vec![TYPE_PARAMETER_LIST, PRIMARY_CONSTRUCTOR, SUPER_TYPE_LIST, CLASS_BODY]
        );
        let supertypes = &nodes(&root, SUPER_TYPE_LIST)[0];
        assert_eq!(child_kinds(supertypes), vec![SUPER_TYPE_CALL_ENTRY, DELEGATED_SUPER_TYPE_ENTRY]);
        assert_eq!(texts(&root, PROPERTY), vec!["val size = 1"]);
    }

    #[test]
    fn test_bare_class_keyword() {
        let (root, errors) = parse("class");
        assert_eq!(errors, vec!["Name expected"]);
        let class = &nodes(&root, CLASS)[0];
        assert_eq!(child_kinds(class), vec![CLASS_BODY]);
        assert_eq!(texts(&root, CLASS_BODY), vec![""]);
    }

    #[test]
    fn test_constructor_modifiers() {
        let (root, errors) = parse("class A private constructor(x: Int)");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, PRIMARY_CONSTRUCTOR), vec!["private constructor(x: Int)"]);

        let (_, errors) = parse("class A private : B");
        assert_eq!(errors, vec!["Expecting 'constructor' keyword"]);

        // modifiers of the next declaration are left alone
        let (root, errors) = parse("class A\nprivate fun f() {}");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(nodes(&root, FUN).len(), 1);
        assert!(nodes(&root, PRIMARY_CONSTRUCTOR).is_empty());
    }

    #[test]
    fn test_enum_class() {
        let (root, errors) = parse("enum class Color(val rgb: Int) {\n    RED(1), GREEN(2) { },\n    BLUE(3);\n    fun f() = 1\n}");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(texts(&root, ENUM_ENTRY).len(), 3);
        assert_eq!(nodes(&root, INITIALIZER_LIST).len(), 3);
        assert_eq!(nodes(&root, ENUM_ENTRY_SUPERCLASS_REFERENCE_EXPRESSION).len(), 3);
        assert_eq!(nodes(&root, FUN).len(), 1);
    }

    #[test]
    fn test_enum_entries_need_semicolon_before_members() {
        let (_, errors) = parse("enum class E { A B }");
        assert_eq!(
            errors[0],
            "Expecting ';' after the last enum entry or '}' to close enum class body"
        );
    }

    #[test]
    fn test_enum_without_class_keyword() {
        let (root, errors) = parse("enum E { A }");
        assert_eq!(errors, vec!["'class' keyword is expected after 'enum'"]);
        assert_eq!(nodes(&root, ENUM_ENTRY).len(), 1);
    }

    #[test]
    fn test_object_declarations() {
        let (root, errors) = parse("object Registry : Base() {\n    companion object { }\n}");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(nodes(&root, OBJECT_DECLARATION).len(), 2);

        let (_, errors) = parse("object O where T : Any");
        assert!(errors.contains(&"Where clause is not allowed for objects".to_string()));
    }

    #[test]
    fn test_members() {
        let (root, errors) = parse(
            "class A {\n    init { }\n    constructor(x: Int) : this() { }\n    constructor()\n    typealias X = Int\n}",
        );
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(nodes(&root, CLASS_INITIALIZER).len(), 1);
        assert_eq!(nodes(&root, SECONDARY_CONSTRUCTOR).len(), 2);
        // an implicit delegation call is still a node
        assert_eq!(nodes(&root, CONSTRUCTOR_DELEGATION_CALL).len(), 2);
        assert_eq!(texts(&root, TYPEALIAS), vec!["typealias X = Int"]);
    }

    #[test]
    fn test_bad_member_is_skipped() {
        let (root, errors) = parse("class A {\n    42\n    fun f() {}\n}");
        assert_eq!(errors, vec!["Expecting member declaration"]);
        assert_eq!(nodes(&root, FUN).len(), 1);
    }

    #[test]
    fn test_property_accessors() {
        let (root, errors) = parse("var x: Int = 0\n    get() = field\n    private set(value) { field = value }");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(nodes(&root, PROPERTY_ACCESSOR).len(), 2);
        let setter = &nodes(&root, PROPERTY_ACCESSOR)[1];
        assert!(child_kinds(setter).contains(&VALUE_PARAMETER_LIST));
    }

    #[test]
    fn test_property_delegate_and_receiver() {
        let (root, errors) = parse("val String.size: Int by lazy { 1 }");
        assert!(errors.is_empty(), "{errors:?}");
        let property = &nodes(&root, PROPERTY)[0];
        assert_eq!(child_kinds(property), vec![TYPE_REFERENCE, TYPE_REFERENCE, PROPERTY_DELEGATE]);
    }

    #[test]
    fn test_top_level_destructuring_is_reported() {
        let (root, errors) = parse("val (a, b) = p");
        assert_eq!(errors, vec!["Destructuring declarations are only allowed for local variables/values"]);
        assert_eq!(nodes(&root, DESTRUCTURING_DECLARATION).len(), 1);
        assert_eq!(nodes(&root, DESTRUCTURING_DECLARATION_ENTRY).len(), 2);
    }

    #[test]
    fn test_property_without_name() {
        let (root, errors) = parse("val\nfun f() {}");
        assert_eq!(errors, vec!["Expecting property name or receiver type"]);
        assert_eq!(texts(&root, PROPERTY), vec!["val"]);
        assert_eq!(nodes(&root, FUN).len(), 1);
    }

    #[test]
    fn test_functions() {
        let (root, errors) = parse("fun <T> List<T>.second(): T where T : Any = this[1]");
        assert!(errors.is_empty(), "{errors:?}");
        let fun = &nodes(&root, FUN)[0];
        assert_eq!(
            child_kinds(fun),
            vec![TYPE_PARAMETER_LIST, TYPE_REFERENCE, VALUE_PARAMETER_LIST, TYPE_REFERENCE, TYPE_CONSTRAINT_LIST, ARRAY_ACCESS_EXPRESSION]
        );
    }

    #[test]
    fn test_function_errors() {
        let (_, errors) = parse("fun <T> f<U>() {}");
        assert_eq!(errors, vec!["Only one type parameter list is allowed for a function"]);

        let (_, errors) = parse("fun f {}");
        assert_eq!(errors, vec!["Expecting '('"]);

        let (_, errors) = parse("class A { fun }");
        assert_eq!(errors, vec!["Function body expected"]);

        let (_, errors) = parse("@Ann fun f() {}");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_top_level_recovery() {
        let (root, errors) = parse("{ }\nimport a.b\n)");
        assert_eq!(
            errors,
            vec![
                "Expecting a top level declaration",
                "imports are only allowed in the beginning of file",
                "Expecting a top level declaration",
            ]
        );
        assert_eq!(nodes(&root, FUN).len(), 1);
        assert_eq!(nodes(&root, IMPORT_DIRECTIVE).len(), 1);
    }

    #[test]
    fn test_collapsed_blocks() {
        let exprs = DefaultExpressions;
        let mut p = Parser::new("fun f() { if (x) { y } }", &exprs);
        p.set_collapse_blocks(true);
        p.parse_file();
        let root = p.into_parse().syntax();
        let fun = &nodes(&root, FUN)[0];
        let block = fun.children_with_tokens().last().unwrap();
        assert_eq!(block.kind(), BLOCK);
        let token = block.as_token().unwrap();
        assert_eq!(token.text(), "{ if (x) { y } }");
    }
}
