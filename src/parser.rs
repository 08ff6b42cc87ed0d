//! Recursive-descent parser: consumes the token buffer and builds the class
//! model.
//!
//! Every rule consumes its full syntactic form including closing delimiters.
//! Lookahead never needs more than the single-token pushback the buffer
//! offers. Diagnostics go to the shared sink; in warning mode parsing
//! continues best-effort, while running out of tokens is fatal in every mode.

pub mod ast;

use crate::diag::{Diagnostic, DiagnosticSink, TranslateError};
use crate::lexer::{TokenBuffer, words};
use crate::model::{CONSTRUCTOR_NAME, Class, Member, Method, Modifiers, Variable};
use crate::parser::ast::{
    BinaryOperator, Chain, Expression, Link, LocalVariable, Statement, UnaryOperator,
};

type ParseResult<T> = Result<T, TranslateError>;

pub struct Parser<'d> {
    buffer: TokenBuffer,
    diags: &'d mut DiagnosticSink,
}

impl<'d> Parser<'d> {
    pub fn new(source: &str, diags: &'d mut DiagnosticSink) -> Self {
        Self {
            buffer: TokenBuffer::new(source),
            diags,
        }
    }

    /// Parse a whole translation unit: classes until the buffer runs dry.
    pub fn parse(mut self) -> ParseResult<Vec<Class>> {
        let mut classes: Vec<Class> = Vec::new();
        while !self.buffer.is_empty() {
            let class = self.parse_class()?;
            if classes.iter().any(|existing| existing.name == class.name) {
                self.report(format!("Class {} is already defined", class.name))?;
            } else {
                classes.push(class);
            }
        }
        Ok(classes)
    }

    fn diagnostic(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(self.buffer.line_number(), self.buffer.line_text(), message)
    }

    fn report(&mut self, message: impl Into<String>) -> ParseResult<()> {
        let diagnostic = self.diagnostic(message);
        self.diags.report(diagnostic)
    }

    /// Consume the next token; exhaustion is fatal in every mode because
    /// parsing cannot continue without input.
    fn shift(&mut self, expected: &str) -> ParseResult<String> {
        match self.buffer.shift() {
            Some(token) => Ok(token),
            None => Err(TranslateError::Fatal(
                self.diagnostic(format!("Expected {expected}")),
            )),
        }
    }

    /// Consume one token and diagnose a mismatch without halting in warning
    /// mode.
    fn expect(&mut self, expected: &str) -> ParseResult<()> {
        let line = self.buffer.line_number();
        let context = self.buffer.line_text().to_string();
        let actual = self.shift(expected)?;
        if actual != expected {
            self.diags
                .report(Diagnostic::unexpected(line, context, &actual, Some(expected)))?;
        }
        Ok(())
    }

    fn peek_is(&self, token: &str) -> bool {
        self.buffer.peek() == Some(token)
    }

    /// True when `token` may name things; diagnoses keywords and malformed
    /// words.
    fn validate(&mut self, token: &str) -> ParseResult<bool> {
        if words::is_identifier(token) {
            return Ok(true);
        }
        let message = if words::is_keyword(token) {
            format!("{token} is a keyword")
        } else {
            format!("{token} is not a valid identifier")
        };
        self.report(message)?;
        Ok(false)
    }

    fn parse_modifiers(&mut self) -> ParseResult<Modifiers> {
        let mut modifiers = Modifiers::default();
        loop {
            if self.peek_is("public") || self.peek_is("protected") {
                self.shift("modifier")?;
            } else if self.peek_is("private") {
                self.shift("modifier")?;
                modifiers.is_public = false;
            } else if self.peek_is("static") {
                self.shift("modifier")?;
                modifiers.is_static = true;
            } else {
                break;
            }
        }
        Ok(modifiers)
    }

    fn parse_class(&mut self) -> ParseResult<Class> {
        let modifiers = self.parse_modifiers()?;
        self.parse_class_after_modifiers(modifiers)
    }

    fn parse_class_after_modifiers(&mut self, modifiers: Modifiers) -> ParseResult<Class> {
        if !modifiers.is_public {
            self.report("Classes cannot be private")?;
        }
        if modifiers.is_static {
            self.report("Classes cannot be static")?;
        }
        self.expect("class")?;
        let name = self.shift("class name")?;
        self.validate(&name)?;
        let mut class = Class::new(name);

        if self.peek_is("extends") {
            self.shift("extends")?;
            let superclass = self.shift("superclass name")?;
            self.validate(&superclass)?;
            class.superclass = superclass;
        }

        self.expect("{")?;
        while !self.peek_is("}") {
            if self.buffer.is_empty() {
                return Err(TranslateError::Fatal(self.diagnostic("Expected }")));
            }
            self.parse_member(&mut class)?;
        }
        self.shift("}")?;
        Ok(class)
    }

    /// One declaration inside a class body: nested class, constructor,
    /// method, or variable list. Disambiguated by lookahead after the
    /// modifiers and the datatype.
    fn parse_member(&mut self, class: &mut Class) -> ParseResult<()> {
        let modifiers = self.parse_modifiers()?;

        if self.peek_is("class") {
            let nested = self.parse_class_after_modifiers(modifiers)?;
            self.add_member(class, Member::Nested(nested))?;
            return Ok(());
        }

        // Datatype: a possibly dotted name followed by `[]` pairs. Discarded
        // except for the constructor-name check.
        let mut datatype = self.shift("datatype")?;
        if !words::is_word(&datatype) {
            self.report(format!("{datatype} is not a valid datatype"))?;
        }
        while self.peek_is(".") {
            self.shift(".")?;
            datatype.push('.');
            datatype.push_str(&self.shift("datatype")?);
        }
        let mut array_brackets = 0;
        while self.peek_is("[") {
            self.shift("[")?;
            self.expect("]")?;
            array_brackets += 1;
        }

        if self.peek_is("(") {
            // No name followed the datatype, so this is a constructor and
            // the "datatype" is really the class name.
            if array_brackets > 0 {
                self.report(format!(
                    "Constructor of {} cannot be declared as an array",
                    class.name
                ))?;
            }
            if datatype != class.name {
                self.report(format!(
                    "Constructor name {datatype} does not match class name {}",
                    class.name
                ))?;
            }
            let params = self.parse_params()?;
            let body = self.parse_body()?;
            let constructor = Method {
                modifiers,
                name: CONSTRUCTOR_NAME.to_string(),
                params,
                body,
            };
            self.add_member(class, Member::Constructor(constructor))?;
            return Ok(());
        }

        let first = self.shift("member name")?;
        self.validate(&first)?;

        if self.peek_is("(") {
            let params = self.parse_params()?;
            let body = self.parse_body()?;
            self.add_member(
                class,
                Member::Method(Method {
                    modifiers,
                    name: first,
                    params,
                    body,
                }),
            )?;
            return Ok(());
        }

        // Variable declaration list: `name [= expr] (, name [= expr])* ;`
        let mut name = first;
        loop {
            let initializer = if self.peek_is("=") {
                self.shift("=")?;
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.add_member(
                class,
                Member::Variable(Variable {
                    modifiers,
                    name,
                    initializer,
                }),
            )?;
            if self.peek_is(",") {
                self.shift(",")?;
                name = self.shift("variable name")?;
                self.validate(&name)?;
            } else {
                self.expect(";")?;
                break;
            }
        }
        Ok(())
    }

    fn add_member(&mut self, class: &mut Class, member: Member) -> ParseResult<()> {
        if let Err(error) = class.add(member) {
            self.report(error.to_string())?;
        }
        Ok(())
    }

    /// `( datatype [ ]* name [ ]* (, ...)* )` with datatypes discarded.
    fn parse_params(&mut self) -> ParseResult<Vec<String>> {
        self.expect("(")?;
        let mut params = Vec::new();
        if self.peek_is(")") {
            self.shift(")")?;
            return Ok(params);
        }
        loop {
            let datatype = self.shift("parameter datatype")?;
            if !words::is_word(&datatype) {
                self.report(format!("{datatype} is not a valid datatype"))?;
            }
            while self.peek_is(".") {
                self.shift(".")?;
                self.shift("datatype")?;
            }
            while self.peek_is("[") {
                self.shift("[")?;
                self.expect("]")?;
            }
            let name = self.shift("parameter name")?;
            self.validate(&name)?;
            while self.peek_is("[") {
                self.shift("[")?;
                self.expect("]")?;
            }
            if params.iter().any(|existing| existing == &name) {
                self.report(format!("{name} is already a parameter"))?;
            } else {
                params.push(name);
            }
            if self.peek_is(",") {
                self.shift(",")?;
            } else {
                self.expect(")")?;
                break;
            }
        }
        Ok(params)
    }

    fn parse_body(&mut self) -> ParseResult<Vec<Statement>> {
        self.expect("{")?;
        self.parse_statements_until_brace()
    }

    /// Statements up to and including the closing `}`.
    fn parse_statements_until_brace(&mut self) -> ParseResult<Vec<Statement>> {
        let mut statements = Vec::new();
        while !self.peek_is("}") {
            if self.buffer.is_empty() {
                return Err(TranslateError::Fatal(self.diagnostic("Expected }")));
            }
            if let Some(statement) = self.parse_statement()? {
                statements.push(statement);
            }
        }
        self.shift("}")?;
        Ok(statements)
    }

    /// One statement, or `None` when an unsupported construct was skipped.
    fn parse_statement(&mut self) -> ParseResult<Option<Statement>> {
        let next = self.buffer.peek().map(str::to_string);
        match next.as_deref() {
            Some("return") => {
                self.shift("return")?;
                if self.peek_is(";") {
                    self.shift(";")?;
                    return Ok(Some(Statement::Return(None)));
                }
                let value = self.parse_expression()?;
                self.expect(";")?;
                Ok(Some(Statement::Return(Some(value))))
            }
            Some("if") => self.parse_if().map(Some),
            Some("while") => self.parse_while().map(Some),
            Some("for") => self.parse_for().map(Some),
            Some("{") => {
                self.shift("{")?;
                let statements = self.parse_statements_until_brace()?;
                Ok(Some(Statement::Block(statements)))
            }
            Some("new") => {
                let expression = self.parse_primary()?;
                self.expect(";")?;
                Ok(Some(Statement::Expr(expression)))
            }
            Some("break") | Some("continue") => {
                let token = self.shift("statement")?;
                if !self.peek_is(";") {
                    self.report(format!("Labeled {token} is not supported"))?;
                    self.skip_statement();
                    return Ok(None);
                }
                self.shift(";")?;
                Ok(Some(if token == "break" {
                    Statement::Break
                } else {
                    Statement::Continue
                }))
            }
            Some("do") | Some("switch") | Some("try") | Some("catch") | Some("finally")
            | Some("throw") => {
                let token = self.shift("statement")?;
                self.report(format!("{token} statements are not supported"))?;
                self.skip_statement();
                Ok(None)
            }
            Some(";") => {
                self.shift(";")?;
                Ok(None)
            }
            _ => self.parse_chain_statement(),
        }
    }

    fn parse_if(&mut self) -> ParseResult<Statement> {
        self.shift("if")?;
        self.expect("(")?;
        let condition = self.parse_expression()?;
        self.expect(")")?;
        let then_branch = Box::new(self.parse_required_statement("if body")?);
        let else_branch = if self.peek_is("else") {
            self.shift("else")?;
            Some(Box::new(self.parse_required_statement("else body")?))
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Statement> {
        self.shift("while")?;
        self.expect("(")?;
        let condition = self.parse_expression()?;
        self.expect(")")?;
        let body = Box::new(self.parse_required_statement("while body")?);
        Ok(Statement::While { condition, body })
    }

    /// Both `for` forms. The enhanced form shows itself as
    /// `datatype name :` right after the opening parenthesis.
    fn parse_for(&mut self) -> ParseResult<Statement> {
        self.shift("for")?;
        self.expect("(")?;

        let mut init = None;
        if self.peek_is(";") {
            self.shift(";")?;
        } else {
            let chain = self.parse_chain()?;
            let next = self.buffer.peek().map(str::to_string);
            match next.as_deref() {
                Some("=") => {
                    self.shift("=")?;
                    let value = self.parse_expression()?;
                    self.expect(";")?;
                    init = Some(Box::new(Statement::Assign {
                        target: chain,
                        value,
                    }));
                }
                Some(token) if words::is_identifier(token) => {
                    let name = self.shift("variable name")?;
                    self.validate(&name)?;
                    if self.peek_is(":") {
                        self.shift(":")?;
                        let iterable = self.parse_expression()?;
                        self.expect(")")?;
                        let body = Box::new(self.parse_required_statement("for body")?);
                        return Ok(Statement::ForEach {
                            var: name,
                            iterable,
                            body,
                        });
                    }
                    let variables = self.parse_local_variables(name)?;
                    init = Some(Box::new(Statement::Declare(variables)));
                }
                _ => {
                    self.report("Malformed for loop initializer")?;
                    self.expect(";")?;
                }
            }
        }

        let condition = if self.peek_is(";") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(";")?;

        let update = if self.peek_is(")") {
            None
        } else {
            Some(Box::new(self.parse_update_statement()?))
        };
        self.expect(")")?;

        let body = Box::new(self.parse_required_statement("for body")?);
        Ok(Statement::For {
            init,
            condition,
            update,
            body,
        })
    }

    /// The trailing part of a C-style `for`: assignment or `++`/`--`, no
    /// semicolon.
    fn parse_update_statement(&mut self) -> ParseResult<Statement> {
        let chain = self.parse_chain()?;
        let next = self.buffer.peek().map(str::to_string);
        match next.as_deref() {
            Some("=") => {
                self.shift("=")?;
                let value = self.parse_expression()?;
                Ok(Statement::Assign {
                    target: chain,
                    value,
                })
            }
            Some("++") | Some("--") => {
                let op = self.shift("++")?;
                Ok(Statement::IncDec {
                    target: chain,
                    increment: op == "++",
                })
            }
            _ => {
                self.report("Malformed for loop update")?;
                Ok(Statement::Block(Vec::new()))
            }
        }
    }

    /// Statement position that must produce a node; a skipped unsupported
    /// construct leaves an empty block behind.
    fn parse_required_statement(&mut self, expected: &str) -> ParseResult<Statement> {
        if self.buffer.is_empty() {
            return Err(TranslateError::Fatal(
                self.diagnostic(format!("Expected {expected}")),
            ));
        }
        Ok(self
            .parse_statement()?
            .unwrap_or(Statement::Block(Vec::new())))
    }

    /// The default statement form: an identifier chain resolved into a call,
    /// an assignment, an increment, or a local declaration list.
    fn parse_chain_statement(&mut self) -> ParseResult<Option<Statement>> {
        let chain = self.parse_chain()?;
        let next = self.buffer.peek().map(str::to_string);
        match next.as_deref() {
            Some("=") => {
                self.shift("=")?;
                let value = self.parse_expression()?;
                self.expect(";")?;
                Ok(Some(Statement::Assign {
                    target: chain,
                    value,
                }))
            }
            Some("++") | Some("--") => {
                let op = self.shift("++")?;
                self.expect(";")?;
                Ok(Some(Statement::IncDec {
                    target: chain,
                    increment: op == "++",
                }))
            }
            Some(token) if words::is_identifier(token) => {
                // Datatype-then-name: the chain was a datatype after all.
                let name = self.shift("variable name")?;
                self.validate(&name)?;
                let variables = self.parse_local_variables(name)?;
                Ok(Some(Statement::Declare(variables)))
            }
            _ => {
                self.expect(";")?;
                Ok(Some(Statement::Expr(Expression::Chain(chain))))
            }
        }
    }

    /// `[= expr] (, name [= expr])* ;` after the first declared name.
    fn parse_local_variables(&mut self, first: String) -> ParseResult<Vec<LocalVariable>> {
        let mut variables = Vec::new();
        let mut name = first;
        loop {
            let initializer = if self.peek_is("=") {
                self.shift("=")?;
                Some(self.parse_expression()?)
            } else {
                None
            };
            variables.push(LocalVariable { name, initializer });
            if self.peek_is(",") {
                self.shift(",")?;
                name = self.shift("variable name")?;
                self.validate(&name)?;
            } else {
                self.expect(";")?;
                break;
            }
        }
        Ok(variables)
    }

    /// Best-effort recovery: drop tokens to the end of the statement,
    /// including one brace-delimited body if it starts before the semicolon.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.buffer.shift() {
            match token.as_str() {
                ";" if depth == 0 => return,
                "{" => depth += 1,
                "}" => {
                    if depth == 0 {
                        self.buffer.unshift(token);
                        return;
                    }
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// `IDENT (.IDENT | [expr] | (args))*`; heads may be keywords (`this`,
    /// datatypes) because declaration datatypes arrive here too.
    fn parse_chain(&mut self) -> ParseResult<Chain> {
        let head = self.shift("identifier")?;
        if !words::is_word(&head) {
            let line = self.buffer.line_number();
            let context = self.buffer.line_text().to_string();
            self.diags
                .report(Diagnostic::unexpected(line, context, &head, None))?;
        }
        let mut chain = Chain::bare(head);
        loop {
            if self.peek_is(".") {
                self.shift(".")?;
                let name = self.shift("field name")?;
                if !words::is_word(&name) {
                    self.report(format!("{name} is not a valid identifier"))?;
                }
                chain.links.push(Link::Field(name));
            } else if self.peek_is("[") {
                self.shift("[")?;
                if self.peek_is("]") {
                    self.shift("]")?;
                    chain.links.push(Link::Index(None));
                } else {
                    let index = self.parse_expression()?;
                    self.expect("]")?;
                    chain.links.push(Link::Index(Some(index)));
                }
            } else if self.peek_is("(") {
                self.shift("(")?;
                let mut args = Vec::new();
                if self.peek_is(")") {
                    self.shift(")")?;
                } else {
                    loop {
                        args.push(self.parse_expression()?);
                        if self.peek_is(",") {
                            self.shift(",")?;
                        } else {
                            self.expect(")")?;
                            break;
                        }
                    }
                }
                chain.links.push(Link::Args(args));
            } else {
                break;
            }
        }
        Ok(chain)
    }

    /// Right-recursive `primary (OP expr)?`; precedence is intentionally not
    /// modeled, so emitted code preserves source order.
    fn parse_expression(&mut self) -> ParseResult<Expression> {
        let first = self.parse_primary()?;
        if let Some(token) = self.buffer.peek()
            && let Some(op) = BinaryOperator::from_token(token)
        {
            self.shift("operator")?;
            let rest = self.parse_expression()?;
            return Ok(Expression::Binary {
                left: Box::new(first),
                op,
                right: Box::new(rest),
            });
        }
        Ok(first)
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        let next = self.buffer.peek().map(str::to_string);
        match next.as_deref() {
            Some("true") => {
                self.shift("true")?;
                Ok(Expression::Boolean(true))
            }
            Some("false") => {
                self.shift("false")?;
                Ok(Expression::Boolean(false))
            }
            Some("null") => {
                self.shift("null")?;
                Ok(Expression::Null)
            }
            Some("\"") => {
                self.shift("\"")?;
                let mut parts = Vec::new();
                loop {
                    let token = self.shift("\"")?;
                    if token == "\"" {
                        break;
                    }
                    parts.push(token);
                }
                Ok(Expression::Str(parts.join(" ")))
            }
            Some("{") => {
                self.shift("{")?;
                let mut elements = Vec::new();
                if self.peek_is("}") {
                    self.shift("}")?;
                } else {
                    loop {
                        elements.push(self.parse_expression()?);
                        if self.peek_is(",") {
                            self.shift(",")?;
                        } else {
                            self.expect("}")?;
                            break;
                        }
                    }
                }
                Ok(Expression::ArrayLiteral(elements))
            }
            Some("(") => {
                self.shift("(")?;
                let inner = self.parse_expression()?;
                self.expect(")")?;
                Ok(Expression::Paren(Box::new(inner)))
            }
            Some("+") | Some("-") | Some("!") => {
                let token = self.shift("operator")?;
                let op = match token.as_str() {
                    "+" => UnaryOperator::Plus,
                    "-" => UnaryOperator::Minus,
                    _ => UnaryOperator::Not,
                };
                let operand = Box::new(self.parse_primary()?);
                Ok(Expression::Unary { op, operand })
            }
            Some("new") => {
                self.shift("new")?;
                let chain = self.parse_chain()?;
                Ok(Expression::New(chain))
            }
            Some(token) if words::is_number(token) => {
                let number = self.shift("number")?;
                Ok(Expression::Number(number))
            }
            _ => Ok(Expression::Chain(self.parse_chain()?)),
        }
    }
}
