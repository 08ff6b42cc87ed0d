//! Python code generator: walks the class model and rewrites source
//! semantics into target equivalents.
//!
//! All semantic translation lives here: arity dispatch for overloads,
//! identifier resolution against locals and class members, literal and
//! operator mapping, array constructor synthesis, and the trailing
//! entry-point block. Indentation is four spaces per level.

use std::collections::HashSet;

use crate::Options;
use crate::diag::{Diagnostic, DiagnosticSink, TranslateError};
use crate::model::{Class, Method, MethodGroup, ModifierFilter, Variable};
use crate::parser::ast::{
    BinaryOperator, Chain, Expression, Link, Statement, UnaryOperator,
};

type EmitResult<T> = Result<T, TranslateError>;

/// Per-method resolution context: the enclosing class and the set of names
/// bound locally (parameters plus declared variables).
struct Scope<'c> {
    class: &'c Class,
    locals: HashSet<String>,
    /// Static initializers run at class scope, where sibling statics are
    /// visible without a prefix.
    class_scope: bool,
}

impl<'c> Scope<'c> {
    fn class_level(class: &'c Class) -> Self {
        Self {
            class,
            locals: HashSet::new(),
            class_scope: true,
        }
    }

    fn method(class: &'c Class) -> Self {
        Self {
            class,
            locals: HashSet::new(),
            class_scope: false,
        }
    }
}

pub struct Emitter<'a> {
    options: &'a Options,
    diags: &'a mut DiagnosticSink,
}

impl<'a> Emitter<'a> {
    pub fn new(options: &'a Options, diags: &'a mut DiagnosticSink) -> Self {
        Self { options, diags }
    }

    pub fn emit(&mut self, classes: &[Class]) -> EmitResult<String> {
        let mut output = String::new();
        for (index, class) in classes.iter().enumerate() {
            if index > 0 {
                output.push('\n');
            }
            self.emit_class(class, 0, &mut output)?;
        }
        self.emit_entry_point(classes, &mut output);
        Ok(output)
    }

    /// `class NAME(SUPER):` followed by initialized statics, `__init__`,
    /// methods, and nested classes, or `pass` when all are empty.
    fn emit_class(&mut self, class: &Class, indent: usize, output: &mut String) -> EmitResult<()> {
        push_line(
            output,
            indent,
            &format!("class {}({}):", class.name, class.superclass),
        );
        let mut emitted = 0usize;

        let scope = Scope::class_level(class);
        for variable in class.variables_matching(ModifierFilter::statics()) {
            if let Some(initializer) = &variable.initializer {
                let value = self.emit_expression(initializer, &scope, false)?;
                push_line(
                    output,
                    indent + 1,
                    &format!("{} = {}", self.variable_name(variable), value),
                );
                emitted += 1;
            }
        }

        emitted += self.emit_init(class, indent + 1, output)?;

        for group in &class.methods {
            self.emit_method_group(class, group, indent + 1, output)?;
            emitted += 1;
        }

        for nested in &class.nested {
            self.emit_class(nested, indent + 1, output)?;
            emitted += 1;
        }

        if emitted == 0 {
            push_line(output, indent + 1, "pass");
        }
        Ok(())
    }

    /// Synthesize `__init__` from instance-variable initializers and the
    /// declared constructors. Returns how many members were emitted (0 or 1).
    fn emit_init(&mut self, class: &Class, indent: usize, output: &mut String) -> EmitResult<usize> {
        let instance_inits: Vec<&Variable> = class
            .variables_matching(ModifierFilter::instance())
            .filter(|variable| variable.initializer.is_some())
            .collect();
        if class.constructors.is_empty() && instance_inits.is_empty() {
            return Ok(0);
        }

        let mut scope = Scope::method(class);
        if class.constructors.len() > 1 {
            push_line(output, indent, "def __init__(self, *args):");
            scope.locals.insert("args".to_string());
        } else {
            let params = class
                .constructors
                .first()
                .map(|constructor| constructor.params.as_slice())
                .unwrap_or(&[]);
            push_line(output, indent, &format!("def __init__({}):", signature(params)));
            for param in params {
                scope.locals.insert(param.clone());
            }
        }

        let mut emitted = 0usize;
        for variable in &instance_inits {
            if let Some(initializer) = &variable.initializer {
                let value = self.emit_expression(initializer, &scope, false)?;
                push_line(
                    output,
                    indent + 1,
                    &format!("self.{} = {}", self.variable_name(variable), value),
                );
                emitted += 1;
            }
        }

        if class.constructors.len() > 1 {
            emitted += self.emit_dispatch(class, &class.constructors, indent + 1, output)?;
        } else if let Some(constructor) = class.constructors.first() {
            emitted += self.emit_statements(&constructor.body, indent + 1, &mut scope, output)?;
        }

        if emitted == 0 {
            push_line(output, indent + 1, "pass");
        }
        Ok(1)
    }

    fn emit_method_group(
        &mut self,
        class: &Class,
        group: &MethodGroup,
        indent: usize,
        output: &mut String,
    ) -> EmitResult<()> {
        let emitted_name = method_name(&group.name);
        if group.name == "main" {
            push_line(output, indent, "@classmethod");
        }
        if group.overloads.len() == 1 {
            let method = &group.overloads[0];
            push_line(
                output,
                indent,
                &format!("def {emitted_name}({}):", signature(&method.params)),
            );
            let mut scope = Scope::method(class);
            for param in &method.params {
                scope.locals.insert(param.clone());
            }
            let emitted = self.emit_statements(&method.body, indent + 1, &mut scope, output)?;
            if emitted == 0 {
                push_line(output, indent + 1, "pass");
            }
        } else {
            push_line(output, indent, &format!("def {emitted_name}(self, *args):"));
            self.emit_dispatch(class, &group.overloads, indent + 1, output)?;
        }
        Ok(())
    }

    /// One `if len(args) == N:` branch per overload, in insertion order,
    /// each unpacking into the original parameter names.
    fn emit_dispatch(
        &mut self,
        class: &Class,
        overloads: &[Method],
        indent: usize,
        output: &mut String,
    ) -> EmitResult<usize> {
        let mut emitted = 0usize;
        for (index, method) in overloads.iter().enumerate() {
            let keyword = if index == 0 { "if" } else { "elif" };
            push_line(
                output,
                indent,
                &format!("{keyword} len(args) == {}:", method.arity()),
            );
            let mut scope = Scope::method(class);
            scope.locals.insert("args".to_string());
            for param in &method.params {
                scope.locals.insert(param.clone());
            }
            let mut branch = 0usize;
            if !method.params.is_empty() {
                push_line(
                    output,
                    indent + 1,
                    &format!("({},) = args", method.params.join(", ")),
                );
                branch += 1;
            }
            branch += self.emit_statements(&method.body, indent + 1, &mut scope, output)?;
            if branch == 0 {
                push_line(output, indent + 1, "pass");
            }
            emitted += 1;
        }
        Ok(emitted)
    }

    fn emit_statements(
        &mut self,
        statements: &[Statement],
        indent: usize,
        scope: &mut Scope<'_>,
        output: &mut String,
    ) -> EmitResult<usize> {
        let mut emitted = 0usize;
        for statement in statements {
            emitted += self.emit_statement(statement, indent, scope, output)?;
        }
        Ok(emitted)
    }

    /// Emit one statement; the returned count is zero only when nothing was
    /// written (declaration without initializers, empty block), so callers
    /// can pad empty suites with `pass`.
    fn emit_statement(
        &mut self,
        statement: &Statement,
        indent: usize,
        scope: &mut Scope<'_>,
        output: &mut String,
    ) -> EmitResult<usize> {
        match statement {
            Statement::Return(None) => {
                push_line(output, indent, "return");
                Ok(1)
            }
            Statement::Return(Some(value)) => {
                let value = self.emit_expression(value, scope, false)?;
                push_line(output, indent, &format!("return {value}"));
                Ok(1)
            }
            Statement::Declare(variables) => {
                for variable in variables {
                    scope.locals.insert(variable.name.clone());
                }
                let mut emitted = 0usize;
                for variable in variables {
                    if let Some(initializer) = &variable.initializer {
                        let value = self.emit_expression(initializer, scope, false)?;
                        push_line(output, indent, &format!("{} = {}", variable.name, value));
                        emitted += 1;
                    }
                }
                Ok(emitted)
            }
            Statement::Assign { target, value } => {
                let target = self.emit_chain_text(target, scope)?;
                let value = self.emit_expression(value, scope, false)?;
                push_line(output, indent, &format!("{target} = {value}"));
                Ok(1)
            }
            Statement::Expr(expression) => {
                let text = self.emit_expression(expression, scope, false)?;
                push_line(output, indent, &text);
                Ok(1)
            }
            Statement::Block(statements) => self.emit_statements(statements, indent, scope, output),
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => self.emit_if(
                condition,
                then_branch,
                else_branch.as_deref(),
                indent,
                scope,
                output,
                "if",
            ),
            Statement::While { condition, body } => {
                let condition = self.emit_expression(condition, scope, false)?;
                push_line(output, indent, &format!("while {condition}:"));
                let emitted = self.emit_statement(body, indent + 1, scope, output)?;
                if emitted == 0 {
                    push_line(output, indent + 1, "pass");
                }
                Ok(1)
            }
            Statement::For {
                init,
                condition,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.emit_statement(init, indent, scope, output)?;
                }
                let condition = match condition {
                    Some(condition) => self.emit_expression(condition, scope, false)?,
                    None => "True".to_string(),
                };
                push_line(output, indent, &format!("while {condition}:"));
                let mut emitted = self.emit_statement(body, indent + 1, scope, output)?;
                if let Some(update) = update {
                    emitted += self.emit_statement(update, indent + 1, scope, output)?;
                }
                if emitted == 0 {
                    push_line(output, indent + 1, "pass");
                }
                Ok(1)
            }
            Statement::ForEach {
                var,
                iterable,
                body,
            } => {
                let iterable = self.emit_expression(iterable, scope, false)?;
                scope.locals.insert(var.clone());
                push_line(output, indent, &format!("for {var} in {iterable}:"));
                let emitted = self.emit_statement(body, indent + 1, scope, output)?;
                if emitted == 0 {
                    push_line(output, indent + 1, "pass");
                }
                Ok(1)
            }
            Statement::IncDec { target, increment } => {
                let target = self.emit_chain_text(target, scope)?;
                let op = if *increment { "+=" } else { "-=" };
                push_line(output, indent, &format!("{target} {op} 1"));
                Ok(1)
            }
            Statement::Break => {
                push_line(output, indent, "break");
                Ok(1)
            }
            Statement::Continue => {
                push_line(output, indent, "continue");
                Ok(1)
            }
        }
    }

    /// `if`/`elif`/`else` with a direct `else if` collapsed to `elif`.
    #[allow(clippy::too_many_arguments)]
    fn emit_if(
        &mut self,
        condition: &Expression,
        then_branch: &Statement,
        else_branch: Option<&Statement>,
        indent: usize,
        scope: &mut Scope<'_>,
        output: &mut String,
        keyword: &str,
    ) -> EmitResult<usize> {
        let condition = self.emit_expression(condition, scope, false)?;
        push_line(output, indent, &format!("{keyword} {condition}:"));
        let emitted = self.emit_statement(then_branch, indent + 1, scope, output)?;
        if emitted == 0 {
            push_line(output, indent + 1, "pass");
        }
        match else_branch {
            None => {}
            Some(Statement::If {
                condition,
                then_branch,
                else_branch,
            }) => {
                self.emit_if(
                    condition,
                    then_branch,
                    else_branch.as_deref(),
                    indent,
                    scope,
                    output,
                    "elif",
                )?;
            }
            Some(other) => {
                push_line(output, indent, "else:");
                let emitted = self.emit_statement(other, indent + 1, scope, output)?;
                if emitted == 0 {
                    push_line(output, indent + 1, "pass");
                }
            }
        }
        Ok(1)
    }

    /// `nested` marks sub-expression position, where a rewritten `.equals`
    /// comparison needs parentheses.
    fn emit_expression(
        &mut self,
        expression: &Expression,
        scope: &Scope<'_>,
        nested: bool,
    ) -> EmitResult<String> {
        match expression {
            Expression::Number(text) => Ok(text.clone()),
            Expression::Str(text) => Ok(format!("\"{text}\"")),
            Expression::Boolean(true) => Ok("True".to_string()),
            Expression::Boolean(false) => Ok("False".to_string()),
            Expression::Null => Ok("None".to_string()),
            Expression::Chain(chain) => {
                let (text, comparison) = self.emit_chain(chain, scope)?;
                if comparison && nested {
                    Ok(format!("({text})"))
                } else {
                    Ok(text)
                }
            }
            Expression::ArrayLiteral(elements) => {
                let parts = elements
                    .iter()
                    .map(|element| self.emit_expression(element, scope, false))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("[{}]", parts.join(", ")))
            }
            Expression::New(chain) => self.emit_new(chain, scope),
            Expression::Unary { op, operand } => {
                let operand = self.emit_expression(operand, scope, true)?;
                Ok(match op {
                    UnaryOperator::Plus => format!("+{operand}"),
                    UnaryOperator::Minus => format!("-{operand}"),
                    UnaryOperator::Not => format!("not {operand}"),
                })
            }
            Expression::Binary { left, op, right } => {
                let left = self.emit_expression(left, scope, true)?;
                let right = self.emit_expression(right, scope, true)?;
                Ok(format!("{left} {} {right}", self.binary_operator(*op)))
            }
            Expression::Paren(inner) => {
                let inner = self.emit_expression(inner, scope, false)?;
                Ok(format!("({inner})"))
            }
        }
    }

    fn binary_operator(&self, op: BinaryOperator) -> &'static str {
        match op {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessEq => "<=",
            BinaryOperator::GreaterEq => ">=",
            // Identity comparison matches the source corpus; `plain_eq`
            // switches to value equality.
            BinaryOperator::Eq => {
                if self.options.plain_eq {
                    "=="
                } else {
                    "is"
                }
            }
            BinaryOperator::NotEq => "!=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
        }
    }

    fn emit_chain_text(&mut self, chain: &Chain, scope: &Scope<'_>) -> EmitResult<String> {
        Ok(self.emit_chain(chain, scope)?.0)
    }

    /// Rewrite a chain: resolve the head, then fold the links while applying
    /// the `.length` and `.equals` translations. The flag says whether the
    /// result is a bare comparison.
    fn emit_chain(&mut self, chain: &Chain, scope: &Scope<'_>) -> EmitResult<(String, bool)> {
        if chain.head == "System"
            && let [Link::Field(out), Link::Field(println), rest @ ..] = chain.links.as_slice()
            && out == "out"
            && println == "println"
        {
            let mut text = "print".to_string();
            let comparison = self.emit_links(rest, &mut text, scope)?;
            return Ok((text, comparison));
        }

        let mut text = self.resolve_head(&chain.head, scope);
        let comparison = self.emit_links(&chain.links, &mut text, scope)?;
        Ok((text, comparison))
    }

    /// Resolution precedence: `this` → locals → class variable → class
    /// method → nested class → pass-through.
    fn resolve_head(&self, head: &str, scope: &Scope<'_>) -> String {
        if head == "this" {
            return "self".to_string();
        }
        if scope.locals.contains(head) {
            return head.to_string();
        }
        if let Some(variable) = scope.class.variable(head) {
            let name = self.variable_name(variable);
            if scope.class_scope {
                return name;
            }
            return if variable.modifiers.is_static {
                format!("{}.{name}", scope.class.name)
            } else {
                format!("self.{name}")
            };
        }
        if let Some(group) = scope.class.method_group(head) {
            let name = method_name(&group.name);
            let is_static = group
                .overloads
                .iter()
                .all(|method| method.modifiers.is_static);
            return if is_static && !scope.class_scope {
                format!("{}.{name}", scope.class.name)
            } else if scope.class_scope {
                name.to_string()
            } else {
                format!("self.{name}")
            };
        }
        if scope.class.nested_class(head).is_some() && !scope.class_scope {
            return format!("{}.{head}", scope.class.name);
        }
        head.to_string()
    }

    fn emit_links(
        &mut self,
        links: &[Link],
        text: &mut String,
        scope: &Scope<'_>,
    ) -> EmitResult<bool> {
        let mut comparison = false;
        let mut index = 0;
        while index < links.len() {
            match &links[index] {
                Link::Field(name) if name == "length" => {
                    *text = format!("len({text})");
                    // A `()` after `.length` is consumed so both the field
                    // and the method spelling land on `len`.
                    if let Some(Link::Args(args)) = links.get(index + 1)
                        && args.is_empty()
                    {
                        index += 1;
                    }
                    comparison = false;
                }
                Link::Field(name)
                    if name == "equals"
                        && matches!(links.get(index + 1), Some(Link::Args(args)) if args.len() == 1) =>
                {
                    if let Some(Link::Args(args)) = links.get(index + 1) {
                        let rhs = self.emit_expression(&args[0], scope, true)?;
                        if comparison {
                            *text = format!("({text})");
                        }
                        *text = format!("{text} == {rhs}");
                        comparison = true;
                        index += 1;
                    }
                }
                Link::Field(name) => {
                    if comparison {
                        *text = format!("({text})");
                        comparison = false;
                    }
                    let emitted = self.member_field_name(name, text, scope);
                    text.push('.');
                    text.push_str(&emitted);
                }
                Link::Index(Some(index_expr)) => {
                    if comparison {
                        *text = format!("({text})");
                        comparison = false;
                    }
                    let index_text = self.emit_expression(index_expr, scope, false)?;
                    *text = format!("{text}[{index_text}]");
                }
                Link::Index(None) => {
                    self.diags.report(Diagnostic::new(
                        0,
                        "",
                        "Array brackets without a size are only allowed in declarations",
                    ))?;
                    text.push_str("[]");
                }
                Link::Args(args) => {
                    if comparison {
                        *text = format!("({text})");
                        comparison = false;
                    }
                    let parts = args
                        .iter()
                        .map(|arg| self.emit_expression(arg, scope, false))
                        .collect::<Result<Vec<_>, _>>()?;
                    *text = format!("{text}({})", parts.join(", "));
                }
            }
            index += 1;
        }
        Ok(comparison)
    }

    /// Apply the private-underscore rename to field accesses through `self`
    /// or the enclosing class name.
    fn member_field_name(&self, name: &str, receiver: &str, scope: &Scope<'_>) -> String {
        if self.options.private
            && (receiver == "self" || receiver == scope.class.name)
            && let Some(variable) = scope.class.variable(name)
            && !variable.modifiers.is_public
        {
            return format!("_{name}");
        }
        name.to_string()
    }

    /// `new T(...)` becomes a constructor call; `new T[n]...` becomes a
    /// repetition-initialized list with a type-dependent default element.
    fn emit_new(&mut self, chain: &Chain, scope: &Scope<'_>) -> EmitResult<String> {
        let mut base = chain.head.clone();
        let mut index = 0;
        while let Some(Link::Field(name)) = chain.links.get(index) {
            base.push('.');
            base.push_str(name);
            index += 1;
        }

        let mut sizes = Vec::new();
        while let Some(Link::Index(size)) = chain.links.get(index) {
            sizes.push(size);
            index += 1;
        }

        if !sizes.is_empty() {
            let mut element = default_element(&base).to_string();
            for size in sizes.iter().rev() {
                element = match size {
                    Some(Expression::Number(literal)) if !literal.contains('.') => {
                        match literal.parse::<usize>() {
                            Ok(count) => {
                                format!("[{}]", vec![element.clone(); count].join(", "))
                            }
                            Err(_) => format!("[{element} for _ in range({literal})]"),
                        }
                    }
                    Some(expression) => {
                        let count = self.emit_expression(expression, scope, false)?;
                        format!("[{element} for _ in range({count})]")
                    }
                    None => {
                        self.diags.report(Diagnostic::new(
                            0,
                            "",
                            format!("new {base}[] needs a size"),
                        ))?;
                        "[]".to_string()
                    }
                };
            }
            let mut text = element;
            self.emit_links(&chain.links[index..], &mut text, scope)?;
            return Ok(text);
        }

        let mut text = if !base.contains('.') && scope.class.nested_class(&base).is_some() {
            format!("{}.{base}", scope.class.name)
        } else {
            base
        };
        if !matches!(chain.links.get(index), Some(Link::Args(_))) {
            text.push_str("()");
        }
        self.emit_links(&chain.links[index..], &mut text, scope)?;
        Ok(text)
    }

    fn variable_name(&self, variable: &Variable) -> String {
        if self.options.private && !variable.modifiers.is_public {
            format!("_{}", variable.name)
        } else {
            variable.name.clone()
        }
    }

    /// One dispatch clause per top-level class that declares a `main`.
    fn emit_entry_point(&mut self, classes: &[Class], output: &mut String) {
        let mains: Vec<&Class> = classes
            .iter()
            .filter(|class| class.method_group("main").is_some())
            .collect();
        if mains.is_empty() {
            return;
        }
        output.push('\n');
        push_line(output, 0, "if __name__ == \"__main__\":");
        push_line(output, 1, "import sys");
        push_line(output, 1, "assert len(sys.argv) > 1");
        for (index, class) in mains.iter().enumerate() {
            let keyword = if index == 0 { "if" } else { "elif" };
            push_line(
                output,
                1,
                &format!("{keyword} sys.argv[1] == \"{}\":", class.name),
            );
            push_line(output, 2, &format!("{}.main(sys.argv[2:])", class.name));
        }
    }
}

/// `equals` maps onto the equality dunder; everything else keeps its name.
fn method_name(name: &str) -> &str {
    if name == "equals" { "__eq__" } else { name }
}

fn signature(params: &[String]) -> String {
    let mut parts = vec!["self".to_string()];
    parts.extend(params.iter().cloned());
    parts.join(", ")
}

fn push_line(output: &mut String, indent: usize, line: &str) {
    for _ in 0..indent {
        output.push_str("    ");
    }
    output.push_str(line);
    output.push('\n');
}

/// Default element for array constructors, by declared element type.
fn default_element(datatype: &str) -> &'static str {
    match datatype {
        "int" | "short" | "long" | "float" | "double" | "byte" => "0",
        "boolean" => "False",
        _ => "None",
    }
}
