//! In-memory class model built by the parser and read by the emitter.
//!
//! The model is append-only while parsing and immutable during emission.
//! Members live in insertion-order vectors because emitted output must
//! preserve source order; lookups are linear, which is fine at translation
//! scale.

use thiserror::Error;

use crate::parser::ast::{Expression, Statement};

/// The superclass recorded when no `extends` clause appears.
pub const ROOT_CLASS: &str = "object";

/// Sentinel method name under which constructors are stored.
pub const CONSTRUCTOR_NAME: &str = "__init__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    /// False only when `private` was written; `protected` counts as public.
    pub is_public: bool,
    pub is_static: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            is_public: true,
            is_static: false,
        }
    }
}

/// Hides entities whose modifiers do not match every set field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierFilter {
    pub is_public: Option<bool>,
    pub is_static: Option<bool>,
}

impl ModifierFilter {
    pub fn statics() -> Self {
        Self {
            is_static: Some(true),
            ..Self::default()
        }
    }

    pub fn instance() -> Self {
        Self {
            is_static: Some(false),
            ..Self::default()
        }
    }

    pub fn matches(&self, modifiers: &Modifiers) -> bool {
        self.is_public
            .is_none_or(|want| modifiers.is_public == want)
            && self
                .is_static
                .is_none_or(|want| modifiers.is_static == want)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub modifiers: Modifiers,
    pub name: String,
    pub initializer: Option<Expression>,
}

/// A method or constructor. Parameter datatypes are discarded at parse time;
/// only names in source order remain.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub modifiers: Modifiers,
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Statement>,
}

impl Method {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// All overloads sharing one method name, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodGroup {
    pub name: String,
    pub overloads: Vec<Method>,
}

impl MethodGroup {
    pub fn overload(&self, arity: usize) -> Option<&Method> {
        self.overloads.iter().find(|method| method.arity() == arity)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Variable {name} is already defined in class {class}")]
    DuplicateVariable { class: String, name: String },
    #[error("Method {name} with {arity} parameters is already defined in class {class}")]
    DuplicateMethodArity {
        class: String,
        name: String,
        arity: usize,
    },
    #[error("Constructor with {arity} parameters is already defined in class {class}")]
    DuplicateConstructorArity { class: String, arity: usize },
    #[error("Nested class {name} is already defined in class {class}")]
    DuplicateNestedClass { class: String, name: String },
}

/// One member as the parser hands it over; `Class::add` dispatches on the
/// tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Variable(Variable),
    Method(Method),
    Constructor(Method),
    Nested(Class),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    pub superclass: String,
    pub variables: Vec<Variable>,
    pub methods: Vec<MethodGroup>,
    pub constructors: Vec<Method>,
    pub nested: Vec<Class>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: ROOT_CLASS.to_string(),
            variables: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Append a member, rejecting duplicate names and duplicate arities.
    pub fn add(&mut self, member: Member) -> Result<(), ModelError> {
        match member {
            Member::Variable(variable) => {
                if self.variable(&variable.name).is_some() {
                    return Err(ModelError::DuplicateVariable {
                        class: self.name.clone(),
                        name: variable.name,
                    });
                }
                self.variables.push(variable);
            }
            Member::Method(method) => match self
                .methods
                .iter_mut()
                .find(|group| group.name == method.name)
            {
                Some(group) => {
                    if group.overload(method.arity()).is_some() {
                        let arity = method.arity();
                        return Err(ModelError::DuplicateMethodArity {
                            class: self.name.clone(),
                            name: method.name,
                            arity,
                        });
                    }
                    group.overloads.push(method);
                }
                None => self.methods.push(MethodGroup {
                    name: method.name.clone(),
                    overloads: vec![method],
                }),
            },
            Member::Constructor(constructor) => {
                if self
                    .constructors
                    .iter()
                    .any(|existing| existing.arity() == constructor.arity())
                {
                    return Err(ModelError::DuplicateConstructorArity {
                        class: self.name.clone(),
                        arity: constructor.arity(),
                    });
                }
                self.constructors.push(constructor);
            }
            Member::Nested(class) => {
                if self.nested_class(&class.name).is_some() {
                    return Err(ModelError::DuplicateNestedClass {
                        class: self.name.clone(),
                        name: class.name,
                    });
                }
                self.nested.push(class);
            }
        }
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|variable| variable.name == name)
    }

    pub fn variables_matching(
        &self,
        filter: ModifierFilter,
    ) -> impl Iterator<Item = &Variable> {
        self.variables
            .iter()
            .filter(move |variable| filter.matches(&variable.modifiers))
    }

    pub fn method_group(&self, name: &str) -> Option<&MethodGroup> {
        self.methods.iter().find(|group| group.name == name)
    }

    /// Distinct method names in insertion order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|group| group.name.as_str())
    }

    pub fn constructor(&self, arity: usize) -> Option<&Method> {
        self.constructors
            .iter()
            .find(|constructor| constructor.arity() == arity)
    }

    pub fn nested_class(&self, name: &str) -> Option<&Class> {
        self.nested.iter().find(|class| class.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(name: &str, is_static: bool) -> Variable {
        Variable {
            modifiers: Modifiers {
                is_public: true,
                is_static,
            },
            name: name.to_string(),
            initializer: None,
        }
    }

    fn method(name: &str, params: &[&str]) -> Method {
        Method {
            modifiers: Modifiers::default(),
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            body: Vec::new(),
        }
    }

    #[test]
    fn rejects_duplicate_variable_names() {
        let mut class = Class::new("Ex");
        class
            .add(Member::Variable(variable("x", false)))
            .expect("first x");
        let error = class
            .add(Member::Variable(variable("x", true)))
            .expect_err("second x must be rejected");
        assert_eq!(
            error.to_string(),
            "Variable x is already defined in class Ex"
        );
    }

    #[test]
    fn groups_overloads_and_rejects_arity_collisions() {
        let mut class = Class::new("Ex");
        class.add(Member::Method(method("foo", &[]))).expect("foo/0");
        class
            .add(Member::Method(method("foo", &["a"])))
            .expect("foo/1");
        class
            .add(Member::Method(method("bar", &[])))
            .expect("bar/0");
        let error = class
            .add(Member::Method(method("foo", &["b"])))
            .expect_err("foo/1 again must be rejected");
        assert_eq!(
            error.to_string(),
            "Method foo with 1 parameters is already defined in class Ex"
        );

        let group = class.method_group("foo").expect("foo group");
        assert_eq!(group.overloads.len(), 2);
        assert!(group.overload(1).is_some());
        assert!(group.overload(2).is_none());
        assert_eq!(class.method_names().collect::<Vec<_>>(), vec!["foo", "bar"]);
    }

    #[test]
    fn rejects_duplicate_constructor_arity() {
        let mut class = Class::new("Ex");
        class
            .add(Member::Constructor(method(CONSTRUCTOR_NAME, &["a"])))
            .expect("first constructor");
        let error = class
            .add(Member::Constructor(method(CONSTRUCTOR_NAME, &["b"])))
            .expect_err("same arity must be rejected");
        assert_eq!(
            error.to_string(),
            "Constructor with 1 parameters is already defined in class Ex"
        );
    }

    #[test]
    fn filters_variables_by_modifiers() {
        let mut class = Class::new("Ex");
        class
            .add(Member::Variable(variable("a", true)))
            .expect("static a");
        class
            .add(Member::Variable(variable("b", false)))
            .expect("instance b");

        let statics: Vec<&str> = class
            .variables_matching(ModifierFilter::statics())
            .map(|v| v.name.as_str())
            .collect();
        let instance: Vec<&str> = class
            .variables_matching(ModifierFilter::instance())
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(statics, vec!["a"]);
        assert_eq!(instance, vec!["b"]);
    }

    #[test]
    fn superclass_defaults_to_object() {
        assert_eq!(Class::new("Ex").superclass, ROOT_CLASS);
    }
}
