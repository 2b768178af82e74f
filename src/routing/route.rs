//! A single (method, URI template) route.

use crate::routing::params::classify_parameters;
use crate::routing::{CompiledPath, Method, ParameterBindings, Program, RouteError};

/// A (method, URI template) pair bound to a program, a template, or both.
///
/// Routes only exist with at least one of the two. The program and the
/// template can arrive in either order; the result is the same.
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    path: CompiledPath,
    program: Option<Program>,
    template: Option<String>,
    bindings: ParameterBindings,
}

impl Route {
    /// A route served by a program.
    pub fn with_program(method: Method, path: CompiledPath, program: Program) -> Result<Self, RouteError> {
        let mut route = Self::empty(method, path);
        route.attach_program(program)?;
        Ok(route)
    }

    /// A route served by a template alone.
    pub fn with_template(method: Method, path: CompiledPath, template: impl Into<String>) -> Self {
        let mut route = Self::empty(method, path);
        route.template = Some(template.into());
        route
    }

    fn empty(method: Method, path: CompiledPath) -> Self {
        Self {
            method,
            path,
            program: None,
            template: None,
            bindings: ParameterBindings::default(),
        }
    }

    /// Merge a program into this route, classifying its parameters.
    pub fn attach_program(&mut self, program: Program) -> Result<(), RouteError> {
        if self.program.is_some() {
            return Err(self.ambiguous("program"));
        }

        self.bindings = classify_parameters(
            program.parameters(),
            self.path.captures(),
            self.method,
            self.path.template(),
            program.has_instance(),
        )?;
        self.program = Some(program);
        Ok(())
    }

    /// Merge a template into this route.
    pub fn attach_template(&mut self, template: impl Into<String>) -> Result<(), RouteError> {
        if self.template.is_some() {
            return Err(self.ambiguous("template"));
        }
        self.template = Some(template.into());
        Ok(())
    }

    fn ambiguous(&self, kind: &'static str) -> RouteError {
        RouteError::AmbiguousMerge {
            method: self.method,
            path: self.path.template().to_string(),
            kind,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// URI template, e.g. `/blog/{slug}/view`.
    pub fn path(&self) -> &str {
        self.path.template()
    }

    pub fn compiled_path(&self) -> &CompiledPath {
        &self.path
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Template name relative to the pages root.
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn bindings(&self) -> &ParameterBindings {
        &self.bindings
    }
}
