//! Program handlers and their explicit registration.
//!
//! A program unit stands for one file under the programs root. Instead of
//! scanning the file for method-named symbols, the unit declares them:
//!
//! ```
//! use weblet::handler::HandlerError;
//! use weblet::routing::{Arguments, Program, ProgramUnit};
//!
//! let unit = ProgramUnit::new("blog/(slug)/view").get(Program::function(
//!     ["slug"],
//!     |args: Arguments| async move {
//!         let slug = args.require("slug")?.to_string();
//!         Ok::<_, HandlerError>(format!("<h1>{slug}</h1>"))
//!     },
//! ));
//! assert_eq!(unit.programs().count(), 1);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::handler::{json_type, BoxFuture, HandlerError, HandlerResult};
use crate::http::request::RequestContext;
use crate::routing::Method;

/// A per-request object whose methods serve as programs.
///
/// A fresh value is built with `Default` for every request and receives
/// the request snapshot before the handler runs.
pub trait PageInstance: Default + Send + 'static {
    fn set_request(&mut self, request: Arc<RequestContext>);
}

type ProgramFn = Arc<dyn Fn(Invocation) -> BoxFuture<HandlerResult<Output>> + Send + Sync>;
type InstanceFactory = Arc<dyn Fn(Arc<RequestContext>) -> Box<dyn Any + Send> + Send + Sync>;

/// Everything a program receives for one call.
pub struct Invocation {
    pub instance: Option<Box<dyn Any + Send>>,
    pub arguments: Arguments,
}

/// Values bound to a program's declared parameters.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    request: Option<Arc<RequestContext>>,
    values: HashMap<String, String>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_request(&mut self, request: Arc<RequestContext>) {
        self.request = Some(request);
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Bound value, or `None` when the source did not provide one.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Bound value that the program cannot do without.
    pub fn require(&self, name: &str) -> HandlerResult<&str> {
        self.get(name)
            .ok_or_else(|| HandlerError::MissingArgument(name.to_string()))
    }

    /// The request snapshot, present when the program declares `request`.
    pub fn request(&self) -> Option<&RequestContext> {
        self.request.as_deref()
    }
}

/// What a program hands back to the dispatch engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Sent verbatim as the HTML body; any template is skipped.
    Html(String),
    /// Variables for the route's template.
    Context(Map<String, Value>),
    /// No result.
    Empty,
}

impl Output {
    /// Build template variables from any value that serialises to a mapping.
    pub fn context<T: Serialize>(value: &T) -> HandlerResult<Self> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Output::Context(map)),
            Value::Null => Ok(Output::Empty),
            other => Err(HandlerError::msg(format!(
                "template variables must be a dictionary, got {}",
                json_type(&other)
            ))),
        }
    }
}

impl From<String> for Output {
    fn from(text: String) -> Self {
        Output::Html(text)
    }
}

impl From<&str> for Output {
    fn from(text: &str) -> Self {
        Output::Html(text.to_string())
    }
}

impl From<Map<String, Value>> for Output {
    fn from(map: Map<String, Value>) -> Self {
        Output::Context(map)
    }
}

impl From<()> for Output {
    fn from(_: ()) -> Self {
        Output::Empty
    }
}

/// A callable bound to one (method, path) route.
#[derive(Clone)]
pub struct Program {
    parameters: Vec<String>,
    factory: Option<InstanceFactory>,
    handler: ProgramFn,
}

impl Program {
    /// A free-function program.
    pub fn function<P, S, F, Fut, O>(params: P, f: F) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<O>> + Send + 'static,
        O: Into<Output>,
    {
        let handler: ProgramFn = Arc::new(move |invocation: Invocation| {
            let fut = f(invocation.arguments);
            let boxed: BoxFuture<HandlerResult<Output>> =
                Box::pin(async move { fut.await.map(Into::into) });
            boxed
        });

        Self {
            parameters: params.into_iter().map(Into::into).collect(),
            factory: None,
            handler,
        }
    }

    /// A program bound to a fresh `T` per request.
    pub fn method<T, P, S, F, Fut, O>(params: P, f: F) -> Self
    where
        T: PageInstance,
        P: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(T, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<O>> + Send + 'static,
        O: Into<Output>,
    {
        let factory: InstanceFactory =
            Arc::new(|request: Arc<RequestContext>| -> Box<dyn Any + Send> {
                let mut instance = T::default();
                instance.set_request(request);
                Box::new(instance)
            });

        let handler: ProgramFn = Arc::new(move |invocation: Invocation| {
            let Invocation {
                instance,
                arguments,
            } = invocation;

            let boxed: BoxFuture<HandlerResult<Output>> =
                match instance.map(|instance| instance.downcast::<T>()) {
                    Some(Ok(instance)) => {
                        let fut = f(*instance, arguments);
                        Box::pin(async move { fut.await.map(Into::into) })
                    }
                    _ => Box::pin(async { Err(HandlerError::InstanceMismatch) }),
                };
            boxed
        });

        Self {
            parameters: params.into_iter().map(Into::into).collect(),
            factory: Some(factory),
            handler,
        }
    }

    /// Declared parameter names, in order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn has_instance(&self) -> bool {
        self.factory.is_some()
    }

    /// Build the per-request instance, if this program has one.
    pub fn instantiate(&self, request: Arc<RequestContext>) -> Option<Box<dyn Any + Send>> {
        self.factory.as_ref().map(|factory| factory(request))
    }

    pub fn invoke(&self, invocation: Invocation) -> BoxFuture<HandlerResult<Output>> {
        (self.handler)(invocation)
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("parameters", &self.parameters)
            .field("instance", &self.has_instance())
            .finish_non_exhaustive()
    }
}

/// One program file: its path under the programs root and the
/// method-named handlers it exports.
#[derive(Debug, Clone)]
pub struct ProgramUnit {
    path: PathBuf,
    programs: Vec<(Method, Program)>,
}

impl ProgramUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            programs: Vec::new(),
        }
    }

    /// Export a handler for `method`, replacing any earlier one.
    pub fn method(mut self, method: Method, program: Program) -> Self {
        self.programs.retain(|(existing, _)| *existing != method);
        self.programs.push((method, program));
        self
    }

    pub fn delete(self, program: Program) -> Self {
        self.method(Method::Delete, program)
    }

    pub fn get(self, program: Program) -> Self {
        self.method(Method::Get, program)
    }

    pub fn head(self, program: Program) -> Self {
        self.method(Method::Head, program)
    }

    pub fn options(self, program: Program) -> Self {
        self.method(Method::Options, program)
    }

    pub fn patch(self, program: Program) -> Self {
        self.method(Method::Patch, program)
    }

    pub fn post(self, program: Program) -> Self {
        self.method(Method::Post, program)
    }

    pub fn put(self, program: Program) -> Self {
        self.method(Method::Put, program)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn programs(&self) -> impl Iterator<Item = (Method, &Program)> {
        self.programs.iter().map(|(method, program)| (*method, program))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        request: Option<Arc<RequestContext>>,
    }

    impl PageInstance for Counter {
        fn set_request(&mut self, request: Arc<RequestContext>) {
            self.request = Some(request);
        }
    }

    #[tokio::test]
    async fn test_function_program_receives_arguments() {
        let program = Program::function(["name"], |args: Arguments| async move {
            Ok::<_, HandlerError>(format!("hello {}", args.require("name")?))
        });

        let mut arguments = Arguments::new();
        arguments.insert("name", "alice");
        let output = program
            .invoke(Invocation {
                instance: None,
                arguments,
            })
            .await
            .unwrap();

        assert_eq!(output, Output::Html("hello alice".into()));
        assert!(!program.has_instance());
    }

    #[tokio::test]
    async fn test_method_program_gets_fresh_instance() {
        let program = Program::method(["self"], |page: Counter, _args: Arguments| async move {
            let path = page
                .request
                .map(|request| request.uri().path().to_string())
                .unwrap_or_default();
            Ok::<_, HandlerError>(path)
        });

        let request = Arc::new(RequestContext::for_tests("/counter"));
        let instance = program.instantiate(request);
        assert!(instance.is_some());

        let output = program
            .invoke(Invocation {
                instance,
                arguments: Arguments::new(),
            })
            .await
            .unwrap();
        assert_eq!(output, Output::Html("/counter".into()));
    }

    #[tokio::test]
    async fn test_method_program_without_instance_errors() {
        let program = Program::method(["self"], |_page: Counter, _args: Arguments| async move {
            Ok::<_, HandlerError>(())
        });
        let result = program
            .invoke(Invocation {
                instance: None,
                arguments: Arguments::new(),
            })
            .await;
        assert!(matches!(result, Err(HandlerError::InstanceMismatch)));
    }

    #[test]
    fn test_context_requires_mapping() {
        #[derive(Serialize)]
        struct Page {
            title: &'static str,
        }

        let output = Output::context(&Page { title: "Home" }).unwrap();
        assert!(matches!(output, Output::Context(map) if map["title"] == "Home"));
        assert!(Output::context(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_unit_replaces_same_method() {
        let first = Program::function(Vec::<String>::new(), |_args: Arguments| async { Ok::<_, HandlerError>("a") });
        let second = Program::function(Vec::<String>::new(), |_args: Arguments| async { Ok::<_, HandlerError>("b") });
        let unit = ProgramUnit::new("index").get(first).get(second).post(Program::function(
            Vec::<String>::new(),
            |_args: Arguments| async { Ok::<_, HandlerError>(()) },
        ));

        let methods: Vec<_> = unit.programs().map(|(method, _)| method).collect();
        assert_eq!(methods, vec![Method::Get, Method::Post]);
    }
}
