//! HTTP dispatch for one matched route.
//!
//! # Responsibilities
//! - Read only the request sources the route's parameter roles need
//! - Bind arguments, build the per-request instance, run the program
//! - Turn the program output into a response, rendering the template when
//!   one is attached
//!
//! # Design Decisions
//! - Query values win over body values; an empty query value falls through
//! - The body is buffered only for query-or-post parameters
//! - Urlencoded and multipart bodies are decoded; any other content type
//!   binds nothing
//! - Handler and template failures become 500s and are logged here
//! - Templates render on the blocking pool; lookups touch the filesystem

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::RawPathParamsRejection,
        FromRequest, FromRequestParts, Multipart, RawPathParams,
    },
    http::{header::CONTENT_TYPE, request::Parts, Request, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::handler::HandlerError;
use crate::http::request::{decode_form, RequestContext};
use crate::routing::{Arguments, Invocation, Output, ParamRole, Route};
use crate::templates::{Renderer, TemplateError};

/// Request-time failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("program for {route} failed: {source}")]
    Handler {
        route: String,
        #[source]
        source: HandlerError,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("render task failed: {0}")]
    RenderTask(#[from] tokio::task::JoinError),

    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("failed to read path parameters: {0}")]
    PathParams(#[from] RawPathParamsRejection),

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("malformed multipart body: {0}")]
    MultipartHeader(#[from] MultipartRejection),
}

impl DispatchError {
    fn status(&self) -> StatusCode {
        match self {
            DispatchError::Body(_) | DispatchError::Multipart(_) | DispatchError::MultipartHeader(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }
        let body = status.canonical_reason().unwrap_or("Error");
        (status, body).into_response()
    }
}

/// Runs matched routes.
#[derive(Clone)]
pub struct HttpDispatcher {
    renderer: Arc<dyn Renderer>,
    max_body_bytes: usize,
}

impl HttpDispatcher {
    pub fn new(renderer: Arc<dyn Renderer>, max_body_bytes: usize) -> Self {
        Self {
            renderer,
            max_body_bytes,
        }
    }

    pub async fn dispatch(&self, route: &Route, request: Request<Body>) -> Result<Response, DispatchError> {
        let output = match route.program() {
            Some(program) => {
                let invocation = self.bind(route, request).await?;
                program
                    .invoke(invocation)
                    .await
                    .map_err(|source| DispatchError::Handler {
                        route: format!("{} {}", route.method(), route.path()),
                        source,
                    })?
            }
            None => Output::Empty,
        };

        let body = match (output, route.template()) {
            (Output::Html(html), _) => html,
            (Output::Context(variables), Some(template)) => self.render(template, variables).await?,
            (Output::Empty, Some(template)) => self.render(template, Map::new()).await?,
            (_, None) => String::new(),
        };

        Ok(Html(body).into_response())
    }

    async fn render(&self, template: &str, variables: Map<String, Value>) -> Result<String, DispatchError> {
        let renderer = self.renderer.clone();
        let name = template.to_string();
        let html = tokio::task::spawn_blocking(move || renderer.render(&name, &variables)).await??;
        Ok(html)
    }

    /// Collect argument values for the route's program.
    async fn bind(&self, route: &Route, request: Request<Body>) -> Result<Invocation, DispatchError> {
        let roles = route.bindings().roles();
        let (mut parts, body) = request.into_parts();

        let path_params = if roles.contains(ParamRole::DynamicPath) {
            let raw = RawPathParams::from_request_parts(&mut parts, &()).await?;
            raw.iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect()
        } else {
            HashMap::new()
        };

        let query = if roles.needs_query() {
            decode_form(parts.uri.query().unwrap_or_default().as_bytes())
        } else {
            HashMap::new()
        };

        let form = if roles.contains(ParamRole::QueryOrPost) {
            self.read_form(&parts, body).await?
        } else {
            HashMap::new()
        };

        let context = Arc::new(RequestContext::from_parts(&parts, path_params));
        let mut arguments = Arguments::new();

        for (name, role) in route.bindings().iter() {
            let value = match role {
                ParamRole::Instance => None,
                ParamRole::Request => {
                    arguments.set_request(context.clone());
                    None
                }
                ParamRole::DynamicPath => context.path_param(name),
                ParamRole::Query => query.get(name).map(String::as_str),
                ParamRole::QueryOrPost => query
                    .get(name)
                    .filter(|value| !value.is_empty())
                    .or_else(|| form.get(name))
                    .map(String::as_str),
            };
            if let Some(value) = value {
                arguments.insert(name, value);
            }
        }

        let instance = route
            .program()
            .and_then(|program| program.instantiate(context.clone()));

        Ok(Invocation { instance, arguments })
    }

    /// Decode a form body according to its content type.
    async fn read_form(&self, parts: &Parts, body: Body) -> Result<HashMap<String, String>, DispatchError> {
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let mime = content_type.split(';').next().unwrap_or_default().trim();

        let is_urlencoded = mime.eq_ignore_ascii_case("application/x-www-form-urlencoded");
        let is_multipart = mime.eq_ignore_ascii_case("multipart/form-data");
        if !is_urlencoded && !is_multipart {
            tracing::debug!(content_type = %content_type, "Body is not a form, ignoring it");
            return Ok(HashMap::new());
        }

        let bytes = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(DispatchError::Body)?;
        if is_urlencoded {
            return Ok(decode_form(&bytes));
        }

        let mut request = Request::new(Body::from(bytes));
        *request.headers_mut() = parts.headers.clone();
        let mut multipart = Multipart::from_request(request, &()).await?;

        let mut values = HashMap::new();
        while let Some(field) = multipart.next_field().await? {
            // Uploaded files are not form values.
            if field.file_name().is_some() {
                continue;
            }
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let value = field.text().await?;
            values.entry(name).or_insert(value);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Method, PageInstance, Program, ProgramUnit, RouteTable, RouteTableBuilder};
    use std::path::Path;

    /// Echoes the template name and its variables.
    struct EchoRenderer;

    impl Renderer for EchoRenderer {
        fn render(&self, name: &str, variables: &Map<String, Value>) -> Result<String, TemplateError> {
            if name.starts_with("missing") {
                return Err(TemplateError::NotFound(name.to_string()));
            }
            Ok(format!("{name}:{}", Value::Object(variables.clone())))
        }
    }

    #[derive(Default)]
    struct Greeter {
        agent: Option<String>,
    }

    impl PageInstance for Greeter {
        fn set_request(&mut self, request: Arc<RequestContext>) {
            self.agent = request
                .headers()
                .get("user-agent")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
        }
    }

    fn table() -> RouteTable {
        let mut builder = RouteTableBuilder::new("_");
        builder
            .add_unit(
                ProgramUnit::new("greet")
                    .post(Program::function(["name"], |args: Arguments| async move {
                        Ok::<_, HandlerError>(format!("hello {}", args.get("name").unwrap_or("nobody")))
                    }))
                    .get(Program::method::<Greeter, _, _, _, _, _>(
                        ["self"],
                        |greeter: Greeter, _args: Arguments| async move {
                            Ok::<_, HandlerError>(greeter.agent.unwrap_or_default())
                        },
                    )),
            )
            .unwrap();
        builder
            .add_unit(ProgramUnit::new("about").get(Program::function(
                ["tab"],
                |args: Arguments| async move {
                    let mut vars = Map::new();
                    vars.insert("tab".into(), Value::from(args.get("tab").unwrap_or("none")));
                    Ok::<_, HandlerError>(vars)
                },
            )))
            .unwrap();
        builder
            .add_unit(ProgramUnit::new("fail").get(Program::function(
                Vec::<String>::new(),
                |_args: Arguments| async { Err::<(), _>(HandlerError::msg("nope")) },
            )))
            .unwrap();
        builder
            .add_unit(ProgramUnit::new("silent").get(Program::function(
                Vec::<String>::new(),
                |_args: Arguments| async { Ok::<_, HandlerError>(()) },
            )))
            .unwrap();
        builder.add_page(Path::new("about.html")).unwrap();
        builder.add_page(Path::new("static.html")).unwrap();
        builder.add_page(Path::new("missing.html")).unwrap();
        builder.build().unwrap()
    }

    async fn call(method: Method, uri: &str, body: &str) -> (StatusCode, String) {
        call_with(method, uri, Some("application/x-www-form-urlencoded"), body).await
    }

    async fn call_with(method: Method, uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, String) {
        let table = table();
        let path = uri.split('?').next().unwrap_or_default();
        let route = table.get(method, path).unwrap();
        let mut request = Request::builder()
            .method(method.as_str())
            .uri(uri)
            .header("user-agent", "tests");
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        let request = request.body(Body::from(body.to_string())).unwrap();

        let dispatcher = HttpDispatcher::new(Arc::new(EchoRenderer), 1024);
        let response = match dispatcher.dispatch(route, request).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        };
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_query_takes_precedence_over_post() {
        assert_eq!(call(Method::Post, "/greet", "name=alice").await.1, "hello alice");
        assert_eq!(call(Method::Post, "/greet?name=bob", "name=alice").await.1, "hello bob");
        assert_eq!(call(Method::Post, "/greet?name=", "name=alice").await.1, "hello alice");
        assert_eq!(call(Method::Post, "/greet", "").await.1, "hello nobody");
    }

    #[tokio::test]
    async fn test_context_is_rendered_into_template() {
        let (status, body) = call(Method::Get, "/about?tab=team", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"about.html:{"tab":"team"}"#);
    }

    #[tokio::test]
    async fn test_template_only_route_renders_without_variables() {
        assert_eq!(call(Method::Get, "/static", "").await.1, "static.html:{}");
        assert_eq!(call(Method::Post, "/static", "").await.1, "static.html:{}");
    }

    #[tokio::test]
    async fn test_instance_sees_request() {
        assert_eq!(call(Method::Get, "/greet", "").await.1, "tests");
    }

    #[tokio::test]
    async fn test_failures_are_server_errors() {
        assert_eq!(call(Method::Get, "/fail", "").await.0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(call(Method::Get, "/missing", "").await.0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_empty_result_without_template() {
        let (status, body) = call(Method::Get, "/silent", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let body = format!("name={}", "x".repeat(2048));
        assert_eq!(call(Method::Post, "/greet", &body).await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_form_bodies_bind_nothing() {
        let json = Some("application/json");
        assert_eq!(call_with(Method::Post, "/greet", json, r#"{"name":"x"}"#).await.1, "hello nobody");
        assert_eq!(call_with(Method::Post, "/greet", None, "name=alice").await.1, "hello nobody");
        assert_eq!(call_with(Method::Post, "/greet?name=bob", json, "{}").await.1, "hello bob");
    }

    #[tokio::test]
    async fn test_urlencoded_with_charset() {
        let content_type = Some("application/x-www-form-urlencoded; charset=UTF-8");
        assert_eq!(call_with(Method::Post, "/greet", content_type, "name=alice").await.1, "hello alice");
    }

    #[tokio::test]
    async fn test_multipart_text_fields_are_bound() {
        let body = "--XYZ\r\n\
                    Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\r\n\
                    file contents\r\n\
                    --XYZ\r\n\
                    Content-Disposition: form-data; name=\"name\"\r\n\r\n\
                    carol\r\n\
                    --XYZ--\r\n";
        let content_type = Some("multipart/form-data; boundary=XYZ");
        assert_eq!(call_with(Method::Post, "/greet", content_type, body).await.1, "hello carol");
    }

    #[tokio::test]
    async fn test_malformed_multipart_is_rejected() {
        let content_type = Some("multipart/form-data");
        let (status, _) = call_with(Method::Post, "/greet", content_type, "garbage").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
