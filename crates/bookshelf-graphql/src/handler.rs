//! Axum HTTP handlers for the GraphQL endpoint.
//!
//! - `POST /graphql` - JSON body `{query, operationName?, variables?}`
//! - `GET /graphql` - query via URL params; without a query, serves
//!   GraphiQL when the playground is enabled
//!
//! Execution results are always returned with `200 OK`. Requests that cannot
//! be turned into a GraphQL request get `400` with the same error shape.

use async_graphql::dynamic::Schema;
use async_graphql::http::GraphiQLSource;
use async_graphql::{Request, Response, Variables};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse};
use bookshelf_storage::DynBookStore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{GraphQLConfig, ResolverOptions};
use crate::context::{GraphQLContext, GraphQLContextBuilder};
use crate::error::{DEFAULT_ERROR_CODE, GraphQLError};

/// Path the GraphQL endpoint is mounted on.
pub const GRAPHQL_PATH: &str = "/graphql";

/// State shared across GraphQL handlers.
#[derive(Clone)]
pub struct GraphQLState {
    /// The executable schema.
    pub schema: Schema,

    /// Shared dependencies cloned into each request's context.
    pub context_template: GraphQLContextTemplate,

    /// Serve GraphiQL on `GET` without a query.
    pub playground: bool,
}

impl GraphQLState {
    #[must_use]
    pub fn new(schema: Schema, store: DynBookStore, config: &GraphQLConfig) -> Self {
        Self {
            schema,
            context_template: GraphQLContextTemplate {
                store,
                options: config.resolver_options(),
            },
            playground: config.playground,
        }
    }
}

/// Template for building per-request GraphQL context.
#[derive(Clone)]
pub struct GraphQLContextTemplate {
    pub store: DynBookStore,
    pub options: ResolverOptions,
}

/// GraphQL request body.
#[derive(Debug, Deserialize)]
pub struct GraphQLRequest {
    /// The GraphQL query string.
    pub query: String,

    /// Optional operation name for multi-operation documents.
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,

    /// Optional variables for the query.
    pub variables: Option<serde_json::Value>,
}

/// Query parameters for GET requests.
#[derive(Debug, Default, Deserialize)]
pub struct GraphQLQueryParams {
    pub query: Option<String>,

    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,

    /// Variables as a JSON string.
    pub variables: Option<String>,
}

/// GraphQL response body.
#[derive(Debug, Serialize)]
pub struct GraphQLResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<serde_json::Value>,
}

impl From<Response> for GraphQLResponse {
    fn from(resp: Response) -> Self {
        let data_json = serde_json::to_value(&resp.data).unwrap_or(serde_json::Value::Null);
        // Errors with a path were raised during execution, which always
        // yields a `data` entry even when it nulled out to the root.
        let executed = resp.errors.iter().any(|e| !e.path.is_empty());
        let data = if data_json.is_null() && !executed {
            None
        } else {
            Some(data_json)
        };

        let errors = resp
            .errors
            .into_iter()
            .map(|e| {
                let code = e
                    .extensions
                    .as_ref()
                    .and_then(|ext| match ext.get("code") {
                        Some(async_graphql::Value::String(code)) => Some(code.clone()),
                        _ => None,
                    })
                    .unwrap_or_else(|| DEFAULT_ERROR_CODE.to_string());

                let mut error_obj = serde_json::json!({
                    "message": e.message,
                    "code": code,
                });

                if !e.path.is_empty() {
                    error_obj["path"] =
                        serde_json::to_value(&e.path).unwrap_or(serde_json::Value::Null);
                }
                if !e.locations.is_empty() {
                    error_obj["locations"] =
                        serde_json::to_value(&e.locations).unwrap_or(serde_json::Value::Null);
                }
                if let Some(ext) = &e.extensions {
                    error_obj["extensions"] =
                        serde_json::to_value(ext).unwrap_or(serde_json::Value::Null);
                }

                error_obj
            })
            .collect();

        Self { data, errors }
    }
}

/// Handles `POST /graphql`.
pub async fn graphql_handler(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    body: Result<Json<GraphQLRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection, "Rejected GraphQL request body");
            return error_response(GraphQLError::InvalidQuery(rejection.body_text()))
                .into_response();
        }
    };

    execute_graphql(state, headers, request).await.into_response()
}

/// Handles `GET /graphql`.
pub async fn graphql_handler_get(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    Query(params): Query<GraphQLQueryParams>,
) -> impl IntoResponse {
    let has_query = params.query.as_deref().is_some_and(|q| !q.trim().is_empty());

    if !has_query {
        if state.playground {
            return graphiql().into_response();
        }
        return error_response(GraphQLError::InvalidQuery("missing query".into()))
            .into_response();
    }

    let request = match params_to_request(params) {
        Ok(req) => req,
        Err(e) => {
            return error_response(GraphQLError::InvalidQuery(format!(
                "invalid variables: {e}"
            )))
            .into_response();
        }
    };

    execute_graphql(state, headers, request).await.into_response()
}

/// Serves the GraphiQL IDE pointed at [`GRAPHQL_PATH`].
fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}

/// Executes a GraphQL request.
async fn execute_graphql(
    state: GraphQLState,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> impl IntoResponse {
    // Set by the request-id middleware
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let context = match build_context(&state.context_template, request_id) {
        Ok(ctx) => ctx,
        Err(e) => {
            return error_response(GraphQLError::Internal(e.to_string())).into_response();
        }
    };

    let mut gql_request = Request::new(&request.query);

    if let Some(op_name) = request.operation_name {
        gql_request = gql_request.operation_name(op_name);
    }

    if let Some(vars) = request.variables {
        gql_request = gql_request.variables(Variables::from_json(vars));
    }

    gql_request = gql_request.data(context);

    debug!(query = %request.query, "Executing GraphQL query");
    let response = state.schema.execute(gql_request).await;

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(GraphQLResponse::from(response)),
    )
        .into_response()
}

fn build_context(
    template: &GraphQLContextTemplate,
    request_id: String,
) -> Result<GraphQLContext, crate::context::ContextBuilderError> {
    GraphQLContextBuilder::new()
        .with_store(template.store.clone())
        .with_options(template.options)
        .with_request_id(request_id)
        .build()
}

/// Converts GET query params to a GraphQL request.
fn params_to_request(params: GraphQLQueryParams) -> Result<GraphQLRequest, serde_json::Error> {
    let variables = match params.variables {
        Some(vars) if !vars.trim().is_empty() => Some(serde_json::from_str(&vars)?),
        _ => None,
    };

    Ok(GraphQLRequest {
        query: params.query.unwrap_or_default(),
        operation_name: params.operation_name,
        variables,
    })
}

/// Returns a transport-level error response.
fn error_response(error: GraphQLError) -> impl IntoResponse {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = serde_json::json!({
        "errors": [{
            "message": error.to_string(),
            "code": error.error_code(),
        }]
    });

    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_request_deserialize() {
        let json = r#"{
            "query": "query GetBooks { books { id } }",
            "operationName": "GetBooks",
            "variables": {"id": "1"}
        }"#;

        let request: GraphQLRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.query, "query GetBooks { books { id } }");
        assert_eq!(request.operation_name, Some("GetBooks".to_string()));
        assert!(request.variables.is_some());
    }

    #[test]
    fn test_graphql_request_requires_query() {
        let result: Result<GraphQLRequest, _> = serde_json::from_str(r#"{"variables": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_params_to_request() {
        let params = GraphQLQueryParams {
            query: Some("{ books { id } }".to_string()),
            operation_name: None,
            variables: Some(r#"{"id": "1"}"#.to_string()),
        };

        let request = params_to_request(params).unwrap();
        assert_eq!(request.query, "{ books { id } }");
        assert!(request.variables.is_some());
    }

    #[test]
    fn test_params_to_request_empty_variables() {
        let params = GraphQLQueryParams {
            query: Some("{ books { id } }".to_string()),
            variables: Some(String::new()),
            ..Default::default()
        };
        assert!(params_to_request(params).unwrap().variables.is_none());
    }

    #[test]
    fn test_params_to_request_invalid_variables() {
        let params = GraphQLQueryParams {
            query: Some("{ books { id } }".to_string()),
            variables: Some("not valid json".to_string()),
            ..Default::default()
        };
        assert!(params_to_request(params).is_err());
    }

    #[test]
    fn test_response_error_defaults_code() {
        let response = Response::from_errors(vec![async_graphql::ServerError::new("boom", None)]);

        let body = GraphQLResponse::from(response);
        assert!(body.data.is_none());
        assert_eq!(body.errors.len(), 1);
        assert_eq!(body.errors[0]["message"], "boom");
        assert_eq!(body.errors[0]["code"], DEFAULT_ERROR_CODE);
        assert!(body.errors[0].get("path").is_none());
    }

    #[test]
    fn test_execution_error_keeps_null_data() {
        let mut error = async_graphql::ServerError::new("Error fetching books: down", None);
        error.path = vec![async_graphql::PathSegment::Field("books".to_string())];
        let response = Response::from_errors(vec![error]);

        let body = serde_json::to_value(GraphQLResponse::from(response)).unwrap();
        assert_eq!(body["data"], serde_json::Value::Null);
        assert!(body.as_object().unwrap().contains_key("data"));
        assert_eq!(body["errors"][0]["path"], serde_json::json!(["books"]));
    }

    #[test]
    fn test_request_error_omits_data() {
        let response = Response::from_errors(vec![async_graphql::ServerError::new(
            "Unknown field \"nope\"",
            None,
        )]);

        let body = serde_json::to_value(GraphQLResponse::from(response)).unwrap();
        assert!(!body.as_object().unwrap().contains_key("data"));
    }
}
