//! API Handlers
use crate::form::SubmitForm;
use crate::AppState;
use axum::{
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use breach_core::{PipelineTokens, VariantKind};
use breach_out::PageModel;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct RenderParams {
    #[serde(rename = "dataToken")]
    pub data_token: Option<String>,
    #[serde(rename = "breachToken")]
    pub breach_token: Option<String>,
}

/// GET / - consumes whichever tokens are given and renders the page.
pub async fn index(State(state): State<AppState>, Query(params): Query<RenderParams>) -> Response {
    let data_token = params.data_token.as_deref().filter(|t| !t.is_empty());
    let solve_token = params.breach_token.as_deref().filter(|t| !t.is_empty());

    let page = state.views.assemble(data_token, solve_token);

    if data_token.is_some() {
        state
            .metrics
            .record_lookup(VariantKind::Extract, page.extract.is_some());
    }
    if solve_token.is_some() {
        state
            .metrics
            .record_lookup(VariantKind::Solve, page.solve.is_some());
    }

    render_page(&state, &page, StatusCode::OK)
}

/// POST / - runs the pipeline and redirects to the render of its tokens.
pub async fn submit(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match SubmitForm::from_multipart(multipart).await {
        Ok(form) => form,
        Err(err) => {
            warn!(error = %err, "unreadable submit body");
            return (err.status(), err.body_text()).into_response();
        }
    };

    let request = match form.into_request() {
        Ok(request) => request,
        Err(notice) => {
            info!(%notice, "submit rejected");
            return render_page(
                &state,
                &PageModel::with_notice(notice),
                StatusCode::UNPROCESSABLE_ENTITY,
            );
        }
    };

    match state.orchestrator.run(&request).await {
        Ok(tokens) => {
            state.metrics.record_stored(&tokens);
            Redirect::to(&render_location(&tokens)).into_response()
        }
        Err(err) => {
            error!(trace_id = %request.trace_id, error = %err, "pipeline failed");
            state.metrics.record_backend_failure(&err);
            Redirect::to("/").into_response()
        }
    }
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })),
    )
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode(state.store.len()) {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `/` plus a query naming whichever tokens were produced.
pub fn render_location(tokens: &PipelineTokens) -> String {
    let mut query = Vec::new();
    if let Some(token) = &tokens.data_token {
        query.push(format!("dataToken={}", token));
    }
    if let Some(token) = &tokens.solve_token {
        query.push(format!("breachToken={}", token));
    }

    if query.is_empty() {
        "/".to_string()
    } else {
        format!("/?{}", query.join("&"))
    }
}

fn render_page(state: &AppState, page: &PageModel, status: StatusCode) -> Response {
    match state.pages.render_index(page) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            error!(error = %err, "page render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "page could not be rendered").into_response()
        }
    }
}
