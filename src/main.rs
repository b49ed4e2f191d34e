use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::State, routing::post};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use merge_pilot::engine::MergeEngine;
use merge_pilot::llm::{
    CompletionProvider, ConflictResolver, DisabledProvider, HostedCompletionProvider,
};
use merge_pilot::policy::PolicyGate;
use merge_pilot::resolve::{HttpAstService, StructuralResolver};
use merge_pilot::verify::{ShellRunner, Verifier};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merge_pilot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let engine = Arc::new(build_engine());

    let app = Router::new()
        .route("/webhook", post(webhook_handler))
        .with_state(engine);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Assembles the merge engine from environment configuration.
///
/// `AST_SERVICE_URL` enables the structural delegate; `LLM_BASE_URL`,
/// `LLM_API_KEY`, and `LLM_MODEL` together enable the hosted completion
/// provider. Anything unset degrades to local heuristics / the disabled
/// provider rather than failing startup.
fn build_engine() -> MergeEngine {
    let resolver = match std::env::var("AST_SERVICE_URL") {
        Ok(url) => match HttpAstService::new(url) {
            Ok(service) => StructuralResolver::with_delegate(Arc::new(service)),
            Err(error) => {
                tracing::warn!(%error, "ast service client unavailable, using local heuristics");
                StructuralResolver::new()
            }
        },
        Err(_) => StructuralResolver::new(),
    };

    let provider: Arc<dyn CompletionProvider> = match (
        std::env::var("LLM_BASE_URL"),
        std::env::var("LLM_API_KEY"),
        std::env::var("LLM_MODEL"),
    ) {
        (Ok(base_url), Ok(api_key), Ok(model)) => {
            match HostedCompletionProvider::new(base_url, api_key, model) {
                Ok(hosted) => Arc::new(hosted),
                Err(error) => {
                    tracing::warn!(%error, "hosted provider unavailable, llm fallback disabled");
                    Arc::new(DisabledProvider)
                }
            }
        }
        _ => Arc::new(DisabledProvider),
    };

    MergeEngine::new(
        PolicyGate::new(),
        Arc::new(resolver),
        Arc::new(ConflictResolver::new(provider)),
        Verifier::new(Arc::new(ShellRunner)),
    )
}

/// Accepts webhook deliveries. Queue workers drive the merge pipeline via
/// the shared [`MergeEngine`]; the HTTP surface only acknowledges receipt.
async fn webhook_handler(State(_engine): State<Arc<MergeEngine>>) -> &'static str {
    "OK"
}
