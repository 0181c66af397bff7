use actix_cors::Cors;
use actix_web::{
    get, post, web, App, HttpResponse, HttpServer, Responder, Result as ActixResult,
};
use actix_ws::Message;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
use weavecore::{Edge, EngineError, ExecutionScope, Graph, Node, NodeId, ScopeKind};
use weaveengine::{EngineConfig, ExecutorRegistry, MemoryRunStore, WorkflowEngine};
use weavenodes::GeminiClient;

/// Application state shared across handlers
struct AppState {
    engine: Arc<WorkflowEngine>,
    store: Arc<MemoryRunStore>,
}

/// Submission body for workflow execution
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteRequest {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    scope: ScopeKind,
    #[serde(default)]
    node_ids: Option<Vec<NodeId>>,
}

/// Error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn resolve_scope(kind: ScopeKind, node_ids: Option<Vec<NodeId>>) -> Result<ExecutionScope, String> {
    match kind {
        ScopeKind::Full => Ok(ExecutionScope::Full),
        ScopeKind::Partial => {
            let node_ids = node_ids.unwrap_or_default();
            if node_ids.is_empty() {
                return Err("PARTIAL scope requires nodeIds".to_string());
            }
            Ok(ExecutionScope::Partial { node_ids })
        }
        ScopeKind::Single => {
            let mut node_ids = node_ids.unwrap_or_default();
            if node_ids.len() != 1 {
                return Err("SINGLE scope requires exactly one node id".to_string());
            }
            Ok(ExecutionScope::Single {
                node_id: node_ids.remove(0),
            })
        }
    }
}

/// Health check endpoint
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "weaveserver"
    }))
}

/// Execute a submitted graph
#[post("/api/workflows/execute")]
async fn execute_workflow(
    data: web::Data<AppState>,
    req: web::Json<ExecuteRequest>,
) -> ActixResult<impl Responder> {
    let req = req.into_inner();
    let graph = Graph {
        nodes: req.nodes,
        edges: req.edges,
    };

    let scope = match resolve_scope(req.scope, req.node_ids) {
        Ok(scope) => scope,
        Err(message) => {
            return Ok(HttpResponse::BadRequest().json(ErrorResponse { error: message }))
        }
    };

    info!(scope = %scope.kind(), nodes = graph.nodes.len(), "executing workflow");

    match data.engine.execute(&graph, &scope).await {
        Ok(report) => {
            info!(run_id = %report.run_id, status = ?report.status, "workflow finished");
            Ok(HttpResponse::Ok().json(report))
        }
        Err(EngineError::Validation(e)) => {
            Ok(HttpResponse::BadRequest().json(ErrorResponse {
                error: e.to_string(),
            }))
        }
        Err(e) => {
            error!("workflow execution failed: {}", e);
            Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
            }))
        }
    }
}

/// List registered node types
#[get("/api/nodes")]
async fn list_node_types(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    let mut types: Vec<_> = data
        .engine
        .registry()
        .registered_types()
        .iter()
        .map(|t| t.to_string())
        .collect();
    types.sort();
    Ok(HttpResponse::Ok().json(types))
}

/// List runs, most recent first
#[get("/api/runs")]
async fn list_runs(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    Ok(HttpResponse::Ok().json(data.store.list_runs().await))
}

/// Fetch one run with its node results
#[get("/api/runs/{id}")]
async fn get_run(data: web::Data<AppState>, path: web::Path<Uuid>) -> ActixResult<impl Responder> {
    let run_id = path.into_inner();
    match data.store.get_run(run_id).await {
        Some(run) => {
            let results = data.store.node_results(run_id).await;
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "run": run,
                "results": results,
            })))
        }
        None => Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("run {run_id} not found"),
        })),
    }
}

/// WebSocket endpoint for real-time execution events
#[get("/api/events")]
async fn websocket_events(
    req: actix_web::HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (res, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    info!("WebSocket client connected");

    let mut events = data.engine.subscribe_events();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Ok(event) => {
                            if let Ok(json) = serde_json::to_string(&event) {
                                if session.text(json).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Err(_) => break,
                    }
                }

                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }

                else => break,
            }
        }

        info!("WebSocket client disconnected");
        let _ = session.close(None).await;
    });

    Ok(res)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("starting weave server");

    let api_key = std::env::var("GOOGLE_AI_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("GOOGLE_AI_API_KEY not set; llm nodes will fail against the provider");
    }

    let mut registry = ExecutorRegistry::new();
    weavenodes::register_all(&mut registry, Arc::new(GeminiClient::new(api_key)));

    let store = Arc::new(MemoryRunStore::new());
    let engine = Arc::new(WorkflowEngine::new(
        Arc::new(registry),
        store.clone(),
        EngineConfig::default(),
    ));

    let app_state = web::Data::new(AppState { engine, store });

    let bind_address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    info!("server starting on http://{}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .service(health_check)
            .service(execute_workflow)
            .service(list_node_types)
            .service(list_runs)
            .service(get_run)
            .service(websocket_events)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
