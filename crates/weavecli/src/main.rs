use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use weavecore::{ExecutionEvent, ExecutionScope, Graph, Node, NodeType};
use weaveengine::{validate, EngineConfig, ExecutorRegistry, MemoryRunStore, WorkflowEngine};
use weavenodes::GeminiClient;

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "Weave workflow engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    Full,
    Partial,
    Single,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a graph file
    Run {
        /// Path to graph JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Execution scope
        #[arg(short, long, value_enum, default_value_t = ScopeArg::Full)]
        scope: ScopeArg,

        /// Node ids for partial/single scope (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        nodes: Vec<String>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a graph file
    Validate {
        /// Path to graph JSON file
        file: PathBuf,
    },

    /// List available node types
    Nodes,

    /// Create a new example graph
    Init {
        /// Output file path
        #[arg(short, long, default_value = "graph.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            scope,
            nodes,
            verbose,
        } => {
            let level = if verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::WARN
            };
            tracing_subscriber::fmt().with_max_level(level).init();

            run_graph(file, scope, nodes).await?;
        }

        Commands::Validate { file } => {
            validate_graph(file)?;
        }

        Commands::Nodes => {
            list_nodes();
        }

        Commands::Init { output } => {
            create_example_graph(output)?;
        }
    }

    Ok(())
}

fn build_scope(scope: ScopeArg, mut nodes: Vec<String>) -> Result<ExecutionScope> {
    match scope {
        ScopeArg::Full => Ok(ExecutionScope::Full),
        ScopeArg::Partial => {
            if nodes.is_empty() {
                anyhow::bail!("partial scope requires --nodes");
            }
            Ok(ExecutionScope::Partial { node_ids: nodes })
        }
        ScopeArg::Single => {
            if nodes.len() != 1 {
                anyhow::bail!("single scope requires exactly one --nodes id");
            }
            Ok(ExecutionScope::Single {
                node_id: nodes.remove(0),
            })
        }
    }
}

fn build_engine() -> WorkflowEngine {
    let api_key = std::env::var("GOOGLE_AI_API_KEY").unwrap_or_default();
    let mut registry = ExecutorRegistry::new();
    weavenodes::register_all(&mut registry, Arc::new(GeminiClient::new(api_key)));

    WorkflowEngine::new(
        Arc::new(registry),
        Arc::new(MemoryRunStore::new()),
        EngineConfig::default(),
    )
}

async fn run_graph(file: PathBuf, scope: ScopeArg, nodes: Vec<String>) -> Result<()> {
    println!("Loading graph from: {}", file.display());

    let graph_json = std::fs::read_to_string(&file)?;
    let graph: Graph = serde_json::from_str(&graph_json)?;

    println!(
        "Graph: {} nodes, {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );
    println!();

    let scope = build_scope(scope, nodes)?;
    let engine = build_engine();

    let mut events = engine.subscribe_events();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::RunStarted { run_id, scope, .. } => {
                    println!("Run {} started ({})", run_id, scope);
                }
                ExecutionEvent::NodeStarted {
                    node_id, node_type, ..
                } => {
                    println!("  > {} ({})", node_id, node_type);
                }
                ExecutionEvent::NodeCompleted {
                    node_id,
                    duration_ms,
                    ..
                } => {
                    println!("  ok {} ({}ms)", node_id, duration_ms);
                }
                ExecutionEvent::NodeFailed { node_id, error, .. } => {
                    println!("  FAILED {}: {}", node_id, error);
                }
                ExecutionEvent::RunCompleted {
                    status,
                    duration_ms,
                    ..
                } => {
                    println!("Run finished: {:?} in {}ms", status, duration_ms);
                }
            }
        }
    });

    let report = engine.execute(&graph, &scope).await?;

    // Let the listener drain before printing the summary
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    println!();
    println!("Run: {}", report.run_id);
    println!("Status: {:?}", report.status);
    for result in &report.results {
        match &result.error {
            Some(error) => println!("  {} FAILED: {}", result.node_id, error),
            None => {
                let output = result
                    .output
                    .as_ref()
                    .and_then(|v| v.as_text())
                    .unwrap_or("(non-text output)");
                println!("  {} -> {}", result.node_id, output);
            }
        }
    }

    Ok(())
}

fn validate_graph(file: PathBuf) -> Result<()> {
    println!("Validating graph: {}", file.display());

    let graph_json = std::fs::read_to_string(&file)?;
    let graph: Graph = serde_json::from_str(&graph_json)?;

    validate(&graph, None)?;

    println!("Graph is valid:");
    println!("  Nodes: {}", graph.nodes.len());
    println!("  Edges: {}", graph.edges.len());

    Ok(())
}

fn list_nodes() {
    println!("Available node types:");

    let engine = build_engine();
    let mut types: Vec<_> = engine
        .registry()
        .registered_types()
        .iter()
        .map(|t| t.to_string())
        .collect();
    types.sort();

    for node_type in types {
        println!("  - {}", node_type);
    }
}

fn create_example_graph(output: PathBuf) -> Result<()> {
    let mut graph = Graph::new();

    let prompt = graph.add_node(
        Node::new("prompt-1", NodeType::Text).with_data("text", "Describe this image briefly."),
    );
    let image = graph.add_node(
        Node::new("image-1", NodeType::UploadImage)
            .with_data("image_url", "https://example.com/cat.jpg"),
    );
    let llm = graph.add_node(Node::new("llm-1", NodeType::Llm));

    graph.connect(prompt, llm.clone(), "user_message");
    graph.connect(image, llm, "images");

    let json = serde_json::to_string_pretty(&graph)?;
    std::fs::write(&output, json)?;

    println!("Created example graph: {}", output.display());
    println!();
    println!("Run it with:");
    println!("  weave run --file {}", output.display());

    Ok(())
}
