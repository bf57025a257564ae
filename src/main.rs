/// hpa-console command line
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hpa_console::api::ConsoleApiClient;
use hpa_console::config::{BackendKind, ConsoleConfig, TOKEN_ENV_VAR};
use hpa_console::k8s::KubernetesClient;
use hpa_console::tabs::{ClusterTabManager, ContextSwitcher, EventBus, LogNotifier, SwitchState};
use hpa_console::utils::PollingConfig;
use hpa_console::validation::{
    format_validation_errors, validate_cpu, validate_hpa_update, validate_memory,
    validate_node_pool, HpaUpdate, ValidationError, ValidationResult,
};

#[derive(Parser)]
#[command(name = "hpa-console")]
#[command(about = "Validate HPA edits and switch Kubernetes cluster contexts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "hpa-console.yaml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate example configuration file
    Init,

    /// List clusters available to the configured backend
    Clusters,

    /// Validate a CPU quantity (e.g. 500m, 2)
    ValidateCpu { value: String },

    /// Validate a memory quantity (e.g. 512Mi, 2Gi)
    ValidateMemory { value: String },

    /// Validate an HPA update
    ValidateHpa {
        #[arg(long, allow_negative_numbers = true)]
        min_replicas: Option<i32>,

        #[arg(long, allow_negative_numbers = true)]
        max_replicas: Option<i32>,

        /// Target CPU utilization (%)
        #[arg(long, allow_negative_numbers = true)]
        target_cpu: Option<i32>,

        /// Target memory utilization (%)
        #[arg(long, allow_negative_numbers = true)]
        target_memory: Option<i32>,

        #[arg(long)]
        cpu_request: Option<String>,

        #[arg(long)]
        cpu_limit: Option<String>,

        #[arg(long)]
        memory_request: Option<String>,

        #[arg(long)]
        memory_limit: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate node pool sizing
    ValidateNodePool {
        #[arg(long, allow_negative_numbers = true)]
        node_count: Option<i32>,

        #[arg(long, allow_negative_numbers = true)]
        min_count: Option<i32>,

        #[arg(long, allow_negative_numbers = true)]
        max_count: Option<i32>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Switch the active cluster context
    Switch {
        /// Cluster context to activate
        cluster: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hpa_console={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Init => init_config(&cli).await,
        Commands::Clusters => list_clusters(&cli).await,
        Commands::ValidateCpu { ref value } => report_single(validate_cpu(value)),
        Commands::ValidateMemory { ref value } => report_single(validate_memory(value)),
        Commands::ValidateHpa {
            min_replicas,
            max_replicas,
            target_cpu,
            target_memory,
            ref cpu_request,
            ref cpu_limit,
            ref memory_request,
            ref memory_limit,
            json,
        } => {
            let update = HpaUpdate {
                min_replicas,
                max_replicas,
                target_cpu,
                target_memory,
                cpu_request: cpu_request.clone(),
                memory_request: memory_request.clone(),
                cpu_limit: cpu_limit.clone(),
                memory_limit: memory_limit.clone(),
            };
            report(&validate_hpa_update(&update), json)
        }
        Commands::ValidateNodePool {
            node_count,
            min_count,
            max_count,
            json,
        } => report(&validate_node_pool(node_count, min_count, max_count), json),
        Commands::Switch { ref cluster } => switch_cluster(&cli, cluster).await,
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Context switching backend selected by configuration
enum Backend {
    Api(ConsoleApiClient),
    Kubectl(KubernetesClient),
}

impl Backend {
    fn from_config(config: &ConsoleConfig) -> Result<Self> {
        match config.backend {
            BackendKind::Api => {
                let token = config.api_token();
                if token.is_none() {
                    info!(
                        "No API token configured (set {} to authenticate)",
                        TOKEN_ENV_VAR
                    );
                }
                let client = ConsoleApiClient::new(
                    &config.api.base_url,
                    token.as_deref(),
                    config.api.timeout(),
                )?;
                Ok(Self::Api(client))
            }
            BackendKind::Kubectl => Ok(Self::Kubectl(KubernetesClient::new(
                config.kubectl.kubeconfig.clone(),
            ))),
        }
    }

    /// Cluster context identifiers, in backend order
    async fn cluster_contexts(&self) -> Result<Vec<String>> {
        match self {
            Self::Api(client) => Ok(client
                .list_clusters()
                .await?
                .into_iter()
                .map(|cluster| cluster.context)
                .collect()),
            Self::Kubectl(client) => {
                client.check_kubectl_installed().await?;
                client.list_contexts().await
            }
        }
    }

    fn switcher(&self) -> Arc<dyn ContextSwitcher> {
        match self {
            Self::Api(client) => Arc::new(client.clone()),
            Self::Kubectl(client) => Arc::new(client.clone()),
        }
    }
}

/// Load configuration, falling back to defaults when the file is absent
fn load_config(cli: &Cli) -> Result<ConsoleConfig> {
    if !cli.config.exists() {
        info!(
            "Configuration file {} not found, using defaults",
            cli.config.display()
        );
        return Ok(ConsoleConfig::example());
    }
    ConsoleConfig::from_file(&cli.config).context("Failed to load configuration")
}

/// Initialize example configuration file
async fn init_config(cli: &Cli) -> Result<()> {
    if cli.config.exists() {
        anyhow::bail!(
            "Configuration file already exists: {}",
            cli.config.display()
        );
    }

    let example_config = ConsoleConfig::example();
    let yaml = serde_yaml::to_string(&example_config)?;

    tokio::fs::write(&cli.config, yaml)
        .await
        .context("Failed to write configuration file")?;

    info!("Example configuration created: {}", cli.config.display());
    info!("");
    info!("Next steps:");
    info!("  1. Point api.base_url at your console backend (or set backend: kubectl)");
    info!("  2. Set your API token:");
    info!("     export {}=your-token-here", TOKEN_ENV_VAR);
    info!("  3. List clusters:");
    info!("     hpa-console clusters");

    Ok(())
}

/// List clusters from the configured backend
async fn list_clusters(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    match Backend::from_config(&config)? {
        Backend::Api(client) => {
            let clusters = client
                .list_clusters()
                .await
                .context("Failed to list clusters")?;
            if clusters.is_empty() {
                info!("No clusters found");
                return Ok(());
            }
            info!("Clusters:");
            for cluster in clusters {
                let marker = if cluster.is_online() { "✓" } else { "✗" };
                info!(
                    "  {} {} (context: {}, status: {})",
                    marker, cluster.name, cluster.context, cluster.status
                );
            }
        }
        Backend::Kubectl(client) => {
            client.check_kubectl_installed().await?;
            let contexts = client.list_contexts().await?;
            if contexts.is_empty() {
                info!("No kubeconfig contexts found");
                return Ok(());
            }
            info!("Contexts:");
            for context in contexts {
                info!("  - {}", context);
            }
        }
    }

    Ok(())
}

/// Switch the active cluster context through a cluster tab
async fn switch_cluster(cli: &Cli, target: &str) -> Result<()> {
    let config = load_config(cli)?;
    let backend = Backend::from_config(&config)?;

    let clusters = backend
        .cluster_contexts()
        .await
        .context("Failed to list clusters")?;
    if !clusters.iter().any(|c| c == target) {
        anyhow::bail!(
            "Unknown cluster: {} (available: {})",
            target,
            clusters.join(", ")
        );
    }

    let bus = Arc::new(EventBus::new(16));
    let mut events = bus.subscribe();
    let options = config.tabs.manager_options();
    let settle_timeout = config.api.timeout() + options.debounce + Duration::from_secs(1);

    let manager = ClusterTabManager::new(
        clusters,
        backend.switcher(),
        bus.clone(),
        Arc::new(LogNotifier),
        options,
    );
    let tab_id = manager
        .active_tab_id()
        .context("No cluster tab available")?;

    if manager.active_cluster() != target {
        manager.change_tab_cluster(&tab_id, target);
    } else if !config.tabs.auto_switch_first_tab {
        manager.switch_to_tab_context(&tab_id, true);
    }

    PollingConfig::new(
        settle_timeout,
        Duration::from_millis(50),
        format!("Switching context to {}", target),
    )
    .poll_until(|| {
        let settled = manager.switch_state() == SwitchState::Idle;
        async move { Ok(settled) }
    })
    .await?;

    while let Ok(published) = events.try_recv() {
        let line = format!(
            "[{}] {}",
            published.at.format("%H:%M:%S%.3f"),
            serde_json::to_string(&published.event)?
        );
        // Auto-switch of the first tab may report another cluster first
        if published.event.cluster() == target {
            info!("{}", line);
        } else {
            debug!("{}", line);
        }
    }

    match manager.last_confirmed_cluster() {
        Some(confirmed) if confirmed == target => {
            info!("Active context: {} ({})", confirmed, tab_id);
            Ok(())
        }
        _ => anyhow::bail!("Context switch to {} failed", target),
    }
}

/// Report a single-field check
fn report_single(error: Option<ValidationError>) -> Result<()> {
    let mut result = ValidationResult::new();
    if let Some(error) = error {
        result.push(error);
    }
    report(&result, false)
}

/// Print a validation result; invalid input is an error
fn report(result: &ValidationResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if result.valid {
        info!("✓ Valid");
    } else {
        println!("{}", format_validation_errors(&result.errors));
    }

    if !result.valid {
        anyhow::bail!("Validation failed with {} error(s)", result.errors.len());
    }
    Ok(())
}
