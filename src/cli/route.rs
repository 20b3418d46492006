//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::browser::MemoryBrowser;
use crate::cli::command_name;
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{format_decoded, format_visit, VisitReport};
use crate::config::{BridgeConfig, ConfigLoader};
use crate::error::{ClientError, DecodeError};
use crate::navigation::{event_channel, AutoRefresh, ControllerBuilder, NavigationController};
use crate::response::Response;
use crate::transport::{HttpTransport, Transport};
use crate::unpack::{unpack, TypeRegistry, Value};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Runtime context for CLI execution: project root and the loaded configuration.
pub struct RunContext {
    project_root: PathBuf,
    config: BridgeConfig,
}

impl RunContext {
    /// Create run context from project root and optional config path. Uses ConfigLoader only.
    pub fn new(project_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ClientError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&project_root)?,
        };
        if let Err(errors) = config.validate() {
            let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Err(ClientError::ConfigError(joined.join("; ")));
        }
        Ok(Self {
            project_root,
            config,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ClientError> {
        let started = Instant::now();
        let name = command_name(command);
        debug!(command = name, project = %self.project_root.display(), "Executing command");
        let result = match command {
            Commands::Decode { file, format } => self.decode(file, *format),
            Commands::Visit {
                path,
                base_url,
                format,
            } => {
                let path = path
                    .clone()
                    .unwrap_or_else(|| self.config.navigation.initial_path.clone());
                self.visit(&path, base_url.as_deref(), *format)
            }
            Commands::Config => self.config.to_toml(),
        };
        info!(
            command = name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn decode(&self, file: &Path, format: OutputFormat) -> Result<String, ClientError> {
        let raw = std::fs::read_to_string(file)?;
        let document: JsonValue = serde_json::from_str(&raw).map_err(|e| {
            DecodeError::MalformedGraph(format!("{} is not valid JSON: {}", file.display(), e))
        })?;
        let registry = TypeRegistry::with_defaults();

        // A whole response decodes its render payloads; anything else is one packed value.
        let decoded = if document.get("action").is_some() {
            match serde_json::from_value::<Response>(document.clone()) {
                Ok(Response::Render(render)) => {
                    let mut out = BTreeMap::new();
                    out.insert("view".to_string(), Value::from(render.view));
                    out.insert("props".to_string(), unpack(&render.props, &registry)?);
                    out.insert("context".to_string(), unpack(&render.context, &registry)?);
                    Value::dict(out)
                }
                Ok(other) => {
                    debug!(action = other.action(), "Response carries no packed payload");
                    Value::from_literal(&document)
                }
                Err(_) => unpack(&document, &registry)?,
            }
        } else {
            unpack(&document, &registry)?
        };
        Ok(format_decoded(&decoded, format))
    }

    fn visit(
        &self,
        path: &str,
        base_url: Option<&str>,
        format: OutputFormat,
    ) -> Result<String, ClientError> {
        let mut transport_config = self.config.transport.clone();
        if let Some(base_url) = base_url {
            transport_config.base_url = base_url.to_string();
        }
        transport_config.validate().map_err(ClientError::ConfigError)?;

        let transport = Arc::new(HttpTransport::new(&transport_config)?);
        let browser = Arc::new(MemoryBrowser::new(transport.origin(), path));
        let registry = Arc::new(TypeRegistry::with_defaults());
        let settle_limit = Duration::from_millis(transport_config.request_timeout_ms);

        let rt = tokio::runtime::Runtime::new().map_err(|e| {
            ClientError::TransportSetup(format!("Failed to create async runtime: {}", e))
        })?;

        let (events, mut receiver) = event_channel();
        let frame = rt.block_on(async {
            info!(path, origin = %transport.origin(), "Visiting");
            let initial = transport.get(path, false).await;
            let controller = ControllerBuilder::new(transport.clone(), registry)
                .browser(browser.clone())
                .callbacks(Arc::new(events))
                .start(initial, path)?;
            if !settle(&controller, settle_limit).await {
                warn!(path, "Controller still busy; reporting the frame reached so far");
            }
            if let Some(ms) = self.config.navigation.auto_refresh_ms {
                let period = Duration::from_millis(ms);
                let refresher = AutoRefresh::spawn(&controller, period)?;
                // Two periods guarantee at least one refresh was issued.
                tokio::time::sleep(period * 2).await;
                if !settle(&controller, settle_limit).await {
                    warn!(path, "Refresh still in flight; reporting the frame reached so far");
                }
                refresher.stop();
            }
            Ok::<_, ClientError>(controller.current_frame())
        })?;

        let mut collected = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            collected.push(event);
        }

        let report = VisitReport {
            frame,
            title: browser.title(),
            history: browser.history(),
            assigned: browser.assigned(),
            events: collected,
        };
        Ok(format_visit(&report, format))
    }
}

/// Wait for redirects and fetches started by `controller` to finish.
/// Returns false if `limit` elapsed first.
async fn settle(controller: &NavigationController, limit: Duration) -> bool {
    tokio::time::timeout(limit, async {
        while controller.pending_redirect().is_some() || controller.fetch_in_progress() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}
