//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::types::DatasourceId;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Serve { port } => self.serve(*port).await,
            Commands::Validate => self.validate(),
            Commands::Test { datasource } => self.test(datasource).await,
            Commands::Structure {
                datasource,
                ignore_cache,
            } => self.structure(datasource, *ignore_cache).await,
            Commands::Mocks => self.mocks().await,
            Commands::Datasources => self.datasources().await,
        }
    }

    /// Load the gateway configuration
    fn load_config(&self) -> Result<GatewayConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use -c flag)"))?;
        GatewayConfig::from_file(path)
    }

    fn build_gateway(&self) -> Result<Gateway> {
        Gateway::from_config(&self.load_config()?)
    }

    async fn serve(&self, port: Option<u16>) -> Result<()> {
        let mut config = self.load_config()?;
        if let Some(port) = port {
            config.server.port = port;
        }
        let gateway = Arc::new(Gateway::from_config(&config)?);
        crate::cli::serve(gateway, &config.server).await
    }

    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        config.validate()?;

        self.output(&json!({
            "type": "VALIDATION",
            "valid": true,
            "datasources": config.datasources.len(),
            "mocks": config.mocks.len(),
            "callback_url": config.callback_url(),
        }));
        Ok(())
    }

    async fn test(&self, datasource: &str) -> Result<()> {
        let gateway = self.build_gateway()?;
        let id = DatasourceId::parse(datasource)?;

        let start = Instant::now();
        let result = gateway.test_saved_datasource(&id).await?;
        let elapsed = start.elapsed();

        self.output(&json!({
            "type": "CONNECTION_STATUS",
            "datasource": id,
            "result": result,
            "elapsed_ms": elapsed.as_millis(),
        }));
        Ok(())
    }

    async fn structure(&self, datasource: &str, ignore_cache: bool) -> Result<()> {
        let gateway = self.build_gateway()?;
        let id = DatasourceId::parse(datasource)?;
        let structure = gateway.get_structure(&id, ignore_cache).await?;

        self.output(&json!({
            "type": "STRUCTURE",
            "datasource": id,
            "structure": structure,
        }));
        Ok(())
    }

    async fn mocks(&self) -> Result<()> {
        let gateway = self.build_gateway()?;
        let mocks = gateway.list_mocks().await?;

        self.output(&json!({
            "type": "MOCKS",
            "mocks": mocks,
        }));
        Ok(())
    }

    async fn datasources(&self) -> Result<()> {
        let gateway = self.build_gateway()?;
        let datasources = gateway.list_datasources().await?;

        self.output(&json!({
            "type": "DATASOURCES",
            "datasources": datasources,
        }));
        Ok(())
    }

    /// Print a message in the selected format
    fn output<T: Serialize>(&self, msg: &T) {
        let rendered = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg),
            OutputFormat::Pretty => serde_json::to_string_pretty(msg),
        };
        println!("{}", rendered.unwrap_or_default());
    }
}
