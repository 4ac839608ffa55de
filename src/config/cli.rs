use crate::config::LookupConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "number-lookup")]
#[command(about = "Best-effort public-data lookup service for phone numbers")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "NUMBER_LOOKUP_CONFIG")]
    pub config: Option<String>,

    #[arg(long, env = "NUMBER_LOOKUP_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "NUMBER_LOOKUP_PORT")]
    pub port: Option<u16>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Run up to N probes at once (1 = sequential)
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(short, long, env = "NUMBER_LOOKUP_DEBUG", help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    /// 載入設定檔 (沒有就用預設值)，再套用命令列覆蓋
    pub fn load(&self) -> Result<LookupConfig> {
        let mut config = match &self.config {
            Some(path) => LookupConfig::from_file(path)?,
            None => LookupConfig::default(),
        };

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(timeout) = self.timeout {
            config.lookup.timeout_seconds = Some(timeout);
        }
        if let Some(concurrency) = self.concurrency {
            config.lookup.max_concurrent_probes = Some(concurrency);
        }

        Ok(config)
    }
}
