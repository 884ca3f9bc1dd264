//! Main entry point for the oracle reporter service.
//!
//! This binary reports values for the configured datafeeds to the oracle. Each
//! datafeed runs in its own reporting loop. All loops share the chain client,
//! the reporting account and the price sources, and stop together on Ctrl-C.

use clap::Parser;
use reporter_config::Config;
use reporter_core::ReporterBuilder;
use std::path::PathBuf;
use tokio::sync::watch;

mod factory_registry;

use factory_registry::builtin_factories;

/// Command-line arguments for the reporter service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, env = "REPORTER_CONFIG", default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Stop every loop after this many cycles
	#[arg(long)]
	report_count: Option<u64>,
}

/// Applies command-line overrides on top of the file configuration.
fn apply_overrides(config: &mut Config, args: &Args) {
	if let Some(count) = args.report_count {
		config.reporter.report_count = Some(count);
	}
}

/// Main entry point for the reporter service.
///
/// This function:
/// 1. Loads `.env` and parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds one reporting loop per datafeed and checks the account is staked
/// 5. Runs the loops until interrupted or their report count is reached
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	// A missing .env file is fine
	let _ = dotenvy::dotenv();
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started reporter");

	let mut config = Config::from_file(&args.config).await?;
	apply_overrides(&mut config, &args);
	tracing::info!("Loaded configuration [{}]", config.reporter.id);

	let loops = ReporterBuilder::new(config)
		.build(builtin_factories())
		.await?;
	for reporter in &loops {
		reporter.initialize().await?;
	}

	let (stop_tx, stop_rx) = watch::channel(false);
	let handles: Vec<_> = loops
		.into_iter()
		.map(|mut reporter| {
			let stop = stop_rx.clone();
			tokio::spawn(async move { reporter.run(stop).await })
		})
		.collect();

	tokio::spawn(async move {
		match tokio::signal::ctrl_c().await {
			Ok(()) => {
				tracing::info!("Shutdown requested");
				let _ = stop_tx.send(true);
			}
			Err(e) => {
				tracing::warn!(error = %e, "Unable to listen for Ctrl-C");
				// Dropping the sender would stop every loop
				std::future::pending::<()>().await;
			}
		}
	});

	for result in futures::future::join_all(handles).await {
		if let Err(e) = result {
			tracing::error!(error = %e, "Reporting task failed");
		}
	}

	tracing::info!("Stopped reporter");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const CONFIG: &str = r#"
[reporter]
id = "eth-usd-reporter"
chain_id = 1

[network]
rpc_url = "http://localhost:8545"

[contracts]
oracle = "0x88df592f8eb5d7bd38bfef7deb0fbc02cf3778a0"

[account]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"

[gas_oracle]
primary = "rpc"
[gas_oracle.implementations.rpc]

[prices]
sources = ["fixed"]
[prices.implementations.fixed]
prices = { "eth/usd" = 2000, "trb/usd" = 1 }

[[feeds]]
asset = "eth"
currency = "usd"
"#;

	#[test]
	fn test_args() {
		let args = Args::try_parse_from([
			"reporter",
			"--config",
			"reporter.toml",
			"--report-count",
			"3",
		])
		.unwrap();
		assert_eq!(args.config, PathBuf::from("reporter.toml"));
		assert_eq!(args.log_level, "info");
		assert_eq!(args.report_count, Some(3));
	}

	#[tokio::test]
	async fn test_report_count_override() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(CONFIG.as_bytes()).unwrap();

		let mut config = Config::from_file(file.path()).await.unwrap();
		assert_eq!(config.reporter.report_count, None);

		let args = Args::try_parse_from(["reporter", "--report-count", "1"]).unwrap();
		apply_overrides(&mut config, &args);
		assert_eq!(config.reporter.report_count, Some(1));

		let args = Args::try_parse_from(["reporter"]).unwrap();
		apply_overrides(&mut config, &args);
		assert_eq!(config.reporter.report_count, Some(1));
	}
}
