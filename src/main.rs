use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use url::Url;

use rehost::config::{
	CONFIG_FILE_NAME, discover_configs, load_merged_config, merge_configs, user_config_path,
};
use rehost::rules::{RuleSet, compile_rules};

/// Environment variable holding the tracing filter directive.
const LOG_ENV_VAR: &str = "REHOST_LOG";

const INIT_TEMPLATE: &str = r#"# rehost configuration
#
# Rules are evaluated in order against the path a URL was generated for.
# Patterns are regular expressions searched anywhere in the path; anchor
# them with ^ to match a prefix. The first matching rule wins unless it
# sets `continue = true`.
#
# Rewrite specs:
#   "https://"                      switch scheme
#   "cdn.example.com:8080"          switch host and port
#   "/v3"                           prefix the path
#   "http://bucket.example.com/v1"  any combination of the above

root = true

[[rules]]
match = "^/static/"
rewrite = "/v1"
continue = true

[[rules]]
"^/static/" = "https://cdn.example.com"
"#;

#[derive(Parser)]
#[command(name = "rehost")]
#[command(
	author,
	version,
	about = "Rewrite generated URLs onto alternate hosts, schemes and path prefixes"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Create a template .rehost.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .rehost.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Rewrite the URL generated for PATH using the configured rules
	Rewrite {
		/// Path the URL is generated for; rules are matched against it
		path: String,

		/// URL the path is joined onto before rewriting
		#[arg(long, default_value = "http://localhost/")]
		base: String,
	},
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display configuration files and their rules in evaluation order
	Show,
	/// Check all config files, patterns and rewrite specs for errors
	Validate,
}

fn main() -> ExitCode {
	init_tracing();

	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_tracing() {
	let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	if cli.init {
		return handle_init(cli.force);
	}

	match cli.command {
		Some(Commands::Rewrite { path, base }) => handle_rewrite(&path, &base),
		Some(Commands::Config { action }) => match action {
			ConfigAction::Show => handle_config_show(),
			ConfigAction::Validate => handle_config_validate(),
		},
		// arg_required_else_help keeps us from getting here without --init
		None => Ok(ExitCode::SUCCESS),
	}
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(CONFIG_FILE_NAME);

	if config_path.exists() && !force {
		anyhow::bail!("{CONFIG_FILE_NAME} already exists. Use --force to overwrite.");
	}

	std::fs::write(&config_path, INIT_TEMPLATE)
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {CONFIG_FILE_NAME}");
	Ok(ExitCode::SUCCESS)
}

fn load_rules() -> Result<RuleSet> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let config = load_merged_config(&cwd).context("Failed to load configuration")?;
	compile_rules(&config).context("Failed to compile rules")
}

fn handle_rewrite(path: &str, base: &str) -> Result<ExitCode> {
	let base = Url::parse(base).with_context(|| format!("Invalid base URL: {base}"))?;
	let rules = load_rules()?;

	let rewritten = rules
		.rewrite_url(&base, path)
		.with_context(|| format!("Failed to rewrite URL for {path}"))?;

	println!("{rewritten}");
	Ok(ExitCode::SUCCESS)
}

fn handle_config_show() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let configs = discover_configs(&cwd).context("Failed to discover config files")?;

	if configs.is_empty() {
		println!("No configuration files found.");
		return Ok(ExitCode::SUCCESS);
	}

	println!("Configuration files (in cascade order):\n");

	for loaded in &configs {
		println!("# Source: {}", loaded.path.display());
		println!("# root: {}", loaded.config.root);
		println!("# no-external-lookup: {}", loaded.config.no_external_lookup);
		if let Some(ref env_var) = loaded.config.root_config_lookup_disable_env_var {
			println!("# root-config-lookup-disable-env-var: {}", env_var);
		}
		println!("# rules: {}", loaded.config.rules.len());
		println!();

		for (i, rule) in loaded.config.rules.iter().enumerate() {
			println!("  Rule {}:", i + 1);
			println!("    match: {}", rule.pattern);
			println!("    rewrite: {}", rule.rewrite);
			println!("    continue: {}", rule.continue_evaluation);
			println!();
		}
	}

	if let Ok(user_path) = user_config_path() {
		println!("User config path: {}", user_path.display());
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let configs = discover_configs(&cwd).context("Configuration is invalid")?;

	if configs.is_empty() {
		println!("No configuration files found.");
		return Ok(ExitCode::SUCCESS);
	}

	let rules = compile_rules(&merge_configs(&configs)).context("Failed to compile rules")?;
	rules
		.check_specs()
		.context("Configuration has an invalid rewrite spec")?;

	for loaded in &configs {
		println!("  {}", loaded.path.display());
	}
	println!(
		"Configuration is valid ({} files, {} rules).",
		configs.len(),
		rules.len()
	);
	Ok(ExitCode::SUCCESS)
}
