use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use quarry_domain::{access::AccessLevel, criteria::QueryFacets};
use quarry_service::{
	GrantRequest, ListGrantsRequest, QuarryService, RetrieveRequest, RevokeRequest,
};
use quarry_storage::{db::Db, qdrant::QdrantStore};

#[derive(Debug, Parser)]
#[command(
	version = quarry_cli::VERSION,
	rename_all = "kebab",
	styles = quarry_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Create the permission table and the document collection if missing.
	Init,
	#[command(flatten)]
	Service(ServiceCommand),
}

/// Commands answered by the service and printed as JSON.
#[derive(Debug, Subcommand)]
pub enum ServiceCommand {
	/// Retrieve permission-filtered documents for a user.
	Search(SearchArgs),
	/// Grant READ or DENY on a document path.
	Grant {
		#[arg(long)]
		user: String,
		#[arg(long)]
		path: String,
		#[arg(long, value_parser = parse_level)]
		level: AccessLevel,
		#[arg(long)]
		granted_by: Option<String>,
	},
	/// Remove a user's grant on a document path.
	Revoke {
		#[arg(long)]
		user: String,
		#[arg(long)]
		path: String,
	},
	/// List a user's grants.
	Grants {
		#[arg(long)]
		user: String,
	},
}

#[derive(Debug, clap::Args)]
pub struct SearchArgs {
	#[arg(long)]
	pub user: String,
	#[arg(long = "keyword", value_name = "TERM")]
	pub keywords: Vec<String>,
	#[arg(long = "title", value_name = "TERM")]
	pub title: Vec<String>,
	#[arg(long = "content", value_name = "TERM")]
	pub content: Vec<String>,
	#[arg(long = "path", value_name = "TERM")]
	pub path: Vec<String>,
	/// Date hint boosting documents whose title mentions it.
	#[arg(long = "date", value_name = "HINT")]
	pub dates: Vec<String>,
	#[arg(long)]
	pub top_k: Option<u32>,
}
impl SearchArgs {
	fn into_request(self) -> RetrieveRequest {
		RetrieveRequest {
			user_id: self.user,
			facets: QueryFacets {
				keywords: self.keywords,
				title: self.title,
				content: self.content,
				path: self.path,
				dates: self.dates,
			},
			top_k: self.top_k,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = quarry_config::load(&args.config)?;

	init_tracing(&config)?;

	let db = Db::connect(&config.storage.postgres).await?;
	let qdrant = QdrantStore::new(&config.storage.qdrant)?;

	match args.command {
		Command::Init => {
			db.ensure_schema().await?;
			qdrant.ensure_collection().await?;

			tracing::info!(collection = %qdrant.collection, "Storage initialized.");
		},
		Command::Service(command) => {
			let service = QuarryService::new(config, db, qdrant);
			let output = execute(&service, command).await?;

			println!("{}", serde_json::to_string_pretty(&output)?);
		},
	}

	Ok(())
}

async fn execute(
	service: &QuarryService,
	command: ServiceCommand,
) -> color_eyre::Result<Value> {
	match command {
		ServiceCommand::Search(search) =>
			to_json(service.retrieve(search.into_request()).await?),
		ServiceCommand::Grant { user, path, level, granted_by } => {
			let request = GrantRequest { user_id: user, document_path: path, level, granted_by };

			to_json(service.grant_access(request).await?)
		},
		ServiceCommand::Revoke { user, path } => to_json(
			service.revoke_access(RevokeRequest { user_id: user, document_path: path }).await?,
		),
		ServiceCommand::Grants { user } =>
			to_json(service.list_grants(ListGrantsRequest { user_id: user }).await?),
	}
}

fn init_tracing(config: &quarry_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}

fn to_json<T>(value: T) -> color_eyre::Result<Value>
where
	T: serde::Serialize,
{
	Ok(serde_json::to_value(value)?)
}

fn parse_level(raw: &str) -> Result<AccessLevel, String> {
	raw.to_ascii_uppercase().parse().map_err(|err| format!("{err}"))
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Args::command().debug_assert();
	}

	#[test]
	fn search_flags_build_facets() {
		let args = Args::parse_from([
			"quarry-search",
			"--config",
			"quarry.toml",
			"search",
			"--user",
			"u1",
			"--keyword",
			"laptop",
			"--keyword",
			"policy",
			"--content",
			"laptop setup",
			"--date",
			"2024",
		]);
		let Command::Service(ServiceCommand::Search(search)) = args.command else {
			panic!("expected search command")
		};
		let request = search.into_request();

		assert_eq!(request.user_id, "u1");
		assert_eq!(request.facets.keywords, vec!["laptop", "policy"]);
		assert_eq!(request.facets.dates, vec!["2024"]);
		assert!(request.facets.title.is_empty());
		assert_eq!(request.top_k, None);
	}

	#[test]
	fn init_stays_apart_from_service_commands() {
		let init = Args::parse_from(["quarry-search", "--config", "quarry.toml", "init"]);
		let revoke = Args::parse_from([
			"quarry-search",
			"--config",
			"quarry.toml",
			"revoke",
			"--user",
			"u1",
			"--path",
			"docs",
		]);

		assert!(matches!(init.command, Command::Init));
		assert!(matches!(
			revoke.command,
			Command::Service(ServiceCommand::Revoke { ref user, ref path })
				if user == "u1" && path == "docs"
		));
	}

	#[test]
	fn levels_parse_case_insensitively() {
		assert_eq!(parse_level("read"), Ok(AccessLevel::Read));
		assert_eq!(parse_level("DENY"), Ok(AccessLevel::Deny));
		assert!(parse_level("write").is_err());
	}
}
