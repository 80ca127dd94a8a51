use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = quarry_search::Args::parse();

	quarry_search::run(args).await
}
