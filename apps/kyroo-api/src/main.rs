use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = kyroo_api::Args::parse();

	kyroo_api::run(args).await
}
