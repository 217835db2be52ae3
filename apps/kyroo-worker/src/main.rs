use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = kyroo_worker::Args::parse();

	kyroo_worker::run(args).await
}
