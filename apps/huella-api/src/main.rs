use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = huella_api::Args::parse();

	huella_api::run(args).await
}
