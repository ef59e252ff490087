use clap::Parser;
use color_eyre::Result;
use engine::{Config, Generator};

#[derive(clap::Parser)]
struct Arg {
    prompt: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();
    let Arg { prompt } = Arg::parse();

    let mut generator = Generator::new(Config::load()?);
    let path = generator.generate(&prompt).await?;
    println!("Saved image to {}", path.display());

    Ok(())
}
