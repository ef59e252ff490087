use std::io::{self, BufRead, Write};

use clap::Parser;
use color_eyre::Result;
use engine::{Config, Generator};
use log::error;

/// Chat front-end: turns text prompts into generated images.
#[derive(Debug, clap::Parser)]
struct Cli {
    /// Generate a single image for this prompt and exit. Without it, prompts
    /// are read from stdin, one per line.
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();
    let cli = Cli::parse();

    let mut generator = Generator::new(Config::load()?);

    if let Some(prompt) = cli.prompt {
        handle_prompt(&mut generator, &prompt).await;
        return Ok(());
    }

    println!("Describe the image you want, one prompt per line.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        handle_prompt(&mut generator, prompt).await;
    }

    Ok(())
}

async fn handle_prompt(generator: &mut Generator, prompt: &str) {
    println!("Generating image...");
    match generator.generate(prompt).await {
        Ok(path) => println!("Done! Image saved to {}", path.display()),
        Err(e) => {
            error!("generation failed: {e}");
            println!("Generation failed: {e}");
        }
    }
}
