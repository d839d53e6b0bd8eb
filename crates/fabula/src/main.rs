//! Fabula CLI binary.
//!
//! - Generate a story manifest from a prompt
//! - Show how a narrative splits into scenes
//! - Validate a manifest file
//! - Replay a manifest on the local device runtime

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use cli::{Cli, Commands, generate_story, play_manifest, segment_narrative, validate_manifest};

    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    #[cfg(feature = "otel")]
    fabula::init_telemetry()?;
    #[cfg(not(feature = "otel"))]
    fabula::init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Generate {
            prompt,
            user,
            config,
            output,
            best_effort,
        } => {
            generate_story(&prompt, &user, config.as_deref(), output.as_deref(), best_effort)
                .await?;
        }

        Commands::Segment {
            narrative,
            max_scenes,
        } => {
            segment_narrative(&narrative, max_scenes)?;
        }

        Commands::Validate { manifest } => {
            validate_manifest(&manifest)?;
        }

        Commands::Play { manifest, config } => {
            play_manifest(&manifest, config.as_deref()).await?;
        }
    }

    #[cfg(feature = "otel")]
    fabula::shutdown_telemetry();

    Ok(())
}
