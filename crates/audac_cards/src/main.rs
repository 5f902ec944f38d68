use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use audac_cards::BridgeRequest;
use audac_cards::CardCatalog;
use audac_cards::ChannelBridge;
use audac_cards::Config;
use audac_cards::Dashboard;
use audac_cards::ElementRegistry;
use audac_cards::EntitySnapshot;
use audac_cards::Hass;
use audac_cards::UiEvent;
use audac_cards::register_cards;
use clap::Parser;
use clap::Subcommand;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Parser)]
#[command(name = "audac-cards", version, about = "Render and drive Audac dashboard cards")]
struct Cli {
    /// Dashboard file
    #[arg(short, long, default_value = "dashboard.toml")]
    config: PathBuf,

    /// JSON file mapping entity ids to `{state, attributes}`
    #[arg(short, long)]
    states: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render every card against the given states
    Render,

    /// Click an element of one card
    Click { card: usize, element: String },

    /// Change the value of an element of one card
    Change {
        card: usize,
        element: String,
        value: String,
    },

    /// Print the card picker catalog as JSON
    Catalog,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)?;

    tracing_subscriber::fmt()
        .with_max_level(config.logging.level)
        .init();

    tracing::info!("Loaded dashboard from: {}", cli.config.display());

    let mut elements = ElementRegistry::new();
    let mut catalog = CardCatalog::new();
    register_cards(&mut elements, &mut catalog);

    if let Command::Catalog = cli.command {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    let states: EntitySnapshot = match &cli.states {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read states file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse states file {}", path.display()))?
        }
        None => EntitySnapshot::new(),
    };

    let (bridge, rx) = ChannelBridge::new();
    let host = tokio::spawn(acknowledge_calls(rx));

    let mut dashboard = Dashboard::build(&config.cards_json()?, &elements);
    dashboard.push(&Hass::new(states, Arc::new(bridge)));

    let pending = match cli.command {
        Command::Render | Command::Catalog => None,
        Command::Click { card, element } => dashboard.dispatch(card, &UiEvent::click(element))?,
        Command::Change {
            card,
            element,
            value,
        } => dashboard.dispatch(card, &UiEvent::change(element, value))?,
    };
    if let Some(pending) = pending {
        pending.await?;
    }
    dashboard.refresh();

    print!("{}", dashboard.render_text());

    // Dropping the dashboard drops the last bridge handle and ends the host loop.
    drop(dashboard);
    host.await?;

    Ok(())
}

/// Stand-in host: logs each service call and reports success.
async fn acknowledge_calls(mut rx: UnboundedReceiver<BridgeRequest>) {
    while let Some(request) = rx.recv().await {
        tracing::info!("Service call: {}", request.call);
        request.respond(Ok(()));
    }
    tracing::debug!("Service bridge closed");
}
