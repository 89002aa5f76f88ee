use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{DeckManager, HttpTransport};
use shared::{
    domain::{CardId, MoveDirection},
    protocol::UpdateCardRequest,
};
use uuid::Uuid;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:8001")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every card in display order.
    List,
    Create {
        title: String,
        link: String,
        image_url: String,
    },
    Update {
        card_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    Delete {
        card_id: String,
    },
    /// Swap a card with its neighbor; `direction` is `up` or `down`.
    Move {
        card_id: String,
        direction: String,
    },
    Upload {
        path: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let transport = HttpTransport::new(&cli.server_url)?;
    let manager = DeckManager::new(transport);

    match cli.command {
        Command::List => {
            let deck = manager.refresh().await?;
            for card in deck {
                println!("{:>3}  {}  {}  {}", card.order, card.id, card.title, card.link);
            }
        }
        Command::Create {
            title,
            link,
            image_url,
        } => {
            manager.refresh().await?;
            let card = manager.create_card(&title, &link, &image_url).await?;
            println!("created card_id={}", card.id);
        }
        Command::Update {
            card_id,
            title,
            link,
            image_url,
        } => {
            manager.refresh().await?;
            let changes = UpdateCardRequest {
                title,
                link,
                image_url,
                order: None,
            };
            let card = manager.update_card(parse_card_id(&card_id)?, changes).await?;
            println!("updated card_id={}", card.id);
        }
        Command::Delete { card_id } => {
            manager.refresh().await?;
            manager.delete_card(parse_card_id(&card_id)?).await?;
            println!("deleted card_id={card_id}");
        }
        Command::Move { card_id, direction } => {
            let direction = parse_direction(&direction)?;
            manager.refresh().await?;
            let deck = manager.move_card(parse_card_id(&card_id)?, direction).await?;
            for card in deck {
                println!("{:>3}  {}  {}", card.order, card.id, card.title);
            }
        }
        Command::Upload { path } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("upload.png");
            let mime_type = mime_for_path(&path)?;
            let uploaded = manager.upload_image(filename, mime_type, bytes).await?;
            println!("uploaded {} -> {}", uploaded.filename, uploaded.url);
        }
    }

    Ok(())
}

fn parse_card_id(raw: &str) -> Result<CardId> {
    let uuid = Uuid::parse_str(raw).with_context(|| format!("invalid card id: {raw}"))?;
    Ok(CardId(uuid))
}

fn parse_direction(raw: &str) -> Result<MoveDirection> {
    match raw.to_ascii_lowercase().as_str() {
        "up" => Ok(MoveDirection::Up),
        "down" => Ok(MoveDirection::Down),
        other => anyhow::bail!("unknown direction '{other}'; expected 'up' or 'down'"),
    }
}

fn mime_for_path(path: &std::path::Path) -> Result<&'static str> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => Ok("image/png"),
        Some("jpg") | Some("jpeg") => Ok("image/jpeg"),
        Some("webp") => Ok("image/webp"),
        _ => anyhow::bail!(
            "cannot upload '{}': expected a .png, .jpg, .jpeg or .webp file",
            path.display()
        ),
    }
}
