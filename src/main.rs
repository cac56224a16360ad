//! Card Arena Battle Server
//!
//! Serves `POST /battles` until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use card_arena::{
    game::{card::Card, events::TracingEventLog},
    network::{AuthConfig, GameServer, JwtSessionLookup, ServerConfig},
    Deck, InMemoryUserStore, MAX_ROUNDS, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Card Arena Server v{}", VERSION);

    let config = ServerConfig::from_env().context("loading server configuration")?;
    info!(
        "Round cap: {} (default {}), wait timeout: {:?}",
        config.battle.max_rounds, MAX_ROUNDS, config.matchmaking.wait_timeout
    );

    let auth = AuthConfig::from_env();
    if !auth.is_configured() {
        warn!("No AUTH_SECRET or AUTH_PUBLIC_KEY_PEM set; every battle request will be rejected");
    }

    let store = Arc::new(InMemoryUserStore::new());
    if std::env::var("SEED_DEMO_USERS").map(|v| v == "1").unwrap_or(false) {
        seed_demo_users(&store)?;
    }

    let sessions = Arc::new(JwtSessionLookup::new(auth, store.clone()));
    let server = GameServer::new(config, sessions, store, Arc::new(TracingEventLog));

    tokio::select! {
        result = server.run() => result.context("battle server stopped")?,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
            server.shutdown();
        }
    }

    Ok(())
}

/// Register two players with ready-made decks.
fn seed_demo_users(store: &InMemoryUserStore) -> anyhow::Result<()> {
    let decks = [
        (
            "kienboec",
            [("WaterGoblin", 10.0), ("FireSpell", 25.0), ("Knight", 20.0), ("Dragon", 50.0)],
        ),
        (
            "altenhof",
            [("Wizard", 30.0), ("WaterSpell", 20.0), ("Kraken", 40.0), ("FireElf", 28.0)],
        ),
    ];

    for (username, cards) in decks {
        store.insert_user(username);
        let cards = cards
            .iter()
            .enumerate()
            .map(|(i, (name, damage))| Card::from_name(format!("{}-{}", username, i), *name, *damage))
            .collect();
        store.set_deck(username, Deck::new(cards)?)?;
        info!("Seeded demo user {}", username);
    }

    Ok(())
}
