mod config;
mod connection;
mod flat_world;
mod queue;
mod world;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use bluestone_raknet::{RakNetConfig, RakNetServer, ServerDescriptor};
use bluestone_proto::packets::{GAME_VERSION, PROTOCOL_VERSION};

use config::ServerConfig;
use connection::ConnectionHandler;
use flat_world::FlatWorld;
use world::{Difficulty, GameMode};

#[tokio::main]
async fn main() {
    let config = Arc::new(match ServerConfig::load("server.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load server.toml: {e}");
            std::process::exit(1);
        }
    });

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let server_guid: i64 = config.server_guid.unwrap_or_else(rand::random);
    let seed: i32 = rand::random();

    info!(
        "bluestone v{} (protocol {PROTOCOL_VERSION}, game version {GAME_VERSION})",
        env!("CARGO_PKG_VERSION")
    );
    info!(
        "world '{}', mode {}, port {}",
        config.world_name, config.game_mode, config.server_port
    );

    let address: SocketAddr = format!("0.0.0.0:{}", config.server_port)
        .parse()
        .expect("invalid bind address");

    let descriptor = ServerDescriptor {
        motd: config.motd.clone(),
        protocol_version: PROTOCOL_VERSION as u32,
        game_version: GAME_VERSION.into(),
        online_players: 0,
        max_players: config.max_players,
        server_guid,
        world_name: config.world_name.clone(),
        game_mode: config.game_mode_title(),
    };

    let raknet_config = RakNetConfig {
        address,
        server_guid,
        descriptor,
        max_connections: config.max_players as usize,
        timings: config.session_timings(),
        max_log_length: config.max_log_length,
    };

    let (mut server, mut events, handle) = RakNetServer::bind(raknet_config)
        .await
        .expect("failed to bind UDP socket");

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    // The game session handler runs beside the endpoint, fed by its
    // event stream and a fixed game tick.
    let world = FlatWorld::new(
        seed,
        GameMode::from_name(&config.game_mode),
        Difficulty::from_name(&config.difficulty),
        config.world_name.clone(),
    );
    let handler_config = config.clone();
    let mut handler_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        let mut handler = ConnectionHandler::new(handle, world, handler_config);
        let mut tick = tokio::time::interval(Duration::from_millis(50));
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => handler.handle_event(event).await,
                        None => break,
                    }
                }
                _ = tick.tick() => {
                    handler.game_tick().await;
                }
                _ = handler_shutdown.changed() => {
                    if *handler_shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    });

    server.run(shutdown_rx).await;
    info!("server stopped");
}
