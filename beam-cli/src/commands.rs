use crate::cli::{PeerArgs, ReceiveArgs, SendArgs, ServeArgs};
use crate::observer::{CliObserver, UiEvent};
use anyhow::{Context, Result, bail};
use beam::client::{
    BeamEngine, EngineConfig, EngineHandle, MAX_MESSAGE_SIZE, OutgoingFile, SessionState,
    TransportConfig,
};
use beam::model::IceServerConfig;
use beam::server::{ServerConfig, serve};
use colored::*;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = ServerConfig {
        bind_addr: args.bind,
        room_capacity: args.room_capacity,
        ..ServerConfig::default()
    }
    .without_ice_servers();

    if !args.no_stun {
        config = config.with_ice_server(IceServerConfig::stun(args.stun_url));
    }
    if let Some(url) = args.turn_url {
        info!("Using TURN server {}", url);
        config = config.with_ice_server(IceServerConfig {
            urls: vec![url],
            username: args.turn_username,
            credential: args.turn_credential,
        });
    }

    println!(
        "{} {}",
        "Relay listening on".green().bold(),
        format!("ws://{}/ws", config.bind_addr).bold()
    );
    serve(config).await
}

pub async fn run_send(args: SendArgs) -> Result<()> {
    let file = OutgoingFile::from_path(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    if file.len() > MAX_MESSAGE_SIZE {
        bail!(
            "{} is {} bytes; a single transfer is limited to {} bytes",
            args.file.display(),
            file.len(),
            MAX_MESSAGE_SIZE
        );
    }
    println!(
        "{} {} ({} bytes, {})",
        "Sending".cyan(),
        file.metadata.file_name.bold(),
        file.len(),
        if file.metadata.file_type.is_empty() {
            "unknown type"
        } else {
            file.metadata.file_type.as_str()
        }
    );

    let (engine, mut events) = start_engine(&args.peer).await?;

    let mut queued = false;
    let mut sent = false;
    while let Some(event) = events.recv().await {
        match event {
            UiEvent::State(_, SessionState::Connected) if !queued => {
                engine.send_file(file.clone()).await?;
                queued = true;
            }
            UiEvent::Status(text) if text == "File sent" => sent = true,
            UiEvent::Status(text) if text == "Transfer failed" => {
                engine.shutdown().await;
                bail!("Transfer failed");
            }
            // Leave only after the receiver hangs up on a sent file.
            UiEvent::State(_, SessionState::Closed) if sent => break,
            UiEvent::State(_, state @ (SessionState::Closed | SessionState::Failed)) => {
                engine.shutdown().await;
                bail!("Session ended before the file was sent ({})", state);
            }
            _ => {}
        }
    }

    engine.shutdown().await;
    Ok(())
}

pub async fn run_receive(args: ReceiveArgs) -> Result<()> {
    let (engine, mut events) = start_engine(&args.peer).await?;

    while let Some(event) = events.recv().await {
        let UiEvent::File(_, file) = event else {
            continue;
        };

        let path = file
            .save_into(&args.out)
            .await
            .with_context(|| format!("Failed to write into {}", args.out.display()))?;
        println!(
            "{} {} ({} bytes) -> {}",
            "Saved".green().bold(),
            file.file_name.bold(),
            file.bytes.len(),
            path.display()
        );

        if let Some(text) = file.text_preview(args.preview) {
            println!("{}", "---".dimmed());
            println!("{}", text);
            println!("{}", "---".dimmed());
        } else if file.is_image() {
            println!("{} {}", "Image:".cyan(), file.file_type);
        }
        break;
    }

    engine.shutdown().await;
    Ok(())
}

async fn start_engine(peer: &PeerArgs) -> Result<(EngineHandle, mpsc::UnboundedReceiver<UiEvent>)> {
    let transport = TransportConfig {
        include_loopback: peer.loopback,
        ..TransportConfig::default()
    };
    let config = EngineConfig::new(peer.relay.clone()).with_transport(transport);
    let (observer, events) = CliObserver::new();

    let engine = BeamEngine::connect(config, Arc::new(observer))
        .await
        .with_context(|| format!("Failed to connect to relay at {}", peer.relay))?;
    println!(
        "{} {}",
        "Connected to relay as".cyan(),
        engine.local_peer_id().to_string().bold()
    );

    engine.join_room(peer.room.as_str()).await?;
    Ok((engine, events))
}
