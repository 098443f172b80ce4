use beam::model::{DEFAULT_ROOM_CAPACITY, DEFAULT_STUN_ADDR};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:3000/ws";

#[derive(Debug, Parser)]
#[command(name = "beam", version, about = "Peer-to-peer file transfer over WebRTC")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the signaling relay.
    Serve(ServeArgs),
    /// Join a room and send one file to the peer that shows up.
    Send(SendArgs),
    /// Join a room and wait for one file.
    Receive(ReceiveArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, env = "BEAM_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Participants allowed per room.
    #[arg(long, env = "BEAM_ROOM_CAPACITY", default_value_t = DEFAULT_ROOM_CAPACITY)]
    pub room_capacity: usize,

    #[arg(long, env = "STUN_URL", default_value = DEFAULT_STUN_ADDR)]
    pub stun_url: String,

    /// Do not hand out any STUN server.
    #[arg(long)]
    pub no_stun: bool,

    #[arg(long, env = "TURN_URL")]
    pub turn_url: Option<String>,

    #[arg(long, env = "TURN_USERNAME", requires = "turn_url")]
    pub turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL", requires = "turn_url")]
    pub turn_credential: Option<String>,
}

#[derive(Debug, Args)]
pub struct PeerArgs {
    /// Relay WebSocket endpoint.
    #[arg(long, env = "BEAM_RELAY_URL", default_value = DEFAULT_RELAY_URL)]
    pub relay: String,

    #[arg(long)]
    pub room: String,

    /// Gather loopback candidates (both peers on one host).
    #[arg(long)]
    pub loopback: bool,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    #[command(flatten)]
    pub peer: PeerArgs,

    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ReceiveArgs {
    #[command(flatten)]
    pub peer: PeerArgs,

    /// Directory the received file is written to.
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Characters of a text file to print.
    #[arg(long, default_value_t = 2000)]
    pub preview: usize,
}
