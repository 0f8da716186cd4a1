use std::time::Duration;

/// The 16-byte offline message id carried by every unconnected packet.
pub const RAKNET_MAGIC: [u8; 16] = [
    0x00, 0xFF, 0xFF, 0x00, 0xFE, 0xFE, 0xFE, 0xFE, 0xFD, 0xFD, 0xFD, 0xFD, 0x12, 0x34, 0x56, 0x78,
];

/// RakNet protocol version spoken by 1.2-era Bedrock clients.
pub const RAKNET_PROTOCOL_VERSION: u8 = 9;

/// Maximum MTU the server will negotiate.
pub const MAX_MTU: u16 = 1492;

/// Minimum MTU the server will negotiate.
pub const MIN_MTU: u16 = 400;

/// Worst-case encoded overhead of one frame inside a frame set.
pub const MAX_FRAME_OVERHEAD: usize = 32;

/// Number of independent ordering channels.
pub const NUM_ORDER_CHANNELS: usize = 32;

/// Default inactivity window before a session is destroyed.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval before an un-ACKed frame set is retransmitted.
pub const DEFAULT_RETRANSMIT_INTERVAL: Duration = Duration::from_millis(200);

/// How often the endpoint flushes ACKs, retransmissions, and send queues.
pub const SERVER_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Keepalive cadence once a session is fully connected.
pub const PING_INTERVAL: Duration = Duration::from_secs(5);

/// Maximum number of fragments a single split packet may declare.
pub const MAX_SPLIT_COUNT: u32 = 512;

/// Maximum concurrently reassembling split ids per session.
pub const MAX_SPLIT_IDS: usize = 64;

/// Time after which an incomplete split assembly is discarded.
pub const SPLIT_ASSEMBLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum buffered out-of-order frames per ordering channel.
pub const MAX_ORDER_CHANNEL_BUFFER: usize = 256;

/// Maximum un-ACKed frame sets tracked per session; overflow closes it.
pub const MAX_RESEND_ENTRIES: usize = 1024;

/// Size of the UDP receive buffer.
pub const RECV_BUF_SIZE: usize = 2048;
