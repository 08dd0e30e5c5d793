//! Relay session between one browser connection and one Live session.
//!
//! The session connects upstream, then runs two forwarding loops
//! concurrently:
//!
//! - inbound: browser frames -> Live session (audio, text, activity markers)
//! - outbound: Live events -> classifier -> browser messages
//!
//! Whichever loop finishes first ends the session; the other is dropped
//! before the Live session is released. The release runs exactly once on
//! every path, including a failed connect.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::{DEFAULT_FLUSH_INTERVAL_BYTES, ServerConfig};
use crate::core::live::{
    AudioFormat, BaseLive, LiveError, LiveEventReceiver, ModelStateTracker,
};

use super::messages::{
    CONNECTED_STATUS, LiveIncomingMessage, LiveMessageRoute, LiveOutgoingMessage,
};
use super::stats::AudioStats;

/// One unit received from the browser transport.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// JSON control message
    Text(String),
    /// Raw PCM audio frame
    Binary(Bytes),
    /// Peer closed the connection
    Close,
}

/// Errors that end a relay session abnormally.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Upstream(#[from] LiveError),

    #[error("Invalid control message: {0}")]
    InvalidMessage(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Browser connection closed")]
    OutboundClosed,
}

/// Per-session relay settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySettings {
    /// Log accumulated audio each time this many bytes pass since the last
    /// activity end
    pub flush_interval_bytes: u64,
    /// Format attached to every forwarded audio frame
    pub input_format: AudioFormat,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            flush_interval_bytes: DEFAULT_FLUSH_INTERVAL_BYTES,
            input_format: AudioFormat::PCM16_16K_MONO,
        }
    }
}

impl From<&ServerConfig> for RelaySettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            flush_interval_bytes: config.flush_interval_bytes,
            ..Default::default()
        }
    }
}

/// Pairs one browser connection with one Live session.
pub struct RelaySession<L: BaseLive> {
    live: L,
    released: bool,
    stats: AudioStats,
    tracker: ModelStateTracker,
    settings: RelaySettings,
}

impl<L: BaseLive> RelaySession<L> {
    pub fn new(live: L, settings: RelaySettings) -> Self {
        Self {
            live,
            released: false,
            stats: AudioStats::new(),
            tracker: ModelStateTracker::default(),
            settings,
        }
    }

    /// Connect the Live session.
    pub async fn connect(&mut self) -> Result<(), RelayError> {
        self.live.connect().await?;
        Ok(())
    }

    /// Release the Live session. Only the first call does anything; errors
    /// are logged and swallowed.
    pub async fn disconnect(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.live.disconnect().await {
            error!("Error closing Live session: {}", e);
        }
        info!("Resources released");
    }

    /// Run the session to completion.
    ///
    /// Returns the error that ended the session, if any, after a best-effort
    /// `error` message has been queued for the browser. The Live session is
    /// always released before this returns.
    pub async fn run<S>(
        &mut self,
        inbound: S,
        outbound: &mpsc::Sender<LiveMessageRoute>,
    ) -> Result<(), RelayError>
    where
        S: Stream<Item = Result<InboundFrame, RelayError>> + Send,
    {
        let result = self.relay(inbound, outbound).await;

        if let Err(e) = &result {
            error!("Relay session failed: {}", e);
            let message = LiveOutgoingMessage::Error {
                message: e.to_string(),
            };
            if outbound
                .send(LiveMessageRoute::Outgoing(message))
                .await
                .is_err()
            {
                debug!("Could not send error message, browser connection likely closed");
            }
        }

        self.disconnect().await;
        result
    }

    async fn relay<S>(
        &mut self,
        inbound: S,
        outbound: &mpsc::Sender<LiveMessageRoute>,
    ) -> Result<(), RelayError>
    where
        S: Stream<Item = Result<InboundFrame, RelayError>> + Send,
    {
        self.connect().await?;
        send_message(
            outbound,
            LiveOutgoingMessage::Status {
                message: CONNECTED_STATUS.to_string(),
            },
        )
        .await?;

        let responses = self.live.responses()?;

        // Disjoint borrows: inbound owns the stats, outbound owns the tracker.
        let Self {
            live,
            stats,
            tracker,
            settings,
            ..
        } = self;
        let live: &L = live;

        tokio::select! {
            result = forward_inbound(live, stats, settings, inbound, outbound) => result,
            result = forward_outbound(tracker, responses, outbound) => result,
        }
    }

    pub fn live(&self) -> &L {
        &self.live
    }

    pub fn stats(&self) -> &AudioStats {
        &self.stats
    }

    pub fn tracker(&self) -> &ModelStateTracker {
        &self.tracker
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

async fn send_message(
    outbound: &mpsc::Sender<LiveMessageRoute>,
    message: LiveOutgoingMessage,
) -> Result<(), RelayError> {
    outbound
        .send(LiveMessageRoute::Outgoing(message))
        .await
        .map_err(|_| RelayError::OutboundClosed)
}

/// Browser -> Live. Ends cleanly when the peer closes.
async fn forward_inbound<L, S>(
    live: &L,
    stats: &mut AudioStats,
    settings: &RelaySettings,
    inbound: S,
    outbound: &mpsc::Sender<LiveMessageRoute>,
) -> Result<(), RelayError>
where
    L: BaseLive,
    S: Stream<Item = Result<InboundFrame, RelayError>> + Send,
{
    let mut inbound = std::pin::pin!(inbound);

    while let Some(frame) = inbound.next().await {
        let result = match frame {
            Ok(InboundFrame::Binary(data)) => forward_audio(live, stats, settings, data).await,
            Ok(InboundFrame::Text(text)) => handle_control(live, stats, &text, outbound).await,
            Ok(InboundFrame::Close) => break,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            error!("Error receiving from browser: {}", e);
            return Err(e);
        }
    }

    info!("Client disconnected");
    Ok(())
}

async fn forward_audio<L: BaseLive>(
    live: &L,
    stats: &mut AudioStats,
    settings: &RelaySettings,
    data: Bytes,
) -> Result<(), RelayError> {
    let len = data.len();
    let crossed = stats.record_audio(len, settings.flush_interval_bytes);

    if stats.should_log_chunk() {
        debug!(chunk = stats.chunk_count(), size = len, "Forwarding audio chunk");
    }
    if crossed {
        info!(
            since_activity_end_kb = kib(stats.bytes_since_activity_end()),
            since_activity_start_s = ?stats.since_activity_start().map(|d| d.as_secs_f32()),
            total_kb = kib(stats.total_bytes()),
            "Accumulated audio since last activity_end"
        );
    }

    live.send_audio(data, settings.input_format).await?;
    Ok(())
}

async fn handle_control<L: BaseLive>(
    live: &L,
    stats: &mut AudioStats,
    text: &str,
    outbound: &mpsc::Sender<LiveMessageRoute>,
) -> Result<(), RelayError> {
    match LiveIncomingMessage::parse(text)? {
        Some(LiveIncomingMessage::Text { content }) => {
            live.send_text(&content, true).await?;
        }
        Some(LiveIncomingMessage::Ping) => {
            send_message(outbound, LiveOutgoingMessage::Pong).await?;
        }
        Some(LiveIncomingMessage::ActivityStart) => {
            stats.mark_activity_start();
            live.send_activity_start().await?;
            info!(cycle = stats.activity_cycles() + 1, "Sent activity_start");
        }
        Some(LiveIncomingMessage::ActivityEnd) => {
            let audio_kb = kib(stats.bytes_since_activity_end());
            let elapsed = stats.mark_activity_end();
            match elapsed {
                Some(duration) => info!(
                    duration_s = duration.as_secs_f32(),
                    audio_kb,
                    cycle = stats.activity_cycles(),
                    "Sent activity_end"
                ),
                None => info!(
                    audio_kb,
                    cycle = stats.activity_cycles(),
                    "Sent activity_end"
                ),
            }
            live.send_activity_end().await?;
        }
        Some(LiveIncomingMessage::Unknown) | None => {
            debug!("Ignoring control message: {}", text);
        }
    }
    Ok(())
}

/// Live -> browser. Ends cleanly only if the response stream closes without
/// reporting an error.
async fn forward_outbound(
    tracker: &mut ModelStateTracker,
    mut responses: LiveEventReceiver,
    outbound: &mpsc::Sender<LiveMessageRoute>,
) -> Result<(), RelayError> {
    while let Some(event) = responses.recv().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                error!("Error receiving from Gemini: {}", e);
                return Err(e.into());
            }
        };

        let classified = tracker.observe(&event);
        for route in LiveMessageRoute::from_classified(classified) {
            if outbound.send(route).await.is_err() {
                error!("Error sending to browser: connection closed");
                return Err(RelayError::OutboundClosed);
            }
        }
    }

    info!("Live response stream ended");
    Ok(())
}

/// Kibibytes rounded to one decimal, for log fields.
fn kib(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 * 10.0).round() / 10.0
}
