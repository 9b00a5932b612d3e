use crate::config::BroadcastMode;
use crate::core::chat::ChatApi;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    Failed(String),
    /// Not attempted, an earlier channel already received the message.
    Skipped,
}

/// The result of posting to one destination channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub channel_id: u64,
    pub outcome: Outcome,
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        self.outcome == Outcome::Sent
    }
}

/// Posts `content` to the configured `channels`, in order. With
/// [`BroadcastMode::First`] channels after the first successful one are
/// skipped. Failed channels are logged and never retried.
pub async fn broadcast<C>(
    chat: &C,
    channels: &[u64],
    mode: BroadcastMode,
    content: &str,
) -> Vec<Delivery>
where
    C: ChatApi + ?Sized,
{
    if channels.is_empty() {
        log::warn!("[BOT] No announce channels configured, dropping message");
    }

    let mut deliveries = Vec::with_capacity(channels.len());
    let mut delivered = false;

    for channel_id in channels.iter().copied() {
        if delivered && mode == BroadcastMode::First {
            deliveries.push(Delivery {
                channel_id,
                outcome: Outcome::Skipped,
            });
            continue;
        }

        let outcome = match chat.send_message(channel_id, content).await {
            Ok(()) => {
                delivered = true;
                Outcome::Sent
            }
            Err(err) => {
                log::warn!("[BOT] Failed to post into channel {}: {}", channel_id, err);
                Outcome::Failed(err.to_string())
            }
        };

        deliveries.push(Delivery {
            channel_id,
            outcome,
        });
    }

    deliveries
}
