use crate::model::GuestMessage;
use tracing::{info, warn};

// Notification transport is an external collaborator: messages are
// relayed to a delivery gateway over a webhook. Dispatch is always
// fire-and-forget; a committed handoff transition is never rolled back
// because the gateway was down. Failed sends are logged and the
// gateway's own retry queue picks them up out-of-band.

pub fn dispatch(message: GuestMessage) {
    let Some(url) = crate::CONFIG.notify_webhook_url.clone() else {
        info!(
            trip_id = message.trip_id,
            category = ?message.category,
            "notification gateway not configured, message stored only"
        );
        return;
    };
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let result = client.post(&url).json(&message).send().await;
        match result {
            Ok(response) if response.status().is_success() => {
                info!(
                    trip_id = message.trip_id,
                    category = ?message.category,
                    "notification dispatched"
                );
            }
            Ok(response) => {
                warn!(
                    trip_id = message.trip_id,
                    status = %response.status(),
                    "notification gateway rejected message"
                );
            }
            Err(err) => {
                warn!(
                    trip_id = message.trip_id,
                    error = %err,
                    "notification dispatch failed"
                );
            }
        }
    });
}
