//! Detail fetch and publish.
//!
//! Identifiers are handled strictly one after another. The first failed
//! fetch or publish aborts the loop, so nothing after it is attempted.

use tracing::{error, info};

use crate::detail::DetailSource;
use crate::error::WebhookError;
use crate::queue::{BrokerError, TopicBroker, TopicMessage, TopicSender};

/// Fetch each identifier's record and publish it, returning the number of
/// messages published.
///
/// A sender is opened for the duration of the call and closed on every exit
/// path. No sender is opened when there is nothing to relay.
pub async fn relay_details(
    ids: &[String],
    details: &dyn DetailSource,
    broker: &dyn TopicBroker,
) -> Result<usize, WebhookError> {
    if ids.is_empty() {
        info!("relay_nothing_to_publish");
        return Ok(0);
    }

    let mut sender = broker.open_sender().await.map_err(|e| {
        error!(error = %e, "broker_client_init_failed");
        WebhookError::ClientInit(e)
    })?;

    let outcome = publish_each(ids, details, sender.as_mut()).await;
    sender.close().await;
    outcome
}

async fn publish_each(
    ids: &[String],
    details: &dyn DetailSource,
    sender: &mut dyn TopicSender,
) -> Result<usize, WebhookError> {
    for (position, id) in ids.iter().enumerate() {
        info!(id = %id, position = position, total = ids.len(), "detail_relay_starting");

        let record = details.fetch_detail(id).await.map_err(|source| {
            error!(id = %id, error = %source, "detail_fetch_failed");
            WebhookError::Fetch {
                id: id.clone(),
                source,
            }
        })?;

        let message = TopicMessage::from_record(id, &record).map_err(|e| WebhookError::Publish {
            id: id.clone(),
            source: BrokerError::Serialize(e),
        })?;

        sender.send(&message).await.map_err(|source| {
            error!(id = %id, error = %source, "detail_publish_failed");
            WebhookError::Publish {
                id: id.clone(),
                source,
            }
        })?;

        info!(id = %id, body_length = message.body.len(), "detail_published");
    }

    Ok(ids.len())
}
