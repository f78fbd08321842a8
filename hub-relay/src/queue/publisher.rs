//! AMQP topic publisher.
//!
//! Each request opens its own connection and channel, publishes with
//! confirms enabled, and closes both when done. The topic is a durable
//! fanout exchange so every bound subscription queue receives each message.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions},
    publisher_confirm::Confirmation,
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
};
use tracing::{info, warn};

use super::{BrokerError, TopicBroker, TopicMessage, TopicSender, MESSAGE_CONTENT_TYPE};

/// Opens AMQP topic senders for one topic.
#[derive(Clone)]
pub struct AmqpTopicBroker {
    url: String,
    topic: String,
    timeout: Duration,
}

impl AmqpTopicBroker {
    /// Create a broker for `topic` on the broker at `url`.
    pub fn new(url: String, topic: String, timeout: Duration) -> Self {
        Self {
            url,
            topic,
            timeout,
        }
    }

    async fn prepare_channel(&self, conn: &Connection) -> Result<Channel, BrokerError> {
        let channel = bounded(self.timeout, conn.create_channel()).await?;

        bounded(
            self.timeout,
            channel.confirm_select(ConfirmSelectOptions::default()),
        )
        .await?;

        bounded(
            self.timeout,
            channel.exchange_declare(
                &self.topic,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            ),
        )
        .await?;

        Ok(channel)
    }
}

#[async_trait]
impl TopicBroker for AmqpTopicBroker {
    async fn open_sender(&self) -> Result<Box<dyn TopicSender>, BrokerError> {
        info!(topic = %self.topic, "amqp_sender_connecting");

        let conn = bounded(
            self.timeout,
            Connection::connect(&self.url, ConnectionProperties::default()),
        )
        .await?;

        let channel = match self.prepare_channel(&conn).await {
            Ok(ch) => ch,
            Err(e) => {
                if let Err(close_err) = conn.close(200, "Setup failed").await {
                    warn!(error = %close_err, "amqp_connection_close_error");
                }
                return Err(e);
            }
        };

        info!(topic = %self.topic, "amqp_sender_ready");

        Ok(Box::new(AmqpTopicSender {
            connection: Some(conn),
            channel: Some(channel),
            topic: self.topic.clone(),
            timeout: self.timeout,
        }))
    }
}

/// Sender bound to a single connection and channel.
pub struct AmqpTopicSender {
    connection: Option<Connection>,
    channel: Option<Channel>,
    topic: String,
    timeout: Duration,
}

#[async_trait]
impl TopicSender for AmqpTopicSender {
    async fn send(&mut self, message: &TopicMessage) -> Result<(), BrokerError> {
        let channel = self.channel.as_ref().ok_or(BrokerError::Closed)?;

        let confirm = bounded(
            self.timeout,
            channel.basic_publish(
                &self.topic,
                "",
                BasicPublishOptions::default(),
                &message.body,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type(MESSAGE_CONTENT_TYPE.into())
                    .with_message_id(message.message_id.clone().into()),
            ),
        )
        .await?;

        let confirmation = bounded(self.timeout, confirm).await?;
        if let Confirmation::Nack(_) = confirmation {
            warn!(topic = %self.topic, message_id = %message.message_id, "amqp_publish_nacked");
            return Err(BrokerError::Nacked {
                message_id: message.message_id.clone(),
            });
        }

        info!(
            topic = %self.topic,
            message_id = %message.message_id,
            body_length = message.body.len(),
            "amqp_message_published"
        );

        Ok(())
    }

    async fn close(&mut self) {
        if let Some(ch) = self.channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "amqp_channel_close_error");
            }
        }

        if let Some(conn) = self.connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "amqp_connection_close_error");
            }
        }

        info!(topic = %self.topic, "amqp_sender_closed");
    }
}

/// Await a lapin operation, failing once `timeout` elapses.
async fn bounded<T, F>(timeout: Duration, fut: F) -> Result<T, BrokerError>
where
    F: Future<Output = lapin::Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(BrokerError::Timeout(timeout.as_millis() as u64)),
    }
}
