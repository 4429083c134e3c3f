//! Failure modes for building clients and moving records through them.

/// Failure constructing or operating a producer/consumer.
#[derive(Debug, thiserror::Error)]
pub enum KafkaError {
    /// The client could not be constructed from its configuration.
    #[error("failed to create {kind}: {source}")]
    ClientCreation {
        /// `"producer"` or `"consumer"`.
        kind: &'static str,
        /// The underlying client library error.
        #[source]
        source: rdkafka::error::KafkaError,
    },

    /// A subscribe call against a consumer failed.
    #[error("failed to subscribe to {topics:?}: {source}")]
    Subscribe {
        /// The topics the caller attempted to subscribe to.
        topics: Vec<String>,
        /// The underlying client library error.
        #[source]
        source: rdkafka::error::KafkaError,
    },

    /// A publish failed even after the producer's own internal retries.
    #[error("failed to publish to {topic}: {source}")]
    Publish {
        /// The destination topic.
        topic: String,
        /// The underlying client library error.
        #[source]
        source: rdkafka::error::KafkaError,
    },

    /// A manual offset commit failed.
    #[error("failed to commit offset: {source}")]
    Commit {
        /// The underlying client library error.
        #[source]
        source: rdkafka::error::KafkaError,
    },
}
