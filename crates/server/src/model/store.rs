use crate::model::types::{Catalog, NodeEntry, Parameters, SubscriptionEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use vcloud_common::prelude::{Error, Result};

/// Access to the parameters and visibility rules owned by the host platform.
///
#[async_trait]
pub trait ParameterStore {
    /// Parameters of a node.
    async fn node_parameters(&self, node: &str) -> Result<Parameters>;

    /// Parameters of a subscription, overlaid on those of its node.
    async fn subscription_parameters(&self, subscription: i32) -> Result<Parameters>;

    async fn is_node_visible(&self, node: &str, login: &str) -> Result<bool>;

    async fn is_subscription_visible(&self, subscription: i32, login: &str) -> Result<bool>;

    /// Number of schedules attached to a subscription.
    async fn count_schedules(&self, subscription: i32) -> Result<i64>;
}

/// Read-only [`ParameterStore`] seeded from a [`Catalog`].
///
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: HashMap<String, NodeEntry>,
    subscriptions: HashMap<i32, SubscriptionEntry>,
}

impl MemoryStore {
    pub fn from_catalog(catalog: Catalog) -> Self {
        let store = Self {
            nodes: catalog
                .nodes
                .into_iter()
                .map(|node| (node.id.clone(), node))
                .collect(),
            subscriptions: catalog
                .subscriptions
                .into_iter()
                .map(|subscription| (subscription.id, subscription))
                .collect(),
        };
        tracing::info!(
            target: "config",
            nodes = store.nodes.len(),
            subscriptions = store.subscriptions.len(),
            "Parameter store ready."
        );

        store
    }

    fn node(&self, node: &str) -> Result<&NodeEntry> {
        self.nodes
            .get(node)
            .ok_or_else(|| Error::NotFound(format!("Node '{node}'")))
    }

    fn subscription(&self, subscription: i32) -> Result<&SubscriptionEntry> {
        self.subscriptions
            .get(&subscription)
            .ok_or_else(|| Error::NotFound(format!("Subscription '{subscription}'")))
    }
}

#[async_trait]
impl ParameterStore for MemoryStore {
    async fn node_parameters(&self, node: &str) -> Result<Parameters> {
        Ok(self.node(node)?.parameters.clone())
    }

    async fn subscription_parameters(&self, subscription: i32) -> Result<Parameters> {
        let subscription = self.subscription(subscription)?;
        let mut parameters = self.node(&subscription.node)?.parameters.clone();
        parameters.extend(subscription.parameters.clone());

        Ok(parameters)
    }

    async fn is_node_visible(&self, node: &str, login: &str) -> Result<bool> {
        Ok(self
            .nodes
            .get(node)
            .is_some_and(|node| node.visible_to.iter().any(|user| user == login)))
    }

    async fn is_subscription_visible(&self, subscription: i32, login: &str) -> Result<bool> {
        let subscription = self.subscription(subscription)?;
        self.is_node_visible(&subscription.node, login).await
    }

    async fn count_schedules(&self, subscription: i32) -> Result<i64> {
        Ok(self.subscription(subscription)?.schedules)
    }
}
