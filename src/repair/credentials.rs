//! API credential pool
//!
//! Spreads quota consumption across several platform keys. The selection
//! strategy is injected; there is no affinity between calls.

use crate::models::{CredentialStrategyKind, YoutubeConfig};
use rand::Rng;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Picks an index into a non-empty credential list given per-credential weights
pub trait CredentialStrategy: Send + Sync {
    fn pick(&self, weights: &[u32]) -> Option<usize>;
}

/// Uniform random choice per call
#[derive(Debug, Default)]
pub struct RandomStrategy;

impl CredentialStrategy for RandomStrategy {
    fn pick(&self, weights: &[u32]) -> Option<usize> {
        if weights.is_empty() {
            return None;
        }
        Some(rand::rng().random_range(0..weights.len()))
    }
}

/// Cycles through credentials in order
#[derive(Debug, Default)]
pub struct RoundRobinStrategy {
    next: AtomicUsize,
}

impl CredentialStrategy for RoundRobinStrategy {
    fn pick(&self, weights: &[u32]) -> Option<usize> {
        if weights.is_empty() {
            return None;
        }
        Some(self.next.fetch_add(1, Ordering::Relaxed) % weights.len())
    }
}

/// Random choice proportional to weight; zero-weight credentials are never picked
#[derive(Debug, Default)]
pub struct WeightedStrategy;

impl CredentialStrategy for WeightedStrategy {
    fn pick(&self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|w| u64::from(*w)).sum();
        if total == 0 {
            return None;
        }
        let mut roll = rand::rng().random_range(0..total);
        for (idx, weight) in weights.iter().enumerate() {
            let weight = u64::from(*weight);
            if roll < weight {
                return Some(idx);
            }
            roll -= weight;
        }
        None
    }
}

pub fn strategy_for(kind: CredentialStrategyKind) -> Box<dyn CredentialStrategy> {
    match kind {
        CredentialStrategyKind::Random => Box::new(RandomStrategy),
        CredentialStrategyKind::RoundRobin => Box::new(RoundRobinStrategy::default()),
        CredentialStrategyKind::Weighted => Box::new(WeightedStrategy),
    }
}

/// A named API key
#[derive(Clone)]
pub struct Credential {
    /// Environment variable the key came from
    pub name: String,
    secret: String,
    pub weight: u32,
}

impl Credential {
    pub fn new(name: impl Into<String>, secret: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
            weight,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .field("weight", &self.weight)
            .finish()
    }
}

pub struct CredentialPool {
    credentials: Vec<Credential>,
    weights: Vec<u32>,
    strategy: Box<dyn CredentialStrategy>,
}

impl CredentialPool {
    pub fn new(credentials: Vec<Credential>, strategy: Box<dyn CredentialStrategy>) -> Self {
        let weights = credentials.iter().map(|c| c.weight).collect();
        Self {
            credentials,
            weights,
            strategy,
        }
    }

    /// Pool built from environment variables matching the configured prefix
    pub fn from_config(config: &YoutubeConfig) -> Self {
        let credentials = config
            .resolve_keys()
            .into_iter()
            .map(|(name, secret)| {
                let weight = config.weight_for(&name);
                Credential::new(name, secret, weight)
            })
            .collect();
        Self::new(credentials, strategy_for(config.strategy))
    }

    /// Select a key for one external call
    pub fn select(&self) -> Option<&str> {
        let idx = self.strategy.pick(&self.weights)?;
        self.credentials.get(idx).map(|c| c.secret())
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.credentials.iter().map(|c| c.name.as_str()).collect()
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
