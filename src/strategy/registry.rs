//! Strategy registry for probing documents in a fixed order.

use log::{debug, error, info};

use super::{MsBuildScanStrategy, MsBuildSdkStrategy, ProjectContext, Strategy};
use crate::document::DocumentNode;
use crate::package::PackageModel;

/// Result of offering a document to every registered strategy.
#[derive(Debug)]
pub enum Dispatch {
    /// A strategy accepted the document and extracted a package.
    Extracted {
        strategy: &'static str,
        package: PackageModel,
    },
    /// No strategy accepted the document.
    Unsupported,
    /// Every accepting strategy failed to extract.
    Failed { strategies: Vec<&'static str> },
}

/// Ordered list of strategies.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Create a registry holding the built-in strategies, most specific first.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MsBuildSdkStrategy));
        registry.register(Box::new(MsBuildScanStrategy));
        registry
    }

    /// Append a strategy. It is probed after every strategy registered before it.
    pub fn register(&mut self, strategy: Box<dyn Strategy>) {
        self.strategies.push(strategy);
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Strategy names in probe order.
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|strategy| strategy.name()).collect()
    }

    /// Offer the document to each strategy in order until one extracts a package.
    pub fn dispatch(&self, document: &DocumentNode, context: &ProjectContext) -> Dispatch {
        let mut failed = Vec::new();

        for strategy in &self.strategies {
            if !strategy.is_applicable(document) {
                debug!("Strategy {} does not apply to {:?}", strategy.name(), context.project_path());
                continue;
            }

            match strategy.extract(document, context) {
                Ok(package) => {
                    info!("Extracted package {} using {}", package.id, strategy.name());
                    return Dispatch::Extracted {
                        strategy: strategy.name(),
                        package,
                    };
                }
                Err(err) => {
                    error!(
                        "Strategy {} failed on {:?}: {:#}",
                        strategy.name(),
                        context.project_path(),
                        err
                    );
                    failed.push(strategy.name());
                }
            }
        }

        if failed.is_empty() {
            Dispatch::Unsupported
        } else {
            Dispatch::Failed { strategies: failed }
        }
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
