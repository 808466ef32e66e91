use anyhow::Result;

use crate::strategy::StrategyRegistry;

/// List the built-in strategies in probe order.
pub fn strategies() -> Result<()> {
    let registry = StrategyRegistry::with_defaults();
    for (index, name) in registry.names().iter().enumerate() {
        println!("{}. {}", index + 1, name);
    }
    Ok(())
}
