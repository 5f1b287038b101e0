use tokio::task::JoinHandle;

use crate::error::RegistryError;
use crate::registry::{Domain, Registry};

/// Supplies commands, converters, presenters and types to a registry at
/// startup. Replaces reflection-based discovery: a host registers what it
/// exposes with explicit calls.
pub trait RegistryLoader: Send + 'static {
    fn load(&self, registry: &mut Registry) -> Result<(), RegistryError>;
}

impl<F> RegistryLoader for F
where
    F: Fn(&mut Registry) -> Result<(), RegistryError> + Send + 'static,
{
    fn load(&self, registry: &mut Registry) -> Result<(), RegistryError> {
        self(registry)
    }
}

/// Build a registry on the current thread: builtins, then the loader's
/// entries, then enable. A failing loader leaves nothing enabled.
pub fn discover_blocking<L: RegistryLoader + ?Sized>(loader: &L) -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    loader.load(&mut registry)?;
    registry.set_enabled(true);
    tracing::info!(
        "discovery complete: {} commands, {} types, {} converters, {} presenters",
        registry.count(Domain::Commands),
        registry.count(Domain::Types),
        registry.count(Domain::Converters),
        registry.count(Domain::Presenters),
    );
    Ok(registry)
}

/// Discovery running on the blocking pool. Await `ready` before accepting input.
pub struct DiscoveryHandle {
    task: JoinHandle<Result<Registry, RegistryError>>,
}

impl DiscoveryHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for discovery and take the populated, enabled registry.
    pub async fn ready(self) -> Result<Registry, RegistryError> {
        self.task.await.map_err(|e| RegistryError::Discovery {
            message: e.to_string(),
        })?
    }
}

/// Start discovery in the background. Must be called inside a tokio runtime.
pub fn spawn_discovery(loader: impl RegistryLoader) -> DiscoveryHandle {
    let task = tokio::task::spawn_blocking(move || discover_blocking(&loader));
    DiscoveryHandle { task }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::command::CommandBuilder;
    use crate::value::Value;

    fn ping(registry: &mut Registry) -> Result<(), RegistryError> {
        registry.register_command(CommandBuilder::new("ping").host(|_, _| Ok(Value::from("pong"))))
    }

    #[test]
    fn blocking_discovery_enables_registry() {
        let registry = discover_blocking(&ping).unwrap();
        assert!(registry.is_enabled());
        assert!(registry.command("ping").is_some());
    }

    #[test]
    fn loader_error_propagates() {
        let failing = |r: &mut Registry| {
            ping(r)?;
            ping(r)
        };
        assert!(matches!(
            discover_blocking(&failing),
            Err(RegistryError::Duplicate { .. })
        ));
    }

    #[tokio::test]
    async fn background_discovery_signals_ready() {
        let handle = spawn_discovery(ping);
        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }
        let registry = handle.ready().await.unwrap();
        assert!(registry.is_enabled());
        assert_eq!(registry.command("ping").unwrap().name, "ping");
    }

    #[tokio::test]
    async fn panicking_loader_reports_discovery_error() {
        #[allow(clippy::panic)]
        let handle = spawn_discovery(|_: &mut Registry| -> Result<(), RegistryError> { panic!("loader bug") });
        assert!(matches!(handle.ready().await, Err(RegistryError::Discovery { .. })));
    }
}
