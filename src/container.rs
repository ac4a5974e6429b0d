use once_cell::sync::OnceCell;
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type Service = Arc<dyn Any + Send + Sync>;
type Factory = Box<dyn Fn(&Container) -> Result<Service, anyhow::Error> + Send + Sync>;

thread_local! {
    static RESOLVING: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

#[derive(thiserror::Error, Debug)]
pub enum ContainerError {
    #[error("No service is bound to [{0}]")]
    NotBound(String),
    #[error("Service [{key}] is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
    #[error("Circular dependency while resolving {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),
    #[error("Failed to build service [{key}]")]
    Resolution {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

/// A unit of registration. Deferred providers are only registered once
/// one of the keys they provide is requested.
pub trait ServiceProvider: Send + Sync + 'static {
    fn register(&self, container: &Container);

    fn provides(&self) -> Vec<String> {
        Vec::new()
    }

    fn is_deferred(&self) -> bool {
        false
    }
}

enum Binding {
    Shared {
        factory: Option<Factory>,
        instance: OnceCell<Service>,
    },
    Transient(Factory),
}

/// A deferred provider and whether its `register` has completed.
struct DeferredProvider {
    provider: Arc<dyn ServiceProvider>,
    registered: OnceCell<()>,
}

/// Shared registry of application services, keyed by name.
#[derive(Default)]
pub struct Container {
    bindings: RwLock<HashMap<String, Arc<Binding>>>,
    deferred: RwLock<HashMap<String, Arc<DeferredProvider>>>,
}

/// Key a service is registered under when it is bound by type.
pub fn type_key<T: ?Sized + 'static>() -> &'static str {
    type_name::<T>()
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory evaluated at most once, on first resolution.
    pub fn singleton<T, F>(&self, key: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, anyhow::Error> + Send + Sync + 'static,
    {
        self.insert(
            key.into(),
            Binding::Shared {
                factory: Some(erase(factory)),
                instance: OnceCell::new(),
            },
        );
    }

    pub fn singleton_type<T, F>(&self, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, anyhow::Error> + Send + Sync + 'static,
    {
        self.singleton(type_key::<T>(), factory);
    }

    /// Registers a factory evaluated on every resolution.
    pub fn bind<T, F>(&self, key: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, anyhow::Error> + Send + Sync + 'static,
    {
        self.insert(key.into(), Binding::Transient(erase(factory)));
    }

    pub fn instance<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.insert(
            key.into(),
            Binding::Shared {
                factory: None,
                instance: OnceCell::with_value(Arc::new(value)),
            },
        );
    }

    pub fn register_provider(&self, provider: Arc<dyn ServiceProvider>) {
        if provider.is_deferred() {
            let entry = Arc::new(DeferredProvider {
                provider: Arc::clone(&provider),
                registered: OnceCell::new(),
            });
            let mut deferred = self.deferred.write().unwrap_or_else(|e| e.into_inner());
            for key in provider.provides() {
                deferred.insert(key, Arc::clone(&entry));
            }
        } else {
            provider.register(self);
        }
    }

    /// Whether `key` is bound or promised by a deferred provider.
    pub fn bound(&self, key: &str) -> bool {
        self.read_bindings().contains_key(key)
            || self
                .deferred
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .contains_key(key)
    }

    /// Whether the shared instance behind `key` has been built.
    pub fn resolved(&self, key: &str) -> bool {
        match self.read_bindings().get(key).map(Arc::as_ref) {
            Some(Binding::Shared { instance, .. }) => instance.get().is_some(),
            _ => false,
        }
    }

    pub fn make<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, ContainerError> {
        self.resolve(key)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn make_type<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContainerError> {
        self.make(type_key::<T>())
    }

    fn resolve(&self, key: &str) -> Result<Service, ContainerError> {
        let binding = match self.binding(key) {
            Some(binding) => binding,
            None => {
                self.load_deferred_provider(key);
                self.binding(key)
                    .ok_or_else(|| ContainerError::NotBound(key.to_string()))?
            }
        };

        match binding.as_ref() {
            Binding::Shared { instance, factory } => {
                if let Some(service) = instance.get() {
                    return Ok(Arc::clone(service));
                }
                let factory = factory
                    .as_ref()
                    .ok_or_else(|| ContainerError::NotBound(key.to_string()))?;
                let _guard = ResolvingGuard::enter(key)?;
                instance
                    .get_or_try_init(|| self.build(key, factory))
                    .map(Arc::clone)
            }
            Binding::Transient(factory) => {
                let _guard = ResolvingGuard::enter(key)?;
                self.build(key, factory)
            }
        }
    }

    fn build(&self, key: &str, factory: &Factory) -> Result<Service, ContainerError> {
        tracing::debug!(service = %key, "Building service");
        factory(self).map_err(|source| ContainerError::Resolution {
            key: key.to_string(),
            source,
        })
    }

    /// Registers the deferred provider of `key` at most once. Callers racing
    /// the first registration block until it has finished.
    fn load_deferred_provider(&self, key: &str) {
        let entry = match self
            .deferred
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
        {
            Some(entry) => Arc::clone(entry),
            None => return,
        };
        entry.registered.get_or_init(|| {
            tracing::debug!(service = %key, "Registering deferred provider");
            entry.provider.register(self);
        });
    }

    fn binding(&self, key: &str) -> Option<Arc<Binding>> {
        self.read_bindings().get(key).cloned()
    }

    fn insert(&self, key: String, binding: Binding) {
        self.bindings
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, Arc::new(binding));
    }

    fn read_bindings(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<Binding>>> {
        self.bindings.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<String> = self.read_bindings().keys().cloned().collect();
        keys.sort();
        f.debug_struct("Container").field("bindings", &keys).finish()
    }
}

fn erase<T, F>(factory: F) -> Factory
where
    T: Any + Send + Sync,
    F: Fn(&Container) -> Result<T, anyhow::Error> + Send + Sync + 'static,
{
    Box::new(move |container: &Container| {
        factory(container).map(|service| Arc::new(service) as Service)
    })
}

/// Tracks the keys being built on the current thread.
struct ResolvingGuard;

impl ResolvingGuard {
    fn enter(key: &str) -> Result<Self, ContainerError> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|k| k == key) {
                let mut chain = stack.clone();
                chain.push(key.to_string());
                return Err(ContainerError::CircularDependency(chain));
            }
            stack.push(key.to_string());
            Ok(ResolvingGuard)
        })
    }
}

impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
