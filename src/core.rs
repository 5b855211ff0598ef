use std::any::{Any, TypeId, type_name};
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Deserialize;

/// A type-erased, thread-safe container.
///
/// Every value cached on an output port is stored this way, so that tasks of
/// different kinds can live in the same graph.
pub type Dynamic = Arc<dyn Any + Send + Sync>;

/// Marker used as the tag of ports that accept any value.
enum Opaque {}

/// A type tag attached to every port.
///
/// Two tags are equal when they name the same Rust type. Whether a producer
/// can feed a consumer is decided by a [`Compatibility`] predicate, not by
/// equality alone.
#[derive(Clone, Copy)]
pub struct DataType {
    id: TypeId,
    name: &'static str,
}

impl DataType {
    /// The tag for the Rust type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The tag of a port that accepts values of any type.
    pub fn any() -> Self {
        Self {
            id: TypeId::of::<Opaque>(),
            name: "any",
        }
    }

    pub fn is_any(&self) -> bool {
        self.id == TypeId::of::<Opaque>()
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for DataType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DataType {}

impl Hash for DataType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DataType({})", self.name)
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Decides whether data emitted by a producer port may flow into a consumer
/// port.
///
/// The pipeline consults this predicate whenever an input is bound and
/// whenever a task writes an output value. Any `Fn(DataType, DataType) -> bool`
/// closure can be used as a predicate.
pub trait Compatibility: Send + Sync {
    fn is_compatible(&self, producer: DataType, consumer: DataType) -> bool;
}

impl<F> Compatibility for F
where
    F: Fn(DataType, DataType) -> bool + Send + Sync,
{
    fn is_compatible(&self, producer: DataType, consumer: DataType) -> bool {
        self(producer, consumer)
    }
}

/// Accepts a connection when both tags are the same type, or when the
/// consumer accepts anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exact;

impl Compatibility for Exact {
    fn is_compatible(&self, producer: DataType, consumer: DataType) -> bool {
        producer == consumer || consumer.is_any()
    }
}

/// A registry of subtype relations between data types.
///
/// A producer is compatible with a consumer when both are the same type, when
/// the consumer accepts anything, or when the consumer type can be reached
/// from the producer type by following registered subtype links.
///
/// ```rust
/// use nagare::{Compatibility, DataType, TypeRegistry};
///
/// struct Data;
/// struct Raster;
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Raster, Data>();
///
/// assert!(registry.is_compatible(DataType::of::<Raster>(), DataType::of::<Data>()));
/// assert!(!registry.is_compatible(DataType::of::<Data>(), DataType::of::<Raster>()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    parents: HashMap<DataType, HashSet<DataType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `Sub` may be used wherever `Super` is accepted.
    pub fn register<Sub: ?Sized + 'static, Super: ?Sized + 'static>(&mut self) -> &mut Self {
        self.register_subtype(DataType::of::<Sub>(), DataType::of::<Super>())
    }

    pub fn register_subtype(&mut self, sub: DataType, sup: DataType) -> &mut Self {
        self.parents.entry(sub).or_default().insert(sup);
        self
    }

    /// Returns true when `sub` is `sup` or a transitive subtype of it.
    pub fn is_subtype(&self, sub: DataType, sup: DataType) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![sub];

        while let Some(current) = stack.pop() {
            if current == sup {
                return true;
            }

            if !visited.insert(current) {
                continue;
            }

            if let Some(parents) = self.parents.get(&current) {
                stack.extend(parents.iter().copied());
            }
        }

        false
    }
}

impl Compatibility for TypeRegistry {
    fn is_compatible(&self, producer: DataType, consumer: DataType) -> bool {
        consumer.is_any() || self.is_subtype(producer, consumer)
    }
}

/// Engine settings.
///
/// All fields have defaults, so a partial JSON document is enough:
///
/// ```rust
/// let config = nagare::Config::from_json(r#"{ "max_depth": 64 }"#).unwrap();
/// assert_eq!(config.max_depth, 64);
/// assert!(config.diagnostics);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The longest chain of stale producers a single read may refresh before
    /// giving up with [`EngineError::DepthExceeded`](crate::EngineError::DepthExceeded).
    pub max_depth: usize,
    /// Whether run counts and timings are recorded in [`Diagnostics`](crate::Diagnostics).
    pub diagnostics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 512,
            diagnostics: true,
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
