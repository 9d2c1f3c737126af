pub mod coercion;
pub mod types;

pub use coercion::coerce_value;

// Re-export all types at the schema module level
pub use types::{
    Entity,
    EntityModel,
    EntityType,
    PropertyAccess,
    PropertyDef,
    PropertyType,
    SchemaError,
};
