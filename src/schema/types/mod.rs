pub mod entity;
pub mod errors;
pub mod fields;
pub mod model;
pub use entity::{Entity, EntityType, PropertyAccess};
pub use errors::SchemaError;
pub use fields::{PropertyDef, PropertyType};
pub use model::EntityModel;
