//! Kinema Core
//!
//! Foundational primitives shared by the Kinema animation crates:
//!
//! - **Elements**: animation targets with a stable identity and named properties
//! - **Property Handles**: identity-hashed handles to mutable properties
//! - **Values**: the closed set of animatable property values
//!
//! # Example
//!
//! ```rust
//! use kinema_core::{Element, PropertyValue};
//!
//! let button = Element::new();
//! let opacity = button.define_property("Opacity", 1.0f32);
//!
//! opacity.set(0.5f32);
//! assert_eq!(opacity.get(), PropertyValue::Float(0.5));
//! assert_eq!(button.property("Opacity"), Some(opacity));
//! ```

pub mod element;
pub mod property;
pub mod value;

pub use element::{Element, ElementId};
pub use property::{PropertyHandle, PropertyMap};
pub use value::{Color, PropertyValue, Vec2};
