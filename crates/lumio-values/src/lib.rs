//! Lumio typed values
//!
//! Everything that interprets a raw stored attribute value:
//! - **Registry**: [`Constraint`] decodes an attribute's type tag and
//!   configuration and builds typed values of its kind
//! - **Typed values**: [`DataValue`] over 17 kinds, each implementing
//!   [`TypedValue`] (format, serialize, validate, compare, match)
//! - **Aggregation**: sum, min, max, average, median, count, unique and join
//!   over one attribute's values
//!
//! ## Supporting modules
//!
//! - `decimal`: exact decimal parsing, rounding and rendering
//! - `currency`: compiled-in number-format and currency tables per language
//! - `date_format`: moment-style date format tokens
//! - `duration_units`: `1w3d4h` style durations
//! - `text`: accent folding, HTML escaping and case styles
//!
//! Nothing here keeps global state; the locale and all reference data travel
//! in [`lumio_model::ConstraintData`].

pub mod aggregation;
pub mod constraint;
pub mod currency;
pub mod date_format;
pub mod decimal;
pub mod duration_units;
pub mod text;
pub mod value;

pub use aggregation::{aggregate_data_values, is_value_aggregation, DataAggregationType};
pub use constraint::{create_constraint, Constraint};
pub use value::{DataValue, TypedValue};
