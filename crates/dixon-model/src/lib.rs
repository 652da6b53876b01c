//! Data model for the harmonized Dixon database.

pub mod enums;
pub mod error;
pub mod ids;
pub mod series;

pub use enums::{Acquisition, Role, Site, Study};
pub use error::{ModelError, Result};
pub use ids::PatientId;
pub use series::{CanonicalSeriesName, RawSeries, SeriesGroup, SeriesTags, trailing_number};
