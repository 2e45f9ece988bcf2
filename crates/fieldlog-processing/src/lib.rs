//! Fieldlog Processing Library
//!
//! The upload processing pipeline: coordinate encoding, image normalization,
//! GPS EXIF embedding, and caption stamping. Every stage is synchronous and
//! CPU/IO bound; the pipeline wrapper runs the whole chain under
//! `spawn_blocking` so request tasks are never starved.

pub mod geo;
pub mod geotag;
mod glyphs;
pub mod gps_exif;
pub mod normalize;
pub mod pipeline;
pub mod stamp;

pub use geo::{DmsCoordinate, DmsRational, Rational};
pub use geotag::{write_geotag, GeotagOutcome};
pub use normalize::normalize;
pub use pipeline::{ProcessedImage, UploadContext, UploadPipeline};
pub use stamp::{stamp, StampOptions, StampOutcome};
