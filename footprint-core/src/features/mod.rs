//! Feature engineering: record normalization, the fitted encoder, and the
//! store that keeps the encoder artifact on disk.

pub mod encoder;
pub mod normalize;
pub mod store;

pub use encoder::{Encoded, Encoder, EncoderArtifact};
pub use normalize::{FeatureValue, NormalizedFeatureMap, feature_key, indicator_key, normalize};
pub use store::{EncoderOrigin, EncoderStore};
