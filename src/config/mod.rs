//! Run configuration sourced from the plain-text manifest.

pub mod manifest;

pub use manifest::{
    AffiliateDisclosure, CollectLimits, FeedSpec, PipelineConfig, load_manifest, parse_manifest,
};
