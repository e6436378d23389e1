/// Data layer: core types, upload decoding, and feature alignment.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet upload
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  bytes → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  align    │  pad / truncate to the model's feature count
///   └──────────┘
///        │
///        ▼
///     classifier
/// ```

pub mod align;
pub mod loader;
pub mod model;
