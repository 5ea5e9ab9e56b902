/// Data layer: core types, ingestion, normalization, alignment and selection.
///
/// Architecture:
/// ```text
///  .out (+ optional .inf)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  split lines on whitespace → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  numeric coercion, axis / 60, drop bad rows → Series
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  merge    │  outer join (or positional) → WideTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  choose overlay columns
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod merge;
pub mod model;
pub mod normalize;
