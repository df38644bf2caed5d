/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///   OECD export (.csv)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Frame (all cells text)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  project columns, coerce numbers, equality predicates
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  grouped means, top-N, pivot grids
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
