pub mod plausible;
pub mod trait_def;

pub use plausible::PlausibleClient;
pub use trait_def::{
    decode_rows, AggregateRequest, AggregateResults, BreakdownRequest, StatsProvider,
    UpstreamError, UpstreamResult,
};
