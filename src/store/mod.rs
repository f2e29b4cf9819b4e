//! Candle access port (§4.C1, §6), the content-addressed slice cache
//! (§4.C7), and the test/demo fixture format (§10.5).

pub mod candle_store;
pub mod fixture;
pub mod slice;

pub use candle_store::{CandleStore, InMemoryCandleStore};
pub use fixture::{FixtureBuilder, FixtureFile, FixtureSeries};
pub use slice::{slice_key, Slice};
