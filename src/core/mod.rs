pub mod extract;
pub mod lookup;
pub mod normalize;
pub mod probe;

pub use crate::domain::model::{LookupResponse, PhoneNumber, ProbeResult, SourceProbe};
pub use crate::domain::ports::{ConfigProvider, Fetcher};
pub use crate::utils::error::Result;
