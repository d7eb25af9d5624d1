pub mod engine;
pub mod output;
pub mod race;

pub use crate::domain::model::{AddressRecord, Cep, LookupReply, RaceOutcome, SourceFailure};
pub use crate::domain::ports::AddressSource;
pub use crate::utils::error::Result;
