//! Action commands - the public boundary of the integration layer
//!
//! Commands take identifiers as text, as they arrive from a UI or the
//! runner, and always answer with an [`ActionResponse`]. No error crosses
//! this boundary any other way.
//!
//! [`ActionResponse`]: crate::ActionResponse

mod calls;
mod connections;
mod donations;

pub use calls::*;
pub use connections::*;
pub use donations::*;

use bergerie_domain::{BergerieError, Provider, Result};
use uuid::Uuid;

fn parse_establishment_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|e| BergerieError::InvalidInput(format!("invalid establishment id {raw:?}: {e}")))
}

fn parse_provider(raw: &str) -> Result<Provider> {
    raw.trim().parse::<Provider>().map_err(BergerieError::InvalidInput)
}
