pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod postgres;
pub mod traits;

pub use error::{Result, StoreError};
pub use postgres::{PgContentStore, PgPersonaPool};
pub use traits::{ContentStore, PersonaPool};
