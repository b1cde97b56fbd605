//! Id generation for newly created records

use uuid::{Builder, Uuid};

use crate::error::{BranchError, Result};

/// Produces a fresh unique id for every created record
///
/// Any `Fn() -> String` closure is a generator, which is how tests get
/// deterministic ids:
///
/// ```
/// use state_branch::GenerateId;
///
/// let fixed = || "custom-id".to_string();
/// assert_eq!(fixed.generate_id().unwrap(), "custom-id");
/// ```
pub trait GenerateId: Send + Sync {
    fn generate_id(&self) -> Result<String>;
}

impl<F> GenerateId for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate_id(&self) -> Result<String> {
        Ok(self())
    }
}

/// Default generator: random v4 UUIDs from the operating system's secure source
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomUuid;

impl GenerateId for RandomUuid {
    fn generate_id(&self) -> Result<String> {
        let id = uuid_v4()?;
        log::trace!("Generated id {}", id);
        Ok(id)
    }
}

/// Generate a random v4 UUID string
///
/// Fails with `UnavailableRandomSource` when the OS cannot provide randomness.
pub fn uuid_v4() -> Result<String> {
    let mut bytes = [0u8; 16];
    getrandom::fill(&mut bytes).map_err(BranchError::UnavailableRandomSource)?;
    Ok(uuid_from_bytes(bytes).to_string())
}

fn uuid_from_bytes(bytes: [u8; 16]) -> Uuid {
    Builder::from_random_bytes(bytes).into_uuid()
}
