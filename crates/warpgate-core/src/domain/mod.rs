//! Domain model (descriptor, artifacts, outcome, handle, errors).

pub mod artifact;
pub mod descriptor;
pub mod errors;
pub mod handle;
pub mod outcome;

pub use self::artifact::{ArtifactManifest, ContractManifest};
pub use self::descriptor::TaskDescriptor;
pub use self::errors::{
    BuildError, GateError, GateFault, RemoteError, TaskFailure, TransportError,
};
pub use self::handle::RemoteHandle;
pub use self::outcome::{FailureOrigin, Outcome};
