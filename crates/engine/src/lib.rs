//! Spirit measurement and container operation engine.
//!
//! The engine tracks distilled spirit held in containers and records every
//! change to their contents as an immutable transaction:
//!
//! - [`density`] and [`conversion`] turn a scale weight into wine and proof
//!   gallons.
//! - [`Engine`] applies the container operations (create, fill, transfer,
//!   proof-down, bottle, tank-adjust, change-account, reversal) under
//!   per-container locks, one database transaction per operation.

pub use commands::{
    BottleCmd, BottledOutput, ChangeAccountCmd, EditContainerCmd, FillCmd, FillSpec,
    NewContainerCmd, Operation, ProofDownCmd, Quantity, ReverseCmd, ReverseTarget, TankAdjustCmd,
    TransferCmd,
};
pub use container_kinds::ContainerKind;
pub use containers::{Account, Container, ContainerStatus, ContainerView};
pub use conversion::Gauge;
pub use density::{DensitySample, DensityTable};
pub use error::{EngineError, ErrorKind};
pub use ops::{ConversionRequest, Engine, EngineBuilder, OperationOutcome};
pub use transactions::{TransactionRecord, TransactionType};

mod commands;
mod container_kinds;
mod containers;
pub mod conversion;
pub mod density;
mod error;
mod locks;
mod ops;
mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
