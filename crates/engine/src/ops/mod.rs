use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{
    ContainerView, DensityTable, EngineError, ResultEngine, TransactionRecord, locks::ContainerLocks,
};

mod containers;
mod kinds;
mod operations;
mod queries;
mod store;

pub use queries::ConversionRequest;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Result of a committed operation.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationOutcome {
    pub operation_id: Uuid,
    /// Touched containers after the operation, in record order.
    pub containers: Vec<ContainerView>,
    pub transactions: Vec<TransactionRecord>,
}

impl OperationOutcome {
    pub fn container(&self, id: Uuid) -> Option<&ContainerView> {
        self.containers.iter().find(|view| view.container.id == id)
    }
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    density: DensityTable,
    locks: ContainerLocks,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The density table every conversion of this engine uses.
    pub fn density(&self) -> &DensityTable {
        &self.density
    }

    /// Log the outcome of an operation and pass it through.
    fn finish(
        &self,
        name: &'static str,
        result: ResultEngine<OperationOutcome>,
    ) -> ResultEngine<OperationOutcome> {
        match &result {
            Ok(outcome) => {
                let containers: Vec<String> = outcome
                    .containers
                    .iter()
                    .map(|view| view.container.id.to_string())
                    .collect();
                tracing::info!(
                    operation_id = %outcome.operation_id,
                    operation = name,
                    containers = ?containers,
                    records = outcome.transactions.len(),
                    "operation committed"
                );
            }
            Err(EngineError::Database(err)) => {
                tracing::error!(operation = name, "operation failed in store: {err}");
            }
            Err(err) => {
                tracing::debug!(
                    operation = name,
                    kind = err.kind().as_str(),
                    "operation rejected: {err}"
                );
            }
        }
        result
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    density: Option<DensityTable>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Use `table` instead of the built-in density reference.
    pub fn density_table(mut self, table: DensityTable) -> EngineBuilder {
        self.density = Some(table);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            density: self.density.unwrap_or_default(),
            locks: ContainerLocks::default(),
        })
    }
}
