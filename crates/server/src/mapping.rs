//! Conversions between engine types and their wire shapes.

use api_types::{
    Account as ApiAccount, Quantity as ApiQuantity,
    container::{ContainerStatus as ApiStatus, ContainerView as ApiContainerView},
    container_kind::ContainerKindView,
    conversion::ConversionResponse,
    operation::{BottledOutput as ApiBottledOutput, OperationRequest, OperationResponse},
    transaction::{TransactionType as ApiTransactionType, TransactionView},
};
use engine::{
    Account, BottleCmd, BottledOutput, ChangeAccountCmd, ContainerKind, ContainerStatus,
    ContainerView, Gauge, Operation, OperationOutcome, ProofDownCmd, Quantity, TankAdjustCmd,
    TransactionRecord, TransactionType, TransferCmd,
};

pub fn quantity(value: ApiQuantity) -> Quantity {
    match value {
        ApiQuantity::NetWeight(v) => Quantity::NetWeight(v),
        ApiQuantity::GrossWeight(v) => Quantity::GrossWeight(v),
        ApiQuantity::WineGallons(v) => Quantity::WineGallons(v),
        ApiQuantity::ProofGallons(v) => Quantity::ProofGallons(v),
    }
}

pub fn account(value: ApiAccount) -> Account {
    match value {
        ApiAccount::Storage => Account::Storage,
        ApiAccount::Production => Account::Production,
        ApiAccount::Bottling => Account::Bottling,
        ApiAccount::Sampling => Account::Sampling,
    }
}

fn api_account(value: Account) -> ApiAccount {
    match value {
        Account::Storage => ApiAccount::Storage,
        Account::Production => ApiAccount::Production,
        Account::Bottling => ApiAccount::Bottling,
        Account::Sampling => ApiAccount::Sampling,
    }
}

fn bottled_output(value: ApiBottledOutput) -> BottledOutput {
    BottledOutput {
        bottle_count: value.bottle_count,
        bottle_size_ml: value.bottle_size_ml,
        proof: value.proof,
    }
}

pub fn operation(request: OperationRequest) -> Operation {
    match request {
        OperationRequest::Transfer {
            source_id,
            destination_id,
            amount,
            loss_proof_gallons,
            destination_account,
            notes,
        } => Operation::Transfer(TransferCmd {
            source_id,
            destination_id,
            amount: amount.map(quantity),
            loss_proof_gallons: loss_proof_gallons.unwrap_or_default(),
            destination_account: destination_account.map(account),
            notes,
        }),
        OperationRequest::ProofDown {
            container_id,
            new_proof,
            notes,
        } => Operation::ProofDown(ProofDownCmd {
            container_id,
            new_proof,
            notes,
        }),
        OperationRequest::Bottle {
            container_id,
            amount,
            declared,
            notes,
        } => Operation::Bottle(BottleCmd {
            container_id,
            amount: amount.map(quantity),
            declared: declared.map(bottled_output),
            notes,
        }),
        OperationRequest::TankAdjust {
            container_id,
            weight,
            proof,
            temperature_f,
            notes,
        } => Operation::TankAdjust(TankAdjustCmd {
            container_id,
            weight: weight.map(quantity),
            proof,
            temperature_f,
            notes,
        }),
        OperationRequest::ChangeAccount {
            container_id,
            account: target,
            notes,
        } => Operation::ChangeAccount(ChangeAccountCmd {
            container_id,
            account: account(target),
            notes,
        }),
    }
}

pub fn kind_view(kind: ContainerKind) -> ContainerKindView {
    ContainerKindView {
        id: kind.id,
        name: kind.name,
        capacity_gallons: kind.capacity_gallons,
        tare_weight: kind.tare_weight,
    }
}

pub fn container_view(view: ContainerView) -> ApiContainerView {
    let ContainerView {
        container,
        capacity_gallons,
        gauge,
    } = view;
    ApiContainerView {
        id: container.id,
        kind_id: container.kind_id,
        name: container.name,
        container_type: container.container_type,
        status: match container.status {
            ContainerStatus::Empty => ApiStatus::Empty,
            ContainerStatus::Filled => ApiStatus::Filled,
        },
        account: api_account(container.account),
        product_id: container.product_id,
        capacity_gallons,
        tare_weight: gauge.tare_weight,
        net_weight: gauge.net_weight,
        gross_weight: gauge.gross_weight,
        proof: container.proof,
        temperature_f: container.temperature_f,
        true_proof: gauge.true_proof,
        wine_gallons: gauge.wine_gallons,
        proof_gallons: gauge.proof_gallons,
        fill_date: container.fill_date,
        emptied_date: container.emptied_date,
        notes: container.notes,
        version: container.version,
        updated_at: container.updated_at,
    }
}

fn transaction_type(value: TransactionType) -> ApiTransactionType {
    match value {
        TransactionType::Create => ApiTransactionType::Create,
        TransactionType::Edit => ApiTransactionType::Edit,
        TransactionType::ProofDown => ApiTransactionType::ProofDown,
        TransactionType::TransferIn => ApiTransactionType::TransferIn,
        TransactionType::TransferOut => ApiTransactionType::TransferOut,
        TransactionType::BottlePartial => ApiTransactionType::BottlePartial,
        TransactionType::BottleEmpty => ApiTransactionType::BottleEmpty,
        TransactionType::BottlingGain => ApiTransactionType::BottlingGain,
        TransactionType::BottlingLoss => ApiTransactionType::BottlingLoss,
        TransactionType::TankAdjust => ApiTransactionType::TankAdjust,
        TransactionType::ChangeAccount => ApiTransactionType::ChangeAccount,
        TransactionType::Reversal => ApiTransactionType::Reversal,
    }
}

pub fn transaction_view(record: TransactionRecord) -> TransactionView {
    TransactionView {
        id: record.id,
        operation_id: record.operation_id,
        sequence: record.sequence,
        container_id: record.container_id,
        container_version: record.container_version,
        transaction_type: transaction_type(record.transaction_type),
        proof: record.proof,
        volume_gallons_delta: record.volume_gallons_delta,
        proof_gallons_delta: record.proof_gallons_delta,
        notes: record.notes,
        reverses_operation_id: record.reverses_operation_id,
        created_at: record.created_at,
    }
}

pub fn outcome(outcome: OperationOutcome) -> OperationResponse {
    OperationResponse {
        operation_id: outcome.operation_id,
        containers: outcome.containers.into_iter().map(container_view).collect(),
        transactions: outcome
            .transactions
            .into_iter()
            .map(transaction_view)
            .collect(),
    }
}

pub fn gauge(gauge: Gauge) -> ConversionResponse {
    ConversionResponse {
        tare_weight: gauge.tare_weight,
        gross_weight: gauge.gross_weight,
        net_weight: gauge.net_weight,
        true_proof: gauge.true_proof,
        wine_gallons: gauge.wine_gallons,
        proof_gallons: gauge.proof_gallons,
    }
}
