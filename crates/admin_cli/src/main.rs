use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{
    Account, ContainerView, DensityTable, Engine, FillSpec, Gauge, NewContainerCmd, Quantity,
    conversion,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "rickhouse_admin")]
#[command(about = "Admin utilities for Rickhouse (bootstrap kinds/containers, gauge offline)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./rickhouse.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Kind(Kind),
    Container(ContainerArgs),
    /// Gauge a measurement with the built-in density table. No database needed.
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct Kind {
    #[command(subcommand)]
    command: KindCommand,
}

#[derive(Subcommand, Debug)]
enum KindCommand {
    Create(KindCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct KindCreateArgs {
    #[arg(long)]
    name: String,
    /// Rated capacity in wine gallons.
    #[arg(long)]
    capacity: f64,
    /// Empty weight in pounds.
    #[arg(long)]
    tare: f64,
}

#[derive(Args, Debug)]
struct ContainerArgs {
    #[command(subcommand)]
    command: ContainerCommand,
}

#[derive(Subcommand, Debug)]
enum ContainerCommand {
    Create(ContainerCreateArgs),
    List,
    Show {
        #[arg(long)]
        id: Uuid,
    },
    History {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Args, Debug)]
struct ContainerCreateArgs {
    #[arg(long)]
    kind: Uuid,
    #[arg(long)]
    name: String,
    #[arg(long = "type", default_value = "barrel")]
    container_type: String,
    /// Overrides the kind's tare weight.
    #[arg(long)]
    tare: Option<f64>,
    #[arg(long, default_value = "storage")]
    account: String,
    /// Fill the new container with this product.
    #[arg(long, requires_all = ["proof", "net_weight"])]
    product: Option<String>,
    #[arg(long)]
    proof: Option<f64>,
    #[arg(long)]
    temperature: Option<f64>,
    #[arg(long)]
    net_weight: Option<f64>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    quantity: QuantityArgs,
    /// Proof as read at `temperature`.
    #[arg(long)]
    proof: f64,
    #[arg(long)]
    temperature: Option<f64>,
    #[arg(long, default_value_t = 0.0)]
    tare: f64,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct QuantityArgs {
    #[arg(long)]
    net_weight: Option<f64>,
    #[arg(long)]
    gross_weight: Option<f64>,
    #[arg(long)]
    wine_gallons: Option<f64>,
    #[arg(long)]
    proof_gallons: Option<f64>,
}

impl QuantityArgs {
    fn quantity(&self) -> Option<Quantity> {
        self.net_weight
            .map(Quantity::NetWeight)
            .or(self.gross_weight.map(Quantity::GrossWeight))
            .or(self.wine_gallons.map(Quantity::WineGallons))
            .or(self.proof_gallons.map(Quantity::ProofGallons))
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn convert(args: &ConvertArgs) -> Result<Gauge, Box<dyn Error + Send + Sync>> {
    let table = DensityTable::default();
    let temperature = args
        .temperature
        .unwrap_or_else(|| table.reference_temperature_f());
    let quantity = args.quantity.quantity().ok_or("missing quantity")?;
    let gauge = match quantity {
        Quantity::NetWeight(net) => {
            conversion::from_weight(&table, args.tare, args.tare + net, args.proof, temperature)?
        }
        Quantity::GrossWeight(gross) => {
            conversion::from_weight(&table, args.tare, gross, args.proof, temperature)?
        }
        Quantity::WineGallons(gallons) => {
            conversion::from_wine_gallons(&table, gallons, args.proof, args.tare, temperature)?
        }
        Quantity::ProofGallons(gallons) => {
            conversion::from_proof_gallons(&table, gallons, args.proof, args.tare, temperature)?
        }
    };
    Ok(gauge)
}

fn print_gauge(gauge: &Gauge) {
    println!(
        "gross {:.2} lbs, net {:.2} lbs, true proof {:.2}, {:.3} wine gal, {:.3} proof gal",
        gauge.gross_weight, gauge.net_weight, gauge.true_proof, gauge.wine_gallons,
        gauge.proof_gallons
    );
}

fn print_container(view: &ContainerView) {
    let container = &view.container;
    println!(
        "{} {} [{}] {:?} {} {}",
        container.id,
        container.name,
        container.container_type,
        container.status,
        container.product_id.as_deref().unwrap_or("-"),
        container.account.as_str()
    );
    print_gauge(&view.gauge);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    if let Command::Convert(args) = &cli.command {
        print_gauge(&convert(args)?);
        return Ok(());
    }

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Kind(Kind {
            command: KindCommand::Create(args),
        }) => {
            let kind = engine
                .new_container_kind(&args.name, args.capacity, args.tare)
                .await?;
            println!("created container kind: {} ({})", kind.name, kind.id);
        }
        Command::Kind(Kind {
            command: KindCommand::List,
        }) => {
            for kind in engine.container_kinds().await? {
                println!(
                    "{} {} {:.1} gal, tare {:.1} lbs",
                    kind.id, kind.name, kind.capacity_gallons, kind.tare_weight
                );
            }
        }
        Command::Container(ContainerArgs {
            command: ContainerCommand::Create(args),
        }) => {
            let account = Account::try_from(args.account.as_str())?;
            let mut cmd =
                NewContainerCmd::new(args.kind, &args.name, &args.container_type).account(account);
            if let Some(tare) = args.tare {
                cmd = cmd.tare_weight(tare);
            }
            if let (Some(product), Some(proof), Some(net)) =
                (args.product, args.proof, args.net_weight)
            {
                let mut fill = FillSpec::new(product, proof, Quantity::NetWeight(net));
                if let Some(temperature) = args.temperature {
                    fill = fill.temperature_f(temperature);
                }
                cmd = cmd.fill(fill);
            }

            let outcome = engine.new_container(cmd).await?;
            for view in &outcome.containers {
                print_container(view);
            }
        }
        Command::Container(ContainerArgs {
            command: ContainerCommand::List,
        }) => {
            for view in engine.containers().await? {
                print_container(&view);
            }
        }
        Command::Container(ContainerArgs {
            command: ContainerCommand::Show { id },
        }) => {
            print_container(&engine.container(id).await?);
        }
        Command::Container(ContainerArgs {
            command: ContainerCommand::History { id },
        }) => {
            for record in engine.transactions_for_container(id).await? {
                println!(
                    "{} {} {:?} proof {:.2} wg {:+.3} pg {:+.3} {}",
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    record.operation_id,
                    record.transaction_type,
                    record.proof,
                    record.volume_gallons_delta,
                    record.proof_gallons_delta,
                    record.notes.as_deref().unwrap_or("")
                );
            }
        }
        Command::Convert(_) => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn convert_accepts_exactly_one_quantity() {
        let cli = Cli::try_parse_from([
            "rickhouse_admin",
            "convert",
            "--proof-gallons",
            "11",
            "--proof",
            "110",
        ])
        .unwrap();
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        let gauge = convert(&args).unwrap();
        assert!((gauge.wine_gallons - 10.0).abs() < 1e-9);

        let err = Cli::try_parse_from([
            "rickhouse_admin",
            "convert",
            "--proof-gallons",
            "11",
            "--wine-gallons",
            "10",
            "--proof",
            "110",
        ]);
        assert!(err.is_err());
    }
}
