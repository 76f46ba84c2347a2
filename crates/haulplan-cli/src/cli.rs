//! CLI definition using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use haulplan_app::app::LineItemInput;
use haulplan_domain::model::{CandidateFilter, PermitComponent, TruckCategory};
use haulplan_domain::service::RawNumber;
use haulplan_types::OutputFormat;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "haulplan")]
#[command(version)]
#[command(about = "Oversize and heavy-haul load planning, permits and quotes")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output (debug logging; RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Restrict which catalog entries may be planned on
#[derive(Args, Debug, Clone, Default)]
pub struct TruckSelection {
    /// Only use these truck type ids (repeatable)
    #[arg(long = "truck", short = 't')]
    pub trucks: Vec<String>,

    /// Only use these categories: flatbed, step-deck, double-drop, rgn, lowboy, conestoga
    #[arg(long = "category", short = 'c', value_parser = parse_category)]
    pub categories: Vec<TruckCategory>,
}

impl TruckSelection {
    pub fn filter(&self) -> CandidateFilter {
        CandidateFilter {
            truck_type_ids: self.trucks.clone(),
            categories: self.categories.clone(),
        }
    }
}

/// Everything needed to (re)compute a quote
#[derive(Args, Debug, Clone)]
pub struct QuoteArgs {
    /// Cargo list (CSV with header row, or JSON array)
    #[arg(long)]
    pub cargo: PathBuf,

    /// Route with per-state mileage (JSON)
    #[arg(long, short = 'r')]
    pub route: PathBuf,

    #[command(flatten)]
    pub selection: TruckSelection,

    /// Service line, "Description=PRICE" or "Description=QTYxPRICE" (repeatable)
    #[arg(long = "service", value_parser = parse_line_item)]
    pub service_items: Vec<LineItemInput>,

    /// Accessorial line, same format as --service (repeatable)
    #[arg(long = "accessorial", value_parser = parse_line_item)]
    pub accessorials: Vec<LineItemInput>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan a cargo list onto one or more trucks
    Plan {
        /// Cargo list (CSV with header row, or JSON array)
        cargo: PathBuf,

        #[command(flatten)]
        selection: TruckSelection,

        /// Route file; marks which transited states need permits
        #[arg(long, short = 'r')]
        route: Option<PathBuf>,

        /// Evaluate candidates on a single thread
        #[arg(long)]
        sequential: bool,
    },

    /// Plan a cargo list and price its permits along a route
    Permits {
        /// Cargo list (CSV with header row, or JSON array)
        cargo: PathBuf,

        /// Route with per-state mileage (JSON)
        #[arg(long, short = 'r')]
        route: PathBuf,

        /// Fee schedule TOML (added to the configured ones)
        #[arg(long)]
        fees: Option<PathBuf>,

        /// Tenant whose fee schedule prices the permits
        #[arg(long)]
        tenant: Option<String>,

        #[command(flatten)]
        selection: TruckSelection,
    },

    /// Manage quotes
    Quote {
        #[command(subcommand)]
        action: QuoteCommand,
    },

    /// List the truck catalog
    Catalog {
        /// Include inactive configurations
        #[arg(long)]
        all: bool,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set quote store directory
        #[arg(long)]
        set_store_dir: Option<PathBuf>,

        /// Set truck catalog TOML
        #[arg(long)]
        set_catalog: Option<PathBuf>,

        /// Set legal threshold TOML
        #[arg(long)]
        set_thresholds: Option<PathBuf>,

        /// Set fee schedule TOML
        #[arg(long)]
        set_fees: Option<PathBuf>,

        /// Set how many truck configurations a plan considers (0 = all)
        #[arg(long)]
        set_max_candidates: Option<usize>,

        /// Enable/disable parallel candidate evaluation
        #[arg(long)]
        set_parallel: Option<bool>,

        /// Set tenant for new quotes
        #[arg(long)]
        set_tenant: Option<String>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
pub enum QuoteCommand {
    /// Create a DRAFT quote
    Create {
        #[command(flatten)]
        args: QuoteArgs,

        /// Tenant (defaults to config)
        #[arg(long)]
        tenant: Option<String>,
    },

    /// Recompute a DRAFT quote from new inputs
    Update {
        id: Uuid,

        #[command(flatten)]
        args: QuoteArgs,
    },

    /// Show one quote
    Show { id: Uuid },

    /// List quotes
    List {
        /// Only this tenant
        #[arg(long)]
        tenant: Option<String>,
    },

    /// Mark a DRAFT quote as sent
    Send { id: Uuid },

    /// Mark a sent quote as viewed
    View { id: Uuid },

    /// Accept a sent or viewed quote
    Accept { id: Uuid },

    /// Reject a sent or viewed quote
    Reject { id: Uuid },

    /// Copy a quote into a new independent DRAFT
    Duplicate { id: Uuid },

    /// Start the next version of a quote
    Version { id: Uuid },

    /// Override one permit fee on a DRAFT quote
    Override {
        id: Uuid,

        /// State code
        #[arg(long)]
        state: String,

        /// permit, escort, pole-car or superload
        #[arg(long, value_parser = parse_component)]
        component: PermitComponent,

        /// Amount in dollars; omit to clear the override
        #[arg(long)]
        amount: Option<String>,
    },

    /// Soft-delete a quote
    Delete { id: Uuid },
}

fn parse_category(s: &str) -> Result<TruckCategory, String> {
    s.parse()
}

fn parse_component(s: &str) -> Result<PermitComponent, String> {
    match s.trim().to_lowercase().replace('_', "-").as_str() {
        "permit" => Ok(PermitComponent::Permit),
        "escort" => Ok(PermitComponent::Escort),
        "pole-car" => Ok(PermitComponent::PoleCar),
        "superload" => Ok(PermitComponent::Superload),
        other => Err(format!("unknown permit component '{}'", other)),
    }
}

/// "Linehaul=3,500" or "Detention=2.5x75"
pub fn parse_line_item(s: &str) -> Result<LineItemInput, String> {
    let (description, amount) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected DESCRIPTION=PRICE, got '{}'", s))?;
    let description = description.trim();
    if description.is_empty() {
        return Err(format!("missing description in '{}'", s));
    }

    let (quantity, price) = match amount.split_once(['x', 'X']) {
        Some((qty, price)) => {
            let qty: Decimal = qty
                .trim()
                .parse()
                .map_err(|_| format!("invalid quantity '{}'", qty.trim()))?;
            (qty, price)
        }
        None => (Decimal::ONE, amount),
    };
    Ok(LineItemInput {
        description: description.to_string(),
        quantity,
        unit_price: RawNumber::Text(price.trim().to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_item() {
        let line = parse_line_item("Linehaul=$3,500").unwrap();
        assert_eq!(line.description, "Linehaul");
        assert_eq!(line.quantity, Decimal::ONE);
        assert_eq!(line.unit_price, RawNumber::Text("$3,500".to_string()));

        let line = parse_line_item("Detention=2.5x75").unwrap();
        assert_eq!(line.quantity, Decimal::new(25, 1));
        assert_eq!(line.unit_price, RawNumber::Text("75".to_string()));

        assert!(parse_line_item("no price").is_err());
        assert!(parse_line_item("=100").is_err());
        assert!(parse_line_item("Tarp=twox5").is_err());
    }

    #[test]
    fn test_parse_plan_command() {
        let cli = Cli::try_parse_from([
            "haulplan", "-f", "json", "plan", "cargo.csv", "--truck", "flatbed-48", "-c",
            "step-deck", "--route", "route.json",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Plan {
                cargo,
                selection,
                route,
                sequential,
            } => {
                assert_eq!(cargo, PathBuf::from("cargo.csv"));
                let filter = selection.filter();
                assert_eq!(filter.truck_type_ids, vec!["flatbed-48"]);
                assert_eq!(filter.categories, vec![TruckCategory::StepDeck]);
                assert_eq!(route, Some(PathBuf::from("route.json")));
                assert!(!sequential);
            }
            _ => panic!("expected plan"),
        }
    }

    #[test]
    fn test_parse_quote_override() {
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "haulplan",
            "quote",
            "override",
            &id.to_string(),
            "--state",
            "TX",
            "--component",
            "pole-car",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Quote {
                action:
                    QuoteCommand::Override {
                        id: parsed,
                        component,
                        amount,
                        ..
                    },
            } => {
                assert_eq!(parsed, id);
                assert_eq!(component, PermitComponent::PoleCar);
                assert!(amount.is_none());
            }
            _ => panic!("expected quote override"),
        }
    }

    #[test]
    fn test_bad_category_rejected() {
        assert!(Cli::try_parse_from(["haulplan", "plan", "c.csv", "-c", "tanker"]).is_err());
    }
}
