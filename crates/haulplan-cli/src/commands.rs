//! Command handlers

use std::path::{Path, PathBuf};

use haulplan_app::app::{QuoteInput, QuoteService};
use haulplan_app::config::Config;
use haulplan_app::planning::PlanningContext;
use haulplan_app::repository::open_quote_repo;
use haulplan_domain::model::PermitComponent;
use haulplan_domain::service::{
    evaluate_permits, normalize_items, parse_currency, plan_load, LoadPlan, RawNumber,
};
use haulplan_infra::{load_cargo, load_fee_schedule, load_route, FileQuoteRepository};
use haulplan_types::{OutputFormat, QuoteStatus, Result};
use tracing::debug;
use uuid::Uuid;

use crate::cli::{Cli, Commands, QuoteArgs, QuoteCommand, TruckSelection};
use crate::output::{
    output_catalog, output_permits, output_plan, output_quote, output_quote_list,
};

pub fn execute(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    let output_format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Plan {
            cargo,
            selection,
            route,
            sequential,
        } => {
            if *sequential {
                config.parallel = false;
            }
            cmd_plan(&config, output_format, cargo, selection, route.as_deref())
        }

        Commands::Permits {
            cargo,
            route,
            fees,
            tenant,
            selection,
        } => {
            let tenant = tenant.as_deref().unwrap_or(&config.tenant_id);
            cmd_permits(&config, output_format, cargo, route, fees.clone(), tenant, selection)
        }

        Commands::Quote { action } => cmd_quote(&config, output_format, action),

        Commands::Catalog { all } => cmd_catalog(&config, output_format, *all),

        Commands::Config {
            show,
            set_output,
            set_store_dir,
            set_catalog,
            set_thresholds,
            set_fees,
            set_max_candidates,
            set_parallel,
            set_tenant,
            reset,
        } => cmd_config(
            *show,
            ConfigChanges {
                output: *set_output,
                store_dir: set_store_dir.clone(),
                catalog: set_catalog.clone(),
                thresholds: set_thresholds.clone(),
                fees: set_fees.clone(),
                max_candidates: *set_max_candidates,
                parallel: *set_parallel,
                tenant: set_tenant.clone(),
            },
            *reset,
        ),
    }
}

fn plan_cargo(
    context: &PlanningContext,
    cargo: &Path,
    selection: &TruckSelection,
    route_states: Vec<String>,
) -> Result<LoadPlan> {
    let raw = load_cargo(cargo)?;
    let items = normalize_items(&raw)?;
    debug!(lines = items.len(), path = %cargo.display(), "cargo loaded");
    let options = context.plan_options(selection.filter(), route_states);
    Ok(plan_load(&items, &context.catalog, &options)?)
}

fn cmd_plan(
    config: &Config,
    output_format: OutputFormat,
    cargo: &Path,
    selection: &TruckSelection,
    route: Option<&Path>,
) -> Result<()> {
    let context = PlanningContext::from_config(config)?;
    let route_states = match route {
        Some(path) => load_route(path)?.states(),
        None => Vec::new(),
    };
    let plan = plan_cargo(&context, cargo, selection, route_states)?;
    output_plan(output_format, &plan)
}

fn cmd_permits(
    config: &Config,
    output_format: OutputFormat,
    cargo: &Path,
    route: &Path,
    fees: Option<PathBuf>,
    tenant: &str,
    selection: &TruckSelection,
) -> Result<()> {
    let mut context = PlanningContext::from_config(config)?;
    if let Some(path) = fees {
        context = context.with_fees(load_fee_schedule(&path)?);
    }

    let route = load_route(route)?;
    let plan = plan_cargo(&context, cargo, selection, route.states())?;
    let permits = evaluate_permits(
        &plan.trucks,
        &route.state_mileage,
        context.fees_for(tenant),
        &context.thresholds,
    )?;
    output_permits(output_format, &plan, &permits)
}

fn quote_input(args: &QuoteArgs) -> Result<QuoteInput> {
    Ok(QuoteInput {
        route: load_route(&args.route)?,
        cargo: load_cargo(&args.cargo)?,
        truck_filter: args.selection.filter(),
        service_items: args.service_items.clone(),
        accessorials: args.accessorials.clone(),
    })
}

fn open_quote_service(config: &Config) -> Result<QuoteService<FileQuoteRepository>> {
    let repo = open_quote_repo(config)?;
    let context = PlanningContext::from_config(config)?;
    Ok(QuoteService::new(repo, context))
}

fn cmd_quote(config: &Config, output_format: OutputFormat, action: &QuoteCommand) -> Result<()> {
    let service = open_quote_service(config)?;

    let quote = match action {
        QuoteCommand::Create { args, tenant } => {
            let tenant = tenant.as_deref().unwrap_or(&config.tenant_id);
            service.create(tenant, &quote_input(args)?)?
        }
        QuoteCommand::Update { id, args } => service.update(*id, &quote_input(args)?)?,
        QuoteCommand::Show { id } => service.get(*id)?,
        QuoteCommand::List { tenant } => {
            let quotes = service.list(tenant.as_deref())?;
            return output_quote_list(output_format, &quotes);
        }
        QuoteCommand::Send { id } => service.transition_status(*id, QuoteStatus::Sent)?,
        QuoteCommand::View { id } => service.transition_status(*id, QuoteStatus::Viewed)?,
        QuoteCommand::Accept { id } => service.transition_status(*id, QuoteStatus::Accepted)?,
        QuoteCommand::Reject { id } => service.transition_status(*id, QuoteStatus::Rejected)?,
        QuoteCommand::Duplicate { id } => service.duplicate(*id)?,
        QuoteCommand::Version { id } => service.new_version(*id)?,
        QuoteCommand::Override {
            id,
            state,
            component,
            amount,
        } => cmd_override(&service, *id, state, *component, amount.as_deref())?,
        QuoteCommand::Delete { id } => {
            service.delete(*id)?;
            println!("Quote {} deleted", id);
            return Ok(());
        }
    };

    output_quote(output_format, &quote)
}

fn cmd_override(
    service: &QuoteService<FileQuoteRepository>,
    id: Uuid,
    state: &str,
    component: PermitComponent,
    amount: Option<&str>,
) -> Result<haulplan_domain::model::Quote> {
    let manual = amount
        .map(|a| parse_currency(&RawNumber::Text(a.to_string()), "override amount"))
        .transpose()?;
    service.set_permit_override(id, state, component, manual)
}

fn cmd_catalog(config: &Config, output_format: OutputFormat, all: bool) -> Result<()> {
    let context = PlanningContext::from_config(config)?;
    let trucks: Vec<_> = context
        .catalog
        .trucks
        .iter()
        .filter(|t| all || t.active)
        .collect();
    output_catalog(output_format, &trucks)
}

/// Requested `config --set-*` edits
struct ConfigChanges {
    output: Option<OutputFormat>,
    store_dir: Option<PathBuf>,
    catalog: Option<PathBuf>,
    thresholds: Option<PathBuf>,
    fees: Option<PathBuf>,
    max_candidates: Option<usize>,
    parallel: Option<bool>,
    tenant: Option<String>,
}

impl ConfigChanges {
    /// Apply to `config`, returning whether anything changed
    fn apply(self, config: &mut Config) -> bool {
        let mut modified = false;

        if let Some(output_format) = self.output {
            config.output_format = output_format;
            modified = true;
        }

        if let Some(dir) = self.store_dir {
            config.store_dir = Some(dir);
            modified = true;
        }

        if let Some(path) = self.catalog {
            config.catalog_path = Some(path);
            modified = true;
        }

        if let Some(path) = self.thresholds {
            config.thresholds_path = Some(path);
            modified = true;
        }

        if let Some(path) = self.fees {
            config.fee_schedule_path = Some(path);
            modified = true;
        }

        if let Some(max) = self.max_candidates {
            config.max_candidates = max;
            modified = true;
        }

        if let Some(parallel) = self.parallel {
            config.parallel = parallel;
            modified = true;
        }

        if let Some(tenant) = self.tenant {
            config.tenant_id = tenant;
            modified = true;
        }

        modified
    }
}

fn cmd_config(show: bool, changes: ConfigChanges, reset: bool) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let modified = changes.apply(&mut config);

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(())
}
