//! Output formatting module

use haulplan_domain::model::{PermitLineItem, PlacedTruck, Quote, TruckType};
use haulplan_domain::service::LoadPlan;
use haulplan_types::{Inches, OutputFormat, Result};
use serde::Serialize;

fn feet(value: Inches) -> String {
    format!("{:.1} ft", value.as_feet())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    println!("{}", content);
    Ok(())
}

fn print_truck(truck: &PlacedTruck) {
    println!(
        "\nTruck {}: {} ({})",
        truck.truck_index + 1,
        truck.truck.name,
        truck.truck.id
    );
    println!(
        "Loaded size:     {} L x {} W x {} H",
        feet(truck.dimensions.length),
        feet(truck.dimensions.width),
        feet(truck.dimensions.height)
    );
    println!(
        "Cargo weight:    {:.0} lb of {:.0} lb",
        truck.total_weight.as_f64(),
        truck.truck.max_cargo_weight.as_f64()
    );
    println!("Gross weight:    {:.0} lb", truck.dimensions.gross_weight.as_f64());
    println!("Legal:           {}", if truck.is_legal { "Yes" } else { "No" });
    println!("Score:           {:.1}", truck.score);
    if !truck.permits_required.is_empty() {
        println!("Permits in:      {}", truck.permits_required.join(", "));
    }

    println!(
        "  {:<16} {:>9} {:>9} {:>9} {:>4} {:>7} {:<8}",
        "item", "x", "y", "z", "rot", "region", "on"
    );
    for item in &truck.items {
        println!(
            "  {:<16} {:>9} {:>9} {:>9} {:>4} {:>7} {:<8}",
            item.item.id,
            feet(item.x),
            feet(item.y),
            feet(item.z),
            item.rotation.degrees(),
            format!("{:?}", item.region).to_lowercase(),
            item.supported_by
                .map(|base| format!("#{}", base + 1))
                .unwrap_or_else(|| "deck".to_string())
        );
    }
}

pub fn output_plan(output_format: OutputFormat, plan: &LoadPlan) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(plan);
    }

    println!("\nLoad Plan");
    println!("=========");
    println!("Trucks:          {}", plan.trucks.len());
    println!(
        "Fully legal:     {}",
        if plan.is_fully_legal { "Yes" } else { "No" }
    );
    if plan.split {
        println!("Split:           load divided across trucks");
    }
    println!("Total weight:    {:.0} lb", plan.total_weight().as_f64());

    for truck in &plan.trucks {
        print_truck(truck);
    }

    if !plan.shortlist.is_empty() {
        println!("\nCandidates:");
        for candidate in &plan.shortlist {
            let outcome = match (&candidate.failure, candidate.score, candidate.is_legal) {
                (Some(reason), _, _) => reason.clone(),
                (None, Some(score), Some(legal)) => {
                    format!("{:.1}{}", score, if legal { "" } else { " (needs permit)" })
                }
                _ => "-".to_string(),
            };
            println!("  {:<16} {}", candidate.truck_id, outcome);
        }
    }

    print_warnings(&plan.warnings);
    Ok(())
}

fn print_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    println!("\nWarnings:");
    for warning in warnings {
        println!("  - {}", warning);
    }
}

fn print_permits(permits: &[PermitLineItem]) {
    if permits.is_empty() {
        println!("\nNo permits required");
        return;
    }
    println!(
        "\n  {:<6} {:>8} {:>7} {:>5} {:>10} {:>10} {:>10} {:>10} {:>11}",
        "state", "miles", "escorts", "pole", "permit", "escort", "pole car", "superload", "total"
    );
    for line in permits {
        let fee = |c: &haulplan_domain::model::FeeComponent| {
            let mark = if c.manual.is_some() { "*" } else { "" };
            format!("{}{}", c.effective(), mark)
        };
        println!(
            "  {:<6} {:>8} {:>7} {:>5} {:>10} {:>10} {:>10} {:>10} {:>11}",
            line.state,
            line.miles.round_dp(1).to_string(),
            line.escort_count,
            if line.pole_car_required { "yes" } else { "no" },
            fee(&line.permit_fee),
            fee(&line.escort_fee),
            fee(&line.pole_car_fee),
            fee(&line.superload_fee),
            line.total.to_string()
        );
    }
    if permits.iter().any(|p| {
        [p.permit_fee, p.escort_fee, p.pole_car_fee, p.superload_fee]
            .iter()
            .any(|c| c.manual.is_some())
    }) {
        println!("  * manual override");
    }
}

#[derive(Serialize)]
struct PermitReport<'a> {
    plan: &'a LoadPlan,
    permits: &'a [PermitLineItem],
}

pub fn output_permits(
    output_format: OutputFormat,
    plan: &LoadPlan,
    permits: &[PermitLineItem],
) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(&PermitReport { plan, permits });
    }

    println!("\nPermits");
    println!("=======");
    for truck in &plan.trucks {
        println!(
            "Truck {}: {} ({}){}",
            truck.truck_index + 1,
            truck.truck.name,
            truck.truck.id,
            if truck.is_legal { "" } else { " oversize/overweight" }
        );
    }
    print_permits(permits);
    println!(
        "\nPermit total:    {}",
        haulplan_domain::model::permit_total(permits)
    );
    Ok(())
}

pub fn output_quote(output_format: OutputFormat, quote: &Quote) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(quote);
    }

    println!("\nQuote {}", quote.id);
    println!("==============================================");
    println!("Tenant:          {}", quote.tenant_id);
    println!("Status:          {}", quote.status);
    println!("Version:         {} (lineage {})", quote.version, quote.lineage_id);
    println!("Created:         {}", quote.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(sent) = quote.sent_at {
        println!("Sent:            {}", sent.format("%Y-%m-%d %H:%M"));
    }
    if let Some(viewed) = quote.viewed_at {
        println!("Viewed:          {}", viewed.format("%Y-%m-%d %H:%M"));
    }
    if let Some(decided) = quote.decided_at {
        println!("Decided:         {}", decided.format("%Y-%m-%d %H:%M"));
    }
    println!("Distance:        {} mi", quote.route.distance_miles.round_dp(1));
    println!("Cargo lines:     {}", quote.cargo_items.len());
    println!(
        "Fully legal:     {}",
        if quote.is_fully_legal { "Yes" } else { "No" }
    );

    for truck in &quote.trucks {
        print_truck(truck);
    }

    let lines = quote
        .service_items
        .iter()
        .map(|l| ("service", l))
        .chain(quote.accessorials.iter().map(|l| ("accessorial", l)));
    println!();
    for (kind, line) in lines {
        println!(
            "  {:<12} {:<24} {:>6} x {:>10} = {:>11}",
            kind,
            line.description,
            line.quantity.to_string(),
            line.unit_price.to_string(),
            line.total.to_string()
        );
    }
    print_permits(&quote.permits);

    println!("\nSubtotal:        {}", quote.subtotal);
    println!("Total:           {}", quote.total);
    print_warnings(&quote.warnings);
    Ok(())
}

pub fn output_quote_list(output_format: OutputFormat, quotes: &[Quote]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(quotes);
    }

    if quotes.is_empty() {
        println!("No quotes");
        return Ok(());
    }
    println!(
        "{:<36}  {:<10} {:>3}  {:<9} {:>6} {:>12}  {}",
        "id", "tenant", "ver", "status", "trucks", "total", "created"
    );
    for quote in quotes {
        println!(
            "{:<36}  {:<10} {:>3}  {:<9} {:>6} {:>12}  {}",
            quote.id.to_string(),
            quote.tenant_id,
            quote.version,
            quote.status.label(),
            quote.trucks.len(),
            quote.total.to_string(),
            quote.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

pub fn output_catalog(output_format: OutputFormat, trucks: &[&TruckType]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(trucks);
    }

    println!(
        "{:<16} {:<12} {:>9} {:>8} {:>8} {:>10} {:>10} {:<6}",
        "id", "category", "deck", "width", "height", "well", "capacity", "active"
    );
    for truck in trucks {
        let well = truck
            .well
            .map(|w| format!("{} @{}", feet(w.length), feet(w.offset)))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<16} {:<12} {:>9} {:>8} {:>8} {:>10} {:>10} {:<6}",
            truck.id,
            truck.category.label(),
            feet(truck.deck_length),
            feet(truck.deck_width),
            feet(truck.deck_height),
            well,
            format!("{:.0} lb", truck.max_cargo_weight.as_f64()),
            if truck.active { "yes" } else { "no" }
        );
    }
    Ok(())
}
