//! Deck placement
//!
//! Deterministic shelf/guillotine heuristic. Free space on each deck
//! region is a list of disjoint rectangles; placing an item consumes the
//! front-left corner of a rectangle and splits the remainder into a strip
//! to the right of the item and a strip behind it. Items that find no
//! floor space may rest on a stackable item that is already placed.
//!
//! This is not a global optimizer. It places items largest footprint first
//! and never backtracks.

use haulplan_types::{Inches, PlanError, Pounds};
use tracing::debug;

use crate::model::{
    expand_units, CargoItem, DeckRegion, LegalCeilings, LoadDimensions, PlacedItem, PlacedTruck,
    Rotation, TruckType,
};

#[derive(Debug, Clone, Copy)]
struct FreeRect {
    region: DeckRegion,
    x: Inches,
    y: Inches,
    length: Inches,
    width: Inches,
    surface_height: Inches,
    /// Ends at the rear of the deck
    rear_open: bool,
}

impl FreeRect {
    /// Split around an item of `along` x `across` placed at the front-left corner
    fn split(&self, along: Inches, across: Inches) -> (Option<FreeRect>, Option<FreeRect>) {
        let right = (across < self.width).then(|| FreeRect {
            y: self.y + across,
            length: along.min(self.length),
            width: self.width - across,
            rear_open: self.rear_open && along >= self.length,
            ..*self
        });
        let back = (along < self.length).then(|| FreeRect {
            x: self.x + along,
            length: self.length - along,
            ..*self
        });
        (right, back)
    }
}

/// Where a unit ends up
enum Slot {
    Floor {
        rect: usize,
        rotation: Rotation,
    },
    Stacked {
        base: usize,
        rotation: Rotation,
    },
}

struct Deck<'a> {
    truck: &'a TruckType,
    truck_index: usize,
    free: Vec<FreeRect>,
    placed: Vec<PlacedItem>,
    /// Stack level of each placed item (0 = floor)
    levels: Vec<u32>,
    /// Whether something already rests on each placed item
    covered: Vec<bool>,
    weight: Pounds,
}

impl<'a> Deck<'a> {
    fn new(truck: &'a TruckType, truck_index: usize) -> Self {
        let free = truck
            .regions()
            .into_iter()
            .filter(|r| r.length.is_positive() && r.width.is_positive())
            .map(|r| FreeRect {
                region: r.region,
                x: r.x,
                y: Inches::ZERO,
                length: r.length,
                width: r.width,
                surface_height: r.surface_height,
                rear_open: r.rear_open,
            })
            .collect();
        let mut deck = Self {
            truck,
            truck_index,
            free,
            placed: Vec::new(),
            levels: Vec::new(),
            covered: Vec::new(),
            weight: Pounds::ZERO,
        };
        deck.sort_free();
        deck
    }

    fn sort_free(&mut self) {
        self.free.sort_by(|a, b| a.x.cmp(&b.x).then_with(|| a.y.cmp(&b.y)));
    }

    /// Region try order: tall items go to the well first
    fn region_order(&self, unit: &CargoItem) -> [DeckRegion; 2] {
        let tall = self.truck.deck_height + unit.height > self.truck.legal.height;
        if tall && self.truck.well.is_some() {
            [DeckRegion::Well, DeckRegion::Main]
        } else {
            [DeckRegion::Main, DeckRegion::Well]
        }
    }

    /// Floor space for `unit`. Overhang is only used when no region,
    /// rotation or free rectangle holds the unit within the deck edges.
    fn find_floor(&self, unit: &CargoItem) -> Option<Slot> {
        self.scan_floor(unit, false)
            .or_else(|| self.scan_floor(unit, true))
    }

    fn scan_floor(&self, unit: &CargoItem, overhang: bool) -> Option<Slot> {
        for region in self.region_order(unit) {
            let mut tried: Vec<(Inches, Inches)> = Vec::new();
            for rotation in unit.allowed_rotations() {
                let footprint = unit.footprint(rotation);
                if tried.contains(&footprint) {
                    continue;
                }
                tried.push(footprint);
                let (along, across) = footprint;

                // Every free rectangle reaches the deck's side edge
                let hit = self.free.iter().position(|rect| {
                    rect.region == region
                        && self.truck.fits(
                            along,
                            across,
                            rect.length,
                            rect.width,
                            overhang && rect.rear_open,
                            overhang,
                        )
                });
                if let Some(rect) = hit {
                    return Some(Slot::Floor { rect, rotation });
                }
            }
        }
        None
    }

    /// Whether a new item may rest on `base` given every item below it
    fn stack_allowed(&self, base: usize) -> bool {
        if self.covered[base] {
            return false;
        }
        let new_level = self.levels[base] + 1;
        let mut current = Some(base);
        while let Some(index) = current {
            let below = &self.placed[index].item;
            if !below.supports_stacking() {
                return false;
            }
            if new_level - self.levels[index] > below.max_stack_layers {
                return false;
            }
            current = self.placed[index].supported_by;
        }
        true
    }

    fn find_stack(&self, unit: &CargoItem) -> Option<Slot> {
        if unit.bottom_only {
            return None;
        }
        let mut best: Option<(Inches, usize, Rotation)> = None;
        for (base, below) in self.placed.iter().enumerate() {
            if !self.stack_allowed(base) {
                continue;
            }
            let (base_along, base_across) = below.footprint();
            let rotation = unit.allowed_rotations().into_iter().find(|&rotation| {
                let (along, across) = unit.footprint(rotation);
                along <= base_along && across <= base_across
            });
            let Some(rotation) = rotation else {
                continue;
            };
            let top = below.ground_height() + unit.height;
            if best.map_or(true, |(best_top, _, _)| top < best_top) {
                best = Some((top, base, rotation));
            }
        }
        best.map(|(_, base, rotation)| Slot::Stacked { base, rotation })
    }

    fn place(&mut self, unit: CargoItem, slot: Slot) {
        let placed = match slot {
            Slot::Floor { rect, rotation } => {
                let free = self.free.remove(rect);
                let (along, across) = unit.footprint(rotation);
                let (right, back) = free.split(along, across);
                self.free.extend(right);
                self.free.extend(back);
                self.sort_free();
                self.levels.push(0);
                PlacedItem {
                    item: unit,
                    truck_index: self.truck_index,
                    x: free.x,
                    y: free.y,
                    z: Inches::ZERO,
                    rotation,
                    region: free.region,
                    surface_height: free.surface_height,
                    supported_by: None,
                }
            }
            Slot::Stacked { base, rotation } => {
                self.covered[base] = true;
                self.levels.push(self.levels[base] + 1);
                let below = &self.placed[base];
                PlacedItem {
                    item: unit,
                    truck_index: self.truck_index,
                    x: below.x,
                    y: below.y,
                    z: below.top(),
                    rotation,
                    region: below.region,
                    surface_height: below.surface_height,
                    supported_by: Some(base),
                }
            }
        };
        self.weight += placed.item.weight;
        self.covered.push(false);
        self.placed.push(placed);
    }
}

/// Place `items` on one truck.
///
/// Units are placed in order of decreasing footprint area, then weight.
/// Fails with `ItemDoesNotFit` naming every unit that found no space or
/// would exceed the truck's cargo capacity.
pub fn place_items(
    truck: &TruckType,
    truck_index: usize,
    items: &[CargoItem],
) -> Result<PlacedTruck, PlanError> {
    let mut units = expand_units(items);
    units.sort_by(|a, b| {
        b.footprint_area()
            .cmp(&a.footprint_area())
            .then_with(|| b.weight.cmp(&a.weight))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut deck = Deck::new(truck, truck_index);
    let mut rejected = Vec::new();

    for unit in units {
        if deck.weight + unit.weight > truck.max_cargo_weight {
            debug!(truck = %truck.id, item = %unit.id, "cargo capacity exceeded");
            rejected.push(unit.id);
            continue;
        }
        match deck.find_floor(&unit).or_else(|| deck.find_stack(&unit)) {
            Some(slot) => deck.place(unit, slot),
            None => {
                debug!(truck = %truck.id, item = %unit.id, "no space on deck");
                rejected.push(unit.id);
            }
        }
    }

    if !rejected.is_empty() {
        return Err(PlanError::ItemDoesNotFit {
            item_ids: rejected,
            truck: truck.id.clone(),
        });
    }

    let placed = deck.placed;
    let dimensions = load_dimensions(truck, &placed, deck.weight);
    let mut warnings = legal_violations(&truck.legal, &dimensions);
    let is_legal = warnings.is_empty();
    warnings.extend(
        placed
            .iter()
            .filter(|p| p.item.hazmat)
            .map(|p| format!("{}: hazardous materials require placarding", p.item.id)),
    );

    debug!(
        truck = %truck.id,
        items = placed.len(),
        weight = %deck.weight,
        is_legal,
        "placement complete"
    );

    Ok(PlacedTruck {
        truck_index,
        truck: truck.clone(),
        item_count: placed.len(),
        items: placed,
        total_weight: deck.weight,
        dimensions,
        is_legal,
        permits_required: Vec::new(),
        warnings,
        score: 0.0,
    })
}

/// Overall loaded dimensions, including overhang and the power unit
pub fn load_dimensions(truck: &TruckType, placed: &[PlacedItem], cargo: Pounds) -> LoadDimensions {
    let mut width = truck.deck_width;
    let mut height = truck.deck_height;
    let mut rear_overhang = Inches::ZERO;
    for item in placed {
        let (along, across) = item.footprint();
        width = width.max(item.y + across);
        height = height.max(item.ground_height());
        rear_overhang = rear_overhang.max((item.x + along).saturating_sub(truck.deck_length));
    }
    LoadDimensions {
        width,
        height,
        length: truck.overall_length(rear_overhang),
        gross_weight: cargo + truck.tare_weight,
    }
}

/// Human-readable description of every ceiling the load exceeds
pub fn legal_violations(legal: &LegalCeilings, dims: &LoadDimensions) -> Vec<String> {
    let mut violations = Vec::new();
    let mut dimension = |name: &str, actual: Inches, ceiling: Inches| {
        if actual > ceiling {
            violations.push(format!(
                "exceeds {:.1} ft legal {} by {:.1} ft",
                ceiling.as_feet(),
                name,
                (actual - ceiling).as_feet()
            ));
        }
    };
    dimension("height", dims.height, legal.height);
    dimension("width", dims.width, legal.width);
    dimension("length", dims.length, legal.length);
    if dims.gross_weight > legal.gross_weight {
        violations.push(format!(
            "exceeds {:.0} lb legal gross weight by {:.0} lb",
            legal.gross_weight.as_f64(),
            (dims.gross_weight - legal.gross_weight).as_f64()
        ));
    }
    violations
}
