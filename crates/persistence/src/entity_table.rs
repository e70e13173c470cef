// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! CSV codec for a region's entity table.
//!
//! Headers are matched case-insensitively with spaces treated as
//! underscores, so both the canonical English headers and the legacy
//! Portuguese ones (`CD_Mun`, `Cidade`, `SELL OUT ANUAL`, ...) load.

use crate::error::PersistenceError;
use std::collections::HashSet;
use std::path::Path;
use zonemap_domain::{Metrics, Municipality, MunicipalityId, SchemaCapabilities, ZoneName};

/// Canonical header row written by [`write_entity_table`].
pub const CANONICAL_HEADERS: [&str; 12] = [
    "id",
    "name",
    "state",
    "sub_region",
    "zone",
    "annual_sales",
    "monthly_sales",
    "annual_potential",
    "monthly_potential",
    "population",
    "points_of_sale",
    "share",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Id,
    Name,
    State,
    SubRegion,
    Zone,
    AnnualSales,
    MonthlySales,
    AnnualPotential,
    MonthlyPotential,
    Population,
    PointsOfSale,
    Share,
}

impl Column {
    fn from_header(raw: &str) -> Option<Self> {
        let normalized: String = raw.trim().to_lowercase().replace(' ', "_");
        let column: Self = match normalized.as_str() {
            "id" | "cd_mun" | "municipality_id" | "code" => Self::Id,
            "name" | "cidade" | "municipality" => Self::Name,
            "state" | "uf" => Self::State,
            "sub_region" | "mesorregião_geográfica" | "mesorregiao_geografica" => {
                Self::SubRegion
            }
            "zone" | "zona" => Self::Zone,
            "annual_sales" | "sell_out_anual" => Self::AnnualSales,
            "monthly_sales" | "sell_out_mês" | "sell_out_mes" => Self::MonthlySales,
            "annual_potential" | "potencial_anual" => Self::AnnualPotential,
            "monthly_potential" | "potencial_mês" | "potencial_mes" => Self::MonthlyPotential,
            "population" | "população" | "populacao" => Self::Population,
            "points_of_sale" | "pdv" => Self::PointsOfSale,
            "share" | "%share" => Self::Share,
            _ => return None,
        };
        Some(column)
    }

    const fn canonical(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::State => "state",
            Self::SubRegion => "sub_region",
            Self::Zone => "zone",
            Self::AnnualSales => "annual_sales",
            Self::MonthlySales => "monthly_sales",
            Self::AnnualPotential => "annual_potential",
            Self::MonthlyPotential => "monthly_potential",
            Self::Population => "population",
            Self::PointsOfSale => "points_of_sale",
            Self::Share => "share",
        }
    }
}

/// The result of reading an entity table.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTable {
    /// Rows in file order, duplicates removed.
    pub municipalities: Vec<Municipality>,
    /// Optional columns the file actually carried.
    pub capabilities: SchemaCapabilities,
    /// Numeric cells that could not be parsed and were read as zero.
    pub coerced_cells: usize,
    /// Required columns that were absent and filled with defaults.
    pub synthesized_columns: Vec<&'static str>,
    /// Identifiers that appeared more than once; the first row was kept.
    pub duplicate_ids: Vec<MunicipalityId>,
    /// Rows dropped for having an empty identifier.
    pub skipped_rows: usize,
}

/// Reads an entity table file.
///
/// # Errors
///
/// * `PersistenceError::MissingFile` if the file does not exist
/// * `PersistenceError::MalformedFile` if it is not readable CSV
pub fn read_entity_table(path: &Path) -> Result<EntityTable, PersistenceError> {
    let body: String = crate::storage::read_text(path)?;
    parse_entity_table(&body).map_err(|e| PersistenceError::malformed(path, &e))
}

/// Parses entity table CSV text.
///
/// # Errors
///
/// Returns the CSV error if the text cannot be tokenized or has no header.
pub fn parse_entity_table(body: &str) -> Result<EntityTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.trim_start_matches('\u{feff}').as_bytes());

    let columns: Vec<Option<Column>> = reader
        .headers()?
        .iter()
        .map(Column::from_header)
        .collect();
    let present: HashSet<Column> = columns.iter().flatten().copied().collect();

    let mut synthesized_columns: Vec<&'static str> = Vec::new();
    for required in [Column::Id, Column::Name, Column::Zone] {
        if !present.contains(&required) {
            synthesized_columns.push(required.canonical());
        }
    }

    let capabilities: SchemaCapabilities = SchemaCapabilities {
        has_sales: present.contains(&Column::AnnualSales),
        has_potential: present.contains(&Column::AnnualPotential),
        has_points_of_sale: present.contains(&Column::PointsOfSale),
        has_population: present.contains(&Column::Population),
        has_sub_region: present.contains(&Column::SubRegion),
    };

    let mut table: EntityTable = EntityTable {
        municipalities: Vec::new(),
        capabilities,
        coerced_cells: 0,
        synthesized_columns,
        duplicate_ids: Vec::new(),
        skipped_rows: 0,
    };
    let mut seen: HashSet<MunicipalityId> = HashSet::new();

    for (index, record) in reader.records().enumerate() {
        let record: csv::StringRecord = record?;
        let row_number: usize = index + 1;

        let mut id: Option<MunicipalityId> = if present.contains(&Column::Id) {
            None
        } else {
            MunicipalityId::normalize(&row_number.to_string()).ok()
        };
        let mut name: Option<String> = None;
        let mut state: String = String::new();
        let mut sub_region: String = String::new();
        let mut zone: ZoneName = ZoneName::unassigned();
        let mut metrics: Metrics = Metrics::default();

        for (column, cell) in columns.iter().zip(record.iter()) {
            let Some(column) = column else { continue };
            match column {
                Column::Id => id = MunicipalityId::normalize(cell).ok(),
                Column::Name => name = Some(cell.to_string()).filter(|n| !n.is_empty()),
                Column::State => state = cell.to_string(),
                Column::SubRegion => sub_region = cell.to_string(),
                Column::Zone => zone = ZoneName::new(cell).unwrap_or_else(|_| ZoneName::unassigned()),
                Column::AnnualSales => metrics.annual_sales = table.number(cell),
                Column::MonthlySales => metrics.monthly_sales = table.number(cell),
                Column::AnnualPotential => metrics.annual_potential = table.number(cell),
                Column::MonthlyPotential => metrics.monthly_potential = table.number(cell),
                Column::Population => metrics.population = table.number(cell),
                Column::PointsOfSale => metrics.points_of_sale = table.number(cell),
                Column::Share => metrics.stored_share = table.number(cell),
            }
        }

        let Some(id) = id else {
            table.skipped_rows += 1;
            continue;
        };
        if !seen.insert(id.clone()) {
            table.duplicate_ids.push(id);
            continue;
        }

        let name: String = name.unwrap_or_else(|| format!("Municipality {row_number}"));
        table.municipalities.push(Municipality {
            id,
            name,
            state,
            sub_region,
            zone,
            metrics,
        });
    }

    Ok(table)
}

impl EntityTable {
    fn number(&mut self, cell: &str) -> f64 {
        if cell.is_empty() {
            return 0.0;
        }
        match cell.parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                self.coerced_cells += 1;
                0.0
            }
        }
    }
}

/// Renders municipalities as CSV with canonical headers.
///
/// # Errors
///
/// Returns `PersistenceError::Serialization` if a row cannot be encoded.
pub fn write_entity_table(municipalities: &[Municipality]) -> Result<String, PersistenceError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CANONICAL_HEADERS)?;
    for m in municipalities {
        writer.write_record([
            m.id.as_str(),
            m.name.as_str(),
            m.state.as_str(),
            m.sub_region.as_str(),
            m.zone.as_str(),
            &format_number(m.metrics.annual_sales),
            &format_number(m.metrics.monthly_sales),
            &format_number(m.metrics.annual_potential),
            &format_number(m.metrics.monthly_potential),
            &format_number(m.metrics.population),
            &format_number(m.metrics.points_of_sale),
            &format_number(m.metrics.stored_share),
        ])?;
    }
    let bytes: Vec<u8> = writer
        .into_inner()
        .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| PersistenceError::Serialization(e.to_string()))
}

/// Integer values are written without a fractional part.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
