// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::state::{AffectedMunicipality, TransitionResult};
use crate::view::{MaterializedView, ViewRow};
use std::collections::{HashMap, HashSet};
use zonemap_audit::{Actor, ChangeDraft, ChangeKind};
use zonemap_domain::{
    DomainError, MunicipalityId, Palette, ZoneColor, ZoneName, validate_change_not_noop,
    validate_not_reserved, validate_target_zone, validate_zone_name_available,
};

/// Applies a command to the current view, producing a new view and change drafts.
///
/// The input view is never modified and nothing is persisted; the caller
/// owns persistence and decides whether to publish the new view.
///
/// # Arguments
///
/// * `view` - The last committed view (immutable)
/// * `command` - The command to apply
/// * `actor` - The actor performing this action
///
/// # Returns
///
/// * `Ok(TransitionResult)` containing the new view and drafts
/// * `Err(CoreError)` if the command is invalid
///
/// # Errors
///
/// Returns an error if:
/// - A named municipality or zone does not exist
/// - A municipality is a boundary placeholder without data
/// - The target zone is unknown, or a new name collides
/// - The command would change nothing
/// - The command touches the reserved unassigned zone
#[allow(clippy::too_many_lines)]
pub fn apply(
    view: &MaterializedView,
    command: Command,
    actor: &Actor,
) -> Result<TransitionResult, CoreError> {
    match command {
        Command::ReassignZone {
            municipality_id,
            zone,
        } => {
            let row: &ViewRow = reassignable_row(view, &municipality_id)?;
            validate_target_zone(view.palette(), &zone)?;
            validate_change_not_noop(
                municipality_id.as_str(),
                &row.municipality.zone,
                &zone,
            )?;

            let moves: Vec<&ViewRow> = vec![row];
            Ok(move_rows(view, &moves, &zone, actor, ChangeKind::Reassignment))
        }
        Command::ReassignMany {
            municipality_ids,
            zone,
        } => {
            if municipality_ids.is_empty() {
                return Err(CoreError::DomainViolation(DomainError::EmptySelection));
            }
            validate_target_zone(view.palette(), &zone)?;

            // Every id must resolve before anything moves
            let mut seen: HashSet<&MunicipalityId> = HashSet::new();
            let mut moves: Vec<&ViewRow> = Vec::new();
            for id in &municipality_ids {
                if !seen.insert(id) {
                    continue;
                }
                let row: &ViewRow = reassignable_row(view, id)?;
                if row.municipality.zone != zone {
                    moves.push(row);
                }
            }

            if moves.is_empty() {
                return Err(CoreError::DomainViolation(DomainError::NoOpChange {
                    target: String::from("selection"),
                    value: zone.to_string(),
                }));
            }

            Ok(move_rows(view, &moves, &zone, actor, ChangeKind::Reassignment))
        }
        Command::RenameZone { from, to, color } => {
            validate_not_reserved(&from, "rename")?;
            let in_palette: bool = view.palette().contains(&from);
            if !in_palette && !view.zone_has_members(&from) {
                return Err(CoreError::DomainViolation(DomainError::ZoneNotFound(
                    from.to_string(),
                )));
            }

            // Same name with a new color is a recolor
            if from == to {
                return recolor(view, &from, color);
            }

            validate_zone_name_available(view.palette(), &to, "rename onto")?;
            if view.zone_has_members(&to) {
                return Err(CoreError::DomainViolation(DomainError::DuplicateZone(
                    to.to_string(),
                )));
            }

            let mut palette: Palette = view.palette().clone();
            palette.rename(&from, to.clone(), color);

            let members: Vec<&ViewRow> = view.zone_members(&from);
            let drafts: Vec<ChangeDraft> = members
                .iter()
                .filter(|row| row.has_backing_data)
                .map(|row| draft_for(row, &to, actor, ChangeKind::ZoneRename))
                .collect();
            let zones: HashMap<MunicipalityId, ZoneName> = members
                .iter()
                .map(|row| (row.municipality.id.clone(), to.clone()))
                .collect();

            let new_view: MaterializedView = view.with_changes(&zones, palette);
            let affected: Vec<AffectedMunicipality> = affected_rows(&new_view, zones.keys());
            Ok(TransitionResult {
                new_view,
                drafts,
                palette_changed: true,
                affected,
            })
        }
        Command::RecolorZone { zone, color } => {
            validate_not_reserved(&zone, "recolor")?;
            if !view.palette().contains(&zone) && !view.zone_has_members(&zone) {
                return Err(CoreError::DomainViolation(DomainError::ZoneNotFound(
                    zone.to_string(),
                )));
            }
            recolor(view, &zone, color)
        }
        Command::AddZone { zone, color } => {
            validate_zone_name_available(view.palette(), &zone, "create")?;
            if view.zone_has_members(&zone) {
                return Err(CoreError::DomainViolation(DomainError::DuplicateZone(
                    zone.to_string(),
                )));
            }

            let mut palette: Palette = view.palette().clone();
            palette.insert(zone, color)?;

            Ok(TransitionResult {
                new_view: view.with_changes(&HashMap::new(), palette),
                drafts: Vec::new(),
                palette_changed: true,
                affected: Vec::new(),
            })
        }
    }
}

/// Finds a row that may be moved between zones.
fn reassignable_row<'a>(
    view: &'a MaterializedView,
    id: &MunicipalityId,
) -> Result<&'a ViewRow, CoreError> {
    let row: &ViewRow = view
        .row(id)
        .ok_or_else(|| DomainError::MunicipalityNotFound(id.to_string()))?;
    // Placeholders have no entity row for replay to move
    if !row.has_backing_data {
        return Err(CoreError::DomainViolation(
            DomainError::MunicipalityWithoutData(id.to_string()),
        ));
    }
    Ok(row)
}

fn draft_for(row: &ViewRow, to: &ZoneName, actor: &Actor, kind: ChangeKind) -> ChangeDraft {
    ChangeDraft {
        municipality_id: row.municipality.id.clone(),
        municipality_name: row.municipality.name.clone(),
        prior_zone: row.municipality.zone.clone(),
        new_zone: to.clone(),
        actor: actor.label().to_string(),
        kind,
    }
}

fn move_rows(
    view: &MaterializedView,
    moves: &[&ViewRow],
    to: &ZoneName,
    actor: &Actor,
    kind: ChangeKind,
) -> TransitionResult {
    let drafts: Vec<ChangeDraft> = moves
        .iter()
        .map(|row| draft_for(row, to, actor, kind))
        .collect();
    let zones: HashMap<MunicipalityId, ZoneName> = moves
        .iter()
        .map(|row| (row.municipality.id.clone(), to.clone()))
        .collect();

    let new_view: MaterializedView = view.with_changes(&zones, view.palette().clone());
    let ids: Vec<&MunicipalityId> = moves.iter().map(|row| &row.municipality.id).collect();
    let affected: Vec<AffectedMunicipality> = affected_rows(&new_view, ids.into_iter());
    TransitionResult {
        new_view,
        drafts,
        palette_changed: false,
        affected,
    }
}

fn recolor(
    view: &MaterializedView,
    zone: &ZoneName,
    color: ZoneColor,
) -> Result<TransitionResult, CoreError> {
    let mut palette: Palette = view.palette().clone();
    match palette.get(zone).cloned() {
        Some(current) => {
            validate_change_not_noop(zone.as_str(), &current, &color)?;
            palette.recolor(zone, color)?;
        }
        // Members but no palette entry yet
        None => palette.insert(zone.clone(), color)?,
    }

    let new_view: MaterializedView = view.with_changes(&HashMap::new(), palette);
    let ids: Vec<&MunicipalityId> = new_view
        .zone_members(zone)
        .into_iter()
        .map(|row| &row.municipality.id)
        .collect();
    let affected: Vec<AffectedMunicipality> = affected_rows(&new_view, ids.into_iter());
    Ok(TransitionResult {
        new_view,
        drafts: Vec::new(),
        palette_changed: true,
        affected,
    })
}

/// Affected rows as they appear in the new view, in view order.
fn affected_rows<'a, I>(view: &MaterializedView, ids: I) -> Vec<AffectedMunicipality>
where
    I: Iterator<Item = &'a MunicipalityId>,
{
    let wanted: HashSet<&MunicipalityId> = ids.collect();
    view.rows()
        .iter()
        .filter(|row| wanted.contains(&row.municipality.id))
        .map(AffectedMunicipality::from_row)
        .collect()
}
