//! Geometric safety net run over every packed sheet.
//!
//! Any violation here is a packer defect. Callers must propagate the error
//! rather than retry.

use panelcut_core::{Error, PackedSheet, Result, RunResult, EPSILON};

/// Validates every sheet of a run.
pub fn validate_result(result: &RunResult) -> Result<()> {
    result.sheets.iter().try_for_each(validate_sheet)
}

/// Checks bounds, pairwise overlap and grain lock on one sheet.
pub fn validate_sheet(sheet: &PackedSheet) -> Result<()> {
    for p in &sheet.placements {
        if p.x < -EPSILON
            || p.y < -EPSILON
            || p.x + p.width > sheet.width + EPSILON
            || p.y + p.height > sheet.height + EPSILON
        {
            return Err(Error::OutOfBounds {
                sheet: sheet.id.clone(),
                instance: p.instance_id.clone(),
                x: p.x,
                y: p.y,
                width: p.width,
                height: p.height,
                sheet_width: sheet.width,
                sheet_height: sheet.height,
            });
        }
        if p.rotated && !p.part.rotate_allowed {
            return Err(Error::GrainViolation {
                sheet: sheet.id.clone(),
                instance: p.instance_id.clone(),
            });
        }
    }

    for (i, a) in sheet.placements.iter().enumerate() {
        let ra = a.rect();
        for b in &sheet.placements[i + 1..] {
            if ra.overlaps(&b.rect()) {
                return Err(Error::Overlap {
                    sheet: sheet.id.clone(),
                    first: a.instance_id.clone(),
                    second: b.instance_id.clone(),
                });
            }
        }
    }

    Ok(())
}
