//! Desktop icon grid engine
//!
//! Pure layout: icons with a stored `metadata.position` are authoritative
//! (clamped into view), everything else is auto-placed into free grid cells
//! column by column from the right edge, the way new icons appear on the
//! desktop. Auto placement is deterministic for identical inputs.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Map};

use crate::fs::path::resolve_path;
use crate::fs::store::{FsNode, FsStore};

/// Grid cell edge, in pixels. Icons occupy one cell.
pub const GRID_SIZE: i32 = 100;
/// Pixels reserved at the top of the viewport for the status bar.
pub const TOP_OFFSET: i32 = 32;
/// Where desktop icons live.
pub const DESKTOP_PATH: &str = "/home/user/Desktop";

/// Metadata key holding a manually placed icon position.
pub const META_POSITION: &str = "position";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Parse a stored manual position out of a node's metadata.
pub fn manual_position(node: &FsNode) -> Option<Position> {
    let pos = node.metadata.get(META_POSITION)?;
    Some(Position {
        x: pos.get("x")?.as_i64()? as i32,
        y: pos.get("y")?.as_i64()? as i32,
    })
}

/// Clamp a position so the whole cell stays inside the viewport, below the
/// status bar.
pub fn clamp_position(pos: Position, viewport_w: i32, viewport_h: i32) -> Position {
    Position {
        x: pos.x.clamp(0, (viewport_w - GRID_SIZE).max(0)),
        y: pos.y.clamp(TOP_OFFSET, (viewport_h - GRID_SIZE).max(TOP_OFFSET)),
    }
}

/// Snap a position to the nearest grid cell origin.
pub fn snap_to_grid(pos: Position) -> Position {
    let col = ((pos.x as f64) / GRID_SIZE as f64).round() as i32;
    let row = (((pos.y - TOP_OFFSET) as f64) / GRID_SIZE as f64).round() as i32;
    Position {
        x: col * GRID_SIZE,
        y: TOP_OFFSET + row * GRID_SIZE,
    }
}

/// Drop contract: snap to the nearest cell, then re-clamp before persisting.
pub fn drop_position(pos: Position, viewport_w: i32, viewport_h: i32) -> Position {
    clamp_position(
        snap_to_grid(clamp_position(pos, viewport_w, viewport_h)),
        viewport_w,
        viewport_h,
    )
}

/// Compute on-screen positions for the given icon nodes.
pub fn calculate_layout(
    viewport_w: i32,
    viewport_h: i32,
    nodes: &[&FsNode],
) -> HashMap<String, Position> {
    let mut layout = HashMap::new();

    let mut manual: Vec<(&FsNode, Position)> = Vec::new();
    let mut auto: Vec<&FsNode> = Vec::new();
    for node in nodes {
        match manual_position(node) {
            Some(pos) => manual.push((node, pos)),
            None => auto.push(node),
        }
    }

    // Stable order across layout passes.
    auto.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));

    let cols = (viewport_w / GRID_SIZE).max(1);
    let rows = ((viewport_h - TOP_OFFSET) / GRID_SIZE).max(1);

    let mut occupied: HashSet<(i32, i32)> = HashSet::new();
    for (node, pos) in manual {
        let pos = clamp_position(pos, viewport_w, viewport_h);
        layout.insert(node.id.clone(), pos);

        let col = ((pos.x as f64) / GRID_SIZE as f64).round() as i32;
        let row = (((pos.y - TOP_OFFSET) as f64) / GRID_SIZE as f64).round() as i32;
        if (0..cols).contains(&col) && (0..rows).contains(&row) {
            occupied.insert((col, row));
        }
    }

    // New icons appear from the right edge: right-to-left columns, each
    // filled top to bottom, skipping cells claimed by manual icons.
    let mut remaining = auto.into_iter();
    let mut next = remaining.next();
    'grid: for col in (0..cols).rev() {
        for row in 0..rows {
            let Some(node) = next else { break 'grid };
            if occupied.contains(&(col, row)) {
                continue;
            }
            layout.insert(
                node.id.clone(),
                Position {
                    x: col * GRID_SIZE,
                    y: TOP_OFFSET + row * GRID_SIZE,
                },
            );
            next = remaining.next();
        }
    }

    // No overflow policy is defined; surplus icons get no placement.
    let dropped = next.map(|_| 1 + remaining.count()).unwrap_or(0);
    if dropped > 0 {
        tracing::debug!(dropped, "auto icons did not fit the desktop grid");
    }

    layout
}

/// Visible (non-hidden) desktop entries, in child order.
pub fn desktop_nodes(store: &FsStore) -> Vec<&FsNode> {
    match resolve_path(DESKTOP_PATH, store.nodes(), store.root_id()) {
        Some(desktop) => desktop
            .children()
            .iter()
            .filter_map(|id| store.node(id))
            .filter(|node| !node.hidden)
            .collect(),
        None => Vec::new(),
    }
}

/// Persist a drag release: snap, clamp, and store the manual position.
pub fn place_icon(store: &mut FsStore, id: &str, pos: Position, viewport_w: i32, viewport_h: i32) {
    let landed = drop_position(pos, viewport_w, viewport_h);
    let mut partial = Map::new();
    partial.insert(
        META_POSITION.to_string(),
        json!({ "x": landed.x, "y": landed.y }),
    );
    store.update_metadata(id, partial);
}
