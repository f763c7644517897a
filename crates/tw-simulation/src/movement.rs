use tw_core::entity::Entity;
use tw_core::geom::to_tile;
use tw_core::grid::TileGrid;

use crate::registry::EntityRegistry;

/// Move an entity by a sub-tile delta, one axis at a time.
///
/// Each axis move is refused when the new hitbox enters a tile that may not
/// be passed, or starts overlapping a solid entity it did not already
/// overlap. The entity must not be stored in `registry` while it moves
/// (it is either checked out or not yet attached). Returns `true` if the
/// entity moved along at least one axis.
pub fn move_entity(entity: &mut Entity, dx: i32, dy: i32, grid: &TileGrid, registry: &EntityRegistry) -> bool {
    if dx == 0 && dy == 0 {
        return true;
    }
    let mut moved = false;
    if dx != 0 && step(entity, dx, 0, grid, registry) {
        moved = true;
    }
    if dy != 0 && step(entity, 0, dy, grid, registry) {
        moved = true;
    }
    moved
}

fn step(entity: &mut Entity, dx: i32, dy: i32, grid: &TileGrid, registry: &EntityRegistry) -> bool {
    let before = entity.hitbox();
    let after = before.shifted(dx, dy);

    let (old_x0, old_y0, old_x1, old_y1) = tile_span(&before);
    let (x0, y0, x1, y1) = tile_span(&after);
    for yt in y0..=y1 {
        for xt in x0..=x1 {
            let inside_old = xt >= old_x0 && xt <= old_x1 && yt >= old_y0 && yt <= old_y1;
            if !inside_old && !grid.tile(xt, yt).may_pass {
                return false;
            }
        }
    }

    if entity.is_solid() {
        let was_inside = registry.entities_in_rect(&before);
        let blocked = registry
            .entities_in_rect(&after)
            .into_iter()
            .filter(|id| !was_inside.contains(id))
            .filter_map(|id| registry.get(id))
            .any(Entity::is_solid);
        if blocked {
            return false;
        }
    }

    entity.x += dx;
    entity.y += dy;
    true
}

fn tile_span(r: &tw_core::geom::Rect) -> (i32, i32, i32, i32) {
    (to_tile(r.x0), to_tile(r.y0), to_tile(r.x1 - 1), to_tile(r.y1 - 1))
}
