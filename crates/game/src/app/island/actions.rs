use std::time::Instant;

use engine::iso::{IsometricCoordinate, ScreenCoordinate};
use engine::worldgen::Tilemap;
use engine::{ActionContext, ActionError, ActionQueue, ActionStatus, TimerAction};
use rand::Rng;
use tracing::{debug, info};

use super::state::{sample_duration, Facing, IslandState, Scrap, ScrapKind};

type Cx<'a> = ActionContext<'a, IslandState>;

/// Queues the island's standing actions: movement every tick, the bobber and
/// scrap timer chains, and the growth replay when enabled.
pub(crate) fn enqueue_island_actions(
    queue: &mut ActionQueue<IslandState>,
    state: &IslandState,
    now: Instant,
) {
    queue.add(movement);
    queue.add(TimerAction::new(now, bob_tick));
    queue.add(TimerAction::new(now, scrap_tick));
    if state.gameplay.reveal_generation && !state.steps.is_empty() {
        queue.add(TimerAction::new(now + state.gameplay.reveal_delay(), reveal_tick));
    }
}

/// Walks toward the held cursor, keeps the camera near the player and
/// applies map rotation. Never finishes.
pub(crate) fn movement(cx: &mut Cx<'_>) -> Result<ActionStatus, ActionError> {
    let state = cx.state_mut();
    move_player(state)?;
    follow_player(state)?;
    rotate_map(state);
    Ok(ActionStatus::Pending)
}

fn move_player(state: &mut IslandState) -> Result<(), ActionError> {
    let input = state.input;
    let Some(cursor) = input.cursor().filter(|_| input.primary_held()) else {
        return Ok(());
    };
    let view = state.view;
    let player_screen = state.player.body.screen_center(&view);
    let offset = ScreenCoordinate::new(cursor.x - player_screen.x, cursor.y - player_screen.y);
    state.player.facing = if offset.x < 0.0 {
        Facing::Left
    } else {
        Facing::Right
    };

    let direction = view.projection.screen_to_iso(offset)?;
    let length = direction.ground_length();
    if !length.is_finite() || length <= f64::EPSILON {
        return Ok(());
    }
    let speed = state.gameplay.walk_speed;
    let current = state.player.body.pos;
    let target = IsometricCoordinate::new(
        current.x + direction.x / length * speed,
        current.y + direction.y / length * speed,
        current.z,
    );
    if let Some(z) = walkable_height(&state.tilemap, target) {
        state.player.body.pos = IsometricCoordinate::new(target.x, target.y, z + state.gameplay.player_lift);
    }
    Ok(())
}

fn walkable_height(tilemap: &Tilemap, point: IsometricCoordinate) -> Option<f64> {
    tilemap.walkable_at(point).map(|tile| tile.coord().z)
}

fn follow_player(state: &mut IslandState) -> Result<(), ActionError> {
    let view = state.view;
    let player_screen = state.player.body.screen_center(&view);
    let center = view.viewport.center();
    let drift = view.projection.screen_to_iso(ScreenCoordinate::new(
        player_screen.x - center.x,
        player_screen.y - center.y,
    ))?;
    let distance = drift.ground_length();
    if distance > state.gameplay.camera_max_distance {
        let step = state.gameplay.camera_speed / distance;
        let camera = &mut state.view.camera;
        camera.x += drift.x * step;
        camera.y += drift.y * step;
    }
    Ok(())
}

fn rotate_map(state: &mut IslandState) {
    let axis = state.input.rotation_axis();
    if axis == 0.0 {
        return;
    }
    let projection = &mut state.view.projection;
    let next = projection.rotation() + axis * state.gameplay.rotation_speed;
    projection.set_rotation(next);
}

pub(crate) fn bob_tick(cx: &mut Cx<'_>) -> Result<(), ActionError> {
    let state = cx.state_mut();
    let water_level = state.water_level;
    state.bobber.bob(&state.gameplay.bob_offsets, water_level);
    let next = cx.now() + cx.state().gameplay.bob_interval();
    cx.add(TimerAction::new(next, bob_tick));
    Ok(())
}

/// Clears expired scrap, spawns one piece, and reschedules itself.
pub(crate) fn scrap_tick(cx: &mut Cx<'_>) -> Result<(), ActionError> {
    let now = cx.now();
    let state = cx.state_mut();
    let expired = state.scrap.clear_expired(now);
    if expired > 0 {
        debug!(expired, "scrap_expired");
    }
    spawn_scrap(state, now);

    let (min, max) = state.gameplay.scrap_spawn_range();
    let next = now + sample_duration(&mut state.rng, min, max);
    cx.add(TimerAction::new(next, scrap_tick));
    Ok(())
}

/// Places a weighted-random scrap kind on a random empty shoreline slot and
/// casts the bobber there. Returns the slot, or `None` when every slot is full.
pub(crate) fn spawn_scrap(state: &mut IslandState, now: Instant) -> Option<IsometricCoordinate> {
    let kind = ScrapKind::random(&mut state.rng);
    let empty = state.scrap.empty_slots();
    if empty.is_empty() {
        debug!(slots = state.scrap.slot_count(), "scrap_slots_full");
        return None;
    }
    let slot = empty[state.rng.gen_range(0..empty.len())];
    let (min, max) = state.gameplay.scrap_life_range();
    let lifetime = sample_duration(&mut state.rng, min, max);
    state.scrap.place(
        slot,
        Scrap {
            kind,
            expires_at: now + lifetime,
        },
    );

    let bobber = &mut state.bobber;
    bobber.body.pos = IsometricCoordinate::new(slot.x, slot.y, bobber.body.pos.z);
    bobber.active = true;
    info!(
        x = slot.x,
        y = slot.y,
        kind = ?kind,
        lifetime_s = lifetime.as_secs(),
        "scrap_spawned"
    );
    Some(slot)
}

/// Swaps in the next growth step until the log runs out.
pub(crate) fn reveal_tick(cx: &mut Cx<'_>) -> Result<(), ActionError> {
    let state = cx.state_mut();
    let Some(step) = state.steps.step(state.reveal_step) else {
        return Ok(());
    };
    state.tilemap = Tilemap::densify(step, state.bounds, state.water_level);
    state.reveal_step += 1;
    let remaining = state.steps.len() - state.reveal_step;
    let interval = state.gameplay.reveal_interval();
    if remaining > 0 {
        let next = cx.now() + interval;
        cx.add(TimerAction::new(next, reveal_tick));
    } else {
        info!(steps = state.reveal_step, "island_reveal_finished");
    }
    Ok(())
}
