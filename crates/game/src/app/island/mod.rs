mod actions;
mod draw;
mod state;

use std::time::Instant;

use engine::worldgen::{generate_island, Tilemap};
use engine::{
    ActionQueue, Canvas, InputSnapshot, Scene, SceneCommand, SceneError, SceneStartContext,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::app::config::GameConfig;

use self::actions::enqueue_island_actions;
use self::draw::{draw_island, hooked_scrap, player_cell, IslandSprites};
use self::state::IslandState;

/// The playable scene: a freshly grown island, a wandering player, and scrap
/// washing up along the shore.
pub(crate) struct IslandScene {
    config: GameConfig,
    seed: u64,
    starts: u64,
    sprites: Option<IslandSprites>,
    state: Option<IslandState>,
    queue: ActionQueue<IslandState>,
}

impl IslandScene {
    pub(crate) fn new(config: GameConfig) -> Self {
        let seed = config.seed_or_default();
        Self {
            config,
            seed,
            starts: 0,
            sprites: None,
            state: None,
            queue: ActionQueue::new(),
        }
    }
}

impl Scene for IslandScene {
    fn start(&mut self, cx: &mut SceneStartContext<'_>) -> Result<(), SceneError> {
        let sprites = IslandSprites::load(cx.assets, &self.config.assets)?;

        // Each entry grows a different island; the first one uses the seed as given.
        let seed = self.seed.wrapping_add(self.starts);
        self.starts = self.starts.wrapping_add(1);
        let worldgen = &self.config.worldgen;
        let island = generate_island(seed, worldgen)?;
        info!(
            seed,
            start = self.starts,
            reveal = self.config.gameplay.reveal_generation,
            "island_scene_started"
        );

        let mut state = IslandState::new(
            island,
            self.config.gameplay.clone(),
            worldgen.water_level,
            worldgen.bounds,
            cx.viewport,
            ChaCha8Rng::seed_from_u64(seed),
        );
        if state.gameplay.reveal_generation {
            state.tilemap = Tilemap::densify(&[], state.bounds, state.water_level);
        }
        self.queue.clear();
        enqueue_island_actions(&mut self.queue, &state, cx.now);
        self.sprites = Some(sprites);
        self.state = Some(state);
        Ok(())
    }

    fn update(&mut self, input: &InputSnapshot, now: Instant) -> Result<SceneCommand, SceneError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(SceneCommand::None);
        };
        state.input = *input;
        self.queue.update(state, now)?;
        Ok(SceneCommand::None)
    }

    fn draw(&mut self, canvas: &mut dyn Canvas) {
        if let (Some(state), Some(sprites)) = (self.state.as_mut(), self.sprites.as_ref()) {
            draw_island(state, sprites, canvas);
        }
    }

    fn stop(&mut self) -> Result<(), SceneError> {
        self.queue.clear();
        self.state = None;
        self.sprites = None;
        Ok(())
    }

    fn debug_title(&self) -> Option<String> {
        let state = self.state.as_ref()?;
        let cell = player_cell(state);
        let hooked = hooked_scrap(state).map_or_else(|| "-".to_string(), |kind| format!("{kind:?}"));
        Some(format!(
            "seed {} | cell ({}, {}) | scrap {}/{} | hook {} | rot {:.2}",
            self.seed.wrapping_add(self.starts.saturating_sub(1)),
            cell.x,
            cell.y,
            state.scrap.len(),
            state.scrap.slot_count(),
            hooked,
            state.view.projection.rotation(),
        ))
    }

    fn queued_actions(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use engine::iso::{IsometricCoordinate, ScreenCoordinate};
    use engine::{
        AssetError, AssetProvider, InputAction, SheetSpec, SpriteHandle, SpriteSize, Viewport,
    };

    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::{Layer, Registry};

    use super::state::Facing;
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 1920,
        height: 1080,
    };

    #[derive(Default)]
    struct FakeAssets {
        next: usize,
        loads: usize,
    }

    impl AssetProvider for FakeAssets {
        fn load_sheet(&mut self, spec: &SheetSpec) -> Result<Vec<SpriteHandle>, AssetError> {
            self.loads += 1;
            let handles = (self.next..self.next + spec.cell_count())
                .map(SpriteHandle)
                .collect();
            self.next += spec.cell_count();
            Ok(handles)
        }
    }

    struct MissingAssets;

    impl AssetProvider for MissingAssets {
        fn load_sheet(&mut self, spec: &SheetSpec) -> Result<Vec<SpriteHandle>, AssetError> {
            Err(AssetError::EmptyGrid {
                path: spec.path.clone(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingCanvas {
        draws: Vec<(SpriteHandle, ScreenCoordinate, SpriteSize)>,
    }

    impl Canvas for RecordingCanvas {
        fn viewport(&self) -> Viewport {
            VIEWPORT
        }

        fn draw_sprite(&mut self, sprite: SpriteHandle, top_left: ScreenCoordinate, size: SpriteSize) {
            self.draws.push((sprite, top_left, size));
        }
    }

    fn config(seed: u64) -> GameConfig {
        GameConfig {
            seed: Some(seed),
            ..GameConfig::default()
        }
    }

    fn started(seed: u64, now: Instant) -> IslandScene {
        let mut scene = IslandScene::new(config(seed));
        let mut assets = FakeAssets::default();
        let mut cx = SceneStartContext {
            assets: &mut assets,
            viewport: VIEWPORT,
            now,
        };
        scene.start(&mut cx).expect("island scene starts");
        scene
    }

    fn state(scene: &IslandScene) -> &IslandState {
        scene.state.as_ref().expect("scene is started")
    }

    #[test]
    fn start_populates_island_and_queues_standing_actions() {
        let now = Instant::now();
        let scene = started(3, now);
        let state = state(&scene);

        assert_eq!(state.tilemap.len(), state.bounds.cell_count());
        assert!(state.scrap.slot_count() > 0);
        let under = state
            .tilemap
            .walkable_at(state.player.body.pos)
            .expect("player spawns on walkable ground");
        assert!((state.player.body.pos.z - (under.coord().z + 0.5)).abs() < 1e-12);
        // movement, bobber timer, scrap timer
        assert_eq!(scene.queued_actions(), 3);
    }

    #[test]
    fn first_update_spawns_scrap_and_casts_bobber() {
        let now = Instant::now();
        let mut scene = started(3, now);
        scene
            .update(&InputSnapshot::empty(), now)
            .expect("update succeeds");

        let state = state(&scene);
        assert_eq!(state.scrap.len(), 1);
        assert!(state.bobber.active);
        let bob = state.bobber.body.pos;
        let slot = IsometricCoordinate::new(bob.x, bob.y, scene.config.worldgen.water_level);
        let scrap = state.scrap.get(slot).expect("scrap under the bobber");
        let life = scrap.expires_at.duration_since(now);
        assert!(life >= Duration::from_secs(30) && life < Duration::from_secs(60));
        assert_eq!(scene.queued_actions(), 3);
    }

    #[test]
    fn bobber_follows_offsets_every_interval() {
        let now = Instant::now();
        let mut scene = started(5, now);
        let input = InputSnapshot::empty();
        let water = scene.config.worldgen.water_level;

        scene.update(&input, now).expect("update");
        assert!((state(&scene).bobber.body.pos.z - (water - 0.1)).abs() < 1e-12);
        scene
            .update(&input, now + Duration::from_millis(200))
            .expect("update");
        assert!((state(&scene).bobber.body.pos.z - (water - 0.1)).abs() < 1e-12);
        scene
            .update(&input, now + Duration::from_millis(500))
            .expect("update");
        assert!((state(&scene).bobber.body.pos.z - water).abs() < 1e-12);
    }

    #[test]
    fn holding_primary_walks_toward_cursor() {
        let now = Instant::now();
        let mut scene = started(11, now);
        let before = state(&scene).player.body.pos;
        let center = state(&scene).player.body.screen_center(&state(&scene).view);

        // Cursor straight left of the player: screen x decreases, facing flips.
        let input = InputSnapshot::empty()
            .with_cursor(Some(ScreenCoordinate::new(center.x - 200.0, center.y)))
            .with_action_down(InputAction::PrimaryHeld, true);
        let mut moved = false;
        for tick in 0..30u64 {
            scene
                .update(&input, now + Duration::from_millis(tick))
                .expect("update");
            let pos = state(&scene).player.body.pos;
            if pos.ground() != before.ground() {
                moved = true;
                break;
            }
        }
        let state = state(&scene);
        assert_eq!(state.player.facing, Facing::Left);
        if moved {
            let step = IsometricCoordinate::new(
                state.player.body.pos.x - before.x,
                state.player.body.pos.y - before.y,
                0.0,
            );
            assert!((step.ground_length() - state.gameplay.walk_speed).abs() < 1e-9);
            assert!(state.tilemap.walkable_at(state.player.body.pos).is_some());
        }
    }

    #[test]
    fn released_button_leaves_player_in_place() {
        let now = Instant::now();
        let mut scene = started(11, now);
        let before = state(&scene).player.body.pos;
        let input = InputSnapshot::empty().with_cursor(Some(ScreenCoordinate::new(0.0, 0.0)));
        scene.update(&input, now).expect("update");
        assert_eq!(state(&scene).player.body.pos, before);
    }

    #[test]
    fn rotation_keys_turn_the_projection() {
        let now = Instant::now();
        let mut scene = started(2, now);
        let input = InputSnapshot::empty().with_action_down(InputAction::RotateRight, true);
        scene.update(&input, now).expect("update");
        scene.update(&input, now).expect("update");
        let rotation = state(&scene).view.projection.rotation();
        assert!((rotation - 2.0 * scene.config.gameplay.rotation_speed).abs() < 1e-12);
    }

    #[test]
    fn draw_paints_every_tile_then_objects_back_to_front() {
        let now = Instant::now();
        let mut scene = started(4, now);
        scene
            .update(&InputSnapshot::empty(), now)
            .expect("update");
        let mut canvas = RecordingCanvas::default();
        scene.draw(&mut canvas);

        let state = state(&scene);
        let tiles = state.tilemap.len();
        let objects = state.foliage.len() + 2;
        assert_eq!(canvas.draws.len(), tiles + objects);
        assert!((state.water_phase - state.gameplay.water_phase_step).abs() < 1e-12);

        let bottoms: Vec<f64> = canvas.draws[tiles..]
            .iter()
            .map(|(_, top_left, size)| top_left.y + size.height)
            .collect();
        assert!(bottoms.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn restart_grows_a_different_island() {
        let now = Instant::now();
        let mut scene = started(8, now);
        let first: Vec<IsometricCoordinate> =
            state(&scene).steps.accepted().iter().map(|tile| tile.coord()).collect();

        scene.stop().expect("stop");
        assert!(scene.state.is_none());
        assert_eq!(scene.queued_actions(), 0);

        let mut assets = FakeAssets::default();
        let mut cx = SceneStartContext {
            assets: &mut assets,
            viewport: VIEWPORT,
            now,
        };
        scene.start(&mut cx).expect("restart");
        let second: Vec<IsometricCoordinate> =
            state(&scene).steps.accepted().iter().map(|tile| tile.coord()).collect();
        assert_ne!(first, second);
        assert_eq!(assets.loads, 3);
    }

    #[test]
    fn reveal_replays_growth_when_enabled() {
        let now = Instant::now();
        let mut config = config(6);
        config.gameplay.reveal_generation = true;
        let mut scene = IslandScene::new(config);
        let mut assets = FakeAssets::default();
        let mut cx = SceneStartContext {
            assets: &mut assets,
            viewport: VIEWPORT,
            now,
        };
        scene.start(&mut cx).expect("start");
        assert_eq!(scene.queued_actions(), 4);

        let input = InputSnapshot::empty();
        let delay = scene.config.gameplay.reveal_delay();
        scene.update(&input, now + delay).expect("update");
        let state = state(&scene);
        assert_eq!(state.reveal_step, 1);
        let land = state
            .tilemap
            .tiles()
            .iter()
            .filter(|tile| tile.kind() != engine::TileKind::Water)
            .count();
        assert_eq!(land, 1);
    }

    #[test]
    fn missing_sprites_fail_the_start() {
        let mut scene = IslandScene::new(config(1));
        let mut assets = MissingAssets;
        let mut cx = SceneStartContext {
            assets: &mut assets,
            viewport: VIEWPORT,
            now: Instant::now(),
        };
        assert!(matches!(scene.start(&mut cx), Err(SceneError::Asset(_))));
        assert!(scene.state.is_none());
        assert!(scene.debug_title().is_none());
    }

    #[derive(Clone, Default)]
    struct EventLog(Arc<Mutex<Vec<String>>>);

    struct MessageVisitor(Option<String>);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = Some(format!("{value:?}"));
            }
        }
    }

    impl<S: Subscriber> Layer<S> for EventLog {
        fn on_event(&self, event: &Event<'_>, _cx: Context<'_, S>) {
            let mut visitor = MessageVisitor(None);
            event.record(&mut visitor);
            if let Some(message) = visitor.0 {
                self.0.lock().expect("event log").push(message);
            }
        }
    }

    #[test]
    fn scene_start_reports_generation_once() {
        let log = EventLog::default();
        let subscriber = Registry::default().with(log.clone());
        tracing::subscriber::with_default(subscriber, || {
            started(13, Instant::now());
        });

        let events = log.0.lock().expect("event log").clone();
        let count = |name: &str| events.iter().filter(|event| event.as_str() == name).count();
        assert_eq!(count("island_generated"), 1, "{events:?}");
        assert_eq!(count("island_scene_started"), 1, "{events:?}");
    }
}
