use std::time::Instant;

use thiserror::Error;
use tracing::info;

use crate::worldgen::GenerationError;

use super::{ActionError, AssetError, AssetProvider, Canvas, InputSnapshot, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
    Title,
    Island,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("action failed: {0}")]
    Action(#[from] ActionError),
    #[error("asset load failed: {0}")]
    Asset(#[from] AssetError),
    #[error("island generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Everything a scene may touch while starting.
pub struct SceneStartContext<'a> {
    pub assets: &'a mut dyn AssetProvider,
    pub viewport: Viewport,
    pub now: Instant,
}

pub trait Scene {
    /// (Re)initialises all scene state. Called each time the scene becomes active.
    fn start(&mut self, cx: &mut SceneStartContext<'_>) -> Result<(), SceneError>;
    fn update(&mut self, input: &InputSnapshot, now: Instant) -> Result<SceneCommand, SceneError>;
    fn draw(&mut self, canvas: &mut dyn Canvas);
    fn stop(&mut self) -> Result<(), SceneError>;
    fn debug_title(&self) -> Option<String> {
        None
    }
    fn queued_actions(&self) -> usize {
        0
    }
}

struct SceneRuntime {
    scene: Box<dyn Scene>,
    is_started: bool,
}

impl SceneRuntime {
    fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            is_started: false,
        }
    }

    fn start(&mut self, cx: &mut SceneStartContext<'_>) -> Result<(), SceneError> {
        self.scene.start(cx)?;
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SceneError> {
        if !self.is_started {
            return Ok(());
        }
        self.is_started = false;
        self.scene.stop()
    }
}

pub(crate) struct SceneMachine {
    title: SceneRuntime,
    island: SceneRuntime,
    active_scene: SceneKey,
}

impl SceneMachine {
    pub(crate) fn new(title: Box<dyn Scene>, island: Box<dyn Scene>, active_scene: SceneKey) -> Self {
        Self {
            title: SceneRuntime::new(title),
            island: SceneRuntime::new(island),
            active_scene,
        }
    }

    pub(crate) fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub(crate) fn start_active(&mut self, cx: &mut SceneStartContext<'_>) -> Result<(), SceneError> {
        let key = self.active_scene;
        let runtime = self.runtime_mut(key);
        if runtime.is_started {
            return Ok(());
        }
        runtime.start(cx)?;
        info!(scene = ?key, "scene_started");
        Ok(())
    }

    pub(crate) fn update_active(
        &mut self,
        input: &InputSnapshot,
        now: Instant,
    ) -> Result<SceneCommand, SceneError> {
        self.active_runtime_mut().scene.update(input, now)
    }

    pub(crate) fn draw_active(&mut self, canvas: &mut dyn Canvas) {
        self.active_runtime_mut().scene.draw(canvas);
    }

    pub(crate) fn debug_title_active(&self) -> Option<String> {
        self.runtime_ref(self.active_scene).scene.debug_title()
    }

    pub(crate) fn queued_actions_active(&self) -> usize {
        self.runtime_ref(self.active_scene).scene.queued_actions()
    }

    /// Stops the active scene, then starts `next` from scratch. Returns
    /// `false` without touching either scene when `next` is already active.
    pub(crate) fn switch_to(
        &mut self,
        next: SceneKey,
        cx: &mut SceneStartContext<'_>,
    ) -> Result<bool, SceneError> {
        if self.active_scene == next {
            return Ok(false);
        }
        let previous = self.active_scene;
        self.active_runtime_mut().stop()?;
        info!(scene = ?previous, "scene_stopped");

        self.active_scene = next;
        self.runtime_mut(next).start(cx)?;
        info!(from = ?previous, scene = ?next, "scene_switched");
        Ok(true)
    }

    pub(crate) fn shutdown_all(&mut self) -> Result<(), SceneError> {
        self.title.stop()?;
        self.island.stop()
    }

    fn active_runtime_mut(&mut self) -> &mut SceneRuntime {
        self.runtime_mut(self.active_scene)
    }

    fn runtime_ref(&self, key: SceneKey) -> &SceneRuntime {
        match key {
            SceneKey::Title => &self.title,
            SceneKey::Island => &self.island,
        }
    }

    fn runtime_mut(&mut self, key: SceneKey) -> &mut SceneRuntime {
        match key {
            SceneKey::Title => &mut self.title,
            SceneKey::Island => &mut self.island,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::app::{SheetSpec, SpriteHandle};

    type Log = Rc<RefCell<Vec<String>>>;

    struct NoAssets;

    impl AssetProvider for NoAssets {
        fn load_sheet(&mut self, _spec: &SheetSpec) -> Result<Vec<SpriteHandle>, AssetError> {
            Ok(Vec::new())
        }
    }

    struct RecordingScene {
        name: &'static str,
        log: Log,
        next: SceneCommand,
        fail_start: bool,
    }

    impl RecordingScene {
        fn boxed(name: &'static str, log: &Log, next: SceneCommand) -> Box<dyn Scene> {
            Box::new(Self {
                name,
                log: Rc::clone(log),
                next,
                fail_start: false,
            })
        }
    }

    impl Scene for RecordingScene {
        fn start(&mut self, _cx: &mut SceneStartContext<'_>) -> Result<(), SceneError> {
            self.log.borrow_mut().push(format!("{}:start", self.name));
            if self.fail_start {
                return Err(ActionError::failed("start", "refused").into());
            }
            Ok(())
        }

        fn update(
            &mut self,
            _input: &InputSnapshot,
            _now: Instant,
        ) -> Result<SceneCommand, SceneError> {
            self.log.borrow_mut().push(format!("{}:update", self.name));
            Ok(self.next)
        }

        fn draw(&mut self, _canvas: &mut dyn Canvas) {}

        fn stop(&mut self) -> Result<(), SceneError> {
            self.log.borrow_mut().push(format!("{}:stop", self.name));
            Ok(())
        }

        fn debug_title(&self) -> Option<String> {
            Some(self.name.to_string())
        }
    }

    fn context(assets: &mut NoAssets) -> SceneStartContext<'_> {
        SceneStartContext {
            assets,
            viewport: Viewport {
                width: 1920,
                height: 1080,
            },
            now: Instant::now(),
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    #[test]
    fn switch_stops_current_before_starting_next() {
        let log: Log = Rc::default();
        let mut machine = SceneMachine::new(
            RecordingScene::boxed("title", &log, SceneCommand::SwitchTo(SceneKey::Island)),
            RecordingScene::boxed("island", &log, SceneCommand::None),
            SceneKey::Title,
        );
        let mut assets = NoAssets;

        machine.start_active(&mut context(&mut assets)).expect("start");
        let command = machine
            .update_active(&InputSnapshot::empty(), Instant::now())
            .expect("update");
        let SceneCommand::SwitchTo(next) = command else {
            panic!("expected switch, got {command:?}");
        };
        assert!(machine.switch_to(next, &mut context(&mut assets)).expect("switch"));

        assert_eq!(machine.active_scene(), SceneKey::Island);
        assert_eq!(machine.debug_title_active().as_deref(), Some("island"));
        assert_eq!(
            entries(&log),
            vec!["title:start", "title:update", "title:stop", "island:start"]
        );
    }

    #[test]
    fn switching_to_active_scene_is_a_no_op() {
        let log: Log = Rc::default();
        let mut machine = SceneMachine::new(
            RecordingScene::boxed("title", &log, SceneCommand::None),
            RecordingScene::boxed("island", &log, SceneCommand::None),
            SceneKey::Title,
        );
        let mut assets = NoAssets;
        machine.start_active(&mut context(&mut assets)).expect("start");
        machine.start_active(&mut context(&mut assets)).expect("second start");

        assert!(!machine
            .switch_to(SceneKey::Title, &mut context(&mut assets))
            .expect("switch"));
        assert_eq!(entries(&log), vec!["title:start"]);
    }

    #[test]
    fn returning_to_a_scene_restarts_it() {
        let log: Log = Rc::default();
        let mut machine = SceneMachine::new(
            RecordingScene::boxed("title", &log, SceneCommand::None),
            RecordingScene::boxed("island", &log, SceneCommand::None),
            SceneKey::Title,
        );
        let mut assets = NoAssets;
        machine.start_active(&mut context(&mut assets)).expect("start");
        machine
            .switch_to(SceneKey::Island, &mut context(&mut assets))
            .expect("to island");
        machine
            .switch_to(SceneKey::Title, &mut context(&mut assets))
            .expect("back to title");
        machine.shutdown_all().expect("shutdown");

        assert_eq!(
            entries(&log),
            vec![
                "title:start",
                "title:stop",
                "island:start",
                "island:stop",
                "title:start",
                "title:stop",
            ]
        );
    }

    #[test]
    fn failed_start_propagates_and_leaves_scene_stopped() {
        let log: Log = Rc::default();
        let island = Box::new(RecordingScene {
            name: "island",
            log: Rc::clone(&log),
            next: SceneCommand::None,
            fail_start: true,
        });
        let mut machine = SceneMachine::new(
            RecordingScene::boxed("title", &log, SceneCommand::None),
            island,
            SceneKey::Title,
        );
        let mut assets = NoAssets;
        machine.start_active(&mut context(&mut assets)).expect("start");

        let error = machine
            .switch_to(SceneKey::Island, &mut context(&mut assets))
            .expect_err("start failure");
        assert!(matches!(error, SceneError::Action(_)));

        machine.shutdown_all().expect("shutdown");
        assert_eq!(
            entries(&log),
            vec!["title:start", "title:stop", "island:start"]
        );
    }
}
