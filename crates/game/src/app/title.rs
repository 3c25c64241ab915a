use std::time::Instant;

use engine::{
    ActionContext, ActionError, ActionQueue, ActionStatus, Canvas, InputSnapshot, Scene,
    SceneCommand, SceneError, SceneKey, SceneStartContext,
};

#[derive(Debug, Default)]
struct TitleState {
    input: InputSnapshot,
    command: Option<SceneCommand>,
}

/// Blank screen that waits for the confirm key.
#[derive(Default)]
pub(crate) struct TitleScene {
    state: TitleState,
    queue: ActionQueue<TitleState>,
}

fn wait_for_confirm(cx: &mut ActionContext<'_, TitleState>) -> Result<ActionStatus, ActionError> {
    let state = cx.state_mut();
    if state.input.confirm_pressed() {
        state.command = Some(SceneCommand::SwitchTo(SceneKey::Island));
    }
    Ok(ActionStatus::Pending)
}

impl Scene for TitleScene {
    fn start(&mut self, _cx: &mut SceneStartContext<'_>) -> Result<(), SceneError> {
        self.state = TitleState::default();
        self.queue.clear();
        self.queue.add(wait_for_confirm);
        Ok(())
    }

    fn update(&mut self, input: &InputSnapshot, now: Instant) -> Result<SceneCommand, SceneError> {
        self.state.input = *input;
        self.queue.update(&mut self.state, now)?;
        Ok(self.state.command.take().unwrap_or(SceneCommand::None))
    }

    fn draw(&mut self, _canvas: &mut dyn Canvas) {}

    fn stop(&mut self) -> Result<(), SceneError> {
        self.queue.clear();
        Ok(())
    }

    fn debug_title(&self) -> Option<String> {
        Some("press space".to_string())
    }

    fn queued_actions(&self) -> usize {
        self.queue.len()
    }
}
