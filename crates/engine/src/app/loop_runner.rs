use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::iso::ScreenCoordinate;

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::scene::SceneMachine;
use super::{
    InputAction, InputSnapshot, LoopMetricsSnapshot, MetricsHandle, Renderer, Scene, SceneCommand, SceneError,
    SceneKey, SceneStartContext, Viewport,
};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Size of the frame scenes draw into; scaled to fit the window.
    pub logical_width: u32,
    pub logical_height: u32,
    pub metrics_log_interval: Duration,
    /// Scene movement is tuned per update, so this also sets game speed.
    pub max_render_fps: Option<u32>,
    pub asset_root: PathBuf,
    pub initial_scene: SceneKey,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Magnet Fishing".to_string(),
            window_width: 960,
            window_height: 540,
            logical_width: 1920,
            logical_height: 1080,
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: Some(60),
            asset_root: PathBuf::from("assets"),
            initial_scene: SceneKey::Title,
        }
    }
}

impl LoopConfig {
    pub fn logical_viewport(&self) -> Viewport {
        Viewport {
            width: self.logical_width.max(1),
            height: self.logical_height.max(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("failed to present frame: {0}")]
    Present(#[source] PixelsError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(
    config: LoopConfig,
    title: Box<dyn Scene>,
    island: Box<dyn Scene>,
) -> Result<(), AppError> {
    let metrics_handle = MetricsHandle::default();
    run_app_with_metrics(config, title, island, metrics_handle)
}

/// Runs the window until it closes. The first scene or present failure
/// stops the loop and is returned once the event loop has exited.
pub fn run_app_with_metrics(
    config: LoopConfig,
    title: Box<dyn Scene>,
    island: Box<dyn Scene>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let mut scenes = SceneMachine::new(title, island, config.initial_scene);
    let viewport = config.logical_viewport();

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .with_resizable(false)
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window), viewport, config.asset_root.clone())
        .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);

    info!(
        logical_width = viewport.width,
        logical_height = viewport.height,
        asset_root = %config.asset_root.display(),
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    scenes.start_active(&mut SceneStartContext {
        assets: &mut renderer,
        viewport,
        now: Instant::now(),
    })?;

    let mut input_collector = InputCollector::default();
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;
    let mut latest_metrics: Option<LoopMetricsSnapshot> = None;
    let mut fatal: Option<AppError> = None;

    let run_result = event_loop.run(|event, window_target| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested => {
                info!(reason = "window_close", "shutdown_requested");
                window_target.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                    warn!(error = %error, "renderer_resize_failed");
                    window_target.exit();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = renderer.window_pos_to_pixel(position.x, position.y);
                input_collector.set_cursor_position(logical);
            }
            WindowEvent::CursorLeft { .. } => {
                input_collector.clear_cursor_position();
            }
            WindowEvent::MouseInput { state, button, .. } => {
                input_collector.handle_mouse_input(button, state);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let is_pressed = event.state == ElementState::Pressed;
                input_collector.handle_physical_key(event.physical_key, is_pressed);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let frame_dt = now.saturating_duration_since(last_frame_instant);
                last_frame_instant = now;

                let input = input_collector.snapshot_for_tick();
                if input.quit_requested() {
                    info!(reason = "escape_key", "shutdown_requested");
                    window_target.exit();
                    return;
                }

                let step = scenes.update_active(&input, now).and_then(|command| match command {
                    SceneCommand::SwitchTo(next) => scenes
                        .switch_to(
                            next,
                            &mut SceneStartContext {
                                assets: &mut renderer,
                                viewport,
                                now,
                            },
                        )
                        .map(|_| ()),
                    SceneCommand::None => Ok(()),
                });
                if let Err(scene_error) = step {
                    error!(
                        scene = ?scenes.active_scene(),
                        error = %scene_error,
                        "scene_failed"
                    );
                    fatal = Some(scene_error.into());
                    window_target.exit();
                    return;
                }
                metrics_accumulator.record_update(scenes.queued_actions_active());

                let elapsed_since_last_present =
                    Instant::now().saturating_duration_since(last_present_instant);
                let cap_sleep = compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                if cap_sleep > Duration::ZERO {
                    thread::sleep(cap_sleep);
                }

                renderer.begin_frame();
                scenes.draw_active(&mut renderer);
                if let Err(present_error) = renderer.present() {
                    error!(error = %present_error, "renderer_present_failed");
                    fatal = Some(AppError::Present(present_error));
                    window_target.exit();
                    return;
                }
                last_present_instant = Instant::now();

                metrics_accumulator.record_frame(frame_dt);
                if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                    latest_metrics = Some(snapshot);
                    metrics_handle.publish(snapshot);
                    info!(
                        fps = snapshot.fps,
                        ups = snapshot.ups,
                        frame_time_ms = snapshot.frame_time_ms,
                        max_frame_time_ms = snapshot.max_frame_time_ms,
                        queued_actions = snapshot.queued_actions,
                        scene = ?scenes.active_scene(),
                        "loop_metrics"
                    );
                }

                let next_title = compose_window_title(
                    &config.window_title,
                    scenes.debug_title_active().as_deref(),
                    latest_metrics.as_ref(),
                );
                if last_applied_title.as_deref() != Some(next_title.as_str()) {
                    window.set_title(&next_title);
                    last_applied_title = Some(next_title);
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            window.request_redraw();
        }
        Event::LoopExiting => {
            if let Err(stop_error) = scenes.shutdown_all() {
                error!(error = %stop_error, "scene_stop_failed");
                if fatal.is_none() {
                    fatal = Some(stop_error.into());
                }
            }
            info!("shutdown");
        }
        _ => {}
    });

    run_result.map_err(AppError::EventLoopRun)?;
    match fatal {
        Some(app_error) => Err(app_error),
        None => Ok(()),
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    action_states: ActionStates,
    cursor_position: Option<ScreenCoordinate>,
    confirm_is_down: bool,
    confirm_pressed_edge: bool,
}

impl InputCollector {
    fn handle_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        match key {
            PhysicalKey::Code(KeyCode::Space) => self.handle_confirm_key(is_pressed),
            PhysicalKey::Code(KeyCode::KeyQ) => {
                self.action_states.set(InputAction::RotateLeft, is_pressed)
            }
            PhysicalKey::Code(KeyCode::KeyE) => {
                self.action_states.set(InputAction::RotateRight, is_pressed)
            }
            // Quit latches until the loop acts on it.
            PhysicalKey::Code(KeyCode::Escape) if is_pressed => {
                self.action_states.set(InputAction::Quit, true)
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, is_pressed: bool) {
        if is_pressed {
            if !self.confirm_is_down {
                self.confirm_pressed_edge = true;
            }
            self.confirm_is_down = true;
        } else {
            self.confirm_is_down = false;
        }
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.action_states
                .set(InputAction::PrimaryHeld, state == ElementState::Pressed);
        }
    }

    fn set_cursor_position(&mut self, position: ScreenCoordinate) {
        self.cursor_position = Some(position);
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position = None;
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.action_states,
            self.cursor_position,
            self.confirm_pressed_edge,
        );
        self.confirm_pressed_edge = false;
        snapshot
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

/// `base` or the scene's debug line, followed by the latest metrics.
fn compose_window_title(
    base: &str,
    scene_line: Option<&str>,
    metrics: Option<&LoopMetricsSnapshot>,
) -> String {
    let head = scene_line.unwrap_or(base);
    match metrics {
        Some(metrics) => format!("{head} | {metrics}"),
        None => head.to_string(),
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}
