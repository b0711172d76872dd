//! Core engine implementation

use crate::application::Application;
use crate::audio::{AudioSink, NullSink, SoundManager};
use crate::core::settings::Settings;
use crate::core::EngineResult;
use crate::events::{Message, MessageDispatcher, MessageHandler};
use crate::foundation::time::Timer;
use crate::render::bindable::BindableCache;
use crate::render::dynamic::LayoutCache;
use crate::render::graph::RenderGraph;
use crate::render::graphics::{GraphicsDevice, RecordingDevice};
use crate::scene::{Camera, EntityId, EntityManager};
use crate::tasks::ThreadPool;

/// Main engine struct
///
/// Owns every subsystem and drives the frame loop: scaled timing, game
/// update, render-job submission, graph execution, channel reclamation.
pub struct Engine {
    /// Runtime configuration
    pub settings: Settings,
    /// All live entities
    pub entities: EntityManager,
    /// Frame message queue and delivery
    pub dispatcher: MessageDispatcher,
    /// Background worker pool
    pub tasks: ThreadPool,
    /// Sound channels and submixes
    pub sounds: SoundManager,
    /// Render pass pipeline
    pub graph: RenderGraph,
    /// Shared constant-buffer layouts
    pub layouts: LayoutCache,
    /// Shared GPU state objects
    pub bindables: BindableCache,
    /// Active camera
    pub camera: Camera,
    device: Box<dyn GraphicsDevice>,
    timer: Timer,
    running: bool,
}

impl Engine {
    /// Create an engine over the given device and audio sink
    pub fn new(settings: Settings, device: Box<dyn GraphicsDevice>, sink: Box<dyn AudioSink>) -> Self {
        log::info!("initializing engine");
        let tasks = ThreadPool::new(settings.rendering_threads as usize);
        Self {
            entities: EntityManager::new(),
            dispatcher: MessageDispatcher::new(),
            tasks,
            sounds: SoundManager::new(sink),
            graph: RenderGraph::new(),
            layouts: LayoutCache::new(),
            bindables: BindableCache::new(),
            camera: Camera::default(),
            device,
            timer: Timer::new(),
            running: true,
            settings,
        }
    }

    /// Create an engine recording device commands instead of drawing
    pub fn headless(settings: Settings) -> Self {
        Self::new(settings, Box::new(RecordingDevice::new()), Box::new(NullSink::new()))
    }

    /// Run the frame loop until the application finishes
    pub fn run<T: Application>(settings: Settings, app: &mut T) -> EngineResult<()> {
        let mut engine = Self::new(
            settings,
            Box::new(RecordingDevice::new()),
            Box::new(NullSink::new()),
        );
        app.initialize(&mut engine)?;
        engine.graph.finalize()?;
        log::info!("starting main loop");

        while engine.running && !app.is_finished(&engine) {
            let frame_start = std::time::Instant::now();
            engine.run_frame(app)?;
            if let Some(budget) = engine.settings.frame_budget() {
                let budget = std::time::Duration::from_secs_f32(budget);
                let elapsed = frame_start.elapsed();
                if elapsed < budget {
                    std::thread::sleep(budget - elapsed);
                }
            }
        }

        app.cleanup(&mut engine);
        engine.tasks.stop();
        engine.sounds.stop_all();
        log::info!("engine shutdown complete");
        Ok(())
    }

    /// Advance exactly one frame
    ///
    /// Split out from [`Engine::run`] so tests and tools can step the engine
    /// without a loop. Messages posted on the dispatcher are drained after
    /// `update` and handed to [`Application::on_message`], so nothing
    /// accumulates across frames.
    pub fn run_frame<T: Application>(&mut self, app: &mut T) -> EngineResult<()> {
        let delta_time = self.timer.tick(self.settings.effective_game_speed());
        self.sounds.update();
        app.update(self, delta_time)?;
        self.dispatcher.dispatch_all(&mut AppMessageSink { app })?;
        app.submit(self)?;
        self.graph.execute(self.device.as_mut())?;
        self.graph.reset();
        self.bindables.garbage_collect();
        Ok(())
    }

    /// Ask the loop to end after the current frame
    pub fn request_exit(&mut self) {
        self.running = false;
    }

    /// Whether the loop is still running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Accumulated game time in seconds, scaled by game speed
    pub fn total_time(&self) -> f32 {
        self.timer.total_time()
    }

    /// The device commands are issued to
    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }
}

/// Routes drained messages into the application callback
struct AppMessageSink<'a, T: Application> {
    app: &'a mut T,
}

impl<T: Application> MessageHandler for AppMessageSink<'_, T> {
    fn on_message(&mut self, recipient: EntityId, message: &Message) -> bool {
        self.app.on_message(recipient, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::graph::{ClearSurfacePass, RenderGraph, RenderQueuePass, SortOrder};
    use crate::render::graphics::ClearValue;

    struct CountingApp {
        frames: u32,
        limit: u32,
    }

    impl Application for CountingApp {
        fn initialize(&mut self, engine: &mut Engine) -> EngineResult<()> {
            let mut clear = Box::new(ClearSurfacePass::new(
                "clearRT",
                ClearValue::Color([0.0; 4]),
            ));
            RenderGraph::set_pass_binder_target(clear.as_mut(), "buffer", "$.backbuffer")?;
            engine.graph.append_pass(clear)?;
            let mut clear_ds = Box::new(ClearSurfacePass::new("clearDS", ClearValue::Depth(1.0)));
            RenderGraph::set_pass_binder_target(clear_ds.as_mut(), "buffer", "$.masterDepth")?;
            engine.graph.append_pass(clear_ds)?;
            let mut queue = Box::new(RenderQueuePass::new("main", SortOrder::FrontToBack));
            RenderGraph::set_pass_binder_target(
                queue.as_mut(),
                RenderQueuePass::RENDER_TARGET,
                "clearRT.buffer",
            )?;
            RenderGraph::set_pass_binder_target(
                queue.as_mut(),
                RenderQueuePass::DEPTH,
                "clearDS.buffer",
            )?;
            engine.graph.append_pass(queue)?;
            engine
                .graph
                .set_global_binder_target(RenderGraph::BACKBUFFER, "main.renderTarget")?;
            engine
                .graph
                .set_global_binder_target(RenderGraph::MASTER_DEPTH, "main.depthStencil")?;
            Ok(())
        }

        fn update(&mut self, _engine: &mut Engine, _delta_time: f32) -> EngineResult<()> {
            self.frames += 1;
            Ok(())
        }

        fn submit(&mut self, _engine: &mut Engine) -> EngineResult<()> {
            Ok(())
        }

        fn is_finished(&self, _engine: &Engine) -> bool {
            self.frames >= self.limit
        }
    }

    #[test]
    fn loop_runs_until_app_finishes() {
        let mut settings = Settings::default();
        settings.fps_cap = false;
        let mut app = CountingApp { frames: 0, limit: 3 };
        Engine::run(settings, &mut app).unwrap();
        assert_eq!(app.frames, 3);
    }

    #[test]
    fn posted_messages_reach_the_app_within_one_frame() {
        use crate::events::MessageKind;
        use crate::scene::Category;

        struct Courier {
            target: Option<EntityId>,
            delivered: Vec<MessageKind>,
        }
        impl Application for Courier {
            fn initialize(&mut self, engine: &mut Engine) -> EngineResult<()> {
                CountingApp { frames: 0, limit: 0 }.initialize(engine)?;
                self.target =
                    Some(engine.entities.spawn("target", Category::Uncategorized, None));
                Ok(())
            }
            fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> EngineResult<()> {
                if let Some(target) = self.target {
                    engine
                        .dispatcher
                        .post(Message::new(MessageKind::Greet, target, vec![target]));
                }
                Ok(())
            }
            fn on_message(&mut self, _recipient: EntityId, message: &Message) -> bool {
                self.delivered.push(message.kind());
                true
            }
            fn submit(&mut self, _engine: &mut Engine) -> EngineResult<()> {
                Ok(())
            }
        }

        let mut settings = Settings::default();
        settings.fps_cap = false;
        let mut engine = Engine::headless(settings);
        let mut app = Courier { target: None, delivered: Vec::new() };
        app.initialize(&mut engine).unwrap();
        engine.graph.finalize().unwrap();
        engine.run_frame(&mut app).unwrap();
        assert_eq!(app.delivered, vec![MessageKind::Greet]);
        assert_eq!(engine.dispatcher.pending(), 0);
    }

    #[test]
    fn paused_engine_reports_zero_delta() {
        struct PausedApp {
            saw_zero: bool,
            done: bool,
        }
        impl Application for PausedApp {
            fn initialize(&mut self, engine: &mut Engine) -> EngineResult<()> {
                CountingApp { frames: 0, limit: 0 }.initialize(engine)
            }
            fn update(&mut self, _engine: &mut Engine, delta_time: f32) -> EngineResult<()> {
                self.saw_zero = delta_time == 0.0;
                self.done = true;
                Ok(())
            }
            fn submit(&mut self, _engine: &mut Engine) -> EngineResult<()> {
                Ok(())
            }
            fn is_finished(&self, _engine: &Engine) -> bool {
                self.done
            }
        }

        let mut settings = Settings::default();
        settings.paused = true;
        settings.fps_cap = false;
        let mut app = PausedApp { saw_zero: false, done: false };
        Engine::run(settings, &mut app).unwrap();
        assert!(app.saw_zero);
    }
}
