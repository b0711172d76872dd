//! Game logic and engine glue

use key_engine::audio::Sound;
use key_engine::core::{Random, State, StateMachine};
use key_engine::prelude::*;
use key_engine::render::vertex::{AttributeKind, VertexBufferData, VertexLayout};
use key_engine::scene::Material;

use crate::field::PlayField;
use crate::fruit::Fruit;
use crate::grid::{Direction, GridLocation};
use crate::snake::Snake;

/// Seconds between snake steps at game speed 1.0
const MOVE_PERIOD: f32 = 0.15;

/// Safety limit so a headless run always terminates
const MAX_STEPS: u32 = 10_000;

const FIELD_WIDTH: i32 = 25;
const FIELD_HEIGHT: i32 = 25;

const STATE_INTRO: i32 = 0;
const STATE_PLAYING: i32 = 1;
const STATE_GAME_OVER: i32 = 2;

/// Short pause before the snake starts moving
struct IntroState {
    remaining: f32,
}

impl State for IntroState {
    fn state_id(&self) -> i32 {
        STATE_INTRO
    }

    fn update(&mut self, delta_time: f32) -> Option<i32> {
        self.remaining -= delta_time;
        (self.remaining <= 0.0).then_some(STATE_PLAYING)
    }
}

struct PlayingState;

impl State for PlayingState {
    fn state_id(&self) -> i32 {
        STATE_PLAYING
    }

    fn update(&mut self, _delta_time: f32) -> Option<i32> {
        None
    }

    fn on_enter(&mut self) {
        log::info!("snake is off");
    }
}

struct GameOverState;

impl State for GameOverState {
    fn state_id(&self) -> i32 {
        STATE_GAME_OVER
    }

    fn update(&mut self, _delta_time: f32) -> Option<i32> {
        None
    }
}

/// Snake game driving the engine headlessly
///
/// The snake steers itself toward the fruit; the run ends when it collides
/// with a wall or its own body.
pub struct SnakeGame {
    field: PlayField,
    snake: Snake,
    fruit: Fruit,
    rng: Random,
    direction: Direction,
    states: StateMachine,
    accumulator: f32,
    steps: u32,
    score: u32,
    snake_entity: Option<EntityId>,
    segment_meshes: Vec<Mesh>,
    fruit_mesh: Option<Mesh>,
    eat_sound: Sound,
}

impl SnakeGame {
    /// Create a game with a deterministic seed
    pub fn new(seed: u64) -> EngineResult<Self> {
        let mut rng = Random::from_seed(seed);
        let mut field = PlayField::new(FIELD_WIDTH, FIELD_HEIGHT);
        let snake = Snake::new(GridLocation::new(FIELD_WIDTH / 2, FIELD_HEIGHT / 2));
        let fruit = Fruit::new(&mut rng, &mut field, &snake)
            .ok_or_else(|| EngineError::gameplay("no free cell for the first fruit"))?;
        let mut states = StateMachine::new();
        states.add_state(Box::new(IntroState { remaining: 0.5 }));
        states.add_state(Box::new(PlayingState));
        states.add_state(Box::new(GameOverState));
        Ok(Self {
            field,
            snake,
            fruit,
            rng,
            direction: Direction::Right,
            states,
            accumulator: 0.0,
            steps: 0,
            score: 0,
            snake_entity: None,
            segment_meshes: Vec::new(),
            fruit_mesh: None,
            eat_sound: Sound::new("eat", "assets/eat.wav", 0)?,
        })
    }

    /// Final score
    pub fn score(&self) -> u32 {
        self.score
    }

    fn is_over(&self) -> bool {
        self.states.active_state_id() == Some(STATE_GAME_OVER)
    }

    fn build_graph(engine: &mut Engine) -> EngineResult<()> {
        let mut clear_rt = Box::new(ClearSurfacePass::new(
            "clearRT",
            ClearValue::Color([0.05, 0.05, 0.08, 1.0]),
        ));
        RenderGraph::set_pass_binder_target(clear_rt.as_mut(), "buffer", "$.backbuffer")?;
        engine.graph.append_pass(clear_rt)?;

        let mut clear_ds = Box::new(ClearSurfacePass::new("clearDS", ClearValue::Depth(1.0)));
        RenderGraph::set_pass_binder_target(clear_ds.as_mut(), "buffer", "$.masterDepth")?;
        engine.graph.append_pass(clear_ds)?;

        let mut main = Box::new(RenderQueuePass::new("main", SortOrder::FrontToBack));
        RenderGraph::set_pass_binder_target(
            main.as_mut(),
            RenderQueuePass::RENDER_TARGET,
            "clearRT.buffer",
        )?;
        RenderGraph::set_pass_binder_target(
            main.as_mut(),
            RenderQueuePass::DEPTH,
            "clearDS.buffer",
        )?;
        engine.graph.append_pass(main)?;

        engine
            .graph
            .set_global_binder_target(RenderGraph::BACKBUFFER, "main.renderTarget")?;
        engine
            .graph
            .set_global_binder_target(RenderGraph::MASTER_DEPTH, "main.depthStencil")
    }

    fn cell_mesh(engine: &mut Engine, name: &str, color: [f32; 4]) -> EngineResult<Mesh> {
        let mut layout = VertexLayout::new();
        layout.append(AttributeKind::Position3D)?;
        let mut vertices = VertexBufferData::with_vertices(layout, 4);
        let corners = [
            [-0.5_f32, -0.5, 0.0],
            [0.5, -0.5, 0.0],
            [0.5, 0.5, 0.0],
            [-0.5, 0.5, 0.0],
        ];
        for (i, corner) in corners.iter().enumerate() {
            vertices.write(i, AttributeKind::Position3D, corner);
        }

        let mut mesh = Mesh::new("cell", vertices, vec![0, 1, 2, 0, 2, 3], &mut engine.bindables)?;
        let material = Material::unlit(name, "flat", color);
        let mut effect = Effect::new("main", Channels::MAIN);
        for bindable in material.build_bindables(&mut engine.layouts, &mut engine.bindables)? {
            effect.add_bindable(bindable);
        }
        mesh.add_effect(effect);
        Ok(mesh)
    }

    /// Steer toward the fruit, preferring moves that stay survivable
    fn steer(&mut self) {
        let to_fruit = self.fruit.location() - self.snake.head();
        let mut candidates = Vec::with_capacity(4);
        if to_fruit.x.abs() >= to_fruit.y.abs() {
            candidates.push(if to_fruit.x > 0 { Direction::Right } else { Direction::Left });
            candidates.push(if to_fruit.y > 0 { Direction::Down } else { Direction::Up });
        } else {
            candidates.push(if to_fruit.y > 0 { Direction::Down } else { Direction::Up });
            candidates.push(if to_fruit.x > 0 { Direction::Right } else { Direction::Left });
        }
        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            if !candidates.contains(&dir) {
                candidates.push(dir);
            }
        }

        for dir in candidates {
            if dir == self.direction.opposite() {
                continue;
            }
            let next = self.snake.next_head(dir.delta());
            if self.field.is_inside(next) && !self.snake.collides_with(next) {
                self.direction = dir;
                return;
            }
        }
        // no survivable move; keep going and let the collision end the game
    }

    fn step(&mut self, engine: &mut Engine) -> EngineResult<()> {
        self.steps += 1;
        if self.steps >= MAX_STEPS {
            log::warn!("step limit reached, ending run");
            self.states.transition_to(STATE_GAME_OVER);
            return Ok(());
        }

        self.steer();
        let delta = self.direction.delta();
        let next = self.snake.next_head(delta);
        let Some(snake_entity) = self.snake_entity else {
            return Ok(());
        };

        if !self.field.is_inside(next) || self.snake.collides_with(next) {
            engine
                .dispatcher
                .post(Message::new(MessageKind::Damage, snake_entity, vec![snake_entity]));
        } else if next == self.fruit.location() {
            self.snake.grow(delta);
            if !self.fruit.respawn(&mut self.rng, &mut self.field, &self.snake) {
                log::info!("snake filled the field after {} steps", self.steps);
                self.states.transition_to(STATE_GAME_OVER);
            }
            engine
                .dispatcher
                .post(Message::new(MessageKind::Heal, snake_entity, vec![snake_entity]));
            // the headless sink never finishes on its own; release the
            // channel right away
            if let Ok(channel) = engine.sounds.play(&self.eat_sound, 0.8) {
                engine.sounds.stop(channel);
            }
        } else {
            self.snake.move_rel(delta);
        }
        Ok(())
    }
}

impl Application for SnakeGame {
    fn initialize(&mut self, engine: &mut Engine) -> EngineResult<()> {
        Self::build_graph(engine)?;

        self.snake_entity =
            Some(engine.entities.spawn("snake", Category::Player, None));
        engine.entities.spawn("fruit", Category::Scenery, None);

        self.fruit_mesh = Some(Self::cell_mesh(engine, "fruit", [0.9, 0.1, 0.1, 1.0])?);
        self.segment_meshes
            .push(Self::cell_mesh(engine, "head", [1.0, 1.0, 1.0, 1.0])?);

        engine.camera = Camera::looking_at(Vec3::new(0.0, 0.0, -30.0), Vec3::zeros());
        log::info!("snake game initialized, fruit at {:?}", self.fruit.location());
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> EngineResult<()> {
        self.states.update(delta_time);
        if self.states.active_state_id() != Some(STATE_PLAYING) {
            return Ok(());
        }
        self.accumulator += delta_time;
        while self.accumulator >= MOVE_PERIOD && !self.is_over() {
            self.accumulator -= MOVE_PERIOD;
            self.step(engine)?;
        }
        Ok(())
    }

    fn on_message(&mut self, _recipient: EntityId, message: &Message) -> bool {
        match message.kind() {
            MessageKind::Heal => {
                self.score += 1;
                true
            }
            MessageKind::Damage => {
                if !self.is_over() {
                    log::info!("snake died after {} steps with score {}", self.steps, self.score);
                    self.states.transition_to(STATE_GAME_OVER);
                }
                true
            }
            _ => false,
        }
    }

    fn submit(&mut self, engine: &mut Engine) -> EngineResult<()> {
        while self.segment_meshes.len() < self.snake.len() {
            let mesh = Self::cell_mesh(engine, "body", [0.1, 0.5, 0.1, 1.0])?;
            self.segment_meshes.push(mesh);
        }

        for (mesh, segment) in self.segment_meshes.iter_mut().zip(self.snake.segments()) {
            mesh.transform.position = self.field.cell_to_world(*segment);
            mesh.submit(&mut engine.graph, Channels::MAIN, &engine.camera)?;
        }
        if let Some(fruit_mesh) = &mut self.fruit_mesh {
            fruit_mesh.transform.position = self.field.cell_to_world(self.fruit.location());
            fruit_mesh.submit(&mut engine.graph, Channels::MAIN, &engine.camera)?;
        }
        Ok(())
    }

    fn is_finished(&self, _engine: &Engine) -> bool {
        self.is_over()
    }

    fn cleanup(&mut self, _engine: &mut Engine) {
        log::info!("final score: {}", self.score);
    }
}
