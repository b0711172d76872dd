//! Application trait and lifecycle

use crate::core::EngineResult;
use crate::engine::Engine;
use crate::events::Message;
use crate::scene::EntityId;

/// Application lifecycle trait
///
/// Implement this trait to build a game on the engine. The engine drives the
/// frame loop and calls back in a fixed order each frame: `update` for game
/// logic, `on_message` for every message queued on the dispatcher, then
/// `submit` to queue render jobs before the graph executes.
pub trait Application {
    /// Called once after the engine is constructed
    ///
    /// Build the render graph, load sounds and spawn the initial entities
    /// here.
    fn initialize(&mut self, engine: &mut Engine) -> EngineResult<()>;

    /// Advance game logic by `delta_time` seconds
    ///
    /// `delta_time` is already scaled by the game speed and is zero while
    /// paused. Messages posted here reach [`Application::on_message`] in the
    /// same frame.
    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> EngineResult<()>;

    /// Deliver one queued message to one of its recipients
    ///
    /// Called after `update` for every message the dispatcher drained this
    /// frame. Return `true` to consume the message and stop forwarding to
    /// the remaining recipients. The default leaves messages unconsumed.
    fn on_message(&mut self, _recipient: EntityId, _message: &Message) -> bool {
        false
    }

    /// Queue this frame's render jobs into the engine's render graph
    fn submit(&mut self, engine: &mut Engine) -> EngineResult<()>;

    /// Whether the application wants the loop to end
    fn is_finished(&self, _engine: &Engine) -> bool {
        false
    }

    /// Called once when the loop ends
    fn cleanup(&mut self, _engine: &mut Engine) {}
}
