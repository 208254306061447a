// Game loop driver: sets up a game, runs single ticks and tears the game down.

use std::fmt;

use crate::domain::systems::collision::{self, DestroyedTank};
use crate::domain::systems::movement::{self, MovementConfig};
use crate::domain::{
    Body, Controller, Entity, EntityId, EntityKind, Level, LevelError, PlayerInput, TankState,
    Tuning, WallState, World, WorldError,
};
use crate::use_cases::types::{GameOutcome, GamePhase, TickOutcome};
use crate::use_cases::view::{Screen, ViewAdapter};
use tracing::{debug, info, warn};

pub const PLAYER_TANK_IMAGE: &str = "player-tank.png";
pub const AI_TANK_IMAGE: &str = "ai-tank.png";
pub const SHELL_IMAGE: &str = "shell.png";

/// Errors returned by driver lifecycle operations.
#[derive(Debug)]
pub enum GameError {
    World(WorldError),
    Config(LevelError),
    // Operation not allowed in the current phase.
    InvalidPhase(GamePhase),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::World(e) => write!(f, "world error: {e}"),
            GameError::Config(e) => write!(f, "config error: {e}"),
            GameError::InvalidPhase(phase) => write!(f, "not allowed while {phase:?}"),
        }
    }
}

impl std::error::Error for GameError {}

impl From<WorldError> for GameError {
    fn from(e: WorldError) -> Self {
        GameError::World(e)
    }
}

impl From<LevelError> for GameError {
    fn from(e: LevelError) -> Self {
        GameError::Config(e)
    }
}

pub struct GameDriver<V> {
    view: V,
    world: World,
    tuning: Tuning,
    movement: MovementConfig,
    phase: GamePhase,
    tick: u64,
    player_id: Option<EntityId>,
    ai_ids: Vec<EntityId>,
    quit_requested: bool,
    outcome: Option<GameOutcome>,
}

impl<V: ViewAdapter> GameDriver<V> {
    pub fn new(view: V, tuning: Tuning) -> Self {
        Self {
            view,
            world: World::new(),
            tuning,
            movement: MovementConfig {
                tuning,
                playfield: Default::default(),
            },
            phase: GamePhase::Idle,
            tick: 0,
            player_id: None,
            ai_ids: Vec::new(),
            quit_requested: false,
            outcome: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player_id
    }

    /// Shows the start screen; used once when the process comes up.
    pub fn show_start_screen(&mut self) {
        self.view.set_screen(Screen::Start);
        self.view.present(self.tick);
    }

    /// Builds the initial world from `level` and shows it. `Idle -> Running`.
    pub fn set_up_game(&mut self, level: &Level) -> Result<(), GameError> {
        if self.phase != GamePhase::Idle {
            return Err(GameError::InvalidPhase(self.phase));
        }
        level.validate(&self.tuning)?;

        self.world.clear();
        self.tick = 0;
        self.quit_requested = false;
        self.outcome = None;
        self.movement = MovementConfig {
            tuning: self.tuning,
            playfield: level.playfield,
        };

        if let Err(e) = self.populate(level) {
            self.world.clear();
            self.player_id = None;
            self.ai_ids.clear();
            return Err(e.into());
        }

        let added = self.world.reconcile_adds();
        self.add_sprites(&added);
        self.view.set_screen(Screen::Running);
        self.view.present(self.tick);
        self.phase = GamePhase::Running;

        info!(
            entities = self.world.len(),
            ai_tanks = self.ai_ids.len(),
            walls = level.walls.len(),
            "game set up"
        );
        Ok(())
    }

    fn populate(&mut self, level: &Level) -> Result<(), WorldError> {
        let health = self.tuning.tank.max_health;

        let player = &level.player;
        self.player_id = Some(self.world.spawn(
            player.x,
            player.y,
            player.angle(),
            Body::Tank(TankState::new(Controller::Player, health)),
        )?);

        self.ai_ids.clear();
        for ai in &level.ai_tanks {
            let id = self.world.spawn(
                ai.x,
                ai.y,
                ai.angle(),
                Body::Tank(TankState::new(Controller::Ai, health)),
            )?;
            self.ai_ids.push(id);
        }

        for wall in &level.walls {
            self.world.spawn(
                wall.x,
                wall.y,
                0.0,
                Body::Wall(WallState {
                    image: wall.image.clone(),
                }),
            )?;
        }
        Ok(())
    }

    /// Asks the running game to stop at the next tick boundary.
    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    /// Runs a single frame: move, bounds, collisions, reconcile, sync the view.
    pub fn update_game(&mut self, input: PlayerInput) -> TickOutcome {
        if self.phase != GamePhase::Running {
            warn!(phase = ?self.phase, "tick requested while not running");
            return TickOutcome::Stop(self.outcome.unwrap_or(GameOutcome::Quit));
        }
        if self.quit_requested {
            return self.finish(GameOutcome::Quit);
        }

        self.tick += 1;

        if let Some(tank) = self
            .player_id
            .and_then(|id| self.world.get_mut(id))
            .and_then(Entity::tank_mut)
        {
            tank.input = input;
        }
        let target = self
            .player_id
            .and_then(|id| self.world.get(id))
            .map(|e| e.center(&self.tuning));

        let mut spawns = Vec::new();
        for e in self.world.entities_mut() {
            movement::move_entity(e, &self.movement, target, &mut spawns);
        }
        for spawn in spawns {
            let owner = spawn.shell.owner;
            match self
                .world
                .spawn(spawn.x, spawn.y, spawn.angle, Body::Shell(spawn.shell))
            {
                Ok(id) => debug!(shell_id = id.0, owner_id = owner.0, "shell fired"),
                Err(e) => warn!(owner_id = owner.0, error = %e, "dropping shell that failed to spawn"),
            }
        }

        movement::check_bounds(&mut self.world, &self.movement);

        let effects = collision::detect_collisions(&self.world, &self.tuning);
        let destroyed = collision::apply_effects(
            &mut self.world,
            effects,
            &self.tuning,
            self.movement.playfield,
        );

        let removed = self.world.reconcile_removes();
        let added = self.world.reconcile_adds();

        self.add_sprites(&added);
        for e in self.world.entities() {
            self.view.set_sprite_location_and_angle(e.id, e.x, e.y, e.angle);
        }
        for id in &removed {
            self.view.remove_sprite(*id);
        }
        self.view.present(self.tick);

        match self.terminal_outcome(&destroyed) {
            Some(outcome) => self.finish(outcome),
            None => TickOutcome::Continue,
        }
    }

    fn terminal_outcome(&self, destroyed: &[DestroyedTank]) -> Option<GameOutcome> {
        if destroyed.iter().any(|d| d.kind == EntityKind::PlayerTank) {
            return Some(GameOutcome::Defeat);
        }
        // A level without AI tanks has no victory condition.
        if !self.ai_ids.is_empty() && self.ai_ids.iter().all(|id| !self.world.is_live(*id)) {
            return Some(GameOutcome::Victory);
        }
        None
    }

    fn finish(&mut self, outcome: GameOutcome) -> TickOutcome {
        self.phase = GamePhase::Ending;
        self.outcome = Some(outcome);
        self.view.set_screen(Screen::End);
        self.view.present(self.tick);
        info!(tick = self.tick, ?outcome, "game over");
        TickOutcome::Stop(outcome)
    }

    /// Clears every entity and sprite so a fresh game leaks nothing. `-> Idle`.
    pub fn reset_game(&mut self) {
        self.world.clear();
        self.view.reset();
        self.view.present(self.tick);
        self.phase = GamePhase::Idle;
        self.tick = 0;
        self.player_id = None;
        self.ai_ids.clear();
        self.quit_requested = false;
        self.outcome = None;
    }

    fn add_sprites(&mut self, ids: &[EntityId]) {
        for id in ids {
            let Some(e) = self.world.get(*id) else {
                continue;
            };
            self.view
                .add_sprite(e.id, sprite_image(e), e.x, e.y, e.angle);
        }
    }
}

fn sprite_image(e: &Entity) -> &str {
    match &e.body {
        Body::Tank(tank) => match tank.controller {
            Controller::Player => PLAYER_TANK_IMAGE,
            Controller::Ai => AI_TANK_IMAGE,
        },
        Body::Shell(_) => SHELL_IMAGE,
        Body::Wall(wall) => &wall.image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::level::{SpawnPoint, WallPlacement};
    use crate::use_cases::test_support::{RecordingView, duel_level};

    fn driver() -> (GameDriver<RecordingView>, RecordingView) {
        let view = RecordingView::new();
        (GameDriver::new(view.clone(), Tuning::default()), view)
    }

    fn player_health<V: ViewAdapter>(driver: &GameDriver<V>) -> Option<i32> {
        driver
            .player_id()
            .and_then(|id| driver.world().get(id))
            .and_then(Entity::tank)
            .map(|t| t.health)
    }

    fn summary<V: ViewAdapter>(driver: &GameDriver<V>) -> Vec<(EntityKind, f32, f32, Option<i32>)> {
        driver
            .world()
            .entities()
            .map(|e| (e.kind(), e.x, e.y, e.tank().map(|t| t.health)))
            .collect()
    }

    #[test]
    fn when_level_is_valid_then_setup_populates_world_and_view() {
        let (mut driver, view) = driver();
        let level = Level::builtin().expect("builtin level");

        driver.set_up_game(&level).expect("setup should succeed");

        assert_eq!(driver.phase(), GamePhase::Running);
        assert_eq!(driver.world().len(), 2 + level.walls.len());
        assert_eq!(view.sprite_ids().len(), driver.world().len());
        assert_eq!(view.last_screen(), Some(Screen::Running));

        let player = driver.player_id().expect("player id");
        let sprite = view.sprite(player).expect("player sprite");
        assert_eq!(sprite.image, PLAYER_TANK_IMAGE);
        assert_eq!((sprite.x, sprite.y), (level.player.x, level.player.y));
    }

    #[test]
    fn when_setup_is_called_while_running_then_returns_invalid_phase() {
        let (mut driver, _view) = driver();
        driver.set_up_game(&duel_level()).expect("setup");

        let result = driver.set_up_game(&duel_level());

        assert!(matches!(
            result,
            Err(GameError::InvalidPhase(GamePhase::Running))
        ));
    }

    #[test]
    fn when_level_is_invalid_then_setup_fails_and_stays_idle() {
        let (mut driver, view) = driver();
        let mut level = duel_level();
        level.walls.push(WallPlacement {
            x: 5000.0,
            y: 0.0,
            image: "wall1.png".to_string(),
        });

        let result = driver.set_up_game(&level);

        assert!(matches!(result, Err(GameError::Config(LevelError::Invalid(_)))));
        assert_eq!(driver.phase(), GamePhase::Idle);
        assert!(driver.world().is_empty());
        assert!(view.sprite_ids().is_empty());
    }

    #[test]
    fn each_tick_keeps_sprites_in_step_with_the_world() {
        let (mut driver, view) = driver();
        driver.set_up_game(&duel_level()).expect("setup");
        let presents_before = view.presents();

        for _ in 0..30 {
            let outcome = driver.update_game(PlayerInput {
                forward: true,
                fire: true,
                ..PlayerInput::default()
            });
            assert_eq!(outcome, TickOutcome::Continue);

            let live: Vec<EntityId> = driver.world().entities().map(|e| e.id).collect();
            let mut sorted = live.clone();
            sorted.sort();
            assert_eq!(view.sprite_ids(), sorted);
            for e in driver.world().entities() {
                let sprite = view.sprite(e.id).expect("sprite for live entity");
                assert_eq!((sprite.x, sprite.y, sprite.angle), (e.x, e.y, e.angle));
            }
        }

        assert_eq!(driver.tick(), 30);
        assert_eq!(view.presents(), presents_before + 30);
        // Both tanks fired on the first tick.
        assert!(
            driver
                .world()
                .entities()
                .filter(|e| e.kind() == EntityKind::Shell)
                .count()
                >= 2
        );
    }

    #[test]
    fn when_player_drives_into_a_tank_pinned_at_the_edge_then_they_never_overlap() {
        let (mut driver, _view) = driver();
        let level = Level {
            ai_tanks: vec![SpawnPoint {
                x: 0.0,
                y: 300.0,
                angle_deg: 0.0,
            }],
            player: SpawnPoint {
                x: 60.0,
                y: 300.0,
                angle_deg: 180.0,
            },
            ..duel_level()
        };
        driver.set_up_game(&level).expect("setup");
        let tuning = Tuning::default();

        for _ in 0..60 {
            driver.update_game(PlayerInput {
                forward: true,
                ..PlayerInput::default()
            });

            let tanks: Vec<&Entity> = driver
                .world()
                .entities()
                .filter(|e| e.kind().is_tank())
                .collect();
            assert_eq!(tanks.len(), 2);
            assert!(!tanks[0].bounds(&tuning).overlaps(&tanks[1].bounds(&tuning)));
        }
    }

    #[test]
    fn when_ai_shell_reaches_player_then_health_drops_and_game_continues_until_zero() {
        let (mut driver, view) = driver();
        driver.set_up_game(&duel_level()).expect("setup");

        let mut ticks = 0;
        while player_health(&driver) == Some(100) {
            assert_eq!(driver.update_game(PlayerInput::default()), TickOutcome::Continue);
            ticks += 1;
            assert!(ticks < 500, "AI shell never reached the player");
        }
        assert_eq!(player_health(&driver), Some(80));
        assert_eq!(driver.phase(), GamePhase::Running);
        // The shell that hit was purged from world and view alike.
        assert!(!view.removed().is_empty());
        assert!(
            view.removed()
                .iter()
                .all(|id| !driver.world().is_live(*id))
        );

        let outcome = loop {
            match driver.update_game(PlayerInput::default()) {
                TickOutcome::Continue => {
                    ticks += 1;
                    assert!(ticks < 3000, "player was never destroyed");
                }
                TickOutcome::Stop(outcome) => break outcome,
            }
        };

        assert_eq!(outcome, GameOutcome::Defeat);
        assert_eq!(driver.phase(), GamePhase::Ending);
        assert_eq!(player_health(&driver), None);
        assert_eq!(view.last_screen(), Some(Screen::End));
    }

    #[test]
    fn when_player_destroys_every_ai_tank_then_game_is_won() {
        let (mut driver, _view) = driver();
        driver.set_up_game(&duel_level()).expect("setup");
        let fire = PlayerInput {
            fire: true,
            ..PlayerInput::default()
        };

        let mut outcome = TickOutcome::Continue;
        for _ in 0..2000 {
            outcome = driver.update_game(fire);
            if outcome != TickOutcome::Continue {
                break;
            }
        }

        assert_eq!(outcome, TickOutcome::Stop(GameOutcome::Victory));
        assert!(player_health(&driver).is_some_and(|hp| hp > 0));
    }

    #[test]
    fn when_quit_is_requested_then_next_tick_stops_without_simulating() {
        let (mut driver, view) = driver();
        driver.set_up_game(&duel_level()).expect("setup");
        driver.update_game(PlayerInput::default());

        driver.request_quit();
        let before = summary(&driver);
        let outcome = driver.update_game(PlayerInput::default());

        assert_eq!(outcome, TickOutcome::Stop(GameOutcome::Quit));
        assert_eq!(driver.phase(), GamePhase::Ending);
        assert_eq!(driver.tick(), 1);
        assert_eq!(summary(&driver), before);
        assert_eq!(view.last_screen(), Some(Screen::End));
    }

    #[test]
    fn reset_then_setup_rebuilds_the_first_world_exactly() {
        let level = duel_level();
        let (mut fresh, _) = driver();
        fresh.set_up_game(&level).expect("setup");
        let first = summary(&fresh);

        let (mut driver, view) = driver();
        driver.set_up_game(&level).expect("setup");
        for _ in 0..120 {
            driver.update_game(PlayerInput {
                forward: true,
                turn_left: true,
                fire: true,
                ..PlayerInput::default()
            });
        }
        driver.request_quit();
        driver.update_game(PlayerInput::default());
        driver.reset_game();

        assert_eq!(driver.phase(), GamePhase::Idle);
        assert!(driver.world().is_empty());
        assert!(view.sprite_ids().is_empty());
        assert_eq!(view.resets(), 1);

        driver.set_up_game(&level).expect("second setup");

        assert_eq!(summary(&driver), first);
        assert_eq!(driver.tick(), 0);
        let ids: Vec<EntityId> = driver.world().entities().map(|e| e.id).collect();
        let fresh_ids: Vec<EntityId> = fresh.world().entities().map(|e| e.id).collect();
        assert_eq!(ids, fresh_ids);
    }

    #[test]
    fn when_not_running_then_tick_reports_stop() {
        let (mut driver, _view) = driver();

        assert_eq!(
            driver.update_game(PlayerInput::default()),
            TickOutcome::Stop(GameOutcome::Quit)
        );
        assert_eq!(driver.phase(), GamePhase::Idle);
    }

    #[test]
    fn level_without_ai_tanks_never_ends_on_its_own() {
        let (mut driver, _view) = driver();
        let level = Level {
            ai_tanks: Vec::new(),
            walls: vec![WallPlacement {
                x: 300.0,
                y: 300.0,
                image: "wall1.png".to_string(),
            }],
            player: SpawnPoint {
                x: 100.0,
                y: 300.0,
                angle_deg: 0.0,
            },
            ..duel_level()
        };
        driver.set_up_game(&level).expect("setup");

        for _ in 0..200 {
            assert_eq!(
                driver.update_game(PlayerInput {
                    forward: true,
                    fire: true,
                    ..PlayerInput::default()
                }),
                TickOutcome::Continue
            );
        }

        // The wall stopped the tank.
        let tuning = Tuning::default();
        let player = driver
            .player_id()
            .and_then(|id| driver.world().get(id))
            .expect("player");
        assert!(player.x + tuning.tank.size <= 300.0 + 1e-3);
    }
}
