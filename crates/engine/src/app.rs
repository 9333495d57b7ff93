//! Application state and composition.

use std::sync::Arc;

use crate::entities::Encounters;
use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    config::EngineConfig,
    dice::FormulaDiceEvaluator,
    memory::{AutoConfirm, InMemoryCombatRepo, TracingTurnNotifier},
    ports::{
        ChatLog, ClockPort, CombatRepo, ConfirmationPrompt, DiceEvaluator, SceneProvider,
        TurnNotifier, UserDirectory,
    },
};
use crate::use_cases::combat::{
    CombatLifecycle, CombatLocks, CombatUseCases, CombatWriter, CombatantOps, RollInitiative,
    TurnAnnouncer,
};

/// Main application state.
///
/// Holds the encounter entity and every use case.
pub struct App {
    pub encounters: Arc<Encounters>,
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub combat: CombatUseCases,
}

/// Every port the application needs.
pub struct AppPorts {
    pub combats: Arc<dyn CombatRepo>,
    pub scenes: Arc<dyn SceneProvider>,
    pub users: Arc<dyn UserDirectory>,
    pub dice: Arc<dyn DiceEvaluator>,
    pub chat: Arc<dyn ChatLog>,
    pub prompt: Arc<dyn ConfirmationPrompt>,
    pub notifier: Arc<dyn TurnNotifier>,
    pub clock: Arc<dyn ClockPort>,
}

impl AppPorts {
    /// In-process ports: memory storage, system dice, auto-confirmed prompts.
    pub fn in_memory(
        scenes: Arc<dyn SceneProvider>,
        users: Arc<dyn UserDirectory>,
        chat: Arc<dyn ChatLog>,
    ) -> Self {
        Self {
            combats: Arc::new(InMemoryCombatRepo::new()),
            scenes,
            users,
            dice: Arc::new(FormulaDiceEvaluator::new(Arc::new(SystemRandom::new()))),
            chat,
            prompt: Arc::new(AutoConfirm(true)),
            notifier: Arc::new(TracingTurnNotifier),
            clock: Arc::new(SystemClock::new()),
        }
    }
}

impl App {
    pub fn new(config: &EngineConfig, ports: AppPorts) -> Self {
        let encounters = Arc::new(Encounters::new(
            ports.combats,
            ports.scenes,
            ports.users,
            config.settings.clone(),
        ));
        let writer = Arc::new(CombatWriter::new(
            encounters.clone(),
            Arc::new(CombatLocks::new()),
            Arc::new(TurnAnnouncer::new(ports.notifier)),
        ));

        let lifecycle = Arc::new(CombatLifecycle::new(writer.clone(), ports.prompt));
        let combatants = Arc::new(CombatantOps::new(writer.clone()));
        let initiative = Arc::new(RollInitiative::new(
            writer,
            ports.dice,
            ports.chat,
            Arc::new(config.initiative_formula.clone()),
            ports.clock,
            config.roll_mode,
        ));

        Self {
            encounters,
            use_cases: UseCases {
                combat: CombatUseCases::new(lifecycle, combatants, initiative),
            },
        }
    }
}
