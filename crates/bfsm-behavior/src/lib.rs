//! `bfsm-behavior`: the behavior finite state machine.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                        |
//! |-------------------|-----------------------------------------------------------------|
//! | [`context`]       | `StepContext<'a>`: read-only step snapshot shared by all agents |
//! | [`condition`]     | `Condition` trait, `auto`, `and` / `or` / `not`                 |
//! | [`timer`]         | `TimerCondition`                                                |
//! | [`spatial`]       | shape, goal-reached and proximity conditions                    |
//! | [`target`]        | `TransitionTarget` trait, single / probabilistic / return       |
//! | [`transition`]    | `Transition` (condition + target)                               |
//! | [`manipulator`]   | `AgentPropertyManipulator`, `PropertyOp`                        |
//! | [`action`]        | `Action` trait, `PropertyAction`                                |
//! | [`velocity`]      | `VelComponent` and `VelModifier` traits and built-ins           |
//! | [`task`]          | `Task` trait, `NavMeshLocalizerTask`                            |
//! | [`state`]         | `State`: enter / leave / transition test / preferred velocity   |
//! | [`event`]         | triggers, event targets, effects, `EventSystem`                 |
//! | [`fsm`]           | `Fsm`: per-agent current state, `do_step`, `do_tasks`           |
//! | [`description`]   | `BehaviorDescription`, `StateDescription`                       |
//! | [`build`]         | `build_fsm`                                                     |
//! | [`registry`]      | `Registry`, `ElementSpec`, `FactoryContext`, `Resources`        |
//! | [`builtins`]      | factories for every built-in element type                       |
//! | [`loader`]        | TOML behavior files → `BehaviorDescription`                     |
//! | [`error`]         | `StateError`, `TaskError`, `FsmError`, `BuildError`             |
//!
//! # Design notes
//!
//! A step is split in two:
//!
//! 1. **Decision phase** (parallel): every agent tests its state's
//!    transitions and computes a preferred velocity.  An agent reads every
//!    body through `&StepContext` but writes only its own properties,
//!    preferred velocity, RNG and current-state slot.
//!
//! 2. **Tasks** (sequential): after the simulator has moved the agents,
//!    each registered task runs once.
//!
//! Elements (conditions, targets, actions, selectors, modifiers) are shared
//! by every agent in their state, so every element trait is `Send + Sync`
//! and per-agent caches sit behind a lock.
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Run the decision phase on Rayon's pool (default on).    |

pub mod action;
pub mod build;
pub mod builtins;
pub mod condition;
pub mod context;
pub mod description;
pub mod error;
pub mod event;
pub mod fsm;
pub mod loader;
pub mod manipulator;
pub mod registry;
pub mod spatial;
pub mod state;
pub mod target;
pub mod task;
pub mod timer;
pub mod transition;
pub mod velocity;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use action::{Action, PropertyAction};
pub use build::build_fsm;
pub use condition::{AndCondition, AutoCondition, Condition, NotCondition, OrCondition};
pub use context::StepContext;
pub use description::{BehaviorDescription, StateDescription};
pub use error::{BuildError, BuildResult, FsmError, FsmResult, StateError, TaskError};
pub use event::{
    AllAgentsTarget, ChangeStateEffect, EventEffect, EventSystem, EventTarget, EventTrigger,
    EventView, PopulationMode, PropertyEffect, StateMemberTarget, StatePopulationTrigger,
    TargetKind, TimeTrigger,
};
pub use fsm::Fsm;
pub use loader::{load_behavior_file, load_behavior_str};
pub use manipulator::{AgentPropertyManipulator, PropertyOp};
pub use registry::{ElementSpec, FactoryContext, FactoryMap, Registry, Resources};
pub use spatial::{GoalReachedCondition, ProximityCondition, ProximitySubject, ShapeCondition};
pub use state::State;
pub use target::{ProbTarget, ReturnTarget, SingleTarget, TransitionTarget};
pub use task::{NavMeshLocalizerTask, Task, TaskContext};
pub use timer::TimerCondition;
pub use transition::Transition;
pub use velocity::{
    ConstDirVelComponent, ConstVelComponent, GoalVelComponent, ScaleVelModifier, VelComponent,
    VelModifier, ZeroVelComponent,
};
