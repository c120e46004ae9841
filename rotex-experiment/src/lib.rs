pub mod config;
pub mod controller;
pub mod export;
pub mod generator;
pub mod presenter;
pub mod session;
pub mod state;
pub mod stats;

pub use config::{ExperimentConfig, KeyBindings, StageConfig, StagesConfig, TimingConfig};
pub use controller::{ExperimentStatus, StageController};
pub use generator::TrialGenerator;
pub use presenter::{LogPresenter, NullPresenter, Presenter};
pub use session::{ResponseLock, Session};
pub use state::{TrialContext, TrialStateMachine, TrialStep, Wakeup};
pub use stats::{ExperimentSummary, Scope, StageStats, VersionAccuracy};
