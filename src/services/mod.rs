pub mod allow_list_matcher;
pub mod command_runner;
pub mod environment;
pub mod platform;
pub mod session;

pub use allow_list_matcher::AllowListMatcher;
pub use command_runner::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use environment::EnvironmentDetector;
pub use platform::{create_platform, DndController, Platform, WindowDriver};
pub use session::{SessionEngine, SweepReport};
