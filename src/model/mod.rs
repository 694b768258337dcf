pub mod allow_list;
pub mod environment;
pub mod report;
pub mod window;

pub use allow_list::AllowList;
pub use environment::{DesktopFamily, EnvironmentInfo};
pub use report::DependencyReport;
pub use window::WindowRecord;
