pub mod generator;
pub mod oldconfig;
pub mod reader;
pub mod settings;
pub mod writer;

pub use generator::ConfigGenerator;
pub use oldconfig::ConfigChanges;
pub use reader::{AssignedValue, Assignment, ConfigReader};
pub use settings::Settings;
pub use writer::ConfigWriter;
