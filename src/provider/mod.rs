pub mod constants;
pub(crate) mod gradient;

pub use gradient::{GradientAi, GradientAiConfig, PACKAGE_NAME, PACKAGE_VERSION};
