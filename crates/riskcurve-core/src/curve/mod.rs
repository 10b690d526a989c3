pub mod axis;
pub mod breakeven;
pub mod generator;
pub mod grid;

pub use axis::{AxisBounds, AxisRange};
pub use breakeven::find_breakevens;
pub use generator::{
    generate_curves, try_generate_curves, CurveConfig, CurveInput, CurveOutput, ScenarioOffsets,
};
