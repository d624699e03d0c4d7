pub mod bridge;

pub use bridge::{InputType, StateMachineBridge, StateMachineInput};
