//! Finite state machine (Mealy machine).

/// A synchronous state machine stepped once per block or cycle.
///
/// `step` computes the current-cycle output from the input and the current state, and moves
/// to the next-cycle state. `reset` returns to the configured initial state; calling it twice
/// is the same as calling it once.
pub trait Fsm {
    /// Input consumed by one step.
    type Input;

    /// Output produced by one step.
    type Output;

    /// Advances by one step.
    fn step(&mut self, input: Self::Input) -> Self::Output;

    /// Returns to the initial state.
    fn reset(&mut self);

    /// Feeds every input and collects the outputs.
    fn run<I: IntoIterator<Item = Self::Input>>(&mut self, inputs: I) -> Vec<Self::Output>
    where Self: Sized {
        inputs.into_iter().map(|input| self.step(input)).collect()
    }
}
