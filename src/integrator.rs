//! Module implementing the fixed-step 4-stage Runge-Kutta scheme shared by all neuron models.
//!
//! Every state variable carries a history of [`NUM_SLOTS`] values: slot 0 is the accepted value,
//! slots 1 to 4 hold the stage values of the current step. Stage `i` evaluates the derivative at
//! slot `i` and writes `slot[i + 1] = slot[0] + A[i] dt f(slot[i])`. The combination step then
//! overwrites slot 0 with `(-3 s0 + 2 s1 + 4 s2 + 2 s3 + s4) / 6`, which is the classical RK4
//! update written in terms of the stage values.
use serde::{Deserialize, Serialize};

/// Number of Runge-Kutta stages per step.
pub const NUM_STAGES: usize = 4;
/// Number of history slots per state variable: the accepted value and one per stage.
pub const NUM_SLOTS: usize = NUM_STAGES + 1;
/// Weights of the Euler sub-steps.
pub const RK_A: [f64; NUM_STAGES] = [0.5, 0.5, 1.0, 1.0];
/// Weights of the stochastic increments of each stage.
pub const RK_B: [f64; NUM_STAGES] = [0.75, 0.75, 0.0, 0.0];

/// A fixed set of real-valued state variables.
///
/// Implementors only need to describe how to combine two states component-wise; the Runge-Kutta
/// machinery is derived from it. See [`state_vector!`](crate::state_vector) for a declarative way
/// to define a state.
pub trait StateVector: Copy + Send + Sync + std::fmt::Debug {
    /// Apply `f` to each pair of matching components.
    fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Self, f: F) -> Self;

    /// Apply `f` to each component.
    fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        self.zip_with(self, |x, _| f(x))
    }
}

/// Define a plain state struct with `f64` fields and implement [`StateVector`] for it.
#[macro_export]
macro_rules! state_vector {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $($(#[$field_meta:meta])* $field:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
        pub struct $name {
            $($(#[$field_meta])* pub $field: f64,)+
        }

        impl $crate::integrator::StateVector for $name {
            fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Self, f: F) -> Self {
                $name {
                    $($field: f(self.$field, other.$field),)+
                }
            }
        }
    };
}

/// The Euler sub-step of a stage: `base + A[stage] dt derivative`.
pub fn euler_substep<S: StateVector>(base: &S, derivative: &S, stage: usize, dt: f64) -> S {
    let h = RK_A[stage] * dt;
    base.zip_with(derivative, |x, dx| x + h * dx)
}

/// Combine the accepted value and the four stage values into the new accepted value.
pub fn combine<S: StateVector>(slots: &[S; NUM_SLOTS]) -> S {
    slots[0]
        .map(|s0| -3.0 * s0)
        .zip_with(&slots[1], |acc, s1| acc + 2.0 * s1)
        .zip_with(&slots[2], |acc, s2| acc + 4.0 * s2)
        .zip_with(&slots[3], |acc, s3| acc + 2.0 * s3)
        .zip_with(&slots[4], |acc, s4| acc + s4)
        .map(|acc| acc / 6.0)
}

/// The history of a state over the current step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History<S> {
    slots: [S; NUM_SLOTS],
}

impl<S: StateVector> History<S> {
    /// A history whose slots all hold the initial state.
    pub fn new(initial: S) -> Self {
        History {
            slots: [initial; NUM_SLOTS],
        }
    }

    /// The accepted state, i.e., slot 0.
    pub fn accepted(&self) -> &S {
        &self.slots[0]
    }

    /// The state a given stage evaluates its derivative at, i.e., slot `stage`.
    pub fn staged(&self, stage: usize) -> &S {
        &self.slots[stage]
    }

    /// Returns a given slot.
    pub fn slot(&self, slot: usize) -> &S {
        &self.slots[slot]
    }

    /// Store the result of a stage in slot `stage + 1`.
    pub fn store_stage(&mut self, stage: usize, value: S) {
        self.slots[stage + 1] = value;
    }

    /// Overwrite slot 0 with the combination of all slots and return it.
    pub fn combine(&mut self) -> &S {
        self.slots[0] = combine(&self.slots);
        &self.slots[0]
    }

    /// Reset all slots to a given state.
    pub fn reset(&mut self, state: S) {
        self.slots = [state; NUM_SLOTS];
    }

    /// Modify the accepted state in place and propagate it to all slots.
    pub fn update_accepted<F: FnOnce(&mut S)>(&mut self, f: F) {
        let mut state = self.slots[0];
        f(&mut state);
        self.reset(state);
    }
}
