//! Random-walk sampling of states used to evaluate candidate patterns during
//! hill climbing.

use rand::rngs::SmallRng;
use rand::Rng;

use crate::errors::SamplingOutcome;
use crate::task::{State, Task};

/// A predicate telling the sampler a state can never reach the goal, so a
/// walk passing through it should restart rather than continue from there.
pub trait DeadEndPredicate {
    fn is_dead_end(&self, state: &State) -> bool;
}

/// Cooperative cancellation point, polled after every emitted sample.
pub trait Countdown {
    fn expired(&self) -> bool;
}

/// A countdown that never expires, for unbounded runs.
pub struct NoCountdown;

impl Countdown for NoCountdown {
    fn expired(&self) -> bool {
        false
    }
}

/// Draws a walk length with mean `2 * max(1, round(h0 / avg_cost))`, using a
/// sum of `4 * l` fair coin flips as a cheap binomial-like distribution.
fn walk_length(rng: &mut SmallRng, h0: u32, avg_cost: f64) -> u32 {
    let l = ((h0 as f64 / avg_cost).round() as u32).max(1);
    let flips = 4 * l;
    (0..flips).filter(|_| rng.random_bool(0.5)).count() as u32
}

/// Produces `num_samples` states reached by random walks from the task's
/// initial state, restarting whenever no operator applies or the walk steps
/// into a dead end. Returns `SamplingOutcome::Timeout` with whatever samples
/// had been collected so far if `countdown` expires mid-walk.
pub fn sample_states(
    task: &dyn Task,
    num_samples: usize,
    h0: u32,
    avg_operator_cost: f64,
    dead_end: &impl DeadEndPredicate,
    countdown: &impl Countdown,
    rng: &mut SmallRng,
) -> SamplingOutcome<Vec<State>> {
    let mut samples = Vec::with_capacity(num_samples);

    while samples.len() < num_samples {
        let length = walk_length(rng, h0, avg_operator_cost);
        let mut state = task.initial_state().clone();

        let mut steps_done = 0;
        while steps_done < length {
            let applicable: Vec<_> = task.operators().iter().filter(|op| op.is_applicable(&state)).collect();
            if applicable.is_empty() {
                state = task.initial_state().clone();
                steps_done += 1;
                continue;
            }
            let chosen = applicable[rng.random_range(0..applicable.len())];
            let next = state.successor(chosen);
            if dead_end.is_dead_end(&next) {
                state = task.initial_state().clone();
            } else {
                state = next;
            }
            steps_done += 1;
        }

        samples.push(state);
        if countdown.expired() {
            return SamplingOutcome::Timeout(samples);
        }
    }

    SamplingOutcome::Completed(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{ExplicitTask, Fact, Operator, VarId};
    use rand::SeedableRng;

    struct NeverDeadEnd;
    impl DeadEndPredicate for NeverDeadEnd {
        fn is_dead_end(&self, _state: &State) -> bool {
            false
        }
    }

    struct AlwaysExpired;
    impl Countdown for AlwaysExpired {
        fn expired(&self) -> bool {
            true
        }
    }

    fn v(i: usize) -> VarId {
        VarId::new(i)
    }

    fn toggling_task() -> ExplicitTask {
        let op = Operator::new("toggle", vec![Fact::new(v(0), 0)], vec![Fact::new(v(0), 1)], 1);
        ExplicitTask::new(vec![2], vec![op], vec![Fact::new(v(0), 1)], State::new(vec![0]))
    }

    #[test]
    fn produces_requested_sample_count() {
        let task = toggling_task();
        let mut rng = SmallRng::seed_from_u64(42);
        let outcome = sample_states(&task, 5, 1, 1.0, &NeverDeadEnd, &NoCountdown, &mut rng);
        match outcome {
            SamplingOutcome::Completed(samples) => assert_eq!(samples.len(), 5),
            SamplingOutcome::Timeout(_) => panic!("should not time out with NoCountdown"),
        }
    }

    #[test]
    fn stops_on_expired_countdown() {
        let task = toggling_task();
        let mut rng = SmallRng::seed_from_u64(7);
        let outcome = sample_states(&task, 5, 1, 1.0, &NeverDeadEnd, &AlwaysExpired, &mut rng);
        assert!(outcome.timed_out());
        assert_eq!(outcome.into_inner().len(), 1);
    }

    #[test]
    fn deterministic_given_seed() {
        let task = toggling_task();
        let mut rng_a = SmallRng::seed_from_u64(99);
        let mut rng_b = SmallRng::seed_from_u64(99);
        let a = sample_states(&task, 10, 3, 1.0, &NeverDeadEnd, &NoCountdown, &mut rng_a).into_inner();
        let b = sample_states(&task, 10, 3, 1.0, &NeverDeadEnd, &NoCountdown, &mut rng_b).into_inner();
        assert_eq!(a, b);
    }
}
