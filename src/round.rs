use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use std::collections::HashSet;

use crate::game_pool::{GamePool, PoolError, PoolKind};

/// Rounds at the start of an event that must not share a deployment.
pub const NO_REPEAT_WINDOW: usize = 3;
pub const SCHEMES_PER_ROUND: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub name: String,
    pub strategy: String,
    pub deployment: String,
    /// In draw order, not sorted.
    pub schemes: Vec<String>,
}

/// Deployments already handed out earlier in this run.
#[derive(Debug, Default)]
pub struct UsedDeployments {
    seen: HashSet<String>,
}

impl UsedDeployments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, deployment: &str) {
        self.seen.insert(deployment.to_string());
    }

    pub fn contains(&self, deployment: &str) -> bool {
        self.seen.contains(deployment)
    }
}

/// Draws one round. A single random draw per field, no retries.
///
/// Inside the first [`NO_REPEAT_WINDOW`] rounds the deployment comes from the pool minus
/// `used`; afterwards from the whole pool. The caller records the returned deployment.
pub fn generate_round<R: Rng + ?Sized>(
    pool: &GamePool,
    round_index: usize,
    used: &UsedDeployments,
    rng: &mut R,
) -> Result<Round, PoolError> {
    let round = round_index + 1;

    let strategy = pool
        .strategies()
        .choose(rng)
        .ok_or(PoolError::Exhausted { pool: PoolKind::Strategies, round })?;

    let deployment = if round_index < NO_REPEAT_WINDOW {
        let candidates: Vec<&String> = pool.deployments().iter().filter(|d| !used.contains(d)).collect();
        candidates.choose(rng).copied()
    } else {
        pool.deployments().choose(rng)
    }
    .ok_or(PoolError::Exhausted { pool: PoolKind::Deployments, round })?;

    if pool.schemes().len() < SCHEMES_PER_ROUND {
        return Err(PoolError::InsufficientSchemes {
            needed: SCHEMES_PER_ROUND,
            available: pool.schemes().len(),
        });
    }
    let mut schemes: Vec<&String> = pool.schemes().iter().collect();
    let (drawn, _) = schemes.partial_shuffle(rng, SCHEMES_PER_ROUND);

    Ok(Round {
        name: format!("Round {round}"),
        strategy: strategy.clone(),
        deployment: deployment.clone(),
        schemes: drawn.iter().map(|s| s.to_string()).collect(),
    })
}

/// Draws `rounds` rounds in order, threading the used-deployment accumulator.
pub fn generate_rounds<R: Rng + ?Sized>(
    pool: &GamePool,
    rounds: usize,
    rng: &mut R,
) -> Result<Vec<Round>, PoolError> {
    let mut used = UsedDeployments::new();
    let mut out = Vec::with_capacity(rounds);
    for index in 0..rounds {
        let round = generate_round(pool, index, &used, rng)?;
        used.record(&round.deployment);
        log::debug!("{}: {} / {} / {:?}", round.name, round.strategy, round.deployment, round.schemes);
        out.push(round);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn six_schemes() -> Vec<String> {
        (1..=6).map(|i| format!("s{i}")).collect()
    }

    fn pool_with(deployments: &[&str], schemes: Vec<String>) -> GamePool {
        GamePool::new(names(&["X", "Y"]), names(deployments), schemes)
    }

    fn example_pool() -> GamePool {
        pool_with(&["A", "B", "C", "D"], six_schemes())
    }

    fn assert_valid_round(pool: &GamePool, round: &Round) {
        assert!(pool.strategies().contains(&round.strategy));
        assert!(pool.deployments().contains(&round.deployment));
        assert_eq!(round.schemes.len(), SCHEMES_PER_ROUND);
        let unique: HashSet<&String> = round.schemes.iter().collect();
        assert_eq!(unique.len(), SCHEMES_PER_ROUND, "schemes repeat: {:?}", round.schemes);
        assert!(round.schemes.iter().all(|s| pool.schemes().contains(s)));
    }

    #[test]
    fn three_rounds_have_distinct_deployments() {
        let pool = example_pool();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let rounds = generate_rounds(&pool, 3, &mut rng).expect("generate");
            assert_eq!(rounds.len(), 3);
            let deployments: HashSet<&String> = rounds.iter().map(|r| &r.deployment).collect();
            assert_eq!(deployments.len(), 3, "seed {seed}: {rounds:?}");
            for round in &rounds {
                assert_valid_round(&pool, round);
            }
        }
    }

    #[test]
    fn rounds_are_named_in_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let rounds = generate_rounds(&example_pool(), 5, &mut rng).expect("generate");
        let names: Vec<&str> = rounds.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Round 1", "Round 2", "Round 3", "Round 4", "Round 5"]);
    }

    #[test]
    fn deployments_may_repeat_after_window() {
        let pool = pool_with(&["A", "B", "C"], six_schemes());
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let rounds = generate_rounds(&pool, 6, &mut rng).expect("generate");
            assert_eq!(rounds.len(), 6);
            let first: HashSet<&String> = rounds[..3].iter().map(|r| &r.deployment).collect();
            assert_eq!(first.len(), 3);
            for round in &rounds {
                assert_valid_round(&pool, round);
            }
        }
    }

    #[test]
    fn window_exhaustion_is_typed_error() {
        let pool = pool_with(&["A", "B"], six_schemes());
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate_rounds(&pool, 3, &mut rng).unwrap_err();
        assert_eq!(err, PoolError::Exhausted { pool: PoolKind::Deployments, round: 3 });
    }

    #[test]
    fn used_deployment_is_never_redrawn_inside_window() {
        let pool = example_pool();
        let mut used = UsedDeployments::new();
        for d in ["A", "B", "C"] {
            used.record(d);
        }
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let round = generate_round(&pool, 1, &used, &mut rng).expect("generate");
            assert_eq!(round.deployment, "D");
        }
    }

    #[test]
    fn used_deployments_ignored_after_window() {
        let pool = pool_with(&["A"], six_schemes());
        let mut used = UsedDeployments::new();
        used.record("A");
        let mut rng = StdRng::seed_from_u64(3);
        let round = generate_round(&pool, 3, &used, &mut rng).expect("generate");
        assert_eq!(round.deployment, "A");
        assert_eq!(round.name, "Round 4");
    }

    #[test]
    fn too_few_schemes_is_typed_error() {
        let pool = pool_with(&["A", "B", "C"], names(&["s1", "s2"]));
        let mut rng = StdRng::seed_from_u64(0);
        let err = generate_round(&pool, 0, &UsedDeployments::new(), &mut rng).unwrap_err();
        assert_eq!(err, PoolError::InsufficientSchemes { needed: 5, available: 2 });
    }

    #[test]
    fn empty_strategies_is_typed_error() {
        let pool = GamePool::new(Vec::new(), names(&["A"]), six_schemes());
        let mut rng = StdRng::seed_from_u64(0);
        let err = generate_round(&pool, 0, &UsedDeployments::new(), &mut rng).unwrap_err();
        assert_eq!(err, PoolError::Exhausted { pool: PoolKind::Strategies, round: 1 });
    }

    #[test]
    fn exactly_five_schemes_uses_all_of_them() {
        let pool = pool_with(&["A"], names(&["s1", "s2", "s3", "s4", "s5"]));
        let mut rng = StdRng::seed_from_u64(11);
        let round = generate_round(&pool, 0, &UsedDeployments::new(), &mut rng).expect("generate");
        let mut sorted = round.schemes.clone();
        sorted.sort();
        assert_eq!(sorted, pool.schemes());
    }

    #[test]
    fn repeated_scheme_names_never_fill_two_slots() {
        let pool = pool_with(&["A", "B", "C"], names(&["s1", "s1", "s2", "s3", "s4", "s5"]));
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let round = generate_round(&pool, 0, &UsedDeployments::new(), &mut rng).expect("generate");
            assert_valid_round(&pool, &round);
        }

        let short = pool_with(&["A", "B", "C"], names(&["s1", "s1", "s2", "s3", "s4"]));
        let mut rng = StdRng::seed_from_u64(0);
        let err = generate_round(&short, 0, &UsedDeployments::new(), &mut rng).unwrap_err();
        assert_eq!(err, PoolError::InsufficientSchemes { needed: 5, available: 4 });
    }

    #[test]
    fn repeated_names_do_not_skew_the_draw() {
        let pool = GamePool::new(names(&["X", "X", "X", "Y"]), names(&["A", "A", "A", "B"]), six_schemes());
        let mut strategy_x = 0;
        let mut deployment_a = 0;
        let draws = 4000;
        for seed in 0..draws {
            let mut rng = StdRng::seed_from_u64(seed);
            let round = generate_round(&pool, 0, &UsedDeployments::new(), &mut rng).expect("generate");
            strategy_x += usize::from(round.strategy == "X");
            deployment_a += usize::from(round.deployment == "A");
        }
        // Uniform over two names lands near half; a weighted draw would sit near three quarters.
        for hits in [strategy_x, deployment_a] {
            assert!((1600..2400).contains(&hits), "{hits} of {draws}");
        }
    }

    #[test]
    fn repeated_deployment_is_excluded_once_used() {
        let pool = GamePool::new(names(&["X"]), names(&["A", "B", "A"]), six_schemes());
        let mut used = UsedDeployments::new();
        used.record("A");
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let round = generate_round(&pool, 1, &used, &mut rng).expect("generate");
            assert_eq!(round.deployment, "B");
        }
    }
}
