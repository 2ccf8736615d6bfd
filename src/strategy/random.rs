//! Random strategy: every task is a uniform draw of K distinct items.

use rand::seq::index;

use super::{DesignRng, DesignStrategy, GenerationContext, StrategyOutput};
use crate::design::{evaluate_efficiency, RawDesign};
use crate::error::{Error, Result};

/// Uniform sampling without replacement, one pass, no search.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSampler;

impl DesignStrategy for RandomSampler {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn generate(&self, ctx: &GenerationContext<'_>, rng: &mut DesignRng) -> Result<StrategyOutput> {
        let (n, k) = (ctx.n_items, ctx.k());
        if k > n {
            return Err(Error::generation_failed(format!(
                "cannot draw {k} distinct items from {n}"
            )));
        }

        let versions: Vec<Vec<Vec<usize>>> = (0..ctx.settings.num_versions)
            .map(|_| {
                (0..ctx.settings.tasks_per_respondent)
                    .map(|_| index::sample(rng, n, k).into_vec())
                    .collect()
            })
            .collect();
        let design = RawDesign::from_versions(&versions, k)?;
        let d_efficiency = evaluate_efficiency(&design, n).d_efficiency;

        Ok(StrategyOutput {
            design,
            d_efficiency,
            iterations: 1,
            strategy: self.name(),
            degradations: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DesignSettings;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_random_shape_and_distinctness() {
        let s = DesignSettings {
            items_per_task: 5,
            tasks_per_respondent: 8,
            num_versions: 2,
            ..Default::default()
        };
        let ctx = GenerationContext::new(&s, 12);
        let out = RandomSampler
            .generate(&ctx, &mut DesignRng::seed_from_u64(8))
            .unwrap();

        assert_eq!(out.design.n_rows(), 16);
        assert_eq!(out.iterations, 1);
        for row in out.design.rows() {
            let distinct: HashSet<usize> = row.iter().copied().collect();
            assert_eq!(distinct.len(), 5);
        }
        assert_eq!(&out.design.versions()[..9], &[1, 1, 1, 1, 1, 1, 1, 1, 2]);
    }

    #[test]
    fn test_all_items_in_every_task() {
        let s = DesignSettings {
            items_per_task: 4,
            tasks_per_respondent: 3,
            ..Default::default()
        };
        let ctx = GenerationContext::new(&s, 4);
        let out = RandomSampler
            .generate(&ctx, &mut DesignRng::seed_from_u64(1))
            .unwrap();
        assert!((out.d_efficiency - 1.0).abs() < 1e-9);
    }
}
