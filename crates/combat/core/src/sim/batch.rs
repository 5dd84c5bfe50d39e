//! Parallel batches of iterations.
//!
//! A [`Simulation`] owns non-`Send` callbacks and is never shared. Each worker
//! builds its own run from the factory, jumps to its first iteration so seeds
//! match a sequential run, and returns only its aggregate. Partial aggregates
//! are merged in chunk order, so the result does not depend on thread
//! scheduling.

use rayon::prelude::*;

use super::Simulation;
use crate::error::ConfigError;
use crate::metrics::AggregateMetrics;

/// Runs `iterations` iterations split into chunks of `chunk_size` across the
/// rayon pool.
///
/// The factory is called once per chunk and may return a finalized or an
/// unfinalized simulation.
pub fn run_batch<F>(factory: F, iterations: u64, chunk_size: u64) -> Result<AggregateMetrics, ConfigError>
where
    F: Fn() -> Result<Simulation, ConfigError> + Sync,
{
    let chunk_size = chunk_size.max(1);
    let starts: Vec<u64> = (0..iterations).step_by(chunk_size as usize).collect();

    let partials = starts
        .into_par_iter()
        .map(|start| -> Result<AggregateMetrics, ConfigError> {
            let mut sim = factory()?;
            if !sim.is_finalized() {
                sim.finalize()?;
            }
            sim.skip_to_iteration(start)?;
            sim.run_iterations(chunk_size.min(iterations - start))?;
            Ok(sim.into_aggregate())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut total = AggregateMetrics::default();
    for partial in &partials {
        total.merge(partial);
    }
    tracing::debug!(iterations, chunks = partials.len(), "batch finished");
    Ok(total)
}
