pub mod common; // shared type aliases and re-exports
pub mod elbo; // evidence lower bound bookkeeping
pub mod error;
pub mod finalize; // posterior summaries returned to the caller
pub mod fit; // outer coordinate ascent loop
pub mod gamma; // gamma posterior parameters
pub mod options;
pub mod schedule; // staged activation of the precision updates
pub mod simulate; // helper functions for simulation
pub mod state; // model state and initialization
pub mod update; // closed-form coordinate updates
