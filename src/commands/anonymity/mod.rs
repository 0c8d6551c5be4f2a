mod output;
mod references;
mod roster;
mod run;
mod scan;
mod sections;

pub(crate) use run::{run, run_batch};
