mod bounds;
mod cover;
mod metrics;
mod output;
mod run;
#[cfg(test)]
mod tests;

pub(crate) use run::run;
