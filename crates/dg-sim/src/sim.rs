//! Fixed-step graph runner and signal recording.

use std::io::{self, Write};

use tracing::debug;

use dg_core::Time;
use dg_entity::Pool;
use dg_signal::ValueRegistry;

use crate::error::{SimError, SimResult};
use crate::graph::apply;
use crate::schema::{ActionDef, GraphDef, RunDef};

/// Options for graph runs.
#[derive(Clone, Debug, PartialEq)]
pub struct SimOptions {
    /// Number of steps; step `k` runs at logical time `k`
    pub steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        RunDef::default().into()
    }
}

impl From<RunDef> for SimOptions {
    fn from(run: RunDef) -> Self {
        Self {
            steps: run.steps,
            record_every: run.record_every,
        }
    }
}

/// Sampled signals of a run, in their stream text form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimRecord {
    /// Recorded `entity.signal` paths
    pub columns: Vec<String>,
    /// Logical time of each sample
    pub t: Vec<Time>,
    /// One row per sample, one entry per column
    pub rows: Vec<Vec<String>>,
}

impl SimRecord {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Samples of one column.
    pub fn column(&self, path: &str) -> Option<Vec<&str>> {
        let index = self.columns.iter().position(|c| c == path)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Write as CSV with a `time` column first. Fields are quoted since
    /// vector text contains commas.
    pub fn write_csv(&self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "time")?;
        for column in &self.columns {
            write!(out, ",\"{column}\"")?;
        }
        writeln!(out)?;
        for (t, row) in self.t.iter().zip(&self.rows) {
            write!(out, "{t}")?;
            for field in row {
                write!(out, ",\"{}\"", field.replace('"', "\"\""))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

/// Run the step actions of `graph` on `pool`.
///
/// The recorded signals are sampled at time 0, before the first step, then
/// after every `record_every`-th step and after the last one.
pub fn run_sim(
    pool: &Pool,
    graph: &GraphDef,
    registry: &ValueRegistry,
    opts: &SimOptions,
) -> SimResult<SimRecord> {
    run_steps(pool, &graph.step, &graph.record, registry, opts)
}

pub fn run_steps(
    pool: &Pool,
    step: &[ActionDef],
    record: &[String],
    registry: &ValueRegistry,
    opts: &SimOptions,
) -> SimResult<SimRecord> {
    if opts.record_every == 0 {
        return Err(SimError::InvalidArg {
            what: "record_every must be positive",
        });
    }

    let mut rec = SimRecord {
        columns: record.to_vec(),
        ..SimRecord::default()
    };
    sample(pool, registry, 0, &mut rec)?;

    for k in 1..=opts.steps {
        for action in step {
            apply(pool, registry, action)?;
        }
        if k % opts.record_every == 0 || k == opts.steps {
            sample(pool, registry, k as Time, &mut rec)?;
        }
    }

    debug!(steps = opts.steps, samples = rec.len(), "run finished");
    Ok(rec)
}

fn sample(pool: &Pool, registry: &ValueRegistry, time: Time, rec: &mut SimRecord) -> SimResult<()> {
    let mut row = Vec::with_capacity(rec.columns.len());
    for path in &rec.columns {
        let mut buf = Vec::new();
        pool.signal(path)?.write_value(time, registry, &mut buf)?;
        row.push(String::from_utf8_lossy(&buf).into_owned());
    }
    rec.t.push(time);
    rec.rows.push(row);
    Ok(())
}
