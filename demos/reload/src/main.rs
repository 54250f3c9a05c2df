//! reload — smallest example for the minder scheduler stack.
//!
//! Runs a toy armory for 40 ticks: three weapons each reload on their own
//! recurring span, a construction yard chains build stages as one-shot
//! dates, and the host "hitches" once, skipping several ticks, to show the
//! catch-up walk firing every stepped-over date.

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use minder_core::{ClientId, RecurringId, SimDate, SimSpan};
use minder_sched::{DateMinder, DateSink, MinderResult, RecurringCtl, RecurringDateMinder};
use minder_sim::{MinderClient, TickDriver};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:       u64 = 42;
const RUN_TICKS:  u64 = 40;
const HITCH_AT:   u64 = 19; // the tick on which the host stalls
const HITCH_SPAN: u64 = 5;  // ticks skipped by the stall
const RETIRE_AT:  u64 = 30; // when the mortar is decommissioned

// ── Clients ───────────────────────────────────────────────────────────────────

/// Reloads one round every recurring fire.
struct Weapon {
    name: &'static str,
    rounds: u32,
}

impl MinderClient for Weapon {
    fn on_recurring(
        &mut self,
        _id: ClientId,
        date: SimDate,
        _reg: RecurringId,
        _ctl: &mut RecurringCtl<'_>,
        _dates: &mut DateMinder,
    ) -> MinderResult<()> {
        self.rounds += 1;
        println!("[{date}] {} reloaded (rounds: {})", self.name, self.rounds);
        Ok(())
    }
}

/// Build stages and their durations in ticks.
const STAGES: &[(&str, u64)] = &[
    ("foundation", 4),
    ("frame", 6),
    ("roof", 3),
    ("fitting", 5),
];

/// Chains one-shot dates: each completed stage schedules the next from
/// inside its own callback.
struct BuildYard {
    stage: usize,
}

impl MinderClient for BuildYard {
    fn on_date(
        &mut self,
        id: ClientId,
        date: SimDate,
        dates: &mut DateSink<'_>,
        _recurring: &mut RecurringDateMinder,
    ) -> MinderResult<()> {
        let (name, _) = STAGES[self.stage];
        println!("[{date}] construction: {name} complete");
        self.stage += 1;
        if let Some(&(next, span)) = STAGES.get(self.stage) {
            let due = dates.now() + SimSpan(span);
            println!("[{date}]   next stage '{next}' due {due}");
            dates.add(due, id)?;
        }
        Ok(())
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(SEED);
    let mut driver = TickDriver::new(SimDate::ZERO);

    let mut mortar = None;
    for name in ["pistol", "rifle", "mortar"] {
        let client = driver.register_client(Box::new(Weapon { name, rounds: 0 }));
        let every = SimSpan(rng.gen_range(3..=7));
        let reg = driver.recur(client, every)?;
        println!("{name}: client {client}, reload every {every} ({reg})");
        if name == "mortar" {
            mortar = Some(client);
        }
    }

    let yard = driver.register_client(Box::new(BuildYard { stage: 0 }));
    driver.schedule(SimDate(STAGES[0].1), yard)?;
    println!("construction: first stage due D{}", STAGES[0].1);

    while driver.now() < SimDate(RUN_TICKS) {
        let report = if driver.now() == SimDate(HITCH_AT) {
            println!("-- host hitch: skipping {HITCH_SPAN} ticks --");
            driver.advance(HITCH_SPAN)?
        } else {
            driver.step()?
        };

        if report.caught_up {
            println!(
                "[{}] caught up: {} one-shot, {} recurring",
                report.now, report.dates_fired, report.recurring_fired
            );
        }

        if report.now == SimDate(RETIRE_AT) {
            if let Some(client) = mortar.take() {
                driver.unregister_client(client)?;
                println!("[{}] mortar decommissioned", report.now);
            }
        }
    }

    println!(
        "done at {} with {} clients still registered",
        driver.now(),
        driver.client_count()
    );
    Ok(())
}
