//! The callback surface a simulation subsystem implements.

use minder_core::{ClientId, RecurringId, SimDate};
use minder_sched::{DateMinder, DateSink, MinderResult, RecurringCtl, RecurringDateMinder};

/// A subsystem driven by scheduled dates.
///
/// Both hooks default to no-ops so a subsystem that only uses one kind of
/// schedule implements only that hook.  Each hook receives the reentrant
/// surface of the scheduler that fired it plus a plain `&mut` to the *other*
/// scheduler, so a callback may freely mix one-shot and recurring work —
/// mutations on the firing scheduler are staged until its next pass, while
/// the other scheduler accepts operations directly.
pub trait MinderClient {
    /// A one-shot date registered for this client came due.
    fn on_date(
        &mut self,
        id: ClientId,
        date: SimDate,
        dates: &mut DateSink<'_>,
        recurring: &mut RecurringDateMinder,
    ) -> MinderResult<()> {
        let _ = (id, date, dates, recurring);
        Ok(())
    }

    /// A recurring registration bound to this client fired.
    fn on_recurring(
        &mut self,
        id: ClientId,
        date: SimDate,
        reg: RecurringId,
        ctl: &mut RecurringCtl<'_>,
        dates: &mut DateMinder,
    ) -> MinderResult<()> {
        let _ = (id, date, reg, ctl, dates);
        Ok(())
    }
}
