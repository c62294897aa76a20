use tupleforge_core::{FactHandle, Result};

/// Receives fact lifecycle events from a fact store.
///
/// Every call fully propagates its effect before returning, except
/// [`on_fact_before_update`](Self::on_fact_before_update), whose retraction
/// is held back and propagated together with the matching
/// [`on_fact_after_update`](Self::on_fact_after_update).
pub trait FactListener {
    fn on_fact_inserted(&mut self, fact: FactHandle) -> Result<()>;

    /// Announces that `fact` is about to change.
    fn on_fact_before_update(&mut self, fact: &FactHandle) -> Result<()>;

    /// Delivers the changed fact. It must keep the id and type of the
    /// handle passed to `on_fact_before_update`.
    fn on_fact_after_update(&mut self, fact: FactHandle) -> Result<()>;

    fn on_fact_retracted(&mut self, fact: &FactHandle) -> Result<()>;
}
