// ============================================================================
// Aggregate Pattern - Command Handling Core
// ============================================================================
//
// 1. Commands are validated against the current state before anything changes
// 2. A valid command yields events describing what happened
// 3. Events are applied to produce the next state
// 4. A rejected command leaves the aggregate untouched
//
// The resulting state is persisted as a document snapshot; the events are
// returned to the caller for logging and metrics.
//
// ============================================================================

/// Generic aggregate over a command/event vocabulary.
pub trait Aggregate: Sized + Send + Sync {
    type Command;
    type Event;
    type Error;
    /// Per-call information the rules need (who is acting, when, under which policy).
    type Context;

    /// Validate a command and decide which events it produces.
    fn handle_command(
        &self,
        command: &Self::Command,
        ctx: &Self::Context,
    ) -> Result<Vec<Self::Event>, Self::Error>;

    /// Apply an already-decided event.
    fn apply_event(&mut self, event: &Self::Event);

    /// Handle a command and apply its events in one step.
    fn execute(
        &mut self,
        command: &Self::Command,
        ctx: &Self::Context,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle_command(command, ctx)?;
        for event in &events {
            self.apply_event(event);
        }
        Ok(events)
    }
}
