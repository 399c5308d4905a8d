pub mod bookings;

use std::sync::Arc;

use lodge_kernel::ModuleRegistry;

use bookings::clock::Clock;
use bookings::BookingsModule;

/// Register all project-specific modules with the registry.
///
/// Returns the bookings module handle so callers can reach its service after `init`.
pub fn register_all(
    registry: &mut ModuleRegistry,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<Arc<BookingsModule>> {
    let bookings = Arc::new(BookingsModule::new(clock));
    registry.register(bookings.clone())?;
    Ok(bookings)
}
